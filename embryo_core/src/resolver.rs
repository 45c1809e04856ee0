//! The "NAME" Resolver - proposes a progenitor name for a cell name.
//!
//! Daughter cells are named by appending one character to the mother's
//! name (`ABa` -> `ABal`), so stripping the last character recovers the
//! mother. The earliest blastomeres (`P0`, `AB`, `EMS`, ...) do not follow
//! that rule and are resolved through a fixed [`FounderTable`].
//!
//! The resolver performs exactly one step. It never looks anything up and
//! never recurses; the linker decides whether the proposed name exists.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::error::LineageError;

/// Name of the zygote. Its founder entry maps to the empty string.
pub const ROOT_FOUNDER: &str = "P0";

/// C. elegans blastomere -> progenitor table.
const DEFAULT_FOUNDERS: [(&str, &str); 13] = [
    ("P0", ""),
    ("AB", "P0"),
    ("P1", "P0"),
    ("EMS", "P1"),
    ("P2", "P1"),
    ("MS", "EMS"),
    ("E", "EMS"),
    ("P3", "P2"),
    ("C", "P2"),
    ("P4", "P3"),
    ("D", "P3"),
    ("Z2", "P4"),
    ("Z3", "P4"),
];

// ============================================================================
// FOUNDER TABLE
// ============================================================================

/// Fixed mapping from irregularly named founder cells to their progenitors.
///
/// An entry mapping to the empty string marks a terminal founder (no
/// ancestor exists).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FounderTable {
    entries: HashMap<String, String>,
}

impl FounderTable {
    /// Creates an empty table (every name falls through to suffix stripping).
    pub fn empty() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    /// Parses a table from a JSON object of `{"child": "parent"}` pairs.
    pub fn from_json(json: &str) -> Result<Self, LineageError> {
        let table: Self = serde_json::from_str(json)?;
        table.validate()?;
        Ok(table)
    }

    /// Serializes the table as a JSON object.
    pub fn to_json(&self) -> Result<String, LineageError> {
        Ok(serde_json::to_string_pretty(&self.entries)?)
    }

    /// Adds or replaces an entry, returning the previous progenitor.
    pub fn insert(
        &mut self,
        founder: impl Into<String>,
        progenitor: impl Into<String>,
    ) -> Result<Option<String>, LineageError> {
        let founder = founder.into();
        let progenitor = progenitor.into();
        Self::check_entry(&founder, &progenitor)?;
        Ok(self.entries.insert(founder, progenitor))
    }

    /// Merges `other` into this table; entries in `other` take precedence.
    pub fn extend(&mut self, other: FounderTable) {
        self.entries.extend(other.entries);
    }

    /// Looks up the progenitor for a founder name.
    pub fn progenitor(&self, name: &str) -> Option<&str> {
        self.entries.get(name).map(String::as_str)
    }

    /// Founders whose progenitor is `name`, sorted by name.
    pub fn daughters_of(&self, name: &str) -> Vec<&str> {
        let mut daughters: Vec<&str> = self
            .entries
            .iter()
            .filter(|(_, progenitor)| progenitor.as_str() == name)
            .map(|(founder, _)| founder.as_str())
            .collect();
        daughters.sort_unstable();
        daughters
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn validate(&self) -> Result<(), LineageError> {
        for (founder, progenitor) in &self.entries {
            Self::check_entry(founder, progenitor)?;
        }
        Ok(())
    }

    fn check_entry(founder: &str, progenitor: &str) -> Result<(), LineageError> {
        if founder.is_empty() {
            return Err(LineageError::invalid_founder("founder name is empty"));
        }
        if founder == progenitor {
            return Err(LineageError::invalid_founder(format!(
                "{} maps to itself",
                founder
            )));
        }
        Ok(())
    }
}

impl Default for FounderTable {
    fn default() -> Self {
        let entries = DEFAULT_FOUNDERS
            .iter()
            .map(|(child, parent)| (child.to_string(), parent.to_string()))
            .collect();
        Self { entries }
    }
}

// ============================================================================
// RESOLUTION
// ============================================================================

/// Outcome of resolving one cell name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// Founder table supplied the progenitor name
    Founder(String),

    /// Founder table marks the name as the lineage origin
    Terminal,

    /// Regular daughter: last character removed
    Stripped(String),

    /// Nothing to strip (empty name)
    Unresolvable,
}

impl Resolution {
    /// The name to look up in the previous timepoint, if any.
    pub fn candidate(&self) -> Option<&str> {
        match self {
            Resolution::Founder(name) | Resolution::Stripped(name) => Some(name.as_str()),
            Resolution::Terminal | Resolution::Unresolvable => None,
        }
    }
}

/// Resolves cell names to candidate progenitor names.
#[derive(Debug, Clone, Default)]
pub struct NameResolver {
    founders: FounderTable,
}

impl NameResolver {
    pub fn new(founders: FounderTable) -> Self {
        Self { founders }
    }

    pub fn founders(&self) -> &FounderTable {
        &self.founders
    }

    /// Proposes the progenitor name for `name`.
    ///
    /// Founder entries win over suffix stripping. Stripping removes the last
    /// `char`, not the last byte.
    pub fn resolve(&self, name: &str) -> Resolution {
        if let Some(progenitor) = self.founders.progenitor(name) {
            return if progenitor.is_empty() {
                Resolution::Terminal
            } else {
                Resolution::Founder(progenitor.to_string())
            };
        }

        let mut chars = name.chars();
        match chars.next_back() {
            Some(_) => Resolution::Stripped(chars.as_str().to_string()),
            None => Resolution::Unresolvable,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_founder_table_lookups() {
        let resolver = NameResolver::default();

        assert_eq!(resolver.resolve("AB"), Resolution::Founder("P0".into()));
        assert_eq!(resolver.resolve("MS"), Resolution::Founder("EMS".into()));
        assert_eq!(resolver.resolve("Z2"), Resolution::Founder("P4".into()));
        assert_eq!(resolver.resolve("Z3"), Resolution::Founder("P4".into()));
        assert_eq!(resolver.resolve("P0"), Resolution::Terminal);
        assert_eq!(resolver.resolve("P0").candidate(), None);
    }

    #[test]
    fn test_default_table_has_all_blastomeres() {
        let table = FounderTable::default();
        assert_eq!(table.len(), 13);
        assert_eq!(table.progenitor(ROOT_FOUNDER), Some(""));
        assert_eq!(table.progenitor("C"), Some("P2"));
        assert_eq!(table.progenitor("D"), Some("P3"));
        assert!(table.contains("Z2"));
        assert!(!table.contains("ABa"));
    }

    #[test]
    fn test_suffix_stripping() {
        let resolver = NameResolver::default();

        assert_eq!(resolver.resolve("ABala"), Resolution::Stripped("ABal".into()));
        assert_eq!(resolver.resolve("MSp"), Resolution::Stripped("MS".into()));
        // Single character non-founder strips to the empty name
        assert_eq!(resolver.resolve("x"), Resolution::Stripped(String::new()));
        assert_eq!(resolver.resolve(""), Resolution::Unresolvable);
    }

    #[test]
    fn test_suffix_stripping_is_char_safe() {
        let resolver = NameResolver::new(FounderTable::empty());
        assert_eq!(resolver.resolve("Zé"), Resolution::Stripped("Z".into()));
    }

    #[test]
    fn test_founder_table_json() {
        let table = FounderTable::from_json(r#"{"Q0": "", "Qa": "Q0"}"#).unwrap();
        assert_eq!(table.len(), 2);

        let resolver = NameResolver::new(table.clone());
        assert_eq!(resolver.resolve("Qa"), Resolution::Founder("Q0".into()));
        assert_eq!(resolver.resolve("Q0"), Resolution::Terminal);

        let json = table.to_json().unwrap();
        assert_eq!(FounderTable::from_json(&json).unwrap(), table);
    }

    #[test]
    fn test_founder_table_rejects_bad_entries() {
        assert!(matches!(
            FounderTable::from_json(r#"{"AB": "AB"}"#),
            Err(LineageError::InvalidFounder(_))
        ));
        assert!(matches!(
            FounderTable::from_json("[1, 2]"),
            Err(LineageError::FounderTableParse(_))
        ));

        let mut table = FounderTable::empty();
        assert!(table.insert("", "P0").is_err());
        assert_eq!(table.insert("X", "P0").unwrap(), None);
        assert_eq!(table.insert("X", "P1").unwrap(), Some("P0".to_string()));
    }

    #[test]
    fn test_daughters_of() {
        let table = FounderTable::default();
        assert_eq!(table.daughters_of("P0"), vec!["AB", "P1"]);
        assert_eq!(table.daughters_of("EMS"), vec!["E", "MS"]);
        assert_eq!(table.daughters_of("P4"), vec!["Z2", "Z3"]);
        assert!(table.daughters_of("AB").is_empty());
        assert_eq!(table.daughters_of(""), vec!["P0"]);
    }

    #[test]
    fn test_extend_overrides() {
        let mut table = FounderTable::default();
        let mut extra = FounderTable::empty();
        extra.insert("E", "P1").unwrap();
        table.extend(extra);

        assert_eq!(table.progenitor("E"), Some("P1"));
        assert_eq!(table.len(), 13);
    }
}
