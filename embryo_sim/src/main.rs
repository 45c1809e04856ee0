//! Embryo Lineage CLI
//!
//! Load a recorded (or synthetic) embryo, link every timepoint, assemble the
//! lineage tree, and optionally export everything for the renderers.

use clap::Parser;
use embryo_core::{FounderTable, LineageNode, NameResolver};
use embryo_env::{DirectorySource, ParseConfig, SnapshotSource};
use embryo_sim::{LineageExport, LoadSession, LoaderConfig, SessionError};
use embryo_sim::{SyntheticConfig, SyntheticEmbryo};
use std::path::PathBuf;
use tracing::{error, info, warn, Level};
use tracing_subscriber::FmtSubscriber;

/// Embryo cell-lineage reconstruction
#[derive(Parser, Debug)]
#[command(name = "embryo-lineage")]
#[command(about = "Link per-timepoint nuclei snapshots into a cell lineage", long_about = None)]
struct Args {
    /// Directory with t001-nuclei, t002-nuclei, ... (omit to use a synthetic embryo)
    #[arg(short, long)]
    dir: Option<PathBuf>,

    /// JSON object of founder -> progenitor overrides
    #[arg(short, long)]
    founders: Option<PathBuf>,

    /// Seed for the synthetic embryo
    #[arg(short, long, default_value = "42")]
    seed: u64,

    /// Number of synthetic timepoints
    #[arg(short, long, default_value = "40")]
    timepoints: usize,

    /// Stop loading after this many timepoints
    #[arg(long)]
    max_timepoints: Option<usize>,

    /// Plane-index multiplier for the z column
    #[arg(long, default_value = "11.1")]
    z_scale: f64,

    /// Print the lineage tree down to this depth
    #[arg(long)]
    tree_depth: Option<usize>,

    /// Export timepoints and tree to a JSON file
    #[arg(long)]
    export: Option<PathBuf>,

    /// JSON summary on stdout
    #[arg(long)]
    json: bool,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn build_resolver(path: Option<&PathBuf>) -> Result<NameResolver, SessionError> {
    let mut founders = FounderTable::default();
    if let Some(path) = path {
        let json = std::fs::read_to_string(path)?;
        let overrides = FounderTable::from_json(&json)?;
        info!("Loaded {} founder overrides from {}", overrides.len(), path.display());
        founders.extend(overrides);
    }
    Ok(NameResolver::new(founders))
}

/// Runs the load loop to completion and projects the result for export.
async fn load<S: SnapshotSource>(
    source: S,
    resolver: NameResolver,
    config: LoaderConfig,
) -> Result<LineageExport, SessionError> {
    let description = source.describe();
    info!("Loading snapshots from {}", description);

    let mut session = LoadSession::new(source, resolver, config);
    session.run().await?;

    let tree = session.tree().cloned().unwrap_or_default();
    Ok(LineageExport::new(
        &description,
        session.history(),
        &tree,
        session.reports(),
    ))
}

fn print_tree(roots: &[LineageNode]) {
    let mut stack: Vec<(&LineageNode, usize)> = roots.iter().rev().map(|n| (n, 0)).collect();
    while let Some((node, depth)) = stack.pop() {
        println!("{}{}", "  ".repeat(depth), node.name);
        stack.extend(node.children.iter().rev().map(|c| (c, depth + 1)));
    }
}

async fn run(args: &Args) -> Result<LineageExport, SessionError> {
    let resolver = build_resolver(args.founders.as_ref())?;
    let config = LoaderConfig {
        parse: ParseConfig {
            z_scale: args.z_scale,
            ..Default::default()
        },
        max_timepoints: args.max_timepoints,
    };

    match &args.dir {
        Some(dir) => {
            let source = DirectorySource::open(dir).await?;
            load(source, resolver, config).await
        }
        None => {
            let synthetic = SyntheticConfig {
                seed: args.seed,
                timepoints: args.timepoints,
                z_scale: args.z_scale,
                ..Default::default()
            };
            let source = SyntheticEmbryo::with_founders(synthetic, resolver.founders().clone())
                .into_source();
            load(source, resolver, config).await
        }
    }
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    // Initialize logging
    let level = if args.verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .expect("Failed to set tracing subscriber");

    let export = match run(&args).await {
        Ok(export) => export,
        Err(e) => {
            error!("Load failed: {}", e);
            std::process::exit(1);
        }
    };

    if let Some(path) = &args.export {
        if let Err(e) = export.write_to_file(path) {
            error!("Failed to write export: {}", e);
            std::process::exit(1);
        }
        info!("Exported {} timepoints to {}", export.timepoints.len(), path.display());
    }

    let orphans: usize = export
        .reports
        .iter()
        .skip(1)
        .map(|r| r.orphans.len())
        .sum();

    if args.json {
        let summary = serde_json::json!({
            "source": export.source,
            "timepoints": export.timepoints.len(),
            "cells": export.cell_count(),
            "tree_nodes": export.tree.node_count(),
            "tree_depth": export.tree.depth(),
            "top_level": export.tree.roots.len(),
            "orphans": orphans,
            "suspect_timepoints": export.suspect_timepoints,
            "reparented": export.tree.reparented,
        });
        match serde_json::to_string_pretty(&summary) {
            Ok(text) => println!("{}", text),
            Err(e) => {
                error!("Failed to encode summary: {}", e);
                std::process::exit(1);
            }
        }
    } else {
        info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
        info!("Timepoints: {}", export.timepoints.len());
        info!("Cells:      {}", export.cell_count());
        info!("Tree nodes: {} (depth {})", export.tree.node_count(), export.tree.depth());
        info!("Orphans:    {}", orphans);

        if !export.suspect_timepoints.is_empty() {
            warn!("Suspect timepoints: {:?}", export.suspect_timepoints);
        }
        if !export.tree.reparented.is_empty() {
            warn!("Re-parented cells: {:?}", export.tree.reparented);
        }
        if export.tree.roots.len() > 1 {
            warn!("{} top-level nodes besides root", export.tree.roots.len() - 1);
        }
    }

    if let Some(depth) = args.tree_depth {
        print_tree(&export.tree.collapsed(depth).roots);
    }
}
