//! Deterministic synthetic embryo for demos and tests.
//!
//! The generator keeps a "God's eye view" of a dividing embryo:
//! - True cell positions with a small random walk per frame
//! - Founder divisions (P0 -> AB + P1, ...) taken from the founder table
//! - Regular divisions append `a` / `p` to the mother's name
//!
//! Every frame is rendered in nuclei-file format so it flows through the
//! same parser as recorded data.

use embryo_core::FounderTable;
use embryo_env::MemorySource;
use nalgebra::Vector3;
use rand::Rng;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rand_distr::{Distribution, Normal, UnitSphere};

/// Configuration for a synthetic recording.
#[derive(Debug, Clone)]
pub struct SyntheticConfig {
    /// Master seed for determinism
    pub seed: u64,

    /// Number of timepoints to generate
    pub timepoints: usize,

    /// Frames a cell lives before it may divide
    pub min_cycle: usize,

    /// Per-frame division probability once `min_cycle` has passed
    pub division_probability: f64,

    /// Standard deviation of the per-frame position random walk
    pub jitter_std: f64,

    /// Distance between daughter nuclei right after division
    pub division_spread: f64,

    /// Plane spacing used when writing the z column
    pub z_scale: f64,

    /// Divisions stop once the embryo holds this many cells
    pub max_cells: usize,

    /// Unnamed detections added per frame (dropped by the parser)
    pub unnamed_per_frame: usize,
}

impl Default for SyntheticConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            timepoints: 40,
            min_cycle: 3,
            division_probability: 0.35,
            jitter_std: 0.5,
            division_spread: 8.0,
            z_scale: 11.1,
            max_cells: 512,
            unnamed_per_frame: 1,
        }
    }
}

/// One ground-truth nucleus.
#[derive(Debug, Clone)]
pub struct SyntheticCell {
    pub name: String,
    pub position: Vector3<f64>,
    pub radius: f64,

    /// Frames since this cell was born
    pub age: usize,
}

/// The generator.
pub struct SyntheticEmbryo {
    config: SyntheticConfig,
    founders: FounderTable,
    rng: ChaCha8Rng,
    cells: Vec<SyntheticCell>,
    frame: usize,
}

impl SyntheticEmbryo {
    /// Creates a one-cell embryo (`P0`) with the default founder table.
    pub fn new(config: SyntheticConfig) -> Self {
        Self::with_founders(config, FounderTable::default())
    }

    pub fn with_founders(config: SyntheticConfig, founders: FounderTable) -> Self {
        let rng = ChaCha8Rng::seed_from_u64(config.seed);
        let zygote = SyntheticCell {
            name: embryo_core::ROOT_FOUNDER.to_string(),
            position: Vector3::zeros(),
            radius: 25.0,
            age: 0,
        };
        Self {
            config,
            founders,
            rng,
            cells: vec![zygote],
            frame: 0,
        }
    }

    /// Current ground-truth cells.
    pub fn cells(&self) -> &[SyntheticCell] {
        &self.cells
    }

    /// Index of the next frame to be rendered.
    pub fn frame(&self) -> usize {
        self.frame
    }

    /// Daughter names for a dividing cell, or `None` if it never divides.
    fn daughter_names(&self, name: &str) -> Option<[String; 2]> {
        if let [a, b] = self.founders.daughters_of(name).as_slice() {
            return Some([a.to_string(), b.to_string()]);
        }
        if is_germline_leaf(name) {
            return None;
        }
        Some([format!("{}a", name), format!("{}p", name)])
    }

    /// Advances the ground truth by one frame.
    pub fn step(&mut self) {
        let jitter = Normal::new(0.0, self.config.jitter_std).ok();

        let mut next = Vec::with_capacity(self.cells.len() * 2);
        let cells = std::mem::take(&mut self.cells);
        let mut population = cells.len();

        for mut cell in cells {
            let wants_division = cell.age >= self.config.min_cycle
                && population < self.config.max_cells
                && self.rng.gen_bool(self.config.division_probability.clamp(0.0, 1.0));

            let daughters = if wants_division {
                self.daughter_names(&cell.name)
            } else {
                None
            };

            match daughters {
                Some([first, second]) => {
                    let axis: [f64; 3] = UnitSphere.sample(&mut self.rng);
                    let offset = Vector3::new(axis[0], axis[1], axis[2])
                        * (self.config.division_spread / 2.0);
                    let radius = cell.radius * 0.8;
                    next.push(SyntheticCell {
                        name: first,
                        position: cell.position + offset,
                        radius,
                        age: 0,
                    });
                    next.push(SyntheticCell {
                        name: second,
                        position: cell.position - offset,
                        radius,
                        age: 0,
                    });
                    population += 1;
                }
                None => {
                    if let Some(jitter) = &jitter {
                        cell.position += Vector3::new(
                            jitter.sample(&mut self.rng),
                            jitter.sample(&mut self.rng),
                            jitter.sample(&mut self.rng),
                        );
                    }
                    cell.age += 1;
                    next.push(cell);
                }
            }
        }

        self.cells = next;
    }

    /// Renders the current ground truth as nuclei-file text.
    pub fn render(&mut self) -> String {
        let mut lines = Vec::with_capacity(self.cells.len() + self.config.unnamed_per_frame);
        let z_scale = if self.config.z_scale == 0.0 { 1.0 } else { self.config.z_scale };

        for (i, cell) in self.cells.iter().enumerate() {
            lines.push(format!(
                "{},1,0,0,0,{:.3},{:.3},{:.5},{:.3},{},",
                i + 1,
                cell.position.x,
                cell.position.y,
                cell.position.z / z_scale,
                cell.radius,
                cell.name
            ));
        }
        for k in 0..self.config.unnamed_per_frame {
            let x: f64 = self.rng.gen_range(-100.0..100.0);
            let y: f64 = self.rng.gen_range(-100.0..100.0);
            lines.push(format!(
                "{},1,0,0,0,{:.3},{:.3},0,5,,",
                self.cells.len() + k + 1,
                x,
                y
            ));
        }

        lines.join("\n")
    }

    /// Renders every configured timepoint, advancing between frames.
    pub fn frames(&mut self) -> Vec<String> {
        let mut frames = Vec::with_capacity(self.config.timepoints);
        while self.frame < self.config.timepoints {
            if self.frame > 0 {
                self.step();
            }
            frames.push(self.render());
            self.frame += 1;
        }
        frames
    }

    /// Renders every timepoint into an in-memory source.
    pub fn into_source(mut self) -> MemorySource {
        MemorySource::new(self.frames())
    }
}

/// Germline cells past the last founder division never divide.
fn is_germline_leaf(name: &str) -> bool {
    matches!(name, "Z2" | "Z3")
}
