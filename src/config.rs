//! Training run configuration.
//!
//! [`TrainerConfig`] is a plain serde struct: build it in code, or load it
//! from TOML with [`TrainerConfig::load`]. Missing TOML keys take their
//! [`Default`] values. Nothing is checked until [`TrainerConfig::validate`],
//! which the trainer calls once before the run starts.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::activation::Activation;
use crate::agent::Pose;
use crate::error::ConfigError;
use crate::genome::{InitRange, MutationParams};
use crate::population::FitnessDirection;
use crate::storage;
use crate::topology::Topology;

/// How the next generation is bred from the ranked population.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum SelectionStrategy {
    /// Keep the better half; replace the rest with mutated copies of it.
    #[default]
    TopHalf,
    /// Keep the best two; fill the rest with mutations of their averaged child.
    TopTwo,
    /// Keep the best one; fill the rest with mutations of it.
    Top,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainerConfig {
    /// Neuron count per layer; first is the input size, last the output size.
    pub layer_sizes: Vec<usize>,
    /// One tag per layer. The first must be `Input`.
    pub activations: Vec<Activation>,
    /// Per-neuron output activations, used when the last tag is `Output`.
    pub output_activations: Option<Vec<Activation>>,
    pub selection: SelectionStrategy,
    /// Seconds of simulated time each generation may run.
    pub time_per_generation: f32,
    pub population_size: usize,
    pub generations: usize,
    pub mutation_rate: f32,
    pub learning_rate: f32,
    pub higher_fitness_is_better: bool,
    /// Save the best network when the last generation finishes.
    pub save_on_completion: bool,
    /// Seed every network from the saved slot, when it exists and fits.
    pub load_on_start: bool,
    /// Slot used for both saving and loading.
    pub save_slot_name: String,
    pub weight_init_range: InitRange,
    pub bias_init_range: InitRange,
    pub start_pose: Pose,
    /// Seed for the trainer's RNG. `None` draws one from the thread RNG.
    pub seed: Option<u64>,
    /// Directory for save slots. `None` uses the platform data directory.
    pub save_dir: Option<PathBuf>,
}

impl Default for TrainerConfig {
    fn default() -> Self {
        Self {
            layer_sizes: vec![2, 4, 1],
            activations: vec![Activation::Input, Activation::Tanh, Activation::Sigmoid],
            output_activations: None,
            selection: SelectionStrategy::TopHalf,
            time_per_generation: 10.0,
            population_size: 20,
            generations: 50,
            mutation_rate: 0.1,
            learning_rate: 0.5,
            higher_fitness_is_better: true,
            save_on_completion: false,
            load_on_start: false,
            save_slot_name: String::new(),
            weight_init_range: InitRange::default(),
            bias_init_range: InitRange::default(),
            start_pose: Pose::default(),
            seed: None,
            save_dir: None,
        }
    }
}

impl TrainerConfig {
    /// Parse a config from TOML text.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] on malformed TOML or mistyped values.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    /// Read and parse a TOML config file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read, or
    /// [`ConfigError::Parse`] if it is not a valid config.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    /// Check every option and return the validated topology.
    ///
    /// Topology checks come first, then the scalar options in this order:
    /// population, generations, learning rate, time per generation, mutation
    /// rate, save slot name presence and form, `TopTwo` population, init
    /// ranges.
    ///
    /// # Errors
    ///
    /// Returns the first [`ConfigError`] found.
    pub fn validate(&self) -> Result<Topology, ConfigError> {
        let topology = Topology::validate(
            &self.layer_sizes,
            &self.activations,
            self.output_activations.as_deref(),
        )?;

        if self.population_size == 0 {
            return Err(ConfigError::EmptyPopulation);
        }
        if self.generations < 1 {
            return Err(ConfigError::NoGenerations);
        }
        // Negated comparisons so NaN is rejected too.
        if !(self.learning_rate >= 0.0 && self.mutation_params().is_sampleable()) {
            return Err(ConfigError::InvalidLearningRate(self.learning_rate));
        }
        if !(self.time_per_generation >= 0.0) {
            return Err(ConfigError::InvalidTimePerGeneration(
                self.time_per_generation,
            ));
        }
        if !(self.mutation_rate >= 0.0) {
            return Err(ConfigError::InvalidMutationRate(self.mutation_rate));
        }
        if (self.save_on_completion || self.load_on_start) && self.save_slot_name.trim().is_empty() {
            return Err(ConfigError::MissingSaveName);
        }
        if !self.save_slot_name.is_empty() && !storage::is_valid_slot_name(&self.save_slot_name) {
            return Err(ConfigError::InvalidSaveName(self.save_slot_name.clone()));
        }
        if self.selection == SelectionStrategy::TopTwo && self.population_size < 3 {
            return Err(ConfigError::TopTwoNeedsThree {
                population: self.population_size,
            });
        }
        for (which, range) in [
            ("weight", self.weight_init_range),
            ("bias", self.bias_init_range),
        ] {
            if !range.is_finite() {
                return Err(ConfigError::NonFiniteInitRange {
                    which,
                    min: range.min,
                    max: range.max,
                });
            }
        }
        Ok(topology)
    }

    #[must_use]
    pub fn mutation_params(&self) -> MutationParams {
        MutationParams::new(self.mutation_rate, self.learning_rate)
    }

    #[must_use]
    pub fn fitness_direction(&self) -> FitnessDirection {
        if self.higher_fitness_is_better {
            FitnessDirection::HigherIsBetter
        } else {
            FitnessDirection::LowerIsBetter
        }
    }
}
