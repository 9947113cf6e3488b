//! Error types for configuration, evaluation, and persistence.

use std::path::PathBuf;

use thiserror::Error;

/// A configuration problem detected before any generation runs.
///
/// Every variant is fatal: a run with an invalid configuration never starts.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("network size is too small: {found} layer(s), at least 2 required")]
    TooFewLayers { found: usize },

    #[error("activation list has {activations} entries but the network has {layers} layers")]
    ActivationCountMismatch { layers: usize, activations: usize },

    #[error("input layer set up incorrectly: `Input` must be the first activation and appear only once")]
    MisplacedInput,

    #[error("`Output` activation found on layer {layer}, only the last layer may carry it")]
    MisplacedOutput { layer: usize },

    #[error("custom output has {found} activations but the output layer has {expected} neurons")]
    OutputOverrideMismatch { expected: usize, found: usize },

    #[error("layer {layer} has no neurons")]
    EmptyLayer { layer: usize },

    #[error("population size must be at least 1")]
    EmptyPopulation,

    #[error("number of generations must be at least 1")]
    NoGenerations,

    #[error("learning rate must be non-negative and small enough to sample from, got {0}")]
    InvalidLearningRate(f32),

    #[error("mutation rate must be non-negative, got {0}")]
    InvalidMutationRate(f32),

    #[error("time per generation must be non-negative, got {0}")]
    InvalidTimePerGeneration(f32),

    #[error("saving or loading is enabled but no save slot name was given")]
    MissingSaveName,

    #[error("save slot name {0:?} must be a plain file name without path separators or `..`")]
    InvalidSaveName(String),

    #[error("TopTwo selection needs at least 3 networks, got {population}")]
    TopTwoNeedsThree { population: usize },

    #[error("{which} initialization range ({min}, {max}) has a non-finite bound or width")]
    NonFiniteInitRange {
        which: &'static str,
        min: f32,
        max: f32,
    },

    #[error("expected {expected} agents for the population, got {found}")]
    AgentCountMismatch { expected: usize, found: usize },

    #[error("failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
}

/// A forward pass that could not be computed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EvalError {
    /// The agent produced an input vector of the wrong length.
    #[error("wrong size input given to the network: expected {expected}, got {found}")]
    InputSizeMismatch { expected: usize, found: usize },

    /// The genome's blocks do not have the shape the topology describes.
    #[error("genome shape does not match the network topology")]
    GenomeMismatch,
}

/// Failure to turn stored bytes back into a genome.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read saved network {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("saved network could not be decoded: {0}")]
    Decode(#[from] bincode::Error),

    #[error("not a saved network file (bad magic)")]
    BadMagic,

    #[error("unsupported saved network version {found}")]
    UnsupportedVersion { found: u16 },

    /// The record describes a different network than the live topology.
    #[error(
        "saved network has {found_layers} layers, {found_input} inputs and {found_output} outputs; \
         expected {expected_layers}, {expected_input} and {expected_output}"
    )]
    ShapeMismatch {
        expected_layers: usize,
        expected_input: usize,
        expected_output: usize,
        found_layers: usize,
        found_input: usize,
        found_output: usize,
    },

    /// Declared sizes agree but a weight or bias block has the wrong length.
    #[error("saved network layer {layer} has malformed weight or bias blocks")]
    Malformed { layer: usize },
}

/// Failure to write a genome to storage.
#[derive(Debug, Error)]
pub enum RecordError {
    #[error("network could not be encoded: {0}")]
    Encode(#[from] bincode::Error),

    #[error("{which} size {size} does not fit the record's 32-bit size field")]
    SizeOverflow { which: &'static str, size: usize },

    #[error("failed to write saved network {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Errors raised while a training run is in progress.
#[derive(Debug, Error)]
pub enum TrainerError {
    #[error("failed to save the best network: {0}")]
    Save(#[from] RecordError),

    #[error("the training run has already finished")]
    Finished,
}
