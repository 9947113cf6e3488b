//! # Symbios FFNN
//!
//! A fixed-topology neuroevolution engine: a population of fully connected
//! feed-forward networks controls a population of agents, and the best
//! performers are bred into the next generation by mutation and averaging
//! crossover. No backpropagation is involved.
//!
//! ## Features
//!
//! - **Validated Topologies**: layer sizes and per-layer activation tags are
//!   checked once, up front, with a typed [`ConfigError`] for every failure
//! - **Buffered Forward Pass**: [`FeedForward`] reuses its scratch buffers, so
//!   the per-tick hot path does not allocate
//! - **Three Selection Strategies**: `TopHalf`, `TopTwo` and `Top`
//! - **Arena-Owned Agents**: agents live in a `SlotMap` and are referenced by
//!   [`AgentId`] from population slots, so ranking moves handles, not agents
//! - **Versioned Save Slots**: the best network is written as a small
//!   bincode record that is checked against the live topology on load
//! - **Deterministic Runs**: all randomness flows through one seeded `ChaCha8Rng`
//!
//! ## Quick Start
//!
//! ```rust
//! use symbios_ffnn::{Activation, Genome, InitRange, MutationParams, Topology, evaluate};
//! use rand::SeedableRng;
//! use rand_chacha::ChaCha8Rng;
//!
//! let topology = Topology::validate(
//!     &[2, 3, 1],
//!     &[Activation::Input, Activation::ReLU, Activation::Sigmoid],
//!     None,
//! )
//! .unwrap();
//!
//! let mut rng = ChaCha8Rng::seed_from_u64(42);
//! let parent = Genome::random_init(&topology, InitRange::default(), InitRange::default(), &mut rng);
//! let child = parent.mutate(&MutationParams::new(0.1, 0.5), &mut rng);
//!
//! let output = evaluate(&child, &topology, &[0.5, -0.5]).unwrap();
//! assert_eq!(output.len(), 1);
//! assert!((0.0..=1.0).contains(&output[0]));
//! ```
//!
//! ## Training Agents
//!
//! ```rust
//! use symbios_ffnn::{Agent, Pose, Trainer, TrainerConfig};
//!
//! // Rewards outputs close to 1.0.
//! struct Reach {
//!     last: f32,
//! }
//!
//! impl Agent for Reach {
//!     fn is_alive(&self) -> bool { true }
//!     fn check_failure(&mut self) {}
//!     fn sense_input(&mut self) -> Vec<f32> { vec![1.0, 0.0] }
//!     fn apply_output(&mut self, output: &[f32]) { self.last = output[0]; }
//!     fn compute_fitness(&mut self) -> f32 { -(1.0 - self.last).abs() }
//!     fn reset_to_start(&mut self, _pose: &Pose) { self.last = 0.0; }
//! }
//!
//! let config = TrainerConfig {
//!     population_size: 8,
//!     generations: 5,
//!     time_per_generation: 1.0,
//!     seed: Some(7),
//!     ..TrainerConfig::default()
//! };
//! let agents = (0..8).map(|_| Reach { last: 0.0 });
//! let mut trainer = Trainer::new(config, agents).unwrap();
//!
//! let summaries = trainer.run(0.1).unwrap();
//! assert_eq!(summaries.len(), 5);
//! assert!(trainer.is_finished());
//! ```
//!
//! ## Architecture
//!
//! ### Genome Layout
//!
//! A [`Genome`] stores `weights[layer][neuron][prev_neuron]` and
//! `biases[layer][neuron]`. Layer 0 is the input layer and has empty blocks.
//! The shape is fully determined by the topology; genomes never change shape.
//!
//! ### Generation Boundary
//!
//! 1. Rank slots best first (stable, NaN fitness sinks to the bottom)
//! 2. Record the best fitness
//! 3. Breed the lower slots from the kept upper slots
//! 4. Zero fitness, reset elapsed time, move every agent to the start pose
//!
//! Slot 0 therefore always holds the best genome of the previous generation.

pub mod activation;
pub mod agent;
pub mod config;
pub mod error;
pub mod evaluator;
pub mod genome;
pub mod population;
pub mod record;
pub mod storage;
pub mod topology;
pub mod trainer;

// Re-exports for convenience
pub use activation::Activation;
pub use agent::{Agent, AgentId, Pose};
pub use config::{SelectionStrategy, TrainerConfig};
pub use error::{ConfigError, EvalError, LoadError, RecordError, TrainerError};
pub use evaluator::{evaluate, FeedForward};
pub use genome::{Genome, InitRange, MutationParams};
pub use population::{FitnessDirection, Population, Slot};
pub use record::{NetworkRecord, RECORD_MAGIC, RECORD_VERSION};
pub use storage::{default_save_dir, is_valid_slot_name, SaveSlots, SAVE_EXTENSION};
pub use topology::Topology;
pub use trainer::{AgentFault, GenerationSummary, Phase, Step, TickReport, Trainer};
