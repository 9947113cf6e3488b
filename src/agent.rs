//! The contract between the trainer and the environment it controls.
//!
//! The trainer never looks inside an agent. It only asks for sensor input,
//! hands back network output, and reads fitness and liveness. Agents are
//! stored in a [`SlotMap`](slotmap::SlotMap) arena and referenced by
//! [`AgentId`] from population slots.

use serde::{Deserialize, Serialize};
use slotmap::new_key_type;

new_key_type! {
    /// Stable handle for an agent owned by a trainer.
    pub struct AgentId;
}

/// Starting position and orientation restored at every generation boundary.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Pose {
    pub position: [f32; 3],
    /// Euler angles in degrees.
    pub rotation: [f32; 3],
}

impl Pose {
    #[must_use]
    pub const fn new(position: [f32; 3], rotation: [f32; 3]) -> Self {
        Self { position, rotation }
    }
}

/// An environment-side body driven by one genome.
///
/// Per tick the trainer calls, for each agent: [`check_failure`](Agent::check_failure),
/// then, if [`is_alive`](Agent::is_alive), [`sense_input`](Agent::sense_input),
/// [`apply_output`](Agent::apply_output), [`act`](Agent::act) and
/// [`compute_fitness`](Agent::compute_fitness).
pub trait Agent {
    /// Whether the agent still takes part in the current generation.
    fn is_alive(&self) -> bool;

    /// Update liveness. Called once per tick before evaluation.
    fn check_failure(&mut self);

    /// The input vector for the network. Must have the topology's input size.
    fn sense_input(&mut self) -> Vec<f32>;

    /// Receive the network's output vector (the topology's output size).
    fn apply_output(&mut self, output: &[f32]);

    /// Carry out the action chosen by the last output.
    fn act(&mut self) {}

    /// Current fitness score.
    fn compute_fitness(&mut self) -> f32;

    /// Return to `pose` and become alive again for the next generation.
    fn reset_to_start(&mut self, pose: &Pose);
}
