//! The generational training loop.
//!
//! A [`Trainer`] owns one agent per population slot and drives them through
//! a fixed number of generations:
//!
//! ```text
//! new ──► Evaluating ──tick──► Evaluating ──advance_generation──► Evaluating ... ──► Finished
//! ```
//!
//! A generation ends when its simulated time budget is spent or every agent
//! is dead. At that boundary the population is ranked, the next generation is
//! bred with the configured [`SelectionStrategy`](crate::config::SelectionStrategy),
//! and every agent returns to the start pose with zero fitness. After the last
//! generation the best network is optionally written to its save slot.
//!
//! [`Trainer::step`] bundles the boundary check with ticking, so a host only
//! has to call it once per frame.

use std::path::{Path, PathBuf};

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use slotmap::SlotMap;
use tracing::{debug, info, warn};

use crate::agent::{Agent, AgentId};
use crate::config::TrainerConfig;
use crate::error::{ConfigError, EvalError, LoadError, TrainerError};
use crate::evaluator::FeedForward;
use crate::genome::{Genome, MutationParams};
use crate::population::{FitnessDirection, Population, Slot};
use crate::storage::SaveSlots;
use crate::topology::Topology;

/// Where the run is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    /// Agents are being ticked for the current generation.
    Evaluating,
    /// All generations are done. Further ticks do nothing.
    Finished,
}

/// An agent that was skipped during a tick.
#[derive(Debug, Clone, PartialEq)]
pub struct AgentFault {
    pub slot: usize,
    pub agent: AgentId,
    pub error: EvalError,
}

/// What happened during one [`Trainer::tick`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TickReport {
    /// Agents that ran a forward pass and reported fitness.
    pub evaluated: usize,
    pub faults: Vec<AgentFault>,
}

/// Statistics of a completed generation, taken after ranking.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GenerationSummary {
    /// Zero-based index of the generation that just ended.
    pub generation: usize,
    pub best_fitness: f32,
    pub mean_fitness: f32,
}

/// Outcome of one [`Trainer::step`].
#[derive(Debug, Clone, PartialEq)]
pub enum Step {
    Ticked(TickReport),
    GenerationCompleted(GenerationSummary),
    Finished,
}

pub struct Trainer<A: Agent> {
    config: TrainerConfig,
    evaluator: FeedForward,
    agents: SlotMap<AgentId, A>,
    population: Population,
    save_slots: SaveSlots,
    mutation: MutationParams,
    direction: FitnessDirection,
    rng: ChaCha8Rng,
    generation: usize,
    elapsed: f32,
    best_fitness: Option<f32>,
    saved_to: Option<PathBuf>,
    phase: Phase,
}

impl<A: Agent> Trainer<A> {
    /// Validate `config` and set up the first generation.
    ///
    /// Every network starts from the saved slot when `load_on_start` is set
    /// and a compatible save exists. Otherwise each network gets its own
    /// random initialization. All agents are placed at the start pose.
    ///
    /// # Errors
    ///
    /// Returns the first [`ConfigError`] found in `config`, or
    /// [`ConfigError::AgentCountMismatch`] if the number of agents differs
    /// from `population_size`.
    pub fn new(
        config: TrainerConfig,
        agents: impl IntoIterator<Item = A>,
    ) -> Result<Self, ConfigError> {
        let topology = config.validate()?;
        let agents: Vec<A> = agents.into_iter().collect();
        if agents.len() != config.population_size {
            return Err(ConfigError::AgentCountMismatch {
                expected: config.population_size,
                found: agents.len(),
            });
        }

        let mut rng = match config.seed {
            Some(seed) => ChaCha8Rng::seed_from_u64(seed),
            None => ChaCha8Rng::from_rng(&mut rand::rng()),
        };
        let save_slots = match &config.save_dir {
            Some(dir) => SaveSlots::new(dir),
            None => SaveSlots::platform_default(),
        };

        let loaded = if config.load_on_start {
            load_seed_genome(&save_slots, &config.save_slot_name, &topology)
        } else {
            None
        };

        let mut arena = SlotMap::with_capacity_and_key(agents.len());
        let mut slots = Vec::with_capacity(agents.len());
        for mut agent in agents {
            agent.reset_to_start(&config.start_pose);
            let genome = match &loaded {
                Some(genome) => genome.clone(),
                None => Genome::random_init(
                    &topology,
                    config.weight_init_range,
                    config.bias_init_range,
                    &mut rng,
                ),
            };
            slots.push(Slot::new(genome, arena.insert(agent)));
        }

        info!(
            population = slots.len(),
            generations = config.generations,
            selection = ?config.selection,
            parameters = topology.parameter_count(),
            "Starting training"
        );

        Ok(Self {
            mutation: config.mutation_params(),
            direction: config.fitness_direction(),
            evaluator: FeedForward::new(topology),
            agents: arena,
            population: Population::new(slots),
            save_slots,
            rng,
            generation: 0,
            elapsed: 0.0,
            best_fitness: None,
            saved_to: None,
            phase: Phase::Evaluating,
            config,
        })
    }

    /// Run one simulation tick of `dt` seconds over every agent.
    ///
    /// Dead agents are skipped. An agent whose input has the wrong length is
    /// skipped for this tick and listed in [`TickReport::faults`]; the rest of
    /// the population still runs. Does nothing once the run has finished.
    pub fn tick(&mut self, dt: f32) -> TickReport {
        debug_assert!(dt.is_finite(), "tick delta must be finite, got {dt}");
        let mut report = TickReport::default();
        if self.phase == Phase::Finished {
            return report;
        }

        for (index, slot) in self.population.slots_mut().iter_mut().enumerate() {
            let Some(agent) = self.agents.get_mut(slot.agent) else {
                continue;
            };
            agent.check_failure();
            if !agent.is_alive() {
                continue;
            }

            let input = agent.sense_input();
            match self.evaluator.evaluate(&slot.genome, &input) {
                Ok(output) => {
                    agent.apply_output(output);
                    agent.act();
                    slot.fitness = agent.compute_fitness();
                    report.evaluated += 1;
                }
                Err(error) => {
                    warn!(slot = index, %error, "Skipping agent for this tick");
                    report.faults.push(AgentFault {
                        slot: index,
                        agent: slot.agent,
                        error,
                    });
                }
            }
        }

        self.elapsed += dt;
        report
    }

    /// Whether the current generation should end.
    #[must_use]
    pub fn generation_over(&self) -> bool {
        self.elapsed >= self.config.time_per_generation || self.all_dead()
    }

    #[must_use]
    pub fn all_dead(&self) -> bool {
        self.agents.values().all(|agent| !agent.is_alive())
    }

    /// Close the current generation and breed the next one.
    ///
    /// Ranks the population, records the best fitness, reproduces, then
    /// resets fitness, elapsed time and every agent's pose. When this was the
    /// last generation the run moves to [`Phase::Finished`] and the best
    /// network is saved if `save_on_completion` is set.
    ///
    /// # Errors
    ///
    /// - [`TrainerError::Finished`] if the run has already finished
    /// - [`TrainerError::Save`] if the final save fails; the run is still
    ///   marked finished
    pub fn advance_generation(&mut self) -> Result<GenerationSummary, TrainerError> {
        if self.phase == Phase::Finished {
            return Err(TrainerError::Finished);
        }

        let best_fitness = self.population.rank(self.direction).unwrap_or(0.0);
        let mean_fitness = self.population.mean_fitness().unwrap_or(0.0);
        self.best_fitness = Some(best_fitness);
        let summary = GenerationSummary {
            generation: self.generation,
            best_fitness,
            mean_fitness,
        };
        info!(
            generation = summary.generation,
            best_fitness, mean_fitness, "Best fitness of generation"
        );

        self.population
            .reproduce(self.config.selection, &self.mutation, &mut self.rng);
        debug!(selection = ?self.config.selection, "Bred next generation");
        self.population.reset_fitness();
        for slot in self.population.slots() {
            if let Some(agent) = self.agents.get_mut(slot.agent) {
                agent.reset_to_start(&self.config.start_pose);
            }
        }
        self.elapsed = 0.0;
        self.generation += 1;

        if self.generation >= self.config.generations {
            self.finish()?;
        }
        Ok(summary)
    }

    /// Advance the run by one host frame of `dt` seconds.
    ///
    /// Ticks while the generation is running, otherwise closes it. Once the
    /// run is over every call returns [`Step::Finished`].
    ///
    /// # Errors
    ///
    /// Propagates [`TrainerError::Save`] from the final generation boundary.
    pub fn step(&mut self, dt: f32) -> Result<Step, TrainerError> {
        if self.phase == Phase::Finished {
            return Ok(Step::Finished);
        }
        if self.generation_over() {
            self.advance_generation().map(Step::GenerationCompleted)
        } else {
            Ok(Step::Ticked(self.tick(dt)))
        }
    }

    /// Run to completion with a fixed `dt`, returning every generation summary.
    ///
    /// `dt` must be positive unless agents die on their own, or a generation
    /// never ends. A NaN `dt` poisons the elapsed time the same way and is
    /// caught by a debug assertion in [`tick`](Self::tick).
    ///
    /// # Errors
    ///
    /// Same as [`step`](Self::step).
    pub fn run(&mut self, dt: f32) -> Result<Vec<GenerationSummary>, TrainerError> {
        let mut summaries = Vec::with_capacity(self.config.generations);
        loop {
            match self.step(dt)? {
                Step::Ticked(_) => {}
                Step::GenerationCompleted(summary) => summaries.push(summary),
                Step::Finished => return Ok(summaries),
            }
        }
    }

    fn finish(&mut self) -> Result<(), TrainerError> {
        self.phase = Phase::Finished;
        info!(generations = self.generation, best_fitness = ?self.best_fitness, "Training complete");
        if !self.config.save_on_completion {
            return Ok(());
        }
        // Slot 0 was ranked best at this boundary and reproduction never
        // overwrites it.
        let Some(best) = self.population.top() else {
            return Ok(());
        };
        let path = self.save_slots.save(
            &self.config.save_slot_name,
            &best.genome,
            self.evaluator.topology(),
        )?;
        info!(path = %path.display(), "Saved best network");
        self.saved_to = Some(path);
        Ok(())
    }

    #[must_use]
    pub fn phase(&self) -> Phase {
        self.phase
    }

    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.phase == Phase::Finished
    }

    /// Number of completed generations.
    #[must_use]
    pub fn generation(&self) -> usize {
        self.generation
    }

    /// Simulated seconds spent in the current generation.
    #[must_use]
    pub fn elapsed(&self) -> f32 {
        self.elapsed
    }

    /// Best fitness of the most recently completed generation.
    #[must_use]
    pub fn best_fitness(&self) -> Option<f32> {
        self.best_fitness
    }

    /// Genome in slot 0: the best one once at least one generation is done.
    #[must_use]
    pub fn best_genome(&self) -> Option<&Genome> {
        self.population.top().map(|slot| &slot.genome)
    }

    /// Path of the completion save, if one was written.
    #[must_use]
    pub fn saved_to(&self) -> Option<&Path> {
        self.saved_to.as_deref()
    }

    #[must_use]
    pub fn population(&self) -> &Population {
        &self.population
    }

    #[must_use]
    pub fn agent(&self, id: AgentId) -> Option<&A> {
        self.agents.get(id)
    }

    pub fn agent_mut(&mut self, id: AgentId) -> Option<&mut A> {
        self.agents.get_mut(id)
    }

    /// Agents in population slot order.
    pub fn agents(&self) -> impl Iterator<Item = &A> + '_ {
        self.population
            .slots()
            .iter()
            .filter_map(|slot| self.agents.get(slot.agent))
    }

    #[must_use]
    pub fn topology(&self) -> &Topology {
        self.evaluator.topology()
    }

    #[must_use]
    pub fn config(&self) -> &TrainerConfig {
        &self.config
    }

    #[must_use]
    pub fn save_slots(&self) -> &SaveSlots {
        &self.save_slots
    }
}

/// Read the start-of-run genome. Any problem degrades to random init.
fn load_seed_genome(slots: &SaveSlots, name: &str, topology: &Topology) -> Option<Genome> {
    match slots.load(name, topology) {
        Ok(Some(genome)) => {
            info!(slot = name, "Network found, seeding every network with it");
            Some(genome)
        }
        Ok(None) => {
            info!(slot = name, "No network found to load, using random weights and biases");
            None
        }
        Err(error @ LoadError::ShapeMismatch { .. }) => {
            warn!(slot = name, %error, "Saved network does not fit this topology, using random weights and biases");
            None
        }
        Err(error) => {
            warn!(slot = name, %error, "Could not load saved network, using random weights and biases");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::activation::Activation::*;
    use crate::agent::Pose;

    /// Reports a fixed fitness and dies after `lifespan` ticks.
    #[derive(Debug, Default)]
    struct Dummy {
        fitness: f32,
        lifespan: Option<usize>,
        ticks: usize,
        resets: usize,
        last_output: Vec<f32>,
    }

    impl Agent for Dummy {
        fn is_alive(&self) -> bool {
            self.lifespan.map_or(true, |n| self.ticks < n)
        }

        fn check_failure(&mut self) {}

        fn sense_input(&mut self) -> Vec<f32> {
            vec![0.5, -0.5]
        }

        fn apply_output(&mut self, output: &[f32]) {
            self.last_output = output.to_vec();
            self.ticks += 1;
        }

        fn compute_fitness(&mut self) -> f32 {
            self.fitness
        }

        fn reset_to_start(&mut self, _pose: &Pose) {
            self.ticks = 0;
            self.resets += 1;
        }
    }

    fn config(population: usize) -> TrainerConfig {
        TrainerConfig {
            layer_sizes: vec![2, 3, 1],
            activations: vec![Input, ReLU, Sigmoid],
            population_size: population,
            generations: 2,
            time_per_generation: 1.0,
            seed: Some(42),
            ..TrainerConfig::default()
        }
    }

    fn dummies(fitness: &[f32]) -> Vec<Dummy> {
        fitness
            .iter()
            .map(|&fitness| Dummy {
                fitness,
                ..Dummy::default()
            })
            .collect()
    }

    #[test]
    fn test_new_rejects_wrong_agent_count() {
        let result = Trainer::new(config(3), dummies(&[1.0, 2.0]));
        assert!(matches!(
            result,
            Err(ConfigError::AgentCountMismatch {
                expected: 3,
                found: 2
            })
        ));
    }

    #[test]
    fn test_new_places_agents_at_start() {
        let trainer = Trainer::new(config(3), dummies(&[1.0, 2.0, 3.0])).unwrap();
        assert_eq!(trainer.phase(), Phase::Evaluating);
        assert_eq!(trainer.generation(), 0);
        assert!(trainer.agents().all(|a| a.resets == 1));
        assert!(trainer.best_fitness().is_none());
    }

    #[test]
    fn test_tick_feeds_output_and_records_fitness() {
        let mut trainer = Trainer::new(config(2), dummies(&[0.25, 0.75])).unwrap();
        let report = trainer.tick(0.1);

        assert_eq!(report.evaluated, 2);
        assert!(report.faults.is_empty());
        assert!((trainer.elapsed() - 0.1).abs() < 1e-6);
        let fitness: Vec<f32> = trainer.population().slots().iter().map(|s| s.fitness).collect();
        assert_eq!(fitness, vec![0.25, 0.75]);
        for agent in trainer.agents() {
            assert_eq!(agent.last_output.len(), 1);
            assert!((0.0..=1.0).contains(&agent.last_output[0]));
        }
    }

    #[test]
    fn test_step_moves_through_generations_to_finish() {
        let mut trainer = Trainer::new(config(2), dummies(&[1.0, 2.0])).unwrap();

        assert!(matches!(trainer.step(0.5).unwrap(), Step::Ticked(_)));
        assert!(matches!(trainer.step(0.5).unwrap(), Step::Ticked(_)));
        match trainer.step(0.5).unwrap() {
            Step::GenerationCompleted(summary) => {
                assert_eq!(summary.generation, 0);
                assert_eq!(summary.best_fitness, 2.0);
                assert_eq!(summary.mean_fitness, 1.5);
            }
            other => panic!("expected a generation boundary, got {:?}", other),
        }
        assert_eq!(trainer.elapsed(), 0.0);
        assert_eq!(trainer.best_fitness(), Some(2.0));

        let summaries = trainer.run(0.5).unwrap();
        assert_eq!(summaries.len(), 1);
        assert!(trainer.is_finished());
        assert_eq!(trainer.step(0.5).unwrap(), Step::Finished);
        assert!(matches!(trainer.advance_generation(), Err(TrainerError::Finished)));
        assert_eq!(trainer.tick(0.5), TickReport::default());
    }

    #[test]
    fn test_all_dead_ends_generation_early() {
        let agents = vec![
            Dummy {
                lifespan: Some(1),
                ..Dummy::default()
            },
            Dummy {
                lifespan: Some(2),
                ..Dummy::default()
            },
        ];
        let mut cfg = config(2);
        cfg.time_per_generation = 100.0;
        let mut trainer = Trainer::new(cfg, agents).unwrap();

        trainer.tick(0.1);
        assert!(!trainer.generation_over());
        let report = trainer.tick(0.1);
        assert_eq!(report.evaluated, 1);
        assert!(trainer.all_dead());
        assert!(matches!(trainer.step(0.1).unwrap(), Step::GenerationCompleted(_)));
        // Reset revives everyone.
        assert!(!trainer.all_dead());
    }

    #[test]
    fn test_zero_time_budget_closes_each_generation_immediately() {
        let mut cfg = config(2);
        cfg.time_per_generation = 0.0;
        let mut trainer = Trainer::new(cfg, dummies(&[0.0, 0.0])).unwrap();
        assert!(matches!(trainer.step(0.1).unwrap(), Step::GenerationCompleted(_)));
    }

    #[cfg(debug_assertions)]
    #[test]
    #[should_panic(expected = "tick delta must be finite")]
    fn test_nan_delta_is_caught() {
        let mut trainer = Trainer::new(config(2), dummies(&[0.0, 0.0])).unwrap();
        trainer.tick(f32::NAN);
    }

    #[test]
    fn test_completion_save_writes_last_generation_best() {
        let dir = std::env::temp_dir().join(format!("symbios-ffnn-trainer-best-{}", std::process::id()));
        let _ = std::fs::remove_dir_all(&dir);
        let cfg = TrainerConfig {
            generations: 1,
            mutation_rate: 1.0,
            save_on_completion: true,
            save_slot_name: "best".into(),
            save_dir: Some(dir.clone()),
            ..config(3)
        };
        let mut trainer = Trainer::new(cfg, dummies(&[0.2, 0.8, 0.5])).unwrap();
        let champion = trainer.population().slots()[1].genome.clone();

        trainer.tick(0.5);
        trainer.advance_generation().unwrap();

        assert!(trainer.is_finished());
        assert_eq!(trainer.best_genome(), Some(&champion));
        let saved = trainer
            .save_slots()
            .load("best", trainer.topology())
            .unwrap()
            .unwrap();
        assert_eq!(saved, champion);

        let _ = std::fs::remove_dir_all(&dir);
    }
}
