//! Evolve point agents that steer toward a fixed target.
//!
//! Run with `cargo run --example target_seek [config.toml]`. Without a config
//! file a small built-in setup is used. Set `RUST_LOG` for more detail.

use symbios_ffnn::{Activation, Agent, Pose, SelectionStrategy, Step, Trainer, TrainerConfig};

const TARGET: [f32; 2] = [4.0, -3.0];
const ARENA_RADIUS: f32 = 10.0;
const SPEED: f32 = 2.0;
const DT: f32 = 0.05;

/// A point on the XZ plane that moves with the velocity the network chooses.
struct Seeker {
    position: [f32; 2],
    velocity: [f32; 2],
    alive: bool,
}

impl Seeker {
    fn distance(&self) -> f32 {
        let dx = TARGET[0] - self.position[0];
        let dz = TARGET[1] - self.position[1];
        (dx * dx + dz * dz).sqrt()
    }
}

impl Agent for Seeker {
    fn is_alive(&self) -> bool {
        self.alive
    }

    fn check_failure(&mut self) {
        let [x, z] = self.position;
        if (x * x + z * z).sqrt() > ARENA_RADIUS {
            self.alive = false;
        }
    }

    fn sense_input(&mut self) -> Vec<f32> {
        vec![
            (TARGET[0] - self.position[0]) / ARENA_RADIUS,
            (TARGET[1] - self.position[1]) / ARENA_RADIUS,
        ]
    }

    fn apply_output(&mut self, output: &[f32]) {
        self.velocity = [output[0] * SPEED, output[1] * SPEED];
    }

    fn act(&mut self) {
        self.position[0] += self.velocity[0] * DT;
        self.position[1] += self.velocity[1] * DT;
    }

    fn compute_fitness(&mut self) -> f32 {
        self.distance()
    }

    fn reset_to_start(&mut self, pose: &Pose) {
        self.position = [pose.position[0], pose.position[2]];
        self.velocity = [0.0, 0.0];
        self.alive = true;
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();

    let config = match std::env::args().nth(1) {
        Some(path) => TrainerConfig::load(path)?,
        None => TrainerConfig {
            layer_sizes: vec![2, 6, 2],
            activations: vec![Activation::Input, Activation::Tanh, Activation::Tanh],
            selection: SelectionStrategy::TopHalf,
            population_size: 30,
            generations: 25,
            time_per_generation: 4.0,
            higher_fitness_is_better: false,
            mutation_rate: 0.2,
            learning_rate: 0.3,
            seed: Some(2024),
            ..TrainerConfig::default()
        },
    };

    let agents = (0..config.population_size).map(|_| Seeker {
        position: [0.0, 0.0],
        velocity: [0.0, 0.0],
        alive: true,
    });
    let mut trainer = Trainer::new(config, agents)?;

    loop {
        match trainer.step(DT)? {
            Step::Ticked(_) => {}
            Step::GenerationCompleted(summary) => println!(
                "generation {:>3}: closest {:.3}, mean {:.3}",
                summary.generation, summary.best_fitness, summary.mean_fitness
            ),
            Step::Finished => break,
        }
    }

    if let Some(best) = trainer.best_genome() {
        println!("best network has {} parameters", best.parameter_count());
    }
    Ok(())
}
