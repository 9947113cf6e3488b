//! Ranked population slots and the reproduction strategies.
//!
//! A [`Population`] is a fixed set of slots indexed `0..N`. Ranking reorders
//! whole slots (genome, fitness and agent handle move together), so after
//! [`Population::rank`] slot 0 holds the best performer. Reproduction then
//! overwrites the genomes of the lower slots and never touches the kept
//! top slots.

use std::cmp::Ordering;

use rand::Rng;

use crate::agent::AgentId;
use crate::config::SelectionStrategy;
use crate::genome::{Genome, MutationParams};

/// Which end of the fitness scale wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum FitnessDirection {
    #[default]
    HigherIsBetter,
    LowerIsBetter,
}

impl FitnessDirection {
    /// Order `a` relative to `b`, better first.
    ///
    /// NaN is treated as worse than every number in both directions, so NaN
    /// fitness sinks to the bottom of the ranking instead of poisoning it.
    #[must_use]
    pub fn compare(self, a: f32, b: f32) -> Ordering {
        match (a.is_nan(), b.is_nan()) {
            (true, true) => Ordering::Equal,
            (true, false) => Ordering::Greater,
            (false, true) => Ordering::Less,
            (false, false) => match self {
                Self::HigherIsBetter => b.partial_cmp(&a).unwrap_or(Ordering::Equal),
                Self::LowerIsBetter => a.partial_cmp(&b).unwrap_or(Ordering::Equal),
            },
        }
    }

    /// `a` is at least as good as `b`.
    #[must_use]
    pub fn no_worse(self, a: f32, b: f32) -> bool {
        self.compare(a, b) != Ordering::Greater
    }
}

/// One member of the population.
#[derive(Debug, Clone, PartialEq)]
pub struct Slot {
    pub genome: Genome,
    pub fitness: f32,
    /// The agent this genome drives.
    pub agent: AgentId,
}

impl Slot {
    #[must_use]
    pub fn new(genome: Genome, agent: AgentId) -> Self {
        Self {
            genome,
            fitness: 0.0,
            agent,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Population {
    slots: Vec<Slot>,
}

impl Population {
    #[must_use]
    pub fn new(slots: Vec<Slot>) -> Self {
        Self { slots }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    #[must_use]
    pub fn slots(&self) -> &[Slot] {
        &self.slots
    }

    pub fn slots_mut(&mut self) -> &mut [Slot] {
        &mut self.slots
    }

    /// The slot at index 0, which is the best one right after ranking.
    #[must_use]
    pub fn top(&self) -> Option<&Slot> {
        self.slots.first()
    }

    /// Mean fitness over all slots, or `None` when empty.
    #[must_use]
    pub fn mean_fitness(&self) -> Option<f32> {
        if self.slots.is_empty() {
            return None;
        }
        let total: f32 = self.slots.iter().map(|s| s.fitness).sum();
        Some(total / self.slots.len() as f32)
    }

    /// Sort slots best first and return the top fitness.
    ///
    /// The sort is stable: slots with equal fitness keep their relative order.
    pub fn rank(&mut self, direction: FitnessDirection) -> Option<f32> {
        self.slots
            .sort_by(|a, b| direction.compare(a.fitness, b.fitness));
        self.top().map(|s| s.fitness)
    }

    /// Breed the next generation in place from an already ranked population.
    ///
    /// - `TopHalf`: with `cutoff = ceil(N / 2)`, slot `i` in `cutoff..N`
    ///   receives a mutation of slot `i - cutoff`.
    /// - `TopTwo`: slots 0 and 1 are averaged into one child; every slot in
    ///   `2..N` receives its own independent mutation of that child.
    ///   Needs at least two slots to do anything.
    /// - `Top`: every slot in `1..N` receives a mutation of slot 0.
    pub fn reproduce<R: Rng>(
        &mut self,
        strategy: SelectionStrategy,
        params: &MutationParams,
        rng: &mut R,
    ) {
        let n = self.slots.len();
        match strategy {
            SelectionStrategy::TopHalf => {
                let cutoff = n.div_ceil(2);
                for i in cutoff..n {
                    let child = self.slots[i - cutoff].genome.mutate(params, rng);
                    self.slots[i].genome = child;
                }
            }
            SelectionStrategy::TopTwo => {
                if n < 2 {
                    return;
                }
                let child = self.slots[0].genome.crossover(&self.slots[1].genome);
                for slot in &mut self.slots[2..] {
                    slot.genome = child.mutate(params, rng);
                }
            }
            SelectionStrategy::Top => {
                let Some((champion, rest)) = self.slots.split_first_mut() else {
                    return;
                };
                for slot in rest {
                    slot.genome = champion.genome.mutate(params, rng);
                }
            }
        }
    }

    /// Zero every slot's fitness for the next generation.
    pub fn reset_fitness(&mut self) {
        for slot in &mut self.slots {
            slot.fitness = 0.0;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::activation::Activation::*;
    use crate::genome::InitRange;
    use crate::topology::Topology;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn test_rng() -> ChaCha8Rng {
        ChaCha8Rng::seed_from_u64(42)
    }

    fn population(fitness: &[f32], rng: &mut ChaCha8Rng) -> Population {
        let topo = Topology::validate(&[2, 3, 1], &[Input, ReLU, Sigmoid], None).unwrap();
        Population::new(
            fitness
                .iter()
                .map(|&f| Slot {
                    genome: Genome::random_init(&topo, InitRange::default(), InitRange::default(), rng),
                    fitness: f,
                    agent: AgentId::default(),
                })
                .collect(),
        )
    }

    fn fitnesses(pop: &Population) -> Vec<f32> {
        pop.slots().iter().map(|s| s.fitness).collect()
    }

    #[test]
    fn test_rank_descending_when_higher_is_better() {
        let mut rng = test_rng();
        let mut pop = population(&[0.1, 0.9, 0.3, 0.7], &mut rng);
        let best = pop.rank(FitnessDirection::HigherIsBetter);
        assert_eq!(best, Some(0.9));
        assert_eq!(fitnesses(&pop), vec![0.9, 0.7, 0.3, 0.1]);
    }

    #[test]
    fn test_rank_ascending_when_lower_is_better() {
        let mut rng = test_rng();
        let mut pop = population(&[0.1, 0.9, 0.3, 0.7], &mut rng);
        assert_eq!(pop.rank(FitnessDirection::LowerIsBetter), Some(0.1));
        assert_eq!(fitnesses(&pop), vec![0.1, 0.3, 0.7, 0.9]);
    }

    #[test]
    fn test_rank_is_stable() {
        let mut rng = test_rng();
        let mut pop = population(&[1.0, 2.0, 1.0, 2.0, 1.0], &mut rng);
        let before: Vec<Genome> = pop.slots().iter().map(|s| s.genome.clone()).collect();
        pop.rank(FitnessDirection::HigherIsBetter);

        let after: Vec<&Genome> = pop.slots().iter().map(|s| &s.genome).collect();
        assert_eq!(
            after,
            vec![&before[1], &before[3], &before[0], &before[2], &before[4]]
        );
    }

    #[test]
    fn test_rank_is_total_and_sinks_nan() {
        let mut rng = test_rng();
        for direction in [FitnessDirection::HigherIsBetter, FitnessDirection::LowerIsBetter] {
            let mut pop = population(&[0.5, f32::NAN, -2.0, 3.0, 0.5, f32::NAN], &mut rng);
            pop.rank(direction);
            let f = fitnesses(&pop);
            for pair in f.windows(2) {
                assert!(direction.no_worse(pair[0], pair[1]), "{:?} misordered", f);
            }
            assert!(f[4].is_nan() && f[5].is_nan());
        }
    }

    #[test]
    fn test_top_half_keeps_upper_slots() {
        let mut rng = test_rng();
        let mut pop = population(&[5.0, 4.0, 3.0, 2.0, 1.0], &mut rng);
        pop.rank(FitnessDirection::HigherIsBetter);
        let before = pop.clone();

        pop.reproduce(SelectionStrategy::TopHalf, &MutationParams::new(1.0, 0.5), &mut rng);

        // cutoff = ceil(5 / 2) = 3
        for i in 0..3 {
            assert_eq!(pop.slots()[i].genome, before.slots()[i].genome);
        }
        for i in 3..5 {
            assert_ne!(pop.slots()[i].genome, before.slots()[i].genome);
        }
    }

    #[test]
    fn test_top_half_copies_exactly_without_mutation() {
        let mut rng = test_rng();
        let mut pop = population(&[4.0, 3.0, 2.0, 1.0], &mut rng);
        pop.reproduce(SelectionStrategy::TopHalf, &MutationParams::new(0.0, 1.0), &mut rng);
        assert_eq!(pop.slots()[2].genome, pop.slots()[0].genome);
        assert_eq!(pop.slots()[3].genome, pop.slots()[1].genome);
    }

    #[test]
    fn test_top_two_children_are_independent() {
        let mut rng = test_rng();
        let mut pop = population(&[4.0, 3.0, 2.0, 1.0, 0.0], &mut rng);
        let before = pop.clone();
        let child = before.slots()[0].genome.crossover(&before.slots()[1].genome);

        let lr = 0.25;
        pop.reproduce(SelectionStrategy::TopTwo, &MutationParams::new(1.0, lr), &mut rng);

        assert_eq!(pop.slots()[0].genome, before.slots()[0].genome);
        assert_eq!(pop.slots()[1].genome, before.slots()[1].genome);
        for slot in &pop.slots()[2..] {
            // Each slot is one mutation away from the shared child, not a chain.
            for (c, v) in child.parameters().zip(slot.genome.parameters()) {
                assert!((v - c).abs() <= lr + 1e-6);
            }
        }
        assert_ne!(pop.slots()[2].genome, pop.slots()[3].genome);
    }

    #[test]
    fn test_top_two_without_mutation_is_crossover() {
        let mut rng = test_rng();
        let mut pop = population(&[3.0, 2.0, 1.0], &mut rng);
        let child = pop.slots()[0].genome.crossover(&pop.slots()[1].genome);
        pop.reproduce(SelectionStrategy::TopTwo, &MutationParams::new(0.0, 1.0), &mut rng);
        assert_eq!(pop.slots()[2].genome, child);
    }

    #[test]
    fn test_top_clones_champion() {
        let mut rng = test_rng();
        let mut pop = population(&[3.0, 2.0, 1.0, 0.0], &mut rng);
        let champion = pop.slots()[0].genome.clone();

        pop.reproduce(SelectionStrategy::Top, &MutationParams::new(0.0, 1.0), &mut rng);
        assert!(pop.slots().iter().all(|s| s.genome == champion));

        pop.reproduce(SelectionStrategy::Top, &MutationParams::new(1.0, 1.0), &mut rng);
        assert_eq!(pop.slots()[0].genome, champion);
        assert!(pop.slots()[1..].iter().all(|s| s.genome != champion));
    }

    #[test]
    fn test_reset_fitness() {
        let mut rng = test_rng();
        let mut pop = population(&[3.0, -2.0], &mut rng);
        assert_eq!(pop.mean_fitness(), Some(0.5));
        pop.reset_fitness();
        assert_eq!(fitnesses(&pop), vec![0.0, 0.0]);
    }
}
