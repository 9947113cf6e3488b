//! Weight and bias storage for fixed-topology networks.
//!
//! A [`Genome`] holds one weight block and one bias vector per layer. Layer 0
//! is the input layer and owns empty blocks, so `weights[l]` and `biases[l]`
//! always describe the synapses *into* layer `l`:
//!
//! - `weights[l][n][p]`: weight from neuron `p` of layer `l - 1` to neuron `n` of layer `l`
//! - `biases[l][n]`: bias of neuron `n` of layer `l`
//!
//! Reproduction never edits a genome in place: [`Genome::mutate`] and
//! [`Genome::crossover`] both allocate and return a fresh genome.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::topology::Topology;

/// Closed interval used for random parameter initialization.
///
/// `min` and `max` may be given in either order; the interval is treated as
/// unordered, so `(1.0, -1.0)` samples the same values as `(-1.0, 1.0)`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct InitRange {
    pub min: f32,
    pub max: f32,
}

impl InitRange {
    #[must_use]
    pub const fn new(min: f32, max: f32) -> Self {
        Self { min, max }
    }

    /// Both bounds and the width between them are finite.
    ///
    /// `(-3e38, 3e38)` has finite bounds but an infinite width, which the
    /// uniform sampler cannot draw from.
    #[must_use]
    pub fn is_finite(&self) -> bool {
        self.min.is_finite() && self.max.is_finite() && (self.max - self.min).is_finite()
    }

    /// Draw a value uniformly from the interval.
    ///
    /// # Panics
    ///
    /// Panics unless [`InitRange::is_finite`] holds.
    pub fn sample<R: Rng>(&self, rng: &mut R) -> f32 {
        let (lo, hi) = if self.min <= self.max {
            (self.min, self.max)
        } else {
            (self.max, self.min)
        };
        rng.random_range(lo..=hi)
    }
}

impl Default for InitRange {
    fn default() -> Self {
        Self::new(-1.0, 1.0)
    }
}

/// Per-parameter mutation settings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MutationParams {
    /// Probability that any single weight or bias is perturbed.
    pub mutation_rate: f32,
    /// Bound on each perturbation: values move by `U(-learning_rate, learning_rate)`.
    pub learning_rate: f32,
}

impl MutationParams {
    #[must_use]
    pub const fn new(mutation_rate: f32, learning_rate: f32) -> Self {
        Self {
            mutation_rate,
            learning_rate,
        }
    }

    /// The perturbation interval `[-learning_rate, learning_rate]` has a
    /// finite width, so it can be sampled.
    #[must_use]
    pub fn is_sampleable(&self) -> bool {
        (2.0 * self.learning_rate).is_finite()
    }
}

/// The full parameter set of one network.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Genome {
    /// `weights[layer][neuron][prev_neuron]`; `weights[0]` is empty.
    pub weights: Vec<Vec<Vec<f32>>>,
    /// `biases[layer][neuron]`; `biases[0]` is empty.
    pub biases: Vec<Vec<f32>>,
}

impl Genome {
    /// A genome for `topology` with every weight and bias set to zero.
    #[must_use]
    pub fn zeroed(topology: &Topology) -> Self {
        Self::from_fn(topology, || 0.0, || 0.0)
    }

    /// A genome with every weight drawn from `weights` and every bias from `biases`.
    ///
    /// Draw order is layer by layer, neuron by neuron: the neuron's incoming
    /// weights first, then its bias.
    ///
    /// # Panics
    ///
    /// Panics if either range has a non-finite bound.
    #[must_use]
    pub fn random_init<R: Rng>(
        topology: &Topology,
        weights: InitRange,
        biases: InitRange,
        rng: &mut R,
    ) -> Self {
        let sizes = topology.layer_sizes();
        let mut genome = Self {
            weights: Vec::with_capacity(sizes.len()),
            biases: Vec::with_capacity(sizes.len()),
        };
        genome.weights.push(Vec::new());
        genome.biases.push(Vec::new());

        for pair in sizes.windows(2) {
            let (prev, size) = (pair[0], pair[1]);
            let mut layer_weights = Vec::with_capacity(size);
            let mut layer_biases = Vec::with_capacity(size);
            for _ in 0..size {
                layer_weights.push((0..prev).map(|_| weights.sample(rng)).collect());
                layer_biases.push(biases.sample(rng));
            }
            genome.weights.push(layer_weights);
            genome.biases.push(layer_biases);
        }
        genome
    }

    fn from_fn(
        topology: &Topology,
        mut weight: impl FnMut() -> f32,
        mut bias: impl FnMut() -> f32,
    ) -> Self {
        let sizes = topology.layer_sizes();
        let mut weights = vec![Vec::new()];
        let mut biases = vec![Vec::new()];
        for pair in sizes.windows(2) {
            weights.push(
                (0..pair[1])
                    .map(|_| (0..pair[0]).map(|_| weight()).collect())
                    .collect(),
            );
            biases.push((0..pair[1]).map(|_| bias()).collect());
        }
        Self { weights, biases }
    }

    /// Number of layers described, including the empty input layer.
    #[must_use]
    pub fn layer_count(&self) -> usize {
        self.biases.len()
    }

    /// Whether every block has exactly the shape `topology` requires.
    #[must_use]
    pub fn matches(&self, topology: &Topology) -> bool {
        let sizes = topology.layer_sizes();
        if self.weights.len() != sizes.len() || self.biases.len() != sizes.len() {
            return false;
        }
        if !self.weights[0].is_empty() || !self.biases[0].is_empty() {
            return false;
        }
        (1..sizes.len()).all(|l| {
            self.biases[l].len() == sizes[l]
                && self.weights[l].len() == sizes[l]
                && self.weights[l].iter().all(|row| row.len() == sizes[l - 1])
        })
    }

    /// Whether `other` has the same block structure as `self`.
    #[must_use]
    pub fn same_shape(&self, other: &Self) -> bool {
        self.biases.len() == other.biases.len()
            && self
                .biases
                .iter()
                .zip(&other.biases)
                .all(|(a, b)| a.len() == b.len())
            && self.weights.len() == other.weights.len()
            && self.weights.iter().zip(&other.weights).all(|(a, b)| {
                a.len() == b.len() && a.iter().zip(b).all(|(ra, rb)| ra.len() == rb.len())
            })
    }

    /// All parameters in mutation order: per neuron, its bias then its incoming weights.
    pub fn parameters(&self) -> impl Iterator<Item = f32> + '_ {
        self.weights
            .iter()
            .zip(&self.biases)
            .skip(1)
            .flat_map(|(rows, biases)| {
                rows.iter()
                    .zip(biases)
                    .flat_map(|(row, &bias)| std::iter::once(bias).chain(row.iter().copied()))
            })
    }

    /// Total number of weights and biases.
    #[must_use]
    pub fn parameter_count(&self) -> usize {
        self.biases.iter().map(Vec::len).sum::<usize>()
            + self
                .weights
                .iter()
                .flat_map(|rows| rows.iter().map(Vec::len))
                .sum::<usize>()
    }

    /// Return a mutated copy of this genome.
    ///
    /// Every bias and weight of layers 1.. independently rolls `U[0, 1)`;
    /// when the roll is `<= mutation_rate` the value is shifted by
    /// `U(-learning_rate, learning_rate)`, otherwise it is copied unchanged.
    /// A rate of zero never perturbs anything, but still consumes one roll per
    /// parameter so the RNG stream does not depend on the rate.
    ///
    /// # Panics
    ///
    /// Panics unless [`MutationParams::is_sampleable`] holds.
    #[must_use]
    pub fn mutate<R: Rng>(&self, params: &MutationParams, rng: &mut R) -> Self {
        let mut child = self.clone();
        let bound = params.learning_rate.abs();
        let mut perturb = |value: &mut f32| {
            let roll: f32 = rng.random();
            if params.mutation_rate > 0.0 && roll <= params.mutation_rate {
                *value += rng.random_range(-bound..=bound);
            }
        };

        for (rows, biases) in child.weights.iter_mut().zip(&mut child.biases).skip(1) {
            for (row, bias) in rows.iter_mut().zip(biases.iter_mut()) {
                perturb(bias);
                for weight in row.iter_mut() {
                    perturb(weight);
                }
            }
        }
        child
    }

    /// Average this genome with `other`, element by element.
    ///
    /// Both genomes must share a shape (see [`Genome::same_shape`]); the
    /// result has the shape of `self`.
    #[must_use]
    pub fn crossover(&self, other: &Self) -> Self {
        debug_assert!(self.same_shape(other), "crossover of mismatched genomes");
        let mut child = self.clone();
        for (rows, other_rows) in child.weights.iter_mut().zip(&other.weights) {
            for (row, other_row) in rows.iter_mut().zip(other_rows) {
                for (w, &o) in row.iter_mut().zip(other_row) {
                    *w = (*w + o) / 2.0;
                }
            }
        }
        for (biases, other_biases) in child.biases.iter_mut().zip(&other.biases) {
            for (b, &o) in biases.iter_mut().zip(other_biases) {
                *b = (*b + o) / 2.0;
            }
        }
        child
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::activation::Activation::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn test_rng() -> ChaCha8Rng {
        ChaCha8Rng::seed_from_u64(42)
    }

    fn topo() -> Topology {
        Topology::validate(&[3, 4, 2], &[Input, Tanh, Sigmoid], None).unwrap()
    }

    fn random_genome(rng: &mut ChaCha8Rng) -> Genome {
        Genome::random_init(&topo(), InitRange::new(-1.0, 1.0), InitRange::new(-0.5, 0.5), rng)
    }

    #[test]
    fn test_random_init_shape_and_bounds() {
        let mut rng = test_rng();
        let genome = Genome::random_init(
            &topo(),
            InitRange::new(0.3, 0.7),
            InitRange::new(-2.0, -1.0),
            &mut rng,
        );

        assert!(genome.matches(&topo()));
        assert!(genome.weights[0].is_empty());
        assert!(genome.biases[0].is_empty());
        assert_eq!(genome.parameter_count(), topo().parameter_count());
        for rows in &genome.weights[1..] {
            for &w in rows.iter().flatten() {
                assert!((0.3..=0.7).contains(&w), "weight out of range: {}", w);
            }
        }
        for &b in genome.biases[1..].iter().flatten() {
            assert!((-2.0..=-1.0).contains(&b), "bias out of range: {}", b);
        }
    }

    #[test]
    fn test_reversed_range_is_unordered() {
        let mut rng = test_rng();
        let range = InitRange::new(1.0, -1.0);
        for _ in 0..200 {
            let v = range.sample(&mut rng);
            assert!((-1.0..=1.0).contains(&v));
        }
        assert_eq!(InitRange::new(0.25, 0.25).sample(&mut rng), 0.25);
    }

    #[test]
    fn test_sampling_guards_reject_overflowing_widths() {
        assert!(InitRange::new(-1.0e38, 1.0e38).is_finite());
        assert!(!InitRange::new(-3.0e38, 3.0e38).is_finite());
        assert!(!InitRange::new(f32::NEG_INFINITY, 0.0).is_finite());

        assert!(MutationParams::new(1.0, 1.0e38).is_sampleable());
        assert!(!MutationParams::new(1.0, 3.0e38).is_sampleable());
        assert!(!MutationParams::new(1.0, f32::NAN).is_sampleable());
    }

    #[test]
    fn test_matches_rejects_wrong_shape() {
        let mut genome = Genome::zeroed(&topo());
        assert!(genome.matches(&topo()));

        genome.weights[2][1].push(0.0);
        assert!(!genome.matches(&topo()));

        let other = Topology::validate(&[3, 2], &[Input, Sigmoid], None).unwrap();
        assert!(!Genome::zeroed(&topo()).matches(&other));
    }

    #[test]
    fn test_mutate_zero_rate_is_identity() {
        let mut rng = test_rng();
        let genome = random_genome(&mut rng);
        let child = genome.mutate(&MutationParams::new(0.0, 5.0), &mut rng);
        assert_eq!(child, genome);
    }

    #[test]
    fn test_mutate_full_rate_bounded_by_learning_rate() {
        let mut rng = test_rng();
        let genome = random_genome(&mut rng);
        let lr = 0.1;
        let child = genome.mutate(&MutationParams::new(1.0, lr), &mut rng);

        assert!(child.same_shape(&genome));
        let mut changed = 0;
        for (before, after) in genome.parameters().zip(child.parameters()) {
            assert!(
                (after - before).abs() <= lr + 1e-6,
                "delta too large: {} -> {}",
                before,
                after
            );
            if after != before {
                changed += 1;
            }
        }
        assert!(changed > genome.parameter_count() / 2);
    }

    #[test]
    fn test_mutate_keeps_unselected_values() {
        let mut rng = test_rng();
        let genome = random_genome(&mut rng);
        let child = genome.mutate(&MutationParams::new(0.2, 1.0), &mut rng);

        // Values are copied, not zeroed, when their roll fails.
        let unchanged = genome
            .parameters()
            .zip(child.parameters())
            .filter(|(a, b)| a == b)
            .count();
        assert!(unchanged > 0);
        assert!(child.parameters().all(|v| v != 0.0));
    }

    #[test]
    fn test_mutate_does_not_touch_parent() {
        let mut rng = test_rng();
        let genome = random_genome(&mut rng);
        let snapshot = genome.clone();
        let _ = genome.mutate(&MutationParams::new(1.0, 1.0), &mut rng);
        assert_eq!(genome, snapshot);
    }

    #[test]
    fn test_self_crossover_is_identity() {
        let mut rng = test_rng();
        let genome = random_genome(&mut rng);
        assert_eq!(genome.crossover(&genome), genome);
    }

    #[test]
    fn test_crossover_is_elementwise_mean() {
        let mut rng = test_rng();
        let a = random_genome(&mut rng);
        let b = random_genome(&mut rng);
        let child = a.crossover(&b);

        assert!(child.matches(&topo()));
        for ((x, y), c) in a.parameters().zip(b.parameters()).zip(child.parameters()) {
            assert!((c - (x + y) / 2.0).abs() < 1e-6);
        }
    }
}
