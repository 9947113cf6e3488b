//! Binary record format for a saved network.
//!
//! A record is a [`Genome`] plus the input and output sizes it was trained
//! with, prefixed by a magic tag and a format version. The body is encoded
//! with `bincode`, whose length-prefixed sequences give every nested block
//! an explicit length on disk.

use serde::{Deserialize, Serialize};

use crate::error::{LoadError, RecordError};
use crate::genome::Genome;
use crate::topology::Topology;

/// Leading bytes of every saved network.
pub const RECORD_MAGIC: [u8; 4] = *b"CHIL";

/// Current record format version.
pub const RECORD_VERSION: u16 = 1;

/// The persisted form of a trained network.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkRecord {
    pub magic: [u8; 4],
    pub version: u16,
    pub input_size: u32,
    pub output_size: u32,
    /// `weights[layer][neuron][prev_neuron]`; layer 0 is present but empty.
    pub weights: Vec<Vec<Vec<f32>>>,
    /// `biases[layer][neuron]`; layer 0 is present but empty.
    pub biases: Vec<Vec<f32>>,
}

impl NetworkRecord {
    /// Build a record for `genome`.
    ///
    /// # Errors
    ///
    /// Returns [`RecordError::SizeOverflow`] if either size exceeds `u32::MAX`.
    pub fn new(genome: &Genome, input_size: usize, output_size: usize) -> Result<Self, RecordError> {
        Ok(Self {
            magic: RECORD_MAGIC,
            version: RECORD_VERSION,
            input_size: size_field("input", input_size)?,
            output_size: size_field("output", output_size)?,
            weights: genome.weights.clone(),
            biases: genome.biases.clone(),
        })
    }

    /// Check the record against `topology` and turn it into a genome.
    ///
    /// # Errors
    ///
    /// - [`LoadError::BadMagic`] / [`LoadError::UnsupportedVersion`] for foreign data
    /// - [`LoadError::ShapeMismatch`] if layer count, input size or output size differ
    /// - [`LoadError::Malformed`] if any block has the wrong length
    pub fn into_genome(self, topology: &Topology) -> Result<Genome, LoadError> {
        if self.magic != RECORD_MAGIC {
            return Err(LoadError::BadMagic);
        }
        if self.version != RECORD_VERSION {
            return Err(LoadError::UnsupportedVersion {
                found: self.version,
            });
        }

        let layers = self.biases.len();
        if layers != topology.network_size()
            || self.input_size as usize != topology.input_size()
            || self.output_size as usize != topology.output_size()
        {
            return Err(LoadError::ShapeMismatch {
                expected_layers: topology.network_size(),
                expected_input: topology.input_size(),
                expected_output: topology.output_size(),
                found_layers: layers,
                found_input: self.input_size as usize,
                found_output: self.output_size as usize,
            });
        }

        let genome = Genome {
            weights: self.weights,
            biases: self.biases,
        };
        if !genome.matches(topology) {
            let sizes = topology.layer_sizes();
            let layer = (0..sizes.len())
                .find(|&l| !layer_matches(&genome, sizes, l))
                .unwrap_or(0);
            return Err(LoadError::Malformed { layer });
        }
        Ok(genome)
    }
}

fn size_field(which: &'static str, size: usize) -> Result<u32, RecordError> {
    u32::try_from(size).map_err(|_| RecordError::SizeOverflow { which, size })
}

fn layer_matches(genome: &Genome, sizes: &[usize], layer: usize) -> bool {
    let (Some(rows), Some(biases)) = (genome.weights.get(layer), genome.biases.get(layer)) else {
        return false;
    };
    if layer == 0 {
        return rows.is_empty() && biases.is_empty();
    }
    rows.len() == sizes[layer]
        && biases.len() == sizes[layer]
        && rows.iter().all(|row| row.len() == sizes[layer - 1])
}

/// Encode `genome` as a record declaring `input_size` and `output_size`.
///
/// # Errors
///
/// Returns [`RecordError::SizeOverflow`] if a size does not fit the record,
/// or [`RecordError::Encode`] if serialization fails.
pub fn save(genome: &Genome, input_size: usize, output_size: usize) -> Result<Vec<u8>, RecordError> {
    let record = NetworkRecord::new(genome, input_size, output_size)?;
    Ok(bincode::serialize(&record)?)
}

/// Decode a record and check it against `topology`.
///
/// # Errors
///
/// [`LoadError::Decode`] for undecodable bytes, otherwise any error of
/// [`NetworkRecord::into_genome`].
pub fn load(bytes: &[u8], topology: &Topology) -> Result<Genome, LoadError> {
    let record: NetworkRecord = bincode::deserialize(bytes)?;
    record.into_genome(topology)
}
