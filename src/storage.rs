//! Named save slots on local disk.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::error::{LoadError, RecordError};
use crate::genome::Genome;
use crate::record;
use crate::topology::Topology;

/// File extension of saved networks.
pub const SAVE_EXTENSION: &str = "chill";

/// Returns the platform data directory for saved networks.
///
/// Falls back to a local `.symbios-ffnn` directory if the platform directory
/// cannot be determined.
pub fn default_save_dir() -> PathBuf {
    match dirs::data_local_dir() {
        Some(mut path) => {
            path.push("symbios-ffnn");
            path
        }
        None => {
            warn!("Could not determine local data directory, falling back to .symbios-ffnn");
            PathBuf::from(".symbios-ffnn")
        }
    }
}

/// Whether `name` can be used as a slot without leaving the save directory.
///
/// Rejects empty names, path separators, NUL and anything containing `..`.
#[must_use]
pub fn is_valid_slot_name(name: &str) -> bool {
    !name.is_empty()
        && name != "."
        && !name.contains("..")
        && !name.contains(['/', '\\', '\0'])
}

/// A directory of saved networks, one `<name>.chill` file per slot.
#[derive(Debug, Clone)]
pub struct SaveSlots {
    dir: PathBuf,
}

impl SaveSlots {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Slots stored under [`default_save_dir`].
    pub fn platform_default() -> Self {
        Self::new(default_save_dir())
    }

    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    #[must_use]
    pub fn path_for(&self, name: &str) -> PathBuf {
        self.dir.join(format!("{name}.{SAVE_EXTENSION}"))
    }

    /// Write `genome` to the slot `name`, replacing any previous save.
    ///
    /// # Errors
    ///
    /// Returns [`RecordError`] if encoding fails or the file cannot be written.
    pub fn save(
        &self,
        name: &str,
        genome: &Genome,
        topology: &Topology,
    ) -> Result<PathBuf, RecordError> {
        let bytes = record::save(genome, topology.input_size(), topology.output_size())?;
        let path = self.path_for(name);
        let io_err = |source| RecordError::Io {
            path: path.clone(),
            source,
        };
        fs::create_dir_all(&self.dir).map_err(io_err)?;
        fs::write(&path, bytes).map_err(io_err)?;
        debug!(path = %path.display(), "wrote saved network");
        Ok(path)
    }

    /// Read the slot `name` and check it against `topology`.
    ///
    /// A slot that does not exist yet is `Ok(None)`, not an error.
    ///
    /// # Errors
    ///
    /// Returns [`LoadError`] if the file cannot be read, decoded, or does not
    /// fit `topology`.
    pub fn load(&self, name: &str, topology: &Topology) -> Result<Option<Genome>, LoadError> {
        let path = self.path_for(name);
        let bytes = match fs::read(&path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                info!(path = %path.display(), "no saved network yet");
                return Ok(None);
            }
            Err(source) => return Err(LoadError::Io { path, source }),
        };
        record::load(&bytes, topology).map(Some)
    }
}
