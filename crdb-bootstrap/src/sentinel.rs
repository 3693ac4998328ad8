use super::*;

use std::fs::{File, OpenOptions};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// Marker on the durable volume proving this replica has taken part in a formed cluster.
/// Only the existence of the file is meaningful. Its content is always empty.
pub struct SentinelStore {
    path: PathBuf,
}

impl SentinelStore {
    pub fn new(data_dir: impl AsRef<Path>, name: &str) -> Self {
        Self {
            path: data_dir.as_ref().join(name),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_error(&self, source: std::io::Error) -> Error {
        Error::SentinelIo {
            path: self.path.clone(),
            source,
        }
    }

    /// A freshly provisioned volume has no marker and that is not an error.
    /// Anything other than "found" or "not found" is, because the decision could not be trusted.
    pub fn has_sentinel(&self) -> Result<bool, Error> {
        match std::fs::symlink_metadata(&self.path) {
            Ok(meta) if meta.is_file() => Ok(true),
            Ok(_) => Err(self.io_error(std::io::Error::new(
                ErrorKind::InvalidData,
                "sentinel path exists but is not a regular file",
            ))),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(self.io_error(e)),
        }
    }

    /// Create the marker if absent. Calling this again is a no-op.
    /// The file and its directory entry are synced before returning.
    pub fn write_sentinel(&self) -> Result<(), Error> {
        let created = match OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&self.path)
        {
            Ok(file) => {
                file.sync_all().map_err(|e| self.io_error(e))?;
                true
            }
            Err(e) if e.kind() == ErrorKind::AlreadyExists => false,
            Err(e) => return Err(self.io_error(e)),
        };

        // The directory entry must also survive a crash right after this call.
        // A retry after a crash takes the `AlreadyExists` path, so sync in both cases.
        if let Some(dir) = self.path.parent() {
            sync_dir(dir).map_err(|e| self.io_error(e))?;
        }

        if created {
            info!("created sentinel at {}", self.path.display());
        } else {
            debug!("sentinel already present at {}", self.path.display());
        }
        Ok(())
    }
}

#[cfg(unix)]
fn sync_dir(dir: &Path) -> std::io::Result<()> {
    File::open(dir)?.sync_all()
}

#[cfg(not(unix))]
fn sync_dir(_: &Path) -> std::io::Result<()> {
    Ok(())
}
