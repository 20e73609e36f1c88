//! Durable file access for the location stores.
//!
//! Every store owns one [`DataFile`] and rewrites it completely after each
//! successful mutation. Two write modes are supported:
//!
//! - [`WriteMode::Atomic`] writes a sibling temp file, syncs it to disk and
//!   renames it over the target, so a crash mid-write leaves either the old
//!   or the new contents.
//! - [`WriteMode::Truncate`] truncates the target and writes in place. A
//!   crash between the two steps can lose every entry.
//!
//! Both modes produce identical bytes.

use crate::codec::Decoded;
use crate::error::{EssentialsError, Result};
use serde::{Deserialize, Serialize};
use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::process;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{debug, error, info, warn};

static TEMP_COUNTER: AtomicU64 = AtomicU64::new(0);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WriteMode {
    #[default]
    Atomic,
    Truncate,
}

/// One data file under the plugin's data directory.
#[derive(Debug, Clone)]
pub struct DataFile {
    path: PathBuf,
    mode: WriteMode,
}

impl DataFile {
    pub fn new(path: impl Into<PathBuf>, mode: WriteMode) -> Self {
        Self {
            path: path.into(),
            mode,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn mode(&self) -> WriteMode {
        self.mode
    }

    /// Reads the whole file. `Ok(None)` when it does not exist yet.
    pub fn read(&self) -> Result<Option<String>> {
        match fs::read_to_string(&self.path) {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(EssentialsError::persistence(
                &self.path,
                format!("Failed to read {}", self.path.display()),
                e,
            )),
        }
    }

    /// Replaces the file contents, creating parent directories as needed.
    pub fn write(&self, contents: &str) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent).map_err(|e| {
                    EssentialsError::persistence(
                        parent,
                        format!("Failed to create directory {}", parent.display()),
                        e,
                    )
                })?;
            }
        }

        match self.mode {
            WriteMode::Atomic => self.write_atomic(contents)?,
            WriteMode::Truncate => fs::write(&self.path, contents).map_err(|e| {
                EssentialsError::persistence(
                    &self.path,
                    format!("Failed to write {}", self.path.display()),
                    e,
                )
            })?,
        }

        debug!("Wrote {} ({:?})", self.path.display(), self.mode);
        Ok(())
    }

    fn write_atomic(&self, contents: &str) -> Result<()> {
        let temp_path = self.temp_path();

        let written = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(&temp_path)
            .and_then(|mut file| {
                file.write_all(contents.as_bytes())?;
                file.flush()?;
                file.sync_all()
            });

        if let Err(e) = written {
            let _ = fs::remove_file(&temp_path);
            return Err(EssentialsError::persistence(
                &temp_path,
                format!("Failed to write temp file {}", temp_path.display()),
                e,
            ));
        }

        fs::rename(&temp_path, &self.path).map_err(|e| {
            let _ = fs::remove_file(&temp_path);
            EssentialsError::persistence(
                &self.path,
                format!(
                    "Failed to rename {} to {}",
                    temp_path.display(),
                    self.path.display()
                ),
                e,
            )
        })
    }

    fn temp_path(&self) -> PathBuf {
        let file_name = self
            .path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "data".to_string());
        let counter = TEMP_COUNTER.fetch_add(1, Ordering::Relaxed);
        self.path
            .with_file_name(format!(".{file_name}.{}.{counter}.tmp", process::id()))
    }

    /// Path of the copy kept when the file could not be loaded.
    pub fn backup_path(&self) -> PathBuf {
        let mut name = self.path.as_os_str().to_owned();
        name.push(".bak");
        PathBuf::from(name)
    }

    fn preserve_backup(&self) -> Result<PathBuf> {
        let backup = self.backup_path();
        fs::copy(&self.path, &backup).map_err(|e| {
            EssentialsError::persistence(
                &backup,
                format!("Failed to back up {}", self.path.display()),
                e,
            )
        })?;
        Ok(backup)
    }
}

/// Loads a data file at startup.
///
/// Load failures never abort startup: a missing file is an empty store, an
/// unreadable or malformed one is logged, copied to its `.bak` path so a
/// later save cannot destroy it, and treated as empty.
pub(crate) fn load_decoded<T, F>(file: &DataFile, kind: &str, decode: F) -> T
where
    T: Default,
    F: FnOnce(&str) -> std::result::Result<Decoded<T>, serde_json::Error>,
{
    let contents = match file.read() {
        Ok(Some(contents)) => contents,
        Ok(None) => {
            info!(
                "No {} file at {}, starting empty",
                kind,
                file.path().display()
            );
            return T::default();
        }
        Err(e) => {
            error!("Failed to load {}: {}", kind, e);
            return T::default();
        }
    };

    match decode(&contents) {
        Ok(decoded) => {
            for skipped in &decoded.skipped {
                warn!("Skipping malformed {} entry in {}: {}", kind, file.path().display(), skipped);
            }
            decoded.value
        }
        Err(e) => {
            error!(
                "Failed to parse {} file {}: {}. Starting with no entries",
                kind,
                file.path().display(),
                e
            );
            match file.preserve_backup() {
                Ok(backup) => warn!("Kept unreadable {} data at {}", kind, backup.display()),
                Err(e) => error!("{}", e),
            }
            T::default()
        }
    }
}

/// Maps an encoding failure to the persistence error of `file`.
pub(crate) fn encode_error(file: &DataFile, e: serde_json::Error) -> EssentialsError {
    EssentialsError::Persistence {
        path: file.path().to_path_buf(),
        message: format!("Failed to serialize data: {e}"),
        source: None,
    }
}
