use std::path::Path;

use tracing::{debug, warn};

use crate::error::CleanupError;

/// Only files under this prefix are ever removed.
pub const SCRATCH_PREFIX: &str = "/tmp/";

/// Removes a caller-supplied scratch file after the result is known.
pub struct TempArtifactCleaner {
    prefix: String,
}

impl Default for TempArtifactCleaner {
    fn default() -> Self {
        Self::new(SCRATCH_PREFIX)
    }
}

impl TempArtifactCleaner {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self { prefix: prefix.into() }
    }

    /// Lexical check only; `..` segments are not resolved.
    pub fn is_scratch(&self, path: &str) -> bool {
        path.starts_with(&self.prefix)
    }

    /// Delete `path` if it is a scratch file that exists. Failures are logged
    /// and dropped: cleanup never changes the outcome of an invocation.
    pub fn clean(&self, path: Option<&str>) {
        let Some(path) = path else { return };
        match self.try_clean(path) {
            Ok(true) => debug!(path, "scratch file removed"),
            Ok(false) => {}
            Err(e) => warn!(error = %e, "scratch cleanup failed"),
        }
    }

    fn try_clean(&self, path: &str) -> Result<bool, CleanupError> {
        if !self.is_scratch(path) || !Path::new(path).exists() {
            return Ok(false);
        }
        std::fs::remove_file(path)
            .map_err(|source| CleanupError::Io { path: path.to_string(), source })?;
        Ok(true)
    }
}
