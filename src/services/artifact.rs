use std::io::Write;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::error::AppError;

const PAYLOAD_PREFIX: &str = "fhir_payload_";
const PAYLOAD_SUFFIX: &str = ".json";

/// Payload file handed to one validator run.
///
/// The name is chosen by the temp-file primitive, so concurrent requests never
/// share a path. The file is removed when the artifact is dropped, whichever
/// way the request ends.
#[derive(Debug)]
pub struct PayloadArtifact {
    path: PathBuf,
}

impl PayloadArtifact {
    /// Create `fhir_payload_<random>.json` in `dir` holding `payload`.
    pub fn create(dir: &Path, payload: &[u8]) -> Result<Self, AppError> {
        let mut file = tempfile::Builder::new()
            .prefix(PAYLOAD_PREFIX)
            .suffix(PAYLOAD_SUFFIX)
            .tempfile_in(dir)
            .map_err(AppError::Artifact)?;

        file.write_all(payload).map_err(AppError::Artifact)?;
        file.flush().map_err(AppError::Artifact)?;

        // Closes the handle; removal is ours from here on.
        let path = file
            .into_temp_path()
            .keep()
            .map_err(|e| AppError::Artifact(e.error))?;

        debug!("Using temp file for validator payload: {}", path.display());

        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for PayloadArtifact {
    fn drop(&mut self) {
        match std::fs::remove_file(&self.path) {
            Ok(()) => debug!("Removed payload file {}", self.path.display()),
            Err(e) => warn!("Failed to remove payload file {}: {}", self.path.display(), e),
        }
    }
}
