//! Versioned, checksummed save envelope.
use serde::{Deserialize, Serialize};
use std::hash::Hasher;
use thiserror::Error;
use twox_hash::XxHash64;

use crate::constants::{SAVE_CHECKSUM_SEED, SAVE_VERSION};
use crate::state::GameState;

#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("failed to encode save: {0}")]
    Encode(#[source] serde_json::Error),
    #[error("failed to decode save: {0}")]
    Decode(#[source] serde_json::Error),
    #[error("storage failure: {0}")]
    Storage(String),
    #[error("save checksum mismatch (expected {expected:016x}, found {found:016x})")]
    Corrupt { expected: u64, found: u64 },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct SaveEnvelope {
    version: u32,
    checksum: u64,
    /// Serialized state; kept as text so the checksum covers exact bytes.
    state: String,
}

#[derive(Debug, Deserialize)]
struct VersionProbe {
    #[serde(default)]
    version: Option<u32>,
}

fn checksum(payload: &str) -> u64 {
    let mut hasher = XxHash64::with_seed(SAVE_CHECKSUM_SEED);
    hasher.write(payload.as_bytes());
    hasher.finish()
}

/// Serialize `state` into a save blob.
///
/// # Errors
///
/// Returns [`PersistenceError::Encode`] if serialization fails.
pub fn encode(state: &GameState) -> Result<String, PersistenceError> {
    let payload = serde_json::to_string(state).map_err(PersistenceError::Encode)?;
    let envelope = SaveEnvelope {
        version: SAVE_VERSION,
        checksum: checksum(&payload),
        state: payload,
    };
    serde_json::to_string(&envelope).map_err(PersistenceError::Encode)
}

/// Parse a save blob. A missing or mismatched version is treated as "no
/// save" and yields `Ok(None)`.
///
/// # Errors
///
/// Returns [`PersistenceError::Corrupt`] on checksum mismatch and
/// [`PersistenceError::Decode`] for unparseable payloads.
pub fn decode(blob: &str) -> Result<Option<GameState>, PersistenceError> {
    let probe: VersionProbe = serde_json::from_str(blob).map_err(PersistenceError::Decode)?;
    if probe.version != Some(SAVE_VERSION) {
        log::warn!(
            "ignoring save with version {:?} (expected {SAVE_VERSION})",
            probe.version
        );
        return Ok(None);
    }
    let envelope: SaveEnvelope = serde_json::from_str(blob).map_err(PersistenceError::Decode)?;
    let found = checksum(&envelope.state);
    if found != envelope.checksum {
        return Err(PersistenceError::Corrupt {
            expected: envelope.checksum,
            found,
        });
    }
    serde_json::from_str(&envelope.state)
        .map(Some)
        .map_err(PersistenceError::Decode)
}
