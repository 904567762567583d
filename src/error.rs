//! Error types for datasweep.
//!
//! Extraction faults and depth-limit overflows are deliberately *not* here:
//! they are non-fatal, logged at the extraction site, and the scan continues.

use crate::snapshot::{AssetId, Generation};
use thiserror::Error;

/// Errors surfaced across the public API.
#[derive(Debug, Error)]
pub enum SweepError {
    /// The snapshot accessor itself failed. Fatal for the running session,
    /// surfaced to the caller as an aborted scan.
    #[error("snapshot access failed: {0}")]
    SnapshotAccess(String),

    /// A query referenced a generation that is no longer current. The caller
    /// must restart the scan; this is a contract violation, not a system fault.
    #[error("stale generation: requested {requested}, current {current}")]
    StaleGeneration {
        requested: Generation,
        current: Generation,
    },

    /// Unknown or already-finished session handle.
    #[error("unknown session handle {0}")]
    UnknownSession(u64),

    /// The snapshot has no asset with this id.
    #[error("unknown asset {0}")]
    UnknownAsset(AssetId),

    /// Classification was requested for library-linked or override data,
    /// which is excluded from analysis entirely and has no verdict.
    #[error("asset {0} is library-linked or an override and is never classified")]
    ExcludedLinkage(AssetId),

    /// The session was cancelled by the caller. Terminal, not a fault; no
    /// verdicts from the cancelled session are valid.
    #[error("scan cancelled")]
    Cancelled,
}

pub type Result<T> = std::result::Result<T, SweepError>;
