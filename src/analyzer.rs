//! Analysis facade.
//!
//! [`Analyzer`] is the single entry point callers hold: it owns the
//! generation counter, the verdict cache, and any in-flight scan sessions,
//! and exposes the public operations (start/advance/cancel a scan,
//! classify a single asset, invalidate on change).

use std::collections::HashMap;
use tracing::{debug, info};

use crate::cache::VerdictCache;
use crate::config::ScanConfig;
use crate::error::{Result, SweepError};
use crate::graph::Verdict;
use crate::scan::{Advance, ScanMode, ScanSession};
use crate::snapshot::{AssetId, Category, Generation, Snapshot};

/// Opaque ticket for an in-flight scan session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionHandle(u64);

impl std::fmt::Display for SessionHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "s{}", self.0)
    }
}

pub struct Analyzer {
    generation: Generation,
    config: ScanConfig,
    cache: VerdictCache,
    sessions: HashMap<SessionHandle, ScanSession>,
    next_handle: u64,
}

impl Analyzer {
    pub fn new(config: ScanConfig) -> Self {
        Self {
            generation: Generation(1),
            config,
            cache: VerdictCache::new(),
            sessions: HashMap::new(),
            next_handle: 0,
        }
    }

    pub fn generation(&self) -> Generation {
        self.generation
    }

    /// The store changed in a way that may alter reachability. Bumps the
    /// generation, which lazily invalidates every cached verdict and
    /// strands in-flight sessions (their next `advance` fails stale).
    pub fn notify_changed(&mut self) {
        self.generation = self.generation.next();
        info!(generation = %self.generation, "store changed, verdicts invalidated");
    }

    /// Begin an incremental scan. The session does no work until the first
    /// [`Analyzer::advance`] call.
    pub fn start_scan(&mut self, categories: Vec<Category>, mode: ScanMode) -> SessionHandle {
        self.next_handle += 1;
        let handle = SessionHandle(self.next_handle);
        let session = ScanSession::new(self.generation, categories, mode, self.config.clone());
        debug!(%handle, generation = %self.generation, ?mode, "scan session opened");
        self.sessions.insert(handle, session);
        handle
    }

    /// Drive a session one step. Finished sessions stay addressable so the
    /// result can be re-read; stale ones fail until dropped via `cancel`.
    pub fn advance(&mut self, snap: &dyn Snapshot, handle: SessionHandle) -> Result<Advance> {
        let session = self
            .sessions
            .get_mut(&handle)
            .ok_or(SweepError::UnknownSession(handle.0))?;
        if session.generation() != self.generation {
            return Err(SweepError::StaleGeneration {
                requested: session.generation(),
                current: self.generation,
            });
        }

        let step = session.advance(snap)?;
        if let Advance::Done(result) = &step {
            // Full scans yield complete verdicts for their categories, so
            // seed the cache; probe results are partial and cached per-id
            // only for the positives they did report.
            let generation = self.generation;
            if session.mode() == ScanMode::Full {
                for &category in session.categories() {
                    for id in snap.assets_of(category)? {
                        let Some(asset) = snap.get(id) else { continue };
                        if asset.linkage.is_excluded() {
                            continue;
                        }
                        let verdict = if result.unused.binary_search(&id).is_ok() {
                            Verdict::Unused
                        } else {
                            Verdict::Used
                        };
                        self.cache.put(id, generation, verdict);
                    }
                }
            } else {
                for &id in &result.unused {
                    self.cache.put(id, generation, Verdict::Unused);
                }
            }
        }
        Ok(step)
    }

    /// Request cooperative cancellation of a session. Also the way to
    /// discard a finished or stranded session.
    pub fn cancel(&mut self, handle: SessionHandle) -> Result<()> {
        match self.sessions.get_mut(&handle) {
            Some(session)
                if !session.is_finished() && session.generation() == self.generation =>
            {
                session.cancel();
                Ok(())
            }
            Some(_) => {
                self.sessions.remove(&handle);
                Ok(())
            }
            None => Err(SweepError::UnknownSession(handle.0)),
        }
    }

    /// Classify one asset under the current generation. Cache hit is O(1);
    /// a miss runs a full synchronous scan of the asset's category and
    /// fills the cache for its whole cohort.
    pub fn classify(&mut self, snap: &dyn Snapshot, id: AssetId) -> Result<Verdict> {
        let asset = snap.get(id).ok_or(SweepError::UnknownAsset(id))?;
        if asset.linkage.is_excluded() {
            return Err(SweepError::ExcludedLinkage(id));
        }
        if let Some(verdict) = self.cache.get(id, self.generation) {
            return Ok(verdict);
        }

        let category = asset.category;
        let handle = self.start_scan(vec![category], ScanMode::Full);
        loop {
            match self.advance(snap, handle)? {
                Advance::Done(_) => break,
                Advance::Progress(_) => {}
                Advance::Cancelled => return Err(SweepError::Cancelled),
            }
        }
        self.sessions.remove(&handle);

        self.cache
            .get(id, self.generation)
            .ok_or(SweepError::UnknownAsset(id))
    }
}

impl Default for Analyzer {
    fn default() -> Self {
        Self::new(ScanConfig::default())
    }
}
