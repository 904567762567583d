//! Classification cache: per-asset verdicts keyed to a graph generation.
//!
//! A hit for the current generation bypasses extraction and traversal for
//! that asset. Nothing is ever swept eagerly: a generation bump simply makes
//! old entries unreachable by future lookups, and the project's asset count
//! bounds the memory this trades away.

use std::collections::HashMap;

use crate::graph::Verdict;
use crate::snapshot::{AssetId, Generation};

#[derive(Debug, Default)]
pub struct VerdictCache {
    entries: HashMap<(AssetId, Generation), Verdict>,
}

impl VerdictCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: AssetId, generation: Generation) -> Option<Verdict> {
        self.entries.get(&(id, generation)).copied()
    }

    pub fn put(&mut self, id: AssetId, generation: Generation, verdict: Verdict) {
        self.entries.insert((id, generation), verdict);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
