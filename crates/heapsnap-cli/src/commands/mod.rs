//! CLI command implementations.

pub mod diff;
pub mod hex_utils;
pub mod hexdump;
pub mod inspect;
pub mod path;
pub mod summary;

use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::AtomicBool;

use anyhow::{Context as _, Result};
use heapsnap_core::{AnalyzerConfig, Snapshot, load_capture};

/// State shared by every command
pub struct Context {
    pub config: AnalyzerConfig,
    pub cancel: Arc<AtomicBool>,
    pub json: bool,
}

impl Context {
    /// Load a capture file and walk its object graph
    pub fn load_snapshot(&self, path: &Path) -> Result<Snapshot> {
        let capture = load_capture(path)
            .with_context(|| format!("failed to load capture: {}", path.display()))?;
        Snapshot::build_with_cancel(capture, &self.config, &self.cancel)
            .with_context(|| format!("failed to analyze capture: {}", path.display()))
    }
}
