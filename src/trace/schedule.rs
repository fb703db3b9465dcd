//! The per-iteration trace and its persisted forms.
//!
//! A trace is append-only while its iteration runs and immutable afterwards.
//! It is stored either as JSON (readable, diffable) or as compact MessagePack;
//! [`Trace::save`] picks the format from the file extension.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::TraceFormatError;
use crate::lab::config::StrategyKind;
use crate::trace::decision::ScheduleDecision;
use crate::util::det_hash::fingerprint;

/// Current schema version for stored traces.
///
/// Increment this when making breaking changes to the schema.
pub const TRACE_SCHEMA_VERSION: u32 = 1;

/// Header stored with every trace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TraceMetadata {
    /// Schema version for forward compatibility.
    pub version: u32,
    /// Strategy that produced the trace.
    pub strategy: StrategyKind,
    /// Seed of the iteration, for randomized strategies.
    pub seed: Option<u64>,
    /// Iteration index within its exploration run.
    pub iteration: u64,
}

impl TraceMetadata {
    /// Creates metadata at the current schema version.
    #[must_use]
    pub const fn new(strategy: StrategyKind, seed: Option<u64>, iteration: u64) -> Self {
        Self {
            version: TRACE_SCHEMA_VERSION,
            strategy,
            seed,
            iteration,
        }
    }

    /// True if this build can replay the trace.
    #[must_use]
    pub const fn is_compatible(&self) -> bool {
        self.version == TRACE_SCHEMA_VERSION
    }
}

/// Ordered scheduling decisions of one iteration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Trace {
    metadata: TraceMetadata,
    decisions: Vec<ScheduleDecision>,
}

impl Trace {
    /// Creates an empty trace.
    #[must_use]
    pub const fn new(metadata: TraceMetadata) -> Self {
        Self {
            metadata,
            decisions: Vec::new(),
        }
    }

    pub(crate) fn push(&mut self, decision: ScheduleDecision) {
        self.decisions.push(decision);
    }

    /// The trace header.
    #[must_use]
    pub const fn metadata(&self) -> &TraceMetadata {
        &self.metadata
    }

    /// Decisions in scheduling-point order.
    #[must_use]
    pub fn decisions(&self) -> &[ScheduleDecision] {
        &self.decisions
    }

    /// Number of decisions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.decisions.len()
    }

    /// True if no decision was recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.decisions.is_empty()
    }

    /// The last decision, i.e. the point the iteration stopped after.
    #[must_use]
    pub fn last(&self) -> Option<&ScheduleDecision> {
        self.decisions.last()
    }

    /// Stable hash of the decision sequence (metadata excluded). Two traces
    /// with equal fingerprints took the same path.
    #[must_use]
    pub fn fingerprint(&self) -> u64 {
        fingerprint(&self.decisions)
    }

    /// Serializes to pretty-printed JSON.
    pub fn to_json(&self) -> Result<String, TraceFormatError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Deserializes from JSON, checking the schema version.
    pub fn from_json(json: &str) -> Result<Self, TraceFormatError> {
        Self::checked(serde_json::from_str(json)?)
    }

    /// Serializes to MessagePack.
    pub fn to_bytes(&self) -> Result<Vec<u8>, TraceFormatError> {
        Ok(rmp_serde::to_vec(self)?)
    }

    /// Deserializes from MessagePack, checking the schema version.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, TraceFormatError> {
        Self::checked(rmp_serde::from_slice(bytes)?)
    }

    /// Writes the trace to `path`: JSON for a `.json` extension, MessagePack otherwise.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), TraceFormatError> {
        let path = path.as_ref();
        let bytes = if is_json(path) {
            self.to_json()?.into_bytes()
        } else {
            self.to_bytes()?
        };
        fs::write(path, bytes)?;
        Ok(())
    }

    /// Reads a trace written by [`Trace::save`].
    pub fn load(path: impl AsRef<Path>) -> Result<Self, TraceFormatError> {
        let path = path.as_ref();
        let bytes = fs::read(path)?;
        if is_json(path) {
            let text = String::from_utf8_lossy(&bytes);
            Self::from_json(&text)
        } else {
            Self::from_bytes(&bytes)
        }
    }

    fn checked(trace: Self) -> Result<Self, TraceFormatError> {
        if !trace.metadata.is_compatible() {
            return Err(TraceFormatError::IncompatibleVersion {
                expected: TRACE_SCHEMA_VERSION,
                found: trace.metadata.version,
            });
        }
        Ok(trace)
    }
}

fn is_json(path: &Path) -> bool {
    path.extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"))
}
