//! Frame counters and degradation bookkeeping for external diagnostics

use std::collections::VecDeque;

use log::{debug, warn};
use serde::Serialize;

use super::error::Degradation;

/// How the pipeline handled a single frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FrameMode {
    /// First measurement copied into the state
    Seeded,
    /// Predicted and corrected with a fresh measurement
    Corrected,
    /// Predicted only, no fresh measurement
    Predicted,
    /// Fresh measurement present but correction skipped
    Degraded,
    /// No usable measurement and nothing to predict from
    Held,
}

/// Snapshot of a degradation event, kept in a bounded history
#[derive(Debug, Clone, Serialize)]
pub struct DegradationRecord {
    pub frame: u64,
    pub kind: &'static str,
    pub message: String,
}

/// Side-channel counters for a filter session
#[derive(Debug, Clone, Serialize)]
pub struct FilterDiagnostics {
    pub frames: u64,
    pub seeded_frames: u64,
    pub corrected_frames: u64,
    pub predicted_frames: u64,
    pub degraded_frames: u64,
    pub held_frames: u64,
    pub singular_corrections: u64,
    pub rejected_measurements: u64,
    pub divergences: u64,
    pub resets: u64,
    pub reseeds_after_gap: u64,
    recent: VecDeque<DegradationRecord>,
    #[serde(skip)]
    max_history: usize,
    #[serde(skip)]
    in_burst: bool,
}

impl Default for FilterDiagnostics {
    fn default() -> Self {
        Self::new()
    }
}

impl FilterDiagnostics {
    pub fn new() -> Self {
        Self::with_history(32)
    }

    /// Keep at most `max_history` recent degradation records
    pub fn with_history(max_history: usize) -> Self {
        Self {
            frames: 0,
            seeded_frames: 0,
            corrected_frames: 0,
            predicted_frames: 0,
            degraded_frames: 0,
            held_frames: 0,
            singular_corrections: 0,
            rejected_measurements: 0,
            divergences: 0,
            resets: 0,
            reseeds_after_gap: 0,
            recent: VecDeque::with_capacity(max_history),
            max_history,
            in_burst: false,
        }
    }

    /// Count a finished frame
    pub fn record_frame(&mut self, mode: FrameMode) {
        self.frames += 1;
        match mode {
            FrameMode::Seeded => self.seeded_frames += 1,
            FrameMode::Corrected => self.corrected_frames += 1,
            FrameMode::Predicted => self.predicted_frames += 1,
            FrameMode::Degraded => self.degraded_frames += 1,
            FrameMode::Held => self.held_frames += 1,
        }
        if matches!(mode, FrameMode::Seeded | FrameMode::Corrected) {
            self.in_burst = false;
        }
    }

    /// Count and log a degradation. Only the first event of a burst is
    /// logged at warn level so a dead tracker does not flood the log.
    pub fn record_degradation(&mut self, degradation: &Degradation) {
        match degradation {
            Degradation::SingularInnovation { .. } => self.singular_corrections += 1,
            Degradation::NonFiniteMeasurement { .. } => self.rejected_measurements += 1,
            Degradation::Diverged => self.divergences += 1,
        }

        if self.in_burst {
            debug!("frame {}: {}", self.frames, degradation);
        } else {
            warn!("frame {}: {}", self.frames, degradation);
            self.in_burst = true;
        }

        if self.max_history == 0 {
            return;
        }
        if self.recent.len() == self.max_history {
            self.recent.pop_front();
        }
        self.recent.push_back(DegradationRecord {
            frame: self.frames,
            kind: degradation.kind(),
            message: degradation.to_string(),
        });
    }

    pub fn record_reset(&mut self) {
        self.resets += 1;
    }

    pub fn record_reseed_after_gap(&mut self) {
        self.reseeds_after_gap += 1;
    }

    /// Most recent degradation events, oldest first
    pub fn recent_degradations(&self) -> impl Iterator<Item = &DegradationRecord> {
        self.recent.iter()
    }

    /// Total of all degradation events
    pub fn degradation_count(&self) -> u64 {
        self.singular_corrections + self.rejected_measurements + self.divergences
    }

    /// JSON dump for host-side logging
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}
