// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Batch evaluation: per-image outcomes and the aggregate success and
// confidence statistics over a set of frames.

use std::path::PathBuf;
use std::time::Duration;

use serde::Serialize;

/// Outcome of one image in a batch run.
#[derive(Debug, Clone, Serialize)]
pub struct BatchEntry {
    pub path: PathBuf,
    pub detected: bool,
    pub confidence: Option<f32>,
    pub elapsed_ms: f64,
    /// Error message for failed detections.
    pub error: Option<String>,
}

impl BatchEntry {
    pub fn success(path: PathBuf, confidence: f32, elapsed: Duration) -> Self {
        Self {
            path,
            detected: true,
            confidence: Some(confidence),
            elapsed_ms: elapsed.as_secs_f64() * 1000.0,
            error: None,
        }
    }

    pub fn failure(path: PathBuf, error: String, elapsed: Duration) -> Self {
        Self {
            path,
            detected: false,
            confidence: None,
            elapsed_ms: elapsed.as_secs_f64() * 1000.0,
            error: Some(error),
        }
    }
}

/// Aggregate statistics over a batch.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BatchSummary {
    pub total: usize,
    pub detected: usize,
    pub success_rate: f64,
    pub min_confidence: Option<f32>,
    pub mean_confidence: Option<f32>,
    pub max_confidence: Option<f32>,
    pub mean_elapsed_ms: f64,
    pub max_elapsed_ms: f64,
}

impl BatchSummary {
    pub fn from_entries(entries: &[BatchEntry]) -> Self {
        if entries.is_empty() {
            return Self::default();
        }
        let confidences: Vec<f32> = entries.iter().filter_map(|e| e.confidence).collect();
        let total = entries.len();
        let detected = entries.iter().filter(|e| e.detected).count();
        let total_ms: f64 = entries.iter().map(|e| e.elapsed_ms).sum();

        Self {
            total,
            detected,
            success_rate: detected as f64 / total as f64,
            min_confidence: confidences.iter().copied().reduce(f32::min),
            mean_confidence: (!confidences.is_empty())
                .then(|| confidences.iter().sum::<f32>() / confidences.len() as f32),
            max_confidence: confidences.iter().copied().reduce(f32::max),
            mean_elapsed_ms: total_ms / total as f64,
            max_elapsed_ms: entries.iter().map(|e| e.elapsed_ms).fold(0.0, f64::max),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct BatchReport {
    pub summary: BatchSummary,
    pub entries: Vec<BatchEntry>,
}
