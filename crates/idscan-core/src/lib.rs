// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// idscan: Core types, error definitions, configuration, and parameter
// profiles shared by the detection pipeline and its front ends.

pub mod config;
pub mod error;
pub mod profile;
pub mod types;

pub use config::DetectorConfig;
pub use error::{IdScanError, Result};
pub use profile::{ParameterProfile, ResolutionTiers};
pub use types::*;

/// Library version reported to front ends.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
