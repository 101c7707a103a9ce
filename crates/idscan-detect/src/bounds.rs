// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Mapping of ordered pixel corners into the normalised output contract.

use idscan_core::{Corner, DocumentBounds, IdScanError, Result};

/// Undo the working-image scale on ordered corners.
pub fn unscale(corners: [(f64, f64); 4], scale: f64) -> [(f64, f64); 4] {
    corners.map(|(x, y)| (x / scale, y / scale))
}

/// Divide source-pixel corners by the source dimensions and clamp into
/// `0.0..=1.0`. Confidence is clamped the same way.
pub fn normalize(
    corners: [(f64, f64); 4],
    source: (u32, u32),
    confidence: f64,
) -> Result<DocumentBounds> {
    let (width, height) = (source.0 as f64, source.1 as f64);
    if width <= 0.0 || height <= 0.0 {
        return Err(IdScanError::ProcessingFailure(format!(
            "cannot normalise against a {}x{} frame",
            source.0, source.1
        )));
    }
    if corners
        .iter()
        .any(|(x, y)| !x.is_finite() || !y.is_finite())
        || !confidence.is_finite()
    {
        return Err(IdScanError::ProcessingFailure(
            "non-finite corner or confidence".into(),
        ));
    }

    let [tl, tr, br, bl] = corners.map(|(x, y)| {
        Corner::new(
            (x / width).clamp(0.0, 1.0) as f32,
            (y / height).clamp(0.0, 1.0) as f32,
        )
    });
    Ok(DocumentBounds {
        top_left: tl,
        top_right: tr,
        bottom_right: br,
        bottom_left: bl,
        confidence: confidence.clamp(0.0, 1.0) as f32,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn corners_are_divided_by_source_size() {
        let bounds = normalize(
            [(100.0, 50.0), (300.0, 50.0), (300.0, 150.0), (100.0, 150.0)],
            (400, 200),
            0.8,
        )
        .unwrap();
        assert_eq!(bounds.top_left, Corner::new(0.25, 0.25));
        assert_eq!(bounds.bottom_right, Corner::new(0.75, 0.75));
        assert_eq!(bounds.confidence, 0.8);
    }

    #[test]
    fn overshoot_is_clamped() {
        let bounds = normalize(
            [(-0.4, -1.0), (401.0, 0.0), (400.5, 200.2), (0.0, 200.0)],
            (400, 200),
            1.2,
        )
        .unwrap();
        assert!(bounds.is_normalized());
        assert_eq!(bounds.top_left, Corner::new(0.0, 0.0));
        assert_eq!(bounds.confidence, 1.0);
    }

    #[test]
    fn unscale_inverts_downscale() {
        let corners = unscale([(60.0, 30.0), (120.0, 30.0), (120.0, 90.0), (60.0, 90.0)], 0.5);
        assert_eq!(corners[0], (120.0, 60.0));
        assert_eq!(corners[2], (240.0, 180.0));
    }

    #[test]
    fn non_finite_input_is_a_processing_failure() {
        let err = normalize([(f64::NAN, 0.0); 4], (10, 10), 0.5).unwrap_err();
        assert!(matches!(err, IdScanError::ProcessingFailure(_)));
    }
}
