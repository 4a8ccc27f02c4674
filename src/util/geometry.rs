// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Geometric utility functions.
//!
//! This module provides utilities for coordinate transformations between
//! pixel coordinates inside a rendered page and percentage coordinates
//! (0.0 to 100.0) stored on annotations.

use crate::models::annotation::{DeviceMode, NewAnnotation};

/// A point in percentage coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PercentPoint {
    pub x_pct: f64,
    pub y_pct: f64,
}

fn scale_to_percent(pixel: f64, extent: f64) -> f64 {
    if extent <= 0.0 || !extent.is_finite() || !pixel.is_finite() {
        return 0.0;
    }
    (pixel / extent * 100.0).clamp(0.0, 100.0)
}

/// Convert pixel coordinates to percentage coordinates, clamped to `[0, 100]`.
///
/// A pointer released outside the container still yields a valid point on
/// its edge. A non-positive container extent maps that axis to 0.
pub fn to_percentage(
    pixel_x: f64,
    pixel_y: f64,
    container_width: f64,
    container_height: f64,
) -> PercentPoint {
    PercentPoint {
        x_pct: scale_to_percent(pixel_x, container_width),
        y_pct: scale_to_percent(pixel_y, container_height),
    }
}

/// Convert percentage coordinates to pixel coordinates. Not clamped.
pub fn to_pixels(point: PercentPoint, container_width: f64, container_height: f64) -> (f64, f64) {
    (
        point.x_pct / 100.0 * container_width,
        point.y_pct / 100.0 * container_height,
    )
}

/// New anchor for a dragged pin: pointer position minus the grab offset.
pub fn drag_position(pointer: PercentPoint, offset: PercentPoint) -> PercentPoint {
    PercentPoint {
        x_pct: (pointer.x_pct - offset.x_pct).clamp(0.0, 100.0),
        y_pct: (pointer.y_pct - offset.y_pct).clamp(0.0, 100.0),
    }
}

/// Turn a press/release pair into placement parameters.
///
/// Drags larger than `min_area_pct` on both axes become areas anchored
/// at their top-left corner; anything smaller is a click and becomes a
/// pin at the release point.
pub fn drag_to_placement(
    start: PercentPoint,
    current: PercentPoint,
    min_area_pct: f64,
    device_mode: DeviceMode,
) -> NewAnnotation {
    let width = (current.x_pct - start.x_pct).abs();
    let height = (current.y_pct - start.y_pct).abs();

    if width > min_area_pct && height > min_area_pct {
        NewAnnotation::area(
            start.x_pct.min(current.x_pct),
            start.y_pct.min(current.y_pct),
            width,
            height,
            device_mode,
        )
    } else {
        NewAnnotation::pin(current.x_pct, current.y_pct, device_mode)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::annotation::AnnotationKind;

    #[test]
    fn test_percentage_pixels_roundtrip() {
        let width = 1440.0;
        let height = 5000.0;

        let samples = [(0.0, 0.0), (720.0, 2500.0), (1440.0, 5000.0), (13.7, 4999.2)];
        for &(pixel_x, pixel_y) in &samples {
            let pct = to_percentage(pixel_x, pixel_y, width, height);
            let (x, y) = to_pixels(pct, width, height);
            assert!((x - pixel_x).abs() < 0.0001);
            assert!((y - pixel_y).abs() < 0.0001);
        }
    }

    #[test]
    fn test_percentage_corners() {
        let tl = to_percentage(0.0, 0.0, 390.0, 800.0);
        assert_eq!(tl.x_pct, 0.0);
        assert_eq!(tl.y_pct, 0.0);

        let br = to_percentage(390.0, 800.0, 390.0, 800.0);
        assert_eq!(br.x_pct, 100.0);
        assert_eq!(br.y_pct, 100.0);
    }

    #[test]
    fn test_percentage_clamps_outside_container() {
        let p = to_percentage(-40.0, 1200.0, 1024.0, 800.0);
        assert_eq!(p.x_pct, 0.0);
        assert_eq!(p.y_pct, 100.0);
    }

    #[test]
    fn test_zero_container_maps_to_origin() {
        let p = to_percentage(10.0, 10.0, 0.0, 0.0);
        assert_eq!(p, PercentPoint { x_pct: 0.0, y_pct: 0.0 });
    }

    #[test]
    fn test_to_pixels_does_not_clamp() {
        let (x, y) = to_pixels(PercentPoint { x_pct: 150.0, y_pct: -10.0 }, 100.0, 100.0);
        assert_eq!(x, 150.0);
        assert_eq!(y, -10.0);
    }

    #[test]
    fn test_small_drag_is_a_pin() {
        let start = PercentPoint { x_pct: 40.0, y_pct: 40.0 };
        let end = PercentPoint { x_pct: 40.5, y_pct: 45.0 };
        let placement = drag_to_placement(start, end, 1.0, DeviceMode::Desktop);
        assert_eq!(placement.kind, AnnotationKind::Pin);
        assert_eq!(placement.x_pct, 40.5);
        assert_eq!(placement.y_pct, 45.0);
    }

    #[test]
    fn test_reverse_drag_normalizes_area() {
        let start = PercentPoint { x_pct: 60.0, y_pct: 30.0 };
        let end = PercentPoint { x_pct: 20.0, y_pct: 10.0 };
        let placement = drag_to_placement(start, end, 1.0, DeviceMode::Tablet);
        assert_eq!(placement.kind, AnnotationKind::Area);
        assert_eq!(placement.x_pct, 20.0);
        assert_eq!(placement.y_pct, 10.0);
        assert_eq!(placement.width_pct, Some(40.0));
        assert_eq!(placement.height_pct, Some(20.0));
    }

    #[test]
    fn test_drag_position_clamps() {
        let pointer = PercentPoint { x_pct: 2.0, y_pct: 99.0 };
        let offset = PercentPoint { x_pct: 5.0, y_pct: -3.0 };
        let moved = drag_position(pointer, offset);
        assert_eq!(moved, PercentPoint { x_pct: 0.0, y_pct: 100.0 });
    }
}
