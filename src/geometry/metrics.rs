//! Staff geometry reported by the renderer
//!
//! Everything here is screen/staff-space data refreshed after each render
//! pass: staff line positions, horizontal extent, the screen→staff
//! transform, and the capability interface for a live line↔Y mapping.

use serde::{Deserialize, Serialize};
use crate::models::clef::Clef;

/// Default line spacing used when metrics are missing a usable value
pub const DEFAULT_LINE_SPACING: f64 = 12.0;

/// A point in screen (client) coordinates
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScreenPoint {
    pub x: f64,
    pub y: f64,
}

/// A point in the staff's own drawing coordinates
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StaffPoint {
    pub x: f64,
    pub y: f64,
}

/// Axis-aligned box in staff coordinates
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl BoundingBox {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self { x, y, width, height }
    }

    pub fn center(&self) -> StaffPoint {
        StaffPoint {
            x: self.x + self.width / 2.0,
            y: self.y + self.height / 2.0,
        }
    }

    /// Point-in-box test with the box grown by `padding` on every side
    pub fn contains_padded(&self, point: StaffPoint, padding: f64) -> bool {
        point.x >= self.x - padding
            && point.x <= self.x + self.width + padding
            && point.y >= self.y - padding
            && point.y <= self.y + self.height + padding
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.width.is_finite() && self.height.is_finite()
    }
}

/// Geometric description of a rendered staff
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StaffMetrics {
    /// Y of the top staff line
    pub top_y: f64,
    /// Y of the bottom staff line
    pub bottom_y: f64,
    /// Distance between adjacent staff lines
    pub spacing: f64,
    pub x_start: f64,
    pub x_end: f64,
    pub clef: Clef,
}

impl StaffMetrics {
    /// Metrics can drive the linear line→Y fallback
    pub fn is_usable(&self) -> bool {
        self.top_y.is_finite() && self.spacing.is_finite() && self.spacing != 0.0
    }

    /// Spacing, or the renderer's default when the reported one is unusable
    pub fn spacing_or_default(&self) -> f64 {
        if self.spacing.is_finite() && self.spacing > 0.0 {
            self.spacing
        } else {
            DEFAULT_LINE_SPACING
        }
    }

    /// Whether a point is close enough to the staff to count as a staff hit.
    ///
    /// Allows four line spacings above/below (ledger lines) and one spacing
    /// beyond either horizontal end.
    pub fn within_bounds(&self, point: StaffPoint) -> bool {
        let spacing = self.spacing_or_default();
        let margin = spacing * 4.0;
        let top = self.top_y - margin;
        let bottom = self.bottom_y + margin;
        let x_start = if self.x_start.is_finite() { self.x_start - spacing } else { f64::NEG_INFINITY };
        let x_end = if self.x_end.is_finite() { self.x_end + spacing } else { f64::INFINITY };
        point.y >= top && point.y <= bottom && point.x >= x_start && point.x <= x_end
    }
}

/// Screen → staff coordinate conversion, computed once per render pass.
///
/// `staff = (screen - offset) / scale`, independently per axis.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScreenToStaffTransform {
    pub scale_x: f64,
    pub scale_y: f64,
    pub offset_x: f64,
    pub offset_y: f64,
}

impl Default for ScreenToStaffTransform {
    fn default() -> Self {
        Self::identity()
    }
}

impl ScreenToStaffTransform {
    pub fn identity() -> Self {
        Self {
            scale_x: 1.0,
            scale_y: 1.0,
            offset_x: 0.0,
            offset_y: 0.0,
        }
    }

    pub fn new(scale_x: f64, scale_y: f64, offset_x: f64, offset_y: f64) -> Self {
        Self {
            scale_x: sanitize_scale(scale_x),
            scale_y: sanitize_scale(scale_y),
            offset_x: if offset_x.is_finite() { offset_x } else { 0.0 },
            offset_y: if offset_y.is_finite() { offset_y } else { 0.0 },
        }
    }

    pub fn to_staff(&self, point: ScreenPoint) -> StaffPoint {
        StaffPoint {
            x: (point.x - self.offset_x) / self.scale_x,
            y: (point.y - self.offset_y) / self.scale_y,
        }
    }

    pub fn to_screen(&self, point: StaffPoint) -> ScreenPoint {
        ScreenPoint {
            x: point.x * self.scale_x + self.offset_x,
            y: point.y * self.scale_y + self.offset_y,
        }
    }
}

/// Non-positive or non-finite scale factors fall back to 1
pub fn sanitize_scale(scale: f64) -> f64 {
    if scale.is_finite() && scale > 0.0 {
        scale
    } else {
        1.0
    }
}

/// Live line ↔ Y mapping for the active staff.
///
/// `line` counts downward from the top staff line (top line = 0, one unit
/// per line spacing), matching [`crate::models::clef::Clef::line_from_top`].
pub trait StaffGeometryProvider {
    fn y_for_line(&self, line: f64) -> f64;
    fn line_for_y(&self, y: f64) -> f64;
}

/// Provider derived purely from metrics (`y = top_y + line * spacing`)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinearStaffGeometry {
    pub top_y: f64,
    pub spacing: f64,
}

impl LinearStaffGeometry {
    pub fn from_metrics(metrics: &StaffMetrics) -> Option<Self> {
        if !metrics.is_usable() {
            return None;
        }
        Some(Self {
            top_y: metrics.top_y,
            spacing: metrics.spacing,
        })
    }
}

impl StaffGeometryProvider for LinearStaffGeometry {
    fn y_for_line(&self, line: f64) -> f64 {
        self.top_y + line * self.spacing
    }

    fn line_for_y(&self, y: f64) -> f64 {
        (y - self.top_y) / self.spacing
    }
}
