//! Curve style descriptors handed to the line renderer.

use serde::{Deserialize, Serialize};

const AGGREGATION_COLOR: &str = "#6366f1";
const PROVENANCE_COLOR: &str = "#94a3b8";
const DEFAULT_STROKE_WIDTH: f64 = 2.0;
const ENTRANCE_ANIMATION_MS: u32 = 200;

/// Stroke dash pattern.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "type")]
pub enum DashPattern {
    Solid,
    Dashed { dash: f64, gap: f64 },
}

/// Terminal marker drawn at a curve end.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EndCap {
    None,
    Arrow,
    Disc,
}

/// Animation played once when a curve is first drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntranceAnimation {
    pub duration_ms: u32,
}

/// Full style descriptor for one connector curve.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineStyle {
    /// CSS-like color string understood by the renderer.
    pub color: String,
    pub stroke_width: f64,
    pub dash: DashPattern,
    pub start_cap: EndCap,
    pub end_cap: EndCap,
    /// Only applied on creation; repositions never animate.
    pub entrance: Option<EntranceAnimation>,
}

impl LineStyle {
    /// Solid curve used for note -> slot aggregation edges.
    pub fn aggregation() -> Self {
        Self {
            color: AGGREGATION_COLOR.to_string(),
            stroke_width: DEFAULT_STROKE_WIDTH,
            dash: DashPattern::Solid,
            start_cap: EndCap::None,
            end_cap: EndCap::None,
            entrance: Some(EntranceAnimation {
                duration_ms: ENTRANCE_ANIMATION_MS,
            }),
        }
    }

    /// Dashed curve used for note -> note provenance edges.
    pub fn provenance() -> Self {
        Self {
            color: PROVENANCE_COLOR.to_string(),
            stroke_width: DEFAULT_STROKE_WIDTH,
            dash: DashPattern::Dashed { dash: 6.0, gap: 4.0 },
            start_cap: EndCap::None,
            end_cap: EndCap::None,
            entrance: Some(EntranceAnimation {
                duration_ms: ENTRANCE_ANIMATION_MS,
            }),
        }
    }

    pub fn is_dashed(&self) -> bool {
        matches!(self.dash, DashPattern::Dashed { .. })
    }
}
