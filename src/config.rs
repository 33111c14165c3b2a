//! Configuration surface for the gap-zone pipeline.
//!
//! All fields are plain scalars. Nothing here is ever rejected: the engine
//! clamps every field to the nearest valid value before use, so a malformed
//! configuration degrades to a sensible one instead of failing.

use serde::{Deserialize, Serialize};

use crate::project::DurationEstimator;

pub use crate::scan::MIN_LOOKBACK;

/// Smallest edge inset; zero would leave a degenerate one-pixel seam
/// when the border is meant to be hidden
pub const MIN_EDGE_INSET: f64 = 0.01;

/// Border line style of a rendered zone
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum LineStyle {
    #[default]
    Solid,
    Dash,
    Dot,
    DashDot,
}

/// Named fill colors accepted by the configuration surface
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ZoneColor {
    #[default]
    Gray,
    Red,
    Green,
    Blue,
    Black,
    Orange,
    Magenta,
    Cyan,
}

impl ZoneColor {
    /// RGB components of the palette entry
    pub fn rgb(self) -> (u8, u8, u8) {
        match self {
            ZoneColor::Gray => (128, 128, 128),
            ZoneColor::Red => (255, 0, 0),
            ZoneColor::Green => (0, 128, 0),
            ZoneColor::Blue => (0, 0, 255),
            ZoneColor::Black => (0, 0, 0),
            ZoneColor::Orange => (255, 165, 0),
            ZoneColor::Magenta => (255, 0, 255),
            ZoneColor::Cyan => (0, 255, 255),
        }
    }
}

/// Configuration of the gap-zone pipeline.
///
/// Count and width fields accept raw (possibly negative) values so that
/// host inputs can be passed through unchecked; see [`ZoneConfig::clamped`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ZoneConfig {
    /// Maximum open gaps shown above the current price (0 = show none)
    pub max_above: i32,
    /// Maximum open gaps shown below the current price (0 = show none)
    pub max_below: i32,
    /// Historical bars considered by the scanner
    pub lookback: usize,
    /// Bars of future projection for the zone's right edge
    pub forward_bars: i32,
    /// Anchor the zone's left edge at the middle (displacement) bar
    /// instead of the right bar of the triple
    pub anchor_at_displacement: bool,
    /// Render the border invisibly (minimum width, solid, fill-colored)
    pub border_hidden: bool,
    /// Border width when visible
    pub border_width: i32,
    /// Border style when visible
    pub border_style: LineStyle,
    /// Price-space shrink applied to zone bounds when the border is hidden
    pub edge_inset: f64,
    /// Overrides the series' price precision when set
    pub digits_override: Option<u32>,
    /// Zone fill color
    pub color: ZoneColor,
    /// Zone fill opacity, 0..=255
    pub alpha: i32,
    /// Mark emitted zones as locked chart objects
    pub locked: bool,
    /// Mark emitted zones as selectable chart objects
    pub selectable: bool,
    /// Strategy for estimating one bar's duration for forward projection
    pub duration_estimator: DurationEstimator,
}

impl Default for ZoneConfig {
    fn default() -> Self {
        Self {
            max_above: 10,
            max_below: 10,
            lookback: 2000,
            forward_bars: 20,
            anchor_at_displacement: true,
            border_hidden: true,
            border_width: 1,
            border_style: LineStyle::Solid,
            edge_inset: MIN_EDGE_INSET,
            digits_override: None,
            color: ZoneColor::Gray,
            alpha: 90,
            locked: true,
            selectable: false,
            duration_estimator: DurationEstimator::default(),
        }
    }
}

impl ZoneConfig {
    /// Clamp every field to its valid range.
    ///
    /// Negative counts become 0, the lookback is floored at [`MIN_LOOKBACK`],
    /// alpha is clamped into 0..=255, forward bars are floored at 0, the
    /// border width at 1 and the inset at [`MIN_EDGE_INSET`]. Total: never
    /// fails.
    pub fn clamped(mut self) -> Self {
        self.max_above = self.max_above.max(0);
        self.max_below = self.max_below.max(0);
        self.lookback = self.lookback.max(MIN_LOOKBACK);
        self.forward_bars = self.forward_bars.max(0);
        self.alpha = self.alpha.clamp(0, 255);
        self.border_width = self.border_width.max(1);
        self.edge_inset = crate::sanitize(self.edge_inset).max(MIN_EDGE_INSET);
        self
    }
}
