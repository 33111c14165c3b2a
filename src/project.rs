//! Zone projection: converts a selected gap into a renderable descriptor.
//!
//! Time span, price span (normalized to instrument precision, optionally
//! inset), fill color and a deterministic identity that lets an external
//! renderer diff repeated evaluations instead of accumulating duplicates.

use serde::{Deserialize, Serialize};

use crate::{
  config::{LineStyle, ZoneConfig, MIN_EDGE_INSET},
  normalize_price,
  scan::Gap,
  select::Side,
  Alpha, SeriesView,
};

/// Fallback bar duration when no valid inter-bar delta exists
pub const DEFAULT_BAR_DURATION: i64 = 60;

/// Inter-bar deltas sampled by the median estimator
pub const MEDIAN_SAMPLES: usize = 32;

/// Identity prefix shared by every emitted zone descriptor
pub const ZONE_PREFIX: &str = "FVG_";

/// Strategy for estimating the duration of one bar.
///
/// The median estimator is the baseline: it ignores non-positive deltas,
/// so session gaps and weekends do not distort the forward projection.
/// `LastDelta` reproduces the legacy single-interval behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DurationEstimator {
  /// Median of the most recent positive inter-bar deltas
  Median { samples: usize },
  /// Most recent inter-bar delta only (legacy)
  LastDelta,
}

impl Default for DurationEstimator {
  fn default() -> Self {
    DurationEstimator::Median { samples: MEDIAN_SAMPLES }
  }
}

/// Estimate one bar's duration in the series' time unit.
///
/// Non-positive deltas (duplicate or out-of-order timestamps) are ignored;
/// with no valid sample the estimate falls back to
/// [`DEFAULT_BAR_DURATION`].
pub fn estimate_bar_duration<S: SeriesView + ?Sized>(
  series: &S,
  estimator: DurationEstimator,
) -> i64 {
  let bars = series.bar_count();
  match estimator {
    DurationEstimator::LastDelta => {
      if bars >= 2 {
        let delta = series.time(0) - series.time(1);
        if delta > 0 {
          return delta;
        }
      }
      DEFAULT_BAR_DURATION
    },
    DurationEstimator::Median { samples } => {
      let take = samples.max(1).min(bars.saturating_sub(1));
      let mut deltas = Vec::with_capacity(take);
      for j in 0..take {
        let delta = series.time(j) - series.time(j + 1);
        if delta > 0 {
          deltas.push(delta);
        }
      }
      if deltas.is_empty() {
        return DEFAULT_BAR_DURATION;
      }
      deltas.sort_unstable();
      let mid = deltas.len() / 2;
      if deltas.len() % 2 == 1 {
        deltas[mid]
      } else {
        (deltas[mid - 1] + deltas[mid]) / 2
      }
    },
  }
}

/// Fill color with opacity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fill {
  pub r: u8,
  pub g: u8,
  pub b: u8,
  pub alpha: u8,
}

/// Border rendering of a zone. A "hidden" border is emitted as minimum
/// width, solid, in the fill color, so it disappears inside the inset area.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Border {
  pub width: u32,
  pub style: LineStyle,
  pub hidden: bool,
}

/// Renderable zone, one per selected gap
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ZoneDescriptor {
  /// Deterministic identity: side, direction, defining timestamps, rank
  pub name: String,
  pub left_time: i64,
  pub right_time: i64,
  pub top: f64,
  pub bottom: f64,
  pub fill: Fill,
  pub border: Border,
  pub locked: bool,
  pub selectable: bool,
}

/// Build the descriptor identity.
///
/// Repeated evaluations over an unchanged series produce the same name for
/// the same underlying gap, which lets the renderer replace rather than
/// accumulate objects.
fn zone_name<S: SeriesView + ?Sized>(series: &S, gap: &Gap, side: Side, rank: usize) -> String {
  format!(
    "{ZONE_PREFIX}{}_{}_{}_{}_{}",
    side.tag(),
    gap.kind.tag(),
    series.time(gap.left),
    series.time(gap.right),
    rank
  )
}

/// Project a selected gap into a renderable zone descriptor.
///
/// `bar_duration` is estimated once per evaluation and shared across all
/// zones. The configuration must already be clamped.
pub fn project_zone<S: SeriesView + ?Sized>(
  series: &S,
  gap: &Gap,
  side: Side,
  rank: usize,
  cfg: &ZoneConfig,
  bar_duration: i64,
) -> ZoneDescriptor {
  let left_time = if cfg.anchor_at_displacement {
    series.time(gap.mid)
  } else {
    series.time(gap.right)
  };
  let right_time = series.time(0) + cfg.forward_bars.max(0) as i64 * bar_duration;

  let digits = cfg.digits_override.unwrap_or_else(|| series.price_digits());
  let mut top = normalize_price(gap.top, digits);
  let mut bottom = normalize_price(gap.bottom, digits);

  if cfg.border_hidden {
    let inset = cfg.edge_inset.max(MIN_EDGE_INSET);
    top -= inset;
    bottom += inset;
    if top < bottom {
      std::mem::swap(&mut top, &mut bottom);
    }
  }

  let (r, g, b) = cfg.color.rgb();
  let fill = Fill { r, g, b, alpha: Alpha::clamped(cfg.alpha as i64).get() };

  let border = if cfg.border_hidden {
    Border { width: 1, style: LineStyle::Solid, hidden: true }
  } else {
    Border { width: cfg.border_width.max(1) as u32, style: cfg.border_style, hidden: false }
  };

  ZoneDescriptor {
    name: zone_name(series, gap, side, rank),
    left_time,
    right_time,
    top,
    bottom,
    fill,
    border,
    locked: cfg.locked,
    selectable: cfg.selectable,
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::{config::ZoneColor, scan::GapKind, Ohlc, SliceSeries};

  #[derive(Debug, Clone, Copy)]
  struct Bar {
    o: f64,
    h: f64,
    l: f64,
    c: f64,
    t: i64,
  }

  impl Ohlc for Bar {
    fn open(&self) -> f64 {
      self.o
    }

    fn high(&self) -> f64 {
      self.h
    }

    fn low(&self) -> f64 {
      self.l
    }

    fn close(&self) -> f64 {
      self.c
    }

    fn time(&self) -> i64 {
      self.t
    }
  }

  fn bar_at(t: i64) -> Bar {
    Bar { o: 10.0, h: 11.0, l: 9.0, c: 10.5, t }
  }

  fn series_with_times(times: &[i64]) -> Vec<Bar> {
    times.iter().map(|&t| bar_at(t)).collect()
  }

  fn sample_gap() -> Gap {
    Gap { left: 2, mid: 1, right: 0, top: 14.5, bottom: 12.0, kind: GapKind::Bullish }
  }

  #[test]
  fn test_median_duration_simple() {
    let bars = series_with_times(&[0, 60, 120, 180]);
    let series = SliceSeries::new(&bars, 2, 0.01);
    let d = estimate_bar_duration(&series, DurationEstimator::default());
    assert_eq!(d, 60);
  }

  #[test]
  fn test_median_ignores_session_gap() {
    // One weekend-sized delta among regular 60s bars must not skew the
    // estimate
    let bars = series_with_times(&[0, 60, 120, 180, 172_800, 172_860, 172_920]);
    let series = SliceSeries::new(&bars, 2, 0.01);
    let d = estimate_bar_duration(&series, DurationEstimator::Median { samples: 32 });
    assert_eq!(d, 60);
  }

  #[test]
  fn test_median_skips_non_positive_deltas() {
    let bars = series_with_times(&[0, 60, 60, 120]);
    let series = SliceSeries::new(&bars, 2, 0.01);
    let d = estimate_bar_duration(&series, DurationEstimator::Median { samples: 32 });
    assert_eq!(d, 60);
  }

  #[test]
  fn test_duration_fallback_without_samples() {
    let bars = series_with_times(&[500]);
    let series = SliceSeries::new(&bars, 2, 0.01);
    assert_eq!(
      estimate_bar_duration(&series, DurationEstimator::default()),
      DEFAULT_BAR_DURATION
    );
    assert_eq!(
      estimate_bar_duration(&series, DurationEstimator::LastDelta),
      DEFAULT_BAR_DURATION
    );
  }

  #[test]
  fn test_last_delta_legacy_estimator() {
    // The legacy estimator takes the single newest delta, session gap
    // included
    let bars = series_with_times(&[0, 60, 120, 86_400]);
    let series = SliceSeries::new(&bars, 2, 0.01);
    let d = estimate_bar_duration(&series, DurationEstimator::LastDelta);
    assert_eq!(d, 86_400 - 120);
  }

  #[test]
  fn test_projection_times() {
    let bars = series_with_times(&[0, 60, 120]);
    let series = SliceSeries::new(&bars, 2, 0.01);
    let cfg = ZoneConfig { forward_bars: 20, ..ZoneConfig::default() }.clamped();
    let zone = project_zone(&series, &sample_gap(), Side::Above, 0, &cfg, 60);

    // Anchored at the displacement (middle) bar
    assert_eq!(zone.left_time, 60);
    assert_eq!(zone.right_time, 120 + 20 * 60);
  }

  #[test]
  fn test_projection_anchor_at_right_bar() {
    let bars = series_with_times(&[0, 60, 120]);
    let series = SliceSeries::new(&bars, 2, 0.01);
    let cfg =
      ZoneConfig { anchor_at_displacement: false, ..ZoneConfig::default() }.clamped();
    let zone = project_zone(&series, &sample_gap(), Side::Above, 0, &cfg, 60);
    assert_eq!(zone.left_time, 120);
  }

  #[test]
  fn test_hidden_border_insets_bounds() {
    let bars = series_with_times(&[0, 60, 120]);
    let series = SliceSeries::new(&bars, 2, 0.01);
    let cfg = ZoneConfig { edge_inset: 0.25, ..ZoneConfig::default() }.clamped();
    let zone = project_zone(&series, &sample_gap(), Side::Above, 0, &cfg, 60);

    assert_eq!(zone.top, 14.25);
    assert_eq!(zone.bottom, 12.25);
    assert!(zone.border.hidden);
    assert_eq!(zone.border.width, 1);
    assert_eq!(zone.border.style, LineStyle::Solid);
  }

  #[test]
  fn test_inset_inversion_swaps_bounds() {
    // Inset larger than half the gap height inverts top/bottom; the
    // projector corrects by swapping, never rejects
    let bars = series_with_times(&[0, 60, 120]);
    let series = SliceSeries::new(&bars, 2, 0.01);
    let cfg = ZoneConfig { edge_inset: 2.0, ..ZoneConfig::default() }.clamped();
    let gap = Gap { top: 12.5, bottom: 12.0, ..sample_gap() };
    let zone = project_zone(&series, &gap, Side::Above, 0, &cfg, 60);
    assert!(zone.top >= zone.bottom);
  }

  #[test]
  fn test_visible_border_uses_configured_style() {
    let bars = series_with_times(&[0, 60, 120]);
    let series = SliceSeries::new(&bars, 2, 0.01);
    let cfg = ZoneConfig {
      border_hidden: false,
      border_width: 3,
      border_style: LineStyle::Dash,
      ..ZoneConfig::default()
    }
    .clamped();
    let zone = project_zone(&series, &sample_gap(), Side::Above, 0, &cfg, 60);

    assert!(!zone.border.hidden);
    assert_eq!(zone.border.width, 3);
    assert_eq!(zone.border.style, LineStyle::Dash);
    // No inset when the border is visible
    assert_eq!(zone.top, 14.5);
    assert_eq!(zone.bottom, 12.0);
  }

  #[test]
  fn test_digits_override_and_normalization() {
    let bars = series_with_times(&[0, 60, 120]);
    let series = SliceSeries::new(&bars, 4, 0.0001);
    let cfg = ZoneConfig {
      digits_override: Some(1),
      border_hidden: false,
      ..ZoneConfig::default()
    }
    .clamped();
    let gap = Gap { top: 14.5678, bottom: 12.0123, ..sample_gap() };
    let zone = project_zone(&series, &gap, Side::Above, 0, &cfg, 60);
    assert_eq!(zone.top, 14.6);
    assert_eq!(zone.bottom, 12.0);
  }

  #[test]
  fn test_fill_from_config() {
    let bars = series_with_times(&[0, 60, 120]);
    let series = SliceSeries::new(&bars, 2, 0.01);
    let cfg = ZoneConfig { color: ZoneColor::Blue, alpha: 90, ..ZoneConfig::default() }.clamped();
    let zone = project_zone(&series, &sample_gap(), Side::Above, 0, &cfg, 60);
    assert_eq!(zone.fill, Fill { r: 0, g: 0, b: 255, alpha: 90 });
  }

  #[test]
  fn test_identity_is_deterministic() {
    let bars = series_with_times(&[0, 60, 120]);
    let series = SliceSeries::new(&bars, 2, 0.01);
    let cfg = ZoneConfig::default().clamped();
    let a = project_zone(&series, &sample_gap(), Side::Above, 0, &cfg, 60);
    let b = project_zone(&series, &sample_gap(), Side::Above, 0, &cfg, 60);
    assert_eq!(a.name, b.name);
    assert_eq!(a.name, "FVG_A_BULL_0_120_0");
  }
}
