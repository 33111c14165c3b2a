//! Gap scanner: detects three-bar price imbalances over a bounded lookback.
//!
//! A fair value gap forms when the oldest and newest bar of a consecutive
//! triple do not overlap, leaving a price band the middle (displacement)
//! bar jumped across. Bullish: `high(left) < low(right)`. Bearish:
//! `low(left) > high(right)`.

use serde::{Deserialize, Serialize};

use crate::SeriesView;

/// Smallest window that can hold one triple
pub const MIN_LOOKBACK: usize = 3;

/// Direction of the imbalance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GapKind {
  Bullish,
  Bearish,
}

impl GapKind {
  #[inline]
  pub fn is_bullish(self) -> bool {
    matches!(self, GapKind::Bullish)
  }

  /// Short tag used in descriptor identities
  pub fn tag(self) -> &'static str {
    match self {
      GapKind::Bullish => "BULL",
      GapKind::Bearish => "BEAR",
    }
  }
}

/// A detected three-bar imbalance.
///
/// Indices follow the series convention (0 = most recent): `left` is the
/// oldest bar of the triple, `right` the youngest, `mid` the displacement
/// bar between them. `top >= bottom` always holds by construction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Gap {
  pub left: usize,
  pub mid: usize,
  pub right: usize,
  pub top: f64,
  pub bottom: f64,
  pub kind: GapKind,
}

impl Gap {
  /// Gap height in price units
  #[inline]
  pub fn size(&self) -> f64 {
    self.top - self.bottom
  }

  /// True when `price` lies inside the untraded band (inclusive)
  #[inline]
  pub fn contains(&self, price: f64) -> bool {
    self.bottom <= price && price <= self.top
  }
}

/// Scan the most recent `lookback` bars for gap candidates.
///
/// Examines triples `(left = i+2, mid = i+1, right = i)` for
/// `i = 0 ..= min(lookback, bar_count) - 3`. The lookback is floored at
/// [`MIN_LOOKBACK`] and never exceeds the available history, so a window
/// larger than the series is safe. A single triple can contribute at most
/// one bullish and one bearish candidate; the bullish one is emitted first.
///
/// Fewer than 3 bars yields no candidates. Pure function of the snapshot.
pub fn scan_gaps<S: SeriesView + ?Sized>(series: &S, lookback: usize) -> Vec<Gap> {
  let bars = series.bar_count();
  if bars < MIN_LOOKBACK {
    return Vec::new();
  }

  let window = lookback.max(MIN_LOOKBACK).min(bars);
  let max_i = window - 3;

  let mut found = Vec::new();
  for i in 0..=max_i {
    let (left, mid, right) = (i + 2, i + 1, i);

    let hi_l = series.high(left);
    let lo_l = series.low(left);
    let hi_r = series.high(right);
    let lo_r = series.low(right);

    if hi_l < lo_r {
      found.push(Gap {
        left,
        mid,
        right,
        top: lo_r,
        bottom: hi_l,
        kind: GapKind::Bullish,
      });
    }
    if lo_l > hi_r {
      found.push(Gap {
        left,
        mid,
        right,
        top: lo_l,
        bottom: hi_r,
        kind: GapKind::Bearish,
      });
    }
  }

  found
}
