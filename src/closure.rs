//! Closure tracking: decides whether a detected gap has since been filled.
//!
//! A gap is closed once any bar strictly newer than its right bar trades
//! back into the untraded band. This is an existence check over the whole
//! newer history, so scan order does not affect the outcome.

use crate::{scan::Gap, scan::GapKind, SeriesView};

/// True when some bar newer than `gap.right` has traded back into the band.
///
/// Bullish gaps close when a newer bar's low reaches `bottom`; bearish gaps
/// when a newer bar's high reaches `top`. A gap whose right bar is the
/// current bar (`right == 0`) has no newer bars and is open by definition.
pub fn is_closed<S: SeriesView + ?Sized>(series: &S, gap: &Gap) -> bool {
  // Indices right-1 ..= 0, oldest of the newer bars first
  for j in (0..gap.right).rev() {
    let filled = match gap.kind {
      GapKind::Bullish => series.low(j) <= gap.bottom,
      GapKind::Bearish => series.high(j) >= gap.top,
    };
    if filled {
      return true;
    }
  }
  false
}

/// Drop every candidate that newer price action has filled, preserving order
pub fn retain_open<S: SeriesView + ?Sized>(series: &S, candidates: Vec<Gap>) -> Vec<Gap> {
  candidates.into_iter().filter(|g| !is_closed(series, g)).collect()
}
