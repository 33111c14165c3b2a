//! Side selection: buckets open gaps relative to the current price and
//! keeps a bounded, recency-ranked subset per side.

use serde::{Deserialize, Serialize};

use crate::scan::Gap;

/// Position of an open gap relative to the current price
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Side {
  Above,
  Below,
}

impl Side {
  /// Short tag used in descriptor identities
  pub fn tag(self) -> &'static str {
    match self {
      Side::Above => "A",
      Side::Below => "B",
    }
  }
}

/// Classify a gap against the current price.
///
/// A gap that straddles the price (`bottom <= price <= top`) goes to the
/// Above bucket. That is a deliberate visibility choice, not a domain
/// rule; ranking and truncation downstream depend on it, so it is kept
/// stable across versions.
pub fn classify(gap: &Gap, price: f64) -> Side {
  if gap.bottom > price {
    Side::Above
  } else if gap.top < price {
    Side::Below
  } else {
    Side::Above
  }
}

/// Per-side selection result, most recent gap first
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Selection {
  pub above: Vec<Gap>,
  pub below: Vec<Gap>,
}

/// Bucket, rank and truncate the open-gap set.
///
/// Within each side gaps are sorted ascending by right index (smaller
/// index = more recent bar). The sort is stable, so candidates sharing a
/// right index keep their scan emission order. Each side is then truncated
/// independently; a maximum of 0 means "show none".
pub fn select_sides(open: &[Gap], price: f64, max_above: usize, max_below: usize) -> Selection {
  let mut above = Vec::new();
  let mut below = Vec::new();

  for gap in open {
    match classify(gap, price) {
      Side::Above => above.push(*gap),
      Side::Below => below.push(*gap),
    }
  }

  above.sort_by_key(|g| g.right);
  below.sort_by_key(|g| g.right);
  above.truncate(max_above);
  below.truncate(max_below);

  Selection { above, below }
}
