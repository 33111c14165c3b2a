//! Round-level overlay: horizontal grid lines at price-step multiples,
//! psychological zone bands around the nearest levels, and level-break
//! signal markers.
//!
//! This overlay is independent of the gap pipeline. The grid and zone
//! generators are pure snapshot functions; the signal tracker is the one
//! stateful piece, owning an explicit per-level side memory and a FIFO of
//! emitted marker names.

use std::collections::{HashMap, VecDeque};

use serde::{Deserialize, Serialize};

use crate::{
  config::{LineStyle, ZoneColor},
  normalize_price, round_to_step, sanitize, SeriesView,
};

/// Identity prefix of round-level grid lines
pub const LEVEL_PREFIX: &str = "RL_";

/// Identity prefix of psychological zone boundary lines
pub const ZONE_LINE_PREFIX: &str = "PZ_";

/// Identity prefix of signal markers
pub const SIGNAL_PREFIX: &str = "SIG_";

/// Floor applied to steps and point units so divisions stay finite
const MIN_STEP: f64 = 1e-12;

/// Renderable horizontal line, one per grid or zone boundary
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineDescriptor {
  pub name: String,
  pub price: f64,
  pub color: ZoneColor,
  pub style: LineStyle,
  pub width: u32,
  pub locked: bool,
  pub selectable: bool,
}

/// Configuration of the grid and zone generators
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LevelConfig {
  /// Grid lines above the base level
  pub lines_above: u32,
  /// Grid lines below the base level
  pub lines_below: u32,
  /// Level spacing in price units (or points, see `step_in_points`)
  pub step: f64,
  /// Interpret `step`, offsets and tolerance in tick-size points
  pub step_in_points: bool,
  /// Half-height of a psychological zone band
  pub zone_offset: f64,
  /// Emit the middle zone unconditionally instead of only when the price
  /// sits on the base level
  pub always_middle_zone: bool,
  /// Distance within which the price counts as "on" the base level
  pub on_level_tolerance: f64,
  pub main_color: ZoneColor,
  pub main_style: LineStyle,
  pub main_width: i32,
  pub zone_color: ZoneColor,
  pub zone_style: LineStyle,
  pub zone_width: i32,
  pub locked: bool,
  pub selectable: bool,
}

impl Default for LevelConfig {
  fn default() -> Self {
    Self {
      lines_above: 10,
      lines_below: 10,
      step: 5.0,
      step_in_points: false,
      zone_offset: 0.5,
      always_middle_zone: true,
      on_level_tolerance: 0.1,
      main_color: ZoneColor::Red,
      main_style: LineStyle::Solid,
      main_width: 1,
      zone_color: ZoneColor::Gray,
      zone_style: LineStyle::Dash,
      zone_width: 1,
      locked: true,
      selectable: false,
    }
  }
}

fn unit<S: SeriesView + ?Sized>(series: &S, in_points: bool) -> f64 {
  if in_points {
    series.tick_size().max(MIN_STEP)
  } else {
    1.0
  }
}

fn effective_step<S: SeriesView + ?Sized>(series: &S, step: f64, in_points: bool) -> f64 {
  (sanitize(step) * unit(series, in_points)).max(MIN_STEP)
}

fn line(
  name: String,
  price: f64,
  digits: u32,
  color: ZoneColor,
  style: LineStyle,
  width: i32,
  cfg: &LevelConfig,
) -> LineDescriptor {
  LineDescriptor {
    name,
    price: normalize_price(price, digits),
    color,
    style,
    width: width.max(1) as u32,
    locked: cfg.locked,
    selectable: cfg.selectable,
  }
}

/// Grid of horizontal lines at step multiples around the current price.
///
/// The base level is the step multiple nearest to the latest close; lines
/// extend `lines_above` steps up and `lines_below` steps down from it.
/// Names are deterministic (`RL_MID_0`, `RL_UP_{k}`, `RL_DOWN_{k}`) so a
/// renderer can delete-then-recreate by prefix.
pub fn round_level_lines<S: SeriesView + ?Sized>(
  series: &S,
  cfg: &LevelConfig,
) -> Vec<LineDescriptor> {
  if series.bar_count() == 0 {
    return Vec::new();
  }

  let step = effective_step(series, cfg.step, cfg.step_in_points);
  let digits = series.price_digits();
  let base = round_to_step(series.close(0), step);

  let mut lines = Vec::with_capacity(1 + cfg.lines_above as usize + cfg.lines_below as usize);
  lines.push(line(
    format!("{LEVEL_PREFIX}MID_0"),
    base,
    digits,
    cfg.main_color,
    cfg.main_style,
    cfg.main_width,
    cfg,
  ));
  for i in 1..=cfg.lines_above {
    lines.push(line(
      format!("{LEVEL_PREFIX}UP_{i}"),
      base + i as f64 * step,
      digits,
      cfg.main_color,
      cfg.main_style,
      cfg.main_width,
      cfg,
    ));
  }
  for j in 1..=cfg.lines_below {
    lines.push(line(
      format!("{LEVEL_PREFIX}DOWN_{j}"),
      base - j as f64 * step,
      digits,
      cfg.main_color,
      cfg.main_style,
      cfg.main_width,
      cfg,
    ));
  }
  lines
}

/// Psychological zone bands around the levels bracketing the price.
///
/// One band around the next level at or above the price, one around the
/// previous level at or below it, and a middle band around the base level
/// (always, or only when the price is within tolerance of it).
pub fn psych_zone_lines<S: SeriesView + ?Sized>(
  series: &S,
  cfg: &LevelConfig,
) -> Vec<LineDescriptor> {
  if series.bar_count() == 0 {
    return Vec::new();
  }

  let u = unit(series, cfg.step_in_points);
  let step = effective_step(series, cfg.step, cfg.step_in_points);
  let offset = (sanitize(cfg.zone_offset) * u).max(0.0);
  let tolerance = (sanitize(cfg.on_level_tolerance) * u).max(1e-9);
  let digits = series.price_digits();

  let price = series.close(0);
  let base = round_to_step(price, step);
  let next_up = if base >= price { base } else { base + step };
  let prev_down = if base <= price { base } else { base - step };

  let band = |tag: &str, level: f64, lines: &mut Vec<LineDescriptor>| {
    lines.push(line(
      format!("{ZONE_LINE_PREFIX}{tag}_TOP"),
      level + offset,
      digits,
      cfg.zone_color,
      cfg.zone_style,
      cfg.zone_width,
      cfg,
    ));
    lines.push(line(
      format!("{ZONE_LINE_PREFIX}{tag}_BOTTOM"),
      level - offset,
      digits,
      cfg.zone_color,
      cfg.zone_style,
      cfg.zone_width,
      cfg,
    ));
  };

  let mut lines = Vec::with_capacity(6);
  band("UP", next_up, &mut lines);
  band("DN", prev_down, &mut lines);
  if cfg.always_middle_zone || (price - base).abs() <= tolerance {
    band("MID", base, &mut lines);
  }
  lines
}

// ============================================================
// LEVEL-BREAK SIGNALS
// ============================================================

/// Direction of a level-break signal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SignalSide {
  Bull,
  Bear,
}

/// How a closed bar qualifies as a level break
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SignalMode {
  /// The bar's range must touch a level and close beyond its zone band
  #[default]
  TouchThenZoneClose,
  /// The bar must open on the near side of the bracketing level and close
  /// beyond its zone band (legacy)
  OpenSideThenZoneClose,
}

/// Configuration of the signal tracker
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SignalConfig {
  pub mode: SignalMode,
  pub step: f64,
  pub step_in_points: bool,
  pub zone_offset: f64,
  /// Vertical distance of the marker from the bar's extreme
  pub marker_offset: f64,
  /// FIFO cap on retained markers
  pub max_markers: usize,
  pub bull_color: ZoneColor,
  pub bear_color: ZoneColor,
}

impl Default for SignalConfig {
  fn default() -> Self {
    Self {
      mode: SignalMode::default(),
      step: 5.0,
      step_in_points: false,
      zone_offset: 0.5,
      marker_offset: 0.5,
      max_markers: 200,
      bull_color: ZoneColor::Green,
      bear_color: ZoneColor::Red,
    }
  }
}

/// Renderable signal marker placed above or below the signaling bar
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarkerDescriptor {
  pub name: String,
  pub time: i64,
  pub price: f64,
  pub side: SignalSide,
  pub color: ZoneColor,
}

/// Result of processing one closed bar
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SignalUpdate {
  /// Newly emitted markers (at most one per side)
  pub markers: Vec<MarkerDescriptor>,
  /// Names of markers dropped by the FIFO cap; the renderer should
  /// delete these
  pub expired: Vec<String>,
}

/// Stateful level-break signal tracker.
///
/// Owns the per-level side memory: a signal on the same side as the last
/// one recorded for that level is skipped, so an oscillation around one
/// level does not repeat markers. The host calls
/// [`process_closed_bar`](Self::process_closed_bar) exactly once per newly
/// closed bar.
#[derive(Debug, Clone, Default)]
pub struct LevelSignalTracker {
  config: SignalConfig,
  // Keyed by the bit pattern of the normalized level so equal normalized
  // prices collide exactly
  last_side: HashMap<u64, SignalSide>,
  emitted: VecDeque<String>,
}

impl LevelSignalTracker {
  pub fn new(config: SignalConfig) -> Self {
    Self { config, last_side: HashMap::new(), emitted: VecDeque::new() }
  }

  /// Forget all per-level memory and retained marker names
  pub fn reset(&mut self) {
    self.last_side.clear();
    self.emitted.clear();
  }

  /// Evaluate the just-closed bar (index 1) for level-break signals.
  ///
  /// With fewer than two bars there is no closed bar to judge and the
  /// update is empty.
  pub fn process_closed_bar<S: SeriesView + ?Sized>(&mut self, series: &S) -> SignalUpdate {
    if series.bar_count() < 2 {
      return SignalUpdate::default();
    }

    let u = unit(series, self.config.step_in_points);
    let step = effective_step(series, self.config.step, self.config.step_in_points);
    let z_off = (sanitize(self.config.zone_offset) * u).max(0.0);
    let m_off = (sanitize(self.config.marker_offset) * u).max(0.0);
    let digits = series.price_digits();

    let bar = 1;
    let open = series.open(bar);
    let close = series.close(bar);
    let high = series.high(bar);
    let low = series.low(bar);
    let time = series.time(bar);

    let (bull_level, bear_level) = match self.config.mode {
      SignalMode::TouchThenZoneClose => {
        touch_levels(open, high, low, close, step, z_off, digits)
      },
      SignalMode::OpenSideThenZoneClose => {
        let base = round_to_step(open, step);
        let next_up = if base >= open { base } else { base + step };
        let prev_down = if base <= open { base } else { base - step };
        let bull = (open < next_up && close > next_up + z_off).then_some(next_up);
        let bear = (open > prev_down && close < prev_down - z_off).then_some(prev_down);
        (bull, bear)
      },
    };

    let mut update = SignalUpdate::default();

    if let Some(level) = bull_level {
      if self.allowed(level, SignalSide::Bull, digits) {
        let name = format!("{SIGNAL_PREFIX}BULL_{time}");
        update.markers.push(MarkerDescriptor {
          name: name.clone(),
          time,
          price: high + m_off,
          side: SignalSide::Bull,
          color: self.config.bull_color,
        });
        self.emitted.push_back(name);
      }
    }

    if let Some(level) = bear_level {
      if self.allowed(level, SignalSide::Bear, digits) {
        let name = format!("{SIGNAL_PREFIX}BEAR_{time}");
        update.markers.push(MarkerDescriptor {
          name: name.clone(),
          time,
          price: low - m_off,
          side: SignalSide::Bear,
          color: self.config.bear_color,
        });
        self.emitted.push_back(name);
      }
    }

    let cap = self.config.max_markers.max(1);
    while self.emitted.len() > cap {
      if let Some(oldest) = self.emitted.pop_front() {
        update.expired.push(oldest);
      }
    }

    update
  }

  fn allowed(&mut self, level: f64, side: SignalSide, digits: u32) -> bool {
    let key = normalize_price(level, digits).to_bits();
    if self.last_side.get(&key) == Some(&side) {
      return false;
    }
    self.last_side.insert(key, side);
    true
  }
}

/// Touch-mode signal levels for one bar.
///
/// Walks the step multiples inside the bar's range, takes the touched
/// level closest above and closest below the open, and requires the close
/// to finish beyond that level's zone band. When the range touched levels
/// only on one side of the open, the nearest range boundary level stands
/// in for the other side.
fn touch_levels(
  open: f64,
  high: f64,
  low: f64,
  close: f64,
  step: f64,
  z_off: f64,
  digits: u32,
) -> (Option<f64>, Option<f64>) {
  let first = (low / step).ceil() * step;
  let last = (high / step).floor() * step;
  if last < first {
    // No level inside the bar's range
    return (None, None);
  }

  let mut closest_above: Option<f64> = None;
  let mut closest_below: Option<f64> = None;
  let mut lvl = first;
  while lvl <= last + 1e-10 {
    let level = normalize_price(lvl, digits);
    if level >= open && closest_above.map_or(true, |best| level < best) {
      closest_above = Some(level);
    }
    if level <= open && closest_below.map_or(true, |best| level > best) {
      closest_below = Some(level);
    }
    lvl += step;
  }

  let bull_level = closest_above.unwrap_or(normalize_price(first, digits));
  let bear_level = closest_below.unwrap_or(normalize_price(last, digits));

  let bull = (close > bull_level + z_off).then_some(bull_level);
  let bear = (close < bear_level - z_off).then_some(bear_level);
  (bull, bear)
}
