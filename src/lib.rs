//! # gapzones - Fair Value Gap Zones
//!
//! Detection, fill tracking and projection of fair value gaps (three-bar
//! price imbalances) over OHLC bar series.
//!
//! The pipeline is a pure function of a series snapshot: scan a bounded
//! lookback window for gaps, drop gaps that later price action has filled,
//! split the survivors by their position relative to the current price,
//! keep the most recent few per side and project them into renderable
//! zone descriptors. Drawing is left to the caller.
//!
//! ## Quick Start
//!
//! ```rust
//! use gapzones::prelude::*;
//!
//! // Define your OHLC data (oldest bar first)
//! struct Bar { o: f64, h: f64, l: f64, c: f64, t: i64 }
//!
//! impl Ohlc for Bar {
//!     fn open(&self) -> f64 { self.o }
//!     fn high(&self) -> f64 { self.h }
//!     fn low(&self) -> f64 { self.l }
//!     fn close(&self) -> f64 { self.c }
//!     fn time(&self) -> i64 { self.t }
//! }
//!
//! let bars: Vec<Bar> = vec![];
//! let series = SliceSeries::new(&bars, 2, 0.01);
//!
//! let engine = ZoneEngine::new(ZoneConfig::default());
//! let zones = engine.evaluate(&series);
//! assert!(zones.is_empty());
//! ```

pub mod closure;
pub mod config;
pub mod engine;
pub mod levels;
pub mod project;
pub mod scan;
pub mod select;

pub mod prelude {
    pub use crate::{
        // Closure tracking
        closure::{is_closed, retain_open},
        // Configuration
        config::{LineStyle, ZoneColor, ZoneConfig},
        // Engine
        engine::{diff_batches, evaluate_parallel, BatchDiff, EvalResult, ZoneEngine},
        // Level overlay
        levels::{
            psych_zone_lines, round_level_lines, LevelConfig, LevelSignalTracker,
            LineDescriptor, MarkerDescriptor, SignalConfig, SignalMode, SignalSide,
            SignalUpdate,
        },
        // Projection
        project::{
            estimate_bar_duration, project_zone, Border, DurationEstimator, Fill,
            ZoneDescriptor,
        },
        // Scanning
        scan::{scan_gaps, Gap, GapKind, MIN_LOOKBACK},
        // Selection
        select::{classify, select_sides, Selection, Side},
        // Series access
        normalize_price,
        round_to_step,
        Alpha,
        Ohlc,
        OhlcExt,
        Result,
        SeriesView,
        SliceSeries,
        ZoneError,
    };
}

// ============================================================
// ERRORS
// ============================================================

pub type Result<T> = std::result::Result<T, ZoneError>;

/// Errors that can occur when constructing validated inputs
#[derive(Debug, Clone, thiserror::Error)]
pub enum ZoneError {
    #[error("Invalid value: {0}")]
    InvalidValue(&'static str),

    #[error("{field} = {value} out of range [{min}, {max}]")]
    OutOfRange {
        field: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },

    #[error("Invalid bar at index {index}: {reason}")]
    InvalidBar { index: usize, reason: &'static str },
}

// ============================================================
// VALIDATED TYPES
// ============================================================

/// Fill opacity in 0..=255
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Alpha(u8);

impl Alpha {
    /// Create a new Alpha, validating the value is in [0, 255]
    pub fn new(value: i64) -> Result<Self> {
        if !(0..=255).contains(&value) {
            return Err(ZoneError::OutOfRange {
                field: "Alpha",
                value: value as f64,
                min: 0.0,
                max: 255.0,
            });
        }
        Ok(Self(value as u8))
    }

    /// Create an Alpha by clamping an arbitrary value into range
    pub const fn clamped(value: i64) -> Self {
        if value < 0 {
            Self(0)
        } else if value > 255 {
            Self(255)
        } else {
            Self(value as u8)
        }
    }

    #[inline]
    pub fn get(self) -> u8 {
        self.0
    }
}

impl serde::Serialize for Alpha {
    fn serialize<S: serde::Serializer>(&self, s: S) -> std::result::Result<S::Ok, S::Error> {
        self.0.serialize(s)
    }
}

impl<'de> serde::Deserialize<'de> for Alpha {
    fn deserialize<D: serde::Deserializer<'de>>(d: D) -> std::result::Result<Self, D::Error> {
        let value = i64::deserialize(d)?;
        Alpha::new(value).map_err(serde::de::Error::custom)
    }
}

// ============================================================
// BAR AND SERIES TRAITS
// ============================================================

/// Core OHLC bar trait. `time` is the bar's opening timestamp in the
/// caller's time unit (seconds in all examples and defaults).
pub trait Ohlc {
    fn open(&self) -> f64;
    fn high(&self) -> f64;
    fn low(&self) -> f64;
    fn close(&self) -> f64;
    fn time(&self) -> i64;
}

/// Extension trait with computed properties for OHLC bars
pub trait OhlcExt: Ohlc {
    #[inline]
    fn range(&self) -> f64 {
        self.high() - self.low()
    }

    #[inline]
    fn is_bullish(&self) -> bool {
        self.close() > self.open()
    }

    #[inline]
    fn is_bearish(&self) -> bool {
        self.close() < self.open()
    }

    /// Validate bar consistency
    fn validate(&self) -> Result<()> {
        if self.high() < self.low() {
            return Err(ZoneError::InvalidBar {
                index: 0,
                reason: "high < low",
            });
        }
        if self.open().is_nan() || self.high().is_nan() || self.low().is_nan() || self.close().is_nan()
        {
            return Err(ZoneError::InvalidBar {
                index: 0,
                reason: "NaN in OHLC",
            });
        }
        if self.open().is_infinite()
            || self.high().is_infinite()
            || self.low().is_infinite()
            || self.close().is_infinite()
        {
            return Err(ZoneError::InvalidBar {
                index: 0,
                reason: "Infinite value in OHLC",
            });
        }
        Ok(())
    }
}

impl<T: Ohlc> OhlcExt for T {}

/// Read-only accessor over a bar sequence.
///
/// Index 0 is always the most recent bar; larger indices are older bars.
/// Callers must not read `index >= bar_count()`; every scan in this crate
/// bounds itself so that this never happens.
pub trait SeriesView {
    fn bar_count(&self) -> usize;
    fn open(&self, index: usize) -> f64;
    fn high(&self, index: usize) -> f64;
    fn low(&self, index: usize) -> f64;
    fn close(&self, index: usize) -> f64;
    fn time(&self, index: usize) -> i64;

    /// Number of decimal digits of the instrument's price precision
    fn price_digits(&self) -> u32;

    /// Minimum price increment (point/tick size)
    fn tick_size(&self) -> f64;
}

impl<S: SeriesView + ?Sized> SeriesView for &S {
    fn bar_count(&self) -> usize {
        (**self).bar_count()
    }

    fn open(&self, index: usize) -> f64 {
        (**self).open(index)
    }

    fn high(&self, index: usize) -> f64 {
        (**self).high(index)
    }

    fn low(&self, index: usize) -> f64 {
        (**self).low(index)
    }

    fn close(&self, index: usize) -> f64 {
        (**self).close(index)
    }

    fn time(&self, index: usize) -> i64 {
        (**self).time(index)
    }

    fn price_digits(&self) -> u32 {
        (**self).price_digits()
    }

    fn tick_size(&self) -> f64 {
        (**self).tick_size()
    }
}

/// `SeriesView` adapter over a chronological slice of bars (oldest first).
///
/// Reverses the indexing so that view index 0 maps to the newest element
/// of the slice, matching the recent-first contract of `SeriesView`.
#[derive(Debug, Clone, Copy)]
pub struct SliceSeries<'a, T: Ohlc> {
    bars: &'a [T],
    digits: u32,
    tick: f64,
}

impl<'a, T: Ohlc> SliceSeries<'a, T> {
    pub fn new(bars: &'a [T], digits: u32, tick: f64) -> Self {
        Self { bars, digits, tick }
    }

    #[inline]
    fn bar(&self, index: usize) -> &T {
        &self.bars[self.bars.len() - 1 - index]
    }

    /// Validate all bars, reporting the chronological index of the offender
    pub fn validate(&self) -> Result<()> {
        for (i, bar) in self.bars.iter().enumerate() {
            bar.validate().map_err(|e| match e {
                ZoneError::InvalidBar { reason, .. } => ZoneError::InvalidBar { index: i, reason },
                other => other,
            })?;
        }
        Ok(())
    }
}

impl<T: Ohlc> SeriesView for SliceSeries<'_, T> {
    fn bar_count(&self) -> usize {
        self.bars.len()
    }

    fn open(&self, index: usize) -> f64 {
        self.bar(index).open()
    }

    fn high(&self, index: usize) -> f64 {
        self.bar(index).high()
    }

    fn low(&self, index: usize) -> f64 {
        self.bar(index).low()
    }

    fn close(&self, index: usize) -> f64 {
        self.bar(index).close()
    }

    fn time(&self, index: usize) -> i64 {
        self.bar(index).time()
    }

    fn price_digits(&self) -> u32 {
        self.digits
    }

    fn tick_size(&self) -> f64 {
        self.tick
    }
}

// ============================================================
// NUMERIC HELPERS
// ============================================================

/// Round a price to the given number of decimal digits.
///
/// `digits == 0` leaves the price untouched, matching chart platforms
/// that report zero digits for unconfigured instruments.
#[inline]
pub fn normalize_price(price: f64, digits: u32) -> f64 {
    if digits == 0 {
        return price;
    }
    let factor = 10f64.powi(digits as i32);
    (price * factor).round() / factor
}

/// Round a price to the nearest multiple of `step` (half away from zero)
#[inline]
pub fn round_to_step(price: f64, step: f64) -> f64 {
    (price / step).round() * step
}

/// Replace NaN/infinite input with zero before range clamping
#[inline]
pub fn sanitize(value: f64) -> f64 {
    if value.is_nan() || value.is_infinite() {
        0.0
    } else {
        value
    }
}

// ============================================================
// TESTS
// ============================================================
