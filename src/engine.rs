//! Evaluation pipeline: scan, track closure, select, project.
//!
//! One evaluation is a pure, synchronous function of the series snapshot
//! and the configuration: invoking it any number of times over unchanged
//! input yields identical descriptor batches (same identities, same
//! coordinates). The engine never draws; callers diff successive batches
//! with [`diff_batches`] and drive their renderer from the result.

use std::collections::HashSet;

use log::{debug, trace};
use rayon::prelude::*;

use crate::{
    closure::retain_open,
    config::ZoneConfig,
    project::{estimate_bar_duration, project_zone, ZoneDescriptor},
    scan::scan_gaps,
    select::{select_sides, Side},
    SeriesView,
};

/// Gap-zone evaluation engine.
///
/// Holds a clamped copy of the configuration; construction is the only
/// place clamping happens, so every downstream stage can assume valid
/// values.
#[derive(Debug, Clone)]
pub struct ZoneEngine {
    config: ZoneConfig,
}

impl ZoneEngine {
    pub fn new(config: ZoneConfig) -> Self {
        Self {
            config: config.clamped(),
        }
    }

    /// The clamped configuration in effect
    pub fn config(&self) -> &ZoneConfig {
        &self.config
    }

    /// Run a full evaluation with the current close as reference price.
    ///
    /// An empty series yields an empty batch, never an error.
    pub fn evaluate<S: SeriesView + ?Sized>(&self, series: &S) -> Vec<ZoneDescriptor> {
        if series.bar_count() == 0 {
            return Vec::new();
        }
        self.evaluate_at(series, series.close(0))
    }

    /// Run a full evaluation against an explicit reference price
    pub fn evaluate_at<S: SeriesView + ?Sized>(
        &self,
        series: &S,
        price: f64,
    ) -> Vec<ZoneDescriptor> {
        let cfg = &self.config;

        let candidates = scan_gaps(series, cfg.lookback);
        trace!("scanned {} bars, {} candidates", series.bar_count(), candidates.len());

        let open = retain_open(series, candidates);
        let selection = select_sides(&open, price, cfg.max_above as usize, cfg.max_below as usize);
        debug!(
            "open gaps: {} ({} above / {} below after truncation)",
            open.len(),
            selection.above.len(),
            selection.below.len()
        );

        let bar_duration = estimate_bar_duration(series, cfg.duration_estimator);

        let mut zones = Vec::with_capacity(selection.above.len() + selection.below.len());
        for (rank, gap) in selection.above.iter().enumerate() {
            zones.push(project_zone(series, gap, Side::Above, rank, cfg, bar_duration));
        }
        for (rank, gap) in selection.below.iter().enumerate() {
            zones.push(project_zone(series, gap, Side::Below, rank, cfg, bar_duration));
        }
        zones
    }
}

// ============================================================
// EMIT CONTRACT
// ============================================================

/// Difference between two emitted batches, keyed by descriptor name.
///
/// The emit contract is delete-then-recreate: descriptors named in
/// `removed` should be deleted by the renderer, everything in the new
/// batch (re-)created. `retained` and `added` split the new batch for
/// renderers that prefer to update in place.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BatchDiff {
    pub removed: Vec<String>,
    pub retained: Vec<String>,
    pub added: Vec<String>,
}

/// Diff two descriptor batches by identity, preserving batch order
pub fn diff_batches(prev: &[ZoneDescriptor], next: &[ZoneDescriptor]) -> BatchDiff {
    let prev_names: HashSet<&str> = prev.iter().map(|z| z.name.as_str()).collect();
    let next_names: HashSet<&str> = next.iter().map(|z| z.name.as_str()).collect();

    let removed = prev
        .iter()
        .filter(|z| !next_names.contains(z.name.as_str()))
        .map(|z| z.name.clone())
        .collect();
    let (retained, added) = next.iter().partition::<Vec<_>, _>(|z| prev_names.contains(z.name.as_str()));

    BatchDiff {
        removed,
        retained: retained.into_iter().map(|z| z.name.clone()).collect(),
        added: added.into_iter().map(|z| z.name.clone()).collect(),
    }
}

// ============================================================
// PARALLEL EVALUATION
// ============================================================

/// Result of evaluating a single instrument
#[derive(Debug)]
pub struct EvalResult {
    pub symbol: String,
    pub zones: Vec<ZoneDescriptor>,
}

/// Evaluate many independent instruments in parallel.
///
/// Each evaluation is read-only over its own series and writes to a
/// private output buffer, so no ordering invariant of the per-series
/// pipeline is affected.
pub fn evaluate_parallel<'a, S, I>(engine: &ZoneEngine, instruments: I) -> Vec<EvalResult>
where
    S: SeriesView + Sync + ?Sized + 'a,
    I: IntoParallelIterator<Item = (&'a str, &'a S)>,
{
    instruments
        .into_par_iter()
        .map(|(symbol, series)| EvalResult {
            symbol: symbol.to_string(),
            zones: engine.evaluate(series),
        })
        .collect()
}

// ============================================================
// TESTS
// ============================================================
