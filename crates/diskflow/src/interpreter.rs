// Copyright 2026 Dropbox (created by Andrew Yates <ayates@dropbox.com>)

//! Forecast interpretation: raw probabilistic output to a verdict.
//!
//! The decision is deliberately conservative: a violation fires when
//! the *lower* (pessimistic) confidence band reaches 100%, meaning the
//! analyzer is confident usage will be at least that high. The expected
//! or upper forecast never raises an alert on its own.
//!
//! Interpretation is a pure function of the record and the clock; all
//! malformed inputs degrade to a rejection, never a panic.

use chrono::{DateTime, Duration, Utc};
use tracing::debug;

use crate::analyzer::{AnalysisStatus, ForecastQuality, ForecastRecord};
use crate::entity::DiskEntity;
use crate::summary::{DiskOutcome, ViolationRecord};

/// Usage percentage at which a disk is full.
const CAPACITY_PERCENT: f64 = 100.0;

/// Decide whether `record` warrants a violation for `entity`.
///
/// Returns [`DiskOutcome::Violation`] when the lower forecast band
/// crosses 100% within the horizon and the disk is not already full,
/// [`DiskOutcome::Clean`] for usable predictions without a crossing,
/// [`DiskOutcome::Invalid`] when the analyzer self-rejected the
/// prediction, and [`DiskOutcome::Inconclusive`] for anything the
/// record does not let us interpret (bad status, missing series).
#[must_use]
pub fn interpret(entity: &DiskEntity, record: &ForecastRecord, now: DateTime<Utc>) -> DiskOutcome {
    if record.analysis_status != AnalysisStatus::Ok {
        debug!(
            disk_id = %entity.disk_id,
            status = ?record.analysis_status,
            "analysis did not complete cleanly"
        );
        return DiskOutcome::Inconclusive;
    }

    match record.forecast_quality_assessment {
        ForecastQuality::Valid => {}
        ForecastQuality::Invalid => {
            debug!(disk_id = %entity.disk_id, "analyzer rejected its own prediction");
            return DiskOutcome::Invalid;
        }
        ForecastQuality::Other(_) => {
            debug!(
                disk_id = %entity.disk_id,
                quality = ?record.forecast_quality_assessment,
                "unrecognized forecast quality"
            );
            return DiskOutcome::Inconclusive;
        }
    }

    // Most recent observation is the current usage.
    let current_usage = match record.usage_history.last() {
        Some(value) if value.is_finite() => *value,
        _ => {
            debug!(disk_id = %entity.disk_id, "no usable usage history");
            return DiskOutcome::Inconclusive;
        }
    };

    let days_to_full = record
        .lower_forecast
        .iter()
        .position(|value| *value >= CAPACITY_PERCENT);

    let Some(days_to_full) = days_to_full else {
        return DiskOutcome::Clean;
    };

    // A disk already at capacity is a pre-existing condition, not a
    // prediction; it is reported by live alerting, not this pipeline.
    if current_usage >= CAPACITY_PERCENT {
        debug!(
            disk_id = %entity.disk_id,
            current_usage,
            "disk already full, not a predicted violation"
        );
        return DiskOutcome::Clean;
    }

    // Day 0 of the forecast array means "tomorrow".
    let days_until_full = days_to_full as u32 + 1;
    let predicted_date = (now + Duration::days(i64::from(days_until_full))).date_naive();
    let confidence = band_confidence(record, days_to_full);

    DiskOutcome::Violation(Box::new(ViolationRecord {
        disk_id: entity.disk_id.clone(),
        disk_name: name_or(record.disk_name.as_deref(), &entity.disk_name),
        host_id: entity.host_id.clone(),
        host_name: name_or(record.host_name.as_deref(), &entity.host_name),
        current_usage: round2(current_usage),
        days_until_full,
        predicted_date,
        confidence,
        analyzed_at: now,
    }))
}

/// Confidence from the band width at the crossing day: a narrow
/// predicted interval yields high confidence, a 100-point-wide one
/// yields none. Missing upper band counts as width zero.
fn band_confidence(record: &ForecastRecord, day_index: usize) -> f64 {
    let lower = record.lower_forecast.get(day_index).copied();
    let upper = record
        .upper_forecast
        .as_ref()
        .and_then(|series| series.get(day_index))
        .copied();

    let width = match (lower, upper) {
        (Some(lower), Some(upper)) if lower.is_finite() && upper.is_finite() => {
            (upper - lower).min(CAPACITY_PERCENT)
        }
        _ => 0.0,
    };

    round2((1.0 - width / CAPACITY_PERCENT).clamp(0.0, 1.0))
}

/// Prefer the analyzer-resolved display name, falling back to the
/// entity list.
fn name_or(resolved: Option<&str>, fallback: &str) -> String {
    match resolved {
        Some(name) if !name.is_empty() => name.to_string(),
        _ => fallback.to_string(),
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
