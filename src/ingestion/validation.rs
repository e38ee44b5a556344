use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::ingestion::catalog::SupportedType;
use crate::models::sample::{CanonicalType, PressureComponent};
use crate::models::sync::RawSample;

/// Why a single raw sample was rejected. Each variant names the rule that
/// failed and the field it failed on; the message is surfaced verbatim in the
/// batch response for exactly that item.
#[derive(Debug, Error, PartialEq)]
pub enum ValidationFailure {
    #[error("missing required field `{0}`")]
    MissingField(&'static str),
    #[error("field `{field}` is not a valid ISO-8601 timestamp: `{value}`")]
    InvalidTimestamp { field: &'static str, value: String },
    #[error("end date {end} precedes start date {start}")]
    EndBeforeStart {
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    },
    #[error("start date {0} lies in the future")]
    StartInFuture(DateTime<Utc>),
    #[error("value {0} is not a finite number")]
    NonFiniteValue(f64),
    #[error("value {value} outside allowed range {min}..={max} for {data_type}")]
    ValueOutOfRange {
        value: f64,
        min: f64,
        max: f64,
        data_type: String,
    },
}

/// A raw sample that has passed every structural and physiological check.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ValidatedSample {
    pub value: f64,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
}

/// Physiological plausibility bounds, inclusive, applied to the raw value in
/// its source unit (distance is bounded in meters, before conversion).
/// Sleep and exercise sessions carry no bound.
fn value_bounds(
    data_type: CanonicalType,
    component: Option<PressureComponent>,
) -> Option<(f64, f64)> {
    match (data_type, component) {
        (CanonicalType::HeartRate, _) => Some((30.0, 250.0)),
        (CanonicalType::Steps, _) => Some((0.0, 100_000.0)),
        (CanonicalType::Calories, _) => Some((0.0, 10_000.0)),
        (CanonicalType::Weight, _) => Some((20.0, 300.0)),
        (CanonicalType::BloodPressure, Some(PressureComponent::Systolic)) => Some((50.0, 300.0)),
        (CanonicalType::BloodPressure, Some(PressureComponent::Diastolic)) => Some((30.0, 200.0)),
        (CanonicalType::BloodPressure, None) => None,
        (CanonicalType::BloodOxygen, _) => Some((70.0, 100.0)),
        (CanonicalType::BodyTemperature, _) => Some((30.0, 45.0)),
        (CanonicalType::Distance, _) => Some((0.0, 200_000.0)),
        (CanonicalType::FloorsClimbed, _) => Some((0.0, 1_000.0)),
        (CanonicalType::Sleep, _) | (CanonicalType::ExerciseSessions, _) => None,
    }
}

fn bounded_label(data_type: CanonicalType, component: Option<PressureComponent>) -> String {
    match component {
        Some(component) => format!("{} ({})", data_type, component),
        None => data_type.to_string(),
    }
}

fn parse_instant(field: &'static str, value: &str) -> Result<DateTime<Utc>, ValidationFailure> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|_| ValidationFailure::InvalidTimestamp {
            field,
            value: value.to_string(),
        })
}

/// Check one raw sample, short-circuiting on the first failed rule, in order:
/// required fields, timestamp parse, end >= start, start not in the future
/// (relative to `now`), finite value, per-type physiological bounds.
/// Boundary values are accepted.
pub fn validate(
    mapping: &SupportedType,
    raw: &RawSample,
    now: DateTime<Utc>,
) -> Result<ValidatedSample, ValidationFailure> {
    let value = raw.value.ok_or(ValidationFailure::MissingField("value"))?;
    let start_date = raw
        .start_date
        .as_deref()
        .ok_or(ValidationFailure::MissingField("startDate"))?;
    let end_date = raw
        .end_date
        .as_deref()
        .ok_or(ValidationFailure::MissingField("endDate"))?;

    let start_time = parse_instant("startDate", start_date)?;
    let end_time = parse_instant("endDate", end_date)?;

    if end_time < start_time {
        return Err(ValidationFailure::EndBeforeStart {
            start: start_time,
            end: end_time,
        });
    }
    if start_time > now {
        return Err(ValidationFailure::StartInFuture(start_time));
    }

    if !value.is_finite() {
        return Err(ValidationFailure::NonFiniteValue(value));
    }
    if let Some((min, max)) = value_bounds(mapping.canonical_type, mapping.component) {
        if value < min || value > max {
            return Err(ValidationFailure::ValueOutOfRange {
                value,
                min,
                max,
                data_type: bounded_label(mapping.canonical_type, mapping.component),
            });
        }
    }

    Ok(ValidatedSample {
        value,
        start_time,
        end_time,
    })
}
