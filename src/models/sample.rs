use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::str::FromStr;
use uuid::Uuid;

/// The closed set of data types every vendor measurement is mapped onto.
/// Vendor-specific identifiers only exist at the mapping boundary; everything
/// past the type mapper works in terms of this enum.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum CanonicalType {
    HeartRate,
    Steps,
    Calories,
    Sleep,
    Weight,
    BloodPressure,
    BloodOxygen,
    BodyTemperature,
    ExerciseSessions,
    Distance,
    FloorsClimbed,
}

impl CanonicalType {
    pub const ALL: [CanonicalType; 11] = [
        CanonicalType::HeartRate,
        CanonicalType::Steps,
        CanonicalType::Calories,
        CanonicalType::Sleep,
        CanonicalType::Weight,
        CanonicalType::BloodPressure,
        CanonicalType::BloodOxygen,
        CanonicalType::BodyTemperature,
        CanonicalType::ExerciseSessions,
        CanonicalType::Distance,
        CanonicalType::FloorsClimbed,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CanonicalType::HeartRate => "heart_rate",
            CanonicalType::Steps => "steps",
            CanonicalType::Calories => "calories",
            CanonicalType::Sleep => "sleep",
            CanonicalType::Weight => "weight",
            CanonicalType::BloodPressure => "blood_pressure",
            CanonicalType::BloodOxygen => "blood_oxygen",
            CanonicalType::BodyTemperature => "body_temperature",
            CanonicalType::ExerciseSessions => "exercise_sessions",
            CanonicalType::Distance => "distance",
            CanonicalType::FloorsClimbed => "floors_climbed",
        }
    }
}

impl Display for CanonicalType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, thiserror::Error)]
#[error("unknown canonical data type `{0}`")]
pub struct UnknownDataType(pub String);

impl FromStr for CanonicalType {
    type Err = UnknownDataType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        CanonicalType::ALL
            .iter()
            .find(|t| t.as_str() == s)
            .copied()
            .ok_or_else(|| UnknownDataType(s.to_string()))
    }
}

/// Which side of a blood-pressure reading a vendor sample carries. Vendors
/// deliver systolic and diastolic as two independent samples; both map onto
/// `CanonicalType::BloodPressure` and are merged into one stored record.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum PressureComponent {
    Systolic,
    Diastolic,
}

impl PressureComponent {
    pub fn as_str(&self) -> &'static str {
        match self {
            PressureComponent::Systolic => "systolic",
            PressureComponent::Diastolic => "diastolic",
        }
    }
}

impl Display for PressureComponent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for PressureComponent {
    type Err = UnknownDataType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "systolic" => Ok(PressureComponent::Systolic),
            "diastolic" => Ok(PressureComponent::Diastolic),
            other => Err(UnknownDataType(other.to_string())),
        }
    }
}

/// A normalized sample value. Scalar for every type except blood pressure,
/// which is stored as one structured pair so the identity key
/// (device, type, start time) holds at most one record. A pair side stays
/// `None` until the matching component has been delivered.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
#[serde(untagged)]
pub enum SampleValue {
    Scalar(f64),
    Pressure {
        systolic: Option<f64>,
        diastolic: Option<f64>,
    },
}

impl SampleValue {
    pub fn pressure_component(component: PressureComponent, value: f64) -> Self {
        match component {
            PressureComponent::Systolic => SampleValue::Pressure {
                systolic: Some(value),
                diastolic: None,
            },
            PressureComponent::Diastolic => SampleValue::Pressure {
                systolic: None,
                diastolic: Some(value),
            },
        }
    }

    /// Combine an incoming value with the value already stored under the same
    /// identity key. Pressure pairs keep the side the new delivery did not
    /// carry; anything else is a plain overwrite.
    pub fn merged_into(self, existing: &SampleValue) -> SampleValue {
        match (self, existing) {
            (
                SampleValue::Pressure {
                    systolic: new_sys,
                    diastolic: new_dia,
                },
                SampleValue::Pressure {
                    systolic: old_sys,
                    diastolic: old_dia,
                },
            ) => SampleValue::Pressure {
                systolic: new_sys.or(*old_sys),
                diastolic: new_dia.or(*old_dia),
            },
            (new_value, _) => new_value,
        }
    }
}

/// The durable, normalized record. At most one exists per
/// (device_config_id, data_type, start_time); later deliveries with the same
/// key amend this record in place.
#[derive(Debug, Serialize, Clone)]
pub struct CanonicalSample {
    pub id: Uuid,
    pub device_config_id: Uuid,
    pub data_type: CanonicalType,
    pub value: SampleValue,
    pub unit: String,
    pub start_time: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_time: Option<DateTime<Utc>>,
    pub source_app: String,
    pub metadata: serde_json::Value,
    pub synced_at: DateTime<Utc>,
}

/// A staged sample awaiting the batch reconciler. The vendor value is kept
/// raw; normalization happens when the drain applies it.
#[derive(Debug, Clone)]
pub struct PendingSample {
    pub id: Uuid,
    pub device_config_id: Uuid,
    pub data_type: CanonicalType,
    pub component: Option<PressureComponent>,
    pub value: f64,
    pub unit: Option<String>,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    pub source_app: String,
    pub metadata: serde_json::Value,
    pub processed: bool,
    pub arrival_seq: i64,
}

/// A pending sample as handed to the store, before it has an id and an
/// arrival sequence number.
#[derive(Debug, Clone)]
pub struct NewPendingSample {
    pub device_config_id: Uuid,
    pub data_type: CanonicalType,
    pub component: Option<PressureComponent>,
    pub value: f64,
    pub unit: Option<String>,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    pub source_app: String,
    pub metadata: serde_json::Value,
}
