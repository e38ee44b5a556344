use std::collections::HashMap;

use lazy_static::lazy_static;
use serde::Serialize;

use crate::models::sample::{CanonicalType, PressureComponent};

/// One row of the supported-types catalog. The table below is the single
/// place vendor taxonomy knowledge lives: the type mapper, the canonical-unit
/// assignment and the client-facing catalog endpoint are all derived from it.
/// Supporting a new vendor identifier is a row edit, not a logic change.
#[derive(Debug, Serialize, Clone, Copy)]
#[serde(rename_all = "camelCase")]
pub struct SupportedType {
    pub vendor_type: &'static str,
    pub canonical_type: CanonicalType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub component: Option<PressureComponent>,
    pub display_name: &'static str,
    pub unit: &'static str,
    pub category: &'static str,
}

const fn entry(
    vendor_type: &'static str,
    canonical_type: CanonicalType,
    component: Option<PressureComponent>,
    display_name: &'static str,
    category: &'static str,
) -> SupportedType {
    SupportedType {
        vendor_type,
        canonical_type,
        component,
        display_name,
        unit: canonical_unit(canonical_type),
        category,
    }
}

/// Canonical unit per data type. The vendor-supplied unit string is never
/// trusted past the boundary; whatever it was is preserved in metadata.
pub const fn canonical_unit(data_type: CanonicalType) -> &'static str {
    match data_type {
        CanonicalType::HeartRate => "bpm",
        CanonicalType::Steps => "count",
        CanonicalType::Calories => "kcal",
        CanonicalType::Sleep => "minutes",
        CanonicalType::Weight => "kg",
        CanonicalType::BloodPressure => "mmHg",
        CanonicalType::BloodOxygen => "%",
        CanonicalType::BodyTemperature => "°C",
        CanonicalType::ExerciseSessions => "count",
        CanonicalType::Distance => "km",
        CanonicalType::FloorsClimbed => "count",
    }
}

pub static SUPPORTED_TYPES: &[SupportedType] = &[
    // HealthKit-style identifiers
    entry("HKQuantityTypeIdentifierHeartRate", CanonicalType::HeartRate, None, "Heart Rate", "vitals"),
    entry("HKQuantityTypeIdentifierStepCount", CanonicalType::Steps, None, "Step Count", "activity"),
    entry("HKQuantityTypeIdentifierActiveEnergyBurned", CanonicalType::Calories, None, "Active Energy", "activity"),
    entry("HKCategoryTypeIdentifierSleepAnalysis", CanonicalType::Sleep, None, "Sleep Analysis", "sleep"),
    entry("HKQuantityTypeIdentifierBodyMass", CanonicalType::Weight, None, "Body Weight", "body"),
    entry(
        "HKQuantityTypeIdentifierBloodPressureSystolic",
        CanonicalType::BloodPressure,
        Some(PressureComponent::Systolic),
        "Blood Pressure (Systolic)",
        "vitals",
    ),
    entry(
        "HKQuantityTypeIdentifierBloodPressureDiastolic",
        CanonicalType::BloodPressure,
        Some(PressureComponent::Diastolic),
        "Blood Pressure (Diastolic)",
        "vitals",
    ),
    entry("HKQuantityTypeIdentifierOxygenSaturation", CanonicalType::BloodOxygen, None, "Blood Oxygen", "vitals"),
    entry("HKQuantityTypeIdentifierBodyTemperature", CanonicalType::BodyTemperature, None, "Body Temperature", "vitals"),
    entry("HKWorkoutTypeIdentifier", CanonicalType::ExerciseSessions, None, "Exercise Sessions", "activity"),
    entry(
        "HKQuantityTypeIdentifierDistanceWalkingRunning",
        CanonicalType::Distance,
        None,
        "Walking/Running Distance",
        "activity",
    ),
    entry("HKQuantityTypeIdentifierFlightsClimbed", CanonicalType::FloorsClimbed, None, "Floors Climbed", "activity"),
    // Generic identifiers used by tracker cloud APIs
    entry("heart_rate", CanonicalType::HeartRate, None, "Heart Rate", "vitals"),
    entry("steps", CanonicalType::Steps, None, "Step Count", "activity"),
    entry("step_count", CanonicalType::Steps, None, "Step Count", "activity"),
    entry("calories", CanonicalType::Calories, None, "Active Energy", "activity"),
    entry("active_energy_burned", CanonicalType::Calories, None, "Active Energy", "activity"),
    entry("sleep", CanonicalType::Sleep, None, "Sleep Analysis", "sleep"),
    entry("sleep_analysis", CanonicalType::Sleep, None, "Sleep Analysis", "sleep"),
    entry("weight", CanonicalType::Weight, None, "Body Weight", "body"),
    entry("body_mass", CanonicalType::Weight, None, "Body Weight", "body"),
    entry(
        "blood_pressure_systolic",
        CanonicalType::BloodPressure,
        Some(PressureComponent::Systolic),
        "Blood Pressure (Systolic)",
        "vitals",
    ),
    entry(
        "blood_pressure_diastolic",
        CanonicalType::BloodPressure,
        Some(PressureComponent::Diastolic),
        "Blood Pressure (Diastolic)",
        "vitals",
    ),
    entry("blood_oxygen", CanonicalType::BloodOxygen, None, "Blood Oxygen", "vitals"),
    entry("spo2", CanonicalType::BloodOxygen, None, "Blood Oxygen", "vitals"),
    entry("body_temperature", CanonicalType::BodyTemperature, None, "Body Temperature", "vitals"),
    entry("exercise_session", CanonicalType::ExerciseSessions, None, "Exercise Sessions", "activity"),
    entry("workout", CanonicalType::ExerciseSessions, None, "Exercise Sessions", "activity"),
    entry("distance", CanonicalType::Distance, None, "Walking/Running Distance", "activity"),
    entry("floors_climbed", CanonicalType::FloorsClimbed, None, "Floors Climbed", "activity"),
    entry("flights_climbed", CanonicalType::FloorsClimbed, None, "Floors Climbed", "activity"),
];

lazy_static! {
    static ref VENDOR_TYPE_INDEX: HashMap<&'static str, &'static SupportedType> = SUPPORTED_TYPES
        .iter()
        .map(|entry| (entry.vendor_type, entry))
        .collect();
}

/// Map a vendor-specific type identifier onto the canonical taxonomy.
/// Unknown identifiers yield `None`; the caller records the item as
/// unsupported and moves on, so one unknown type never aborts a batch.
pub fn map_vendor_type(vendor_type: &str) -> Option<&'static SupportedType> {
    VENDOR_TYPE_INDEX.get(vendor_type).copied()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_healthkit_and_generic_identifiers() {
        let hk = map_vendor_type("HKQuantityTypeIdentifierHeartRate").unwrap();
        assert_eq!(hk.canonical_type, CanonicalType::HeartRate);

        let generic = map_vendor_type("heart_rate").unwrap();
        assert_eq!(generic.canonical_type, CanonicalType::HeartRate);
    }

    #[test]
    fn unknown_identifier_is_unsupported() {
        assert!(map_vendor_type("HKQuantityTypeIdentifierVO2Max").is_none());
        assert!(map_vendor_type("").is_none());
    }

    #[test]
    fn pressure_identifiers_carry_their_component() {
        let systolic = map_vendor_type("blood_pressure_systolic").unwrap();
        assert_eq!(systolic.component, Some(PressureComponent::Systolic));

        let diastolic = map_vendor_type("HKQuantityTypeIdentifierBloodPressureDiastolic").unwrap();
        assert_eq!(diastolic.canonical_type, CanonicalType::BloodPressure);
        assert_eq!(diastolic.component, Some(PressureComponent::Diastolic));
    }

    #[test]
    fn every_canonical_type_has_at_least_one_vendor_identifier() {
        for data_type in CanonicalType::ALL {
            assert!(
                SUPPORTED_TYPES.iter().any(|e| e.canonical_type == data_type),
                "no vendor identifier maps to {}",
                data_type
            );
        }
    }

    #[test]
    fn catalog_units_match_the_canonical_unit_table() {
        for entry in SUPPORTED_TYPES {
            assert_eq!(entry.unit, canonical_unit(entry.canonical_type));
        }
    }
}
