use crate::ingestion::catalog::canonical_unit;
use crate::models::sample::{CanonicalType, PressureComponent, SampleValue};

fn round_two_places(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Convert a validated raw value into its canonical value and unit.
///
/// This function is pure and deterministic: identical inputs always yield
/// identical outputs, with no dependence on wall-clock time or external
/// state. The upsert engine recomputes and overwrites values on re-delivery,
/// so any nondeterminism here would let a re-sync silently corrupt
/// previously-correct records.
///
/// Rules: sleep converts seconds to whole minutes, distance converts meters
/// to kilometers at two decimal places, blood-pressure components pass
/// through unchanged into their side of the stored pair, and every other
/// type rounds to two decimal places. The canonical unit always comes from
/// the fixed type→unit table, regardless of what the vendor claimed.
pub fn normalize(
    data_type: CanonicalType,
    component: Option<PressureComponent>,
    raw_value: f64,
) -> (SampleValue, &'static str) {
    let value = match (data_type, component) {
        (CanonicalType::Sleep, _) => SampleValue::Scalar((raw_value / 60.0).round()),
        (CanonicalType::Distance, _) => SampleValue::Scalar(round_two_places(raw_value / 1000.0)),
        (CanonicalType::BloodPressure, Some(component)) => {
            SampleValue::pressure_component(component, raw_value)
        }
        // Unreachable through the mapping table, which always attaches a
        // component to pressure identifiers; kept total rather than panicking.
        (CanonicalType::BloodPressure, None) => SampleValue::Scalar(raw_value),
        _ => SampleValue::Scalar(round_two_places(raw_value)),
    };
    (value, canonical_unit(data_type))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sleep_seconds_become_whole_minutes() {
        let (value, unit) = normalize(CanonicalType::Sleep, None, 27_000.0);
        assert_eq!(value, SampleValue::Scalar(450.0));
        assert_eq!(unit, "minutes");
    }

    #[test]
    fn sleep_rounds_to_the_nearest_minute() {
        let (value, _) = normalize(CanonicalType::Sleep, None, 27_031.0);
        assert_eq!(value, SampleValue::Scalar(451.0));
        let (value, _) = normalize(CanonicalType::Sleep, None, 27_029.0);
        assert_eq!(value, SampleValue::Scalar(450.0));
    }

    #[test]
    fn distance_meters_become_kilometers() {
        let (value, unit) = normalize(CanonicalType::Distance, None, 12_345.0);
        assert_eq!(value, SampleValue::Scalar(12.35));
        assert_eq!(unit, "km");
    }

    #[test]
    fn pressure_components_pass_through_unchanged() {
        let (value, unit) = normalize(
            CanonicalType::BloodPressure,
            Some(PressureComponent::Systolic),
            121.4,
        );
        assert_eq!(
            value,
            SampleValue::Pressure {
                systolic: Some(121.4),
                diastolic: None,
            }
        );
        assert_eq!(unit, "mmHg");
    }

    #[test]
    fn scalar_types_round_to_two_places() {
        let (value, unit) = normalize(CanonicalType::Weight, None, 72.4567);
        assert_eq!(value, SampleValue::Scalar(72.46));
        assert_eq!(unit, "kg");

        let (value, _) = normalize(CanonicalType::HeartRate, None, 71.999);
        assert_eq!(value, SampleValue::Scalar(72.0));
    }

    #[test]
    fn normalization_is_deterministic_across_repeated_calls() {
        for data_type in CanonicalType::ALL {
            let first = normalize(data_type, None, 88.1234);
            let second = normalize(data_type, None, 88.1234);
            assert_eq!(first, second);
        }
    }

    #[test]
    fn canonical_unit_overrides_the_vendor_unit() {
        // The vendor unit never reaches this function; the table decides.
        let (_, unit) = normalize(CanonicalType::BloodOxygen, None, 97.0);
        assert_eq!(unit, "%");
        let (_, unit) = normalize(CanonicalType::BodyTemperature, None, 36.6);
        assert_eq!(unit, "°C");
    }
}
