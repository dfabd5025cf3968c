//! Validation rules for collection and processing events.
//!
//! Every rule runs independently and appends its message on failure, so a
//! single call reports all simultaneous violations. The only dependencies
//! between rules are guards that keep a rule from reporting on input that
//! an earlier rule already rejected: the geofence is only measured for a
//! usable coordinate, and efficiency is only computed when both quantities
//! are positive.

use rust_decimal::Decimal;

use herbtrace_geo::Geofence;
use herbtrace_types::{CollectionEventDraft, Coordinate, ProcessingEventDraft, ValidationReport};

/// Species missing or unnamed.
pub const SPECIES_REQUIRED: &str = "Species information is required";
/// Coordinate missing, zero, non-finite or out of range.
pub const COORDINATES_REQUIRED: &str = "Valid GPS coordinates are required";
/// Collected quantity not positive.
pub const QUANTITY_NOT_POSITIVE: &str = "Quantity must be greater than zero";
/// Collector name blank.
pub const COLLECTOR_NAME_REQUIRED: &str = "Collector name is required";
/// Processing step without a type.
pub const PROCESS_TYPE_REQUIRED: &str = "Process type is required";
/// Processing input not positive.
pub const INPUT_NOT_POSITIVE: &str = "Input quantity must be greater than zero";
/// Processing output not positive.
pub const OUTPUT_NOT_POSITIVE: &str = "Output quantity must be greater than zero";
/// Processing produced more than it consumed.
pub const OUTPUT_EXCEEDS_INPUT: &str = "Output quantity cannot exceed input quantity";

/// Default minimum processing efficiency, in percent.
pub const DEFAULT_MIN_EFFICIENCY_PERCENT: Decimal = Decimal::from_parts(50, 0, 0, false, 0);

const HUNDRED: Decimal = Decimal::ONE_HUNDRED;

/// Stateless rule engine for draft events.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Validator {
    /// The authorized collection zone.
    pub geofence: Geofence,
    /// Output/input ratio (percent) below which a processing step is rejected.
    pub min_efficiency_percent: Decimal,
}

impl Default for Validator {
    fn default() -> Self {
        Self {
            geofence: Geofence::default(),
            min_efficiency_percent: DEFAULT_MIN_EFFICIENCY_PERCENT,
        }
    }
}

impl Validator {
    /// Create a validator with an explicit geofence and efficiency floor.
    pub const fn new(geofence: Geofence, min_efficiency_percent: Decimal) -> Self {
        Self {
            geofence,
            min_efficiency_percent,
        }
    }

    /// Check a collection draft against every collection rule.
    pub fn validate_collection_event(&self, draft: &CollectionEventDraft) -> ValidationReport {
        let mut errors = Vec::new();

        let named = draft
            .species
            .as_ref()
            .is_some_and(|s| !s.name.trim().is_empty());
        if !named {
            errors.push(SPECIES_REQUIRED.to_owned());
        }

        let coordinate = draft.location.coordinate.filter(is_usable_coordinate);
        if coordinate.is_none() {
            errors.push(COORDINATES_REQUIRED.to_owned());
        }

        if draft.quantity <= Decimal::ZERO {
            errors.push(QUANTITY_NOT_POSITIVE.to_owned());
        }

        if draft.collector.name.trim().is_empty() {
            errors.push(COLLECTOR_NAME_REQUIRED.to_owned());
        }

        if let Some(point) = coordinate {
            let check = self.geofence.check(&point);
            if !check.inside {
                errors.push(format!(
                    "Collection location is outside authorized {} km radius (distance: {:.2} km)",
                    self.geofence.radius_km, check.distance_km
                ));
            }
        }

        ValidationReport::from_errors(errors)
    }

    /// Check a processing draft against every processing rule.
    pub fn validate_processing_event(&self, draft: &ProcessingEventDraft) -> ValidationReport {
        let mut errors = Vec::new();

        if draft.process_type.is_none() {
            errors.push(PROCESS_TYPE_REQUIRED.to_owned());
        }

        let input = draft.input_quantity;
        let output = draft.output_quantity;

        if input <= Decimal::ZERO {
            errors.push(INPUT_NOT_POSITIVE.to_owned());
        }
        if output <= Decimal::ZERO {
            errors.push(OUTPUT_NOT_POSITIVE.to_owned());
        }
        if output > input {
            errors.push(OUTPUT_EXCEEDS_INPUT.to_owned());
        }

        if input > Decimal::ZERO && output > Decimal::ZERO {
            let efficiency = output
                .checked_mul(HUNDRED)
                .and_then(|scaled| scaled.checked_div(input));
            // An overflowing ratio is far above any floor.
            if efficiency.is_some_and(|e| e < self.min_efficiency_percent) {
                errors.push(format!(
                    "Processing efficiency is unusually low (< {}%)",
                    self.min_efficiency_percent.normalize()
                ));
            }
        }

        ValidationReport::from_errors(errors)
    }
}

/// A coordinate is usable when both axes are finite, non-zero and in range.
///
/// Zero on either axis is treated as "no fix", matching what GPS widgets
/// submit when positioning fails.
fn is_usable_coordinate(c: &Coordinate) -> bool {
    c.latitude.is_finite()
        && c.longitude.is_finite()
        && c.latitude != 0.0
        && c.longitude != 0.0
        && (-90.0..=90.0).contains(&c.latitude)
        && (-180.0..=180.0).contains(&c.longitude)
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;

    use herbtrace_types::{
        Actor, HarvestMethod, ProcessType, QuantityUnit, SiteLocation, Species, SpeciesCategory,
        SustainabilityStatus,
    };

    use super::*;

    fn turmeric() -> Species {
        Species {
            id: "turmeric-001".to_owned(),
            name: "Turmeric".to_owned(),
            scientific_name: "Curcuma longa".to_owned(),
            category: SpeciesCategory::Root,
            harvest_season: vec!["January".to_owned(), "February".to_owned()],
            sustainability_status: SustainabilityStatus::Abundant,
        }
    }

    fn valid_collection() -> CollectionEventDraft {
        CollectionEventDraft {
            species: Some(turmeric()),
            collector: Actor {
                id: "collector-1".to_owned(),
                name: "Asha".to_owned(),
            },
            location: SiteLocation {
                coordinate: Some(Coordinate::new(30.35, 76.36)),
                region: "Punjab, India".to_owned(),
                address: None,
            },
            timestamp: None,
            quantity: dec!(12.5),
            unit: QuantityUnit::Kg,
            quality_notes: None,
            weather_conditions: None,
            harvest_method: HarvestMethod::HandPicked,
        }
    }

    fn valid_processing() -> ProcessingEventDraft {
        ProcessingEventDraft {
            processor: Actor {
                id: "processor-1".to_owned(),
                name: "Ayur Mills".to_owned(),
            },
            facility: SiteLocation::default(),
            timestamp: None,
            process_type: Some(ProcessType::Drying),
            input_quantity: dec!(10),
            output_quantity: dec!(6),
            quality_tests: Vec::new(),
            certifications: Vec::new(),
        }
    }

    fn errors_of(report: &ValidationReport) -> Vec<&str> {
        report.errors().iter().map(String::as_str).collect()
    }

    // -----------------------------------------------------------------------
    // Collection rules
    // -----------------------------------------------------------------------

    #[test]
    fn valid_collection_passes() {
        let report = Validator::default().validate_collection_event(&valid_collection());
        assert!(report.is_valid(), "{:?}", report.errors());
    }

    #[test]
    fn missing_species_reported_alone() {
        let mut draft = valid_collection();
        draft.species = None;
        let report = Validator::default().validate_collection_event(&draft);
        assert_eq!(errors_of(&report), vec![SPECIES_REQUIRED]);
    }

    #[test]
    fn unnamed_species_is_missing() {
        let mut draft = valid_collection();
        draft.species = Some(Species {
            name: "  ".to_owned(),
            ..turmeric()
        });
        let report = Validator::default().validate_collection_event(&draft);
        assert_eq!(errors_of(&report), vec![SPECIES_REQUIRED]);
    }

    #[test]
    fn missing_coordinate_skips_geofence() {
        let mut draft = valid_collection();
        draft.location.coordinate = None;
        let report = Validator::default().validate_collection_event(&draft);
        assert_eq!(errors_of(&report), vec![COORDINATES_REQUIRED]);
    }

    #[test]
    fn zero_or_out_of_range_coordinates_rejected() {
        for bad in [
            Coordinate::new(0.0, 76.36),
            Coordinate::new(30.35, 0.0),
            Coordinate::new(91.0, 76.36),
            Coordinate::new(30.35, f64::INFINITY),
            Coordinate::new(f64::NAN, 76.36),
        ] {
            let mut draft = valid_collection();
            draft.location.coordinate = Some(bad);
            let report = Validator::default().validate_collection_event(&draft);
            assert_eq!(errors_of(&report), vec![COORDINATES_REQUIRED], "{bad:?}");
        }
    }

    #[test]
    fn non_positive_quantity_rejected() {
        for qty in [dec!(0), dec!(-1)] {
            let mut draft = valid_collection();
            draft.quantity = qty;
            let report = Validator::default().validate_collection_event(&draft);
            assert_eq!(errors_of(&report), vec![QUANTITY_NOT_POSITIVE]);
        }
    }

    #[test]
    fn blank_collector_name_rejected() {
        let mut draft = valid_collection();
        draft.collector.name = "   ".to_owned();
        let report = Validator::default().validate_collection_event(&draft);
        assert_eq!(errors_of(&report), vec![COLLECTOR_NAME_REQUIRED]);
    }

    #[test]
    fn origin_passes_geofence() {
        let mut draft = valid_collection();
        draft.location.coordinate = Some(herbtrace_geo::AUTHORIZED_ORIGIN);
        assert!(Validator::default().validate_collection_event(&draft).is_valid());
    }

    #[test]
    fn fifty_km_away_fails_with_distance() {
        let mut draft = valid_collection();
        draft.location.coordinate = Some(Coordinate::new(30.3507 + 0.45, 76.3595));
        let report = Validator::default().validate_collection_event(&draft);
        assert_eq!(report.errors().len(), 1);
        let message = report.errors().first().cloned().unwrap_or_default();
        assert!(
            message.starts_with("Collection location is outside authorized 10 km radius (distance: 50."),
            "{message}"
        );
        assert!(message.ends_with(" km)"));
    }

    #[test]
    fn violations_accumulate_in_rule_order() {
        let draft = CollectionEventDraft {
            species: None,
            collector: Actor::default(),
            location: SiteLocation::default(),
            timestamp: None,
            quantity: Decimal::ZERO,
            unit: QuantityUnit::Grams,
            quality_notes: None,
            weather_conditions: None,
            harvest_method: HarvestMethod::Mechanical,
        };
        let report = Validator::default().validate_collection_event(&draft);
        assert_eq!(
            errors_of(&report),
            vec![
                SPECIES_REQUIRED,
                COORDINATES_REQUIRED,
                QUANTITY_NOT_POSITIVE,
                COLLECTOR_NAME_REQUIRED
            ]
        );
    }

    // -----------------------------------------------------------------------
    // Processing rules
    // -----------------------------------------------------------------------

    #[test]
    fn valid_processing_passes() {
        let report = Validator::default().validate_processing_event(&valid_processing());
        assert!(report.is_valid(), "{:?}", report.errors());
    }

    #[test]
    fn missing_process_type_reported_alone() {
        let mut draft = valid_processing();
        draft.process_type = None;
        let report = Validator::default().validate_processing_event(&draft);
        assert_eq!(errors_of(&report), vec![PROCESS_TYPE_REQUIRED]);
    }

    #[test]
    fn efficiency_below_half_rejected() {
        let mut draft = valid_processing();
        draft.output_quantity = dec!(4);
        let report = Validator::default().validate_processing_event(&draft);
        assert_eq!(
            errors_of(&report),
            vec!["Processing efficiency is unusually low (< 50%)"]
        );
    }

    #[test]
    fn efficiency_exactly_at_floor_passes() {
        let mut draft = valid_processing();
        draft.output_quantity = dec!(5);
        assert!(Validator::default().validate_processing_event(&draft).is_valid());
    }

    #[test]
    fn output_above_input_rejected() {
        let mut draft = valid_processing();
        draft.output_quantity = dec!(12);
        let report = Validator::default().validate_processing_event(&draft);
        assert_eq!(errors_of(&report), vec![OUTPUT_EXCEEDS_INPUT]);
    }

    #[test]
    fn zero_input_skips_efficiency() {
        let mut draft = valid_processing();
        draft.input_quantity = Decimal::ZERO;
        let report = Validator::default().validate_processing_event(&draft);
        assert_eq!(errors_of(&report), vec![INPUT_NOT_POSITIVE, OUTPUT_EXCEEDS_INPUT]);
    }

    #[test]
    fn zero_output_skips_efficiency() {
        let mut draft = valid_processing();
        draft.output_quantity = Decimal::ZERO;
        let report = Validator::default().validate_processing_event(&draft);
        assert_eq!(errors_of(&report), vec![OUTPUT_NOT_POSITIVE]);
    }

    #[test]
    fn custom_efficiency_floor_in_message() {
        let validator = Validator::new(Geofence::default(), dec!(75));
        let report = validator.validate_processing_event(&valid_processing());
        assert_eq!(
            errors_of(&report),
            vec!["Processing efficiency is unusually low (< 75%)"]
        );
    }
}
