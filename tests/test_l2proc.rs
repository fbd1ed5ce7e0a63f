use std::path::{Path, PathBuf};

use anyhow::anyhow;
use chrono::{TimeZone, Utc};
use floe::auxdata::snow::FixedSnowOptions;
use floe::auxdata::{AuxPeriodKey, GriddedDataset, GriddedDatasetSource};
use floe::core::classifier::{
    RickerLeadThresholds, RickerOceanThresholds, RickerSeaIceThresholds, RickerTc2014Thresholds,
};
use floe::l2::pipeline::{Level2JobConfig, QualityFilter};
use floe::l2::{L1bSource, TrackData};
use floe::types::FloeError;
use floe::{
    ClassifierParameterSet, Hemisphere, IceTypeFraction, Level1bData, Level2Data,
    Level2Processor, RegionOfInterest, SnowSourceDef, SurfaceClass, SurfaceTypeClassifierDef,
};
use ndarray::Array1;

/// Level-1 source serving synthetic in-memory granules
struct SyntheticL1bSource {
    granules: Vec<(String, Option<Level1bData>)>,
}

impl L1bSource for SyntheticL1bSource {
    fn read(&mut self, granule: &Path) -> Result<Level1bData, FloeError> {
        let name = granule.to_string_lossy().to_string();
        self.granules
            .iter()
            .find(|(id, _)| *id == name)
            .and_then(|(_, l1b)| l1b.clone())
            .ok_or_else(|| FloeError::MissingExternalData(format!("granule {}", name)))
    }
}

/// Unused by the fixed snow source, but the run loop needs one
struct NoGridSource;

impl GriddedDatasetSource for NoGridSource {
    fn load(&mut self, key: &AuxPeriodKey) -> Result<GriddedDataset, FloeError> {
        Err(FloeError::MissingExternalData(format!("{}", key)))
    }
}

fn ricker_thresholds() -> SurfaceTypeClassifierDef {
    SurfaceTypeClassifierDef::RickerTc2014(RickerTc2014Thresholds {
        ocean: RickerOceanThresholds {
            peakiness_min: 0.0,
            peakiness_max: 10.0,
            stack_standard_deviation_min: 4.0,
            ice_concentration_min: 15.0,
            ocog_width_min: 5.0,
        },
        lead: RickerLeadThresholds {
            peakiness_l_min: 30.0,
            peakiness_r_min: 30.0,
            peakiness_min: 30.0,
            stack_kurtosis_min: 15.0,
            stack_standard_deviation_max: 4.0,
            ice_concentration_min: 70.0,
        },
        sea_ice: RickerSeaIceThresholds {
            peakiness_r_max: 25.0,
            peakiness_l_max: 25.0,
            peakiness_max: 25.0,
            stack_kurtosis_max: 15.0,
            ice_concentration_min: 70.0,
        },
    })
}

fn job_config() -> Level2JobConfig {
    Level2JobConfig {
        roi: RegionOfInterest {
            hemisphere: Hemisphere::North,
            latitude_threshold: 50.0,
        },
        surface_type: ricker_thresholds(),
        snow: SnowSourceDef::FixedSnowDepthDensity(FixedSnowOptions {
            fixed_snow_depth: 0.2,
            fixed_snow_density: 300.0,
            fixed_snow_depth_uncertainty: 0.0,
            fixed_snow_density_uncertainty: 0.0,
        }),
        raise_on_error: true,
    }
}

/// Nine-record orbit: 0-2 satisfy the lead thresholds, 3-8 the ocean
/// thresholds, and 6-8 additionally carry the Level-1 land indicator
fn nine_record_orbit(latitude: f64) -> Level1bData {
    let n = 9;
    let pick = |lead: f64, other: f64| {
        Array1::from_shape_fn(n, |i| if i < 3 { lead } else { other })
    };

    let mut parameters = ClassifierParameterSet::new();
    parameters.add_parameter("peakiness", pick(40.0, 5.0)).unwrap();
    parameters.add_parameter("peakiness_l", pick(40.0, 0.0)).unwrap();
    parameters.add_parameter("peakiness_r", pick(40.0, 0.0)).unwrap();
    parameters
        .add_parameter("stack_kurtosis", pick(20.0, 0.0))
        .unwrap();
    parameters
        .add_parameter("stack_standard_deviation", pick(1.0, 10.0))
        .unwrap();
    parameters.add_parameter("sic", pick(90.0, 0.0)).unwrap();
    parameters
        .add_parameter("ocog_width", Array1::from_elem(n, 30.0))
        .unwrap();

    let land_mask = Array1::from_shape_fn(n, |i| i >= 6);
    let timestamp = Utc.with_ymd_and_hms(2015, 4, 1, 6, 0, 0).unwrap();
    let track = TrackData::new(
        Array1::zeros(n),
        Array1::from_elem(n, latitude),
        vec![timestamp; n],
    )
    .unwrap();

    Level1bData::new(
        "synthetic_orbit".to_string(),
        Hemisphere::North,
        track,
        300.0,
        land_mask,
        parameters,
        IceTypeFraction::new(Array1::from_elem(n, 1.0), Array1::zeros(n)).unwrap(),
    )
    .unwrap()
}

#[test]
fn test_land_has_terminal_priority() {
    let _ = env_logger::builder().is_test(true).try_init();

    let mut l1b_source = SyntheticL1bSource {
        granules: vec![("orbit_a".to_string(), Some(nine_record_orbit(80.0)))],
    };
    let mut processor = Level2Processor::new(job_config()).unwrap();
    let summary = processor
        .run(
            &mut l1b_source,
            &mut NoGridSource,
            &[PathBuf::from("orbit_a")],
        )
        .unwrap();

    assert_eq!(summary.processed, 1);
    let orbit = &processor.orbits()[0];
    let codes = orbit.surface_type.flag().unwrap();
    for i in 0..3 {
        assert_eq!(codes[i], SurfaceClass::Lead.code(), "record {}", i);
    }
    for i in 3..6 {
        assert_eq!(codes[i], SurfaceClass::Ocean.code(), "record {}", i);
    }
    // Records 6-8 also satisfy the ocean thresholds; the Level-1 land
    // indicator still wins
    for i in 6..9 {
        assert_eq!(codes[i], SurfaceClass::Land.code(), "record {}", i);
    }

    let snow = orbit.snow.as_ref().unwrap();
    assert_eq!(snow.n_records(), 9);
    assert!((snow.depth[0] - 0.2).abs() < 1e-12);
}

#[test]
fn test_granule_outside_roi_is_skipped() {
    let mut l1b_source = SyntheticL1bSource {
        granules: vec![
            ("orbit_low".to_string(), Some(nine_record_orbit(10.0))),
            ("orbit_high".to_string(), Some(nine_record_orbit(80.0))),
        ],
    };
    let mut processor = Level2Processor::new(job_config()).unwrap();
    let summary = processor
        .run(
            &mut l1b_source,
            &mut NoGridSource,
            &[PathBuf::from("orbit_low"), PathBuf::from("orbit_high")],
        )
        .unwrap();

    assert_eq!(summary.processed, 1);
    assert_eq!(summary.skipped_roi, 1);
    assert_eq!(processor.orbits().len(), 1);
    assert_eq!(processor.orbits()[0].n_records(), 9);
}

#[test]
fn test_raise_on_error_aborts_the_run() {
    let mut l1b_source = SyntheticL1bSource {
        granules: vec![
            ("orbit_bad".to_string(), None),
            ("orbit_good".to_string(), Some(nine_record_orbit(80.0))),
        ],
    };
    let granules = [PathBuf::from("orbit_bad"), PathBuf::from("orbit_good")];

    let mut processor = Level2Processor::new(job_config()).unwrap();
    let result = processor.run(&mut l1b_source, &mut NoGridSource, &granules);
    assert!(result.is_err());
    assert!(processor.orbits().is_empty());

    // With the policy relaxed the failing granule is skipped
    let mut l1b_source = SyntheticL1bSource {
        granules: vec![
            ("orbit_bad".to_string(), None),
            ("orbit_good".to_string(), Some(nine_record_orbit(80.0))),
        ],
    };
    let mut config = job_config();
    config.raise_on_error = false;
    let mut processor = Level2Processor::new(config).unwrap();
    let summary = processor
        .run(&mut l1b_source, &mut NoGridSource, &granules)
        .unwrap();
    assert_eq!(summary.processed, 1);
    assert_eq!(summary.skipped_error, 1);
}

/// Quality filter stub that rejects every orbit
struct FailingQualityFilter;

impl QualityFilter for FailingQualityFilter {
    fn apply(&mut self, _l2: &mut Level2Data) -> anyhow::Result<()> {
        Err(anyhow!("quality model unavailable"))
    }
}

#[test]
fn test_stage_failure_carries_stage_name() {
    let mut l1b_source = SyntheticL1bSource {
        granules: vec![("orbit_a".to_string(), Some(nine_record_orbit(80.0)))],
    };
    let mut processor = Level2Processor::new(job_config())
        .unwrap()
        .with_quality_filter(Box::new(FailingQualityFilter));
    let result = processor.run(
        &mut l1b_source,
        &mut NoGridSource,
        &[PathBuf::from("orbit_a")],
    );
    match result {
        Err(FloeError::Stage { stage, .. }) => assert_eq!(stage, "quality_filter"),
        other => panic!("expected stage failure, got {:?}", other.map(|_| ())),
    }
}

#[test]
fn test_job_config_from_toml() {
    let config: Level2JobConfig = toml::from_str(
        r#"
        [roi]
        hemisphere = "north"
        latitude_threshold = 65.0

        [surface_type]
        name = "ricker_tc2014"

        [surface_type.ocean]
        peakiness_min = 0.0
        peakiness_max = 10.0
        stack_standard_deviation_min = 18.5
        ice_concentration_min = 15.0
        ocog_width_min = 38.0

        [surface_type.lead]
        peakiness_l_min = 40.0
        peakiness_r_min = 30.0
        peakiness_min = 40.0
        stack_kurtosis_min = 40.0
        stack_standard_deviation_max = 4.0
        ice_concentration_min = 70.0

        [surface_type.sea_ice]
        peakiness_r_max = 30.0
        peakiness_l_max = 20.0
        peakiness_max = 30.0
        stack_kurtosis_max = 8.0
        ice_concentration_min = 70.0

        [snow]
        name = "warren99"
        valid_snow_depth_range = [0.0, 0.6]
        fyi_correction_factor = 0.5
        smooth_snow_depth = true
        smooth_filter_width_m = 25000.0
        "#,
    )
    .unwrap();

    config.validate().unwrap();
    assert!(config.raise_on_error, "raise_on_error defaults to true");
    assert_eq!(config.surface_type.name(), "ricker_tc2014");
    assert_eq!(config.snow.name(), "warren99");
}

#[test]
fn test_invalid_job_config_is_rejected() {
    // Unknown classifier variant fails at deserialization
    let result: Result<Level2JobConfig, _> = toml::from_str(
        r#"
        [roi]
        hemisphere = "north"
        latitude_threshold = 65.0

        [surface_type]
        name = "does_not_exist"

        [snow]
        name = "fixed_snow_depth_density"
        fixed_snow_depth = 0.2
        fixed_snow_density = 300.0
        "#,
    );
    assert!(result.is_err());

    // Inverted depth range fails validation before the run starts
    let mut config = job_config();
    config.snow = SnowSourceDef::Warren99(floe::auxdata::snow::Warren99Options {
        valid_snow_depth_range: (0.6, 0.0),
        fyi_correction_factor: 0.5,
        smooth_snow_depth: false,
        smooth_filter_width_m: 25_000.0,
    });
    assert!(Level2Processor::new(config).is_err());
}
