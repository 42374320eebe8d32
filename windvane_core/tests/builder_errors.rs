use rstest::rstest;
use windvane_core::calibration::{CalibrationCurve, CalibrationSegment};
use windvane_core::error::BuildError;
use windvane_core::{DeviationBand, DirectionCfg, EngineBuilder, OutputCfg, TimingCfg, WindEngine};

fn band(below: Option<i32>, speed: u32, dir: u16) -> DeviationBand {
    DeviationBand {
        below_cknots: below,
        speed_limit_cknots: speed,
        dir_limit_deg: dir,
    }
}

fn expect_build_error(builder: EngineBuilder) -> BuildError {
    let err = builder.build().expect_err("build should fail");
    err.downcast_ref::<BuildError>()
        .cloned()
        .unwrap_or_else(|| panic!("expected BuildError, got: {err:?}"))
}

#[rstest]
#[case(-0.1)]
#[case(1.01)]
#[case(f32::NAN)]
fn gain_out_of_range(#[case] gain: f32) {
    let err = expect_build_error(WindEngine::builder().with_direction(DirectionCfg {
        offset_deg: 0,
        filter_gain: gain,
    }));
    assert_eq!(err, BuildError::FilterGain);
}

#[rstest]
#[case::empty(vec![])]
#[case::bounded_tail(vec![band(Some(1_000), 500, 25)])]
#[case::descending(vec![band(Some(8_000), 500, 25), band(Some(1_000), 1_000, 18), band(None, 3_000, 10)])]
#[case::unbounded_middle(vec![band(None, 500, 25), band(None, 1_000, 18)])]
#[case::zero_speed_limit(vec![band(None, 0, 10)])]
#[case::dir_limit_too_wide(vec![band(None, 500, 181)])]
fn malformed_bands(#[case] bands: Vec<DeviationBand>) {
    let err = expect_build_error(WindEngine::builder().with_bands(bands));
    assert!(matches!(err, BuildError::Bands(_)), "{err:?}");
}

#[rstest]
fn zero_timeout_is_invalid() {
    let err = expect_build_error(WindEngine::builder().with_timing(TimingCfg {
        timeout_us: 0,
        ..TimingCfg::default()
    }));
    assert!(matches!(err, BuildError::InvalidConfig(_)));
}

#[rstest]
#[case("wi")]
#[case("W")]
#[case("WIX")]
fn talker_must_be_two_uppercase_letters(#[case] talker: &str) {
    let err = expect_build_error(WindEngine::builder().with_output(OutputCfg {
        talker: talker.into(),
        ..OutputCfg::default()
    }));
    assert!(matches!(err, BuildError::InvalidConfig(_)));
}

#[rstest]
fn offset_must_be_below_full_turn() {
    let err = expect_build_error(WindEngine::builder().with_direction(DirectionCfg {
        offset_deg: 360,
        filter_gain: 0.25,
    }));
    assert!(matches!(err, BuildError::InvalidConfig(_)));
}

#[rstest]
fn calibration_curve_errors_are_typed() {
    let seg = CalibrationSegment {
        below_rps: Some(100),
        a_num: 0,
        a_den: 1,
        b_num: 1,
        b_den: 1,
        c: 0,
    };
    assert!(matches!(
        CalibrationCurve::new(vec![seg]),
        Err(BuildError::Calibration(_))
    ));
}

#[rstest]
fn single_unbounded_band_is_enough() {
    let e = WindEngine::builder()
        .with_bands(vec![band(None, 1_000, 20)])
        .build()
        .unwrap();
    assert_eq!(e.config().bands.len(), 1);
}
