//! ZIP risk rebalancer behavior: banding, mean shift, clipping, and
//! lift recomputation.

use sdoh_core::{
    error::AdjustError,
    frame::Frame,
    rng::{RngBank, StageRng, StageSlot},
    transform::FrameTransform,
    zip_risk::ZipRiskRebalancer,
};
use std::collections::HashMap;

fn stage_rng() -> StageRng {
    RngBank::new(42).for_stage(StageSlot::ZipRiskRebalance)
}

/// Three ZIPs with average risk 1.6 / 2.0 / 2.4, which the 33/66
/// tertile cut points (1.864 / 2.128) band as Low / Moderate / High.
fn three_band_frame() -> Frame {
    Frame::parse_str(
        "member,zip,risk_no_sdoh,risk_full,risk_score_x\n\
         m-1,11111,1.55,1.5,1.6\n\
         m-2,11111,1.9,1.7,1.8\n\
         m-3,22222,1.65,1.9,2.0\n\
         m-4,22222,1.97,2.1,2.2\n\
         m-5,22222,,2.0,2.0\n\
         m-6,33333,2.0,2.3,2.4\n\
         m-7,33333,2.2,2.5,2.6\n",
    )
    .expect("three band frame")
}

fn row_of(frame: &Frame, member: &str) -> usize {
    let member_idx = frame.column_index("member").unwrap();
    (0..frame.len())
        .find(|&row| frame.key(row, member_idx).as_deref() == Some(member))
        .unwrap_or_else(|| panic!("member {member} not found"))
}

fn zip_averages(frame: &Frame) -> HashMap<String, f64> {
    let zip_idx = frame.column_index("zip").unwrap();
    let risk_idx = frame.column_index("risk_full").unwrap();
    let mut sums: HashMap<String, (f64, usize)> = HashMap::new();
    for row in 0..frame.len() {
        if let (Some(zip), Some(risk)) = (frame.key(row, zip_idx), frame.number(row, risk_idx)) {
            let entry = sums.entry(zip).or_insert((0.0, 0));
            entry.0 += risk;
            entry.1 += 1;
        }
    }
    sums.into_iter()
        .map(|(zip, (sum, count))| (zip, sum / count as f64))
        .collect()
}

#[test]
fn zip_averages_recentered_on_band_targets() {
    let mut frame = three_band_frame();
    ZipRiskRebalancer::default()
        .apply(&mut frame, &mut stage_rng())
        .unwrap();

    let averages = zip_averages(&frame);
    assert!((averages["11111"] - 1.7).abs() < 1e-9, "{averages:?}");
    assert!((averages["22222"] - 2.0).abs() < 1e-9, "{averages:?}");
    assert!((averages["33333"] - 2.25).abs() < 1e-9, "{averages:?}");
}

#[test]
fn spread_within_zip_is_preserved_by_the_shift() {
    let mut frame = three_band_frame();
    ZipRiskRebalancer::default()
        .apply(&mut frame, &mut stage_rng())
        .unwrap();

    // ZIP 11111 rows started 0.2 apart and neither hits a clip bound.
    let risk_idx = frame.column_index("risk_full").unwrap();
    let a = frame.number(row_of(&frame, "m-1"), risk_idx).unwrap();
    let b = frame.number(row_of(&frame, "m-2"), risk_idx).unwrap();
    assert!(
        ((b - a) - 0.2).abs() < 1e-12,
        "spread changed: {a} vs {b}"
    );
}

#[test]
fn single_zip_pair_recenters_on_high_target() {
    // One ZIP is its own top tertile: both cut points collapse onto
    // the single average (1.9), so the band is High with target 2.25.
    let mut frame = Frame::parse_str("member,zip,risk_full\nm-1,A,1.8\nm-2,A,2.0\n").unwrap();
    ZipRiskRebalancer::default()
        .apply(&mut frame, &mut stage_rng())
        .unwrap();

    let risk_idx = frame.column_index("risk_full").unwrap();
    let a = frame.number(row_of(&frame, "m-1"), risk_idx).unwrap();
    let b = frame.number(row_of(&frame, "m-2"), risk_idx).unwrap();
    assert!((a - 2.15).abs() < 1e-9, "got {a}");
    assert!((b - 2.35).abs() < 1e-9, "got {b}");
    assert!(((a + b) / 2.0 - 2.25).abs() < 1e-9);
}

#[test]
fn risk_score_x_shifted_in_lockstep_and_clipped() {
    let mut frame = three_band_frame();
    ZipRiskRebalancer::default()
        .apply(&mut frame, &mut stage_rng())
        .unwrap();

    let x_idx = frame.column_index("risk_score_x").unwrap();
    // Same +0.1 delta as risk_full in the Low ZIP...
    let x1 = frame.number(row_of(&frame, "m-1"), x_idx).unwrap();
    assert!((x1 - 1.7).abs() < 1e-9, "got {x1}");
    // ...but 1.8 + 0.1 pierces the Low ceiling and clips to 1.85.
    let x2 = frame.number(row_of(&frame, "m-2"), x_idx).unwrap();
    assert!((x2 - 1.85).abs() < 1e-9, "got {x2}");
}

#[test]
fn risk_full_clipped_to_band_bounds() {
    let mut frame = three_band_frame();
    ZipRiskRebalancer::default()
        .apply(&mut frame, &mut stage_rng())
        .unwrap();

    let zip_idx = frame.column_index("zip").unwrap();
    let risk_idx = frame.column_index("risk_full").unwrap();
    for row in 0..frame.len() {
        let (floor, ceil) = match frame.key(row, zip_idx).as_deref() {
            Some("11111") => (1.5, 1.85),
            Some("22222") => (1.85, 2.25),
            Some("33333") => (2.1, 3.0),
            other => panic!("unexpected zip {other:?}"),
        };
        let risk = frame.number(row, risk_idx).unwrap();
        assert!(
            risk >= floor - 1e-12 && risk <= ceil + 1e-12,
            "row {row}: risk {risk} outside [{floor}, {ceil}]"
        );
    }
}

#[test]
fn lift_recomputed_with_threshold_labels() {
    let mut frame = three_band_frame();
    ZipRiskRebalancer::default()
        .apply(&mut frame, &mut stage_rng())
        .unwrap();

    let level_idx = frame.column_index("sdoh_lift_level").unwrap();
    let level = |member: &str| frame.key(row_of(&frame, member), level_idx).unwrap();

    // Post-shift lifts: m-1 0.05, m-2 -0.1, m-3 0.25, m-4 0.13.
    assert_eq!(level("m-1"), "Mild SDOH Contribution");
    assert_eq!(level("m-2"), "SDOH Protective / No Impact");
    assert_eq!(level("m-3"), "Extreme SDOH Contribution");
    assert_eq!(level("m-4"), "Significant SDOH Contribution");
    // m-5 has no baseline, so its lift cannot be computed.
    assert_eq!(level("m-5"), "SDOH level pending");

    // The consistency invariant: lift is exactly risk_full minus the
    // baseline, with no extra clipping.
    let base_idx = frame.column_index("risk_no_sdoh").unwrap();
    let risk_idx = frame.column_index("risk_full").unwrap();
    let lift_idx = frame.column_index("sdoh_lift").unwrap();
    for row in 0..frame.len() {
        if let (Some(base), Some(risk)) =
            (frame.number(row, base_idx), frame.number(row, risk_idx))
        {
            let lift = frame.number(row, lift_idx).unwrap();
            assert!(
                (lift - (risk - base)).abs() < 1e-12,
                "row {row}: lift {lift} != {risk} - {base}"
            );
        }
    }
}

#[test]
fn unknown_zip_defaults_to_moderate() {
    // The zip-less row cannot join any average: it takes the Moderate
    // band with no shift, and only the Moderate ceiling bites.
    let mut frame = Frame::parse_str(
        "member,zip,risk_full\n\
         m-1,11111,1.9\n\
         m-2,11111,2.1\n\
         m-3,,3.0\n",
    )
    .unwrap();
    ZipRiskRebalancer::default()
        .apply(&mut frame, &mut stage_rng())
        .unwrap();

    let risk_idx = frame.column_index("risk_full").unwrap();
    let orphan = frame.number(row_of(&frame, "m-3"), risk_idx).unwrap();
    assert!((orphan - 2.25).abs() < 1e-9, "got {orphan}");
}

#[test]
fn empty_frame_is_rejected() {
    let mut frame = Frame::parse_str("member,zip,risk_full\n").unwrap();
    let err = ZipRiskRebalancer::default()
        .apply(&mut frame, &mut stage_rng())
        .unwrap_err();
    assert!(matches!(err, AdjustError::EmptyFrame), "got: {err}");
}

#[test]
fn all_missing_zips_are_rejected() {
    let mut frame = Frame::parse_str("member,zip,risk_full\nm-1,,2.0\nm-2,,2.1\n").unwrap();
    let err = ZipRiskRebalancer::default()
        .apply(&mut frame, &mut stage_rng())
        .unwrap_err();
    assert!(
        matches!(err, AdjustError::DegenerateQuantiles { .. }),
        "got: {err}"
    );
}

#[test]
fn missing_required_columns_are_rejected() {
    let mut no_zip = Frame::parse_str("member,risk_full\nm-1,2.0\n").unwrap();
    let err = ZipRiskRebalancer::default()
        .apply(&mut no_zip, &mut stage_rng())
        .unwrap_err();
    assert!(err.to_string().contains("zip"), "got: {err}");

    let mut no_risk = Frame::parse_str("member,zip\nm-1,11111\n").unwrap();
    let err = ZipRiskRebalancer::default()
        .apply(&mut no_risk, &mut stage_rng())
        .unwrap_err();
    assert!(err.to_string().contains("risk_full"), "got: {err}");
}

#[test]
fn rerun_is_quasi_idempotent() {
    let mut once = three_band_frame();
    ZipRiskRebalancer::default()
        .apply(&mut once, &mut stage_rng())
        .unwrap();

    let mut twice = once.clone();
    ZipRiskRebalancer::default()
        .apply(&mut twice, &mut stage_rng())
        .unwrap();

    // Averages already sit on their band targets, so the second pass
    // moves nothing beyond clipping noise.
    let first = zip_averages(&once);
    let second = zip_averages(&twice);
    for (zip, avg) in &first {
        assert!(
            (avg - second[zip]).abs() < 1e-9,
            "zip {zip}: {avg} vs {}",
            second[zip]
        );
    }
}

#[test]
fn helper_columns_do_not_leak_into_output() {
    let mut frame = three_band_frame();
    let before = frame.columns.clone();
    // sdoh_lift and sdoh_lift_level are appended on demand; everything
    // else in the header must be exactly the input columns.
    ZipRiskRebalancer::default()
        .apply(&mut frame, &mut stage_rng())
        .unwrap();

    let expected: Vec<String> = before
        .into_iter()
        .chain(["sdoh_lift".to_string(), "sdoh_lift_level".to_string()])
        .collect();
    assert_eq!(frame.columns, expected);
}
