//! Star-schema projection of the adjusted dataset.
//!
//! Pure relational reshaping: project, deduplicate by key, unpivot the
//! repeated driver column pairs into long form, and join the
//! member-grain tables back into one flat view for the dashboard.
//! Nothing here re-derives risk or lift values; it only reshapes what
//! the rebalancers produced.

use crate::{
    error::AdjustResult,
    frame::{Cell, Frame},
    types::col,
};
use std::collections::{HashMap, HashSet};
use std::path::Path;

const MEMBER_COLS: &[&str] = &[
    "member",
    "member_name",
    "age",
    "age_group",
    "age_class",
    "gender",
    "race",
    "hp",
    "hp_name",
    "pcp_x",
    "grp_name",
    "plan",
    "segment",
    "agent",
    "address",
    "county",
    "state",
    "county_clean",
    "county_fips",
    "zip",
    "contract",
];

const ZIP_COLS: &[&str] = &["zip", "county", "state", "county_clean", "county_fips"];

const PLAN_COLS: &[&str] = &["plan", "segment", "hp", "hp_name"];

const CONTRACT_COLS: &[&str] = &["contract"];

const RISK_COLS: &[&str] = &[
    "member",
    "risk_score_x",
    "risk_full",
    "risk_no_sdoh",
    "sdoh_lift",
    "sdoh_lift_level",
];

const CLINICAL_COLS: &[&str] = &[
    "member",
    "compliance",
    "compliance_2023",
    "compliance_hba1c",
    "compliancebcs",
    "pcp_visits",
    "no_ip_visits_2023",
    "a1c_value",
    "ldl_value",
    "bmi",
    "bp_systolic",
    "bp_diastolic",
];

const SDOH_COLS: &[&str] = &[
    "member",
    "income_weighted_index",
    "income_inequality",
    "per_capita_income",
    "education_score",
    "labor_market_hardship",
    "housing_instability",
    "car_access_risk",
    "mean_commute",
    "commute_hardship_index",
    "transit_dependency",
    "food_insecurity_index",
    "health_access_score",
    "digital_disadvantage",
    "social_isolation_index",
    "environmental_burden",
    "rurality_index",
];

const DRIVER_TYPES: &[&str] = &["sdoh", "nonsdoh"];
const DRIVER_RANKS: std::ops::RangeInclusive<u8> = 1..=5;

/// The projected tables, in write order. Dimension tables whose key
/// column is absent from the source are skipped.
#[derive(Debug)]
pub struct StarSchema {
    pub tables: Vec<(&'static str, Frame)>,
}

pub fn build_model(frame: &Frame) -> AdjustResult<StarSchema> {
    frame.require_column(col::MEMBER)?;

    let mut tables: Vec<(&'static str, Frame)> = Vec::new();

    for (name, cols, key) in [
        ("dim_member", MEMBER_COLS, col::MEMBER),
        ("dim_zip", ZIP_COLS, col::ZIP),
        ("dim_plan", PLAN_COLS, "plan"),
        ("dim_contract", CONTRACT_COLS, "contract"),
    ] {
        if frame.column_index(key).is_none() {
            log::warn!("skipping {name}: key column '{key}' not in dataset");
            continue;
        }
        tables.push((name, dedup_by(&project(frame, cols), key)));
    }

    tables.push(("fact_member_risk", project(frame, RISK_COLS)));
    tables.push(("fact_member_clinical", project(frame, CLINICAL_COLS)));
    tables.push(("fact_member_sdoh", project(frame, SDOH_COLS)));
    tables.push(("fact_member_drivers", unpivot_drivers(frame)));
    tables.push(("member_view", build_member_view(frame)));

    Ok(StarSchema { tables })
}

/// Write one delimited file per table under the model directory.
pub fn write_model(schema: &StarSchema, dir: &Path) -> AdjustResult<()> {
    for (name, table) in &schema.tables {
        let path = dir.join(format!("{name}.csv"));
        table.write_path(&path)?;
        log::info!("wrote {} ({} rows)", path.display(), table.len());
    }
    Ok(())
}

/// Keep the listed columns that actually exist in the frame, in list
/// order. Absent columns are skipped, never invented.
fn project(frame: &Frame, wanted: &[&str]) -> Frame {
    let picks: Vec<usize> = wanted
        .iter()
        .filter_map(|name| frame.column_index(name))
        .collect();
    let columns = picks.iter().map(|&i| frame.columns[i].clone()).collect();
    let rows = frame
        .rows
        .iter()
        .map(|row| picks.iter().map(|&i| row[i].clone()).collect())
        .collect();
    Frame { columns, rows }
}

/// Deduplicate by key column, first occurrence wins. Rows with a null
/// key collapse into one.
fn dedup_by(frame: &Frame, key: &str) -> Frame {
    let Some(key_idx) = frame.column_index(key) else {
        return frame.clone();
    };
    let mut seen: HashSet<Option<String>> = HashSet::new();
    let mut out = Frame::new(frame.columns.clone());
    for row in 0..frame.len() {
        if seen.insert(frame.key(row, key_idx)) {
            out.rows.push(frame.rows[row].clone());
        }
    }
    out
}

/// Unpivot the repeated {sdoh,nonsdoh}_driver_{1..5} name/value column
/// pairs into long form. Rows with a null or empty driver name are
/// skipped.
fn unpivot_drivers(frame: &Frame) -> Frame {
    let member_idx = frame
        .column_index(col::MEMBER)
        .expect("caller checked member column");

    // Resolve the pair indices once; absent pairs contribute nothing.
    let mut pairs: Vec<(&'static str, u8, usize, Option<usize>)> = Vec::new();
    for &driver_type in DRIVER_TYPES {
        for rank in DRIVER_RANKS {
            let name_col = format!("{driver_type}_driver_{rank}");
            let value_col = format!("{driver_type}_driver_{rank}_value");
            if let Some(name_idx) = frame.column_index(&name_col) {
                pairs.push((driver_type, rank, name_idx, frame.column_index(&value_col)));
            }
        }
    }

    let mut out = Frame::new(
        ["member", "driver_type", "driver_rank", "driver_name", "driver_value"]
            .iter()
            .map(|s| s.to_string())
            .collect(),
    );
    for row in 0..frame.len() {
        for &(driver_type, rank, name_idx, value_idx) in &pairs {
            let name = match frame.key(row, name_idx) {
                Some(n) if !n.is_empty() => n,
                _ => continue,
            };
            let value = value_idx
                .map(|i| frame.rows[row][i].clone())
                .unwrap_or(Cell::Null);
            out.rows.push(vec![
                frame.rows[row][member_idx].clone(),
                Cell::String(driver_type.to_string()),
                Cell::from(rank as i64),
                Cell::String(name),
                value,
            ]);
        }
    }
    out
}

/// One flat row per member: dim_member joined with the member-grain
/// fact tables plus the raw driver columns, for dashboards that want a
/// single wide table.
fn build_member_view(frame: &Frame) -> Frame {
    let mut view = dedup_by(&project(frame, MEMBER_COLS), col::MEMBER);
    for cols in [RISK_COLS, CLINICAL_COLS, SDOH_COLS] {
        let fact = dedup_by(&project(frame, cols), col::MEMBER);
        view = left_join(&view, &fact, col::MEMBER);
    }

    let mut driver_cols: Vec<String> = vec![col::MEMBER.to_string()];
    for &driver_type in DRIVER_TYPES {
        for rank in DRIVER_RANKS {
            driver_cols.push(format!("{driver_type}_driver_{rank}"));
            driver_cols.push(format!("{driver_type}_driver_{rank}_value"));
        }
    }
    let wanted: Vec<&str> = driver_cols.iter().map(String::as_str).collect();
    let drivers = dedup_by(&project(frame, &wanted), col::MEMBER);
    left_join(&view, &drivers, col::MEMBER)
}

/// Left join on a key column, first match wins. Columns already on the
/// left are not duplicated; unmatched rows get nulls.
fn left_join(left: &Frame, right: &Frame, key: &str) -> Frame {
    let (Some(left_key), Some(right_key)) = (left.column_index(key), right.column_index(key))
    else {
        return left.clone();
    };

    let mut index: HashMap<String, usize> = HashMap::new();
    for row in 0..right.len() {
        if let Some(k) = right.key(row, right_key) {
            index.entry(k).or_insert(row);
        }
    }

    let extra: Vec<usize> = right
        .columns
        .iter()
        .enumerate()
        .filter(|(_, name)| *name != key && left.column_index(name).is_none())
        .map(|(i, _)| i)
        .collect();

    let mut out = left.clone();
    for &i in &extra {
        out.columns.push(right.columns[i].clone());
    }
    for row in 0..out.rows.len() {
        let matched = left
            .key(row, left_key)
            .and_then(|k| index.get(&k).copied());
        for &i in &extra {
            let cell = match matched {
                Some(r) => right.rows[r][i].clone(),
                None => Cell::Null,
            };
            out.rows[row].push(cell);
        }
    }
    out
}
