//! sdoh-runner: headless adjustment runner for the SDOH risk dataset.
//!
//! Usage:
//!   sdoh-runner --stage all --seed 42
//!   sdoh-runner --stage lift --src data/sdoh_data.csv --out data/sdoh_data_adjusted.csv
//!   sdoh-runner --stage model --model-dir data/model

use anyhow::Result;
use sdoh_core::{
    config::AdjustConfig, frame::Frame, lift::LiftRebalancer, pipeline::Pipeline, rng::StageSlot,
    star, types::col, zip_risk::ZipRiskRebalancer,
};
use std::collections::BTreeMap;
use std::env;
use std::path::PathBuf;

fn main() -> Result<()> {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    let stage = str_arg(&args, "--stage").unwrap_or("all").to_string();

    let mut config = AdjustConfig::from_env();
    config.seed = parse_arg(&args, "--seed", config.seed);
    if let Some(src) = str_arg(&args, "--src") {
        config.source = PathBuf::from(src);
    }
    if let Some(out) = str_arg(&args, "--out") {
        config.output = PathBuf::from(out);
    }
    if let Some(dir) = str_arg(&args, "--model-dir") {
        config.model_dir = PathBuf::from(dir);
    }

    let run_id = format!("adjust-{}-{}", config.seed, chrono::Utc::now().timestamp());
    println!("SDOH risk adjustment — sdoh-runner");
    println!("  run_id: {run_id}");
    println!("  stage:  {stage}");
    println!("  seed:   {}", config.seed);
    println!("  src:    {}", config.source.display());
    println!("  out:    {}", config.output.display());
    println!();

    let mut frame = Frame::read_path(&config.source)?;

    match stage.as_str() {
        "lift" | "zip" | "all" => {
            let mut pipeline = Pipeline::new(config.seed);
            if stage != "zip" {
                pipeline.register(
                    StageSlot::LiftRebalance,
                    Box::new(LiftRebalancer::new(config.lift.clone())),
                );
            }
            if stage != "lift" {
                pipeline.register(
                    StageSlot::ZipRiskRebalance,
                    Box::new(ZipRiskRebalancer::new(config.bands.clone())),
                );
            }
            pipeline.run(&mut frame)?;
            frame.write_path(&config.output)?;
            println!("adjusted data written to {}", config.output.display());
            print_summary(&frame);
        }
        "model" => {
            let schema = star::build_model(&frame)?;
            star::write_model(&schema, &config.model_dir)?;
            println!(
                "star schema ({} tables) written to {}",
                schema.tables.len(),
                config.model_dir.display()
            );
        }
        other => anyhow::bail!("unknown stage '{other}' (expected lift, zip, all, or model)"),
    }

    Ok(())
}

fn print_summary(frame: &Frame) {
    println!();
    println!("=== RUN SUMMARY ===");
    println!("  rows: {}", frame.len());

    if let Some(level_idx) = frame.column_index(col::SDOH_LIFT_LEVEL) {
        let mut counts: BTreeMap<String, usize> = BTreeMap::new();
        for row in 0..frame.len() {
            let label = frame
                .key(row, level_idx)
                .unwrap_or_else(|| "(unlabeled)".into());
            *counts.entry(label).or_insert(0) += 1;
        }
        for (label, count) in counts {
            println!("  {label}: {count}");
        }
    }

    if let Some(risk_idx) = frame.column_index(col::RISK_FULL) {
        let values: Vec<f64> = (0..frame.len())
            .filter_map(|row| frame.number(row, risk_idx))
            .collect();
        if !values.is_empty() {
            let mean = values.iter().sum::<f64>() / values.len() as f64;
            let min = values.iter().cloned().fold(f64::INFINITY, f64::min);
            let max = values.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
            println!("  risk_full: min {min:.3} / mean {mean:.3} / max {max:.3}");
        }
    }
}

fn parse_arg<T: std::str::FromStr + Copy>(args: &[String], flag: &str, default: T) -> T {
    args.windows(2)
        .find(|w| w[0] == flag)
        .and_then(|w| w[1].parse().ok())
        .unwrap_or(default)
}

fn str_arg<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    args.windows(2).find(|w| w[0] == flag).map(|w| w[1].as_str())
}
