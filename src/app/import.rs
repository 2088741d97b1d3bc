use std::path::Path;

use anyhow::{Context, Result};

use crate::clock::Clock;
use crate::config::Config;
use crate::import::{parse_positions_csv, PositionsPayload};
use crate::payload::PerformancePayload;
use crate::reconstruct::{load_bars, parse_transactions, BarsBySymbol, PerformanceBuilder};

use super::types::ImportOutput;

pub(crate) fn read_positions(file: &Path) -> Result<PositionsPayload> {
    let contents = std::fs::read_to_string(file)
        .with_context(|| format!("Failed to read file: {}", file.display()))?;
    parse_positions_csv(&contents)
        .with_context(|| format!("Failed to parse positions export: {}", file.display()))
}

pub(crate) fn read_bars(file: Option<&Path>) -> Result<BarsBySymbol> {
    match file {
        Some(path) => load_bars(path),
        None => Ok(BarsBySymbol::new()),
    }
}

pub fn import_positions(file: &Path) -> Result<ImportOutput> {
    let parsed = read_positions(file)?;
    Ok(ImportOutput {
        account_name: parsed.metadata.account_name.clone(),
        as_of: parsed.metadata.as_of.clone(),
        symbols: parsed.position_symbols(),
        cash: parsed.target_cash(),
        rows: parsed.rows,
    })
}

/// Files that feed a reconstruction.
#[derive(Debug, Clone, Copy)]
pub struct ReconstructInputs<'a> {
    pub positions_csv: &'a Path,
    pub transactions_json: &'a Path,
    /// Daily bars per symbol. Without them every symbol gets a static price.
    pub bars_json: Option<&'a Path>,
}

pub fn reconstruct_payload(
    config: &Config,
    clock: &dyn Clock,
    inputs: ReconstructInputs<'_>,
) -> Result<PerformancePayload> {
    let positions = read_positions(inputs.positions_csv)?;

    let contents = std::fs::read_to_string(inputs.transactions_json).with_context(|| {
        format!("Failed to read file: {}", inputs.transactions_json.display())
    })?;
    let txns = parse_transactions(&contents, clock.today()).with_context(|| {
        format!(
            "Failed to parse transactions export: {}",
            inputs.transactions_json.display()
        )
    })?;

    let bars = read_bars(inputs.bars_json)?;

    let payload = PerformanceBuilder::new(&config.reconstruct, &config.analytics.benchmarks, clock)
        .build(&positions, &txns, &bars)?;
    payload
        .validate()
        .context("Reconstructed payload failed validation")?;
    Ok(payload)
}
