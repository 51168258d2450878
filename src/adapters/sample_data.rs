//! Synthetic per-field data files for trying the tool without real data.
//!
//! Each file is wide: a `date` column followed by one column per asset,
//! one row per calendar day. Values are log-normal; volume-like fields also
//! get an upward drift and a little additive noise.

use crate::domain::backtest::BACKTEST_HORIZON;
use crate::domain::error::RebalanceError;
use crate::domain::request::DataField;
use chrono::NaiveDate;
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand_distr::{Distribution, LogNormal, Normal};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Debug, Clone)]
pub struct SampleDataConfig {
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub assets: usize,
    pub fields: Vec<DataField>,
    /// Fixed seed for reproducible output; entropy when `None`.
    pub seed: Option<u64>,
}

impl Default for SampleDataConfig {
    fn default() -> Self {
        Self {
            start: NaiveDate::from_ymd_opt(2020, 1, 1).unwrap_or(NaiveDate::MIN),
            end: BACKTEST_HORIZON,
            assets: 1000,
            fields: vec![
                DataField::MarketCapitalization,
                DataField::Volume,
                DataField::Adtv3Month,
            ],
            seed: None,
        }
    }
}

/// Log-normal location/scale and whether the series drifts upward.
fn field_profile(field: DataField) -> (f64, f64, bool) {
    match field {
        DataField::MarketCapitalization => (12.0, 1.5, false),
        DataField::Volume | DataField::Adtv3Month => (8.0, 1.0, true),
        DataField::Prices => (4.0, 0.5, false),
    }
}

fn distribution_error(e: impl std::fmt::Display) -> RebalanceError {
    RebalanceError::InvalidRequest {
        reason: format!("invalid sample distribution: {e}"),
    }
}

pub fn asset_ids(count: usize) -> Vec<String> {
    (0..count).map(|i| i.to_string()).collect()
}

/// Write one `<field>.csv` per configured field into `dir` and return the
/// paths written.
pub fn generate(dir: &Path, config: &SampleDataConfig) -> Result<Vec<PathBuf>, RebalanceError> {
    if config.start > config.end {
        return Err(RebalanceError::InvalidRequest {
            reason: format!("start {} is after end {}", config.start, config.end),
        });
    }
    if config.assets == 0 {
        return Err(RebalanceError::InvalidRequest {
            reason: "at least one asset is required".to_string(),
        });
    }

    fs::create_dir_all(dir)?;
    let mut rng = match config.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    let dates: Vec<NaiveDate> = config
        .start
        .iter_days()
        .take_while(|d| *d <= config.end)
        .collect();
    let assets = asset_ids(config.assets);
    let noise = Normal::new(0.0, 0.1).map_err(distribution_error)?;

    let mut written = Vec::with_capacity(config.fields.len());
    for &field in &config.fields {
        let (mu, sigma, drift) = field_profile(field);
        let base = LogNormal::new(mu, sigma).map_err(distribution_error)?;
        let path = dir.join(format!("{}.csv", field.as_str()));

        let mut wtr = csv::Writer::from_path(&path)?;
        let mut header = Vec::with_capacity(assets.len() + 1);
        header.push("date");
        header.extend(assets.iter().map(String::as_str));
        wtr.write_record(&header)?;

        let last = dates.len().saturating_sub(1).max(1) as f64;
        for (i, date) in dates.iter().enumerate() {
            let trend = 1.0 + 0.5 * i as f64 / last;
            let mut record = Vec::with_capacity(assets.len() + 1);
            record.push(date.format("%Y-%m-%d").to_string());
            for _ in 0..assets.len() {
                let value = if drift {
                    (base.sample(&mut rng) * trend + noise.sample(&mut rng)).abs()
                } else {
                    base.sample(&mut rng)
                };
                record.push(format!("{value:.4}"));
            }
            wtr.write_record(&record)?;
        }
        wtr.flush()?;

        info!(
            %field,
            path = %path.display(),
            rows = dates.len(),
            assets = assets.len(),
            "generated sample data"
        );
        written.push(path);
    }

    Ok(written)
}
