//! CLI definition and dispatch.

use clap::{Parser, Subcommand, ValueEnum};
use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use crate::adapters::analytical_store::AnalyticalStore;
use crate::adapters::csv_report::CsvReportAdapter;
use crate::adapters::field_data::FieldDataService;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::adapters::json_report::JsonReportAdapter;
use crate::adapters::local_files::LocalFileAdapter;
use crate::domain::backtest::{BACKTEST_HORIZON, BacktestEngine, BacktestOutcome};
use crate::domain::calendar::build_calendar;
use crate::domain::config_validation::{AppConfig, DEFAULT_LOG_LEVEL};
use crate::domain::error::RebalanceError;
use crate::domain::request::{BacktestRequest, DataField};
use crate::domain::selector::PortfolioSelector;
use crate::ports::data_port::DataPort;
use crate::ports::report_port::ReportPort;

#[derive(Parser, Debug)]
#[command(name = "rebalancer", about = "Portfolio rebalancing backtester")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ReportFormat {
    Json,
    Csv,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run a backtest
    Backtest {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(short, long)]
        request: PathBuf,
        #[arg(short, long)]
        output: Option<PathBuf>,
        #[arg(short, long, value_enum, default_value_t = ReportFormat::Json)]
        format: ReportFormat,
    },
    /// Validate a backtest request without touching any data
    Validate {
        #[arg(short, long)]
        request: PathBuf,
    },
    /// Show available date ranges for data fields
    Info {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(long)]
        field: Option<DataField>,
    },
    /// Write synthetic data files
    #[cfg(feature = "sample-data")]
    Generate {
        #[arg(short, long)]
        dir: PathBuf,
        #[arg(long, default_value_t = 1000)]
        assets: usize,
        #[arg(long)]
        start: Option<chrono::NaiveDate>,
        #[arg(long)]
        end: Option<chrono::NaiveDate>,
        #[arg(long)]
        seed: Option<u64>,
        #[arg(long = "field")]
        fields: Vec<DataField>,
    },
}

pub fn run(cli: Cli) -> ExitCode {
    match cli.command {
        Command::Backtest {
            config,
            request,
            output,
            format,
        } => run_backtest(&config, &request, output.as_deref(), format),
        Command::Validate { request } => run_validate(&request),
        Command::Info { config, field } => run_info(&config, field),
        #[cfg(feature = "sample-data")]
        Command::Generate {
            dir,
            assets,
            start,
            end,
            seed,
            fields,
        } => run_generate(&dir, assets, start, end, seed, fields),
    }
}

/// Install the stderr subscriber. `RUST_LOG` wins over `level`; repeated
/// calls are ignored.
pub fn init_logging(level: &str) {
    let _ = tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("rebalancer={level}").into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .try_init();
}

fn fail(err: RebalanceError) -> ExitCode {
    eprintln!("error: {err}");
    (&err).into()
}

pub fn load_app_config(path: &Path) -> Result<AppConfig, RebalanceError> {
    let adapter = FileConfigAdapter::from_file(path)?;
    AppConfig::from_port(&adapter)
}

pub fn load_request(path: &Path) -> Result<BacktestRequest, RebalanceError> {
    let body = fs::read_to_string(path)?;
    BacktestRequest::from_json(&body)
}

pub fn build_data_service(
    app: &AppConfig,
) -> Result<FieldDataService<LocalFileAdapter>, RebalanceError> {
    let locator = LocalFileAdapter::new(&app.data_dir)?;
    let store = AnalyticalStore::new(app.store.clone());
    Ok(FieldDataService::new(locator, store))
}

pub fn report_adapter(format: ReportFormat) -> Box<dyn ReportPort> {
    match format {
        ReportFormat::Json => Box::new(JsonReportAdapter::new()),
        ReportFormat::Csv => Box::new(CsvReportAdapter::new()),
    }
}

fn run_backtest(
    config_path: &Path,
    request_path: &Path,
    output_path: Option<&Path>,
    format: ReportFormat,
) -> ExitCode {
    // Stage 1: configuration and logging
    eprintln!("Loading config from {}", config_path.display());
    let app = match load_app_config(config_path) {
        Ok(app) => app,
        Err(e) => return fail(e),
    };
    init_logging(&app.log_level);

    // Stage 2: request
    eprintln!("Loading request from {}", request_path.display());
    let request = match load_request(request_path) {
        Ok(r) => r,
        Err(e) => return fail(e),
    };

    // Stage 3: data access
    let service = match build_data_service(&app) {
        Ok(s) => s,
        Err(e) => return fail(e),
    };

    // Stage 4: run
    eprintln!(
        "Running backtest: {} top {} by {}, from {}",
        request.calendar_rule.rule_type,
        request.creation_rule.n,
        request.data_field(),
        request.initial_date(),
    );
    let outcome = match BacktestEngine::new(&service).run(&request) {
        Ok(o) => o,
        Err(e) => return fail(e),
    };

    // Stage 5: console summary
    print_summary(&outcome);

    // Stage 6: report
    let reporter = report_adapter(format);
    let output = output_path.map(Path::to_path_buf).unwrap_or_else(|| {
        PathBuf::from(format!("backtest_result.{}", reporter.default_extension()))
    });
    match reporter.write(&outcome, &output) {
        Ok(()) => {
            eprintln!("\nReport written to: {}", output.display());
            ExitCode::SUCCESS
        }
        Err(e) => fail(e),
    }
}

fn print_summary(outcome: &BacktestOutcome) {
    let m = &outcome.metrics;
    eprintln!("\n=== Backtest Results ===");
    eprintln!("Execution Time:   {:.3}s", m.execution_time);
    eprintln!(
        "Rebalance Dates:  {} of {} processed",
        m.rebalance_dates_processed, m.total_rebalance_dates
    );
    eprintln!("Avg Assets:       {:.1}", m.average_assets_per_rebalance);
    eprintln!(
        "Strategy:         {} / {} / {}",
        m.strategy.calendar, m.strategy.filter, m.strategy.weighting
    );

    if !outcome.warnings.is_empty() {
        eprintln!("\n=== Warnings ({}) ===", outcome.warnings.len());
        for warning in &outcome.warnings {
            eprintln!("  {warning}");
        }
    }
}

fn run_validate(request_path: &Path) -> ExitCode {
    init_logging(DEFAULT_LOG_LEVEL);
    eprintln!("Validating request: {}", request_path.display());

    let request = match load_request(request_path) {
        Ok(r) => r,
        Err(e) => return fail(e),
    };
    let calendar = match build_calendar(&request.calendar_rule) {
        Ok(c) => c,
        Err(e) => return fail(e),
    };
    if let Err(e) = PortfolioSelector::from_rules(&request.creation_rule, &request.weighting_rule) {
        return fail(e);
    }

    let dates = calendar.generate_dates(request.initial_date(), BACKTEST_HORIZON);
    eprintln!("\nCalendar:   {}", request.calendar_rule.rule_type);
    eprintln!(
        "Filter:     {} (n = {}, field = {})",
        request.creation_rule.filter_type,
        request.creation_rule.n,
        request.data_field()
    );
    eprintln!("Weighting:  {}", request.weighting_rule.weighting_type);
    match (dates.first(), dates.last()) {
        (Some(first), Some(last)) => {
            eprintln!("Dates:      {} ({} to {})", dates.len(), first, last)
        }
        _ => eprintln!("Dates:      none before {BACKTEST_HORIZON}"),
    }

    eprintln!("\nRequest is valid.");
    ExitCode::SUCCESS
}

fn run_info(config_path: &Path, field: Option<DataField>) -> ExitCode {
    let app = match load_app_config(config_path) {
        Ok(app) => app,
        Err(e) => return fail(e),
    };
    init_logging(&app.log_level);

    let service = match build_data_service(&app) {
        Ok(s) => s,
        Err(e) => return fail(e),
    };

    let fields = match field {
        Some(f) => vec![f],
        None => service.locator().available_fields(),
    };
    if fields.is_empty() {
        eprintln!("No data files found in {}", app.data_dir.display());
        return ExitCode::SUCCESS;
    }

    for f in fields {
        let range = service.get_data_range(f);
        let rows = service.row_count(f);
        match (range, rows) {
            (Ok((min, max)), Ok(rows)) => println!("{f}: {rows} rows, {min} to {max}"),
            (Err(e), _) | (_, Err(e)) => eprintln!("error querying {f}: {e}"),
        }
    }
    ExitCode::SUCCESS
}

#[cfg(feature = "sample-data")]
fn run_generate(
    dir: &Path,
    assets: usize,
    start: Option<chrono::NaiveDate>,
    end: Option<chrono::NaiveDate>,
    seed: Option<u64>,
    fields: Vec<DataField>,
) -> ExitCode {
    use crate::adapters::sample_data::{SampleDataConfig, generate};

    init_logging(DEFAULT_LOG_LEVEL);
    let defaults = SampleDataConfig::default();
    let config = SampleDataConfig {
        start: start.unwrap_or(defaults.start),
        end: end.unwrap_or(defaults.end),
        assets,
        fields: if fields.is_empty() {
            defaults.fields
        } else {
            fields
        },
        seed,
    };

    eprintln!(
        "Generating {} assets from {} to {} into {}",
        config.assets,
        config.start,
        config.end,
        dir.display()
    );
    match generate(dir, &config) {
        Ok(paths) => {
            for path in &paths {
                println!("{}", path.display());
            }
            eprintln!("{} files written", paths.len());
            ExitCode::SUCCESS
        }
        Err(e) => fail(e),
    }
}
