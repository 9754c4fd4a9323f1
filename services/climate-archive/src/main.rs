//! Climate archive CLI: ingest CFS2 analysis/forecast and CMIP6 projection
//! data into a chunked store, query point time series out of it, or serve
//! the same queries over HTTP.

mod config;
mod csv;
mod driver;
mod http;
mod store;

use anyhow::Result;
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use config::Settings;
use driver::QueryKind;
use wms_common::ClimateError;

#[derive(Parser, Debug)]
#[command(name = "climate-archive")]
#[command(about = "CFS2 analysis/forecast and CMIP6 projection climate archive")]
struct Cli {
    #[command(flatten)]
    settings: Settings,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List CFS2 and CMIP6 variable names with their display labels.
    ListVars,
    /// Query CMIP6 projection data for a point and date range.
    Cmip6(QueryArgs),
    /// Query CFS2 analysis/forecast data for a point and date range.
    Cfs2(QueryArgs),
    /// Run an ingester once and exit.
    Ingest {
        #[command(subcommand)]
        target: IngestTarget,
    },
    /// Serve `/variables`, `/cfs2`, `/cmip6` over HTTP.
    Serve {
        #[arg(short, long, default_value = "0.0.0.0:8080")]
        listen: String,
    },
}

#[derive(Subcommand, Debug)]
enum IngestTarget {
    /// Reanalysis, then forecast.
    Cfs2,
    Cmip6,
}

#[derive(Args, Debug)]
struct QueryArgs {
    begin: NaiveDate,
    end: NaiveDate,
    lat: f64,
    lon: f64,

    /// Variable names; repeat or pass a space-separated list.
    #[arg(required = true)]
    var: Vec<String>,

    /// Output path, or `stdout`.
    #[arg(short = 'o', long = "output", default_value = "stdout")]
    output: String,

    /// Decimal places to render, trimmed of trailing zeros.
    #[arg(short = 'p', long = "precision", default_value_t = 2, value_parser = clap::value_parser!(u16).range(1..=6))]
    precision: u16,
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_tracing(&cli.settings.log_level);

    if let Err(err) = run(cli).await {
        eprintln!("error: {err}");
        std::process::exit(exit_code_for(&err));
    }
}

async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Command::ListVars => {
            print_variable_catalog();
            Ok(())
        }
        Command::Cmip6(args) => run_query_command(&cli.settings, QueryKind::Cmip6, args).await,
        Command::Cfs2(args) => run_query_command(&cli.settings, QueryKind::Cfs2, args).await,
        Command::Ingest { target } => match target {
            IngestTarget::Cfs2 => {
                info!("ingesting cfs2 analysis/forecast");
                driver::ingest_analysis_forecast(&cli.settings).await?;
                Ok(())
            }
            IngestTarget::Cmip6 => {
                info!("ingesting cmip6 projection");
                driver::run_ingest_projection(&cli.settings).await?;
                Ok(())
            }
        },
        Command::Serve { listen } => http::serve(cli.settings, listen).await,
    }
}

async fn run_query_command(settings: &Settings, kind: QueryKind, args: QueryArgs) -> Result<()> {
    let variables: Vec<&str> = args.var.iter().map(String::as_str).collect();
    let result = driver::run_query(settings, kind, args.begin, args.end, args.lat, args.lon, &variables)?;
    let rendered = csv::render_csv(&result, args.precision as usize);

    match args.output.as_str() {
        "stdout" => print!("{rendered}"),
        path => std::fs::write(path, rendered)?,
    }
    Ok(())
}

fn print_variable_catalog() {
    println!("cfs2:");
    for name in ingestion::cfs2_variable_names() {
        let band = ingestion::cfs2_band(name).expect("listed name is in the catalog");
        println!("  {name:<16} {}", band.label_en);
    }
    println!("cmip6:");
    for v in ingestion::CMIP6_VARS {
        println!("  {:<16} {}", v.name, v.label_en);
    }
}

fn init_tracing(log_level: &str) {
    let level = match log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(true)
        .json()
        .finish();

    let _ = tracing::subscriber::set_global_default(subscriber);
}

fn exit_code_for(err: &anyhow::Error) -> i32 {
    err.downcast_ref::<ClimateError>()
        .map(ClimateError::exit_code)
        .unwrap_or(1)
}
