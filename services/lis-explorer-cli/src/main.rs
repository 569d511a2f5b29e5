//! LIS explorer command line host.
//!
//! Opens a LIS dataset and a gage catalog, runs one interaction (gage
//! comparison, point tap or variable map) and prints what a renderer would
//! draw as JSON on stdout. Logs go to stderr.

mod json_renderer;

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Parser;
use lis_common::GeoPoint;
use lis_explorer::{
    scan_gage_dir, Environment, ExplorationSession, ExplorerConfig, GageCatalog, LogFormat, Renderer,
};
use lis_grid::DatasetLocator;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use json_renderer::JsonRenderer;

#[derive(Parser, Debug)]
#[command(name = "lis-explorer")]
#[command(about = "Compare LIS model output against streamflow gage observations")]
struct Args {
    /// YAML configuration file
    #[arg(short, long, env = "LIS_CONFIG")]
    config: Option<PathBuf>,

    /// Dataset locator: `s3://bucket/key` (resolved under the data dir) or a path
    #[arg(short, long, env = "LIS_DATASET")]
    dataset: String,

    /// Gage header file
    #[arg(long)]
    gage_header: Option<PathBuf>,

    /// Directory of per-gage data files
    #[arg(long)]
    gage_dir: Option<PathBuf>,

    /// Position of the gage to compare, in header order
    #[arg(short, long)]
    gage: Option<usize>,

    /// Variable to show (default from configuration)
    #[arg(short, long)]
    variable: Option<String>,

    /// Tap a point given as `lon,lat`
    #[arg(long, value_parser = parse_point, allow_hyphen_values = true)]
    point: Option<GeoPoint>,

    /// Render the first time step of the variable with the gage layer
    #[arg(long)]
    map: bool,

    /// Print available variables and exit
    #[arg(long)]
    list_variables: bool,

    /// Pretty-print JSON output
    #[arg(long)]
    pretty: bool,

    /// Log level (overrides configuration)
    #[arg(long)]
    log_level: Option<String>,

    /// Log format: text or json (overrides configuration)
    #[arg(long)]
    log_format: Option<String>,
}

fn parse_point(s: &str) -> std::result::Result<GeoPoint, String> {
    let (lon, lat) = s
        .split_once(',')
        .ok_or_else(|| format!("expected lon,lat but got '{}'", s))?;
    let lon: f64 = lon.trim().parse().map_err(|_| format!("invalid longitude '{}'", lon))?;
    let lat: f64 = lat.trim().parse().map_err(|_| format!("invalid latitude '{}'", lat))?;
    Ok(GeoPoint::new(lon, lat))
}

fn load_config(args: &Args) -> Result<ExplorerConfig> {
    let mut config = match &args.config {
        Some(path) => ExplorerConfig::from_yaml_file(path)
            .with_context(|| format!("Failed to load configuration from {}", path.display()))?,
        None => ExplorerConfig::default(),
    };
    config.apply_env();

    if let Some(level) = &args.log_level {
        config.log_level = level.clone();
    }
    if let Some(format) = &args.log_format {
        config.log_format = LogFormat::from_str(format);
    }
    if let Some(variable) = &args.variable {
        config.default_variable = variable.clone();
    }

    config.validated().context("Invalid configuration")
}

fn init_tracing(config: &ExplorerConfig) -> Result<()> {
    let level = match config.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let builder = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(true)
        .with_thread_ids(true)
        .with_writer(std::io::stderr);

    match config.log_format {
        LogFormat::Json => tracing::subscriber::set_global_default(builder.json().finish())?,
        LogFormat::Text => tracing::subscriber::set_global_default(builder.finish())?,
    }
    Ok(())
}

fn load_catalog(args: &Args, config: &ExplorerConfig) -> Result<GageCatalog> {
    let Some(header) = &args.gage_header else {
        return Ok(GageCatalog::new());
    };

    let files = match &args.gage_dir {
        Some(dir) => scan_gage_dir(dir, &config.gage_files.file_extension)
            .with_context(|| format!("Failed to scan {}", dir.display()))?,
        None => Vec::new(),
    };

    GageCatalog::load(header, &files, &config.gage_files)
        .with_context(|| format!("Failed to load gages from {}", header.display()))
}

fn main() -> Result<()> {
    // Load environment from .env file if present
    dotenvy::dotenv().ok();

    let args = Args::parse();
    let config = load_config(&args)?;
    init_tracing(&config)?;

    info!("Starting LIS explorer");

    let env = Environment::new(&config).context("Failed to prepare directories")?;
    let locator = DatasetLocator::parse(&args.dataset).context("Invalid dataset locator")?;
    let catalog = load_catalog(&args, &config)?;

    let mut session = ExplorationSession::open(&env.dataset_store(), &locator, catalog, config)
        .with_context(|| format!("Failed to open dataset {}", locator))?;

    if args.list_variables {
        println!("{}", serde_json::to_string(&session.variables())?);
        return Ok(());
    }

    let mut renderer = JsonRenderer::new(std::io::stdout().lock(), args.pretty);

    if args.map {
        let map = session.variable_map().context("Failed to build variable map")?;
        renderer.render_map(&map, &session.config().map_style)?;
    }

    if let Some(point) = args.point {
        if !session.on_point_tap(point, &mut renderer) {
            bail!("Nothing to show at {}", point);
        }
    }

    let gage = match args.gage {
        Some(index) => Some(index),
        None if !session.catalog().is_empty() && args.point.is_none() && !args.map => Some(0),
        None => None,
    };
    if let Some(index) = gage {
        if !session.on_gage_selection(&[index], &mut renderer) {
            bail!("Comparison for gage {} failed", index);
        }
    }

    info!(session_id = %session.id(), "Done");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_point() {
        assert_eq!(parse_point("-99.8,30.3").unwrap(), GeoPoint::new(-99.8, 30.3));
        assert_eq!(parse_point(" -99.8 , 30.3 ").unwrap(), GeoPoint::new(-99.8, 30.3));
        assert!(parse_point("-99.8").is_err());
        assert!(parse_point("west,30").is_err());
    }

    #[test]
    fn test_args_parse() {
        let args = Args::try_parse_from([
            "lis-explorer",
            "--dataset",
            "s3://eis-dh-hydro/LIS/ROUTING",
            "--point",
            "-99.8,30.3",
            "--gage",
            "2",
        ])
        .unwrap();
        assert_eq!(args.point, Some(GeoPoint::new(-99.8, 30.3)));
        assert_eq!(args.gage, Some(2));
        assert!(!args.map);
    }
}
