use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use return_matcher::{
    FillStrategy, InputSpec, Order, OutputType, Pipeline, PipelineConfig, RunSummary,
};

#[derive(Parser, Debug)]
#[command(name = "return-matcher")]
#[command(version = "0.1.0")]
#[command(
    about = "Align daily price files to a benchmark date grid and write returns/premiums",
    long_about = None
)]
struct Args {
    /// Pipeline configuration (JSON). Built-in defaults are used if omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Benchmark file defining the target dates
    #[arg(short, long)]
    target: Option<PathBuf>,

    /// Input file as TYPE=PATH (TYPE: prices, returns, premiums). Repeatable;
    /// replaces the configured input list.
    #[arg(short, long = "input", value_parser = parse_input)]
    inputs: Vec<InputSpec>,

    /// Risk-free series matched to the target (annual percent)
    #[arg(long, conflicts_with = "no_risk_free")]
    risk_free: Option<PathBuf>,

    /// Ignore the configured risk-free series
    #[arg(long)]
    no_risk_free: bool,

    /// Root directory for output files
    #[arg(short = 'd', long)]
    output_dir: Option<PathBuf>,

    /// Vendor row order (chronological, reverse)
    #[arg(long)]
    order: Option<Order>,

    /// Fill strategy for unmatched dates (sequential, previous-date)
    #[arg(long)]
    fill: Option<FillStrategy>,

    /// Skip writing the combined MAT-file
    #[arg(long)]
    no_mat: bool,

    /// Report format (json, text)
    #[arg(short, long, default_value = "text")]
    output: String,

    /// Pretty print JSON output
    #[arg(long)]
    pretty: bool,

    /// Log level filter, overridden by RUST_LOG
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Print the effective configuration as JSON and exit
    #[arg(long)]
    print_config: bool,
}

fn parse_input(s: &str) -> std::result::Result<InputSpec, String> {
    let (kind, path) = s
        .split_once('=')
        .ok_or_else(|| format!("expected TYPE=PATH, got '{s}'"))?;
    let output_type: OutputType = kind.parse().map_err(|e| format!("{e}"))?;
    Ok(InputSpec::new(path, output_type))
}

fn build_config(args: &Args) -> Result<PipelineConfig> {
    let mut config = match &args.config {
        Some(path) => PipelineConfig::from_json_file(path)
            .with_context(|| format!("loading config {path:?}"))?,
        None => PipelineConfig::default(),
    };

    if let Some(target) = &args.target {
        config = config.with_target_path(target);
    }
    if !args.inputs.is_empty() {
        config = config.with_inputs(args.inputs.clone());
    }
    if let Some(rf) = &args.risk_free {
        config = config.with_risk_free(Some(rf.clone()));
    }
    if args.no_risk_free {
        config = config.with_risk_free(None);
    }
    if let Some(dir) = &args.output_dir {
        config = config.with_output_dir(dir);
    }
    if let Some(order) = args.order {
        config = config.with_order(order);
    }
    if let Some(fill) = args.fill {
        config = config.with_fill(fill);
    }
    if args.no_mat {
        config = config.without_mat();
    }

    Ok(config)
}

fn main() -> Result<()> {
    let args = Args::parse();

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&args.log_level))
        .context("invalid log level")?;
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let config = build_config(&args)?;

    if args.print_config {
        println!("{}", serde_json::to_string_pretty(&config)?);
        return Ok(());
    }

    let summary = Pipeline::new(config).run()?;

    match args.output.as_str() {
        "json" => {
            let json = if args.pretty {
                serde_json::to_string_pretty(&summary)?
            } else {
                serde_json::to_string(&summary)?
            };
            println!("{}", json);
        }
        "text" => print_text_report(&summary),
        _ => {
            eprintln!("Unknown output format: {}. Using text.", args.output);
            print_text_report(&summary);
        }
    }

    Ok(())
}

fn print_text_report(summary: &RunSummary) {
    println!();
    println!("================================================================");
    println!("  DATE MATCHING REPORT");
    println!("================================================================");
    println!();
    println!("  Target:          {}", summary.target_path.display());
    println!("  Target dates:    {:>12}", summary.target_dates);
    if let (Some(first), Some(last)) = (&summary.first_date, &summary.last_date) {
        println!("  Period:          {} to {}", first, last);
    }
    println!("  Execution Time:  {}ms", summary.execution_time_ms);
    println!();
    println!("----------------------------------------------------------------");
    println!("  INPUTS");
    println!("----------------------------------------------------------------");
    for input in &summary.inputs {
        println!(
            "  {:<28} {:<9} raw {:>6} | matched {:>6} | missed {:>4}",
            input
                .path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default(),
            input.output_type.as_str(),
            input.raw_points,
            input.matched_points,
            input.misses.len()
        );
        println!("      -> {}", input.output_file.display());
    }
    println!();

    if let Some(mat) = &summary.mat_file {
        println!("  Combined matrix:  {}", mat.display());
        println!();
    }
    println!("================================================================");
}
