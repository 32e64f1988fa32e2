use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use crosscount_core::decompose::{all_rules, decompose_label};
use crosscount_core::outputs::write_outputs;
use crosscount_core::{run_pipeline, ReportConfig};
use crosscount_parser::parse_crossing_file;
use polars::prelude::{AnyValue, DataFrame};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

const CONFIG_ENV: &str = "CROSSCOUNT_CONFIG";

#[derive(Parser, Debug)]
#[command(author, version, about = "Bike and pedestrian counter reporting", long_about = None)]
struct Cli {
    /// Emit logs as JSON lines instead of plain text
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Load counter exports, enrich them and write the report tables
    Run(RunArgs),
    /// Parse counter files and show how their reading columns decompose
    Inspect(InspectArgs),
    /// List the label decomposition rules in priority order
    Rules,
}

#[derive(Args, Debug)]
struct RunArgs {
    /// TOML config file (falls back to $CROSSCOUNT_CONFIG)
    #[arg(long)]
    config: Option<PathBuf>,
    /// Directory holding the counter CSV exports
    #[arg(long)]
    counts_dir: Option<PathBuf>,
    /// Daily weather CSV
    #[arg(long)]
    weather: Option<PathBuf>,
    /// Daily case-count CSV
    #[arg(long)]
    cases: Option<PathBuf>,
    /// Directory the parquet tables and summary are written to
    #[arg(long)]
    output: Option<PathBuf>,
    /// County whose case counts are joined
    #[arg(long)]
    county: Option<String>,
    /// Restrict case counts to this state
    #[arg(long)]
    state: Option<String>,
    /// Rows printed per report table (0 disables printing)
    #[arg(long, default_value_t = 12)]
    print_rows: usize,
}

#[derive(Args, Debug)]
struct InspectArgs {
    /// Counter CSV files to inspect
    #[arg(required = true)]
    files: Vec<PathBuf>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.json_logs);
    dotenvy::dotenv().ok();

    match cli.command {
        Command::Run(args) => run(args),
        Command::Inspect(args) => inspect(&args.files),
        Command::Rules => {
            print_rules();
            Ok(())
        }
    }
}

fn init_tracing(json: bool) {
    let builder = tracing_subscriber::fmt().with_env_filter(EnvFilter::from_default_env());
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn run(args: RunArgs) -> Result<()> {
    let config = resolve_config(&args)?;
    let output = run_pipeline(&config).context("report pipeline failed")?;

    if args.print_rows > 0 {
        for (name, table) in output.reports.named() {
            println!("{name} ({} rows)", table.height());
            println!("{}", render_frame(table, args.print_rows));
        }
    }

    let written = write_outputs(&output, &config.output_dir).with_context(|| {
        format!(
            "failed to write outputs to {}",
            config.output_dir.display()
        )
    })?;
    info!(
        files = written.len(),
        reading_rows = output.summary.reading_rows,
        "report written"
    );
    Ok(())
}

fn resolve_config(args: &RunArgs) -> Result<ReportConfig> {
    let config_path = args
        .config
        .clone()
        .or_else(|| std::env::var_os(CONFIG_ENV).map(PathBuf::from));

    let mut config = match config_path {
        Some(path) => ReportConfig::from_path(&path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => ReportConfig::default(),
    };

    if let Some(dir) = &args.counts_dir {
        config.counts_dir = dir.clone();
    }
    if let Some(path) = &args.weather {
        config.weather_path = Some(path.clone());
    }
    if let Some(path) = &args.cases {
        config.cases_path = Some(path.clone());
    }
    if let Some(dir) = &args.output {
        config.output_dir = dir.clone();
    }
    if let Some(county) = &args.county {
        config.county = county.clone();
    }
    if let Some(state) = &args.state {
        config.state = Some(state.clone());
    }

    config.validate().context("invalid configuration")?;
    Ok(config)
}

fn inspect(files: &[PathBuf]) -> Result<()> {
    for path in files {
        if let Err(err) = inspect_file(path) {
            warn!(path = %path.display(), error = %err, "could not inspect counter file");
        }
    }
    Ok(())
}

fn inspect_file(path: &Path) -> Result<()> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let table = parse_crossing_file(&content)
        .with_context(|| format!("failed to parse {}", path.display()))?;

    println!(
        "{}: crossing '{}', {} rows ({} skipped)",
        path.display(),
        table.crossing_name(),
        table.height(),
        table.skipped_rows
    );

    let mut out = Table::new();
    out.load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec!["label", "direction", "transit_type", "rule"]);
    for label in table.labels() {
        match decompose_label(label) {
            Some(decomposed) => out.add_row(vec![
                label.to_string(),
                decomposed.direction,
                decomposed
                    .transit_type
                    .map(|mode| mode.to_string())
                    .unwrap_or_default(),
                decomposed.rule.to_string(),
            ]),
            None => out.add_row(vec![label.to_string(), String::new(), String::new(), String::new()]),
        };
    }
    println!("{out}");
    Ok(())
}

fn print_rules() {
    let mut out = Table::new();
    out.load_preset(UTF8_FULL)
        .set_header(vec!["priority", "rule", "description"]);
    for (idx, rule) in all_rules().iter().enumerate() {
        out.add_row(vec![
            (idx + 1).to_string(),
            rule.name().to_string(),
            rule.description().to_string(),
        ]);
    }
    println!("{out}");
}

fn render_frame(df: &DataFrame, limit: usize) -> Table {
    let mut out = Table::new();
    out.load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(
            df.get_column_names()
                .iter()
                .map(|name| name.to_string())
                .collect::<Vec<_>>(),
        );

    for idx in 0..df.height().min(limit) {
        let row: Vec<String> = df
            .get_columns()
            .iter()
            .map(|column| match column.get(idx) {
                Ok(value) => format_cell(value),
                Err(_) => String::new(),
            })
            .collect();
        out.add_row(row);
    }
    out
}

fn format_cell(value: AnyValue<'_>) -> String {
    match value {
        AnyValue::Null => String::new(),
        AnyValue::String(text) => text.to_string(),
        AnyValue::StringOwned(text) => text.to_string(),
        AnyValue::Float64(number) => format!("{number:.2}"),
        other => other.to_string(),
    }
}
