//! oneway-anova: CLI entry point.
//!
//! Runs one-way ANOVA on CSV files and generates synthetic ANOVA data.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use chrono::{DateTime, Local};
use clap::{Args, Parser, Subcommand, ValueEnum};
use colored::Colorize;
use rand::SeedableRng;
use rand_pcg::Pcg64;

use oneway_anova::anova::{parse_alpha, AnovaReport};
use oneway_anova::generator::{generate, SyntheticTable};
use oneway_anova::report::ReportTable;
use oneway_anova::settings::GeneratorSettings;
use oneway_anova::storage::{
    export_report_csv, export_report_json, read_raw_table, write_synthetic_table,
};
use oneway_anova::worker::{spawn_analysis, AnalysisJob};

#[derive(Parser)]
#[command(name = "oneway-anova")]
#[command(about = "One-way ANOVA on grouped CSV data")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run a one-way ANOVA over the columns of a CSV file.
    Analyze(AnalyzeArgs),
    /// Generate synthetic grouped data from a birthdate.
    Generate(GenerateArgs),
}

#[derive(Clone, Copy, ValueEnum)]
enum Format {
    Table,
    Json,
}

#[derive(Args)]
struct AnalyzeArgs {
    /// CSV file with one group per column.
    file: PathBuf,

    /// The first row is data, not column names.
    #[arg(long)]
    no_header: bool,

    /// The first column is a row index.
    #[arg(long)]
    index: bool,

    /// Significance level (anything that is not a number means 0.05).
    #[arg(short, long)]
    alpha: Option<String>,

    /// Print the computation steps with their values.
    #[arg(long)]
    steps: bool,

    /// Output format.
    #[arg(long, value_enum, default_value_t = Format::Table)]
    format: Format,

    /// Directory to export both tables as CSV.
    #[arg(long)]
    export_dir: Option<PathBuf>,

    /// File to export both tables as a JSON workbook.
    #[arg(long)]
    export_json: Option<PathBuf>,
}

#[derive(Args)]
struct GenerateArgs {
    /// YAML file with generator settings (flags override it).
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Birthdate as DD/MM/YY.
    #[arg(long)]
    dob: Option<String>,

    /// Observations per treatment.
    #[arg(short, long)]
    replications: Option<usize>,

    /// Allowed deviation of the sample mean from its target.
    #[arg(long)]
    tol_mean: Option<f64>,

    /// Allowed deviation of the sample std from its target.
    #[arg(long)]
    tol_std: Option<f64>,

    /// Decimal places to round observations to.
    #[arg(short, long)]
    decimals: Option<u32>,

    /// Output file name prefix.
    #[arg(short, long)]
    prefix: Option<String>,

    /// Seed for reproducible output.
    #[arg(long)]
    seed: Option<u64>,

    /// Directory to write the CSV file into.
    #[arg(short, long, default_value = ".")]
    out_dir: PathBuf,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let outcome = match cli.command {
        Command::Analyze(args) => run_analyze(&args),
        Command::Generate(args) => run_generate(&args),
    };

    if let Err(e) = outcome {
        eprintln!("{} {e:#}", "Error:".red().bold());
        std::process::exit(1);
    }

    Ok(())
}

fn run_analyze(args: &AnalyzeArgs) -> anyhow::Result<()> {
    let table = read_raw_table(&args.file)?;
    let quiet = matches!(args.format, Format::Json);

    if !quiet {
        println!("{}", "One-Way ANOVA".bold());
        println!("  File: {}", args.file.display());
        println!("  Header row: {}", yes_no(!args.no_header));
        println!("  Index column: {}", yes_no(args.index));
        println!("  α: {}", parse_alpha(args.alpha.as_deref()));
        println!();
    }

    let start = Instant::now();
    let mut handle = spawn_analysis(AnalysisJob {
        table,
        has_header: !args.no_header,
        has_index: args.index,
        alpha: args.alpha.clone(),
    });

    if !quiet {
        print!("{}", "Running analysis".cyan());
    }
    let result = loop {
        if let Some(result) = handle.wait_timeout(Duration::from_millis(100)) {
            break result;
        }
        if !quiet {
            print!("{}", ".".cyan());
            std::io::stdout().flush()?;
        }
    };
    if !quiet {
        println!(" done in {:.2}s", start.elapsed().as_secs_f64());
        println!();
    }

    let report = result?;

    match args.format {
        Format::Json => println!("{}", serde_json::to_string_pretty(&report)?),
        Format::Table => print_report(&report, args.steps),
    }

    for path in export_outputs(args, &report, &Local::now())? {
        let line = format!("  {} {}", "Saved".green(), path.display());
        // JSON output owns stdout.
        if quiet {
            eprintln!("{line}");
        } else {
            println!("{line}");
        }
    }

    Ok(())
}

/// Writes the requested exports and returns the files written.
fn export_outputs(
    args: &AnalyzeArgs,
    report: &AnovaReport,
    at: &DateTime<Local>,
) -> anyhow::Result<Vec<PathBuf>> {
    let mut written = Vec::new();
    if let Some(dir) = &args.export_dir {
        fs::create_dir_all(dir)?;
        written.extend(export_report_csv(dir, report, at)?);
    }
    if let Some(path) = &args.export_json {
        export_report_json(path, report)?;
        written.push(path.clone());
    }
    Ok(written)
}

fn print_report(report: &AnovaReport, steps: bool) {
    if steps {
        println!("{}", "Computation".bold());
        for step in report.result.steps() {
            println!("  {}", step.label);
            println!("      = {}", format!("{:.6}", step.value).cyan());
        }
        println!();
    }

    print_table(&report.group_info_table());
    println!();
    print_table(&report.anova_table());
    println!();

    let r = &report.result;
    println!("{}", "=".repeat(60));
    if r.reject_null {
        println!(
            "  {} p = {:.4e} < α = {} (F = {:.4})",
            "Reject H0".green().bold(),
            r.p_value,
            r.alpha,
            r.f_statistic
        );
    } else {
        println!(
            "  {} p = {:.4e} ≥ α = {} (F = {:.4})",
            "Fail to reject H0".yellow().bold(),
            r.p_value,
            r.alpha,
            r.f_statistic
        );
    }
    println!("{}", "=".repeat(60));
}

fn print_table(table: &ReportTable) {
    println!("{}", table.name.bold());
    let mut lines = table.render_lines().into_iter();
    if let Some(header) = lines.next() {
        println!("  {}", header.bold());
        println!("  {}", "-".repeat(header.chars().count()).dimmed());
    }
    for line in lines {
        println!("  {line}");
    }
}

fn run_generate(args: &GenerateArgs) -> anyhow::Result<()> {
    let settings = load_settings(args.config.as_deref())?.merge(GeneratorSettings {
        dob: args.dob.clone(),
        replications: args.replications,
        tol_mean: args.tol_mean,
        tol_std: args.tol_std,
        decimals: args.decimals,
        prefix: args.prefix.clone(),
        seed: args.seed,
    });
    let config = settings.to_config()?;

    let mut rng = match settings.seed {
        Some(seed) => Pcg64::seed_from_u64(seed),
        None => Pcg64::from_rng(&mut rand::rng()),
    };

    let table = generate(&config, &mut rng)?;
    fs::create_dir_all(&args.out_dir)?;
    let path = write_synthetic_table(&args.out_dir, settings.prefix(), &table, &Local::now())?;

    println!("{}", "ANOVA Data Generator".bold());
    println!(
        "  Treatments: {}, replications: {}",
        table.columns.len(),
        table.replications()
    );
    for column in &table.columns {
        let note = if column.rescaled {
            "rescaled".yellow()
        } else {
            "as drawn".dimmed()
        };
        println!(
            "    {} target mean={:.2} std={:.2} ({note})",
            column.name, column.target.mean, column.target.std
        );
    }
    println!();
    print_preview(&table, 5);
    println!();
    println!("  {} {}", "Saved".green(), path.display());
    Ok(())
}

fn load_settings(path: Option<&Path>) -> anyhow::Result<GeneratorSettings> {
    let Some(path) = path else {
        return Ok(GeneratorSettings::default());
    };
    let content = fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("Failed to read {}: {e}", path.display()))?;
    GeneratorSettings::from_yaml(&content)
        .map_err(|e| anyhow::anyhow!("Failed to parse {}: {e}", path.display()))
}

fn print_preview(table: &SyntheticTable, rows: usize) {
    let decimals = table.num_decimals as usize;
    println!("{}", "First rows:".bold());
    println!("  {}", table.headers().join("  ").dimmed());
    for i in 0..rows.min(table.replications()) {
        let cells: Vec<String> = table
            .row(i)
            .iter()
            .zip(table.headers())
            .map(|(v, h)| {
                let cell = v.map_or_else(String::new, |v| format!("{v:.decimals$}"));
                format!("{cell:>width$}", width = h.len())
            })
            .collect();
        println!("  {}", cells.join("  "));
    }
}

const fn yes_no(flag: bool) -> &'static str {
    if flag {
        "yes"
    } else {
        "no"
    }
}
