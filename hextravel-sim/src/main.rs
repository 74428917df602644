mod report;
mod runner;
mod scenario;

use anyhow::{Context, Result, anyhow};
use clap::{Parser, ValueEnum};
use colored::Colorize;
use std::fs::File;
use std::io::{BufWriter, Write, stdout};
use std::path::PathBuf;
use std::time::Instant;

use runner::{JourneyReport, RunOptions, run_scenario};
use scenario::{Scenario, get_scenario, list_scenarios};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ReportFormat {
    Console,
    Json,
    Markdown,
}

#[derive(Debug, Parser)]
#[command(name = "hextravel-sim", version = "0.1.0")]
#[command(about = "Headless journey simulator for the hex travel engine")]
struct Args {
    /// Scenario JSON file to run instead of a built-in scenario
    #[arg(long)]
    scenario: Option<PathBuf>,

    /// Built-in scenario to run when no file is given
    #[arg(long, default_value = "demo")]
    builtin: String,

    /// List all built-in scenarios and exit
    #[arg(long)]
    list_scenarios: bool,

    /// Seed for encounter rolls
    #[arg(long, default_value_t = 1337)]
    seed: u64,

    /// Simulated frame length in milliseconds
    #[arg(long, default_value_t = 16)]
    frame_ms: u32,

    /// Encounters to resume after before leaving the party halted
    #[arg(long, default_value_t = 100)]
    auto_resume: u32,

    /// Output report format
    #[arg(long, value_enum, default_value_t = ReportFormat::Console)]
    report: ReportFormat,

    /// Optional path to write the report output instead of stdout
    #[arg(long)]
    output: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    if maybe_list_scenarios(&args)? {
        return Ok(());
    }

    if matches!(args.report, ReportFormat::Console) && args.output.is_none() {
        announce_banner();
    }

    let start_time = Instant::now();
    let scenario = resolve_scenario(&args)?;
    let report = run_scenario(&scenario, run_options(&args));
    write_report(&args, &report, start_time)?;

    if !report.passed() {
        std::process::exit(1);
    }

    Ok(())
}

fn maybe_list_scenarios(args: &Args) -> Result<bool> {
    if !args.list_scenarios {
        return Ok(false);
    }
    let mut output_target = OutputTarget::new(args.output.clone())?;
    writeln!(output_target.writer(), "Available scenarios:")?;
    for (key, description) in list_scenarios() {
        writeln!(output_target.writer(), "  {key:15} - {description}")?;
    }
    output_target.flush_inner()?;
    Ok(true)
}

fn announce_banner() {
    println!("{}", "🗺️  Hex Travel Simulator".bright_cyan().bold());
    println!("{}", "========================".cyan());
}

fn resolve_scenario(args: &Args) -> Result<Scenario> {
    if let Some(path) = &args.scenario {
        return Scenario::from_file(path);
    }
    get_scenario(&args.builtin).ok_or_else(|| {
        anyhow!(
            "unknown scenario '{}' (try --list-scenarios)",
            args.builtin
        )
    })
}

const fn run_options(args: &Args) -> RunOptions {
    RunOptions {
        seed: args.seed,
        frame_ms: args.frame_ms,
        auto_resume: args.auto_resume,
    }
}

fn write_report(args: &Args, report: &JourneyReport, start_time: Instant) -> Result<()> {
    let mut output_target = OutputTarget::new(args.output.clone())?;
    match args.report {
        ReportFormat::Json => report::generate_json_report(output_target.writer(), report)?,
        ReportFormat::Markdown => report::generate_markdown_report(output_target.writer(), report)?,
        ReportFormat::Console => report::generate_console_report(
            output_target.writer(),
            report,
            args.verbose,
            start_time.elapsed(),
        )?,
    }
    output_target
        .flush_inner()
        .context("failed to flush report output")?;
    Ok(())
}

enum OutputTarget {
    Stdout(BufWriter<std::io::Stdout>),
    File(BufWriter<File>),
}

impl OutputTarget {
    fn new(path: Option<PathBuf>) -> Result<Self> {
        if let Some(path) = path {
            let file = File::create(&path)
                .with_context(|| format!("failed to create {}", path.display()))?;
            Ok(Self::File(BufWriter::new(file)))
        } else {
            Ok(Self::Stdout(BufWriter::new(stdout())))
        }
    }

    fn writer(&mut self) -> &mut dyn Write {
        match self {
            Self::Stdout(w) => w,
            Self::File(w) => w,
        }
    }

    fn flush_inner(&mut self) -> std::io::Result<()> {
        match self {
            Self::Stdout(w) => w.flush(),
            Self::File(w) => w.flush(),
        }
    }
}
