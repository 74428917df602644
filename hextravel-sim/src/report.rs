use anyhow::Result;
use colored::Colorize;
use std::io::Write;
use std::time::Duration;

use crate::runner::{JourneyReport, JourneyStatus};

fn status_label(status: JourneyStatus) -> &'static str {
    match status {
        JourneyStatus::Arrived => "arrived",
        JourneyStatus::Halted => "halted by encounter",
        JourneyStatus::NoRoute => "no route",
        JourneyStatus::Stalled => "stalled",
    }
}

pub fn generate_console_report(
    writer: &mut dyn Write,
    report: &JourneyReport,
    verbose: bool,
    elapsed: Duration,
) -> Result<()> {
    writeln!(writer)?;
    writeln!(writer, "{}", "🧭 Journey Report".bright_cyan().bold())?;
    writeln!(writer, "{}", "=================".cyan())?;

    let verdict = if report.passed() {
        "✅ PASS".green()
    } else {
        "❌ FAIL".red()
    };
    writeln!(writer, "{} {} (seed {})", verdict, report.scenario.bold(), report.seed)?;
    writeln!(
        writer,
        "   Route: {} -> {} ({} hexes, distance {})",
        report.start,
        report
            .destination
            .map_or_else(|| "-".to_string(), |d| d.to_string()),
        report.path_len,
        report.total_distance
    )?;
    writeln!(writer, "   Status: {}", status_label(report.status))?;
    writeln!(
        writer,
        "   Estimated: {} ({} hours)",
        report.estimated_duration.as_deref().unwrap_or("-"),
        report.estimated_hours
    )?;
    writeln!(writer, "   Hours elapsed: {}", report.hours_elapsed)?;
    writeln!(
        writer,
        "   Calendar: {} -> {}",
        report.start_calendar, report.final_calendar
    )?;
    writeln!(
        writer,
        "   Frames: {}, resumes: {}, wall time {elapsed:?}",
        report.frames, report.resumes
    )?;

    let encounters: Vec<_> = report.encounters().collect();
    if encounters.is_empty() {
        writeln!(writer, "   Encounters: none")?;
    } else {
        writeln!(writer, "   Encounters:")?;
        for check in encounters {
            writeln!(
                writer,
                "     • hour {} at {} ({}), roll {:.3} < {:.3}",
                check.hour.to_string().yellow(),
                check.coord,
                check.terrain,
                check.roll.roll,
                check.roll.chance
            )?;
        }
    }

    if verbose {
        writeln!(writer, "   Hour checks:")?;
        for check in &report.hour_checks {
            writeln!(
                writer,
                "     hour {:>4} index {:>3} {} {:<9} {}",
                check.hour,
                check.path_index,
                check.coord,
                check.terrain.key(),
                if check.triggered() { "encounter" } else { "-" }
            )?;
        }
    }

    if !report.failures.is_empty() {
        writeln!(writer, "   Failures:")?;
        for failure in &report.failures {
            writeln!(writer, "     • {}", failure.red())?;
        }
    }
    Ok(())
}

pub fn generate_json_report(writer: &mut dyn Write, report: &JourneyReport) -> Result<()> {
    let json_output = serde_json::to_string_pretty(report)?;
    writeln!(writer, "{json_output}")?;
    Ok(())
}

pub fn generate_markdown_report(writer: &mut dyn Write, report: &JourneyReport) -> Result<()> {
    writeln!(writer, "# Journey Report: {}\n", report.scenario)?;
    writeln!(writer, "| Field | Value |")?;
    writeln!(writer, "|-------|-------|")?;
    writeln!(writer, "| Seed | {} |", report.seed)?;
    writeln!(writer, "| Status | {} |", status_label(report.status))?;
    writeln!(
        writer,
        "| Result | {} |",
        if report.passed() { "✅ PASS" } else { "❌ FAIL" }
    )?;
    writeln!(writer, "| Path hexes | {} |", report.path_len)?;
    writeln!(
        writer,
        "| Estimated | {} ({} h) |",
        report.estimated_duration.as_deref().unwrap_or("-"),
        report.estimated_hours
    )?;
    writeln!(writer, "| Hours elapsed | {} |", report.hours_elapsed)?;
    writeln!(
        writer,
        "| Calendar | {} → {} |",
        report.start_calendar, report.final_calendar
    )?;
    writeln!(writer, "| Resumes | {} |", report.resumes)?;

    let encounters: Vec<_> = report.encounters().collect();
    if !encounters.is_empty() {
        writeln!(writer, "\n## Encounters\n")?;
        writeln!(writer, "| Hour | Hex | Terrain |")?;
        writeln!(writer, "|------|-----|---------|")?;
        for check in encounters {
            writeln!(writer, "| {} | {} | {} |", check.hour, check.coord, check.terrain)?;
        }
    }

    if !report.failures.is_empty() {
        writeln!(writer, "\n## Failures\n")?;
        for failure in &report.failures {
            writeln!(writer, "- {failure}")?;
        }
    }
    Ok(())
}
