use crate::infra::{InMemoryBenchmarkCatalog, InMemoryProviderLedger};
use chrono::{Datelike, Local};
use clap::Args;
use provider_comp::compensation::domain::{
    BenchmarkRow, MonthlyProductivity, PercentileBands, Provider,
};
use provider_comp::compensation::engine::{percentile_of, EngineSettings};
use provider_comp::compensation::import::{
    BenchmarkImporter, ProductivityImporter, ProviderImporter,
};
use provider_comp::compensation::metrics::{
    BulkRecomputeSummary, CompensationMetricsService, ProviderYearSummary,
};
use provider_comp::config::AppConfig;
use provider_comp::error::AppError;
use provider_comp::telemetry;
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Args, Debug)]
pub(crate) struct ReportArgs {
    /// Provider roster CSV
    #[arg(long)]
    pub(crate) providers: PathBuf,
    /// Specialty benchmark CSV
    #[arg(long)]
    pub(crate) benchmarks: PathBuf,
    /// Monthly wRVU CSV with jan..dec columns
    #[arg(long)]
    pub(crate) wrvus: PathBuf,
    /// Calendar year to recompute (defaults to the current year)
    #[arg(long)]
    pub(crate) year: Option<i32>,
    /// Print the report as JSON instead of text
    #[arg(long)]
    pub(crate) json: bool,
}

#[derive(Args, Debug)]
pub(crate) struct PercentileArgs {
    #[arg(long)]
    pub(crate) p25: f64,
    #[arg(long)]
    pub(crate) p50: f64,
    #[arg(long)]
    pub(crate) p75: f64,
    #[arg(long)]
    pub(crate) p90: f64,
    /// Value to rank, already annualized and FTE-adjusted
    #[arg(long, allow_hyphen_values = true)]
    pub(crate) value: f64,
}

#[derive(Debug, Serialize)]
pub(crate) struct CompensationReport {
    pub(crate) year: i32,
    pub(crate) recompute: BulkRecomputeSummary,
    pub(crate) providers: Vec<ProviderYearSummary>,
    /// Imported records the service refused, with the reason.
    pub(crate) rejected: Vec<String>,
}

pub(crate) fn run_report(args: ReportArgs) -> Result<(), AppError> {
    let ReportArgs {
        providers,
        benchmarks,
        wrvus,
        year,
        json,
    } = args;

    let config = AppConfig::load()?;
    telemetry::init_stderr(&config.telemetry)?;
    let year = year.unwrap_or_else(|| Local::now().year());

    let providers = ProviderImporter::from_path(providers)?;
    let benchmarks = BenchmarkImporter::from_path(benchmarks)?;
    let productivity = ProductivityImporter::from_path(wrvus)?;

    let report = build_report(config.engine, providers, benchmarks, productivity, year)?;

    if json {
        match serde_json::to_string_pretty(&report) {
            Ok(body) => println!("{body}"),
            Err(err) => println!("Report payload unavailable: {}", err),
        }
    } else {
        render_report(&report);
    }
    Ok(())
}

pub(crate) fn run_percentile(args: PercentileArgs) -> Result<(), AppError> {
    println!("{}", percentile_line(&args));
    Ok(())
}

fn percentile_line(args: &PercentileArgs) -> String {
    let bands = PercentileBands::new(args.p25, args.p50, args.p75, args.p90);
    let rank = percentile_of(args.value, &bands);
    format!(
        "{} -> {:.2} percentile ({})",
        args.value, rank.percentile, rank.nearest_benchmark
    )
}

/// Loads imported records into fresh in-memory stores and recomputes every provider.
pub(crate) fn build_report(
    settings: EngineSettings,
    providers: Vec<Provider>,
    benchmarks: Vec<BenchmarkRow>,
    productivity: Vec<MonthlyProductivity>,
    year: i32,
) -> Result<CompensationReport, AppError> {
    let service = CompensationMetricsService::new(
        Arc::new(InMemoryProviderLedger::default()),
        Arc::new(InMemoryBenchmarkCatalog::default()),
        settings,
    );
    let mut rejected = Vec::new();

    for row in benchmarks {
        let specialty = row.specialty.clone();
        if let Err(err) = service.upsert_benchmark(row) {
            rejected.push(format!("benchmark '{specialty}': {err}"));
        }
    }
    for provider in providers {
        let provider_id = provider.provider_id.clone();
        if let Err(err) = service.upsert_provider(provider) {
            rejected.push(format!("provider {provider_id}: {err}"));
        }
    }
    for entry in productivity {
        if let Err(err) =
            service.record_productivity(&entry.provider_id, entry.year, entry.month, entry.wrvus)
        {
            rejected.push(format!(
                "wRVUs {} {}-{:02}: {err}",
                entry.provider_id, entry.year, entry.month
            ));
        }
    }

    let recompute = service.recompute_all(year)?;
    let mut summaries = Vec::new();
    for provider in service.providers()? {
        summaries.push(service.summary(&provider.provider_id, year)?);
    }

    Ok(CompensationReport {
        year,
        recompute,
        providers: summaries,
        rejected,
    })
}

fn render_report(report: &CompensationReport) {
    println!("Provider compensation report for {}", report.year);
    println!(
        "- {} providers recomputed | {} failed | {} inactive skipped | {} periods written",
        report.recompute.succeeded,
        report.recompute.failed,
        report.recompute.skipped,
        report.recompute.periods_written
    );

    for failure in &report.recompute.failures {
        println!("  ! {}: {}", failure.provider_id, failure.error);
    }
    for reason in &report.rejected {
        println!("  ! rejected {}", reason);
    }

    println!("\nProviders:");
    for summary in &report.providers {
        println!(
            "  - {} {} ({}, {}) through month {}",
            summary.provider_id,
            summary.name,
            summary.specialty,
            summary.status,
            summary.months_reported
        );
        println!(
            "    wRVUs {:.1} of {:.1} target ({:.1}% of plan) | percentile {:.1} ({})",
            summary.ytd_wrvus,
            summary.ytd_target,
            summary.plan_progress,
            summary.wrvu_percentile,
            summary.wrvu_benchmark
        );
        println!(
            "    Compensation ${:.2} YTD | ${:.2} annualized | percentile {:.1} ({})",
            summary.ytd_compensation,
            summary.annualized_compensation,
            summary.compensation_percentile,
            summary.compensation_benchmark
        );
    }
}
