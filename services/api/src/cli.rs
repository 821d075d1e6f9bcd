use crate::report::{run_percentile, run_report, PercentileArgs, ReportArgs};
use crate::server;
use clap::{Args, Parser, Subcommand};
use provider_comp::error::AppError;

#[derive(Parser, Debug)]
#[command(
    name = "Provider Compensation Metrics",
    about = "Serve and report provider productivity, benchmark percentiles, and compensation",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP service (default command)
    Serve(ServeArgs),
    /// Load CSV exports, recompute a year, and print per-provider summaries
    Report(ReportArgs),
    /// Interpolate a single value against 25th/50th/75th/90th percentile bands
    Percentile(PercentileArgs),
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Report(args) => run_report(args),
        Command::Percentile(args) => run_percentile(args),
    }
}
