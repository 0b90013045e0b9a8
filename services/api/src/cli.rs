use crate::demo::{run_demo, run_ledger_evaluation, DemoArgs, EligibilityArgs};
use crate::server;
use clap::{Args, Parser, Subcommand};
use pps_engine::error::AppError;

#[derive(Parser, Debug)]
#[command(
    name = "PPS Selection Engine",
    about = "Evaluate practicum eligibility and run opening selections from the command line",
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
    /// Evaluate a practice ledger stored as a JSON file
    Eligibility(EligibilityArgs),
    /// Run a seeded walkthrough: eligibility, ranking, selection, and closing an opening
    Demo(DemoArgs),
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
    /// Start with the demo opening and applicants loaded
    #[arg(long)]
    pub(crate) seed_demo: bool,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Eligibility(args) => run_ledger_evaluation(args),
        Command::Demo(args) => run_demo(args).await,
    }
}
