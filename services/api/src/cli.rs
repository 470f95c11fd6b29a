use crate::demo::{run_demo, run_order_report, DemoArgs, OrderReportArgs};
use crate::server;
use clap::{Args, Parser, Subcommand};
use nomination_desk::error::AppError;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "Nomination Desk",
    about = "Serve or inspect the quota-interleaved nomination order and submission moderation",
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
    /// Print the nomination order for a roster CSV without starting the server
    Order(OrderReportArgs),
    /// Run an end-to-end CLI demo covering ordering and moderation
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
    /// Roster CSV used to seed the candidate store (overrides APP_ROSTER_CSV)
    #[arg(long)]
    pub(crate) roster: Option<PathBuf>,
    /// Reservation pattern JSON (overrides APP_RESERVATION_PATTERN)
    #[arg(long)]
    pub(crate) pattern: Option<PathBuf>,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Order(args) => run_order_report(args),
        Command::Demo(args) => run_demo(args),
    }
}
