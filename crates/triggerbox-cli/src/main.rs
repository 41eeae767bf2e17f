mod cmd;
mod output;

use clap::{Parser, Subcommand};
use cmd::{
    handle::HandleArgs, setup::SetupArgs, validate::ValidateArgs, GithubArgs,
};

#[derive(Parser)]
#[command(
    name = "triggerbox",
    about = "Approve or dispatch CI workflows from checkbox toggles in a pull-request comment",
    version,
    propagate_version = true
)]
struct Cli {
    #[command(flatten)]
    github: GithubArgs,

    /// Output as JSON
    #[arg(long, global = true, short = 'j')]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Handle an edit of the tracking comment: approve or dispatch every
    /// workflow whose checkbox was just ticked
    HandleEvent(HandleArgs),

    /// Create or refresh the tracking comment on a pull request
    SetupComment(SetupArgs),

    /// Check that every configured workflow definition is reachable
    Validate(ValidateArgs),
}

fn main() {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let result = match cli.command {
        Commands::HandleEvent(args) => cmd::handle::run(&cli.github, args, cli.json),
        Commands::SetupComment(args) => cmd::setup::run(&cli.github, args, cli.json),
        Commands::Validate(args) => cmd::validate::run(&cli.github, args, cli.json),
    };

    if let Err(e) = result {
        // Print the full error chain (anyhow's alternate Display)
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}
