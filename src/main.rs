//! The Operator CLI entry point.

use clap::Parser;
use op::cli::commands;
use op::cli::{Cli, Commands, Context, OutputFormat};
use op::error::Error;
use std::process::ExitCode;

fn main() -> ExitCode {
    let cli = Cli::parse();

    if cli.no_color {
        colored::control::set_override(false);
    }

    // Set up tracing based on verbosity
    init_tracing(cli.verbose, cli.quiet);

    // Resolve effective JSON mode: --json OR --format json OR non-TTY stdout
    let json = cli.json
        || cli.format == OutputFormat::Json
        || !std::io::IsTerminal::is_terminal(&std::io::stdout());

    // Run the command and handle errors
    match run(&cli, json) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            if json {
                eprintln!("{}", e.to_structured_json());
            } else if !cli.quiet {
                if let Some(hint) = e.hint() {
                    eprintln!("Error: {e}\n  Hint: {hint}");
                } else {
                    eprintln!("Error: {e}");
                }
            }
            ExitCode::from(e.exit_code())
        }
    }
}

fn init_tracing(verbose: u8, quiet: bool) {
    use tracing_subscriber::EnvFilter;

    if quiet {
        return;
    }

    // Honor RUST_LOG if set, otherwise use verbosity flag
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else {
        match verbose {
            0 => EnvFilter::new("warn"),
            1 => EnvFilter::new("info"),
            2 => EnvFilter::new("debug,rusqlite=info,reqwest=info,hyper=info"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .without_time()
        .init();
}

fn run(cli: &Cli, json: bool) -> Result<(), Error> {
    // Commands that need no home directory
    match &cli.command {
        Commands::Version => return commands::version::execute(json),
        Commands::Completions { shell } => return commands::completions::execute(shell),
        _ => {}
    }

    let ctx = Context::from_cli(cli)?;

    match &cli.command {
        Commands::Today(args) => commands::today::execute(args, &ctx, json),
        Commands::Task { command } => commands::task::execute(command, &ctx, json),
        Commands::Block { command } => commands::block::execute(command, &ctx, json),
        Commands::Goal { command } => commands::goal::execute(command, &ctx, json),
        Commands::Code { command } => commands::code::execute(command, &ctx, json),
        Commands::Progress => commands::progress::execute(&ctx, json),
        Commands::Week { until } => commands::week::execute(until.as_deref(), &ctx, json),
        Commands::Watch(args) => commands::watch::execute(args, &ctx, json),
        Commands::Auth { command } => commands::auth::execute(command, &ctx, json),
        Commands::Subscription { command } => commands::subscription::execute(command, &ctx, json),
        Commands::Status => commands::status::execute(&ctx, json),
        Commands::Version | Commands::Completions { .. } => Ok(()),
    }
}
