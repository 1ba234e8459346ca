//! robocmd - Entry Point
//!
//! Translates one instruction given on the command line, or runs an
//! interactive session. Logs go to stderr so stdout carries only command
//! output and `--json` documents.

use clap::Parser;
use robocmd::command::{DryRunExecutor, ProcessExecutor, ShellExecutor, StaticRegistry};
use robocmd::core::config::{Credentials, Settings};
use robocmd::core::error::Result;
use robocmd::pipeline::Pipeline;
use robocmd::session::{SessionController, SessionOptions};
use std::io;
use std::path::PathBuf;
use std::process::ExitCode;
use tokio::runtime::{Builder, Runtime};
use tracing_subscriber::EnvFilter;

/// Natural language to robotics CLI commands
#[derive(Parser, Debug)]
#[command(name = "robocmd", version)]
#[command(about = "Translate natural language robotics instructions into robo CLI commands")]
struct Args {
    /// Instruction to translate
    query: Vec<String>,

    /// Start an interactive session
    #[arg(short, long)]
    interactive: bool,

    /// Generation backend (openai, anthropic, google)
    #[arg(short, long)]
    engine: Option<String>,

    /// Model name, optionally as provider/model
    #[arg(short, long)]
    model: Option<String>,

    /// Run validated commands without asking
    #[arg(short = 'x', long)]
    auto_execute: bool,

    /// Show intent, entities, engine and score components
    #[arg(short = 'r', long)]
    show_reasoning: bool,

    /// Print what would run instead of running it
    #[arg(long)]
    dry_run: bool,

    /// Print the translation as JSON and exit without executing
    #[arg(long)]
    json: bool,

    /// Config file (defaults to ./robocmd.toml, then ~/.config/robocmd/config.toml)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Debug logging
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> ExitCode {
    let args = Args::parse();
    init_tracing(args.verbose);

    match run(args) {
        Ok(code) => code,
        Err(e) => {
            tracing::error!("{}", e);
            eprintln!("error: {}", e);
            ExitCode::from(e.exit_status())
        }
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "robocmd=debug" } else { "robocmd=info" };
    let filter =
        EnvFilter::try_from_env("ROBOCMD_LOG").unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn run(args: Args) -> Result<ExitCode> {
    let mut settings = Settings::load(args.config.as_deref())?;
    apply_flags(&mut settings, &args);

    let credentials = Credentials::from_env();
    let registry = StaticRegistry::from_settings(&settings.registry);
    let pipeline = Pipeline::new(&settings, &credentials, &registry)?;

    let runtime = Builder::new_current_thread().enable_all().build()?;
    let query = args.query.join(" ");

    if !args.interactive && query.trim().is_empty() {
        eprintln!("Nothing to translate. Pass an instruction or use --interactive.");
        return Ok(ExitCode::from(2));
    }

    if args.json {
        let translation = runtime.block_on(pipeline.translate(&query))?;
        println!("{}", serde_json::to_string_pretty(&translation)?);
        return Ok(ExitCode::SUCCESS);
    }

    if args.show_reasoning {
        println!("{}\n", pipeline.engine_info());
    }

    let options = SessionOptions {
        auto_execute: settings.session.auto_execute,
        show_reasoning: args.show_reasoning,
    };
    let code = if settings.session.dry_run {
        drive(&pipeline, &runtime, DryRunExecutor::default(), options, args.interactive, &query)?
    } else {
        drive(&pipeline, &runtime, ShellExecutor, options, args.interactive, &query)?
    };
    Ok(code)
}

/// Command-line flags take precedence over file and environment
fn apply_flags(settings: &mut Settings, args: &Args) {
    if let Some(engine) = &args.engine {
        settings.provider.engine = Some(engine.to_lowercase());
    }
    if let Some(model) = &args.model {
        settings.provider.model = Some(model.clone());
    }
    if args.auto_execute {
        settings.session.auto_execute = true;
    }
    if args.dry_run {
        settings.session.dry_run = true;
    }
}

fn drive<E: ProcessExecutor>(
    pipeline: &Pipeline,
    runtime: &Runtime,
    executor: E,
    options: SessionOptions,
    interactive: bool,
    query: &str,
) -> io::Result<ExitCode> {
    let stdin = io::stdin();
    let stdout = io::stdout();
    let mut controller =
        SessionController::new(pipeline, runtime, stdin.lock(), stdout.lock(), executor, options);

    if interactive {
        controller.run()?;
        return Ok(ExitCode::SUCCESS);
    }

    let outcome = controller.process(query)?;
    Ok(if outcome.is_failure() {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    })
}
