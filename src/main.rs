use anyhow::Result;
use clap::Parser;
use std::process::ExitCode;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

mod cli;
mod workflow;

use cli::{Command, RootArgs};

fn init_tracing(log_level: Option<&str>) {
    let filter = match log_level {
        Some(level) => EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new("warn")),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
    };
    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();
}

fn exit_code(ok: bool) -> ExitCode {
    if ok {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

fn main() -> Result<ExitCode> {
    let args = RootArgs::parse();
    init_tracing(args.log_level.as_deref());

    match args.command {
        Command::Init(args) => workflow::run_init(args).map(|()| ExitCode::SUCCESS),
        Command::Check(args) => workflow::run_check(args).map(exit_code),
        Command::Impls(args) => workflow::run_impls(args).map(|()| ExitCode::SUCCESS),
        Command::Fix(args) => workflow::run_fix(args).map(exit_code),
    }
}
