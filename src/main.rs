use std::path::Path;

use anyhow::Context;
use clap::Parser;
use serde_json::Value;

use vg::{
    cli::{self, CliError, Session},
    config::{self, Config},
    lock::FileLock,
    logging,
};

fn print(output: &Value) -> anyhow::Result<()> {
    match output {
        Value::String(text) => println!("{text}"),
        other => println!("{}", serde_json::to_string_pretty(other)?),
    }
    Ok(())
}

fn main() -> anyhow::Result<()> {
    let args = cli::Args::parse();

    let base_path = config::base_path()?;
    std::fs::create_dir_all(&base_path)
        .with_context(|| format!("could not create data directory {base_path}"))?;

    // held until exit so scene and view writes of one command land together
    let _lock = FileLock::try_acquire(Path::new(&base_path))?;

    let config = Config::load_with(&base_path)?;
    let level = args.log_level.clone().unwrap_or_else(|| config.log_level.clone());
    logging::init_logging(&level);

    let _span = tracing::info_span!("vg", base_path = %base_path).entered();
    log::debug!("loaded config {config:?}");

    let mut session = Session::open(config, &base_path, args.yes)?;

    match cli::dispatch(args.command, &mut session) {
        Ok(output) => print(&output),
        Err(CliError::UserCancelled) => {
            eprintln!("{}", CliError::UserCancelled);
            Ok(())
        }
        Err(err) => Err(err.into()),
    }
}
