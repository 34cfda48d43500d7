mod cli;
mod commands;
mod error_fmt;
mod logging;

use clap::Parser;
use cli::{Cli, JSON_MODE};
use error_fmt::{exit_code_for_error, format_error_json, humanize};
use eyre::WrapErr;

fn run(cli: Cli) -> eyre::Result<i32> {
    let cfg = match &cli.config {
        Some(path) => profile_config::load_file(path)?,
        None => profile_config::Config::default(),
    };
    cfg.validate().wrap_err("invalid configuration")?;

    logging::init_tracing(cli.log_level.as_deref(), cli.json, &cfg.logging)?;
    tracing::debug!(config = ?cli.config, "configuration loaded");

    commands::dispatch(&cli.cmd, &cfg, cli.json)
}

fn main() {
    let _ = color_eyre::install();
    let cli = Cli::parse();
    let _ = JSON_MODE.set(cli.json);

    let code = match run(cli) {
        Ok(code) => code,
        Err(e) => {
            if JSON_MODE.get().copied().unwrap_or(false) {
                eprintln!("{}", format_error_json(&e));
            } else {
                eprintln!("{}", humanize(&e));
            }
            exit_code_for_error(&e)
        }
    };
    std::process::exit(code);
}
