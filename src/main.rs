use clap::Parser;
use face_check::cli::{self, Args, Command, ReplayArgs};
use face_check::config::Config;
use std::path::Path;
use tokio_util::sync::CancellationToken;

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .format_timestamp_millis()
        .init();
}

fn run_replay(args: &ReplayArgs, config_path: Option<&Path>) -> Result<(), String> {
    let config = Config::load(config_path).map_err(|e| e.to_string())?;

    let cancel = CancellationToken::new();
    let handler_token = cancel.clone();
    ctrlc::set_handler(move || {
        log::info!("Interrupted, tearing down");
        handler_token.cancel();
    })
    .map_err(|e| format!("Failed to set Ctrl-C handler: {}", e))?;

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|e| format!("Failed to start runtime: {}", e))?;

    let saved = runtime.block_on(cli::replay(args, &config, &cancel))?;
    if saved.is_empty() {
        println!("No face captured.");
    }
    for path in saved {
        println!("Captured: {}", path.display());
    }
    Ok(())
}

fn main() {
    let args = Args::parse();
    init_logging(args.verbose);

    let result = match &args.command {
        Command::Replay(replay) => run_replay(replay, args.config.as_deref()),
        Command::Config { action } => cli::handle_config_action(action.clone(), args.config.as_deref()),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
