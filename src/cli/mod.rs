pub mod process;

use std::{env, path::PathBuf};

use anyhow::Result;
use clap::{Parser, Subcommand};
use process::signal_running_trackers;
use sysinfo::Signal;
use tracing::level_filters::LevelFilter;

use crate::{
    tracker::{
        start_tracker,
        storage::log_store::{JsonLogStore, LogStore, DEFAULT_LOG_FILE},
        TrackerConfig,
    },
    utils::{
        clock::DefaultClock,
        dir::{create_application_default_path, ensure_dir},
        logging::{enable_logging, LogSettings},
    },
};

#[derive(Parser, Debug)]
#[command(name = "Quartercheck", version, long_about = None)]
#[command(about = "Asks what you did and what's next every 15 minutes", long_about = None)]
struct Args {
    #[command(subcommand)]
    commands: Commands,
    #[arg(
        long,
        global = true,
        help = "Application directory for logs. By default $XDG_STATE_HOME/quartercheck or $HOME/.local/state/quartercheck"
    )]
    dir: Option<PathBuf>,
    #[arg(long = "log-filter", global = true, help = "Log level, overrides RUST_LOG")]
    log: Option<LevelFilter>,
    /// This option is for debugging purposes only. Log lines end up between the prompts.
    #[arg(long = "log-console", global = true)]
    log_console: bool,
}

#[derive(Subcommand, Debug)]
#[command(version, about, long_about = None)]
enum Commands {
    #[command(about = "Run the tracker in this terminal")]
    Run {
        #[arg(long, default_value = DEFAULT_LOG_FILE, help = "Productivity log file")]
        file: PathBuf,
        #[arg(long, help = "Don't ask right after launch, wait for the next quarter hour")]
        no_initial_prompt: bool,
    },
    #[command(about = "Ask running trackers to show a check-in now")]
    Prompt {},
    #[command(about = "Stop running trackers")]
    Stop {},
    #[command(about = "Print the latest recorded priorities")]
    Latest {
        #[arg(long, default_value = DEFAULT_LOG_FILE, help = "Productivity log file")]
        file: PathBuf,
    },
}

impl Commands {
    fn name(&self) -> &'static str {
        match self {
            Commands::Run { .. } => "run",
            Commands::Prompt {} => "prompt",
            Commands::Stop {} => "stop",
            Commands::Latest { .. } => "latest",
        }
    }
}

pub async fn run_cli() -> Result<()> {
    let args = Args::parse();

    let app_dir = match args.dir {
        Some(dir) => ensure_dir(dir)?,
        None => create_application_default_path()?,
    };
    enable_logging(LogSettings {
        file_prefix: args.commands.name(),
        application_dir: &app_dir,
        level: args.log,
        console: args.log_console,
    })?;

    match args.commands {
        Commands::Run {
            file,
            no_initial_prompt,
        } => {
            start_tracker(TrackerConfig {
                log_file: file,
                initial_prompt: !no_initial_prompt,
                ..Default::default()
            })
            .await
        }
        Commands::Prompt {} => {
            let reached = signal_running_trackers(&env::current_exe()?, Signal::User1, false);
            report(reached, "Asked", " to show a check-in");
            Ok(())
        }
        Commands::Stop {} => {
            let reached = signal_running_trackers(&env::current_exe()?, Signal::Term, true);
            report(reached, "Stopped", "");
            Ok(())
        }
        Commands::Latest { file } => {
            let document = JsonLogStore::new(file, Box::new(DefaultClock)).load().await;
            println!("{}", document.latest_priorities());
            Ok(())
        }
    }
}

fn report(reached: usize, verb: &str, suffix: &str) {
    if reached == 0 {
        println!("No running tracker found");
    } else {
        println!("{verb} {reached} tracker(s){suffix}");
    }
}
