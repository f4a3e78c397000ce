use clap::{Parser, Subcommand};
use displayctl_core::{ConfigStore, DisplayConfig, commands, script};
use std::thread;
use std::time::Duration;
use thiserror::Error;

#[derive(Parser, Debug)]
#[command(author, version, about = "Apply persisted display settings without the GUI", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: ApplyCommand,
}

#[derive(Subcommand, Debug)]
enum ApplyCommand {
    /// Apply the persisted settings to the running session.
    Apply,
    /// Print the persisted configuration as JSON.
    Show,
    /// Regenerate the startup script from the persisted configuration.
    RenderScript {
        /// Print the script to stdout instead of writing it.
        #[arg(long)]
        stdout: bool,
    },
}

#[derive(Debug, Error)]
enum ApplyError {
    #[error("could not determine the user configuration directory")]
    NoConfigDir,

    #[error(transparent)]
    Store(#[from] displayctl_core::StoreError),

    #[error("failed to encode configuration: {0}")]
    Encode(#[from] serde_json::Error),
}

impl ApplyError {
    fn exit_code(&self) -> i32 {
        match self {
            ApplyError::NoConfigDir => 2,
            ApplyError::Store(_) => 3,
            ApplyError::Encode(_) => 4,
        }
    }
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();
    if let Err(err) = execute(cli.command) {
        eprintln!("{err}");
        std::process::exit(err.exit_code());
    }
}

fn execute(command: ApplyCommand) -> Result<(), ApplyError> {
    let store = ConfigStore::default_paths().ok_or(ApplyError::NoConfigDir)?;
    match command {
        ApplyCommand::Apply => {
            apply(&store.load());
            Ok(())
        }
        ApplyCommand::Show => {
            println!("{}", serde_json::to_string_pretty(&store.load())?);
            Ok(())
        }
        ApplyCommand::RenderScript { stdout } => {
            let config = store.load();
            if stdout {
                print!("{}", script::render(&config));
            } else {
                script::write(store.script_path(), &config)?;
                log::info!("wrote {:?}", store.script_path());
            }
            Ok(())
        }
    }
}

/// Same ordering as the generated startup script: brightness first, then a
/// clean kill of any color temperature process before a conditional restart,
/// then the transform.
fn apply(config: &DisplayConfig) {
    commands::set_brightness(config.brightness_percent);
    commands::kill_color_temp_by_name();
    thread::sleep(Duration::from_millis(200));
    if config.night_light_on {
        commands::start_color_temp_detached(config.manual_temp);
    }
    commands::set_monitor_transform(config.monitor_transform);
}
