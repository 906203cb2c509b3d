//! Application orchestration and command routing.
//!
//! Handles command-line argument parsing and delegates to appropriate command handlers.

use crate::commands;
use crate::config::config_path;
use crate::logging;
use anyhow::anyhow;
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{generate, Shell};
use std::io;
use std::process;

/// Writes the default config on first run.
fn check_and_run_setup() -> Result<(), anyhow::Error> {
    let config_path = config_path()?;

    let created = crate::setup::ensure_config(&config_path).map_err(|e| {
        tracing::error!("Setup failed: {e}");
        anyhow!("Setup failed: {e}")
    })?;

    if created {
        tracing::info!(
            "Setup completed for version {}",
            env!("CARGO_PKG_VERSION")
        );
    } else {
        tracing::debug!("Config found at {}", config_path.display());
    }

    Ok(())
}

/// A terminal music player with a live waveform and frequency-bar visualizer
#[derive(Parser)]
#[command(name = "vizplay")]
#[command(version)]
#[command(about = "A terminal music player with a live waveform and frequency-bar visualizer")]
#[command(long_about = "A terminal music player with a live waveform and frequency-bar visualizer.\n\nDEFAULT COMMAND:\n    If no command is specified, 'play' is used by default.\n    The --song option can be used without explicitly saying 'play'.\n\nKEYS:\n    Space        play / pause\n    n / p        next / previous song\n    Up / Down    move the selection\n    Enter        play the selected song\n    Left / Right seek 5 seconds\n    + / -        volume\n    q / Esc      quit\n\nEXAMPLES:\n    # Open the player\n    $ vizplay\n\n    # Start playing song 2 from the playlist\n    $ vizplay --song 2\n\n    # Toggle playback from another terminal\n    $ pkill -USR1 vizplay\n\n    # Edit the playlist\n    $ vizplay config")]
#[command(
    after_help = "CONFIGURATION:\n    Config file:        ~/.config/vizplay/vizplay.toml\n    Logs:               ~/.local/state/vizplay/vizplay.log.*"
)]
struct Cli {
    /// Start playing the song with this id (play default command)
    #[arg(short, long, value_name = "ID")]
    song: Option<u32>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Open the player with the live visualizer (default)
    ///
    /// Space plays and pauses, n/p skip, arrows pick and seek, q quits.
    /// Sending SIGUSR1 to the process toggles playback.
    #[command(visible_alias = "p")]
    Play {
        /// Start playing the song with this id
        #[arg(short, long, value_name = "ID")]
        song: Option<u32>,
    },

    /// Open configuration file in your preferred editor
    ///
    /// Edit the playlist, output device, and visualizer settings.
    /// Uses $EDITOR environment variable or falls back to nano/vi.
    #[command(visible_alias = "c")]
    Config,

    /// List available audio output devices
    ///
    /// Shows device IDs, names, and configurations to help configure
    /// the output device in vizplay.toml.
    #[command(name = "list-devices")]
    ListDevices,

    /// Show recent log entries from the application
    ///
    /// Display the last 50 lines of the most recent log file.
    Logs,

    /// Generate shell completion script
    ///
    /// Examples:
    ///   vizplay completions bash > vizplay.bash
    ///   vizplay completions zsh > _vizplay
    ///   vizplay completions fish > vizplay.fish
    Completions {
        /// The shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Runs the main application based on command-line arguments.
///
/// # Errors
/// - If setup fails
/// - If logging initialization fails
/// - If command execution fails
pub async fn run() -> Result<(), anyhow::Error> {
    let cli = Cli::parse();

    // Commands that need neither logging nor a config file
    match &cli.command {
        Some(Commands::Completions { shell }) => {
            generate(*shell, &mut Cli::command(), "vizplay", &mut io::stdout());
            return Ok(());
        }
        Some(Commands::ListDevices) => {
            return match commands::handle_list_devices() {
                Ok(()) => Ok(()),
                Err(e) => {
                    eprintln!("Error: {e}");
                    process::exit(1);
                }
            };
        }
        Some(Commands::Logs) => {
            return match commands::handle_logs() {
                Ok(()) => Ok(()),
                Err(e) => {
                    eprintln!("Error: {e}");
                    process::exit(1);
                }
            };
        }
        _ => {}
    }

    logging::init_logging()?;
    check_and_run_setup()?;

    match cli.command {
        None => commands::handle_play(cli.song).await?,
        // An explicit `play --song` wins over the top-level option
        Some(Commands::Play { song }) => commands::handle_play(song.or(cli.song)).await?,
        Some(Commands::Config) => commands::handle_config()?,
        Some(Commands::Completions { .. }) | Some(Commands::ListDevices) | Some(Commands::Logs) => {
            unreachable!("These commands are handled earlier")
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_song_option_without_subcommand() {
        let cli = Cli::try_parse_from(["vizplay", "--song", "3"]).unwrap();
        assert_eq!(cli.song, Some(3));
        assert!(cli.command.is_none());
    }

    #[test]
    fn test_play_subcommand() {
        let cli = Cli::try_parse_from(["vizplay", "play", "-s", "2"]).unwrap();
        match cli.command {
            Some(Commands::Play { song }) => assert_eq!(song, Some(2)),
            _ => panic!("expected play"),
        }
        assert!(Cli::try_parse_from(["vizplay", "list-devices"]).is_ok());
        assert!(Cli::try_parse_from(["vizplay", "play", "--song", "x"]).is_err());
    }
}
