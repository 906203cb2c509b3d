//! The player screen.
//!
//! Loads the playlist from the config, opens the output device, and runs the
//! UI loop that drives playback and the visualizer. Supports toggling
//! play/pause from outside via the SIGUSR1 signal.

use crate::analysis::{AnalysisBuffer, SampleTap};
use crate::config::{VisualizerConfig, VizplayConfig};
use crate::playback::Player;
use crate::ui::{ErrorScreen, PlayerCommand, PlayerTui};
use crate::visualizer::{BufferKind, Visualizer};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Time the loop waits for a key before drawing the next frame.
const FRAME_INTERVAL: Duration = Duration::from_millis(16);

/// Opens the player, optionally starting the song with `song_id`.
///
/// # Errors
/// - If the configuration cannot be loaded or is invalid
/// - If the terminal UI cannot be initialized
pub async fn handle_play(song_id: Option<u32>) -> Result<(), anyhow::Error> {
    tracing::info!("=== vizplay Started ===");

    let config_data = match VizplayConfig::load().and_then(|config| {
        config.validate()?;
        Ok(config)
    }) {
        Ok(config) => config,
        Err(err) => {
            tracing::error!("Failed to load configuration: {err}");
            let error_message = format!(
                "Configuration Error:\n\n{err}\n\nPlease check your ~/.config/vizplay/vizplay.toml file and try again."
            );
            let mut error_screen = ErrorScreen::new()?;
            error_screen.show_error(&error_message)?;
            error_screen.cleanup()?;
            return Err(anyhow::anyhow!("Configuration error: {err}"));
        }
    };

    tracing::info!(
        "Configuration loaded: device={}, volume={}, fft_size={}, {} songs",
        config_data.audio.device,
        config_data.audio.volume,
        config_data.visualizer.fft_size,
        config_data.songs.len()
    );

    let tap = SampleTap::new();
    let mut player = Player::new(config_data.playlist()?, config_data.audio.volume, tap.clone());

    let mut startup_status = None;
    if let Err(e) = player.attach_output(&config_data.audio.device) {
        tracing::warn!("Audio output unavailable, playback will be silent: {}", e);
        startup_status = Some(format!("No audio output: {e}"));
    }

    let mut visualizer = match attach_visualizer(&config_data.visualizer, tap, &mut player) {
        Ok(vis) => Some(vis),
        Err(e) => {
            tracing::warn!("Visualization disabled: {}", e);
            if startup_status.is_none() {
                startup_status = Some(format!("Visualization disabled: {e}"));
            }
            None
        }
    };

    let mut tui = PlayerTui::new(&config_data.ui.taglines)?;
    if let Some(status) = startup_status {
        tui.set_status(status);
    }

    let toggle_requested = Arc::new(AtomicBool::new(false));
    signal_hook::flag::register(signal_hook::consts::SIGUSR1, Arc::clone(&toggle_requested))
        .map_err(|e| anyhow::anyhow!("Failed to register signal handler: {e}"))?;

    if let Some(id) = song_id {
        if player.playlist().position_of(id).is_some() {
            report(&mut tui, player.play_by_id(id));
        } else {
            tui.set_status(format!("No song with id {id}"));
        }
    }

    tracing::debug!("Entering player loop");

    loop {
        if toggle_requested.swap(false, Ordering::Relaxed) {
            tracing::info!("Received SIGUSR1: toggling playback");
            report(&mut tui, player.toggle());
        }

        match tui.handle_input(FRAME_INTERVAL)? {
            PlayerCommand::Continue => {}
            PlayerCommand::Quit => {
                tracing::info!("Player closed by user");
                break;
            }
            PlayerCommand::TogglePlay => report(&mut tui, player.toggle()),
            PlayerCommand::Next => report(&mut tui, player.next()),
            PlayerCommand::Prev => report(&mut tui, player.prev()),
            PlayerCommand::PlaySelected(index) => report(&mut tui, player.play_index(index)),
            PlayerCommand::Seek(seconds) => player.seek_by(seconds),
            PlayerCommand::SeekPercent(percent) => player.seek_percent(percent),
            PlayerCommand::Volume(delta) => {
                let volume = player.volume() + delta;
                player.set_volume(volume);
            }
        }

        player.poll();
        if let Some(vis) = visualizer.as_mut() {
            vis.tick();
        }

        tui.render(&player, visualizer.as_ref())?;
    }

    tui.cleanup()?;
    Ok(())
}

/// Builds the visualizer and lets the player drive its frame loop.
///
/// # Errors
/// - If the analyser settings are invalid
fn attach_visualizer(
    config: &VisualizerConfig,
    tap: SampleTap,
    player: &mut Player,
) -> anyhow::Result<Visualizer> {
    let mut vis = Visualizer::new(
        config.analyser_settings(),
        tap,
        config.wave_size(),
        config.bar_size(),
    )?;
    attach_trace_hooks(&mut vis);
    player.set_frame_loop(vis.handle());
    Ok(vis)
}

/// Shows a playback error in the footer, or clears the last one.
fn report(tui: &mut PlayerTui, result: anyhow::Result<()>) {
    match result {
        Ok(()) => tui.clear_status(),
        Err(e) => tui.set_status(e.to_string()),
    }
}

/// Traces the loudest bin and a frame count now and then.
fn attach_trace_hooks(vis: &mut Visualizer) {
    vis.on_buffer_updated(|kind, buffer: &AnalysisBuffer| {
        if kind == BufferKind::FrequencyDomain {
            if let Some((bin, level)) = buffer.iter().enumerate().max_by_key(|&(_, level)| *level) {
                tracing::trace!("Peak bin {} at level {}", bin, level);
            }
        }
    });

    let mut frame_count = 0u64;
    vis.on_frame_ready(move |_, _| {
        frame_count += 1;
        if frame_count.is_multiple_of(600) {
            tracing::debug!("Rendered {} visualizer frames", frame_count);
        }
    });
}
