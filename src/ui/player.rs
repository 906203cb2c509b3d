//! Terminal user interface for the player.
//!
//! Layout: a header with the typing tagline, the song list beside the two
//! visualizer canvases, a progress gauge, and a status footer.

use crate::playback::{format_time, Player};
use crate::render::{DisplayList, Surface};
use crate::ui::typing::TypingEffect;
use crate::visualizer::Visualizer;
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    prelude::*,
    symbols::Marker,
    widgets::{canvas::Canvas, Block, BorderType, Gauge, List, ListItem, ListState, Paragraph},
};
use std::io::{stdout, Stdout};
use std::time::{Duration, Instant};

const ACCENT: Color = Color::Rgb(200, 50, 200);
const BACKGROUND: Color = Color::Rgb(20, 20, 30);
const TEXT: Color = Color::Rgb(185, 207, 212);

/// Seconds moved by the left and right arrows.
pub const SEEK_STEP_SECS: f64 = 5.0;
/// Volume change of `+` and `-`.
pub const VOLUME_STEP: f32 = 0.05;

const KEY_HELP: &str = " ␣ play  n/p skip  ↑↓ ⏎ pick  ←→ 0-9 seek  +/- vol  q quit ";

/// User input command while the player is open.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PlayerCommand {
    /// No key pressed, or a key handled by the UI itself
    Continue,
    /// Leave the player (q, Escape, Ctrl+C)
    Quit,
    /// Play or pause (Space)
    TogglePlay,
    Next,
    Prev,
    /// Play the highlighted song (Enter)
    PlaySelected(usize),
    /// Relative seek in seconds (left and right arrows)
    Seek(f64),
    /// Jump to a percentage of the song (0 to 9 for 0 % to 90 %)
    SeekPercent(f64),
    /// Relative volume change (+ and -)
    Volume(f32),
}

/// What a key means before the song selection is applied.
#[derive(Debug, Clone, Copy, PartialEq)]
enum KeyAction {
    Command(PlayerCommand),
    SelectUp,
    SelectDown,
    PlaySelection,
}

/// Terminal UI for the player.
pub struct PlayerTui {
    terminal: Terminal<CrosstermBackend<Stdout>>,
    list_state: ListState,
    song_count: usize,
    /// Player index seen on the last render, to follow track changes
    last_current: Option<usize>,
    typing: TypingEffect,
    status: Option<String>,
    active: bool,
}

impl PlayerTui {
    /// Creates a new TUI instance and enters alternate screen mode.
    ///
    /// # Errors
    /// - If terminal cannot be initialized
    /// - If raw mode cannot be enabled
    /// - If alternate screen cannot be entered
    pub fn new(taglines: &[String]) -> anyhow::Result<Self> {
        enable_raw_mode()?;
        let mut stdout = stdout();
        execute!(stdout, EnterAlternateScreen)?;

        let backend = CrosstermBackend::new(stdout);
        let terminal = Terminal::new(backend)?;

        Ok(PlayerTui {
            terminal,
            list_state: ListState::default().with_selected(Some(0)),
            song_count: 0,
            last_current: None,
            typing: TypingEffect::new(taglines),
            status: None,
            active: true,
        })
    }

    /// Shows a message in the footer until it is replaced or cleared.
    pub fn set_status(&mut self, message: impl Into<String>) {
        let message = message.into();
        tracing::debug!("Status: {}", message);
        self.status = Some(message);
    }

    pub fn clear_status(&mut self) {
        self.status = None;
    }

    /// Draws one frame.
    ///
    /// # Errors
    /// - If terminal rendering fails
    pub fn render(&mut self, player: &Player, visualizer: Option<&Visualizer>) -> anyhow::Result<()> {
        self.typing.tick(Instant::now());
        self.song_count = player.playlist().len();

        // Follow the player when it changes songs
        let current = player.current_index();
        if self.last_current != Some(current) {
            self.last_current = Some(current);
            self.list_state.select(Some(current));
        }

        let tagline = self.typing.text();
        let status = self.status.as_deref();
        let list_state = &mut self.list_state;

        self.terminal.draw(|frame| {
            let area = frame.area();
            frame.render_widget(Block::default().style(Style::default().bg(BACKGROUND)), area);

            let [header_area, body_area, progress_area, footer_area] = Layout::vertical([
                Constraint::Length(1),
                Constraint::Min(6),
                Constraint::Length(1),
                Constraint::Length(1),
            ])
            .areas(area);

            let [list_area, vis_area] =
                Layout::horizontal([Constraint::Percentage(35), Constraint::Percentage(65)])
                    .areas(body_area);

            frame.render_widget(Paragraph::new(header_line(&tagline)), header_area);
            frame.render_stateful_widget(song_list(player), list_area, list_state);

            match visualizer {
                Some(vis) => {
                    let [wave_area, bars_area] =
                        Layout::vertical([Constraint::Percentage(50), Constraint::Percentage(50)])
                            .areas(vis_area);
                    frame.render_widget(surface_canvas(" Waveform ", vis.wave()), wave_area);
                    frame.render_widget(surface_canvas(" Spectrum ", vis.bars()), bars_area);
                }
                None => {
                    let notice = Paragraph::new("Visualization unavailable")
                        .alignment(Alignment::Center)
                        .style(Style::default().fg(Color::DarkGray))
                        .block(panel(" Visualizer "));
                    frame.render_widget(notice, vis_area);
                }
            }

            frame.render_widget(progress(player), progress_area);
            frame.render_widget(
                Paragraph::new(footer_line(player, status))
                    .style(Style::default().fg(TEXT).bg(Color::Rgb(0, 0, 0))),
                footer_area,
            );
        })?;

        Ok(())
    }

    /// Polls for a key press for up to `timeout`.
    ///
    /// Selection keys are handled here and yield `Continue`.
    ///
    /// # Errors
    /// - If event polling fails
    pub fn handle_input(&mut self, timeout: Duration) -> anyhow::Result<PlayerCommand> {
        if event::poll(timeout)? {
            if let Event::Key(key) = event::read()? {
                if key.kind != KeyEventKind::Press {
                    return Ok(PlayerCommand::Continue);
                }
                return Ok(match key_action(key) {
                    Some(KeyAction::Command(command)) => {
                        tracing::debug!("Key {:?}: {:?}", key.code, command);
                        command
                    }
                    Some(KeyAction::SelectUp) => {
                        self.move_selection(-1);
                        PlayerCommand::Continue
                    }
                    Some(KeyAction::SelectDown) => {
                        self.move_selection(1);
                        PlayerCommand::Continue
                    }
                    Some(KeyAction::PlaySelection) => {
                        PlayerCommand::PlaySelected(self.list_state.selected().unwrap_or(0))
                    }
                    None => PlayerCommand::Continue,
                });
            }
        }
        Ok(PlayerCommand::Continue)
    }

    fn move_selection(&mut self, delta: isize) {
        let selected = self.list_state.selected().unwrap_or(0);
        self.list_state
            .select(Some(step_selection(selected, self.song_count, delta)));
    }

    /// Cleans up terminal state and exits alternate screen mode.
    ///
    /// # Errors
    /// - If terminal mode cannot be disabled
    /// - If cursor cannot be shown
    pub fn cleanup(&mut self) -> anyhow::Result<()> {
        if !self.active {
            return Ok(());
        }
        self.active = false;
        disable_raw_mode()?;
        execute!(self.terminal.backend_mut(), LeaveAlternateScreen)?;
        self.terminal.show_cursor()?;
        Ok(())
    }
}

impl Drop for PlayerTui {
    fn drop(&mut self) {
        let _ = self.cleanup();
    }
}

fn key_action(key: KeyEvent) -> Option<KeyAction> {
    use KeyAction::Command;

    if key.modifiers.contains(KeyModifiers::CONTROL) {
        return match key.code {
            KeyCode::Char('c') => Some(Command(PlayerCommand::Quit)),
            _ => None,
        };
    }

    Some(match key.code {
        KeyCode::Char(' ') => Command(PlayerCommand::TogglePlay),
        KeyCode::Char('n') => Command(PlayerCommand::Next),
        KeyCode::Char('p') => Command(PlayerCommand::Prev),
        KeyCode::Left => Command(PlayerCommand::Seek(-SEEK_STEP_SECS)),
        KeyCode::Right => Command(PlayerCommand::Seek(SEEK_STEP_SECS)),
        KeyCode::Char(digit @ '0'..='9') => {
            let tenths = digit.to_digit(10).unwrap_or(0);
            Command(PlayerCommand::SeekPercent(f64::from(tenths * 10)))
        }
        KeyCode::Char('+') | KeyCode::Char('=') => Command(PlayerCommand::Volume(VOLUME_STEP)),
        KeyCode::Char('-') => Command(PlayerCommand::Volume(-VOLUME_STEP)),
        KeyCode::Char('q') | KeyCode::Esc => Command(PlayerCommand::Quit),
        KeyCode::Up => KeyAction::SelectUp,
        KeyCode::Down => KeyAction::SelectDown,
        KeyCode::Enter => KeyAction::PlaySelection,
        _ => return None,
    })
}

/// Moves a list selection by `delta`, clamped to the list.
fn step_selection(selected: usize, len: usize, delta: isize) -> usize {
    if len == 0 {
        return 0;
    }
    selected.saturating_add_signed(delta).min(len - 1)
}

fn panel(title: &str) -> Block<'_> {
    Block::bordered()
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(ACCENT))
        .title(title)
}

fn header_line(tagline: &str) -> Line<'static> {
    Line::from(vec![
        Span::styled(" vizplay ", Style::default().fg(ACCENT).add_modifier(Modifier::BOLD)),
        Span::styled(tagline.to_string(), Style::default().fg(TEXT)),
        Span::styled("▌", Style::default().fg(ACCENT)),
    ])
}

fn song_list(player: &Player) -> List<'static> {
    let playing = player.is_playing();
    let items: Vec<ListItem> = player
        .playlist()
        .iter()
        .enumerate()
        .map(|(index, song)| {
            let marker = if index == player.current_index() && playing {
                "♪ "
            } else {
                "  "
            };
            let mut spans = vec![
                Span::styled(marker, Style::default().fg(ACCENT)),
                Span::styled(song.title.clone(), Style::default().fg(TEXT)),
                Span::styled(format!("  {}", song.artist), Style::default().fg(Color::DarkGray)),
            ];
            if !song.genre.is_empty() {
                spans.push(Span::styled(
                    format!(" · {}", song.genre),
                    Style::default().fg(Color::DarkGray),
                ));
            }
            spans.push(Span::styled(
                format!("  {}", song_length(player, index)),
                Style::default().fg(ACCENT),
            ));
            ListItem::new(Line::from(spans))
        })
        .collect();

    List::new(items)
        .block(panel(" Songs ").title_bottom(KEY_HELP))
        .highlight_style(Style::default().bg(Color::Rgb(60, 20, 60)))
        .highlight_symbol("›")
}

/// Length of a song once it has been decoded.
fn song_length(player: &Player, index: usize) -> String {
    player
        .song_duration(index)
        .map_or_else(|| "-:--".to_string(), format_time)
}

fn surface_canvas<'a>(title: &'a str, surface: &'a DisplayList) -> impl Widget + 'a {
    Canvas::default()
        .block(panel(title))
        .marker(Marker::HalfBlock)
        .background_color(BACKGROUND)
        .x_bounds([0.0, surface.width()])
        .y_bounds([0.0, surface.height()])
        .paint(move |ctx| ctx.draw(surface))
}

fn progress(player: &Player) -> Gauge<'static> {
    let (label, ratio) = match player.progress() {
        Some((position, duration)) => (
            format!("{} / {}", format_time(position), format_time(duration)),
            (player.progress_percent() / 100.0).clamp(0.0, 1.0),
        ),
        None => ("0:00 / 0:00".to_string(), 0.0),
    };

    Gauge::default()
        .gauge_style(Style::default().fg(ACCENT).bg(Color::Rgb(40, 40, 55)))
        .use_unicode(true)
        .ratio(ratio)
        .label(label)
}

fn footer_line(player: &Player, status: Option<&str>) -> Line<'static> {
    let indicator = if player.is_playing() {
        Span::styled("▶ ", Style::default().fg(Color::Green))
    } else {
        Span::styled("⏸ ", Style::default().fg(Color::Yellow))
    };

    let now_playing = match player.current_song() {
        Some(song) => format!("{} - {}", song.title, song.artist),
        None => "No songs in playlist".to_string(),
    };

    let output = match player.output_name() {
        Some(name) => name.to_string(),
        None => "no output device".to_string(),
    };

    let mut spans = vec![
        indicator,
        Span::raw(now_playing),
        Span::raw(format!(" / vol {:.0}%", player.volume() * 100.0)),
        Span::styled(format!(" / {output}"), Style::default().fg(Color::DarkGray)),
    ];

    if let Some(status) = status {
        spans.push(Span::styled(
            format!("  {status}"),
            Style::default().fg(Color::Rgb(255, 255, 255)).bg(Color::Red),
        ));
    }

    Line::from(spans)
}
