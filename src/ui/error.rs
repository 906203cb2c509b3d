//! Full-screen error display.
//!
//! Used when the player cannot start at all, for example when the config
//! file is invalid. Waits for a key press before handing the terminal back.

use crossterm::{
    event::{self, Event},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    prelude::*,
    widgets::{Block, BorderType, Paragraph, Wrap},
};
use std::io::{self, Stdout};

const BACKGROUND: Color = Color::Rgb(20, 20, 30);
const ACCENT: Color = Color::Rgb(200, 50, 200);

/// Error screen for displaying human-readable error messages.
pub struct ErrorScreen {
    terminal: Terminal<CrosstermBackend<Stdout>>,
    active: bool,
}

impl ErrorScreen {
    /// Creates a new error screen and enters alternate screen mode.
    ///
    /// # Errors
    /// - If terminal cannot be initialized
    /// - If raw mode cannot be enabled
    /// - If alternate screen cannot be entered
    pub fn new() -> anyhow::Result<Self> {
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen)?;

        let backend = CrosstermBackend::new(stdout);
        let terminal = Terminal::new(backend)?;

        Ok(ErrorScreen {
            terminal,
            active: true,
        })
    }

    /// Shows `error_message` in a centered panel until a key is pressed.
    ///
    /// # Errors
    /// - If terminal rendering fails
    pub fn show_error(&mut self, error_message: &str) -> anyhow::Result<()> {
        loop {
            self.terminal.draw(|frame| {
                let area = frame.area();
                frame.render_widget(Block::default().style(Style::default().bg(BACKGROUND)), area);

                let mut lines = vec![Line::from("")];
                lines.extend(message_lines(error_message));
                lines.push(Line::from(""));
                lines.push(Line::from(Span::styled(
                    "Press any key to exit",
                    Style::default().fg(Color::DarkGray),
                )));

                let panel = Paragraph::new(lines)
                .alignment(Alignment::Center)
                .wrap(Wrap { trim: true })
                .block(
                    Block::bordered()
                        .border_type(BorderType::Rounded)
                        .border_style(Style::default().fg(ACCENT))
                        .title(" vizplay ")
                        .title_alignment(Alignment::Center),
                )
                .style(Style::default().bg(BACKGROUND));

                frame.render_widget(panel, panel_area(area, error_message));
            })?;

            if event::poll(std::time::Duration::from_millis(100))? {
                if let Event::Key(_) = event::read()? {
                    break;
                }
            }
        }

        Ok(())
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

impl Drop for ErrorScreen {
    fn drop(&mut self) {
        let _ = self.cleanup();
    }
}

/// One styled line per line of the message, blank lines included.
fn message_lines(message: &str) -> Vec<Line<'_>> {
    message
        .lines()
        .map(|line| Line::from(Span::styled(line, Style::default().fg(Color::Rgb(255, 255, 255)))))
        .collect()
}

/// Centered panel at 80% of the width, tall enough for the wrapped message.
fn panel_area(area: Rect, message: &str) -> Rect {
    let width = (area.width * 80 / 100).max(1);
    let text_width = width.saturating_sub(4).max(1) as usize;
    let wrapped_lines = message
        .lines()
        .map(|line| line.chars().count().div_ceil(text_width).max(1))
        .sum::<usize>()
        .max(1) as u16;
    // Borders, padding line, message, spacer, hint
    let height = (wrapped_lines + 5).min(area.height);

    Rect {
        x: area.x + (area.width - width) / 2,
        y: area.y + (area.height - height) / 2,
        width,
        height,
    }
}
