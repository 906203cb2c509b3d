//! Drawing surface abstraction and the recording backend.

/// 8-bit RGB colour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }
}

impl From<Rgb> for ratatui::style::Color {
    fn from(color: Rgb) -> Self {
        ratatui::style::Color::Rgb(color.r, color.g, color.b)
    }
}

/// Minimal 2D drawing API the visualizer needs.
///
/// Coordinates follow the canvas convention: origin at the top-left corner,
/// y growing downward, units in surface pixels.
pub trait Surface {
    fn width(&self) -> f64;
    fn height(&self) -> f64;
    fn fill_rect(&mut self, x: f64, y: f64, width: f64, height: f64, color: Rgb);
    /// Discards the path under construction.
    fn begin_path(&mut self);
    fn move_to(&mut self, x: f64, y: f64);
    fn line_to(&mut self, x: f64, y: f64);
    /// Strokes the current path once.
    fn stroke(&mut self, color: Rgb, line_width: f64);
}

/// One element of a path.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PathSegment {
    MoveTo(f64, f64),
    LineTo(f64, f64),
}

impl PathSegment {
    pub fn point(&self) -> (f64, f64) {
        match *self {
            PathSegment::MoveTo(x, y) | PathSegment::LineTo(x, y) => (x, y),
        }
    }
}

/// A recorded drawing command.
#[derive(Debug, Clone, PartialEq)]
pub enum DrawCommand {
    FillRect {
        x: f64,
        y: f64,
        width: f64,
        height: f64,
        color: Rgb,
    },
    Stroke {
        path: Vec<PathSegment>,
        color: Rgb,
        line_width: f64,
    },
}

/// Surface that records what is drawn on it.
///
/// A fill covering the whole surface replaces everything recorded so far,
/// so a list never grows across frames.
#[derive(Debug, Clone, PartialEq)]
pub struct DisplayList {
    width: f64,
    height: f64,
    commands: Vec<DrawCommand>,
    path: Vec<PathSegment>,
}

impl DisplayList {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width: width as f64,
            height: height as f64,
            commands: Vec::new(),
            path: Vec::new(),
        }
    }

    pub fn commands(&self) -> &[DrawCommand] {
        &self.commands
    }

    /// Paths of every stroke, in draw order.
    #[cfg(test)]
    pub fn strokes(&self) -> impl Iterator<Item = &[PathSegment]> {
        self.commands.iter().filter_map(|command| match command {
            DrawCommand::Stroke { path, .. } => Some(path.as_slice()),
            DrawCommand::FillRect { .. } => None,
        })
    }

    fn covers_surface(&self, x: f64, y: f64, width: f64, height: f64) -> bool {
        x <= 0.0 && y <= 0.0 && x + width >= self.width && y + height >= self.height
    }
}

impl Surface for DisplayList {
    fn width(&self) -> f64 {
        self.width
    }

    fn height(&self) -> f64 {
        self.height
    }

    fn fill_rect(&mut self, x: f64, y: f64, width: f64, height: f64, color: Rgb) {
        if self.covers_surface(x, y, width, height) {
            self.commands.clear();
        }
        self.commands.push(DrawCommand::FillRect {
            x,
            y,
            width,
            height,
            color,
        });
    }

    fn begin_path(&mut self) {
        self.path.clear();
    }

    fn move_to(&mut self, x: f64, y: f64) {
        self.path.push(PathSegment::MoveTo(x, y));
    }

    fn line_to(&mut self, x: f64, y: f64) {
        // A path with no current point starts at the first line_to
        if self.path.is_empty() {
            self.path.push(PathSegment::MoveTo(x, y));
        } else {
            self.path.push(PathSegment::LineTo(x, y));
        }
    }

    fn stroke(&mut self, color: Rgb, line_width: f64) {
        if self.path.is_empty() {
            return;
        }
        self.commands.push(DrawCommand::Stroke {
            path: self.path.clone(),
            color,
            line_width,
        });
    }
}
