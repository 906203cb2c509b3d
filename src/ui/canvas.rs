//! Terminal rendering of recorded draw commands.
//!
//! [`DisplayList`] uses canvas coordinates with y growing downwards; the
//! ratatui canvas grows y upwards, so every point is flipped against the
//! surface height before it reaches the painter.

use crate::render::{DisplayList, DrawCommand, PathSegment, Rgb, Surface};
use ratatui::widgets::canvas::{Line, Painter, Shape};

impl Shape for DisplayList {
    fn draw(&self, painter: &mut Painter) {
        let surface_height = self.height();

        for command in self.commands() {
            match command {
                DrawCommand::FillRect {
                    x,
                    y,
                    width,
                    height,
                    color,
                } => fill_rect(painter, self, (*x, *y, *width, *height), *color),
                DrawCommand::Stroke { path, color, .. } => {
                    for pair in path.windows(2) {
                        let PathSegment::LineTo(x2, y2) = pair[1] else {
                            continue;
                        };
                        let (x1, y1) = pair[0].point();
                        Line {
                            x1,
                            y1: surface_height - y1,
                            x2,
                            y2: surface_height - y2,
                            color: (*color).into(),
                        }
                        .draw(painter);
                    }
                }
            }
        }
    }
}

/// Paints every grid cell the rectangle covers, clipped to the surface.
fn fill_rect(painter: &mut Painter, surface: &DisplayList, rect: (f64, f64, f64, f64), color: Rgb) {
    let Some((left, top, right, bottom)) = clip(surface, rect) else {
        return;
    };
    let surface_height = surface.height();

    let (Some((gx1, gy1)), Some((gx2, gy2))) = (
        painter.get_point(left, surface_height - top),
        painter.get_point(right, surface_height - bottom),
    ) else {
        return;
    };

    let color = color.into();
    for gy in gy1.min(gy2)..=gy1.max(gy2) {
        for gx in gx1.min(gx2)..=gx1.max(gx2) {
            painter.paint(gx, gy, color);
        }
    }
}

/// Intersects `(x, y, width, height)` with the surface. Negative sizes
/// extend up or left, like a 2D canvas. Returns `(left, top, right, bottom)`.
fn clip(surface: &DisplayList, (x, y, width, height): (f64, f64, f64, f64)) -> Option<(f64, f64, f64, f64)> {
    let (x1, x2) = if width < 0.0 { (x + width, x) } else { (x, x + width) };
    let (y1, y2) = if height < 0.0 { (y + height, y) } else { (y, y + height) };

    let left = x1.max(0.0);
    let top = y1.max(0.0);
    let right = x2.min(surface.width());
    let bottom = y2.min(surface.height());

    if right <= left || bottom <= top {
        return None;
    }
    Some((left, top, right, bottom))
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratatui::buffer::Buffer;
    use ratatui::layout::Rect;
    use ratatui::style::Color;
    use ratatui::symbols::Marker;
    use ratatui::widgets::canvas::Canvas;
    use ratatui::widgets::Widget;

    fn render(list: &DisplayList, cols: u16, rows: u16) -> Buffer {
        let area = Rect::new(0, 0, cols, rows);
        let mut buffer = Buffer::empty(area);
        Canvas::default()
            .marker(Marker::HalfBlock)
            .x_bounds([0.0, list.width()])
            .y_bounds([0.0, list.height()])
            .paint(|ctx| ctx.draw(list))
            .render(area, &mut buffer);
        buffer
    }

    #[test]
    fn test_clip_to_surface() {
        let list = DisplayList::new(100, 50);
        assert_eq!(clip(&list, (-10.0, 10.0, 30.0, 100.0)), Some((0.0, 10.0, 20.0, 50.0)));
        assert_eq!(clip(&list, (10.0, 50.0, 5.0, -20.0)), Some((10.0, 30.0, 15.0, 50.0)));
        assert_eq!(clip(&list, (120.0, 0.0, 5.0, 5.0)), None);
        assert_eq!(clip(&list, (10.0, 10.0, 0.0, 5.0)), None);
    }

    #[test]
    fn test_background_fill_covers_canvas() {
        let mut list = DisplayList::new(300, 150);
        list.fill_rect(0.0, 0.0, 300.0, 150.0, Rgb::new(20, 20, 30));

        let buffer = render(&list, 10, 5);
        for cell in buffer.content() {
            assert_eq!(cell.fg, Color::Rgb(20, 20, 30));
        }
    }

    #[test]
    fn test_bar_is_drawn_from_bottom() {
        let mut list = DisplayList::new(100, 100);
        list.fill_rect(0.0, 50.0, 100.0, 50.0, Rgb::new(255, 0, 0));

        let buffer = render(&list, 4, 4);
        // Top rows stay empty, bottom rows are painted
        assert_eq!(buffer[(0, 0)].fg, Color::Reset);
        assert_eq!(buffer[(0, 3)].fg, Color::Rgb(255, 0, 0));
    }

    #[test]
    fn test_stroke_is_painted() {
        let mut list = DisplayList::new(100, 100);
        list.begin_path();
        list.move_to(0.0, 50.0);
        list.line_to(100.0, 50.0);
        list.stroke(Rgb::new(200, 50, 200), 2.0);

        let buffer = render(&list, 10, 10);
        let painted = buffer
            .content()
            .iter()
            .filter(|cell| cell.fg == Color::Rgb(200, 50, 200))
            .count();
        assert_eq!(painted, 10);
    }
}
