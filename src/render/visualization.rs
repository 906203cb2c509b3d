//! Waveform and frequency-bar rendering.
//!
//! Both views are full redraws: clear to the background, then paint the
//! whole buffer. Nothing carries over between frames.

use super::surface::{Rgb, Surface};
use crate::analysis::AnalysisBuffer;
use palette::{FromColor, Hsl, Srgb};

/// Renders analysis buffers onto surfaces.
#[derive(Debug, Default, Clone, Copy)]
pub struct VisualizationRenderer;

impl VisualizationRenderer {
    pub const BACKGROUND: Rgb = Rgb::new(20, 20, 30);
    pub const WAVE_COLOR: Rgb = Rgb::new(200, 50, 200);
    pub const WAVE_LINE_WIDTH: f64 = 2.0;
    /// Bars are wider than a 1:1 bin mapping; the high bins run past the
    /// right edge.
    pub const BAR_WIDTH_SCALE: f64 = 2.5;
    pub const BAR_GAP: f64 = 1.0;

    pub fn new() -> Self {
        Self
    }

    /// Draws the time-domain buffer as an oscilloscope line.
    ///
    /// A sample `s` is scaled by `s / 128` and placed at `v * height / 2`,
    /// so the 128 centre sits at mid-height and 0 at the top edge. After the
    /// last sample the line runs to the fixed anchor `(width, height / 2)`.
    pub fn draw_waveform<S: Surface>(&self, surface: &mut S, buffer: &AnalysisBuffer) {
        let width = surface.width();
        let height = surface.height();

        surface.fill_rect(0.0, 0.0, width, height, Self::BACKGROUND);
        if buffer.is_empty() {
            return;
        }

        surface.begin_path();

        let slice_width = width / buffer.len() as f64;
        let mut x = 0.0;

        for (i, &sample) in buffer.iter().enumerate() {
            let v = sample as f64 / 128.0;
            let y = v * height / 2.0;

            if i == 0 {
                surface.move_to(x, y);
            } else {
                surface.line_to(x, y);
            }

            x += slice_width;
        }

        surface.line_to(width, height / 2.0);
        surface.stroke(Self::WAVE_COLOR, Self::WAVE_LINE_WIDTH);
    }

    /// Draws the frequency-domain buffer as bottom-anchored bars coloured by
    /// bin index.
    pub fn draw_bars<S: Surface>(&self, surface: &mut S, buffer: &AnalysisBuffer) {
        let width = surface.width();
        let height = surface.height();

        surface.fill_rect(0.0, 0.0, width, height, Self::BACKGROUND);
        if buffer.is_empty() {
            return;
        }

        let bar_width = (width / buffer.len() as f64) * Self::BAR_WIDTH_SCALE;
        let mut x = 0.0;

        for (i, &magnitude) in buffer.iter().enumerate() {
            let bar_height = (magnitude as f64 / 255.0) * height;
            surface.fill_rect(x, height - bar_height, bar_width, bar_height, bar_color(i));
            x += bar_width + Self::BAR_GAP;
        }
    }
}

/// Hue in degrees for a bin: two degrees per bin, wrapped into 0..360.
pub fn bar_hue(bin: usize) -> u32 {
    ((bin * 2) % 360) as u32
}

/// Fully saturated, half-lightness colour for a bin.
pub fn bar_color(bin: usize) -> Rgb {
    let hsl: Hsl = Hsl::new(bar_hue(bin) as f32, 1.0, 0.5);
    let rgb: Srgb = Srgb::from_color(hsl);
    let rgb: Srgb<u8> = rgb.into_format();
    Rgb::new(rgb.red, rgb.green, rgb.blue)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::{DisplayList, DrawCommand, PathSegment};

    fn stroke_points(list: &DisplayList) -> Vec<(f64, f64)> {
        list.strokes()
            .next()
            .expect("waveform stroke")
            .iter()
            .map(PathSegment::point)
            .collect()
    }

    fn bars(list: &DisplayList) -> Vec<(f64, f64, f64, f64, Rgb)> {
        list.commands()
            .iter()
            .skip(1)
            .map(|command| match *command {
                DrawCommand::FillRect {
                    x,
                    y,
                    width,
                    height,
                    color,
                } => (x, y, width, height, color),
                DrawCommand::Stroke { .. } => panic!("unexpected stroke in bar chart"),
            })
            .collect()
    }

    #[test]
    fn test_flat_signal_draws_mid_height_line() {
        let renderer = VisualizationRenderer::new();
        let mut surface = DisplayList::new(300, 150);
        renderer.draw_waveform(&mut surface, &AnalysisBuffer::new(128, 128));

        let points = stroke_points(&surface);
        assert_eq!(points.len(), 129);
        assert!(points.iter().all(|&(_, y)| y == 75.0));
    }

    #[test]
    fn test_waveform_uses_uncentered_scaling() {
        let renderer = VisualizationRenderer::new();
        let mut surface = DisplayList::new(300, 150);
        let mut samples = vec![128u8; 64];
        samples[0] = 0;
        samples[1] = 255;
        renderer.draw_waveform(&mut surface, &AnalysisBuffer::from(samples));

        let points = stroke_points(&surface);
        assert_eq!(points[0].1, 0.0);
        let v = points[1].1 / (150.0 / 2.0);
        assert!((v - 1.99).abs() < 0.01);
        assert!((points[1].1 - 150.0 * 0.996).abs() < 0.1);
    }

    #[test]
    fn test_waveform_path_shape() {
        let renderer = VisualizationRenderer::new();
        let mut surface = DisplayList::new(256, 100);
        let samples: Vec<u8> = (0..128).map(|i| (i * 2) as u8).collect();
        renderer.draw_waveform(&mut surface, &AnalysisBuffer::from(samples));

        let path = surface.strokes().next().unwrap();
        assert!(matches!(path[0], PathSegment::MoveTo(..)));
        assert!(path[1..].iter().all(|s| matches!(s, PathSegment::LineTo(..))));
        assert_eq!(path[5].point().0, 10.0);
        // Closing segment goes to the fixed anchor, not to the last sample
        assert_eq!(path.last().unwrap().point(), (256.0, 50.0));

        match &surface.commands()[1] {
            DrawCommand::Stroke {
                color, line_width, ..
            } => {
                assert_eq!(*color, VisualizationRenderer::WAVE_COLOR);
                assert_eq!(*line_width, 2.0);
            }
            other => panic!("expected stroke, got {other:?}"),
        }
    }

    #[test]
    fn test_waveform_redraw_is_idempotent() {
        let renderer = VisualizationRenderer::new();
        let mut surface = DisplayList::new(300, 150);
        let buffer = AnalysisBuffer::from((0..128).map(|i| (i * 7 % 256) as u8).collect::<Vec<_>>());

        renderer.draw_waveform(&mut surface, &buffer);
        let first = surface.clone();
        renderer.draw_waveform(&mut surface, &buffer);

        assert_eq!(first, surface);
        assert_eq!(surface.commands().len(), 2);
    }

    #[test]
    fn test_bar_heights_scale_to_surface() {
        let renderer = VisualizationRenderer::new();
        let mut surface = DisplayList::new(300, 300);
        renderer.draw_bars(&mut surface, &AnalysisBuffer::from(vec![0, 128, 255]));

        let drawn = bars(&surface);
        let heights: Vec<f64> = drawn.iter().map(|b| b.3).collect();
        assert_eq!(heights[0], 0.0);
        assert!((heights[1] - 150.0).abs() < 1.0);
        assert_eq!(heights[2], 300.0);

        // Anchored at the bottom edge
        for (_, y, _, height, _) in &drawn {
            assert!((y + height - 300.0).abs() < 1e-9);
        }
    }

    #[test]
    fn test_bar_layout_and_background() {
        let renderer = VisualizationRenderer::new();
        let mut surface = DisplayList::new(256, 100);
        renderer.draw_bars(&mut surface, &AnalysisBuffer::new(128, 255));

        assert_eq!(
            surface.commands()[0],
            DrawCommand::FillRect {
                x: 0.0,
                y: 0.0,
                width: 256.0,
                height: 100.0,
                color: VisualizationRenderer::BACKGROUND,
            }
        );

        let drawn = bars(&surface);
        assert_eq!(drawn.len(), 128);
        assert_eq!(drawn[0].2, 5.0);
        assert_eq!(drawn[1].0, 6.0);
        assert_eq!(drawn[10].0, 60.0);
        assert_eq!(drawn[0].4, bar_color(0));
        assert_eq!(drawn[50].4, bar_color(50));
    }

    #[test]
    fn test_bar_hue_wraps() {
        assert_eq!(bar_hue(0), 0);
        assert_eq!(bar_hue(50), 100);
        assert_eq!(bar_hue(179), 358);
        assert_eq!(bar_hue(180), 0);
        assert_eq!(bar_hue(190), 20);
    }

    #[test]
    fn test_bar_colors_are_saturated() {
        assert_eq!(bar_color(0), Rgb::new(255, 0, 0));
        assert_eq!(bar_color(60), Rgb::new(0, 255, 0));
        assert_eq!(bar_color(120), Rgb::new(0, 0, 255));
        assert_eq!(bar_color(180), bar_color(0));

        let hue_100 = bar_color(50);
        assert_eq!(hue_100.g, 255);
        assert_eq!(hue_100.b, 0);
        assert!((84..=86).contains(&hue_100.r));
    }
}
