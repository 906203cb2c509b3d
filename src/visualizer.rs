//! Per-frame visualizer driver.
//!
//! Owns the analysis source, the renderer and both surfaces. The host calls
//! [`Visualizer::tick`] once per display frame; a [`LoopHandle`] decides
//! whether a tick does any work, so whoever controls playback can start and
//! stop the loop without touching the visualizer itself.

use crate::analysis::{AnalyserSettings, AnalysisBuffer, AudioAnalysisSource, SampleTap};
use crate::render::{DisplayList, VisualizationRenderer};
use anyhow::Result;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Which analysis buffer a hook is being shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BufferKind {
    TimeDomain,
    FrequencyDomain,
}

/// Result of one tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameOutcome {
    /// Both buffers were refreshed and both surfaces redrawn
    Rendered,
    /// The loop is stopped; nothing was touched
    Idle,
}

/// Shared liveness flag of a frame loop.
#[derive(Debug, Clone, Default)]
pub struct LoopHandle {
    live: Arc<AtomicBool>,
}

impl LoopHandle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn start(&self) {
        if !self.live.swap(true, Ordering::SeqCst) {
            tracing::debug!("Visualizer loop started");
        }
    }

    pub fn stop(&self) {
        if self.live.swap(false, Ordering::SeqCst) {
            tracing::debug!("Visualizer loop stopped");
        }
    }

    pub fn is_live(&self) -> bool {
        self.live.load(Ordering::SeqCst)
    }
}

type BufferHook = Box<dyn FnMut(BufferKind, &AnalysisBuffer)>;
type FrameHook = Box<dyn FnMut(&DisplayList, &DisplayList)>;

/// Analysis source plus renderer, driven one frame at a time.
pub struct Visualizer {
    source: AudioAnalysisSource,
    renderer: VisualizationRenderer,
    wave: DisplayList,
    bars: DisplayList,
    handle: LoopHandle,
    buffer_hooks: Vec<BufferHook>,
    frame_hooks: Vec<FrameHook>,
}

impl Visualizer {
    /// Builds a stopped visualizer listening to `tap`.
    ///
    /// # Arguments
    /// * `settings` - Analysis parameters
    /// * `tap` - Samples reaching the output device
    /// * `wave_size` - Waveform surface (width, height) in pixels
    /// * `bar_size` - Bar chart surface (width, height) in pixels
    ///
    /// # Errors
    /// - If the analysis source cannot be configured with `settings`
    pub fn new(
        settings: AnalyserSettings,
        tap: SampleTap,
        wave_size: (u32, u32),
        bar_size: (u32, u32),
    ) -> Result<Self> {
        let source = AudioAnalysisSource::with_settings(settings, tap)?;

        Ok(Self {
            source,
            renderer: VisualizationRenderer::new(),
            wave: DisplayList::new(wave_size.0, wave_size.1),
            bars: DisplayList::new(bar_size.0, bar_size.1),
            handle: LoopHandle::new(),
            buffer_hooks: Vec::new(),
            frame_hooks: Vec::new(),
        })
    }

    /// Handle controlling whether ticks render.
    pub fn handle(&self) -> LoopHandle {
        self.handle.clone()
    }

    /// Registers a hook called after each buffer refresh.
    pub fn on_buffer_updated<F>(&mut self, hook: F)
    where
        F: FnMut(BufferKind, &AnalysisBuffer) + 'static,
    {
        self.buffer_hooks.push(Box::new(hook));
    }

    /// Registers a hook called once both surfaces are redrawn.
    pub fn on_frame_ready<F>(&mut self, hook: F)
    where
        F: FnMut(&DisplayList, &DisplayList) + 'static,
    {
        self.frame_hooks.push(Box::new(hook));
    }

    /// Runs one frame if the loop is live.
    pub fn tick(&mut self) -> FrameOutcome {
        if !self.handle.is_live() {
            return FrameOutcome::Idle;
        }

        let time_domain = self.source.refresh_time_domain();
        for hook in &mut self.buffer_hooks {
            hook(BufferKind::TimeDomain, time_domain);
        }
        self.renderer.draw_waveform(&mut self.wave, time_domain);

        let frequency_domain = self.source.refresh_frequency_domain();
        for hook in &mut self.buffer_hooks {
            hook(BufferKind::FrequencyDomain, frequency_domain);
        }
        self.renderer.draw_bars(&mut self.bars, frequency_domain);

        for hook in &mut self.frame_hooks {
            hook(&self.wave, &self.bars);
        }

        FrameOutcome::Rendered
    }

    /// Last rendered waveform.
    pub fn wave(&self) -> &DisplayList {
        &self.wave
    }

    /// Last rendered bar chart.
    pub fn bars(&self) -> &DisplayList {
        &self.bars
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn visualizer(tap: SampleTap) -> Visualizer {
        Visualizer::new(AnalyserSettings::default(), tap, (300, 150), (300, 150)).unwrap()
    }

    #[test]
    fn test_invalid_settings_disable_visualizer() {
        let settings = AnalyserSettings {
            fft_size: 100,
            ..AnalyserSettings::default()
        };
        assert!(Visualizer::new(settings, SampleTap::new(), (300, 150), (300, 150)).is_err());
    }

    #[test]
    fn test_stopped_loop_does_no_work() {
        let mut vis = visualizer(SampleTap::new());
        let calls = Rc::new(RefCell::new(0));
        let counter = Rc::clone(&calls);
        vis.on_buffer_updated(move |_, _| *counter.borrow_mut() += 1);

        assert_eq!(vis.tick(), FrameOutcome::Idle);
        assert_eq!(*calls.borrow(), 0);
        assert!(vis.wave().commands().is_empty());
    }

    #[test]
    fn test_hooks_fire_in_order() {
        let mut vis = visualizer(SampleTap::new());
        let events = Rc::new(RefCell::new(Vec::new()));

        let log = Rc::clone(&events);
        vis.on_buffer_updated(move |kind, buffer| {
            log.borrow_mut().push(format!("{kind:?}:{}", buffer.len()));
        });
        let log = Rc::clone(&events);
        vis.on_frame_ready(move |wave, bars| {
            log.borrow_mut()
                .push(format!("frame:{}:{}", wave.commands().len(), bars.commands().len()));
        });

        vis.handle().start();
        assert_eq!(vis.tick(), FrameOutcome::Rendered);

        assert_eq!(
            *events.borrow(),
            vec![
                "TimeDomain:128".to_string(),
                "FrequencyDomain:128".to_string(),
                "frame:2:129".to_string(),
            ]
        );
    }

    #[test]
    fn test_stop_keeps_last_frame() {
        let tap = SampleTap::new();
        let mut vis = visualizer(tap.clone());
        let handle = vis.handle();

        handle.start();
        vis.tick();
        let rendered = vis.wave().clone();

        handle.stop();
        tap.push(&[0.9; 256]);
        assert_eq!(vis.tick(), FrameOutcome::Idle);
        assert_eq!(vis.wave(), &rendered);

        handle.start();
        assert_eq!(vis.tick(), FrameOutcome::Rendered);
        assert_ne!(vis.wave(), &rendered);
    }
}
