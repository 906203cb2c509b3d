//! Analysis buffers and the sample tap feeding them.

use std::collections::VecDeque;
use std::ops::Index;
use std::sync::{Arc, Mutex};

/// Largest transform size an analysis source accepts, and so the most
/// history the tap ever needs to keep.
pub const MAX_TAP_SAMPLES: usize = 32768;

/// Fixed-length snapshot of unsigned 8-bit analysis values.
///
/// Owned by the analysis source and overwritten in place on every refresh.
/// Consumers only ever see it through a shared borrow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalysisBuffer {
    data: Vec<u8>,
}

impl AnalysisBuffer {
    /// Creates a buffer of `len` elements, all set to `fill`.
    pub fn new(len: usize, fill: u8) -> Self {
        Self {
            data: vec![fill; len],
        }
    }

    /// Number of elements (the bin count of the owning source).
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, u8> {
        self.data.iter()
    }

    pub(crate) fn as_mut_slice(&mut self) -> &mut [u8] {
        &mut self.data
    }
}

impl Index<usize> for AnalysisBuffer {
    type Output = u8;

    fn index(&self, index: usize) -> &u8 {
        &self.data[index]
    }
}

impl<'a> IntoIterator for &'a AnalysisBuffer {
    type Item = &'a u8;
    type IntoIter = std::slice::Iter<'a, u8>;

    fn into_iter(self) -> Self::IntoIter {
        self.data.iter()
    }
}

impl From<Vec<u8>> for AnalysisBuffer {
    fn from(data: Vec<u8>) -> Self {
        Self { data }
    }
}

/// Listening tap between the output stream and the analysis source.
///
/// The audio callback pushes the mono mix of every frame it plays; the
/// analysis source copies out the most recent window. Clones share the
/// same history.
#[derive(Debug, Clone)]
pub struct SampleTap {
    samples: Arc<Mutex<VecDeque<f32>>>,
    capacity: usize,
}

impl Default for SampleTap {
    fn default() -> Self {
        Self::new()
    }
}

impl SampleTap {
    /// Creates a tap large enough for the biggest supported transform.
    pub fn new() -> Self {
        Self::with_capacity(MAX_TAP_SAMPLES)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            samples: Arc::new(Mutex::new(VecDeque::with_capacity(capacity))),
            capacity,
        }
    }

    /// Appends samples, dropping the oldest ones beyond capacity.
    pub fn push(&self, incoming: &[f32]) {
        let mut samples = self.samples.lock().unwrap();
        if incoming.len() >= self.capacity {
            samples.clear();
            samples.extend(&incoming[incoming.len() - self.capacity..]);
            return;
        }

        let overflow = (samples.len() + incoming.len()).saturating_sub(self.capacity);
        samples.drain(..overflow);
        samples.extend(incoming);
    }

    /// Copies the most recent `window.len()` samples into `window`, oldest
    /// first. Missing history is zero-filled at the front.
    pub fn latest(&self, window: &mut [f32]) {
        let samples = self.samples.lock().unwrap();
        let available = samples.len().min(window.len());
        let pad = window.len() - available;

        window[..pad].fill(0.0);
        for (slot, &sample) in window[pad..]
            .iter_mut()
            .zip(samples.iter().skip(samples.len() - available))
        {
            *slot = sample;
        }
    }

    /// Number of samples currently held.
    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.samples.lock().unwrap().len()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Forgets all history, e.g. when a new track starts.
    pub fn clear(&self) {
        self.samples.lock().unwrap().clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_latest_pads_missing_history_with_zeros() {
        let tap = SampleTap::with_capacity(8);
        tap.push(&[0.5, -0.5]);

        let mut window = [1.0f32; 4];
        tap.latest(&mut window);
        assert_eq!(window, [0.0, 0.0, 0.5, -0.5]);
    }

    #[test]
    fn test_push_keeps_only_capacity_newest() {
        let tap = SampleTap::with_capacity(3);
        tap.push(&[1.0, 2.0]);
        tap.push(&[3.0, 4.0]);
        assert_eq!(tap.len(), 3);

        let mut window = [0.0f32; 3];
        tap.latest(&mut window);
        assert_eq!(window, [2.0, 3.0, 4.0]);

        tap.push(&[5.0, 6.0, 7.0, 8.0]);
        tap.latest(&mut window);
        assert_eq!(window, [6.0, 7.0, 8.0]);
    }

    #[test]
    fn test_clones_share_history() {
        let tap = SampleTap::with_capacity(4);
        let writer = tap.clone();
        writer.push(&[0.25]);
        assert_eq!(tap.len(), 1);

        tap.clear();
        assert!(writer.is_empty());
    }
}
