//! Single-slot hand-off between the acquisition thread and the workers

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use crossbeam_channel::{bounded, Receiver, Sender, TrySendError};

use gatewatch_types::Frame;

/// Holds at most one frame. Publishing into a full slot replaces the stale
/// frame and counts it as dropped, so workers always see the newest image.
pub struct LatestFrameSlot {
    tx: Sender<Frame>,
    rx: Receiver<Frame>,
    dropped: AtomicU64,
}

impl Default for LatestFrameSlot {
    fn default() -> Self {
        Self::new()
    }
}

impl LatestFrameSlot {
    pub fn new() -> Self {
        let (tx, rx) = bounded(1);
        Self {
            tx,
            rx,
            dropped: AtomicU64::new(0),
        }
    }

    pub fn publish(&self, frame: Frame) {
        let frame = match self.tx.try_send(frame) {
            Ok(()) => return,
            Err(TrySendError::Full(frame)) => frame,
            // Both ends live in `self`
            Err(TrySendError::Disconnected(_)) => return,
        };

        if self.rx.try_recv().is_ok() {
            self.dropped.fetch_add(1, Ordering::Relaxed);
        }
        if self.tx.try_send(frame).is_err() {
            self.dropped.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Wait up to `timeout` for a frame
    pub fn take(&self, timeout: Duration) -> Option<Frame> {
        self.rx.recv_timeout(timeout).ok()
    }

    pub fn try_take(&self) -> Option<Frame> {
        self.rx.try_recv().ok()
    }

    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::RgbImage;

    fn frame(width: u32) -> Frame {
        Frame::new(RgbImage::new(width, 1))
    }

    #[test]
    fn test_newest_frame_wins() {
        let slot = LatestFrameSlot::new();
        slot.publish(frame(1));
        slot.publish(frame(2));
        slot.publish(frame(3));

        assert_eq!(slot.try_take().unwrap().width(), 3);
        assert!(slot.try_take().is_none());
        assert_eq!(slot.dropped(), 2);
    }

    #[test]
    fn test_take_times_out_when_empty() {
        let slot = LatestFrameSlot::new();
        assert!(slot.take(Duration::from_millis(5)).is_none());
        slot.publish(frame(7));
        assert_eq!(slot.take(Duration::from_millis(5)).unwrap().width(), 7);
        assert_eq!(slot.dropped(), 0);
    }
}
