//! Frame acquisition contract

use gatewatch_types::Frame;
use log::debug;

/// Camera-like source of frames.
///
/// `acquire` returns `None` when the device is not connected or has no frame
/// yet. `release` must be safe to call more than once.
pub trait FrameSource: Send {
    fn acquire(&mut self) -> Option<Frame>;

    fn release(&mut self);

    /// Replay sources report when they have nothing left to give
    fn is_finished(&self) -> bool {
        false
    }
}

/// Scoped use of a frame source: `release` runs when the session is dropped,
/// whether the loop stopped normally, returned an error or unwound.
pub struct CameraSession<'a, S: FrameSource + ?Sized> {
    source: &'a mut S,
}

impl<'a, S: FrameSource + ?Sized> CameraSession<'a, S> {
    pub fn open(source: &'a mut S) -> Self {
        Self { source }
    }

    pub fn acquire(&mut self) -> Option<Frame> {
        self.source.acquire()
    }

    pub fn is_finished(&self) -> bool {
        self.source.is_finished()
    }
}

impl<S: FrameSource + ?Sized> Drop for CameraSession<'_, S> {
    fn drop(&mut self) {
        debug!("releasing frame source");
        self.source.release();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct CountingSource {
        released: usize,
    }

    impl FrameSource for CountingSource {
        fn acquire(&mut self) -> Option<Frame> {
            None
        }

        fn release(&mut self) {
            self.released += 1;
        }
    }

    #[test]
    fn test_release_on_drop() {
        let mut source = CountingSource::default();
        {
            let mut session = CameraSession::open(&mut source);
            assert!(session.acquire().is_none());
        }
        assert_eq!(source.released, 1);
    }

    #[test]
    fn test_release_on_unwind() {
        let mut source = CountingSource::default();
        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let _session = CameraSession::open(&mut source);
            panic!("recognition blew up");
        }));
        assert!(result.is_err());
        assert_eq!(source.released, 1);
    }
}
