//! Replays a directory of still images as a camera

use std::collections::VecDeque;
use std::path::{Path, PathBuf};

use log::{debug, info, warn};

use gatewatch_domain::FrameSource;
use gatewatch_types::{Frame, Result};

use super::scan_directory;

/// Hands out one image per `acquire`, in file-name order.
///
/// Files that fail to decode are logged and skipped. Once released or
/// drained the source reports itself finished.
pub struct DirectoryFrameSource {
    dir: PathBuf,
    pending: VecDeque<PathBuf>,
    delivered: usize,
    released: bool,
}

impl DirectoryFrameSource {
    pub fn open(dir: &Path) -> Result<Self> {
        let pending: VecDeque<PathBuf> = scan_directory(dir)?.into();
        info!("replaying {} images from {}", pending.len(), dir.display());
        Ok(Self {
            dir: dir.to_path_buf(),
            pending,
            delivered: 0,
            released: false,
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn remaining(&self) -> usize {
        self.pending.len()
    }

    /// Frames handed out so far
    pub fn delivered(&self) -> usize {
        self.delivered
    }
}

impl FrameSource for DirectoryFrameSource {
    fn acquire(&mut self) -> Option<Frame> {
        if self.released {
            return None;
        }
        while let Some(path) = self.pending.pop_front() {
            match Frame::open(&path) {
                Ok(frame) => {
                    debug!("frame {}", path.display());
                    self.delivered += 1;
                    return Some(frame);
                }
                Err(e) => warn!("skipping unreadable image {}: {}", path.display(), e),
            }
        }
        None
    }

    fn release(&mut self) {
        if self.released {
            return;
        }
        self.released = true;
        self.pending.clear();
        info!(
            "released image source {} after {} frames",
            self.dir.display(),
            self.delivered
        );
    }

    fn is_finished(&self) -> bool {
        self.released || self.pending.is_empty()
    }
}
