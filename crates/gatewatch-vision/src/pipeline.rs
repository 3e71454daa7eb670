//! Per-frame recognition: locate, then read

use log::trace;

use gatewatch_types::{Frame, PlateObservation, VisionFault};

use crate::locator::PlateLocator;
use crate::reader::PlateReader;

/// Stateless composition of locator and reader.
///
/// Holds no per-frame state, so one pipeline can be shared by several
/// recognition workers.
pub struct RecognitionPipeline {
    locator: PlateLocator,
    reader: PlateReader,
}

impl RecognitionPipeline {
    pub fn new(locator: PlateLocator, reader: PlateReader) -> Self {
        Self { locator, reader }
    }

    pub fn locator(&self) -> &PlateLocator {
        &self.locator
    }

    pub fn reader(&self) -> &PlateReader {
        &self.reader
    }

    /// Zero or one plate observation for a frame
    pub fn observe(&self, frame: &Frame) -> Result<Option<PlateObservation>, VisionFault> {
        let Some(region) = self.locator.locate(frame)? else {
            return Ok(None);
        };
        let Some((text, confidence)) = self.reader.read(frame, &region)? else {
            trace!("region found but no readable text");
            return Ok(None);
        };
        Ok(Some(PlateObservation {
            text,
            confidence,
            region,
        }))
    }
}
