//! Plate text extraction from a located region

use image::imageops::{self, FilterType};
use image::{GrayImage, Luma};
use imageproc::contrast::otsu_level;
use imageproc::drawing::draw_polygon_mut;
use imageproc::point::Point as PixelPoint;
use log::debug;

use gatewatch_domain::model::normalize_plate;
use gatewatch_types::{Frame, Quad, VisionFault};

use crate::ocr::{OcrCandidate, TextRecognizer};

/// Acceptance gates for OCR candidates
#[derive(Debug, Clone)]
pub struct ReaderConfig {
    /// Minimum normalized length, in characters
    pub min_text_len: usize,
    /// Candidates must be strictly above this probability
    pub min_confidence: f32,
    /// Upscale factor applied to the crop before OCR
    pub upscale: u32,
}

impl ReaderConfig {
    /// Largest accepted upscale factor
    pub const MAX_UPSCALE: u32 = 16;
}

impl Default for ReaderConfig {
    fn default() -> Self {
        Self {
            min_text_len: 7,
            min_confidence: 0.4,
            upscale: 3,
        }
    }
}

pub struct PlateReader {
    recognizer: Box<dyn TextRecognizer>,
    config: ReaderConfig,
}

impl PlateReader {
    pub fn new(recognizer: Box<dyn TextRecognizer>, config: ReaderConfig) -> Self {
        Self { recognizer, config }
    }

    pub fn config(&self) -> &ReaderConfig {
        &self.config
    }

    /// Read normalized plate text and its OCR probability from a region.
    ///
    /// `Ok(None)` means the OCR ran but nothing passed the gates.
    pub fn read(&self, frame: &Frame, region: &Quad) -> Result<Option<(String, f32)>, VisionFault> {
        let binary = self.prepare(frame, region)?;
        let candidates = self.recognizer.recognize(&binary)?;
        Ok(self.select(&candidates))
    }

    /// Mask, crop, upscale and binarize the region for OCR
    pub fn prepare(&self, frame: &Frame, region: &Quad) -> Result<GrayImage, VisionFault> {
        let upscale = self.config.upscale;
        if upscale == 0 || upscale > ReaderConfig::MAX_UPSCALE {
            return Err(VisionFault::InvalidParameter(format!(
                "upscale must be within 1..={}, got {}",
                ReaderConfig::MAX_UPSCALE,
                upscale
            )));
        }
        if frame.is_empty() {
            return Err(VisionFault::EmptyFrame);
        }
        if region.is_degenerate() {
            return Err(VisionFault::DegenerateRegion);
        }

        let gray = imageops::grayscale(frame.as_rgb());
        let mut mask = GrayImage::new(gray.width(), gray.height());
        let polygon: Vec<PixelPoint<i32>> = region
            .corners
            .iter()
            .map(|p| PixelPoint::new(p.x, p.y))
            .collect();
        draw_polygon_mut(&mut mask, &polygon, Luma([255u8]));

        let (x0, y0, x1, y1) = masked_bounds(&mask).ok_or(VisionFault::EmptyCrop)?;
        let crop = GrayImage::from_fn(x1 - x0 + 1, y1 - y0 + 1, |x, y| {
            if mask.get_pixel(x0 + x, y0 + y)[0] == 255 {
                *gray.get_pixel(x0 + x, y0 + y)
            } else {
                Luma([0])
            }
        });

        let (width, height) = crop
            .width()
            .checked_mul(upscale)
            .zip(crop.height().checked_mul(upscale))
            .ok_or_else(|| {
                VisionFault::InvalidParameter(format!(
                    "{}x{} crop cannot be upscaled {}x",
                    crop.width(),
                    crop.height(),
                    upscale
                ))
            })?;
        let scaled = imageops::resize(&crop, width, height, FilterType::CatmullRom);
        let level = otsu_level(&scaled);
        Ok(GrayImage::from_fn(scaled.width(), scaled.height(), |x, y| {
            if scaled.get_pixel(x, y)[0] > level {
                Luma([255])
            } else {
                Luma([0])
            }
        }))
    }

    /// First candidate that passes both the length and the confidence gate
    pub fn select(&self, candidates: &[OcrCandidate]) -> Option<(String, f32)> {
        candidates.iter().find_map(|candidate| {
            let text = normalize_plate(&candidate.text);
            let accepted = text.chars().count() >= self.config.min_text_len
                && candidate.confidence > self.config.min_confidence;
            debug!(
                "OCR candidate {:?} -> {:?} p={:.2} {}",
                candidate.text,
                text,
                candidate.confidence,
                if accepted { "accepted" } else { "rejected" }
            );
            accepted.then(|| (text, candidate.confidence.clamp(0.0, 1.0)))
        })
    }
}

/// Inclusive bounding box of the set pixels of a mask
fn masked_bounds(mask: &GrayImage) -> Option<(u32, u32, u32, u32)> {
    let mut bounds: Option<(u32, u32, u32, u32)> = None;
    for (x, y, pixel) in mask.enumerate_pixels() {
        if pixel[0] != 255 {
            continue;
        }
        bounds = Some(match bounds {
            None => (x, y, x, y),
            Some((x0, y0, x1, y1)) => (x0.min(x), y0.min(y), x1.max(x), y1.max(y)),
        });
    }
    bounds
}
