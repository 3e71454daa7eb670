//! Plate region localization
//!
//! Plates are rectangular and usually among the largest sharp-edged shapes in
//! a vehicle-front frame, so the search only looks at the biggest contours and
//! takes the first one that simplifies to four corners.

use image::imageops;
use imageproc::contours::find_contours;
use imageproc::edges::canny;
use imageproc::filter::gaussian_blur_f32;
use log::{debug, trace};

use gatewatch_types::{Frame, Point, Quad, VisionFault};

use crate::geometry::{approximate_polygon, arc_length, contour_area};

/// Tuning for the contour search
#[derive(Debug, Clone)]
pub struct LocatorConfig {
    /// Minimum contour area in px² for a candidate to count
    pub min_area: f64,
    /// How many of the largest contours are examined
    pub max_candidates: usize,
    /// Polygon approximation tolerance as a fraction of the contour perimeter
    pub epsilon_ratio: f64,
    pub blur_sigma: f32,
    pub canny_low: f32,
    pub canny_high: f32,
}

impl Default for LocatorConfig {
    fn default() -> Self {
        Self {
            min_area: 300.0,
            max_candidates: 10,
            epsilon_ratio: 0.02,
            blur_sigma: 1.1,
            canny_low: 30.0,
            canny_high: 200.0,
        }
    }
}

impl LocatorConfig {
    pub fn with_min_area(mut self, min_area: f64) -> Self {
        self.min_area = min_area;
        self
    }

    pub fn validate(&self) -> Result<(), VisionFault> {
        if self.blur_sigma.is_nan() || self.blur_sigma <= 0.0 {
            return Err(VisionFault::InvalidParameter(format!(
                "blur sigma must be positive, got {}",
                self.blur_sigma
            )));
        }
        if self.canny_low.is_nan()
            || self.canny_high.is_nan()
            || self.canny_low < 0.0
            || self.canny_high < self.canny_low
        {
            return Err(VisionFault::InvalidParameter(format!(
                "canny thresholds must satisfy 0 <= low <= high, got {}/{}",
                self.canny_low, self.canny_high
            )));
        }
        if self.max_candidates == 0 {
            return Err(VisionFault::InvalidParameter(
                "max_candidates must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Finds the quadrilateral most likely to be a plate
#[derive(Debug, Clone, Default)]
pub struct PlateLocator {
    config: LocatorConfig,
}

impl PlateLocator {
    pub fn new(config: LocatorConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &LocatorConfig {
        &self.config
    }

    /// Locate a plate-shaped region.
    ///
    /// `Ok(None)` means no contour among the largest few qualified.
    pub fn locate(&self, frame: &Frame) -> Result<Option<Quad>, VisionFault> {
        self.config.validate()?;
        if frame.is_empty() {
            return Err(VisionFault::EmptyFrame);
        }

        let gray = imageops::grayscale(frame.as_rgb());
        let blurred = gaussian_blur_f32(&gray, self.config.blur_sigma);
        let edges = canny(&blurred, self.config.canny_low, self.config.canny_high);

        let mut candidates: Vec<(f64, Vec<Point>)> = find_contours::<i32>(&edges)
            .into_iter()
            .map(|contour| {
                let points: Vec<Point> = contour
                    .points
                    .iter()
                    .map(|p| Point::new(p.x, p.y))
                    .collect();
                (contour_area(&points), points)
            })
            .collect();

        // Stable sort keeps contour order among equal areas.
        candidates.sort_by(|a, b| b.0.total_cmp(&a.0));
        candidates.truncate(self.config.max_candidates);

        for (area, points) in &candidates {
            let epsilon = self.config.epsilon_ratio * arc_length(points, true);
            let approx = approximate_polygon(points, epsilon);
            if approx.len() == 4 && *area > self.config.min_area {
                let quad = Quad::new([approx[0], approx[1], approx[2], approx[3]]);
                debug!("plate candidate area={:.0} bounds={:?}", area, quad.bounds());
                return Ok(Some(quad));
            }
        }

        trace!("no plate-shaped contour among {} candidates", candidates.len());
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};

    fn frame_with_plate(x0: u32, y0: u32, w: u32, h: u32) -> Frame {
        let mut image = RgbImage::from_pixel(320, 240, Rgb([20, 20, 20]));
        for y in y0..y0 + h {
            for x in x0..x0 + w {
                image.put_pixel(x, y, Rgb([235, 235, 235]));
            }
        }
        Frame::new(image)
    }

    #[test]
    fn test_locates_bright_rectangle() {
        let frame = frame_with_plate(60, 90, 180, 50);
        let quad = PlateLocator::default()
            .locate(&frame)
            .unwrap()
            .expect("rectangle should be found");

        let (min_x, min_y, max_x, max_y) = quad.bounds();
        assert!((min_x - 60).abs() <= 4, "min_x {}", min_x);
        assert!((min_y - 90).abs() <= 4, "min_y {}", min_y);
        assert!((max_x - 239).abs() <= 4, "max_x {}", max_x);
        assert!((max_y - 139).abs() <= 4, "max_y {}", max_y);
    }

    #[test]
    fn test_blank_frame_has_no_region() {
        let frame = Frame::new(RgbImage::from_pixel(160, 120, Rgb([128, 128, 128])));
        assert_eq!(PlateLocator::default().locate(&frame).unwrap(), None);
    }

    #[test]
    fn test_small_rectangle_below_min_area_is_rejected() {
        let frame = frame_with_plate(100, 100, 12, 8);
        assert_eq!(PlateLocator::default().locate(&frame).unwrap(), None);
    }

    #[test]
    fn test_min_area_is_configurable() {
        let frame = frame_with_plate(60, 90, 180, 50);
        let locator = PlateLocator::new(LocatorConfig::default().with_min_area(1_000_000.0));
        assert_eq!(locator.locate(&frame).unwrap(), None);
    }

    #[test]
    fn test_empty_frame_is_a_fault() {
        let frame = Frame::new(RgbImage::new(0, 0));
        assert!(matches!(
            PlateLocator::default().locate(&frame),
            Err(VisionFault::EmptyFrame)
        ));
    }

    #[test]
    fn test_invalid_sigma_is_a_fault() {
        let locator = PlateLocator::new(LocatorConfig {
            blur_sigma: 0.0,
            ..LocatorConfig::default()
        });
        let frame = frame_with_plate(60, 90, 180, 50);
        assert!(matches!(
            locator.locate(&frame),
            Err(VisionFault::InvalidParameter(_))
        ));
    }

    #[test]
    fn test_nan_canny_threshold_is_a_fault() {
        let frame = frame_with_plate(60, 90, 180, 50);
        for (low, high) in [(f32::NAN, 200.0), (30.0, f32::NAN)] {
            let locator = PlateLocator::new(LocatorConfig {
                canny_low: low,
                canny_high: high,
                ..LocatorConfig::default()
            });
            assert!(matches!(
                locator.locate(&frame),
                Err(VisionFault::InvalidParameter(_))
            ));
        }
    }
}
