//! Preview overlay for a recognized plate

use image::{Rgb, RgbImage};
use imageproc::drawing::{draw_filled_rect_mut, draw_line_segment_mut};
use imageproc::rect::Rect;

use gatewatch_types::{Frame, PlateObservation};

const OUTLINE: Rgb<u8> = Rgb([0, 255, 0]);

/// Copy of the frame with the plate region outlined and a marker bar above
/// it where a caption would go. The frame itself is left untouched.
pub fn annotate_observation(frame: &Frame, observation: &PlateObservation) -> RgbImage {
    let mut canvas = frame.as_rgb().clone();
    let corners = &observation.region.corners;

    for thickness in 0..2 {
        let offset = thickness as f32;
        for (i, start) in corners.iter().enumerate() {
            let end = corners[(i + 1) % corners.len()];
            draw_line_segment_mut(
                &mut canvas,
                (start.x as f32 + offset, start.y as f32 + offset),
                (end.x as f32 + offset, end.y as f32 + offset),
                OUTLINE,
            );
        }
    }

    let (min_x, min_y, max_x, _) = observation.region.bounds();
    let bar_top = min_y - 10;
    if bar_top >= 0 && max_x > min_x {
        draw_filled_rect_mut(
            &mut canvas,
            Rect::at(min_x, bar_top).of_size((max_x - min_x) as u32, 4),
            OUTLINE,
        );
    }
    canvas
}

#[cfg(test)]
mod tests {
    use super::*;
    use gatewatch_types::{Point, Quad};

    #[test]
    fn test_outline_drawn_on_copy() {
        let frame = Frame::new(RgbImage::from_pixel(100, 80, Rgb([0, 0, 0])));
        let observation = PlateObservation {
            text: "ABC1234".to_string(),
            confidence: 0.9,
            region: Quad::new([
                Point::new(20, 30),
                Point::new(80, 30),
                Point::new(80, 50),
                Point::new(20, 50),
            ]),
        };

        let annotated = annotate_observation(&frame, &observation);

        assert_eq!(*annotated.get_pixel(50, 30), OUTLINE);
        assert_eq!(*annotated.get_pixel(22, 21), OUTLINE);
        assert_eq!(*annotated.get_pixel(50, 40), Rgb([0, 0, 0]));
        assert_eq!(*frame.as_rgb().get_pixel(50, 30), Rgb([0, 0, 0]));
    }
}
