//! Raster drawing of frame overlays onto RGB frames.

use image::{Rgb, RgbImage};
use imageproc::drawing::{draw_filled_circle_mut, draw_hollow_circle_mut, draw_line_segment_mut};

use crate::overlay::FrameOverlay;
use crate::video_params::MarkerStyle;

/// Combined centroid marker.
pub const CENTROID_COLOR: Rgb<u8> = Rgb([255, 0, 255]);

/// Heading arrow.
pub const ARROW_COLOR: Rgb<u8> = Rgb([255, 255, 0]);

/// Body part marker when likelihood is not annotated.
pub const MARKER_COLOR: Rgb<u8> = Rgb([0, 255, 0]);

/// Length of each arrow-head stroke in pixels.
const ARROW_HEAD_LEN: f64 = 6.0;

/// Half-angle of the arrow head.
const ARROW_HEAD_ANGLE: f64 = 0.45;

/// Red at likelihood 0 fading to green at 1. Missing likelihood is grey.
pub fn likelihood_color(likelihood: f64) -> Rgb<u8> {
    if !likelihood.is_finite() {
        return Rgb([128, 128, 128]);
    }
    let l = likelihood.clamp(0.0, 1.0);
    Rgb([((1.0 - l) * 255.0).round() as u8, (l * 255.0).round() as u8, 0])
}

/// Draw everything in `overlay` onto `frame`. Marks outside the frame are
/// clipped.
pub fn draw_frame_overlay(frame: &mut RgbImage, overlay: &FrameOverlay, style: &MarkerStyle) {
    let marker_radius = style.circle_radius.round().max(1.0) as i32;

    for marker in &overlay.markers {
        let color = marker.likelihood.map_or(MARKER_COLOR, likelihood_color);
        draw_filled_circle_mut(frame, to_pixel(marker.x, marker.y), marker_radius, color);
    }

    if let Some((cx, cy)) = overlay.centroid {
        let center = to_pixel(cx, cy);
        draw_hollow_circle_mut(frame, center, marker_radius + 2, CENTROID_COLOR);
        draw_filled_circle_mut(frame, center, 2, CENTROID_COLOR);
        if let Some(tip) = overlay.heading_tip {
            draw_arrow(frame, (cx, cy), tip, ARROW_COLOR);
        }
    }
}

fn to_pixel(x: f64, y: f64) -> (i32, i32) {
    (x.round() as i32, y.round() as i32)
}

fn to_point(x: f64, y: f64) -> (f32, f32) {
    (x.round() as f32, y.round() as f32)
}

/// Line from `from` to `to` with a two-stroke head at `to`.
pub fn draw_arrow(frame: &mut RgbImage, from: (f64, f64), to: (f64, f64), color: Rgb<u8>) {
    let tip = to_point(to.0, to.1);
    draw_line_segment_mut(frame, to_point(from.0, from.1), tip, color);

    let back = (from.1 - to.1).atan2(from.0 - to.0);
    for side in [-ARROW_HEAD_ANGLE, ARROW_HEAD_ANGLE] {
        let angle = back + side;
        let end = to_point(
            to.0 + ARROW_HEAD_LEN * angle.cos(),
            to.1 + ARROW_HEAD_LEN * angle.sin(),
        );
        draw_line_segment_mut(frame, tip, end, color);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::overlay::BodyPartMarker;

    const BLACK: Rgb<u8> = Rgb([0, 0, 0]);

    fn blank(w: u32, h: u32) -> RgbImage {
        RgbImage::from_pixel(w, h, BLACK)
    }

    #[test]
    fn likelihood_colors_span_red_to_green() {
        assert_eq!(likelihood_color(0.0), Rgb([255, 0, 0]));
        assert_eq!(likelihood_color(1.0), Rgb([0, 255, 0]));
        assert_eq!(likelihood_color(2.0), Rgb([0, 255, 0]));
        assert_eq!(likelihood_color(f64::NAN), Rgb([128, 128, 128]));
    }

    #[test]
    fn arrow_reaches_its_tip() {
        let mut img = blank(40, 40);
        draw_arrow(&mut img, (5.0, 20.0), (30.0, 20.0), ARROW_COLOR);
        assert_eq!(*img.get_pixel(5, 20), ARROW_COLOR);
        assert_eq!(*img.get_pixel(18, 20), ARROW_COLOR);
        assert_eq!(*img.get_pixel(30, 20), ARROW_COLOR);
        // Head strokes point back towards the tail.
        assert_eq!(*img.get_pixel(35, 20), BLACK);
    }

    #[test]
    fn marks_off_frame_are_clipped() {
        let mut img = blank(4, 4);
        let overlay = FrameOverlay {
            row: 0,
            video_frame_ind: 0,
            markers: vec![BodyPartMarker {
                bodypart: "greenLED".to_string(),
                x: -10.0,
                y: -10.0,
                likelihood: None,
            }],
            centroid: Some((2.0, 200.0)),
            heading_tip: Some((2.0, -200.0)),
        };
        draw_frame_overlay(&mut img, &overlay, &MarkerStyle::default());
        assert_eq!(*img.get_pixel(0, 0), BLACK);
        assert_eq!(*img.get_pixel(2, 1), ARROW_COLOR);
    }

    #[test]
    fn centroid_ring_leaves_gap_around_dot() {
        let mut img = blank(40, 40);
        let overlay = FrameOverlay {
            row: 0,
            video_frame_ind: 0,
            markers: Vec::new(),
            centroid: Some((20.0, 20.0)),
            heading_tip: None,
        };
        draw_frame_overlay(&mut img, &overlay, &MarkerStyle::default());
        assert_eq!(*img.get_pixel(20, 20), CENTROID_COLOR);
        assert_eq!(*img.get_pixel(25, 20), BLACK);
        assert_eq!(*img.get_pixel(28, 20), CENTROID_COLOR);
    }

    #[test]
    fn overlay_draws_markers_centroid_and_arrow() {
        let mut img = blank(100, 100);
        let overlay = FrameOverlay {
            row: 0,
            video_frame_ind: 0,
            markers: vec![BodyPartMarker {
                bodypart: "greenLED".to_string(),
                x: 20.0,
                y: 20.0,
                likelihood: Some(1.0),
            }],
            centroid: Some((50.0, 50.0)),
            heading_tip: Some((70.0, 50.0)),
        };
        draw_frame_overlay(&mut img, &overlay, &MarkerStyle::default());

        assert_eq!(*img.get_pixel(20, 20), Rgb([0, 255, 0]));
        assert_eq!(*img.get_pixel(50, 52), CENTROID_COLOR);
        assert_eq!(*img.get_pixel(70, 50), ARROW_COLOR);
    }
}
