use crate::segmentation::{translate, Roi};
use ab_glyph::{FontRef, PxScale};
use anyhow::{Context, Result};
use image::{Rgb, RgbImage};
use imageproc::contours::Contour;
use imageproc::drawing::{draw_hollow_rect_mut, draw_line_segment_mut, draw_text_mut};
use imageproc::point::Point;
use imageproc::rect::Rect;

pub const CONTOUR_COLOR: Rgb<u8> = Rgb([0, 255, 0]);
pub const ROI_COLOR: Rgb<u8> = Rgb([255, 0, 0]);
pub const TEXT_COLOR: Rgb<u8> = Rgb([0, 255, 0]);

const TEXT_SCALE: f32 = 24.0;
/// Gap between the readout's baseline and the top of the ROI
const TEXT_LIFT: i32 = 20;

/// Outline the measured regions and the ROI on the full frame, with the
/// current area written above the ROI
///
/// Contours are in ROI coordinates and get shifted by the ROI origin.
pub fn annotate(
    frame: &mut RgbImage,
    roi: &Roi,
    contours: &[Contour<i32>],
    area: u64,
) -> Result<()> {
    let _span = tracing::debug_span!("annotate").entered();

    let (dx, dy) = (roi.x as i32, roi.y as i32);
    for contour in contours {
        draw_closed_polyline(frame, &translate(contour, dx, dy), CONTOUR_COLOR);
    }

    draw_roi(frame, roi);
    draw_readout(frame, roi, area)
}

/// Glyphs falling outside the frame are clipped
fn draw_readout(frame: &mut RgbImage, roi: &Roi, area: u64) -> Result<()> {
    let font = FontRef::try_from_slice(include_bytes!("../fonts/DejaVuSans.ttf"))
        .context("Failed to load font")?;

    let top = roi.y as i32 - TEXT_LIFT - TEXT_SCALE as i32;
    draw_text_mut(
        frame,
        TEXT_COLOR,
        roi.x as i32,
        top,
        PxScale::from(TEXT_SCALE),
        &font,
        &format!("SOAP AREA: {area} pixels"),
    );
    Ok(())
}

fn draw_closed_polyline(frame: &mut RgbImage, points: &[Point<i32>], color: Rgb<u8>) {
    match points {
        [] => {}
        [single] => {
            let (x, y) = (single.x as f32, single.y as f32);
            draw_line_segment_mut(frame, (x, y), (x, y), color);
        }
        _ => {
            for (a, b) in points.iter().zip(points.iter().cycle().skip(1)) {
                draw_line_segment_mut(
                    frame,
                    (a.x as f32, a.y as f32),
                    (b.x as f32, b.y as f32),
                    color,
                );
            }
        }
    }
}

/// Two-pixel rectangle just inside the ROI edge
fn draw_roi(frame: &mut RgbImage, roi: &Roi) {
    let (x, y) = (roi.x as i32, roi.y as i32);

    draw_hollow_rect_mut(frame, Rect::at(x, y).of_size(roi.width, roi.height), ROI_COLOR);
    if roi.width > 2 && roi.height > 2 {
        draw_hollow_rect_mut(
            frame,
            Rect::at(x + 1, y + 1).of_size(roi.width - 2, roi.height - 2),
            ROI_COLOR,
        );
    }
}
