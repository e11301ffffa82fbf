use anyhow::Result;
use opencv::core::{Mat, Point, Rect, Scalar, Vector};
use opencv::imgproc::{bounding_rect, rectangle, LINE_8};
use opencv::prelude::*;

const BOX_THICKNESS: i32 = 2;

/// Draw a bounding rectangle for each contour onto a deep copy of `frame`.
/// The original is never mutated.
pub fn draw_boxes(
    frame: &Mat,
    contours: &Vector<Vector<Point>>,
    box_color: [u8; 3],
) -> Result<Mat> {
    let mut annotated = frame.try_clone()?;
    let color = Scalar::new(
        box_color[0] as f64,
        box_color[1] as f64,
        box_color[2] as f64,
        0.0,
    );

    for contour in contours.iter() {
        let rect: Rect = bounding_rect(&contour)?;
        rectangle(&mut annotated, rect, color, BOX_THICKNESS, LINE_8, 0)?;
    }

    Ok(annotated)
}
