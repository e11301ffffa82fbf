use crate::pipeline::types::{BoundingBox, MIN_DETECTION_AREA};
use anyhow::Result;
use opencv::core::{Mat, Point, Vector};
use opencv::imgproc;

/// Extract the boundaries of connected mask regions.
///
/// Full hierarchical retrieval with simplified point chains; nested regions
/// are included. An empty mask yields an empty vector, not an error.
pub fn extract_contours(mask: &Mat) -> Result<Vector<Vector<Point>>> {
    let mut contours = Vector::<Vector<Point>>::new();
    imgproc::find_contours(
        mask,
        &mut contours,
        imgproc::RETR_TREE,
        imgproc::CHAIN_APPROX_SIMPLE,
        Point::new(0, 0),
    )?;
    Ok(contours)
}

/// Drop contours at or below the minimum detection area, preserving
/// extraction order.
pub fn filter_detections(contours: Vector<Vector<Point>>) -> Result<Vector<Vector<Point>>> {
    let mut kept = Vector::<Vector<Point>>::new();
    for contour in contours.iter() {
        let area = imgproc::contour_area_def(&contour)?;
        if area > MIN_DETECTION_AREA {
            kept.push(contour);
        }
    }
    Ok(kept)
}

/// Axis-aligned enclosing rectangles for the surviving contours.
pub fn bounding_boxes(contours: &Vector<Vector<Point>>) -> Result<Vec<BoundingBox>> {
    let mut boxes = Vec::with_capacity(contours.len());
    for contour in contours.iter() {
        boxes.push(imgproc::bounding_rect(&contour)?.into());
    }
    Ok(boxes)
}
