use crate::config::ColorRange;
use anyhow::Result;
use opencv::core::{in_range, Mat, Scalar, CV_8U};
use opencv::imgproc;
use opencv::prelude::*;

/// Build a binary mask of the pixels whose HSV value lies inside `range`.
///
/// Converts the BGR frame to HSV, thresholds each channel against the
/// inclusive band, then applies one dilation pass with a 5x5 all-ones
/// kernel to merge nearby matches. Pure function of its inputs.
pub fn build_color_mask(frame: &Mat, range: &ColorRange) -> Result<Mat> {
    let mut hsv = Mat::default();
    imgproc::cvt_color_def(frame, &mut hsv, imgproc::COLOR_BGR2HSV)?;

    let lower = Scalar::new(
        range.lower[0] as f64,
        range.lower[1] as f64,
        range.lower[2] as f64,
        0.0,
    );
    let upper = Scalar::new(
        range.upper[0] as f64,
        range.upper[1] as f64,
        range.upper[2] as f64,
        0.0,
    );

    let mut mask = Mat::default();
    in_range(&hsv, &lower, &upper, &mut mask)?;

    let kernel = Mat::ones(5, 5, CV_8U)?.to_mat()?;
    let mut dilated = Mat::default();
    imgproc::dilate_def(&mask, &mut dilated, &kernel)?;

    Ok(dilated)
}
