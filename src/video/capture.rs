use super::FrameSource;
use anyhow::{anyhow, Result};
use opencv::{
    prelude::*,
    videoio::{VideoCapture, CAP_ANY, CAP_PROP_FPS},
};
use std::path::Path;

/// OpenCV-backed frame source: a camera index or a video file.
pub struct CaptureSource {
    capture: VideoCapture,
}

impl CaptureSource {
    pub fn open_camera(index: i32) -> Result<Self> {
        let capture = VideoCapture::new(index, CAP_ANY)?;
        Self::wrap(capture, &format!("camera {index}"))
    }

    pub fn open_file(path: &Path) -> Result<Self> {
        let path_str = path
            .to_str()
            .ok_or_else(|| anyhow!("non-UTF8 video path: {}", path.display()))?;
        let capture = VideoCapture::from_file(path_str, CAP_ANY)?;
        Self::wrap(capture, path_str)
    }

    fn wrap(capture: VideoCapture, label: &str) -> Result<Self> {
        if !capture.is_opened()? {
            return Err(anyhow!("failed to open frame source: {label}"));
        }
        let fps = capture.get(CAP_PROP_FPS).unwrap_or(0.0);
        tracing::info!("opened frame source {label}, fps={fps:.2}");
        Ok(Self { capture })
    }
}

impl FrameSource for CaptureSource {
    fn next_frame(&mut self) -> Result<Mat> {
        let mut frame = Mat::default();
        let success = self.capture.read(&mut frame)?;
        if !success || frame.empty() {
            return Err(anyhow!("failed to read frame"));
        }
        Ok(frame)
    }
}
