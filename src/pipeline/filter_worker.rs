// Rate-limited consumer loop: pulls one frame per tick from the mailbox,
// runs the color-mask -> contour -> area-filter pipeline, and decides what
// to publish. All per-tick failures are contained here; nothing propagates
// to the capture path.

use crate::config::{ColorRange, FilterConfig};
use crate::mailbox::{FrameMailbox, TakeOutcome};
use crate::output::FrameSink;
use crate::pipeline::annotate::draw_boxes;
use crate::pipeline::contours::{bounding_boxes, extract_contours, filter_detections};
use crate::pipeline::mask::build_color_mask;
use crate::pipeline::types::{BoundingBox, Frame};
use crate::stats::FilterStats;
use anyhow::Result;
use opencv::core::{Mat, Point, Vector};
use opencv::prelude::*;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Instant;

/// What a single tick did, for stats and tests.
#[derive(Debug, PartialEq, Eq)]
pub enum TickOutcome {
    SkippedEmpty,
    SkippedContended,
    DecodeFailed,
    NoDetections,
    Published { boxes: Vec<BoundingBox> },
}

/// Mask, extract and filter in one pass. Deterministic for a given frame
/// and range.
fn detect(mat: &Mat, range: &ColorRange) -> Result<Vector<Vector<Point>>> {
    let mask = build_color_mask(mat, range)?;
    let contours = extract_contours(&mask)?;
    filter_detections(contours)
}

/// One iteration of the loop: acquire, detect, publish.
pub fn process_tick(
    mailbox: &FrameMailbox,
    config: &FilterConfig,
    range: &ColorRange,
    filtered: &dyn FrameSink,
    visualization: &dyn FrameSink,
) -> Result<TickOutcome> {
    let frame = match mailbox.take() {
        TakeOutcome::Frame(frame) => frame,
        TakeOutcome::Empty => return Ok(TickOutcome::SkippedEmpty),
        TakeOutcome::Contended => return Ok(TickOutcome::SkippedContended),
    };

    if frame.mat.empty() || frame.mat.channels() != 3 {
        tracing::warn!(frame_id = frame.id, "undecodable frame, tick abandoned");
        return Ok(TickOutcome::DecodeFailed);
    }

    let detections = detect(&frame.mat, range)?;
    if detections.is_empty() {
        return Ok(TickOutcome::NoDetections);
    }
    let boxes = bounding_boxes(&detections)?;

    let annotated = if config.visualization {
        Some(draw_boxes(&frame.mat, &detections, config.box_color)?)
    } else {
        None
    };

    let (id, stamp) = (frame.id, frame.stamp);
    filtered.publish(frame)?;
    if let Some(mat) = annotated {
        visualization.publish(Frame { id, stamp, mat })?;
    }

    Ok(TickOutcome::Published { boxes })
}

/// Run the loop at the configured rate until the shutdown signal flips.
///
/// A tick that overruns its period starts the next one immediately; there
/// is no catch-up, dropped ticks are accepted by design.
pub fn filter_worker(
    mailbox: Arc<FrameMailbox>,
    config: FilterConfig,
    filtered: Box<dyn FrameSink>,
    visualization: Box<dyn FrameSink>,
    stats: Arc<FilterStats>,
) -> Result<()> {
    let range = config.color_range()?;
    let period = config.tick_period();
    tracing::info!(
        publish_rate = config.publish_rate,
        visualization = config.visualization,
        "filter worker started"
    );

    while stats.active() {
        let started = Instant::now();

        match process_tick(
            &mailbox,
            &config,
            &range,
            filtered.as_ref(),
            visualization.as_ref(),
        ) {
            Ok(TickOutcome::SkippedEmpty) => {
                stats.skipped_empty.fetch_add(1, Ordering::Relaxed);
            }
            Ok(TickOutcome::SkippedContended) => {
                stats.skipped_contended.fetch_add(1, Ordering::Relaxed);
            }
            Ok(TickOutcome::DecodeFailed) => {
                stats.decode_failures.fetch_add(1, Ordering::Relaxed);
            }
            Ok(TickOutcome::NoDetections) => {}
            Ok(TickOutcome::Published { boxes }) => {
                stats.frames_published.fetch_add(1, Ordering::Relaxed);
                if let Ok(json) = serde_json::to_string(&boxes) {
                    tracing::debug!(boxes = %json, "frame published");
                }
            }
            Err(e) => {
                // Contained: the tick is abandoned, the loop goes on.
                tracing::warn!("tick failed: {e:#}");
            }
        }
        stats.ticks.fetch_add(1, Ordering::Relaxed);

        if let Some(rest) = period.checked_sub(started.elapsed()) {
            std::thread::sleep(rest);
        }
    }

    tracing::info!("filter worker finished gracefully");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mailbox::FrameProducer;
    use crate::output::ChannelSink;
    use crossbeam::channel::{unbounded, Receiver};
    use opencv::core::{count_non_zero, Scalar, Vec3b, CV_8UC3};
    use std::time::Duration;

    fn solid_frame(id: u64, b: f64, g: f64, r: f64) -> Frame {
        let mat =
            Mat::new_rows_cols_with_default(100, 100, CV_8UC3, Scalar::new(b, g, r, 0.0))
                .unwrap();
        Frame::new(id, mat)
    }

    fn blue_config(visualization: bool) -> FilterConfig {
        FilterConfig {
            publish_rate: 200.0,
            lower_color_boundary: [110, 100, 100],
            upper_color_boundary: [130, 255, 255],
            box_color: [0, 0, 255],
            visualization,
        }
    }

    fn harness(
        visualization: bool,
    ) -> (
        FrameMailbox,
        FilterConfig,
        ColorRange,
        (Box<dyn FrameSink>, Receiver<Frame>),
        (Box<dyn FrameSink>, Receiver<Frame>),
    ) {
        let config = blue_config(visualization);
        let range = config.color_range().unwrap();
        let (ftx, frx) = unbounded();
        let (vtx, vrx) = unbounded();
        (
            FrameMailbox::new(),
            config,
            range,
            (Box::new(ChannelSink::new("filtered", ftx)), frx),
            (Box::new(ChannelSink::new("visualization", vtx)), vrx),
        )
    }

    #[test]
    fn in_range_frame_publishes_on_both_channels() {
        let (mailbox, config, range, (fsink, frx), (vsink, vrx)) = harness(true);
        mailbox.put(solid_frame(1, 255.0, 0.0, 0.0));

        let outcome =
            process_tick(&mailbox, &config, &range, fsink.as_ref(), vsink.as_ref()).unwrap();
        assert_eq!(
            outcome,
            TickOutcome::Published {
                boxes: vec![BoundingBox {
                    x: 0,
                    y: 0,
                    width: 100,
                    height: 100
                }]
            }
        );

        // Filtered channel carries the untouched original.
        let original = frx.try_recv().unwrap();
        assert_eq!(original.id, 1);
        let px = *original.mat.at_2d::<Vec3b>(50, 50).unwrap();
        assert_eq!(px, Vec3b::from([255, 0, 0]));

        // Visualization channel carries the annotated copy with the same id.
        let annotated = vrx.try_recv().unwrap();
        assert_eq!(annotated.id, 1);
        let border = *annotated.mat.at_2d::<Vec3b>(0, 0).unwrap();
        assert_eq!(border, Vec3b::from([0, 0, 255]));
    }

    #[test]
    fn visualization_disabled_publishes_original_only() {
        let (mailbox, config, range, (fsink, frx), (vsink, vrx)) = harness(false);
        mailbox.put(solid_frame(2, 255.0, 0.0, 0.0));

        let outcome =
            process_tick(&mailbox, &config, &range, fsink.as_ref(), vsink.as_ref()).unwrap();
        assert!(matches!(outcome, TickOutcome::Published { .. }));
        assert_eq!(frx.try_recv().unwrap().id, 2);
        assert!(vrx.try_recv().is_err());
    }

    #[test]
    fn out_of_range_frame_publishes_nothing() {
        let (mailbox, config, range, (fsink, frx), (vsink, vrx)) = harness(true);
        mailbox.put(solid_frame(3, 0.0, 255.0, 0.0));

        let outcome =
            process_tick(&mailbox, &config, &range, fsink.as_ref(), vsink.as_ref()).unwrap();
        assert_eq!(outcome, TickOutcome::NoDetections);
        assert!(frx.try_recv().is_err());
        assert!(vrx.try_recv().is_err());
    }

    #[test]
    fn empty_mailbox_skips_the_tick() {
        let (mailbox, config, range, (fsink, _frx), (vsink, _vrx)) = harness(true);
        let outcome =
            process_tick(&mailbox, &config, &range, fsink.as_ref(), vsink.as_ref()).unwrap();
        assert_eq!(outcome, TickOutcome::SkippedEmpty);
    }

    #[test]
    fn contended_mailbox_is_a_skip_not_an_error() {
        let (mailbox, config, range, (fsink, _frx), (vsink, _vrx)) = harness(true);
        mailbox.put(solid_frame(4, 255.0, 0.0, 0.0));
        let _guard = mailbox.hold_lock();
        let outcome =
            process_tick(&mailbox, &config, &range, fsink.as_ref(), vsink.as_ref()).unwrap();
        assert_eq!(outcome, TickOutcome::SkippedContended);
    }

    #[test]
    fn undecodable_frame_abandons_the_tick() {
        let (mailbox, config, range, (fsink, frx), (vsink, _vrx)) = harness(true);
        mailbox.put(Frame::new(5, Mat::default()));
        let outcome =
            process_tick(&mailbox, &config, &range, fsink.as_ref(), vsink.as_ref()).unwrap();
        assert_eq!(outcome, TickOutcome::DecodeFailed);
        assert!(frx.try_recv().is_err());
    }

    #[test]
    fn detection_is_idempotent() {
        let config = blue_config(true);
        let range = config.color_range().unwrap();
        let frame = solid_frame(6, 255.0, 0.0, 0.0);

        let first = detect(&frame.mat, &range).unwrap();
        let second = detect(&frame.mat, &range).unwrap();
        let first_boxes = crate::pipeline::contours::bounding_boxes(&first).unwrap();
        let second_boxes = crate::pipeline::contours::bounding_boxes(&second).unwrap();
        assert_eq!(first_boxes, second_boxes);

        let a = draw_boxes(&frame.mat, &first, config.box_color).unwrap();
        let b = draw_boxes(&frame.mat, &second, config.box_color).unwrap();
        let mut diff = Mat::default();
        opencv::core::absdiff(&a, &b, &mut diff).unwrap();
        let mut gray = Mat::default();
        opencv::imgproc::cvt_color_def(&diff, &mut gray, opencv::imgproc::COLOR_BGR2GRAY)
            .unwrap();
        assert_eq!(count_non_zero(&gray).unwrap(), 0);
    }

    #[test]
    fn worker_loop_runs_until_shutdown() {
        let mailbox = Arc::new(FrameMailbox::new());
        let producer = FrameProducer::new(mailbox.clone());
        let stats = Arc::new(FilterStats::new());
        let (ftx, frx) = unbounded();
        let (vtx, vrx) = unbounded();

        let worker_mailbox = mailbox.clone();
        let worker_stats = stats.clone();
        let handle = std::thread::spawn(move || {
            filter_worker(
                worker_mailbox,
                blue_config(true),
                Box::new(ChannelSink::new("filtered", ftx)),
                Box::new(ChannelSink::new("visualization", vtx)),
                worker_stats,
            )
        });

        producer.on_frame_arrived(solid_frame(10, 255.0, 0.0, 0.0));
        let published = frx.recv_timeout(Duration::from_secs(5)).unwrap();
        assert_eq!(published.id, 10);
        let annotated = vrx.recv_timeout(Duration::from_secs(5)).unwrap();
        assert_eq!(annotated.id, 10);

        stats.shutdown();
        handle.join().unwrap().unwrap();
        assert_eq!(
            stats.frames_published.load(Ordering::Relaxed),
            1,
            "exactly one publish for one frame"
        );
        assert!(stats.ticks.load(Ordering::Relaxed) >= 1);
    }
}
