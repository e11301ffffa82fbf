pub mod capture;

use crate::mailbox::FrameProducer;
use crate::pipeline::types::Frame;
use crate::stats::FilterStats;
use anyhow::Result;
use opencv::core::Mat;
use std::sync::Arc;

/// Subscribe/callback seam for the frame input. Implementations own the
/// device or transport; the core only pulls decoded BGR mats.
pub trait FrameSource: Send {
    fn next_frame(&mut self) -> Result<Mat>;
}

/// Producer path: reads frames from the source at its own pace, stamps
/// them, and hands each one to the mailbox. Frame loss under contention is
/// accepted; the capture path never waits on the consumer.
pub fn capture_worker(
    mut source: Box<dyn FrameSource>,
    producer: FrameProducer,
    stats: Arc<FilterStats>,
) -> Result<()> {
    let mut next_id: u64 = 0;

    while stats.active() {
        match source.next_frame() {
            Ok(mat) => {
                producer.on_frame_arrived(Frame::new(next_id, mat));
                next_id += 1;
            }
            Err(e) => {
                // End of stream or a device failure; either way the
                // producer path winds down without touching the consumer.
                tracing::info!("frame source exhausted after {} frames: {e:#}", next_id);
                break;
            }
        }
    }

    Ok(())
}
