use crate::pipeline::types::Frame;
use anyhow::{anyhow, Result};
use crossbeam::channel::Sender;

/// Publish capability handed to the processing loop. Keeping this narrow
/// lets tests drive the pipeline with plain channels and no transport.
pub trait FrameSink: Send + Sync {
    fn publish(&self, frame: Frame) -> Result<()>;
}

/// Sink backed by a crossbeam channel.
pub struct ChannelSink {
    name: &'static str,
    tx: Sender<Frame>,
}

impl ChannelSink {
    pub fn new(name: &'static str, tx: Sender<Frame>) -> Self {
        Self { name, tx }
    }
}

impl FrameSink for ChannelSink {
    fn publish(&self, frame: Frame) -> Result<()> {
        self.tx
            .send(frame)
            .map_err(|_| anyhow!("{} channel closed", self.name))
    }
}
