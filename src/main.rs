mod cli;
mod config;
mod mailbox;
mod output;
mod pipeline;
mod stats;
mod video;

use anyhow::{Context, Result};
use cli::Args;
use config::FilterConfig;
use mailbox::{FrameMailbox, FrameProducer};
use output::ChannelSink;
use pipeline::filter_worker::filter_worker;
use pipeline::types::Frame;
use stats::FilterStats;
use std::sync::Arc;
use std::thread;
use video::capture::CaptureSource;
use video::{capture_worker, FrameSource};

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env if present
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::fmt::init();

    let args = Args::parse_args();

    // Configuration validation is the only fatal failure mode.
    let config = FilterConfig::from_args(&args).context("invalid configuration")?;

    let source: Box<dyn FrameSource> = match &args.input {
        Some(path) => Box::new(CaptureSource::open_file(path)?),
        None => Box::new(CaptureSource::open_camera(args.camera)?),
    };

    let mailbox = Arc::new(FrameMailbox::new());
    let stats = Arc::new(FilterStats::new());

    let (filtered_tx, filtered_rx) = crossbeam::channel::bounded::<Frame>(1);
    let (visual_tx, visual_rx) = crossbeam::channel::bounded::<Frame>(1);

    // Downstream consumers of the two output channels. Stand-ins for the
    // real transport; they drain and log.
    let filtered_drain = thread::spawn(move || {
        for frame in filtered_rx {
            tracing::info!(frame_id = frame.id, stamp = %frame.stamp, "filtered frame");
        }
    });
    let visual_drain = thread::spawn(move || {
        for frame in visual_rx {
            tracing::info!(frame_id = frame.id, "visualization frame");
        }
    });

    let producer = FrameProducer::new(mailbox.clone());
    let capture_stats = stats.clone();
    let capture = thread::spawn(move || {
        if let Err(e) = capture_worker(source, producer, capture_stats) {
            tracing::error!("capture worker failed: {e:#}");
        }
    });

    let worker_mailbox = mailbox.clone();
    let worker_stats = stats.clone();
    let worker = thread::spawn(move || {
        if let Err(e) = filter_worker(
            worker_mailbox,
            config,
            Box::new(ChannelSink::new("filtered", filtered_tx)),
            Box::new(ChannelSink::new("visualization", visual_tx)),
            worker_stats,
        ) {
            tracing::error!("filter worker failed: {e:#}");
        }
    });

    tokio::signal::ctrl_c().await?;
    tracing::info!("shutdown signal received");
    stats.shutdown();

    capture.join().ok();
    worker.join().ok();
    filtered_drain.join().ok();
    visual_drain.join().ok();

    tracing::info!("run summary: {}", stats.to_summary_json());
    Ok(())
}
