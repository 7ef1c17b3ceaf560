//! # Draw Jobs
//!
//! A draw job is one placement-originating operation (a statue, an image, a
//! box) run on a producer thread of the worker pool.
//!
//! ## Job Lifecycle
//! 1. A `DrawJob` is created and published via `DrawWorkerPool::publish_job()`
//! 2. The job's `run()` method is called on a worker thread with the shared
//!    `DrawServices`
//! 3. The job opens a `ProducerSession`, enqueues its placements and finishes
//!    the session; this may block under backpressure
//! 4. The returned `DrawReport` is collected on the host thread in
//!    `collect_reports()`
//!
//! ## Thread Safety
//! - `DrawJob` must be `Send` to be transferred to a worker thread
//! - `DrawServices` is shared between workers; everything in it is thread-safe

use std::sync::Arc;

use crate::{
    config::PlacementConfig,
    palette::ColorQuantizer,
    placement::{PlacementQueue, ProducerId, ProducerSession, SessionSummary},
};

/// Thread-safe services every draw job can use.
///
/// Constructed once by the host and handed to the worker pool; there is no
/// global state behind it.
#[derive(Clone)]
pub struct DrawServices {
    /// Color-to-material lookup
    pub quantizer: Arc<ColorQuantizer>,
    /// Queue drained by the scheduler
    pub queue: Arc<PlacementQueue>,
    /// Placement settings
    pub config: Arc<PlacementConfig>,
}

impl DrawServices {
    /// Bundles the services.
    pub fn new(
        quantizer: Arc<ColorQuantizer>,
        queue: Arc<PlacementQueue>,
        config: Arc<PlacementConfig>,
    ) -> Self {
        DrawServices {
            quantizer,
            queue,
            config,
        }
    }

    /// Opens a placement session for `producer`.
    pub fn open_session(&self, producer: ProducerId) -> ProducerSession {
        ProducerSession::new(producer, self.queue.clone(), &self.config)
    }
}

/// Outcome of one finished draw job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DrawReport {
    /// Producer the job drew for
    pub producer: ProducerId,
    /// Short description of what was drawn
    pub label: String,
    /// Voxels the drawing produced, before quantization
    pub sampled: usize,
    /// Voxels skipped because their color quantized to `EMPTY`
    pub empty: usize,
    /// What the session enqueued and dropped
    pub session: SessionSummary,
}

/// A unit of drawing work executed on a worker thread.
///
/// Jobs should own all the data they need: they are moved to a worker thread
/// and may outlive the caller's borrows.
pub trait DrawJob: Send {
    /// Draws into a fresh session and reports what happened.
    ///
    /// Runs on a worker thread and may block under placement backpressure.
    fn run(self: Box<Self>, services: &DrawServices) -> DrawReport;
}
