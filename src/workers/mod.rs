//! # Draw Worker Pool
//!
//! Runs draw jobs on a fixed pool of producer threads so the host thread,
//! which also ticks the placement scheduler, never blocks on drawing.
//!
//! ## Architecture Overview
//! - `DrawWorkerPool`: distributes jobs and collects their reports
//! - `DrawJob`: a unit of drawing work
//! - `DrawReport`: the outcome of a job, returned to the host thread
//! - `WorkerChannel`: job and report channels for one worker thread
//!
//! ## Job Lifecycle
//! 1. Jobs are published via `DrawWorkerPool::publish_job()`
//! 2. The pool hands them to idle workers round-robin, queueing the rest
//! 3. Workers run each job, which enqueues placements for the scheduler
//! 4. Reports are picked up on the host thread in `collect_reports()`
//! 5. `process_queued_jobs()` feeds queued jobs to workers that became idle
//!
//! ## Example Usage
//! ```rust,no_run
//! # use voxel_placer::workers::{DrawWorkerPool, DrawServices};
//! # fn demo(services: DrawServices, mut scheduler: voxel_placer::placement::PlacementScheduler) {
//! let mut pool = DrawWorkerPool::new(4, services);
//!
//! // In the host loop:
//! scheduler.tick();
//! for report in pool.collect_reports() {
//!     println!("{} placed {}", report.producer, report.session.placed);
//! }
//! pool.process_queued_jobs();
//! # }
//! ```

mod job;

pub use job::{DrawJob, DrawReport, DrawServices};

use std::{
    collections::VecDeque,
    sync::mpsc::{channel, Receiver, Sender},
    thread::{self, JoinHandle},
};

use log::{info, warn};

/// Maximum number of jobs handed to one worker at a time.
///
/// Keeping this at 1 leaves unstarted jobs in the pool's own queue, where a
/// worker that frees up first can take them.
pub const MAX_JOBS_IN_FLIGHT: usize = 1;

/// Job and report channels for one worker thread.
struct WorkerChannel {
    job_sender: Sender<Box<dyn DrawJob>>,
    report_receiver: Receiver<DrawReport>,
    jobs_in_flight: usize,
    worker: JoinHandle<()>,
}

/// A pool of producer threads running draw jobs.
pub struct DrawWorkerPool {
    channels: Vec<WorkerChannel>,
    queued_jobs: VecDeque<Box<dyn DrawJob>>,
    current_channel: usize,
    services: DrawServices,
}

impl DrawWorkerPool {
    /// Starts `num_workers` worker threads sharing `services`.
    ///
    /// # Arguments
    /// * `num_workers` - Worker threads to start. With zero workers, jobs stay
    ///   queued forever.
    /// * `services` - Shared quantizer, placement queue and configuration
    pub fn new(num_workers: usize, services: DrawServices) -> Self {
        let mut channels = Vec::with_capacity(num_workers);

        for index in 0..num_workers {
            let (job_tx, job_rx) = channel::<Box<dyn DrawJob>>();
            let (report_tx, report_rx) = channel::<DrawReport>();
            let worker_services = services.clone();

            let worker = thread::Builder::new()
                .name(format!("draw-worker-{index}"))
                .spawn(move || {
                    while let Ok(job) = job_rx.recv() {
                        let report = job.run(&worker_services);
                        if report_tx.send(report).is_err() {
                            break;
                        }
                    }
                });

            match worker {
                Ok(worker) => channels.push(WorkerChannel {
                    job_sender: job_tx,
                    report_receiver: report_rx,
                    jobs_in_flight: 0,
                    worker,
                }),
                Err(err) => warn!("Failed to start draw worker {}: {}", index, err),
            }
        }

        info!(
            "Started {} draw workers (available parallelism: {:?})",
            channels.len(),
            thread::available_parallelism()
        );

        DrawWorkerPool {
            channels,
            queued_jobs: VecDeque::new(),
            current_channel: 0,
            services,
        }
    }

    /// The services shared with the workers.
    pub fn services(&self) -> &DrawServices {
        &self.services
    }

    fn try_send_job(
        &mut self,
        job: Box<dyn DrawJob>,
        channel_idx: usize,
    ) -> Result<(), Box<dyn DrawJob>> {
        let channel = &mut self.channels[channel_idx];
        match channel.job_sender.send(job) {
            Ok(()) => {
                channel.jobs_in_flight += 1;
                Ok(())
            }
            Err(err) => Err(err.0),
        }
    }

    /// Finds the next worker below `MAX_JOBS_IN_FLIGHT`, round-robin from the
    /// last one used.
    fn find_available_channel(&self) -> Option<usize> {
        let count = self.channels.len();
        (0..count)
            .map(|step| (self.current_channel + step) % count)
            .find(|&idx| self.channels[idx].jobs_in_flight < MAX_JOBS_IN_FLIGHT)
    }

    /// Publishes a job.
    ///
    /// # Returns
    /// - `true` if a worker took the job immediately
    /// - `false` if it was queued because every worker is busy
    pub fn publish_job(&mut self, job: Box<dyn DrawJob>) -> bool {
        let Some(channel_idx) = self.find_available_channel() else {
            self.queued_jobs.push_back(job);
            return false;
        };

        match self.try_send_job(job, channel_idx) {
            Ok(()) => {
                self.current_channel = (channel_idx + 1) % self.channels.len();
                true
            }
            Err(job) => {
                self.queued_jobs.push_back(job);
                false
            }
        }
    }

    /// Hands queued jobs to idle workers, oldest first.
    pub fn process_queued_jobs(&mut self) {
        while let Some(channel_idx) = self.find_available_channel() {
            let Some(job) = self.queued_jobs.pop_front() else {
                return;
            };
            match self.try_send_job(job, channel_idx) {
                Ok(()) => self.current_channel = (channel_idx + 1) % self.channels.len(),
                Err(job) => {
                    // Worker is gone; keep the job for the next call.
                    self.queued_jobs.push_front(job);
                    return;
                }
            }
        }
    }

    /// Collects the reports of every job finished since the last call.
    ///
    /// Never blocks. Must be called from the host thread.
    pub fn collect_reports(&mut self) -> Vec<DrawReport> {
        let mut reports = Vec::new();
        for channel in &mut self.channels {
            while let Ok(report) = channel.report_receiver.try_recv() {
                channel.jobs_in_flight = channel.jobs_in_flight.saturating_sub(1);
                info!(
                    "{} finished {}: {} enqueued, {} dropped, {} empty",
                    report.producer,
                    report.label,
                    report.session.placed,
                    report.session.dropped,
                    report.empty
                );
                reports.push(report);
            }
        }
        reports
    }

    /// Number of jobs waiting for a worker.
    pub fn queued_len(&self) -> usize {
        self.queued_jobs.len()
    }

    /// Number of jobs currently running on workers.
    pub fn in_flight(&self) -> usize {
        self.channels.iter().map(|c| c.jobs_in_flight).sum()
    }

    /// Whether every published job has reported back.
    pub fn is_idle(&self) -> bool {
        self.queued_jobs.is_empty() && self.in_flight() == 0
    }

    /// Stops the pool and joins its workers.
    ///
    /// Requests placement-queue shutdown first, so workers blocked under
    /// backpressure return. Jobs still queued in the pool are dropped.
    pub fn shutdown(self) {
        self.services.queue.shutdown();
        let dropped = self.queued_jobs.len();
        if dropped > 0 {
            info!("Dropping {} queued draw jobs", dropped);
        }

        let workers: Vec<JoinHandle<()>> = self
            .channels
            .into_iter()
            .map(|channel| channel.worker)
            .collect();
        for worker in workers {
            let name = worker.thread().name().unwrap_or("draw-worker").to_string();
            if worker.join().is_err() {
                warn!("{} panicked", name);
            }
        }
    }
}
