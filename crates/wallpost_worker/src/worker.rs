//! Worker pool polling approved submissions and publishing them.

use crate::PublishSpacer;
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_retry2::strategy::FixedInterval;
use tokio_retry2::{Retry, RetryError};
use tracing::{debug, error, info, instrument, warn};
use wallpost_core::{PublishImages, Submission, SubmissionStatus, WallConfig, WorkerConfig};
use wallpost_error::{PublishError, PublishErrorKind, WallpostError, WallpostResult};
use wallpost_interface::{PublishClient, Renderer, SubmissionStore};

/// Pool of polling tasks that publish approved submissions.
///
/// Each worker runs on its own poll timer; publishes across the whole pool
/// are spaced by the configured rate-limit interval through a shared
/// [`PublishSpacer`]. [`stop`] signals every worker and waits for in-flight
/// ticks to complete.
///
/// [`stop`]: WorkerPool::stop
pub struct WorkerPool {
    config: WorkerConfig,
    wall: WallConfig,
    client: Arc<dyn PublishClient>,
    store: Arc<dyn SubmissionStore>,
    renderer: Arc<dyn Renderer>,
    spacer: Arc<PublishSpacer>,
    shutdown: watch::Sender<bool>,
    handles: Vec<JoinHandle<()>>,
}

impl WorkerPool {
    /// Create a pool; the configuration is validated here.
    ///
    /// # Errors
    ///
    /// Returns a configuration error for a zero worker count or poll
    /// interval.
    pub fn new(
        config: WorkerConfig,
        wall: WallConfig,
        client: Arc<dyn PublishClient>,
        store: Arc<dyn SubmissionStore>,
        renderer: Arc<dyn Renderer>,
    ) -> WallpostResult<Self> {
        config.validate()?;
        let (shutdown, _) = watch::channel(false);
        Ok(Self {
            config,
            wall,
            client,
            store,
            renderer,
            spacer: Arc::new(PublishSpacer::new()),
            shutdown,
            handles: Vec::new(),
        })
    }

    /// Launch the polling tasks.
    pub fn start(&mut self) {
        for id in 0..self.config.workers {
            let ctx = WorkerContext {
                id,
                config: self.config.clone(),
                wall: self.wall.clone(),
                client: Arc::clone(&self.client),
                store: Arc::clone(&self.store),
                renderer: Arc::clone(&self.renderer),
                spacer: Arc::clone(&self.spacer),
            };
            let mut shutdown = self.shutdown.subscribe();
            self.handles.push(tokio::spawn(async move {
                let mut ticker = tokio::time::interval(ctx.config.poll_interval());
                // Skip the immediate first tick.
                ticker.tick().await;
                debug!(worker = ctx.id, "worker polling");
                loop {
                    tokio::select! {
                        _ = shutdown.changed() => {
                            debug!(worker = ctx.id, "worker stopping");
                            return;
                        }
                        _ = ticker.tick() => {
                            ctx.poll_and_publish().await;
                        }
                    }
                }
            }));
        }
        info!(
            workers = self.config.workers,
            poll_interval_secs = self.config.poll_interval_secs,
            "worker pool started"
        );
    }

    /// Signal all workers and wait for in-flight ticks to finish.
    pub async fn stop(&mut self) {
        let _ = self.shutdown.send(true);
        for handle in self.handles.drain(..) {
            let _ = handle.await;
        }
        info!("worker pool stopped");
    }
}

struct WorkerContext {
    id: usize,
    config: WorkerConfig,
    wall: WallConfig,
    client: Arc<dyn PublishClient>,
    store: Arc<dyn SubmissionStore>,
    renderer: Arc<dyn Renderer>,
    spacer: Arc<PublishSpacer>,
}

impl WorkerContext {
    /// One poll tick: claim, rate-limit, publish with retries, persist the
    /// terminal status.
    #[instrument(skip(self), fields(worker = self.id))]
    async fn poll_and_publish(&self) {
        let mut post = match self.store.claim_approved().await {
            Ok(Some(post)) => post,
            Ok(None) => return,
            Err(e) => {
                warn!(error = %e, "failed to query approved submissions");
                return;
            }
        };
        info!(id = post.id, "processing submission");

        // The permit serializes publishes pool-wide; it is held until the
        // submission reaches a terminal state.
        let permit = self.spacer.acquire(self.config.rate_limit()).await;

        let strategy =
            FixedInterval::new(self.config.retry_delay()).take(self.config.retry_count as usize);
        let result = Retry::spawn(strategy, || async {
            self.attempt_publish(&post).await.map_err(|e| {
                warn!(id = post.id, error = %e, "publish attempt failed");
                RetryError::transient(e)
            })
        })
        .await;

        match result {
            Ok(tid) => {
                info!(id = post.id, tid = %tid, "submission published");
                post.tid = tid;
                post.status = SubmissionStatus::Published;
                post.reason = None;
                if let Err(e) = self.store.save(&post).await {
                    error!(id = post.id, error = %e, "failed to record published status");
                }
                permit.mark();
            }
            Err(e) => {
                drop(permit);
                error!(id = post.id, error = %e, "submission failed permanently");
                post.status = SubmissionStatus::Failed;
                post.reason = Some(format!("publish failed: {e}"));
                if let Err(e) = self.store.save(&post).await {
                    error!(id = post.id, error = %e, "failed to record failed status");
                }
            }
        }
    }

    /// One publish attempt. Returns the external post identifier.
    async fn attempt_publish(&self, post: &Submission) -> Result<String, WallpostError> {
        let text = self
            .wall
            .compose_text(post.display_name(), &post.text, post.anonymous);

        let mut images = PublishImages {
            bytes: Vec::new(),
            urls: post.images.clone(),
        };
        // Renderer unavailability degrades to text plus raw references.
        if self.renderer.available() {
            match self.renderer.render(post).await {
                Ok(bytes) => images.bytes.push(bytes),
                Err(e) => debug!(id = post.id, error = %e, "render failed, continuing without"),
            }
        }

        let resp = self.client.publish(&text, &images).await?;
        if !resp.ok {
            return Err(PublishError::new(PublishErrorKind::Api {
                code: resp.code,
                message: resp.message.clone(),
            })
            .into());
        }

        let tid = resp
            .field_str("tid")
            .or_else(|| resp.field_str("t1_tid"))
            .map(str::to_string)
            // No identifier in the response; mark published with a
            // synthesized placeholder.
            .unwrap_or_else(|| format!("published_{}", chrono::Utc::now().timestamp()));
        Ok(tid)
    }
}
