use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{mpsc, Notify};
use tokio::task::{JoinError, JoinHandle, JoinSet};

use crate::db::submission::CreateSubmission;
use crate::prelude::*;

/// Tells the site operator about a new submission.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, submission: &CreateSubmission) -> Result<()>;
}

/// A stored submission waiting to be announced.
#[derive(Debug)]
pub struct Notification {
    pub id: i64,
    pub submission: CreateSubmission,
}

/// Background notification queue.
///
/// Sends happen on a worker task, so callers never wait on SMTP. Outcomes are only logged.
pub struct Mailer {
    queue: mpsc::Sender<Notification>,
    /// Tell the worker to stop taking new work and finish what's queued
    shutdown: Arc<Notify>,

    handle: Mutex<Option<JoinHandle<()>>>,
}

impl Mailer {
    /// Spawn the worker. At most `capacity` notifications wait in the queue and `workers` are sent at once.
    pub fn new(notifier: Arc<dyn Notifier>, capacity: usize, workers: usize) -> Self {
        let (queue, rx) = mpsc::channel(capacity.max(1));
        let shutdown = Arc::new(Notify::new());
        let worker = Worker { notifier, rx, shutdown: shutdown.clone(), workers: workers.max(1) };

        let handle = tokio::task::spawn(worker.run());

        Self { queue, shutdown, handle: Mutex::new(Some(handle)) }
    }

    /// Queue a notification without waiting. Returns false if it had to be dropped.
    pub fn enqueue(&self, notification: Notification) -> bool {
        let id = notification.id;
        match self.queue.try_send(notification) {
            Ok(()) => true,
            Err(TrySendError::Full(_)) => {
                tracing::error!("Notification queue is full, dropping submission_id={id}");
                false
            }
            Err(TrySendError::Closed(_)) => {
                tracing::error!("Notification queue is closed, dropping submission_id={id}");
                false
            }
        }
    }

    /// Stop accepting notifications and wait for queued and in-flight sends to finish.
    pub async fn drain(&self) {
        self.shutdown.notify_one();
        let handle = self.handle.lock().unwrap_or_else(PoisonError::into_inner).take();
        if let Some(handle) = handle {
            if let Err(e) = handle.await {
                tracing::error!("Notification worker died: {e}");
            }
        }
    }
}

struct Worker {
    notifier: Arc<dyn Notifier>,
    rx: mpsc::Receiver<Notification>,
    shutdown: Arc<Notify>,
    workers: usize,
}

impl Worker {
    async fn run(mut self) {
        let mut sending = JoinSet::new();
        loop {
            tokio::select! {
                job = self.rx.recv() => match job {
                    Some(job) => self.start(&mut sending, job).await,
                    None => break,
                },
                _ = self.shutdown.notified() => {
                    self.rx.close();
                    while let Some(job) = self.rx.recv().await {
                        self.start(&mut sending, job).await;
                    }
                    break;
                }
                Some(res) = sending.join_next(), if !sending.is_empty() => log_join(res),
            }
        }

        while let Some(res) = sending.join_next().await {
            log_join(res);
        }
        tracing::info!("Notification queue drained");
    }

    /// Start sending one notification, first waiting for a free slot.
    async fn start(&self, sending: &mut JoinSet<()>, job: Notification) {
        while sending.len() >= self.workers {
            if let Some(res) = sending.join_next().await {
                log_join(res);
            }
        }

        let notifier = Arc::clone(&self.notifier);
        sending.spawn(async move {
            match notifier.notify(&job.submission).await {
                Ok(()) => tracing::info!("Sent notification for submission_id={}", job.id),
                Err(e) => tracing::error!("Failed to send notification for submission_id={}: {e:#}", job.id),
            }
        });
    }
}

fn log_join(res: Result<(), JoinError>) {
    if let Err(e) = res {
        tracing::error!("Notification task died: {e}");
    }
}
