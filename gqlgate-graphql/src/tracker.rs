//! Error tracking for completed operations
//!
//! A tracker receives the error list of every executed operation exactly once,
//! right before the response is sent. Trackers must not block: the
//! [`ChannelErrorTracker`] hands reports to a background task that forwards
//! them to an [`ErrorSink`].

use async_graphql::ServerError;
use thiserror::Error;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::format::error_code_str;

/// Errors of one operation, as delivered to a tracker
#[derive(Debug, Clone, Copy)]
pub struct ErrorReport<'a> {
    pub request_id: &'a str,
    pub current_user: Option<&'a str>,
    pub errors: &'a [ServerError],
}

impl ErrorReport<'_> {
    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn to_tracked(&self) -> TrackedErrors {
        TrackedErrors {
            request_id: self.request_id.to_string(),
            current_user: self.current_user.map(str::to_string),
            errors: self.errors.to_vec(),
        }
    }
}

/// Owned copy of an [`ErrorReport`]
#[derive(Debug, Clone)]
pub struct TrackedErrors {
    pub request_id: String,
    pub current_user: Option<String>,
    pub errors: Vec<ServerError>,
}

#[derive(Debug, Error)]
pub enum TrackError {
    #[error("error report queue is full")]
    Backpressure,

    #[error("error reporter has shut down")]
    Closed,

    #[error("error sink failed: {0}")]
    Sink(String),
}

/// Receives the errors of each executed operation
pub trait ErrorTracker: Send + Sync {
    fn track(&self, report: ErrorReport<'_>) -> Result<(), TrackError>;
}

/// Asynchronous destination for reports drained by [`spawn_reporter`].
/// A failed delivery is logged and the reporter moves on to the next report.
#[async_trait::async_trait]
pub trait ErrorSink: Send + Sync + 'static {
    async fn report(&self, errors: TrackedErrors) -> Result<(), TrackError>;
}

/// Writes every error to the log
#[derive(Debug, Clone, Copy, Default)]
pub struct LoggingErrorTracker;

impl LoggingErrorTracker {
    fn log(request_id: &str, current_user: Option<&str>, errors: &[ServerError]) {
        for error in errors {
            let path = serde_json::to_string(&error.path).unwrap_or_default();

            warn!(
                request_id = %request_id,
                user = current_user.unwrap_or("anonymous"),
                code = error_code_str(error).unwrap_or("none"),
                path = %path,
                "GraphQL error: {}",
                error.message
            );
        }
    }
}

impl ErrorTracker for LoggingErrorTracker {
    fn track(&self, report: ErrorReport<'_>) -> Result<(), TrackError> {
        Self::log(report.request_id, report.current_user, report.errors);
        Ok(())
    }
}

#[async_trait::async_trait]
impl ErrorSink for LoggingErrorTracker {
    async fn report(&self, errors: TrackedErrors) -> Result<(), TrackError> {
        Self::log(&errors.request_id, errors.current_user.as_deref(), &errors.errors);
        Ok(())
    }
}

/// Discards every report
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopErrorTracker;

impl ErrorTracker for NoopErrorTracker {
    fn track(&self, _report: ErrorReport<'_>) -> Result<(), TrackError> {
        Ok(())
    }
}

/// Queues non-empty reports on a bounded channel without blocking
#[derive(Debug, Clone)]
pub struct ChannelErrorTracker {
    sender: mpsc::Sender<TrackedErrors>,
}

impl ChannelErrorTracker {
    pub fn new(capacity: usize) -> (Self, mpsc::Receiver<TrackedErrors>) {
        let (sender, receiver) = mpsc::channel(capacity.max(1));
        (Self { sender }, receiver)
    }
}

impl ErrorTracker for ChannelErrorTracker {
    fn track(&self, report: ErrorReport<'_>) -> Result<(), TrackError> {
        if report.is_empty() {
            return Ok(());
        }

        self.sender.try_send(report.to_tracked()).map_err(|e| match e {
            mpsc::error::TrySendError::Full(_) => TrackError::Backpressure,
            mpsc::error::TrySendError::Closed(_) => TrackError::Closed,
        })
    }
}

/// Drain queued reports into a sink until every tracker handle is dropped
pub fn spawn_reporter<S>(mut receiver: mpsc::Receiver<TrackedErrors>, sink: S) -> JoinHandle<()>
where
    S: ErrorSink,
{
    tokio::spawn(async move {
        while let Some(errors) = receiver.recv().await {
            let request_id = errors.request_id.clone();
            if let Err(e) = sink.report(errors).await {
                warn!(request_id = %request_id, "Dropped error report: {}", e);
            }
        }
        debug!("Error reporter stopped");
    })
}
