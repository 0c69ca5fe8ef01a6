//! Request lifecycle controller.
//!
//! Owns one invocation at a time: resets the presentation, dispatches with a deadline,
//! classifies the outcome, renders it, and always hands the trigger back.

use super::render::{interpret, render_row};
use crate::error::AnalysisError;
use crate::model::{AnalysisRequest, AnalysisResponse, InvocationState};
use crate::presentation::{BannerTone, PresentationSink, Region};
use crate::transport::{AnalysisTransport, TransportError};
use anyhow::{anyhow, Context};
use futures::FutureExt;
use std::panic::AssertUnwindSafe;
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};
use tokio::task::JoinHandle;
use tokio::time::Duration;
use tokio_util::sync::CancellationToken;

pub const TRIGGER_LABEL: &str = "Analyze Route";
pub const BUSY_LABEL: &str = "Analyzing…";
pub const DEFAULT_ALERT: &str = "Done";
pub const DEFAULT_DEADLINE: Duration = Duration::from_secs(15);

/// Cancellation handle and deadline timer of the invocation in flight.
struct Invocation {
    cancel: CancellationToken,
    expired: Arc<AtomicBool>,
    timer: JoinHandle<()>,
}

impl Invocation {
    fn start(parent: &CancellationToken, deadline: Duration) -> Self {
        let cancel = parent.child_token();
        let expired = Arc::new(AtomicBool::new(false));
        let timer = {
            let cancel = cancel.clone();
            let expired = expired.clone();
            tokio::spawn(async move {
                tokio::time::sleep(deadline).await;
                expired.store(true, Ordering::Relaxed);
                cancel.cancel();
            })
        };
        Self {
            cancel,
            expired,
            timer,
        }
    }

    fn expired(&self) -> bool {
        self.expired.load(Ordering::Relaxed)
    }
}

pub struct RequestController<T, S> {
    transport: T,
    sink: S,
    deadline: Duration,
    shutdown: CancellationToken,
    state: InvocationState,
    active: Option<Invocation>,
    last_response: Option<AnalysisResponse>,
}

impl<T, S> RequestController<T, S>
where
    T: AnalysisTransport,
    S: PresentationSink,
{
    pub fn new(transport: T, sink: S) -> Self {
        Self {
            transport,
            sink,
            deadline: DEFAULT_DEADLINE,
            shutdown: CancellationToken::new(),
            state: InvocationState::Idle,
            active: None,
            last_response: None,
        }
    }

    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = deadline;
        self
    }

    /// Token whose cancellation aborts any invocation in flight (e.g. on quit).
    pub fn with_shutdown(mut self, shutdown: CancellationToken) -> Self {
        self.shutdown = shutdown;
        self
    }

    pub fn state(&self) -> InvocationState {
        self.state
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn into_sink(self) -> S {
        self.sink
    }

    /// Response rendered by the most recent invocation, if it succeeded.
    pub fn last_response(&self) -> Option<&AnalysisResponse> {
        self.last_response.as_ref()
    }

    /// Run one invocation. All outcomes are reported through the sink only.
    pub async fn run_analysis(&mut self, input: AnalysisRequest) {
        if !self.state.can_start() {
            tracing::debug!("analysis already in flight; activation ignored");
            return;
        }
        let request = input.trimmed();
        tracing::info!(departure = %request.departure, arrival = %request.arrival, "analysis started");
        self.transition(InvocationState::InFlight);

        let outcome = match AssertUnwindSafe(self.invoke(&request)).catch_unwind().await {
            Ok(outcome) => outcome,
            Err(panic) => Err(AnalysisError::Unexpected(anyhow!(
                "internal error: {}",
                panic_message(panic.as_ref())
            ))),
        };

        match outcome {
            Ok(rows) => {
                tracing::info!(rows, "analysis completed");
                self.transition(InvocationState::Completed);
            }
            Err(err) => {
                tracing::warn!(kind = err.kind(), error = ?err, "analysis failed");
                self.transition(InvocationState::Failed);
                let shown = std::panic::catch_unwind(AssertUnwindSafe(|| self.show_failure(&err)));
                match shown {
                    Ok(Ok(())) => {}
                    Ok(Err(e)) => tracing::error!(error = ?e, "failed to display error banner"),
                    Err(panic) => tracing::error!(
                        "error banner panicked: {}",
                        panic_message(panic.as_ref())
                    ),
                }
            }
        }

        self.finalize();
    }

    fn transition(&mut self, next: InvocationState) {
        if self.state.can_transition_to(next) {
            tracing::debug!(from = ?self.state, to = ?next, "invocation state");
            self.state = next;
        } else {
            tracing::error!(from = ?self.state, to = ?next, "rejected invocation state transition");
        }
    }

    /// Steps from reset through rendering. Returns the number of rows rendered.
    async fn invoke(&mut self, request: &AnalysisRequest) -> Result<usize, AnalysisError> {
        self.last_response = None;
        self.reset_presentation()
            .context("clear previous result")?;

        self.sink.set_enabled(false)?;
        self.sink.set_label(BUSY_LABEL)?;

        let invocation = Invocation::start(&self.shutdown, self.deadline);
        let cancel = invocation.cancel.clone();
        self.active = Some(invocation);

        let dispatched = self.transport.analyze(request, &cancel).await;
        let expired = self.active.as_ref().is_some_and(Invocation::expired);

        let raw = match dispatched {
            // A response that lands after the deadline still counts as a timeout.
            _ if expired => return Err(AnalysisError::Timeout),
            Ok(raw) => raw,
            Err(TransportError::Cancelled) => return Err(AnalysisError::Cancelled),
            Err(e @ TransportError::Http(_)) => return Err(AnalysisError::Unexpected(e.into())),
        };
        tracing::debug!(status = %raw.status, bytes = raw.body.len(), "response received");

        let response = interpret(raw)?;
        self.show_success(&response).context("render result")?;
        let rows = response.rows.len();
        self.last_response = Some(response);
        Ok(rows)
    }

    fn reset_presentation(&mut self) -> anyhow::Result<()> {
        self.sink.set_visible(Region::Banner, false)?;
        self.sink.set_visible(Region::Image, false)?;
        self.sink.set_visible(Region::Table, false)?;
        self.sink.clear_rows()
    }

    fn show_success(&mut self, response: &AnalysisResponse) -> anyhow::Result<()> {
        let alert = response.alert.as_deref().unwrap_or(DEFAULT_ALERT);
        self.sink.set_text(alert, BannerTone::Info)?;
        self.sink.set_visible(Region::Banner, true)?;

        self.sink.set_image_source(&response.plot)?;
        self.sink.set_visible(Region::Image, true)?;

        for (i, row) in response.rows.iter().enumerate() {
            self.sink.append_row(render_row(i + 1, row))?;
        }
        self.sink.set_visible(Region::Table, true)
    }

    fn show_failure(&mut self, err: &AnalysisError) -> anyhow::Result<()> {
        // Drop anything a failed render left behind. Every step runs even if an earlier
        // one fails, so the banner still shows; the first error is reported.
        let steps = [
            self.sink.set_visible(Region::Image, false),
            self.sink.set_visible(Region::Table, false),
            self.sink.clear_rows(),
            self.sink.set_text(&err.user_message(), BannerTone::Error),
            self.sink.set_visible(Region::Banner, true),
        ];
        steps.into_iter().collect()
    }

    /// Release the deadline timer and hand the trigger back. Runs on every exit path.
    fn finalize(&mut self) {
        if let Some(invocation) = self.active.take() {
            invocation.timer.abort();
        }
        if let Err(e) = self.sink.set_enabled(true) {
            tracing::error!(error = ?e, "failed to re-enable trigger");
        }
        if let Err(e) = self.sink.set_label(TRIGGER_LABEL) {
            tracing::error!(error = ?e, "failed to restore trigger label");
        }
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "panic".to_string()
    }
}
