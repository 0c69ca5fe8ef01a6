//! Test doubles for the transport and presentation seams.

use crate::model::AnalysisRequest;
use crate::presentation::{BannerTone, PresentationSink, Region, RenderedRow, Screen};
use crate::transport::{AnalysisTransport, RawResponse, TransportError};
use anyhow::{bail, Result};
use reqwest::StatusCode;
use std::collections::VecDeque;
use std::sync::{
    atomic::{AtomicBool, AtomicUsize, Ordering},
    Arc, Mutex,
};
use tokio::time::Duration;
use tokio_util::sync::CancellationToken;

#[derive(Debug, Clone)]
enum Step {
    Respond(u16, String),
    Delayed(Duration, u16, String),
    IgnoreCancel(Duration, u16, String),
    Hang,
    ConnectionRefused,
}

/// Transport that plays back a fixed list of outcomes; the last one repeats.
pub(crate) struct ScriptedTransport {
    steps: Mutex<VecDeque<Step>>,
    requests: Arc<Mutex<Vec<AnalysisRequest>>>,
    cancelled: Arc<AtomicBool>,
    calls: Arc<AtomicUsize>,
}

fn raw(status: u16, body: String) -> RawResponse {
    RawResponse {
        status: StatusCode::from_u16(status).unwrap(),
        body,
    }
}

impl ScriptedTransport {
    fn from_steps(steps: Vec<Step>) -> Self {
        Self {
            steps: Mutex::new(steps.into()),
            requests: Arc::default(),
            cancelled: Arc::default(),
            calls: Arc::default(),
        }
    }

    pub fn respond(status: u16, body: &str) -> Self {
        Self::from_steps(vec![Step::Respond(status, body.to_string())])
    }

    pub fn sequence(responses: Vec<(u16, String)>) -> Self {
        Self::from_steps(
            responses
                .into_iter()
                .map(|(s, b)| Step::Respond(s, b))
                .collect(),
        )
    }

    pub fn delayed(delay: Duration, status: u16, body: &str) -> Self {
        Self::from_steps(vec![Step::Delayed(delay, status, body.to_string())])
    }

    /// Responds after `delay` even if cancelled in the meantime.
    pub fn ignore_cancel(delay: Duration, status: u16, body: &str) -> Self {
        Self::from_steps(vec![Step::IgnoreCancel(delay, status, body.to_string())])
    }

    /// Never responds; only returns once cancelled.
    pub fn hang() -> Self {
        Self::from_steps(vec![Step::Hang])
    }

    pub fn connection_refused() -> Self {
        Self::from_steps(vec![Step::ConnectionRefused])
    }

    pub fn requests(&self) -> Arc<Mutex<Vec<AnalysisRequest>>> {
        self.requests.clone()
    }

    pub fn cancelled_flag(&self) -> Arc<AtomicBool> {
        self.cancelled.clone()
    }

    pub fn call_counter(&self) -> Arc<AtomicUsize> {
        self.calls.clone()
    }

    fn next_step(&self) -> Step {
        let mut steps = self.steps.lock().unwrap();
        if steps.len() > 1 {
            steps.pop_front().unwrap()
        } else {
            steps.front().cloned().expect("script must not be empty")
        }
    }
}

impl AnalysisTransport for ScriptedTransport {
    async fn analyze(
        &self,
        request: &AnalysisRequest,
        cancel: &CancellationToken,
    ) -> Result<RawResponse, TransportError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().unwrap().push(request.clone());

        match self.next_step() {
            Step::Respond(status, body) => Ok(raw(status, body)),
            Step::Delayed(delay, status, body) => {
                tokio::select! {
                    _ = cancel.cancelled() => {
                        self.cancelled.store(true, Ordering::Relaxed);
                        Err(TransportError::Cancelled)
                    }
                    _ = tokio::time::sleep(delay) => Ok(raw(status, body)),
                }
            }
            Step::IgnoreCancel(delay, status, body) => {
                tokio::time::sleep(delay).await;
                Ok(raw(status, body))
            }
            Step::Hang => {
                cancel.cancelled().await;
                self.cancelled.store(true, Ordering::Relaxed);
                Err(TransportError::Cancelled)
            }
            Step::ConnectionRefused => {
                let err = reqwest::Client::new()
                    .get("http://127.0.0.1:1/")
                    .send()
                    .await
                    .expect_err("nothing listens on port 1");
                Err(TransportError::Http(err))
            }
        }
    }
}

/// Screen wrapper that records every call and can fail or panic on a chosen row.
#[derive(Debug, Default)]
pub(crate) struct FlakySink {
    pub screen: Screen,
    pub calls: Vec<String>,
    fail_on_row: Option<usize>,
    fail_on_clear: bool,
    panic_on_row: Option<usize>,
}

impl FlakySink {
    pub fn failing_on_row(index: usize) -> Self {
        Self {
            fail_on_row: Some(index),
            ..Default::default()
        }
    }

    /// Every `clear_rows` call fails.
    pub fn failing_on_clear() -> Self {
        Self {
            fail_on_clear: true,
            ..Default::default()
        }
    }

    pub fn panicking_on_row(index: usize) -> Self {
        Self {
            panic_on_row: Some(index),
            ..Default::default()
        }
    }
}

impl PresentationSink for FlakySink {
    fn set_text(&mut self, text: &str, tone: BannerTone) -> Result<()> {
        self.calls.push(format!("text:{tone:?}:{text}"));
        self.screen.set_text(text, tone)
    }

    fn set_visible(&mut self, region: Region, visible: bool) -> Result<()> {
        self.calls.push(format!("visible:{region:?}:{visible}"));
        self.screen.set_visible(region, visible)
    }

    fn set_image_source(&mut self, source: &str) -> Result<()> {
        self.calls.push(format!("image:{source}"));
        self.screen.set_image_source(source)
    }

    fn append_row(&mut self, row: RenderedRow) -> Result<()> {
        self.calls.push(format!("row:{}", row.index));
        if self.panic_on_row == Some(row.index) {
            self.panic_on_row = None;
            panic!("injected panic on row {}", row.index);
        }
        if self.fail_on_row == Some(row.index) {
            bail!("injected sink failure");
        }
        self.screen.append_row(row)
    }

    fn clear_rows(&mut self) -> Result<()> {
        self.calls.push("clear_rows".into());
        if self.fail_on_clear {
            bail!("injected clear failure");
        }
        self.screen.clear_rows()
    }

    fn set_enabled(&mut self, enabled: bool) -> Result<()> {
        self.calls.push(format!("enabled:{enabled}"));
        self.screen.set_enabled(enabled)
    }

    fn set_label(&mut self, label: &str) -> Result<()> {
        self.calls.push(format!("label:{label}"));
        self.screen.set_label(label)
    }
}
