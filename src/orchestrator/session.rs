//! Interactive session loop.
//!
//! Receives commands from the UI thread, drives the controller, and forwards sink calls
//! back as events. Activations that arrive while an invocation is in flight are dropped.

use super::controller::RequestController;
use crate::model::{AnalysisRequest, AnalysisResponse};
use crate::presentation::{ChannelSink, SinkEvent};
use crate::transport::AnalysisTransport;
use anyhow::Result;
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender};
use tokio::time::Duration;
use tokio_util::sync::CancellationToken;

/// Commands emitted by UI layers.
#[derive(Debug, Clone)]
pub(crate) enum UiCommand {
    Analyze(AnalysisRequest),
    Quit,
}

/// Events consumed by UI layers.
#[derive(Debug, Clone)]
pub(crate) enum SessionEvent {
    Sink(SinkEvent),
    Completed {
        // Boxed to keep the enum small; responses carry an inline image.
        response: Box<AnalysisResponse>,
    },
}

impl From<SinkEvent> for SessionEvent {
    fn from(ev: SinkEvent) -> Self {
        SessionEvent::Sink(ev)
    }
}

pub(crate) async fn run_session<T: AnalysisTransport>(
    transport: T,
    deadline: Duration,
    event_tx: UnboundedSender<SessionEvent>,
    mut cmd_rx: UnboundedReceiver<UiCommand>,
) -> Result<()> {
    let shutdown = CancellationToken::new();
    let mut controller = RequestController::new(transport, ChannelSink::new(event_tx.clone()))
        .with_deadline(deadline)
        .with_shutdown(shutdown.clone());

    loop {
        let request = match cmd_rx.recv().await {
            Some(UiCommand::Analyze(request)) => request,
            Some(UiCommand::Quit) | None => break,
        };

        let mut quit_pending = false;
        {
            let run = controller.run_analysis(request);
            tokio::pin!(run);
            loop {
                tokio::select! {
                    () = &mut run => break,
                    cmd = cmd_rx.recv(), if !quit_pending => match cmd {
                        Some(UiCommand::Analyze(_)) => {
                            tracing::debug!("analysis already in flight; activation ignored");
                        }
                        // Quit cancels the invocation but still lets it restore the UI.
                        Some(UiCommand::Quit) | None => {
                            quit_pending = true;
                            shutdown.cancel();
                        }
                    },
                }
            }
        }
        if quit_pending {
            break;
        }

        if let Some(response) = controller.last_response() {
            let _ = event_tx.send(SessionEvent::Completed {
                response: Box::new(response.clone()),
            });
        }
    }

    Ok(())
}
