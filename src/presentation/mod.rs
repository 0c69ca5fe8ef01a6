//! Presentation sink boundary.
//!
//! The controller never touches a concrete UI. It writes through [`PresentationSink`],
//! which any surface (terminal UI, in-memory screen, test double) can implement.

mod screen;

pub use screen::Screen;

use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc::UnboundedSender;

/// Areas that can be shown or hidden.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Region {
    Banner,
    Image,
    Table,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum BannerTone {
    #[default]
    Info,
    Error,
}

/// Visual class attached to the safety cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SafetyClass {
    Positive,
    Negative,
}

/// A table row with every cell already formatted for display.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderedRow {
    pub index: usize,
    pub nearest_city: String,
    pub safety: String,
    pub safety_class: Option<SafetyClass>,
    pub temp_c: String,
    pub wind_ms: String,
    pub condition: String,
}

pub trait PresentationSink {
    fn set_text(&mut self, text: &str, tone: BannerTone) -> Result<()>;
    fn set_visible(&mut self, region: Region, visible: bool) -> Result<()>;
    fn set_image_source(&mut self, source: &str) -> Result<()>;
    fn append_row(&mut self, row: RenderedRow) -> Result<()>;
    fn clear_rows(&mut self) -> Result<()>;
    fn set_enabled(&mut self, enabled: bool) -> Result<()>;
    fn set_label(&mut self, label: &str) -> Result<()>;
}

/// One sink call, captured so it can cross a thread boundary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SinkEvent {
    Text { text: String, tone: BannerTone },
    Visible { region: Region, visible: bool },
    ImageSource(String),
    // Boxed to keep the enum small next to the unit-like variants.
    AppendRow(Box<RenderedRow>),
    ClearRows,
    Enabled(bool),
    Label(String),
}

impl SinkEvent {
    /// Replay this call onto another sink.
    pub fn apply_to<S: PresentationSink + ?Sized>(self, sink: &mut S) -> Result<()> {
        match self {
            SinkEvent::Text { text, tone } => sink.set_text(&text, tone),
            SinkEvent::Visible { region, visible } => sink.set_visible(region, visible),
            SinkEvent::ImageSource(src) => sink.set_image_source(&src),
            SinkEvent::AppendRow(row) => sink.append_row(*row),
            SinkEvent::ClearRows => sink.clear_rows(),
            SinkEvent::Enabled(e) => sink.set_enabled(e),
            SinkEvent::Label(l) => sink.set_label(&l),
        }
    }
}

/// Forwards every call as a [`SinkEvent`] to a UI running on another thread.
#[derive(Debug, Clone)]
pub struct ChannelSink<E> {
    tx: UnboundedSender<E>,
}

impl<E: From<SinkEvent>> ChannelSink<E> {
    pub fn new(tx: UnboundedSender<E>) -> Self {
        Self { tx }
    }

    fn send(&self, ev: SinkEvent) -> Result<()> {
        self.tx
            .send(E::from(ev))
            .map_err(|_| anyhow!("presentation channel closed"))
    }
}

impl<E: From<SinkEvent>> PresentationSink for ChannelSink<E> {
    fn set_text(&mut self, text: &str, tone: BannerTone) -> Result<()> {
        self.send(SinkEvent::Text {
            text: text.to_string(),
            tone,
        })
    }

    fn set_visible(&mut self, region: Region, visible: bool) -> Result<()> {
        self.send(SinkEvent::Visible { region, visible })
    }

    fn set_image_source(&mut self, source: &str) -> Result<()> {
        self.send(SinkEvent::ImageSource(source.to_string()))
    }

    fn append_row(&mut self, row: RenderedRow) -> Result<()> {
        self.send(SinkEvent::AppendRow(Box::new(row)))
    }

    fn clear_rows(&mut self) -> Result<()> {
        self.send(SinkEvent::ClearRows)
    }

    fn set_enabled(&mut self, enabled: bool) -> Result<()> {
        self.send(SinkEvent::Enabled(enabled))
    }

    fn set_label(&mut self, label: &str) -> Result<()> {
        self.send(SinkEvent::Label(label.to_string()))
    }
}
