use super::{BannerTone, PresentationSink, Region, RenderedRow};
use crate::orchestrator::TRIGGER_LABEL;
use anyhow::Result;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Banner {
    pub visible: bool,
    pub tone: BannerTone,
    pub text: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Image {
    pub visible: bool,
    pub source: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Table {
    pub visible: bool,
    pub rows: Vec<RenderedRow>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Trigger {
    pub enabled: bool,
    pub label: String,
}

impl Default for Trigger {
    fn default() -> Self {
        Self {
            enabled: true,
            label: TRIGGER_LABEL.to_string(),
        }
    }
}

/// In-memory mirror of the fixed layout: banner, image, table and trigger.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Screen {
    pub banner: Banner,
    pub image: Image,
    pub table: Table,
    pub trigger: Trigger,
}

impl Screen {
    pub fn shows_error(&self) -> bool {
        self.banner.visible && self.banner.tone == BannerTone::Error
    }

    pub fn shows_success(&self) -> bool {
        self.banner.visible && self.banner.tone == BannerTone::Info && self.table.visible
    }
}

impl PresentationSink for Screen {
    fn set_text(&mut self, text: &str, tone: BannerTone) -> Result<()> {
        self.banner.text = text.to_string();
        self.banner.tone = tone;
        Ok(())
    }

    fn set_visible(&mut self, region: Region, visible: bool) -> Result<()> {
        match region {
            Region::Banner => self.banner.visible = visible,
            Region::Image => self.image.visible = visible,
            Region::Table => self.table.visible = visible,
        }
        Ok(())
    }

    fn set_image_source(&mut self, source: &str) -> Result<()> {
        self.image.source = source.to_string();
        Ok(())
    }

    fn append_row(&mut self, row: RenderedRow) -> Result<()> {
        self.table.rows.push(row);
        Ok(())
    }

    fn clear_rows(&mut self) -> Result<()> {
        self.table.rows.clear();
        Ok(())
    }

    fn set_enabled(&mut self, enabled: bool) -> Result<()> {
        self.trigger.enabled = enabled;
        Ok(())
    }

    fn set_label(&mut self, label: &str) -> Result<()> {
        self.trigger.label = label.to_string();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_screen_is_empty_and_ready() {
        let screen = Screen::default();
        assert!(!screen.banner.visible);
        assert!(!screen.image.visible);
        assert!(!screen.table.visible);
        assert!(screen.table.rows.is_empty());
        assert!(screen.trigger.enabled);
        assert_eq!(screen.trigger.label, TRIGGER_LABEL);
        assert!(!screen.shows_error());
        assert!(!screen.shows_success());
    }

    #[test]
    fn error_banner_is_detected() {
        let mut screen = Screen::default();
        screen.set_text("boom", BannerTone::Error).unwrap();
        assert!(!screen.shows_error());
        screen.set_visible(Region::Banner, true).unwrap();
        assert!(screen.shows_error());
    }
}
