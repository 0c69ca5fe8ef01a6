use crate::model::{AnalysisRequest, AnalysisResponse};
use crate::presentation::{BannerTone, Screen, SinkEvent};
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Field {
    #[default]
    Departure,
    Arrival,
}

impl Field {
    pub fn next(self) -> Self {
        match self {
            Field::Departure => Field::Arrival,
            Field::Arrival => Field::Departure,
        }
    }
}

pub struct UiState {
    pub tab: usize,
    pub screen: Screen,
    pub departure: String,
    pub arrival: String,
    pub focus: Field,
    pub info: String,
    pub api_key: Option<String>,
    pub base_url: String,
    pub deadline: Duration,
    pub in_flight_since: Option<Instant>,
    pub last_response: Option<AnalysisResponse>,
    pub last_exported_path: Option<String>,
}

impl Default for UiState {
    fn default() -> Self {
        Self {
            tab: 0,
            screen: Screen::default(),
            departure: String::new(),
            arrival: String::new(),
            focus: Field::Departure,
            info: String::new(),
            api_key: None,
            base_url: String::new(),
            deadline: crate::orchestrator::DEFAULT_DEADLINE,
            in_flight_since: None,
            last_response: None,
            last_exported_path: None,
        }
    }
}

impl UiState {
    pub fn focused_mut(&mut self) -> &mut String {
        match self.focus {
            Field::Departure => &mut self.departure,
            Field::Arrival => &mut self.arrival,
        }
    }

    /// Build the request from the live form, or `None` while the trigger is inert.
    pub fn take_trigger(&mut self) -> Option<AnalysisRequest> {
        if !self.screen.trigger.enabled {
            return None;
        }
        // Inert immediately; the controller re-enables it when the invocation ends.
        self.screen.trigger.enabled = false;
        self.info.clear();
        Some(
            AnalysisRequest::new(self.departure.as_str(), self.arrival.as_str())
                .with_api_key(self.api_key.clone()),
        )
    }

    pub fn apply_sink_event(&mut self, ev: SinkEvent) {
        match &ev {
            SinkEvent::Enabled(false) => self.in_flight_since = Some(Instant::now()),
            SinkEvent::Enabled(true) => self.in_flight_since = None,
            SinkEvent::ClearRows => self.last_response = None,
            _ => {}
        }
        // The in-memory screen cannot fail.
        let _ = ev.apply_to(&mut self.screen);
    }

    pub fn banner_is_error(&self) -> bool {
        self.screen.banner.tone == BannerTone::Error
    }

    /// Trigger label, with elapsed seconds while an invocation is running.
    pub fn trigger_text(&self) -> String {
        match self.in_flight_since {
            Some(t) => format!("{} {}s", self.screen.trigger.label, t.elapsed().as_secs()),
            None => self.screen.trigger.label.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::orchestrator::{BUSY_LABEL, TRIGGER_LABEL};

    #[test]
    fn trigger_is_inert_until_re_enabled() {
        let mut state = UiState {
            departure: " Paris ".into(),
            arrival: "Rome".into(),
            ..Default::default()
        };
        let req = state.take_trigger().unwrap();
        assert_eq!(req.departure, " Paris ");
        assert!(state.take_trigger().is_none());

        state.apply_sink_event(SinkEvent::Enabled(false));
        state.apply_sink_event(SinkEvent::Label(BUSY_LABEL.into()));
        assert!(state.take_trigger().is_none());
        assert!(state.trigger_text().starts_with(BUSY_LABEL));

        state.apply_sink_event(SinkEvent::Enabled(true));
        state.apply_sink_event(SinkEvent::Label(TRIGGER_LABEL.into()));
        assert_eq!(state.trigger_text(), TRIGGER_LABEL);
        assert!(state.take_trigger().is_some());
    }

    #[test]
    fn focus_cycles_between_fields() {
        let mut state = UiState::default();
        state.focused_mut().push_str("Oslo");
        state.focus = state.focus.next();
        state.focused_mut().push_str("Bergen");
        assert_eq!(state.departure, "Oslo");
        assert_eq!(state.arrival, "Bergen");
        assert_eq!(state.focus.next(), Field::Departure);
    }
}
