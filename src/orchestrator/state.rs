use std::collections::VecDeque;
use std::time::SystemTime;

use crate::gui::render::RenderPipeline;
use crate::gui::results_view::ResultsPanel;
use crate::network::network_graph::GraphStore;

const MAX_NOTIFICATIONS: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationLevel {
    Info,
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Notification {
    pub level: NotificationLevel,
    pub message: String,
    pub issued_at: SystemTime,
}

impl Notification {
    pub fn timestamp(&self) -> String {
        humantime::format_rfc3339_seconds(self.issued_at).to_string()
    }
}

/// Everything the UI reads and the orchestrator writes; owned by the app.
#[derive(Default)]
pub struct AppState {
    pub store: GraphStore,
    pub pipeline: RenderPipeline,
    pub results: ResultsPanel,
    notifications: VecDeque<Notification>,
}

impl AppState {
    pub fn new(pipeline: RenderPipeline) -> Self {
        Self {
            pipeline,
            ..Default::default()
        }
    }

    pub fn notify(&mut self, level: NotificationLevel, message: impl Into<String>) {
        if self.notifications.len() == MAX_NOTIFICATIONS {
            self.notifications.pop_front();
        }
        self.notifications.push_back(Notification {
            level,
            message: message.into(),
            issued_at: SystemTime::now(),
        });
    }

    /// Newest first.
    pub fn notifications(&self) -> impl Iterator<Item = &Notification> {
        self.notifications.iter().rev()
    }

    pub fn latest_notification(&self) -> Option<&Notification> {
        self.notifications.back()
    }

    pub fn dismiss_notifications(&mut self) {
        self.notifications.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_notifications_are_bounded() {
        let mut state = AppState::default();
        for i in 0..20 {
            state.notify(NotificationLevel::Info, format!("message {i}"));
        }
        assert_eq!(state.notifications().count(), MAX_NOTIFICATIONS);
        assert_eq!(state.latest_notification().unwrap().message, "message 19");
        assert_eq!(state.notifications().last().unwrap().message, "message 12");
        assert!(state.latest_notification().unwrap().timestamp().ends_with('Z'));
    }
}
