//! Click event model for asynchronous click accounting.

/// A successful resolution waiting to be counted.
///
/// Created by the redirect path after the destination is known and sent
/// through a bounded channel to [`crate::domain::click_worker::run_click_worker`].
/// The redirect response never waits for the event to be persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClickEvent {
    pub link_id: i64,
    pub short_code: String,
}

impl ClickEvent {
    pub fn new(link_id: i64, short_code: impl Into<String>) -> Self {
        Self {
            link_id,
            short_code: short_code.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_click_event_creation() {
        let event = ClickEvent::new(42, "promo1");

        assert_eq!(event.link_id, 42);
        assert_eq!(event.short_code, "promo1");
    }
}
