//! # Event Interface
//!
//! Events are published on a PUB socket as a single frame of the form `"<topic> <payload>"`, the
//! topic allowing subscribers to filter with `set_subscribe`. Payloads are opaque and may be empty.

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

/// Topic published when the operator presses the start button.
pub const BUTTON_PRESS_TOPIC: &str = "button_press";

/// Topic published to request the system executable shuts down.
pub const SHUTDOWN_TOPIC: &str = "shutdown";

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// An event received from the event topic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// The operator button was pressed, with the (opaque) payload that came with it
    ButtonPress(String),

    /// An external shutdown was requested
    Shutdown,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl Event {
    /// Parse an event from a received message, `None` if the topic is not recognised.
    pub fn parse(msg: &str) -> Option<Self> {
        let (topic, payload) = match msg.find(' ') {
            Some(i) => (&msg[..i], msg[i + 1..].trim()),
            None => (msg.trim(), ""),
        };

        match topic {
            BUTTON_PRESS_TOPIC => Some(Event::ButtonPress(payload.to_string())),
            SHUTDOWN_TOPIC => Some(Event::Shutdown),
            _ => None,
        }
    }

    /// Format the event as a message ready to be published.
    pub fn to_msg(&self) -> String {
        match self {
            Event::ButtonPress(p) if p.is_empty() => BUTTON_PRESS_TOPIC.to_string(),
            Event::ButtonPress(p) => format!("{} {}", BUTTON_PRESS_TOPIC, p),
            Event::Shutdown => SHUTDOWN_TOPIC.to_string(),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_parse() {
        assert_eq!(Event::parse("button_press"), Some(Event::ButtonPress(String::new())));
        assert_eq!(
            Event::parse("button_press {\"id\": 3}"),
            Some(Event::ButtonPress("{\"id\": 3}".into()))
        );
        assert_eq!(Event::parse("shutdown"), Some(Event::Shutdown));
        assert_eq!(Event::parse("button_pressed"), None);
        assert_eq!(Event::parse(""), None);
    }

    #[test]
    fn test_to_msg() {
        assert_eq!(Event::ButtonPress(String::new()).to_msg(), "button_press");
        assert_eq!(Event::ButtonPress("left".into()).to_msg(), "button_press left");
        assert_eq!(Event::parse(&Event::Shutdown.to_msg()), Some(Event::Shutdown));
    }
}
