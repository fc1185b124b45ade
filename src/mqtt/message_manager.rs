use chrono::NaiveDateTime;
use std::fmt;

const PREVIEW_CHARS: usize = 40;

/// A feedback message received from the broker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MqttMessage {
    pub topic: String,
    pub content: String,
    pub timestamp: NaiveDateTime,
}

impl fmt::Display for MqttMessage {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} - {}: {}", self.timestamp, self.topic, self.preview())
    }
}

impl MqttMessage {
    pub fn from_topic(topic: String, content: String) -> Self {
        MqttMessage {
            topic,
            content,
            timestamp: chrono::Local::now().naive_local(),
        }
    }

    /// Builds a message from a raw publish; non-UTF-8 bytes are replaced.
    pub fn from_publish(topic: &str, payload: &[u8]) -> Self {
        Self::from_topic(topic.to_string(), String::from_utf8_lossy(payload).into_owned())
    }

    /// The content cut to a log-friendly length, on a char boundary.
    pub fn preview(&self) -> String {
        let mut chars = self.content.chars();
        let preview: String = chars.by_ref().take(PREVIEW_CHARS).collect();
        if chars.next().is_some() {
            format!("{}...", preview)
        } else {
            preview
        }
    }
}
