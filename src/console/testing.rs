//! Test doubles for the operator and the broker.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use super::error::ConsoleError;
use super::operator::Operator;
use crate::mqtt::transport::{Transport, TransportError};

/// What happens once a scripted operator runs out of lines.
pub enum AfterScript {
    /// Report closed input.
    Close,
    /// Cancel the token and then wait forever, like an operator who stops
    /// typing and hits Ctrl-C.
    Interrupt(CancellationToken),
    /// Report a broken input stream.
    Fail,
}

pub struct ScriptedOperator {
    lines: VecDeque<String>,
    after: AfterScript,
    pub prompts: Vec<String>,
    pub shown: Vec<String>,
}

impl ScriptedOperator {
    pub fn new<'a>(lines: impl IntoIterator<Item = &'a str>) -> Self {
        ScriptedOperator {
            lines: lines.into_iter().map(str::to_string).collect(),
            after: AfterScript::Close,
            prompts: Vec::new(),
            shown: Vec::new(),
        }
    }

    pub fn interrupt_after(mut self, token: CancellationToken) -> Self {
        self.after = AfterScript::Interrupt(token);
        self
    }

    pub fn fail_after(mut self) -> Self {
        self.after = AfterScript::Fail;
        self
    }
}

#[async_trait]
impl Operator for ScriptedOperator {
    async fn read_line(&mut self, prompt: &str) -> Result<String, ConsoleError> {
        self.prompts.push(prompt.to_string());
        if let Some(line) = self.lines.pop_front() {
            return Ok(line);
        }

        match &self.after {
            AfterScript::Close => Err(ConsoleError::InputClosed),
            AfterScript::Interrupt(token) => {
                token.cancel();
                std::future::pending().await
            }
            AfterScript::Fail => Err(ConsoleError::Io(std::io::Error::new(
                std::io::ErrorKind::BrokenPipe,
                "broken pipe",
            ))),
        }
    }

    async fn show(&mut self, message: &str) -> Result<(), ConsoleError> {
        self.shown.push(message.to_string());
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Publish { topic: String, payload: Vec<u8> },
    Subscribe(String),
}

/// Records every call; topics or patterns listed in `failing` are rejected.
#[derive(Default)]
pub struct RecordingTransport {
    calls: Mutex<Vec<Call>>,
    failing: Vec<String>,
}

impl RecordingTransport {
    pub fn failing_on<'a>(names: impl IntoIterator<Item = &'a str>) -> Self {
        RecordingTransport {
            calls: Mutex::new(Vec::new()),
            failing: names.into_iter().map(str::to_string).collect(),
        }
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn published(&self) -> Vec<(String, Vec<u8>)> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                Call::Publish { topic, payload } => Some((topic, payload)),
                Call::Subscribe(_) => None,
            })
            .collect()
    }
}

#[async_trait]
impl Transport for RecordingTransport {
    async fn publish(&self, topic: &str, payload: Vec<u8>) -> Result<(), TransportError> {
        self.calls.lock().unwrap().push(Call::Publish {
            topic: topic.to_string(),
            payload,
        });
        if self.failing.iter().any(|t| t == topic) {
            return Err(TransportError::Publish {
                topic: topic.to_string(),
                reason: "broker unavailable".to_string(),
            });
        }
        Ok(())
    }

    async fn subscribe(&self, pattern: &str) -> Result<(), TransportError> {
        self.calls
            .lock()
            .unwrap()
            .push(Call::Subscribe(pattern.to_string()));
        if self.failing.iter().any(|t| t == pattern) {
            return Err(TransportError::Subscribe {
                pattern: pattern.to_string(),
                reason: "not authorized".to_string(),
            });
        }
        Ok(())
    }
}
