//! Command dispatch: menu selection to published payload.

use std::sync::Arc;

use tracing::{debug, info, warn};

use super::commands::CommandTable;
use super::encoder;
use super::error::ConsoleError;
use super::operator::Operator;
use super::validator::{prompt_until_valid, Value};
use crate::mqtt::topics::TopicRegistry;
use crate::mqtt::transport::Transport;

const VALUE_PROMPT: &str = "Value: ";

/// Result of one pass through the dispatcher.
#[derive(Debug, Clone, PartialEq)]
pub enum DispatchOutcome {
    Published { topic: String, value: Value },
    /// The selected key has no command; nothing was sent.
    Ignored { key: i64 },
    /// Encoding or publishing failed; the operator has been told why.
    Failed { reason: String },
}

/// Runs the "awaiting selection" state once per call.
pub struct CommandDispatcher {
    commands: Arc<CommandTable>,
    topics: Arc<TopicRegistry>,
}

impl CommandDispatcher {
    pub fn new(commands: Arc<CommandTable>, topics: Arc<TopicRegistry>) -> Self {
        CommandDispatcher { commands, topics }
    }

    /// Shows the menu, reads a key and a value, then encodes and publishes.
    ///
    /// Only operator I/O errors are returned; everything else is reported to
    /// the operator and folded into the [`DispatchOutcome`].
    pub async fn dispatch_once<O, T>(
        &self,
        operator: &mut O,
        transport: &T,
    ) -> Result<DispatchOutcome, ConsoleError>
    where
        O: Operator + ?Sized,
        T: Transport + ?Sized,
    {
        let menu = self.commands.menu();
        let key = match prompt_until_valid(operator, &menu, &self.commands.key_kind()).await? {
            Value::Integer(key) => key,
            other => {
                warn!("Menu selection produced {:?}, expected a key", other);
                return Ok(DispatchOutcome::Ignored { key: 0 });
            }
        };

        self.dispatch_key(key, operator, transport).await
    }

    /// Reads a value for the command on `key` and publishes it.
    pub async fn dispatch_key<O, T>(
        &self,
        key: i64,
        operator: &mut O,
        transport: &T,
    ) -> Result<DispatchOutcome, ConsoleError>
    where
        O: Operator + ?Sized,
        T: Transport + ?Sized,
    {
        let Some(command) = self.commands.lookup(key) else {
            debug!("No command registered on key {}", key);
            return Ok(DispatchOutcome::Ignored { key });
        };

        let value = prompt_until_valid(operator, VALUE_PROMPT, &command.kind).await?;
        let topic = self.topics.routed_name(command.role);

        let payload = match encoder::encode(command.role, &value) {
            Ok(payload) => payload,
            Err(e) => {
                warn!("Could not encode {} for {}: {}", value, topic, e);
                operator.show(&format!("Encoding error: {}", e)).await?;
                return Ok(DispatchOutcome::Failed {
                    reason: e.to_string(),
                });
            }
        };

        match transport.publish(topic, payload).await {
            Ok(()) => {
                info!("Published {} = {} to {}", command.label, value, topic);
                Ok(DispatchOutcome::Published {
                    topic: topic.to_string(),
                    value,
                })
            }
            Err(e) => {
                warn!("{}", e);
                operator.show(&format!("Transport error: {}", e)).await?;
                Ok(DispatchOutcome::Failed {
                    reason: e.to_string(),
                })
            }
        }
    }
}
