//! Top-level console loop.

use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use super::dispatcher::{CommandDispatcher, DispatchOutcome};
use super::error::ConsoleError;
use super::feedback::FeedbackSubscriber;
use super::operator::Operator;
use crate::mqtt::transport::Transport;

const TERMINATED: &str = "\nControl Loop Terminated.";

/// Pauses that give the MQTT event loop room to run between prompts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoopTiming {
    pub before_prompt: Duration,
    pub after_dispatch: Duration,
}

impl Default for LoopTiming {
    fn default() -> Self {
        LoopTiming {
            before_prompt: Duration::from_millis(800),
            after_dispatch: Duration::from_millis(500),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExitReason {
    Interrupted,
    InputClosed,
    /// Operator I/O broke; carries the error text.
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoopExit {
    pub reason: ExitReason,
    pub published: usize,
    pub failed: usize,
}

pub struct ControlLoop {
    dispatcher: CommandDispatcher,
    subscriber: FeedbackSubscriber,
    timing: LoopTiming,
}

impl ControlLoop {
    pub fn new(
        dispatcher: CommandDispatcher,
        subscriber: FeedbackSubscriber,
        timing: LoopTiming,
    ) -> Self {
        ControlLoop {
            dispatcher,
            subscriber,
            timing,
        }
    }

    /// Registers feedback subscriptions once, then dispatches commands until
    /// `shutdown` is cancelled or operator input ends.
    ///
    /// Cancellation is honoured at any await point, including in the middle
    /// of a prompt; the pending command is dropped without publishing. Every
    /// exit, including a failed operator stream, ends with the termination
    /// message and a [`LoopExit`] so the caller can tear the connection down.
    pub async fn run<O, T>(
        &self,
        operator: &mut O,
        transport: &T,
        shutdown: CancellationToken,
    ) -> LoopExit
    where
        O: Operator + ?Sized,
        T: Transport + ?Sized,
    {
        let mut exit = LoopExit {
            reason: ExitReason::Interrupted,
            published: 0,
            failed: 0,
        };

        let reason = tokio::select! {
            biased;
            _ = shutdown.cancelled() => ExitReason::Interrupted,
            result = self.drive(operator, transport, &mut exit) => match result {
                Err(ConsoleError::InputClosed) => ExitReason::InputClosed,
                Err(e) => {
                    error!("Operator I/O failed: {}", e);
                    ExitReason::Failed(e.to_string())
                }
                Ok(never) => match never {},
            },
        };

        exit.reason = reason;
        info!(
            "Control loop stopped ({:?}): {} published, {} failed",
            exit.reason, exit.published, exit.failed
        );
        if let Err(e) = operator.show(TERMINATED).await {
            warn!("Could not show termination message: {}", e);
        }
        exit
    }

    async fn drive<O, T>(
        &self,
        operator: &mut O,
        transport: &T,
        exit: &mut LoopExit,
    ) -> Result<std::convert::Infallible, ConsoleError>
    where
        O: Operator + ?Sized,
        T: Transport + ?Sized,
    {
        let report = self.subscriber.subscribe_all(operator, transport).await?;
        if !report.failed.is_empty() {
            warn!(
                "{} of {} feedback subscriptions failed",
                report.failed.len(),
                self.subscriber.patterns().len()
            );
        }

        loop {
            tokio::time::sleep(self.timing.before_prompt).await;
            match self.dispatcher.dispatch_once(operator, transport).await? {
                DispatchOutcome::Published { .. } => exit.published += 1,
                DispatchOutcome::Failed { .. } => exit.failed += 1,
                DispatchOutcome::Ignored { .. } => {}
            }
            tokio::time::sleep(self.timing.after_dispatch).await;
        }
    }
}
