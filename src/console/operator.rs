//! The operator side of the console: where text comes from and where
//! messages go.

use std::io::BufRead;

use async_trait::async_trait;
use tokio::io::{AsyncWriteExt, Stdout};
use tokio::sync::mpsc;
use tracing::debug;

use super::error::ConsoleError;

/// Line-oriented access to whoever is driving the console.
#[async_trait]
pub trait Operator: Send {
    /// Shows `prompt` and waits for one line of text, without its line
    /// terminator. Returns [`ConsoleError::InputClosed`] at end of input.
    async fn read_line(&mut self, prompt: &str) -> Result<String, ConsoleError>;

    /// Shows a message on its own line.
    async fn show(&mut self, message: &str) -> Result<(), ConsoleError>;
}

/// Terminal operator backed by the process's stdin and stdout.
///
/// Stdin is read on a detached OS thread: a blocking read on tokio's stdin
/// would keep the runtime alive after an interrupt until the operator
/// pressed enter.
pub struct StdioOperator {
    lines: mpsc::Receiver<std::io::Result<String>>,
    stdout: Stdout,
}

impl StdioOperator {
    pub fn new() -> Self {
        Self::from_reader(std::io::BufReader::new(std::io::stdin()))
    }

    /// Reads operator lines from `reader` instead of stdin.
    pub fn from_reader<R: BufRead + Send + 'static>(reader: R) -> Self {
        let (tx, rx) = mpsc::channel(16);
        std::thread::spawn(move || read_lines(reader, tx));

        StdioOperator {
            lines: rx,
            stdout: tokio::io::stdout(),
        }
    }
}

/// Forwards raw lines until end of input or until the receiver is gone.
///
/// Bytes that are not UTF-8 are replaced rather than treated as an I/O
/// failure, so the validator sees them and asks again.
fn read_lines<R: BufRead>(mut reader: R, tx: mpsc::Sender<std::io::Result<String>>) {
    let mut buf = Vec::new();
    loop {
        buf.clear();
        let line = match reader.read_until(b'\n', &mut buf) {
            Ok(0) => break,
            Ok(_) => Ok(decode_line(&buf)),
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
            Err(e) => Err(e),
        };
        let failed = line.is_err();
        if tx.blocking_send(line).is_err() || failed {
            break;
        }
    }
    debug!("Stdin reader finished");
}

fn decode_line(raw: &[u8]) -> String {
    let raw = raw.strip_suffix(b"\n").unwrap_or(raw);
    let raw = raw.strip_suffix(b"\r").unwrap_or(raw);
    String::from_utf8_lossy(raw).into_owned()
}

impl Default for StdioOperator {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Operator for StdioOperator {
    async fn read_line(&mut self, prompt: &str) -> Result<String, ConsoleError> {
        self.stdout.write_all(prompt.as_bytes()).await?;
        self.stdout.flush().await?;

        match self.lines.recv().await {
            Some(line) => Ok(line?),
            None => Err(ConsoleError::InputClosed),
        }
    }

    async fn show(&mut self, message: &str) -> Result<(), ConsoleError> {
        self.stdout.write_all(message.as_bytes()).await?;
        self.stdout.write_all(b"\n").await?;
        self.stdout.flush().await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::console::commands::CommandTable;
    use crate::console::control_loop::{ControlLoop, ExitReason, LoopTiming};
    use crate::console::dispatcher::CommandDispatcher;
    use crate::console::feedback::FeedbackSubscriber;
    use crate::console::testing::RecordingTransport;
    use crate::mqtt::topics::TopicRegistry;
    use std::io::Cursor;
    use std::sync::Arc;
    use std::time::Duration;
    use tokio_util::sync::CancellationToken;

    #[test]
    fn test_decode_line_strips_terminators() {
        assert_eq!(decode_line(b"12.5\n"), "12.5");
        assert_eq!(decode_line(b"cardio\r\n"), "cardio");
        assert_eq!(decode_line(b"last"), "last");
        assert_eq!(decode_line(b"\xff\n"), "\u{fffd}");
    }

    #[tokio::test]
    async fn test_non_utf8_line_is_read_as_text() {
        let mut operator = StdioOperator::from_reader(Cursor::new(b"\xffbad\nok\n".to_vec()));

        assert_eq!(operator.read_line("").await.unwrap(), "\u{fffd}bad");
        assert_eq!(operator.read_line("").await.unwrap(), "ok");
        assert!(matches!(
            operator.read_line("").await,
            Err(ConsoleError::InputClosed)
        ));
    }

    #[tokio::test]
    async fn test_non_utf8_value_is_reprompted_then_published_once() {
        let topics = Arc::new(TopicRegistry::new("000001"));
        let control_loop = ControlLoop::new(
            CommandDispatcher::new(Arc::new(CommandTable::smartbike().unwrap()), topics),
            FeedbackSubscriber::default(),
            LoopTiming {
                before_prompt: Duration::ZERO,
                after_dispatch: Duration::ZERO,
            },
        );
        let mut operator = StdioOperator::from_reader(Cursor::new(b"1\n\xff\n12.5\n".to_vec()));
        let transport = RecordingTransport::default();

        let exit = control_loop
            .run(&mut operator, &transport, CancellationToken::new())
            .await;

        assert_eq!(exit.reason, ExitReason::InputClosed);
        let published = transport.published();
        assert_eq!(published.len(), 1);
        assert_eq!(published[0].0, "bike/000001/incline/control");
        let payload: serde_json::Value = serde_json::from_slice(&published[0].1).unwrap();
        assert_eq!(payload["incline"].as_f64(), Some(12.5));
    }
}
