use anyhow::Result;
use futures::{SinkExt, StreamExt};
use tokio::io::{AsyncRead, AsyncWrite, BufReader};
use tokio_util::codec::{FramedRead, FramedWrite, LinesCodec, LinesCodecError};
use tracing::{debug, error, warn};

use super::types::{HandlerEvent, HandlerResponse};

/// Longest accepted event line, in bytes.
pub const MAX_EVENT_LINE_BYTES: usize = 1024 * 1024;

/// One line read from the transport.
#[derive(Debug)]
pub enum Incoming {
    Event(HandlerEvent),
    /// The line was not a JSON event object; carries the reason.
    Invalid(String),
}

/// Newline-delimited JSON events in, newline-delimited responses out.
pub struct LineTransport<R, W> {
    reader: FramedRead<BufReader<R>, LinesCodec>,
    writer: FramedWrite<W, LinesCodec>,
    max_line_length: usize,
}

pub type StdioTransport = LineTransport<tokio::io::Stdin, tokio::io::Stdout>;

impl StdioTransport {
    pub fn stdio() -> Self {
        Self::new(tokio::io::stdin(), tokio::io::stdout())
    }
}

impl<R, W> LineTransport<R, W>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    pub fn new(reader: R, writer: W) -> Self {
        Self::with_max_line_length(reader, writer, MAX_EVENT_LINE_BYTES)
    }

    pub fn with_max_line_length(reader: R, writer: W, max_line_length: usize) -> Self {
        let reader = FramedRead::new(
            BufReader::new(reader),
            LinesCodec::new_with_max_length(max_line_length),
        );
        let writer = FramedWrite::new(writer, LinesCodec::new());

        Self {
            reader,
            writer,
            max_line_length,
        }
    }

    /// Returns `Ok(None)` at end of input. Blank lines are skipped; an
    /// oversized line is discarded and reported as invalid.
    pub async fn read_event(&mut self) -> Result<Option<Incoming>> {
        loop {
            match self.reader.next().await {
                Some(Ok(line)) => {
                    if line.trim().is_empty() {
                        continue;
                    }
                    debug!("Received: {}", line);

                    return match serde_json::from_str::<HandlerEvent>(&line) {
                        Ok(event) => Ok(Some(Incoming::Event(event))),
                        Err(e) => {
                            error!("Failed to parse event: {}", e);
                            Ok(Some(Incoming::Invalid(e.to_string())))
                        }
                    };
                }
                Some(Err(LinesCodecError::MaxLineLengthExceeded)) => {
                    warn!(limit = self.max_line_length, "Event line too long; discarding");
                    return Ok(Some(Incoming::Invalid(format!(
                        "line exceeds {} bytes",
                        self.max_line_length
                    ))));
                }
                Some(Err(e)) => {
                    error!("Error reading input: {}", e);
                    return Err(anyhow::anyhow!("Transport error: {}", e));
                }
                None => {
                    debug!("EOF reached");
                    return Ok(None);
                }
            }
        }
    }

    pub async fn write_response(&mut self, response: &HandlerResponse) -> Result<()> {
        let json = serde_json::to_string(response)?;
        debug!("Sending: {}", json);

        self.writer.send(json).await?;

        Ok(())
    }
}
