use anyhow::Result;
use tokio::io::{AsyncRead, AsyncWrite};
use tracing::info;

use super::transport::{Incoming, LineTransport};
use super::types::HandlerResponse;
use super::QuizHandler;

/// Feeds events from `transport` through `handler` until the input closes.
pub async fn serve<R, W>(handler: &QuizHandler, transport: &mut LineTransport<R, W>) -> Result<()>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    info!("Handler listening for events");

    let mut handled = 0usize;
    while let Some(incoming) = transport.read_event().await? {
        let response = match incoming {
            Incoming::Event(event) => handler.handle(event).await,
            Incoming::Invalid(reason) => {
                HandlerResponse::bad_request(format!("Invalid event: {}", reason))
            }
        };
        transport.write_response(&response).await?;
        handled += 1;
    }

    info!(handled = handled, "Input closed");
    Ok(())
}
