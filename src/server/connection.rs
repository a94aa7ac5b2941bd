//! Per-connection request handler.
//!
//! One request, one status, then close. The handler moves through
//! `name → surname → selector → [target] → respond → closed`; any read
//! failure before the status is written ends the connection with no response
//! at all, which the client must treat as an error.

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tracing::Instrument;

use crate::error::TesseraError;
use crate::protocol::{self, Request, Status};
use crate::service::TesseraService;

/// Runs a full exchange on an accepted TCP connection.
///
/// Errors are logged inside a `connection` span and never returned: a
/// failing connection must not affect the acceptor or other handlers.
pub async fn run_connection(stream: TcpStream, peer: SocketAddr, service: Arc<TesseraService>) {
    let conn_id = uuid::Uuid::new_v4();
    let span = tracing::info_span!("connection", %conn_id, %peer);

    async move {
        tracing::debug!("connection accepted");
        match handle_stream(stream, peer, &service).await {
            Ok(status) => tracing::debug!(%status, "response sent"),
            Err(err) => tracing::warn!(error = %err, "connection dropped without response"),
        }
    }
    .instrument(span)
    .await;
}

/// Reads one request from `stream`, applies it and writes the status.
///
/// The stream is shut down after the status is written. A failed shutdown
/// is only logged: the peer already has its answer.
///
/// # Errors
///
/// Returns [`TesseraError::Protocol`] if the request cannot be read or the
/// status cannot be written. In that case no status has reached the peer.
pub async fn handle_stream<S>(
    stream: S,
    peer: SocketAddr,
    service: &TesseraService,
) -> Result<Status, TesseraError>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let mut stream = BufReader::new(stream);

    let frame = protocol::read_frame(&mut stream).await?;
    tracing::debug!(
        selector = frame.selector,
        cancel_target = ?frame.target,
        "request decoded"
    );

    let status = if let Some(target) = frame.unknown_cancel_target() {
        service.reject_cancel_target(frame.name, frame.surname, target, peer)
    } else {
        let request = Request::try_from(frame)?;
        service.handle(request, peer).await
    };

    protocol::write_status(&mut stream, status).await?;
    if let Err(err) = stream.shutdown().await {
        tracing::debug!(error = %err, "shutdown after response failed");
    }
    Ok(status)
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use std::io;
    use std::pin::Pin;
    use std::task::{Context, Poll};

    use super::*;
    use crate::domain::{EventBus, PoolId, PoolRegistry, TesseraEvent};
    use crate::error::ProtocolError;

    /// Stream whose shutdown always fails, as on a peer that already reset.
    struct ResetOnShutdown<S>(S);

    impl<S: AsyncRead + Unpin> AsyncRead for ResetOnShutdown<S> {
        fn poll_read(
            mut self: Pin<&mut Self>,
            cx: &mut Context<'_>,
            buf: &mut tokio::io::ReadBuf<'_>,
        ) -> Poll<io::Result<()>> {
            Pin::new(&mut self.0).poll_read(cx, buf)
        }
    }

    impl<S: AsyncWrite + Unpin> AsyncWrite for ResetOnShutdown<S> {
        fn poll_write(
            mut self: Pin<&mut Self>,
            cx: &mut Context<'_>,
            buf: &[u8],
        ) -> Poll<io::Result<usize>> {
            Pin::new(&mut self.0).poll_write(cx, buf)
        }

        fn poll_flush(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
            Pin::new(&mut self.0).poll_flush(cx)
        }

        fn poll_shutdown(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
            Poll::Ready(Err(io::ErrorKind::ConnectionReset.into()))
        }
    }

    fn make_service() -> TesseraService {
        TesseraService::new(Arc::new(PoolRegistry::new()), EventBus::new(64))
    }

    fn peer() -> SocketAddr {
        SocketAddr::from(([127, 0, 0, 1], 60_000))
    }

    fn request_bytes(name: &[u8], surname: &[u8], ints: &[i32]) -> Vec<u8> {
        let mut buf = Vec::new();
        buf.extend_from_slice(name);
        buf.push(0);
        buf.extend_from_slice(surname);
        buf.push(0);
        for value in ints {
            buf.extend_from_slice(&value.to_le_bytes());
        }
        buf
    }

    #[tokio::test]
    async fn register_writes_success() {
        let service = make_service();
        let mock = tokio_test::io::Builder::new()
            .read(&request_bytes(b"Mario", b"Rossi", &[1]))
            .write(&1i32.to_le_bytes())
            .build();

        let result = handle_stream(mock, peer(), &service).await;
        assert!(matches!(result, Ok(Status::Success)));
        assert_eq!(service.registry().allocated(PoolId::Type1).await, 1);
    }

    #[tokio::test]
    async fn failed_shutdown_after_response_still_reports_status() {
        let service = make_service();
        let mock = tokio_test::io::Builder::new()
            .read(&request_bytes(b"Mario", b"Rossi", &[2]))
            .write(&1i32.to_le_bytes())
            .build();

        let result = handle_stream(ResetOnShutdown(mock), peer(), &service).await;
        assert!(matches!(result, Ok(Status::Success)));
        assert_eq!(service.registry().allocated(PoolId::Type2).await, 1);
    }

    #[tokio::test]
    async fn fields_may_arrive_in_pieces() {
        let service = make_service();
        let bytes = request_bytes(b"Mario", b"Rossi", &[4, 2]);
        let (head, tail) = bytes.split_at(8);
        let mock = tokio_test::io::Builder::new()
            .read(head)
            .read(tail)
            .write(&(-1i32).to_le_bytes())
            .build();

        let result = handle_stream(mock, peer(), &service).await;
        assert!(matches!(result, Ok(Status::Failure)));
    }

    #[tokio::test]
    async fn cancel_with_unknown_target_writes_failure() {
        let service = make_service();
        let mut rx = service.event_bus().subscribe();
        let mock = tokio_test::io::Builder::new()
            .read(&request_bytes(b"Anna", b"Neri", &[4, 0]))
            .write(&(-1i32).to_le_bytes())
            .build();

        let result = handle_stream(mock, peer(), &service).await;
        assert!(matches!(result, Ok(Status::Failure)));

        let Ok(TesseraEvent::CancellationRejected { name, target, .. }) = rx.recv().await else {
            panic!("expected cancellation_rejected");
        };
        assert_eq!(name, "Anna");
        assert_eq!(target, 0);
    }

    #[tokio::test]
    async fn invalid_selector_closes_without_response() {
        let service = make_service();
        let mock = tokio_test::io::Builder::new()
            .read(&request_bytes(b"a", b"b", &[7]))
            .build();

        let result = handle_stream(mock, peer(), &service).await;
        assert!(matches!(
            result,
            Err(TesseraError::Protocol(ProtocolError::InvalidSelector(7)))
        ));
        assert_eq!(
            service.registry().snapshot().await,
            crate::domain::PoolSnapshot::default()
        );
    }

    #[tokio::test]
    async fn truncated_request_closes_without_response() {
        let service = make_service();
        let mock = tokio_test::io::Builder::new().read(b"Mario\0Ros").build();

        let result = handle_stream(mock, peer(), &service).await;
        assert!(matches!(
            result,
            Err(TesseraError::Protocol(ProtocolError::ConnectionClosed))
        ));
    }
}
