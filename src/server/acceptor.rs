//! Listening socket and accept loop.
//!
//! Each accepted connection is handed to its own task and never joined.
//! There is no concurrency limit and no graceful shutdown: the loop runs
//! until the process exits, and the kernel backlog is the only queue.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::net::TcpListener;

use super::connection::run_connection;
use crate::error::TesseraError;
use crate::service::TesseraService;

/// Pause after a failed `accept` before trying again.
const ACCEPT_RETRY_DELAY: Duration = Duration::from_millis(100);

/// Bound listener that dispatches every connection to a new task.
#[derive(Debug)]
pub struct Acceptor {
    listener: TcpListener,
    service: Arc<TesseraService>,
}

impl Acceptor {
    /// Binds a listening socket on `addr`.
    ///
    /// Port `0` asks the OS for a free port; see [`Acceptor::local_addr`].
    ///
    /// # Errors
    ///
    /// Returns [`TesseraError::Bind`] if the address cannot be bound.
    pub async fn bind(
        addr: SocketAddr,
        service: Arc<TesseraService>,
    ) -> Result<Self, TesseraError> {
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|source| TesseraError::Bind { addr, source })?;
        Ok(Self { listener, service })
    }

    /// Returns the address the listener is bound to.
    ///
    /// # Errors
    ///
    /// Returns [`TesseraError::Io`] if the socket cannot report its address.
    pub fn local_addr(&self) -> Result<SocketAddr, TesseraError> {
        Ok(self.listener.local_addr()?)
    }

    /// Accepts connections forever, spawning one handler task per
    /// connection without waiting for it.
    ///
    /// A failed `accept` is logged and the loop continues after a short
    /// pause.
    pub async fn run(self) {
        loop {
            match self.listener.accept().await {
                Ok((stream, peer)) => {
                    tracing::debug!(%peer, "new connection");
                    tokio::spawn(run_connection(stream, peer, Arc::clone(&self.service)));
                }
                Err(err) => {
                    tracing::error!(error = %err, "accept failed");
                    tokio::time::sleep(ACCEPT_RETRY_DELAY).await;
                }
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpStream;

    use super::*;
    use crate::domain::{EventBus, PoolId, PoolRegistry};

    async fn start() -> (SocketAddr, Arc<PoolRegistry>) {
        let registry = Arc::new(PoolRegistry::new());
        let service = Arc::new(TesseraService::new(
            Arc::clone(&registry),
            EventBus::new(64),
        ));
        let Ok(acceptor) = Acceptor::bind(SocketAddr::from(([127, 0, 0, 1], 0)), service).await
        else {
            panic!("bind failed");
        };
        let Ok(addr) = acceptor.local_addr() else {
            panic!("no local addr");
        };
        tokio::spawn(acceptor.run());
        (addr, registry)
    }

    #[tokio::test]
    async fn bind_reports_ephemeral_port() {
        let (addr, _) = start().await;
        assert_ne!(addr.port(), 0);
    }

    #[tokio::test]
    async fn bind_conflict_is_reported() {
        let (addr, _) = start().await;
        let service = Arc::new(TesseraService::new(
            Arc::new(PoolRegistry::new()),
            EventBus::new(1),
        ));
        let result = Acceptor::bind(addr, service).await;
        assert!(matches!(result, Err(TesseraError::Bind { .. })));
    }

    #[tokio::test]
    async fn silent_client_does_not_block_others() {
        let (addr, registry) = start().await;

        // Holds its handler open without ever sending a byte.
        let Ok(_idle) = TcpStream::connect(addr).await else {
            panic!("connect failed");
        };

        let Ok(mut stream) = TcpStream::connect(addr).await else {
            panic!("connect failed");
        };
        let mut request = b"Mario\0Rossi\0".to_vec();
        request.extend_from_slice(&3i32.to_le_bytes());
        let Ok(()) = stream.write_all(&request).await else {
            panic!("write failed");
        };
        let Ok(code) = stream.read_i32_le().await else {
            panic!("no status");
        };
        assert_eq!(code, 1);
        assert_eq!(registry.allocated(PoolId::Type3).await, 1);
    }
}
