//! Client side of the protocol.
//!
//! [`TesseraClient`] opens a fresh connection for every request, writes it,
//! reads exactly one status, and drops the connection. There is no retry:
//! a connection that closes without a status is an error.

use std::net::SocketAddr;

use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;

use crate::domain::PoolId;
use crate::error::{ClientError, ProtocolError};
use crate::protocol::{self, Request, Status};

/// Connection factory for a tessera server.
#[derive(Debug, Clone, Copy)]
pub struct TesseraClient {
    addr: SocketAddr,
}

impl TesseraClient {
    /// Creates a client for the server at `addr`. No connection is opened
    /// until a request is sent.
    #[must_use]
    pub const fn new(addr: SocketAddr) -> Self {
        Self { addr }
    }

    /// Returns the server address.
    #[must_use]
    pub const fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Sends `request` on a new connection and waits for the status.
    ///
    /// # Errors
    ///
    /// - [`ClientError::Connect`] if the server is unreachable.
    /// - [`ClientError::Protocol`] if the request cannot be framed, the
    ///   exchange fails, or the server closes without answering.
    pub async fn send(&self, request: &Request) -> Result<Status, ClientError> {
        // Frame first so an unsendable request never opens a connection.
        let bytes = protocol::encode_request(request)?;

        let mut stream = TcpStream::connect(self.addr)
            .await
            .map_err(|source| ClientError::Connect {
                addr: self.addr,
                source,
            })?;

        stream
            .write_all(&bytes)
            .await
            .map_err(ProtocolError::from)?;
        let status = protocol::read_status(&mut stream).await?;
        tracing::debug!(
            addr = %self.addr,
            selector = request.selector(),
            %status,
            "request answered"
        );
        Ok(status)
    }

    /// Requests a slot in `pool`.
    ///
    /// # Errors
    ///
    /// See [`TesseraClient::send`].
    pub async fn register(
        &self,
        name: &str,
        surname: &str,
        pool: PoolId,
    ) -> Result<Status, ClientError> {
        self.send(&Request::Register {
            name: name.to_string(),
            surname: surname.to_string(),
            pool,
        })
        .await
    }

    /// Requests the release of a slot in `pool`.
    ///
    /// # Errors
    ///
    /// See [`TesseraClient::send`].
    pub async fn cancel(
        &self,
        name: &str,
        surname: &str,
        pool: PoolId,
    ) -> Result<Status, ClientError> {
        self.send(&Request::Cancel {
            name: name.to_string(),
            surname: surname.to_string(),
            pool,
        })
        .await
    }
}
