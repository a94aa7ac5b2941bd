//! TCP server: accept loop and per-connection handler.
//!
//! The [`Acceptor`] owns the listening socket; every accepted connection
//! runs [`connection::run_connection`] on its own task, with the shared
//! [`crate::service::TesseraService`] as the only coordination point.

pub mod acceptor;
pub mod connection;

pub use acceptor::Acceptor;
