//! # tessera-server
//!
//! Concurrent TCP allocation server for three fixed-capacity card pools.
//!
//! Clients open a connection, send one registration or cancellation, and
//! receive a single `+1`/`-1` status. All capacity changes go through one
//! mutex-protected [`domain::PoolRegistry`], so concurrent connections can
//! never over-allocate or under-release a pool.
//!
//! ## Architecture
//!
//! ```text
//! Clients (TCP)
//!     │
//!     ├── Acceptor (server/)            one task per connection
//!     ├── Connection handler (server/)  read request → respond → close
//!     ├── Codec (protocol/)
//!     │
//!     ├── TesseraService (service/)
//!     ├── EventBus → summary reporter (domain/, service/)
//!     │
//!     └── PoolRegistry (domain/)        single lock, three counters
//! ```

pub mod client;
pub mod config;
pub mod domain;
pub mod error;
pub mod logging;
pub mod protocol;
pub mod server;
pub mod service;
