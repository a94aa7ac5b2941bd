//! Line protocol: one request, one status, per connection.
//!
//! [`message`] holds the typed request and status; [`codec`] moves them
//! on and off a byte stream.

pub mod codec;
pub mod message;

pub use codec::{
    MAX_FIELD_LEN, encode_request, read_frame, read_request, read_status, truncate_field,
    write_request, write_status,
};
pub use message::{CANCEL_SELECTOR, Frame, Request, Status};
