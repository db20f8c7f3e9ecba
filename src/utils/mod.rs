//! Utility modules
//!
//! Cancellation helpers, header construction and SSE decoding shared by the
//! client and the relay.

pub mod cancel;
pub mod http_headers;
pub mod streaming;

pub use cancel::{cancellable, make_cancellable_stream};
pub use streaming::decode_event_stream;
