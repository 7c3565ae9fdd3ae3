//! Primitives shared by the order sync bridge crates.
//!
//! * [`Secret`] keeps credentials out of log output.
//! * [`RemoteError`] and [`ErrorClass`] carry the retry/escalation classification that every remote client attaches
//!   to its failures, so that the sync engine never has to look at HTTP status codes itself.
mod helpers;
mod remote;
mod secret;

pub use helpers::{parse_boolean_flag, parse_list};
pub use remote::{classify_status, ErrorClass, RemoteError};
pub use secret::Secret;
