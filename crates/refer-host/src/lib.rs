//! Native-messaging host for the reference library.
//!
//! Frames length-prefixed JSON messages on stdin/stdout and applies them
//! to the document store and aggregated index.

pub mod channel;
pub mod config;
pub mod dispatcher;
pub mod setup;
