//! pktforge common - shared types for the template transmit engine
//!
//! This crate holds what every other pktforge crate agrees on:
//! - Table and template size limits
//! - The workspace error type
//! - Logging configuration and subscriber setup

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod logging;

pub use error::*;
pub use logging::*;

/// Number of slots in a template table (reference configuration).
pub const MAX_PACKET_ENTRY: usize = 2048;

/// Largest frame a single template can carry, in bytes.
pub const MAX_TEMPLATE_SIZE: usize = 2048;

/// Ethernet + IPv4 + UDP header bytes in front of a UDP payload.
pub const UDP_FRAME_OVERHEAD: usize = 14 + 20 + 8;
