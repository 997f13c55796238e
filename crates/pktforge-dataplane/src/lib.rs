//! pktforge Data Path
//!
//! Turns every inbound frame into the next packet of a pre-built sequence
//! and sends it straight back out.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                        TEMPLATE TRANSMIT PATH                       │
//! │                                                                     │
//! │  ┌───────────────┐  ┌───────────────┐  ┌───────────────┐            │
//! │  │  Context 0    │  │  Context 1    │  │  Context N    │            │
//! │  │ ┌───────────┐ │  │ ┌───────────┐ │  │ ┌───────────┐ │            │
//! │  │ │  Inbound  │ │  │ │  Inbound  │ │  │ │  Inbound  │ │            │
//! │  │ └─────┬─────┘ │  │ └─────┬─────┘ │  │ └─────┬─────┘ │            │
//! │  │       ▼       │  │       ▼       │  │       ▼       │            │
//! │  │ ┌───────────┐ │  │ ┌───────────┐ │  │ ┌───────────┐ │            │
//! │  │ │  Cursor   │ │  │ │  Cursor   │ │  │ │  Cursor   │ │            │
//! │  │ └─────┬─────┘ │  │ └─────┬─────┘ │  │ └─────┬─────┘ │            │
//! │  └───────┼───────┘  └───────┼───────┘  └───────┼───────┘            │
//! │          └──────────────────┼──────────────────┘                    │
//! │                             ▼                                       │
//! │               ┌───────────────────────────┐                         │
//! │               │  Template Table (shared)  │ ◀── Control Plane       │
//! │               └─────────────┬─────────────┘                         │
//! │          ┌──────────────────┼──────────────────┐                    │
//! │  ┌───────┼───────┐  ┌───────┼───────┐  ┌───────┼───────┐            │
//! │  │       ▼       │  │       ▼       │  │       ▼       │            │
//! │  │ ┌───────────┐ │  │ ┌───────────┐ │  │ ┌───────────┐ │            │
//! │  │ │ Resize +  │ │  │ │ Resize +  │ │  │ │ Resize +  │ │            │
//! │  │ │ Overwrite │ │  │ │ Overwrite │ │  │ │ Overwrite │ │            │
//! │  │ └─────┬─────┘ │  │ └─────┬─────┘ │  │ └─────┬─────┘ │            │
//! │  │       ▼       │  │       ▼       │  │       ▼       │            │
//! │  │ ┌───────────┐ │  │ ┌───────────┐ │  │ ┌───────────┐ │            │
//! │  │ │ Stats, TX │ │  │ │ Stats, TX │ │  │ │ Stats, TX │ │            │
//! │  │ └───────────┘ │  │ └───────────┘ │  │ └───────────┘ │            │
//! │  └───────────────┘  └───────────────┘  └───────────────┘            │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Guarantees
//!
//! | Property | Holds |
//! |----------|-------|
//! | Cursor index | Always `< capacity`, stale values read as 0 |
//! | Frame length | Equals the template length clamped to `MAX_TEMPLATE_SIZE` |
//! | Copy loop | At most `MAX_TEMPLATE_SIZE` iterations |
//! | Abort | Leaves cursor and statistics untouched |
//! | Contexts | Never write each other's cursor or stats cells |

#![warn(clippy::all)]

pub mod buffer;
pub mod context;
pub mod control;
pub mod core;
pub mod cursor;
pub mod overwrite;
pub mod stats;
pub mod template;
pub mod transmit;

pub use buffer::{BufferError, FrameBounds, FrameBuffer, PacketBuffer};
pub use context::{ContextId, PerContext};
pub use control::{ControlError, ControlPlane, InstallReport};
pub use core::{DiscardSink, EngineConfig, EngineError, ShutdownHandle, TxEngine, TxSink};
pub use cursor::{CursorPosition, SequenceCursor};
pub use overwrite::OverwriteError;
pub use stats::{ContextStats, Rate, RateMeter, StatsSnapshot, StatsStore};
pub use template::{Template, TemplateError, TemplateTable};
pub use transmit::{AbortReason, Action, Transmitted, Transmitter};

pub use pktforge_common::{MAX_PACKET_ENTRY, MAX_TEMPLATE_SIZE};
