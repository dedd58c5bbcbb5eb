//! Core systems for Treeline.
//!
//! This crate provides the pieces shared by every Treeline crate:
//!
//! - **Signal/Slot System**: ordered, synchronous, re-entrant notifications
//! - **Logging**: `tracing` target and span names, plus [`logging::PerfSpan`]
//!
//! # Signal/Slot Example
//!
//! ```
//! use treeline_core::Signal;
//!
//! let selection_changed = Signal::<()>::new();
//! let conn_id = selection_changed.connect(|_| println!("selection changed"));
//!
//! selection_changed.emit(());
//! selection_changed.disconnect(conn_id);
//! ```

pub mod logging;
pub mod signal;

pub use logging::PerfSpan;
pub use signal::{ConnectionGuard, ConnectionId, Signal};
