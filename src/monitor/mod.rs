//! Probe loop
//!
//! ## Cycle
//!
//! ```text
//! snapshot config → resolve targets → plan transition
//!     → record_down / record_up (on transition) → log_status
//!     → commit status snapshot → sleep(poll_interval)
//! ```
//!
//! The status snapshot is committed last, so a cycle whose storage write
//! fails leaves the in-memory status as it was. That failure also ends the
//! loop; the join handle returned by [`MonitorHandle::spawn`] reports it.
//!
//! Transition detection lives in [`transition`] and has no async or I/O
//! dependencies.

pub mod actor;
pub mod transition;

pub use actor::{CycleReport, MonitorActor, MonitorCommand, MonitorHandle};
pub use transition::{CyclePlan, Transition, plan_cycle};
