//! Host-environment services consumed by the desktop runtime.
//!
//! The window manager core only needs a time source today; it is injected through the [`Clock`]
//! trait so tests can drive creation timestamps deterministically.

#![warn(missing_docs, rustdoc::broken_intra_doc_links)]

pub mod time;

pub use time::{next_monotonic_timestamp_ms, unix_time_ms_now, Clock, ManualClock, SystemClock};
