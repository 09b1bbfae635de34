//! Simulated allocator instances sharing one backend.
//!
//! ## Structure
//!
//! - [`config`] - CLI/env configuration (`CliArgs` -> `SimConfig`).
//! - [`cursor`] - per-instance segment buffer (`SegmentCursor`).
//! - [`worker`] - one instance's issuing loop and the uniqueness check.
//! - [`telemetry`] - `tracing` subscriber setup.

pub mod config;
pub mod cursor;
pub mod telemetry;
pub mod worker;
