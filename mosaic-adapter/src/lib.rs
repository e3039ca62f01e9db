//! Adapter utilities for the `mosaic` crate.
//!
//! The `mosaic` crate is UI-agnostic and focuses on the core math and state.
//! This crate provides the small, framework-neutral glue a host loop needs:
//! a [`Controller`] that owns the engine, forwards timestamped viewport
//! events, and drives the per-frame tick that advances deferred work.
//!
//! This crate is intentionally framework-agnostic (no DOM/TUI/GUI bindings).
#![forbid(unsafe_code)]

mod controller;


pub use controller::Controller;
