//! Hardware-independent core of the sunrise e-paper dashboard.
//!
//! This crate holds everything that does not touch a bus: the sunrise
//! calculator, the touch pipeline and calibration, the UI state machine and
//! its screens, the frame renderer, the refresh planner and the loop that
//! ties them together. Panels, touch controllers, clocks and settings
//! storage are reached through the traits in [`drivers`], [`time`] and
//! [`config`].
//!
//! It is `#![no_std]` with `extern crate alloc` so it builds for embedded
//! targets as well as for the desktop host and the test suite.

#![cfg_attr(not(test), no_std)]

extern crate alloc;

pub mod app_state;
pub mod config;
pub mod drivers;
pub mod framebuffer;
pub mod orchestrator;
pub mod pages;
pub mod refresh;
pub mod renderer;
pub mod solar;
pub mod time;
pub mod touch;
pub mod ui;

pub use orchestrator::{CycleOutcome, Orchestrator};
