//! Adapter utilities for the `gallery` crate.
//!
//! The `gallery` crate is UI-agnostic and exposes operations (select, toggle, navigate, zoom).
//! This crate provides the framework-neutral glue commonly needed between a widget toolkit and
//! those operations:
//!
//! - A mouse/keyboard/wheel state machine with the usual click, ctrl-click and shift-click
//!   selection rules, header toggles and drag panning
//! - Wheel zoom with modifier-dependent step sizes
//! - Tween-based smooth scrolling helpers (optional; adapter-driven)
//!
//! This crate is intentionally framework-agnostic (no egui/iced bindings).
#![cfg_attr(not(feature = "std"), no_std)]
#![forbid(unsafe_code)]

extern crate alloc;

#[cfg(test)]
extern crate std;

mod controller;
mod input;
mod tween;

#[cfg(test)]
mod tests;

pub use controller::Controller;
pub use input::{Key, Modifiers, MouseButton, zoom_increment};
pub use tween::Tween;
