//! deskreg - window registry for a simulated desktop shell
//!
//! Tracks overlapping windows (position, size, z-order, focus,
//! minimized/maximized state) and mutates them in response to user actions.
//!
//! # Features
//!
//! - **Strict stacking**: every front-bringing operation takes a fresh z value
//!   from a counter owned by the registry; values are never reused
//! - **Single focus**: at most one window is focused after any operation
//! - **Silent no-ops**: operations on unknown ids change nothing
//! - **Observers**: tracing and in-memory metrics hooks for every transition
//!
//! # Quick Start
//!
//! ```
//! use deskreg::wm::{WindowDescriptor, WindowRegistry};
//!
//! let mut registry = WindowRegistry::new(100);
//! registry.open_window(WindowDescriptor::new("calc-1", "Calculator", 0, 0, 200, 100)).unwrap();
//! registry.open_window(WindowDescriptor::new("notes-1", "Notes", 50, 50, 300, 200)).unwrap();
//! registry.focus_window("calc-1").unwrap();
//!
//! assert_eq!(registry.focused().map(|w| w.z_index), Some(103));
//! ```

pub mod config;
pub mod shell;
pub mod wm;
