//! Window Manager - desktop window registry.
//!
//! This module provides the core window bookkeeping:
//!
//! - **window**: Window records, descriptors and state flags
//! - **registry**: `WindowRegistry` (stacking counter + collection owner)
//! - **observer**: Telemetry hooks fired after each transition
//!
//! # Module Hierarchy
//!
//! ```text
//! wm/
//! ├── mod.rs       - Module exports
//! ├── window.rs    - WindowRecord, WindowDescriptor, WindowFlags
//! ├── registry.rs  - WindowRegistry (open/close/focus/...)
//! └── observer.rs  - WindowEvent, TracingObserver, MetricsObserver
//! ```

pub mod window;
pub mod registry;
pub mod observer;

pub use window::{WindowDescriptor, WindowFlags, WindowId, WindowRecord};
pub use registry::{OpenOutcome, RegistryError, WindowRegistry};
pub use observer::{Metrics, MetricsHandle, MetricsObserver, TracingObserver, WindowEvent, WindowObserver};
