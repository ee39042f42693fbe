//! Window Registry - Owns all window records and the stacking counter

use std::fmt;
use thiserror::Error;

use super::observer::{WindowEvent, WindowObserver};
use super::window::{WindowDescriptor, WindowFlags, WindowRecord};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    #[error("Window descriptor has an empty id")]
    EmptyId,

    #[error("z index counter exhausted at {top}")]
    ZIndexExhausted { top: u64 },
}

pub type Result<T> = std::result::Result<T, RegistryError>;

/// What `open_window` did with the descriptor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenOutcome {
    /// A new record was appended
    Opened,
    /// An existing minimized record was brought back
    Restored,
    /// An existing visible record was brought to front
    Refocused,
}

/// Window registry - the single owner of the window collection.
///
/// Records are kept in insertion order; visual stacking is governed by
/// `z_index` alone. Every front-bringing operation (open, restore, focus)
/// takes the next value of `top_z_index`, so z values are never reused even
/// after windows close.
pub struct WindowRegistry {
    /// All windows, in insertion order
    windows: Vec<WindowRecord>,
    /// Last z value handed out
    top_z_index: u64,
    /// Notified after each successful transition
    observers: Vec<Box<dyn WindowObserver>>,
}

impl fmt::Debug for WindowRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WindowRegistry")
            .field("windows", &self.windows)
            .field("top_z_index", &self.top_z_index)
            .field("observers", &self.observers.len())
            .finish()
    }
}

impl WindowRegistry {
    /// Create an empty registry whose first fronted window gets `initial_z_index + 1`
    pub fn new(initial_z_index: u64) -> Self {
        Self {
            windows: Vec::new(),
            top_z_index: initial_z_index,
            observers: Vec::new(),
        }
    }

    /// Attach a telemetry observer
    pub fn add_observer(&mut self, observer: impl WindowObserver + 'static) {
        self.observers.push(Box::new(observer));
    }

    /// Open a window, or bring an existing one with the same id to front
    pub fn open_window(&mut self, desc: WindowDescriptor) -> Result<OpenOutcome> {
        if desc.id.is_blank() {
            return Err(RegistryError::EmptyId);
        }

        let z_index = self.next_z_index()?;
        let Some(idx) = self.position(desc.id.as_str()) else {
            let event = WindowEvent::Opened {
                id: desc.id.clone(),
                title: desc.title.clone(),
                z_index,
                active: self.windows.len() + 1,
            };
            self.defocus_all();
            self.windows.push(WindowRecord::from_descriptor(desc, z_index));
            self.notify(&event);
            return Ok(OpenOutcome::Opened);
        };

        let was_minimized = self.windows[idx].is_minimized();
        self.bring_to_front(idx, z_index);
        let id = self.windows[idx].id.clone();
        if was_minimized {
            self.notify(&WindowEvent::RestoredFromMinimize { id, z_index });
            Ok(OpenOutcome::Restored)
        } else {
            self.notify(&WindowEvent::Refocused { id, z_index });
            Ok(OpenOutcome::Refocused)
        }
    }

    /// Remove a window. Focus is not handed to another window.
    pub fn close_window(&mut self, id: &str) -> bool {
        let Some(idx) = self.position(id) else {
            return false;
        };
        let record = self.windows.remove(idx);
        self.notify(&WindowEvent::Closed {
            id: record.id,
            active: self.windows.len(),
        });
        true
    }

    pub fn minimize_window(&mut self, id: &str) -> bool {
        let Some(idx) = self.position(id) else {
            return false;
        };
        let record = &mut self.windows[idx];
        record.flags.insert(WindowFlags::MINIMIZED);
        record.flags.remove(WindowFlags::FOCUSED);
        let event = WindowEvent::Minimized { id: record.id.clone() };
        self.notify(&event);
        true
    }

    /// Toggle the maximized state
    pub fn maximize_window(&mut self, id: &str) -> bool {
        let Some(idx) = self.position(id) else {
            return false;
        };
        let record = &mut self.windows[idx];
        record.flags.toggle(WindowFlags::MAXIMIZED);
        let event = WindowEvent::MaximizeToggled {
            id: record.id.clone(),
            maximized: record.is_maximized(),
        };
        self.notify(&event);
        true
    }

    /// Un-minimize, focus and bring to front
    pub fn restore_window(&mut self, id: &str) -> Result<bool> {
        let Some(idx) = self.position(id) else {
            return Ok(false);
        };
        let z_index = self.next_z_index()?;
        self.bring_to_front(idx, z_index);
        let event = WindowEvent::Restored { id: self.windows[idx].id.clone(), z_index };
        self.notify(&event);
        Ok(true)
    }

    /// Focus and bring to front; minimized/maximized state is left alone
    pub fn focus_window(&mut self, id: &str) -> Result<bool> {
        let Some(idx) = self.position(id) else {
            return Ok(false);
        };
        let z_index = self.next_z_index()?;
        self.defocus_all();
        let record = &mut self.windows[idx];
        record.flags.insert(WindowFlags::FOCUSED);
        record.z_index = z_index;
        let event = WindowEvent::Focused { id: record.id.clone(), z_index };
        self.notify(&event);
        Ok(true)
    }

    /// Move a window. No bounds checks: off-screen is allowed.
    pub fn update_window_position(&mut self, id: &str, x: i32, y: i32) -> bool {
        let Some(idx) = self.position(id) else {
            return false;
        };
        let record = &mut self.windows[idx];
        record.x = x;
        record.y = y;
        let event = WindowEvent::Moved { id: record.id.clone(), x, y };
        self.notify(&event);
        true
    }

    /// Resize a window. No minimum size is enforced.
    pub fn update_window_size(&mut self, id: &str, width: u32, height: u32) -> bool {
        let Some(idx) = self.position(id) else {
            return false;
        };
        let record = &mut self.windows[idx];
        record.width = width;
        record.height = height;
        let event = WindowEvent::Resized { id: record.id.clone(), width, height };
        self.notify(&event);
        true
    }

    /// All records in insertion order
    pub fn windows(&self) -> &[WindowRecord] {
        &self.windows
    }

    pub fn get(&self, id: &str) -> Option<&WindowRecord> {
        self.windows.iter().find(|w| w.id == id)
    }

    /// The focused window, if any
    pub fn focused(&self) -> Option<&WindowRecord> {
        self.windows.iter().find(|w| w.is_focused())
    }

    /// Last z value handed out
    pub fn top_z_index(&self) -> u64 {
        self.top_z_index
    }

    pub fn len(&self) -> usize {
        self.windows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.windows.is_empty()
    }

    /// Visible windows back to front, the order a renderer paints them
    pub fn render_order(&self) -> Vec<&WindowRecord> {
        let mut visible: Vec<&WindowRecord> =
            self.windows.iter().filter(|w| !w.is_minimized()).collect();
        visible.sort_by_key(|w| w.z_index);
        visible
    }

    /// Topmost visible window containing the point
    pub fn window_at(&self, x: i32, y: i32) -> Option<&WindowRecord> {
        self.windows
            .iter()
            .filter(|w| !w.is_minimized() && w.contains(x, y))
            .max_by_key(|w| w.z_index)
    }

    fn position(&self, id: &str) -> Option<usize> {
        self.windows.iter().position(|w| w.id == id)
    }

    /// Leaves the counter untouched when it cannot advance
    fn next_z_index(&mut self) -> Result<u64> {
        self.top_z_index = self
            .top_z_index
            .checked_add(1)
            .ok_or(RegistryError::ZIndexExhausted { top: self.top_z_index })?;
        Ok(self.top_z_index)
    }

    fn defocus_all(&mut self) {
        for w in &mut self.windows {
            w.flags.remove(WindowFlags::FOCUSED);
        }
    }

    fn bring_to_front(&mut self, idx: usize, z_index: u64) {
        self.defocus_all();
        let record = &mut self.windows[idx];
        record.flags.remove(WindowFlags::MINIMIZED);
        record.flags.insert(WindowFlags::FOCUSED);
        record.z_index = z_index;
    }

    fn notify(&mut self, event: &WindowEvent) {
        for observer in &mut self.observers {
            observer.on_event(event);
        }
    }
}
