//! Window - A single window record tracked by the registry

use std::fmt;
use bitflags::bitflags;

/// Stable, caller-supplied window identifier (typically `"<kind>-<instance>"`)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WindowId(String);

impl WindowId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Window kind: the part before the first `-`, or the whole id
    pub fn kind(&self) -> &str {
        self.0.split('-').next().unwrap_or(&self.0)
    }

    /// True if the id carries no visible characters
    pub fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Display for WindowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(&self.0)
    }
}

impl From<&str> for WindowId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for WindowId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl PartialEq<str> for WindowId {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for WindowId {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

bitflags! {
    #[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
    pub struct WindowFlags: u8 {
        const FOCUSED   = 0b0000_0001;
        const MINIMIZED = 0b0000_0010;
        const MAXIMIZED = 0b0000_0100;
    }
}

/// What the caller supplies to open a window.
///
/// `z_index` and focus are never part of a descriptor; the registry assigns
/// them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WindowDescriptor {
    pub id: WindowId,
    pub title: String,
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
    pub minimized: bool,
    pub maximized: bool,
}

impl WindowDescriptor {
    /// Create a descriptor that opens in the normal (not minimized, not maximized) state
    pub fn new(
        id: impl Into<WindowId>,
        title: impl Into<String>,
        x: i32,
        y: i32,
        width: u32,
        height: u32,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            x,
            y,
            width,
            height,
            minimized: false,
            maximized: false,
        }
    }

    pub fn minimized(mut self, minimized: bool) -> Self {
        self.minimized = minimized;
        self
    }

    pub fn maximized(mut self, maximized: bool) -> Self {
        self.maximized = maximized;
        self
    }
}

/// One on-screen (or minimized) panel
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WindowRecord {
    pub id: WindowId,
    pub title: String,
    /// Position; may be negative or off-screen
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
    /// Stacking order, higher is in front
    pub z_index: u64,
    pub flags: WindowFlags,
}

impl WindowRecord {
    pub(crate) fn from_descriptor(desc: WindowDescriptor, z_index: u64) -> Self {
        let mut flags = WindowFlags::FOCUSED;
        flags.set(WindowFlags::MINIMIZED, desc.minimized);
        flags.set(WindowFlags::MAXIMIZED, desc.maximized);
        Self {
            id: desc.id,
            title: desc.title,
            x: desc.x,
            y: desc.y,
            width: desc.width,
            height: desc.height,
            z_index,
            flags,
        }
    }

    pub fn is_focused(&self) -> bool {
        self.flags.contains(WindowFlags::FOCUSED)
    }

    pub fn is_minimized(&self) -> bool {
        self.flags.contains(WindowFlags::MINIMIZED)
    }

    pub fn is_maximized(&self) -> bool {
        self.flags.contains(WindowFlags::MAXIMIZED)
    }

    /// Check if a point lies inside this window's rectangle
    pub fn contains(&self, x: i32, y: i32) -> bool {
        let (x, y) = (i64::from(x), i64::from(y));
        let (left, top) = (i64::from(self.x), i64::from(self.y));
        x >= left
            && x < left + i64::from(self.width)
            && y >= top
            && y < top + i64::from(self.height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_window_kind() {
        assert_eq!(WindowId::from("calc-1").kind(), "calc");
        assert_eq!(WindowId::from("notes-a-b").kind(), "notes");
        assert_eq!(WindowId::from("terminal").kind(), "terminal");
    }

    #[test]
    fn test_blank_id() {
        assert!(WindowId::from("").is_blank());
        assert!(WindowId::from("  \t").is_blank());
        assert!(!WindowId::from("a").is_blank());
    }

    #[test]
    fn test_record_from_descriptor() {
        let desc = WindowDescriptor::new("calc-1", "Calculator", 10, 20, 200, 100).maximized(true);
        let rec = WindowRecord::from_descriptor(desc, 101);

        assert_eq!(rec.z_index, 101);
        assert!(rec.is_focused());
        assert!(rec.is_maximized());
        assert!(!rec.is_minimized());
    }

    #[test]
    fn test_contains_edges() {
        let rec = WindowRecord::from_descriptor(
            WindowDescriptor::new("a", "A", -10, 0, 20, 10),
            1,
        );
        assert!(rec.contains(-10, 0));
        assert!(rec.contains(9, 9));
        assert!(!rec.contains(10, 0));
        assert!(!rec.contains(0, 10));
        assert!(!rec.contains(-11, 5));
    }
}
