//! Observers - telemetry hooks invoked after each registry transition
//!
//! Observers only see what happened; they can never change the registry.
//! Two are provided:
//!
//! - [`TracingObserver`] logs every transition through `tracing`
//! - [`MetricsObserver`] keeps counters, gauges and distributions in memory

use std::cell::{Ref, RefCell};
use std::collections::BTreeMap;
use std::rc::Rc;

use tracing::{debug, info};

use super::window::WindowId;

/// A successful state transition
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WindowEvent {
    /// New record inserted; `active` is the window count afterwards
    Opened { id: WindowId, title: String, z_index: u64, active: usize },
    /// `open` on a minimized window
    RestoredFromMinimize { id: WindowId, z_index: u64 },
    /// `open` on a window that was already visible
    Refocused { id: WindowId, z_index: u64 },
    Closed { id: WindowId, active: usize },
    Minimized { id: WindowId },
    MaximizeToggled { id: WindowId, maximized: bool },
    Restored { id: WindowId, z_index: u64 },
    Focused { id: WindowId, z_index: u64 },
    Moved { id: WindowId, x: i32, y: i32 },
    Resized { id: WindowId, width: u32, height: u32 },
}

impl WindowEvent {
    /// Window the event refers to
    pub fn id(&self) -> &WindowId {
        match self {
            WindowEvent::Opened { id, .. }
            | WindowEvent::RestoredFromMinimize { id, .. }
            | WindowEvent::Refocused { id, .. }
            | WindowEvent::Closed { id, .. }
            | WindowEvent::Minimized { id }
            | WindowEvent::MaximizeToggled { id, .. }
            | WindowEvent::Restored { id, .. }
            | WindowEvent::Focused { id, .. }
            | WindowEvent::Moved { id, .. }
            | WindowEvent::Resized { id, .. } => id,
        }
    }

    /// Human-readable message for the transition
    pub fn message(&self) -> &'static str {
        match self {
            WindowEvent::Opened { .. } => "Window opened",
            WindowEvent::RestoredFromMinimize { .. } => "Window restored from minimize",
            WindowEvent::Refocused { .. } => "Window refocused",
            WindowEvent::Closed { .. } => "Window closed",
            WindowEvent::Minimized { .. } => "Window minimized",
            WindowEvent::MaximizeToggled { maximized: true, .. } => "Window maximized",
            WindowEvent::MaximizeToggled { maximized: false, .. } => "Window unmaximized",
            WindowEvent::Restored { .. } => "Window restored",
            WindowEvent::Focused { .. } => "Window focused",
            WindowEvent::Moved { .. } => "Window moved",
            WindowEvent::Resized { .. } => "Window resized",
        }
    }
}

/// Receives every successful registry transition
pub trait WindowObserver {
    fn on_event(&mut self, event: &WindowEvent);
}

impl<F> WindowObserver for F
where
    F: FnMut(&WindowEvent),
{
    fn on_event(&mut self, event: &WindowEvent) {
        self(event)
    }
}

/// Logs transitions: lifecycle changes at info, geometry changes at debug
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingObserver;

impl WindowObserver for TracingObserver {
    fn on_event(&mut self, event: &WindowEvent) {
        let id = event.id().as_str();
        match event {
            WindowEvent::Opened { title, z_index, active, .. } => {
                info!(window_id = id, window_title = %title, z_index, active, "{}", event.message());
            }
            WindowEvent::RestoredFromMinimize { z_index, .. }
            | WindowEvent::Refocused { z_index, .. }
            | WindowEvent::Restored { z_index, .. }
            | WindowEvent::Focused { z_index, .. } => {
                info!(window_id = id, z_index, "{}", event.message());
            }
            WindowEvent::Closed { active, .. } => {
                info!(window_id = id, active, "{}", event.message());
            }
            WindowEvent::Minimized { .. } | WindowEvent::MaximizeToggled { .. } => {
                info!(window_id = id, "{}", event.message());
            }
            WindowEvent::Moved { x, y, .. } => {
                debug!(window_id = id, x, y, "{}", event.message());
            }
            WindowEvent::Resized { width, height, .. } => {
                debug!(window_id = id, width, height, "{}", event.message());
            }
        }
    }
}

/// In-memory metric store.
///
/// Keys are rendered as `name` or `name{tag=value}`.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Metrics {
    counters: BTreeMap<String, u64>,
    gauges: BTreeMap<String, u64>,
    distributions: BTreeMap<String, Vec<u64>>,
}

fn metric_key(name: &str, tag: Option<(&str, &str)>) -> String {
    match tag {
        Some((key, value)) => format!("{}{{{}={}}}", name, key, value),
        None => name.to_string(),
    }
}

impl Metrics {
    fn increment(&mut self, name: &str, tag: Option<(&str, &str)>) {
        *self.counters.entry(metric_key(name, tag)).or_insert(0) += 1;
    }

    fn gauge(&mut self, name: &str, value: u64) {
        self.gauges.insert(name.to_string(), value);
    }

    fn distribution(&mut self, name: &str, value: u64) {
        self.distributions.entry(name.to_string()).or_default().push(value);
    }

    /// Counter value for an exact key, e.g. `desktop.windows.opened{window_type=calc}`
    pub fn counter(&self, key: &str) -> u64 {
        self.counters.get(key).copied().unwrap_or(0)
    }

    /// Sum of a counter across all of its tag values
    pub fn counter_total(&self, name: &str) -> u64 {
        self.counters
            .iter()
            .filter(|(key, _)| {
                key.as_str() == name
                    || key.strip_prefix(name).map_or(false, |rest| rest.starts_with('{'))
            })
            .map(|(_, v)| *v)
            .sum()
    }

    /// Last recorded gauge value
    pub fn gauge_value(&self, name: &str) -> Option<u64> {
        self.gauges.get(name).copied()
    }

    /// All samples recorded for a distribution, oldest first
    pub fn samples(&self, name: &str) -> &[u64] {
        self.distributions.get(name).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Render as `key value` lines: counters, then gauges, then distributions
    pub fn report(&self) -> Vec<String> {
        let mut lines = Vec::new();
        for (key, value) in &self.counters {
            lines.push(format!("counter {} {}", key, value));
        }
        for (key, value) in &self.gauges {
            lines.push(format!("gauge {} {}", key, value));
        }
        for (key, samples) in &self.distributions {
            let sum: u64 = samples.iter().sum();
            let mean = if samples.is_empty() { 0 } else { sum / samples.len() as u64 };
            lines.push(format!(
                "distribution {} count={} mean={}",
                key,
                samples.len(),
                mean
            ));
        }
        lines
    }
}

/// Shared read handle to the metrics a [`MetricsObserver`] collects
#[derive(Debug, Default, Clone)]
pub struct MetricsHandle(Rc<RefCell<Metrics>>);

impl MetricsHandle {
    pub fn borrow(&self) -> Ref<'_, Metrics> {
        self.0.borrow()
    }
}

/// Records the desktop.* metrics for every transition
#[derive(Debug, Default)]
pub struct MetricsObserver {
    metrics: MetricsHandle,
}

impl MetricsObserver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Handle that stays readable after the observer is moved into a registry
    pub fn handle(&self) -> MetricsHandle {
        self.metrics.clone()
    }
}

impl WindowObserver for MetricsObserver {
    fn on_event(&mut self, event: &WindowEvent) {
        let mut m = self.metrics.0.borrow_mut();
        match event {
            WindowEvent::Opened { id, active, .. } => {
                m.increment("desktop.windows.opened", Some(("window_type", id.kind())));
                m.gauge("desktop.windows.active", *active as u64);
            }
            WindowEvent::RestoredFromMinimize { id, .. } | WindowEvent::Refocused { id, .. } => {
                m.increment("desktop.windows.opened", Some(("window_type", id.kind())));
            }
            WindowEvent::Closed { id, active } => {
                m.increment("desktop.windows.closed", Some(("window_type", id.kind())));
                m.gauge("desktop.windows.active", *active as u64);
            }
            WindowEvent::Minimized { .. } => {
                m.increment("desktop.windows.minimized", None);
            }
            WindowEvent::MaximizeToggled { maximized, .. } => {
                let action = if *maximized { "maximize" } else { "restore" };
                m.increment("desktop.windows.maximize_toggle", Some(("action", action)));
            }
            WindowEvent::Restored { .. } => {
                m.increment("desktop.windows.restored", None);
            }
            WindowEvent::Focused { .. } => {
                m.increment("desktop.windows.focused", None);
            }
            WindowEvent::Moved { .. } => {
                m.increment("desktop.windows.moved", None);
            }
            WindowEvent::Resized { width, height, .. } => {
                m.increment("desktop.windows.resized", None);
                m.distribution("desktop.window.size", u64::from(*width) * u64::from(*height));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(s: &str) -> WindowId {
        WindowId::from(s)
    }

    #[test]
    fn test_metrics_tags_by_kind() {
        let mut observer = MetricsObserver::new();
        let handle = observer.handle();

        observer.on_event(&WindowEvent::Opened { id: id("calc-1"), title: "Calc".into(), z_index: 101, active: 1 });
        observer.on_event(&WindowEvent::Opened { id: id("calc-2"), title: "Calc".into(), z_index: 102, active: 2 });
        observer.on_event(&WindowEvent::Opened { id: id("notes-1"), title: "Notes".into(), z_index: 103, active: 3 });
        observer.on_event(&WindowEvent::Closed { id: id("calc-1"), active: 2 });

        let m = handle.borrow();
        assert_eq!(m.counter("desktop.windows.opened{window_type=calc}"), 2);
        assert_eq!(m.counter("desktop.windows.opened{window_type=notes}"), 1);
        assert_eq!(m.counter_total("desktop.windows.opened"), 3);
        assert_eq!(m.counter("desktop.windows.closed{window_type=calc}"), 1);
        assert_eq!(m.gauge_value("desktop.windows.active"), Some(2));
    }

    #[test]
    fn test_counter_total_does_not_match_prefix_names() {
        let mut observer = MetricsObserver::new();
        let handle = observer.handle();

        observer.on_event(&WindowEvent::Resized { id: id("a"), width: 10, height: 20 });
        observer.on_event(&WindowEvent::Resized { id: id("a"), width: 3, height: 3 });

        let m = handle.borrow();
        assert_eq!(m.counter_total("desktop.windows.resized"), 2);
        assert_eq!(m.counter_total("desktop.windows.re"), 0);
        assert_eq!(m.samples("desktop.window.size"), &[200, 9]);
    }

    #[test]
    fn test_maximize_action_tag() {
        let mut observer = MetricsObserver::new();
        let handle = observer.handle();

        observer.on_event(&WindowEvent::MaximizeToggled { id: id("a"), maximized: true });
        observer.on_event(&WindowEvent::MaximizeToggled { id: id("a"), maximized: false });
        observer.on_event(&WindowEvent::MaximizeToggled { id: id("a"), maximized: true });

        let m = handle.borrow();
        assert_eq!(m.counter("desktop.windows.maximize_toggle{action=maximize}"), 2);
        assert_eq!(m.counter("desktop.windows.maximize_toggle{action=restore}"), 1);
    }

    /// Collects formatted log output for assertions
    #[derive(Clone, Default)]
    struct LogBuffer(std::sync::Arc<std::sync::Mutex<Vec<u8>>>);

    impl std::io::Write for LogBuffer {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    impl LogBuffer {
        fn text(&self) -> String {
            String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
        }
    }

    fn log_events(level: tracing::Level, events: &[WindowEvent]) -> String {
        let buffer = LogBuffer::default();
        let writer = buffer.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(level)
            .with_writer(move || writer.clone())
            .with_ansi(false)
            .without_time()
            .finish();

        tracing::subscriber::with_default(subscriber, || {
            let mut observer = TracingObserver;
            for event in events {
                observer.on_event(event);
            }
        });
        buffer.text()
    }

    #[test]
    fn test_tracing_observer_levels_and_fields() {
        let events = [
            WindowEvent::Opened { id: id("calc-1"), title: "Calc".into(), z_index: 101, active: 1 },
            WindowEvent::Focused { id: id("calc-1"), z_index: 102 },
            WindowEvent::Moved { id: id("calc-1"), x: 3, y: -4 },
            WindowEvent::Resized { id: id("calc-1"), width: 640, height: 480 },
        ];

        let info = log_events(tracing::Level::INFO, &events);
        assert!(info.contains("Window opened"));
        assert!(info.contains("calc-1"));
        assert!(info.contains("z_index=101"));
        assert!(info.contains("active=1"));
        assert!(info.contains("Window focused"));
        assert!(info.contains("z_index=102"));
        assert!(!info.contains("Window moved"));
        assert!(!info.contains("Window resized"));

        let debug = log_events(tracing::Level::DEBUG, &events);
        assert!(debug.contains("Window moved"));
        assert!(debug.contains("y=-4"));
        assert!(debug.contains("Window resized"));
        assert!(debug.contains("width=640"));
        assert_eq!(debug.lines().count(), 4);
    }

    #[test]
    fn test_messages() {
        assert_eq!(
            WindowEvent::MaximizeToggled { id: id("a"), maximized: false }.message(),
            "Window unmaximized"
        );
        assert_eq!(
            WindowEvent::RestoredFromMinimize { id: id("a"), z_index: 1 }.message(),
            "Window restored from minimize"
        );
    }

    #[test]
    fn test_report_lines() {
        let mut observer = MetricsObserver::new();
        let handle = observer.handle();
        observer.on_event(&WindowEvent::Minimized { id: id("a") });
        observer.on_event(&WindowEvent::Resized { id: id("a"), width: 2, height: 5 });

        let report = handle.borrow().report();
        assert!(report.contains(&"counter desktop.windows.minimized 1".to_string()));
        assert!(report.contains(&"distribution desktop.window.size count=1 mean=10".to_string()));
    }
}
