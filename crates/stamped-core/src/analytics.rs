//! Usage events
//!
//! Fire-and-forget: callers never see a result and a sink that cannot
//! record an event simply drops it.

use std::cell::RefCell;
use std::collections::BTreeMap;

use crate::config::Config;

pub const PAGE_VIEW_HOME: &str = "page view home";
pub const NEW_DOCUMENT: &str = "new document";
pub const OPEN_DOCUMENT: &str = "open document";
pub const EXPORT_DOCUMENT: &str = "export document";

/// Properties attached to the current user
pub type Properties = BTreeMap<String, String>;

/// Sink for usage events
pub trait Analytics {
    /// Record a named event
    fn event(&self, name: &str);

    /// Set properties on the current user
    fn identify(&self, properties: &Properties);
}

/// Discards everything
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopAnalytics;

impl Analytics for NoopAnalytics {
    fn event(&self, _name: &str) {}

    fn identify(&self, _properties: &Properties) {}
}

/// Writes events to the log under the `stamped::analytics` target
#[derive(Debug, Default, Clone, Copy)]
pub struct LogAnalytics;

impl Analytics for LogAnalytics {
    fn event(&self, name: &str) {
        tracing::info!(target: "stamped::analytics", event = name, "analytics event");
    }

    fn identify(&self, properties: &Properties) {
        tracing::info!(target: "stamped::analytics", ?properties, "analytics identify");
    }
}

/// Keeps events in memory, in order
#[derive(Debug, Default)]
pub struct MemoryAnalytics {
    events: RefCell<Vec<String>>,
    properties: RefCell<Properties>,
}

impl MemoryAnalytics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<String> {
        self.events.borrow().clone()
    }

    pub fn properties(&self) -> Properties {
        self.properties.borrow().clone()
    }
}

impl Analytics for MemoryAnalytics {
    fn event(&self, name: &str) {
        self.events.borrow_mut().push(name.to_string());
    }

    fn identify(&self, properties: &Properties) {
        self.properties
            .borrow_mut()
            .extend(properties.iter().map(|(k, v)| (k.clone(), v.clone())));
    }
}

/// Sink selected by `analytics_enabled`
pub fn from_config(config: &Config) -> Box<dyn Analytics> {
    if config.analytics_enabled {
        Box::new(LogAnalytics)
    } else {
        Box::new(NoopAnalytics)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_analytics_records_in_order() {
        let analytics = MemoryAnalytics::new();
        analytics.event(PAGE_VIEW_HOME);
        analytics.event(NEW_DOCUMENT);
        assert_eq!(analytics.events(), vec![PAGE_VIEW_HOME, NEW_DOCUMENT]);
    }

    #[test]
    fn test_identify_merges_properties() {
        let analytics = MemoryAnalytics::new();
        analytics.identify(&Properties::from([("kind".to_string(), "grid".to_string())]));
        analytics.identify(&Properties::from([("kind".to_string(), "text".to_string())]));
        assert_eq!(analytics.properties().get("kind").map(String::as_str), Some("text"));
    }

    #[test]
    fn test_disabled_sinks_accept_calls() {
        let config = Config::default();
        let sink = from_config(&config);
        sink.event(OPEN_DOCUMENT);
        sink.identify(&Properties::new());

        LogAnalytics.event(EXPORT_DOCUMENT);
    }
}
