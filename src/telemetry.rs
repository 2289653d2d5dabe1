//! Latest-value telemetry store
//!
//! The protocol's telemetry model is last-value-wins: for each (category,
//! field) pair only the most recently observed value is retained, no history.
//! The [`crate::dispatch::Dispatcher`] is the sole writer; the
//! [`crate::command::Commander`] reads it while waiting for correlated
//! responses. A category record is always written under one lock so a reader
//! never observes a partially updated record.

use parking_lot::Mutex;
use std::collections::HashMap;

/// Telemetry category names written by the dispatcher
pub mod category {
    pub const MESSAGE: &str = "message";
    pub const ACKNOWLEDGE: &str = "acknowledge";
    pub const COMPLETE: &str = "complete";
}

/// Field names within telemetry categories
pub mod field {
    pub const ID: &str = "id";
    pub const CODE: &str = "code";
    pub const LEVEL: &str = "level";
    pub const MESSAGE: &str = "message";
}

/// Typed telemetry values
#[derive(Debug, Clone, PartialEq)]
pub enum TelemetryValue {
    U32(u32),
    F64(f64),
    Text(String),
}

impl TelemetryValue {
    pub fn as_u32(&self) -> Option<u32> {
        match self {
            TelemetryValue::U32(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            TelemetryValue::Text(v) => Some(v),
            _ => None,
        }
    }
}

/// Shared latest-value store, keyed by (category, field)
#[derive(Default)]
pub struct TelemetryStore {
    categories: Mutex<HashMap<String, HashMap<String, TelemetryValue>>>,
}

impl TelemetryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a single field (create or overwrite)
    pub fn set(&self, category: &str, field: &str, value: TelemetryValue) {
        let mut categories = self.categories.lock();
        categories
            .entry(category.to_string())
            .or_default()
            .insert(field.to_string(), value);
    }

    /// Write a whole category record atomically
    ///
    /// All fields land under one lock acquisition, so concurrent readers see
    /// either the previous record or the new one, never a mix.
    pub fn set_record(&self, category: &str, fields: Vec<(&str, TelemetryValue)>) {
        let mut categories = self.categories.lock();
        let record = categories.entry(category.to_string()).or_default();
        for (name, value) in fields {
            record.insert(name.to_string(), value);
        }
    }

    /// Latest value for a field, if any
    pub fn get(&self, category: &str, field: &str) -> Option<TelemetryValue> {
        let categories = self.categories.lock();
        categories.get(category).and_then(|c| c.get(field)).cloned()
    }

    /// Consistent copy of a whole category record
    pub fn snapshot(&self, category: &str) -> Option<HashMap<String, TelemetryValue>> {
        let categories = self.categories.lock();
        categories.get(category).cloned()
    }

    /// Convenience accessor for u32 fields
    pub fn get_u32(&self, category: &str, field: &str) -> Option<u32> {
        self.get(category, field).and_then(|v| v.as_u32())
    }

    /// Convenience accessor for text fields
    pub fn get_text(&self, category: &str, field: &str) -> Option<String> {
        self.get(category, field)
            .and_then(|v| v.as_text().map(str::to_string))
    }
}
