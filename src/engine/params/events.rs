//! Event stream parameters.

use std::collections::BTreeMap;

use super::OperationParams;
use crate::error::EngineError;

/// Parameters for subscribing to daemon events.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventsParams {
    pub(crate) since: Option<i64>,
    pub(crate) until: Option<i64>,
    pub(crate) filters: BTreeMap<String, Vec<String>>,
}

impl EventsParams {
    /// Stream all events from now on.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replay events since this Unix timestamp.
    #[must_use]
    pub const fn with_since(mut self, since: i64) -> Self {
        self.since = Some(since);
        self
    }

    /// Stop streaming at this Unix timestamp.
    #[must_use]
    pub const fn with_until(mut self, until: i64) -> Self {
        self.until = Some(until);
        self
    }

    /// Only stream events where `name` matches `value`. Repeatable.
    #[must_use]
    pub fn with_filter(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.filters
            .entry(name.into())
            .or_default()
            .push(value.into());
        self
    }

    pub(crate) fn encoded_filters(&self) -> Result<Option<String>, EngineError> {
        if self.filters.is_empty() {
            return Ok(None);
        }
        serde_json::to_string(&self.filters)
            .map(Some)
            .map_err(|e| EngineError::invalid_argument(Self::OPERATION, e.to_string()))
    }
}

impl OperationParams for EventsParams {
    const OPERATION: &'static str = "events";

    fn validate(&self) -> Result<(), EngineError> {
        match (self.since, self.until) {
            (Some(since), Some(until)) if until < since => Err(EngineError::invalid_argument(
                Self::OPERATION,
                "until must not be earlier than since",
            )),
            _ => Ok(()),
        }
    }
}
