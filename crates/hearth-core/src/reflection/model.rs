//! Reflection tracker domain model.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Default number of completed sessions between reflections.
pub const DEFAULT_REFLECTION_INTERVAL: u32 = 10;

/// A reflection also becomes due after this much time, provided a
/// minimum number of sessions has accumulated.
const STALE_AFTER_HOURS: i64 = 24;
const MIN_SESSIONS_WHEN_STALE: u32 = 3;

/// Per-agent reflection bookkeeping.
///
/// Mutated in exactly two ways: [`record_session`](Self::record_session)
/// on every completed conversational session, and
/// [`mark_reflected`](Self::mark_reflected) when a reflection is
/// applied.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReflectionTracker {
    /// Timestamp of the last applied reflection
    pub last_reflection: DateTime<Utc>,
    /// Completed sessions since the last reflection
    pub sessions_since_reflection: u32,
    /// Sessions between reflections
    #[serde(default = "default_interval")]
    pub reflection_interval: u32,
}

fn default_interval() -> u32 {
    DEFAULT_REFLECTION_INTERVAL
}

impl Default for ReflectionTracker {
    fn default() -> Self {
        Self {
            last_reflection: Utc::now(),
            sessions_since_reflection: 0,
            reflection_interval: DEFAULT_REFLECTION_INTERVAL,
        }
    }
}

impl ReflectionTracker {
    /// Creates a fresh tracker with a custom interval.
    pub fn with_interval(reflection_interval: u32) -> Self {
        Self {
            reflection_interval,
            ..Self::default()
        }
    }

    /// Whether a reflection is due at `now`.
    ///
    /// Either condition triggers: the session counter reached the
    /// interval, or more than 24 hours have passed since the last
    /// reflection while at least three sessions accumulated.
    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        if self.sessions_since_reflection >= self.reflection_interval {
            return true;
        }
        now - self.last_reflection > Duration::hours(STALE_AFTER_HOURS)
            && self.sessions_since_reflection >= MIN_SESSIONS_WHEN_STALE
    }

    /// Records a completed conversational session.
    pub fn record_session(&mut self) {
        self.sessions_since_reflection += 1;
    }

    /// Resets the counter and stamps the reflection time.
    ///
    /// Called whenever a reflection is applied, regardless of whether
    /// the persona document actually changed.
    pub fn mark_reflected(&mut self, now: DateTime<Utc>) {
        self.sessions_since_reflection = 0;
        self.last_reflection = now;
    }
}
