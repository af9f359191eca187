pub mod clock;

pub use clock::Clock;

use crate::failure::{Failure, Result};
use crate::time;
use crate::value::{Map, Value};
use chrono::{DateTime, Utc};
use std::fmt;

type CleanupHook = Box<dyn FnOnce()>;

/// Per-scenario world: timezone, saved links, a free-form data bag read by
/// expressions and resolvers, cleanup hooks and a deterministic clock.
#[derive(Default)]
pub struct TestContext {
    pub timezone: Option<String>,
    pub data: Map,
    saved_links: Option<Map>,
    cleanups: Vec<CleanupHook>,
    clock: Clock,
}

impl TestContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_timezone(timezone: impl Into<String>) -> Self {
        let mut context = Self::default();
        context.timezone = Some(timezone.into());
        context
    }

    /// Builder-style insert into the data bag.
    pub fn with_data(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.data.insert(key.into(), value.into());
        self
    }

    /// Configured timezone, or the default zone when unset.
    pub fn timezone_name(&self) -> &str {
        self.timezone.as_deref().unwrap_or(time::DEFAULT_TIMEZONE)
    }

    pub fn saved_links(&self) -> Option<&Map> {
        self.saved_links.as_ref()
    }

    pub fn saved_link(&self, name: &str) -> Option<&Value> {
        self.saved_links.as_ref().and_then(|links| links.get(name))
    }

    /// Store a captured entry; the map is created on first use.
    pub fn save_link(&mut self, name: impl Into<String>, entry: Value) {
        self.saved_links
            .get_or_insert_with(Map::new)
            .insert(name.into(), entry);
    }

    /// Object seen as `this` by `{{...}}` expressions.
    pub fn scope(&self) -> Value {
        let mut scope = self.data.clone();
        scope.insert(
            "timezone".to_owned(),
            Value::String(self.timezone_name().to_owned()),
        );
        if let Some(links) = &self.saved_links {
            scope.insert("savedLinks".to_owned(), Value::Object(links.clone()));
        }
        Value::Object(scope)
    }

    pub fn register_cleanup(&mut self, hook: impl FnOnce() + 'static) {
        self.cleanups.push(Box::new(hook));
    }

    /// Restore real time, drop saved links and run cleanup hooks, newest first.
    pub fn teardown(&mut self) {
        self.restore_time();
        self.saved_links = None;
        while let Some(hook) = self.cleanups.pop() {
            hook();
        }
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    pub fn clock(&self) -> &Clock {
        &self.clock
    }

    /// Move fake time forward, freezing the clock at the real now first if needed.
    pub fn advance_time(&mut self, milliseconds: i64) {
        self.clock.advance(milliseconds);
        tracing::debug!(now = %self.clock.now(), "advanced fake time by {milliseconds}ms");
    }

    pub fn set_time(&mut self, instant: DateTime<Utc>) {
        self.clock.set(instant);
        tracing::debug!(now = %instant, "fake time set");
    }

    pub fn restore_time(&mut self) {
        if self.clock.is_fake() {
            tracing::info!("restoring time to present");
            self.clock.restore();
        }
    }

    /// Parse wall-clock text in the context timezone (or UTC) and freeze time there.
    pub fn parse_and_set_time(&mut self, text: &str, is_utc: bool) -> Result<DateTime<Utc>> {
        let instant = time::parse_time(self, text, is_utc).ok_or_else(|| {
            Failure::validation(format!(
                "could not parse time \"{text}\" in time-zone {}",
                self.timezone_name()
            ))
        })?;
        self.set_time(instant);
        Ok(instant)
    }

    /// Run `action` with the clock frozen at `instant`, restoring real time afterwards.
    pub fn execute_at<R>(
        &mut self,
        instant: DateTime<Utc>,
        action: impl FnOnce(&mut Self) -> R,
    ) -> R {
        self.set_time(instant);
        let result = action(self);
        self.restore_time();
        result
    }
}

impl fmt::Debug for TestContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TestContext")
            .field("timezone", &self.timezone)
            .field("data", &self.data)
            .field("saved_links", &self.saved_links)
            .field("cleanups", &self.cleanups.len())
            .field("clock", &self.clock)
            .finish()
    }
}

impl Drop for TestContext {
    fn drop(&mut self) {
        self.teardown();
    }
}
