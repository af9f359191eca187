use chrono::{DateTime, Duration, Utc};

/// Wall clock that can be frozen and stepped for deterministic tests.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Clock {
    fake: Option<DateTime<Utc>>,
}

impl Clock {
    pub fn now(&self) -> DateTime<Utc> {
        self.fake.unwrap_or_else(Utc::now)
    }

    pub fn is_fake(&self) -> bool {
        self.fake.is_some()
    }

    pub fn set(&mut self, instant: DateTime<Utc>) {
        self.fake = Some(instant);
    }

    pub fn advance(&mut self, milliseconds: i64) {
        let base = self.now();
        self.fake = Some(base + Duration::milliseconds(milliseconds));
    }

    pub fn restore(&mut self) {
        self.fake = None;
    }
}
