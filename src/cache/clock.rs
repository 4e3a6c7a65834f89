use std::sync::Mutex;
use std::time::Duration;

use time::OffsetDateTime;

use super::lock::mutex_lock;

const SOURCE: &str = "cache::clock";

/// Source of "now" for snapshot timestamps and freshness checks.
pub trait Clock: Send + Sync {
    fn now(&self) -> OffsetDateTime;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> OffsetDateTime {
        OffsetDateTime::now_utc()
    }
}

/// Clock that only moves when told to.
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<OffsetDateTime>,
}

impl ManualClock {
    pub fn new(start: OffsetDateTime) -> Self {
        Self {
            now: Mutex::new(start),
        }
    }

    /// Clock parked at the Unix epoch, so scenario times read as plain seconds.
    pub fn at_epoch() -> Self {
        Self::new(OffsetDateTime::UNIX_EPOCH)
    }

    pub fn advance(&self, by: Duration) {
        let mut now = mutex_lock(&self.now, SOURCE, "advance");
        *now += by;
    }

    pub fn set(&self, at: OffsetDateTime) {
        *mutex_lock(&self.now, SOURCE, "set") = at;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> OffsetDateTime {
        *mutex_lock(&self.now, SOURCE, "now")
    }
}
