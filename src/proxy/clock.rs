// ABOUTME: Time source for names that must be unique across deploys.
// ABOUTME: Injectable so renamed containers get predictable names in tests.

use chrono::{DateTime, Utc};

pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// `<name>_replaced_<UTC timestamp in milliseconds>`, the name a displaced container is parked under.
pub fn replaced_name(name: &str, clock: &dyn Clock) -> String {
    format!("{name}_replaced_{}", clock.now().format("%Y%m%d%H%M%S%3f"))
}
