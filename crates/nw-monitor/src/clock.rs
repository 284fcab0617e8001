//! Wall-clock seam.

use std::time::Duration;

use chrono::{DateTime, Utc};
use chrono_tz::Tz;

#[async_trait::async_trait]
pub trait Clock: Send + Sync {
    /// Current exchange-local time.
    fn now(&self) -> DateTime<Tz>;

    async fn sleep(&self, duration: Duration);
}

/// Real time: `Utc::now()` in the exchange timezone, tokio sleeps.
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    tz: Tz,
}

impl SystemClock {
    pub fn new(tz: Tz) -> Self {
        Self { tz }
    }
}

#[async_trait::async_trait]
impl Clock for SystemClock {
    fn now(&self) -> DateTime<Tz> {
        Utc::now().with_timezone(&self.tz)
    }

    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn system_clock_reports_the_configured_zone() {
        let clock = SystemClock::new(chrono_tz::Asia::Shanghai);
        assert_eq!(clock.now().timezone(), chrono_tz::Asia::Shanghai);
        clock.sleep(Duration::ZERO).await;
    }
}
