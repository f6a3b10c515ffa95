use chrono::Utc;
use std::sync::atomic::{AtomicI64, Ordering};

/// Source of the current instant, replaced by `FixedSys` in tests
pub trait ISys: Send + Sync {
    /// Epoch millis
    fn get_timestamp_millis(&self) -> i64;
}

/// Wall clock
pub struct RealSys {}
impl ISys for RealSys {
    fn get_timestamp_millis(&self) -> i64 {
        Utc::now().timestamp_millis()
    }
}

/// Clock that only moves when told to
pub struct FixedSys {
    now: AtomicI64,
}

impl FixedSys {
    pub fn new(now: i64) -> Self {
        Self {
            now: AtomicI64::new(now),
        }
    }

    pub fn set(&self, now: i64) {
        self.now.store(now, Ordering::SeqCst);
    }

    pub fn advance(&self, millis: i64) {
        self.now.fetch_add(millis, Ordering::SeqCst);
    }
}

impl ISys for FixedSys {
    fn get_timestamp_millis(&self) -> i64 {
        self.now.load(Ordering::SeqCst)
    }
}
