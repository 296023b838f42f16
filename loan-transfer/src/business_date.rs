use chrono::{Datelike, NaiveDate, Utc};

use std::sync::{
    atomic::{AtomicI32, Ordering},
    Arc,
};

/// The accounting date the engine operates on.
pub trait BusinessDateProvider: Send + Sync {
    fn business_date(&self) -> NaiveDate;
}

/// Uses the current UTC calendar date.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemBusinessDate;

impl BusinessDateProvider for SystemBusinessDate {
    fn business_date(&self) -> NaiveDate {
        Utc::now().date_naive()
    }
}

/// Business date that is set explicitly and advanced on demand.
#[derive(Debug, Clone)]
pub struct SimulatedBusinessDate {
    days_from_ce: Arc<AtomicI32>,
}

impl SimulatedBusinessDate {
    pub fn new(date: NaiveDate) -> Self {
        Self {
            days_from_ce: Arc::new(AtomicI32::new(date.num_days_from_ce())),
        }
    }

    pub fn set(&self, date: NaiveDate) {
        self.days_from_ce
            .store(date.num_days_from_ce(), Ordering::SeqCst);
    }

    pub fn advance_days(&self, days: i32) {
        self.days_from_ce.fetch_add(days, Ordering::SeqCst);
    }
}

impl BusinessDateProvider for SimulatedBusinessDate {
    fn business_date(&self) -> NaiveDate {
        let days = self.days_from_ce.load(Ordering::SeqCst);
        NaiveDate::from_num_days_from_ce_opt(days).unwrap_or(NaiveDate::MIN)
    }
}
