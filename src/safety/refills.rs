use chrono::NaiveDate;

use crate::models::Medication;

use super::types::{OverdueRefill, RefillStatus, UpcomingRefill};

/// Refills due within this many days are "upcoming".
pub const DEFAULT_REFILL_WINDOW_DAYS: i64 = 7;

/// Upcoming and overdue refill windows.
///
/// Arithmetic is on calendar dates (midnight to midnight), so the result
/// does not depend on the hour the evaluation runs.
#[derive(Debug, Clone, Copy)]
pub struct RefillEvaluator {
    window_days: i64,
}

impl Default for RefillEvaluator {
    fn default() -> Self {
        Self::new(DEFAULT_REFILL_WINDOW_DAYS)
    }
}

impl RefillEvaluator {
    pub fn new(window_days: i64) -> Self {
        Self {
            window_days: window_days.max(0),
        }
    }

    /// Evaluate against today's local calendar date.
    pub fn evaluate(&self, medications: &[Medication]) -> RefillStatus {
        self.evaluate_on(medications, chrono::Local::now().date_naive())
    }

    pub fn evaluate_on(&self, medications: &[Medication], today: NaiveDate) -> RefillStatus {
        let mut status = RefillStatus::default();

        for med in medications {
            let Some(refill_date) = med.refill_date else {
                continue;
            };
            let days_until = (refill_date - today).num_days();

            if days_until < 0 {
                status.overdue.push(OverdueRefill {
                    medication: med.clone(),
                    days_overdue: -days_until,
                });
            } else if days_until <= self.window_days {
                status.upcoming.push(UpcomingRefill {
                    medication: med.clone(),
                    days_until,
                });
            }
        }

        status
    }
}
