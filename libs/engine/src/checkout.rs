//! Checkout board: due-today / overdue classification.
//!
//! Pure computation over the checked-in guest set and the current date. The
//! engine holds no clock and schedules nothing; a caller (dashboard request,
//! external timer) invokes this on demand and decides how to deliver notices.

use chrono::{NaiveDate, Timelike};
use serde::Serialize;

use crate::guest::Guest;

/// Checked-in guests classified against their expected checkout date.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CheckoutBoard {
    /// Expected checkout date equals the current date.
    pub due_today: Vec<Guest>,
    /// Expected checkout date is strictly before the current date.
    pub overdue: Vec<Guest>,
}

impl CheckoutBoard {
    /// Partitions the checked-in guests by expected checkout date. Guests with
    /// a future date, and guests not checked in, appear in neither list.
    pub fn partition(guests: impl IntoIterator<Item = Guest>, today: NaiveDate) -> Self {
        let mut board = Self::default();
        for guest in guests {
            if !guest.checked_in {
                continue;
            }
            if guest.expected_checkout == today {
                board.due_today.push(guest);
            } else if guest.expected_checkout < today {
                board.overdue.push(guest);
            }
        }
        board
    }

    pub fn is_empty(&self) -> bool {
        self.due_today.is_empty() && self.overdue.is_empty()
    }
}

/// Whether the time falls in the reminder-escalation window (the noon hour).
pub fn is_noon_window<T: Timelike>(time: &T) -> bool {
    time.hour() == 12
}
