//! Batch membership and scheduling-window checks that gate the "take test"
//! action. Everything here is pure: no I/O, no clock reads except in
//! [`is_available_now`], and no failure path. Bad or missing data always
//! resolves to "not available".

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::models::test::{Batch, Test, TestStatus};

/// Why a student can or cannot enter a test at a given instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum Availability {
    NoBatch,
    InvalidWindow,
    #[serde(rename = "not_yet_open")]
    Upcoming { opens_at: DateTime<Utc> },
    Open { closes_at: DateTime<Utc> },
    Closed { closed_at: DateTime<Utc> },
}

impl Availability {
    pub fn is_open(&self) -> bool {
        matches!(self, Availability::Open { .. })
    }

    /// Seconds left before the window closes, for countdown displays.
    pub fn seconds_remaining(&self, now: DateTime<Utc>) -> Option<i64> {
        match self {
            Availability::Open { closes_at } => Some((*closes_at - now).num_seconds().max(0)),
            _ => None,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            Availability::NoBatch => "no_batch",
            Availability::InvalidWindow => "invalid_window",
            Availability::Upcoming { .. } => "not_yet_open",
            Availability::Open { .. } => "open",
            Availability::Closed { .. } => "closed",
        }
    }

    pub fn message(&self) -> String {
        match self {
            Availability::NoBatch => {
                "You have not been assigned to a batch for this test".to_string()
            }
            Availability::InvalidWindow => {
                "This test has no valid schedule for your batch".to_string()
            }
            Availability::Upcoming { opens_at } => {
                format!("This test is not yet available; it opens at {}", opens_at.to_rfc3339())
            }
            Availability::Open { closes_at } => {
                format!("This test is open until {}", closes_at.to_rfc3339())
            }
            Availability::Closed { closed_at } => {
                format!("This test closed at {}", closed_at.to_rfc3339())
            }
        }
    }
}

/// First batch, in list order, whose students include `student_id`.
pub fn find_student_batch<'a>(test: &'a Test, student_id: &str) -> Option<&'a Batch> {
    test.batches.iter().find(|batch| batch.contains(student_id))
}

pub fn evaluate(test: &Test, student_id: &str, now: DateTime<Utc>) -> Availability {
    let Some(batch) = find_student_batch(test, student_id) else {
        return Availability::NoBatch;
    };
    let Some((start, end)) = batch.schedule.window() else {
        return Availability::InvalidWindow;
    };

    if now < start {
        Availability::Upcoming { opens_at: start }
    } else if now > end {
        Availability::Closed { closed_at: end }
    } else {
        Availability::Open { closes_at: end }
    }
}

/// True iff the student's batch window contains `now`, both ends inclusive.
pub fn is_available(test: &Test, student_id: &str, now: DateTime<Utc>) -> bool {
    evaluate(test, student_id, now).is_open()
}

pub fn is_available_now(test: &Test, student_id: &str) -> bool {
    is_available(test, student_id, Utc::now())
}

/// Scheduled tests the student has a batch in, narrowed by optional subject and
/// class filters. An empty filter matches everything. Input order is kept.
pub fn filter_visible_tests<'a>(
    tests: &'a [Test],
    student_id: &str,
    subject_filter: Option<&str>,
    class_filter: Option<&str>,
) -> Vec<&'a Test> {
    let subject_filter = subject_filter.filter(|s| !s.is_empty());
    let class_filter = class_filter.filter(|c| !c.is_empty());

    tests
        .iter()
        .filter(|test| test.status == TestStatus::Scheduled)
        .filter(|test| find_student_batch(test, student_id).is_some())
        .filter(|test| subject_filter.map_or(true, |s| test.subject == s))
        .filter(|test| class_filter.map_or(true, |c| test.class_name == c))
        .collect()
}
