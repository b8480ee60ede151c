//! Business rules checked before anything is forwarded to the school API.

use std::collections::{HashMap, HashSet};

use validator::Validate;

use crate::dto::schedule_dto::SchedulePayload;
use crate::error::{Error, Result};
use crate::models::question::{Question, OPTION_COUNT};
use crate::models::test::{Batch, Schedule, Test, TestStatus};
use crate::models::user::{Capability, Role, User};
use crate::utils::time::parse_timestamp;

/// Marks are compared with this tolerance; totals come from decimal inputs.
const MARKS_EPSILON: f64 = 1e-6;

#[derive(Debug, Clone)]
pub struct ValidatedSchedule {
    pub batches: Vec<Batch>,
    /// Students listed in more than one batch. Reported, not rejected.
    pub warnings: Vec<String>,
}

fn reject(problems: Vec<String>) -> Result<()> {
    if problems.is_empty() {
        Ok(())
    } else {
        Err(Error::BadRequest(problems.join("; ")))
    }
}

pub fn validate_schedule(
    payload: &SchedulePayload,
    max_batch_size: Option<usize>,
) -> Result<ValidatedSchedule> {
    payload.validate()?;

    let mut problems = Vec::new();
    let mut names = HashSet::new();
    let mut batches = Vec::with_capacity(payload.batches.len());

    for (idx, raw) in payload.batches.iter().enumerate() {
        let name = raw.name.trim();
        let label = if name.is_empty() {
            format!("batch #{}", idx + 1)
        } else {
            format!("batch '{}'", name)
        };

        if name.is_empty() {
            problems.push(format!("{}: name cannot be blank", label));
        } else if !names.insert(name.to_lowercase()) {
            problems.push(format!("{}: name is used more than once", label));
        }

        let start = parse_timestamp(&raw.schedule.start);
        let end = parse_timestamp(&raw.schedule.end);
        match (start, end) {
            (None, _) => problems.push(format!(
                "{}: start '{}' is not a valid date",
                label, raw.schedule.start
            )),
            (_, None) => problems.push(format!(
                "{}: end '{}' is not a valid date",
                label, raw.schedule.end
            )),
            (Some(s), Some(e)) if s >= e => {
                problems.push(format!("{}: start must be before end", label))
            }
            _ => {}
        }

        let mut seen = HashSet::new();
        let mut students = Vec::with_capacity(raw.students.len());
        for student in &raw.students {
            let student = student.trim();
            if student.is_empty() {
                problems.push(format!("{}: contains a blank student id", label));
            } else if !seen.insert(student) {
                problems.push(format!("{}: student {} is listed twice", label, student));
            } else {
                students.push(student.to_string());
            }
        }

        if let Some(cap) = max_batch_size {
            if students.len() > cap {
                problems.push(format!(
                    "{}: {} students exceeds the batch capacity of {}",
                    label,
                    students.len(),
                    cap
                ));
            }
        }

        batches.push(Batch {
            name: name.to_string(),
            schedule: Schedule { start, end },
            students,
        });
    }

    reject(problems)?;

    Ok(ValidatedSchedule {
        warnings: multi_batch_warnings(&batches),
        batches,
    })
}

fn multi_batch_warnings(batches: &[Batch]) -> Vec<String> {
    let mut membership: HashMap<&str, Vec<&str>> = HashMap::new();
    let mut order = Vec::new();
    for batch in batches {
        for student in &batch.students {
            let entry = membership.entry(student.as_str()).or_default();
            if entry.is_empty() {
                order.push(student.as_str());
            }
            entry.push(batch.name.as_str());
        }
    }

    order
        .into_iter()
        .filter_map(|student| {
            let names = &membership[student];
            (names.len() > 1).then(|| {
                format!(
                    "student {} is in {} batches ({}); only '{}' will apply",
                    student,
                    names.len(),
                    names.join(", "),
                    names[0]
                )
            })
        })
        .collect()
}

pub fn validate_question(question: &Question) -> Result<()> {
    let mut problems = Vec::new();

    if question.text.is_blank() {
        problems.push("question text cannot be empty".to_string());
    }
    if question.options.len() != OPTION_COUNT {
        problems.push(format!(
            "a question needs exactly {} options, got {}",
            OPTION_COUNT,
            question.options.len()
        ));
    }
    if question.options.iter().any(|o| o.trim().is_empty()) {
        problems.push("options cannot be empty".to_string());
    }
    if question.correct_answer.trim().is_empty() {
        problems.push("a correct answer is required".to_string());
    } else if !question.options.iter().any(|o| o == &question.correct_answer) {
        problems.push("the correct answer must match one of the options".to_string());
    }
    if !(question.marks > 0.0) {
        problems.push("marks must be greater than zero".to_string());
    }

    reject(problems)
}

/// Question count and total marks must match the test's targets. Only
/// embedded questions contribute marks; bare references count toward the
/// question total.
pub fn validate_test_totals(test: &Test) -> Result<()> {
    let mut problems = Vec::new();

    if test.questions.is_empty() {
        problems.push("the test has no questions".to_string());
    }
    if let Some(target) = test.question_count {
        if test.questions.len() != target as usize {
            problems.push(format!(
                "the test has {} questions but targets {}",
                test.questions.len(),
                target
            ));
        }
    }
    if let Some(target) = test.total_marks {
        let all_embedded = test.embedded_questions().count() == test.questions.len();
        if all_embedded {
            let sum: f64 = test.embedded_questions().map(|q| q.marks).sum();
            if (sum - target).abs() > MARKS_EPSILON {
                problems.push(format!(
                    "question marks add up to {} but the test targets {}",
                    sum, target
                ));
            }
        }
    }

    reject(problems)
}

/// Checks a status change against the workflow and the actor's capabilities.
pub fn validate_transition(test: &Test, target: TestStatus, role: Role) -> Result<()> {
    if !test.status.can_transition_to(target) {
        return Err(Error::BadRequest(format!(
            "cannot move a {} test to {}",
            test.status, target
        )));
    }

    let needed = match (test.status, target) {
        (TestStatus::Draft, TestStatus::Approved) | (TestStatus::Approved, TestStatus::Draft) => {
            Capability::ApproveTests
        }
        _ => Capability::ScheduleTests,
    };
    if !role.can(needed) {
        return Err(Error::forbidden(
            "forbidden",
            format!("a {} cannot move a test to {}", role.as_str(), target),
        ));
    }

    match target {
        TestStatus::Approved if test.status == TestStatus::Draft => validate_test_totals(test),
        TestStatus::Scheduled => {
            if test.batches.is_empty() {
                return Err(Error::BadRequest(
                    "a test needs at least one batch before it is scheduled".to_string(),
                ));
            }
            validate_test_totals(test)
        }
        _ => Ok(()),
    }
}

/// Teachers may edit only their drafts; admins may edit anything not completed.
pub fn validate_edit(test: &Test, role: Role) -> Result<()> {
    match role {
        Role::Teacher if test.status != TestStatus::Draft => Err(Error::forbidden(
            "forbidden",
            format!("only draft tests can be edited, this one is {}", test.status),
        )),
        _ if test.status == TestStatus::Completed => {
            Err(Error::BadRequest("completed tests cannot be edited".to_string()))
        }
        _ => Ok(()),
    }
}

pub fn validate_user(user: &User, actor: Role) -> Result<()> {
    let mut problems = Vec::new();

    if user.name.trim().is_empty() {
        problems.push("name cannot be empty".to_string());
    }
    if !validator::ValidateEmail::validate_email(&user.email) {
        problems.push(format!("'{}' is not a valid email", user.email));
    }
    match user.role {
        Role::Teacher if user.teaching.is_empty() => {
            problems.push("a teacher needs at least one subject/class assignment".to_string())
        }
        Role::Teacher => {
            if user
                .teaching
                .iter()
                .any(|t| t.subject.trim().is_empty() || t.class_name.trim().is_empty())
            {
                problems.push("teaching assignments need both a subject and a class".to_string());
            }
        }
        Role::Student if user.class_name.as_deref().map_or(true, |c| c.trim().is_empty()) => {
            problems.push("a student must be enrolled in a class".to_string())
        }
        _ => {}
    }

    reject(problems)?;

    if matches!(user.role, Role::Admin | Role::SuperAdmin) && !actor.can(Capability::ManageAdmins) {
        return Err(Error::forbidden(
            "forbidden",
            "only a super admin can manage administrator accounts",
        ));
    }
    Ok(())
}

pub fn validate_score_correction(score: f64, total_marks: Option<f64>) -> Result<()> {
    if !score.is_finite() || score < 0.0 {
        return Err(Error::BadRequest("score must be a non-negative number".to_string()));
    }
    if let Some(total) = total_marks {
        if score > total + MARKS_EPSILON {
            return Err(Error::BadRequest(format!(
                "score {} exceeds the test total of {}",
                score, total
            )));
        }
    }
    Ok(())
}
