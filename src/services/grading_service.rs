use crate::dto::test_dto::SubmittedAnswer;
use crate::models::result::AnswerRecord;
use crate::models::test::{QuestionRef, Test};

#[derive(Debug, Clone, PartialEq)]
pub struct GradedSubmission {
    pub score: f64,
    pub max_score: f64,
    pub answers: Vec<AnswerRecord>,
    /// Referenced questions whose body was not embedded in the test.
    pub ungraded: Vec<String>,
}

pub struct GradingService;

impl GradingService {
    /// Scores a submission against the test's embedded questions. An answer
    /// is correct when the selected option equals the stored correct answer.
    pub fn grade(test: &Test, answers: &[SubmittedAnswer]) -> GradedSubmission {
        let mut score = 0.0;
        let mut max_score = 0.0;
        let mut records = Vec::new();
        let mut ungraded = Vec::new();

        for (idx, question_ref) in test.questions.iter().enumerate() {
            let question_id = question_ref
                .id()
                .map(str::to_string)
                .unwrap_or_else(|| (idx + 1).to_string());

            let question = match question_ref {
                QuestionRef::Embedded(q) => q,
                QuestionRef::Id(_) => {
                    ungraded.push(question_id);
                    continue;
                }
            };

            max_score += question.marks;
            let selected = answers
                .iter()
                .find(|a| a.question == question_id)
                .and_then(|a| a.selected.clone())
                .filter(|s| !s.is_empty());
            let is_correct = selected.as_deref() == Some(question.correct_answer.as_str());
            if is_correct {
                score += question.marks;
            }

            records.push(AnswerRecord {
                question: question_id,
                selected,
                correct: question.correct_answer.clone(),
                is_correct,
            });
        }

        if !ungraded.is_empty() {
            tracing::warn!(
                test_id = %test.id,
                count = ungraded.len(),
                "questions without a body were left ungraded"
            );
        }

        GradedSubmission {
            score,
            max_score,
            answers: records,
            ungraded,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::question::{Question, QuestionText};
    use crate::models::test::TestStatus;

    fn question(id: &str, correct: &str, marks: f64) -> QuestionRef {
        QuestionRef::Embedded(Box::new(Question {
            id: Some(id.to_string()),
            subject: "Math".to_string(),
            class_name: "JSS1".to_string(),
            text: QuestionText::Plain(format!("question {}", id)),
            options: vec!["a".into(), "b".into(), "c".into(), "d".into()],
            correct_answer: correct.to_string(),
            marks,
            image: None,
            save_to_bank: false,
        }))
    }

    fn answer(question: &str, selected: Option<&str>) -> SubmittedAnswer {
        SubmittedAnswer {
            question: question.to_string(),
            selected: selected.map(str::to_string),
        }
    }

    #[test]
    fn scores_correct_answers_and_records_each_question() {
        let test = Test {
            id: "t1".to_string(),
            title: "Quiz".to_string(),
            subject: "Math".to_string(),
            class_name: "JSS1".to_string(),
            status: TestStatus::Scheduled,
            session: None,
            duration: Some(20),
            question_count: Some(4),
            total_marks: Some(7.0),
            questions: vec![
                question("q1", "a", 2.0),
                question("q2", "b", 3.0),
                question("q3", "c", 2.0),
                QuestionRef::Id("q4".to_string()),
            ],
            batches: Vec::new(),
            created_by: None,
        };

        let graded = GradingService::grade(
            &test,
            &[answer("q1", Some("a")), answer("q2", Some("c")), answer("q4", Some("d"))],
        );

        assert_eq!(graded.score, 2.0);
        assert_eq!(graded.max_score, 7.0);
        assert_eq!(graded.ungraded, vec!["q4"]);
        assert_eq!(graded.answers.len(), 3);
        assert!(graded.answers[0].is_correct);
        assert_eq!(graded.answers[1].selected.as_deref(), Some("c"));
        assert!(!graded.answers[1].is_correct);
        assert_eq!(graded.answers[2].selected, None);
        assert_eq!(graded.answers[2].correct, "c");
    }
}
