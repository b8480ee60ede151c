use serde::{Deserialize, Serialize};

use crate::utils::lenient;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", from = "ResultDocument")]
pub struct TestResult {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub test: String,
    pub student: String,
    pub score: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_marks: Option<f64>,
}

/// `test` and `student` may be plain ids or populated documents.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ResultDocument {
    #[serde(default, rename = "_id", deserialize_with = "lenient::ref_id")]
    mongo_id: Option<String>,
    #[serde(default, deserialize_with = "lenient::ref_id")]
    id: Option<String>,
    #[serde(alias = "testId", deserialize_with = "lenient::required_ref_id")]
    test: String,
    #[serde(alias = "studentId", deserialize_with = "lenient::required_ref_id")]
    student: String,
    #[serde(default, deserialize_with = "lenient::number")]
    score: Option<f64>,
    #[serde(default, deserialize_with = "lenient::number")]
    total_marks: Option<f64>,
}

impl From<ResultDocument> for TestResult {
    fn from(doc: ResultDocument) -> Self {
        TestResult {
            id: doc.mongo_id.or(doc.id),
            test: doc.test,
            student: doc.student,
            score: doc.score,
            total_marks: doc.total_marks,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerRecord {
    pub question: String,
    pub selected: Option<String>,
    pub correct: String,
    pub is_correct: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn populated_result_refs_resolve_to_ids() {
        let result: TestResult = serde_json::from_value(json!({
            "_id": "r1",
            "id": "r1",
            "test": { "_id": "t1", "title": "Algebra" },
            "student": { "_id": "stu-1", "name": "Bo" },
            "score": "3",
            "totalMarks": 5
        }))
        .unwrap();
        assert_eq!(result.id.as_deref(), Some("r1"));
        assert_eq!(result.test, "t1");
        assert_eq!(result.student, "stu-1");
        assert_eq!(result.score, Some(3.0));
        assert_eq!(result.total_marks, Some(5.0));
    }

    #[test]
    fn results_need_a_test_and_a_student() {
        let missing_test = json!({ "_id": "r1", "student": "stu-1", "score": 1 });
        assert!(serde_json::from_value::<TestResult>(missing_test).is_err());

        let unusable_student = json!({ "testId": "t1", "studentId": { "name": "Bo" } });
        assert!(serde_json::from_value::<TestResult>(unusable_student).is_err());
    }
}
