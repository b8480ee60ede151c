use serde::{Deserialize, Serialize};

use crate::utils::lenient;

pub const OPTION_COUNT: usize = 4;
const DEFAULT_MARKS: f64 = 1.0;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", from = "QuestionDocument")]
pub struct Question {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub subject: String,
    #[serde(rename = "class")]
    pub class_name: String,
    pub text: QuestionText,
    pub options: Vec<String>,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub correct_answer: String,
    pub marks: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    pub save_to_bank: bool,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct QuestionDocument {
    #[serde(default, rename = "_id", deserialize_with = "lenient::ref_id")]
    mongo_id: Option<String>,
    #[serde(default, deserialize_with = "lenient::ref_id")]
    id: Option<String>,
    #[serde(default)]
    subject: String,
    #[serde(default, rename = "class")]
    class_name: String,
    #[serde(alias = "question")]
    text: QuestionText,
    options: Vec<String>,
    #[serde(default)]
    correct_answer: String,
    #[serde(default, deserialize_with = "lenient::number")]
    marks: Option<f64>,
    #[serde(default)]
    image: Option<String>,
    #[serde(default)]
    save_to_bank: bool,
}

impl From<QuestionDocument> for Question {
    fn from(doc: QuestionDocument) -> Self {
        Question {
            id: doc.mongo_id.or(doc.id),
            subject: doc.subject,
            class_name: doc.class_name,
            text: doc.text,
            options: doc.options,
            correct_answer: doc.correct_answer,
            marks: doc.marks.unwrap_or(DEFAULT_MARKS),
            image: doc.image,
            save_to_bank: doc.save_to_bank,
        }
    }
}

/// Question body: a plain string, or text interleaved with formula segments.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum QuestionText {
    Plain(String),
    Segments(Vec<TextSegment>),
}

impl QuestionText {
    pub fn is_blank(&self) -> bool {
        match self {
            QuestionText::Plain(s) => s.trim().is_empty(),
            QuestionText::Segments(segments) => segments.iter().all(|s| s.value.trim().is_empty()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextSegment {
    #[serde(rename = "type", default)]
    pub kind: SegmentKind,
    pub value: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SegmentKind {
    #[default]
    Text,
    Formula,
}
