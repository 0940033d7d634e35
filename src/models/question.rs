use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value as JsonValue;
use sqlx::FromRow;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::{Error, Result};

pub const MIN_OPTIONS: usize = 2;
pub const MAX_OPTIONS: usize = 6;

/// Key of an MCQ option: a single lowercase letter in `a..=f`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct OptionKey(char);

impl OptionKey {
    pub fn from_index(index: usize) -> Option<Self> {
        if index < MAX_OPTIONS {
            Some(Self((b'a' + index as u8) as char))
        } else {
            None
        }
    }

    pub fn as_char(&self) -> char {
        self.0
    }
}

impl FromStr for OptionKey {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let mut chars = s.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) if ('a'..='f').contains(&c) => Ok(Self(c)),
            _ => Err(Error::InvalidAnswer(format!("'{}' is not an option key", s))),
        }
    }
}

impl fmt::Display for OptionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Serialize for OptionKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for OptionKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// Ordered option set of an MCQ question.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct McqOptions(BTreeMap<OptionKey, String>);

impl McqOptions {
    /// Assigns keys `a`, `b`, ... to the texts in order.
    pub fn from_texts(texts: &[String]) -> Result<Self> {
        if texts.len() < MIN_OPTIONS || texts.len() > MAX_OPTIONS {
            return Err(Error::InvalidQuestion(format!(
                "MCQ questions need between {} and {} options, got {}",
                MIN_OPTIONS,
                MAX_OPTIONS,
                texts.len()
            )));
        }
        let mut map = BTreeMap::new();
        for (idx, text) in texts.iter().enumerate() {
            let text = text.trim();
            if text.is_empty() {
                return Err(Error::InvalidQuestion(format!("option {} is empty", idx + 1)));
            }
            if map.values().any(|t: &String| t == text) {
                return Err(Error::InvalidQuestion(format!("duplicate option '{}'", text)));
            }
            let key = OptionKey::from_index(idx)
                .ok_or_else(|| Error::InvalidQuestion("too many options".to_string()))?;
            map.insert(key, text.to_string());
        }
        Ok(Self(map))
    }

    /// Rebuilds the option set from its stored `{key: text}` JSON object.
    pub fn from_json(value: &JsonValue) -> Result<Self> {
        let obj = value
            .as_object()
            .ok_or_else(|| Error::Internal("stored MCQ options are not an object".to_string()))?;
        let mut map = BTreeMap::new();
        for (k, v) in obj {
            let key: OptionKey = k
                .parse()
                .map_err(|_| Error::Internal(format!("stored option key '{}' is invalid", k)))?;
            let text = v
                .as_str()
                .ok_or_else(|| Error::Internal(format!("stored option '{}' is not text", k)))?;
            map.insert(key, text.to_string());
        }
        if map.len() < MIN_OPTIONS {
            return Err(Error::Internal("stored MCQ has too few options".to_string()));
        }
        Ok(Self(map))
    }

    pub fn to_json(&self) -> JsonValue {
        let obj: serde_json::Map<String, JsonValue> = self
            .0
            .iter()
            .map(|(k, v)| (k.to_string(), JsonValue::String(v.clone())))
            .collect();
        JsonValue::Object(obj)
    }

    pub fn contains(&self, key: OptionKey) -> bool {
        self.0.contains_key(&key)
    }

    pub fn key_for_text(&self, text: &str) -> Option<OptionKey> {
        let text = text.trim();
        self.0.iter().find(|(_, t)| t.as_str() == text).map(|(k, _)| *k)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn to_public(&self) -> Vec<PublicOption> {
        self.0
            .iter()
            .map(|(k, v)| PublicOption {
                key: k.to_string(),
                text: v.clone(),
            })
            .collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub enum QuestionType {
    #[serde(rename = "MCQ")]
    Mcq,
    #[serde(rename = "DESCRIPTIVE")]
    Descriptive,
}

impl QuestionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            QuestionType::Mcq => "MCQ",
            QuestionType::Descriptive => "DESCRIPTIVE",
        }
    }
}

impl FromStr for QuestionType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_uppercase().as_str() {
            "MCQ" => Ok(QuestionType::Mcq),
            "DESCRIPTIVE" => Ok(QuestionType::Descriptive),
            other => Err(Error::InvalidQuestion(format!("unknown question type '{}'", other))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QuestionKind {
    Mcq {
        options: McqOptions,
        correct_answer: OptionKey,
    },
    Descriptive,
}

impl QuestionKind {
    pub fn question_type(&self) -> QuestionType {
        match self {
            QuestionKind::Mcq { .. } => QuestionType::Mcq,
            QuestionKind::Descriptive => QuestionType::Descriptive,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Question {
    pub id: Uuid,
    pub assessment_id: Uuid,
    pub text: String,
    pub marks: Decimal,
    pub kind: QuestionKind,
    pub created_at: DateTime<Utc>,
}

impl Question {
    /// Candidate-facing shape: never carries the correct answer.
    pub fn public_view(&self) -> PublicQuestion {
        PublicQuestion {
            id: self.id,
            question_text: self.text.clone(),
            question_type: self.kind.question_type(),
            marks: self.marks,
            options: match &self.kind {
                QuestionKind::Mcq { options, .. } => Some(options.to_public()),
                QuestionKind::Descriptive => None,
            },
        }
    }

    pub fn admin_view(&self) -> AdminQuestion {
        let (options, correct_answer) = match &self.kind {
            QuestionKind::Mcq {
                options,
                correct_answer,
            } => (Some(options.to_public()), Some(correct_answer.to_string())),
            QuestionKind::Descriptive => (None, None),
        };
        AdminQuestion {
            id: self.id,
            question_text: self.text.clone(),
            question_type: self.kind.question_type(),
            marks: self.marks,
            options,
            correct_answer,
            created_at: self.created_at,
        }
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct QuestionRow {
    pub id: Uuid,
    pub assessment_id: Uuid,
    pub question_text: String,
    pub question_type: String,
    pub marks: Decimal,
    pub options: Option<JsonValue>,
    pub correct_answer: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl TryFrom<QuestionRow> for Question {
    type Error = Error;

    fn try_from(row: QuestionRow) -> Result<Self> {
        let question_type: QuestionType = row
            .question_type
            .parse()
            .map_err(|_| Error::Internal(format!("question {} has an unknown type", row.id)))?;
        let kind = match question_type {
            QuestionType::Mcq => {
                let options = row
                    .options
                    .as_ref()
                    .ok_or_else(|| Error::Internal(format!("MCQ {} has no options", row.id)))
                    .and_then(McqOptions::from_json)?;
                let correct_answer: OptionKey = row
                    .correct_answer
                    .as_deref()
                    .unwrap_or_default()
                    .parse()
                    .map_err(|_| {
                        Error::Internal(format!("MCQ {} has an invalid correct answer", row.id))
                    })?;
                if !options.contains(correct_answer) {
                    return Err(Error::Internal(format!(
                        "MCQ {} correct answer is not one of its options",
                        row.id
                    )));
                }
                QuestionKind::Mcq {
                    options,
                    correct_answer,
                }
            }
            QuestionType::Descriptive => QuestionKind::Descriptive,
        };
        Ok(Question {
            id: row.id,
            assessment_id: row.assessment_id,
            text: row.question_text,
            marks: row.marks,
            kind,
            created_at: row.created_at,
        })
    }
}

/// Validated question ready to be inserted.
#[derive(Debug, Clone)]
pub struct NewQuestion {
    pub text: String,
    pub marks: Decimal,
    pub kind: QuestionKind,
}

impl NewQuestion {
    pub fn options_json(&self) -> Option<JsonValue> {
        match &self.kind {
            QuestionKind::Mcq { options, .. } => Some(options.to_json()),
            QuestionKind::Descriptive => None,
        }
    }

    pub fn correct_answer(&self) -> Option<String> {
        match &self.kind {
            QuestionKind::Mcq { correct_answer, .. } => Some(correct_answer.to_string()),
            QuestionKind::Descriptive => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
pub struct PublicOption {
    pub key: String,
    pub text: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PublicQuestion {
    pub id: Uuid,
    pub question_text: String,
    pub question_type: QuestionType,
    pub marks: Decimal,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<PublicOption>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AdminQuestion {
    pub id: Uuid,
    pub question_text: String,
    pub question_type: QuestionType,
    pub marks: Decimal,
    pub options: Option<Vec<PublicOption>>,
    pub correct_answer: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn texts(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn option_keys_follow_the_fixed_alphabet() {
        assert_eq!(OptionKey::from_index(0).unwrap().as_char(), 'a');
        assert_eq!(OptionKey::from_index(5).unwrap().as_char(), 'f');
        assert!(OptionKey::from_index(6).is_none());
        assert!("c".parse::<OptionKey>().is_ok());
        assert!("g".parse::<OptionKey>().is_err());
        assert!("ab".parse::<OptionKey>().is_err());
        assert!("A".parse::<OptionKey>().is_err());
        assert!("".parse::<OptionKey>().is_err());
    }

    #[test]
    fn options_from_texts_assign_keys_in_order() {
        let opts = McqOptions::from_texts(&texts(&["3", "4", "5"])).unwrap();
        assert_eq!(opts.len(), 3);
        assert_eq!(opts.key_for_text("4").unwrap().to_string(), "b");
        let public = opts.to_public();
        let keys: Vec<_> = public.iter().map(|o| o.key.as_str()).collect();
        assert_eq!(keys, vec!["a", "b", "c"]);
    }

    #[test]
    fn options_reject_bad_shapes() {
        assert!(McqOptions::from_texts(&texts(&["only"])).is_err());
        assert!(McqOptions::from_texts(&texts(&["1", "2", "3", "4", "5", "6", "7"])).is_err());
        assert!(McqOptions::from_texts(&texts(&["1", " "])).is_err());
        assert!(McqOptions::from_texts(&texts(&["same", "same"])).is_err());
    }

    #[test]
    fn stored_options_keep_key_order() {
        let stored = json!({"c": "three", "a": "one", "b": "two"});
        let opts = McqOptions::from_json(&stored).unwrap();
        let keys: Vec<_> = opts.to_public().into_iter().map(|o| o.key).collect();
        assert_eq!(keys, vec!["a", "b", "c"]);
        assert_eq!(McqOptions::from_json(&opts.to_json()).unwrap(), opts);
    }

    fn mcq_row(correct: &str) -> QuestionRow {
        QuestionRow {
            id: Uuid::new_v4(),
            assessment_id: Uuid::new_v4(),
            question_text: "2+2?".into(),
            question_type: "MCQ".into(),
            marks: Decimal::from(5),
            options: Some(json!({"a": "4", "b": "5"})),
            correct_answer: Some(correct.into()),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn public_view_never_exposes_correct_answer() {
        let q = Question::try_from(mcq_row("a")).unwrap();
        let value = serde_json::to_value(q.public_view()).unwrap();
        assert!(value.get("correct_answer").is_none());
        assert_eq!(value["options"][0]["key"], "a");
        assert_eq!(value["options"][1]["text"], "5");
        assert_eq!(value["question_type"], "MCQ");
    }

    #[test]
    fn corrupt_rows_are_rejected() {
        assert!(Question::try_from(mcq_row("e")).is_err());
        let mut row = mcq_row("a");
        row.options = None;
        assert!(Question::try_from(row).is_err());
        let mut row = mcq_row("a");
        row.question_type = "ESSAY".into();
        assert!(Question::try_from(row).is_err());
    }

    #[test]
    fn descriptive_rows_ignore_answer_columns() {
        let mut row = mcq_row("a");
        row.question_type = "descriptive".into();
        row.options = None;
        row.correct_answer = None;
        let q = Question::try_from(row).unwrap();
        assert_eq!(q.kind, QuestionKind::Descriptive);
        assert!(q.public_view().options.is_none());
    }
}
