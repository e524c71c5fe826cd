//! Field rules for create and update payloads.
//!
//! The same functions back the API handlers and the UI form, so a draft the
//! form accepts is a payload the server accepts.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::models::{
    CreateTodoRequest, FieldValue, NewTodo, TodoChanges, TodoPriority, TodoStatus,
    UpdateTodoRequest,
};

pub const TITLE_MAX_CHARS: usize = 255;

/// Violations keyed by wire field name, each with one or more messages.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ValidationErrors(BTreeMap<String, Vec<String>>);

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.0.entry(field.to_string()).or_default().push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn contains(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    pub fn get(&self, field: &str) -> Option<&[String]> {
        self.0.get(field).map(Vec::as_slice)
    }

    pub fn remove(&mut self, field: &str) {
        self.0.remove(field);
    }

    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    fn into_result<T>(self, value: T) -> Result<T, ValidationErrors> {
        if self.is_empty() { Ok(value) } else { Err(self) }
    }
}

impl std::error::Error for ValidationErrors {}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (field, messages) in &self.0 {
            for message in messages {
                if !first {
                    f.write_str("; ")?;
                }
                write!(f, "{}: {}", field, message)?;
                first = false;
            }
        }
        Ok(())
    }
}

pub fn validate_create(req: CreateTodoRequest) -> Result<NewTodo, ValidationErrors> {
    let mut errors = ValidationErrors::new();

    let title = check_title(req.title, &mut errors);
    let status = check_status(req.status, &mut errors);
    let priority = check_priority(req.priority, &mut errors);
    let description = check_description(req.description, &mut errors);
    let due_date = check_due_date(req.due_date, &mut errors);

    match (title, status, priority) {
        (Some(title), Some(status), Some(priority)) => errors.into_result(NewTodo {
            title,
            description,
            status,
            priority,
            due_date,
        }),
        _ => Err(errors),
    }
}

pub fn validate_update(req: UpdateTodoRequest) -> Result<TodoChanges, ValidationErrors> {
    let mut errors = ValidationErrors::new();
    let mut changes = TodoChanges::default();

    if let Some(title) = req.title {
        changes.title = check_title(title, &mut errors);
    }
    if let Some(status) = req.status {
        changes.status = check_status(status, &mut errors);
    }
    if let Some(priority) = req.priority {
        changes.priority = check_priority(priority, &mut errors);
    }
    if let Some(description) = req.description {
        changes.description = Some(check_description(description, &mut errors));
    }
    if let Some(due_date) = req.due_date {
        changes.due_date = Some(check_due_date(due_date, &mut errors));
    }

    errors.into_result(changes)
}

fn check_title(raw: Option<FieldValue>, errors: &mut ValidationErrors) -> Option<String> {
    let title = match read_text(raw) {
        Input::Blank => {
            errors.add("title", "The title field is required.");
            return None;
        }
        Input::WrongType => {
            errors.add("title", "The title field must be a string.");
            return None;
        }
        Input::Text(title) => title,
    };
    if title.chars().count() > TITLE_MAX_CHARS {
        errors.add(
            "title",
            format!("The title field must not be greater than {} characters.", TITLE_MAX_CHARS),
        );
        return None;
    }
    Some(title)
}

fn check_description(raw: Option<FieldValue>, errors: &mut ValidationErrors) -> Option<String> {
    match read_text(raw) {
        Input::Blank => None,
        Input::WrongType => {
            errors.add("description", "The description field must be a string.");
            None
        }
        Input::Text(description) => Some(description),
    }
}

fn check_status(raw: Option<FieldValue>, errors: &mut ValidationErrors) -> Option<TodoStatus> {
    let status = match read_text(raw) {
        Input::Blank => {
            errors.add("status", "The status field is required.");
            return None;
        }
        Input::WrongType => None,
        Input::Text(raw) => TodoStatus::parse(&raw),
    };
    if status.is_none() {
        errors.add("status", "The selected status is invalid.");
    }
    status
}

fn check_priority(raw: Option<FieldValue>, errors: &mut ValidationErrors) -> Option<TodoPriority> {
    let priority = match read_text(raw) {
        Input::Blank => {
            errors.add("priority", "The priority field is required.");
            return None;
        }
        Input::WrongType => None,
        Input::Text(raw) => TodoPriority::parse(&raw),
    };
    if priority.is_none() {
        errors.add("priority", "The selected priority is invalid.");
    }
    priority
}

fn check_due_date(raw: Option<FieldValue>, errors: &mut ValidationErrors) -> Option<NaiveDate> {
    let date = match read_text(raw) {
        Input::Blank => return None,
        Input::WrongType => None,
        Input::Text(raw) => parse_date(&raw),
    };
    if date.is_none() {
        errors.add("dueDate", "The due date field must be a valid date.");
    }
    date
}

/// Accepts a plain `YYYY-MM-DD` date or an RFC 3339 timestamp (date part kept).
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .or_else(|| DateTime::parse_from_rfc3339(raw).ok().map(|dt| dt.date_naive()))
}

enum Input {
    Blank,
    WrongType,
    Text(String),
}

// Strings are trimmed and an empty string counts as null.
fn read_text(raw: Option<FieldValue>) -> Input {
    match raw {
        None => Input::Blank,
        Some(FieldValue::Other(_)) => Input::WrongType,
        Some(FieldValue::Text(text)) => {
            let text = text.trim();
            if text.is_empty() {
                Input::Blank
            } else {
                Input::Text(text.to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_create() -> CreateTodoRequest {
        CreateTodoRequest {
            title: Some("Buy milk".into()),
            description: None,
            status: Some("todo".into()),
            priority: Some("medium".into()),
            due_date: None,
        }
    }

    #[test]
    fn create_accepts_minimal_payload() {
        let todo = validate_create(valid_create()).unwrap();
        assert_eq!(todo.title, "Buy milk");
        assert_eq!(todo.status, TodoStatus::Todo);
        assert_eq!(todo.priority, TodoPriority::Medium);
        assert_eq!(todo.description, None);
        assert_eq!(todo.due_date, None);
    }

    #[test]
    fn create_reports_every_violation() {
        let errors = validate_create(CreateTodoRequest {
            title: Some("   ".into()),
            description: Some("anything".into()),
            status: None,
            priority: Some("urgent".into()),
            due_date: Some("31/12/2026".into()),
        })
        .unwrap_err();

        assert_eq!(errors.len(), 4);
        assert_eq!(errors.get("title").unwrap(), ["The title field is required."]);
        assert_eq!(errors.get("status").unwrap(), ["The status field is required."]);
        assert_eq!(errors.get("priority").unwrap(), ["The selected priority is invalid."]);
        assert_eq!(errors.get("dueDate").unwrap(), ["The due date field must be a valid date."]);
        assert!(!errors.contains("description"));
    }

    #[test]
    fn title_length_is_counted_in_characters() {
        let mut req = valid_create();
        req.title = Some("é".repeat(TITLE_MAX_CHARS).into());
        assert!(validate_create(req.clone()).is_ok());

        req.title = Some("é".repeat(TITLE_MAX_CHARS + 1).into());
        let errors = validate_create(req).unwrap_err();
        assert_eq!(
            errors.get("title").unwrap(),
            ["The title field must not be greater than 255 characters."]
        );
    }

    #[test]
    fn blank_optional_fields_become_null() {
        let mut req = valid_create();
        req.description = Some("".into());
        req.due_date = Some("".into());
        let todo = validate_create(req).unwrap();
        assert_eq!(todo.description, None);
        assert_eq!(todo.due_date, None);
    }

    #[test]
    fn due_date_accepts_date_and_timestamp() {
        let expected = NaiveDate::from_ymd_opt(2026, 12, 31);
        assert_eq!(parse_date("2026-12-31"), expected);
        assert_eq!(parse_date("2026-12-31T08:30:00Z"), expected);
        assert_eq!(parse_date("2026-02-30"), None);
        assert_eq!(parse_date("tomorrow"), None);
    }

    #[test]
    fn update_validates_only_supplied_fields() {
        let changes = validate_update(UpdateTodoRequest {
            status: Some(Some("done".into())),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(changes.status, Some(TodoStatus::Done));
        assert!(changes.title.is_none());
        assert!(changes.priority.is_none());
        assert!(changes.description.is_none());
        assert!(changes.due_date.is_none());
    }

    #[test]
    fn update_rejects_null_required_fields_and_clears_nullable_ones() {
        let errors = validate_update(UpdateTodoRequest {
            title: Some(None),
            priority: Some(Some("HIGH".into())),
            ..Default::default()
        })
        .unwrap_err();
        assert_eq!(errors.fields().collect::<Vec<_>>(), ["priority", "title"]);

        let changes = validate_update(UpdateTodoRequest {
            description: Some(None),
            due_date: Some(None),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(changes.description, Some(None));
        assert_eq!(changes.due_date, Some(None));
    }

    #[test]
    fn wrong_types_are_reported_per_field() {
        let errors = validate_create(CreateTodoRequest {
            title: Some(FieldValue::Other(serde_json::json!(123))),
            description: Some(FieldValue::Other(serde_json::json!(42))),
            status: Some("bogus".into()),
            priority: Some(FieldValue::Other(serde_json::json!(true))),
            due_date: Some(FieldValue::Other(serde_json::json!(20261231))),
        })
        .unwrap_err();

        assert_eq!(errors.get("title").unwrap(), ["The title field must be a string."]);
        assert_eq!(
            errors.get("description").unwrap(),
            ["The description field must be a string."]
        );
        assert_eq!(errors.get("status").unwrap(), ["The selected status is invalid."]);
        assert_eq!(errors.get("priority").unwrap(), ["The selected priority is invalid."]);
        assert_eq!(errors.get("dueDate").unwrap(), ["The due date field must be a valid date."]);

        let errors = validate_update(UpdateTodoRequest {
            title: Some(Some(FieldValue::Other(serde_json::json!({"text": "x"})))),
            ..Default::default()
        })
        .unwrap_err();
        assert_eq!(errors.fields().collect::<Vec<_>>(), ["title"]);
    }

    #[test]
    fn empty_update_is_valid_and_empty() {
        let changes = validate_update(UpdateTodoRequest::default()).unwrap();
        assert!(changes.is_empty());
    }
}
