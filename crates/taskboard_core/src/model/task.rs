//! Task domain model.
//!
//! # Responsibility
//! - Define the canonical task record persisted under the board key.
//! - Validate form drafts and patches before they reach the collection.
//!
//! # Invariants
//! - `id` is stable and never reused for another task.
//! - `created_at` is stamped once and never changed by a patch.
//! - A stored task never carries an empty (or whitespace-only) title.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

const TASK_ID_PREFIX: &str = "task-";

/// Default cap for `Task::title`, in characters.
pub const DEFAULT_TITLE_MAX_CHARS: usize = 100;
/// Default cap for `Task::description`, in characters.
pub const DEFAULT_DESCRIPTION_MAX_CHARS: usize = 500;
/// Default cap for `Task::assignee`, in characters.
pub const DEFAULT_ASSIGNEE_MAX_CHARS: usize = 50;

/// Stable task identifier.
///
/// Stored as a plain JSON string so records written by other board clients
/// (which use their own id scheme) stay readable.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(String);

impl TaskId {
    /// Generates a fresh id of the form `task-<uuid>`.
    pub fn generate() -> Self {
        Self(format!("{TASK_ID_PREFIX}{}", Uuid::new_v4().simple()))
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl Display for TaskId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TaskId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for TaskId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// One of the three fixed board columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Column {
    /// Created but not started.
    Todo,
    /// Work is in progress.
    InProgress,
    /// Completed.
    Done,
}

impl Column {
    /// Columns in board (left to right) order.
    pub const ALL: [Column; 3] = [Column::Todo, Column::InProgress, Column::Done];

    /// Stable storage/wire id.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Todo => "todo",
            Self::InProgress => "in-progress",
            Self::Done => "done",
        }
    }

    /// Column header shown by the presentation layer.
    pub fn title(self) -> &'static str {
        match self {
            Self::Todo => "Todo",
            Self::InProgress => "In Progress",
            Self::Done => "Done",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "todo" => Some(Self::Todo),
            "in-progress" => Some(Self::InProgress),
            "done" => Some(Self::Done),
            _ => None,
        }
    }
}

impl Display for Column {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Task priority. New tasks default to `Medium`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
}

impl Priority {
    pub const ALL: [Priority; 3] = [Priority::Low, Priority::Medium, Priority::High];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }

    /// Human-readable label for badges and select options.
    pub fn label(self) -> &'static str {
        match self {
            Self::Low => "Low",
            Self::Medium => "Medium",
            Self::High => "High",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "low" => Some(Self::Low),
            "medium" => Some(Self::Medium),
            "high" => Some(Self::High),
            _ => None,
        }
    }
}

impl Display for Priority {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Field length caps applied on create and update.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TaskLimits {
    pub title_max_chars: usize,
    pub description_max_chars: usize,
    pub assignee_max_chars: usize,
}

impl Default for TaskLimits {
    fn default() -> Self {
        Self {
            title_max_chars: DEFAULT_TITLE_MAX_CHARS,
            description_max_chars: DEFAULT_DESCRIPTION_MAX_CHARS,
            assignee_max_chars: DEFAULT_ASSIGNEE_MAX_CHARS,
        }
    }
}

/// User-editable task fields, used to attach validation messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskField {
    Title,
    Description,
    Assignee,
}

impl TaskField {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Title => "title",
            Self::Description => "description",
            Self::Assignee => "assignee",
        }
    }
}

/// Field-level validation failure surfaced to the form layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskValidationError {
    /// Title is empty after trimming.
    EmptyTitle,
    /// A field exceeds its configured character cap.
    TooLong {
        field: TaskField,
        max_chars: usize,
        actual_chars: usize,
    },
}

impl TaskValidationError {
    /// The form field this error belongs to.
    pub fn field(&self) -> TaskField {
        match self {
            Self::EmptyTitle => TaskField::Title,
            Self::TooLong { field, .. } => *field,
        }
    }
}

impl Display for TaskValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyTitle => write!(f, "Title required"),
            Self::TooLong {
                field, max_chars, ..
            } => write!(
                f,
                "{} must be at most {max_chars} characters",
                field.as_str()
            ),
        }
    }
}

impl Error for TaskValidationError {}

/// Canonical task record.
///
/// Serialized with camelCase keys (`createdAt`) to match the stored board
/// JSON shape. `description` and `assignee` are empty strings when unset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: TaskId,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default)]
    pub assignee: String,
    pub column: Column,
    #[serde(with = "iso_millis")]
    pub created_at: DateTime<Utc>,
}

/// `createdAt` wire format: UTC, millisecond precision, `Z` suffix
/// (`2024-05-01T10:00:00.000Z`). Any RFC 3339 offset is accepted on read.
mod iso_millis {
    use chrono::{DateTime, SecondsFormat, Utc};
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(value: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&value.to_rfc3339_opts(SecondsFormat::Millis, true))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        DateTime::parse_from_rfc3339(&raw)
            .map(|value| value.with_timezone(&Utc))
            .map_err(de::Error::custom)
    }
}

impl Task {
    /// Builds a new `todo` task from a draft.
    ///
    /// # Invariants
    /// - `column` is always `Column::Todo`, regardless of input.
    /// - The draft is not validated here; callers run `validate()`.
    pub fn from_draft(id: TaskId, draft: TaskDraft, created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            title: draft.title.trim().to_string(),
            description: draft.description,
            priority: draft.priority,
            assignee: draft.assignee.trim().to_string(),
            column: Column::Todo,
            created_at,
        }
    }

    /// Checks the user-editable fields against `limits`.
    ///
    /// # Errors
    /// - `EmptyTitle` when the title is empty or whitespace only.
    /// - `TooLong` for the first field over its cap (title, description, assignee).
    pub fn validate(&self, limits: &TaskLimits) -> Result<(), TaskValidationError> {
        if self.title.trim().is_empty() {
            return Err(TaskValidationError::EmptyTitle);
        }
        check_length(TaskField::Title, &self.title, limits.title_max_chars)?;
        check_length(
            TaskField::Description,
            &self.description,
            limits.description_max_chars,
        )?;
        check_length(TaskField::Assignee, &self.assignee, limits.assignee_max_chars)?;
        Ok(())
    }

    /// Up to two uppercase initials of the assignee, or `?` when unassigned.
    pub fn assignee_initials(&self) -> String {
        initials(&self.assignee)
    }
}

fn check_length(field: TaskField, value: &str, max_chars: usize) -> Result<(), TaskValidationError> {
    let actual_chars = value.chars().count();
    if actual_chars > max_chars {
        return Err(TaskValidationError::TooLong {
            field,
            max_chars,
            actual_chars,
        });
    }
    Ok(())
}

/// Form input for creating a task.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TaskDraft {
    pub title: String,
    pub description: String,
    pub priority: Priority,
    pub assignee: String,
}

impl TaskDraft {
    /// Draft with only a title; other fields take their defaults.
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_assignee(mut self, assignee: impl Into<String>) -> Self {
        self.assignee = assignee.into();
        self
    }
}

/// Partial update merged over an existing task.
///
/// There is intentionally no `id` or `created_at` field: unknown keys in a
/// JSON patch (including `id` and `createdAt`) are dropped on decode.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TaskPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub priority: Option<Priority>,
    pub assignee: Option<String>,
    pub column: Option<Column>,
}

impl TaskPatch {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.priority.is_none()
            && self.assignee.is_none()
            && self.column.is_none()
    }

    /// Shallow-merges the present fields over `task`.
    pub fn apply_to(&self, task: &mut Task) {
        if let Some(title) = &self.title {
            task.title = title.trim().to_string();
        }
        if let Some(description) = &self.description {
            task.description = description.clone();
        }
        if let Some(priority) = self.priority {
            task.priority = priority;
        }
        if let Some(assignee) = &self.assignee {
            task.assignee = assignee.trim().to_string();
        }
        if let Some(column) = self.column {
            task.column = column;
        }
    }
}

/// Initials for an avatar badge.
///
/// Takes the first character of each whitespace-separated word, uppercases
/// it and keeps at most two characters. Returns `?` for a blank name.
pub fn initials(name: &str) -> String {
    let result: String = name
        .split_whitespace()
        .filter_map(|word| word.chars().next())
        .flat_map(char::to_uppercase)
        .take(2)
        .collect();
    if result.is_empty() {
        "?".to_string()
    } else {
        result
    }
}

#[cfg(test)]
mod tests {
    use super::{
        initials, Column, Priority, Task, TaskDraft, TaskField, TaskId, TaskLimits, TaskPatch,
        TaskValidationError,
    };
    use chrono::Utc;

    fn sample_task() -> Task {
        Task::from_draft(
            TaskId::from("task-1"),
            TaskDraft::new("  Deploy API  ").with_assignee(" Ada Lovelace "),
            Utc::now(),
        )
    }

    #[test]
    fn from_draft_forces_todo_and_trims_title() {
        let task = sample_task();
        assert_eq!(task.column, Column::Todo);
        assert_eq!(task.title, "Deploy API");
        assert_eq!(task.assignee, "Ada Lovelace");
        assert_eq!(task.priority, Priority::Medium);
    }

    #[test]
    fn validate_rejects_blank_title() {
        let mut task = sample_task();
        task.title = "   ".to_string();
        let err = task.validate(&TaskLimits::default()).unwrap_err();
        assert_eq!(err, TaskValidationError::EmptyTitle);
        assert_eq!(err.field(), TaskField::Title);
    }

    #[test]
    fn validate_counts_characters_not_bytes() {
        let mut task = sample_task();
        task.title = "é".repeat(100);
        assert!(task.validate(&TaskLimits::default()).is_ok());

        task.title.push('é');
        let err = task.validate(&TaskLimits::default()).unwrap_err();
        assert_eq!(
            err,
            TaskValidationError::TooLong {
                field: TaskField::Title,
                max_chars: 100,
                actual_chars: 101,
            }
        );
    }

    #[test]
    fn validate_reports_description_and_assignee_caps() {
        let mut task = sample_task();
        task.description = "x".repeat(501);
        assert_eq!(
            task.validate(&TaskLimits::default()).unwrap_err().field(),
            TaskField::Description
        );

        task.description.clear();
        task.assignee = "y".repeat(51);
        assert_eq!(
            task.validate(&TaskLimits::default()).unwrap_err().field(),
            TaskField::Assignee
        );
    }

    #[test]
    fn task_json_uses_board_wire_shape() {
        let task = sample_task();
        let value = serde_json::to_value(&task).unwrap();
        assert_eq!(value["id"], "task-1");
        assert_eq!(value["column"], "todo");
        assert_eq!(value["priority"], "medium");
        assert!(value["createdAt"].is_string());
        assert!(value.get("created_at").is_none());
    }

    #[test]
    fn task_json_accepts_records_without_optional_fields() {
        let task: Task = serde_json::from_str(
            r#"{"id":"task-1700000000000-abc123def","title":"Imported","column":"in-progress","createdAt":"2024-05-01T10:00:00.000Z"}"#,
        )
        .unwrap();
        assert_eq!(task.column, Column::InProgress);
        assert_eq!(task.priority, Priority::Medium);
        assert!(task.description.is_empty());
        assert!(task.assignee.is_empty());
    }

    #[test]
    fn patch_decode_drops_identity_fields() {
        let patch: TaskPatch =
            serde_json::from_str(r#"{"id":"x","createdAt":"y","priority":"high"}"#).unwrap();
        assert_eq!(patch.priority, Some(Priority::High));
        assert!(patch.title.is_none());
        assert!(!patch.is_empty());
    }

    #[test]
    fn initials_takes_two_uppercase_letters() {
        assert_eq!(initials("ada lovelace byron"), "AL");
        assert_eq!(initials("grace"), "G");
        assert_eq!(initials("   "), "?");
        assert_eq!(initials(""), "?");
    }

    #[test]
    fn column_and_priority_parse_their_wire_ids() {
        for column in Column::ALL {
            assert_eq!(Column::parse(column.as_str()), Some(column));
        }
        for priority in Priority::ALL {
            assert_eq!(Priority::parse(priority.as_str()), Some(priority));
        }
        assert_eq!(Column::parse("backlog"), None);
        assert_eq!(Priority::parse("urgent"), None);
    }

    #[test]
    fn priority_labels_are_capitalized() {
        let labels: Vec<&str> = Priority::ALL.iter().map(|priority| priority.label()).collect();
        assert_eq!(labels, ["Low", "Medium", "High"]);
    }

    #[test]
    fn assignee_initials_use_trimmed_assignee() {
        let task = sample_task();
        assert_eq!(task.assignee_initials(), "AL");

        let unassigned =
            Task::from_draft(TaskId::from("task-2"), TaskDraft::new("solo"), Utc::now());
        assert_eq!(unassigned.assignee_initials(), "?");
    }

    #[test]
    fn created_at_keeps_millisecond_text_on_round_trip() {
        let raw = r#"{"id":"t","title":"Imported","column":"done","createdAt":"2024-05-01T10:00:00.000Z"}"#;
        let task: Task = serde_json::from_str(raw).unwrap();
        let value = serde_json::to_value(&task).unwrap();
        assert_eq!(value["createdAt"], "2024-05-01T10:00:00.000Z");

        let shifted: Task = serde_json::from_str(
            r#"{"id":"t","title":"x","column":"todo","createdAt":"2024-05-01T12:00:00.250+02:00"}"#,
        )
        .unwrap();
        assert_eq!(
            serde_json::to_value(&shifted).unwrap()["createdAt"],
            "2024-05-01T10:00:00.250Z"
        );
    }

    #[test]
    fn created_at_rejects_non_timestamp_text() {
        let result = serde_json::from_str::<Task>(
            r#"{"id":"t","title":"x","column":"todo","createdAt":"yesterday"}"#,
        );
        assert!(result.is_err());
    }
}
