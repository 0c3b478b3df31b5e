//! Records and payloads exchanged between the
//! entity services and the view layer.
//!
//! Field names serialise in camelCase, which
//! is the shape of the JSON seed files.

use chrono::{
  DateTime,
  NaiveDate,
  Utc
};
use serde::{
  Deserialize,
  Deserializer,
  Serialize
};

#[derive(
  Debug,
  Clone,
  Copy,
  Serialize,
  Deserialize,
  PartialEq,
  Eq,
  Hash,
  Default,
)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
  #[default]
  Pending,
  InProgress,
  Completed
}

impl TaskStatus {
  #[must_use]
  pub fn as_str(self) -> &'static str {
    match self {
      | Self::Pending => "pending",
      | Self::InProgress => {
        "in_progress"
      }
      | Self::Completed => "completed"
    }
  }

  #[must_use]
  pub fn parse(
    raw: &str
  ) -> Option<Self> {
    match raw.trim() {
      | "pending" => Some(Self::Pending),
      | "in_progress" => {
        Some(Self::InProgress)
      }
      | "completed" => {
        Some(Self::Completed)
      }
      | _ => None
    }
  }
}

#[derive(
  Debug,
  Clone,
  Copy,
  Serialize,
  Deserialize,
  PartialEq,
  Eq,
  Hash,
  Default,
)]
#[serde(rename_all = "lowercase")]
pub enum TaskPriority {
  Low,
  #[default]
  Medium,
  High,
  Urgent
}

impl TaskPriority {
  #[must_use]
  pub fn as_str(self) -> &'static str {
    match self {
      | Self::Low => "low",
      | Self::Medium => "medium",
      | Self::High => "high",
      | Self::Urgent => "urgent"
    }
  }

  #[must_use]
  pub fn parse(
    raw: &str
  ) -> Option<Self> {
    match raw
      .trim()
      .to_ascii_lowercase()
      .as_str()
    {
      | "low" => Some(Self::Low),
      | "medium" => Some(Self::Medium),
      | "high" => Some(Self::High),
      | "urgent" => Some(Self::Urgent),
      | _ => None
    }
  }
}

#[derive(
  Debug,
  Clone,
  Serialize,
  Deserialize,
  PartialEq,
  Eq,
)]
pub struct Subtask {
  pub id:        String,
  #[serde(default)]
  pub title:     String,
  #[serde(default)]
  pub completed: bool
}

#[derive(
  Debug,
  Clone,
  Serialize,
  Deserialize,
  PartialEq,
)]
#[serde(rename_all = "camelCase")]
pub struct Task {
  pub id:          String,
  #[serde(default)]
  pub title:       String,
  #[serde(default)]
  pub description: Option<String>,
  #[serde(
    default,
    deserialize_with = "lenient_priority"
  )]
  pub priority:    Option<TaskPriority>,
  #[serde(default)]
  pub status:      TaskStatus,
  #[serde(
    default,
    with = "due_date_serde"
  )]
  pub due_date:    Option<NaiveDate>,
  #[serde(default)]
  pub category_id: Option<String>,
  #[serde(default)]
  pub tags:        Vec<String>,
  #[serde(default)]
  pub created_at:  Option<DateTime<Utc>>,
  #[serde(default)]
  pub updated_at:  Option<DateTime<Utc>>,
  #[serde(default)]
  pub subtasks:    Vec<Subtask>
}

#[derive(
  Debug,
  Clone,
  Serialize,
  Deserialize,
  PartialEq,
  Default,
)]
#[serde(rename_all = "camelCase")]
pub struct TaskCreate {
  pub title:       String,
  pub description: Option<String>,
  pub priority:    Option<TaskPriority>,
  pub status:      Option<TaskStatus>,
  #[serde(
    default,
    with = "due_date_serde"
  )]
  pub due_date:    Option<NaiveDate>,
  pub category_id: Option<String>,
  pub tags:        Option<Vec<String>>
}

/// Partial task update. `None` leaves a field
/// untouched; `Some(None)` clears a nullable
/// field. On the wire an absent key is
/// `None` and an explicit `null` is
/// `Some(None)`.
#[derive(
  Debug,
  Clone,
  Serialize,
  Deserialize,
  PartialEq,
  Default,
)]
#[serde(rename_all = "camelCase")]
pub struct TaskPatch {
  #[serde(
    default,
    skip_serializing_if = "Option::is_none"
  )]
  pub title:       Option<String>,
  #[serde(
    default,
    deserialize_with = "nullable",
    skip_serializing_if = "Option::is_none"
  )]
  pub description: Option<Option<String>>,
  #[serde(
    default,
    skip_serializing_if = "Option::is_none"
  )]
  pub priority:    Option<TaskPriority>,
  #[serde(
    default,
    skip_serializing_if = "Option::is_none"
  )]
  pub status:      Option<TaskStatus>,
  #[serde(
    default,
    deserialize_with = "nullable_due_date",
    skip_serializing_if = "Option::is_none"
  )]
  pub due_date:    Option<Option<NaiveDate>>,
  #[serde(
    default,
    deserialize_with = "nullable",
    skip_serializing_if = "Option::is_none"
  )]
  pub category_id: Option<Option<String>>,
  #[serde(
    default,
    skip_serializing_if = "Option::is_none"
  )]
  pub tags:        Option<Vec<String>>
}

#[derive(
  Debug,
  Clone,
  Serialize,
  Deserialize,
  PartialEq,
  Eq,
)]
#[serde(rename_all = "camelCase")]
pub struct Category {
  pub id:         String,
  #[serde(default)]
  pub name:       String,
  #[serde(default)]
  pub created_at: Option<DateTime<Utc>>
}

#[derive(
  Debug,
  Clone,
  Serialize,
  Deserialize,
  PartialEq,
  Eq,
  Default,
)]
pub struct CategoryCreate {
  pub name: String
}

#[derive(
  Debug,
  Clone,
  Serialize,
  Deserialize,
  PartialEq,
  Eq,
  Default,
)]
pub struct CategoryPatch {
  pub name: Option<String>
}

#[derive(
  Debug,
  Clone,
  Copy,
  Serialize,
  Deserialize,
  PartialEq,
  Eq,
  Default,
)]
#[serde(rename_all = "lowercase")]
pub enum ThemePreference {
  #[default]
  Light,
  Dark
}

#[derive(
  Debug,
  Clone,
  Serialize,
  Deserialize,
  PartialEq,
  Eq,
)]
#[serde(rename_all = "camelCase")]
pub struct UserPreferences {
  #[serde(default)]
  pub theme:         ThemePreference,
  #[serde(default = "default_true")]
  pub notifications: bool,
  #[serde(
    default = "default_view_name"
  )]
  pub default_view:  String
}

impl Default for UserPreferences {
  fn default() -> Self {
    Self {
      theme:         ThemePreference::Light,
      notifications: true,
      default_view:  default_view_name()
    }
  }
}

#[derive(
  Debug,
  Clone,
  Serialize,
  Deserialize,
  PartialEq,
  Eq,
)]
#[serde(rename_all = "camelCase")]
pub struct User {
  pub id:          String,
  #[serde(default)]
  pub name:        String,
  #[serde(default)]
  pub email:       Option<String>,
  #[serde(default)]
  pub preferences: UserPreferences,
  #[serde(default)]
  pub created_at:  Option<DateTime<Utc>>
}

#[derive(
  Debug,
  Clone,
  Serialize,
  Deserialize,
  PartialEq,
  Eq,
  Default,
)]
pub struct UserCreate {
  pub name:        String,
  pub email:       Option<String>,
  pub preferences:
    Option<UserPreferences>
}

#[derive(
  Debug,
  Clone,
  Serialize,
  Deserialize,
  PartialEq,
  Eq,
  Default,
)]
pub struct UserPatch {
  pub name:        Option<String>,
  pub email: Option<Option<String>>,
  pub preferences:
    Option<UserPreferences>
}

fn default_true() -> bool {
  true
}

fn default_view_name() -> String {
  "list".to_string()
}

/// Only called when the key is present, so
/// `null` lands as `Some(None)`.
fn nullable<'de, D, T>(
  deserializer: D
) -> Result<Option<Option<T>>, D::Error>
where
  D: Deserializer<'de>,
  T: Deserialize<'de>
{
  Option::<T>::deserialize(deserializer)
    .map(Some)
}

fn nullable_due_date<'de, D>(
  deserializer: D
) -> Result<Option<Option<NaiveDate>>, D::Error>
where
  D: Deserializer<'de>
{
  due_date_serde::deserialize(deserializer)
    .map(Some)
}

fn lenient_priority<'de, D>(
  deserializer: D
) -> Result<Option<TaskPriority>, D::Error>
where
  D: Deserializer<'de>
{
  let raw = Option::<String>::deserialize(
    deserializer
  )?;
  Ok(
    raw
      .as_deref()
      .and_then(TaskPriority::parse)
  )
}

/// Due dates travel as `YYYY-MM-DD`; seed
/// files may also carry a full RFC 3339
/// timestamp, of which only the date part is
/// kept.
pub mod due_date_serde {
  use chrono::{
    DateTime,
    NaiveDate
  };
  use serde::{
    Deserialize,
    Deserializer,
    Serializer
  };

  const FORMAT: &str = "%Y-%m-%d";

  pub fn serialize<S>(
    value: &Option<NaiveDate>,
    serializer: S
  ) -> Result<S::Ok, S::Error>
  where
    S: Serializer
  {
    match value {
      | Some(date) => {
        serializer.serialize_str(
          &date
            .format(FORMAT)
            .to_string()
        )
      }
      | None => serializer.serialize_none()
    }
  }

  pub fn deserialize<'de, D>(
    deserializer: D
  ) -> Result<Option<NaiveDate>, D::Error>
  where
    D: Deserializer<'de>
  {
    let raw = Option::<String>::deserialize(
      deserializer
    )?;
    let Some(raw) = raw else {
      return Ok(None);
    };
    let trimmed = raw.trim();
    if trimmed.is_empty() {
      return Ok(None);
    }
    parse(trimmed)
      .map(Some)
      .ok_or_else(|| {
        serde::de::Error::custom(
          format!(
            "invalid due date: {trimmed}"
          )
        )
      })
  }

  #[must_use]
  pub fn parse(
    raw: &str
  ) -> Option<NaiveDate> {
    if let Ok(date) =
      NaiveDate::parse_from_str(
        raw, FORMAT
      )
    {
      return Some(date);
    }
    DateTime::parse_from_rfc3339(raw)
      .ok()
      .map(|dt| dt.date_naive())
  }
}

#[cfg(test)]
mod tests {
  use chrono::NaiveDate;

  use super::{
    Task,
    TaskPatch,
    TaskPriority,
    TaskStatus,
    ThemePreference,
    User
  };

  #[test]
  fn task_seed_shape_deserializes() {
    let raw = r#"{
      "id": "1",
      "title": "Review pull requests",
      "description": "Go through the open queue",
      "priority": "urgent",
      "status": "in_progress",
      "dueDate": "2024-01-20T17:00:00.000Z",
      "categoryId": "2",
      "tags": ["review", "code"],
      "createdAt": "2024-01-15T09:00:00.000Z",
      "updatedAt": "2024-01-15T09:00:00.000Z",
      "subtasks": []
    }"#;

    let task: Task =
      serde_json::from_str(raw)
        .expect("parse task");
    assert_eq!(
      task.priority,
      Some(TaskPriority::Urgent)
    );
    assert_eq!(
      task.status,
      TaskStatus::InProgress
    );
    assert_eq!(
      task.due_date,
      NaiveDate::from_ymd_opt(
        2024, 1, 20
      )
    );
    assert_eq!(
      task.category_id.as_deref(),
      Some("2")
    );
  }

  #[test]
  fn unknown_priority_becomes_none() {
    let raw = r#"{"id":"9","title":"x","priority":"someday","status":"pending"}"#;
    let task: Task =
      serde_json::from_str(raw)
        .expect("parse task");
    assert_eq!(task.priority, None);
    assert!(task.tags.is_empty());
    assert!(task.created_at.is_none());
  }

  #[test]
  fn due_date_serializes_as_plain_date()
  {
    let raw = r#"{"id":"3","title":"x","dueDate":"2024-02-01"}"#;
    let task: Task =
      serde_json::from_str(raw)
        .expect("parse task");
    let json = serde_json::to_value(&task)
      .expect("serialize task");
    assert_eq!(
      json["dueDate"],
      "2024-02-01"
    );
    assert_eq!(
      json["status"],
      "pending"
    );
  }

  #[test]
  fn patch_null_clears_and_absent_keeps() {
    let raw = r#"{"description":null,"dueDate":"2024-03-01","categoryId":null}"#;
    let patch: TaskPatch =
      serde_json::from_str(raw)
        .expect("parse patch");
    assert_eq!(patch.title, None);
    assert_eq!(
      patch.description,
      Some(None)
    );
    assert_eq!(
      patch.due_date,
      Some(NaiveDate::from_ymd_opt(
        2024, 3, 1
      ))
    );
    assert_eq!(
      patch.category_id,
      Some(None)
    );

    let empty: TaskPatch =
      serde_json::from_str("{}")
        .expect("parse empty patch");
    assert_eq!(empty, TaskPatch::default());

    let json = serde_json::to_value(&patch)
      .expect("serialize patch");
    assert!(json["description"].is_null());
    assert!(json.get("title").is_none());
  }

  #[test]
  fn user_without_preferences_gets_defaults()
   {
    let raw = r#"{"id":"1","name":"Ada"}"#;
    let user: User =
      serde_json::from_str(raw)
        .expect("parse user");
    assert_eq!(
      user.preferences.theme,
      ThemePreference::Light
    );
    assert!(
      user.preferences.notifications
    );
    assert_eq!(
      user.preferences.default_view,
      "list"
    );
  }
}
