use taskflow_shared::{
  Task,
  TaskCreate,
  TaskPatch,
  TaskPriority,
  TaskStatus
};
use tracing::{
  debug,
  info
};

use crate::datetime::{
  format_form_date,
  parse_form_date
};
use crate::error::EditorError;
use crate::service::Backend;
use crate::view::{
  Notice,
  ViewState
};

/// Raw form fields, exactly as typed.
#[derive(
  Debug, Clone, PartialEq, Eq,
)]
pub struct TaskForm {
  pub title:       String,
  pub description: String,
  pub priority:    String,
  pub due_date:    String,
  pub category_id: String,
  pub tags:        String
}

impl Default for TaskForm {
  fn default() -> Self {
    Self {
      title:       String::new(),
      description: String::new(),
      priority:    TaskPriority::Medium
        .as_str()
        .to_string(),
      due_date:    String::new(),
      category_id: String::new(),
      tags:        String::new()
    }
  }
}

impl TaskForm {
  #[must_use]
  pub fn from_task(task: &Task) -> Self {
    Self {
      title:       task.title.clone(),
      description: task
        .description
        .clone()
        .unwrap_or_default(),
      priority:    task
        .priority
        .unwrap_or_default()
        .as_str()
        .to_string(),
      due_date:    task
        .due_date
        .map(format_form_date)
        .unwrap_or_default(),
      category_id: task
        .category_id
        .clone()
        .unwrap_or_default(),
      tags:        task.tags.join(", ")
    }
  }
}

#[derive(
  Debug, Clone, PartialEq, Default,
)]
pub enum EditorMode {
  #[default]
  Closed,
  Create,
  Edit(Task)
}

/// Every field the form submits, already
/// normalised.
#[derive(
  Debug, Clone, PartialEq,
)]
struct FormPayload {
  title:       String,
  description: Option<String>,
  priority:    TaskPriority,
  due_date:    Option<chrono::NaiveDate>,
  category_id: Option<String>,
  tags:        Vec<String>
}

/// Splits the free-text tag field on
/// commas and trims each piece. An empty
/// field yields no tags.
#[must_use]
pub fn parse_tags(
  raw: &str
) -> Vec<String> {
  if raw.is_empty() {
    return vec![];
  }
  raw
    .split(',')
    .map(|tag| tag.trim().to_string())
    .collect()
}

fn non_empty(raw: &str) -> Option<String> {
  let trimmed = raw.trim();
  (!trimmed.is_empty())
    .then(|| trimmed.to_string())
}

/// Create/edit form state for a single
/// task.
#[derive(
  Debug, Clone, PartialEq, Default,
)]
pub struct TaskEditor {
  mode: EditorMode,
  form: TaskForm
}

impl TaskEditor {
  #[must_use]
  pub fn mode(&self) -> &EditorMode {
    &self.mode
  }

  #[must_use]
  pub fn is_open(&self) -> bool {
    self.mode != EditorMode::Closed
  }

  #[must_use]
  pub fn form(&self) -> &TaskForm {
    &self.form
  }

  pub fn form_mut(
    &mut self
  ) -> &mut TaskForm {
    &mut self.form
  }

  #[must_use]
  pub fn heading(&self) -> &'static str {
    match self.mode {
      | EditorMode::Edit(_) => "Edit Task",
      | _ => "Create New Task"
    }
  }

  #[must_use]
  pub fn submit_label(
    &self
  ) -> &'static str {
    match self.mode {
      | EditorMode::Edit(_) => {
        "Update Task"
      }
      | _ => "Create Task"
    }
  }

  pub fn open_create(&mut self) {
    self.mode = EditorMode::Create;
    self.form = TaskForm::default();
  }

  pub fn open_edit(
    &mut self,
    task: &Task
  ) {
    debug!(id = %task.id, "editing task");
    self.form = TaskForm::from_task(task);
    self.mode =
      EditorMode::Edit(task.clone());
  }

  pub fn reset(&mut self) {
    *self = Self::default();
  }

  fn payload(
    &self
  ) -> Result<FormPayload, EditorError> {
    let title = self.form.title.trim();
    if title.is_empty() {
      return Err(
        EditorError::TitleRequired
      );
    }

    let due_date = parse_form_date(
      &self.form.due_date
    )
    .map_err(EditorError::InvalidDueDate)?;

    Ok(FormPayload {
      title: self.form.title.clone(),
      description: non_empty(
        &self.form.description
      ),
      priority: TaskPriority::parse(
        &self.form.priority
      )
      .unwrap_or_default(),
      due_date,
      category_id: non_empty(
        &self.form.category_id
      ),
      tags: parse_tags(&self.form.tags)
    })
  }

  /// Validates the form, then creates or
  /// updates through the controller, which
  /// reloads its snapshot. On success the
  /// form is reset. Validation failures
  /// never reach the backend.
  #[tracing::instrument(skip(self, view))]
  pub async fn submit<B: Backend>(
    &mut self,
    view: &mut ViewState<B>
  ) -> Result<Task, EditorError> {
    if self.mode == EditorMode::Closed {
      debug!("submit on closed editor ignored");
      return Err(EditorError::Closed);
    }

    let payload = match self.payload() {
      | Ok(payload) => payload,
      | Err(err) => {
        view.push_notice(Notice::error(
          err.to_string()
        ));
        return Err(err);
      }
    };

    let saved = match &self.mode {
      | EditorMode::Edit(existing) => {
        let patch = TaskPatch {
          title:       Some(payload.title),
          description: Some(
            payload.description
          ),
          priority:    Some(
            payload.priority
          ),
          status:      Some(
            existing.status
          ),
          due_date:    Some(
            payload.due_date
          ),
          category_id: Some(
            payload.category_id
          ),
          tags:        Some(payload.tags)
        };
        let id = existing.id.clone();
        view.update_task(&id, patch).await?
      }
      | EditorMode::Closed => {
        return Err(EditorError::Closed);
      }
      | EditorMode::Create => {
        let data = TaskCreate {
          title:       payload.title,
          description: payload.description,
          priority:    Some(
            payload.priority
          ),
          status:      Some(
            TaskStatus::Pending
          ),
          due_date:    payload.due_date,
          category_id: payload.category_id,
          tags:        Some(payload.tags)
        };
        view.create_task(data).await?
      }
    };

    info!(id = %saved.id, "task saved from editor");
    self.reset();
    Ok(saved)
  }
}
