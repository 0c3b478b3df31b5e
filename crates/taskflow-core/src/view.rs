use taskflow_shared::{
  Category,
  Task,
  TaskCreate,
  TaskPatch,
  TaskStatus
};
use tracing::{
  debug,
  error,
  info,
  warn
};

use crate::error::{
  LoadError,
  ServiceError
};
use crate::filters::{
  TaskFilter,
  TaskStats
};
use crate::preferences::{
  DARK_MODE_KEY,
  Preferences,
  RootClasses,
  ThemeMode
};
use crate::service::Backend;

#[derive(
  Debug, Clone, Copy, PartialEq, Eq,
)]
pub enum NoticeLevel {
  Success,
  Error
}

/// Transient, user-visible notification
/// text. Presentation is up to the caller.
#[derive(
  Debug, Clone, PartialEq, Eq,
)]
pub struct Notice {
  pub level:   NoticeLevel,
  pub message: String
}

impl Notice {
  pub fn success(
    message: impl Into<String>
  ) -> Self {
    Self {
      level:   NoticeLevel::Success,
      message: message.into()
    }
  }

  pub fn error(
    message: impl Into<String>
  ) -> Self {
    Self {
      level:   NoticeLevel::Error,
      message: message.into()
    }
  }
}

/// Page-level controller. Holds the last
/// loaded snapshot of tasks and categories
/// and never edits it locally: every
/// mutation goes through the backend and is
/// followed by a full reload.
#[derive(Debug)]
pub struct ViewState<B> {
  backend:       B,
  preferences:   Preferences,
  root:          RootClasses,
  tasks:         Vec<Task>,
  categories:    Vec<Category>,
  error:         Option<String>,
  theme:         ThemeMode,
  active_filter: TaskFilter,
  notices:       Vec<Notice>
}

impl<B: Backend> ViewState<B> {
  /// Reads the dark-mode preference once
  /// and applies it to the root classes.
  pub fn new(
    backend: B,
    preferences: Preferences
  ) -> Self {
    let theme = ThemeMode::from_dark(
      preferences.get_bool(DARK_MODE_KEY)
    );
    let mut root = RootClasses::default();
    root.apply_theme(theme);
    debug!(dark = theme.is_dark(), "restored theme preference");

    Self {
      backend,
      preferences,
      root,
      tasks: vec![],
      categories: vec![],
      error: None,
      theme,
      active_filter: TaskFilter::All,
      notices: vec![]
    }
  }

  pub fn backend(&self) -> &B {
    &self.backend
  }

  pub fn tasks(&self) -> &[Task] {
    &self.tasks
  }

  pub fn categories(&self) -> &[Category] {
    &self.categories
  }

  pub fn error(&self) -> Option<&str> {
    self.error.as_deref()
  }

  pub fn is_dark_mode(&self) -> bool {
    self.theme.is_dark()
  }

  pub fn root_classes(
    &self
  ) -> &RootClasses {
    &self.root
  }

  pub fn preferences(
    &self
  ) -> &Preferences {
    &self.preferences
  }

  pub fn active_filter(
    &self
  ) -> TaskFilter {
    self.active_filter
  }

  /// Fetches tasks and categories
  /// concurrently. Both succeed and replace
  /// the snapshot, or nothing is applied
  /// and the error banner is set.
  #[tracing::instrument(skip(self))]
  pub async fn load_data(
    &mut self
  ) -> Result<(), LoadError> {
    let fetched = tokio::try_join!(
      self.backend.fetch_tasks(),
      self.backend.fetch_categories()
    );

    match fetched {
      | Ok((tasks, categories)) => {
        info!(
          tasks = tasks.len(),
          categories = categories.len(),
          "loaded view data"
        );
        self.tasks = tasks;
        self.categories = categories;
        Ok(())
      }
      | Err(source) => {
        let err = LoadError { source };
        error!(error = %err, "load failed; keeping previous data");
        self.error =
          Some(err.source.to_string());
        Err(err)
      }
    }
  }

  #[must_use]
  pub fn stats(&self) -> TaskStats {
    TaskStats::from_tasks(&self.tasks)
  }

  pub fn set_active_filter(
    &mut self,
    filter: TaskFilter
  ) {
    debug!(filter = filter.as_str(), "active filter changed");
    self.active_filter = filter;
  }

  /// Tasks narrowed by the active filter,
  /// in snapshot order.
  #[must_use]
  pub fn filtered_tasks(
    &self
  ) -> Vec<Task> {
    self
      .tasks
      .iter()
      .filter(|task| {
        self.active_filter.matches(task)
      })
      .cloned()
      .collect()
  }

  #[must_use]
  pub fn category_name(
    &self,
    id: Option<&str>
  ) -> Option<&str> {
    let id = id?;
    self
      .categories
      .iter()
      .find(|c| c.id == id)
      .map(|c| c.name.as_str())
  }

  /// Flips the theme, writes it through
  /// to the preference store and updates
  /// the root classes. Returns the new
  /// dark-mode flag.
  #[tracing::instrument(skip(self))]
  pub fn toggle_dark_mode(
    &mut self
  ) -> anyhow::Result<bool> {
    let next = self.theme.next();
    let dark = next.is_dark();
    self
      .preferences
      .set_bool(DARK_MODE_KEY, dark)?;
    self.theme = next;
    self.root.apply_theme(next);
    info!(dark, "toggled dark mode");
    Ok(dark)
  }

  pub fn dismiss_error(&mut self) {
    self.error = None;
  }

  pub fn push_notice(
    &mut self,
    notice: Notice
  ) {
    self.notices.push(notice);
  }

  pub fn notices(&self) -> &[Notice] {
    &self.notices
  }

  pub fn drain_notices(
    &mut self
  ) -> Vec<Notice> {
    std::mem::take(&mut self.notices)
  }

  #[tracing::instrument(skip(self, data))]
  pub async fn create_task(
    &mut self,
    data: TaskCreate
  ) -> Result<Task, ServiceError> {
    let result =
      self.backend.create_task(data).await;
    self
      .finish_mutation(
        result,
        |_| {
          "Task created successfully!"
            .to_string()
        }
      )
      .await
  }

  #[tracing::instrument(skip(self, patch))]
  pub async fn update_task(
    &mut self,
    id: &str,
    patch: TaskPatch
  ) -> Result<Task, ServiceError> {
    let result = self
      .backend
      .update_task(id, patch)
      .await;
    self
      .finish_mutation(
        result,
        |_| {
          "Task updated successfully!"
            .to_string()
        }
      )
      .await
  }

  #[tracing::instrument(skip(self))]
  pub async fn delete_task(
    &mut self,
    id: &str
  ) -> Result<Task, ServiceError> {
    let result =
      self.backend.delete_task(id).await;
    self
      .finish_mutation(
        result,
        |_| {
          "Task deleted successfully!"
            .to_string()
        }
      )
      .await
  }

  /// Completed tasks go back to pending;
  /// anything else becomes completed.
  #[tracing::instrument(skip(self, task), fields(id = %task.id))]
  pub async fn toggle_status(
    &mut self,
    task: &Task
  ) -> Result<Task, ServiceError> {
    let next = match task.status {
      | TaskStatus::Completed => {
        TaskStatus::Pending
      }
      | TaskStatus::Pending
      | TaskStatus::InProgress => {
        TaskStatus::Completed
      }
    };
    let patch = TaskPatch {
      status: Some(next),
      ..TaskPatch::default()
    };
    let result = self
      .backend
      .update_task(&task.id, patch)
      .await;
    self
      .finish_mutation(result, |task| {
        format!(
          "Task marked as {}!",
          task.status.as_str()
        )
      })
      .await
  }

  async fn finish_mutation<F>(
    &mut self,
    result: Result<Task, ServiceError>,
    success: F
  ) -> Result<Task, ServiceError>
  where
    F: FnOnce(&Task) -> String
  {
    match result {
      | Ok(task) => {
        self.push_notice(Notice::success(
          success(&task)
        ));
        if let Err(err) =
          self.load_data().await
        {
          warn!(error = %err, "reload after mutation failed");
        }
        Ok(task)
      }
      | Err(err) => {
        warn!(error = %err, "mutation rejected");
        self.push_notice(Notice::error(
          err.to_string()
        ));
        Err(err)
      }
    }
  }
}
