use taskflow_shared::Task;

use crate::editor::TaskEditor;
use crate::error::ServiceError;
use crate::filters::{
  SortKey,
  search_and_sort
};
use crate::service::Backend;
use crate::view::ViewState;

/// Search box, sort selector and editor
/// sitting on top of the controller's
/// filtered task list.
#[derive(
  Debug, Clone, PartialEq, Default,
)]
pub struct TaskListView {
  pub search: String,
  pub sort:   SortKey,
  pub editor: TaskEditor
}

impl TaskListView {
  #[must_use]
  pub fn new(sort: SortKey) -> Self {
    Self {
      sort,
      ..Self::default()
    }
  }

  #[must_use]
  pub fn visible(
    &self,
    tasks: &[Task]
  ) -> Vec<Task> {
    search_and_sort(
      tasks,
      &self.search,
      self.sort
    )
  }

  /// What to show when `visible` comes
  /// back empty.
  #[must_use]
  pub fn empty_state(
    &self
  ) -> &'static str {
    if self.search.is_empty() {
      "No tasks yet"
    } else {
      "No tasks found"
    }
  }

  pub fn edit(&mut self, task: &Task) {
    self.editor.open_edit(task);
  }

  pub async fn toggle_status<B: Backend>(
    &self,
    view: &mut ViewState<B>,
    task: &Task
  ) -> Result<Task, ServiceError> {
    view.toggle_status(task).await
  }

  pub async fn delete<B: Backend>(
    &self,
    view: &mut ViewState<B>,
    id: &str
  ) -> Result<Task, ServiceError> {
    view.delete_task(id).await
  }
}
