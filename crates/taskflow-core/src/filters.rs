use std::cmp::Ordering;

use taskflow_shared::{
  Task,
  TaskPriority,
  TaskStatus
};

/// Status-style tab filter applied by the
/// page controller.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Default,
)]
pub enum TaskFilter {
  #[default]
  All,
  Pending,
  InProgress,
  Completed,
  Urgent
}

impl TaskFilter {
  pub const ALL: [TaskFilter; 5] = [
    TaskFilter::All,
    TaskFilter::Pending,
    TaskFilter::InProgress,
    TaskFilter::Completed,
    TaskFilter::Urgent
  ];

  #[must_use]
  pub fn parse(raw: &str) -> Self {
    match raw.trim() {
      | "pending" => Self::Pending,
      | "in_progress" => Self::InProgress,
      | "completed" => Self::Completed,
      | "urgent" => Self::Urgent,
      | _ => Self::All
    }
  }

  #[must_use]
  pub fn as_str(self) -> &'static str {
    match self {
      | Self::All => "all",
      | Self::Pending => "pending",
      | Self::InProgress => "in_progress",
      | Self::Completed => "completed",
      | Self::Urgent => "urgent"
    }
  }

  #[must_use]
  pub fn label(self) -> &'static str {
    match self {
      | Self::All => "All Tasks",
      | Self::Pending => "Pending",
      | Self::InProgress => "In Progress",
      | Self::Completed => "Completed",
      | Self::Urgent => "Urgent"
    }
  }

  #[must_use]
  pub fn matches(
    self,
    task: &Task
  ) -> bool {
    match self {
      | Self::All => true,
      | Self::Pending => {
        task.status
          == TaskStatus::Pending
      }
      | Self::InProgress => {
        task.status
          == TaskStatus::InProgress
      }
      | Self::Completed => {
        task.status
          == TaskStatus::Completed
      }
      | Self::Urgent => {
        task.priority
          == Some(TaskPriority::Urgent)
      }
    }
  }
}

#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Default,
)]
pub struct TaskStats {
  pub total:       usize,
  pub pending:     usize,
  pub in_progress: usize,
  pub completed:   usize,
  pub urgent:      usize
}

impl TaskStats {
  #[must_use]
  pub fn from_tasks(
    tasks: &[Task]
  ) -> Self {
    let mut stats = Self {
      total: tasks.len(),
      ..Self::default()
    };
    for task in tasks {
      match task.status {
        | TaskStatus::Pending => {
          stats.pending += 1;
        }
        | TaskStatus::InProgress => {
          stats.in_progress += 1;
        }
        | TaskStatus::Completed => {
          stats.completed += 1;
        }
      }
      if task.priority
        == Some(TaskPriority::Urgent)
      {
        stats.urgent += 1;
      }
    }
    stats
  }
}

/// Single active ordering of the visible
/// task list.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Default,
)]
pub enum SortKey {
  #[default]
  DueDate,
  Priority,
  Status,
  Created
}

impl SortKey {
  /// Unknown keys fall back to creation
  /// order.
  #[must_use]
  pub fn parse(raw: &str) -> Self {
    match raw.trim() {
      | "dueDate" | "due_date" | "due" => {
        Self::DueDate
      }
      | "priority" => Self::Priority,
      | "status" => Self::Status,
      | _ => Self::Created
    }
  }

  #[must_use]
  pub fn as_str(self) -> &'static str {
    match self {
      | Self::DueDate => "dueDate",
      | Self::Priority => "priority",
      | Self::Status => "status",
      | Self::Created => "created"
    }
  }

  #[must_use]
  pub fn label(self) -> &'static str {
    match self {
      | Self::DueDate => {
        "Sort by Due Date"
      }
      | Self::Priority => {
        "Sort by Priority"
      }
      | Self::Status => "Sort by Status",
      | Self::Created => {
        "Sort by Created"
      }
    }
  }

  fn compare(
    self,
    a: &Task,
    b: &Task
  ) -> Ordering {
    match self {
      | Self::DueDate => {
        match (a.due_date, b.due_date) {
          | (None, None) => {
            Ordering::Equal
          }
          | (None, Some(_)) => {
            Ordering::Greater
          }
          | (Some(_), None) => {
            Ordering::Less
          }
          | (Some(x), Some(y)) => {
            x.cmp(&y)
          }
        }
      }
      | Self::Priority => {
        priority_rank(b.priority).cmp(
          &priority_rank(a.priority)
        )
      }
      | Self::Status => {
        status_rank(b.status)
          .cmp(&status_rank(a.status))
      }
      | Self::Created => {
        b.created_at.cmp(&a.created_at)
      }
    }
  }
}

/// urgent > high > medium > low > anything
/// unrecognised.
#[must_use]
pub fn priority_rank(
  priority: Option<TaskPriority>
) -> u8 {
  match priority {
    | Some(TaskPriority::Urgent) => 4,
    | Some(TaskPriority::High) => 3,
    | Some(TaskPriority::Medium) => 2,
    | Some(TaskPriority::Low) => 1,
    | None => 0
  }
}

#[must_use]
pub fn status_rank(
  status: TaskStatus
) -> u8 {
  match status {
    | TaskStatus::Pending => 3,
    | TaskStatus::InProgress => 2,
    | TaskStatus::Completed => 1
  }
}

/// Case-insensitive substring match on
/// title, description or any tag. An empty
/// term matches everything.
#[must_use]
pub fn matches_search(
  task: &Task,
  term: &str
) -> bool {
  let q = term.to_lowercase();
  if q.is_empty() {
    return true;
  }

  let title_match = task
    .title
    .to_lowercase()
    .contains(&q);
  let description_match = task
    .description
    .as_deref()
    .is_some_and(|desc| {
      desc.to_lowercase().contains(&q)
    });
  let tag_match =
    task.tags.iter().any(|tag| {
      tag.to_lowercase().contains(&q)
    });

  title_match
    || description_match
    || tag_match
}

/// Stable sort; ties keep their collection
/// order.
pub fn sort_tasks(
  tasks: &mut [Task],
  key: SortKey
) {
  tasks.sort_by(|a, b| key.compare(a, b));
}

#[must_use]
pub fn search_and_sort(
  tasks: &[Task],
  term: &str,
  key: SortKey
) -> Vec<Task> {
  let mut visible: Vec<Task> = tasks
    .iter()
    .filter(|task| {
      matches_search(task, term)
    })
    .cloned()
    .collect();
  sort_tasks(&mut visible, key);
  visible
}
