use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use taskflow_core::error::{EntityKind, ServiceError, ServiceResult};
use taskflow_core::filters::TaskFilter;
use taskflow_core::fixtures::Fixtures;
use taskflow_core::preferences::{DARK_MODE_KEY, Preferences};
use taskflow_core::service::{Backend, Services};
use taskflow_core::store::Store;
use taskflow_core::view::{NoticeLevel, ViewState};
use taskflow_shared::{Category, Task, TaskCreate, TaskPatch, TaskPriority, TaskStatus};
use tempfile::tempdir;

fn seeded_services() -> (Arc<Store>, Services) {
    let fixtures = Fixtures::embedded().expect("embedded fixtures");
    let store = Store::seed(fixtures);
    let services = Services::new(Arc::clone(&store), 0.0);
    (store, services)
}

async fn loaded_view() -> ViewState<Services> {
    let (_, services) = seeded_services();
    let mut view = ViewState::new(services, Preferences::in_memory());
    view.load_data().await.expect("initial load");
    view
}

/// Delegates to real services but refuses to list categories.
#[derive(Debug, Clone)]
struct CategoriesDown {
    inner: Services,
}

impl Backend for CategoriesDown {
    async fn fetch_tasks(&self) -> ServiceResult<Vec<Task>> {
        self.inner.fetch_tasks().await
    }

    async fn fetch_categories(&self) -> ServiceResult<Vec<Category>> {
        Err(ServiceError::Unavailable(
            "category service offline".to_string(),
        ))
    }

    async fn create_task(&self, data: TaskCreate) -> ServiceResult<Task> {
        self.inner.create_task(data).await
    }

    async fn update_task(&self, id: &str, patch: TaskPatch) -> ServiceResult<Task> {
        self.inner.update_task(id, patch).await
    }

    async fn delete_task(&self, id: &str) -> ServiceResult<Task> {
        self.inner.delete_task(id).await
    }
}

/// Serves categories once, then reports the category service as down.
#[derive(Debug)]
struct CategoriesFailAfterFirst {
    inner: Services,
    category_calls: AtomicUsize,
}

impl Backend for CategoriesFailAfterFirst {
    async fn fetch_tasks(&self) -> ServiceResult<Vec<Task>> {
        self.inner.fetch_tasks().await
    }

    async fn fetch_categories(&self) -> ServiceResult<Vec<Category>> {
        if self.category_calls.fetch_add(1, Ordering::SeqCst) == 0 {
            return self.inner.fetch_categories().await;
        }
        Err(ServiceError::Unavailable(
            "category service offline".to_string(),
        ))
    }

    async fn create_task(&self, data: TaskCreate) -> ServiceResult<Task> {
        self.inner.create_task(data).await
    }

    async fn update_task(&self, id: &str, patch: TaskPatch) -> ServiceResult<Task> {
        self.inner.update_task(id, patch).await
    }

    async fn delete_task(&self, id: &str) -> ServiceResult<Task> {
        self.inner.delete_task(id).await
    }
}

#[tokio::test]
async fn created_task_shows_up_in_stats_after_reload() {
    let mut view = loaded_view().await;
    let before = view.stats();
    assert_eq!(before.total, 6);
    assert_eq!(before.pending, 3);

    let created = view
        .create_task(TaskCreate {
            title: "Buy milk".to_string(),
            priority: Some(TaskPriority::Low),
            ..TaskCreate::default()
        })
        .await
        .expect("create");

    assert_eq!(created.status, TaskStatus::Pending);
    assert!(created.created_at.is_some());
    assert_eq!(created.created_at, created.updated_at);

    let after = view.stats();
    assert_eq!(after.total, 7);
    assert_eq!(after.pending, 4);
    assert_eq!(after.urgent, before.urgent);
    assert!(view.tasks().iter().any(|t| t.id == created.id));

    let notices = view.drain_notices();
    assert_eq!(notices.len(), 1);
    assert_eq!(notices[0].level, NoticeLevel::Success);
    assert_eq!(notices[0].message, "Task created successfully!");
}

#[tokio::test]
async fn toggling_twice_returns_to_pending() {
    let mut view = loaded_view().await;
    let task = view
        .tasks()
        .iter()
        .find(|t| t.id == "2")
        .cloned()
        .expect("seed task 2");

    let done = view.toggle_status(&task).await.expect("complete");
    assert_eq!(done.status, TaskStatus::Completed);
    assert_eq!(view.stats().completed, 2);

    let reopened = view.toggle_status(&done).await.expect("reopen");
    assert_eq!(reopened.status, TaskStatus::Pending);
    assert_eq!(reopened.title, task.title);
    assert_eq!(view.stats().completed, 1);

    let messages: Vec<String> = view
        .drain_notices()
        .into_iter()
        .map(|n| n.message)
        .collect();
    assert_eq!(
        messages,
        vec!["Task marked as completed!", "Task marked as pending!"]
    );
}

#[tokio::test]
async fn deleting_unknown_id_changes_nothing() {
    let (store, services) = seeded_services();
    let mut view = ViewState::new(services, Preferences::in_memory());
    view.load_data().await.expect("load");

    let err = view
        .delete_task("does-not-exist")
        .await
        .expect_err("missing task");
    assert_eq!(err, ServiceError::not_found(EntityKind::Task, "does-not-exist"));
    assert_eq!(err.to_string(), "Task not found");
    assert_eq!(store.tasks().len(), 6);
    assert_eq!(view.tasks().len(), 6);

    let notices = view.drain_notices();
    assert_eq!(notices[0].level, NoticeLevel::Error);
    assert_eq!(notices[0].message, "Task not found");
}

#[tokio::test]
async fn failed_refresh_applies_neither_collection() {
    let (_, services) = seeded_services();
    let mut view = ViewState::new(
        CategoriesDown { inner: services },
        Preferences::in_memory(),
    );

    let err = view.load_data().await.expect_err("categories down");
    assert_eq!(
        err.source,
        ServiceError::Unavailable("category service offline".to_string())
    );
    assert!(view.tasks().is_empty());
    assert!(view.categories().is_empty());
    assert_eq!(view.error(), Some("category service offline"));

    view.dismiss_error();
    assert_eq!(view.error(), None);
}

#[tokio::test]
async fn failed_reload_keeps_previous_snapshot() {
    let (store, services) = seeded_services();
    let mut view = ViewState::new(
        CategoriesFailAfterFirst {
            inner: services.clone(),
            category_calls: AtomicUsize::new(0),
        },
        Preferences::in_memory(),
    );
    view.load_data().await.expect("first load");
    assert_eq!(view.tasks().len(), 6);
    assert_eq!(view.categories().len(), 4);
    assert_eq!(view.error(), None);

    services
        .tasks
        .create(TaskCreate {
            title: "Added behind the view".to_string(),
            ..TaskCreate::default()
        })
        .await;
    assert_eq!(store.tasks().len(), 7);

    view.load_data().await.expect_err("categories down");
    assert_eq!(view.tasks().len(), 6);
    assert_eq!(view.categories().len(), 4);
    assert_eq!(view.stats().total, 6);
    assert_eq!(view.error(), Some("category service offline"));
}

#[tokio::test(start_paused = true)]
async fn load_fetches_tasks_and_categories_concurrently() {
    let fixtures = Fixtures::embedded().expect("embedded fixtures");
    let services = Services::new(Store::seed(fixtures), 1.0);
    let mut view = ViewState::new(services, Preferences::in_memory());

    let started = tokio::time::Instant::now();
    view.load_data().await.expect("load");
    let elapsed = started.elapsed();

    assert!(elapsed >= Duration::from_millis(300));
    assert!(elapsed < Duration::from_millis(300 + 250));
    assert_eq!(view.tasks().len(), 6);
    assert_eq!(view.categories().len(), 4);
}

#[tokio::test]
async fn get_by_id_returns_what_create_returned() {
    let (_, services) = seeded_services();
    let created = services
        .tasks
        .create(TaskCreate {
            title: "Round trip".to_string(),
            tags: Some(vec!["x".to_string()]),
            ..TaskCreate::default()
        })
        .await;

    let fetched = services.tasks.get_by_id(&created.id).await.expect("fetch");
    assert_eq!(fetched, created);
}

#[tokio::test]
async fn empty_patch_only_moves_updated_at() {
    let (_, services) = seeded_services();
    let before = services.tasks.get_by_id("1").await.expect("seed 1");

    let after = services
        .tasks
        .update("1", TaskPatch::default())
        .await
        .expect("update");

    assert_eq!(after.title, before.title);
    assert_eq!(after.status, before.status);
    assert_eq!(after.tags, before.tags);
    assert_eq!(after.created_at, before.created_at);
    assert!(after.updated_at > before.updated_at);
}

#[tokio::test]
async fn dark_mode_survives_a_restart() {
    let temp = tempdir().expect("tempdir");
    let path = temp.path().join("prefs").join("preferences.json");

    {
        let (_, services) = seeded_services();
        let mut view = ViewState::new(services, Preferences::open(&path).expect("open"));
        assert!(!view.is_dark_mode());
        assert!(view.toggle_dark_mode().expect("toggle"));
        assert!(view.root_classes().contains("dark"));
    }

    let reopened = Preferences::open(&path).expect("reopen");
    assert_eq!(reopened.get(DARK_MODE_KEY), Some("true"));

    let (_, services) = seeded_services();
    let view = ViewState::new(services, reopened);
    assert!(view.is_dark_mode());
    assert!(view.root_classes().contains("dark"));
}

#[tokio::test]
async fn urgent_filter_ignores_status() {
    let mut view = loaded_view().await;
    view.set_active_filter(TaskFilter::Urgent);
    let ids: Vec<String> = view.filtered_tasks().into_iter().map(|t| t.id).collect();
    assert_eq!(ids, vec!["2", "6"]);
}
