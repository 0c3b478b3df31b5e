use chrono::{DateTime, Duration, Utc};
use taskflow_shared::{
    Category, CategoryCreate, CategoryPatch, Task, TaskCreate, TaskPatch, TaskStatus, User,
    UserCreate, UserPatch,
};

use crate::error::EntityKind;
use crate::service::LatencyProfile;
use crate::store::{Collection, Store};

/// A record type that lives in a [`Store`] collection and is served by an
/// entity service.
pub trait Record: Clone + Send + Sync + 'static {
    const KIND: EntityKind;
    const LATENCY: LatencyProfile;

    type Create: Send;
    type Patch: Send;

    fn id(&self) -> &str;

    fn collection(store: &Store) -> &Collection<Self>;

    /// Builds a new record, applying the type's defaults to absent fields.
    fn from_create(id: String, now: DateTime<Utc>, data: Self::Create) -> Self;

    /// Shallow merge: fields present in `patch` win, the rest are kept.
    fn merged(&self, patch: Self::Patch, now: DateTime<Utc>) -> Self;
}

impl Record for Task {
    const KIND: EntityKind = EntityKind::Task;
    const LATENCY: LatencyProfile = LatencyProfile::from_millis(300, 200, 400, 350, 250);

    type Create = TaskCreate;
    type Patch = TaskPatch;

    fn id(&self) -> &str {
        &self.id
    }

    fn collection(store: &Store) -> &Collection<Self> {
        store.tasks()
    }

    fn from_create(id: String, now: DateTime<Utc>, data: TaskCreate) -> Self {
        Task {
            id,
            title: data.title,
            description: data.description,
            priority: Some(data.priority.unwrap_or_default()),
            status: data.status.unwrap_or(TaskStatus::Pending),
            due_date: data.due_date,
            category_id: data.category_id,
            tags: data.tags.unwrap_or_default(),
            created_at: Some(now),
            updated_at: Some(now),
            subtasks: vec![],
        }
    }

    fn merged(&self, patch: TaskPatch, now: DateTime<Utc>) -> Self {
        let mut next = self.clone();
        if let Some(title) = patch.title {
            next.title = title;
        }
        if let Some(description) = patch.description {
            next.description = description;
        }
        if let Some(priority) = patch.priority {
            next.priority = Some(priority);
        }
        if let Some(status) = patch.status {
            next.status = status;
        }
        if let Some(due_date) = patch.due_date {
            next.due_date = due_date;
        }
        if let Some(category_id) = patch.category_id {
            next.category_id = category_id;
        }
        if let Some(tags) = patch.tags {
            next.tags = tags;
        }
        next.updated_at = Some(next_update_stamp(self.updated_at, now));
        next
    }
}

impl Record for Category {
    const KIND: EntityKind = EntityKind::Category;
    const LATENCY: LatencyProfile = LatencyProfile::from_millis(250, 200, 300, 300, 200);

    type Create = CategoryCreate;
    type Patch = CategoryPatch;

    fn id(&self) -> &str {
        &self.id
    }

    fn collection(store: &Store) -> &Collection<Self> {
        store.categories()
    }

    fn from_create(id: String, now: DateTime<Utc>, data: CategoryCreate) -> Self {
        Category {
            id,
            name: data.name,
            created_at: Some(now),
        }
    }

    fn merged(&self, patch: CategoryPatch, _now: DateTime<Utc>) -> Self {
        let mut next = self.clone();
        if let Some(name) = patch.name {
            next.name = name;
        }
        next
    }
}

impl Record for User {
    const KIND: EntityKind = EntityKind::User;
    const LATENCY: LatencyProfile = LatencyProfile::from_millis(300, 250, 400, 350, 250);

    type Create = UserCreate;
    type Patch = UserPatch;

    fn id(&self) -> &str {
        &self.id
    }

    fn collection(store: &Store) -> &Collection<Self> {
        store.users()
    }

    fn from_create(id: String, now: DateTime<Utc>, data: UserCreate) -> Self {
        User {
            id,
            name: data.name,
            email: data.email,
            preferences: data.preferences.unwrap_or_default(),
            created_at: Some(now),
        }
    }

    fn merged(&self, patch: UserPatch, _now: DateTime<Utc>) -> Self {
        let mut next = self.clone();
        if let Some(name) = patch.name {
            next.name = name;
        }
        if let Some(email) = patch.email {
            next.email = email;
        }
        if let Some(preferences) = patch.preferences {
            next.preferences = preferences;
        }
        next
    }
}

/// `updatedAt` must move forward even when two updates land within the
/// same clock tick.
fn next_update_stamp(previous: Option<DateTime<Utc>>, now: DateTime<Utc>) -> DateTime<Utc> {
    match previous {
        Some(prev) if now <= prev => prev + Duration::milliseconds(1),
        _ => now,
    }
}
