use std::future::Future;
use std::marker::PhantomData;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use taskflow_shared::{
    Category, CategoryCreate, CategoryPatch, Task, TaskCreate, TaskPatch, User, UserCreate,
    UserPatch,
};
use tracing::{debug, info, warn};

use crate::error::{ServiceError, ServiceResult};
use crate::record::Record;
use crate::store::Store;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    GetAll,
    GetById,
    Create,
    Update,
    Delete,
}

/// Simulated round-trip time for each operation of one entity type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LatencyProfile {
    pub get_all: Duration,
    pub get_by_id: Duration,
    pub create: Duration,
    pub update: Duration,
    pub delete: Duration,
}

impl LatencyProfile {
    pub const fn from_millis(
        get_all: u64,
        get_by_id: u64,
        create: u64,
        update: u64,
        delete: u64,
    ) -> Self {
        Self {
            get_all: Duration::from_millis(get_all),
            get_by_id: Duration::from_millis(get_by_id),
            create: Duration::from_millis(create),
            update: Duration::from_millis(update),
            delete: Duration::from_millis(delete),
        }
    }

    pub fn for_operation(&self, op: Operation) -> Duration {
        match op {
            Operation::GetAll => self.get_all,
            Operation::GetById => self.get_by_id,
            Operation::Create => self.create,
            Operation::Update => self.update,
            Operation::Delete => self.delete,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Latency {
    profile: LatencyProfile,
    scale: f64,
}

impl Latency {
    async fn simulate(&self, op: Operation) {
        if self.scale <= 0.0 {
            return;
        }
        let base = self.profile.for_operation(op);
        let delay = match Duration::try_from_secs_f64(base.as_secs_f64() * self.scale) {
            Ok(delay) => delay,
            Err(err) => {
                warn!(?op, scale = self.scale, error = %err, "latency scale out of range; using base delay");
                base
            }
        };
        debug!(?op, delay_ms = delay.as_millis() as u64, "simulating latency");
        tokio::time::sleep(delay).await;
    }
}

/// Async CRUD facade over one collection of the shared [`Store`].
#[derive(Debug)]
pub struct EntityService<R> {
    store: Arc<Store>,
    latency: Latency,
    _record: PhantomData<fn() -> R>,
}

impl<R> Clone for EntityService<R> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            latency: self.latency,
            _record: PhantomData,
        }
    }
}

pub type TaskService = EntityService<Task>;
pub type CategoryService = EntityService<Category>;
pub type UserService = EntityService<User>;

impl<R: Record> EntityService<R> {
    /// `latency_scale` multiplies the record type's latency profile; zero or
    /// a negative value resolves immediately.
    pub fn new(store: Arc<Store>, latency_scale: f64) -> Self {
        Self {
            store,
            latency: Latency {
                profile: R::LATENCY,
                scale: latency_scale,
            },
            _record: PhantomData,
        }
    }

    #[tracing::instrument(skip(self), fields(kind = %R::KIND))]
    pub async fn get_all(&self) -> Vec<R> {
        self.latency.simulate(Operation::GetAll).await;
        let records = R::collection(&self.store).snapshot();
        debug!(count = records.len(), "listed records");
        records
    }

    #[tracing::instrument(skip(self), fields(kind = %R::KIND))]
    pub async fn get_by_id(&self, id: &str) -> ServiceResult<R> {
        self.latency.simulate(Operation::GetById).await;
        R::collection(&self.store)
            .find(id)
            .ok_or_else(|| ServiceError::not_found(R::KIND, id))
    }

    #[tracing::instrument(skip(self, data), fields(kind = %R::KIND))]
    pub async fn create(&self, data: R::Create) -> R {
        self.latency.simulate(Operation::Create).await;
        let now = Utc::now();
        let record = R::collection(&self.store).insert_new(|id| R::from_create(id, now, data));
        info!(id = record.id(), "created record");
        record
    }

    #[tracing::instrument(skip(self, data), fields(kind = %R::KIND))]
    pub async fn update(&self, id: &str, data: R::Patch) -> ServiceResult<R> {
        self.latency.simulate(Operation::Update).await;
        let now = Utc::now();
        match R::collection(&self.store).replace_with(id, |current| current.merged(data, now)) {
            Some(updated) => {
                info!(id, "updated record");
                Ok(updated)
            }
            None => {
                warn!(id, "update of missing record");
                Err(ServiceError::not_found(R::KIND, id))
            }
        }
    }

    #[tracing::instrument(skip(self), fields(kind = %R::KIND))]
    pub async fn delete(&self, id: &str) -> ServiceResult<R> {
        self.latency.simulate(Operation::Delete).await;
        match R::collection(&self.store).remove(id) {
            Some(removed) => {
                info!(id, "deleted record");
                Ok(removed)
            }
            None => {
                warn!(id, "delete of missing record");
                Err(ServiceError::not_found(R::KIND, id))
            }
        }
    }
}

/// The three entity services over one store.
#[derive(Debug, Clone)]
pub struct Services {
    pub tasks: TaskService,
    pub categories: CategoryService,
    pub users: UserService,
}

impl Services {
    pub fn new(store: Arc<Store>, latency_scale: f64) -> Self {
        Self {
            tasks: EntityService::new(Arc::clone(&store), latency_scale),
            categories: EntityService::new(Arc::clone(&store), latency_scale),
            users: EntityService::new(store, latency_scale),
        }
    }
}

/// What the view controller needs from the data layer.
pub trait Backend {
    fn fetch_tasks(&self) -> impl Future<Output = ServiceResult<Vec<Task>>> + Send;

    fn fetch_categories(&self) -> impl Future<Output = ServiceResult<Vec<Category>>> + Send;

    fn create_task(&self, data: TaskCreate) -> impl Future<Output = ServiceResult<Task>> + Send;

    fn update_task(
        &self,
        id: &str,
        patch: TaskPatch,
    ) -> impl Future<Output = ServiceResult<Task>> + Send;

    fn delete_task(&self, id: &str) -> impl Future<Output = ServiceResult<Task>> + Send;
}

impl Backend for Services {
    async fn fetch_tasks(&self) -> ServiceResult<Vec<Task>> {
        Ok(self.tasks.get_all().await)
    }

    async fn fetch_categories(&self) -> ServiceResult<Vec<Category>> {
        Ok(self.categories.get_all().await)
    }

    async fn create_task(&self, data: TaskCreate) -> ServiceResult<Task> {
        Ok(self.tasks.create(data).await)
    }

    async fn update_task(&self, id: &str, patch: TaskPatch) -> ServiceResult<Task> {
        self.tasks.update(id, patch).await
    }

    async fn delete_task(&self, id: &str) -> ServiceResult<Task> {
        self.tasks.delete(id).await
    }
}

impl Services {
    pub async fn create_category(&self, data: CategoryCreate) -> Category {
        self.categories.create(data).await
    }

    pub async fn rename_category(&self, id: &str, name: String) -> ServiceResult<Category> {
        self.categories
            .update(id, CategoryPatch { name: Some(name) })
            .await
    }

    pub async fn create_user(&self, data: UserCreate) -> User {
        self.users.create(data).await
    }

    pub async fn update_user(&self, id: &str, patch: UserPatch) -> ServiceResult<User> {
        self.users.update(id, patch).await
    }
}
