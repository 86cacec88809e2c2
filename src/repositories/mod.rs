use async_trait::async_trait;
use uuid::Uuid;

use crate::errors::ServiceError;
use crate::models::{GoalPeriod, GoalSet, MenuItem, Order, Table};

pub mod in_memory;

pub use in_memory::InMemoryRepository;

/// Consistency boundary loaded, mutated and persisted as one unit.
pub trait Aggregate: Clone + Send + Sync + 'static {
    /// Name used in log lines and not-found messages.
    const NAME: &'static str;

    fn id(&self) -> Uuid;
    fn version(&self) -> i32;
    fn set_version(&mut self, version: i32);

    /// Natural key that must be unique across the repository, if any.
    fn unique_key(&self) -> Option<String> {
        None
    }
}

/// Persistence seam for aggregates.
///
/// `update` performs an optimistic version check: the aggregate passed in
/// must carry the version it was loaded with, otherwise the call fails with
/// [`ServiceError::ConcurrentModification`] and nothing is written. Any
/// method may raise that conflict, which command handlers treat as
/// transient.
#[async_trait]
pub trait Repository<T: Aggregate>: Send + Sync {
    async fn get_by_id(&self, id: Uuid) -> Result<Option<T>, ServiceError>;

    async fn list(&self) -> Result<Vec<T>, ServiceError>;

    /// Stores a new aggregate. Fails with [`ServiceError::AlreadyExists`]
    /// when its [`Aggregate::unique_key`] is taken.
    async fn add(&self, aggregate: T) -> Result<T, ServiceError>;

    /// Persists `aggregate` and returns it with its version bumped.
    async fn update(&self, aggregate: T) -> Result<T, ServiceError>;
}

macro_rules! impl_aggregate {
    ($ty:ty, $name:literal) => {
        impl_aggregate!($ty, $name, |_a| None);
    };
    ($ty:ty, $name:literal, |$a:ident| $key:expr) => {
        impl Aggregate for $ty {
            const NAME: &'static str = $name;

            fn id(&self) -> Uuid {
                self.id
            }

            fn version(&self) -> i32 {
                self.version
            }

            fn set_version(&mut self, version: i32) {
                self.version = version;
            }

            fn unique_key(&self) -> Option<String> {
                let $a = self;
                $key
            }
        }
    };
}

impl_aggregate!(Order, "Order");
impl_aggregate!(Table, "Table");
impl_aggregate!(MenuItem, "Menu item");
impl_aggregate!(GoalPeriod, "Goal period", |p| Some(format!(
    "team {} year {}",
    p.team_id, p.year
)));
impl_aggregate!(GoalSet, "Goal set", |g| Some(format!(
    "team {} period {} user {}",
    g.team_id, g.period_id, g.user_id
)));
