//! Type-keyed registry for sharing services between plugins.

use crate::error::ServiceError;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::any::{type_name, Any, TypeId};
use std::sync::Arc;
use tracing::debug;

type ServiceObject = Arc<dyn Any + Send + Sync>;

/// One instance per concrete type.
///
/// ```rust
/// use hearth_kernel::services::ServiceRegistry;
/// use std::sync::Arc;
///
/// struct Economy { currency: &'static str }
///
/// let services = ServiceRegistry::new();
/// services.register(Arc::new(Economy { currency: "gold" }), false).unwrap();
/// assert_eq!(services.require::<Economy>().unwrap().currency, "gold");
/// ```
#[derive(Debug, Default)]
pub struct ServiceRegistry {
    services: DashMap<TypeId, ServiceObject>,
}

impl ServiceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `instance` as the service for `T`. With `replace == false` an
    /// existing registration is an error.
    pub fn register<T>(&self, instance: Arc<T>, replace: bool) -> Result<(), ServiceError>
    where
        T: Any + Send + Sync,
    {
        match self.services.entry(TypeId::of::<T>()) {
            Entry::Occupied(mut entry) => {
                if !replace {
                    return Err(ServiceError::AlreadyRegistered(type_name::<T>()));
                }
                entry.insert(instance);
                debug!("🔁 Replaced service {}", type_name::<T>());
            }
            Entry::Vacant(entry) => {
                entry.insert(instance);
                debug!("📝 Registered service {}", type_name::<T>());
            }
        }
        Ok(())
    }

    pub fn get<T>(&self) -> Option<Arc<T>>
    where
        T: Any + Send + Sync,
    {
        let service = self.services.get(&TypeId::of::<T>())?.value().clone();
        service.downcast::<T>().ok()
    }

    pub fn require<T>(&self) -> Result<Arc<T>, ServiceError>
    where
        T: Any + Send + Sync,
    {
        self.get::<T>().ok_or(ServiceError::Missing(type_name::<T>()))
    }

    /// Removes the service for `T`. Returns whether one was registered.
    pub fn unregister<T>(&self) -> bool
    where
        T: Any + Send + Sync,
    {
        self.services.remove(&TypeId::of::<T>()).is_some()
    }

    pub fn len(&self) -> usize {
        self.services.len()
    }

    pub fn is_empty(&self) -> bool {
        self.services.is_empty()
    }
}
