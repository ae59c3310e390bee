//! Capability-keyed service registry
//!
//! The registry maps a capability type (usually a trait object type such as
//! `dyn EconomyProvider`) to every implementation registered for it, kept in
//! resolution order: highest priority first, earliest registration first
//! within a priority. The head of that list is the active service.
//!
//! # Thread Safety
//!
//! All state sits behind one `RwLock`. Registration and unregistration take
//! the write lock for the whole insert-or-remove, so a reader always observes
//! the list either before or after a change, never in between: a removed
//! service is never returned, and an alternate implementation becomes visible
//! in the same step that its predecessor disappears.
//!
//! The registry never calls into the services it stores. Dropping a
//! registration only releases the registry's own `Arc`; callers that already
//! resolved a service keep using it until they drop their handle.

use crate::types::ServicePriority;
use parking_lot::RwLock;
use std::any::{type_name, Any, TypeId};
use std::collections::HashMap;
use std::fmt;
use std::ops::Deref;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, OnceLock};
use tracing::{debug, info};

/// Identifies one registration for later removal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RegistrationHandle {
    capability: TypeId,
    sequence: u64,
}

impl RegistrationHandle {
    /// Monotonic registration number; lower numbers registered earlier
    pub fn sequence(&self) -> u64 {
        self.sequence
    }
}

/// A resolved service
///
/// Cheap to clone. Dereferences to the capability type.
pub struct Service<T: ?Sized> {
    inner: Arc<T>,
    priority: ServicePriority,
    registrar: Arc<str>,
    handle: RegistrationHandle,
}

impl<T: ?Sized> Service<T> {
    pub fn get(&self) -> &Arc<T> {
        &self.inner
    }

    pub fn priority(&self) -> ServicePriority {
        self.priority
    }

    /// Name of the module that registered this service
    pub fn registrar_name(&self) -> &str {
        &self.registrar
    }

    pub fn handle(&self) -> RegistrationHandle {
        self.handle
    }
}

impl<T: ?Sized> Clone for Service<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
            priority: self.priority,
            registrar: Arc::clone(&self.registrar),
            handle: self.handle,
        }
    }
}

impl<T: ?Sized> Deref for Service<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.inner
    }
}

impl<T: ?Sized> fmt::Debug for Service<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Service")
            .field("capability", &type_name::<T>())
            .field("priority", &self.priority)
            .field("registrar", &self.registrar)
            .field("sequence", &self.handle.sequence)
            .finish()
    }
}

/// One stored registration; `service` holds a `Service<T>` for its capability
struct Registration {
    sequence: u64,
    priority: ServicePriority,
    registrar: Arc<str>,
    service: Box<dyn Any + Send + Sync>,
}

/// Process-wide directory of capability implementations
#[derive(Default)]
pub struct ServiceRegistry {
    /// Registrations per capability, in resolution order
    services: RwLock<HashMap<TypeId, Vec<Registration>>>,
    next_sequence: AtomicU64,
}

impl ServiceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// The shared registry for this process
    pub fn global() -> &'static ServiceRegistry {
        static GLOBAL: OnceLock<ServiceRegistry> = OnceLock::new();
        GLOBAL.get_or_init(ServiceRegistry::new)
    }

    /// Register an implementation of capability `T`
    ///
    /// Always succeeds. The new registration becomes active if its priority is
    /// strictly higher than every existing one for `T`.
    pub fn register<T>(
        &self,
        implementation: Arc<T>,
        priority: ServicePriority,
        registrar_name: &str,
    ) -> RegistrationHandle
    where
        T: ?Sized + Send + Sync + 'static,
    {
        let capability = TypeId::of::<T>();
        let registrar: Arc<str> = Arc::from(registrar_name);

        let mut services = self.services.write();
        // sequence is taken under the lock so registration order matches it
        let sequence = self.next_sequence.fetch_add(1, Ordering::Relaxed);
        let handle = RegistrationHandle {
            capability,
            sequence,
        };
        let service = Service {
            inner: implementation,
            priority,
            registrar: Arc::clone(&registrar),
            handle,
        };
        let registration = Registration {
            sequence,
            priority,
            registrar,
            service: Box::new(service),
        };

        let entries = services.entry(capability).or_default();
        // after every entry of equal or higher priority: earliest wins ties
        let position = entries
            .iter()
            .position(|entry| entry.priority < priority)
            .unwrap_or(entries.len());
        entries.insert(position, registration);
        let active = position == 0;

        info!(
            capability = type_name::<T>(),
            registrar = registrar_name,
            %priority,
            sequence,
            active,
            "service registered"
        );

        handle
    }

    /// The active implementation of `T`, if any
    pub fn service_for<T>(&self) -> Option<Service<T>>
    where
        T: ?Sized + Send + Sync + 'static,
    {
        let services = self.services.read();
        services
            .get(&TypeId::of::<T>())
            .and_then(|entries| entries.first())
            .and_then(downcast::<T>)
    }

    /// Every registered implementation of `T`, in resolution order
    pub fn all_services_for<T>(&self) -> Vec<Service<T>>
    where
        T: ?Sized + Send + Sync + 'static,
    {
        let services = self.services.read();
        services
            .get(&TypeId::of::<T>())
            .map(|entries| entries.iter().filter_map(downcast::<T>).collect())
            .unwrap_or_default()
    }

    /// Remove one registration; returns false if it was already gone
    pub fn unregister(&self, handle: RegistrationHandle) -> bool {
        let mut services = self.services.write();
        let Some(entries) = services.get_mut(&handle.capability) else {
            return false;
        };
        let Some(position) = entries
            .iter()
            .position(|entry| entry.sequence == handle.sequence)
        else {
            return false;
        };

        let removed = entries.remove(position);
        Self::log_removal(&removed, position == 0, entries.first());
        if entries.is_empty() {
            services.remove(&handle.capability);
        }
        // release the lock before the registry's reference to the service drops
        drop(services);
        drop(removed);
        true
    }

    /// Remove every registration made by `registrar_name`
    ///
    /// Returns the number of registrations removed across all capabilities.
    pub fn unregister_all(&self, registrar_name: &str) -> usize {
        let mut services = self.services.write();
        let mut retired = Vec::new();

        for entries in services.values_mut() {
            let mut index = 0;
            while index < entries.len() {
                if &*entries[index].registrar == registrar_name {
                    let removed = entries.remove(index);
                    Self::log_removal(&removed, index == 0, entries.first());
                    retired.push(removed);
                } else {
                    index += 1;
                }
            }
        }
        services.retain(|_, entries| !entries.is_empty());
        drop(services);

        let removed_count = retired.len();

        debug!(
            registrar = registrar_name,
            removed = removed_count,
            "registrar unregistered"
        );
        removed_count
    }

    /// Number of registrations for `T`
    pub fn registration_count<T>(&self) -> usize
    where
        T: ?Sized + Send + Sync + 'static,
    {
        self.services
            .read()
            .get(&TypeId::of::<T>())
            .map_or(0, Vec::len)
    }

    fn log_removal(removed: &Registration, was_active: bool, successor: Option<&Registration>) {
        info!(
            registrar = &*removed.registrar,
            sequence = removed.sequence,
            "service unregistered"
        );
        if was_active {
            match successor {
                Some(next) => info!(
                    registrar = &*next.registrar,
                    priority = %next.priority,
                    sequence = next.sequence,
                    "active service changed"
                ),
                None => info!("no service remains for capability"),
            }
        }
    }
}

impl fmt::Debug for ServiceRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let services = self.services.read();
        let registrations: usize = services.values().map(Vec::len).sum();
        f.debug_struct("ServiceRegistry")
            .field("capabilities", &services.len())
            .field("registrations", &registrations)
            .finish()
    }
}

fn downcast<T>(registration: &Registration) -> Option<Service<T>>
where
    T: ?Sized + Send + Sync + 'static,
{
    registration.service.downcast_ref::<Service<T>>().cloned()
}
