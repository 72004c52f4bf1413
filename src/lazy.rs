//! Lazy handles for service instances. A handle embedded in a struct field
//! defers resolution to the first read, which makes it possible to break up
//! construction-time dependency chains - the usual use case being circular or
//! rarely used dependencies. Handles are created by a
//! [LazyInjector](crate::injector::LazyInjector).

use crate::error::ServiceResolutionError;
use crate::instance_provider::{
    ServiceInstancePtr, ServiceInstanceProviderPtr, Tag, TypedServiceInstanceProvider,
};
use derivative::Derivative;
use std::any::type_name;
#[cfg(not(feature = "threadsafe"))]
use std::cell::RefCell;
#[cfg(feature = "threadsafe")]
use std::sync::{PoisonError, RwLock};
use tracing::trace;

/// How a handle looks the service up in the container. Captured when the
/// handle is created and immutable afterwards.
#[derive(Clone, Debug)]
pub(crate) enum LookupStrategy {
    Primary,
    Named(String),
    Tagged(Tag),
}

#[derive(Derivative)]
#[derivative(Debug)]
struct ResolutionBinding {
    #[derivative(Debug = "ignore")]
    provider: ServiceInstanceProviderPtr,
    strategy: LookupStrategy,
}

impl ResolutionBinding {
    fn resolve<T: ?Sized + 'static>(
        &self,
    ) -> Result<ServiceInstancePtr<T>, ServiceResolutionError> {
        trace!("Lazily resolving instance of {}.", type_name::<T>());

        match &self.strategy {
            LookupStrategy::Primary => self.provider.primary_instance_typed::<T>(),
            LookupStrategy::Named(name) => self.provider.instance_by_name_typed::<T>(name),
            LookupStrategy::Tagged(tag) => self.provider.instance_by_tag_typed::<T>(tag),
        }
    }
}

/// Per-handle cache slot. A written entry always wins over resolution;
/// resolved entries are only stored when caching is enabled.
struct CachedSlot<V> {
    cache_enabled: bool,
    #[cfg(feature = "threadsafe")]
    value: RwLock<Option<V>>,
    #[cfg(not(feature = "threadsafe"))]
    value: RefCell<Option<V>>,
}

impl<V: Clone> CachedSlot<V> {
    fn new(cache_enabled: bool) -> Self {
        Self {
            cache_enabled,
            value: Default::default(),
        }
    }

    fn cached(&self) -> Option<V> {
        #[cfg(feature = "threadsafe")]
        {
            self.value
                .read()
                .unwrap_or_else(PoisonError::into_inner)
                .clone()
        }
        #[cfg(not(feature = "threadsafe"))]
        {
            self.value.borrow().clone()
        }
    }

    fn store(&self, value: V) {
        #[cfg(feature = "threadsafe")]
        {
            *self.value.write().unwrap_or_else(PoisonError::into_inner) = Some(value);
        }
        #[cfg(not(feature = "threadsafe"))]
        {
            self.value.replace(Some(value));
        }
    }

    fn get_with<E>(&self, resolve: impl FnOnce() -> Result<V, E>) -> Result<V, E> {
        if let Some(value) = self.cached() {
            return Ok(value);
        }

        // errors are not cached, so a later read retries resolution
        let value = resolve()?;
        if self.cache_enabled {
            self.store(value.clone());
        }

        Ok(value)
    }
}

/// Lazy handle for a single service instance.
///
/// Reading the handle with [get](Self::get) resolves the instance from the
/// container via the lookup strategy captured at creation time. With caching
/// enabled (the default for [LazyInjector](crate::injector::LazyInjector)),
/// the first successfully resolved instance is memoized and returned on all
/// later reads; with caching disabled, every read reflects the container's
/// current binding state. Writing the handle with [set](Self::set) stores an
/// explicit instance which takes precedence over resolution in both modes.
///
/// Each handle owns its own cache slot, so two struct instances embedding
/// handles for the same service resolve and cache independently.
#[derive(Derivative)]
#[derivative(Debug(bound = ""))]
pub struct Lazy<T: ?Sized + 'static> {
    binding: ResolutionBinding,
    #[derivative(Debug = "ignore")]
    slot: CachedSlot<ServiceInstancePtr<T>>,
}

impl<T: ?Sized + 'static> Lazy<T> {
    pub(crate) fn new(
        provider: ServiceInstanceProviderPtr,
        strategy: LookupStrategy,
        cache_enabled: bool,
    ) -> Self {
        Self {
            binding: ResolutionBinding { provider, strategy },
            slot: CachedSlot::new(cache_enabled),
        }
    }

    /// Returns the cached instance if one is present, otherwise resolves the
    /// service from the container. Resolution errors are the container's own
    /// and are passed through unmodified.
    pub fn get(&self) -> Result<ServiceInstancePtr<T>, ServiceResolutionError> {
        self.slot.get_with(|| self.binding.resolve::<T>())
    }

    /// Stores an explicit instance in the cache slot, bypassing resolution on
    /// all later reads until overwritten. Works regardless of the caching
    /// mode.
    pub fn set(&self, instance: ServiceInstancePtr<T>) {
        self.slot.store(instance);
    }
}

/// Lazy handle for all instances bound for a service type, resolved in
/// binding order. The multi-instance counterpart of [Lazy], with the same
/// caching and write-through semantics applied to the whole sequence.
#[derive(Derivative)]
#[derivative(Debug(bound = ""))]
pub struct LazyAll<T: ?Sized + 'static> {
    #[derivative(Debug = "ignore")]
    provider: ServiceInstanceProviderPtr,
    #[derivative(Debug = "ignore")]
    slot: CachedSlot<Vec<ServiceInstancePtr<T>>>,
}

impl<T: ?Sized + 'static> LazyAll<T> {
    pub(crate) fn new(provider: ServiceInstanceProviderPtr, cache_enabled: bool) -> Self {
        Self {
            provider,
            slot: CachedSlot::new(cache_enabled),
        }
    }

    /// Returns the cached sequence if one is present, otherwise resolves all
    /// bound instances from the container.
    pub fn get(&self) -> Result<Vec<ServiceInstancePtr<T>>, ServiceResolutionError> {
        self.slot.get_with(|| {
            trace!("Lazily resolving all instances of {}.", type_name::<T>());
            self.provider.instances_typed::<T>()
        })
    }

    /// Stores an explicit sequence in the cache slot, bypassing resolution on
    /// all later reads until overwritten.
    pub fn set(&self, instances: Vec<ServiceInstancePtr<T>>) {
        self.slot.store(instances);
    }
}

#[cfg(test)]
mod tests {
    use crate::error::ServiceResolutionError;
    use crate::instance_provider::{
        service_cast, CastFunction, MockServiceInstanceProvider, ServiceInstanceAnyPtr,
        ServiceInstancePtr, ServiceInstanceProviderPtr, Tag,
    };
    use crate::lazy::{Lazy, LazyAll, LookupStrategy};
    use mockall::predicate::*;
    use mockall::Sequence;
    use std::any::TypeId;

    fn instance() -> (ServiceInstanceAnyPtr, CastFunction) {
        (
            ServiceInstancePtr::new(0i8) as ServiceInstanceAnyPtr,
            service_cast::<i8> as CastFunction,
        )
    }

    fn lazy_with(provider: MockServiceInstanceProvider, cache_enabled: bool) -> Lazy<i8> {
        Lazy::new(
            ServiceInstancePtr::new(provider) as ServiceInstanceProviderPtr,
            LookupStrategy::Primary,
            cache_enabled,
        )
    }

    #[test]
    fn should_cache_resolved_instance() {
        let mut provider = MockServiceInstanceProvider::new();
        provider
            .expect_primary_instance()
            .with(eq(TypeId::of::<i8>()))
            .times(1)
            .returning(|_| Ok(instance()));

        let lazy = lazy_with(provider, true);
        let first = lazy.get().unwrap();
        let second = lazy.get().unwrap();

        assert!(ServiceInstancePtr::ptr_eq(&first, &second));
    }

    #[test]
    fn should_resolve_fresh_instance_without_caching() {
        let mut provider = MockServiceInstanceProvider::new();
        provider
            .expect_primary_instance()
            .with(eq(TypeId::of::<i8>()))
            .times(2)
            .returning(|_| Ok(instance()));

        let lazy = lazy_with(provider, false);
        let first = lazy.get().unwrap();
        let second = lazy.get().unwrap();

        assert!(!ServiceInstancePtr::ptr_eq(&first, &second));
    }

    #[test]
    fn should_prefer_written_value_over_resolution() {
        // no expectations - resolution must not happen
        let lazy = lazy_with(MockServiceInstanceProvider::new(), true);

        let written = ServiceInstancePtr::new(1i8);
        lazy.set(written.clone());

        assert!(ServiceInstancePtr::ptr_eq(&lazy.get().unwrap(), &written));
    }

    #[test]
    fn should_return_written_value_without_caching() {
        let mut provider = MockServiceInstanceProvider::new();
        provider
            .expect_primary_instance()
            .times(1)
            .returning(|_| Ok(instance()));

        let lazy = lazy_with(provider, false);
        lazy.get().unwrap();

        let written = ServiceInstancePtr::new(1i8);
        lazy.set(written.clone());

        assert!(ServiceInstancePtr::ptr_eq(&lazy.get().unwrap(), &written));
        assert!(ServiceInstancePtr::ptr_eq(&lazy.get().unwrap(), &written));
    }

    #[test]
    fn should_not_cache_failed_resolution() {
        let mut seq = Sequence::new();
        let mut provider = MockServiceInstanceProvider::new();
        provider
            .expect_primary_instance()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|type_id| Err(ServiceResolutionError::NoBinding(type_id)));
        provider
            .expect_primary_instance()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(instance()));

        let lazy = lazy_with(provider, true);

        assert_eq!(
            lazy.get().unwrap_err(),
            ServiceResolutionError::NoBinding(TypeId::of::<i8>())
        );
        assert!(lazy.get().is_ok());
    }

    #[test]
    fn should_dispatch_named_lookup() {
        let mut provider = MockServiceInstanceProvider::new();
        provider
            .expect_instance_by_name()
            .with(eq(TypeId::of::<i8>()), eq("service"))
            .times(1)
            .returning(|_, _| Ok(instance()));

        let lazy: Lazy<i8> = Lazy::new(
            ServiceInstancePtr::new(provider) as ServiceInstanceProviderPtr,
            LookupStrategy::Named("service".to_string()),
            true,
        );

        assert!(lazy.get().is_ok());
    }

    #[test]
    fn should_dispatch_tagged_lookup() {
        let mut provider = MockServiceInstanceProvider::new();
        provider
            .expect_instance_by_tag()
            .with(eq(TypeId::of::<i8>()), eq(Tag::new("throwable", false)))
            .times(1)
            .returning(|_, _| Ok(instance()));

        let lazy: Lazy<i8> = Lazy::new(
            ServiceInstancePtr::new(provider) as ServiceInstanceProviderPtr,
            LookupStrategy::Tagged(Tag::new("throwable", false)),
            true,
        );

        assert!(lazy.get().is_ok());
    }

    #[test]
    fn should_cache_resolved_sequence() {
        let mut provider = MockServiceInstanceProvider::new();
        provider
            .expect_instances()
            .with(eq(TypeId::of::<i8>()))
            .times(1)
            .returning(|_| Ok(vec![instance(), instance()]));

        let lazy: LazyAll<i8> = LazyAll::new(
            ServiceInstancePtr::new(provider) as ServiceInstanceProviderPtr,
            true,
        );

        let first = lazy.get().unwrap();
        let second = lazy.get().unwrap();

        assert_eq!(first.len(), 2);
        assert!(ServiceInstancePtr::ptr_eq(&first[0], &second[0]));
    }

    #[test]
    fn should_prefer_written_sequence_over_resolution() {
        let lazy: LazyAll<i8> = LazyAll::new(
            ServiceInstancePtr::new(MockServiceInstanceProvider::new())
                as ServiceInstanceProviderPtr,
            false,
        );

        lazy.set(vec![ServiceInstancePtr::new(1i8)]);

        assert_eq!(*lazy.get().unwrap()[0], 1);
    }
}
