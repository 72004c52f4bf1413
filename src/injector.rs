//! Factory for [lazy handles](crate::lazy). A [LazyInjector] captures a
//! shared container handle and a caching flag once, and then stamps out
//! handles for individual services, mirroring how eager injection frameworks
//! capture a container reference at wiring time.

use crate::instance_provider::{ServiceInstanceProviderPtr, Tag, TagValue};
use crate::lazy::{Lazy, LazyAll, LookupStrategy};
use derivative::Derivative;
use std::any::type_name;
use tracing::debug;

/// Factory for [Lazy] and [LazyAll] handles bound to a single container.
///
/// All handles created by one injector share the container pointer and the
/// caching flag; the lookup strategy is chosen per handle. Caching is enabled
/// by default and can be turned off with [with_caching](Self::with_caching),
/// in which case every uncached read resolves against the container's current
/// binding state.
#[derive(Derivative, Clone)]
#[derivative(Debug)]
pub struct LazyInjector {
    #[derivative(Debug = "ignore")]
    provider: ServiceInstanceProviderPtr,
    cache_enabled: bool,
}

impl LazyInjector {
    /// Creates an injector with caching enabled.
    pub fn new(provider: ServiceInstanceProviderPtr) -> Self {
        Self::with_caching(provider, true)
    }

    /// Creates an injector with an explicit caching mode.
    pub fn with_caching(provider: ServiceInstanceProviderPtr, cache_enabled: bool) -> Self {
        Self {
            provider,
            cache_enabled,
        }
    }

    /// Creates a handle resolving the unconstrained binding for a service
    /// type.
    pub fn inject<T: ?Sized + 'static>(&self) -> Lazy<T> {
        debug!("Creating lazy injection handle for {}.", type_name::<T>());
        Lazy::new(
            self.provider.clone(),
            LookupStrategy::Primary,
            self.cache_enabled,
        )
    }

    /// Creates a handle resolving the binding registered under the given
    /// name.
    pub fn inject_named<T: ?Sized + 'static>(&self, name: &str) -> Lazy<T> {
        debug!(
            "Creating named lazy injection handle for {} ({}).",
            type_name::<T>(),
            name
        );
        Lazy::new(
            self.provider.clone(),
            LookupStrategy::Named(name.to_string()),
            self.cache_enabled,
        )
    }

    /// Creates a handle resolving the binding registered with the given tag
    /// key/value pair.
    pub fn inject_tagged<T: ?Sized + 'static, V: Into<TagValue>>(
        &self,
        key: &str,
        value: V,
    ) -> Lazy<T> {
        debug!(
            "Creating tagged lazy injection handle for {} ({}).",
            type_name::<T>(),
            key
        );
        Lazy::new(
            self.provider.clone(),
            LookupStrategy::Tagged(Tag::new(key, value)),
            self.cache_enabled,
        )
    }

    /// Creates a handle resolving all bindings for a service type, in binding
    /// order.
    pub fn inject_all<T: ?Sized + 'static>(&self) -> LazyAll<T> {
        debug!(
            "Creating lazy injection handle for all instances of {}.",
            type_name::<T>()
        );
        LazyAll::new(self.provider.clone(), self.cache_enabled)
    }
}
