//! Contract between lazy handles and the external dependency injection
//! container. The container is reached through the type-erased
//! [ServiceInstanceProvider], while [TypedServiceInstanceProvider] adds
//! strongly-typed access on top of it. This crate only consumes the contract -
//! storing bindings, managing scopes and detecting dependency cycles is the
//! responsibility of whichever container implements it.

use crate::error::ServiceResolutionError;
use itertools::Itertools;
#[cfg(test)]
use mockall::automock;
use std::any::{Any, TypeId};
use std::fmt::{Display, Formatter};
#[cfg(not(feature = "threadsafe"))]
use std::rc::Rc;
#[cfg(feature = "threadsafe")]
use std::sync::Arc;

#[cfg(not(feature = "threadsafe"))]
pub type ServiceInstancePtr<T> = Rc<T>;
#[cfg(feature = "threadsafe")]
pub type ServiceInstancePtr<T> = Arc<T>;

#[cfg(not(feature = "threadsafe"))]
pub type ServiceInstanceAnyPtr = ServiceInstancePtr<dyn Any + 'static>;
#[cfg(feature = "threadsafe")]
pub type ServiceInstanceAnyPtr = ServiceInstancePtr<dyn Any + Send + Sync + 'static>;

#[cfg(not(feature = "threadsafe"))]
pub type ServiceInstanceProviderPtr = Rc<dyn ServiceInstanceProvider>;
#[cfg(feature = "threadsafe")]
pub type ServiceInstanceProviderPtr = Arc<dyn ServiceInstanceProvider + Send + Sync>;

/// Cast function from a type-erased instance to a `Box` of the desired
/// [ServiceInstancePtr], type-erased again to `Box<dyn Any>`. The double
/// erasure makes it possible to hand out `dyn Trait` instances, since a
/// concrete instance needs to be unsize-coerced before being seen as a
/// `ServiceInstancePtr<dyn Trait>`. Containers associate one cast function
/// with each binding, where the concrete type is still known; for concrete
/// service types [service_cast] can be used directly.
pub type CastFunction =
    fn(instance: ServiceInstanceAnyPtr) -> Result<Box<dyn Any>, ServiceInstanceAnyPtr>;

/// Value of a tag constraint attached to a binding.
#[derive(Clone, Ord, PartialOrd, Eq, PartialEq, Hash, Debug)]
pub enum TagValue {
    Bool(bool),
    Int(i64),
    Str(String),
}

impl Display for TagValue {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            TagValue::Bool(value) => write!(f, "{value}"),
            TagValue::Int(value) => write!(f, "{value}"),
            TagValue::Str(value) => write!(f, "\"{value}\""),
        }
    }
}

impl From<bool> for TagValue {
    fn from(value: bool) -> Self {
        TagValue::Bool(value)
    }
}

impl From<i64> for TagValue {
    fn from(value: i64) -> Self {
        TagValue::Int(value)
    }
}

impl From<&str> for TagValue {
    fn from(value: &str) -> Self {
        TagValue::Str(value.to_string())
    }
}

impl From<String> for TagValue {
    fn from(value: String) -> Self {
        TagValue::Str(value)
    }
}

/// Key/value pair constraining a binding lookup to bindings registered with
/// the same tag.
#[derive(Clone, Ord, PartialOrd, Eq, PartialEq, Hash, Debug)]
pub struct Tag {
    pub key: String,
    pub value: TagValue,
}

impl Tag {
    pub fn new<K: ToString, V: Into<TagValue>>(key: K, value: V) -> Self {
        Self {
            key: key.to_string(),
            value: value.into(),
        }
    }
}

/// Generic provider for service instances - the contract the external
/// container needs to fulfill. Every call reflects the container's current
/// binding state; providers are free to create fresh instances or reuse
/// scoped ones.
#[cfg_attr(test, automock)]
pub trait ServiceInstanceProvider {
    /// Tries to return the instance bound for a given service type without
    /// any name or tag constraint.
    fn primary_instance(
        &self,
        type_id: TypeId,
    ) -> Result<(ServiceInstanceAnyPtr, CastFunction), ServiceResolutionError>;

    /// Tries to return the instance bound for a given service type under the
    /// given name.
    fn instance_by_name(
        &self,
        type_id: TypeId,
        name: &str,
    ) -> Result<(ServiceInstanceAnyPtr, CastFunction), ServiceResolutionError>;

    /// Tries to return the instance bound for a given service type with the
    /// given tag constraint.
    fn instance_by_tag(
        &self,
        type_id: TypeId,
        tag: &Tag,
    ) -> Result<(ServiceInstanceAnyPtr, CastFunction), ServiceResolutionError>;

    /// Returns instances for all bindings of a given service type, in binding
    /// order. Whether an empty binding list is an error is decided by the
    /// container.
    fn instances(
        &self,
        type_id: TypeId,
    ) -> Result<Vec<(ServiceInstanceAnyPtr, CastFunction)>, ServiceResolutionError>;
}

/// Helper trait for [ServiceInstanceProvider] providing strongly-typed access.
pub trait TypedServiceInstanceProvider {
    /// Typesafe version of [ServiceInstanceProvider::primary_instance].
    fn primary_instance_typed<T: ?Sized + 'static>(
        &self,
    ) -> Result<ServiceInstancePtr<T>, ServiceResolutionError>;

    /// Typesafe version of [ServiceInstanceProvider::instance_by_name].
    fn instance_by_name_typed<T: ?Sized + 'static>(
        &self,
        name: &str,
    ) -> Result<ServiceInstancePtr<T>, ServiceResolutionError>;

    /// Typesafe version of [ServiceInstanceProvider::instance_by_tag].
    fn instance_by_tag_typed<T: ?Sized + 'static>(
        &self,
        tag: &Tag,
    ) -> Result<ServiceInstancePtr<T>, ServiceResolutionError>;

    /// Typesafe version of [ServiceInstanceProvider::instances].
    fn instances_typed<T: ?Sized + 'static>(
        &self,
    ) -> Result<Vec<ServiceInstancePtr<T>>, ServiceResolutionError>;
}

impl<SIP: ServiceInstanceProvider + ?Sized> TypedServiceInstanceProvider for SIP {
    fn primary_instance_typed<T: ?Sized + 'static>(
        &self,
    ) -> Result<ServiceInstancePtr<T>, ServiceResolutionError> {
        self.primary_instance(TypeId::of::<T>())
            .and_then(|(instance, cast)| cast_instance(instance, cast))
    }

    fn instance_by_name_typed<T: ?Sized + 'static>(
        &self,
        name: &str,
    ) -> Result<ServiceInstancePtr<T>, ServiceResolutionError> {
        self.instance_by_name(TypeId::of::<T>(), name)
            .and_then(|(instance, cast)| cast_instance(instance, cast))
    }

    fn instance_by_tag_typed<T: ?Sized + 'static>(
        &self,
        tag: &Tag,
    ) -> Result<ServiceInstancePtr<T>, ServiceResolutionError> {
        self.instance_by_tag(TypeId::of::<T>(), tag)
            .and_then(|(instance, cast)| cast_instance(instance, cast))
    }

    fn instances_typed<T: ?Sized + 'static>(
        &self,
    ) -> Result<Vec<ServiceInstancePtr<T>>, ServiceResolutionError> {
        self.instances(TypeId::of::<T>())?
            .into_iter()
            .map(|(instance, cast)| cast_instance(instance, cast))
            .try_collect()
    }
}

/// [CastFunction] for concrete service types, for which no unsize coercion is
/// needed.
#[cfg(feature = "threadsafe")]
pub fn service_cast<T: Any + Send + Sync>(
    instance: ServiceInstanceAnyPtr,
) -> Result<Box<dyn Any>, ServiceInstanceAnyPtr> {
    instance.downcast::<T>().map(|p| Box::new(p) as Box<dyn Any>)
}

/// [CastFunction] for concrete service types, for which no unsize coercion is
/// needed.
#[cfg(not(feature = "threadsafe"))]
pub fn service_cast<T: Any>(
    instance: ServiceInstanceAnyPtr,
) -> Result<Box<dyn Any>, ServiceInstanceAnyPtr> {
    instance.downcast::<T>().map(|p| Box::new(p) as Box<dyn Any>)
}

fn cast_instance<T: ?Sized + 'static>(
    instance: ServiceInstanceAnyPtr,
    cast: CastFunction,
) -> Result<ServiceInstancePtr<T>, ServiceResolutionError> {
    cast(instance)
        .map_err(|_| ServiceResolutionError::IncompatibleServiceInstance(TypeId::of::<T>()))
        .and_then(|instance| {
            instance
                .downcast::<ServiceInstancePtr<T>>()
                .map(|p| *p)
                .map_err(|_| {
                    ServiceResolutionError::IncompatibleServiceInstance(TypeId::of::<T>())
                })
        })
}
