//! Lazy dependency injection handles on top of an external DI container.
//!
//! Eager injection resolves every dependency when an object is constructed.
//! Sometimes that is undesirable - a dependency might be expensive, rarely
//! used, or part of a construction-time cycle. This crate provides handles
//! which defer resolution to the first read: a [Lazy](lazy::Lazy) field
//! resolves its service from the container when first accessed and, by
//! default, memoizes the result for later reads. Explicitly written values
//! always take precedence over resolution, and with caching disabled every
//! read reflects the container's current binding state.
//!
//! The container itself is an external collaborator reached through the
//! [ServiceInstanceProvider](instance_provider::ServiceInstanceProvider)
//! contract - this crate neither stores bindings nor manages scopes, and
//! resolution errors pass through handles unmodified.
//!
//! ```
//! use lazy_di::error::ServiceResolutionError;
//! use lazy_di::injector::LazyInjector;
//! use lazy_di::instance_provider::{
//!     service_cast, CastFunction, ServiceInstanceAnyPtr, ServiceInstancePtr,
//!     ServiceInstanceProvider, Tag,
//! };
//! use std::any::TypeId;
//! use std::sync::Arc;
//!
//! struct Clock;
//!
//! struct SingleServiceContainer;
//!
//! impl ServiceInstanceProvider for SingleServiceContainer {
//!     fn primary_instance(
//!         &self,
//!         type_id: TypeId,
//!     ) -> Result<(ServiceInstanceAnyPtr, CastFunction), ServiceResolutionError> {
//!         if type_id == TypeId::of::<Clock>() {
//!             Ok((
//!                 ServiceInstancePtr::new(Clock) as ServiceInstanceAnyPtr,
//!                 service_cast::<Clock> as CastFunction,
//!             ))
//!         } else {
//!             Err(ServiceResolutionError::NoBinding(type_id))
//!         }
//!     }
//!
//!     fn instance_by_name(
//!         &self,
//!         type_id: TypeId,
//!         name: &str,
//!     ) -> Result<(ServiceInstanceAnyPtr, CastFunction), ServiceResolutionError> {
//!         Err(ServiceResolutionError::NoNamedBinding {
//!             type_id,
//!             name: name.to_string(),
//!         })
//!     }
//!
//!     fn instance_by_tag(
//!         &self,
//!         type_id: TypeId,
//!         tag: &Tag,
//!     ) -> Result<(ServiceInstanceAnyPtr, CastFunction), ServiceResolutionError> {
//!         Err(ServiceResolutionError::NoTaggedBinding {
//!             type_id,
//!             key: tag.key.clone(),
//!             value: tag.value.clone(),
//!         })
//!     }
//!
//!     fn instances(
//!         &self,
//!         type_id: TypeId,
//!     ) -> Result<Vec<(ServiceInstanceAnyPtr, CastFunction)>, ServiceResolutionError> {
//!         self.primary_instance(type_id).map(|instance| vec![instance])
//!     }
//! }
//!
//! struct Scheduler {
//!     clock: lazy_di::lazy::Lazy<Clock>,
//! }
//!
//! let injector = LazyInjector::new(Arc::new(SingleServiceContainer));
//! let scheduler = Scheduler {
//!     clock: injector.inject(),
//! };
//!
//! // nothing resolved yet - the first read resolves and caches the instance
//! assert!(scheduler.clock.get().is_ok());
//! ```
//!
//! ### Features
//!
//! * `threadsafe` - use threadsafe pointers and `Send + Sync` trait bounds

pub mod error;
pub mod injector;
pub mod instance_provider;
pub mod lazy;

pub use error::ServiceResolutionError;
pub use injector::LazyInjector;
pub use lazy::{Lazy, LazyAll};
