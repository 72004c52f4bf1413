use crate::instance_provider::TagValue;
use std::any::TypeId;
use thiserror::Error;

/// Errors reported when resolving service instances. These are produced by
/// [ServiceInstanceProvider](crate::instance_provider::ServiceInstanceProvider)
/// implementations and propagated verbatim by lazy handles - no wrapping or
/// translation happens on the way to the caller.
#[derive(Error, Clone, Ord, PartialOrd, Eq, PartialEq, Hash, Debug)]
pub enum ServiceResolutionError {
    #[error("No matching binding found for service type: {0:?}")]
    NoBinding(TypeId),
    #[error("No binding named '{name}' found for service type: {type_id:?}")]
    NoNamedBinding { type_id: TypeId, name: String },
    #[error("No binding tagged '{key}' = {value} found for service type: {type_id:?}")]
    NoTaggedBinding {
        type_id: TypeId,
        key: String,
        value: TagValue,
    },
    #[error("Tried to downcast service instance to incompatible type: {0:?}")]
    IncompatibleServiceInstance(TypeId),
}
