//! Items used by the code generated by `#[derive(Mappable)]`.
//!
//! Not public API.

use crate::SchemaError;
use crate::registry::TypeRegistry;
use crate::value::ObjectRef;

pub use crate::mappable::mismatch;

/// Reads and writes the members of a derived struct on an existing object.
///
/// Implemented by the derive for every struct, so that a derived struct can
/// inherit the members of the struct held in its `#[mappable(base)]` field.
pub trait StructMembers: Sized {
    fn write_members(&self, registry: &TypeRegistry, object: &ObjectRef) -> Result<(), SchemaError>;

    fn read_members(object: &ObjectRef) -> Result<Self, SchemaError>;
}

/// Static registration through `inventory`.
#[cfg(feature = "auto_register")]
pub mod auto_register {
    use log::warn;

    use crate::SchemaError;
    use crate::info::TypeId;
    use crate::registry::TypeRegistry;

    pub use inventory;

    /// A registration function submitted by `#[mappable(auto_register)]`.
    pub struct AutoRegisterFunc(pub fn(&mut TypeRegistry) -> Result<TypeId, SchemaError>);

    inventory::collect!(AutoRegisterFunc);

    pub(crate) fn register_types(registry: &mut TypeRegistry) -> Vec<SchemaError> {
        let mut errors = Vec::new();
        for func in inventory::iter::<AutoRegisterFunc> {
            if let Err(error) = (func.0)(registry) {
                warn!("automatic registration failed: {error}");
                errors.push(error);
            }
        }
        errors
    }
}
