use core::fmt;
use std::sync::{Arc, PoisonError, RwLock};

use crate::SchemaError;
use crate::info::{StructInfo, TypeId};
use crate::value::Value;

struct ObjectData {
    info: Arc<StructInfo>,
    slots: RwLock<Box<[Value]>>,
}

/// A shared instance of a registered struct.
///
/// Member values live in slots indexed by [`MemberInfo::slot`]. Cloning an
/// `ObjectRef` clones the handle, both handles observe the same instance.
///
/// Instances are created through [`TypeRegistry::instantiate`] or
/// [`TypeRegistry::new_object`].
///
/// [`MemberInfo::slot`]: crate::info::MemberInfo::slot
/// [`TypeRegistry::instantiate`]: crate::registry::TypeRegistry::instantiate
/// [`TypeRegistry::new_object`]: crate::registry::TypeRegistry::new_object
#[derive(Clone)]
pub struct ObjectRef(Arc<ObjectData>);

impl ObjectRef {
    pub(crate) fn new(info: Arc<StructInfo>, slots: Vec<Value>) -> Self {
        debug_assert_eq!(info.member_len(), slots.len());
        Self(Arc::new(ObjectData {
            info,
            slots: RwLock::new(slots.into_boxed_slice()),
        }))
    }

    /// Returns the struct information of the instance's runtime type.
    #[inline]
    pub fn info(&self) -> &Arc<StructInfo> {
        &self.0.info
    }

    /// Returns the runtime type of the instance.
    #[inline]
    pub fn type_id(&self) -> TypeId {
        self.0.info.ty().id()
    }

    /// Returns a clone of the value in `slot`, or `Null` if the slot does not exist.
    pub fn get(&self, slot: usize) -> Value {
        let slots = self.0.slots.read().unwrap_or_else(PoisonError::into_inner);
        slots.get(slot).cloned().unwrap_or_default()
    }

    /// Replaces the value in `slot`, returns `false` if the slot does not exist.
    pub fn set(&self, slot: usize, value: Value) -> bool {
        let mut slots = self.0.slots.write().unwrap_or_else(PoisonError::into_inner);
        match slots.get_mut(slot) {
            Some(current) => {
                *current = value;
                true
            }
            None => false,
        }
    }

    /// Returns the value of the named member (case-insensitive).
    pub fn get_member(&self, name: &str) -> Option<Value> {
        let slot = self.0.info.member(name)?.slot();
        Some(self.get(slot))
    }

    /// Replaces the value of the named member (case-insensitive).
    ///
    /// Member flags are not checked, this is the raw storage accessor used
    /// by constructors and by the mapper itself.
    pub fn set_member(&self, name: &str, value: Value) -> Result<(), SchemaError> {
        match self.0.info.member(name) {
            Some(member) => {
                self.set(member.slot(), value);
                Ok(())
            }
            None => Err(SchemaError::UnknownMember {
                path: self.0.info.ty().path_arc().clone(),
                member: name.into(),
            }),
        }
    }

    /// Returns clones of all slot values.
    pub fn snapshot(&self) -> Vec<Value> {
        let slots = self.0.slots.read().unwrap_or_else(PoisonError::into_inner);
        slots.to_vec()
    }

    #[inline]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    #[inline]
    pub fn address(&self) -> usize {
        Arc::as_ptr(&self.0) as usize
    }
}

impl fmt::Debug for ObjectRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Members are not printed, object graphs may be cyclic.
        write!(f, "{}@{:#x}", self.0.info.ty().path(), self.address())
    }
}
