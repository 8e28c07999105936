use vc_schema::Value;
use vc_schema::registry::TypeRegistry;

// -----------------------------------------------------------------------------
// MappingArgs

/// The values visible to configured functions, conditions and callbacks.
///
/// `target` is the object being populated. It is `Null` while the target
/// has not been created yet (in `before_create` callbacks and while
/// constructor members are evaluated).
#[derive(Clone, Copy)]
pub struct MappingArgs<'a> {
    source: &'a Value,
    target: &'a Value,
    element_index: Option<usize>,
    registry: &'a TypeRegistry,
}

impl<'a> MappingArgs<'a> {
    pub(crate) fn new(
        source: &'a Value,
        target: &'a Value,
        element_index: Option<usize>,
        registry: &'a TypeRegistry,
    ) -> Self {
        Self {
            source,
            target,
            element_index,
            registry,
        }
    }

    #[inline]
    pub fn source(&self) -> &'a Value {
        self.source
    }

    #[inline]
    pub fn target(&self) -> &'a Value {
        self.target
    }

    /// The index of the collection element being mapped, if any.
    #[inline]
    pub fn element_index(&self) -> Option<usize> {
        self.element_index
    }

    #[inline]
    pub fn registry(&self) -> &'a TypeRegistry {
        self.registry
    }

    /// Reads a member of the source object, `Null` if the source is not an
    /// object or has no such member.
    pub fn source_member(&self, name: &str) -> Value {
        self.source
            .as_object()
            .and_then(|object| object.get_member(name))
            .unwrap_or_default()
    }
}
