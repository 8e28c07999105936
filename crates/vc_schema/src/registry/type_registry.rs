use std::sync::Arc;

use log::debug;

use crate::SchemaError;
use crate::hash::{HashMap, HashSet};
use crate::info::{DictionaryInfo, EnumInfo, ListInfo, MemberInfo, OptionalInfo};
use crate::info::{PrimitiveInfo, PrimitiveKind, StructInfo, Type, TypeId, TypeInfo, TypeKind};
use crate::registry::StructBuilder;
use crate::value::{DictionaryRef, EnumValue, ListRef, ObjectRef, Value};

// -----------------------------------------------------------------------------
// Entry

// A reserved type has an identity but no information yet.
struct Entry {
    ty: Type,
    info: Option<TypeInfo>,
}

// -----------------------------------------------------------------------------
// TypeRegistry

/// A registry of type descriptors.
///
/// Types are identified by dense [`TypeId`]s assigned in registration order
/// and by their unique path. The short name is also indexed, a name shared by
/// several paths is marked ambiguous and cannot be used for lookup.
///
/// The registry is built once and then shared (usually as `Arc<TypeRegistry>`),
/// all queries take `&self`.
///
/// # Recursive types
///
/// A type may refer to itself through its members. [`reserve`](Self::reserve)
/// assigns the id before the members are described, so nested references
/// resolve to the reserved id.
///
/// # Examples
///
/// ```
/// use vc_schema::info::{TypeId, TypeKind};
/// use vc_schema::registry::{StructBuilder, TypeRegistry};
///
/// let mut registry = TypeRegistry::new();
///
/// let node = registry.reserve("graph::Node");
/// let children = registry.list_of(node).unwrap();
/// registry
///     .register_struct(
///         StructBuilder::new("graph::Node")
///             .member("Name", TypeId::STRING)
///             .member("Children", children),
///     )
///     .unwrap();
///
/// assert_eq!(registry.kind_of(children), TypeKind::Enumerable);
/// assert_eq!(registry.get_by_name("Node").unwrap().id(), node);
/// ```
pub struct TypeRegistry {
    entries: Vec<Entry>,
    paths: HashMap<Arc<str>, TypeId>,
    names: HashMap<Arc<str>, TypeId>,
    ambiguous_names: HashSet<Arc<str>>,
    // direct subtypes, in registration order
    subtypes: HashMap<TypeId, Vec<TypeId>>,
    lists: HashMap<TypeId, TypeId>,
    dictionaries: HashMap<TypeId, TypeId>,
    optionals: HashMap<TypeId, TypeId>,
}

impl Default for TypeRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl TypeRegistry {
    /// Creates a registry containing `Any` and the primitive types.
    pub fn new() -> Self {
        let mut registry = Self {
            entries: Vec::new(),
            paths: HashMap::default(),
            names: HashMap::default(),
            ambiguous_names: HashSet::default(),
            subtypes: HashMap::default(),
            lists: HashMap::default(),
            dictionaries: HashMap::default(),
            optionals: HashMap::default(),
        };

        let any = registry.reserve("Any");
        debug_assert_eq!(any, TypeId::ANY);
        let entry = &mut registry.entries[any.index()];
        entry.info = Some(TypeInfo::Any(entry.ty.clone()));

        for kind in PrimitiveKind::ALL {
            let id = registry.reserve(kind.path());
            debug_assert_eq!(id, kind.type_id());
            registry.entries[id.index()].info = Some(TypeInfo::Primitive(PrimitiveInfo::new(kind)));
        }

        registry
    }

    // -------------------------------------------------------------------------
    // Lookup

    /// Returns the number of known types, reserved ones included.
    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns the information of a registered type.
    ///
    /// Reserved types without information yet return `None`.
    #[inline]
    pub fn get(&self, id: TypeId) -> Option<&TypeInfo> {
        self.entries.get(id.index())?.info.as_ref()
    }

    /// Returns the identity of a registered or reserved type.
    #[inline]
    pub fn get_type(&self, id: TypeId) -> Option<&Type> {
        self.entries.get(id.index()).map(|entry| &entry.ty)
    }

    /// Returns the path of a type, or `"<unknown>"`.
    pub fn path_of(&self, id: TypeId) -> &str {
        self.get_type(id).map_or("<unknown>", Type::path)
    }

    /// Returns the short name of a type, or `"<unknown>"`.
    pub fn name_of(&self, id: TypeId) -> &str {
        self.get_type(id).map_or("<unknown>", Type::name)
    }

    /// Returns the id registered (or reserved) under `path`.
    #[inline]
    pub fn id_of(&self, path: &str) -> Option<TypeId> {
        self.paths.get(path).copied()
    }

    /// Returns `true` if `id` has registered information.
    #[inline]
    pub fn contains(&self, id: TypeId) -> bool {
        self.get(id).is_some()
    }

    pub fn get_by_path(&self, path: &str) -> Option<&TypeInfo> {
        self.get(self.id_of(path)?)
    }

    /// Returns the type with the given short name, `None` if unknown or ambiguous.
    pub fn get_by_name(&self, name: &str) -> Option<&TypeInfo> {
        self.get(*self.names.get(name)?)
    }

    /// Returns `true` if several types share the short name.
    #[inline]
    pub fn is_ambiguous(&self, name: &str) -> bool {
        self.ambiguous_names.contains(name)
    }

    #[inline]
    pub fn get_struct(&self, id: TypeId) -> Option<&Arc<StructInfo>> {
        self.get(id)?.as_struct()
    }

    /// Iterates over all registered types in id order.
    pub fn iter(&self) -> impl Iterator<Item = &TypeInfo> {
        self.entries.iter().filter_map(|entry| entry.info.as_ref())
    }

    // -------------------------------------------------------------------------
    // Registration

    /// Assigns an id to `path` without describing the type.
    ///
    /// Returns the existing id if the path is already reserved or registered.
    pub fn reserve(&mut self, path: impl Into<Arc<str>>) -> TypeId {
        let path: Arc<str> = path.into();
        if let Some(&id) = self.paths.get(&path) {
            return id;
        }

        let id = TypeId::from_index(self.entries.len());
        let ty = Type::new(id, path.clone());
        let name: Arc<str> = Arc::from(ty.name());

        self.paths.insert(path, id);
        if !self.ambiguous_names.contains(&name) {
            if self.names.contains_key(&name) {
                // Keep the name unusable for every later type too.
                self.names.remove(&name);
                self.ambiguous_names.insert(name);
            } else {
                self.names.insert(name, id);
            }
        }
        self.entries.push(Entry { ty, info: None });
        id
    }

    // Fills the information of a reserved (or new) path.
    fn insert(
        &mut self,
        path: Arc<str>,
        make: impl FnOnce(Type) -> TypeInfo,
    ) -> Result<TypeId, SchemaError> {
        let id = self.reserve(path.clone());
        let entry = &mut self.entries[id.index()];
        if entry.info.is_some() {
            return Err(SchemaError::AlreadyRegistered(path));
        }
        entry.info = Some(make(entry.ty.clone()));
        debug!("registered type `{path}` as {id}");
        Ok(id)
    }

    /// Registers a struct.
    ///
    /// # Errors
    ///
    /// - [`SchemaError::AlreadyRegistered`] if the path already has information.
    /// - [`SchemaError::InvalidBase`] if the base is not a registered struct.
    /// - [`SchemaError::UnknownType`] if a member type is unknown.
    /// - [`SchemaError::DuplicateMember`] if a member name (ignoring case)
    ///   appears twice in the hierarchy.
    pub fn register_struct(&mut self, builder: StructBuilder) -> Result<TypeId, SchemaError> {
        let StructBuilder {
            path,
            base,
            is_abstract,
            members: declared,
        } = builder;

        if let Some(id) = self.id_of(&path)
            && self.contains(id)
        {
            return Err(SchemaError::AlreadyRegistered(path));
        }

        let mut members: Vec<MemberInfo> = match base {
            Some(base) => match self.get_struct(base) {
                Some(info) => info.members().to_vec(),
                None => {
                    return Err(SchemaError::InvalidBase {
                        path,
                        base: Arc::from(self.path_of(base)),
                    });
                }
            },
            None => Vec::new(),
        };

        let mut seen: HashSet<String> = members
            .iter()
            .map(|member| member.name().to_ascii_lowercase())
            .collect();
        for decl in &declared {
            if decl.ty.index() >= self.entries.len() {
                return Err(SchemaError::UnknownType(decl.ty));
            }
            if !seen.insert(decl.name.to_ascii_lowercase()) {
                return Err(SchemaError::DuplicateMember {
                    path,
                    member: decl.name.clone(),
                });
            }
        }

        let id = self.reserve(path.clone());
        for decl in declared {
            let slot = members.len();
            members.push(MemberInfo::new(decl.name, decl.ty, slot, id, decl.flags));
        }

        let id = self.insert(path, |ty| {
            TypeInfo::Struct(Arc::new(StructInfo::new(ty, base, is_abstract, members)))
        })?;
        if let Some(base) = base {
            self.subtypes.entry(base).or_default().push(id);
        }
        Ok(id)
    }

    /// Registers a fieldless enum with variants in declaration order.
    pub fn register_enum<I, S>(&mut self, path: impl Into<Arc<str>>, variants: I) -> Result<TypeId, SchemaError>
    where
        I: IntoIterator<Item = S>,
        S: Into<Arc<str>>,
    {
        let variants: Box<[Arc<str>]> = variants.into_iter().map(Into::into).collect();
        self.insert(path.into(), |ty| TypeInfo::Enum(EnumInfo::new(ty, variants)))
    }

    /// Returns the list type with the given element type, registering it on first use.
    pub fn list_of(&mut self, element: TypeId) -> Result<TypeId, SchemaError> {
        if let Some(&id) = self.lists.get(&element) {
            return Ok(id);
        }
        let path = format!("Vec<{}>", self.known_path(element)?);
        let id = self.insert(path.into(), |ty| TypeInfo::List(ListInfo::new(ty, element)))?;
        self.lists.insert(element, id);
        Ok(id)
    }

    /// Returns the dictionary type with the given value type, registering it on first use.
    pub fn dictionary_of(&mut self, value: TypeId) -> Result<TypeId, SchemaError> {
        if let Some(&id) = self.dictionaries.get(&value) {
            return Ok(id);
        }
        let path = format!("Map<String, {}>", self.known_path(value)?);
        let id = self.insert(path.into(), |ty| {
            TypeInfo::Dictionary(DictionaryInfo::new(ty, value))
        })?;
        self.dictionaries.insert(value, id);
        Ok(id)
    }

    /// Returns the optional type wrapping `inner`, registering it on first use.
    ///
    /// Optional types do not nest: wrapping an optional type returns it unchanged.
    pub fn optional_of(&mut self, inner: TypeId) -> Result<TypeId, SchemaError> {
        if let Some(&id) = self.optionals.get(&inner) {
            return Ok(id);
        }
        if let Some(TypeInfo::Optional(_)) = self.get(inner) {
            return Ok(inner);
        }
        let path = format!("Option<{}>", self.known_path(inner)?);
        let id = self.insert(path.into(), |ty| TypeInfo::Optional(OptionalInfo::new(ty, inner)))?;
        self.optionals.insert(inner, id);
        Ok(id)
    }

    /// Returns the list type with the given element type, if already registered.
    #[inline]
    pub fn find_list(&self, element: TypeId) -> Option<TypeId> {
        self.lists.get(&element).copied()
    }

    /// Returns the dictionary type with the given value type, if already registered.
    #[inline]
    pub fn find_dictionary(&self, value: TypeId) -> Option<TypeId> {
        self.dictionaries.get(&value).copied()
    }

    /// Returns the optional type wrapping `inner`, if already registered.
    pub fn find_optional(&self, inner: TypeId) -> Option<TypeId> {
        match self.get(inner) {
            Some(TypeInfo::Optional(_)) => Some(inner),
            _ => self.optionals.get(&inner).copied(),
        }
    }

    fn known_path(&self, id: TypeId) -> Result<Arc<str>, SchemaError> {
        self.get_type(id)
            .map(|ty| ty.path_arc().clone())
            .ok_or(SchemaError::UnknownType(id))
    }

    // -------------------------------------------------------------------------
    // Classification

    /// Strips an optional wrapper, other types are returned unchanged.
    pub fn non_optional(&self, id: TypeId) -> TypeId {
        match self.get(id) {
            Some(TypeInfo::Optional(info)) => info.inner(),
            _ => id,
        }
    }

    /// Returns the mapping classification of a type.
    ///
    /// Optional types classify as their inner type, unknown types as `Complex`.
    pub fn kind_of(&self, id: TypeId) -> TypeKind {
        match self.get(self.non_optional(id)) {
            Some(TypeInfo::Primitive(_) | TypeInfo::Enum(_)) => TypeKind::Simple,
            Some(TypeInfo::List(_)) => TypeKind::Enumerable,
            Some(TypeInfo::Dictionary(_)) => TypeKind::Dictionary,
            _ => TypeKind::Complex,
        }
    }

    /// Returns `true` if a value of the type may be `Null`.
    pub fn is_nullable(&self, id: TypeId) -> bool {
        self.get(id).is_none_or(TypeInfo::is_nullable)
    }

    /// Returns the element type of a list (looking through an optional wrapper).
    pub fn element_of(&self, id: TypeId) -> Option<TypeId> {
        Some(self.get(self.non_optional(id))?.as_list()?.element())
    }

    /// Returns the value type of a dictionary (looking through an optional wrapper).
    pub fn dictionary_value_of(&self, id: TypeId) -> Option<TypeId> {
        Some(self.get(self.non_optional(id))?.as_dictionary()?.value())
    }

    /// Returns `true` if `id` is an abstract struct.
    pub fn is_abstract(&self, id: TypeId) -> bool {
        self.get_struct(id).is_some_and(|info| info.is_abstract())
    }

    // -------------------------------------------------------------------------
    // Hierarchy

    /// Returns `true` if `sub` is `base` or derives from it.
    pub fn is_subtype_of(&self, sub: TypeId, base: TypeId) -> bool {
        let mut current = Some(sub);
        while let Some(id) = current {
            if id == base {
                return true;
            }
            current = self.get_struct(id).and_then(|info| info.base());
        }
        false
    }

    /// Returns `true` if a value whose type is `from` may be stored in a slot of type `to`.
    ///
    /// This covers identity, `Any`, optional wrapping and struct subtyping.
    pub fn is_assignable(&self, from: TypeId, to: TypeId) -> bool {
        if from == to || to == TypeId::ANY {
            return true;
        }
        let from = self.non_optional(from);
        let to = self.non_optional(to);
        from == to || self.is_subtype_of(from, to)
    }

    /// Returns the direct subtypes of `base` in registration order.
    pub fn direct_subtypes_of(&self, base: TypeId) -> &[TypeId] {
        self.subtypes.get(&base).map_or(&[], Vec::as_slice)
    }

    /// Returns every type deriving from `base`, breadth first.
    pub fn subtypes_of(&self, base: TypeId) -> Vec<TypeId> {
        let mut result: Vec<TypeId> = self.direct_subtypes_of(base).to_vec();
        let mut index = 0;
        while index < result.len() {
            let children = self.direct_subtypes_of(result[index]);
            result.extend_from_slice(children);
            index += 1;
        }
        result
    }

    /// Returns the number of base types above `id`.
    pub fn depth(&self, id: TypeId) -> usize {
        let mut depth = 0;
        let mut current = self.get_struct(id).and_then(|info| info.base());
        while let Some(base) = current {
            depth += 1;
            current = self.get_struct(base).and_then(|info| info.base());
        }
        depth
    }

    // -------------------------------------------------------------------------
    // Instances

    /// Returns the value held by a fresh slot of the given type.
    ///
    /// Primitives and enums have a non-null default (`0`, `false`, `""`, the
    /// first variant), every nullable type defaults to `Null`.
    pub fn default_value(&self, id: TypeId) -> Value {
        match self.get(id) {
            Some(TypeInfo::Primitive(info)) => match info.kind() {
                PrimitiveKind::Bool => Value::Bool(false),
                PrimitiveKind::Char => Value::Char('\0'),
                PrimitiveKind::F32 | PrimitiveKind::F64 => Value::Float(0.0),
                PrimitiveKind::String => Value::String(Arc::from("")),
                kind if kind.is_unsigned() => Value::UInt(0),
                _ => Value::Int(0),
            },
            Some(TypeInfo::Enum(_)) => Value::Enum(EnumValue { ty: id, index: 0 }),
            _ => Value::Null,
        }
    }

    /// Creates an instance of a struct with every member at its default.
    ///
    /// # Errors
    ///
    /// - [`SchemaError::UnknownType`] if `id` is not a registered struct.
    /// - [`SchemaError::AbstractType`] if the struct is abstract.
    pub fn instantiate(&self, id: TypeId) -> Result<ObjectRef, SchemaError> {
        let info = self.get_struct(id).ok_or(SchemaError::UnknownType(id))?;
        if info.is_abstract() {
            return Err(SchemaError::AbstractType(info.ty().path_arc().clone()));
        }
        let slots = info
            .members()
            .iter()
            .map(|member| self.default_value(member.ty()))
            .collect();
        Ok(ObjectRef::new(info.clone(), slots))
    }

    /// Creates an instance of a struct and sets the given members.
    ///
    /// ```
    /// use vc_schema::Value;
    /// use vc_schema::info::TypeId;
    /// use vc_schema::registry::{StructBuilder, TypeRegistry};
    ///
    /// let mut registry = TypeRegistry::new();
    /// let id = registry
    ///     .register_struct(StructBuilder::new("geo::Point").member("X", TypeId::I32).member("Y", TypeId::I32))
    ///     .unwrap();
    ///
    /// let point = registry.new_object(id, [("X", Value::from(3)), ("Y", Value::from(4))]).unwrap();
    /// assert_eq!(point.get_member("y"), Some(Value::Int(4)));
    /// ```
    pub fn new_object<'a>(
        &self,
        id: TypeId,
        members: impl IntoIterator<Item = (&'a str, Value)>,
    ) -> Result<ObjectRef, SchemaError> {
        let object = self.instantiate(id)?;
        for (name, value) in members {
            object.set_member(name, value)?;
        }
        Ok(object)
    }

    /// Creates an empty list or dictionary of the given collection type.
    pub fn empty_collection(&self, id: TypeId) -> Option<Value> {
        let id = self.non_optional(id);
        match self.get(id)? {
            TypeInfo::List(_) => Some(Value::List(ListRef::new(id, Vec::new()))),
            TypeInfo::Dictionary(_) => Some(Value::Dictionary(DictionaryRef::new(id))),
            _ => None,
        }
    }

    // -------------------------------------------------------------------------
    // Auto registration

    /// Registers every type annotated with `#[mappable(auto_register)]`.
    ///
    /// Registration of a type also registers the types of its members.
    /// Types already present are skipped, so the call may be repeated.
    ///
    /// Returns the errors of types which could not be registered.
    ///
    /// This method requires the `auto_register` feature. When disabled, it
    /// does nothing.
    pub fn auto_register(&mut self) -> Vec<SchemaError> {
        #[cfg(feature = "auto_register")]
        {
            crate::__macro_exports::auto_register::register_types(self)
        }
        #[cfg(not(feature = "auto_register"))]
        {
            Vec::new()
        }
    }
}
