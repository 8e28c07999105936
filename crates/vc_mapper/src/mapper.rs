use core::fmt;
use std::sync::Arc;

use log::trace;
use vc_schema::info::TypeId;
use vc_schema::registry::TypeRegistry;
use vc_schema::{Mappable, SchemaError, Value};

use crate::cache::PlanCache;
use crate::config::MapperConfig;
use crate::exec::ExecutionContext;
use crate::member::MemberModel;
use crate::plan::builder::PlanCompiler;
use crate::plan::{MapperKey, MappingPlan};
use crate::{ConfigurationError, MappingError, RuleSet};

// -----------------------------------------------------------------------------
// Mapper

/// Maps values between the types of a [`TypeRegistry`].
///
/// A mapper owns its configuration and its caches: the members of every
/// type and the plans compiled so far. It is cheap to clone and every clone
/// shares the same caches.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
///
/// use vc_mapper::Mapper;
/// use vc_mapper::config::MapperConfig;
/// use vc_schema::Value;
/// use vc_schema::info::TypeId;
/// use vc_schema::registry::{StructBuilder, TypeRegistry};
///
/// let mut registry = TypeRegistry::new();
/// let order = registry
///     .register_struct(StructBuilder::new("shop::Order").member("Id", TypeId::I32).member("Total", TypeId::F64))
///     .unwrap();
/// let dto = registry
///     .register_struct(StructBuilder::new("shop::OrderDto").member("Id", TypeId::STRING).member("Total", TypeId::F64))
///     .unwrap();
/// let source = registry.new_object(order, [("Id", Value::from(7)), ("Total", Value::from(9.5))]).unwrap();
///
/// let mapper = Mapper::new(Arc::new(registry), MapperConfig::new()).unwrap();
/// let mapped = mapper.map(&Value::Object(source)).to_new(dto).unwrap();
///
/// let mapped = mapped.as_object().unwrap();
/// assert_eq!(mapped.get_member("Id"), Some(Value::from("7")));
/// assert_eq!(mapped.get_member("Total"), Some(Value::from(9.5)));
/// ```
#[derive(Clone)]
pub struct Mapper {
    inner: Arc<MapperInner>,
}

pub(crate) struct MapperInner {
    pub(crate) registry: Arc<TypeRegistry>,
    pub(crate) config: MapperConfig,
    pub(crate) members: MemberModel,
    pub(crate) plans: PlanCache,
}

impl Mapper {
    /// Creates a mapper.
    ///
    /// Reversible data sources are expanded here, a source that cannot be
    /// reversed is reported as [`ConfigurationError::NotReversible`].
    pub fn new(registry: Arc<TypeRegistry>, config: MapperConfig) -> Result<Self, ConfigurationError> {
        let config = config.finalize(&registry)?;
        Ok(Self {
            inner: Arc::new(MapperInner {
                members: MemberModel::new(registry.clone()),
                registry,
                config,
                plans: PlanCache::default(),
            }),
        })
    }

    #[inline]
    pub fn registry(&self) -> &Arc<TypeRegistry> {
        &self.inner.registry
    }

    #[inline]
    pub fn config(&self) -> &MapperConfig {
        &self.inner.config
    }

    #[inline]
    pub fn members(&self) -> &MemberModel {
        &self.inner.members
    }

    #[cfg(test)]
    #[inline]
    pub(crate) fn inner(&self) -> &MapperInner {
        &self.inner
    }

    // -------------------------------------------------------------------------
    // Entry points

    /// Starts mapping a value, the target is chosen on the returned request.
    pub fn map<'a>(&'a self, source: &'a Value) -> MappingRequest<'a> {
        MappingRequest { mapper: self, source }
    }

    /// Starts mapping a Rust value.
    pub fn map_from<'a, T: Mappable>(&'a self, source: &'a T) -> TypedMappingRequest<'a, T> {
        TypedMappingRequest { mapper: self, source }
    }

    /// Compiles the plan of a type pair and every plan it calls.
    ///
    /// Configuration errors are otherwise raised by the first mapping
    /// between the types.
    pub fn prebuild(&self, source: TypeId, target: TypeId, rule_set: RuleSet) -> Result<(), ConfigurationError> {
        self.plan(source, target, rule_set).map(|_| ())
    }

    /// Returns the compiled plan of a type pair, compiling it when needed.
    pub fn plan(&self, source: TypeId, target: TypeId, rule_set: RuleSet) -> Result<Arc<MappingPlan>, ConfigurationError> {
        self.inner.plan_for(&MapperKey::new(source, target, rule_set))
    }

    /// Number of plan keys cached so far.
    pub fn cached_plans(&self) -> usize {
        self.inner.plans.len()
    }

    fn execute(&self, source: &Value, target: TypeId, rule_set: RuleSet, existing: &Value) -> Result<Value, MappingError> {
        let Some(runtime) = source.runtime_type() else {
            return Ok(existing.clone());
        };
        let plan = self.inner.plan_for(&MapperKey::new(runtime, target, rule_set))?;
        let mapped = ExecutionContext::new(&self.inner).run(&plan, source, existing, None)?;
        Ok(mapped)
    }

    fn execute_onto(&self, source: &Value, existing: &Value, rule_set: RuleSet) -> Result<Value, MappingError> {
        let Some(target) = existing.runtime_type() else {
            return Err(SchemaError::Mismatch {
                expected: "target".into(),
                found: existing.kind_name(),
            }
            .into());
        };
        self.execute(source, target, rule_set, existing)
    }
}

impl fmt::Debug for Mapper {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Mapper")
            .field("types", &self.inner.registry.len())
            .field("cached_plans", &self.inner.plans.len())
            .finish_non_exhaustive()
    }
}

// -----------------------------------------------------------------------------
// MapperInner

impl MapperInner {
    /// The plan of `key`, compiled with the plans it calls on a cache miss.
    pub(crate) fn plan_for(&self, key: &MapperKey) -> Result<Arc<MappingPlan>, ConfigurationError> {
        if let Some(plan) = self.plans.get(key, None) {
            trace!("plan cache hit for {key}");
            return Ok(plan);
        }
        PlanCompiler::compile(self, key)
    }

    /// The plan of a call whose declared source type does not decide the plan.
    ///
    /// The plan of the runtime source type is cached under `declared` too,
    /// discriminated by `runtime`.
    pub(crate) fn plan_for_runtime(
        &self,
        declared: &MapperKey,
        runtime: TypeId,
    ) -> Result<Arc<MappingPlan>, ConfigurationError> {
        if let Some(plan) = self.plans.get(declared, Some(runtime)) {
            trace!("plan cache hit for {declared} with source `{}`", self.registry.path_of(runtime));
            return Ok(plan);
        }
        let plan = self.plan_for(&declared.with_source(runtime))?;
        Ok(self.plans.publish(declared.clone(), Some(runtime), plan))
    }
}

// -----------------------------------------------------------------------------
// MappingRequest

/// A pending mapping of a [`Value`], see [`Mapper::map`].
#[derive(Debug, Clone, Copy)]
pub struct MappingRequest<'a> {
    mapper: &'a Mapper,
    source: &'a Value,
}

impl MappingRequest<'_> {
    /// Creates a new instance of `target`.
    ///
    /// A `Null` source maps to `Null`.
    pub fn to_new(self, target: TypeId) -> Result<Value, MappingError> {
        self.mapper.execute(self.source, target, RuleSet::CreateNew, &Value::Null)
    }

    /// Merges the source onto `target`: only the members that are `Null`
    /// or default are written.
    pub fn on_to(self, target: &Value) -> Result<Value, MappingError> {
        self.mapper.execute_onto(self.source, target, RuleSet::Merge)
    }

    /// Overwrites every member of `target` that has a source.
    pub fn over(self, target: &Value) -> Result<Value, MappingError> {
        self.mapper.execute_onto(self.source, target, RuleSet::Overwrite)
    }
}

// -----------------------------------------------------------------------------
// TypedMappingRequest

/// A pending mapping of a Rust value, see [`Mapper::map_from`].
pub struct TypedMappingRequest<'a, T> {
    mapper: &'a Mapper,
    source: &'a T,
}

impl<T: Mappable> TypedMappingRequest<'_, T> {
    fn source(&self) -> Result<Value, MappingError> {
        Ok(self.source.to_value(self.mapper.registry())?)
    }

    pub fn to_new<U: Mappable>(self) -> Result<U, MappingError> {
        let registry = self.mapper.registry();
        let target = U::type_id(registry)?;
        let mapped = self.mapper.execute(&self.source()?, target, RuleSet::CreateNew, &Value::Null)?;
        Ok(U::from_value(&mapped)?)
    }

    /// Merges the source onto `target`, see [`MappingRequest::on_to`].
    pub fn on_to<U: Mappable>(self, target: &mut U) -> Result<(), MappingError> {
        self.onto(target, RuleSet::Merge)
    }

    /// Overwrites `target`, see [`MappingRequest::over`].
    pub fn over<U: Mappable>(self, target: &mut U) -> Result<(), MappingError> {
        self.onto(target, RuleSet::Overwrite)
    }

    fn onto<U: Mappable>(self, target: &mut U, rule_set: RuleSet) -> Result<(), MappingError> {
        let existing = target.to_value(self.mapper.registry())?;
        let mapped = self.mapper.execute_onto(&self.source()?, &existing, rule_set)?;
        *target = U::from_value(&mapped)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use vc_schema::Value;
    use vc_schema::info::TypeId;
    use vc_schema::registry::{StructBuilder, TypeRegistry};

    use super::Mapper;
    use crate::config::MapperConfig;
    use crate::{MappingError, RuleSet};

    fn mapper() -> (Mapper, TypeId, TypeId) {
        let mut registry = TypeRegistry::new();
        let person = registry
            .register_struct(StructBuilder::new("app::Person").member("Name", TypeId::STRING))
            .unwrap();
        let dto = registry
            .register_struct(StructBuilder::new("app::PersonDto").member("Name", TypeId::STRING))
            .unwrap();
        (Mapper::new(Arc::new(registry), MapperConfig::new()).unwrap(), person, dto)
    }

    #[test]
    fn plans_are_cached() {
        let (mapper, person, dto) = mapper();
        assert_eq!(mapper.cached_plans(), 0);

        let first = mapper.plan(person, dto, RuleSet::CreateNew).unwrap();
        let second = mapper.clone().plan(person, dto, RuleSet::CreateNew).unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert!(mapper.cached_plans() >= 1);
    }

    #[test]
    fn null_source() {
        let (mapper, _, dto) = mapper();
        assert_eq!(mapper.map(&Value::Null).to_new(dto).unwrap(), Value::Null);
    }

    #[test]
    fn onto_requires_target() {
        let (mapper, person, _) = mapper();
        let source = mapper.registry().new_object(person, []).unwrap();
        let error = mapper.map(&Value::Object(source)).on_to(&Value::Null).unwrap_err();
        assert!(matches!(error, MappingError::Schema(_)));
    }
}
