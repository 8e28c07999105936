//! Mapping configuration.
//!
//! The mapper finds member values by itself, the configuration refines its
//! choices for the mappings of a [`MappingScope`].
//!
//! ## Menu
//!
//! - [`MapperConfig`]: every configuration item, handed to [`Mapper::new`].
//! - [`ConfiguredDataSource`]: a value source for a target member, or for the whole target.
//! - [`Ignore`]: removes target members from plans.
//! - [`DerivedTypePair`]: redirects a derived source type to a derived target type.
//! - [`SettingsOverride`]: changes the [`Settings`] of the plans in a scope.
//! - [`NamingSettings`]: how names and dictionary keys are compared and built.
//! - [`MappingArgs`]: the values passed to configured functions and callbacks.
//!
//! [`Mapper::new`]: crate::Mapper::new

use std::sync::Arc;

use log::debug;
use vc_schema::info::{MemberInfo, TypeId};
use vc_schema::registry::TypeRegistry;

use crate::{BoxError, ConfigurationError, MappingExecutionError, RuleSet};

// -----------------------------------------------------------------------------
// Modules

mod args;
mod callbacks;
mod data_source;
mod derived;
mod ignore;
mod naming;
mod scope;
mod settings;

// -----------------------------------------------------------------------------
// Exports

pub use args::MappingArgs;
pub use callbacks::{CreationCallback, ErrorCallback, Scoped};
pub use data_source::{ConditionFn, ConfiguredDataSource, ConfiguredTarget, ConfiguredValue, ValueFn};
pub use derived::DerivedTypePair;
pub use ignore::{Ignore, IgnoreRule, MemberFilter};
pub use naming::{AlternateNameFn, NamingSettings};
pub(crate) use naming::{strip_prefix_ignore_case, strip_suffix_ignore_case};
pub use scope::MappingScope;
pub use settings::{Settings, SettingsOverride};

// -----------------------------------------------------------------------------
// MapperConfig

/// The configuration of a [`Mapper`](crate::Mapper).
///
/// Items are kept in registration order. When several items of the same
/// kind apply to a mapping, the one with the more specific scope wins, ties
/// go to the item registered first.
///
/// # Examples
///
/// ```
/// use vc_mapper::config::{ConfiguredDataSource, ConfiguredValue, Ignore};
/// use vc_mapper::config::{MapperConfig, MappingScope, SettingsOverride};
///
/// let mut config = MapperConfig::new();
/// config
///     .add_data_source(ConfiguredDataSource::new(
///         MappingScope::ALL,
///         ConfiguredValue::constant("n/a"),
///         "Comment",
///     ))
///     .ignore(Ignore::member(MappingScope::ALL, "Password"))
///     .override_settings(MappingScope::ALL, SettingsOverride::default().swallow_errors(true));
///
/// assert_eq!(config.data_sources().len(), 1);
/// ```
#[derive(Clone, Default)]
pub struct MapperConfig {
    naming: NamingSettings,
    settings: Vec<Scoped<SettingsOverride>>,
    data_sources: Vec<ConfiguredDataSource>,
    ignores: Vec<Ignore>,
    derived_pairs: Vec<DerivedTypePair>,
    identifiers: Vec<(TypeId, Arc<str>)>,
    before_create: Vec<Scoped<CreationCallback>>,
    after_create: Vec<Scoped<CreationCallback>>,
    on_error: Vec<Scoped<ErrorCallback>>,
}

impl MapperConfig {
    pub fn new() -> Self {
        Self::default()
    }

    // -------------------------------------------------------------------------
    // Registration

    #[inline]
    pub fn naming(&self) -> &NamingSettings {
        &self.naming
    }

    #[inline]
    pub fn naming_mut(&mut self) -> &mut NamingSettings {
        &mut self.naming
    }

    pub fn add_data_source(&mut self, source: ConfiguredDataSource) -> &mut Self {
        self.data_sources.push(source);
        self
    }

    pub fn ignore(&mut self, ignore: Ignore) -> &mut Self {
        self.ignores.push(ignore);
        self
    }

    pub fn add_derived_pair(&mut self, pair: DerivedTypePair) -> &mut Self {
        self.derived_pairs.push(pair);
        self
    }

    /// Declares the identifier member of `ty` and the types derived from it.
    ///
    /// Identifiers match the existing elements of a collection with the
    /// source elements when merging or overwriting. Without a declaration,
    /// a member named `Id`, `<Type>Id` or `Identifier` is used.
    pub fn identifier(&mut self, ty: TypeId, member: impl Into<Arc<str>>) -> &mut Self {
        self.identifiers.push((ty, member.into()));
        self
    }

    pub fn override_settings(&mut self, scope: MappingScope, overrides: SettingsOverride) -> &mut Self {
        self.settings.push(Scoped::new(scope, overrides));
        self
    }

    /// Shorthand for a [`SettingsOverride`] enabling `swallow_errors`.
    pub fn swallow_errors(&mut self, scope: MappingScope) -> &mut Self {
        self.override_settings(scope, SettingsOverride::default().swallow_errors(true))
    }

    /// Runs `callback` before a target object is created.
    pub fn before_create(
        &mut self,
        scope: MappingScope,
        callback: impl Fn(&MappingArgs<'_>) -> Result<(), BoxError> + Send + Sync + 'static,
    ) -> &mut Self {
        self.before_create.push(Scoped::new(scope, Arc::new(callback)));
        self
    }

    /// Runs `callback` after a target object is created, before its members
    /// are populated. [`MappingArgs::target`] is the new object.
    pub fn after_create(
        &mut self,
        scope: MappingScope,
        callback: impl Fn(&MappingArgs<'_>) -> Result<(), BoxError> + Send + Sync + 'static,
    ) -> &mut Self {
        self.after_create.push(Scoped::new(scope, Arc::new(callback)));
        self
    }

    /// Reports every failure of a plan in scope, whether swallowed or not.
    pub fn on_error(
        &mut self,
        scope: MappingScope,
        callback: impl Fn(&MappingArgs<'_>, &MappingExecutionError) + Send + Sync + 'static,
    ) -> &mut Self {
        self.on_error.push(Scoped::new(scope, Arc::new(callback)));
        self
    }

    #[inline]
    pub fn data_sources(&self) -> &[ConfiguredDataSource] {
        &self.data_sources
    }

    #[inline]
    pub fn ignores(&self) -> &[Ignore] {
        &self.ignores
    }

    #[inline]
    pub fn derived_pairs(&self) -> &[DerivedTypePair] {
        &self.derived_pairs
    }

    // -------------------------------------------------------------------------
    // Validation

    /// Adds the reverse of every reversible source and resolves derived pairs.
    pub(crate) fn finalize(mut self, registry: &TypeRegistry) -> Result<Self, ConfigurationError> {
        let reversed = self
            .data_sources
            .iter()
            .filter(|source| source.is_reversible())
            .map(ConfiguredDataSource::reversed)
            .collect::<Result<Vec<_>, _>>()?;
        if !reversed.is_empty() {
            debug!("registered {} reversed data sources", reversed.len());
        }
        self.data_sources.extend(reversed);

        self.derived_pairs = self
            .derived_pairs
            .into_iter()
            .map(|pair| pair.validate(registry))
            .collect::<Result<_, _>>()?;

        Ok(self)
    }

    // -------------------------------------------------------------------------
    // Queries

    /// Settings of the plan from `source` to `target`.
    pub(crate) fn settings_for(&self, registry: &TypeRegistry, source: TypeId, target: TypeId, rule_set: RuleSet) -> Settings {
        let mut scoped: Vec<&Scoped<SettingsOverride>> = self
            .settings
            .iter()
            .filter(|item| item.scope.applies_to(registry, source, target, rule_set))
            .collect();
        // least specific first, later applications win
        scoped.sort_by_key(|item| item.scope.specificity());

        let mut settings = Settings::default();
        for item in scoped {
            settings.apply(&item.value);
        }
        settings
    }

    /// Configured sources of a member, most specific scope first.
    pub(crate) fn member_sources(
        &self,
        registry: &TypeRegistry,
        source: TypeId,
        target: TypeId,
        rule_set: RuleSet,
        member: &str,
    ) -> Vec<&ConfiguredDataSource> {
        let mut result: Vec<&ConfiguredDataSource> = self
            .data_sources
            .iter()
            .filter(|item| item.targets_member(member))
            .filter(|item| item.scope().applies_to(registry, source, target, rule_set))
            .collect();
        result.sort_by_key(|item| core::cmp::Reverse(item.scope().specificity()));
        result
    }

    /// Configured sources of the whole target, in registration order.
    pub(crate) fn target_sources(
        &self,
        registry: &TypeRegistry,
        source: TypeId,
        target: TypeId,
        rule_set: RuleSet,
    ) -> Vec<&ConfiguredDataSource> {
        self.data_sources
            .iter()
            .filter(|item| *item.target() == ConfiguredTarget::Target)
            .filter(|item| item.scope().applies_to(registry, source, target, rule_set))
            .collect()
    }

    /// Ignores of a member, in registration order.
    pub(crate) fn ignores_of(
        &self,
        registry: &TypeRegistry,
        source: TypeId,
        target: TypeId,
        rule_set: RuleSet,
        member: &MemberInfo,
    ) -> Vec<&Ignore> {
        self.ignores
            .iter()
            .filter(|ignore| ignore.scope().applies_to(registry, source, target, rule_set))
            .filter(|ignore| ignore.matches(registry, member))
            .collect()
    }

    pub(crate) fn derived_pairs_for(
        &self,
        registry: &TypeRegistry,
        source: TypeId,
        target: TypeId,
        rule_set: RuleSet,
    ) -> Vec<&DerivedTypePair> {
        self.derived_pairs
            .iter()
            .filter(|pair| pair.scope().applies_to(registry, source, target, rule_set))
            .collect()
    }

    /// The declared identifier member of `ty` or of its nearest base.
    pub(crate) fn identifier_of(&self, registry: &TypeRegistry, ty: TypeId) -> Option<&Arc<str>> {
        let mut current = Some(ty);
        while let Some(id) = current {
            if let Some((_, member)) = self.identifiers.iter().find(|(declared, _)| *declared == id) {
                return Some(member);
            }
            current = registry.get_struct(id).and_then(|info| info.base());
        }
        None
    }

    /// `true` if `member` is the declared identifier of `ty` or of one of its bases.
    pub(crate) fn is_declared_identifier(&self, registry: &TypeRegistry, ty: TypeId, member: &str) -> bool {
        self.identifier_of(registry, ty)
            .is_some_and(|identifier| identifier.eq_ignore_ascii_case(member))
    }

    pub(crate) fn before_create_for(&self, registry: &TypeRegistry, source: TypeId, target: TypeId, rule_set: RuleSet) -> Vec<CreationCallback> {
        scoped_values(&self.before_create, registry, source, target, rule_set)
    }

    pub(crate) fn after_create_for(&self, registry: &TypeRegistry, source: TypeId, target: TypeId, rule_set: RuleSet) -> Vec<CreationCallback> {
        scoped_values(&self.after_create, registry, source, target, rule_set)
    }

    pub(crate) fn on_error_for(&self, registry: &TypeRegistry, source: TypeId, target: TypeId, rule_set: RuleSet) -> Vec<ErrorCallback> {
        scoped_values(&self.on_error, registry, source, target, rule_set)
    }
}

fn scoped_values<T: Clone>(
    items: &[Scoped<T>],
    registry: &TypeRegistry,
    source: TypeId,
    target: TypeId,
    rule_set: RuleSet,
) -> Vec<T> {
    items
        .iter()
        .filter(|item| item.scope.applies_to(registry, source, target, rule_set))
        .map(|item| item.value.clone())
        .collect()
}

#[cfg(test)]
mod tests {
    use vc_schema::Value;
    use vc_schema::info::TypeId;
    use vc_schema::registry::{StructBuilder, TypeRegistry};

    use super::*;

    #[test]
    fn settings_precedence() {
        let mut registry = TypeRegistry::new();
        let order = registry.register_struct(StructBuilder::new("shop::Order")).unwrap();

        let mut config = MapperConfig::new();
        config
            .override_settings(MappingScope::from(order), SettingsOverride::default().identity_integrity(true))
            .override_settings(MappingScope::ALL, SettingsOverride::default().identity_integrity(false))
            .swallow_errors(MappingScope::to(TypeId::STRING));

        let settings = config.settings_for(&registry, order, order, RuleSet::CreateNew);
        assert!(settings.identity_integrity);
        assert!(!settings.swallow_errors);

        let settings = config.settings_for(&registry, TypeId::I32, TypeId::STRING, RuleSet::CreateNew);
        assert!(!settings.identity_integrity);
        assert!(settings.swallow_errors);
    }

    #[test]
    fn member_sources_by_specificity() {
        let mut registry = TypeRegistry::new();
        let order = registry.register_struct(StructBuilder::new("shop::Order")).unwrap();

        let mut config = MapperConfig::new();
        config
            .add_data_source(ConfiguredDataSource::new(MappingScope::ALL, ConfiguredValue::constant(1), "Total"))
            .add_data_source(ConfiguredDataSource::new(MappingScope::to(order), ConfiguredValue::constant(2), "total"))
            .add_data_source(ConfiguredDataSource::new(MappingScope::ALL, ConfiguredValue::constant(3), "Other"));

        let sources = config.member_sources(&registry, order, order, RuleSet::Merge, "TOTAL");
        let values: Vec<_> = sources
            .iter()
            .map(|source| match source.value() {
                ConfiguredValue::Constant(value) => value.clone(),
                _ => unreachable!(),
            })
            .collect();
        assert_eq!(values, [Value::from(2), Value::from(1)]);
    }

    #[test]
    fn identifiers_are_inherited() {
        let mut registry = TypeRegistry::new();
        let entity = registry
            .register_struct(StructBuilder::new("db::Entity").member("Key", TypeId::U32))
            .unwrap();
        let customer = registry
            .register_struct(StructBuilder::new("db::Customer").extends(entity))
            .unwrap();

        let mut config = MapperConfig::new();
        config.identifier(entity, "Key");

        assert_eq!(config.identifier_of(&registry, customer).map(|m| &**m), Some("Key"));
        assert!(config.is_declared_identifier(&registry, customer, "key"));
        assert!(config.identifier_of(&registry, TypeId::STRING).is_none());
    }

    #[test]
    fn finalize_reverses_sources() {
        let mut registry = TypeRegistry::new();
        let a = registry.register_struct(StructBuilder::new("a::A").member("Id", TypeId::I32)).unwrap();
        let b = registry.register_struct(StructBuilder::new("b::B").member("Value", TypeId::I32)).unwrap();

        let mut config = MapperConfig::new();
        config.add_data_source(
            ConfiguredDataSource::new(MappingScope::pair(a, b), ConfiguredValue::member("Id"), "Value").reversible(),
        );

        let config = config.finalize(&registry).unwrap();
        assert_eq!(config.data_sources().len(), 2);
        assert_eq!(config.member_sources(&registry, b, a, RuleSet::CreateNew, "Id").len(), 1);
        assert!(config.member_sources(&registry, a, b, RuleSet::CreateNew, "Id").is_empty());
    }
}
