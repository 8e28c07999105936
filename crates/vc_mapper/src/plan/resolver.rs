//! Data sources of one target member.
//!
//! Candidates are produced in priority order:
//!
//! 1. configured sources, most specific scope first;
//! 2. entries of a source dictionary matched by key;
//! 3. the first source member path matching by name and type;
//! 4. a nested mapping of the whole source for members flattened into it;
//! 5. the fallback, the member's default or existing value.
//!
//! Resolution ends at the first unconditional candidate.

use std::sync::Arc;

use vc_schema::info::{TypeId, TypeKind};
use vc_schema::value::{can_convert, convert};

use crate::config::{ConfiguredDataSource, ConfiguredValue, strip_prefix_ignore_case};
use crate::member::{MAX_PATH_DEPTH, QualifiedMember};
use crate::plan::builder::PlanContext;
use crate::plan::data_source::{DataSource, DataSourceKind, DataSourceSet};
use crate::plan::enumerable;
use crate::plan::node::{ConditionNode, ValueNode};
use crate::{ConfigurationError, RuleSet};

/// Resolves the data sources of `member`, the fallback included.
///
/// `rule_set` decides the fallback and how nested values are mapped, it
/// differs from the plan's rule set for members updated in place.
pub(crate) fn resolve(
    ctx: &mut PlanContext<'_>,
    member: &Arc<QualifiedMember>,
    rule_set: RuleSet,
) -> Result<Vec<DataSource>, ConfigurationError> {
    let mut set = DataSourceSet::default();

    configured_sources(ctx, member, rule_set, &mut set)?;
    if !set.is_closed() {
        if ctx.registry.kind_of(ctx.source) == TypeKind::Dictionary {
            dictionary_sources(ctx, member, rule_set, &mut set);
        } else {
            structural_source(ctx, member, rule_set, &mut set);
            if !set.is_closed() {
                unflattened_source(ctx, member, rule_set, &mut set);
            }
        }
    }

    Ok(set.finish(fallback(member, rule_set)))
}

// -----------------------------------------------------------------------------
// Configured sources

fn configured_sources(
    ctx: &mut PlanContext<'_>,
    member: &Arc<QualifiedMember>,
    rule_set: RuleSet,
    set: &mut DataSourceSet,
) -> Result<(), ConfigurationError> {
    let (registry, config) = (ctx.registry, ctx.config);
    let configured = config.member_sources(registry, ctx.source, ctx.target, ctx.rule_set(), member.name());

    for (index, first) in configured.iter().enumerate() {
        if first.is_conditional() {
            continue;
        }
        if let Some(second) = configured[index + 1..]
            .iter()
            .find(|other| !other.is_conditional() && other.scope() == first.scope())
        {
            debug_assert!(!second.is_conditional());
            return Err(ConfigurationError::Conflict {
                target_type: ctx.path_of(ctx.target),
                member: member.path().clone(),
                reason: format!(
                    "two unconditional data sources are configured for `{}`",
                    first.scope().display(registry)
                )
                .into(),
            });
        }
    }

    for source in configured {
        set.push(configured_source(ctx, member, source, rule_set)?);
        if set.is_closed() {
            break;
        }
    }
    Ok(())
}

/// Builds the data source of one configured value for `member`.
pub(crate) fn configured_source(
    ctx: &mut PlanContext<'_>,
    member: &Arc<QualifiedMember>,
    configured: &ConfiguredDataSource,
    rule_set: RuleSet,
) -> Result<DataSource, ConfigurationError> {
    let condition = configured.condition().cloned().map(ConditionNode::Configured);

    let source = match configured.value() {
        ConfiguredValue::Constant(value) => {
            let converted = convert(ctx.registry, value, member.ty()).ok_or_else(|| {
                ConfigurationError::UnconvertibleConstant {
                    member: member.path().clone(),
                    member_type: ctx.path_of(member.ty()),
                    value: format!("{value:?}").into(),
                }
            })?;
            DataSource::new(DataSourceKind::Configured, ValueNode::Constant(converted))
        }
        other => {
            let (read, value_type) = configured_value(ctx, other)?;
            let value = member_value(ctx, read, value_type, member.ty(), rule_set).ok_or_else(|| {
                ConfigurationError::IncompatibleType {
                    target_type: ctx.path_of(ctx.target),
                    member: member.path().clone(),
                    member_type: ctx.path_of(member.ty()),
                    value_type: ctx.path_of(value_type),
                }
            })?;
            let source = DataSource::new(DataSourceKind::Configured, value);
            match other {
                ConfiguredValue::SourceMember(path) => source.from_member(path.clone()),
                _ => source,
            }
        }
    };
    Ok(source.when(condition))
}

/// The node reading a configured value and the type it is declared as.
pub(crate) fn configured_value(
    ctx: &PlanContext<'_>,
    value: &ConfiguredValue,
) -> Result<(ValueNode, TypeId), ConfigurationError> {
    let registry = ctx.registry;
    match value {
        ConfiguredValue::Constant(value) => Ok((
            ValueNode::Constant(value.clone()),
            value.runtime_type().unwrap_or(TypeId::ANY),
        )),
        ConfiguredValue::Function { result, func } => Ok((ValueNode::Function(func.clone()), *result)),
        ConfiguredValue::SourceMember(path) => {
            if let Some(value_type) = registry.dictionary_value_of(ctx.source) {
                let keys: Arc<[Arc<str>]> = Arc::new([path.clone()]);
                return Ok((ValueNode::Entry(keys), value_type));
            }
            let found = ctx
                .members
                .source_paths_of(ctx.source)
                .iter()
                .find(|candidate| candidate.path().eq_ignore_ascii_case(path))
                .cloned();
            match found {
                Some(member) => {
                    let ty = member.ty();
                    Ok((ValueNode::Member(member), ty))
                }
                None => Err(ConfigurationError::UnknownMember {
                    type_path: ctx.path_of(ctx.source),
                    member: path.clone(),
                }),
            }
        }
    }
}

// -----------------------------------------------------------------------------
// Values

/// The value of a `target_type` member read through `read`, a value of
/// `source_type`. Returns `None` when the types are not compatible.
pub(crate) fn member_value(
    ctx: &mut PlanContext<'_>,
    read: ValueNode,
    source_type: TypeId,
    target_type: TypeId,
    rule_set: RuleSet,
) -> Option<ValueNode> {
    let registry = ctx.registry;
    let source = registry.non_optional(source_type);

    if registry.non_optional(target_type) == TypeId::ANY {
        return Some(read);
    }
    match registry.kind_of(target_type) {
        TypeKind::Simple => can_convert(registry, source, target_type).then(|| ValueNode::convert(read, target_type)),
        TypeKind::Complex => {
            if !matches!(registry.kind_of(source), TypeKind::Complex | TypeKind::Dictionary) {
                return None;
            }
            let call = ctx.call(source, target_type, rule_set, Default::default());
            Some(ValueNode::nested(read, call, rule_set.uses_existing()))
        }
        TypeKind::Enumerable | TypeKind::Dictionary => {
            enumerable::collection_value(ctx, read, source, target_type, rule_set)
        }
    }
}

fn is_numeric(ctx: &PlanContext<'_>, ty: TypeId) -> bool {
    let registry = ctx.registry;
    registry
        .get(registry.non_optional(ty))
        .and_then(|info| info.as_primitive())
        .is_some_and(|kind| kind.is_numeric())
}

/// `true` if a zero source value must leave `member` unset.
fn zero_is_absent(ctx: &PlanContext<'_>, member: &QualifiedMember, source_type: TypeId) -> bool {
    ctx.settings.zero_identifiers_are_absent
        && member.kind() == TypeKind::Simple
        && ctx.naming().is_identifier(member.name())
        && ctx.registry.is_nullable(member.ty())
        && is_numeric(ctx, source_type)
}

// -----------------------------------------------------------------------------
// Dictionary sources

fn dictionary_sources(ctx: &mut PlanContext<'_>, member: &Arc<QualifiedMember>, rule_set: RuleSet, set: &mut DataSourceSet) {
    let (registry, naming) = (ctx.registry, ctx.naming());
    let value_type = registry.dictionary_value_of(ctx.source).unwrap_or(TypeId::ANY);
    let plan_key = ctx.key;
    let names = plan_key.context.names();

    let mut spellings = vec![member.name().to_owned()];
    for candidate in naming.candidates(member.name()) {
        if !spellings.iter().any(|known| known.eq_ignore_ascii_case(&candidate)) {
            spellings.push(candidate);
        }
    }
    let keys: Arc<[Arc<str>]> = spellings
        .iter()
        .map(|spelling| {
            let parents = names.iter().map(|name| &**name);
            Arc::from(naming.dictionary_key(parents.chain([spelling.as_str()])))
        })
        .collect();
    let key = keys[0].clone();

    let index = ctx.next_local();
    match member_value(ctx, ValueNode::Local(index), value_type, member.ty(), rule_set) {
        Some(value) => {
            let read = ValueNode::Local(index);
            let condition = if zero_is_absent(ctx, member, value_type) {
                ConditionNode::NonZero(read)
            } else {
                ConditionNode::NotNull(read)
            };
            set.push(
                DataSource::new(DataSourceKind::Dictionary, value)
                    .from_member(key.clone())
                    .bind(index, ValueNode::Entry(keys))
                    .when(Some(condition)),
            );
        }
        None => ctx.release_local(index),
    }

    match member.kind() {
        TypeKind::Complex if registry.get_struct(registry.non_optional(member.ty())).is_some() => {
            let prefix = naming.nested_prefix(&key);
            let context = ctx.key.context.child(member.name_arc());
            let call = ctx.call(ctx.source, member.ty(), rule_set, context);
            set.push(
                DataSource::new(
                    DataSourceKind::Dictionary,
                    ValueNode::nested(ValueNode::SourceRoot, call, rule_set.uses_existing()),
                )
                .from_member(prefix.clone())
                .when(Some(ConditionNode::HasPrefix(prefix.into()))),
            );
        }
        TypeKind::Enumerable => {
            let prefix = naming.element_prefix(&key);
            if let Some(value) = enumerable::elements_value(ctx, key, member.ty(), rule_set) {
                set.push(
                    DataSource::new(DataSourceKind::Dictionary, value)
                        .from_member(prefix.clone())
                        .when(Some(ConditionNode::HasPrefix(prefix.into()))),
                );
            }
        }
        _ => {}
    }
}

// -----------------------------------------------------------------------------
// Structural sources

/// The flattened names a source path must match to populate `member`.
fn wanted_names(ctx: &PlanContext<'_>, member: &QualifiedMember) -> Vec<String> {
    let naming = ctx.naming();
    let mut wanted = vec![format!("{}{}", ctx.key.context.flattened(), member.name())];
    // `Id` on `CustomerDto` is also `CustomerId`
    if ctx.key.context.is_root() && naming.is_identifier(member.name()) {
        let stem = naming.type_stem(ctx.registry.name_of(ctx.target));
        wanted.push(format!("{stem}{}", member.name()));
    }
    wanted
}

fn structural_source(ctx: &mut PlanContext<'_>, member: &Arc<QualifiedMember>, rule_set: RuleSet, set: &mut DataSourceSet) {
    let (registry, naming) = (ctx.registry, ctx.naming());
    let wanted = wanted_names(ctx, member);
    let source_stem = naming.type_stem(registry.name_of(ctx.source));
    let root = ctx.key.context.is_root();
    let paths = ctx.members.source_paths_of(ctx.source);

    for path in paths.iter() {
        let matched = wanted.iter().any(|name| naming.matches(path.flat_name(), name))
            // `Id` on `Customer` is also `CustomerId`
            || (root
                && path.depth() == 1
                && naming.is_identifier(path.name())
                && naming.matches(&format!("{source_stem}{}", path.name()), member.name()));
        if !matched {
            continue;
        }

        let index = ctx.next_local();
        let Some(value) = member_value(ctx, ValueNode::Local(index), path.ty(), member.ty(), rule_set) else {
            ctx.release_local(index);
            continue;
        };

        let narrowed = path.is_narrowed(registry);
        let mut conditions = Vec::new();
        if narrowed && let Some(parent) = path.parent() {
            conditions.push(ConditionNode::IsType {
                value: ValueNode::Member(parent.clone()),
                ty: path.owner(),
            });
        }
        let read = ValueNode::Local(index);
        if member.kind() != TypeKind::Simple {
            conditions.push(ConditionNode::NotNull(read));
        } else if zero_is_absent(ctx, member, path.ty()) {
            conditions.push(ConditionNode::NonZero(read));
        } else if path.depth() > 1 || narrowed {
            conditions.push(ConditionNode::NotNull(read));
        }

        set.push(
            DataSource::new(DataSourceKind::Structural, value)
                .from_member(path.path().clone())
                .bind(index, ValueNode::Member(path.clone()))
                .when(ConditionNode::all(conditions)),
        );
        return;
    }
}

/// Populates a complex member from source members whose flattened names
/// start with its name (`AddressLine1` for `Address`).
fn unflattened_source(ctx: &mut PlanContext<'_>, member: &Arc<QualifiedMember>, rule_set: RuleSet, set: &mut DataSourceSet) {
    let registry = ctx.registry;
    let declared = registry.non_optional(member.ty());
    if member.kind() != TypeKind::Complex
        || registry.get_struct(declared).is_none()
        || ctx.key.context.names().len() >= MAX_PATH_DEPTH
    {
        return;
    }

    let prefix = format!("{}{}", ctx.key.context.flattened(), member.name());
    let conditions: Vec<ConditionNode> = ctx
        .members
        .source_paths_of(ctx.source)
        .iter()
        .filter(|path| strip_prefix_ignore_case(path.flat_name(), &prefix).is_some())
        .map(|path| ConditionNode::NotNull(ValueNode::Member(path.clone())))
        .collect();
    if conditions.is_empty() {
        return;
    }

    let context = ctx.key.context.child(member.name_arc());
    let call = ctx.call(ctx.source, declared, rule_set, context);
    set.push(
        DataSource::new(
            DataSourceKind::Nested,
            ValueNode::nested(ValueNode::SourceRoot, call, rule_set.uses_existing()),
        )
        .from_member(prefix)
        .when(Some(ConditionNode::Any(conditions))),
    );
}

// -----------------------------------------------------------------------------
// Fallback

/// The value of a member without any other source.
///
/// New targets and constructor members receive the type's default (an empty
/// collection for collections). Existing targets keep the member's value,
/// a `Null` collection is replaced by an empty one.
pub(crate) fn fallback(member: &QualifiedMember, rule_set: RuleSet) -> ValueNode {
    let ty = member.ty();
    let collection = matches!(member.kind(), TypeKind::Enumerable | TypeKind::Dictionary);

    if !rule_set.uses_existing() || member.is_constructor_parameter() {
        if collection {
            ValueNode::EmptyCollection(ty)
        } else {
            ValueNode::Default(ty)
        }
    } else if collection {
        ValueNode::conditional(
            ConditionNode::NotNull(ValueNode::Existing),
            ValueNode::Existing,
            ValueNode::EmptyCollection(ty),
        )
    } else {
        ValueNode::Existing
    }
}
