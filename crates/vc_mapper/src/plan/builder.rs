use std::sync::Arc;

use log::debug;
use vc_schema::hash::HashSet;
use vc_schema::info::{TypeId, TypeKind};
use vc_schema::registry::TypeRegistry;
use vc_schema::value::can_convert;

use crate::config::{ConfiguredDataSource, Ignore, MapperConfig, NamingSettings, Settings};
use crate::mapper::MapperInner;
use crate::member::{MemberModel, QualifiedMember};
use crate::plan::compiled::{MemberPopulation, NoteReason, ObjectPlan, PlanBody, PlanNote, PopulationMode, TargetSource};
use crate::plan::data_source::{DataSource, chain, has_value_sources};
use crate::plan::node::{ConditionNode, NestedCall, ValueNode};
use crate::plan::{derived, enumerable, resolver};
use crate::plan::{MapperKey, MappingPlan, MemberContext};
use crate::{ConfigurationError, RuleSet};

// -----------------------------------------------------------------------------
// PlanContext

/// The state of one plan compilation.
pub(crate) struct PlanContext<'a> {
    pub(crate) registry: &'a TypeRegistry,
    pub(crate) config: &'a MapperConfig,
    pub(crate) members: &'a MemberModel,
    pub(crate) key: &'a MapperKey,
    /// `key.source` without an optional wrapper.
    pub(crate) source: TypeId,
    /// `key.target` without an optional wrapper.
    pub(crate) target: TypeId,
    pub(crate) settings: Settings,
    locals: usize,
    children: Vec<MapperKey>,
}

impl<'a> PlanContext<'a> {
    pub(crate) fn new(inner: &'a MapperInner, key: &'a MapperKey) -> Self {
        let registry = &*inner.registry;
        let source = registry.non_optional(key.source);
        let target = registry.non_optional(key.target);
        Self {
            registry,
            config: &inner.config,
            members: &inner.members,
            key,
            source,
            target,
            settings: inner.config.settings_for(registry, source, target, key.rule_set),
            locals: 0,
            children: Vec::new(),
        }
    }

    #[inline]
    pub(crate) fn rule_set(&self) -> RuleSet {
        self.key.rule_set
    }

    #[inline]
    pub(crate) fn naming(&self) -> &'a NamingSettings {
        self.config.naming()
    }

    pub(crate) fn next_local(&mut self) -> usize {
        self.locals += 1;
        self.locals - 1
    }

    /// Gives back the most recently allocated local when it ends up unused.
    pub(crate) fn release_local(&mut self, index: usize) {
        if index + 1 == self.locals {
            self.locals = index;
        }
    }

    /// A call into the plan for `source` to `target`, compiled with this one.
    ///
    /// A source declared as `Any` is resolved per value at runtime.
    pub(crate) fn call(&mut self, source: TypeId, target: TypeId, rule_set: RuleSet, context: MemberContext) -> NestedCall {
        let source = self.registry.non_optional(source);
        let target = self.registry.non_optional(target);
        let source = (source != TypeId::ANY).then_some(source);
        if let Some(source) = source {
            self.children.push(MapperKey {
                source,
                target,
                rule_set,
                context: context.clone(),
            });
        }
        NestedCall {
            source,
            target,
            rule_set,
            context,
        }
    }

    pub(crate) fn path_of(&self, ty: TypeId) -> Arc<str> {
        self.registry.path_of(ty).into()
    }
}

// -----------------------------------------------------------------------------
// Plan construction

/// Builds the plan of `key`, returns it with the keys of the plans it calls.
pub(crate) fn build_plan(inner: &MapperInner, key: &MapperKey) -> Result<(MappingPlan, Vec<MapperKey>), ConfigurationError> {
    let mut ctx = PlanContext::new(inner, key);
    let registry = ctx.registry;

    let body = match (registry.kind_of(ctx.source), registry.kind_of(ctx.target)) {
        _ if ctx.target == TypeId::ANY => PlanBody::Convert(TypeId::ANY),
        (TypeKind::Simple, TypeKind::Simple) if can_convert(registry, ctx.source, ctx.target) => {
            PlanBody::Convert(ctx.target)
        }
        (TypeKind::Complex | TypeKind::Dictionary, TypeKind::Complex) if registry.get_struct(ctx.target).is_some() => {
            PlanBody::Object(build_object(&mut ctx)?)
        }
        (TypeKind::Enumerable, TypeKind::Enumerable)
        | (TypeKind::Complex | TypeKind::Dictionary, TypeKind::Dictionary) => {
            let rule_set = ctx.rule_set();
            let (source, target) = (ctx.source, ctx.target);
            match enumerable::collection_value(&mut ctx, ValueNode::SourceRoot, source, target, rule_set) {
                Some(value) => PlanBody::Collection {
                    value,
                    locals: ctx.locals,
                },
                None => return Err(unmappable(&ctx)),
            }
        }
        _ => return Err(unmappable(&ctx)),
    };

    let config = ctx.config;
    let (source, target, rule_set) = (ctx.source, ctx.target, ctx.rule_set());
    let plan = MappingPlan {
        key: key.clone(),
        source_path: ctx.path_of(source),
        target_path: ctx.path_of(target),
        settings: ctx.settings,
        body,
        before_create: config.before_create_for(registry, source, target, rule_set),
        after_create: config.after_create_for(registry, source, target, rule_set),
        on_error: config.on_error_for(registry, source, target, rule_set),
        registry: inner.registry.clone(),
    };
    Ok((plan, ctx.children))
}

fn unmappable(ctx: &PlanContext<'_>) -> ConfigurationError {
    ConfigurationError::Unmappable {
        source_type: ctx.path_of(ctx.source),
        target_type: ctx.path_of(ctx.target),
    }
}

fn build_object(ctx: &mut PlanContext<'_>) -> Result<ObjectPlan, ConfigurationError> {
    let derived = if ctx.key.context.is_root() {
        derived::derived_branches(ctx)
    } else {
        Vec::new()
    };
    let mut plan = ObjectPlan {
        target: ctx.target,
        derived,
        constructor: Vec::new(),
        members: Vec::new(),
        target_sources: Vec::new(),
        notes: Vec::new(),
        locals: 0,
    };

    for member in ctx.members.members_of(ctx.target).iter() {
        populate_member(ctx, member, &mut plan)?;
    }
    plan.target_sources = target_sources(ctx)?;
    plan.locals = ctx.locals;

    for note in &plan.notes {
        debug!("{}: member `{}` is not populated ({:?})", ctx.key, note.member, note.reason);
    }
    Ok(plan)
}

fn populate_member(ctx: &mut PlanContext<'_>, member: &Arc<QualifiedMember>, plan: &mut ObjectPlan) -> Result<(), ConfigurationError> {
    let (registry, config) = (ctx.registry, ctx.config);
    let (source, target, rule_set) = (ctx.source, ctx.target, ctx.rule_set());

    let info = registry
        .get_struct(member.owner())
        .and_then(|info| info.member_at(member.slot()));
    let ignores = info.map(|info| config.ignores_of(registry, source, target, rule_set, info)).unwrap_or_default();
    if !ignores.is_empty() {
        check_ignores(ctx, member, &ignores)?;
        plan.notes.push(note(member, NoteReason::Ignored));
        return Ok(());
    }

    if member.is_constructor_parameter() {
        let sources = resolver::resolve(ctx, member, rule_set)?;
        plan.constructor.push(population(member, PopulationMode::Assign, None, sources));
        return Ok(());
    }

    if !member.is_writable() {
        if member.kind() != TypeKind::Simple {
            let sources = resolver::resolve(ctx, member, rule_set.onto_existing())?;
            if has_value_sources(&sources) {
                plan.members.push(population(member, PopulationMode::InPlace, None, sources));
                return Ok(());
            }
        }
        plan.notes.push(note(member, NoteReason::ReadOnly));
        return Ok(());
    }

    let configured = config.member_sources(registry, source, target, rule_set, member.name());
    if configured.iter().any(|source| source.is_sequential()) {
        plan.members.push(sequential(ctx, member, &configured)?);
        return Ok(());
    }

    let sources = resolver::resolve(ctx, member, rule_set)?;
    if !has_value_sources(&sources) {
        plan.notes.push(note(member, NoteReason::NoDataSources));
        // collections still receive their empty fallback
        if !sources.iter().any(|source| source.value.creates_collection()) {
            return Ok(());
        }
    }
    let guard = (rule_set == RuleSet::Merge && member.kind() == TypeKind::Simple).then_some(ConditionNode::ExistingIsDefault);
    plan.members.push(population(member, PopulationMode::Assign, guard, sources));
    Ok(())
}

fn check_ignores(ctx: &PlanContext<'_>, member: &QualifiedMember, ignores: &[&Ignore]) -> Result<(), ConfigurationError> {
    let (registry, config) = (ctx.registry, ctx.config);
    if config.is_declared_identifier(registry, ctx.target, member.name()) {
        return Err(ConfigurationError::IgnoredIdentifier {
            type_path: ctx.path_of(ctx.target),
            member: member.path().clone(),
        });
    }

    let conflict = |reason: String| ConfigurationError::Conflict {
        target_type: ctx.path_of(ctx.target),
        member: member.path().clone(),
        reason: reason.into(),
    };
    let configured = config.member_sources(registry, ctx.source, ctx.target, ctx.rule_set(), member.name());
    for (index, ignore) in ignores.iter().enumerate() {
        let scope = ignore.scope();
        if ignores[index + 1..].iter().any(|other| other.scope() == scope) {
            return Err(conflict(format!(
                "the member is ignored twice for `{}`",
                scope.display(registry)
            )));
        }
        if configured.iter().any(|source| source.scope() == scope) {
            return Err(conflict(format!(
                "the member is both ignored and configured for `{}`",
                scope.display(registry)
            )));
        }
    }
    Ok(())
}

fn sequential(
    ctx: &mut PlanContext<'_>,
    member: &Arc<QualifiedMember>,
    configured: &[&ConfiguredDataSource],
) -> Result<MemberPopulation, ConfigurationError> {
    let rule_set = ctx.rule_set();
    let sources = configured
        .iter()
        .map(|source| resolver::configured_source(ctx, member, source, rule_set))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(MemberPopulation {
        member: member.clone(),
        mode: PopulationMode::Sequential,
        guard: None,
        sources,
        value: ValueNode::Existing,
    })
}

fn target_sources(ctx: &mut PlanContext<'_>) -> Result<Vec<TargetSource>, ConfigurationError> {
    let config = ctx.config;
    let (source, target, rule_set) = (ctx.source, ctx.target, ctx.rule_set());

    config
        .target_sources(ctx.registry, source, target, rule_set)
        .into_iter()
        .map(|configured| {
            let (value, value_type) = resolver::configured_value(ctx, configured.value())?;
            let call = ctx.call(value_type, target, rule_set.onto_existing(), MemberContext::root());
            Ok(TargetSource {
                condition: configured.condition().cloned().map(ConditionNode::Configured),
                value,
                call,
            })
        })
        .collect()
}

fn population(
    member: &Arc<QualifiedMember>,
    mode: PopulationMode,
    guard: Option<ConditionNode>,
    sources: Vec<DataSource>,
) -> MemberPopulation {
    MemberPopulation {
        member: member.clone(),
        mode,
        guard,
        value: chain(&sources),
        sources,
    }
}

fn note(member: &QualifiedMember, reason: NoteReason) -> PlanNote {
    PlanNote {
        member: member.path().clone(),
        reason,
    }
}

// -----------------------------------------------------------------------------
// PlanCompiler

/// Compiles a plan and every plan it calls.
///
/// Plans are published only when the whole graph compiled, a configuration
/// error anywhere leaves the cache untouched. Plans already cached or being
/// compiled are skipped, which breaks cycles between types.
pub(crate) struct PlanCompiler<'m> {
    inner: &'m MapperInner,
    in_progress: HashSet<MapperKey>,
    compiled: Vec<(MapperKey, Arc<MappingPlan>)>,
}

impl<'m> PlanCompiler<'m> {
    pub(crate) fn compile(inner: &'m MapperInner, key: &MapperKey) -> Result<Arc<MappingPlan>, ConfigurationError> {
        let mut compiler = Self {
            inner,
            in_progress: HashSet::default(),
            compiled: Vec::new(),
        };
        compiler.visit(key.clone())?;

        let mut root = None;
        for (compiled_key, plan) in compiler.compiled {
            let published = inner.plans.publish(compiled_key.clone(), None, plan);
            if compiled_key == *key {
                root = Some(published);
            }
        }
        root.or_else(|| inner.plans.get(key, None))
            .ok_or_else(|| ConfigurationError::Unmappable {
                source_type: inner.registry.path_of(key.source).into(),
                target_type: inner.registry.path_of(key.target).into(),
            })
    }

    fn visit(&mut self, key: MapperKey) -> Result<(), ConfigurationError> {
        if self.inner.plans.contains(&key) || !self.in_progress.insert(key.clone()) {
            return Ok(());
        }

        let (plan, children) = build_plan(self.inner, &key)?;
        debug!("compiled plan {key} calling {} plans", children.len());
        for child in children {
            self.visit(child)?;
        }
        self.compiled.push((key, Arc::new(plan)));
        Ok(())
    }
}
