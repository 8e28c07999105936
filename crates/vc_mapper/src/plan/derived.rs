//! Derived type dispatch.
//!
//! A plan for `Animal -> AnimalDto` also serves `Dog` sources: before its
//! members are populated, the plan tests the runtime type of the source
//! (and, onto existing targets, of the target) and hands matching values to
//! the plan of the derived pair, `Dog -> DogDto`.
//!
//! Branches come from the configured derived type pairs first, then from
//! pairing subtypes by name. A subtype without a paired target that declares
//! members of its own maps to the plan's target. The most derived source
//! types are tested first.

use core::cmp::Reverse;

use log::debug;
use vc_schema::info::TypeId;
use vc_schema::registry::TypeRegistry;

use crate::config::{strip_prefix_ignore_case, strip_suffix_ignore_case};
use crate::plan::MemberContext;
use crate::plan::builder::PlanContext;
use crate::plan::compiled::{BranchOrigin, DerivedBranch};
use crate::plan::node::{ConditionNode, ValueNode};

pub(crate) fn derived_branches(ctx: &mut PlanContext<'_>) -> Vec<DerivedBranch> {
    let (registry, config) = (ctx.registry, ctx.config);
    let (source, target, rule_set) = (ctx.source, ctx.target, ctx.rule_set());

    let mut covered: Vec<TypeId> = Vec::new();
    let mut branches: Vec<(TypeId, DerivedBranch)> = Vec::new();

    for pair in config.derived_pairs_for(registry, source, target, rule_set) {
        let (pair_source, pair_target) = (pair.source(), pair.target());
        if pair_target == target
            || !registry.is_subtype_of(pair_source, source)
            || !registry.is_subtype_of(pair_target, target)
        {
            continue;
        }

        let mut conditions = vec![ConditionNode::IsType {
            value: ValueNode::SourceRoot,
            ty: pair_source,
        }];
        match pair.condition() {
            Some(condition) => conditions.push(ConditionNode::Configured(condition.clone())),
            None => covered.push(pair_source),
        }
        if rule_set.uses_existing() {
            conditions.push(ConditionNode::TargetAccepts(pair_target));
        }

        let call = ctx.call(pair_source, pair_target, rule_set, MemberContext::root());
        branches.push((pair_source, DerivedBranch {
            condition: ConditionNode::All(conditions),
            call,
            origin: BranchOrigin::Configured,
        }));
    }

    if !ctx.settings.infer_derived_types {
        return sorted(registry, branches);
    }

    // the source itself pairs with a derived target by name, `Dog` to `DogDto`
    for derived in core::iter::once(source).chain(registry.subtypes_of(source)) {
        if covered.iter().any(|covered| registry.is_subtype_of(derived, *covered)) {
            continue;
        }
        let derived_target = match paired_target(ctx, derived) {
            Some(derived_target) => derived_target,
            // `Dog` has members `Animal` lacks, `Dog -> AnimalDto` reads them
            None if derived != source && adds_members(registry, source, derived) => target,
            None => continue,
        };

        let mut conditions = vec![ConditionNode::IsType {
            value: ValueNode::SourceRoot,
            ty: derived,
        }];
        if rule_set.uses_existing() && derived_target != target {
            conditions.push(ConditionNode::TargetAccepts(derived_target));
        }
        debug!(
            "`{}` maps to `{}` in plan {}",
            registry.path_of(derived),
            registry.path_of(derived_target),
            ctx.key
        );
        let call = ctx.call(derived, derived_target, rule_set, MemberContext::root());
        branches.push((derived, DerivedBranch {
            condition: ConditionNode::All(conditions),
            call,
            origin: BranchOrigin::SourceSubtype,
        }));
    }

    let mut branches = sorted(registry, branches);

    // an existing `DogDto` keeps its type when mapped from an `Animal`
    if rule_set.uses_existing() {
        let mut derived_targets = registry.subtypes_of(target);
        derived_targets.sort_by_key(|ty| Reverse(registry.depth(*ty)));
        for derived_target in derived_targets {
            let call = ctx.call(source, derived_target, rule_set, MemberContext::root());
            branches.push(DerivedBranch {
                condition: ConditionNode::IsType {
                    value: ValueNode::TargetRoot,
                    ty: derived_target,
                },
                call,
                origin: BranchOrigin::TargetSubtype,
            });
        }
    }

    branches
}

/// Most derived source types first, ties keep their order.
fn sorted(registry: &TypeRegistry, mut branches: Vec<(TypeId, DerivedBranch)>) -> Vec<DerivedBranch> {
    branches.sort_by_key(|(source, _)| Reverse(registry.depth(*source)));
    branches.into_iter().map(|(_, branch)| branch).collect()
}

fn adds_members(registry: &TypeRegistry, source: TypeId, derived: TypeId) -> bool {
    let len = |ty| registry.get_struct(ty).map_or(0, |info| info.member_len());
    len(derived) > len(source)
}

/// The concrete subtype of the plan's target named after `derived`.
///
/// The target's name with the source's name replaced by the derived type's
/// name is searched first (`AnimalDto` with `Dog` gives `DogDto`), then a
/// subtype with the same stem.
fn paired_target(ctx: &PlanContext<'_>, derived: TypeId) -> Option<TypeId> {
    let registry = ctx.registry;
    let naming = ctx.naming();
    let source_name = registry.name_of(ctx.source);
    let target_name = registry.name_of(ctx.target);
    let derived_name = registry.name_of(derived);

    let wanted = if target_name.eq_ignore_ascii_case(source_name) {
        Some(derived_name.to_owned())
    } else if let Some(rest) = strip_prefix_ignore_case(target_name, source_name) {
        Some(format!("{derived_name}{rest}"))
    } else {
        strip_suffix_ignore_case(target_name, source_name).map(|rest| format!("{rest}{derived_name}"))
    };

    let candidates: Vec<TypeId> = registry
        .subtypes_of(ctx.target)
        .into_iter()
        .filter(|ty| !registry.is_abstract(*ty))
        .collect();

    let by_name = wanted.and_then(|wanted| {
        candidates
            .iter()
            .copied()
            .find(|ty| registry.name_of(*ty).eq_ignore_ascii_case(&wanted))
    });
    by_name.or_else(|| {
        let stem = naming.type_stem(derived_name);
        candidates
            .iter()
            .copied()
            .find(|ty| naming.type_stem(registry.name_of(*ty)).eq_ignore_ascii_case(stem))
    })
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use vc_schema::info::TypeId;
    use vc_schema::registry::{StructBuilder, TypeRegistry};

    use crate::config::{DerivedTypePair, MapperConfig};
    use crate::plan::builder::PlanContext;
    use crate::plan::compiled::BranchOrigin;
    use crate::plan::MapperKey;
    use crate::{Mapper, RuleSet};

    struct Zoo {
        mapper: Mapper,
        animal: TypeId,
        dog: TypeId,
        puppy: TypeId,
        animal_dto: TypeId,
        dog_dto: TypeId,
        puppy_dto: TypeId,
    }

    fn zoo(config: impl FnOnce(&mut MapperConfig, [TypeId; 6])) -> Zoo {
        let mut registry = TypeRegistry::new();
        let animal = registry
            .register_struct(StructBuilder::new("zoo::Animal").member("Name", TypeId::STRING))
            .unwrap();
        let dog = registry.register_struct(StructBuilder::new("zoo::Dog").extends(animal)).unwrap();
        let puppy = registry.register_struct(StructBuilder::new("zoo::Puppy").extends(dog)).unwrap();
        let animal_dto = registry
            .register_struct(StructBuilder::new("dto::AnimalDto").member("Name", TypeId::STRING))
            .unwrap();
        let dog_dto = registry
            .register_struct(StructBuilder::new("dto::DogDto").extends(animal_dto))
            .unwrap();
        let puppy_dto = registry
            .register_struct(StructBuilder::new("dto::PuppyDto").extends(dog_dto))
            .unwrap();

        let mut mapper_config = MapperConfig::new();
        config(&mut mapper_config, [animal, dog, puppy, animal_dto, dog_dto, puppy_dto]);
        Zoo {
            mapper: Mapper::new(Arc::new(registry), mapper_config).unwrap(),
            animal,
            dog,
            puppy,
            animal_dto,
            dog_dto,
            puppy_dto,
        }
    }

    #[test]
    fn inferred_by_name_most_derived_first() {
        let zoo = zoo(|_, _| {});
        let key = MapperKey::new(zoo.animal, zoo.animal_dto, RuleSet::CreateNew);
        let mut ctx = PlanContext::new(zoo.mapper.inner(), &key);

        let branches = super::derived_branches(&mut ctx);
        let calls: Vec<_> = branches.iter().map(|branch| (branch.call.source, branch.call.target)).collect();
        assert_eq!(calls, [(Some(zoo.puppy), zoo.puppy_dto), (Some(zoo.dog), zoo.dog_dto)]);
        assert!(branches.iter().all(|branch| branch.origin == BranchOrigin::SourceSubtype));
    }

    #[test]
    fn configured_pair_covers_its_subtypes() {
        let zoo = zoo(|config, [animal, dog, _, animal_dto, _, puppy_dto]| {
            config.add_derived_pair(DerivedTypePair::new(animal, animal_dto, dog, puppy_dto));
        });
        let key = MapperKey::new(zoo.animal, zoo.animal_dto, RuleSet::CreateNew);
        let mut ctx = PlanContext::new(zoo.mapper.inner(), &key);

        let branches = super::derived_branches(&mut ctx);
        assert_eq!(branches.len(), 1);
        assert_eq!(branches[0].origin, BranchOrigin::Configured);
        assert_eq!(branches[0].call.target, zoo.puppy_dto);
        assert_ne!(branches[0].call.target, zoo.dog_dto);
    }

    #[test]
    fn runtime_source_pairs_with_derived_target() {
        let zoo = zoo(|_, _| {});
        let key = MapperKey::new(zoo.dog, zoo.animal_dto, RuleSet::CreateNew);
        let mut ctx = PlanContext::new(zoo.mapper.inner(), &key);

        let branches = super::derived_branches(&mut ctx);
        let calls: Vec<_> = branches.iter().map(|branch| (branch.call.source, branch.call.target)).collect();
        assert_eq!(calls, [(Some(zoo.puppy), zoo.puppy_dto), (Some(zoo.dog), zoo.dog_dto)]);
    }

    #[test]
    fn subtype_with_own_members_maps_to_declared_target() {
        let mut registry = TypeRegistry::new();
        let animal = registry
            .register_struct(StructBuilder::new("zoo::Animal").member("Name", TypeId::STRING))
            .unwrap();
        let cat = registry
            .register_struct(StructBuilder::new("zoo::Cat").extends(animal).member("Lives", TypeId::U8))
            .unwrap();
        // adds nothing, `Animal -> AnimalDto` covers it
        registry.register_struct(StructBuilder::new("zoo::Bird").extends(animal)).unwrap();
        let animal_dto = registry
            .register_struct(StructBuilder::new("dto::AnimalDto").member("Name", TypeId::STRING))
            .unwrap();
        let mapper = Mapper::new(Arc::new(registry), MapperConfig::new()).unwrap();

        let key = MapperKey::new(animal, animal_dto, RuleSet::CreateNew);
        let mut ctx = PlanContext::new(mapper.inner(), &key);
        let branches = super::derived_branches(&mut ctx);
        let calls: Vec<_> = branches.iter().map(|branch| (branch.call.source, branch.call.target)).collect();
        assert_eq!(calls, [(Some(cat), animal_dto)]);
        assert_eq!(branches[0].origin, BranchOrigin::SourceSubtype);
    }

    #[test]
    fn existing_target_subtypes() {
        let zoo = zoo(|_, _| {});
        let key = MapperKey::new(zoo.animal, zoo.animal_dto, RuleSet::Merge);
        let mut ctx = PlanContext::new(zoo.mapper.inner(), &key);

        let branches = super::derived_branches(&mut ctx);
        let origins: Vec<_> = branches.iter().map(|branch| branch.origin).collect();
        assert_eq!(origins, [
            BranchOrigin::SourceSubtype,
            BranchOrigin::SourceSubtype,
            BranchOrigin::TargetSubtype,
            BranchOrigin::TargetSubtype,
        ]);
        assert_eq!(branches[2].call.target, zoo.puppy_dto);
        assert_eq!(branches[2].call.source, Some(zoo.animal));
    }
}
