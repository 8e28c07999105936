use std::sync::Arc;

use vc_schema::info::{TypeId, TypeKind};
use vc_schema::value::can_convert;

use crate::RuleSet;
use crate::member::QualifiedMember;
use crate::plan::MemberContext;
use crate::plan::builder::PlanContext;
use crate::plan::node::{
    DictionaryNode, ElementMapping, EnumerableNode, FlattenedEntry, FlattenedNode, IdentifierPair, ValueNode,
};

// -----------------------------------------------------------------------------
// Collections

/// The node mapping the collection read by `read` to a `target` collection.
///
/// Lists map from lists, dictionaries from dictionaries or from the simple
/// member paths of an object. A source declared as `Any` is accepted for
/// both and checked per value. Returns `None` when the elements cannot be
/// mapped.
pub(crate) fn collection_value(
    ctx: &mut PlanContext<'_>,
    read: ValueNode,
    source: TypeId,
    target: TypeId,
    rule_set: RuleSet,
) -> Option<ValueNode> {
    let registry = ctx.registry;
    let source = registry.non_optional(source);
    let target = registry.non_optional(target);

    match registry.kind_of(target) {
        TypeKind::Enumerable => {
            let source_element = match registry.kind_of(source) {
                _ if source == TypeId::ANY => TypeId::ANY,
                TypeKind::Enumerable => registry.element_of(source)?,
                _ => return None,
            };
            let target_element = registry.element_of(target)?;
            let element = element_mapping(ctx, source_element, target_element, rule_set)?;
            let identifiers = identifier_pair(ctx, source, source_element, target_element);
            let order_by = linked_order(ctx, source_element, target_element);
            Some(ValueNode::Enumerable(Box::new(EnumerableNode {
                source: read,
                target_list: target,
                rule_set,
                element,
                identifiers,
                order_by,
            })))
        }
        TypeKind::Dictionary => {
            let source_value = match registry.kind_of(source) {
                _ if source == TypeId::ANY => TypeId::ANY,
                TypeKind::Dictionary => registry.dictionary_value_of(source)?,
                TypeKind::Complex => return flattened_value(ctx, read, source, target, rule_set),
                _ => return None,
            };
            let target_value = registry.dictionary_value_of(target)?;
            let value = element_mapping(ctx, source_value, target_value, rule_set)?;
            Some(ValueNode::Dictionary(Box::new(DictionaryNode {
                source: read,
                target_dictionary: target,
                rule_set,
                value,
            })))
        }
        _ => None,
    }
}

/// The entries of a dictionary read from an object, one per simple member
/// path convertible to the dictionary's value type.
///
/// Keys join the member names along the path, `Address.Line1`.
fn flattened_value(
    ctx: &PlanContext<'_>,
    read: ValueNode,
    source: TypeId,
    target: TypeId,
    rule_set: RuleSet,
) -> Option<ValueNode> {
    let registry = ctx.registry;
    registry.get_struct(source)?;
    let value_type = registry.dictionary_value_of(target)?;
    let any = registry.non_optional(value_type) == TypeId::ANY;
    if !any && registry.kind_of(value_type) != TypeKind::Simple {
        return None;
    }

    let naming = ctx.naming();
    let entries = ctx
        .members
        .source_paths_of(source)
        .iter()
        .filter(|member| member.kind() == TypeKind::Simple)
        .filter(|member| any || can_convert(registry, registry.non_optional(member.ty()), value_type))
        .map(|member| FlattenedEntry {
            key: naming.dictionary_key(path_names(member)).into(),
            member: member.clone(),
            to: if any { TypeId::ANY } else { value_type },
        })
        .collect();
    Some(ValueNode::Flattened(Box::new(FlattenedNode {
        source: read,
        target_dictionary: target,
        rule_set,
        entries,
    })))
}

fn path_names(member: &QualifiedMember) -> Vec<&str> {
    let mut names: Vec<&str> = core::iter::successors(Some(member), |&member| member.parent().map(|parent| &**parent))
        .map(QualifiedMember::name)
        .collect();
    names.reverse();
    names
}

/// How one element of `source` type becomes an element of `target` type.
fn element_mapping(ctx: &mut PlanContext<'_>, source: TypeId, target: TypeId, rule_set: RuleSet) -> Option<ElementMapping> {
    let registry = ctx.registry;
    let source_kind = registry.kind_of(source);

    if registry.non_optional(target) == TypeId::ANY {
        return Some(ElementMapping::Convert(TypeId::ANY));
    }
    let nested = match registry.kind_of(target) {
        TypeKind::Simple => {
            return can_convert(registry, source, target).then_some(ElementMapping::Convert(target));
        }
        TypeKind::Complex => matches!(source_kind, TypeKind::Complex | TypeKind::Dictionary),
        TypeKind::Enumerable => source_kind == TypeKind::Enumerable || registry.non_optional(source) == TypeId::ANY,
        TypeKind::Dictionary => source_kind == TypeKind::Dictionary || registry.non_optional(source) == TypeId::ANY,
    };
    nested.then(|| ElementMapping::Nested(ctx.call(source, target, rule_set, MemberContext::root())))
}

// -----------------------------------------------------------------------------
// Dictionary elements

/// The list of a target member collected from indexed dictionary entries.
///
/// Simple elements are read from `key[0]`, `key[1]`, .. complex elements
/// from the sub-dictionaries below `key[0].`, `key[1].`, ..
pub(crate) fn elements_value(
    ctx: &mut PlanContext<'_>,
    key: Arc<str>,
    target: TypeId,
    rule_set: RuleSet,
) -> Option<ValueNode> {
    let registry = ctx.registry;
    let target = registry.non_optional(target);
    let element_type = registry.element_of(target)?;

    let element = match registry.kind_of(element_type) {
        TypeKind::Simple => ElementMapping::Convert(element_type),
        _ if registry.non_optional(element_type) == TypeId::ANY => ElementMapping::Convert(TypeId::ANY),
        _ => ElementMapping::Nested(ctx.call(TypeId::ANY, element_type, rule_set, MemberContext::root())),
    };
    let identifiers = identifier_name(ctx, element_type).map(|name| IdentifierPair {
        source: name.clone(),
        target: name,
    });

    Some(ValueNode::Enumerable(Box::new(EnumerableNode {
        source: ValueNode::Elements(key),
        target_list: target,
        rule_set,
        element,
        identifiers,
        order_by: None,
    })))
}

// -----------------------------------------------------------------------------
// Identifiers

/// The member identifying instances of `ty`.
///
/// A configured identifier wins, otherwise the first member named `Id`,
/// `<Type>Id` (type suffixes ignored) or `Identifier`.
pub(crate) fn identifier_name(ctx: &PlanContext<'_>, ty: TypeId) -> Option<Arc<str>> {
    let registry = ctx.registry;
    let ty = registry.non_optional(ty);
    if let Some(configured) = ctx.config.identifier_of(registry, ty) {
        return Some(configured.clone());
    }

    let info = registry.get_struct(ty)?;
    let name = registry.name_of(ty);
    let stem = ctx.naming().type_stem(name);
    [
        "Id".to_owned(),
        format!("{stem}Id"),
        format!("{name}Id"),
        "Identifier".to_owned(),
    ]
    .iter()
    .find_map(|candidate| info.member(candidate))
    .map(|member| member.name_arc().clone())
}

/// The identifiers matching source elements with existing target elements.
///
/// Dictionary and `Any` elements are read by the target identifier's name.
fn identifier_pair(ctx: &PlanContext<'_>, source: TypeId, source_element: TypeId, target_element: TypeId) -> Option<IdentifierPair> {
    let registry = ctx.registry;
    if registry.kind_of(target_element) != TypeKind::Complex {
        return None;
    }
    let target = identifier_name(ctx, target_element)?;

    let source_element = registry.non_optional(source_element);
    let by_target_name = source == TypeId::ANY
        || source_element == TypeId::ANY
        || registry.kind_of(source_element) == TypeKind::Dictionary;
    let source = if by_target_name {
        target.clone()
    } else {
        identifier_name(ctx, source_element)?
    };
    Some(IdentifierPair { source, target })
}

/// The identifier ordering source elements that refer back to their owner.
///
/// Applies when the source elements hold a reference to the owning source
/// type while the target elements hold none to the owning target type. The
/// target then observes the elements in identifier order.
fn linked_order(ctx: &PlanContext<'_>, source_element: TypeId, target_element: TypeId) -> Option<Arc<str>> {
    let registry = ctx.registry;
    let refers_to = |element: TypeId, owner: TypeId| {
        registry.get_struct(registry.non_optional(element)).is_some_and(|info| {
            info.members().iter().any(|member| {
                let ty = registry.non_optional(member.ty());
                registry.kind_of(ty) == TypeKind::Complex && registry.is_assignable(owner, ty)
            })
        })
    };
    if registry.kind_of(ctx.source) != TypeKind::Complex
        || !refers_to(source_element, ctx.source)
        || refers_to(target_element, ctx.target)
    {
        return None;
    }
    identifier_name(ctx, source_element)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use vc_schema::info::TypeId;
    use vc_schema::registry::{StructBuilder, TypeRegistry};

    use crate::Mapper;
    use crate::config::MapperConfig;
    use crate::plan::{MapperKey, builder::PlanContext};

    fn registry() -> (Arc<TypeRegistry>, [TypeId; 3]) {
        let mut registry = TypeRegistry::new();
        let order = registry
            .register_struct(StructBuilder::new("shop::Order").member("OrderId", TypeId::I32))
            .unwrap();
        let line = registry
            .register_struct(StructBuilder::new("shop::LineDto").member("LineId", TypeId::I32))
            .unwrap();
        let note = registry
            .register_struct(StructBuilder::new("shop::Note").member("Text", TypeId::STRING))
            .unwrap();
        (Arc::new(registry), [order, line, note])
    }

    #[test]
    fn identifier_names() {
        let (registry, [order, line, note]) = registry();
        let mut config = MapperConfig::new();
        config.identifier(note, "Text");
        let mapper = Mapper::new(registry, config).unwrap();

        let key = MapperKey::new(order, order, crate::RuleSet::CreateNew);
        let ctx = PlanContext::new(mapper.inner(), &key);
        assert_eq!(super::identifier_name(&ctx, order).as_deref(), Some("OrderId"));
        assert_eq!(super::identifier_name(&ctx, line).as_deref(), Some("LineId"));
        assert_eq!(super::identifier_name(&ctx, note).as_deref(), Some("Text"));
        assert_eq!(super::identifier_name(&ctx, TypeId::I32), None);
    }
}
