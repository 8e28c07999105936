use core::cmp::Ordering;

use vc_schema::Value;
use vc_schema::info::TypeId;
use vc_schema::registry::TypeRegistry;
use vc_schema::value::{DictionaryRef, ListRef, convert};

use crate::exec::ExecutionContext;
use crate::exec::context::Frame;
use crate::member::QualifiedMember;
use crate::plan::node::{
    ConditionNode, DictionaryNode, ElementMapping, EnumerableNode, FlattenedNode, IdentifierPair, ValueNode,
};
use crate::{ExecutionCause, RuleSet};

// -----------------------------------------------------------------------------
// Nodes

impl ExecutionContext<'_> {
    pub(super) fn eval(&mut self, frame: &mut Frame<'_>, node: &ValueNode) -> Result<Value, ExecutionCause> {
        let plan = frame.plan;
        let registry = &*plan.registry;
        let value = match node {
            ValueNode::SourceRoot => frame.source.clone(),
            ValueNode::TargetRoot => frame.target.clone(),
            ValueNode::Existing => frame.existing.clone(),
            ValueNode::Local(index) => frame.locals.get(*index).cloned().unwrap_or_default(),
            ValueNode::Constant(value) => value.clone(),
            ValueNode::Default(ty) => registry.default_value(*ty),
            ValueNode::EmptyCollection(ty) => registry.empty_collection(*ty).unwrap_or_default(),
            ValueNode::Member(member) => read_path(registry, frame.source, member),
            ValueNode::Entry(keys) => frame
                .source
                .as_dictionary()
                .and_then(|dictionary| keys.iter().find_map(|key| dictionary.get_ignore_case(key)))
                .unwrap_or_default(),
            ValueNode::Elements(key) => self.elements(frame, key),
            ValueNode::Function(func) => func(&frame.args()).map_err(ExecutionCause::Callback)?,
            ValueNode::Convert { value, to } => {
                let value = self.eval(frame, value)?;
                convert_or_default(registry, &value, *to)
            }
            ValueNode::Nested {
                value,
                call,
                onto_existing,
            } => {
                let value = self.eval(frame, value)?;
                let existing = if *onto_existing {
                    frame.existing.clone()
                } else {
                    Value::Null
                };
                self.call(call, &value, &existing, None)
                    .map_err(|error| ExecutionCause::Nested(Box::new(error)))?
            }
            ValueNode::Enumerable(node) => self.enumerable(frame, node)?,
            ValueNode::Dictionary(node) => self.dictionary(frame, node)?,
            ValueNode::Flattened(node) => self.flattened(frame, node)?,
            ValueNode::Let { index, value, body } => {
                let value = self.eval(frame, value)?;
                frame.locals[*index] = value;
                self.eval(frame, body)?
            }
            ValueNode::Conditional {
                condition,
                then,
                otherwise,
            } => {
                if self.test(frame, condition)? {
                    self.eval(frame, then)?
                } else {
                    self.eval(frame, otherwise)?
                }
            }
        };
        Ok(value)
    }

    pub(super) fn test(&mut self, frame: &mut Frame<'_>, condition: &ConditionNode) -> Result<bool, ExecutionCause> {
        let plan = frame.plan;
        let registry = &*plan.registry;
        let result = match condition {
            ConditionNode::Configured(condition) => condition(&frame.args()),
            ConditionNode::NotNull(value) => !self.eval(frame, value)?.is_null(),
            ConditionNode::NonZero(value) => {
                let value = self.eval(frame, value)?;
                !value.is_null() && !value.is_zero()
            }
            ConditionNode::IsType { value, ty } => self
                .eval(frame, value)?
                .runtime_type()
                .is_some_and(|runtime| registry.is_subtype_of(runtime, *ty)),
            ConditionNode::TargetAccepts(ty) => match frame.target.runtime_type() {
                Some(runtime) => registry.is_assignable(runtime, *ty),
                None => true,
            },
            ConditionNode::ExistingIsDefault => frame.existing.is_default(),
            ConditionNode::HasPrefix(prefix) => frame
                .source
                .as_dictionary()
                .is_some_and(|dictionary| dictionary.has_prefix_ignore_case(prefix)),
            ConditionNode::All(conditions) => {
                for condition in conditions {
                    if !self.test(frame, condition)? {
                        return Ok(false);
                    }
                }
                true
            }
            ConditionNode::Any(conditions) => {
                for condition in conditions {
                    if self.test(frame, condition)? {
                        return Ok(true);
                    }
                }
                false
            }
        };
        Ok(result)
    }

    /// Collects `key[0]`, `key[1]`, .. of the source dictionary until an index is missing.
    fn elements(&self, frame: &Frame<'_>, key: &str) -> Value {
        let Some(dictionary) = frame.source.as_dictionary() else {
            return Value::Null;
        };
        let naming = self.mapper.config.naming();

        let mut items = Vec::new();
        loop {
            let element_key = naming.element_key(key, items.len());
            if let Some(value) = dictionary.get_ignore_case(&element_key) {
                items.push(value);
                continue;
            }
            let entries = dictionary.entries_with_prefix(&naming.nested_prefix(&element_key));
            if entries.is_empty() {
                break;
            }
            items.push(Value::Dictionary(DictionaryRef::from_entries(dictionary.type_id(), entries)));
        }
        Value::List(ListRef::new(TypeId::ANY, items))
    }

    // -------------------------------------------------------------------------
    // Collections

    fn element(
        &mut self,
        frame: &Frame<'_>,
        mapping: &ElementMapping,
        item: &Value,
        existing: &Value,
        index: usize,
    ) -> Result<Value, ExecutionCause> {
        match mapping {
            ElementMapping::Convert(to) => Ok(convert_or_default(&frame.plan.registry, item, *to)),
            ElementMapping::Nested(call) => self
                .call(call, item, existing, Some(index))
                .map_err(|error| ExecutionCause::Nested(Box::new(error))),
        }
    }

    fn enumerable(&mut self, frame: &mut Frame<'_>, node: &EnumerableNode) -> Result<Value, ExecutionCause> {
        let source = self.eval(frame, &node.source)?;
        let Some(source) = source.as_list() else {
            return Ok(frame.existing.clone());
        };
        let items = match &node.order_by {
            Some(identifier) => ordered_by(source.snapshot(), identifier),
            None => source.snapshot(),
        };

        let existing = match &frame.existing {
            Value::List(list) if node.rule_set.uses_existing() => list.clone(),
            _ => {
                let mut mapped = Vec::with_capacity(items.len());
                for (index, item) in items.iter().enumerate() {
                    mapped.push(self.element(frame, &node.element, item, &Value::Null, index)?);
                }
                return Ok(Value::List(ListRef::new(node.target_list, mapped)));
            }
        };

        let current = existing.snapshot();
        let next = match node.rule_set {
            RuleSet::Overwrite => self.overwrite_elements(frame, node, &items, &current)?,
            _ => self.merge_elements(frame, node, &items, current)?,
        };
        existing.replace(next);
        Ok(Value::List(existing))
    }

    /// Updates the elements matched by identifier and appends the others.
    /// Simple values already present are not added again.
    fn merge_elements(
        &mut self,
        frame: &Frame<'_>,
        node: &EnumerableNode,
        items: &[Value],
        mut current: Vec<Value>,
    ) -> Result<Vec<Value>, ExecutionCause> {
        let known = current.len();
        for (index, item) in items.iter().enumerate() {
            if let ElementMapping::Convert(_) = node.element {
                let value = self.element(frame, &node.element, item, &Value::Null, index)?;
                if !current.contains(&value) {
                    current.push(value);
                }
                continue;
            }

            let matched = node
                .identifiers
                .as_ref()
                .and_then(|pair| find_by_identifier(pair, item, &current[..known], &[]));
            match matched {
                Some(position) => {
                    let existing = current[position].clone();
                    current[position] = self.element(frame, &node.element, item, &existing, index)?;
                }
                None => current.push(self.element(frame, &node.element, item, &Value::Null, index)?),
            }
        }
        Ok(current)
    }

    /// Maps the source elements onto the matching existing elements, by
    /// identifier or else by position, existing elements left unmatched
    /// are removed.
    fn overwrite_elements(
        &mut self,
        frame: &Frame<'_>,
        node: &EnumerableNode,
        items: &[Value],
        current: &[Value],
    ) -> Result<Vec<Value>, ExecutionCause> {
        let mut used = vec![false; current.len()];
        let mut next = Vec::with_capacity(items.len());
        for (index, item) in items.iter().enumerate() {
            let matched = match (&node.element, &node.identifiers) {
                (ElementMapping::Convert(_), _) => None,
                (ElementMapping::Nested(_), Some(pair)) => find_by_identifier(pair, item, current, &used),
                (ElementMapping::Nested(_), None) => (index < current.len() && !used[index]).then_some(index),
            };
            let existing = match matched {
                Some(position) => {
                    used[position] = true;
                    current[position].clone()
                }
                None => Value::Null,
            };
            next.push(self.element(frame, &node.element, item, &existing, index)?);
        }
        Ok(next)
    }

    fn dictionary(&mut self, frame: &mut Frame<'_>, node: &DictionaryNode) -> Result<Value, ExecutionCause> {
        let source = self.eval(frame, &node.source)?;
        let Some(source) = source.as_dictionary() else {
            return Ok(frame.existing.clone());
        };
        let entries = source.entries();

        let (target, previous) = match &frame.existing {
            Value::Dictionary(existing) if node.rule_set.uses_existing() => {
                let previous = existing.entries();
                if node.rule_set == RuleSet::Overwrite {
                    existing.clear();
                }
                (existing.clone(), previous)
            }
            _ => (DictionaryRef::new(node.target_dictionary), Vec::new()),
        };

        for (index, (key, value)) in entries.iter().enumerate() {
            let found = previous.iter().find(|(known, _)| known.eq_ignore_ascii_case(key));
            let (key, existing) = match found {
                Some((known, existing)) => (known.clone(), existing.clone()),
                None => (key.clone(), Value::Null),
            };
            // merging keeps simple values already present
            if node.rule_set == RuleSet::Merge && !existing.is_null() && existing.is_simple() {
                continue;
            }
            let mapped = self.element(frame, &node.value, value, &existing, index)?;
            target.insert(key, mapped);
        }
        Ok(Value::Dictionary(target))
    }

    /// Writes the simple member paths of the source object as entries.
    ///
    /// Paths reading `Null` are skipped. Merging keeps entries that are set.
    fn flattened(&mut self, frame: &mut Frame<'_>, node: &FlattenedNode) -> Result<Value, ExecutionCause> {
        let source = self.eval(frame, &node.source)?;
        if source.as_object().is_none() {
            return Ok(frame.existing.clone());
        }
        let plan = frame.plan;
        let registry = &*plan.registry;

        let target = match &frame.existing {
            Value::Dictionary(existing) if node.rule_set.uses_existing() => existing.clone(),
            _ => DictionaryRef::new(node.target_dictionary),
        };
        let previous = target.keys();

        for entry in &node.entries {
            let value = read_path(registry, &source, &entry.member);
            if value.is_null() {
                continue;
            }
            let key = previous
                .iter()
                .find(|known| known.eq_ignore_ascii_case(&entry.key))
                .unwrap_or(&entry.key);
            if node.rule_set == RuleSet::Merge && target.get(key).is_some_and(|known| !known.is_null()) {
                continue;
            }
            let value = match entry.to {
                TypeId::ANY => value,
                to => convert_or_default(registry, &value, to),
            };
            target.insert(key.clone(), value);
        }
        Ok(Value::Dictionary(target))
    }
}

// -----------------------------------------------------------------------------
// Helpers

fn convert_or_default(registry: &TypeRegistry, value: &Value, to: TypeId) -> Value {
    convert(registry, value, to).unwrap_or_else(|| registry.default_value(to))
}

/// Reads a member path, `Null` when a member on the way is `Null`.
///
/// Values whose runtime type does not derive from the member's owner are
/// read by member name.
fn read_path(registry: &TypeRegistry, source: &Value, member: &QualifiedMember) -> Value {
    let owner = match member.parent() {
        Some(parent) => read_path(registry, source, parent),
        None => source.clone(),
    };
    let Some(object) = owner.as_object() else {
        return Value::Null;
    };
    if registry.is_subtype_of(object.type_id(), member.owner()) {
        object.get(member.slot())
    } else {
        object.get_member(member.name()).unwrap_or_default()
    }
}

/// Sorts elements by an identifier, elements without one last.
fn ordered_by(mut items: Vec<Value>, identifier: &str) -> Vec<Value> {
    items.sort_by(|a, b| match (identifier_of(a, identifier), identifier_of(b, identifier)) {
        (Some(a), Some(b)) => compare_identifiers(&a, &b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    });
    items
}

fn compare_identifiers(a: &Value, b: &Value) -> Ordering {
    if let (Some(a), Some(b)) = (a.as_f64(), b.as_f64()) {
        return a.total_cmp(&b);
    }
    match (a.as_str(), b.as_str()) {
        (Some(a), Some(b)) => a.cmp(b),
        _ => Ordering::Equal,
    }
}

/// Reads an identifier, default values identify nothing.
fn identifier_of(value: &Value, name: &str) -> Option<Value> {
    let identifier = match value {
        Value::Object(object) => object.get_member(name)?,
        Value::Dictionary(dictionary) => dictionary.get_ignore_case(name)?,
        _ => return None,
    };
    (!identifier.is_default()).then_some(identifier)
}

/// The position of the first element of `current` not yet `used` whose
/// identifier matches the identifier of `item`.
fn find_by_identifier(pair: &IdentifierPair, item: &Value, current: &[Value], used: &[bool]) -> Option<usize> {
    let identifier = identifier_of(item, &pair.source)?;
    current.iter().enumerate().position(|(position, element)| {
        !used.get(position).copied().unwrap_or(false)
            && identifier_of(element, &pair.target).is_some_and(|known| known.matches_identifier(&identifier))
    })
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use vc_schema::Value;
    use vc_schema::info::TypeId;
    use vc_schema::registry::{StructBuilder, TypeRegistry};

    use super::{find_by_identifier, identifier_of, read_path};
    use crate::Mapper;
    use crate::config::MapperConfig;
    use crate::plan::node::IdentifierPair;

    #[test]
    fn identifiers() {
        let mut registry = TypeRegistry::new();
        let line = registry
            .register_struct(StructBuilder::new("shop::Line").member("Id", TypeId::I32))
            .unwrap();
        let fresh = registry.new_object(line, []).unwrap();
        let first = registry.new_object(line, [("Id", Value::from(1))]).unwrap();
        let second = registry.new_object(line, [("Id", Value::from(2))]).unwrap();

        assert_eq!(identifier_of(&Value::Object(fresh.clone()), "id"), None);
        assert_eq!(identifier_of(&Value::Object(first.clone()), "Id"), Some(Value::Int(1)));

        let pair = IdentifierPair {
            source: "Id".into(),
            target: "Id".into(),
        };
        let current = [Value::Object(first), Value::Object(second)];
        let item = Value::Object(registry.new_object(line, [("Id", Value::from(2))]).unwrap());
        assert_eq!(find_by_identifier(&pair, &item, &current, &[]), Some(1));
        assert_eq!(find_by_identifier(&pair, &item, &current, &[false, true]), None);
        assert_eq!(find_by_identifier(&pair, &Value::Object(fresh), &current, &[]), None);
    }

    #[test]
    fn read_nested_path() {
        let mut registry = TypeRegistry::new();
        let address = registry
            .register_struct(StructBuilder::new("app::Address").member("Line1", TypeId::STRING))
            .unwrap();
        let customer = registry
            .register_struct(StructBuilder::new("app::Customer").member("Address", address))
            .unwrap();
        let line = registry
            .new_object(address, [("Line1", Value::from("Main Street"))])
            .unwrap();
        let with_address = registry.new_object(customer, [("Address", Value::Object(line))]).unwrap();
        let without_address = registry.new_object(customer, []).unwrap();

        let mapper = Mapper::new(Arc::new(registry), MapperConfig::new()).unwrap();
        let registry = mapper.registry();
        let path = mapper
            .members()
            .source_paths_of(customer)
            .iter()
            .find(|path| &**path.path() == "Address.Line1")
            .cloned()
            .unwrap();

        assert_eq!(read_path(registry, &Value::Object(with_address), &path), Value::from("Main Street"));
        assert_eq!(read_path(registry, &Value::Object(without_address), &path), Value::Null);
    }
}
