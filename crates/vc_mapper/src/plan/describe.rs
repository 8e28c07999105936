use core::fmt;

use serde::Serialize;
use vc_schema::registry::TypeRegistry;

use crate::RuleSet;
use crate::plan::MappingPlan;
use crate::plan::compiled::{BranchOrigin, MemberPopulation, NoteReason, PlanBody, PopulationMode};
use crate::plan::data_source::{DataSource, DataSourceKind};
use crate::plan::node::{ConditionNode, ElementMapping, NestedCall, ValueNode};

// -----------------------------------------------------------------------------
// Descriptions

/// What a plan body does.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PlanKind {
    /// Creates or updates an object member by member.
    Object,
    /// Maps the elements of a list or the entries of a dictionary.
    Collection,
    /// Converts a simple value.
    Convert,
}

/// A serializable summary of a [`MappingPlan`].
///
/// Nodes and conditions are rendered as short expressions: `source.Address.Line1`
/// reads a source member, `$0` a value bound by the data source, and
/// `map(x, A -> B (Merge))` calls another plan.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
///
/// use vc_mapper::config::MapperConfig;
/// use vc_mapper::plan::{DataSourceKind, PlanKind};
/// use vc_mapper::{Mapper, RuleSet};
/// use vc_schema::info::TypeId;
/// use vc_schema::registry::{StructBuilder, TypeRegistry};
///
/// let mut registry = TypeRegistry::new();
/// let person = registry
///     .register_struct(StructBuilder::new("app::Person").member("Name", TypeId::STRING))
///     .unwrap();
/// let dto = registry
///     .register_struct(StructBuilder::new("app::PersonDto").member("Name", TypeId::STRING))
///     .unwrap();
///
/// let mapper = Mapper::new(Arc::new(registry), MapperConfig::new()).unwrap();
/// let description = mapper.plan(person, dto, RuleSet::CreateNew).unwrap().describe();
///
/// assert_eq!(description.kind, PlanKind::Object);
/// assert_eq!(description.members[0].path, "Name");
/// assert_eq!(description.members[0].sources[0].kind, DataSourceKind::Structural);
/// ```
#[derive(Debug, Clone, Serialize)]
pub struct PlanDescription {
    pub source: String,
    pub target: String,
    pub rule_set: RuleSet,
    pub context: String,
    pub kind: PlanKind,
    pub derived: Vec<BranchDescription>,
    pub constructor: Vec<MemberDescription>,
    pub members: Vec<MemberDescription>,
    pub target_sources: Vec<String>,
    pub notes: Vec<NoteDescription>,
    /// The value of collection and conversion plans.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct BranchDescription {
    pub condition: String,
    pub source: String,
    pub target: String,
    pub origin: BranchOrigin,
}

#[derive(Debug, Clone, Serialize)]
pub struct MemberDescription {
    pub path: String,
    pub member_type: String,
    pub mode: PopulationMode,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub guard: Option<String>,
    pub sources: Vec<SourceDescription>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SourceDescription {
    pub kind: DataSourceKind,
    /// The source member path or dictionary key.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub member: Option<String>,
    /// Values bound before the condition, `$0 = source.Name`.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub bindings: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub condition: Option<String>,
    pub value: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct NoteDescription {
    pub member: String,
    pub reason: NoteReason,
}

impl PlanDescription {
    pub(crate) fn new(plan: &MappingPlan) -> Self {
        let registry = &*plan.registry;
        let mut description = Self {
            source: plan.source_path.to_string(),
            target: plan.target_path.to_string(),
            rule_set: plan.key.rule_set,
            context: plan.key.context.to_string(),
            kind: PlanKind::Convert,
            derived: Vec::new(),
            constructor: Vec::new(),
            members: Vec::new(),
            target_sources: Vec::new(),
            notes: Vec::new(),
            value: None,
        };

        match &plan.body {
            PlanBody::Object(object) => {
                description.kind = PlanKind::Object;
                description.derived = object
                    .derived
                    .iter()
                    .map(|branch| BranchDescription {
                        condition: Condition::new(&branch.condition, registry).to_string(),
                        source: branch
                            .call
                            .source
                            .map_or_else(|| "<runtime>".to_owned(), |ty| registry.path_of(ty).to_owned()),
                        target: registry.path_of(branch.call.target).to_owned(),
                        origin: branch.origin,
                    })
                    .collect();
                description.constructor = object.constructor.iter().map(|member| describe_member(member, registry)).collect();
                description.members = object.members.iter().map(|member| describe_member(member, registry)).collect();
                description.target_sources = object
                    .target_sources
                    .iter()
                    .map(|source| {
                        let value = Node::new(&source.value, registry);
                        let call = Call::new(&source.call, registry);
                        match &source.condition {
                            Some(condition) => format!("if {} {{ map({value}, {call}) }}", Condition::new(condition, registry)),
                            None => format!("map({value}, {call})"),
                        }
                    })
                    .collect();
                description.notes = object
                    .notes
                    .iter()
                    .map(|note| NoteDescription {
                        member: note.member.to_string(),
                        reason: note.reason,
                    })
                    .collect();
            }
            PlanBody::Collection { value, .. } => {
                description.kind = PlanKind::Collection;
                description.value = Some(Node::new(value, registry).to_string());
            }
            PlanBody::Convert(to) => {
                description.value = Some(format!("convert(source, {})", registry.path_of(*to)));
            }
        }
        description
    }

    /// Returns the description of the target member `path`, ignoring ASCII case.
    pub fn member(&self, path: &str) -> Option<&MemberDescription> {
        self.constructor
            .iter()
            .chain(&self.members)
            .find(|member| member.path.eq_ignore_ascii_case(path))
    }

    /// Returns `true` if the member `path` is reported as not populated.
    pub fn is_unpopulated(&self, path: &str) -> bool {
        self.notes.iter().any(|note| note.member.eq_ignore_ascii_case(path))
    }
}

fn describe_member(population: &MemberPopulation, registry: &TypeRegistry) -> MemberDescription {
    MemberDescription {
        path: population.member.path().to_string(),
        member_type: registry.path_of(population.member.ty()).to_owned(),
        mode: population.mode,
        guard: population
            .guard
            .as_ref()
            .map(|guard| Condition::new(guard, registry).to_string()),
        sources: population
            .sources
            .iter()
            .map(|source| describe_source(source, registry))
            .collect(),
    }
}

fn describe_source(source: &DataSource, registry: &TypeRegistry) -> SourceDescription {
    SourceDescription {
        kind: source.kind,
        member: source.source_member.as_deref().map(str::to_owned),
        bindings: source
            .bindings
            .iter()
            .map(|(index, value)| format!("${index} = {}", Node::new(value, registry)))
            .collect(),
        condition: source
            .condition
            .as_ref()
            .map(|condition| Condition::new(condition, registry).to_string()),
        value: Node::new(&source.value, registry).to_string(),
    }
}

// -----------------------------------------------------------------------------
// Text

impl fmt::Display for PlanDescription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {} ({})", self.source, self.target, self.rule_set)?;
        if !self.context.is_empty() {
            write!(f, " in `{}`", self.context)?;
        }
        writeln!(f)?;

        if let Some(value) = &self.value {
            writeln!(f, "  {value}")?;
        }
        for branch in &self.derived {
            writeln!(f, "  if {} => {} -> {}", branch.condition, branch.source, branch.target)?;
        }
        for member in self.constructor.iter().chain(&self.members) {
            write!(f, "  {}: {} ({:?})", member.path, member.member_type, member.mode)?;
            if let Some(guard) = &member.guard {
                write!(f, " when {guard}")?;
            }
            writeln!(f)?;
            for source in &member.sources {
                write!(f, "    {:?}:", source.kind)?;
                for binding in &source.bindings {
                    write!(f, " let {binding};")?;
                }
                if let Some(condition) = &source.condition {
                    write!(f, " if {condition} =>")?;
                }
                writeln!(f, " {}", source.value)?;
            }
        }
        for source in &self.target_sources {
            writeln!(f, "  <target>: {source}")?;
        }
        for note in &self.notes {
            writeln!(f, "  {}: not populated ({:?})", note.member, note.reason)?;
        }
        Ok(())
    }
}

struct Call<'a> {
    call: &'a NestedCall,
    registry: &'a TypeRegistry,
}

impl<'a> Call<'a> {
    fn new(call: &'a NestedCall, registry: &'a TypeRegistry) -> Self {
        Self { call, registry }
    }
}

impl fmt::Display for Call<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let call = self.call;
        match call.source {
            Some(source) => f.write_str(self.registry.path_of(source))?,
            None => f.write_str("<runtime>")?,
        }
        write!(f, " -> {} ({})", self.registry.path_of(call.target), call.rule_set)?;
        if !call.context.is_root() {
            write!(f, " in `{}`", call.context)?;
        }
        Ok(())
    }
}

struct Node<'a> {
    node: &'a ValueNode,
    registry: &'a TypeRegistry,
}

impl<'a> Node<'a> {
    fn new(node: &'a ValueNode, registry: &'a TypeRegistry) -> Self {
        Self { node, registry }
    }

    fn child(&self, node: &'a ValueNode) -> Self {
        Self::new(node, self.registry)
    }

    fn element(&self, element: &'a ElementMapping, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match element {
            ElementMapping::Convert(to) => write!(f, "convert({})", self.registry.path_of(*to)),
            ElementMapping::Nested(call) => write!(f, "map({})", Call::new(call, self.registry)),
        }
    }
}

impl fmt::Display for Node<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let registry = self.registry;
        match self.node {
            ValueNode::SourceRoot => f.write_str("source"),
            ValueNode::TargetRoot => f.write_str("target"),
            ValueNode::Existing => f.write_str("existing"),
            ValueNode::Local(index) => write!(f, "${index}"),
            ValueNode::Constant(value) => write!(f, "{value:?}"),
            ValueNode::Default(ty) => write!(f, "default({})", registry.path_of(*ty)),
            ValueNode::EmptyCollection(ty) => write!(f, "empty({})", registry.path_of(*ty)),
            ValueNode::Member(member) => write!(f, "source.{}", member.path()),
            ValueNode::Entry(keys) => {
                f.write_str("source[")?;
                for (index, key) in keys.iter().enumerate() {
                    if index > 0 {
                        f.write_str(" | ")?;
                    }
                    write!(f, "{key:?}")?;
                }
                f.write_str("]")
            }
            ValueNode::Elements(key) => write!(f, "elements(source, {key:?})"),
            ValueNode::Function(_) => f.write_str("fn(args)"),
            ValueNode::Convert { value, to } => {
                write!(f, "convert({}, {})", self.child(value), registry.path_of(*to))
            }
            ValueNode::Nested {
                value,
                call,
                onto_existing,
            } => {
                write!(f, "map({}, {}", self.child(value), Call::new(call, registry))?;
                if *onto_existing {
                    f.write_str(", onto existing")?;
                }
                f.write_str(")")
            }
            ValueNode::Enumerable(node) => {
                write!(
                    f,
                    "each({}, {} ({}), ",
                    self.child(&node.source),
                    registry.path_of(node.target_list),
                    node.rule_set
                )?;
                self.element(&node.element, f)?;
                if let Some(identifiers) = &node.identifiers {
                    write!(f, ", by {} = {}", identifiers.source, identifiers.target)?;
                }
                if let Some(order_by) = &node.order_by {
                    write!(f, ", ordered by {order_by}")?;
                }
                f.write_str(")")
            }
            ValueNode::Dictionary(node) => {
                write!(
                    f,
                    "entries({}, {} ({}), ",
                    self.child(&node.source),
                    registry.path_of(node.target_dictionary),
                    node.rule_set
                )?;
                self.element(&node.value, f)?;
                f.write_str(")")
            }
            ValueNode::Flattened(node) => {
                write!(
                    f,
                    "flatten({}, {} ({})",
                    self.child(&node.source),
                    registry.path_of(node.target_dictionary),
                    node.rule_set
                )?;
                for entry in &node.entries {
                    write!(f, ", {:?} = source.{}", entry.key, entry.member.path())?;
                }
                f.write_str(")")
            }
            ValueNode::Let { index, value, body } => {
                write!(f, "let ${index} = {}; {}", self.child(value), self.child(body))
            }
            ValueNode::Conditional {
                condition,
                then,
                otherwise,
            } => write!(
                f,
                "if {} {{ {} }} else {{ {} }}",
                Condition::new(condition, registry),
                self.child(then),
                self.child(otherwise)
            ),
        }
    }
}

struct Condition<'a> {
    condition: &'a ConditionNode,
    registry: &'a TypeRegistry,
}

impl<'a> Condition<'a> {
    fn new(condition: &'a ConditionNode, registry: &'a TypeRegistry) -> Self {
        Self { condition, registry }
    }

    fn join(&self, conditions: &'a [ConditionNode], separator: &str, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if conditions.is_empty() {
            return f.write_str("true");
        }
        for (index, condition) in conditions.iter().enumerate() {
            if index > 0 {
                f.write_str(separator)?;
            }
            match condition {
                ConditionNode::All(_) | ConditionNode::Any(_) => {
                    write!(f, "({})", Condition::new(condition, self.registry))?;
                }
                _ => write!(f, "{}", Condition::new(condition, self.registry))?,
            }
        }
        Ok(())
    }
}

impl fmt::Display for Condition<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let registry = self.registry;
        match self.condition {
            ConditionNode::Configured(_) => f.write_str("fn(args)"),
            ConditionNode::NotNull(value) => write!(f, "{} != null", Node::new(value, registry)),
            ConditionNode::NonZero(value) => write!(f, "{} != 0", Node::new(value, registry)),
            ConditionNode::IsType { value, ty } => {
                write!(f, "{} is {}", Node::new(value, registry), registry.path_of(*ty))
            }
            ConditionNode::TargetAccepts(ty) => write!(f, "target accepts {}", registry.path_of(*ty)),
            ConditionNode::ExistingIsDefault => f.write_str("existing is default"),
            ConditionNode::HasPrefix(prefix) => write!(f, "source has {prefix:?}"),
            ConditionNode::All(conditions) => self.join(conditions, " && ", f),
            ConditionNode::Any(conditions) => self.join(conditions, " || ", f),
        }
    }
}
