use std::sync::Arc;

use log::warn;
use vc_schema::Value;
use vc_schema::hash::HashMap;
use vc_schema::info::TypeId;
use vc_schema::value::{ObjectRef, convert};

use crate::config::MappingArgs;
use crate::mapper::MapperInner;
use crate::plan::node::NestedCall;
use crate::plan::{MapperKey, MappingPlan, MemberPopulation, ObjectPlan, PlanBody, PopulationMode, TargetSource};
use crate::{ExecutionCause, MappingExecutionError, RuleSet};

// -----------------------------------------------------------------------------
// Frame

/// The state of one running plan.
pub(super) struct Frame<'f> {
    pub(super) plan: &'f MappingPlan,
    pub(super) source: &'f Value,
    /// The target object, `Null` until it is created.
    pub(super) target: Value,
    /// The current value of the member being populated.
    pub(super) existing: Value,
    pub(super) element_index: Option<usize>,
    pub(super) locals: Vec<Value>,
}

impl<'f> Frame<'f> {
    fn new(plan: &'f MappingPlan, source: &'f Value, target: Value, element_index: Option<usize>) -> Self {
        Self {
            plan,
            source,
            existing: target.clone(),
            target,
            element_index,
            locals: vec![Value::Null; plan.body.locals()],
        }
    }

    pub(super) fn args(&self) -> MappingArgs<'_> {
        MappingArgs::new(self.source, &self.target, self.element_index, &self.plan.registry)
    }

    fn error(&self, member: Option<&Arc<str>>, cause: ExecutionCause) -> MappingExecutionError {
        MappingExecutionError::new(
            self.plan.source_path.clone(),
            self.plan.target_path.clone(),
            member.cloned(),
            cause,
        )
    }
}

// -----------------------------------------------------------------------------
// ExecutionContext

/// The state of one top-level mapping call.
pub(crate) struct ExecutionContext<'m> {
    pub(super) mapper: &'m MapperInner,
    /// Targets created so far, by source address and target type.
    identities: HashMap<(usize, TypeId), ObjectRef>,
}

impl<'m> ExecutionContext<'m> {
    pub(crate) fn new(mapper: &'m MapperInner) -> Self {
        Self {
            mapper,
            identities: HashMap::default(),
        }
    }

    /// Runs `plan` for `source`, onto `existing` for the rule sets that use it.
    ///
    /// A `Null` source leaves the target unchanged. Failures are reported to
    /// the plan's error callbacks, and swallowed when its settings say so.
    pub(crate) fn run(
        &mut self,
        plan: &MappingPlan,
        source: &Value,
        existing: &Value,
        element_index: Option<usize>,
    ) -> Result<Value, MappingExecutionError> {
        if source.is_null() {
            return Ok(existing.clone());
        }

        let result = match self.derived_call(plan, source, existing, element_index) {
            Ok(Some(call)) => return self.call(call, source, existing, element_index),
            Ok(None) => self.execute(plan, source, existing, element_index),
            Err(error) => Err(error),
        };

        result.or_else(|error| {
            let args = MappingArgs::new(source, existing, element_index, &plan.registry);
            for callback in &plan.on_error {
                callback(&args, &error);
            }
            if !plan.settings.swallow_errors {
                return Err(error);
            }
            warn!("{error}, the failure is ignored");
            match plan.key.rule_set {
                RuleSet::CreateNew => Ok(Value::Null),
                _ => Ok(existing.clone()),
            }
        })
    }

    /// Maps `source` through the plan `call` refers to.
    pub(crate) fn call(
        &mut self,
        call: &NestedCall,
        source: &Value,
        existing: &Value,
        element_index: Option<usize>,
    ) -> Result<Value, MappingExecutionError> {
        let Some(runtime) = source.runtime_type() else {
            return Ok(existing.clone());
        };

        let mapper = self.mapper;
        let plan = match call.source {
            Some(declared) => mapper.plan_for(&MapperKey {
                source: declared,
                target: call.target,
                rule_set: call.rule_set,
                context: call.context.clone(),
            }),
            None => {
                let declared = MapperKey {
                    source: TypeId::ANY,
                    target: call.target,
                    rule_set: call.rule_set,
                    context: call.context.clone(),
                };
                mapper.plan_for_runtime(&declared, runtime)
            }
        };

        let plan = plan.map_err(|error| {
            let registry = &mapper.registry;
            MappingExecutionError::new(
                registry.path_of(runtime).into(),
                registry.path_of(call.target).into(),
                None,
                ExecutionCause::Configuration(error),
            )
        })?;
        self.run(&plan, source, existing, element_index)
    }

    /// The derived branch taking over `source`, if any.
    fn derived_call<'p>(
        &mut self,
        plan: &'p MappingPlan,
        source: &Value,
        existing: &Value,
        element_index: Option<usize>,
    ) -> Result<Option<&'p NestedCall>, MappingExecutionError> {
        let PlanBody::Object(object) = &plan.body else {
            return Ok(None);
        };
        let mut frame = Frame::new(plan, source, existing.clone(), element_index);
        for branch in &object.derived {
            let matched = self
                .test(&mut frame, &branch.condition)
                .map_err(|cause| frame.error(None, cause))?;
            if matched {
                return Ok(Some(&branch.call));
            }
        }
        Ok(None)
    }

    fn execute(
        &mut self,
        plan: &MappingPlan,
        source: &Value,
        existing: &Value,
        element_index: Option<usize>,
    ) -> Result<Value, MappingExecutionError> {
        match &plan.body {
            PlanBody::Object(object) => self.run_object(plan, object, source, existing, element_index),
            PlanBody::Collection { value, .. } => {
                let mut frame = Frame::new(plan, source, existing.clone(), element_index);
                self.eval(&mut frame, value).map_err(|cause| frame.error(None, cause))
            }
            PlanBody::Convert(to) => {
                let registry = &plan.registry;
                Ok(convert(registry, source, *to).unwrap_or_else(|| registry.default_value(*to)))
            }
        }
    }

    // -------------------------------------------------------------------------
    // Objects

    fn run_object(
        &mut self,
        plan: &MappingPlan,
        object: &ObjectPlan,
        source: &Value,
        existing: &Value,
        element_index: Option<usize>,
    ) -> Result<Value, MappingExecutionError> {
        let registry = &*plan.registry;
        let identity = source
            .address()
            .filter(|_| plan.settings.identity_integrity && plan.key.context.is_root())
            .map(|address| (address, object.target));
        if let Some(mapped) = identity.and_then(|identity| self.identities.get(&identity)) {
            return Ok(Value::Object(mapped.clone()));
        }

        let reused = match existing {
            Value::Object(target) if plan.key.rule_set.uses_existing() => {
                registry.is_assignable(target.type_id(), object.target).then(|| target.clone())
            }
            _ => None,
        };
        let mut frame = Frame::new(plan, source, Value::Null, element_index);
        let target = match reused {
            Some(target) => target,
            None => self.create(&mut frame, object)?,
        };
        if let Some(identity) = identity {
            self.identities.insert(identity, target.clone());
        }

        frame.target = Value::Object(target.clone());
        for population in &object.members {
            frame.existing = target.get(population.member.slot());
            self.populate(&mut frame, population, &target)
                .map_err(|cause| frame.error(Some(population.member.path()), cause))?;
        }

        for target_source in &object.target_sources {
            frame.existing = frame.target.clone();
            let value = self
                .target_source_value(&mut frame, target_source)
                .map_err(|cause| frame.error(None, cause))?;
            let Some(value) = value else {
                continue;
            };
            let target_value = frame.target.clone();
            self.call(&target_source.call, &value, &target_value, element_index)
                .map_err(|error| frame.error(None, ExecutionCause::Nested(Box::new(error))))?;
        }

        Ok(Value::Object(target))
    }

    /// Creates the target object: callbacks, constructor members, then the instance.
    fn create(&mut self, frame: &mut Frame<'_>, object: &ObjectPlan) -> Result<ObjectRef, MappingExecutionError> {
        let plan = frame.plan;
        for callback in &plan.before_create {
            callback(&frame.args()).map_err(|error| frame.error(None, ExecutionCause::Callback(error)))?;
        }

        let mut arguments = Vec::with_capacity(object.constructor.len());
        for population in &object.constructor {
            frame.existing = Value::Null;
            let value = self
                .eval(frame, &population.value)
                .map_err(|cause| frame.error(Some(population.member.path()), cause))?;
            arguments.push((population.member.slot(), value));
        }

        let target = plan
            .registry
            .instantiate(object.target)
            .map_err(|error| frame.error(None, ExecutionCause::Schema(error)))?;
        for (slot, value) in arguments {
            target.set(slot, value);
        }

        frame.target = Value::Object(target.clone());
        for callback in &plan.after_create {
            callback(&frame.args()).map_err(|error| frame.error(None, ExecutionCause::Callback(error)))?;
        }
        Ok(target)
    }

    fn target_source_value(&mut self, frame: &mut Frame<'_>, source: &TargetSource) -> Result<Option<Value>, ExecutionCause> {
        if let Some(condition) = &source.condition
            && !self.test(frame, condition)?
        {
            return Ok(None);
        }
        self.eval(frame, &source.value).map(Some)
    }

    fn populate(
        &mut self,
        frame: &mut Frame<'_>,
        population: &MemberPopulation,
        target: &ObjectRef,
    ) -> Result<(), ExecutionCause> {
        if let Some(guard) = &population.guard
            && !self.test(frame, guard)?
        {
            return Ok(());
        }

        let slot = population.member.slot();
        match population.mode {
            PopulationMode::Assign => {
                let value = self.eval(frame, &population.value)?;
                target.set(slot, value);
            }
            PopulationMode::InPlace => {
                self.eval(frame, &population.value)?;
            }
            PopulationMode::Sequential => {
                for source in &population.sources {
                    for (index, value) in &source.bindings {
                        let value = self.eval(frame, value)?;
                        frame.locals[*index] = value;
                    }
                    if let Some(condition) = &source.condition
                        && !self.test(frame, condition)?
                    {
                        continue;
                    }
                    let value = self.eval(frame, &source.value)?;
                    target.set(slot, value.clone());
                    frame.existing = value;
                }
            }
        }
        Ok(())
    }
}
