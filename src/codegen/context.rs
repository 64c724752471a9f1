//! Context information threaded through code generation: the label
//! generator owned by the whole emission, and the per-frame pairing of
//! stack-slot addresses with the lexical environment.

use crate::{
    common::{
        ast::{OpalClass, OpalMethod, OpalTypedName},
        types::Environment,
    },
    error::ContextualError,
};

// region: ProgramContext

/// Context information regarding the entire emission
/// (currently only the fresh-label generator).
#[derive(Debug)]
pub struct ProgramContext {
    pub labels: LabelGenerator,
}

impl ProgramContext {
    pub const fn new() -> Self {
        Self {
            labels: LabelGenerator::new(),
        }
    }
}

/// Monotone counter handing out `lbl<N>` names, unique for the lifetime
/// of one compilation.
#[derive(Debug)]
pub struct LabelGenerator {
    next: usize,
}

impl LabelGenerator {
    const fn new() -> Self {
        Self { next: 0 }
    }

    pub fn fresh(&mut self) -> String {
        let name = format!("lbl{}", self.next);
        self.next += 1;
        name
    }
}

// endregion

// region: FrameContext

/// Per-frame generation state: where each identifier lives in the
/// current stack frame, and what type it has. Cloned on block entry so
/// each scope's view stays independent.
#[derive(Debug, Clone)]
pub struct FrameContext {
    pub addresses: FrameAddresses,
    pub environment: Environment,
}

impl FrameContext {
    /// Frame of the top-level statement: nothing bound, locals from slot 0.
    pub fn for_main() -> Self {
        Self {
            addresses: FrameAddresses::new(),
            environment: Environment::new(),
        }
    }

    /// Constructor frame: `this` at slot 0, parameters at 1..=n.
    pub fn for_constructor(class: &OpalClass) -> Self {
        let mut addresses = FrameAddresses::new();
        addresses.bind("this");
        for parameter in &class.constructor.parameters {
            addresses.bind(&parameter.name);
        }

        Self {
            addresses,
            environment: instance_environment(class, &class.constructor.parameters, None),
        }
    }

    /// Instance method frame: `this` at slot 0, parameters, then
    /// `result` when a return type is declared, then block locals.
    pub fn for_method(class: &OpalClass, method: &OpalMethod) -> Self {
        let mut addresses = FrameAddresses::new();
        addresses.bind("this");
        for parameter in &method.parameters {
            addresses.bind(&parameter.name);
        }
        if method.return_type.is_some() {
            addresses.bind("result");
        }

        Self {
            addresses,
            environment: instance_environment(
                class,
                &method.parameters,
                method.return_type.as_deref(),
            ),
        }
    }

    /// Static method frame: parameters from slot 0, no `this`.
    pub fn for_static_method(method: &OpalMethod) -> Self {
        let mut addresses = FrameAddresses::new();
        for parameter in &method.parameters {
            addresses.bind(&parameter.name);
        }
        if method.return_type.is_some() {
            addresses.bind("result");
        }

        let mut environment = Environment::new();
        for parameter in &method.parameters {
            environment.bind(&parameter.name, &parameter.class_name);
        }
        if let Some(return_type) = &method.return_type {
            environment.bind("result", return_type);
        }

        Self {
            addresses,
            environment,
        }
    }

    /// New scope extending this frame with block-local variables,
    /// each taking the next free local slot.
    pub fn enter_block(&self, variables: &[OpalTypedName]) -> Self {
        let mut inner = self.clone();
        for variable in variables {
            inner.addresses.bind(&variable.name);
            inner.environment.bind(&variable.name, &variable.class_name);
        }
        inner
    }
}

fn instance_environment(
    class: &OpalClass,
    parameters: &[OpalTypedName],
    return_type: Option<&str>,
) -> Environment {
    let mut environment = Environment::new();

    environment.bind("this", &class.name);
    if let Some(extends) = &class.extends {
        environment.bind("super", &extends.name);
    }

    for parameter in parameters {
        environment.bind(&parameter.name, &parameter.class_name);
    }

    if let Some(return_type) = return_type {
        environment.bind("result", return_type);
    }

    environment
}

/// Ordered mapping from identifier to local stack-frame slot.
#[derive(Debug, Clone, Default)]
pub struct FrameAddresses {
    slots: Vec<(String, usize)>,
    next_slot: usize,
}

impl FrameAddresses {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn bind(&mut self, name: &str) -> usize {
        let slot = self.next_slot;
        self.slots.push((name.to_string(), slot));
        self.next_slot += 1;
        slot
    }

    /// Slot of an identifier, innermost binding first. The checker
    /// guarantees every generated identifier resolves; on unchecked
    /// input this degrades into an error instead of a bad frame access.
    pub fn slot(&self, name: &str) -> Result<usize, ContextualError> {
        self.slots
            .iter()
            .rev()
            .find(|(bound, _)| bound == name)
            .map(|(_, slot)| *slot)
            .ok_or_else(|| ContextualError::UnknownIdentifier(name.to_string()))
    }
}

// endregion
