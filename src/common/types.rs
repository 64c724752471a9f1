//! Type names, identifier environments and expression typing.

use phf::phf_map;

use crate::{
    common::{ast::OpalExpression, classes::ClassIndex},
    error::{ContextualError, FallableType},
};

/// Built-in pseudo-class of integer values.
pub const INTEGER: &str = "Integer";
/// Built-in pseudo-class of string values.
pub const STRING: &str = "String";
/// Pseudo-type of an expression that produces no value.
pub const VOID: &str = "_Void";

/// Identifiers that user code may never declare.
pub const RESERVED: [&str; 3] = ["this", "super", "result"];

// region: built-in methods

static INTEGER_METHODS: phf::Map<&'static str, usize> = phf_map! {
    "toString" => 0,
};

static STRING_METHODS: phf::Map<&'static str, usize> = phf_map! {
    "print" => 0,
    "println" => 0,
};

/// Arity of a built-in method of `Integer`/`String`, if there is one.
pub fn builtin_method_arity(type_name: &str, method: &str) -> Option<usize> {
    match type_name {
        INTEGER => INTEGER_METHODS.get(method).copied(),
        STRING => STRING_METHODS.get(method).copied(),
        _ => None,
    }
}

// endregion

// region: Environment

/// Ordered mapping from identifier to type name.
///
/// Bindings are pushed in declaration order and looked up back-to-front,
/// so an inner binding shadows an outer one. Scopes clone the
/// environment on entry and drop the clone on exit.
#[derive(Debug, Clone, Default)]
pub struct Environment {
    bindings: Vec<(String, String)>,
}

impl Environment {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn bind(&mut self, name: impl Into<String>, type_name: impl Into<String>) {
        self.bindings.push((name.into(), type_name.into()));
    }

    pub fn lookup(&self, name: &str) -> Option<&str> {
        self.bindings
            .iter()
            .rev()
            .find(|(bound, _)| bound == name)
            .map(|(_, type_name)| type_name.as_str())
    }
}

// endregion

// region: typing

/// Type of an expression, as a class name (or [VOID]).
///
/// The checker establishes every precondition this relies on (identifiers
/// bound, attributes and methods resolvable); on unchecked input the
/// failures simply surface as errors.
pub fn expression_type(
    classes: &ClassIndex,
    environment: &Environment,
    expression: &OpalExpression,
) -> FallableType {
    match expression {
        OpalExpression::Integer(_)
        | OpalExpression::Binary { .. }
        | OpalExpression::Negative(_) => Ok(INTEGER.to_string()),

        OpalExpression::Literal(_) | OpalExpression::Concat { .. } => Ok(STRING.to_string()),

        OpalExpression::Identifier(name) => environment
            .lookup(name)
            .map(str::to_string)
            .ok_or_else(|| ContextualError::UnknownIdentifier(name.clone())),

        OpalExpression::Attribute { object, name } => {
            let object_type = expression_type(classes, environment, object)?;
            let class = classes.get(&object_type)?;

            classes
                .find_instance_attribute(name, class)
                .map(|attribute| attribute.class_name.clone())
                .ok_or_else(|| ContextualError::UnknownAttribute {
                    class: object_type,
                    attribute: name.clone(),
                })
        }

        OpalExpression::StaticAttribute { class_name, name } => classes
            .static_attribute(name, classes.get(class_name)?)
            .map(|attribute| attribute.class_name.clone())
            .ok_or_else(|| ContextualError::UnknownStaticAttribute {
                class: class_name.clone(),
                attribute: name.clone(),
            }),

        OpalExpression::MethodCall { object, method, .. } => {
            let object_type = expression_type(classes, environment, object)?;

            // built-in receivers: every built-in method produces a String
            if builtin_method_arity(&object_type, method).is_some() {
                return Ok(STRING.to_string());
            }

            classes
                .find_method(method, classes.get(&object_type)?)
                .map(|(_, declaration)| return_type_of(declaration.return_type.as_deref()))
                .ok_or_else(|| ContextualError::UnknownMethod {
                    class: object_type,
                    method: method.clone(),
                })
        }

        OpalExpression::StaticCall {
            class_name, method, ..
        } => classes
            .static_method(method, classes.get(class_name)?)
            .map(|declaration| return_type_of(declaration.return_type.as_deref()))
            .ok_or_else(|| ContextualError::UnknownStaticMethod {
                class: class_name.clone(),
                method: method.clone(),
            }),

        OpalExpression::New { class_name, .. } | OpalExpression::Cast { class_name, .. } => {
            Ok(class_name.clone())
        }
    }
}

fn return_type_of(declared: Option<&str>) -> String {
    declared.unwrap_or(VOID).to_string()
}

/// Subtype test between declared classes: `derived` is `base` itself or
/// has it somewhere up the chain. Both names must refer to declared
/// classes; callers gate `Integer`/`String`/[VOID] out beforehand.
pub fn is_base(classes: &ClassIndex, derived: &str, base: &str) -> Result<bool, ContextualError> {
    if derived == base {
        return Ok(true);
    }

    let chain = classes.ancestors(classes.get(derived)?)?;
    Ok(chain.iter().any(|ancestor| ancestor.name == base))
}

/// Conformance of a value of type `from` to an expected type `to`:
/// equal types always conform; otherwise both sides must be declared
/// classes and the subtype test decides.
pub fn conforms(classes: &ClassIndex, from: &str, to: &str) -> Result<bool, ContextualError> {
    if from == to {
        return Ok(true);
    }

    if [INTEGER, STRING, VOID].contains(&from) || [INTEGER, STRING, VOID].contains(&to) {
        return Ok(false);
    }

    is_base(classes, from, to)
}

// endregion
