//! Contextual analysis of a parsed Opal program.
//!
//! A single pass over the declarations and the top-level statement;
//! the first rule violation aborts the whole pipeline with a
//! [`ContextualError`]. Code generation relies on every rule enforced
//! here and never re-checks them.

use crate::{
    common::{
        ast::{OpalClass, OpalMethod, OpalProgram, OpalTypedName},
        classes::ClassIndex,
        types::{self, Environment},
    },
    error::{ContextualError, FallableCheck},
};

pub mod expression;
pub mod returns;
pub mod statement;

use expression::ArgumentSite;

pub fn check_program(program: &OpalProgram) -> FallableCheck {
    tracing::trace!(classes = program.classes.len(), "checking program");

    check_class_names(&program.classes)?;

    let classes = ClassIndex::new(&program.classes);
    check_inheritance(&classes)?;

    for class in &program.classes {
        check_class(&classes, class)?;
    }

    statement::check_statement(&classes, &Environment::new(), &program.main)
}

// region: program-level checks

fn check_class_names(classes: &[OpalClass]) -> FallableCheck {
    for class in classes {
        if class.name == types::INTEGER || class.name == types::STRING {
            return Err(ContextualError::ReservedClassName(class.name.clone()));
        }
    }

    for (position, class) in classes.iter().enumerate() {
        if classes[..position].iter().any(|earlier| earlier.name == class.name) {
            return Err(ContextualError::DuplicateClass(class.name.clone()));
        }
    }

    Ok(())
}

/// Every named superclass must exist and the hierarchy must be a
/// forest: walking up from any class may never revisit a name on the
/// current path.
fn check_inheritance(classes: &ClassIndex) -> FallableCheck {
    for class in classes.classes() {
        let mut path = vec![class.name.as_str()];
        let mut current = class;

        while let Some(extends) = &current.extends {
            if path.contains(&extends.name.as_str()) {
                return Err(ContextualError::InheritanceCycle(
                    current.name.clone(),
                    extends.name.clone(),
                ));
            }

            current = classes.get(&extends.name)?;
            path.push(current.name.as_str());
        }
    }

    Ok(())
}

// endregion

// region: class-level checks

fn check_class(classes: &ClassIndex, class: &OpalClass) -> FallableCheck {
    check_reserved_names(&class.instance_attributes)?;
    check_reserved_names(&class.static_attributes)?;

    check_constructor(classes, class)?;
    check_overrides(classes, class)?;
    check_duplicate_members(class)?;

    for method in &class.instance_methods {
        check_method(classes, class, method, false)?;
    }
    for method in &class.static_methods {
        check_method(classes, class, method, true)?;
    }

    Ok(())
}

pub(crate) fn check_reserved_names(names: &[OpalTypedName]) -> FallableCheck {
    for declared in names {
        if types::RESERVED.contains(&declared.name.as_str()) {
            return Err(ContextualError::ReservedName(declared.name.clone()));
        }
    }

    Ok(())
}

fn check_constructor(classes: &ClassIndex, class: &OpalClass) -> FallableCheck {
    let constructor = &class.constructor;

    if constructor.name != class.name {
        return Err(ContextualError::CtorNameMismatch {
            class: class.name.clone(),
            found: constructor.name.clone(),
        });
    }

    check_reserved_names(&constructor.parameters)?;

    let environment = class_environment(class, &constructor.parameters, None);

    if let Some(extends) = &class.extends {
        let super_class = classes.get(&extends.name)?;

        expression::check_arguments(
            classes,
            &environment,
            &extends.arguments,
            &super_class.constructor.parameters,
            &ArgumentSite::Constructor(&extends.name),
        )?;
    }

    statement::check_statement(classes, &environment, &constructor.body)
}

/// Override discipline: an instance method carries `override` exactly
/// when it shadows an inherited one, and then only with an identical
/// parameter list (arity and exact class names).
fn check_overrides(classes: &ClassIndex, class: &OpalClass) -> FallableCheck {
    let Some(extends) = &class.extends else {
        for method in &class.instance_methods {
            if method.is_override {
                return Err(ContextualError::OverrideMissing {
                    class: class.name.clone(),
                    method: method.name.clone(),
                });
            }
        }
        return Ok(());
    };

    let super_class = classes.get(&extends.name)?;

    for method in &class.instance_methods {
        match classes.find_method(&method.name, super_class) {
            Some((_, inherited)) => {
                if !method.is_override {
                    return Err(ContextualError::OverrideRequired {
                        class: class.name.clone(),
                        method: method.name.clone(),
                    });
                }

                if !signatures_match(method, inherited) {
                    return Err(ContextualError::OverrideSignatureMismatch {
                        class: class.name.clone(),
                        method: method.name.clone(),
                    });
                }
            }
            None => {
                if method.is_override {
                    return Err(ContextualError::OverrideMissing {
                        class: class.name.clone(),
                        method: method.name.clone(),
                    });
                }
            }
        }
    }

    Ok(())
}

fn signatures_match(method: &OpalMethod, inherited: &OpalMethod) -> bool {
    method.parameters.len() == inherited.parameters.len()
        && method
            .parameters
            .iter()
            .zip(&inherited.parameters)
            .all(|(own, base)| own.class_name == base.class_name)
}

fn check_duplicate_members(class: &OpalClass) -> FallableCheck {
    let attribute_names = |attributes: &[OpalTypedName]| {
        attributes.iter().map(|a| a.name.clone()).collect::<Vec<_>>()
    };
    let method_names =
        |methods: &[OpalMethod]| methods.iter().map(|m| m.name.clone()).collect::<Vec<_>>();

    for names in [
        attribute_names(&class.instance_attributes),
        attribute_names(&class.static_attributes),
        method_names(&class.instance_methods),
        method_names(&class.static_methods),
    ] {
        for (position, name) in names.iter().enumerate() {
            if names[..position].contains(name) {
                return Err(ContextualError::DuplicateMember {
                    class: class.name.clone(),
                    member: name.clone(),
                });
            }
        }
    }

    Ok(())
}

fn check_method(
    classes: &ClassIndex,
    class: &OpalClass,
    method: &OpalMethod,
    is_static: bool,
) -> FallableCheck {
    check_reserved_names(&method.parameters)?;

    let environment = if is_static {
        method_environment(&method.parameters, method.return_type.as_deref())
    } else {
        class_environment(class, &method.parameters, method.return_type.as_deref())
    };

    statement::check_statement(classes, &environment, &method.body)?;

    returns::check_method_returns(class, method)
}

/// Environment of an instance-side body: `this`, `super` when the class
/// extends, then the parameters, then `result` for a declared return type.
fn class_environment(
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

/// Environment of a static method body: parameters and `result` only.
fn method_environment(parameters: &[OpalTypedName], return_type: Option<&str>) -> Environment {
    let mut environment = Environment::new();

    for parameter in parameters {
        environment.bind(&parameter.name, &parameter.class_name);
    }

    if let Some(return_type) = return_type {
        environment.bind("result", return_type);
    }

    environment
}

// endregion
