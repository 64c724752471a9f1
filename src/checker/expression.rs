use crate::{
    common::{
        ast::{OpalExpression, OpalTypedName},
        classes::ClassIndex,
        types::{self, Environment},
    },
    error::{ContextualError, FallableCheck},
};

/// Which construct an argument list belongs to; constructor argument
/// failures all collapse into `CtorArgMismatch` naming the class.
pub enum ArgumentSite<'a> {
    Method,
    Constructor(&'a str),
}

pub fn check_expression(
    classes: &ClassIndex,
    environment: &Environment,
    expression: &OpalExpression,
) -> FallableCheck {
    match expression {
        OpalExpression::Integer(_) | OpalExpression::Literal(_) => Ok(()),

        OpalExpression::Identifier(name) => check_identifier(environment, name),

        OpalExpression::Negative(inner) => check_expression(classes, environment, inner),

        OpalExpression::Attribute { object, name } => {
            check_expression(classes, environment, object)?;

            let object_type = types::expression_type(classes, environment, object)?;
            check_not_void(&object_type)?;

            let class = classes.get(&object_type)?;
            if classes.find_instance_attribute(name, class).is_none() {
                return Err(ContextualError::UnknownAttribute {
                    class: object_type,
                    attribute: name.clone(),
                });
            }

            Ok(())
        }

        OpalExpression::StaticAttribute { class_name, name } => {
            let class = classes.get(class_name)?;
            if classes.static_attribute(name, class).is_none() {
                return Err(ContextualError::UnknownStaticAttribute {
                    class: class_name.clone(),
                    attribute: name.clone(),
                });
            }

            Ok(())
        }

        OpalExpression::Binary { left, right, .. } => {
            check_expression(classes, environment, left)?;
            check_expression(classes, environment, right)?;

            let left_type = types::expression_type(classes, environment, left)?;
            let right_type = types::expression_type(classes, environment, right)?;
            if left_type != types::INTEGER || right_type != types::INTEGER {
                return Err(ContextualError::OperandsNotInteger);
            }

            Ok(())
        }

        OpalExpression::Concat { left, right } => {
            check_expression(classes, environment, left)?;
            check_expression(classes, environment, right)?;

            let left_type = types::expression_type(classes, environment, left)?;
            let right_type = types::expression_type(classes, environment, right)?;
            if left_type != types::STRING || right_type != types::STRING {
                return Err(ContextualError::OperandsNotString);
            }

            Ok(())
        }

        OpalExpression::MethodCall {
            object,
            method,
            arguments,
        } => {
            check_expression(classes, environment, object)?;

            let object_type = types::expression_type(classes, environment, object)?;
            check_not_void(&object_type)?;

            if object_type == types::INTEGER || object_type == types::STRING {
                return check_builtin_call(
                    classes,
                    environment,
                    &object_type,
                    method,
                    arguments,
                );
            }

            let class = classes.get(&object_type)?;
            let Some((_, declaration)) = classes.find_method(method, class) else {
                return Err(ContextualError::UnknownMethod {
                    class: object_type,
                    method: method.clone(),
                });
            };

            check_arguments(
                classes,
                environment,
                arguments,
                &declaration.parameters,
                &ArgumentSite::Method,
            )
        }

        OpalExpression::StaticCall {
            class_name,
            method,
            arguments,
        } => {
            let class = classes.get(class_name)?;
            let Some(declaration) = classes.static_method(method, class) else {
                return Err(ContextualError::UnknownStaticMethod {
                    class: class_name.clone(),
                    method: method.clone(),
                });
            };

            check_arguments(
                classes,
                environment,
                arguments,
                &declaration.parameters,
                &ArgumentSite::Method,
            )
        }

        OpalExpression::New {
            class_name,
            arguments,
        } => {
            let class = classes.get(class_name)?;

            check_arguments(
                classes,
                environment,
                arguments,
                &class.constructor.parameters,
                &ArgumentSite::Constructor(class_name),
            )
        }

        OpalExpression::Cast { class_name, object } => {
            check_expression(classes, environment, object)?;
            classes.get(class_name)?;

            let object_type = types::expression_type(classes, environment, object)?;
            let is_up_cast = object_type != types::INTEGER
                && object_type != types::STRING
                && object_type != types::VOID
                && types::is_base(classes, &object_type, class_name)?;

            if !is_up_cast {
                return Err(ContextualError::CastNotUpCast {
                    target: class_name.clone(),
                    found: object_type,
                });
            }

            Ok(())
        }
    }
}

fn check_identifier(environment: &Environment, name: &str) -> FallableCheck {
    if environment.lookup(name).is_some() {
        return Ok(());
    }

    // `super` in a base-class method is a missing superclass, not a typo
    if name == "super" {
        if let Some(this_class) = environment.lookup("this") {
            return Err(ContextualError::SuperMissing(this_class.to_string()));
        }
    }

    Err(ContextualError::UnknownIdentifier(name.to_string()))
}

fn check_not_void(type_name: &str) -> FallableCheck {
    if type_name == types::VOID {
        return Err(ContextualError::TypeMismatch {
            expected: "a value".to_string(),
            found: format!("`{}`", types::VOID),
        });
    }

    Ok(())
}

fn check_builtin_call(
    classes: &ClassIndex,
    environment: &Environment,
    receiver_type: &str,
    method: &str,
    arguments: &[OpalExpression],
) -> FallableCheck {
    let Some(arity) = types::builtin_method_arity(receiver_type, method) else {
        return Err(ContextualError::UnknownMethod {
            class: receiver_type.to_string(),
            method: method.to_string(),
        });
    };

    for argument in arguments {
        check_expression(classes, environment, argument)?;
    }

    if arguments.len() != arity {
        return Err(ContextualError::BuiltinArityMismatch {
            class: receiver_type.to_string(),
            method: method.to_string(),
        });
    }

    Ok(())
}

/// Check an argument list against a parameter list: every argument
/// well-formed, arity matching, and every argument type conforming to
/// the declared parameter class.
pub fn check_arguments(
    classes: &ClassIndex,
    environment: &Environment,
    arguments: &[OpalExpression],
    parameters: &[OpalTypedName],
    site: &ArgumentSite,
) -> FallableCheck {
    for argument in arguments {
        check_expression(classes, environment, argument)?;
    }

    if arguments.len() != parameters.len() {
        return Err(match site {
            ArgumentSite::Constructor(class) => {
                ContextualError::CtorArgMismatch((*class).to_string())
            }
            ArgumentSite::Method => ContextualError::TypeMismatch {
                expected: format!("{} argument(s)", parameters.len()),
                found: format!("{}", arguments.len()),
            },
        });
    }

    for (argument, parameter) in arguments.iter().zip(parameters) {
        let argument_type = types::expression_type(classes, environment, argument)?;
        if !types::conforms(classes, &argument_type, &parameter.class_name)? {
            return Err(match site {
                ArgumentSite::Constructor(class) => {
                    ContextualError::CtorArgMismatch((*class).to_string())
                }
                ArgumentSite::Method => ContextualError::TypeMismatch {
                    expected: format!("`{}`", parameter.class_name),
                    found: format!("`{argument_type}`"),
                },
            });
        }
    }

    Ok(())
}
