use crate::{
    common::{
        ast::{OpalExpression, OpalStatement},
        classes::ClassIndex,
        types::{self, Environment},
    },
    error::{ContextualError, FallableCheck},
};

use super::{check_reserved_names, expression::check_expression};

pub fn check_statement(
    classes: &ClassIndex,
    environment: &Environment,
    statement: &OpalStatement,
) -> FallableCheck {
    match statement {
        OpalStatement::Block {
            variables,
            statements,
        } => {
            check_reserved_names(variables)?;

            let mut inner = environment.clone();
            for variable in variables {
                inner.bind(&variable.name, &variable.class_name);
            }

            for statement in statements {
                check_statement(classes, &inner, statement)?;
            }

            Ok(())
        }

        OpalStatement::Assign { target, value } => {
            check_assignment(classes, environment, target, value)
        }

        OpalStatement::Return => Ok(()),

        OpalStatement::IfElse {
            condition,
            then_branch,
            else_branch,
        } => {
            check_expression(classes, environment, condition)?;

            let condition_type = types::expression_type(classes, environment, condition)?;
            if condition_type != types::INTEGER {
                return Err(ContextualError::ConditionNotInteger(condition_type));
            }

            check_statement(classes, environment, then_branch)?;
            check_statement(classes, environment, else_branch)
        }

        OpalStatement::Expression(expression) => {
            check_expression(classes, environment, expression)
        }
    }
}

fn check_assignment(
    classes: &ClassIndex,
    environment: &Environment,
    target: &OpalExpression,
    value: &OpalExpression,
) -> FallableCheck {
    check_expression(classes, environment, target)?;
    check_expression(classes, environment, value)?;

    let target_type = types::expression_type(classes, environment, target)?;
    if target_type == types::VOID {
        return Err(ContextualError::AssignVoid);
    }

    let value_type = types::expression_type(classes, environment, value)?;
    if value_type == types::VOID {
        return Err(ContextualError::AssignVoid);
    }

    match target {
        OpalExpression::Identifier(name) if name == "this" || name == "super" => {
            return Err(ContextualError::AssignToReserved(name.clone()));
        }
        OpalExpression::Identifier(_)
        | OpalExpression::Attribute { .. }
        | OpalExpression::StaticAttribute { .. } => {}
        _ => return Err(ContextualError::AssignToNonLValue),
    }

    if !types::conforms(classes, &value_type, &target_type)? {
        return Err(ContextualError::TypeMismatch {
            expected: format!("`{target_type}`"),
            found: format!("`{value_type}`"),
        });
    }

    Ok(())
}
