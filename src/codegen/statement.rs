use crate::{
    common::{
        ast::{OpalExpression, OpalStatement},
        classes::ClassIndex,
        types,
    },
    error::ContextualError,
};

use super::{
    context::{FrameContext, ProgramContext},
    expression, layout, vm, FallableInstructions,
};

/// Emit a statement; every case is stack-neutral.
pub fn construct(
    statement: &OpalStatement,
    frame: &FrameContext,
    classes: &ClassIndex,
    program_context: &mut ProgramContext,
) -> FallableInstructions {
    match statement {
        OpalStatement::Block {
            variables,
            statements,
        } => {
            let inner = frame.enter_block(variables);

            let body = statements
                .iter()
                .map(|statement| construct(statement, &inner, classes, program_context))
                .collect::<Result<Vec<_>, _>>()?
                .concat();

            Ok([
                vec![vm::pushn(variables.len())],
                body,
                vec![vm::popn(variables.len())],
            ]
            .concat())
        }

        OpalStatement::Assign { target, value } => {
            construct_assignment(target, value, frame, classes)
        }

        OpalStatement::Return => Ok(vec![vm::vm_return()]),

        OpalStatement::IfElse {
            condition,
            then_branch,
            else_branch,
        } => {
            let else_label = program_context.labels.fresh();
            let end_label = program_context.labels.fresh();

            Ok([
                expression::construct(condition, frame, classes)?,
                vec![vm::jz(else_label.clone())],
                construct(then_branch, frame, classes, program_context)?,
                vec![vm::jump(end_label.clone()), vm::label(else_label)],
                construct(else_branch, frame, classes, program_context)?,
                vec![vm::label(end_label)],
            ]
            .concat())
        }

        OpalStatement::Expression(expression) => Ok([
            expression::construct(expression, frame, classes)?,
            vec![vm::popn(1)],
        ]
        .concat()),
    }
}

fn construct_assignment(
    target: &OpalExpression,
    value: &OpalExpression,
    frame: &FrameContext,
    classes: &ClassIndex,
) -> FallableInstructions {
    match target {
        OpalExpression::Identifier(name) => Ok([
            expression::construct(value, frame, classes)?,
            vec![vm::storel(frame.addresses.slot(name)?)],
        ]
        .concat()),

        OpalExpression::Attribute { object, name } => {
            let object_type = types::expression_type(classes, &frame.environment, object)?;
            let offset = layout::attribute_offset(classes, &object_type, name)?;

            Ok([
                expression::construct(object, frame, classes)?,
                expression::construct(value, frame, classes)?,
                vec![vm::store(offset)],
            ]
            .concat())
        }

        OpalExpression::StaticAttribute { class_name, name } => Ok([
            expression::construct(value, frame, classes)?,
            vec![vm::storeg(layout::static_attribute_offset(
                classes, class_name, name,
            )?)],
        ]
        .concat()),

        // the checker rejects every other target shape
        _ => Err(ContextualError::AssignToNonLValue),
    }
}
