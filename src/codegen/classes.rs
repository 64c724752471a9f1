//! Emission of the code section of a class: its constructor, then its
//! instance methods, then its static methods.

use crate::common::{
    ast::{OpalClass, OpalStatement},
    classes::ClassIndex,
};

use super::{
    context::{FrameContext, ProgramContext},
    expression, layout, statement, vm, FallableInstructions,
};

pub fn construct(
    class: &OpalClass,
    classes: &ClassIndex,
    program_context: &mut ProgramContext,
) -> FallableInstructions {
    let constructor = construct_constructor(class, classes, program_context)?;

    let instance_methods = class
        .instance_methods
        .iter()
        .map(|method| {
            let frame = FrameContext::for_method(class, method);
            construct_method_body(&class.name, &method.name, &method.body, frame, classes, program_context)
        })
        .collect::<Result<Vec<_>, _>>()?
        .concat();

    let static_methods = class
        .static_methods
        .iter()
        .map(|method| {
            let frame = FrameContext::for_static_method(method);
            construct_method_body(&class.name, &method.name, &method.body, frame, classes, program_context)
        })
        .collect::<Result<Vec<_>, _>>()?
        .concat();

    Ok([
        vec![vm::comment(format!("class {}", class.name))],
        constructor,
        instance_methods,
        static_methods,
    ]
    .concat())
}

/// Constructor code: run the superclass constructor on `this` first
/// (with the superclass arguments evaluated in the parameter scope),
/// then the body.
fn construct_constructor(
    class: &OpalClass,
    classes: &ClassIndex,
    program_context: &mut ProgramContext,
) -> FallableInstructions {
    let frame = FrameContext::for_constructor(class);

    let super_call = match &class.extends {
        Some(extends) => {
            let arguments = extends
                .arguments
                .iter()
                .map(|argument| expression::construct(argument, &frame, classes))
                .collect::<Result<Vec<_>, _>>()?
                .concat();

            [
                vec![vm::pushl(frame.addresses.slot("this")?)],
                arguments,
                vec![
                    vm::pusha(layout::constructor_label(&extends.name)),
                    vm::vm_call(),
                    vm::popn(extends.arguments.len() + 1),
                ],
            ]
            .concat()
        }
        None => Vec::new(),
    };

    Ok([
        vec![vm::label(layout::constructor_label(&class.name))],
        super_call,
        statement::construct(&class.constructor.body, &frame, classes, program_context)?,
        vec![vm::vm_return()],
    ]
    .concat())
}

fn construct_method_body(
    class_name: &str,
    method_name: &str,
    body: &OpalStatement,
    frame: FrameContext,
    classes: &ClassIndex,
    program_context: &mut ProgramContext,
) -> FallableInstructions {
    Ok([
        vec![vm::label(layout::method_label(class_name, method_name))],
        statement::construct(body, &frame, classes, program_context)?,
        vec![vm::vm_return()],
    ]
    .concat())
}
