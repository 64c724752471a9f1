use crate::{
    common::{
        ast::{OpalExpression, OpalOperator},
        classes::ClassIndex,
        types,
    },
    error::ContextualError,
};

use super::{
    context::FrameContext,
    layout::{self, Vtable},
    vm::{self, VmCommand},
    FallableInstructions,
};

/// Emit an expression; every case leaves exactly one value on the stack.
pub fn construct(
    expression: &OpalExpression,
    frame: &FrameContext,
    classes: &ClassIndex,
) -> FallableInstructions {
    match expression {
        OpalExpression::Identifier(name) => {
            // `super` denotes the same object as `this`, typed differently
            let slot_name = if name == "super" { "this" } else { name };
            Ok(vec![vm::pushl(frame.addresses.slot(slot_name)?)])
        }

        OpalExpression::Integer(value) => Ok(vec![vm::pushi(*value)]),

        OpalExpression::Literal(text) => Ok(vec![vm::pushs(text.clone())]),

        OpalExpression::Negative(inner) => Ok([
            vec![vm::pushi(0)],
            construct(inner, frame, classes)?,
            vec![vm::command(VmCommand::Sub)],
        ]
        .concat()),

        OpalExpression::Binary {
            left,
            operator,
            right,
        } => Ok([
            construct(left, frame, classes)?,
            construct(right, frame, classes)?,
            operator_instructions(*operator),
        ]
        .concat()),

        OpalExpression::Concat { left, right } => Ok([
            construct(left, frame, classes)?,
            construct(right, frame, classes)?,
            vec![vm::command(VmCommand::Concat)],
        ]
        .concat()),

        OpalExpression::Attribute { object, name } => {
            let object_type = types::expression_type(classes, &frame.environment, object)?;
            let offset = layout::attribute_offset(classes, &object_type, name)?;

            Ok([construct(object, frame, classes)?, vec![vm::load(offset)]].concat())
        }

        OpalExpression::StaticAttribute { class_name, name } => Ok(vec![vm::pushg(
            layout::static_attribute_offset(classes, class_name, name)?,
        )]),

        OpalExpression::MethodCall {
            object,
            method,
            arguments,
        } => construct_method_call(object, method, arguments, frame, classes),

        OpalExpression::StaticCall {
            class_name,
            method,
            arguments,
        } => Ok([
            vec![vm::pushi(0)],
            construct_arguments(arguments, frame, classes)?,
            vec![
                vm::pusha(layout::method_label(class_name, method)),
                vm::vm_call(),
                vm::popn(arguments.len()),
            ],
        ]
        .concat()),

        OpalExpression::New {
            class_name,
            arguments,
        } => {
            let class = classes.get(class_name)?;
            let cell_count = layout::all_attributes(classes, class)?.len() + 1;

            Ok([
                vec![
                    vm::alloc(cell_count),
                    vm::dupn(1),
                    vm::pushg(layout::class_global_slot(classes, class_name)?),
                    vm::store(0),
                ],
                construct_arguments(arguments, frame, classes)?,
                vec![
                    vm::pusha(layout::constructor_label(class_name)),
                    vm::vm_call(),
                    vm::popn(arguments.len()),
                ],
            ]
            .concat())
        }

        // the checker only lets up-casts through, so a cast is type-only
        OpalExpression::Cast { object, .. } => construct(object, frame, classes),
    }
}

fn construct_method_call(
    object: &OpalExpression,
    method: &str,
    arguments: &[OpalExpression],
    frame: &FrameContext,
    classes: &ClassIndex,
) -> FallableInstructions {
    let object_type = types::expression_type(classes, &frame.environment, object)?;

    if object_type == types::INTEGER || object_type == types::STRING {
        return construct_builtin_call(object, &object_type, method, frame, classes);
    }

    // `super.m(..)` binds statically to the inherited implementation
    if matches!(object, OpalExpression::Identifier(name) if name == "super") {
        let super_class = classes.get(&object_type)?;
        let (owner, _) = classes.find_method(method, super_class).ok_or_else(|| {
            ContextualError::UnknownMethod {
                class: object_type.clone(),
                method: method.to_string(),
            }
        })?;

        return Ok([
            vec![vm::pushi(0)],
            construct_arguments(arguments, frame, classes)?,
            vec![
                vm::pushl(frame.addresses.slot("this")?),
                vm::pusha(layout::method_label(&owner.name, method)),
                vm::vm_call(),
                vm::popn(arguments.len() + 1),
            ],
        ]
        .concat());
    }

    let class = classes.get(&object_type)?;
    let dispatch_slot = Vtable::build(classes, class)?.offset(method).ok_or_else(|| {
        ContextualError::UnknownMethod {
            class: object_type.clone(),
            method: method.to_string(),
        }
    })?;

    Ok([
        vec![vm::pushi(0)],
        construct_arguments(arguments, frame, classes)?,
        construct(object, frame, classes)?,
        vec![
            vm::dupn(1),
            vm::load(0),
            vm::load(dispatch_slot),
            vm::vm_call(),
            vm::popn(arguments.len() + 1),
        ],
    ]
    .concat())
}

fn construct_builtin_call(
    object: &OpalExpression,
    receiver_type: &str,
    method: &str,
    frame: &FrameContext,
    classes: &ClassIndex,
) -> FallableInstructions {
    let object_instructions = construct(object, frame, classes)?;

    let call_instructions = match (receiver_type, method) {
        (types::INTEGER, "toString") => vec![vm::command(VmCommand::Str)],
        (types::STRING, "print") => vec![vm::dupn(1), vm::command(VmCommand::Writes)],
        (types::STRING, "println") => vec![
            vm::dupn(1),
            vm::command(VmCommand::Writes),
            vm::pushs("\n"),
            vm::command(VmCommand::Writes),
        ],
        _ => {
            return Err(ContextualError::UnknownMethod {
                class: receiver_type.to_string(),
                method: method.to_string(),
            })
        }
    };

    Ok([object_instructions, call_instructions].concat())
}

fn construct_arguments(
    arguments: &[OpalExpression],
    frame: &FrameContext,
    classes: &ClassIndex,
) -> FallableInstructions {
    Ok(arguments
        .iter()
        .map(|argument| construct(argument, frame, classes))
        .collect::<Result<Vec<_>, _>>()?
        .concat())
}

fn operator_instructions(operator: OpalOperator) -> Vec<vm::VmInstruction> {
    match operator {
        OpalOperator::Equal => vec![vm::command(VmCommand::Equal)],
        OpalOperator::NotEqual => vec![
            vm::command(VmCommand::Equal),
            vm::command(VmCommand::Not),
        ],
        OpalOperator::Less => vec![vm::command(VmCommand::Inf)],
        OpalOperator::LessEqual => vec![vm::command(VmCommand::Infeq)],
        OpalOperator::Greater => vec![vm::command(VmCommand::Sup)],
        OpalOperator::GreaterEqual => vec![vm::command(VmCommand::Supeq)],
        OpalOperator::Add => vec![vm::command(VmCommand::Add)],
        OpalOperator::Subtract => vec![vm::command(VmCommand::Sub)],
        OpalOperator::Multiply => vec![vm::command(VmCommand::Mul)],
        OpalOperator::Divide => vec![vm::command(VmCommand::Div)],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::ast::{
        OpalClass, OpalConstructor, OpalMethod, OpalStatement, OpalTypedName,
    };

    fn point_class() -> OpalClass {
        OpalClass {
            name: "Point".to_string(),
            extends: None,
            constructor: OpalConstructor {
                name: "Point".to_string(),
                parameters: vec![OpalTypedName {
                    name: "x0".to_string(),
                    class_name: "Integer".to_string(),
                }],
                body: OpalStatement::Return,
            },
            instance_attributes: vec![OpalTypedName {
                name: "x".to_string(),
                class_name: "Integer".to_string(),
            }],
            static_attributes: Vec::new(),
            instance_methods: vec![OpalMethod {
                name: "getX".to_string(),
                parameters: Vec::new(),
                return_type: Some("Integer".to_string()),
                is_override: false,
                body: OpalStatement::Return,
            }],
            static_methods: Vec::new(),
        }
    }

    fn frame_with_point() -> FrameContext {
        let mut frame = FrameContext::for_main();
        frame.addresses.bind("p");
        frame.environment.bind("p", "Point");
        frame
    }

    #[test]
    fn test_negative_construction() {
        let declarations = Vec::new();
        let classes = ClassIndex::new(&declarations);
        let frame = FrameContext::for_main();

        let negated = OpalExpression::Negative(Box::new(OpalExpression::Integer(7)));

        let expected = ["PUSHI 0", "PUSHI 7", "SUB"].join("\n");

        assert!(construct(&negated, &frame, &classes).is_ok_and(|instructions| {
            vm::VmInstructionBlock::from(instructions).compile() == expected
        }));
    }

    #[test]
    fn test_not_equal_construction() {
        let declarations = Vec::new();
        let classes = ClassIndex::new(&declarations);
        let frame = FrameContext::for_main();

        let comparison = OpalExpression::Binary {
            left: Box::new(OpalExpression::Integer(1)),
            operator: OpalOperator::NotEqual,
            right: Box::new(OpalExpression::Integer(2)),
        };

        let expected = ["PUSHI 1", "PUSHI 2", "EQUAL", "NOT"].join("\n");

        assert!(construct(&comparison, &frame, &classes).is_ok_and(|instructions| {
            vm::VmInstructionBlock::from(instructions).compile() == expected
        }));
    }

    #[test]
    fn test_println_leaves_the_string_as_value() {
        let declarations = Vec::new();
        let classes = ClassIndex::new(&declarations);
        let frame = FrameContext::for_main();

        let call = OpalExpression::MethodCall {
            object: Box::new(OpalExpression::Literal("hi".to_string())),
            method: "println".to_string(),
            arguments: Vec::new(),
        };

        let expected = [
            "PUSHS \"hi\"",
            "DUPN 1",
            "WRITES",
            "PUSHS \"\\n\"",
            "WRITES",
        ]
        .join("\n");

        assert!(construct(&call, &frame, &classes).is_ok_and(|instructions| {
            vm::VmInstructionBlock::from(instructions).compile() == expected
        }));
    }

    #[test]
    fn test_new_construction() {
        let declarations = vec![point_class()];
        let classes = ClassIndex::new(&declarations);
        let frame = FrameContext::for_main();

        let instantiation = OpalExpression::New {
            class_name: "Point".to_string(),
            arguments: vec![OpalExpression::Integer(3)],
        };

        let expected = [
            "ALLOC 2",
            "DUPN 1",
            "PUSHG 0",
            "STORE 0",
            "PUSHI 3",
            "PUSHA _CTOR_Point_",
            "CALL",
            "POPN 1",
        ]
        .join("\n");

        assert!(construct(&instantiation, &frame, &classes).is_ok_and(|instructions| {
            vm::VmInstructionBlock::from(instructions).compile() == expected
        }));
    }

    #[test]
    fn test_virtual_call_goes_through_the_vtable() {
        let declarations = vec![point_class()];
        let classes = ClassIndex::new(&declarations);
        let frame = frame_with_point();

        let call = OpalExpression::MethodCall {
            object: Box::new(OpalExpression::Identifier("p".to_string())),
            method: "getX".to_string(),
            arguments: Vec::new(),
        };

        let expected = [
            "PUSHI 0", // result slot
            "PUSHL 0", // receiver
            "DUPN 1",
            "LOAD 0", // vtable pointer
            "LOAD 0", // dispatch slot of getX
            "CALL",
            "POPN 1",
        ]
        .join("\n");

        assert!(construct(&call, &frame, &classes).is_ok_and(|instructions| {
            vm::VmInstructionBlock::from(instructions).compile() == expected
        }));
    }

    #[test]
    fn test_attribute_load() {
        let declarations = vec![point_class()];
        let classes = ClassIndex::new(&declarations);
        let frame = frame_with_point();

        let access = OpalExpression::Attribute {
            object: Box::new(OpalExpression::Identifier("p".to_string())),
            name: "x".to_string(),
        };

        let expected = ["PUSHL 0", "LOAD 1"].join("\n");

        assert!(construct(&access, &frame, &classes).is_ok_and(|instructions| {
            vm::VmInstructionBlock::from(instructions).compile() == expected
        }));
    }
}
