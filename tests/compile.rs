//! Whole-program compilation scenarios: checked programs compile to
//! the expected instruction stream, ill-formed programs fail with the
//! right error, and emission is deterministic.

use opalc::ast::{
    OpalClass, OpalConstructor, OpalExpression, OpalExtends, OpalMethod, OpalProgram,
    OpalStatement, OpalTypedName,
};
use opalc::codegen::vm::{VmCommand, VmInstruction};
use opalc::{compile, ContextualError};

// region: AST construction helpers

fn typed(name: &str, class_name: &str) -> OpalTypedName {
    OpalTypedName {
        name: name.to_string(),
        class_name: class_name.to_string(),
    }
}

fn block(variables: Vec<OpalTypedName>, statements: Vec<OpalStatement>) -> OpalStatement {
    OpalStatement::Block {
        variables,
        statements,
    }
}

fn assign(target: OpalExpression, value: OpalExpression) -> OpalStatement {
    OpalStatement::Assign { target, value }
}

fn identifier(name: &str) -> OpalExpression {
    OpalExpression::Identifier(name.to_string())
}

fn call(object: OpalExpression, method: &str, arguments: Vec<OpalExpression>) -> OpalExpression {
    OpalExpression::MethodCall {
        object: Box::new(object),
        method: method.to_string(),
        arguments,
    }
}

fn class(name: &str, extends: Option<OpalExtends>) -> OpalClass {
    OpalClass {
        name: name.to_string(),
        extends,
        constructor: OpalConstructor {
            name: name.to_string(),
            parameters: Vec::new(),
            body: block(Vec::new(), Vec::new()),
        },
        instance_attributes: Vec::new(),
        static_attributes: Vec::new(),
        instance_methods: Vec::new(),
        static_methods: Vec::new(),
    }
}

fn extends(name: &str, arguments: Vec<OpalExpression>) -> OpalExtends {
    OpalExtends {
        name: name.to_string(),
        arguments,
    }
}

fn method(name: &str, return_type: Option<&str>, body: OpalStatement) -> OpalMethod {
    OpalMethod {
        name: name.to_string(),
        parameters: Vec::new(),
        return_type: return_type.map(str::to_string),
        is_override: false,
        body,
    }
}

// endregion

#[test]
fn empty_program_compiles_to_the_bare_skeleton() {
    let program = OpalProgram {
        classes: Vec::new(),
        main: block(
            Vec::new(),
            vec![OpalStatement::Expression(OpalExpression::Integer(0))],
        ),
    };

    let expected = [
        "-- Opal program",
        "-- static attributes",
        "PUSHN 0",
        "-- main program",
        "START",
        "PUSHN 0",
        "PUSHI 0",
        "POPN 1",
        "POPN 0",
        "STOP",
    ]
    .join("\n")
        + "\n";

    assert_eq!(compile(&program).unwrap(), expected);
}

#[test]
fn single_class_with_dispatched_call() {
    let mut a = class("A", None);
    a.instance_methods.push(method(
        "m",
        Some("Integer"),
        block(
            Vec::new(),
            vec![assign(identifier("result"), OpalExpression::Integer(42))],
        ),
    ));

    let program = OpalProgram {
        classes: vec![a],
        main: block(
            vec![typed("a", "A")],
            vec![
                assign(
                    identifier("a"),
                    OpalExpression::New {
                        class_name: "A".to_string(),
                        arguments: Vec::new(),
                    },
                ),
                OpalStatement::Expression(call(identifier("a"), "m", Vec::new())),
            ],
        ),
    };

    let expected = [
        // globals: one vtable, no statics
        "-- Opal program",
        "-- vtable A",
        "ALLOC 1",
        "DUPN 1",
        "PUSHA A_1_m",
        "STORE 0",
        "-- static attributes",
        "PUSHN 0",
        // main
        "-- main program",
        "START",
        "PUSHN 1",
        // a := new A()
        "ALLOC 1",
        "DUPN 1",
        "PUSHG 0",
        "STORE 0",
        "PUSHA _CTOR_A_",
        "CALL",
        "POPN 0",
        "STOREL 0",
        // a.m() through vtable slot 0
        "PUSHI 0",
        "PUSHL 0",
        "DUPN 1",
        "LOAD 0",
        "LOAD 0",
        "CALL",
        "POPN 1",
        "POPN 1",
        "POPN 1",
        "STOP",
        // class A code
        "-- class A",
        "_CTOR_A_: NOP",
        "PUSHN 0",
        "POPN 0",
        "RETURN",
        "A_1_m: NOP",
        "PUSHN 0",
        "PUSHI 42",
        "STOREL 1",
        "POPN 0",
        "RETURN",
    ]
    .join("\n")
        + "\n";

    assert_eq!(compile(&program).unwrap(), expected);
}

#[test]
fn inheritance_cycle_is_rejected() {
    let program = OpalProgram {
        classes: vec![
            class("A", Some(extends("B", Vec::new()))),
            class("B", Some(extends("A", Vec::new()))),
        ],
        main: block(Vec::new(), Vec::new()),
    };

    assert!(matches!(
        compile(&program),
        Err(ContextualError::InheritanceCycle(a, b))
            if [&a[..], &b[..]].contains(&"A") && [&a[..], &b[..]].contains(&"B")
    ));
}

#[test]
fn override_with_different_parameter_class_is_rejected() {
    let mut base = class("Base", None);
    base.instance_methods.push(OpalMethod {
        name: "m".to_string(),
        parameters: vec![typed("x", "String")],
        return_type: Some("Integer".to_string()),
        is_override: false,
        body: block(
            Vec::new(),
            vec![assign(identifier("result"), OpalExpression::Integer(0))],
        ),
    });

    let mut derived = class("Derived", Some(extends("Base", Vec::new())));
    derived.instance_methods.push(OpalMethod {
        name: "m".to_string(),
        parameters: vec![typed("x", "Integer")],
        return_type: Some("Integer".to_string()),
        is_override: true,
        body: block(
            Vec::new(),
            vec![assign(identifier("result"), OpalExpression::Integer(0))],
        ),
    });

    let program = OpalProgram {
        classes: vec![base, derived],
        main: block(Vec::new(), Vec::new()),
    };

    assert!(matches!(
        compile(&program),
        Err(ContextualError::OverrideSignatureMismatch { class, method })
            if class == "Derived" && method == "m"
    ));
}

#[test]
fn uncovered_return_path_is_rejected() {
    let mut a = class("A", None);
    a.instance_methods.push(method(
        "m",
        Some("Integer"),
        OpalStatement::IfElse {
            condition: OpalExpression::Integer(1),
            then_branch: Box::new(assign(identifier("result"), OpalExpression::Integer(1))),
            else_branch: Box::new(block(Vec::new(), Vec::new())),
        },
    ));

    let program = OpalProgram {
        classes: vec![a],
        main: block(Vec::new(), Vec::new()),
    };

    assert!(matches!(
        compile(&program),
        Err(ContextualError::MissingReturnPath { class, method })
            if class == "A" && method == "m"
    ));
}

#[test]
fn println_on_a_literal_writes_and_keeps_the_string() {
    let program = OpalProgram {
        classes: Vec::new(),
        main: block(
            Vec::new(),
            vec![OpalStatement::Expression(call(
                OpalExpression::Literal("hi".to_string()),
                "println",
                Vec::new(),
            ))],
        ),
    };

    let output = compile(&program).unwrap();

    let expected_fragment = [
        "PUSHS \"hi\"",
        "DUPN 1",
        "WRITES",
        "PUSHS \"\\n\"",
        "WRITES",
        "POPN 1",
    ]
    .join("\n");

    assert!(output.contains(&expected_fragment));
}

#[test]
fn super_calls_bind_to_the_defining_ancestor() {
    // `top` is declared by A, inherited untouched by B; C's `top` calls
    // `super.top()`, which must bind to A's label, two levels up.
    let mut a = class("A", None);
    a.instance_methods.push(method(
        "top",
        Some("Integer"),
        block(
            Vec::new(),
            vec![assign(identifier("result"), OpalExpression::Integer(1))],
        ),
    ));

    let b = class("B", Some(extends("A", Vec::new())));

    let mut c = class("C", Some(extends("B", Vec::new())));
    c.instance_methods.push(OpalMethod {
        name: "top".to_string(),
        parameters: Vec::new(),
        return_type: Some("Integer".to_string()),
        is_override: true,
        body: block(
            Vec::new(),
            vec![assign(
                identifier("result"),
                call(identifier("super"), "top", Vec::new()),
            )],
        ),
    });

    let program = OpalProgram {
        classes: vec![a, b, c],
        main: block(Vec::new(), Vec::new()),
    };

    let output = compile(&program).unwrap();

    let expected_fragment = ["PUSHI 0", "PUSHL 0", "PUSHA A_3_top", "CALL", "POPN 1"].join("\n");
    assert!(output.contains(&expected_fragment));

    // and C's vtable slot for `top` points at C's own implementation
    assert!(output.contains("-- vtable C\nALLOC 1\nDUPN 1\nPUSHA C_3_top"));
}

#[test]
fn compilation_is_deterministic_and_labels_are_unique() {
    let branch = |value: i64| {
        OpalStatement::IfElse {
            condition: OpalExpression::Integer(value),
            then_branch: Box::new(block(Vec::new(), Vec::new())),
            else_branch: Box::new(block(Vec::new(), Vec::new())),
        }
    };

    let program = OpalProgram {
        classes: Vec::new(),
        main: block(Vec::new(), vec![branch(1), branch(2)]),
    };

    let first = compile(&program).unwrap();
    let second = compile(&program).unwrap();
    assert_eq!(first, second);

    let definitions: Vec<&str> = first
        .lines()
        .filter(|line| line.ends_with(": NOP"))
        .collect();
    let mut deduplicated = definitions.clone();
    deduplicated.dedup();

    assert_eq!(definitions, vec!["lbl0: NOP", "lbl1: NOP", "lbl2: NOP", "lbl3: NOP"]);
    assert_eq!(definitions, deduplicated);
}

#[test]
fn call_free_statements_are_stack_neutral() {
    use opalc::codegen::context::{FrameContext, ProgramContext};
    use opalc::codegen::statement;
    use opalc::common::classes::ClassIndex;

    let statement_under_test = block(
        vec![typed("n", "Integer")],
        vec![
            assign(identifier("n"), OpalExpression::Integer(3)),
            OpalStatement::IfElse {
                condition: OpalExpression::Binary {
                    left: Box::new(identifier("n")),
                    operator: opalc::ast::OpalOperator::Less,
                    right: Box::new(OpalExpression::Integer(10)),
                },
                then_branch: Box::new(block(
                    Vec::new(),
                    vec![OpalStatement::Expression(OpalExpression::Negative(
                        Box::new(identifier("n")),
                    ))],
                )),
                else_branch: Box::new(block(Vec::new(), Vec::new())),
            },
        ],
    );

    let declarations = Vec::new();
    let classes = ClassIndex::new(&declarations);
    let frame = FrameContext::for_main();
    let mut program_context = ProgramContext::new();

    let instructions =
        statement::construct(&statement_under_test, &frame, &classes, &mut program_context)
            .unwrap();

    let delta: i64 = instructions.iter().map(stack_delta).sum();
    assert_eq!(delta, 0);
}

/// Net stack effect of one instruction, for call-free code.
fn stack_delta(instruction: &VmInstruction) -> i64 {
    match instruction {
        VmInstruction::PushInt(_)
        | VmInstruction::PushString(_)
        | VmInstruction::PushGlobal(_)
        | VmInstruction::PushLocal(_)
        | VmInstruction::PushAddress(_)
        | VmInstruction::Alloc(_) => 1,
        VmInstruction::StoreLocal(_) | VmInstruction::StoreGlobal(_) => -1,
        VmInstruction::Store(_) => -2,
        // LOAD pops the base pointer and pushes the slot value
        VmInstruction::Load(_) => 0,
        VmInstruction::PushN(count) | VmInstruction::DupN(count) => *count as i64,
        VmInstruction::PopN(count) => -(*count as i64),
        VmInstruction::JumpZero(_) => -1,
        VmInstruction::Command(command) => match command {
            VmCommand::Equal
            | VmCommand::Inf
            | VmCommand::Infeq
            | VmCommand::Sup
            | VmCommand::Supeq
            | VmCommand::Add
            | VmCommand::Sub
            | VmCommand::Mul
            | VmCommand::Div
            | VmCommand::Concat
            | VmCommand::Writes
            | VmCommand::Writei => -1,
            _ => 0,
        },
        _ => 0,
    }
}
