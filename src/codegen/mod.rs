//! Logic for converting a checked Opal program (_AST_)
//! to stack-machine instructions.
//!
//! Emission order: the vtable of every class (their pointers become
//! globals `0..N-1`), the static-attribute region, the top-level
//! statement between `START` and `STOP`, then per class the
//! constructor, instance methods and static methods.

use crate::{
    common::{ast::OpalProgram, classes::ClassIndex},
    error::ContextualError,
};

pub mod classes;
pub mod context;
pub mod expression;
pub mod layout;
pub mod statement;
pub mod vm;

use context::{FrameContext, ProgramContext};
use layout::Vtable;

pub type FallableInstructions = Result<Vec<vm::VmInstruction>, ContextualError>;

/// Emit the whole VM program. Expects a checked AST; on unchecked input
/// the resolution failures surface as errors instead of bad code.
pub fn generate_program(program: &OpalProgram) -> Result<String, ContextualError> {
    tracing::trace!(classes = program.classes.len(), "generating VM program");

    let class_index = ClassIndex::new(&program.classes);
    let mut program_context = ProgramContext::new();
    let mut module = vm::VmProgram::new();

    module.add_block(construct_globals(&class_index)?.into());
    module.add_block(construct_main(program, &class_index, &mut program_context)?.into());

    for class in &program.classes {
        module.add_block(classes::construct(class, &class_index, &mut program_context)?.into());
    }

    let output = module.compile();
    tracing::trace!(output_len = output.len(), "VM program generated");

    Ok(output)
}

/// Global storage setup: one vtable allocation per class in declaration
/// order, each leaving its pointer on the stack as the class' global
/// slot, then one zeroed cell per static attribute.
fn construct_globals(classes: &ClassIndex) -> FallableInstructions {
    let mut instructions = vec![vm::comment("Opal program")];

    for class in classes.classes() {
        let vtable = Vtable::build(classes, class)?;

        instructions.push(vm::comment(format!("vtable {}", class.name)));
        instructions.push(vm::alloc(vtable.entries().len()));

        for (slot, entry) in vtable.entries().iter().enumerate() {
            instructions.push(vm::dupn(1));
            instructions.push(vm::pusha(layout::method_label(&entry.owner, &entry.method)));
            instructions.push(vm::store(slot));
        }
    }

    instructions.push(vm::comment("static attributes"));
    instructions.push(vm::pushn(layout::static_region_size(classes)));

    Ok(instructions)
}

fn construct_main(
    program: &OpalProgram,
    classes: &ClassIndex,
    program_context: &mut ProgramContext,
) -> FallableInstructions {
    let frame = FrameContext::for_main();

    Ok([
        vec![vm::comment("main program"), vm::command(vm::VmCommand::Start)],
        statement::construct(&program.main, &frame, classes, program_context)?,
        vec![vm::command(vm::VmCommand::Stop)],
    ]
    .concat())
}
