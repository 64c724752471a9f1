//! Semantic analysis and code generation core for Opal, a small
//! class-based object language.
//!
//! The crate takes a parsed program ([`ast::OpalProgram`]), verifies it
//! against the language's contextual rules, and emits a textual program
//! for a stack-based virtual machine. Parsing and the VM itself are
//! external collaborators.

pub mod checker;
pub mod codegen;
pub mod common;
pub mod error;

pub use common::ast;
pub use error::ContextualError;

/// Check a program and, when it is well-formed, emit its VM code.
///
/// Fails with the first contextual rule violation; nothing is emitted
/// on failure. Repeated calls on the same program produce byte-identical
/// output.
pub fn compile(program: &ast::OpalProgram) -> Result<String, ContextualError> {
    checker::check_program(program)?;
    codegen::generate_program(program)
}
