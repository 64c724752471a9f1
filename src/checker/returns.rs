//! Definite assignment of `result` in methods declaring a return type.

use crate::{
    common::ast::{OpalClass, OpalExpression, OpalMethod, OpalStatement},
    error::{ContextualError, FallableCheck},
};

/// A method with a declared return type must, on every control-flow
/// path, either reach an explicit `return` or assign `result` first.
pub fn check_method_returns(class: &OpalClass, method: &OpalMethod) -> FallableCheck {
    if method.return_type.is_none() {
        return Ok(());
    }

    if always_yields(&method.body) {
        return Ok(());
    }

    Err(ContextualError::MissingReturnPath {
        class: class.name.clone(),
        method: method.name.clone(),
    })
}

fn always_yields(statement: &OpalStatement) -> bool {
    match statement {
        OpalStatement::Return => true,

        OpalStatement::Assign { target, .. } => {
            matches!(target, OpalExpression::Identifier(name) if name == "result")
        }

        // a block is covered as soon as one of its statements is
        OpalStatement::Block { statements, .. } => statements.iter().any(always_yields),

        OpalStatement::IfElse {
            then_branch,
            else_branch,
            ..
        } => always_yields(then_branch) && always_yields(else_branch),

        OpalStatement::Expression(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assign_result() -> OpalStatement {
        OpalStatement::Assign {
            target: OpalExpression::Identifier("result".into()),
            value: OpalExpression::Integer(1),
        }
    }

    fn empty_block() -> OpalStatement {
        OpalStatement::Block {
            variables: Vec::new(),
            statements: Vec::new(),
        }
    }

    #[test]
    fn test_straight_line_assignment_yields() {
        assert!(always_yields(&OpalStatement::Block {
            variables: Vec::new(),
            statements: vec![
                OpalStatement::Expression(OpalExpression::Integer(0)),
                assign_result(),
            ],
        }));
    }

    #[test]
    fn test_one_sided_branch_does_not_yield() {
        let one_sided = OpalStatement::IfElse {
            condition: OpalExpression::Integer(1),
            then_branch: Box::new(assign_result()),
            else_branch: Box::new(empty_block()),
        };

        assert!(!always_yields(&one_sided));
    }

    #[test]
    fn test_both_branches_yield() {
        let covered = OpalStatement::IfElse {
            condition: OpalExpression::Integer(1),
            then_branch: Box::new(assign_result()),
            else_branch: Box::new(OpalStatement::Return),
        };

        assert!(always_yields(&covered));
    }
}
