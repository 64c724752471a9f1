//! Types representing the structure of an Opal program.
//!
//! Note: all types are prefixed with `Opal` to avoid potential
//! name collision with existing keywords/phrases (e.g. String).
//!
//! Every value here is produced by the parser and read-only afterwards;
//! the checker and the generator only ever borrow it.

#[derive(Debug)]
pub struct OpalProgram {
    pub classes: Vec<OpalClass>,
    /// Top-level statement executed between `START` and `STOP`.
    pub main: OpalStatement,
}

// region: declarations

#[derive(Debug)]
pub struct OpalClass {
    pub name: String,
    pub extends: Option<OpalExtends>,
    pub constructor: OpalConstructor,
    pub instance_attributes: Vec<OpalTypedName>,
    pub static_attributes: Vec<OpalTypedName>,
    pub instance_methods: Vec<OpalMethod>,
    pub static_methods: Vec<OpalMethod>,
}

/// Superclass clause of a class declaration: the superclass name and
/// the arguments forwarded to its constructor.
#[derive(Debug)]
pub struct OpalExtends {
    pub name: String,
    pub arguments: Vec<OpalExpression>,
}

/// A `name: ClassName` pair, used for parameters, attributes and
/// block-local variables alike.
#[derive(Debug, Clone)]
pub struct OpalTypedName {
    pub name: String,
    pub class_name: String,
}

#[derive(Debug)]
pub struct OpalConstructor {
    pub name: String,
    pub parameters: Vec<OpalTypedName>,
    pub body: OpalStatement,
}

#[derive(Debug)]
pub struct OpalMethod {
    pub name: String,
    pub parameters: Vec<OpalTypedName>,
    pub return_type: Option<String>,
    pub is_override: bool,
    pub body: OpalStatement,
}

// endregion

// region: statements & expressions

#[derive(Debug)]
pub enum OpalStatement {
    Block {
        variables: Vec<OpalTypedName>,
        statements: Vec<OpalStatement>,
    },
    Assign {
        target: OpalExpression,
        value: OpalExpression,
    },
    Return,
    IfElse {
        condition: OpalExpression,
        then_branch: Box<OpalStatement>,
        else_branch: Box<OpalStatement>,
    },
    Expression(OpalExpression),
}

#[derive(Debug)]
pub enum OpalExpression {
    Identifier(String),
    Integer(i64),
    Literal(String),
    Attribute {
        object: Box<OpalExpression>,
        name: String,
    },
    StaticAttribute {
        class_name: String,
        name: String,
    },
    Negative(Box<OpalExpression>),
    Binary {
        left: Box<OpalExpression>,
        operator: OpalOperator,
        right: Box<OpalExpression>,
    },
    Concat {
        left: Box<OpalExpression>,
        right: Box<OpalExpression>,
    },
    MethodCall {
        object: Box<OpalExpression>,
        method: String,
        arguments: Vec<OpalExpression>,
    },
    StaticCall {
        class_name: String,
        method: String,
        arguments: Vec<OpalExpression>,
    },
    New {
        class_name: String,
        arguments: Vec<OpalExpression>,
    },
    Cast {
        class_name: String,
        object: Box<OpalExpression>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpalOperator {
    Equal,
    NotEqual,
    Less,
    LessEqual,
    Greater,
    GreaterEqual,
    Add,
    Subtract,
    Multiply,
    Divide,
}

// endregion
