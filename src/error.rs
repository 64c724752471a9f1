use thiserror::Error;

/// List of all ways a program can violate the contextual rules of Opal.
///
/// Checking is fail-fast: the first violation aborts the whole pipeline,
/// so exactly one of these ever surfaces per compilation attempt.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ContextualError {
    #[error("`{0}` is a reserved identifier")]
    ReservedName(String),

    #[error("class `{0}` is declared more than once")]
    DuplicateClass(String),

    #[error("unknown class `{0}`")]
    UnknownClass(String),

    #[error("inheritance cycle between `{0}` and `{1}`")]
    InheritanceCycle(String, String),

    #[error("`{0}` is a reserved class name")]
    ReservedClassName(String),

    #[error("class `{class}` declares member `{member}` more than once")]
    DuplicateMember { class: String, member: String },

    #[error("method `{method}` of class `{class}` is marked `override` but overrides nothing")]
    OverrideMissing { class: String, method: String },

    #[error("method `{method}` of class `{class}` shadows an inherited method without `override`")]
    OverrideRequired { class: String, method: String },

    #[error("override `{method}` of class `{class}` does not match the inherited signature")]
    OverrideSignatureMismatch { class: String, method: String },

    #[error("unknown identifier `{0}`")]
    UnknownIdentifier(String),

    #[error("class `{class}` has no attribute `{attribute}`")]
    UnknownAttribute { class: String, attribute: String },

    #[error("class `{class}` has no static attribute `{attribute}`")]
    UnknownStaticAttribute { class: String, attribute: String },

    #[error("class `{class}` has no method `{method}`")]
    UnknownMethod { class: String, method: String },

    #[error("class `{class}` has no static method `{method}`")]
    UnknownStaticMethod { class: String, method: String },

    #[error("built-in method `{class}.{method}` takes no arguments")]
    BuiltinArityMismatch { class: String, method: String },

    #[error("cannot assign to `{0}`")]
    AssignToReserved(String),

    #[error("left-hand side of assignment is not an assignable place")]
    AssignToNonLValue,

    #[error("a value-less expression cannot take part in an assignment")]
    AssignVoid,

    #[error("expected {expected}, found {found}")]
    TypeMismatch { expected: String, found: String },

    #[error("condition must be an `Integer`, found `{0}`")]
    ConditionNotInteger(String),

    #[error("arithmetic operands must be `Integer`s")]
    OperandsNotInteger,

    #[error("concatenation operands must be `String`s")]
    OperandsNotString,

    #[error("constructor of class `{class}` is named `{found}`")]
    CtorNameMismatch { class: String, found: String },

    #[error("arguments do not match the constructor parameters of class `{0}`")]
    CtorArgMismatch(String),

    #[error("`super` is used in class `{0}`, which has no superclass")]
    SuperMissing(String),

    #[error("cast of `{found}` to `{target}` is not an up-cast")]
    CastNotUpCast { target: String, found: String },

    #[error("method `{method}` of class `{class}` does not reach `return` or assign `result` on every path")]
    MissingReturnPath { class: String, method: String },
}

pub type FallableCheck = Result<(), ContextualError>;
pub type FallableType = Result<String, ContextualError>;
