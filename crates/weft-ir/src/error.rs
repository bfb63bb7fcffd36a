//! IR construction errors
//!
//! Every variant is an internal-consistency failure: the front end or the
//! builder itself handed over something that cannot be well-typed. They
//! abort construction of the current function and are never recovered.

use thiserror::Error;

pub type BuildResult<T> = Result<T, BuildError>;

#[derive(Debug, Error)]
pub enum BuildError {
    #[error("No concrete method: {method}")]
    NoConcreteMethod { method: String },

    #[error("{func} is not a method")]
    NotAMethod { func: String },

    #[error("Illegal operator in arithmetic: {op}")]
    IllegalArithOp { op: String },

    #[error("Field selection on non-struct type {ty}")]
    NotAStruct { ty: String },

    #[error("Type {ty} has no field #{index}")]
    NoSuchField { ty: String, index: usize },

    #[error("Function {function}: block {block} is not terminated")]
    Unterminated { function: String, block: String },

    #[error("Function {function} is malformed: {message}")]
    Malformed { function: String, message: String },
}
