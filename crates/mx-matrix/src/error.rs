use crate::op::Operation;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum MatrixError {
    #[error("shape mismatch for {op}: A={a:?}, B={b:?}, result={result:?}")]
    ShapeMismatch {
        op: Operation,
        /// (count, column_hint) of the first operand.
        a: (usize, usize),
        /// (count, column_hint) of the second operand, when present.
        b: Option<(usize, usize)>,
        /// (count, column_hint) of the result target.
        result: (usize, usize),
    },
    #[error("missing operand: {0}")]
    MissingOperand(&'static str),
    #[error("backend '{backend}' does not support operation {op}")]
    Unsupported { backend: String, op: Operation },
    #[error("storage error: {0}")]
    Storage(String),
}

pub type Result<T> = std::result::Result<T, MatrixError>;
