//! `mx-matrix` - Matrix shape inference, validation, and pluggable
//! compute backends.
//!
//! This crate provides:
//! - A `MatrixHandle` type describing a rectangular f32 buffer by
//!   `(count, column_hint)`
//! - The closed `Operation` catalog and `OpSet` capability sets
//! - The shape engine: `size_result` and `validate`
//! - A `MatrixBackend` trait for pluggable compute
//! - A reference `CpuBackend` implementation
//! - A capability-checked `Dispatcher` in front of any backend

pub mod backend;
pub mod cpu;
pub mod dispatch;
pub mod error;
pub mod handle;
pub mod op;
pub mod shape;
pub mod storage;

// Re-export primary types at the crate root for convenience.
pub use backend::MatrixBackend;
pub use cpu::CpuBackend;
pub use dispatch::Dispatcher;
pub use error::{MatrixError, Result};
pub use handle::MatrixHandle;
pub use op::{OpSet, Operation};
pub use shape::{size_result, validate};
pub use storage::MatrixStorage;
