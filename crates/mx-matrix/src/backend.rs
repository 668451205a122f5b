use std::fmt::Debug;

use crate::error::Result;
use crate::handle::MatrixHandle;
use crate::op::{OpSet, Operation};

/// Trait for pluggable matrix compute backends (reference CPU,
/// parallel, vendor-accelerated, etc.).
///
/// A backend advertises the subset of the operation catalog it
/// implements through [`MatrixBackend::supported_ops`]; callers test
/// membership with [`MatrixBackend::supports`] before dispatch. Any
/// number of backend variants may coexist; selection is the caller's
/// concern, not the backend's.
///
/// Backends may assume operand/result shapes were checked with
/// [`crate::shape::validate`] before any `run_*` call. They still
/// verify that backing buffers match the declared shapes and report
/// disagreement as [`crate::MatrixError::Storage`].
pub trait MatrixBackend: Send + Sync + Debug {
    /// Returns the name of this backend (e.g., "cpu", "parallel").
    fn name(&self) -> &str;

    /// The subset of the operation catalog this backend implements.
    fn supported_ops(&self) -> OpSet;

    /// Returns true if `op` is in this backend's capability set.
    fn supports(&self, op: Operation) -> bool {
        self.supported_ops().contains(op)
    }

    /// Binary operation: `result = op(a, b)`.
    fn run_binary(
        &self,
        op: Operation,
        a: &MatrixHandle,
        b: &MatrixHandle,
        result: &mut MatrixHandle,
    ) -> Result<()>;

    /// Unary operation producing a new handle: `result = op(a)`.
    fn run_unary(&self, op: Operation, a: &MatrixHandle, result: &mut MatrixHandle) -> Result<()>;

    /// Unary operation with a scalar operand: `result = op(a, value)`.
    fn run_scalar(
        &self,
        op: Operation,
        a: &MatrixHandle,
        value: f32,
        result: &mut MatrixHandle,
    ) -> Result<()>;

    /// In-place unary operation mutating `a`.
    fn run_in_place(&self, op: Operation, a: &mut MatrixHandle) -> Result<()>;
}
