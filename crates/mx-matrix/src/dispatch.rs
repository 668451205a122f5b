//! Capability-checked dispatch in front of a backend.
//!
//! The dispatcher is the enforcement point of the sizing/validation
//! contract: it tests capability membership, runs
//! [`crate::shape::validate`], and only invokes the backend when both
//! pass. A validation failure means "do not execute" and surfaces as a
//! typed error; the backend is never entered with shapes it cannot
//! trust.

use crate::backend::MatrixBackend;
use crate::error::{MatrixError, Result};
use crate::handle::MatrixHandle;
use crate::op::Operation;
use crate::shape::{size_result, validate};

/// Stateless front over a single backend. Holds only a borrow; create
/// one per call site or keep one around, both are free.
#[derive(Debug, Clone, Copy)]
pub struct Dispatcher<'a> {
    backend: &'a dyn MatrixBackend,
}

impl<'a> Dispatcher<'a> {
    pub fn new(backend: &'a dyn MatrixBackend) -> Self {
        Dispatcher { backend }
    }

    /// The backend behind this dispatcher.
    pub fn backend(&self) -> &dyn MatrixBackend {
        self.backend
    }

    fn check_capability(&self, op: Operation) -> Result<()> {
        if self.backend.supports(op) {
            Ok(())
        } else {
            Err(MatrixError::Unsupported {
                backend: self.backend.name().to_string(),
                op,
            })
        }
    }

    fn check_shapes(
        &self,
        op: Operation,
        a: &MatrixHandle,
        b: Option<&MatrixHandle>,
        result: &MatrixHandle,
    ) -> Result<()> {
        if validate(op, Some(a), b, Some(result)) {
            Ok(())
        } else {
            Err(MatrixError::ShapeMismatch {
                op,
                a: a.shape(),
                b: b.map(MatrixHandle::shape),
                result: result.shape(),
            })
        }
    }

    /// Binary operation: `result = op(a, b)`.
    pub fn binary(
        &self,
        op: Operation,
        a: &MatrixHandle,
        b: &MatrixHandle,
        result: &mut MatrixHandle,
    ) -> Result<()> {
        self.check_capability(op)?;
        self.check_shapes(op, a, Some(b), result)?;
        self.backend.run_binary(op, a, b, result)
    }

    /// Unary operation producing a new handle: `result = op(a)`.
    pub fn unary(&self, op: Operation, a: &MatrixHandle, result: &mut MatrixHandle) -> Result<()> {
        self.check_capability(op)?;
        self.check_shapes(op, a, None, result)?;
        self.backend.run_unary(op, a, result)
    }

    /// Unary operation with a scalar operand.
    pub fn scalar(
        &self,
        op: Operation,
        a: &MatrixHandle,
        value: f32,
        result: &mut MatrixHandle,
    ) -> Result<()> {
        self.check_capability(op)?;
        self.check_shapes(op, a, None, result)?;
        self.backend.run_scalar(op, a, value, result)
    }

    /// In-place unary operation mutating `a`.
    pub fn in_place(&self, op: Operation, a: &mut MatrixHandle) -> Result<()> {
        self.check_capability(op)?;
        // in-place: A is its own result target
        if !validate(op, Some(a), None, Some(a)) {
            return Err(MatrixError::ShapeMismatch {
                op,
                a: a.shape(),
                b: None,
                result: a.shape(),
            });
        }
        self.backend.run_in_place(op, a)
    }

    /// Binary operation that sizes and resizes `result` first.
    pub fn binary_sized(
        &self,
        op: Operation,
        a: &MatrixHandle,
        b: &MatrixHandle,
        result: &mut MatrixHandle,
    ) -> Result<()> {
        size_result(op, Some(a), Some(b), result);
        result.resize_to_shape();
        self.binary(op, a, b, result)
    }

    /// Unary operation that sizes and resizes `result` first.
    pub fn unary_sized(
        &self,
        op: Operation,
        a: &MatrixHandle,
        result: &mut MatrixHandle,
    ) -> Result<()> {
        size_result(op, Some(a), None, result);
        result.resize_to_shape();
        self.unary(op, a, result)
    }

    /// Executes a binary operation and returns the result's first
    /// element; the natural shape for scalar-valued reductions such as
    /// `DotProduct` or the distance metrics.
    pub fn run_return(
        &self,
        op: Operation,
        a: &MatrixHandle,
        b: &MatrixHandle,
        result: &mut MatrixHandle,
    ) -> Result<f32> {
        self.binary(op, a, b, result)?;
        let data = result.data()?;
        data.first().copied().ok_or_else(|| {
            MatrixError::Storage("result buffer is empty".to_string())
        })
    }
}
