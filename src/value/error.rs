//------------------------------------------------------------------------------
//
// Copyright 2025 Jiri Bobek. All rights reserved.
// License: GPL 3.0 or later. See LICENSE.txt for details.
//
//------------------------------------------------------------------------------

use std::borrow::Cow;

use crate::{ErrExtra, ErrPack};

//--------------------------------------------------------------------------------------------------

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ValueOpError {
	/// Operand shapes cannot be combined.
	ShapeMismatch,

	/// Element count does not fit the requested shape.
	InvalidShape,

	NotEnoughDimensions,

	/// Index outside `[0, len)` of the indexed axis.
	IndexOutOfBounds,

	/// Paired batches or sequences have different lengths.
	LengthMismatch,

	/// Reduction over zero elements.
	EmptyBatch,

	/// A parameter with an inferred dimension was read before the dimension was known.
	UnresolvedShape,
}

impl ValueOpError {
	/// Errors that indicate a bug in the caller rather than a problem with the data.
	///
	/// Asking for an axis the value does not have counts, like an out-of-range index.
	pub fn is_precondition_violation(self) -> bool {
		matches!(
			self,
			Self::IndexOutOfBounds
				| Self::NotEnoughDimensions
				| Self::LengthMismatch
				| Self::EmptyBatch
		)
	}
}

impl From<ndarray::ShapeError> for ErrPack<ValueOpError> {
	#[cold]
	#[inline(never)]
	fn from(err: ndarray::ShapeError) -> Self {
		let code = match err.kind() {
			ndarray::ErrorKind::IncompatibleShape => ValueOpError::ShapeMismatch,
			_ => ValueOpError::InvalidShape,
		};
		Self {
			code,
			extra: Some(Box::new(ErrExtra {
				message: Cow::from("ndarray shape error"),
				nested: Some(Box::new(err)),
			})),
		}
	}
}

//--------------------------------------------------------------------------------------------------
