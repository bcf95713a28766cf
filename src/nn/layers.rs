//------------------------------------------------------------------------------
//
// Copyright 2025 Jiri Bobek. All rights reserved.
// License: GPL 3.0 or later. See LICENSE.txt for details.
//
//------------------------------------------------------------------------------

pub mod embedding;
pub mod linear;
pub mod recurrent;
pub mod sequential;

#[cfg(test)]
mod tests;

use crate::ErrPack;
use crate::value::{Value, ValueOpError};

pub use embedding::embedding;
pub use linear::linear;
pub use recurrent::{lstm_recurrent_step, lstm_step, rnn_step};
pub use sequential::sequential;

/// Leading dimension of a layer input, used to resolve `Dim::Inferred`.
fn input_dim(x: &Value) -> Result<usize, ErrPack<ValueOpError>> {
	x.dim(0).ok_or_else(|| {
		ErrPack::with_message(ValueOpError::NotEnoughDimensions, "layer input must have an axis")
	})
}
