//------------------------------------------------------------------------------
//
// Copyright 2025 Jiri Bobek. All rights reserved.
// License: GPL 3.0 or later. See LICENSE.txt for details.
//
//------------------------------------------------------------------------------

use std::collections::BTreeMap;

use crate::ErrPack;
use crate::nn::error::ParamError;
use crate::nn::model::{BinaryModel, TernaryModel};
use crate::nn::model_context::ModelContext;
use crate::nn::param::{Dim, Initializer, Parameter};
use crate::value::{Value, ValueOpError};

use super::input_dim;

//--------------------------------------------------------------------------------------------------

/// Plain recurrent step, `relu(W x + b + R h)`.
///
/// Called as `step(prev_output, input)`, so it can be passed directly to
/// `sequence::fold()` or `sequence::recurrence()`.
pub fn rnn_step(
	outputs: usize,
	ctx: &mut ModelContext,
) -> Result<BinaryModel, ErrPack<ParamError>> {
	let n = Dim::Known(outputs);
	let W = ctx.new_param("W", &[n, Dim::Inferred], Initializer::GlorotUniform)?;
	let R = ctx.new_param("R", &[n, n], Initializer::GlorotUniform)?;
	let b = ctx.new_param("b", &[n], Initializer::Constant(0.0))?;
	BinaryModel::new(vec![W.clone(), R.clone(), b.clone()], BTreeMap::new(), move |h, x| {
		let W = W.value_for_input(input_dim(x)?)?;
		let z = Value::times(&W, x)?.add(&b.value()?)?;
		let z = z.add(&Value::times(&R.value()?, h)?)?;
		Ok(z.relu())
	})
}

//--------------------------------------------------------------------------------------------------

struct LstmParams {
	W: Parameter,
	R: Parameter,
	b: Parameter,
	outputs: usize,
}

impl LstmParams {
	fn new(outputs: usize, ctx: &mut ModelContext) -> Result<Self, ErrPack<ParamError>> {
		let gates = Dim::Known(4 * outputs);
		Ok(Self {
			W: ctx.new_param("W", &[gates, Dim::Inferred], Initializer::GlorotUniform)?,
			R: ctx.new_param("R", &[gates, Dim::Known(outputs)], Initializer::GlorotUniform)?,
			b: ctx.new_param("b", &[gates], Initializer::Constant(0.0))?,
			outputs,
		})
	}

	fn list(&self) -> Vec<Parameter> {
		vec![self.W.clone(), self.R.clone(), self.b.clone()]
	}

	/// Returns `(h, c)`.
	///
	/// Gate blocks in `W`, `R` and `b` are stacked as `[input, forget, cell, output]`.
	fn cell(
		&self,
		h: &Value,
		c: &Value,
		x: &Value,
	) -> Result<(Value, Value), ErrPack<ValueOpError>> {
		let n = self.outputs;
		let W = self.W.value_for_input(input_dim(x)?)?;
		let z = Value::times(&W, x)?.add(&self.b.value()?)?;
		let z = z.add(&Value::times(&self.R.value()?, h)?)?;

		let i = z.narrow(0, 0, n)?.sigmoid();
		let f = z.narrow(0, n, n)?.sigmoid();
		let g = z.narrow(0, 2 * n, n)?.tanh();
		let o = z.narrow(0, 3 * n, n)?.sigmoid();

		let c = f.mul(c)?.add(&i.mul(&g)?)?;
		let h = o.mul(&c.tanh())?;
		Ok((h, c))
	}
}

/// LSTM step, called as `step(prev_h, prev_c, input)`. Returns the new `h`.
///
///     W: [4 * outputs, inputs]
///     R: [4 * outputs, outputs]
///     b: [4 * outputs]
pub fn lstm_step(
	outputs: usize,
	ctx: &mut ModelContext,
) -> Result<TernaryModel, ErrPack<ParamError>> {
	let p = LstmParams::new(outputs, ctx)?;
	TernaryModel::new(p.list(), BTreeMap::new(), move |h, c, x| Ok(p.cell(h, c, x)?.0))
}

/// LSTM step over a combined state, for use with `sequence::fold()` and `sequence::recurrence()`.
///
/// The state is `h` and `c` joined along the first axis, `[2 * outputs, ...]`.
/// Start from `Value::zeros(&[2 * outputs])`.
pub fn lstm_recurrent_step(
	outputs: usize,
	ctx: &mut ModelContext,
) -> Result<BinaryModel, ErrPack<ParamError>> {
	let p = LstmParams::new(outputs, ctx)?;
	BinaryModel::new(p.list(), BTreeMap::new(), move |state, x| {
		let n = p.outputs;
		let h = state.narrow(0, 0, n)?;
		let c = state.narrow(0, n, n)?;
		let (h, c) = p.cell(&h, &c, x)?;
		Value::concat(&[h, c], 0)
	})
}
