//------------------------------------------------------------------------------
//
// Copyright 2025 Jiri Bobek. All rights reserved.
// License: GPL 3.0 or later. See LICENSE.txt for details.
//
//------------------------------------------------------------------------------

//! Models over ordered sequences.
//!
//! A sequence is either a slice of per-step values, or a single "packed" value
//! whose last axis is the time axis. `index()` and `to_ordered_sequence()` convert
//! from the packed form.

use crate::ErrPack;
use crate::value::{Shape, Value, ValueOpError};

use super::batch;
use super::error::ParamError;
use super::layers;
use super::model::{BinaryModel, UnaryFoldingModel, UnaryModel, UnarySequenceModel};
use super::model_context::ModelContext;

//--------------------------------------------------------------------------------------------------

/// Returns every intermediate state.
///
/// For inputs `x[0..n]` and `s[-1] = initial_state`, computes `s[t] = step(s[t-1], x[t])`
/// and returns `[s[0], ..., s[n-1]]`.
pub fn recurrence(step: BinaryModel, initial_state: Value) -> UnarySequenceModel {
	UnarySequenceModel::with_nested(step.captured_as("step"), move |xs| {
		log::trace!("recurrence over {} steps", xs.len());
		let mut res = Vec::with_capacity(xs.len());
		let mut state = initial_state.clone();
		for x in xs {
			state = step.call(&state, x)?;
			res.push(state.clone());
		}
		Ok(res)
	})
}

/// Left fold: `step(...step(step(initial_state, x[0]), x[1])..., x[n-1])`.
pub fn fold(step: BinaryModel, initial_state: Value) -> UnaryFoldingModel {
	UnaryFoldingModel::with_nested(step.captured_as("step"), move |xs| {
		log::trace!("fold over {} steps", xs.len());
		let mut state = initial_state.clone();
		for x in xs {
			state = step.call(&state, x)?;
		}
		Ok(state.barrier())
	})
}

pub fn map(f: UnaryModel) -> UnarySequenceModel {
	batch::map_unary(f)
}

/// Embeds every step of a sequence. The embedding is captured under `"f"`.
pub fn embedding(
	embedding_dim: usize,
	ctx: &mut ModelContext,
) -> Result<UnarySequenceModel, ErrPack<ParamError>> {
	Ok(map(layers::embedding(embedding_dim, ctx)?))
}

/// Slices position `i` of the last axis and drops that axis.
pub fn index(x: &Value, i: usize) -> Result<Value, ErrPack<ValueOpError>> {
	x.index_last(i)
}

/// Splits a packed sequence into its steps.
pub fn to_ordered_sequence(x: &Value) -> Result<Vec<Value>, ErrPack<ValueOpError>> {
	let Some(&len) = x.shape().last() else {
		return Err(ErrPack::with_message(
			ValueOpError::NotEnoughDimensions,
			"a packed sequence needs a time axis",
		));
	};
	(0..len).map(|t| index(x, t)).collect()
}

/// Stacks the steps of a sequence into a packed value. Inverse of `to_ordered_sequence()`.
pub fn to_packed(xs: &[Value]) -> Result<Value, ErrPack<ValueOpError>> {
	let rank = xs.first().map_or(0, Value::rank);
	Value::splice(xs, rank)
}

/// `recurrence()` over a packed sequence. Returns the packed states.
///
/// With no steps, the result has the shape of `initial_state` plus a time axis of length 0.
pub fn packed_recurrence(step: BinaryModel, initial_state: Value) -> UnaryModel {
	let nested = step.captured_as("step");
	let mut empty_shape = Shape::from_slice(initial_state.shape());
	empty_shape.push(0);
	let rec = recurrence(step, initial_state);
	UnaryModel::with_nested(nested, move |x| {
		let states = rec.call(&to_ordered_sequence(x)?)?;
		if states.is_empty() {
			return Ok(Value::zeros(&empty_shape));
		}
		to_packed(&states)
	})
}

/// `fold()` over a packed sequence. An empty sequence yields the initial state.
pub fn packed_fold(step: BinaryModel, initial_state: Value) -> UnaryModel {
	let nested = step.captured_as("step");
	let folding = fold(step, initial_state);
	UnaryModel::with_nested(nested, move |x| {
		folding.call(&to_ordered_sequence(x)?)
	})
}

//--------------------------------------------------------------------------------------------------
