//------------------------------------------------------------------------------
//
// Copyright 2025 Jiri Bobek. All rights reserved.
// License: GPL 3.0 or later. See LICENSE.txt for details.
//
//------------------------------------------------------------------------------

//! Lifting single-item models to batches, and reducing batches.

use rayon::prelude::*;

use crate::ErrPack;
use crate::value::{Value, ValueOpError};

use super::model::{
	BinaryBatchSequenceModel, BinaryModel, BinarySequenceModel, UnaryModel, UnarySequenceModel,
};

//--------------------------------------------------------------------------------------------------

pub fn map(f: &UnaryModel, batch: &[Value]) -> Result<Vec<Value>, ErrPack<ValueOpError>> {
	batch.iter().map(|x| f.call(x)).collect()
}

/// Like `map()`, but items are processed in parallel. The output order still matches the input.
pub fn par_map(f: &UnaryModel, batch: &[Value]) -> Result<Vec<Value>, ErrPack<ValueOpError>> {
	batch.par_iter().map(|x| f.call(x)).collect()
}

fn check_lengths(what: &str, a: usize, b: usize) -> Result<(), ErrPack<ValueOpError>> {
	if a != b {
		return Err(ErrPack::with_message(
			ValueOpError::LengthMismatch,
			format!("{what} lengths differ: {a} vs {b}"),
		));
	}
	Ok(())
}

/// Applies `f` to each item of the batch. The parameters of `f` are captured under `"f"`.
pub fn map_unary(f: UnaryModel) -> UnarySequenceModel {
	UnarySequenceModel::with_nested(f.captured_as("f"), move |batch| map(&f, batch))
}

/// Applies `f` to pairs of items taken from two batches of equal length.
pub fn map_binary(f: BinaryModel) -> BinarySequenceModel {
	BinarySequenceModel::with_nested(f.captured_as("f"), move |xs, ys| {
		check_lengths("batch", xs.len(), ys.len())?;
		xs.iter().zip(ys).map(|(x, y)| f.call(x, y)).collect()
	})
}

/// Applies a sequence model to pairs of sequences taken from two batches of equal length.
pub fn map_binary_sequences(f: BinarySequenceModel) -> BinaryBatchSequenceModel {
	BinaryBatchSequenceModel::with_nested(f.captured_as("f"), move |xs, ys| {
		check_lengths("batch", xs.len(), ys.len())?;
		xs.iter().zip(ys).map(|(x, y)| f.call(x, y)).collect()
	})
}

/// Element-wise sum of all items. All items must have the same shape.
pub fn sum(batch: &[Value]) -> Result<Value, ErrPack<ValueOpError>> {
	let Some(first) = batch.first() else {
		return Err(ErrPack::with_message(ValueOpError::EmptyBatch, "cannot sum an empty batch"));
	};
	let shape = first.shape();
	let axis = first.rank(); // add a new axis
	Value::splice(batch, axis)?.reduce_sum(axis)?.reshape(shape)
}

/// Sums all items of all sequences, outer index major.
pub fn sum_nested(batch: &[Vec<Value>]) -> Result<Value, ErrPack<ValueOpError>> {
	let all: Vec<Value> = batch.iter().flatten().cloned().collect();
	sum(&all)
}

impl UnaryModel {
	/// Applies this single-item model to every item of `batch`.
	pub fn call_batch(&self, batch: &[Value]) -> Result<Vec<Value>, ErrPack<ValueOpError>> {
		map(self, batch)
	}
}

//--------------------------------------------------------------------------------------------------
