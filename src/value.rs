//------------------------------------------------------------------------------
//
// Copyright 2025 Jiri Bobek. All rights reserved.
// License: GPL 3.0 or later. See LICENSE.txt for details.
//
//------------------------------------------------------------------------------

use std::fmt;

use ndarray::{ArcArray, ArrayD, ArrayViewD, Axis, Ix2, IxDyn, Slice, Zip};
use smallvec::SmallVec;

use crate::ErrPack;

pub mod error;

pub use error::ValueOpError;

pub const INLINE_DIMS: usize = 4;

pub type Shape = SmallVec<[usize; INLINE_DIMS]>;

//--------------------------------------------------------------------------------------------------

/// Immutable handle to a tensor of `f32` values.
///
/// Cloning is cheap, the data is shared. Every operation produces a new `Value`.
///
/// Axis convention: when a `Value` holds a whole sequence, the time axis is the last one.
/// Because of that, broadcasting aligns the *leading* axes, so a bias of shape `[n]`
/// can be added to a packed sequence of shape `[n, T]`.
#[derive(Clone, Debug, PartialEq)]
pub struct Value {
	data: ArcArray<f32, IxDyn>,
}

impl Value {
	pub fn from_vec(shape: &[usize], data: Vec<f32>) -> Result<Self, ErrPack<ValueOpError>> {
		let elems: usize = shape.iter().product();
		if elems != data.len() {
			return Err(ErrPack::with_message(
				ValueOpError::InvalidShape,
				format!("shape {shape:?} needs {elems} elements, got {}", data.len()),
			));
		}
		let data = ArrayD::from_shape_vec(IxDyn(shape), data)?;
		Ok(Self { data: data.into_shared() })
	}

	pub fn from_array(data: ArrayD<f32>) -> Self {
		Self { data: data.into_shared() }
	}

	pub fn scalar(value: f32) -> Self {
		Self::full(&[], value)
	}

	pub fn zeros(shape: &[usize]) -> Self {
		Self::full(shape, 0.0)
	}

	pub fn full(shape: &[usize], value: f32) -> Self {
		Self { data: ArrayD::from_elem(IxDyn(shape), value).into_shared() }
	}

	/// Vector of length `dim` with a single `1.0` at position `index`.
	pub fn one_hot(dim: usize, index: usize) -> Result<Self, ErrPack<ValueOpError>> {
		if index >= dim {
			return Err(ErrPack::with_message(
				ValueOpError::IndexOutOfBounds,
				format!("one-hot index {index} out of range for dimension {dim}"),
			));
		}
		let mut data = vec![0.0; dim];
		if let Some(slot) = data.get_mut(index) {
			*slot = 1.0;
		}
		Self::from_vec(&[dim], data)
	}

	pub fn shape(&self) -> &[usize] {
		self.data.shape()
	}

	/// Number of axes. This is also known as the rank.
	pub fn rank(&self) -> usize {
		self.data.ndim()
	}

	pub fn dim(&self, axis: usize) -> Option<usize> {
		self.shape().get(axis).copied()
	}

	pub fn elems(&self) -> usize {
		self.data.len()
	}

	/// Elements in logical (row-major) order.
	pub fn to_vec(&self) -> Vec<f32> {
		self.data.iter().copied().collect()
	}

	pub fn view(&self) -> ArrayViewD<'_, f32> {
		self.data.view()
	}

	//----------------------------------------------------------------------------------------------

	pub fn map(&self, f: impl Fn(f32) -> f32) -> Self {
		Self::from_array(self.data.mapv(f))
	}

	pub fn scale(&self, factor: f32) -> Self {
		self.map(|x| x * factor)
	}

	pub fn relu(&self) -> Self {
		self.map(|x| x.max(0.0))
	}

	pub fn tanh(&self) -> Self {
		self.map(f32::tanh)
	}

	pub fn sigmoid(&self) -> Self {
		self.map(|x| 1.0 / (1.0 + (-x).exp()))
	}

	pub fn add(&self, other: &Self) -> Result<Self, ErrPack<ValueOpError>> {
		self.zip_with(other, |a, b| a + b)
	}

	pub fn mul(&self, other: &Self) -> Result<Self, ErrPack<ValueOpError>> {
		self.zip_with(other, |a, b| a * b)
	}

	pub fn zip_with(
		&self,
		other: &Self,
		f: impl Fn(f32, f32) -> f32,
	) -> Result<Self, ErrPack<ValueOpError>> {
		if self.shape() == other.shape() {
			let out = Zip::from(&self.data).and(&other.data).map_collect(|&a, &b| f(a, b));
			return Ok(Self::from_array(out));
		}
		let rank = self.rank().max(other.rank());
		let a = pad_rank(self.view(), rank);
		let b = pad_rank(other.view(), rank);
		let mismatch = || {
			ErrPack::with_message(
				ValueOpError::ShapeMismatch,
				format!("cannot broadcast {:?} with {:?}", self.shape(), other.shape()),
			)
		};
		let target = broadcast_shape(a.shape(), b.shape()).ok_or_else(mismatch)?;
		let a = a.broadcast(IxDyn(&target)).ok_or_else(mismatch)?;
		let b = b.broadcast(IxDyn(&target)).ok_or_else(mismatch)?;
		let out = Zip::from(&a).and(&b).map_collect(|&a, &b| f(a, b));
		Ok(Self::from_array(out))
	}

	/// Matrix product contracting the last axis of `w` with the first axis of `x`.
	///
	///     w: [out, inp]
	///     x: [inp, ...]
	///     result: [out, ...]
	pub fn times(w: &Self, x: &Self) -> Result<Self, ErrPack<ValueOpError>> {
		let w2 = w.data.view().into_dimensionality::<Ix2>().map_err(|_| {
			ErrPack::with_message(
				ValueOpError::ShapeMismatch,
				format!("times: left operand must be a matrix, got shape {:?}", w.shape()),
			)
		})?;
		let inp = w2.ncols();
		let Some((&x_inp, rest)) = x.shape().split_first() else {
			return Err(ErrPack::with_message(
				ValueOpError::NotEnoughDimensions,
				"times: right operand must have at least one axis",
			));
		};
		if x_inp != inp {
			return Err(ErrPack::with_message(
				ValueOpError::ShapeMismatch,
				format!("times: cannot multiply {:?} by {:?}", w.shape(), x.shape()),
			));
		}
		let n: usize = rest.iter().product();
		let x2 = x.data.to_shape((inp, n))?;
		let out = w2.dot(&x2);

		let mut out_shape = Shape::with_capacity(x.rank());
		out_shape.push(w2.nrows());
		out_shape.extend_from_slice(rest);
		let out = out.into_shape_with_order(IxDyn(&out_shape))?;
		Ok(Self::from_array(out))
	}

	/// Selects position `i` of the last axis and drops that axis.
	pub fn index_last(&self, i: usize) -> Result<Self, ErrPack<ValueOpError>> {
		let Some(&len) = self.shape().last() else {
			return Err(ErrPack::with_message(
				ValueOpError::NotEnoughDimensions,
				"cannot index the last axis of a scalar",
			));
		};
		if i >= len {
			return Err(ErrPack::with_message(
				ValueOpError::IndexOutOfBounds,
				format!("index {i} out of range for axis of length {len}"),
			));
		}
		let axis = Axis(self.rank() - 1);
		Ok(Self::from_array(self.data.index_axis(axis, i).to_owned()))
	}

	pub fn reshape(&self, shape: &[usize]) -> Result<Self, ErrPack<ValueOpError>> {
		let elems: usize = shape.iter().product();
		if elems != self.elems() {
			return Err(ErrPack::with_message(
				ValueOpError::InvalidShape,
				format!("cannot reshape {:?} to {shape:?}", self.shape()),
			));
		}
		let out = self.data.to_shape(IxDyn(shape))?.into_owned();
		Ok(Self::from_array(out))
	}

	/// Stacks `values` along a new axis inserted at position `axis`.
	pub fn splice(values: &[Self], axis: usize) -> Result<Self, ErrPack<ValueOpError>> {
		let Some(first) = values.first() else {
			let msg = "cannot splice zero values";
			return Err(ErrPack::with_message(ValueOpError::EmptyBatch, msg));
		};
		if axis > first.rank() {
			return Err(ErrPack::with_message(
				ValueOpError::NotEnoughDimensions,
				format!("splice axis {axis} out of range for rank {}", first.rank()),
			));
		}
		if let Some(odd) = values.iter().find(|v| v.shape() != first.shape()) {
			return Err(ErrPack::with_message(
				ValueOpError::ShapeMismatch,
				format!("cannot splice {:?} with {:?}", first.shape(), odd.shape()),
			));
		}
		let views: Vec<ArrayViewD<f32>> = values.iter().map(Self::view).collect();
		let out = ndarray::stack(Axis(axis), &views)?;
		Ok(Self::from_array(out))
	}

	/// Joins `values` along an existing axis.
	pub fn concat(values: &[Self], axis: usize) -> Result<Self, ErrPack<ValueOpError>> {
		let Some(first) = values.first() else {
			let msg = "cannot concat zero values";
			return Err(ErrPack::with_message(ValueOpError::EmptyBatch, msg));
		};
		if axis >= first.rank() {
			return Err(ErrPack::with_message(
				ValueOpError::NotEnoughDimensions,
				format!("concat axis {axis} out of range for rank {}", first.rank()),
			));
		}
		let views: Vec<ArrayViewD<f32>> = values.iter().map(Self::view).collect();
		let out = ndarray::concatenate(Axis(axis), &views)?;
		Ok(Self::from_array(out))
	}

	/// Positions `start..start + len` of `axis`. The axis is kept.
	pub fn narrow(
		&self,
		axis: usize,
		start: usize,
		len: usize,
	) -> Result<Self, ErrPack<ValueOpError>> {
		let Some(size) = self.dim(axis) else {
			return Err(ErrPack::with_message(
				ValueOpError::NotEnoughDimensions,
				format!("narrow axis {axis} out of range for rank {}", self.rank()),
			));
		};
		let end = start.saturating_add(len);
		if end > size {
			return Err(ErrPack::with_message(
				ValueOpError::IndexOutOfBounds,
				format!("range {start}..{end} out of bounds for axis of length {size}"),
			));
		}
		let out = self.data.slice_axis(Axis(axis), Slice::from(start..end)).to_owned();
		Ok(Self::from_array(out))
	}

	/// Sums along `axis`. The reduced axis is kept with size 1.
	pub fn reduce_sum(&self, axis: usize) -> Result<Self, ErrPack<ValueOpError>> {
		if axis >= self.rank() {
			return Err(ErrPack::with_message(
				ValueOpError::NotEnoughDimensions,
				format!("reduce axis {axis} out of range for rank {}", self.rank()),
			));
		}
		let out = self.data.sum_axis(Axis(axis)).insert_axis(Axis(axis));
		Ok(Self::from_array(out))
	}

	/// Scheduling boundary for the graph engine. Functionally the identity.
	pub fn barrier(&self) -> Self {
		self.clone()
	}
}

impl fmt::Display for Value {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		write!(f, "{}", self.data)
	}
}

//--------------------------------------------------------------------------------------------------

fn pad_rank<'a>(view: ArrayViewD<'a, f32>, rank: usize) -> ArrayViewD<'a, f32> {
	let mut view = view;
	while view.ndim() < rank {
		let n = view.ndim();
		view = view.insert_axis(Axis(n));
	}
	view
}

/// Both shapes must have the same rank. Axes of size 1 stretch to the other size.
fn broadcast_shape(a: &[usize], b: &[usize]) -> Option<Shape> {
	let mut target = Shape::with_capacity(a.len());
	for (&x, &y) in a.iter().zip(b) {
		target.push(match (x, y) {
			_ if x == y => x,
			(1, _) => y,
			(_, 1) => x,
			_ => return None,
		});
	}
	Some(target)
}

//--------------------------------------------------------------------------------------------------

#[cfg(test)]
mod tests {
	use assert_approx_eq::assert_approx_eq;

	use super::*;

	fn v(shape: &[usize], data: &[f32]) -> Value {
		Value::from_vec(shape, data.to_vec()).unwrap()
	}

	#[test]
	fn from_vec_checks_elems() {
		let err = Value::from_vec(&[2, 2], vec![1.0, 2.0, 3.0]).unwrap_err();
		assert_eq!(err.code, ValueOpError::InvalidShape);
	}

	#[test]
	fn add_broadcasts_leading_axes() {
		// [2, 3] + [2]
		let x = v(&[2, 3], &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
		let b = v(&[2], &[10.0, 20.0]);
		let y = x.add(&b).unwrap();
		assert_eq!(y.shape(), &[2, 3]);
		assert_eq!(y.to_vec(), vec![11.0, 12.0, 13.0, 24.0, 25.0, 26.0]);

		let y2 = b.add(&x).unwrap();
		assert_eq!(y, y2);
	}

	#[test]
	fn add_rejects_incompatible_shapes() {
		let a = v(&[2], &[1.0, 2.0]);
		let b = v(&[3], &[1.0, 2.0, 3.0]);
		assert_eq!(a.add(&b).unwrap_err().code, ValueOpError::ShapeMismatch);
	}

	#[test]
	fn times_vector_and_packed_sequence() {
		// w: [2, 3]
		let w = v(&[2, 3], &[1.0, 0.0, 2.0, 0.0, 1.0, -1.0]);
		let x = v(&[3], &[1.0, 2.0, 3.0]);
		let y = Value::times(&w, &x).unwrap();
		assert_eq!(y.shape(), &[2]);
		assert_eq!(y.to_vec(), vec![7.0, -1.0]);

		// x: [3, 2], two time steps
		let xs = v(&[3, 2], &[1.0, 0.0, 2.0, 1.0, 3.0, 0.0]);
		let ys = Value::times(&w, &xs).unwrap();
		assert_eq!(ys.shape(), &[2, 2]);
		assert_eq!(ys.to_vec(), vec![7.0, 0.0, -1.0, 1.0]);
	}

	#[test]
	fn times_checks_inner_dimension() {
		let w = Value::zeros(&[2, 3]);
		let x = Value::zeros(&[4]);
		assert_eq!(Value::times(&w, &x).unwrap_err().code, ValueOpError::ShapeMismatch);
		let err = Value::times(&w, &Value::scalar(1.0)).unwrap_err();
		assert_eq!(err.code, ValueOpError::NotEnoughDimensions);
	}

	#[test]
	fn index_last_drops_axis() {
		let x = v(&[2, 3], &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
		let t1 = x.index_last(1).unwrap();
		assert_eq!(t1.shape(), &[2]);
		assert_eq!(t1.to_vec(), vec![2.0, 5.0]);
		assert_eq!(x.index_last(3).unwrap_err().code, ValueOpError::IndexOutOfBounds);

		// a scalar has no time axis
		let err = Value::scalar(1.0).index_last(0).unwrap_err();
		assert_eq!(err.code, ValueOpError::NotEnoughDimensions);
		assert!(err.code.is_precondition_violation());
	}

	#[test]
	fn splice_and_reduce() {
		let a = v(&[2], &[1.0, 2.0]);
		let b = v(&[2], &[3.0, 4.0]);
		let s = Value::splice(&[a, b], 1).unwrap();
		assert_eq!(s.shape(), &[2, 2]);
		assert_eq!(s.to_vec(), vec![1.0, 3.0, 2.0, 4.0]);

		let r = s.reduce_sum(1).unwrap();
		assert_eq!(r.shape(), &[2, 1]);
		assert_eq!(r.to_vec(), vec![4.0, 6.0]);
	}

	#[test]
	fn splice_rejects_mixed_shapes() {
		let a = Value::zeros(&[2]);
		let b = Value::zeros(&[3]);
		assert_eq!(Value::splice(&[a, b], 0).unwrap_err().code, ValueOpError::ShapeMismatch);
		assert_eq!(Value::splice(&[], 0).unwrap_err().code, ValueOpError::EmptyBatch);
	}

	#[test]
	fn concat_and_narrow() {
		let a = v(&[2], &[1.0, 2.0]);
		let b = v(&[3], &[3.0, 4.0, 5.0]);
		let c = Value::concat(&[a.clone(), b], 0).unwrap();
		assert_eq!(c.to_vec(), vec![1.0, 2.0, 3.0, 4.0, 5.0]);
		assert_eq!(c.narrow(0, 0, 2).unwrap(), a);
		assert_eq!(c.narrow(0, 2, 3).unwrap().to_vec(), vec![3.0, 4.0, 5.0]);
		assert_eq!(c.narrow(0, 4, 2).unwrap_err().code, ValueOpError::IndexOutOfBounds);
		assert_eq!(c.narrow(1, 0, 1).unwrap_err().code, ValueOpError::NotEnoughDimensions);
	}

	#[test]
	fn reshape_keeps_order() {
		let x = v(&[2, 3], &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
		let y = x.reshape(&[3, 2]).unwrap();
		assert_eq!(y.to_vec(), x.to_vec());
		assert_eq!(x.reshape(&[4]).unwrap_err().code, ValueOpError::InvalidShape);
	}

	#[test]
	fn activations() {
		let x = v(&[3], &[-1.0, 0.0, 2.0]);
		assert_eq!(x.relu().to_vec(), vec![0.0, 0.0, 2.0]);
		let s = x.sigmoid().to_vec();
		assert_approx_eq!(s[1], 0.5, 1e-6);
		assert_approx_eq!(s[2], 0.880_797, 1e-5);
		assert_approx_eq!(x.tanh().to_vec()[0], -0.761_594, 1e-5);
	}

	#[test]
	fn one_hot() {
		let x = Value::one_hot(4, 2).unwrap();
		assert_eq!(x.to_vec(), vec![0.0, 0.0, 1.0, 0.0]);
		assert_eq!(Value::one_hot(4, 4).unwrap_err().code, ValueOpError::IndexOutOfBounds);
	}
}
