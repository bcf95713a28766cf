//------------------------------------------------------------------------------
//
// Copyright 2025 Jiri Bobek. All rights reserved.
// License: GPL 3.0 or later. See LICENSE.txt for details.
//
//------------------------------------------------------------------------------

use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};

use smallvec::SmallVec;

use crate::ErrPack;
use crate::rng::Rng;
use crate::value::{INLINE_DIMS, Shape, Value, ValueOpError};

//--------------------------------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dim {
	Known(usize),

	/// Resolved from the leading dimension of the first input the parameter is used with.
	Inferred,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DType {
	F32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Device {
	#[default]
	Cpu,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Initializer {
	Constant(f32),
	GlorotUniform,
	GlorotNormal,
}

impl Initializer {
	#[allow(clippy::cast_precision_loss)]
	fn fill(self, shape: &[usize], seed: u64) -> Vec<f32> {
		let elems = shape.iter().product();
		let mut data = vec![0.0; elems];

		// fan_out is the leading axis, fan_in is everything else
		let (fan_out, fan_in) = match shape.split_first() {
			Some((&out, [])) => (out, out),
			Some((&out, rest)) => (out, rest.iter().product()),
			None => (1, 1),
		};
		let fan = (fan_out + fan_in).max(1) as f64;

		match self {
			Self::Constant(c) => data.fill(c),
			Self::GlorotUniform => {
				let limit = (6.0 / fan).sqrt();
				Rng::from_seed(seed).uniform(&mut data, -limit, limit);
			},
			Self::GlorotNormal => {
				let stddev = (2.0 / fan).sqrt();
				Rng::from_seed(seed).randn(&mut data, stddev);
			},
		}
		data
	}
}

//--------------------------------------------------------------------------------------------------

struct ParameterInner {
	name: String,
	shape: SmallVec<[Dim; INLINE_DIMS]>,
	dtype: DType,
	device: Device,
	init: Initializer,
	seed: u64,
	value: RwLock<Option<Value>>,
}

/// Named learnable tensor.
///
/// Cloning the handle does not copy the tensor, all clones refer to the same storage.
/// The value is created lazily, on first use, because some dimensions may be `Dim::Inferred`.
#[derive(Clone)]
pub struct Parameter {
	inner: Arc<ParameterInner>,
}

impl Parameter {
	pub fn new(
		name: impl Into<String>,
		shape: &[Dim],
		dtype: DType,
		init: Initializer,
		device: Device,
		seed: u64,
	) -> Self {
		Self {
			inner: Arc::new(ParameterInner {
				name: name.into(),
				shape: shape.iter().copied().collect(),
				dtype,
				device,
				init,
				seed,
				value: RwLock::new(None),
			}),
		}
	}

	pub fn name(&self) -> &str {
		&self.inner.name
	}

	pub fn shape(&self) -> &[Dim] {
		&self.inner.shape
	}

	pub fn dtype(&self) -> DType {
		self.inner.dtype
	}

	pub fn device(&self) -> Device {
		self.inner.device
	}

	pub fn initializer(&self) -> Initializer {
		self.inner.init
	}

	/// True if both handles refer to the same parameter.
	pub fn same_as(&self, other: &Self) -> bool {
		Arc::ptr_eq(&self.inner, &other.inner)
	}

	pub fn is_materialized(&self) -> bool {
		self.inner.value.read().unwrap_or_else(PoisonError::into_inner).is_some()
	}

	/// Returns the current value. Fails if the shape still has unresolved dimensions.
	pub fn value(&self) -> Result<Value, ErrPack<ValueOpError>> {
		self.get_or_materialize(None)
	}

	/// Returns the current value, resolving inferred dimensions to `input_dim` if this is
	/// the first use.
	pub fn value_for_input(&self, input_dim: usize) -> Result<Value, ErrPack<ValueOpError>> {
		self.get_or_materialize(Some(input_dim))
	}

	/// Replaces the value. Known dimensions must match, inferred ones are taken from `value`.
	pub fn assign(&self, value: Value) -> Result<(), ErrPack<ValueOpError>> {
		let compatible = value.rank() == self.inner.shape.len()
			&& self.inner.shape.iter().zip(value.shape()).all(|(dim, &n)| match dim {
				Dim::Known(k) => *k == n,
				Dim::Inferred => true,
			});
		if !compatible {
			return Err(ErrPack::with_message(
				ValueOpError::ShapeMismatch,
				format!(
					"cannot assign value of shape {:?} to parameter '{}' of shape {:?}",
					value.shape(),
					self.name(),
					self.shape()
				),
			));
		}
		*self.inner.value.write().unwrap_or_else(PoisonError::into_inner) = Some(value);
		Ok(())
	}

	fn get_or_materialize(&self, input_dim: Option<usize>) -> Result<Value, ErrPack<ValueOpError>> {
		let current = self.inner.value.read().unwrap_or_else(PoisonError::into_inner).clone();
		if let Some(value) = current {
			return Ok(value);
		}

		let shape = self.resolve_shape(input_dim)?;
		let mut slot = self.inner.value.write().unwrap_or_else(PoisonError::into_inner);
		// somebody else may have been faster
		if let Some(value) = slot.as_ref() {
			return Ok(value.clone());
		}

		let data = self.inner.init.fill(&shape, self.inner.seed);
		let value = Value::from_vec(&shape, data)?;
		log::debug!("materialized parameter '{}' with shape {:?}", self.name(), shape.as_slice());
		*slot = Some(value.clone());
		Ok(value)
	}

	fn resolve_shape(&self, input_dim: Option<usize>) -> Result<Shape, ErrPack<ValueOpError>> {
		let mut shape = Shape::with_capacity(self.inner.shape.len());
		for dim in &self.inner.shape {
			match (dim, input_dim) {
				(Dim::Known(n), _) => shape.push(*n),
				(Dim::Inferred, Some(n)) => shape.push(n),
				(Dim::Inferred, None) => {
					return Err(ErrPack::with_message(
						ValueOpError::UnresolvedShape,
						format!("parameter '{}' has an inferred dimension", self.name()),
					));
				},
			}
		}
		Ok(shape)
	}
}

impl fmt::Debug for Parameter {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		f.debug_struct("Parameter")
			.field("name", &self.inner.name)
			.field("shape", &self.inner.shape.as_slice())
			.field("dtype", &self.inner.dtype)
			.finish_non_exhaustive()
	}
}

//--------------------------------------------------------------------------------------------------

#[cfg(test)]
mod tests {
	use assert_approx_eq::assert_approx_eq;

	use super::*;

	fn param(shape: &[Dim], init: Initializer) -> Parameter {
		Parameter::new("W", shape, DType::F32, init, Device::Cpu, 1)
	}

	#[test]
	fn inferred_dim_resolves_on_first_use() {
		let w = param(&[Dim::Known(3), Dim::Inferred], Initializer::GlorotUniform);
		assert!(!w.is_materialized());
		assert_eq!(w.value().unwrap_err().code, ValueOpError::UnresolvedShape);

		let v = w.value_for_input(5).unwrap();
		assert_eq!(v.shape(), &[3, 5]);
		assert!(w.is_materialized());

		// later calls see the same value, regardless of the input
		assert_eq!(w.value_for_input(7).unwrap(), v);
		assert_eq!(w.value().unwrap(), v);
	}

	#[test]
	fn glorot_uniform_respects_limit() {
		let w = param(&[Dim::Known(4), Dim::Known(6)], Initializer::GlorotUniform);
		let limit = (6.0_f32 / 10.0).sqrt();
		let data = w.value().unwrap().to_vec();
		assert_eq!(data.len(), 24);
		assert!(data.iter().all(|v| v.abs() <= limit));
		assert!(data.iter().any(|&v| v != 0.0));
	}

	#[test]
	fn constant_init() {
		let b = param(&[Dim::Known(3)], Initializer::Constant(0.5));
		for v in b.value().unwrap().to_vec() {
			assert_approx_eq!(v, 0.5);
		}
	}

	fn normal_param(name: &str, seed: u64) -> Parameter {
		let shape = [Dim::Known(8)];
		Parameter::new(name, &shape, DType::F32, Initializer::GlorotNormal, Device::Cpu, seed)
	}

	#[test]
	fn seed_determines_value() {
		let a = normal_param("a", 9);
		let b = normal_param("b", 9);
		assert_eq!(a.value().unwrap(), b.value().unwrap());
		assert!(!a.same_as(&b));
		assert!(a.same_as(&a.clone()));
	}

	#[test]
	fn assign_checks_known_dims() {
		let w = param(&[Dim::Known(2), Dim::Inferred], Initializer::Constant(0.0));
		let ok = Value::full(&[2, 3], 1.0);
		w.assign(ok.clone()).unwrap();
		assert_eq!(w.value().unwrap(), ok);

		let err = w.assign(Value::zeros(&[3, 3])).unwrap_err();
		assert_eq!(err.code, ValueOpError::ShapeMismatch);
		assert!(err.message().contains("'W'"));
	}
}
