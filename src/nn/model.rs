//------------------------------------------------------------------------------
//
// Copyright 2025 Jiri Bobek. All rights reserved.
// License: GPL 3.0 or later. See LICENSE.txt for details.
//
//------------------------------------------------------------------------------

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::ErrPack;
use crate::value::{Value, ValueOpError};

use super::error::ParamError;
use super::model_params::{ModelParameters, ModelParametersPtr};
use super::param::Parameter;

//--------------------------------------------------------------------------------------------------

/// A function together with the parameters it owns.
///
/// `F` is the (unsized) function type. The parameter set plays no role when calling the
/// function, it is there so the caller can find and enumerate the learnable state.
pub struct Model<F: ?Sized> {
	func: Arc<F>,
	params: ModelParametersPtr,
}

impl<F: ?Sized> Clone for Model<F> {
	fn clone(&self) -> Self {
		Self {
			func: self.func.clone(),
			params: self.params.clone(),
		}
	}
}

impl<F: ?Sized> Model<F> {
	pub fn from_parts(params: ModelParametersPtr, func: Arc<F>) -> Self {
		Self { func, params }
	}

	pub fn model_params(&self) -> &ModelParametersPtr {
		&self.params
	}

	pub fn param(&self, name: &str) -> Result<&Parameter, ErrPack<ParamError>> {
		self.params.get(name)
	}

	pub fn nested(&self, name: &str) -> Result<&ModelParametersPtr, ErrPack<ParamError>> {
		self.params.nested(name)
	}

	pub fn parameters(&self) -> Vec<Parameter> {
		self.params.parameters()
	}

	pub fn named_parameters(&self) -> Vec<(String, Parameter)> {
		self.params.named_parameters()
	}

	/// `{name: parameters of self}`, for models that capture this one.
	pub fn captured_as(&self, name: &str) -> BTreeMap<String, ModelParametersPtr> {
		BTreeMap::from([(name.to_string(), self.params.clone())])
	}
}

impl<F: ?Sized> std::fmt::Debug for Model<F> {
	fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
		f.debug_struct("Model").field("params", &self.params).finish_non_exhaustive()
	}
}

//--------------------------------------------------------------------------------------------------

macro_rules! model_signature {
	(
		$(#[$meta:meta])*
		$name:ident: ($($arg:ident: $ty:ty),*) -> $ret:ty
	) => {
		$(#[$meta])*
		pub type $name =
			Model<dyn Fn($($ty),*) -> Result<$ret, ErrPack<ValueOpError>> + Send + Sync>;

		impl $name {
			pub fn new<Func>(
				parameters: Vec<Parameter>,
				nested: BTreeMap<String, ModelParametersPtr>,
				func: Func,
			) -> Result<Self, ErrPack<ParamError>>
			where
				Func: Fn($($ty),*) -> Result<$ret, ErrPack<ValueOpError>> + Send + Sync + 'static,
			{
				let params = ModelParameters::new(parameters, nested)?;
				Ok(Self::from_parts(Arc::new(params), Arc::new(func)))
			}

			/// Model without any parameters.
			pub fn from_fn<Func>(func: Func) -> Self
			where
				Func: Fn($($ty),*) -> Result<$ret, ErrPack<ValueOpError>> + Send + Sync + 'static,
			{
				Self::from_parts(Arc::new(ModelParameters::empty()), Arc::new(func))
			}

			/// Model that owns no parameters and only captures those of other models.
			pub fn with_nested<Func>(
				nested: BTreeMap<String, ModelParametersPtr>,
				func: Func,
			) -> Self
			where
				Func: Fn($($ty),*) -> Result<$ret, ErrPack<ValueOpError>> + Send + Sync + 'static,
			{
				Self::from_parts(Arc::new(ModelParameters::from_nested(nested)), Arc::new(func))
			}

			#[inline]
			pub fn call(&self, $($arg: $ty),*) -> Result<$ret, ErrPack<ValueOpError>> {
				(self.func)($($arg),*)
			}
		}
	};
}

model_signature! {
	UnaryModel: (x: &Value) -> Value
}

model_signature! {
	/// Step functions take `(state, input)`.
	BinaryModel: (x: &Value, y: &Value) -> Value
}

model_signature! {
	TernaryModel: (x: &Value, y: &Value, z: &Value) -> Value
}

model_signature! {
	UnarySequenceModel: (xs: &[Value]) -> Vec<Value>
}

model_signature! {
	BinarySequenceModel: (xs: &[Value], ys: &[Value]) -> Vec<Value>
}

model_signature! {
	/// Consumes a whole sequence and returns a single value.
	UnaryFoldingModel: (xs: &[Value]) -> Value
}

model_signature! {
	/// Batch of sequence pairs to a batch of sequences.
	BinaryBatchSequenceModel: (xs: &[Vec<Value>], ys: &[Vec<Value>]) -> Vec<Vec<Value>>
}

//--------------------------------------------------------------------------------------------------
