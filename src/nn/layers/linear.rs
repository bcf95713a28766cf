//------------------------------------------------------------------------------
//
// Copyright 2025 Jiri Bobek. All rights reserved.
// License: GPL 3.0 or later. See LICENSE.txt for details.
//
//------------------------------------------------------------------------------

use std::collections::BTreeMap;

use crate::ErrPack;
use crate::nn::error::ParamError;
use crate::nn::model::UnaryModel;
use crate::nn::model_context::ModelContext;
use crate::nn::param::{Dim, Initializer};
use crate::value::Value;

use super::input_dim;

//--------------------------------------------------------------------------------------------------

/// Affine layer `W x + b`.
///
///     W: [outputs, inputs]
///     b: [outputs]
///     input: [inputs, ...]
///     output: [outputs, ...]
pub fn linear(outputs: usize, ctx: &mut ModelContext) -> Result<UnaryModel, ErrPack<ParamError>> {
	let W = ctx.new_param("W", &[Dim::Known(outputs), Dim::Inferred], Initializer::GlorotUniform)?;
	let b = ctx.new_param("b", &[Dim::Known(outputs)], Initializer::Constant(0.0))?;
	UnaryModel::new(vec![W.clone(), b.clone()], BTreeMap::new(), move |x| {
		let W = W.value_for_input(input_dim(x)?)?;
		Value::times(&W, x)?.add(&b.value()?)
	})
}
