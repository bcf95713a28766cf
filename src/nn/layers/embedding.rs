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

/// Projects a (typically one-hot) input to an `embedding_dim` vector.
///
///     E: [embedding_dim, inputs]
///     input: [inputs, ...]
///     output: [embedding_dim, ...]
///
/// `inputs` is taken from the first input the model sees.
pub fn embedding(
	embedding_dim: usize,
	ctx: &mut ModelContext,
) -> Result<UnaryModel, ErrPack<ParamError>> {
	let E = ctx.new_param(
		"E",
		&[Dim::Known(embedding_dim), Dim::Inferred],
		Initializer::GlorotUniform,
	)?;
	UnaryModel::new(vec![E.clone()], BTreeMap::new(), move |x| {
		let E = E.value_for_input(input_dim(x)?)?;
		Value::times(&E, x)
	})
}
