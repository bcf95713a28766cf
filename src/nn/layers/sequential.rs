//------------------------------------------------------------------------------
//
// Copyright 2025 Jiri Bobek. All rights reserved.
// License: GPL 3.0 or later. See LICENSE.txt for details.
//
//------------------------------------------------------------------------------

use std::collections::BTreeMap;

use crate::nn::model::UnaryModel;

//--------------------------------------------------------------------------------------------------

/// Chains the models, `fns[n-1](...fns[1](fns[0](x)))`.
///
/// Owns no parameters. The parameters of `fns[i]` are captured under `"[i]"`.
pub fn sequential(fns: &[UnaryModel]) -> UnaryModel {
	if fns.is_empty() {
		log::warn!("sequential(): no models given, the result is the identity");
	}

	let mut captured = BTreeMap::new();
	for (i, f) in fns.iter().enumerate() {
		captured.insert(format!("[{i}]"), f.model_params().clone());
	}

	let fns = fns.to_vec();
	UnaryModel::with_nested(captured, move |x| {
		let mut arg = x.clone();
		for f in &fns {
			arg = f.call(&arg)?;
		}
		Ok(arg)
	})
}
