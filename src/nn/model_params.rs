//------------------------------------------------------------------------------
//
// Copyright 2025 Jiri Bobek. All rights reserved.
// License: GPL 3.0 or later. See LICENSE.txt for details.
//
//------------------------------------------------------------------------------

use std::collections::BTreeMap;
use std::collections::btree_map::Entry;
use std::sync::Arc;

use crate::ErrPack;

use super::error::ParamError;
use super::param::Parameter;

//--------------------------------------------------------------------------------------------------

pub type ModelParametersPtr = Arc<ModelParameters>;

/// Parameters owned by one model, plus the parameter sets of the models it captured.
///
/// A `ModelParameters` is built once and never changes afterwards. Nested sets are
/// shared, so two models built on top of the same sub-model see the same parameters.
/// Since a nested set must exist before its parent is built, the structure can't
/// contain cycles.
///
/// Both maps are ordered by name, which makes `parameters()` deterministic.
#[derive(Debug, Default)]
pub struct ModelParameters {
	parameters: BTreeMap<String, Parameter>,
	nested: BTreeMap<String, ModelParametersPtr>,
}

impl ModelParameters {
	pub fn new(
		parameters: impl IntoIterator<Item = Parameter>,
		nested: BTreeMap<String, ModelParametersPtr>,
	) -> Result<Self, ErrPack<ParamError>> {
		let mut own = BTreeMap::new();
		for p in parameters {
			if p.name().is_empty() {
				return Err(ErrPack::with_message(
					ParamError::UnnamedParameter,
					"parameters must be named",
				));
			}
			match own.entry(p.name().to_string()) {
				Entry::Vacant(slot) => {
					slot.insert(p);
				},
				Entry::Occupied(slot) => {
					return Err(ErrPack::with_message(
						ParamError::DuplicateName,
						format!("duplicate parameter name: {}", slot.key()),
					));
				},
			}
		}
		log::debug!(
			"ModelParameters::new(): {} own parameters, {} captured models",
			own.len(),
			nested.len()
		);
		Ok(Self { parameters: own, nested })
	}

	pub fn empty() -> Self {
		Self::default()
	}

	/// Parameter set of a pure combinator, it owns nothing, only captures.
	pub fn from_nested(nested: BTreeMap<String, ModelParametersPtr>) -> Self {
		Self { parameters: BTreeMap::new(), nested }
	}

	pub fn get(&self, name: &str) -> Result<&Parameter, ErrPack<ParamError>> {
		self.parameters.get(name).ok_or_else(|| {
			ErrPack::with_message(ParamError::NoSuchParameter, format!("no such parameter: {name}"))
		})
	}

	pub fn nested(&self, name: &str) -> Result<&ModelParametersPtr, ErrPack<ParamError>> {
		self.nested.get(name).ok_or_else(|| {
			ErrPack::with_message(
				ParamError::NoSuchCapturedModel,
				format!("no such captured model: {name}"),
			)
		})
	}

	pub fn own_names(&self) -> impl Iterator<Item = &str> {
		self.parameters.keys().map(String::as_str)
	}

	pub fn nested_names(&self) -> impl Iterator<Item = &str> {
		self.nested.keys().map(String::as_str)
	}

	/// Recursively collects all parameters. Own parameters come first, then the nested sets
	/// in name order.
	pub fn append_parameters_to(&self, res: &mut Vec<Parameter>) {
		res.extend(self.parameters.values().cloned());
		for nested in self.nested.values() {
			nested.append_parameters_to(res);
		}
	}

	pub fn parameters(&self) -> Vec<Parameter> {
		let mut res = Vec::new();
		self.append_parameters_to(&mut res);
		res
	}

	/// Same order as `parameters()`, each name qualified by the path of captured models,
	/// e.g. `[1].f.W`.
	pub fn named_parameters(&self) -> Vec<(String, Parameter)> {
		let mut res = Vec::new();
		self.collect_named_params("", &mut |name, p| res.push((name, p)));
		res
	}

	fn collect_named_params(&self, prefix: &str, f: &mut dyn FnMut(String, Parameter)) {
		for (name, p) in &self.parameters {
			f(format!("{prefix}{name}"), p.clone());
		}
		for (name, nested) in &self.nested {
			nested.collect_named_params(format!("{prefix}{name}.").as_str(), f);
		}
	}
}

//--------------------------------------------------------------------------------------------------
