//------------------------------------------------------------------------------
//
// Copyright 2025 Jiri Bobek. All rights reserved.
// License: GPL 3.0 or later. See LICENSE.txt for details.
//
//------------------------------------------------------------------------------

use crate::ErrPack;
use crate::rng::Rng;

use super::error::ParamError;
use super::param::{DType, Device, Dim, Initializer, Parameter};

/// Parameter factory shared by the layer constructors.
///
/// Holds the settings new parameters are created with and keeps a list
/// of every parameter it has handed out.
pub struct ModelContext {
	pub device: Device,
	pub dtype: DType,
	rng: Rng,
	params: Vec<Parameter>,
}

impl ModelContext {
	pub fn new(device: Device) -> Self {
		Self::with_seed(device, 0)
	}

	pub fn with_seed(device: Device, seed: u64) -> Self {
		Self {
			device,
			dtype: DType::F32,
			rng: Rng::from_seed(seed),
			params: Vec::new(),
		}
	}

	pub fn new_param(
		&mut self,
		name: &str,
		shape: &[Dim],
		init: Initializer,
	) -> Result<Parameter, ErrPack<ParamError>> {
		if name.is_empty() {
			return Err(ErrPack::with_message(
				ParamError::UnnamedParameter,
				"parameters must be named",
			));
		}
		let seed = self.rng.next_u64();
		let param = Parameter::new(name, shape, self.dtype, init, self.device, seed);
		self.params.push(param.clone());
		Ok(param)
	}

	/// All parameters created by this context, in creation order.
	pub fn params(&self) -> &[Parameter] {
		&self.params
	}
}

impl Default for ModelContext {
	fn default() -> Self {
		Self::new(Device::Cpu)
	}
}

//--------------------------------------------------------------------------------------------------
