//------------------------------------------------------------------------------
//
// Copyright 2025 Jiri Bobek. All rights reserved.
// License: GPL 3.0 or later. See LICENSE.txt for details.
//
//------------------------------------------------------------------------------

//--------------------------------------------------------------------------------------------------

/// Errors raised while building a model or looking into its parameter tree.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ParamError {
	/// A parameter was registered with an empty name.
	UnnamedParameter,

	/// Two parameters owned by the same model share a name.
	DuplicateName,

	NoSuchParameter,
	NoSuchCapturedModel,
}

impl ParamError {
	pub fn is_lookup_error(self) -> bool {
		matches!(self, Self::NoSuchParameter | Self::NoSuchCapturedModel)
	}
}
