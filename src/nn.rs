//------------------------------------------------------------------------------
//
// Copyright 2025 Jiri Bobek. All rights reserved.
// License: GPL 3.0 or later. See LICENSE.txt for details.
//
//------------------------------------------------------------------------------

pub mod batch;
pub mod error;
pub mod layers;
pub mod model;
pub mod model_context;
pub mod model_params;
pub mod param;
pub mod sequence;

pub use error::ParamError;
pub use model::{
	BinaryBatchSequenceModel, BinaryModel, BinarySequenceModel, Model, TernaryModel,
	UnaryFoldingModel, UnaryModel, UnarySequenceModel,
};
pub use model_context::ModelContext;
pub use model_params::{ModelParameters, ModelParametersPtr};
pub use param::{DType, Device, Dim, Initializer, Parameter};
