//------------------------------------------------------------------------------
//
// Copyright 2025 Jiri Bobek. All rights reserved.
// License: GPL 3.0 or later. See LICENSE.txt for details.
//
//------------------------------------------------------------------------------

use std::error::Error;

use dynamite::nn::layers::{linear, rnn_step, sequential};
use dynamite::nn::{Device, ModelContext, UnaryFoldingModel, batch, sequence};
use dynamite::value::Value;

const VOCAB: usize = 10;
const EMBED: usize = 4;
const HIDDEN: usize = 5;
const CLASSES: usize = 3;

fn main() -> Result<(), Box<dyn Error>> {
	let verbosity = std::env::args().skip(1).filter(|a| a == "-v").count();
	stderrlog::new()
		.module("dynamite")
		.verbosity(1 + verbosity)
		.init()
		.map_err(|e| format!("cannot initialize logging: {e}"))?;

	let seed = match std::env::var("DYNAMITE_SEED") {
		Ok(s) => s.parse::<u64>().map_err(|e| format!("DYNAMITE_SEED: {e}"))?,
		Err(_) => 0,
	};
	log::info!("using seed {seed}");

	let mut ctx = ModelContext::with_seed(Device::Cpu, seed);

	// sentence -> embeddings -> last RNN state -> class scores
	let embed = sequence::embedding(EMBED, &mut ctx)?;
	let encode = sequence::fold(rnn_step(HIDDEN, &mut ctx)?, Value::zeros(&[HIDDEN]));
	let classify = sequential(&[linear(HIDDEN, &mut ctx)?, linear(CLASSES, &mut ctx)?]);

	let mut nested = embed.captured_as("embed");
	nested.extend(encode.captured_as("encode"));
	nested.extend(classify.captured_as("classify"));
	let model = UnaryFoldingModel::with_nested(nested, move |words| {
		let xs = embed.call(words)?;
		let h = encode.call(&xs)?;
		classify.call(&h)
	});

	let sentences: Vec<Vec<usize>> = vec![vec![1, 4, 2], vec![7, 7, 3, 0, 9], vec![5]];
	let mut scores = Vec::with_capacity(sentences.len());
	for words in &sentences {
		let words = words
			.iter()
			.map(|&w| Value::one_hot(VOCAB, w))
			.collect::<Result<Vec<_>, _>>()?;
		scores.push(model.call(&words)?);
	}

	for (name, param) in model.named_parameters() {
		println!("{name}: {:?}", param.value()?.shape());
	}
	for (words, y) in sentences.iter().zip(&scores) {
		println!("{words:?} -> {y}");
	}
	println!("total = {}", batch::sum(&scores)?);

	Ok(())
}
