//------------------------------------------------------------------------------
//
// Copyright 2025 Jiri Bobek. All rights reserved.
// License: GPL 3.0 or later. See LICENSE.txt for details.
//
//------------------------------------------------------------------------------

use assert_approx_eq::assert_approx_eq;

use super::*;
use crate::nn::model_context::ModelContext;
use crate::nn::param::Device;
use crate::value::Value;

fn v(shape: &[usize], data: &[f32]) -> Value {
	Value::from_vec(shape, data.to_vec()).unwrap()
}

fn assert_all_approx_eq(a: &[f32], b: &[f32]) {
	assert_eq!(a.len(), b.len());
	for (x, y) in a.iter().zip(b) {
		assert_approx_eq!(*x, *y, 1e-5);
	}
}

fn sigmoid(x: f32) -> f32 {
	1.0 / (1.0 + (-x).exp())
}

//--------------------------------------------------------------------------------------------------

#[test]
fn linear_layer() {
	let mut ctx = ModelContext::new(Device::Cpu);
	let m = linear(2, &mut ctx).unwrap();
	m.param("W").unwrap().assign(v(&[2, 3], &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0])).unwrap();
	m.param("b").unwrap().assign(v(&[2], &[0.5, -1.0])).unwrap();

	let y = m.call(&v(&[3], &[1.0, 0.0, -1.0])).unwrap();
	assert_eq!(y.shape(), &[2]);
	assert_all_approx_eq(&y.to_vec(), &[-1.5, -3.0]);

	// trailing axes are carried through
	let x = v(&[3, 2], &[1.0, 0.0, 0.0, 1.0, -1.0, 0.0]);
	let y = m.call(&x).unwrap();
	assert_eq!(y.shape(), &[2, 2]);
	assert_all_approx_eq(&y.to_vec(), &[-1.5, 2.5, -3.0, 4.0]);
}

#[test]
fn linear_infers_input_dim() {
	let mut ctx = ModelContext::new(Device::Cpu);
	let m = linear(4, &mut ctx).unwrap();
	assert!(!m.param("W").unwrap().is_materialized());

	let y = m.call(&Value::full(&[7], 1.0)).unwrap();
	assert_eq!(y.shape(), &[4]);
	assert_eq!(m.param("W").unwrap().value().unwrap().shape(), &[4, 7]);

	// the shape is fixed now
	assert!(m.call(&Value::full(&[3], 1.0)).is_err());
}

#[test]
fn linear_rejects_scalar() {
	let mut ctx = ModelContext::new(Device::Cpu);
	let m = linear(2, &mut ctx).unwrap();
	let err = m.call(&Value::scalar(1.0)).unwrap_err();
	assert_eq!(err.code, ValueOpError::NotEnoughDimensions);
}

#[test]
fn embedding_layer() {
	let mut ctx = ModelContext::new(Device::Cpu);
	let m = embedding(3, &mut ctx).unwrap();
	assert_eq!(m.parameters().len(), 1);

	let y = m.call(&Value::one_hot(5, 2).unwrap()).unwrap();
	assert_eq!(y.shape(), &[3]);

	let E = m.param("E").unwrap().value().unwrap();
	assert_eq!(E.shape(), &[3, 5]);
	assert_eq!(y, E.index_last(2).unwrap());
}

//--------------------------------------------------------------------------------------------------

#[test]
fn rnn_step_layer() {
	let mut ctx = ModelContext::new(Device::Cpu);
	let m = rnn_step(2, &mut ctx).unwrap();
	m.param("W").unwrap().assign(v(&[2, 1], &[1.0, -1.0])).unwrap();
	m.param("R").unwrap().assign(v(&[2, 2], &[1.0, 0.0, 0.0, 1.0])).unwrap();

	let h = v(&[2], &[0.5, 0.5]);
	let y = m.call(&h, &v(&[1], &[2.0])).unwrap();
	assert_all_approx_eq(&y.to_vec(), &[2.5, 0.0]);

	let names: Vec<_> = m.named_parameters().into_iter().map(|(name, _)| name).collect();
	assert_eq!(names, vec!["R", "W", "b"]);
}

const LSTM_W: [f32; 4] = [0.1, 0.2, 0.3, 0.4];
const LSTM_R: [f32; 4] = [0.5, -0.5, 0.25, 1.0];
const LSTM_B: [f32; 4] = [0.0, 0.1, 0.0, -0.1];

fn assign_lstm<F: ?Sized>(m: &crate::nn::model::Model<F>) {
	m.param("W").unwrap().assign(v(&[4, 1], &LSTM_W)).unwrap();
	m.param("R").unwrap().assign(v(&[4, 1], &LSTM_R)).unwrap();
	m.param("b").unwrap().assign(v(&[4], &LSTM_B)).unwrap();
}

/// Returns `(h, c)` for a single unit.
fn lstm_reference(h: f32, c: f32, x: f32) -> (f32, f32) {
	let z: Vec<f32> = (0..4).map(|k| LSTM_W[k] * x + LSTM_B[k] + LSTM_R[k] * h).collect();
	let i = sigmoid(z[0]);
	let f = sigmoid(z[1]);
	let g = z[2].tanh();
	let o = sigmoid(z[3]);
	let c = f * c + i * g;
	(o * c.tanh(), c)
}

#[test]
fn lstm_step_layer() {
	let mut ctx = ModelContext::new(Device::Cpu);
	let m = lstm_step(1, &mut ctx).unwrap();
	assign_lstm(&m);

	let y = m.call(&v(&[1], &[0.3]), &v(&[1], &[-0.2]), &v(&[1], &[1.0])).unwrap();
	let (h, _) = lstm_reference(0.3, -0.2, 1.0);
	assert_eq!(y.shape(), &[1]);
	assert_approx_eq!(y.to_vec()[0], h, 1e-5);
}

#[test]
fn lstm_recurrent_step_carries_cell_state() {
	let mut ctx = ModelContext::new(Device::Cpu);
	let m = lstm_recurrent_step(1, &mut ctx).unwrap();
	assign_lstm(&m);

	let s1 = m.call(&Value::zeros(&[2]), &v(&[1], &[1.0])).unwrap();
	let s2 = m.call(&s1, &v(&[1], &[-0.5])).unwrap();
	assert_eq!(s2.shape(), &[2]);

	let (h1, c1) = lstm_reference(0.0, 0.0, 1.0);
	let (h2, c2) = lstm_reference(h1, c1, -0.5);
	assert_all_approx_eq(&s1.to_vec(), &[h1, c1]);
	assert_all_approx_eq(&s2.to_vec(), &[h2, c2]);
}

//--------------------------------------------------------------------------------------------------

#[test]
fn sequential_composes_in_order() {
	let mut ctx = ModelContext::with_seed(Device::Cpu, 7);
	let m0 = linear(3, &mut ctx).unwrap();
	let m1 = linear(2, &mut ctx).unwrap();
	let s = sequential(&[m0.clone(), m1.clone()]);

	let x = v(&[2], &[1.0, -1.0]);
	let expected = m1.call(&m0.call(&x).unwrap()).unwrap();
	assert_eq!(s.call(&x).unwrap(), expected);

	let names: Vec<_> = s.named_parameters().into_iter().map(|(name, _)| name).collect();
	assert_eq!(names, vec!["[0].W", "[0].b", "[1].W", "[1].b"]);

	let params = s.parameters();
	assert!(params[0].same_as(m0.param("W").unwrap()));
	assert!(params[3].same_as(m1.param("b").unwrap()));
	assert!(s.model_params().own_names().next().is_none());
}

#[test]
fn empty_sequential_is_identity() {
	let s = sequential(&[]);
	let x = v(&[2], &[1.0, 2.0]);
	assert_eq!(s.call(&x).unwrap(), x);
	assert!(s.parameters().is_empty());
}

#[test]
fn call_batch_applies_layer_per_item() {
	let mut ctx = ModelContext::new(Device::Cpu);
	let m = linear(2, &mut ctx).unwrap();
	let batch = vec![v(&[2], &[1.0, 0.0]), v(&[2], &[0.0, 1.0]), v(&[2], &[1.0, 1.0])];
	let ys = m.call_batch(&batch).unwrap();
	assert_eq!(ys.len(), 3);
	for (x, y) in batch.iter().zip(&ys) {
		assert_eq!(*y, m.call(x).unwrap());
	}
	assert!(m.call_batch(&[]).unwrap().is_empty());
}
