//------------------------------------------------------------------------------
//
// Copyright 2025 Jiri Bobek. All rights reserved.
// License: GPL 3.0 or later. See LICENSE.txt for details.
//
//------------------------------------------------------------------------------

// State initialization constant ("expand 32-byte k")
const CONST: [u32; 4] = [0x_6170_7865, 0x_3320_646e, 0x_7962_2d32, 0x_6b20_6574];

const STATE_WORDS: usize = 16;

/// Counter based generator (ChaCha with 14 rounds).
///
/// Every parameter gets its own seed, so initial values don't depend on
/// the order in which parameters are materialized.
#[derive(Clone)]
pub struct Rng {
	state: [u32; STATE_WORDS],
	block: [u32; STATE_WORDS],
	used: usize,
}

impl Default for Rng {
	fn default() -> Self {
		Self::from_seed(0x_0a69_ee79_fb23_8e49)
	}
}

#[allow(clippy::indexing_slicing)]
impl Rng {
	pub fn from_seed(seed: u64) -> Self {
		let [C0, C1, C2, C3] = CONST;
		#[allow(clippy::cast_possible_truncation)]
		let (lo, hi) = (seed as u32, (seed >> 32) as u32);
		#[rustfmt::skip]
		let state = [
			C0, C1, C2, C3,
			lo, hi, !lo, !hi,
			lo.rotate_left(7), hi.rotate_left(13), 0x9b_f9_a0_72, 0x00_da_bd_56,
			0, 0, 0x1a_da_b1_4a, 0x4c_3d_51_fd,
		];
		Self {
			state,
			block: [0; STATE_WORDS],
			used: STATE_WORDS,
		}
	}

	// generates a block of random numbers
	#[inline(never)]
	fn refill(&mut self) {
		let mut result = self.state;

		// do 7 double rounds, i.e. 14 rounds
		for _ in 0..7 {
			Self::quarter_round(0, 4, 8, 12, &mut result);
			Self::quarter_round(1, 5, 9, 13, &mut result);
			Self::quarter_round(2, 6, 10, 14, &mut result);
			Self::quarter_round(3, 7, 11, 15, &mut result);

			Self::quarter_round(0, 5, 10, 15, &mut result);
			Self::quarter_round(1, 6, 11, 12, &mut result);
			Self::quarter_round(2, 7, 8, 13, &mut result);
			Self::quarter_round(3, 4, 9, 14, &mut result);
		}

		for (r, s) in result.iter_mut().zip(self.state.iter()) {
			*r = r.wrapping_add(*s);
		}

		// increment counter
		let (t, c) = self.state[12].overflowing_add(1);
		self.state[12] = t;
		self.state[13] = self.state[13].wrapping_add(u32::from(c));

		self.block = result;
		self.used = 0;
	}

	#[inline(always)]
	fn quarter_round(a: usize, b: usize, c: usize, d: usize, state: &mut [u32; STATE_WORDS]) {
		state[a] = state[a].wrapping_add(state[b]);
		state[d] ^= state[a];
		state[d] = state[d].rotate_left(16);

		state[c] = state[c].wrapping_add(state[d]);
		state[b] ^= state[c];
		state[b] = state[b].rotate_left(12);

		state[a] = state[a].wrapping_add(state[b]);
		state[d] ^= state[a];
		state[d] = state[d].rotate_left(8);

		state[c] = state[c].wrapping_add(state[d]);
		state[b] ^= state[c];
		state[b] = state[b].rotate_left(7);
	}

	pub fn next_u32(&mut self) -> u32 {
		if self.used >= STATE_WORDS {
			self.refill();
		}
		let v = self.block[self.used];
		self.used += 1;
		v
	}

	pub fn next_u64(&mut self) -> u64 {
		let lo = u64::from(self.next_u32());
		let hi = u64::from(self.next_u32());
		(hi << 32) | lo
	}

	/// Uniform in `[0.0, 1.0)`.
	pub fn get_uniform(&mut self) -> f64 {
		f64::from(self.next_u32()) * (1.0 / 4_294_967_296.0)
	}

	/// Normal distribution with mean 0 and variance 1.
	/// The generated values are guaranteed to be in the range (-10.0, 10.0)
	pub fn get_normal_clamped(&mut self) -> f64 {
		let x = 1.0 - self.get_uniform(); // (0.0, 1.0]
		let y = self.get_uniform(); // [0.0, 1.0)

		// box mueller transform
		let r = (-2.0 * x.ln()).sqrt();
		let theta = std::f64::consts::TAU * y;
		let result = r * theta.cos();

		if result.abs() >= 10.0 {
			log::warn!("Rng::get_normal_clamped(): clamping {result} to (-10.0, 10.0)");
			return 0.0;
		}
		result
	}

	#[allow(clippy::cast_possible_truncation)]
	pub fn uniform(&mut self, out: &mut [f32], low: f64, high: f64) {
		for v in out.iter_mut() {
			*v = (low + (high - low) * self.get_uniform()) as f32;
		}
	}

	#[allow(clippy::cast_possible_truncation)]
	pub fn randn(&mut self, out: &mut [f32], stddev: f64) {
		for v in out.iter_mut() {
			*v = (self.get_normal_clamped() * stddev) as f32;
		}
	}
}

//--------------------------------------------------------------------------------------------------
