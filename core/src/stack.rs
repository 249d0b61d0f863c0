use crate::utils::USIZE_MAX;
use crate::ExitError;
use alloc::vec::Vec;
use primitive_types::{H256, U256};

/// Operand stack of a frame. Positions passed to `peek` and `set` count
/// from the top, which is position `0`.
#[derive(Clone, Debug)]
pub struct Stack {
	data: Vec<U256>,
	limit: usize,
}

impl Stack {
	#[must_use]
	pub const fn new(limit: usize) -> Self {
		Self {
			data: Vec::new(),
			limit,
		}
	}

	#[inline]
	#[must_use]
	pub const fn limit(&self) -> usize {
		self.limit
	}

	#[inline]
	#[must_use]
	pub fn len(&self) -> usize {
		self.data.len()
	}

	#[inline]
	#[must_use]
	pub fn is_empty(&self) -> bool {
		self.data.is_empty()
	}

	/// Items bottom first.
	#[inline]
	#[must_use]
	pub const fn data(&self) -> &Vec<U256> {
		&self.data
	}

	/// Vector index of the item `no_from_top` below the top.
	#[inline]
	fn index(&self, no_from_top: usize) -> Result<usize, ExitError> {
		self.data
			.len()
			.checked_sub(no_from_top)
			.and_then(|above| above.checked_sub(1))
			.ok_or(ExitError::StackUnderflow)
	}

	#[inline]
	pub fn pop(&mut self) -> Result<U256, ExitError> {
		self.data.pop().ok_or(ExitError::StackUnderflow)
	}

	#[inline]
	pub fn pop_h256(&mut self) -> Result<H256, ExitError> {
		self.pop().map(word_to_h256)
	}

	/// Pop `N` items, top first. Fails without touching the stack when
	/// fewer than `N` are present.
	#[inline]
	pub fn pop_n<const N: usize>(&mut self) -> Result<[U256; N], ExitError> {
		let split = self
			.data
			.len()
			.checked_sub(N)
			.ok_or(ExitError::StackUnderflow)?;

		let mut items = [U256::zero(); N];
		for (item, value) in items.iter_mut().zip(self.data.drain(split..).rev()) {
			*item = value;
		}
		Ok(items)
	}

	/// Push `value`, failing with `StackOverflow` at the limit.
	#[inline]
	pub fn push(&mut self, value: U256) -> Result<(), ExitError> {
		if self.data.len() >= self.limit {
			return Err(ExitError::StackOverflow);
		}
		self.data.push(value);
		Ok(())
	}

	#[inline]
	pub fn push_h256(&mut self, value: H256) -> Result<(), ExitError> {
		self.push(U256::from_big_endian(value.as_bytes()))
	}

	#[inline]
	pub fn peek(&self, no_from_top: usize) -> Result<U256, ExitError> {
		Ok(self.data[self.index(no_from_top)?])
	}

	#[inline]
	pub fn peek_h256(&self, no_from_top: usize) -> Result<H256, ExitError> {
		self.peek(no_from_top).map(word_to_h256)
	}

	/// Peek as a `usize`. A value that does not fit can never be paid for,
	/// so it reports `OutOfGas`.
	#[inline]
	pub fn peek_usize(&self, no_from_top: usize) -> Result<usize, ExitError> {
		let value = self.peek(no_from_top)?;
		if value > USIZE_MAX {
			return Err(ExitError::OutOfGas);
		}
		Ok(value.as_usize())
	}

	/// `DUPn`: push a copy of the `n`-th item, the top being `1`.
	#[inline]
	pub fn dup(&mut self, n: usize) -> Result<(), ExitError> {
		let value = self.peek(n.checked_sub(1).ok_or(ExitError::StackUnderflow)?)?;
		self.push(value)
	}

	/// `SWAPn`: exchange the top with the item `n` places below it.
	#[inline]
	pub fn swap(&mut self, n: usize) -> Result<(), ExitError> {
		let below = self.index(n)?;
		let top = self.data.len() - 1;
		self.data.swap(top, below);
		Ok(())
	}

	#[inline]
	pub fn set(&mut self, no_from_top: usize, val: U256) -> Result<(), ExitError> {
		let index = self.index(no_from_top)?;
		self.data[index] = val;
		Ok(())
	}
}

fn word_to_h256(word: U256) -> H256 {
	let mut out = H256::zero();
	word.to_big_endian(out.as_bytes_mut());
	out
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn push_over_limit_overflows() {
		let mut stack = Stack::new(1024);
		for i in 0..1024u64 {
			stack.push(U256::from(i)).unwrap();
		}
		assert_eq!(stack.push(U256::one()), Err(ExitError::StackOverflow));
		assert_eq!(stack.len(), 1024);
	}

	#[test]
	fn pop_n_returns_top_first() {
		let mut stack = Stack::new(16);
		stack.push(U256::from(1)).unwrap();
		stack.push(U256::from(2)).unwrap();
		stack.push(U256::from(3)).unwrap();

		let [a, b] = stack.pop_n::<2>().unwrap();
		assert_eq!(a, U256::from(3));
		assert_eq!(b, U256::from(2));
		assert_eq!(stack.len(), 1);
	}

	#[test]
	fn underflow_leaves_stack_untouched() {
		let mut stack = Stack::new(16);
		stack.push(U256::from(7)).unwrap();

		assert_eq!(stack.pop_n::<2>(), Err(ExitError::StackUnderflow));
		assert_eq!(stack.peek(1), Err(ExitError::StackUnderflow));
		assert_eq!(stack.len(), 1);
		assert_eq!(stack.pop_n::<0>(), Ok([]));
	}

	#[test]
	fn dup_is_one_indexed() {
		let mut stack = Stack::new(16);
		stack.push(U256::from(1)).unwrap();
		stack.push(U256::from(2)).unwrap();

		stack.dup(2).unwrap();
		assert_eq!(stack.peek(0), Ok(U256::from(1)));
		assert_eq!(stack.dup(4), Err(ExitError::StackUnderflow));
		assert_eq!(stack.dup(0), Err(ExitError::StackUnderflow));
	}

	#[test]
	fn swap_is_zero_indexed() {
		let mut stack = Stack::new(16);
		stack.push(U256::from(1)).unwrap();
		stack.push(U256::from(2)).unwrap();
		stack.push(U256::from(3)).unwrap();

		stack.swap(2).unwrap();
		assert_eq!(stack.data(), &vec![U256::from(3), U256::from(2), U256::from(1)]);
		assert_eq!(stack.swap(3), Err(ExitError::StackUnderflow));
	}

	#[test]
	fn words_round_trip_through_h256() {
		let mut stack = Stack::new(4);
		let word = H256::from_low_u64_be(0xabcd);
		stack.push_h256(word).unwrap();
		assert_eq!(stack.peek(0), Ok(U256::from(0xabcd)));
		assert_eq!(stack.pop_h256(), Ok(word));
	}
}
