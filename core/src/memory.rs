use crate::{ExitError, ExitFatal};
use alloc::vec::Vec;
use core::cmp::{max, min};
use primitive_types::U256;

/// Frame memory.
///
/// Two lengths are tracked. `effective_len` is the word-aligned size the
/// program has touched and is what `MSIZE` and expansion gas see. The
/// backing buffer only grows when bytes are written, so untouched regions
/// read as zero without being allocated.
#[derive(Clone, Debug)]
pub struct Memory {
	data: Vec<u8>,
	effective_len: U256,
	limit: usize,
}

impl Memory {
	/// Empty memory whose backing buffer never exceeds `limit` bytes.
	pub fn new(limit: usize) -> Self {
		Self {
			data: Vec::new(),
			effective_len: U256::zero(),
			limit,
		}
	}

	pub fn limit(&self) -> usize {
		self.limit
	}

	/// Bytes actually allocated.
	pub fn len(&self) -> usize {
		self.data.len()
	}

	pub fn is_empty(&self) -> bool {
		self.data.is_empty()
	}

	/// Word-aligned length reported by `MSIZE`.
	pub fn effective_len(&self) -> U256 {
		self.effective_len
	}

	/// Words covered by the effective length, the figure expansion gas is
	/// priced on.
	pub fn word_count(&self) -> U256 {
		self.effective_len >> 5
	}

	pub fn data(&self) -> &Vec<u8> {
		&self.data
	}

	/// Extend the effective length over `offset..offset + len`. A zero `len`
	/// touches nothing whatever the offset.
	pub fn resize_offset(&mut self, offset: U256, len: U256) -> Result<(), ExitError> {
		if len.is_zero() {
			return Ok(());
		}

		let end = offset.checked_add(len).ok_or(ExitError::OutOfRange)?;
		self.resize_end(end)
	}

	/// Extend the effective length up to `end`, rounded up to a word.
	pub fn resize_end(&mut self, end: U256) -> Result<(), ExitError> {
		if end <= self.effective_len {
			return Ok(());
		}

		self.effective_len = word_ceil(end).ok_or(ExitError::OutOfRange)?;
		Ok(())
	}

	/// Read `size` bytes at `offset`, zero filling past the written data.
	///
	/// `size` is trusted. Callers meter expansion before reading.
	pub fn get(&self, offset: usize, size: usize) -> Vec<u8> {
		let mut out = Vec::with_capacity(size);
		let start = min(offset, self.data.len());
		let end = min(offset.saturating_add(size), self.data.len());
		out.extend_from_slice(&self.data[start..end]);
		out.resize(size, 0);
		out
	}

	/// Write `value` at `offset`. With `target_size` the write covers exactly
	/// that many bytes, truncating `value` or padding it with zeros.
	pub fn set(
		&mut self,
		offset: usize,
		value: &[u8],
		target_size: Option<usize>,
	) -> Result<(), ExitFatal> {
		let size = target_size.unwrap_or(value.len());
		if size == 0 {
			return Ok(());
		}

		let end = match offset.checked_add(size) {
			Some(end) if end <= self.limit => end,
			_ => return Err(ExitFatal::NotSupported),
		};
		if self.data.len() < end {
			self.data.resize(end, 0);
		}

		let copied = min(size, value.len());
		self.data[offset..offset + copied].copy_from_slice(&value[..copied]);
		self.data[offset + copied..end].fill(0);

		Ok(())
	}

	/// Copy `len` bytes of `data` starting at `data_offset` to
	/// `memory_offset`. Bytes past the end of `data` are written as zeros.
	pub fn copy_large(
		&mut self,
		memory_offset: U256,
		data_offset: U256,
		len: U256,
		data: &[u8],
	) -> Result<(), ExitFatal> {
		// A zero-length copy is a no-op whatever the offsets.
		if len.is_zero() {
			return Ok(());
		}

		let usize_max = U256::from(usize::MAX);
		if memory_offset > usize_max || len > usize_max {
			return Err(ExitFatal::NotSupported);
		}

		let source = if data_offset >= U256::from(data.len()) {
			&[][..]
		} else {
			let start = data_offset.as_usize();
			let end = start.saturating_add(len.as_usize());
			&data[start..min(end, data.len())]
		};

		self.set(memory_offset.as_usize(), source, Some(len.as_usize()))
	}

	/// `MCOPY`. Overlapping ranges copy as if through a temporary buffer.
	pub fn copy(&mut self, dst: usize, src: usize, len: usize) {
		if len == 0 {
			return;
		}

		let end = max(dst, src) + len;
		if self.data.len() < end {
			self.data.resize(end, 0);
		}
		self.data.copy_within(src..src + len, dst);
	}
}

/// `x` rounded up to a multiple of 32, `None` on overflow.
fn word_ceil(x: U256) -> Option<U256> {
	let rem = x.low_u64() % 32;
	if rem == 0 {
		Some(x)
	} else {
		x.checked_add(U256::from(32 - rem))
	}
}
