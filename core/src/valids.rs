use crate::Opcode;
use alloc::vec::Vec;

/// What a code position may be used as.
#[repr(u8)]
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Valid {
	None,
	JumpDest,
	BeginSub,
}

/// Jump analysis of a code buffer, one marker per byte. Bytes inside
/// `PUSH` immediates are never destinations.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Valids(Vec<Valid>);

impl Valids {
	pub fn new(code: &[u8]) -> Self {
		let mut markers = Vec::with_capacity(code.len());
		let mut immediates = 0usize;

		for byte in code {
			if immediates > 0 {
				immediates -= 1;
				markers.push(Valid::None);
				continue;
			}

			let opcode = Opcode(*byte);
			markers.push(match opcode {
				Opcode::JUMPDEST => Valid::JumpDest,
				Opcode::BEGINSUB => Valid::BeginSub,
				_ => Valid::None,
			});
			immediates = opcode.is_push().map_or(0, usize::from);
		}

		Valids(markers)
	}

	/// Same as the length of the analysed code.
	#[inline]
	pub fn len(&self) -> usize {
		self.0.len()
	}

	#[inline]
	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}

	pub fn is_jumpdest(&self, position: usize) -> bool {
		self.0.get(position) == Some(&Valid::JumpDest)
	}

	/// Subroutine entry point, only meaningful when EIP-2315 is active.
	pub fn is_beginsub(&self, position: usize) -> bool {
		self.0.get(position) == Some(&Valid::BeginSub)
	}
}
