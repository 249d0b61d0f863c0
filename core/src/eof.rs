//! EOF v1 container parsing and code validation.
//!
//! A container is `EF00`, the version byte, a code section header
//! (`0x01` + two byte size), an optional data section header (`0x02` + two
//! byte size), the terminator `0x00`, then the section bodies in order.

use crate::{ExitError, Opcode};

/// Leading bytes of every container.
pub const MAGIC: [u8; 2] = [0xef, 0x00];
/// The only supported container version.
pub const VERSION: u8 = 0x01;

const KIND_TERMINATOR: u8 = 0x00;
const KIND_CODE: u8 = 0x01;
const KIND_DATA: u8 = 0x02;

/// Reasons a container fails to validate.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum EofError {
	/// Code does not start with `EF00`.
	Magic,
	/// Unknown container version.
	Version,
	/// The first section is not a code section.
	MissingCodeSection,
	/// A section header declares a zero size.
	EmptySection,
	/// The header is not closed by the terminator.
	MissingTerminator,
	/// Declared section sizes do not add up to the container length.
	SizeMismatch,
	/// The code section contains an undefined opcode.
	UndefinedOpcode(Opcode),
	/// A push immediate runs past the end of the code section.
	TruncatedPush,
	/// The code section does not end with a terminating opcode.
	MissingTerminatingOpcode,
}

impl From<EofError> for ExitError {
	fn from(_: EofError) -> Self {
		ExitError::InvalidEofFormat
	}
}

/// Sections of a validated container, borrowed from the container bytes.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct EofContainer<'a> {
	/// Length of the header, which is also the offset of the code section.
	pub header_len: usize,
	/// The code section.
	pub code: &'a [u8],
	/// The data section, empty when absent.
	pub data: &'a [u8],
}

/// Whether the code claims to be a container.
pub fn is_eof(code: &[u8]) -> bool {
	code.starts_with(&MAGIC)
}

fn read_size(bytes: &[u8], at: usize) -> Option<usize> {
	match (bytes.get(at), bytes.get(at + 1)) {
		(Some(hi), Some(lo)) => Some(((*hi as usize) << 8) | *lo as usize),
		_ => None,
	}
}

/// Parse the container header and check the declared sizes.
pub fn parse(container: &[u8]) -> Result<EofContainer<'_>, EofError> {
	if !is_eof(container) {
		return Err(EofError::Magic);
	}
	if container.get(2) != Some(&VERSION) {
		return Err(EofError::Version);
	}
	if container.get(3) != Some(&KIND_CODE) {
		return Err(EofError::MissingCodeSection);
	}
	let code_size = read_size(container, 4).ok_or(EofError::MissingTerminator)?;
	if code_size == 0 {
		return Err(EofError::EmptySection);
	}

	let (header_len, data_size) = match container.get(6) {
		Some(&KIND_TERMINATOR) => (7, 0),
		Some(&KIND_DATA) => {
			let data_size = read_size(container, 7).ok_or(EofError::MissingTerminator)?;
			if container.get(9) != Some(&KIND_TERMINATOR) {
				return Err(EofError::MissingTerminator);
			}
			if data_size == 0 {
				return Err(EofError::EmptySection);
			}
			(10, data_size)
		}
		_ => return Err(EofError::MissingTerminator),
	};

	if container.len() != header_len + code_size + data_size {
		return Err(EofError::SizeMismatch);
	}

	Ok(EofContainer {
		header_len,
		code: &container[header_len..header_len + code_size],
		data: &container[header_len + code_size..],
	})
}

/// Check that every opcode of a code section is defined, that no push
/// immediate is truncated, and that the section ends with a terminating
/// opcode.
pub fn validate_code<F>(code: &[u8], is_defined: F) -> Result<(), EofError>
where
	F: Fn(Opcode) -> bool,
{
	let mut last = None;
	let mut i = 0;
	while i < code.len() {
		let opcode = Opcode(code[i]);
		if !is_defined(opcode) {
			return Err(EofError::UndefinedOpcode(opcode));
		}
		let immediates = opcode.is_push().unwrap_or(0) as usize;
		if i + 1 + immediates > code.len() {
			return Err(EofError::TruncatedPush);
		}
		last = Some(opcode);
		i += 1 + immediates;
	}

	match last {
		Some(Opcode::STOP)
		| Some(Opcode::RETURN)
		| Some(Opcode::REVERT)
		| Some(Opcode::INVALID)
		| Some(Opcode::SUICIDE) => Ok(()),
		_ => Err(EofError::MissingTerminatingOpcode),
	}
}
