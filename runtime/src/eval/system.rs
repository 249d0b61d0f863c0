use super::Control;
use crate::{
	CallScheme, Context, CreateScheme, ExitError, ExitReason, ExitSucceed, Handler, Runtime,
	Transfer,
};
use alloc::borrow::Cow;
use alloc::vec::Vec;
use core::cmp::min;
use k256::ecdsa::{RecoveryId, Signature, VerifyingKey};
use primitive_types::{H160, H256, U256};
use sha3::{Digest, Keccak256};

/// Prefix byte of the message an AUTH signature commits to.
const AUTH_MAGIC: u8 = 0x04;

/// Half of the secp256k1 group order. AUTH rejects signatures above it.
const SECP256K1_N_DIV_2: [u8; 32] = [
	0x7f, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff,
	0x5d, 0x57, 0x6e, 0x73, 0x57, 0xa4, 0x50, 0x1d, 0xdf, 0xe9, 0x2f, 0x46, 0x68, 0x1b, 0x20, 0xa0,
];

/// Resize memory over `offset..offset + len` and read the region.
fn read_memory(runtime: &mut Runtime, offset: U256, len: U256) -> Result<Vec<u8>, ExitError> {
	runtime.machine.memory_mut().resize_offset(offset, len)?;
	if len.is_zero() {
		return Ok(Vec::new());
	}
	if offset > U256::from(usize::MAX) || len > U256::from(usize::MAX) {
		return Err(ExitError::OutOfRange);
	}
	Ok(runtime
		.machine
		.memory()
		.get(offset.as_usize(), len.as_usize()))
}

pub fn sha3(runtime: &mut Runtime) -> Control {
	pop_u256!(runtime, from, len);

	let data = try_or_fail!(read_memory(runtime, from, len));
	let ret = Keccak256::digest(data.as_slice());
	push_h256!(runtime, H256::from_slice(ret.as_slice()));

	Control::Continue
}

pub fn chainid<H: Handler>(runtime: &mut Runtime, handler: &H) -> Control {
	push_u256!(runtime, handler.chain_id());

	Control::Continue
}

pub fn address(runtime: &mut Runtime) -> Control {
	let ret = H256::from(runtime.context.address);
	push_h256!(runtime, ret);

	Control::Continue
}

pub fn balance<H: Handler>(runtime: &mut Runtime, handler: &H) -> Control {
	pop_h256!(runtime, address);
	push_u256!(runtime, handler.balance(address.into()));

	Control::Continue
}

pub fn selfbalance<H: Handler>(runtime: &mut Runtime, handler: &H) -> Control {
	push_u256!(runtime, handler.balance(runtime.context.address));

	Control::Continue
}

pub fn origin<H: Handler>(runtime: &mut Runtime, handler: &H) -> Control {
	let ret = H256::from(handler.origin());
	push_h256!(runtime, ret);

	Control::Continue
}

pub fn caller(runtime: &mut Runtime) -> Control {
	let ret = H256::from(runtime.context.caller);
	push_h256!(runtime, ret);

	Control::Continue
}

pub fn callvalue(runtime: &mut Runtime) -> Control {
	push_u256!(runtime, runtime.context.apparent_value);

	Control::Continue
}

pub fn gasprice<H: Handler>(runtime: &mut Runtime, handler: &H) -> Control {
	push_u256!(runtime, handler.gas_price());

	Control::Continue
}

pub fn base_fee<H: Handler>(runtime: &mut Runtime, handler: &H) -> Control {
	push_u256!(runtime, handler.block_base_fee_per_gas());

	Control::Continue
}

pub fn extcodesize<H: Handler>(runtime: &mut Runtime, handler: &H) -> Control {
	pop_h256!(runtime, address);
	push_u256!(runtime, handler.code_size(address.into()));

	Control::Continue
}

pub fn extcodehash<H: Handler>(runtime: &mut Runtime, handler: &H) -> Control {
	pop_h256!(runtime, address);
	push_h256!(runtime, handler.code_hash(address.into()));

	Control::Continue
}

pub fn extcodecopy<H: Handler>(runtime: &mut Runtime, handler: &H) -> Control {
	pop_h256!(runtime, address);
	pop_u256!(runtime, memory_offset, code_offset, len);

	try_or_fail!(runtime
		.machine
		.memory_mut()
		.resize_offset(memory_offset, len));
	if len.is_zero() {
		return Control::Continue;
	}
	try_or_fail!(runtime.machine.memory_mut().copy_large(
		memory_offset,
		code_offset,
		len,
		&handler.code(address.into()),
	));

	Control::Continue
}

pub fn returndatasize(runtime: &mut Runtime) -> Control {
	let size = U256::from(runtime.return_data_buffer.len());
	push_u256!(runtime, size);

	Control::Continue
}

pub fn returndatacopy(runtime: &mut Runtime) -> Control {
	pop_u256!(runtime, memory_offset, data_offset, len);

	try_or_fail!(runtime
		.machine
		.memory_mut()
		.resize_offset(memory_offset, len));
	if data_offset
		.checked_add(len)
		.map(|l| l > U256::from(runtime.return_data_buffer.len()))
		.unwrap_or(true)
	{
		return Control::Exit(ExitError::OutOfOffset.into());
	}

	match runtime.machine.memory_mut().copy_large(
		memory_offset,
		data_offset,
		len,
		&runtime.return_data_buffer,
	) {
		Ok(()) => Control::Continue,
		Err(e) => Control::Exit(e.into()),
	}
}

pub fn blockhash<H: Handler>(runtime: &mut Runtime, handler: &H) -> Control {
	pop_u256!(runtime, number);
	push_h256!(runtime, handler.block_hash(number));

	Control::Continue
}

pub fn coinbase<H: Handler>(runtime: &mut Runtime, handler: &H) -> Control {
	push_h256!(runtime, H256::from(handler.block_coinbase()));
	Control::Continue
}

pub fn timestamp<H: Handler>(runtime: &mut Runtime, handler: &H) -> Control {
	push_u256!(runtime, handler.block_timestamp());
	Control::Continue
}

pub fn number<H: Handler>(runtime: &mut Runtime, handler: &H) -> Control {
	push_u256!(runtime, handler.block_number());
	Control::Continue
}

pub fn difficulty<H: Handler>(runtime: &mut Runtime, handler: &H) -> Control {
	push_u256!(runtime, handler.block_difficulty());
	Control::Continue
}

pub fn prevrandao<H: Handler>(runtime: &mut Runtime, handler: &H) -> Control {
	push_h256!(runtime, handler.block_randomness());
	Control::Continue
}

pub fn gaslimit<H: Handler>(runtime: &mut Runtime, handler: &H) -> Control {
	push_u256!(runtime, handler.block_gas_limit());
	Control::Continue
}

pub fn blobhash<H: Handler>(runtime: &mut Runtime, handler: &H) -> Control {
	pop_u256!(runtime, index);
	push_h256!(runtime, handler.blob_hash(index));
	Control::Continue
}

pub fn blobbasefee<H: Handler>(runtime: &mut Runtime, handler: &H) -> Control {
	push_u256!(runtime, handler.blob_base_fee());
	Control::Continue
}

pub fn sload<H: Handler>(runtime: &mut Runtime, handler: &H) -> Control {
	pop_h256!(runtime, index);
	let value = handler.storage(runtime.context.address, index);
	push_h256!(runtime, value);

	event!(SLoad {
		address: runtime.context.address,
		index,
		value
	});

	Control::Continue
}

pub fn sstore<H: Handler>(runtime: &mut Runtime, handler: &mut H) -> Control {
	pop_h256!(runtime, index, value);

	event!(SStore {
		address: runtime.context.address,
		index,
		value
	});

	match handler.set_storage(runtime.context.address, index, value) {
		Ok(()) => Control::Continue,
		Err(e) => Control::Exit(e.into()),
	}
}

pub fn tload<H: Handler>(runtime: &mut Runtime, handler: &H) -> Control {
	pop_h256!(runtime, index);
	let value = handler.transient_storage(runtime.context.address, index);
	push_h256!(runtime, value);

	Control::Continue
}

pub fn tstore<H: Handler>(runtime: &mut Runtime, handler: &mut H) -> Control {
	pop_h256!(runtime, index, value);

	match handler.set_transient_storage(runtime.context.address, index, value) {
		Ok(()) => Control::Continue,
		Err(e) => Control::Exit(e.into()),
	}
}

pub fn mcopy(runtime: &mut Runtime) -> Control {
	pop_u256!(runtime, dst, src, len);

	try_or_fail!(runtime.machine.memory_mut().resize_offset(dst, len));
	try_or_fail!(runtime.machine.memory_mut().resize_offset(src, len));
	if len.is_zero() {
		return Control::Continue;
	}
	let dst = as_usize_or_fail!(dst);
	let src = as_usize_or_fail!(src);
	let len = as_usize_or_fail!(len);
	runtime.machine.memory_mut().copy(dst, src, len);

	Control::Continue
}

pub fn gas<H: Handler>(runtime: &mut Runtime, handler: &H) -> Control {
	push_u256!(runtime, handler.gas_left());

	Control::Continue
}

pub fn log<H: Handler>(runtime: &mut Runtime, n: u8, handler: &mut H) -> Control {
	pop_u256!(runtime, offset, len);

	let data = try_or_fail!(read_memory(runtime, offset, len));
	let mut topics = Vec::new();
	for _ in 0..(n as usize) {
		pop_h256!(runtime, topic);
		topics.push(topic);
	}

	match handler.log(runtime.context.address, topics, data) {
		Ok(()) => Control::Continue,
		Err(e) => Control::Exit(e.into()),
	}
}

pub fn suicide<H: Handler>(runtime: &mut Runtime, handler: &mut H) -> Control {
	pop_h256!(runtime, target);

	match handler.mark_delete(runtime.context.address, target.into()) {
		Ok(()) => (),
		Err(e) => return Control::Exit(e.into()),
	}

	Control::Exit(ExitSucceed::Suicided.into())
}

pub fn jumpsub(runtime: &mut Runtime) -> Control {
	pop_u256!(runtime, location);
	try_or_fail!(runtime.machine.enter_subroutine(location));

	Control::Continue
}

pub fn returnsub(runtime: &mut Runtime) -> Control {
	try_or_fail!(runtime.machine.return_from_subroutine());

	Control::Continue
}

/// Address recovered from a secp256k1 signature over a prehashed message.
fn recover_signer(hash: &[u8; 32], y_parity: u8, rs: &[u8]) -> Option<H160> {
	let signature = Signature::from_slice(rs).ok()?;
	let recovery_id = RecoveryId::from_byte(y_parity)?;
	let key = VerifyingKey::recover_from_prehash(hash, &signature, recovery_id).ok()?;
	let point = key.to_encoded_point(false);
	let digest = Keccak256::digest(&point.as_bytes()[1..]);
	Some(H160::from_slice(&digest[12..]))
}

/// `AUTH authority offset length`. Memory holds `y_parity ‖ r ‖ s ‖ commit`,
/// zero padded to 97 bytes.
pub fn auth<H: Handler>(runtime: &mut Runtime, handler: &H) -> Control {
	pop_h256!(runtime, authority);
	pop_u256!(runtime, offset, len);

	try_or_fail!(runtime.machine.memory_mut().resize_offset(offset, len));
	let len = min(len, U256::from(97));
	let mut input = try_or_fail!(read_memory(runtime, offset, len));
	input.resize(97, 0);

	if input[33..65] > SECP256K1_N_DIV_2[..] {
		return Control::Exit(
			ExitError::Other(Cow::Borrowed("AUTH signature s value too high")).into(),
		);
	}

	let authority = H160::from(authority);
	let mut message = Vec::with_capacity(129);
	message.push(AUTH_MAGIC);
	let mut word = [0u8; 32];
	handler.chain_id().to_big_endian(&mut word);
	message.extend_from_slice(&word);
	handler.nonce(authority).to_big_endian(&mut word);
	message.extend_from_slice(&word);
	message.extend_from_slice(H256::from(runtime.context.address).as_bytes());
	message.extend_from_slice(&input[65..97]);
	let hash: [u8; 32] = Keccak256::digest(&message).into();

	match recover_signer(&hash, input[0], &input[1..65]) {
		Some(signer) if signer == authority => {
			runtime.authorized = Some(authority);
			push_u256!(runtime, U256::one());
		}
		_ => {
			runtime.authorized = None;
			push_u256!(runtime, U256::zero());
		}
	}

	Control::Continue
}

pub fn create<H: Handler>(runtime: &mut Runtime, is_create2: bool, handler: &mut H) -> Control {
	runtime.return_data_buffer = Vec::new();

	pop_u256!(runtime, value, code_offset, len);
	let scheme_salt = if is_create2 {
		pop_h256!(runtime, salt);
		Some(salt)
	} else {
		None
	};

	let code = try_or_fail!(read_memory(runtime, code_offset, len));
	let scheme = match scheme_salt {
		Some(salt) => CreateScheme::Create2 {
			caller: runtime.context.address,
			salt,
			code_hash: H256::from_slice(Keccak256::digest(&code).as_slice()),
		},
		None => CreateScheme::Legacy {
			caller: runtime.context.address,
		},
	};

	let (reason, address, return_data) =
		handler.create(runtime.context.address, scheme, value, code, None);
	runtime.return_data_buffer = return_data;

	match reason {
		ExitReason::Succeed(_) => {
			let create_address: H256 = address.map(|a| a.into()).unwrap_or_default();
			push_h256!(runtime, create_address);
			Control::Continue
		}
		ExitReason::Revert(_) | ExitReason::Error(_) => {
			push_u256!(runtime, U256::zero());
			Control::Continue
		}
		ExitReason::Fatal(e) => {
			push_u256!(runtime, U256::zero());
			Control::Exit(e.into())
		}
	}
}

pub fn call<H: Handler>(runtime: &mut Runtime, scheme: CallScheme, handler: &mut H) -> Control {
	runtime.return_data_buffer = Vec::new();

	pop_u256!(runtime, gas);
	pop_h256!(runtime, to);
	let gas = if gas > U256::from(u64::MAX) {
		None
	} else {
		Some(gas.as_u64())
	};

	let value = if scheme.transfers_value() {
		pop_u256!(runtime, value);
		value
	} else {
		U256::zero()
	};

	pop_u256!(runtime, in_offset, in_len, out_offset, out_len);

	try_or_fail!(runtime
		.machine
		.memory_mut()
		.resize_offset(out_offset, out_len));
	let input = try_or_fail!(read_memory(runtime, in_offset, in_len));

	let to = H160::from(to);
	let context = match scheme {
		CallScheme::Call | CallScheme::StaticCall => Context {
			address: to,
			caller: runtime.context.address,
			apparent_value: value,
		},
		CallScheme::CallCode => Context {
			address: runtime.context.address,
			caller: runtime.context.address,
			apparent_value: value,
		},
		CallScheme::DelegateCall => Context {
			address: runtime.context.address,
			caller: runtime.context.caller,
			apparent_value: runtime.context.apparent_value,
		},
		CallScheme::AuthCall => match runtime.authorized {
			Some(authorized) => Context {
				address: to,
				caller: authorized,
				apparent_value: value,
			},
			None => return Control::Exit(ExitError::AuthCallUnset.into()),
		},
	};

	let transfer = match scheme {
		CallScheme::Call | CallScheme::AuthCall => Some(Transfer {
			source: runtime.context.address,
			target: to,
			value,
		}),
		CallScheme::CallCode => Some(Transfer {
			source: runtime.context.address,
			target: runtime.context.address,
			value,
		}),
		CallScheme::DelegateCall | CallScheme::StaticCall => None,
	};

	let (reason, return_data) = handler.call(to, transfer, input, gas, scheme, context);
	runtime.return_data_buffer = return_data;
	let target_len = min(out_len, U256::from(runtime.return_data_buffer.len()));

	match reason {
		ExitReason::Succeed(_) => {
			match runtime.machine.memory_mut().copy_large(
				out_offset,
				U256::zero(),
				target_len,
				&runtime.return_data_buffer[..],
			) {
				Ok(()) => {
					push_u256!(runtime, U256::one());
					Control::Continue
				}
				Err(_) => {
					push_u256!(runtime, U256::zero());
					Control::Continue
				}
			}
		}
		ExitReason::Revert(_) => {
			push_u256!(runtime, U256::zero());

			let _ = runtime.machine.memory_mut().copy_large(
				out_offset,
				U256::zero(),
				target_len,
				&runtime.return_data_buffer[..],
			);

			Control::Continue
		}
		ExitReason::Error(_) => {
			push_u256!(runtime, U256::zero());

			Control::Continue
		}
		ExitReason::Fatal(e) => {
			push_u256!(runtime, U256::zero());

			Control::Exit(e.into())
		}
	}
}
