#[macro_use]
mod macros;
mod system;

use crate::{CallScheme, ExitError, ExitReason, Handler, Opcode, Runtime};

pub enum Control {
	Continue,
	Exit(ExitReason),
}

/// Run an opcode the core machine trapped on.
pub fn eval<H: Handler>(state: &mut Runtime, opcode: Opcode, handler: &mut H) -> Control {
	match opcode {
		Opcode::SHA3 => system::sha3(state),
		Opcode::ADDRESS => system::address(state),
		Opcode::BALANCE => system::balance(state, handler),
		Opcode::SELFBALANCE => system::selfbalance(state, handler),
		Opcode::ORIGIN => system::origin(state, handler),
		Opcode::CALLER => system::caller(state),
		Opcode::CALLVALUE => system::callvalue(state),
		Opcode::GASPRICE => system::gasprice(state, handler),
		Opcode::EXTCODESIZE => system::extcodesize(state, handler),
		Opcode::EXTCODEHASH => system::extcodehash(state, handler),
		Opcode::EXTCODECOPY => system::extcodecopy(state, handler),
		Opcode::RETURNDATASIZE => system::returndatasize(state),
		Opcode::RETURNDATACOPY => system::returndatacopy(state),
		Opcode::BLOCKHASH => system::blockhash(state, handler),
		Opcode::COINBASE => system::coinbase(state, handler),
		Opcode::TIMESTAMP => system::timestamp(state, handler),
		Opcode::NUMBER => system::number(state, handler),
		Opcode::PREVRANDAO if state.config.is_activated_eip(4399) => {
			system::prevrandao(state, handler)
		}
		Opcode::DIFFICULTY => system::difficulty(state, handler),
		Opcode::GASLIMIT => system::gaslimit(state, handler),
		Opcode::CHAINID => system::chainid(state, handler),
		Opcode::BASEFEE => system::base_fee(state, handler),
		Opcode::BLOBHASH => system::blobhash(state, handler),
		Opcode::BLOBBASEFEE => system::blobbasefee(state, handler),
		Opcode::SLOAD => system::sload(state, handler),
		Opcode::SSTORE => system::sstore(state, handler),
		Opcode::GAS => system::gas(state, handler),
		Opcode::LOG0 => system::log(state, 0, handler),
		Opcode::LOG1 => system::log(state, 1, handler),
		Opcode::LOG2 => system::log(state, 2, handler),
		Opcode::LOG3 => system::log(state, 3, handler),
		Opcode::LOG4 => system::log(state, 4, handler),
		Opcode::SUICIDE => system::suicide(state, handler),
		Opcode::CREATE => system::create(state, false, handler),
		Opcode::CREATE2 => system::create(state, true, handler),
		Opcode::CALL => system::call(state, CallScheme::Call, handler),
		Opcode::CALLCODE => system::call(state, CallScheme::CallCode, handler),
		Opcode::DELEGATECALL => system::call(state, CallScheme::DelegateCall, handler),
		Opcode::STATICCALL => system::call(state, CallScheme::StaticCall, handler),
		Opcode::AUTH if state.config.is_activated_eip(3074) => system::auth(state, handler),
		Opcode::AUTHCALL if state.config.is_activated_eip(3074) => {
			system::call(state, CallScheme::AuthCall, handler)
		}
		// Subroutines and transient storage share the bytes 0x5c to 0x5e.
		Opcode::BEGINSUB if state.config.is_activated_eip(2315) => {
			Control::Exit(ExitError::InvalidBeginSub.into())
		}
		Opcode::RETURNSUB if state.config.is_activated_eip(2315) => system::returnsub(state),
		Opcode::JUMPSUB if state.config.is_activated_eip(2315) => system::jumpsub(state),
		Opcode::TLOAD if state.config.is_activated_eip(1153) => system::tload(state, handler),
		Opcode::TSTORE if state.config.is_activated_eip(1153) => system::tstore(state, handler),
		Opcode::MCOPY if state.config.is_activated_eip(5656) => system::mcopy(state),
		_ => Control::Exit(ExitError::InvalidOpcode(opcode).into()),
	}
}
