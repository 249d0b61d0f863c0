/// Unwrap `$e` or end the frame with its error.
macro_rules! try_or_fail {
	( $e:expr ) => {
		match $e {
			Ok(v) => v,
			Err(e) => return Control::Exit(e.into()),
		}
	};
}

macro_rules! pop_h256 {
	( $runtime:expr, $( $x:ident ),* ) => (
		$( let $x = try_or_fail!($runtime.machine.stack_mut().pop_h256()); )*
	);
}

macro_rules! pop_u256 {
	( $runtime:expr, $( $x:ident ),* ) => (
		$( let $x = try_or_fail!($runtime.machine.stack_mut().pop()); )*
	);
}

macro_rules! push_h256 {
	( $runtime:expr, $( $x:expr ),* ) => (
		$( try_or_fail!($runtime.machine.stack_mut().push_h256($x)); )*
	)
}

macro_rules! push_u256 {
	( $runtime:expr, $( $x:expr ),* ) => (
		$( try_or_fail!($runtime.machine.stack_mut().push($x)); )*
	)
}

/// Narrow `$v` to a `usize`. A value past the address space can never be
/// paid for, so it ends the frame with `OutOfGas`.
macro_rules! as_usize_or_fail {
	( $v:expr ) => {{
		let value = $v;
		if value > primitive_types::U256::from(usize::MAX) {
			return Control::Exit(crate::ExitError::OutOfGas.into());
		}
		value.as_usize()
	}};
}
