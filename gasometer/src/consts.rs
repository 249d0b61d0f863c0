pub const G_ZERO: u64 = 0;
pub const G_VERYLOW: u64 = 3;
pub const G_EXP: u64 = 10;
pub const G_MEMORY: u64 = 3;
pub const G_COPY: u64 = 3;
pub const G_SHA3: u64 = 30;
pub const G_SHA3WORD: u64 = 6;
pub const G_LOG: u64 = 375;
pub const G_LOGDATA: u64 = 8;
pub const G_LOGTOPIC: u64 = 375;
pub const G_CREATE: u64 = 32000;
pub const G_INITCODE_WORD: u64 = 2;
pub const G_CALLVALUE: u64 = 9000;
pub const G_NEWACCOUNT: u64 = 25000;
/// Value transfer surcharge of `AUTHCALL`, the `CALL` one minus the stipend
/// it does not grant.
pub const G_AUTHCALL_VALUE: u64 = 6700;
pub const G_WARM_TSTORE: u64 = 100;
pub const R_SUICIDE: i64 = 24000;
