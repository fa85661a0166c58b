// Gas schedule charged by the executor.

pub const TX_BASE_GAS: u64 = 21_000;
pub const STORAGE_READ_GAS: u64 = 2_100;
pub const STORAGE_WRITE_GAS: u64 = 20_000;
pub const VALUE_TRANSFER_GAS: u64 = 9_000;
pub const EXTERNAL_CALL_GAS: u64 = 2_600;
pub const WALLET_CREATE_GAS: u64 = 250_000;
pub const EVENT_GAS: u64 = 375;
