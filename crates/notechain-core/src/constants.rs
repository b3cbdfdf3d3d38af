pub const HASH_SIZE: usize = 32;
pub const HASH_HEX_SIZE: usize = HASH_SIZE * 2;
pub const KEY_SIZE: usize = 32;
pub const IV_SIZE: usize = 12;
pub const BLOCK_ID_SIZE: usize = 16;
pub const POW_DIFFICULTY: usize = 2;
pub const GENESIS_PREVIOUS_HASH: &str = "0";
pub const GENESIS_PAYLOAD_ID: &str = "genesis";
pub const STORE_KEY_NOTES: &str = "notes";
pub const STORE_KEY_CHAIN: &str = "chain";
