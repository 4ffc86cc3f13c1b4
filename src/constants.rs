/// Retry ceiling for compare-and-swap updates before giving up.
pub const MAX_CAS_RETRIES: u32 = 20;
