use rand::RngCore;

/// Number of random bytes behind every cache id (128 bits).
pub const CACHE_ID_BYTES: usize = 16;

pub fn generate_cache_id() -> String {
    let mut bytes = [0u8; CACHE_ID_BYTES];
    rand::thread_rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// Short prefix of a cache id, safe to put in logs.
pub fn log_prefix(cache_id: &str) -> &str {
    let end = cache_id
        .char_indices()
        .nth(8)
        .map(|(index, _)| index)
        .unwrap_or(cache_id.len());
    &cache_id[..end]
}
