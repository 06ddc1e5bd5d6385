pub fn u8s_from_str(input: &str) -> [u8; 32] {
    blake3::hash(input.as_bytes()).into()
}

/// Derives an independent 32 byte rng seed for one consumer of a run seed.
///
/// Parameter initialisation and batch sampling each get their own stream, so
/// changing how many numbers one of them draws never shifts the other.
pub fn derive_seed(seed: u64, purpose: &str) -> [u8; 32] {
    u8s_from_str(&format!("{}:{}", seed, purpose))
}
