pub mod cache {
    tonic::include_proto!("cache");
}

pub fn hash_key(key: &str) -> u32 {
    use sha1::{Digest, Sha1};
    let mut hasher = Sha1::new();
    hasher.update(key.as_bytes());
    let result = hasher.finalize();
    let mut bytes = [0u8; 4];
    bytes.copy_from_slice(&result[0..4]);
    u32::from_be_bytes(bytes)
}
