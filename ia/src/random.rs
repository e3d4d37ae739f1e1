//! High-entropy opaque string generation for authorization codes and refresh
//! tokens.

use rand::RngExt;

pub fn opaque_token(byte_len: usize) -> String {
    let mut rng = rand::rng();
    let bytes: Vec<u8> = (0..byte_len).map(|_| rng.random::<u8>()).collect();
    pghd_shared::b64url::encode(bytes)
}
