// Base64url (RFC 4648 §5) without padding, the encoding used throughout the
// platform for JWT segments, JWK coordinates, and PKCE challenges.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;

/// Encode `data` as base64url without padding.
pub fn encode(data: impl AsRef<[u8]>) -> String {
    URL_SAFE_NO_PAD.encode(data)
}

/// Decode a base64url-without-padding string back to bytes.
pub fn decode(data: impl AsRef<[u8]>) -> Result<Vec<u8>, base64::DecodeError> {
    URL_SAFE_NO_PAD.decode(data)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_arbitrary_bytes() {
        let samples: &[&[u8]] = &[b"", b"a", b"ab", b"abc", b"abcd", &[0, 1, 2, 255, 254, 253]];
        for sample in samples {
            let encoded = encode(sample);
            assert!(!encoded.contains('='), "no padding: {encoded}");
            assert_eq!(decode(&encoded).unwrap(), *sample);
        }
    }

    #[test]
    fn uses_url_safe_alphabet() {
        // bytes chosen so the standard alphabet would emit '+' and '/'
        let data = [0xfb, 0xff, 0xbf];
        let encoded = encode(data);
        assert!(!encoded.contains('+'));
        assert!(!encoded.contains('/'));
    }
}
