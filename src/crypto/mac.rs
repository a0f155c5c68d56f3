use hmac::{Hmac, Mac};
use sha2::Sha256;
use subtle::ConstantTimeEq;

type HmacSha256 = Hmac<Sha256>;

/// HMAC-SHA256 signer for session token payloads.
///
/// Pure sign/verify pair; protocol logic lives elsewhere so the scheme could be
/// swapped without touching state transitions. The MAC supplies integrity and
/// authenticity only - payload bytes stay visible to whoever holds the token.
#[derive(Clone)]
pub struct TokenSigner {
    secret: Vec<u8>,
}

impl TokenSigner {
    /// Creates a signer from the long-term token-signing secret.
    pub fn new(secret: &str) -> Self {
        Self {
            secret: secret.as_bytes().to_vec(),
        }
    }

    /// Signs payload bytes, returning the MAC as lowercase hex.
    pub fn sign(&self, payload: &[u8]) -> String {
        let mut mac = HmacSha256::new_from_slice(&self.secret)
            .expect("HMAC accepts keys of any length");
        mac.update(payload);
        hex::encode(mac.finalize().into_bytes())
    }

    /// Verifies a hex MAC against the exact payload bytes, in constant time.
    pub fn verify(&self, payload: &[u8], mac_hex: &str) -> bool {
        let Ok(presented) = hex::decode(mac_hex) else {
            return false;
        };
        let expected = {
            let mut mac = HmacSha256::new_from_slice(&self.secret)
                .expect("HMAC accepts keys of any length");
            mac.update(payload);
            mac.finalize().into_bytes()
        };
        presented.ct_eq(expected.as_slice()).into()
    }
}
