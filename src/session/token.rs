use base64::{Engine as _, engine::general_purpose};
use rand::RngCore;
use rand::rngs::OsRng;
use serde::{Deserialize, Serialize};

use crate::crypto::mac::TokenSigner;

/// The size of a session nonce in bytes.
const NONCE_SIZE: usize = 16;

/// The signed state carried by a gate session token.
///
/// Tokens round-trip through the client, so every field here is visible to the
/// holder. The MAC makes them unforgeable, not secret.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SessionPayload {
    /// The encrypted slug this session is scoped to.
    pub slug: String,
    /// Whether the first interstitial step has been completed.
    pub step1_completed: bool,
    /// Creation time, Unix milliseconds.
    pub created_at: i64,
    /// Random per-token value; the unit of replay tracking.
    pub nonce: String,
}

/// Generates a fresh random nonce as lowercase hex.
pub fn generate_nonce() -> String {
    let mut bytes = [0u8; NONCE_SIZE];
    OsRng.fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// Encodes and signs a payload into the wire format
/// `<base64url(payload-json)>.<hex-mac>`.
pub fn encode(payload: &SessionPayload, signer: &TokenSigner) -> String {
    let json = sonic_rs::to_string(payload)
        .expect("session payload serialization cannot fail");
    let mac = signer.sign(json.as_bytes());
    format!("{}.{}", general_purpose::URL_SAFE_NO_PAD.encode(&json), mac)
}

/// Decodes a wire token, verifying the MAC over the exact payload bytes.
///
/// Returns `None` for anything other than a well-formed token whose MAC
/// verifies: wrong shape, bad base64url, bad MAC, or unparseable payload.
pub fn decode(token: &str, signer: &TokenSigner) -> Option<SessionPayload> {
    let (payload_b64, mac_hex) = token.split_once('.')?;
    let payload_bytes = general_purpose::URL_SAFE_NO_PAD.decode(payload_b64).ok()?;

    if !signer.verify(&payload_bytes, mac_hex) {
        return None;
    }

    sonic_rs::from_slice(&payload_bytes).ok()
}
