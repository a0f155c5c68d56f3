use aes_gcm::{
    aead::{Aead, KeyInit, OsRng},
    Aes256Gcm, Nonce,
};
use aes_gcm::aead::rand_core::RngCore;
use argon2::{Argon2, ParamsBuilder};
use base64::{Engine as _, engine::general_purpose};
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::error::{AppError, Result};
use crate::validation::url::is_http_url;

/// The size of the AES-256 key in bytes.
pub const KEY_SIZE: usize = 32;
/// The size of the AES-GCM initialization vector in bytes.
pub const IV_SIZE: usize = 12;
/// The size of the AES-GCM authentication tag in bytes.
pub const TAG_SIZE: usize = 16;
/// Smallest possible decoded slug: an IV and a tag with empty ciphertext.
const MIN_FRAME_SIZE: usize = IV_SIZE + TAG_SIZE;

/// Application salt for deriving the vault key from the long-term secret.
const VAULT_KDF_SALT: &[u8] = b"safelink-url-vault-v1";

/// The memory cost for Argon2 in MB.
const ARGON2_MEMORY_MB: u32 = 19;
/// The number of iterations for Argon2.
const ARGON2_ITERATIONS: u32 = 3;
/// The parallelism factor for Argon2.
const ARGON2_PARALLELISM: u32 = 1;

/// A secure key wrapper that ensures the key is zeroized on drop.
#[derive(Zeroize, ZeroizeOnDrop)]
struct SecureKey([u8; KEY_SIZE]);

/// Authenticated encryption of destination URLs into opaque, URL-safe slugs.
///
/// Slug layout after base64url decoding: `iv ‖ authTag ‖ ciphertext`. The AES key
/// is derived once from the long-term secret at construction time and held for
/// the process lifetime.
pub struct UrlVault {
    key: SecureKey,
}

impl UrlVault {
    /// Derives the vault key from the long-term secret and returns the vault.
    ///
    /// Derivation uses Argon2id so the secret does not need to be uniform
    /// high-entropy key material. This is expensive and must happen once per
    /// process, not per request.
    pub fn new(secret: &str) -> Result<Self> {
        let argon2 = Argon2::new(
            argon2::Algorithm::Argon2id,
            argon2::Version::V0x13,
            ParamsBuilder::new()
                .m_cost(ARGON2_MEMORY_MB * 1024)
                .t_cost(ARGON2_ITERATIONS)
                .p_cost(ARGON2_PARALLELISM)
                .build()
                .map_err(|e| AppError::Encryption(format!("Argon2 params: {}", e)))?,
        );

        let mut key = [0u8; KEY_SIZE];
        argon2
            .hash_password_into(secret.as_bytes(), VAULT_KDF_SALT, &mut key)
            .map_err(|e| AppError::Encryption(format!("Key derivation failed: {}", e)))?;

        Ok(Self {
            key: SecureKey(key),
        })
    }

    /// Encrypts a destination URL into an opaque slug.
    ///
    /// A fresh random IV is generated on every call, so encrypting the same URL
    /// twice yields different slugs.
    ///
    /// # Arguments
    ///
    /// * `url` - An absolute http/https URL.
    ///
    /// # Returns
    ///
    /// The base64url-encoded slug, or `InvalidUrl` for malformed input.
    pub fn encrypt(&self, url: &str) -> Result<String> {
        if !is_http_url(url) {
            return Err(AppError::InvalidUrl);
        }

        let cipher = Aes256Gcm::new(&self.key.0.into());

        let mut iv = [0u8; IV_SIZE];
        OsRng.fill_bytes(&mut iv);
        let nonce = Nonce::from(iv);

        // The aead API appends the tag to the ciphertext; re-frame as iv‖tag‖ct.
        let ct_and_tag = cipher
            .encrypt(&nonce, url.as_bytes())
            .map_err(|e| AppError::Encryption(format!("Encryption failed: {}", e)))?;
        let (ciphertext, tag) = ct_and_tag.split_at(ct_and_tag.len() - TAG_SIZE);

        let mut frame = Vec::with_capacity(IV_SIZE + TAG_SIZE + ciphertext.len());
        frame.extend_from_slice(&iv);
        frame.extend_from_slice(tag);
        frame.extend_from_slice(ciphertext);

        Ok(general_purpose::URL_SAFE_NO_PAD.encode(frame))
    }

    /// Decrypts a slug back into the destination URL.
    ///
    /// # Arguments
    ///
    /// * `slug` - The base64url slug from the request path.
    ///
    /// Fails with `InvalidOrTamperedLink` on bad base64url, a short frame, an
    /// authentication failure, or a plaintext that is not an absolute http/https
    /// URL. The tag is verified before any use of the plaintext.
    pub fn decrypt(&self, slug: &str) -> Result<String> {
        let frame = general_purpose::URL_SAFE_NO_PAD
            .decode(slug)
            .map_err(|_| AppError::InvalidOrTamperedLink)?;

        if frame.len() < MIN_FRAME_SIZE {
            return Err(AppError::InvalidOrTamperedLink);
        }

        let iv: [u8; IV_SIZE] = frame[..IV_SIZE]
            .try_into()
            .map_err(|_| AppError::InvalidOrTamperedLink)?;
        let tag = &frame[IV_SIZE..IV_SIZE + TAG_SIZE];
        let ciphertext = &frame[IV_SIZE + TAG_SIZE..];

        let mut ct_and_tag = Vec::with_capacity(ciphertext.len() + TAG_SIZE);
        ct_and_tag.extend_from_slice(ciphertext);
        ct_and_tag.extend_from_slice(tag);

        let cipher = Aes256Gcm::new(&self.key.0.into());
        let plaintext = cipher
            .decrypt(&Nonce::from(iv), ct_and_tag.as_slice())
            .map_err(|_| AppError::InvalidOrTamperedLink)?;

        let url = String::from_utf8(plaintext).map_err(|_| AppError::InvalidOrTamperedLink)?;

        if !is_http_url(&url) {
            return Err(AppError::InvalidOrTamperedLink);
        }

        Ok(url)
    }

    /// Checks whether a slug decrypts cleanly, without exposing the URL.
    pub fn is_valid(&self, slug: &str) -> bool {
        self.decrypt(slug).is_ok()
    }
}
