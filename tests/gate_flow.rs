use std::sync::Arc;

use safelink::crypto::vault::UrlVault;
use safelink::session::protocol::{DenialReason, GateSessions};
use safelink::session::replay::{InMemoryReplayGuard, ReplayStore};

const VAULT_SECRET: &str = "integration-test-vault-secret";
const TOKEN_SECRET: &str = "integration-test-token-secret";

fn gate() -> (UrlVault, GateSessions) {
    let vault = UrlVault::new(VAULT_SECRET).unwrap();
    let sessions = GateSessions::new(
        TOKEN_SECRET,
        300,
        Arc::new(InMemoryReplayGuard::new(1024)),
    );
    (vault, sessions)
}

#[test]
fn full_gate_flow_releases_the_destination_once() {
    let (vault, sessions) = gate();
    let destination = "https://example.com/file.zip";

    // Link generation: the real URL never appears in the slug.
    let slug = vault.encrypt(destination).unwrap();
    assert!(!slug.contains("example.com"));

    // Step 1.
    let t1 = sessions.create_session(&slug);
    let t2 = sessions.complete_step1(&t1, &slug).unwrap();
    assert_ne!(t1, t2);

    // Step 2: validate, decrypt, consume - in that order.
    assert!(sessions.validate_step2(Some(&t2), &slug).valid);
    assert_eq!(vault.decrypt(&slug).unwrap(), destination);
    assert!(sessions.consume(&t2));

    // Second use of the same token is dead.
    let replay = sessions.validate_step2(Some(&t2), &slug);
    assert!(!replay.valid);
    assert_eq!(replay.reason, Some(DenialReason::AlreadyUsed));

    // Decryption itself is idempotent; it is not the replay boundary.
    assert_eq!(vault.decrypt(&slug).unwrap(), destination);
}

#[test]
fn step1_token_never_grants_step2_access() {
    let (vault, sessions) = gate();
    let slug = vault.encrypt("https://example.com").unwrap();

    let t1 = sessions.create_session(&slug);
    let denied = sessions.validate_step2(Some(&t1), &slug);
    assert!(!denied.valid);
    assert_eq!(denied.reason, Some(DenialReason::Step1NotCompleted));
}

#[test]
fn tokens_are_scoped_to_one_slug() {
    let (vault, sessions) = gate();
    let slug_a = vault.encrypt("https://example.com/a").unwrap();
    let slug_b = vault.encrypt("https://example.com/b").unwrap();

    let t1 = sessions.create_session(&slug_a);
    let t2 = sessions.complete_step1(&t1, &slug_a).unwrap();

    let denied = sessions.validate_step2(Some(&t2), &slug_b);
    assert!(!denied.valid);
    assert_eq!(denied.reason, Some(DenialReason::WrongLink));
}

#[test]
fn tampered_slugs_never_reach_the_protocol() {
    let (vault, _) = gate();
    let slug = vault.encrypt("https://example.com/file.zip").unwrap();

    let mut chars: Vec<char> = slug.chars().collect();
    let last = chars.len() - 1;
    chars[last] = if chars[last] == 'A' { 'B' } else { 'A' };
    let tampered: String = chars.into_iter().collect();

    assert!(!vault.is_valid(&tampered));
}

#[test]
fn concurrent_consumption_records_the_nonce_exactly_once() {
    let guard = Arc::new(InMemoryReplayGuard::new(4096));

    let mut handles = Vec::new();
    for _ in 0..8 {
        let guard = Arc::clone(&guard);
        handles.push(std::thread::spawn(move || guard.mark_consumed("shared-nonce")));
    }

    let first_inserts = handles
        .into_iter()
        .map(|h| h.join().unwrap())
        .filter(|inserted| *inserted)
        .count();

    assert_eq!(first_inserts, 1);
    assert!(guard.has_consumed("shared-nonce"));
}

#[test]
fn token_payload_is_visible_but_unforgeable() {
    use base64::{Engine as _, engine::general_purpose};

    let (vault, sessions) = gate();
    let slug = vault.encrypt("https://example.com").unwrap();
    let token = sessions.create_session(&slug);

    // The holder can read every payload field; integrity comes from the MAC,
    // not secrecy.
    let (payload_b64, mac_hex) = token.split_once('.').unwrap();
    let payload_bytes = general_purpose::URL_SAFE_NO_PAD.decode(payload_b64).unwrap();
    let payload: serde_json::Value = serde_json::from_slice(&payload_bytes).unwrap();
    assert_eq!(payload["slug"], slug.as_str());
    assert_eq!(payload["step1_completed"], false);
    assert!(hex::decode(mac_hex).is_ok());
}

#[test]
fn vaults_with_different_secrets_are_disjoint() {
    let vault_a = UrlVault::new("secret-a").unwrap();
    let vault_b = UrlVault::new("secret-b").unwrap();

    let slug = vault_a.encrypt("https://example.com").unwrap();
    assert!(vault_a.is_valid(&slug));
    assert!(!vault_b.is_valid(&slug));
}
