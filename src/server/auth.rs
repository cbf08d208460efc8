//! Basic-auth credential checks backed by salted SHA-256 digests

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use sha2::{Digest, Sha256};
use std::collections::HashMap;

/// Salted one-way digest of a password.
#[derive(Clone)]
struct PasswordHash {
    salt: [u8; 16],
    digest: Vec<u8>,
}

impl PasswordHash {
    fn generate(password: &str) -> Self {
        let salt: [u8; 16] = rand::random();
        let digest = Self::digest_with(&salt, password);
        Self { salt, digest }
    }

    fn digest_with(salt: &[u8], password: &str) -> Vec<u8> {
        let mut hasher = Sha256::new();
        hasher.update(salt);
        hasher.update(password.as_bytes());
        hasher.finalize().to_vec()
    }

    fn verify(&self, candidate: &str) -> bool {
        let candidate = Self::digest_with(&self.salt, candidate);
        // Compare every byte so timing does not depend on the first mismatch.
        candidate.len() == self.digest.len()
            && candidate
                .iter()
                .zip(&self.digest)
                .fold(0u8, |acc, (a, b)| acc | (a ^ b))
                == 0
    }
}

/// Username to password digest map, built once at startup.
#[derive(Clone, Default)]
pub struct CredentialStore {
    users: HashMap<String, PasswordHash>,
}

impl CredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store holding exactly one identity
    pub fn single(username: &str, password: &str) -> Self {
        let mut store = Self::new();
        store.add_user(username, password);
        store
    }

    /// Hash and register a user. The plaintext password is not retained.
    pub fn add_user(&mut self, username: &str, password: &str) {
        self.users
            .insert(username.to_string(), PasswordHash::generate(password));
    }

    pub fn verify(&self, username: &str, password: &str) -> bool {
        self.users
            .get(username)
            .map(|hash| hash.verify(password))
            .unwrap_or(false)
    }
}

impl std::fmt::Debug for CredentialStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialStore")
            .field("users", &self.users.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// Decode an `Authorization: Basic ...` header value into username and password.
pub fn parse_basic_auth(header: &str) -> Option<(String, String)> {
    let (scheme, encoded) = header.trim().split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("basic") {
        return None;
    }
    let decoded = STANDARD.decode(encoded.trim()).ok()?;
    let decoded = String::from_utf8(decoded).ok()?;
    let (username, password) = decoded.split_once(':')?;
    Some((username.to_string(), password.to_string()))
}
