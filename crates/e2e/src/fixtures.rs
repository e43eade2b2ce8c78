//! Test data factory: credential sets and checkout records.
//!
//! All fixtures are pure values built in-process. Only the valid login
//! credential comes from the environment (see [`crate::config`]); every
//! invalid variant is derived from it here.

use rand::Rng;
use serde::{Deserialize, Serialize};

/// A username/password pair. The strings are opaque to the harness.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credential {
    pub username: String,
    pub password: String,
}

impl Credential {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

/// Why a derived credential is expected to be rejected. Lets a test
/// classify a fixture without executing a login.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InvalidCredentialKind {
    Empty,
    UnknownUser,
    WrongPassword,
    WrongUsername,
}

/// An invalid credential variant tagged with its rejection reason.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvalidCredential {
    pub kind: InvalidCredentialKind,
    pub credential: Credential,
}

/// Derive the invalid-credential matrix from the configured valid pair.
pub fn invalid_credentials(valid: &Credential) -> Vec<InvalidCredential> {
    vec![
        InvalidCredential {
            kind: InvalidCredentialKind::Empty,
            credential: Credential::new("", ""),
        },
        InvalidCredential {
            kind: InvalidCredentialKind::UnknownUser,
            credential: Credential::new("invalid", "invalid"),
        },
        InvalidCredential {
            kind: InvalidCredentialKind::WrongPassword,
            credential: Credential::new(valid.username.clone(), "wrongpass"),
        },
        InvalidCredential {
            kind: InvalidCredentialKind::WrongUsername,
            credential: Credential::new("wronguser", valid.password.clone()),
        },
    ]
}

/// Checkout form data. All three fields are required by the application;
/// presence is the only validation the harness models.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckoutInfo {
    pub first_name: String,
    pub last_name: String,
    pub postal_code: String,
}

impl CheckoutInfo {
    pub fn new(
        first_name: impl Into<String>,
        last_name: impl Into<String>,
        postal_code: impl Into<String>,
    ) -> Self {
        Self {
            first_name: first_name.into(),
            last_name: last_name.into(),
            postal_code: postal_code.into(),
        }
    }

    /// A record with any empty field is categorically invalid.
    pub fn is_complete(&self) -> bool {
        !self.first_name.is_empty() && !self.last_name.is_empty() && !self.postal_code.is_empty()
    }
}

/// The one fully-populated checkout record used by positive scenarios.
pub fn valid_checkout_info() -> CheckoutInfo {
    CheckoutInfo::new("John", "Doe", "12345")
}

/// Checkout records with at least one empty required field. Order and
/// duplicates are significant: the generator expands one test per row.
pub fn invalid_checkout_info() -> Vec<CheckoutInfo> {
    vec![
        CheckoutInfo::new("", "", ""),
        CheckoutInfo::new("John", "", "12345"),
        CheckoutInfo::new("", "Doe", "12345"),
        CheckoutInfo::new("John", "Doe", ""),
    ]
}

/// Markup fragments the application must reject in checkout fields.
pub fn injection_payloads() -> Vec<&'static str> {
    vec![
        "<script>alert(1)</script>",
        "<img src=x onerror=alert(1)>",
        "<svg/onload=alert(1)>",
    ]
}

fn random_string(len: usize) -> String {
    const ALPHABET: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";
    let mut rng = rand::thread_rng();
    (0..len)
        .map(|_| ALPHABET[rng.gen_range(0..ALPHABET.len())] as char)
        .collect()
}

/// A randomized but structurally valid checkout record.
pub fn random_customer() -> CheckoutInfo {
    let mut rng = rand::thread_rng();
    CheckoutInfo {
        first_name: random_string(6),
        last_name: random_string(8),
        postal_code: rng.gen_range(10000..100000).to_string(),
    }
}
