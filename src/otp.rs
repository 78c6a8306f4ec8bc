//! Time-boxed one-time-password store for password reset.
//!
//! Codes live in process memory keyed by account email and expire after
//! a short TTL; verification consumes the entry so a code can be used
//! exactly once. Expired entries are purged lazily on access.

use std::collections::HashMap;
use std::time::{Duration, Instant};

/// How long an issued code stays valid.
const DEFAULT_TTL: Duration = Duration::from_secs(5 * 60);

struct OtpEntry {
    code: String,
    issued_at: Instant,
}

pub struct OtpStore {
    entries: HashMap<String, OtpEntry>,
    ttl: Duration,
}

impl OtpStore {
    pub fn new() -> Self {
        Self::with_ttl(DEFAULT_TTL)
    }

    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            entries: HashMap::new(),
            ttl,
        }
    }

    /// Issue a code for an email, replacing any outstanding one.
    pub fn issue(&mut self, email: &str, code: &str) {
        self.purge_expired();
        self.entries.insert(
            email.to_string(),
            OtpEntry {
                code: code.to_string(),
                issued_at: Instant::now(),
            },
        );
    }

    /// Verify and consume a code. Returns false for an unknown email, a
    /// wrong code, or an expired entry. A successful match removes the
    /// entry; a failed match keeps it (typos don't burn the code).
    pub fn consume(&mut self, email: &str, code: &str) -> bool {
        self.purge_expired();
        match self.entries.get(email) {
            Some(entry) if entry.code == code => {
                self.entries.remove(email);
                true
            }
            _ => false,
        }
    }

    /// Whether an unexpired code is outstanding for this email.
    #[cfg(test)]
    pub(crate) fn has_outstanding(&mut self, email: &str) -> bool {
        self.purge_expired();
        self.entries.contains_key(email)
    }

    fn purge_expired(&mut self) {
        let ttl = self.ttl;
        self.entries.retain(|_, entry| entry.issued_at.elapsed() < ttl);
    }
}

impl Default for OtpStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn consume_matches_once() {
        let mut store = OtpStore::new();
        store.issue("a@example.com", "123456");
        assert!(!store.consume("a@example.com", "000000"));
        assert!(store.consume("a@example.com", "123456"));
        // Consumed — second use fails
        assert!(!store.consume("a@example.com", "123456"));
    }

    #[test]
    fn unknown_email_fails() {
        let mut store = OtpStore::new();
        assert!(!store.consume("nobody@example.com", "123456"));
    }

    #[test]
    fn reissue_replaces_previous_code() {
        let mut store = OtpStore::new();
        store.issue("a@example.com", "111111");
        store.issue("a@example.com", "222222");
        assert!(!store.consume("a@example.com", "111111"));
        assert!(store.consume("a@example.com", "222222"));
    }

    #[test]
    fn codes_expire() {
        let mut store = OtpStore::with_ttl(Duration::from_millis(10));
        store.issue("a@example.com", "123456");
        std::thread::sleep(Duration::from_millis(20));
        assert!(!store.consume("a@example.com", "123456"));
    }
}
