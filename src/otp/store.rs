//! In-process store for pending verifications.
//!
//! One entry per email address, keyed exactly as submitted. The store holds
//! no policy: expiry and code equality are judged by the service layer. The
//! only concession is [`OtpStore::take_if`], which runs that judgement under
//! the store lock so a verify-then-delete cannot race a concurrent issuance
//! for the same address.

use secrecy::SecretString;
use std::collections::HashMap;
use std::time::Instant;
use tokio::sync::Mutex;

/// Signup data captured at issuance and returned on the first successful
/// verification. The password never appears in logs or responses.
#[derive(Clone, Debug)]
pub struct SignupPayload {
    pub name: Option<String>,
    pub email: String,
    pub password: Option<SecretString>,
}

/// The pending `{code, expires_at, payload}` tuple awaiting verification.
#[derive(Clone, Debug)]
pub struct PendingVerification {
    pub code: String,
    pub expires_at: Instant,
    pub payload: SignupPayload,
}

/// What the service decided about an entry it inspected under the lock.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Verdict {
    /// Remove the entry and hand it to the caller (successful verification).
    Consume,
    /// Remove the entry without handing it out (detected expiry).
    Discard,
    /// Keep the entry untouched (code mismatch, retry allowed).
    Retain,
}

/// Outcome of [`OtpStore::take_if`].
#[derive(Debug)]
pub enum Taken {
    Consumed(PendingVerification),
    Discarded,
    Retained,
    Missing,
}

/// Email -> [`PendingVerification`] map with process lifetime.
///
/// Construct one per service instance; tests build their own isolated
/// stores. Nothing here survives a restart.
#[derive(Debug, Default)]
pub struct OtpStore {
    entries: Mutex<HashMap<String, PendingVerification>>,
}

impl OtpStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Unconditional overwrite; a fresh issuance supersedes any prior code.
    pub async fn put(&self, email: String, record: PendingVerification) {
        let mut entries = self.entries.lock().await;
        entries.insert(email, record);
    }

    pub async fn get(&self, email: &str) -> Option<PendingVerification> {
        let entries = self.entries.lock().await;
        entries.get(email).cloned()
    }

    /// No-op when the entry is absent.
    pub async fn delete(&self, email: &str) {
        let mut entries = self.entries.lock().await;
        entries.remove(email);
    }

    /// Atomic read-judge-remove for one email.
    ///
    /// `judge` sees the current entry (if any) and decides its fate; the
    /// whole sequence runs under the store lock, so an issuance that lands
    /// after the judgement cannot have its record deleted by this call.
    pub(crate) async fn take_if<F>(&self, email: &str, judge: F) -> Taken
    where
        F: FnOnce(&PendingVerification) -> Verdict,
    {
        let mut entries = self.entries.lock().await;
        let Some(record) = entries.get(email) else {
            return Taken::Missing;
        };

        match judge(record) {
            Verdict::Consume => entries
                .remove(email)
                .map_or(Taken::Missing, Taken::Consumed),
            Verdict::Discard => {
                entries.remove(email);
                Taken::Discarded
            }
            Verdict::Retain => Taken::Retained,
        }
    }

    #[cfg(test)]
    pub(crate) async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn record(code: &str, expires_at: Instant) -> PendingVerification {
        PendingVerification {
            code: code.to_string(),
            expires_at,
            payload: SignupPayload {
                name: Some("Alice".to_string()),
                email: "a@b.com".to_string(),
                password: None,
            },
        }
    }

    #[tokio::test]
    async fn put_overwrites_existing_entry() {
        let store = OtpStore::new();
        let expires = Instant::now() + Duration::from_secs(600);

        store.put("a@b.com".to_string(), record("111111", expires)).await;
        store.put("a@b.com".to_string(), record("222222", expires)).await;

        let stored = store.get("a@b.com").await.expect("entry present");
        assert_eq!(stored.code, "222222");
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn keys_are_case_sensitive() {
        let store = OtpStore::new();
        let expires = Instant::now() + Duration::from_secs(600);

        store.put("A@B.com".to_string(), record("111111", expires)).await;

        assert!(store.get("a@b.com").await.is_none());
        assert!(store.get("A@B.com").await.is_some());
    }

    #[tokio::test]
    async fn delete_is_a_noop_when_absent() {
        let store = OtpStore::new();
        store.delete("nobody@example.com").await;
        assert_eq!(store.len().await, 0);
    }

    #[tokio::test]
    async fn take_if_consume_removes_and_returns() {
        let store = OtpStore::new();
        let expires = Instant::now() + Duration::from_secs(600);
        store.put("a@b.com".to_string(), record("111111", expires)).await;

        let taken = store.take_if("a@b.com", |_| Verdict::Consume).await;
        assert!(matches!(taken, Taken::Consumed(ref r) if r.code == "111111"));
        assert!(store.get("a@b.com").await.is_none());
    }

    #[tokio::test]
    async fn take_if_discard_removes_without_returning() {
        let store = OtpStore::new();
        let expires = Instant::now() + Duration::from_secs(600);
        store.put("a@b.com".to_string(), record("111111", expires)).await;

        let taken = store.take_if("a@b.com", |_| Verdict::Discard).await;
        assert!(matches!(taken, Taken::Discarded));
        assert!(store.get("a@b.com").await.is_none());
    }

    #[tokio::test]
    async fn take_if_retain_keeps_the_entry() {
        let store = OtpStore::new();
        let expires = Instant::now() + Duration::from_secs(600);
        store.put("a@b.com".to_string(), record("111111", expires)).await;

        let taken = store.take_if("a@b.com", |_| Verdict::Retain).await;
        assert!(matches!(taken, Taken::Retained));
        assert!(store.get("a@b.com").await.is_some());
    }

    #[tokio::test]
    async fn take_if_reports_missing() {
        let store = OtpStore::new();
        let taken = store.take_if("a@b.com", |_| Verdict::Consume).await;
        assert!(matches!(taken, Taken::Missing));
    }
}
