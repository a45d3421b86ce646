//! Rotation over interchangeable API keys.
//!
//! The pool is an owned value held by the tracker for the whole process run,
//! across keywords. Exhaustion is sticky until [`CredentialPool::reset`].

use crate::error::CollectError;

/// One API key and its position in the pool.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential {
    id: usize,
    key: String,
}

impl Credential {
    #[must_use]
    pub fn id(&self) -> usize {
        self.id
    }

    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }
}

impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credential")
            .field("id", &self.id)
            .field("key", &"[redacted]")
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct CredentialPool {
    credentials: Vec<Credential>,
    exhausted: Vec<bool>,
    current: usize,
    last_exhausted: Option<usize>,
}

impl CredentialPool {
    /// Builds a pool from keys in priority order.
    ///
    /// # Errors
    ///
    /// Returns [`CollectError::NoCredentials`] when `keys` is empty.
    pub fn new(keys: Vec<String>) -> Result<Self, CollectError> {
        if keys.is_empty() {
            return Err(CollectError::NoCredentials);
        }
        let credentials: Vec<Credential> = keys
            .into_iter()
            .enumerate()
            .map(|(id, key)| Credential { id, key })
            .collect();
        let exhausted = vec![false; credentials.len()];
        Ok(Self {
            credentials,
            exhausted,
            current: 0,
            last_exhausted: None,
        })
    }

    /// The active credential. May already be exhausted when every key is.
    #[must_use]
    pub fn current(&self) -> &Credential {
        &self.credentials[self.current]
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.credentials.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.credentials.is_empty()
    }

    #[must_use]
    pub fn exhausted_count(&self) -> usize {
        self.exhausted.iter().filter(|e| **e).count()
    }

    #[must_use]
    pub fn all_exhausted(&self) -> bool {
        self.exhausted.iter().all(|e| *e)
    }

    /// Flags `id` for the rest of the run. When it is the active credential,
    /// `current` moves to the next live one if any remains.
    pub fn mark_exhausted(&mut self, id: usize) {
        let Some(flag) = self.exhausted.get_mut(id) else {
            return;
        };
        *flag = true;
        self.last_exhausted = Some(id);
        if self.current == id {
            if let Some(next) = self.next_live_after(id) {
                self.current = next;
            }
        }
    }

    /// Advances to the next live credential, scanning round-robin from just
    /// after the most recently exhausted one (or the current one).
    ///
    /// Returns `false` and leaves the pool untouched when every credential is
    /// exhausted. Calling this right after [`CredentialPool::mark_exhausted`]
    /// lands on the same credential `mark_exhausted` selected.
    pub fn rotate(&mut self) -> bool {
        if self.all_exhausted() {
            return false;
        }
        let start = self.last_exhausted.unwrap_or(self.current);
        match self.next_live_after(start) {
            Some(next) => {
                self.current = next;
                self.last_exhausted = None;
                true
            }
            None => false,
        }
    }

    /// Clears every exhausted flag and returns to the first credential.
    pub fn reset(&mut self) {
        self.exhausted.iter_mut().for_each(|e| *e = false);
        self.current = 0;
        self.last_exhausted = None;
    }

    fn next_live_after(&self, start: usize) -> Option<usize> {
        let len = self.credentials.len();
        (1..=len)
            .map(|step| (start + step) % len)
            .find(|idx| !self.exhausted[*idx])
    }
}
