use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};

use uuid::Uuid;

use crate::domain::table::DuplicateSet;

/// Caller identity carried in the session cookie
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SessionId(Uuid);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Accepts only well-formed UUIDs; anything else gets a fresh session.
    pub fn parse(value: &str) -> Option<Self> {
        Uuid::parse_str(value).ok().map(Self)
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One duplicate-set slot per caller. Writes overwrite, last write wins.
pub trait SessionStore: Send + Sync {
    fn put(&self, session: &SessionId, duplicates: Arc<DuplicateSet>);

    fn get(&self, session: &SessionId) -> Option<Arc<DuplicateSet>>;
}

struct SessionEntry {
    duplicates: Arc<DuplicateSet>,
    touched_at: Instant,
}

/// Process-local store; entries idle for longer than `ttl` are dropped.
pub struct InMemorySessionStore {
    entries: Mutex<HashMap<SessionId, SessionEntry>>,
    ttl: Duration,
}

impl InMemorySessionStore {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            ttl,
        }
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<SessionId, SessionEntry>> {
        // A panic elsewhere leaves the map itself consistent
        self.entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn is_expired(&self, entry: &SessionEntry, now: Instant) -> bool {
        now.duration_since(entry.touched_at) >= self.ttl
    }
}

impl SessionStore for InMemorySessionStore {
    fn put(&self, session: &SessionId, duplicates: Arc<DuplicateSet>) {
        let now = Instant::now();
        let mut entries = self.lock();

        let before = entries.len();
        entries.retain(|_, entry| !self.is_expired(entry, now));
        let purged = before - entries.len();
        if purged > 0 {
            tracing::debug!(purged, "Expired sessions purged");
        }

        entries.insert(
            session.clone(),
            SessionEntry {
                duplicates,
                touched_at: now,
            },
        );
    }

    fn get(&self, session: &SessionId) -> Option<Arc<DuplicateSet>> {
        let now = Instant::now();
        let mut entries = self.lock();

        let expired = self.is_expired(entries.get(session)?, now);
        if expired {
            entries.remove(session);
            return None;
        }

        let entry = entries.get_mut(session)?;
        entry.touched_at = now;
        Some(entry.duplicates.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::table::Table;

    fn duplicate_set(value: &str) -> Arc<DuplicateSet> {
        let table = Table::from_fields(
            vec!["x".into()],
            vec![vec![Some(value.into())], vec![Some(value.into())]],
        );
        Arc::new(DuplicateSet::select(&table, vec![0, 1], 1))
    }

    #[test]
    fn test_get_before_put_is_absent() {
        let store = InMemorySessionStore::new(Duration::from_secs(60));
        assert!(store.get(&SessionId::new()).is_none());
    }

    #[test]
    fn test_sessions_are_isolated() {
        let store = InMemorySessionStore::new(Duration::from_secs(60));
        let alice = SessionId::new();
        let bob = SessionId::new();

        store.put(&alice, duplicate_set("a"));

        assert!(store.get(&alice).is_some());
        assert!(store.get(&bob).is_none());
    }

    #[test]
    fn test_last_write_wins() {
        let store = InMemorySessionStore::new(Duration::from_secs(60));
        let session = SessionId::new();

        store.put(&session, duplicate_set("a"));
        store.put(&session, duplicate_set("b"));

        let stored = store.get(&session).unwrap();
        assert_eq!(stored.rows()[0][0].source_text(), "b");
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_expired_entries_are_dropped() {
        let store = InMemorySessionStore::new(Duration::ZERO);
        let session = SessionId::new();

        store.put(&session, duplicate_set("a"));

        assert!(store.get(&session).is_none());
        assert!(store.is_empty());
    }

    #[test]
    fn test_session_id_parse() {
        let id = SessionId::new();
        assert_eq!(SessionId::parse(&id.to_string()), Some(id));
        assert!(SessionId::parse("not-a-uuid").is_none());
    }
}
