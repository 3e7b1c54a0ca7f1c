//! # Presence Cache
//!
//! Short-lived cache of other users' presence snapshots, saving the chat
//! header from refetching "is the counselor online?" on every render. Each
//! engine owns its own cache instance with an explicit TTL - there is no
//! process-wide map - so tests and multiple accounts stay isolated.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use uuid::Uuid;

/// Presence snapshot of a user
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct UserPresence {
    /// The user this snapshot describes
    pub user_id: Uuid,
    /// Whether the user's heartbeat is current
    pub is_online: bool,
    /// Last heartbeat timestamp (RFC3339)
    pub last_seen: Option<String>,
}

impl UserPresence {
    /// Human label for the last-seen timestamp ("Just now", "5m ago", ...)
    pub fn last_seen_label(&self, now: DateTime<Utc>) -> String {
        let Some(last_seen) = &self.last_seen else {
            return "Never".to_string();
        };
        let Ok(parsed) = DateTime::parse_from_rfc3339(last_seen) else {
            return "Never".to_string();
        };
        let elapsed = now.signed_duration_since(parsed.with_timezone(&Utc));

        let minutes = elapsed.num_minutes();
        let hours = elapsed.num_hours();
        let days = elapsed.num_days();

        if minutes < 1 {
            "Just now".to_string()
        } else if minutes < 60 {
            format!("{}m ago", minutes)
        } else if hours < 24 {
            format!("{}h ago", hours)
        } else if days < 7 {
            format!("{}d ago", days)
        } else {
            parsed.format("%b %-d").to_string()
        }
    }
}

struct CacheSlot {
    presence: UserPresence,
    cached_at: Instant,
}

/// TTL cache of presence snapshots
pub struct PresenceCache {
    ttl: Duration,
    entries: RwLock<HashMap<Uuid, CacheSlot>>,
}

impl PresenceCache {
    /// Create a cache whose entries go stale after `ttl`
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Fresh snapshot for a user, or `None` when absent or stale
    pub async fn get(&self, user_id: &Uuid) -> Option<UserPresence> {
        let entries = self.entries.read().await;
        let slot = entries.get(user_id)?;
        if slot.cached_at.elapsed() >= self.ttl {
            return None;
        }
        Some(slot.presence.clone())
    }

    /// Cache a snapshot, replacing any previous one
    pub async fn insert(&self, presence: UserPresence) {
        let mut entries = self.entries.write().await;
        entries.insert(
            presence.user_id,
            CacheSlot {
                presence,
                cached_at: Instant::now(),
            },
        );
    }

    /// Drop a user's snapshot
    pub async fn invalidate(&self, user_id: &Uuid) {
        self.entries.write().await.remove(user_id);
    }

    /// Drop every stale snapshot
    pub async fn purge_expired(&self) {
        let mut entries = self.entries.write().await;
        entries.retain(|_, slot| slot.cached_at.elapsed() < self.ttl);
    }

    /// Number of cached snapshots, stale ones included
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    /// Whether the cache holds nothing at all
    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn presence(user_id: Uuid, last_seen: Option<&str>) -> UserPresence {
        UserPresence {
            user_id,
            is_online: true,
            last_seen: last_seen.map(|s| s.to_string()),
        }
    }

    #[tokio::test]
    async fn test_fresh_entry_is_served() {
        let cache = PresenceCache::new(Duration::from_secs(15));
        let user = Uuid::new_v4();
        cache.insert(presence(user, None)).await;
        assert!(cache.get(&user).await.is_some());
        assert_eq!(cache.len().await, 1);
    }

    #[tokio::test]
    async fn test_stale_entry_is_a_miss() {
        let cache = PresenceCache::new(Duration::from_millis(10));
        let user = Uuid::new_v4();
        cache.insert(presence(user, None)).await;
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(cache.get(&user).await.is_none());

        cache.purge_expired().await;
        assert!(cache.is_empty().await);
    }

    #[tokio::test]
    async fn test_invalidate() {
        let cache = PresenceCache::new(Duration::from_secs(15));
        let user = Uuid::new_v4();
        cache.insert(presence(user, None)).await;
        cache.invalidate(&user).await;
        assert!(cache.get(&user).await.is_none());
    }

    #[test]
    fn test_last_seen_labels() {
        let now = DateTime::parse_from_rfc3339("2026-01-10T12:00:00+00:00")
            .unwrap()
            .with_timezone(&Utc);
        let user = Uuid::new_v4();

        let cases = [
            (Some("2026-01-10T11:59:40+00:00"), "Just now"),
            (Some("2026-01-10T11:55:00+00:00"), "5m ago"),
            (Some("2026-01-10T09:00:00+00:00"), "3h ago"),
            (Some("2026-01-08T12:00:00+00:00"), "2d ago"),
            (None, "Never"),
        ];
        for (last_seen, expected) in cases {
            assert_eq!(presence(user, last_seen).last_seen_label(now), expected);
        }
    }

    #[test]
    fn test_last_seen_label_falls_back_to_date() {
        let now = DateTime::parse_from_rfc3339("2026-03-10T12:00:00+00:00")
            .unwrap()
            .with_timezone(&Utc);
        let label = presence(Uuid::new_v4(), Some("2026-01-02T12:00:00+00:00"))
            .last_seen_label(now);
        assert_eq!(label, "Jan 2");
    }
}
