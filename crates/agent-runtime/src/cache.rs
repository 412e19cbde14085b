//! Time-boxed configuration cache.
//!
//! Entries expire lazily: an expired entry is evicted by the lookup that
//! finds it, there is no background sweep. There is no size bound either;
//! the keyspace is the set of active chatbots, so memory grows with the
//! number of chatbots served by this process.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use agent_core::KnowledgeEntry;
use tokio::sync::RwLock;
use tokio::time::Instant;

use crate::config::{ResolvedChatbotConfig, ResolvedWidgetConfig};
use crate::settings::DEFAULT_CONFIG_CACHE_TTL;

struct CacheEntry<T> {
    value: Arc<T>,
    /// `None` when `now + ttl` overflows; such entries never expire.
    expires_at: Option<Instant>,
}

impl<T> CacheEntry<T> {
    fn is_expired(&self, now: Instant) -> bool {
        self.expires_at.is_some_and(|at| now > at)
    }
}

/// A keyed cache whose entries expire after a TTL.
pub struct TtlCache<T> {
    entries: RwLock<HashMap<String, CacheEntry<T>>>,
    default_ttl: Duration,
}

impl<T> fmt::Debug for TtlCache<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TtlCache")
            .field("default_ttl", &self.default_ttl)
            .finish_non_exhaustive()
    }
}

impl<T> TtlCache<T> {
    pub fn new(default_ttl: Duration) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            default_ttl,
        }
    }

    pub fn default_ttl(&self) -> Duration {
        self.default_ttl
    }

    /// Get a live value. An expired entry is evicted and reported as a miss.
    pub async fn get(&self, key: &str) -> Option<Arc<T>> {
        {
            let entries = self.entries.read().await;
            match entries.get(key) {
                None => return None,
                Some(entry) if !entry.is_expired(Instant::now()) => {
                    return Some(Arc::clone(&entry.value));
                }
                Some(_) => {}
            }
        }

        let mut entries = self.entries.write().await;
        match entries.get(key) {
            Some(entry) if entry.is_expired(Instant::now()) => {
                entries.remove(key);
                None
            }
            Some(entry) => Some(Arc::clone(&entry.value)),
            None => None,
        }
    }

    /// Store a value with the default TTL.
    pub async fn set(&self, key: &str, value: T) -> Arc<T> {
        self.set_with_ttl(key, value, self.default_ttl).await
    }

    /// Store a value that expires `ttl` from now.
    pub async fn set_with_ttl(&self, key: &str, value: T, ttl: Duration) -> Arc<T> {
        let value = Arc::new(value);
        let entry = CacheEntry {
            value: Arc::clone(&value),
            expires_at: Instant::now().checked_add(ttl),
        };
        self.entries.write().await.insert(key.to_string(), entry);
        value
    }

    /// Remove one key. Returns whether an entry was present.
    pub async fn invalidate(&self, key: &str) -> bool {
        self.entries.write().await.remove(key).is_some()
    }

    /// Remove everything.
    pub async fn clear(&self) {
        self.entries.write().await.clear();
    }

    /// Number of stored entries, expired ones included.
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

/// The three independently cached kinds of per-chatbot data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheNamespace {
    Chatbot,
    Widget,
    Knowledge,
}

/// Per-chatbot configuration cache, one [`TtlCache`] per namespace.
#[derive(Debug)]
pub struct ConfigCache {
    chatbots: TtlCache<ResolvedChatbotConfig>,
    widgets: TtlCache<ResolvedWidgetConfig>,
    knowledge: TtlCache<Vec<KnowledgeEntry>>,
}

impl Default for ConfigCache {
    fn default() -> Self {
        Self::new(DEFAULT_CONFIG_CACHE_TTL)
    }
}

impl ConfigCache {
    pub fn new(default_ttl: Duration) -> Self {
        Self {
            chatbots: TtlCache::new(default_ttl),
            widgets: TtlCache::new(default_ttl),
            knowledge: TtlCache::new(default_ttl),
        }
    }

    pub fn chatbots(&self) -> &TtlCache<ResolvedChatbotConfig> {
        &self.chatbots
    }

    pub fn widgets(&self) -> &TtlCache<ResolvedWidgetConfig> {
        &self.widgets
    }

    pub fn knowledge(&self) -> &TtlCache<Vec<KnowledgeEntry>> {
        &self.knowledge
    }

    /// Drop one namespace's entry for a chatbot.
    pub async fn invalidate(&self, namespace: CacheNamespace, chatbot_id: &str) -> bool {
        match namespace {
            CacheNamespace::Chatbot => self.chatbots.invalidate(chatbot_id).await,
            CacheNamespace::Widget => self.widgets.invalidate(chatbot_id).await,
            CacheNamespace::Knowledge => self.knowledge.invalidate(chatbot_id).await,
        }
    }

    /// Drop every namespace's entry for a chatbot.
    pub async fn invalidate_all(&self, chatbot_id: &str) {
        self.chatbots.invalidate(chatbot_id).await;
        self.widgets.invalidate(chatbot_id).await;
        self.knowledge.invalidate(chatbot_id).await;
    }

    /// Drop everything. Intended for process-wide resets.
    pub async fn clear(&self) {
        self.chatbots.clear().await;
        self.widgets.clear().await;
        self.knowledge.clear().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_entry_expires_after_ttl() {
        let cache = TtlCache::new(Duration::from_secs(60));
        cache.set("k", 1).await;

        tokio::time::advance(Duration::from_secs(59)).await;
        assert_eq!(cache.get("k").await.as_deref(), Some(&1));

        tokio::time::advance(Duration::from_secs(2)).await;
        assert!(cache.get("k").await.is_none());
        assert_eq!(cache.len().await, 0, "expired entry is evicted on lookup");
    }

    #[tokio::test(start_paused = true)]
    async fn test_custom_ttl() {
        let cache = TtlCache::new(Duration::from_secs(300));
        cache.set_with_ttl("short", "a", Duration::from_secs(1)).await;
        cache.set("long", "b").await;

        tokio::time::advance(Duration::from_secs(2)).await;
        assert!(cache.get("short").await.is_none());
        assert!(cache.get("long").await.is_some());
    }

    #[tokio::test]
    async fn test_huge_ttl_never_expires() {
        let cache = TtlCache::new(Duration::MAX);
        cache.set("k", 1).await;
        assert!(cache.get("k").await.is_some());
    }

    #[tokio::test]
    async fn test_invalidate_namespaces() {
        let cache = ConfigCache::default();
        cache.knowledge().set("bot-1", Vec::new()).await;
        cache.knowledge().set("bot-2", Vec::new()).await;
        cache
            .widgets()
            .set("bot-1", ResolvedWidgetConfig::fallback("bot-1", "Support"))
            .await;

        assert!(cache.invalidate(CacheNamespace::Widget, "bot-1").await);
        assert!(!cache.invalidate(CacheNamespace::Widget, "bot-1").await);
        assert!(cache.knowledge().get("bot-1").await.is_some());

        cache.invalidate_all("bot-1").await;
        assert!(cache.knowledge().get("bot-1").await.is_none());
        assert!(cache.knowledge().get("bot-2").await.is_some());

        cache.clear().await;
        assert!(cache.knowledge().is_empty().await);
    }
}
