use std::collections::VecDeque;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use serde::Serialize;
use url::Url;
use uuid::Uuid;

use crate::extract::{ExtractMode, PageText};
use crate::products::ProductRecord;

/// Most entries a conversation keeps; the oldest go first
pub const MAX_ENTRIES: usize = 150;

/// Inactivity after which the conversation is wiped
pub const IDLE_RESET: Duration = Duration::from_secs(78);

/// Who a text entry is attributed to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Speaker {
    User,
    Assistant,
    /// Status lines and errors shown in the conversation
    Notice,
}

impl Speaker {
    pub fn label(self) -> &'static str {
        match self {
            Speaker::User => "You",
            Speaker::Assistant => "AI",
            Speaker::Notice => "Notice",
        }
    }
}

/// One item in the conversation log
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ConversationEntry {
    Text { speaker: Speaker, text: String },
    ProductCards { products: Vec<ProductRecord> },
    SuggestionButtons { suggestions: Vec<String> },
}

impl ConversationEntry {
    pub fn text(speaker: Speaker, text: impl Into<String>) -> Self {
        ConversationEntry::Text {
            speaker,
            text: text.into(),
        }
    }
}

/// Why a conversation was cleared
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ResetReason {
    Idle,
    User,
    Navigation,
}

/// Outcome of a reset, for the shell to display
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResetStatus {
    pub reason: ResetReason,
    pub cleared: usize,
}

impl ResetStatus {
    pub fn message(&self) -> &'static str {
        match self.reason {
            ResetReason::Idle => "Conversation reset after inactivity to protect your privacy.",
            ResetReason::User => "Conversation reset.",
            ResetReason::Navigation => "Conversation reset for a new page.",
        }
    }
}

#[derive(Debug, Clone)]
struct CachedPage {
    url: String,
    mode: ExtractMode,
    text: PageText,
}

/// Conversation state for one companion.
///
/// Bounded at [`MAX_ENTRIES`] and wiped after [`IDLE_RESET`] of inactivity.
/// The idle timer is a deadline checked by polling; `touch` replaces it in
/// a single assignment.
#[derive(Debug)]
pub struct Session {
    id: Uuid,
    started_at: DateTime<Utc>,
    entries: VecDeque<ConversationEntry>,
    last_page_url: Option<String>,
    cached_page: Option<CachedPage>,
    last_activity: Instant,
    idle_deadline: Option<Instant>,
    idle_after: Duration,
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    pub fn new() -> Self {
        Self::with_idle_timeout(IDLE_RESET)
    }

    pub fn with_idle_timeout(idle_after: Duration) -> Self {
        let now = Instant::now();
        Self {
            id: Uuid::new_v4(),
            started_at: Utc::now(),
            entries: VecDeque::new(),
            last_page_url: None,
            cached_page: None,
            last_activity: now,
            idle_deadline: Some(now + idle_after),
            idle_after,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    pub fn entries(&self) -> impl Iterator<Item = &ConversationEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn last_page_url(&self) -> Option<&str> {
        self.last_page_url.as_deref()
    }

    pub fn last_activity(&self) -> Instant {
        self.last_activity
    }

    pub fn idle_deadline(&self) -> Option<Instant> {
        self.idle_deadline
    }

    pub fn append(&mut self, entry: ConversationEntry) {
        self.entries.push_back(entry);
        while self.entries.len() > MAX_ENTRIES {
            self.entries.pop_front();
        }
    }

    pub fn push_text(&mut self, speaker: Speaker, text: impl Into<String>) {
        self.append(ConversationEntry::text(speaker, text));
    }

    /// Clear the conversation and page cache.
    ///
    /// Idle resets leave the timer disarmed; every other reset re-arms it.
    pub fn reset(&mut self, reason: ResetReason) -> ResetStatus {
        self.reset_at(reason, Instant::now())
    }

    fn reset_at(&mut self, reason: ResetReason, now: Instant) -> ResetStatus {
        let cleared = self.entries.len();
        self.entries.clear();
        self.cached_page = None;
        self.last_page_url = None;
        self.idle_deadline = match reason {
            ResetReason::Idle => None,
            ResetReason::User | ResetReason::Navigation => Some(now + self.idle_after),
        };
        tracing::info!(session = %self.id, ?reason, cleared, "conversation reset");
        ResetStatus { reason, cleared }
    }

    /// Record user activity, pushing the idle deadline out
    pub fn touch(&mut self) {
        self.touch_at(Instant::now());
    }

    pub fn touch_at(&mut self, now: Instant) {
        self.last_activity = now;
        self.idle_deadline = Some(now + self.idle_after);
    }

    /// Reset once if the idle deadline has passed
    pub fn poll_idle(&mut self) -> Option<ResetStatus> {
        self.poll_idle_at(Instant::now())
    }

    pub fn poll_idle_at(&mut self, now: Instant) -> Option<ResetStatus> {
        match self.idle_deadline {
            Some(deadline) if now >= deadline => Some(self.reset_at(ResetReason::Idle, now)),
            _ => None,
        }
    }

    /// Note the page the user is on, resetting when it is a different page
    pub fn observe_page(&mut self, url: &str) -> Option<ResetStatus> {
        let changed = match &self.last_page_url {
            Some(previous) => !same_page(previous, url),
            None => false,
        };
        let status = changed.then(|| self.reset(ResetReason::Navigation));
        self.last_page_url = Some(url.to_string());
        status
    }

    pub fn cache_page(&mut self, url: &str, mode: ExtractMode, text: PageText) {
        self.cached_page = Some(CachedPage {
            url: url.to_string(),
            mode,
            text,
        });
    }

    /// Cached extraction for this page and mode, if any
    pub fn cached_page(&self, url: &str, mode: ExtractMode) -> Option<&PageText> {
        self.cached_page
            .as_ref()
            .filter(|c| c.mode == mode && same_page(&c.url, url))
            .map(|c| &c.text)
    }

    /// Conversation as plain text, one block per entry
    pub fn transcript(&self) -> String {
        let mut blocks = Vec::new();
        for entry in &self.entries {
            match entry {
                ConversationEntry::Text { speaker, text } => {
                    blocks.push(format!("{}: {}", speaker.label(), text));
                }
                ConversationEntry::ProductCards { products } => {
                    let lines = products
                        .iter()
                        .map(|p| {
                            if p.price.is_empty() {
                                format!("  - {} ({})", p.title, p.url)
                            } else {
                                format!("  - {} {} ({})", p.title, p.price, p.url)
                            }
                        })
                        .collect::<Vec<_>>()
                        .join("\n");
                    blocks.push(format!("Products:\n{}", lines));
                }
                ConversationEntry::SuggestionButtons { suggestions } => {
                    blocks.push(format!("Suggestions: {}", suggestions.join(" | ")));
                }
            }
        }
        blocks.join("\n\n")
    }
}

/// Same scheme, host, port, path and query; fragment and trailing slash ignored
fn same_page(a: &str, b: &str) -> bool {
    match (Url::parse(a.trim()), Url::parse(b.trim())) {
        (Ok(a), Ok(b)) => {
            a.scheme() == b.scheme()
                && a.host_str() == b.host_str()
                && a.port_or_known_default() == b.port_or_known_default()
                && a.path().trim_end_matches('/') == b.path().trim_end_matches('/')
                && a.query() == b.query()
        }
        _ => a.trim().trim_end_matches('/') == b.trim().trim_end_matches('/'),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_append_evicts_oldest() {
        let mut session = Session::new();
        for i in 0..151 {
            session.push_text(Speaker::User, format!("message {}", i));
        }
        assert_eq!(session.len(), MAX_ENTRIES);
        let first = session.entries().next().unwrap();
        assert_eq!(first, &ConversationEntry::text(Speaker::User, "message 1"));
    }

    #[test]
    fn test_user_reset_clears_and_rearms() {
        let mut session = Session::new();
        session.push_text(Speaker::User, "hi");
        session.cache_page("https://a.test/", ExtractMode::Content, PageText::default());
        let status = session.reset(ResetReason::User);
        assert_eq!(status.cleared, 1);
        assert_eq!(status.message(), "Conversation reset.");
        assert!(session.is_empty());
        assert!(session.cached_page("https://a.test/", ExtractMode::Content).is_none());
        assert!(session.idle_deadline().is_some());
    }

    #[test]
    fn test_idle_fires_once_until_touched() {
        let start = Instant::now();
        let mut session = Session::with_idle_timeout(Duration::from_secs(78));
        session.touch_at(start);
        session.push_text(Speaker::User, "hi");

        assert!(session.poll_idle_at(start + Duration::from_secs(77)).is_none());

        let status = session.poll_idle_at(start + Duration::from_secs(78)).unwrap();
        assert_eq!(status.reason, ResetReason::Idle);
        assert_eq!(status.cleared, 1);
        assert_eq!(status.message(), "Conversation reset after inactivity to protect your privacy.");

        assert!(session.poll_idle_at(start + Duration::from_secs(500)).is_none());

        session.touch_at(start + Duration::from_secs(600));
        assert!(session.poll_idle_at(start + Duration::from_secs(650)).is_none());
        assert!(session.poll_idle_at(start + Duration::from_secs(678)).is_some());
    }

    #[test]
    fn test_touch_postpones_deadline() {
        let start = Instant::now();
        let mut session = Session::new();
        session.touch_at(start);
        session.touch_at(start + Duration::from_secs(60));
        assert!(session.poll_idle_at(start + Duration::from_secs(100)).is_none());
        assert_eq!(session.idle_deadline(), Some(start + Duration::from_secs(138)));
    }

    #[test]
    fn test_navigation_reset() {
        let mut session = Session::new();
        assert!(session.observe_page("https://shop.test/collections/all").is_none());
        session.push_text(Speaker::User, "hi");

        assert!(session.observe_page("https://shop.test/collections/all/#reviews").is_none());
        assert_eq!(session.len(), 1);

        let status = session.observe_page("https://shop.test/products/1").unwrap();
        assert_eq!(status.reason, ResetReason::Navigation);
        assert_eq!(status.message(), "Conversation reset for a new page.");
        assert!(session.is_empty());
        assert_eq!(session.last_page_url(), Some("https://shop.test/products/1"));

        assert!(session.observe_page("https://shop.test/products/1?variant=2").is_some());
    }

    #[test]
    fn test_page_cache_keyed_by_mode() {
        let mut session = Session::new();
        let text = PageText {
            plain_text: "cached".into(),
            ..Default::default()
        };
        session.cache_page("https://a.test/post", ExtractMode::Content, text.clone());
        assert_eq!(session.cached_page("https://a.test/post/", ExtractMode::Content), Some(&text));
        assert!(session.cached_page("https://a.test/post", ExtractMode::ContentWithLinks).is_none());
        assert!(session.cached_page("https://a.test/other", ExtractMode::Content).is_none());
    }

    #[test]
    fn test_transcript() {
        let mut session = Session::new();
        session.push_text(Speaker::User, "Which is best?");
        session.push_text(Speaker::Assistant, "The shoe.");
        session.append(ConversationEntry::ProductCards {
            products: vec![ProductRecord::new("Shoe", "https://shop.test/products/shoe", "", "$10")],
        });
        session.append(ConversationEntry::SuggestionButtons {
            suggestions: vec!["A?".into(), "B?".into()],
        });
        assert_eq!(
            session.transcript(),
            "You: Which is best?\n\nAI: The shoe.\n\nProducts:\n  - Shoe $10 (https://shop.test/products/shoe)\n\nSuggestions: A? | B?"
        );
    }
}
