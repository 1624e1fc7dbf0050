//! The browsing companion: one conversation about whatever page is open
//!
//! A turn runs extraction, catalog enrichment and prompt composition on the
//! caller's thread, then hands the chat request to a worker. At most one turn
//! is in flight; the flag is held by the [`PendingTurn`] and released when the
//! turn is completed or dropped.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use serde::Serialize;

use crate::chat::{ChatClient, PendingReply};
use crate::config::Config;
use crate::correlate::correlate;
use crate::error::{PagemateError, Result};
use crate::extract::{ExtractMode, PageText, PageTextExtractor};
use crate::page::BrowserEngine;
use crate::products::{catalog_section, ProductCatalogExtractor, ProductRecord};
use crate::prompt::{compose_in, PromptType};
use crate::response::{format_for_readability, is_parse_failure, parse_chat_response};
use crate::session::{ConversationEntry, ResetReason, ResetStatus, Session, Speaker};

/// Follow-ups offered after shopping answers
pub const PRODUCT_SUGGESTIONS: &[&str] = &[
    "Sản phẩm nào tốt nhất?",
    "Ngân sách của tôi X — nên chọn cái nào?",
    "Nên mua ngay hay đợi?",
    "Cho tôi link sản phẩm [tên sản phẩm]",
];

/// Follow-ups offered after a summary
pub const SUMMARY_SUGGESTIONS: &[&str] = &[
    "What are the main points?",
    "Who is the author?",
    "When was this published?",
];

fn follow_up_suggestions(intent: PromptType) -> &'static [&'static str] {
    match intent {
        PromptType::HelpChooseProduct | PromptType::PurchaseAdvice => PRODUCT_SUGGESTIONS,
        PromptType::Summarize => SUMMARY_SUGGESTIONS,
        _ => &[],
    }
}

/// Products to show with an answer: the ones it mentions, else the whole catalog
pub fn products_for_answer(products: &[ProductRecord], answer: &str) -> Vec<ProductRecord> {
    if products.is_empty() || is_parse_failure(answer) {
        return Vec::new();
    }
    let matched = correlate(products, answer);
    if matched.is_empty() {
        products.to_vec()
    } else {
        matched
    }
}

struct InFlightGuard(Arc<AtomicBool>);

impl InFlightGuard {
    fn acquire(flag: &Arc<AtomicBool>) -> Result<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| PagemateError::RequestInFlight)?;
        Ok(Self(Arc::clone(flag)))
    }
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// A submitted turn waiting for its answer
pub struct PendingTurn {
    intent: PromptType,
    products: Vec<ProductRecord>,
    reply: PendingReply,
    _guard: InFlightGuard,
}

impl PendingTurn {
    pub fn intent(&self) -> PromptType {
        self.intent
    }

    /// Products found on the page when the turn was submitted
    pub fn products(&self) -> &[ProductRecord] {
        &self.products
    }
}

/// A completed answer
#[derive(Debug, Clone, Serialize)]
pub struct Answer {
    pub intent: PromptType,
    pub text: String,
    pub products: Vec<ProductRecord>,
}

pub struct Companion {
    config: Config,
    client: ChatClient,
    text_extractor: PageTextExtractor,
    catalog: ProductCatalogExtractor,
    session: Session,
    in_flight: Arc<AtomicBool>,
}

impl Companion {
    pub fn new(config: Config) -> Self {
        let client = ChatClient::new(&config);
        Self::with_client(config, client)
    }

    /// Companion over a custom chat client (tests use a fake transport)
    pub fn with_client(config: Config, client: ChatClient) -> Self {
        Self {
            text_extractor: PageTextExtractor::new(config.extraction_timeout()),
            catalog: ProductCatalogExtractor::new(config.extraction_timeout()),
            session: Session::new(),
            in_flight: Arc::new(AtomicBool::new(false)),
            client,
            config,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn is_busy(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    /// Check the idle deadline; a firing reset is noted in the fresh conversation
    pub fn poll_idle(&mut self) -> Option<ResetStatus> {
        self.poll_idle_at(Instant::now())
    }

    pub fn poll_idle_at(&mut self, now: Instant) -> Option<ResetStatus> {
        let status = self.session.poll_idle_at(now)?;
        self.session.push_text(Speaker::Notice, status.message());
        Some(status)
    }

    /// Count any user command as activity
    pub fn touch(&mut self) {
        self.session.touch();
    }

    pub fn reset_session(&mut self) -> ResetStatus {
        self.session.reset(ResetReason::User)
    }

    /// Start a turn. Fails without touching the network when no key is
    /// configured or another turn is still in flight.
    pub fn submit(&mut self, engine: &dyn BrowserEngine, question: &str, intent: PromptType) -> Result<PendingTurn> {
        self.poll_idle();
        self.session.touch();

        if !self.config.is_configured() {
            let err = self.config.not_configured_error();
            self.session.push_text(Speaker::Notice, err.to_string());
            return Err(err);
        }

        let guard = InFlightGuard::acquire(&self.in_flight)?;

        if let Some(url) = engine.current_url() {
            if let Some(status) = self.session.observe_page(&url) {
                self.session.push_text(Speaker::Notice, status.message());
            }
        }

        let mode = if intent.wants_links() {
            ExtractMode::ContentWithLinks
        } else {
            ExtractMode::Content
        };
        let page = self.page_text(engine, mode);

        let products = if intent.wants_catalog() {
            self.catalog.extract_products(engine)
        } else {
            Vec::new()
        };

        let mut page_content = page.to_prompt_text();
        page_content.push_str(&catalog_section(&products));

        let effective_question = intent.question_or_default(question);
        let prompt = compose_in(&self.config.language, &page_content, &effective_question, intent);

        self.session.push_text(Speaker::User, user_line(question, intent));
        tracing::info!(
            session = %self.session.id(),
            ?intent,
            page_chars = page_content.len(),
            products = products.len(),
            "turn submitted"
        );

        let reply = self.client.submit(&prompt);
        Ok(PendingTurn {
            intent,
            products,
            reply,
            _guard: guard,
        })
    }

    /// Block for the turn's answer and record it
    pub fn complete(&mut self, turn: PendingTurn) -> Result<Answer> {
        let PendingTurn {
            intent,
            products,
            reply,
            _guard,
        } = turn;
        let outcome = reply.wait();
        self.finish(intent, &products, outcome)
    }

    /// Record the answer if it has arrived; `None` while still waiting
    pub fn try_complete(&mut self, turn: &mut PendingTurn) -> Option<Result<Answer>> {
        let outcome = turn.reply.try_take()?;
        Some(self.finish(turn.intent, &turn.products, outcome))
    }

    /// Submit and wait
    pub fn ask(&mut self, engine: &dyn BrowserEngine, question: &str, intent: PromptType) -> Result<Answer> {
        let turn = self.submit(engine, question, intent)?;
        self.complete(turn)
    }

    /// Links on the page, without asking the model
    pub fn list_links(&mut self, engine: &dyn BrowserEngine) -> PageText {
        self.session.touch();
        let page = self.page_text(engine, ExtractMode::ContentWithLinks);
        self.session.push_text(Speaker::User, PromptType::ExtractLinks.label());
        self.session.push_text(Speaker::Assistant, page.links_markdown());
        page
    }

    /// Products on the page, without asking the model
    pub fn list_products(&mut self, engine: &dyn BrowserEngine) -> Vec<ProductRecord> {
        self.session.touch();
        let products = self.catalog.extract_products(engine);
        if !products.is_empty() {
            self.session.append(ConversationEntry::ProductCards {
                products: products.clone(),
            });
        }
        products
    }

    fn page_text(&mut self, engine: &dyn BrowserEngine, mode: ExtractMode) -> PageText {
        let url = engine.current_url().unwrap_or_default();
        if let Some(cached) = self.session.cached_page(&url, mode) {
            tracing::debug!(%url, ?mode, "using cached page text");
            return cached.clone();
        }

        let page = self.text_extractor.extract(engine, mode);
        if !url.is_empty() && !page.is_empty() {
            self.session.cache_page(&url, mode, page.clone());
        }
        page
    }

    fn finish(&mut self, intent: PromptType, products: &[ProductRecord], outcome: Result<String>) -> Result<Answer> {
        let body = match outcome {
            Ok(body) => body,
            Err(e) => {
                self.session.push_text(Speaker::Notice, format!("Error: {}", e));
                return Err(e);
            }
        };

        let parsed = parse_chat_response(&body);
        let text = if is_parse_failure(&parsed) {
            parsed
        } else {
            format_for_readability(&parsed)
        };
        let shown = products_for_answer(products, &text);

        self.session.push_text(Speaker::Assistant, text.clone());
        if !shown.is_empty() {
            self.session.append(ConversationEntry::ProductCards { products: shown.clone() });
        }
        let suggestions = follow_up_suggestions(intent);
        if !suggestions.is_empty() && !is_parse_failure(&text) {
            self.session.append(ConversationEntry::SuggestionButtons {
                suggestions: suggestions.iter().map(|s| s.to_string()).collect(),
            });
        }

        tracing::debug!(?intent, chars = text.len(), products = shown.len(), "turn completed");
        Ok(Answer {
            intent,
            text,
            products: shown,
        })
    }
}

/// What the conversation shows for the user's side of a turn
fn user_line(question: &str, intent: PromptType) -> String {
    let question = question.trim();
    match intent {
        PromptType::Question => question.to_string(),
        _ if question.is_empty() => intent.label().to_string(),
        _ => format!("{}: {}", intent.label(), question),
    }
}
