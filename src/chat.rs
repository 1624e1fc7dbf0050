//! OpenAI-compatible chat-completions client
//!
//! The request runs on a worker thread; [`ChatClient::submit`] hands back a
//! [`PendingReply`] that resolves exactly once.

use std::fmt;
use std::sync::mpsc;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use crate::config::Config;
use crate::error::{PagemateError, Result};
use crate::prompt::ComposedPrompt;

/// Connect timeout for the chat endpoint
const CONNECT_TIMEOUT_SECS: u64 = 30;

/// A fully built chat request
#[derive(Clone)]
pub struct ChatRequest {
    pub url: String,
    pub api_key: String,
    /// Serialized JSON body
    pub body: String,
}

impl fmt::Debug for ChatRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChatRequest")
            .field("url", &self.url)
            .field("api_key", &"****")
            .field("body_bytes", &self.body.len())
            .finish()
    }
}

/// Sends a chat request and returns the raw response body
pub trait ChatTransport: Send + Sync {
    fn post(&self, request: &ChatRequest) -> Result<String>;
}

/// Production transport over a ureq agent
pub struct HttpTransport {
    agent: ureq::Agent,
}

impl HttpTransport {
    pub fn new(timeout: Duration) -> Self {
        let agent = ureq::Agent::config_builder()
            .timeout_connect(Some(Duration::from_secs(CONNECT_TIMEOUT_SECS)))
            .timeout_global(Some(timeout))
            .build()
            .into();
        Self { agent }
    }
}

impl ChatTransport for HttpTransport {
    fn post(&self, request: &ChatRequest) -> Result<String> {
        let response = self
            .agent
            .post(&request.url)
            .header("Authorization", &format!("Bearer {}", request.api_key))
            .header("Content-Type", "application/json")
            .send(&request.body)
            .map_err(|e| match e {
                ureq::Error::StatusCode(code) => PagemateError::ChatStatus(code),
                other => PagemateError::HttpError(other),
            })?;

        let body = response.into_body().read_to_string()?;
        Ok(body)
    }
}

/// Reply to a submitted request
pub struct PendingReply {
    rx: mpsc::Receiver<Result<String>>,
    resolved: bool,
}

impl PendingReply {
    /// Block until the reply arrives
    pub fn wait(mut self) -> Result<String> {
        self.resolved = true;
        self.rx.recv().unwrap_or(Err(PagemateError::ReplyLost))
    }

    /// The reply if it has arrived. Yields `Some` at most once.
    pub fn try_take(&mut self) -> Option<Result<String>> {
        if self.resolved {
            return None;
        }
        let outcome = match self.rx.try_recv() {
            Ok(outcome) => outcome,
            Err(mpsc::TryRecvError::Empty) => return None,
            Err(mpsc::TryRecvError::Disconnected) => Err(PagemateError::ReplyLost),
        };
        self.resolved = true;
        Some(outcome)
    }

    pub fn is_resolved(&self) -> bool {
        self.resolved
    }
}

/// Client for `{endpoint}/chat/completions`
#[derive(Clone)]
pub struct ChatClient {
    endpoint: String,
    api_key: String,
    model: String,
    temperature: f64,
    transport: Arc<dyn ChatTransport>,
}

impl ChatClient {
    pub fn new(config: &Config) -> Self {
        Self::with_transport(config, Arc::new(HttpTransport::new(config.request_timeout())))
    }

    pub fn with_transport(config: &Config, transport: Arc<dyn ChatTransport>) -> Self {
        Self {
            endpoint: config.endpoint.clone(),
            api_key: config.api_key.clone(),
            model: config.model.clone(),
            temperature: config.temperature,
            transport,
        }
    }

    /// Endpoint with `/chat/completions` appended, `https://` assumed when no scheme is given
    pub fn completions_url(&self) -> String {
        completions_url(&self.endpoint)
    }

    pub fn build_request(&self, prompt: &ComposedPrompt) -> ChatRequest {
        let body = serde_json::json!({
            "model": self.model,
            "messages": [
                {"role": "system", "content": prompt.system_prompt},
                {"role": "user", "content": prompt.user_content},
            ],
            "temperature": self.temperature,
        });

        ChatRequest {
            url: self.completions_url(),
            api_key: self.api_key.clone(),
            body: body.to_string(),
        }
    }

    /// Send and block for the raw response body
    pub fn send(&self, prompt: &ComposedPrompt) -> Result<String> {
        let request = self.build_request(prompt);
        tracing::info!(url = %request.url, model = %self.model, bytes = request.body.len(), "sending chat request");
        self.transport.post(&request)
    }

    /// Send on a worker thread
    pub fn submit(&self, prompt: &ComposedPrompt) -> PendingReply {
        let request = self.build_request(prompt);
        let transport = Arc::clone(&self.transport);
        let (tx, rx) = mpsc::channel();

        tracing::info!(url = %request.url, model = %self.model, bytes = request.body.len(), "submitting chat request");
        thread::spawn(move || {
            let outcome = transport.post(&request);
            if let Err(e) = &outcome {
                tracing::warn!(error = %e, "chat request failed");
            }
            let _ = tx.send(outcome);
        });

        PendingReply { rx, resolved: false }
    }
}

fn completions_url(endpoint: &str) -> String {
    let url = format!("{}/chat/completions", endpoint.trim().trim_end_matches('/'));
    if url.starts_with("http") {
        url
    } else {
        format!("https://{}", url)
    }
}
