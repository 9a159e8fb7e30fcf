//! Scriptable oracle for tests.
//!
//! [`MockOracle`] answers from a queue of configured replies so service
//! tests can exercise the success, fallback, and failure paths without
//! network access. When the queue is empty it keeps returning
//! [`MockOracle::DEFAULT_REPLY`].

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;

use crate::{fallback, Generation, GenerationRequest, Oracle, OracleError};

#[derive(Debug, Clone)]
enum MockReply {
    Reply(String),
    Blank,
    Failure { status: u16, message: String },
}

/// Oracle implementation that replays scripted responses.
#[derive(Debug, Clone, Default)]
pub struct MockOracle {
    replies: Arc<Mutex<VecDeque<MockReply>>>,
    calls: Arc<Mutex<Vec<GenerationRequest>>>,
}

impl MockOracle {
    /// Text returned once the scripted queue is exhausted.
    pub const DEFAULT_REPLY: &'static str =
        "As energias se alinham ao seu favor. Confie no caminho que se abre.";

    /// Creates a mock with an empty script.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues a successful reply with `content`.
    #[must_use]
    pub fn with_reply(self, content: impl Into<String>) -> Self {
        self.push(MockReply::Reply(content.into()));
        self
    }

    /// Queues a blank completion.
    ///
    /// Mirrors the real client: the call succeeds and returns the tool's
    /// canned fallback text with the fallback flag set.
    #[must_use]
    pub fn with_blank(self) -> Self {
        self.push(MockReply::Blank);
        self
    }

    /// Queues a provider failure (HTTP 503).
    #[must_use]
    pub fn with_failure(self) -> Self {
        self.with_api_error(503, "mock oracle unavailable")
    }

    /// Queues a provider failure with a specific status and message.
    #[must_use]
    pub fn with_api_error(self, status: u16, message: impl Into<String>) -> Self {
        self.push(MockReply::Failure {
            status,
            message: message.into(),
        });
        self
    }

    /// Number of generate calls made so far.
    #[must_use]
    pub fn call_count(&self) -> usize {
        self.lock_calls().len()
    }

    /// The most recent request, if any call was made.
    #[must_use]
    pub fn last_request(&self) -> Option<GenerationRequest> {
        self.lock_calls().last().cloned()
    }

    fn push(&self, reply: MockReply) {
        self.replies
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push_back(reply);
    }

    fn pop(&self) -> Option<MockReply> {
        self.replies
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front()
    }

    fn lock_calls(&self) -> std::sync::MutexGuard<'_, Vec<GenerationRequest>> {
        self.calls.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl Oracle for MockOracle {
    async fn generate(&self, request: &GenerationRequest) -> Result<Generation, OracleError> {
        self.lock_calls().push(request.clone());

        match self.pop() {
            None => Ok(Generation {
                content: Self::DEFAULT_REPLY.to_owned(),
                fallback: false,
            }),
            Some(MockReply::Reply(content)) => Ok(Generation {
                content,
                fallback: false,
            }),
            Some(MockReply::Blank) => Ok(Generation {
                content: fallback::content(request.tool).to_owned(),
                fallback: true,
            }),
            Some(MockReply::Failure { status, message }) => {
                Err(OracleError::Api { status, message })
            }
        }
    }
}
