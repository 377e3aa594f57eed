//! Mock transport for testing
//!
//! Records every request it receives and answers from a scripted queue,
//! or from a handler closure when one is installed.

use super::{Request, Response, Transport};
use crate::error::{Error, Result};
use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;
use std::collections::VecDeque;
use std::sync::Arc;

type Handler = Arc<dyn Fn(&Request) -> Result<Response> + Send + Sync>;

/// In-memory transport for testing
#[derive(Clone, Default)]
pub struct MockTransport {
    requests: Arc<Mutex<Vec<Request>>>,
    replies: Arc<Mutex<VecDeque<Result<Response>>>>,
    handler: Option<Handler>,
}

impl MockTransport {
    /// Create a mock that answers `null` data until replies are queued
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a mock that computes every reply from the request
    pub fn with_handler<F>(handler: F) -> Self
    where
        F: Fn(&Request) -> Result<Response> + Send + Sync + 'static,
    {
        Self {
            handler: Some(Arc::new(handler)),
            ..Self::default()
        }
    }

    /// Queue a reply; queued replies take precedence over the handler
    pub fn push_response(&self, response: Response) {
        self.replies.lock().push_back(Ok(response));
    }

    /// Queue successful reply data
    pub fn push_data(&self, data: Value) {
        self.push_response(Response::ok(data));
    }

    /// Queue a transport failure
    pub fn push_error(&self, message: impl Into<String>) {
        self.replies
            .lock()
            .push_back(Err(Error::Transport(message.into())));
    }

    /// All requests received so far, oldest first
    pub fn requests(&self) -> Vec<Request> {
        self.requests.lock().clone()
    }

    pub fn last_request(&self) -> Option<Request> {
        self.requests.lock().last().cloned()
    }

    /// Get the number of calls made
    pub fn call_count(&self) -> usize {
        self.requests.lock().len()
    }

    /// Forget recorded requests and queued replies
    pub fn clear(&self) {
        self.requests.lock().clear();
        self.replies.lock().clear();
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn call(&self, request: Request) -> Result<Response> {
        self.requests.lock().push(request.clone());

        if let Some(reply) = self.replies.lock().pop_front() {
            return reply;
        }
        match &self.handler {
            Some(handler) => handler(&request),
            None => Ok(Response::ok(Value::Null)),
        }
    }
}
