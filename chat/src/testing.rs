//! Testing utilities for code built on the chat client.
//!
//! `MockTransport` returns scripted replies and records every request, so
//! tests can assert on wire payloads without network access.

use crate::{Error, HttpReply, Transport};
use async_trait::async_trait;
use reqwest::header::HeaderMap;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// A request captured by [`MockTransport`].
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub url: String,
    pub headers: HeaderMap,
    pub body: serde_json::Value,
}

#[derive(Debug)]
enum Scripted {
    Reply(HttpReply),
    Fail(String),
    Hang,
}

#[derive(Debug, Default)]
struct MockState {
    script: VecDeque<Scripted>,
    requests: Vec<RecordedRequest>,
}

/// A transport that replays scripted replies in order.
///
/// Clones share the same script and request log.
#[derive(Debug, Clone, Default)]
pub struct MockTransport {
    state: Arc<Mutex<MockState>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Queue a reply with the given status and JSON body.
    pub fn push_reply(&self, status: u16, body: serde_json::Value) {
        self.state().script.push_back(Scripted::Reply(HttpReply {
            status,
            body: body.to_string(),
        }));
    }

    /// Queue a network failure.
    pub fn push_network_error(&self, message: impl Into<String>) {
        self.state()
            .script
            .push_back(Scripted::Fail(message.into()));
    }

    /// Queue a request that never completes.
    pub fn push_hang(&self) {
        self.state().script.push_back(Scripted::Hang);
    }

    /// All requests received so far.
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.state().requests.clone()
    }

    pub fn request_count(&self) -> usize {
        self.state().requests.len()
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn post_json(
        &self,
        url: &str,
        headers: HeaderMap,
        body: serde_json::Value,
    ) -> Result<HttpReply, Error> {
        let next = {
            let mut state = self.state();
            state.requests.push(RecordedRequest {
                url: url.to_string(),
                headers,
                body,
            });
            state.script.pop_front()
        };

        match next {
            Some(Scripted::Reply(reply)) => Ok(reply),
            Some(Scripted::Fail(message)) => Err(Error::Network(message)),
            Some(Scripted::Hang) => std::future::pending().await,
            None => Err(Error::Network("no scripted reply".to_string())),
        }
    }
}
