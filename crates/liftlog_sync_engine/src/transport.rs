//! Transport abstraction between the engine and the server.

use std::collections::VecDeque;
use std::future::Future;

use liftlog_sync_protocol::{ErrorCode, PullRequest, PullResponse, PushRequest, PushResponse};
use parking_lot::Mutex;

use crate::error::{SyncError, SyncResult};

/// The two calls the engine makes against a sync server.
///
/// Implementations carry the session token; the engine never sees it.
pub trait SyncTransport: Send + Sync {
    /// Uploads a batch of local changes.
    fn push(&self, request: PushRequest) -> impl Future<Output = SyncResult<PushResponse>> + Send;

    /// Fetches changes newer than the client's cursor.
    fn pull(&self, request: PullRequest) -> impl Future<Output = SyncResult<PullResponse>> + Send;
}

#[derive(Default)]
struct MockState {
    push_requests: Vec<PushRequest>,
    pull_requests: Vec<PullRequest>,
    push_responses: VecDeque<SyncResult<PushResponse>>,
    pull_responses: VecDeque<SyncResult<PullResponse>>,
    fail_all: Option<ErrorCode>,
}

/// A scripted transport for tests.
///
/// Records every request. Responses come from the scripted queues; when a
/// queue is empty, pushes succeed and pulls echo the request cursor with no
/// changes. [`MockTransport::fail_with`] makes every call fail until
/// cleared.
#[derive(Default)]
pub struct MockTransport {
    inner: Mutex<MockState>,
}

impl MockTransport {
    /// Creates a transport that succeeds on every call.
    pub fn new() -> Self {
        Self::default()
    }

    /// Scripts the next push outcome.
    pub fn enqueue_push(&self, response: SyncResult<PushResponse>) {
        self.inner.lock().push_responses.push_back(response);
    }

    /// Scripts the next pull outcome.
    pub fn enqueue_pull(&self, response: SyncResult<PullResponse>) {
        self.inner.lock().pull_responses.push_back(response);
    }

    /// Fails every subsequent call with the given code.
    pub fn fail_with(&self, code: ErrorCode) {
        self.inner.lock().fail_all = Some(code);
    }

    /// Clears a previously set failure mode.
    pub fn clear_failure(&self) {
        self.inner.lock().fail_all = None;
    }

    /// Push requests seen so far.
    pub fn push_requests(&self) -> Vec<PushRequest> {
        self.inner.lock().push_requests.clone()
    }

    /// Pull requests seen so far.
    pub fn pull_requests(&self) -> Vec<PullRequest> {
        self.inner.lock().pull_requests.clone()
    }
}

impl SyncTransport for MockTransport {
    async fn push(&self, request: PushRequest) -> SyncResult<PushResponse> {
        let mut state = self.inner.lock();
        state.push_requests.push(request);
        if let Some(code) = state.fail_all {
            return Err(SyncError::from_code(code, "scripted failure"));
        }
        state
            .push_responses
            .pop_front()
            .unwrap_or_else(|| Ok(PushResponse::ok()))
    }

    async fn pull(&self, request: PullRequest) -> SyncResult<PullResponse> {
        let mut state = self.inner.lock();
        let cursor = request.cursor;
        state.pull_requests.push(request);
        if let Some(code) = state.fail_all {
            return Err(SyncError::from_code(code, "scripted failure"));
        }
        state
            .pull_responses
            .pop_front()
            .unwrap_or_else(|| Ok(PullResponse::empty(cursor)))
    }
}
