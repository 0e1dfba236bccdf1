//! The authenticated server facade.

use std::sync::Arc;

use chrono::Utc;
use liftlog_sync_protocol::{PullRequest, PullResponse, PushRequest, PushResponse, TableRegistry};

use crate::auth::SessionTokens;
use crate::config::ServerConfig;
use crate::error::ServerResult;
use crate::handler::{HandlerContext, RequestHandler};
use crate::store::ServerStore;

/// The sync server: token validation in front of the request handler.
///
/// Transport-agnostic by design; an HTTP or RPC layer calls
/// [`push`](SyncServer::push) and [`pull`](SyncServer::pull) with the raw
/// token bytes it received.
pub struct SyncServer {
    handler: RequestHandler,
    tokens: SessionTokens,
}

impl SyncServer {
    /// Builds a server over the given store and table registry.
    pub fn new(
        config: ServerConfig,
        store: Arc<ServerStore>,
        registry: TableRegistry,
        secret: impl Into<Vec<u8>>,
    ) -> Self {
        let tokens = SessionTokens::new(secret, config.token_ttl);
        Self {
            handler: RequestHandler::new(HandlerContext {
                store,
                registry,
                config,
            }),
            tokens,
        }
    }

    /// Issues a fresh session token for an already-authenticated user.
    pub fn issue_token(&self, user_id: &str) -> Vec<u8> {
        self.tokens.issue(user_id, Utc::now())
    }

    /// Applies a push batch on behalf of the token's user.
    pub fn push(&self, token: &[u8], request: PushRequest) -> ServerResult<PushResponse> {
        let user_id = self.tokens.validate(token, Utc::now())?;
        self.handler.handle_push(&user_id, request)
    }

    /// Serves a pull on behalf of the token's user.
    pub fn pull(&self, token: &[u8], request: PullRequest) -> ServerResult<PullResponse> {
        let user_id = self.tokens.validate(token, Utc::now())?;
        self.handler.handle_pull(&user_id, request)
    }
}
