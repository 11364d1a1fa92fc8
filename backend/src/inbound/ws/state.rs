//! Shared WebSocket adapter state.

use std::sync::Arc;

use crate::domain::ChangeFeed;
use crate::domain::ports::MatchQuery;
use crate::inbound::ws::origin::OriginAllowList;

/// Dependency bundle for the WebSocket endpoints.
#[derive(Clone)]
pub struct WsState {
    pub feed: ChangeFeed,
    pub matches: Arc<dyn MatchQuery>,
    pub origins: OriginAllowList,
}

impl WsState {
    pub fn new(feed: ChangeFeed, matches: Arc<dyn MatchQuery>, origins: OriginAllowList) -> Self {
        Self {
            feed,
            matches,
            origins,
        }
    }
}
