//! Like/attend toggling.
//!
//! A flag only moves when the server answers 200 to the matching request.
//! Failures are logged and leave the flag where it was.
use reqwest::Method;
use std::sync::Arc;
use tracing::{info, instrument, warn};

use crate::client::ActivityClient;
use crate::model::{ActivityId, FlagState};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToggleKind {
    Like,
    Attend,
}

impl ToggleKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ToggleKind::Like => "like",
            ToggleKind::Attend => "attend",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToggleAction {
    Set,
    Clear,
}

impl ToggleAction {
    /// Off (or not yet known) sets, on clears.
    pub fn for_state(state: FlagState) -> Self {
        if state.is_on() {
            ToggleAction::Clear
        } else {
            ToggleAction::Set
        }
    }

    pub fn method(&self) -> Method {
        match self {
            ToggleAction::Set => Method::POST,
            ToggleAction::Clear => Method::DELETE,
        }
    }

    /// Flag value after the server accepted this action.
    pub fn target(&self) -> FlagState {
        match self {
            ToggleAction::Set => FlagState::On,
            ToggleAction::Clear => FlagState::Off,
        }
    }
}

/// Drives one flag of one resource kind.
#[derive(Debug, Clone)]
pub struct ToggleController {
    client: Arc<ActivityClient>,
    kind: ToggleKind,
}

impl ToggleController {
    pub fn new(client: Arc<ActivityClient>, kind: ToggleKind) -> Self {
        Self { client, kind }
    }

    pub fn kind(&self) -> ToggleKind {
        self.kind
    }

    /// Issue the request implied by `current`. Returns the new flag only when
    /// the server accepted it; `None` means the displayed flag must not change.
    #[instrument(skip(self), fields(kind = self.kind.as_str()))]
    pub async fn toggle(&self, id: ActivityId, current: FlagState) -> Option<FlagState> {
        let action = ToggleAction::for_state(current);
        match self.client.toggle(self.kind, action, id).await {
            Ok(()) => {
                let next = action.target();
                info!(%id, ?action, state = next.as_str(), "toggle accepted");
                Some(next)
            }
            Err(err) => {
                warn!(?err, %id, ?action, "toggle rejected; leaving flag untouched");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn action_follows_current_state() {
        assert_eq!(ToggleAction::for_state(FlagState::Unknown), ToggleAction::Set);
        assert_eq!(ToggleAction::for_state(FlagState::Off), ToggleAction::Set);
        assert_eq!(ToggleAction::for_state(FlagState::On), ToggleAction::Clear);
    }

    #[test]
    fn action_maps_to_verb_and_target() {
        assert_eq!(ToggleAction::Set.method(), Method::POST);
        assert_eq!(ToggleAction::Clear.method(), Method::DELETE);
        assert_eq!(ToggleAction::Set.target(), FlagState::On);
        assert_eq!(ToggleAction::Clear.target(), FlagState::Off);
    }
}
