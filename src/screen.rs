//! View state of one activity detail screen.
//!
//! Every slice (detail, recommendations, each flag) is written by exactly one
//! kind of response. Nothing joins the two mount fetches; each lands whenever
//! it resolves.
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{info, instrument, warn};

use crate::client::ActivityClient;
use crate::model::{Activity, ActivityId, FlagState, RecommendationEntry};
use crate::navigation::{Dispatcher, Navigation, Tap};
use crate::toggle::{ToggleController, ToggleKind};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ViewState {
    pub activity: Option<Activity>,
    pub liked: FlagState,
    pub attended: FlagState,
    pub recommendations: Vec<RecommendationEntry>,
}

impl ViewState {
    /// Normalized body of the loaded activity, empty until one arrives.
    pub fn formatted_content(&self) -> String {
        match &self.activity {
            Some(activity) => activity.formatted_content(),
            None => crate::normalize::normalize(None),
        }
    }
}

/// Handles of the two fetches started by [`ActivityScreen::mount`].
#[derive(Debug)]
pub struct Mounted {
    pub detail: JoinHandle<()>,
    pub recommendations: JoinHandle<()>,
}

pub struct ActivityScreen {
    id: ActivityId,
    client: Arc<ActivityClient>,
    like: ToggleController,
    attend: ToggleController,
    dispatcher: Dispatcher,
    state: Mutex<ViewState>,
}

impl ActivityScreen {
    pub fn new(id: ActivityId, client: Arc<ActivityClient>) -> Arc<Self> {
        let endpoints = client.endpoints();
        let dispatcher = Dispatcher::new(
            endpoints.detail_route.clone(),
            endpoints.list_route.clone(),
        );
        Arc::new(Self {
            id,
            like: ToggleController::new(Arc::clone(&client), ToggleKind::Like),
            attend: ToggleController::new(Arc::clone(&client), ToggleKind::Attend),
            client,
            dispatcher,
            state: Mutex::new(ViewState::default()),
        })
    }

    pub fn id(&self) -> ActivityId {
        self.id
    }

    /// Start the detail and recommendation fetches without waiting on either.
    pub fn mount(self: &Arc<Self>) -> Mounted {
        let screen = Arc::clone(self);
        let detail = tokio::spawn(async move { screen.refresh_detail().await });
        let screen = Arc::clone(self);
        let recommendations = tokio::spawn(async move { screen.refresh_recommendations().await });
        Mounted {
            detail,
            recommendations,
        }
    }

    /// Fetch the detail and overwrite the activity and both flags. On failure
    /// the previous state stays.
    #[instrument(skip(self), fields(id = %self.id))]
    pub async fn refresh_detail(&self) {
        match self.client.fetch_detail(self.id).await {
            Ok(activity) => {
                let mut state = self.state.lock().await;
                state.liked = activity.liked;
                state.attended = activity.attended;
                state.activity = Some(activity);
                info!(liked = state.liked.as_str(), attended = state.attended.as_str(), "activity loaded");
            }
            Err(err) => warn!(?err, "error fetching activity detail"),
        }
    }

    #[instrument(skip(self), fields(id = %self.id))]
    pub async fn refresh_recommendations(&self) {
        match self.client.fetch_recommendations(self.id).await {
            Ok(list) => {
                info!(count = list.len(), "recommendations loaded");
                self.state.lock().await.recommendations = list;
            }
            Err(err) => warn!(?err, "error fetching recommended activities"),
        }
    }

    /// Toggle the like flag and return the flag displayed afterwards. A
    /// rejected toggle writes nothing, so a detail refetch that landed while
    /// the request was in flight is kept.
    pub async fn toggle_like(&self) -> FlagState {
        let current = self.state.lock().await.liked;
        let accepted = self.like.toggle(self.id, current).await;
        let mut state = self.state.lock().await;
        if let Some(next) = accepted {
            state.liked = next;
        }
        state.liked
    }

    pub async fn toggle_attend(&self) -> FlagState {
        let current = self.state.lock().await.attended;
        let accepted = self.attend.toggle(self.id, current).await;
        let mut state = self.state.lock().await;
        if let Some(next) = accepted {
            state.attended = next;
        }
        state.attended
    }

    pub fn tap(&self, nav: &mut dyn Navigation, tap: Tap) {
        self.dispatcher.dispatch(nav, tap);
    }

    pub async fn snapshot(&self) -> ViewState {
        self.state.lock().await.clone()
    }
}
