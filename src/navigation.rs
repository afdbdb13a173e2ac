//! Stack navigation and tap dispatch.
use serde_json::{json, Map, Value};
use tracing::debug;

use crate::model::ActivityId;

pub const MAIN_ROUTE: &str = "Main";
pub const ACTIVITY_ID_PARAM: &str = "activityId";

/// Parameter bag attached to a route, e.g. `{"activityId": 42}`.
pub type Params = Map<String, Value>;

pub fn activity_params(id: ActivityId) -> Params {
    let mut params = Map::new();
    params.insert(ACTIVITY_ID_PARAM.to_string(), json!(id.0));
    params
}

#[derive(Debug, Clone, PartialEq)]
pub struct Route {
    pub name: String,
    pub params: Params,
}

impl Route {
    pub fn new(name: impl Into<String>, params: Params) -> Self {
        Self {
            name: name.into(),
            params,
        }
    }

    pub fn activity_id(&self) -> Option<ActivityId> {
        self.params
            .get(ACTIVITY_ID_PARAM)
            .and_then(Value::as_i64)
            .map(ActivityId)
    }
}

/// What a screen needs from the router.
pub trait Navigation {
    /// Go to `name`, reusing an existing route of that name if there is one.
    fn navigate(&mut self, name: &str, params: Params);
    /// Always put a new route on top.
    fn push(&mut self, name: &str, params: Params);
    fn go_back(&mut self) -> bool;
}

/// Bounded stack navigator. The root route is never removed.
#[derive(Debug, Clone)]
pub struct StackNavigator {
    stack: Vec<Route>,
    max_depth: usize,
}

impl StackNavigator {
    /// `max_depth` is clamped to at least 2 so there is room above the root.
    pub fn new(root: Route, max_depth: usize) -> Self {
        Self {
            stack: vec![root],
            max_depth: max_depth.max(2),
        }
    }

    pub fn current(&self) -> &Route {
        // The root is never popped.
        &self.stack[self.stack.len() - 1]
    }

    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    pub fn routes(&self) -> &[Route] {
        &self.stack
    }

    fn push_bounded(&mut self, route: Route) {
        if self.stack.len() >= self.max_depth {
            let dropped = self.stack.remove(1);
            debug!(route = %dropped.name, max_depth = self.max_depth, "navigation stack full; dropping oldest route");
        }
        self.stack.push(route);
    }
}

impl Navigation for StackNavigator {
    fn navigate(&mut self, name: &str, params: Params) {
        match self.stack.iter().rposition(|r| r.name == name) {
            Some(idx) => {
                self.stack.truncate(idx + 1);
                self.stack[idx].params = params;
            }
            None => self.push_bounded(Route::new(name, params)),
        }
        debug!(route = name, depth = self.depth(), "navigate");
    }

    fn push(&mut self, name: &str, params: Params) {
        self.push_bounded(Route::new(name, params));
        debug!(route = name, depth = self.depth(), "push");
    }

    fn go_back(&mut self) -> bool {
        if self.stack.len() > 1 {
            self.stack.pop();
            true
        } else {
            false
        }
    }
}

/// User taps on an activity screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tap {
    Home,
    ActivityList,
    Activity(ActivityId),
    Recommendation(ActivityId),
}

/// Maps taps to route transitions for one resource kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dispatcher {
    pub detail_route: String,
    pub list_route: String,
}

impl Dispatcher {
    pub fn new(detail_route: impl Into<String>, list_route: impl Into<String>) -> Self {
        Self {
            detail_route: detail_route.into(),
            list_route: list_route.into(),
        }
    }

    pub fn dispatch(&self, nav: &mut dyn Navigation, tap: Tap) {
        match tap {
            Tap::Home => nav.navigate(MAIN_ROUTE, Params::new()),
            Tap::ActivityList => nav.navigate(&self.list_route, Params::new()),
            Tap::Activity(id) => nav.navigate(&self.detail_route, activity_params(id)),
            // Same route name again: the stack grows so back walks through
            // every viewed item.
            Tap::Recommendation(id) => nav.push(&self.detail_route, activity_params(id)),
        }
    }
}
