use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::{Client, Method, Request, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde_json::json;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, instrument};

use crate::auth::Session;
use crate::config::{Api, ResourceEndpoints, TokenPlacement};
use crate::error::{ApiError, Failure};
use crate::model::{Activity, ActivityDetailResp, ActivityId, RecommendationEntry};
use crate::toggle::{ToggleAction, ToggleKind};

/// Status and body of a finished HTTP exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    pub status: StatusCode,
    pub body: String,
}

impl RawResponse {
    pub fn new(status: StatusCode, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }
}

/// Executes fully built requests. Timeouts and cancellation are whatever the
/// implementation does by default.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn execute(&self, request: Request) -> Result<RawResponse>;
}

#[derive(Clone)]
pub struct HttpTransport {
    http: Client,
}

impl HttpTransport {
    pub fn new(http: Client) -> Self {
        Self { http }
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn execute(&self, request: Request) -> Result<RawResponse> {
        let res = self
            .http
            .execute(request)
            .await
            .context("failed to reach activity API")?;
        let status = res.status();
        let body = res.text().await.context("failed to read response body")?;
        Ok(RawResponse { status, body })
    }
}

/// Client for one activity-like resource (external board, campus board, ...).
#[derive(Clone)]
pub struct ActivityClient {
    http: Client,
    transport: Arc<dyn Transport>,
    gateway_url: Url,
    recommend_url: Url,
    endpoints: ResourceEndpoints,
    placement: TokenPlacement,
    session: Session,
}

impl fmt::Debug for ActivityClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActivityClient")
            .field("gateway_url", &self.gateway_url)
            .field("recommend_url", &self.recommend_url)
            .field("user", &self.session.user)
            .finish_non_exhaustive()
    }
}

impl ActivityClient {
    pub fn new(api: &Api, endpoints: ResourceEndpoints, session: Session) -> Result<Self> {
        let http = build_http(api)?;
        let transport = Arc::new(HttpTransport::new(http.clone()));
        Self::assemble(http, transport, api, endpoints, session)
    }

    pub fn with_transport(
        api: &Api,
        endpoints: ResourceEndpoints,
        session: Session,
        transport: Arc<dyn Transport>,
    ) -> Result<Self> {
        let http = build_http(api)?;
        Self::assemble(http, transport, api, endpoints, session)
    }

    fn assemble(
        http: Client,
        transport: Arc<dyn Transport>,
        api: &Api,
        endpoints: ResourceEndpoints,
        session: Session,
    ) -> Result<Self> {
        Ok(Self {
            http,
            transport,
            gateway_url: base_url(&api.gateway_url).context("invalid gateway URL")?,
            recommend_url: base_url(&api.recommend_url).context("invalid recommendation URL")?,
            endpoints,
            placement: api.token_placement,
            session,
        })
    }

    pub fn endpoints(&self) -> &ResourceEndpoints {
        &self.endpoints
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Resolve a path template against a base URL.
    pub fn endpoint(&self, base: &Url, template: &str, id: ActivityId) -> Result<Url, Failure> {
        let path = template.replace("{id}", &id.to_string());
        base.join(&path)
            .map_err(|err| Failure::Url(format!("{}: {}", path, err)))
    }

    /// Build a request; `authenticated` attaches the session token according
    /// to the configured placement.
    pub fn build_request(
        &self,
        method: Method,
        url: Url,
        authenticated: bool,
    ) -> Result<Request, Failure> {
        let mut builder = self.http.request(method.clone(), url);
        if authenticated {
            builder = match (self.placement, method) {
                (TokenPlacement::LegacyBody, Method::POST) => builder.json(&json!({
                    "headers": { "Authorization": self.session.token.header_value() }
                })),
                _ => builder.bearer_auth(self.session.token.expose()),
            };
        }
        builder
            .build()
            .map_err(|err| Failure::Url(err.to_string()))
    }

    async fn send(&self, request: Request) -> Result<String, Failure> {
        debug!(method=%request.method(), url=%request.url(), "sending activity API request");
        let res = self
            .transport
            .execute(request)
            .await
            .map_err(|err| Failure::Transport(format!("{:#}", err)))?;
        debug!(status=%res.status, "activity API response");
        if res.status != StatusCode::OK {
            return Err(Failure::Status {
                status: res.status,
                body: res.body,
            });
        }
        Ok(res.body)
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        base: &Url,
        template: &str,
        id: ActivityId,
        authenticated: bool,
    ) -> Result<T, Failure> {
        let url = self.endpoint(base, template, id)?;
        let request = self.build_request(Method::GET, url, authenticated)?;
        let body = self.send(request).await?;
        Ok(serde_json::from_str(&body)?)
    }

    #[instrument(skip(self))]
    pub async fn fetch_detail(&self, id: ActivityId) -> Result<Activity, ApiError> {
        let detail: ActivityDetailResp = self
            .get_json(&self.gateway_url, &self.endpoints.detail, id, true)
            .await
            .map_err(ApiError::FetchFailed)?;
        Ok(Activity::from_detail(id, detail))
    }

    /// The recommendation service is public; no token is sent.
    #[instrument(skip(self))]
    pub async fn fetch_recommendations(
        &self,
        id: ActivityId,
    ) -> Result<Vec<RecommendationEntry>, ApiError> {
        self.get_json(&self.recommend_url, &self.endpoints.recommendations, id, false)
            .await
            .map_err(ApiError::FetchFailed)
    }

    /// Issue the like/attend mutation for `action`. Any answer but 200 fails.
    #[instrument(skip(self))]
    pub async fn toggle(
        &self,
        kind: ToggleKind,
        action: ToggleAction,
        id: ActivityId,
    ) -> Result<(), ApiError> {
        let template = match (kind, action) {
            (ToggleKind::Like, ToggleAction::Set) => &self.endpoints.like,
            (ToggleKind::Like, ToggleAction::Clear) => &self.endpoints.unlike,
            (ToggleKind::Attend, ToggleAction::Set) => &self.endpoints.attend,
            (ToggleKind::Attend, ToggleAction::Clear) => &self.endpoints.unattend,
        };
        let url = self
            .endpoint(&self.gateway_url, template, id)
            .map_err(ApiError::MutationFailed)?;
        let request = self
            .build_request(action.method(), url, true)
            .map_err(ApiError::MutationFailed)?;
        self.send(request)
            .await
            .map(|_| ())
            .map_err(ApiError::MutationFailed)
    }

    pub async fn set_liked(&self, id: ActivityId) -> Result<(), ApiError> {
        self.toggle(ToggleKind::Like, ToggleAction::Set, id).await
    }

    pub async fn clear_liked(&self, id: ActivityId) -> Result<(), ApiError> {
        self.toggle(ToggleKind::Like, ToggleAction::Clear, id).await
    }

    pub async fn set_attended(&self, id: ActivityId) -> Result<(), ApiError> {
        self.toggle(ToggleKind::Attend, ToggleAction::Set, id).await
    }

    pub async fn clear_attended(&self, id: ActivityId) -> Result<(), ApiError> {
        self.toggle(ToggleKind::Attend, ToggleAction::Clear, id).await
    }
}

fn build_http(api: &Api) -> Result<Client> {
    Client::builder()
        .user_agent(api.user_agent.clone())
        .build()
        .context("failed to build HTTP client")
}

/// Parse a base URL, forcing a trailing slash so relative templates join
/// underneath it instead of replacing its last segment.
fn base_url(raw: &str) -> Result<Url> {
    let mut raw = raw.trim().to_string();
    if !raw.ends_with('/') {
        raw.push('/');
    }
    Url::parse(&raw).with_context(|| format!("cannot parse {}", raw))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config;

    struct Unreachable;

    #[async_trait]
    impl Transport for Unreachable {
        async fn execute(&self, _request: Request) -> Result<RawResponse> {
            Err(anyhow::anyhow!("connection refused"))
        }
    }

    fn client(placement: TokenPlacement) -> ActivityClient {
        let mut cfg: config::Config = serde_yaml::from_str(config::example()).unwrap();
        cfg.api.gateway_url = "https://gw.test/api".into();
        cfg.api.token_placement = placement;
        ActivityClient::with_transport(
            &cfg.api,
            ResourceEndpoints::external(),
            Session::new("kim", "token"),
            Arc::new(Unreachable),
        )
        .unwrap()
    }

    fn header(request: &Request, name: &str) -> Option<String> {
        request
            .headers()
            .get(name)
            .and_then(|h| h.to_str().ok())
            .map(str::to_string)
    }

    #[test]
    fn endpoint_substitutes_id_under_base_path() {
        let client = client(TokenPlacement::Header);
        let url = client
            .endpoint(&client.gateway_url, &client.endpoints.detail, ActivityId(42))
            .unwrap();
        assert_eq!(url.as_str(), "https://gw.test/api/notice/externalact/id?id=42");

        let url = client
            .endpoint(&client.recommend_url, &client.endpoints.recommendations, ActivityId(42))
            .unwrap();
        assert_eq!(url.as_str(), "https://recommend.example.com/external?id=42");
    }

    #[test]
    fn header_placement_sets_bearer_on_post() {
        let client = client(TokenPlacement::Header);
        let url = Url::parse("https://gw.test/api/notice/externalact/like?actId=1").unwrap();
        let request = client.build_request(Method::POST, url, true).unwrap();
        assert_eq!(request.method(), Method::POST);
        assert_eq!(header(&request, "Authorization").unwrap(), "Bearer token");
        assert!(request.body().is_none());
    }

    #[test]
    fn legacy_placement_moves_token_into_post_body() {
        let client = client(TokenPlacement::LegacyBody);
        let url = Url::parse("https://gw.test/api/notice/externalact/like?actId=1").unwrap();
        let request = client.build_request(Method::POST, url, true).unwrap();
        assert!(header(&request, "Authorization").is_none());
        assert_eq!(header(&request, "Content-Type").unwrap(), "application/json");
        let body = request.body().and_then(|b| b.as_bytes()).unwrap();
        let body: serde_json::Value = serde_json::from_slice(body).unwrap();
        assert_eq!(body["headers"]["Authorization"], "Bearer token");

        // DELETE keeps the header even in legacy mode.
        let url = Url::parse("https://gw.test/api/notice/externalact/likecancel?id=1").unwrap();
        let request = client.build_request(Method::DELETE, url, true).unwrap();
        assert_eq!(header(&request, "Authorization").unwrap(), "Bearer token");
    }

    #[test]
    fn unauthenticated_request_has_no_token() {
        let client = client(TokenPlacement::Header);
        let url = Url::parse("https://recommend.example.com/external?id=1").unwrap();
        let request = client.build_request(Method::GET, url, false).unwrap();
        assert!(header(&request, "Authorization").is_none());
    }

    #[tokio::test]
    async fn transport_errors_map_to_taxonomy() {
        let client = client(TokenPlacement::Header);
        let err = client.fetch_detail(ActivityId(1)).await.unwrap_err();
        assert!(matches!(err, ApiError::FetchFailed(Failure::Transport(_))));

        let err = client.set_liked(ActivityId(1)).await.unwrap_err();
        assert!(matches!(err, ApiError::MutationFailed(Failure::Transport(_))));
    }

    #[test]
    fn debug_hides_token() {
        let client = client(TokenPlacement::Header);
        let printed = format!("{:?}", client);
        assert!(printed.contains("gw.test"));
        assert!(!printed.contains("Bearer"));
    }
}
