//! web_fetch tool implementation.
//!
//! Runs one request through the router, exactly as an intercepted request
//! from a controlled page would be handled.

use offgrid_client::{InterceptedRequest, Method, Outcome, RequestMode, Router, Transport, fetch::canonicalize};
use offgrid_core::{Error, Snapshot};
use rmcp::{ErrorData as McpError, model::*};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::{BodyOutput, HeaderField, header_fields};

/// Input parameters for web_fetch tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct WebFetchParams {
    /// Absolute URL, or a path relative to the serving origin.
    pub url: String,

    /// HTTP method (default: GET).
    #[serde(default)]
    pub method: Option<String>,

    /// Optional Accept header.
    #[serde(default)]
    pub accept: Option<String>,

    /// Treat the request as a top-level navigation.
    #[serde(default)]
    pub navigate: bool,
}

/// Output structure for web_fetch tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct WebFetchOutput {
    /// The canonical request URL.
    pub url: String,
    /// "response", "network_error", or "pass_through".
    pub outcome: String,
    /// Route class the request was assigned to.
    pub class: String,
    /// Response status, absent on network error.
    pub status: Option<u16>,
    pub headers: Vec<HeaderField>,
    #[serde(flatten)]
    pub body: BodyOutput,
    /// Failure description for network errors.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl WebFetchOutput {
    fn new(url: &str, outcome: &str, class: &str) -> Self {
        Self {
            url: url.to_string(),
            outcome: outcome.to_string(),
            class: class.to_string(),
            status: None,
            headers: Vec::new(),
            body: BodyOutput::default(),
            error: None,
        }
    }

    fn with_response(mut self, response: &Snapshot) -> Self {
        self.status = Some(response.status);
        self.headers = header_fields(&response.headers);
        self.body = BodyOutput::encode(response.content_type(), &response.body);
        self
    }

    fn with_error(mut self, error: String) -> Self {
        self.error = Some(error);
        self
    }
}

/// Build the intercepted request described by `params`.
pub(crate) fn build_request(router: &Router, params: &WebFetchParams) -> Result<InterceptedRequest, Error> {
    if params.url.trim().is_empty() {
        return Err(Error::InvalidInput("url cannot be empty".into()));
    }

    let url = canonicalize(&params.url, router.origin()).map_err(|e| Error::InvalidUrl(e.to_string()))?;
    let method = match params.method.as_deref() {
        Some(m) => Method::from_bytes(m.trim().to_ascii_uppercase().as_bytes())
            .map_err(|_| Error::InvalidInput(format!("unsupported method: {m}")))?,
        None => Method::GET,
    };

    let mut request = InterceptedRequest::new(method, url);
    if params.navigate {
        request = request.with_mode(RequestMode::Navigate);
    }
    if let Some(accept) = params.accept.as_deref() {
        request = request.with_accept(accept);
    }
    Ok(request)
}

/// Route a request and describe what came back.
///
/// A pass-through is completed with `passthrough`, the transport the host
/// would have used had nothing intercepted the request.
pub async fn fetch(router: &Router, passthrough: &dyn Transport, params: WebFetchParams) -> Result<WebFetchOutput, Error> {
    let request = build_request(router, &params)?;
    let class = router.classify(&request);
    let url = request.url.to_string();

    let output = match router.handle(&request).await {
        Outcome::Response(response) => WebFetchOutput::new(&url, "response", class.as_str()).with_response(&response),
        Outcome::NetworkError(error) => WebFetchOutput::new(&url, "network_error", class.as_str()).with_error(error),
        Outcome::PassThrough => {
            let output = WebFetchOutput::new(&url, "pass_through", class.as_str());
            match passthrough.fetch(&request).await {
                Ok(response) => output.with_response(&response),
                Err(e) => output.with_error(e.to_string()),
            }
        }
    };

    tracing::debug!(url = %output.url, outcome = %output.outcome, class = %output.class, "web_fetch");
    Ok(output)
}

/// Implementation of the web_fetch tool.
pub async fn fetch_impl(
    router: &Router, passthrough: &dyn Transport, params: WebFetchParams,
) -> Result<CallToolResult, McpError> {
    let output = fetch(router, passthrough, params).await?;
    let json = serde_json::to_string_pretty(&output)
        .map_err(|e| Error::InvalidInput(format!("Failed to serialize response: {e}")))?;

    Ok(CallToolResult::success(vec![Content::text(json)]))
}
