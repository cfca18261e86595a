use reqwest::RequestBuilder;
use uuid::Uuid;

/// HTTP header name for request ID
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Identifier attached to every outbound request
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RequestId(pub Uuid);

impl RequestId {
    /// Creates a new random request ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Returns the UUID as a string
    pub fn as_str(&self) -> String {
        self.0.to_string()
    }
}

impl Default for RequestId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Adds a fresh `x-request-id` header to the request
pub fn tag_request(builder: RequestBuilder) -> (RequestBuilder, RequestId) {
    let request_id = RequestId::new();
    let builder = builder.header(REQUEST_ID_HEADER, request_id.as_str());
    (builder, request_id)
}

/// Creates the tracing span an API call runs in
pub fn make_span_with_request_id(method: &str, path: &str, request_id: &RequestId) -> tracing::Span {
    tracing::info_span!(
        "api_request",
        method = %method,
        path = %path,
        request_id = %request_id,
    )
}
