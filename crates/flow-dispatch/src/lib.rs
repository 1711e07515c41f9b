//! Concrete [`BlockDispatcher`] implementations.
//!
//! [`ApiCallDispatcher`] is the primary path: it composes a URL from a
//! block's source template and the resolved path/query/header/body inputs,
//! issues the upstream HTTP call, and reports back whatever came over the
//! wire (success or not) so the engine can apply retry/timeout policy and
//! the output projector can read the response body. `transform` is an
//! identity passthrough, reserved for future local mapping logic; every
//! other block type is unsupported in this release.

use std::collections::HashMap;

use async_trait::async_trait;
use flow_core::dispatch::{BlockDispatcher, DispatchRequest, DispatchResponse};
use flow_core::errors::EngineError;
use flow_domain::{BlockInputSpec, BlockType, HttpMethod, InputLocation};
use percent_encoding::{utf8_percent_encode, NON_ALPHANUMERIC};
use serde_json::Value;

/// HTTP-backed dispatcher. One `reqwest::Client` is shared (and its
/// connection pool reused) across every block it dispatches.
pub struct ApiCallDispatcher {
    client: reqwest::Client,
}

impl ApiCallDispatcher {
    pub fn new() -> Self {
        Self { client: reqwest::Client::new() }
    }
}

impl Default for ApiCallDispatcher {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BlockDispatcher for ApiCallDispatcher {
    async fn dispatch(&self, request: DispatchRequest<'_>) -> Result<DispatchResponse, EngineError> {
        match request.block.block_type {
            BlockType::ApiCall => self.dispatch_api_call(request).await,
            // Reserved identity passthrough: outputs equal inputs,
            // wrapped as a synthetic 200 so the projector's JSONPath
            // evaluation works the same way it does for a real response.
            BlockType::Transform => {
                let body = Value::Object(request.params.into_iter().collect());
                Ok(DispatchResponse { status: 200, body, headers: HashMap::new() })
            }
            other => Err(EngineError::UnsupportedBlockType(format!("{other:?}"))),
        }
    }
}

impl ApiCallDispatcher {
    async fn dispatch_api_call(&self, request: DispatchRequest<'_>) -> Result<DispatchResponse, EngineError> {
        let block = request.block;
        let url = build_url(&block.source.server_url, &block.source.path, &block.inputs, &request.params)?;

        let mut builder = self.client.request(to_reqwest_method(block.source.method), url);

        let query: Vec<(String, String)> = block.inputs
                                                  .iter()
                                                  .filter(|i| i.location == InputLocation::Query)
                                                  .filter_map(|i| request.params.get(&i.name).map(|v| (i.name.clone(), value_to_string(v))))
                                                  .collect();
        if !query.is_empty() {
            builder = builder.query(&query);
        }

        let mut has_content_type = false;
        for input in block.inputs.iter().filter(|i| i.location == InputLocation::Header) {
            if let Some(value) = request.params.get(&input.name) {
                if input.name.eq_ignore_ascii_case("content-type") {
                    has_content_type = true;
                }
                builder = builder.header(input.name.as_str(), value_to_string(value));
            }
        }
        if !has_content_type {
            builder = builder.header("Content-Type", "application/json");
        }

        let body_inputs: Vec<&BlockInputSpec> = block.inputs.iter().filter(|i| i.location == InputLocation::Body).collect();
        if let [single] = body_inputs.as_slice() {
            if let Some(value) = request.params.get(&single.name) {
                builder = builder.json(value);
            }
        }

        let response = builder.send().await.map_err(|err| EngineError::Transport(err.to_string()))?;
        let status = response.status().as_u16();
        let headers: HashMap<String, String> = response.headers()
                                                         .iter()
                                                         .filter_map(|(name, value)| value.to_str().ok().map(|v| (name.as_str().to_string(), v.to_string())))
                                                         .collect();
        let bytes = response.bytes().await.map_err(|err| EngineError::Transport(err.to_string()))?;
        // Non-JSON bodies are kept as an opaque string rather
        // than failing the call outright.
        let body: Value = serde_json::from_slice(&bytes).unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()));

        if (200..300).contains(&status) {
            Ok(DispatchResponse { status, body, headers })
        } else {
            Err(EngineError::UpstreamHttpError { status, message: format!("upstream returned {status}"), body, headers })
        }
    }
}

/// Composes the final request URL: `serverUrl || "" + path`, with every
/// `{name}` placeholder replaced by its URL-encoded path input. An
/// unresolved placeholder is only an error when that input is required.
fn build_url(server_url: &Option<String>, path: &str, inputs: &[BlockInputSpec], params: &HashMap<String, Value>) -> Result<String, EngineError> {
    let mut url = format!("{}{}", server_url.clone().unwrap_or_default(), path);
    for input in inputs.iter().filter(|i| i.location == InputLocation::Path) {
        let placeholder = format!("{{{}}}", input.name);
        match params.get(&input.name) {
            Some(value) => {
                let encoded = utf8_percent_encode(&value_to_string(value), NON_ALPHANUMERIC).to_string();
                url = url.replace(&placeholder, &encoded);
            }
            None if input.required => return Err(EngineError::MissingPathParam(input.name.clone())),
            None => {}
        }
    }
    Ok(url)
}

fn to_reqwest_method(method: HttpMethod) -> reqwest::Method {
    match method {
        HttpMethod::Get => reqwest::Method::GET,
        HttpMethod::Post => reqwest::Method::POST,
        HttpMethod::Put => reqwest::Method::PUT,
        HttpMethod::Patch => reqwest::Method::PATCH,
        HttpMethod::Delete => reqwest::Method::DELETE,
    }
}

fn value_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flow_domain::{BlockDefinition, BlockOutputSpec, BlockSource};
    use serde_json::json;
    use uuid::Uuid;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn block_def(server_url: &str) -> BlockDefinition {
        BlockDefinition { id: Uuid::new_v4(),
                           name: "echo".into(),
                           block_type: BlockType::ApiCall,
                           source: BlockSource { operation_id: "echo".into(), path: "/echo/{id}".into(), method: HttpMethod::Get, server_url: Some(server_url.to_string()) },
                           inputs: vec![BlockInputSpec { name: "id".into(), location: InputLocation::Path, required: true }],
                           outputs: vec![BlockOutputSpec { name: "value".into(), path: "$.value".into() }] }
    }

    #[tokio::test]
    async fn successful_get_projects_response_body() {
        let server = MockServer::start().await;
        Mock::given(method("GET")).and(path("/echo/42")).respond_with(ResponseTemplate::new(200).set_body_json(json!({"value": "ok"}))).mount(&server).await;

        let dispatcher = ApiCallDispatcher::new();
        let block = block_def(&server.uri());
        let params = HashMap::from([("id".to_string(), json!(42))]);
        let request = DispatchRequest { block: &block, params, timeout: std::time::Duration::from_secs(5), retry_count: 0 };

        let response = dispatcher.dispatch(request).await.unwrap();
        assert_eq!(response.status, 200);
        assert_eq!(response.body, json!({"value": "ok"}));
    }

    #[tokio::test]
    async fn server_error_is_reported_as_upstream_http_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET")).and(path("/echo/1")).respond_with(ResponseTemplate::new(503)).mount(&server).await;

        let dispatcher = ApiCallDispatcher::new();
        let block = block_def(&server.uri());
        let params = HashMap::from([("id".to_string(), json!(1))]);
        let request = DispatchRequest { block: &block, params, timeout: std::time::Duration::from_secs(5), retry_count: 0 };

        let err = dispatcher.dispatch(request).await.unwrap_err();
        assert!(matches!(err, EngineError::UpstreamHttpError { status: 503, .. }));
        assert!(err.is_retryable());
    }

    #[tokio::test]
    async fn missing_required_path_param_is_rejected_before_any_call() {
        let dispatcher = ApiCallDispatcher::new();
        let block = block_def("http://127.0.0.1:1");
        let request = DispatchRequest { block: &block, params: HashMap::new(), timeout: std::time::Duration::from_secs(5), retry_count: 0 };

        let err = dispatcher.dispatch(request).await.unwrap_err();
        assert!(matches!(err, EngineError::MissingPathParam(name) if name == "id"));
    }
}
