//! HTTP transport to the node and name service, optionally through a proxy.
//!
//! # Responsibilities
//! - Perform GET/POST through an assigned proxy or a direct connection
//! - Normalize transport failures into `TransportError`
//! - Cache one HTTP client per proxy
//!
//! Retry policy is left to callers: resource reads, submissions and name
//! lookups each react differently to the same failure.

use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, Method, StatusCode};
use serde::de::DeserializeOwned;

use crate::blockchain::types::TransportError;
use crate::proxy::Proxy;

/// Content type announcing a BCS-encoded signed transaction.
pub const BCS_SIGNED_TRANSACTION: &str = "application/x.aptos.signed_transaction+bcs";

/// Request description handed to the gateway.
#[derive(Debug, Clone)]
pub struct GatewayRequest {
    pub method: Method,
    pub url: String,
    pub body: Option<(Vec<u8>, &'static str)>,
}

impl GatewayRequest {
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            method: Method::GET,
            url: url.into(),
            body: None,
        }
    }

    pub fn post(url: impl Into<String>, body: Vec<u8>, content_type: &'static str) -> Self {
        Self {
            method: Method::POST,
            url: url.into(),
            body: Some((body, content_type)),
        }
    }
}

/// Successful (status < 400) response.
#[derive(Debug, Clone)]
pub struct GatewayResponse {
    pub status: u16,
    pub body: String,
}

impl GatewayResponse {
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, TransportError> {
        serde_json::from_str(&self.body).map_err(|e| TransportError::Decode(e.to_string()))
    }
}

/// Thin HTTP transport. Cheap to clone; clones share the client cache.
#[derive(Clone)]
pub struct ChainGateway {
    direct: Client,
    proxied: Arc<DashMap<Proxy, Client>>,
    timeout: Duration,
}

impl ChainGateway {
    /// Create a gateway whose requests time out after `timeout`.
    pub fn new(timeout: Duration) -> Result<Self, TransportError> {
        let direct = Client::builder()
            .timeout(timeout)
            .no_proxy()
            .build()
            .map_err(|e| TransportError::Network(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self {
            direct,
            proxied: Arc::new(DashMap::new()),
            timeout,
        })
    }

    fn client_for(&self, proxy: Option<&Proxy>) -> Result<Client, TransportError> {
        let Some(proxy) = proxy else {
            return Ok(self.direct.clone());
        };
        if let Some(client) = self.proxied.get(proxy) {
            return Ok(client.clone());
        }

        let unreachable = |reason: String| TransportError::ProxyUnreachable {
            proxy: proxy.to_string(),
            reason,
        };
        let mut upstream = reqwest::Proxy::all(proxy.url()).map_err(|e| unreachable(e.to_string()))?;
        if let Some((user, password)) = proxy.credentials() {
            upstream = upstream.basic_auth(user, password);
        }
        let client = Client::builder()
            .timeout(self.timeout)
            .proxy(upstream)
            .build()
            .map_err(|e| unreachable(e.to_string()))?;
        self.proxied.insert(proxy.clone(), client.clone());
        Ok(client)
    }

    /// Execute a request and classify the outcome.
    pub async fn request(
        &self,
        request: GatewayRequest,
        proxy: Option<&Proxy>,
    ) -> Result<GatewayResponse, TransportError> {
        let url = reqwest::Url::parse(&request.url)
            .map_err(|e| TransportError::InvalidUrl(format!("{}: {}", request.url, e)))?;
        let client = self.client_for(proxy)?;

        let mut builder = client.request(request.method.clone(), url);
        if let Some((body, content_type)) = request.body {
            builder = builder.header(CONTENT_TYPE, content_type).body(body);
        }

        tracing::trace!(method = %request.method, url = %request.url, proxy = ?proxy, "Gateway request");

        let response = builder
            .send()
            .await
            .map_err(|e| classify_send_error(&e, proxy))?;
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| classify_send_error(&e, proxy))?;

        classify_status(status, body, &request.url, proxy)
    }

    pub async fn get(&self, url: &str, proxy: Option<&Proxy>) -> Result<GatewayResponse, TransportError> {
        self.request(GatewayRequest::get(url), proxy).await
    }

    /// POST a BCS-encoded signed transaction.
    pub async fn post_bcs(
        &self,
        url: &str,
        body: Vec<u8>,
        proxy: Option<&Proxy>,
    ) -> Result<GatewayResponse, TransportError> {
        self.request(GatewayRequest::post(url, body, BCS_SIGNED_TRANSACTION), proxy)
            .await
    }
}

impl std::fmt::Debug for ChainGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChainGateway")
            .field("timeout", &self.timeout)
            .field("cached_proxy_clients", &self.proxied.len())
            .finish()
    }
}

fn classify_send_error(error: &reqwest::Error, proxy: Option<&Proxy>) -> TransportError {
    let connectivity = error.is_connect() || error.is_timeout() || error.is_request();
    match proxy {
        Some(proxy) if connectivity => TransportError::ProxyUnreachable {
            proxy: proxy.to_string(),
            reason: error.to_string(),
        },
        _ if error.is_decode() || error.is_body() => TransportError::Decode(error.to_string()),
        _ => TransportError::Network(error.to_string()),
    }
}

fn classify_status(
    status: StatusCode,
    body: String,
    url: &str,
    proxy: Option<&Proxy>,
) -> Result<GatewayResponse, TransportError> {
    if status == StatusCode::PROXY_AUTHENTICATION_REQUIRED {
        if let Some(proxy) = proxy {
            return Err(TransportError::ProxyUnreachable {
                proxy: proxy.to_string(),
                reason: "proxy authentication required".to_string(),
            });
        }
    }
    if status == StatusCode::NOT_FOUND {
        return Err(TransportError::NotFound { url: url.to_string() });
    }
    if status.as_u16() >= 400 {
        return Err(TransportError::ServerError {
            status: status.as_u16(),
            body,
        });
    }
    Ok(GatewayResponse {
        status: status.as_u16(),
        body,
    })
}
