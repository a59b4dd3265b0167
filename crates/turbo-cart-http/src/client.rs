//! reqwest-backed [`CartTransport`].

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::header::{ACCEPT, COOKIE};
use reqwest::{Client, StatusCode};
use tracing::{debug, warn};
use turbo_cart::payload::{ServerCartPayload, ServerMutationAck};
use turbo_cart::{Mutation, Operation};
use turbo_cart_sync::{CartTransport, TransportError};

use crate::config::HttpTransportConfig;
use crate::token::{AntiForgeryToken, StaticToken};

/// Talks to the storefront's cart endpoints.
///
/// Mutations are form-encoded POSTs carrying the anti-forgery token both as
/// a form field and as a header. Refreshes are a plain GET.
#[derive(Clone)]
pub struct HttpCartTransport {
    client: Client,
    config: Arc<HttpTransportConfig>,
    token: Arc<dyn AntiForgeryToken>,
}

impl HttpCartTransport {
    pub fn new(config: HttpTransportConfig) -> Result<Self, TransportError> {
        let client = Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| TransportError::Connection(e.to_string()))?;
        let token = Arc::new(StaticToken::new(config.csrf_token.clone()));

        Ok(Self {
            client,
            config: Arc::new(config),
            token,
        })
    }

    /// Replace the token source.
    pub fn with_token(mut self, token: Arc<dyn AntiForgeryToken>) -> Self {
        self.token = token;
        self
    }

    pub fn config(&self) -> &HttpTransportConfig {
        &self.config
    }

    /// Path a mutation is posted to.
    pub fn endpoint(&self, mutation: &Mutation) -> &str {
        match mutation {
            Mutation::Add { .. } => &self.config.add_path,
            Mutation::Remove { .. } => &self.config.remove_path,
            Mutation::SetQuantity { .. } => &self.config.update_path,
        }
    }

    /// Form body for a mutation, token field included when one is known.
    pub fn form_fields(&self, mutation: &Mutation, token: Option<&str>) -> Vec<(String, String)> {
        let mut fields = vec![("product_id".to_string(), mutation.product_id().to_string())];
        match mutation {
            Mutation::Add { quantity, .. } => {
                fields.push(("quantity".to_string(), quantity.to_string()));
            }
            Mutation::Remove { .. } => {}
            Mutation::SetQuantity { delta, .. } => {
                fields.push(("action".to_string(), delta.action().to_string()));
            }
        }
        if let Some(token) = token {
            fields.push((self.config.csrf_field.clone(), token.to_string()));
        }
        fields
    }

    fn request(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        let builder = builder.header(ACCEPT, "application/json");
        match &self.config.session_cookie {
            Some(cookie) => builder.header(COOKIE, cookie),
            None => builder,
        }
    }

    fn send_error(&self, e: reqwest::Error) -> TransportError {
        if e.is_timeout() {
            TransportError::Timeout(self.config.request_timeout)
        } else {
            TransportError::Connection(e.to_string())
        }
    }
}

#[async_trait]
impl CartTransport for HttpCartTransport {
    async fn fetch_cart(&self) -> Result<ServerCartPayload, TransportError> {
        let url = self.config.url(&self.config.cart_path);
        debug!(url = %url, "fetching cart");

        let response = self
            .request(self.client.get(&url))
            .send()
            .await
            .map_err(|e| self.send_error(e))?;
        let status = response.status();
        let body = response.text().await.map_err(|e| self.send_error(e))?;

        decode_cart(status, &body)
    }

    async fn mutate(&self, operation: &Operation) -> Result<ServerMutationAck, TransportError> {
        let url = self.config.url(self.endpoint(&operation.mutation));
        let token = self.token.token();
        if token.is_none() {
            warn!(request_id = %operation.request_id, "no anti-forgery token; store may reject");
        }
        let fields = self.form_fields(&operation.mutation, token.as_deref());
        debug!(url = %url, request_id = %operation.request_id, mutation = %operation.mutation, "posting mutation");

        let mut builder = self.request(self.client.post(&url)).form(&fields);
        if let Some(token) = &token {
            builder = builder.header(self.config.csrf_header.as_str(), token.as_str());
        }

        let response = builder.send().await.map_err(|e| self.send_error(e))?;
        let status = response.status();
        let body = response.text().await.map_err(|e| self.send_error(e))?;

        decode_ack(status, &body)
    }
}

/// Interpret a refresh response.
pub fn decode_cart(status: StatusCode, body: &str) -> Result<ServerCartPayload, TransportError> {
    if !status.is_success() {
        return Err(http_error(status, body));
    }
    serde_json::from_str(body).map_err(|e| TransportError::InvalidPayload(e.to_string()))
}

/// Interpret a mutation response.
///
/// A 400 carrying an error ack is a refusal (e.g. out of stock), surfaced
/// as an ack so the engine reports it as a rejection. Other non-2xx
/// statuses are transport errors.
pub fn decode_ack(status: StatusCode, body: &str) -> Result<ServerMutationAck, TransportError> {
    if status == StatusCode::BAD_REQUEST {
        if let Ok(ack) = serde_json::from_str::<ServerMutationAck>(body) {
            if !ack.is_success() {
                return Ok(ack);
            }
        }
    }
    if !status.is_success() {
        return Err(http_error(status, body));
    }
    serde_json::from_str(body).map_err(|e| TransportError::InvalidPayload(e.to_string()))
}

fn http_error(status: StatusCode, body: &str) -> TransportError {
    let message = serde_json::from_str::<ServerMutationAck>(body)
        .ok()
        .and_then(|ack| ack.message)
        .unwrap_or_else(|| {
            status
                .canonical_reason()
                .unwrap_or("unexpected status")
                .to_string()
        });

    TransportError::Http {
        status: status.as_u16(),
        message,
    }
}
