use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tracing::{field, instrument, Span};

use crate::session::CredentialStore;
use crate::util::http::{InvalidUriError, Uri};

/// Cross-cutting outcomes the transport layer forces on the application
/// shell, regardless of which workflow issued the offending request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Interception {
    /// The backend replied 403: this network address is not permitted
    /// to use the system at all.
    AccessDenied,

    /// The backend replied 401: the credential is invalid or expired
    /// and has already been cleared.
    SessionExpired,
}

/// Errors that can occur while talking to the backend.
#[derive(Debug, Error)]
pub enum RequestError {
    /// Terminal: the originating network address is blocked.
    #[error("access denied from this network address")]
    AccessDenied,

    /// Terminal for the session: the credential was rejected.
    #[error("authentication failed")]
    Unauthorized,

    /// The backend rejected the request for a domain reason; `message`
    /// carries its error detail for local classification.
    #[error("server replied with status {status}: {message}")]
    Status { status: StatusCode, message: String },

    #[error(transparent)]
    Transport(#[from] reqwest::Error),

    #[error("invalid request URI: {0}")]
    Uri(#[from] InvalidUriError),
}

/// The two logical request channels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Channel {
    /// Anonymous requests
    Public,
    /// Requests that carry the session bearer token when one exists
    Credentialed,
}

/// Transport to the backend. Every request in the client flows through
/// [`Backend::send`], so the 403/401 policy is enforced on every call
/// site before any caller-local error handling.
#[derive(Clone)]
pub struct Backend {
    client: reqwest::Client,
    api_endpoint: Uri,
    timeout: Duration,
    credentials: Arc<CredentialStore>,
    interception_tx: UnboundedSender<Interception>,
}

impl Backend {
    pub fn new(
        api_endpoint: Uri,
        timeout: Duration,
        credentials: Arc<CredentialStore>,
    ) -> (Self, UnboundedReceiver<Interception>) {
        let (interception_tx, interception_rx) = mpsc::unbounded_channel();
        (
            Self {
                client: reqwest::Client::new(),
                api_endpoint,
                timeout,
                credentials,
                interception_tx,
            },
            interception_rx,
        )
    }

    #[instrument(skip_all, fields(method = %method, path = %path, status = field::Empty))]
    async fn send<P>(
        &self,
        channel: Channel,
        method: Method,
        path: &str,
        payload: Option<&P>,
    ) -> Result<reqwest::Response, RequestError>
    where
        P: Serialize + ?Sized,
    {
        let endpoint = Uri::from_parts(self.api_endpoint.clone(), path, None)?;
        let mut request = self
            .client
            .request(method, endpoint.to_string())
            .timeout(self.timeout);

        if channel == Channel::Credentialed {
            // With no stored token the request goes out unauthenticated
            // and the backend rejects it
            if let Some(token) = self.credentials.token().await {
                request = request.bearer_auth(token);
            }
        }

        if let Some(payload) = payload {
            request = request.json(payload);
        }

        let response = request.send().await?;
        let status = response.status();
        Span::current().record("status", status.as_u16());

        match status {
            status if status.is_success() => Ok(response),
            StatusCode::FORBIDDEN => {
                let _ = self.interception_tx.send(Interception::AccessDenied);
                Err(RequestError::AccessDenied)
            }
            StatusCode::UNAUTHORIZED => {
                // the credential is dropped at the transport, before
                // any caller-local error handling runs
                self.credentials.clear().await;
                let _ = self.interception_tx.send(Interception::SessionExpired);
                Err(RequestError::Unauthorized)
            }
            status => {
                let message = error_detail(response).await;
                Err(RequestError::Status { status, message })
            }
        }
    }

    pub async fn get<T>(&self, channel: Channel, path: &str) -> Result<T, RequestError>
    where
        T: DeserializeOwned,
    {
        let response = self.send::<()>(channel, Method::GET, path, None).await?;
        Ok(response.json().await?)
    }

    pub async fn post<P, T>(&self, channel: Channel, path: &str, payload: &P) -> Result<T, RequestError>
    where
        P: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let response = self.send(channel, Method::POST, path, Some(payload)).await?;
        Ok(response.json().await?)
    }

    /// POST where the response body is irrelevant.
    pub async fn post_unit<P>(&self, channel: Channel, path: &str, payload: &P) -> Result<(), RequestError>
    where
        P: Serialize + ?Sized,
    {
        self.send(channel, Method::POST, path, Some(payload)).await?;
        Ok(())
    }

    /// POST without a request body.
    pub async fn post_empty<T>(&self, channel: Channel, path: &str) -> Result<T, RequestError>
    where
        T: DeserializeOwned,
    {
        let response = self.send::<()>(channel, Method::POST, path, None).await?;
        Ok(response.json().await?)
    }

    pub async fn patch<P, T>(&self, channel: Channel, path: &str, payload: &P) -> Result<T, RequestError>
    where
        P: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let response = self.send(channel, Method::PATCH, path, Some(payload)).await?;
        Ok(response.json().await?)
    }

    pub async fn delete(&self, channel: Channel, path: &str) -> Result<(), RequestError> {
        self.send::<()>(channel, Method::DELETE, path, None).await?;
        Ok(())
    }
}

/// Pull the backend's error detail out of a failure response. Domain
/// errors carry `{"message": ...}`; fall back to the raw body.
async fn error_detail(response: reqwest::Response) -> String {
    let body = response.text().await.unwrap_or_default();
    serde_json::from_str::<serde_json::Value>(&body)
        .ok()
        .and_then(|value| {
            value
                .get("message")
                .and_then(|message| message.as_str())
                .map(String::from)
        })
        .unwrap_or(body)
}
