//! Request Executor: the authenticated-request protocol.
//!
//! One logical call is driven through an explicit state machine:
//!
//! ```text
//! Unauthenticated ───────────────────────────────► Done(failure)
//! Sending ──2xx──► Done(success)
//!         ──401 (auth call)──► AwaitingRefresh ──ok──► Retrying ──► Done(*)
//!                                              ──err─► Done(failure), session cleared
//!         ──other / no response──► Done(failure)
//! ```
//!
//! `Retrying` can only move to `Done`, so a call issues at most one refresh
//! and one retry no matter what the retried request answers. Degradable
//! calls then pass through the fallback policy in [`fallback`].

mod fallback;
mod refresh;


use std::fmt;
use std::sync::Arc;

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio::sync::Mutex;
use tracing::{debug, instrument, trace, warn};
use uuid::Uuid;

use crate::config::ClientConfig;
use crate::envelope::{ErrorKind, ResponseEnvelope};
use crate::error::{ProtocolError, TransportError};
use crate::http::{HttpRequest, HttpResponse, Method, Transport};
use crate::request::RequestDescriptor;
use crate::session::CredentialManager;
use crate::tokens::AccessToken;

/// Issues requests on behalf of the current session.
///
/// Cheap to clone (clones share the transport, credentials and refresh
/// gate) and safe to use from concurrent tasks.
pub struct Executor<T> {
    inner: Arc<ExecutorInner<T>>,
}

struct ExecutorInner<T> {
    transport: T,
    config: ClientConfig,
    credentials: CredentialManager,
    // Held for the whole duration of a refresh so concurrent 401s share it.
    refresh_gate: Mutex<()>,
}

/// Progress of one logical call.
enum State {
    Unauthenticated,
    Sending { token: Option<AccessToken> },
    AwaitingRefresh { rejected: AccessToken },
    Retrying { token: AccessToken },
    Done(ResponseEnvelope),
}

impl<T: Transport> Executor<T> {
    pub fn new(transport: T, config: ClientConfig, credentials: CredentialManager) -> Self {
        Self {
            inner: Arc::new(ExecutorInner {
                transport,
                config,
                credentials,
                refresh_gate: Mutex::new(()),
            }),
        }
    }

    /// The credential manager this executor reads and updates.
    pub fn credentials(&self) -> &CredentialManager {
        &self.inner.credentials
    }

    pub fn config(&self) -> &ClientConfig {
        &self.inner.config
    }

    /// Execute a call and return its JSON envelope.
    #[instrument(
        skip(self, descriptor),
        fields(
            method = %descriptor.method(),
            path = descriptor.path(),
            request_id = %Uuid::new_v4(),
        )
    )]
    pub async fn execute(&self, descriptor: &RequestDescriptor) -> ResponseEnvelope {
        let envelope = self.run(descriptor).await;
        fallback::apply(descriptor, envelope)
    }

    /// Execute a call and decode its payload into `U`.
    ///
    /// A successful body that does not decode counts as a failed request,
    /// so degradable calls answer it with their fallback.
    #[instrument(
        skip(self, descriptor),
        fields(
            method = %descriptor.method(),
            path = descriptor.path(),
            request_id = %Uuid::new_v4(),
        )
    )]
    pub async fn execute_as<U: DeserializeOwned>(
        &self,
        descriptor: &RequestDescriptor,
    ) -> ResponseEnvelope<U> {
        let envelope = self.run(descriptor).await.decode::<U>();
        fallback::apply(descriptor, envelope)
    }

    async fn run(&self, descriptor: &RequestDescriptor) -> ResponseEnvelope {
        let mut state = match self.initial_state(descriptor) {
            Ok(state) => state,
            Err(envelope) => return envelope,
        };

        loop {
            state = match state {
                State::Unauthenticated => {
                    debug!("No access token for protected call");
                    State::Done(ResponseEnvelope::unauthenticated())
                }

                State::Sending { token } => {
                    let request = self.build_request(descriptor, token.as_ref());
                    match self.dispatch(request).await {
                        Err(err) => State::Done(transport_failure(&err)),
                        Ok(response) if response.is_success() => {
                            State::Done(success(response))
                        }
                        Ok(response) if response.status == 401 => match token {
                            Some(rejected) if descriptor.requires_auth() => {
                                debug!("Access token rejected");
                                State::AwaitingRefresh { rejected }
                            }
                            _ => State::Done(request_failed(&response)),
                        },
                        Ok(response) => State::Done(request_failed(&response)),
                    }
                }

                State::AwaitingRefresh { rejected } => match self.renew(&rejected).await {
                    Ok(token) => State::Retrying { token },
                    Err(envelope) => State::Done(envelope),
                },

                State::Retrying { token } => {
                    debug!("Retrying with refreshed token");
                    let request = self.build_request(descriptor, Some(&token));
                    match self.dispatch(request).await {
                        Err(err) => State::Done(transport_failure(&err)),
                        Ok(response) if response.is_success() => {
                            State::Done(success(response))
                        }
                        Ok(response) if response.status == 401 => {
                            warn!("Refreshed token rejected; not refreshing again");
                            let error = ProtocolError::from_body(401, &response.body);
                            State::Done(ResponseEnvelope::failure(
                                ErrorKind::AuthenticationExpired,
                                401,
                                error.display_message(),
                            ))
                        }
                        Ok(response) => State::Done(request_failed(&response)),
                    }
                }

                State::Done(envelope) => return envelope,
            };
        }
    }

    fn initial_state(&self, descriptor: &RequestDescriptor) -> Result<State, ResponseEnvelope> {
        if !descriptor.requires_auth() {
            return Ok(State::Sending { token: None });
        }

        match self.inner.credentials.access_token() {
            Ok(Some(token)) => Ok(State::Sending { token: Some(token) }),
            Ok(None) => Ok(State::Unauthenticated),
            Err(err) => {
                warn!(error = %err, "Credential store unavailable");
                Err(ResponseEnvelope::store_failure(&err))
            }
        }
    }

    fn build_request(
        &self,
        descriptor: &RequestDescriptor,
        token: Option<&AccessToken>,
    ) -> HttpRequest {
        let mut headers = vec![
            ("Content-Type".to_string(), "application/json".to_string()),
            ("Accept".to_string(), "application/json".to_string()),
        ];
        if descriptor.requires_auth()
            && let Some(token) = token
        {
            headers.push(("Authorization".to_string(), token.bearer()));
        }

        HttpRequest {
            method: descriptor.method(),
            url: self.inner.config.base_url.endpoint(descriptor.path()),
            headers,
            body: descriptor.body().map(|b| b.to_string()),
        }
    }

    /// Build an unauthenticated JSON request for an internal endpoint.
    fn build_internal<B: Serialize>(
        &self,
        method: Method,
        path: &str,
        body: &B,
    ) -> Result<HttpRequest, serde_json::Error> {
        Ok(HttpRequest {
            method,
            url: self.inner.config.base_url.endpoint(path),
            headers: vec![
                ("Content-Type".to_string(), "application/json".to_string()),
                ("Accept".to_string(), "application/json".to_string()),
            ],
            body: Some(serde_json::to_string(body)?),
        })
    }

    /// Send one network leg, bounded by the configured timeout.
    async fn dispatch(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        let timeout = self.inner.config.timeout;
        trace!(?request, "Dispatching");

        match tokio::time::timeout(timeout, self.inner.transport.send(request)).await {
            Ok(Ok(response)) => {
                trace!(status = response.status, "Response received");
                Ok(response)
            }
            Ok(Err(err)) => Err(err),
            Err(_) => Err(TransportError::Timeout {
                duration_ms: u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX),
            }),
        }
    }
}

fn success(response: HttpResponse) -> ResponseEnvelope {
    ResponseEnvelope::success(response.status, parse_body(&response.body))
}

fn request_failed(response: &HttpResponse) -> ResponseEnvelope {
    let error = ProtocolError::from_body(response.status, &response.body);
    debug!(status = response.status, "Request failed");
    ResponseEnvelope::failure(
        ErrorKind::RequestFailed,
        response.status,
        error.display_message(),
    )
}

fn transport_failure(err: &TransportError) -> ResponseEnvelope {
    warn!(error = %err, "No response from server");
    ResponseEnvelope::transport_failure()
}

/// Empty bodies carry no data; non-JSON bodies are passed through as strings.
fn parse_body(body: &str) -> Option<Value> {
    if body.trim().is_empty() {
        return None;
    }
    Some(serde_json::from_str(body).unwrap_or_else(|_| Value::String(body.to_string())))
}

impl<T> Clone for Executor<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T> fmt::Debug for Executor<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Executor")
            .field("base_url", &self.inner.config.base_url)
            .field("timeout", &self.inner.config.timeout)
            .field("credentials", &self.inner.credentials)
            .finish()
    }
}
