//! High-level API client.

use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use tracing::{debug, info, instrument, warn};

use tether_core::endpoints::{AuthResponse, CURRENT_USER, LOGIN, LOGOUT};
use tether_core::error::{Error, InvalidInputError, StoreError};
use tether_core::{
    ClientConfig, CredentialManager, Credentials, ErrorKind, Executor, RequestDescriptor,
    ResponseEnvelope, STATUS_NO_RESPONSE,
};

use crate::transport::ReqwestTransport;

/// Path of the recommendations feed.
pub const RECOMMENDATIONS: &str = "/recommendations";

/// Served by [`ApiClient::recommendations`] when the backend cannot answer.
pub fn fallback_recommendations() -> Value {
    json!({
        "recommendations": [
            {"id": "getting-started", "title": "Getting started", "score": 1.0},
            {"id": "account-security", "title": "Secure your account", "score": 0.9},
            {"id": "whats-new", "title": "What's new", "score": 0.8}
        ],
        "personalized": false
    })
}

/// Session-aware client for the backend API.
///
/// Wraps an [`Executor`] over [`ReqwestTransport`] and adds the
/// authentication flows and the typed operations the backend exposes.
#[derive(Debug, Clone)]
pub struct ApiClient {
    executor: Executor<ReqwestTransport>,
}

impl ApiClient {
    /// Create a client for `config`, reading and writing `credentials`.
    pub fn new(config: ClientConfig, credentials: CredentialManager) -> Result<Self, Error> {
        let transport = ReqwestTransport::new(&config)?;
        Ok(Self {
            executor: Executor::new(transport, config, credentials),
        })
    }

    pub fn executor(&self) -> &Executor<ReqwestTransport> {
        &self.executor
    }

    pub fn credentials(&self) -> &CredentialManager {
        self.executor.credentials()
    }

    /// Exchange email and password for a session.
    ///
    /// The response must carry both tokens. On success the session is
    /// stored, the returned user is cached, and the envelope's data is that
    /// user (never the tokens).
    #[instrument(skip(self, credentials), fields(email = credentials.email()))]
    pub async fn login(&self, credentials: &Credentials) -> ResponseEnvelope {
        let descriptor = match RequestDescriptor::post(LOGIN).public().with_json(credentials) {
            Ok(descriptor) => descriptor,
            Err(e) => return invalid_input(e),
        };

        let envelope = self.executor.execute(&descriptor).await;
        if !envelope.is_success() {
            return envelope;
        }

        let status = envelope.status();
        let auth = match envelope.decode::<AuthResponse>().into_data() {
            Some(auth) => auth,
            None => return missing_tokens(status),
        };

        let (Some(access_token), Some(refresh_token)) = (auth.tokens.access(), auth.tokens.refresh())
        else {
            return missing_tokens(status);
        };

        let credentials = self.credentials();
        if let Err(e) = credentials.set_session(access_token, Some(refresh_token)) {
            return store_failure(e);
        }
        let identity = match &auth.user {
            Some(user) => credentials.set_identity(user),
            None => credentials.clear_identity(),
        };
        if let Err(e) = identity {
            return store_failure(e);
        }

        info!("Logged in");
        ResponseEnvelope::success(status, auth.user)
    }

    /// End the session.
    ///
    /// The local session is cleared whatever the server answers. A server
    /// failure is still reported once the tokens are gone.
    #[instrument(skip(self))]
    pub async fn logout(&self) -> ResponseEnvelope {
        let server = match self.credentials().is_authenticated() {
            Ok(true) => Some(
                self.executor
                    .execute(&RequestDescriptor::post(LOGOUT))
                    .await,
            ),
            Ok(false) => {
                debug!("No active session");
                None
            }
            Err(e) => return store_failure(e),
        };

        if let Err(e) = self.credentials().clear_session() {
            return store_failure(e);
        }

        match server {
            Some(envelope) if !envelope.is_success() => {
                warn!(
                    status = envelope.status(),
                    error = envelope.error().unwrap_or_default(),
                    "Server-side logout failed"
                );
                envelope
            }
            Some(envelope) => ResponseEnvelope::success(envelope.status(), None),
            None => ResponseEnvelope::success(STATUS_NO_RESPONSE, None),
        }
    }

    /// Fetch the signed-in user's profile and cache it.
    #[instrument(skip(self))]
    pub async fn current_user(&self) -> ResponseEnvelope {
        let envelope = self
            .executor
            .execute(&RequestDescriptor::get(CURRENT_USER))
            .await;

        if let Some(user) = envelope.data()
            && let Err(e) = self.credentials().set_identity(user)
        {
            return store_failure(e);
        }
        envelope
    }

    /// Personalized recommendations.
    ///
    /// Degradable: server and network failures are answered with
    /// [`fallback_recommendations`].
    #[instrument(skip(self))]
    pub async fn recommendations(&self) -> ResponseEnvelope {
        let descriptor =
            RequestDescriptor::get(RECOMMENDATIONS).with_fallback(fallback_recommendations());
        self.executor.execute(&descriptor).await
    }

    /// Change a user's role. Failures always surface.
    #[instrument(skip(self))]
    pub async fn update_user_role(&self, user_id: &str, role: &str) -> ResponseEnvelope {
        if user_id.is_empty() || user_id.contains(['/', '?', '#']) {
            return invalid_input(Error::InvalidInput(InvalidInputError::Path {
                value: user_id.to_string(),
                reason: "user id must be a single path segment".to_string(),
            }));
        }

        let descriptor = RequestDescriptor::put(format!("/users/{}/role", user_id))
            .with_body(json!({ "role": role }));
        self.executor.execute(&descriptor).await
    }

    /// Execute an arbitrary call.
    pub async fn execute(&self, descriptor: &RequestDescriptor) -> ResponseEnvelope {
        self.executor.execute(descriptor).await
    }

    /// Execute an arbitrary call and decode its payload.
    pub async fn execute_as<U: DeserializeOwned>(
        &self,
        descriptor: &RequestDescriptor,
    ) -> ResponseEnvelope<U> {
        self.executor.execute_as(descriptor).await
    }

    /// Force a token refresh.
    pub async fn refresh(&self) -> ResponseEnvelope {
        self.executor.refresh().await
    }
}

fn missing_tokens(status: u16) -> ResponseEnvelope {
    warn!(status, "Login response without a token pair");
    ResponseEnvelope::failure(
        ErrorKind::RequestFailed,
        status,
        "Login response did not include both tokens",
    )
}

fn store_failure(err: StoreError) -> ResponseEnvelope {
    warn!(error = %err, "Credential store unavailable");
    ResponseEnvelope::failure(ErrorKind::Store, STATUS_NO_RESPONSE, err.to_string())
}

fn invalid_input(err: Error) -> ResponseEnvelope {
    ResponseEnvelope::failure(ErrorKind::RequestFailed, STATUS_NO_RESPONSE, err.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fallback_is_deterministic() {
        assert_eq!(fallback_recommendations(), fallback_recommendations());
        assert_eq!(
            fallback_recommendations()["recommendations"]
                .as_array()
                .map(Vec::len),
            Some(3)
        );
    }

    #[tokio::test]
    async fn role_update_rejects_nested_ids() {
        let config = ClientConfig::new(tether_core::BaseUrl::new("http://localhost:1").unwrap());
        let client = ApiClient::new(config, CredentialManager::in_memory()).unwrap();

        let envelope = client.update_user_role("1/../2", "admin").await;
        assert!(!envelope.is_success());
        assert_eq!(envelope.status(), STATUS_NO_RESPONSE);
    }
}
