//! Token refresh protocol.
//!
//! Refreshes are serialized by the executor's refresh gate. A caller that
//! was rejected with token `A` first checks, under the gate, whether `A` is
//! still the stored token: if a concurrent call already replaced it, the new
//! token is reused; if a concurrent refresh failed and cleared the session,
//! the call fails the same way. Only a caller that still sees `A` talks to
//! the refresh endpoint.

use tracing::{debug, info, instrument, warn};

use crate::endpoints::{AuthResponse, REFRESH, RefreshRequest};
use crate::envelope::ResponseEnvelope;
use crate::error::StoreError;
use crate::http::{Method, Transport};
use crate::tokens::AccessToken;

use super::Executor;

/// Status reported for every authentication-expired outcome.
const STATUS_UNAUTHORIZED: u16 = 401;

impl<T: Transport> Executor<T> {
    /// Obtain a usable token after `rejected` was refused with a 401.
    pub(super) async fn renew(
        &self,
        rejected: &AccessToken,
    ) -> Result<AccessToken, ResponseEnvelope> {
        let _gate = self.inner.refresh_gate.lock().await;

        match self.inner.credentials.access_token().map_err(store_failure)? {
            None => {
                debug!("Session cleared by a concurrent refresh");
                Err(ResponseEnvelope::session_expired(STATUS_UNAUTHORIZED))
            }
            Some(current) if current != *rejected => {
                debug!("Token already refreshed by a concurrent call");
                Ok(current)
            }
            Some(_) => self.refresh_locked().await,
        }
    }

    /// Force a token refresh.
    ///
    /// Fails with `Unauthenticated` when no session exists at all. On any
    /// refresh failure the session is cleared.
    #[instrument(skip(self))]
    pub async fn refresh(&self) -> ResponseEnvelope {
        let _gate = self.inner.refresh_gate.lock().await;

        match self.inner.credentials.is_authenticated() {
            Ok(false) if matches!(self.inner.credentials.refresh_token(), Ok(None)) => {
                return ResponseEnvelope::unauthenticated();
            }
            Err(err) => return store_failure(err),
            _ => {}
        }

        match self.refresh_locked().await {
            Ok(_) => ResponseEnvelope::success(200, None),
            Err(envelope) => envelope,
        }
    }

    /// Call the refresh endpoint and apply its outcome. Caller holds the gate.
    async fn refresh_locked(&self) -> Result<AccessToken, ResponseEnvelope> {
        let credentials = &self.inner.credentials;

        let Some(refresh_token) = credentials.refresh_token().map_err(store_failure)? else {
            warn!("No refresh token available");
            return Err(self.expire());
        };

        info!("Refreshing session");

        let body = RefreshRequest {
            refresh_token: refresh_token.as_str(),
        };
        let request = match self.build_internal(Method::Post, REFRESH, &body) {
            Ok(request) => request,
            Err(e) => {
                warn!(error = %e, "Could not encode refresh request");
                return Err(self.expire());
            }
        };

        let tokens = match self.dispatch(request).await {
            Ok(response) if response.is_success() => {
                match serde_json::from_str::<AuthResponse>(&response.body) {
                    Ok(parsed) => parsed.tokens.access().map(|a| (a, parsed.tokens.refresh())),
                    Err(e) => {
                        warn!(error = %e, "Malformed refresh response");
                        None
                    }
                }
            }
            Ok(response) => {
                warn!(status = response.status, "Refresh rejected");
                None
            }
            Err(err) => {
                warn!(error = %err, "Refresh request failed");
                None
            }
        };

        let Some((access_token, refresh_token)) = tokens else {
            return Err(self.expire());
        };

        credentials
            .set_session(access_token.clone(), refresh_token)
            .map_err(store_failure)?;

        debug!("Session refreshed successfully");
        Ok(access_token)
    }

    /// Clear the session after an unrecoverable refresh failure.
    fn expire(&self) -> ResponseEnvelope {
        match self.inner.credentials.clear_session() {
            Ok(()) => ResponseEnvelope::session_expired(STATUS_UNAUTHORIZED),
            Err(err) => store_failure(err),
        }
    }
}

fn store_failure(err: StoreError) -> ResponseEnvelope {
    warn!(error = %err, "Credential store unavailable");
    ResponseEnvelope::store_failure(&err)
}
