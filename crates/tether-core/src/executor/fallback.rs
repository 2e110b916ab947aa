//! Fallback policy for degradable calls.

use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::envelope::ResponseEnvelope;
use crate::request::RequestDescriptor;

/// Replace a maskable failure with the descriptor's fallback payload.
///
/// Successes, non-degradable calls, and authentication or store failures
/// pass through unchanged. The substituted envelope is flagged degraded.
pub(super) fn apply<U: DeserializeOwned>(
    descriptor: &RequestDescriptor,
    envelope: ResponseEnvelope<U>,
) -> ResponseEnvelope<U> {
    let (Some(fallback), Some(kind)) = (descriptor.fallback(), envelope.kind()) else {
        return envelope;
    };

    if !kind.is_maskable() {
        debug!(%kind, "Failure not maskable; fallback withheld");
        return envelope;
    }

    match serde_json::from_value::<U>(fallback.clone()) {
        Ok(data) => {
            warn!(
                %kind,
                status = envelope.status(),
                error = envelope.error().unwrap_or_default(),
                "Serving fallback payload"
            );
            ResponseEnvelope::fallback(envelope.status(), data)
        }
        Err(e) => {
            warn!(error = %e, "Fallback payload does not match the response type");
            envelope
        }
    }
}
