//! Outbound call descriptors.

use serde::Serialize;
use serde_json::Value;

use crate::error::{Error, InvalidInputError};
use crate::http::Method;

/// Description of one logical outbound call.
///
/// A descriptor names the target path, method, JSON body, whether the call
/// needs the stored access token, and an optional fallback payload. A
/// descriptor with a fallback is *degradable*: transport and server failures
/// are answered with the fallback instead of a failure envelope.
///
/// # Example
///
/// ```
/// use serde_json::json;
/// use tether_core::{Method, RequestDescriptor};
///
/// let descriptor = RequestDescriptor::get("/recommendations")
///     .with_fallback(json!({"recommendations": []}));
/// assert!(descriptor.is_degradable());
/// assert!(descriptor.requires_auth());
/// assert_eq!(descriptor.method(), Method::Get);
/// ```
#[derive(Debug, Clone)]
pub struct RequestDescriptor {
    method: Method,
    path: String,
    body: Option<Value>,
    requires_auth: bool,
    fallback: Option<Value>,
}

impl RequestDescriptor {
    /// Create an authenticated descriptor without body or fallback.
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            body: None,
            requires_auth: true,
            fallback: None,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::Get, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::Post, path)
    }

    pub fn put(path: impl Into<String>) -> Self {
        Self::new(Method::Put, path)
    }

    pub fn patch(path: impl Into<String>) -> Self {
        Self::new(Method::Patch, path)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::Delete, path)
    }

    /// Attach a JSON body.
    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    /// Attach a body serialized from any `Serialize` value.
    ///
    /// # Errors
    ///
    /// Returns an error if the value cannot be represented as JSON.
    pub fn with_json<B: Serialize>(self, body: &B) -> Result<Self, Error> {
        let value = serde_json::to_value(body).map_err(|e| InvalidInputError::Other {
            message: format!("request body is not serializable: {}", e),
        })?;
        Ok(self.with_body(value))
    }

    /// Mark the call as public: no access token is required or attached, and
    /// a 401 answer is reported as-is without a refresh attempt.
    pub fn public(mut self) -> Self {
        self.requires_auth = false;
        self
    }

    /// Declare a fallback payload, making the call degradable.
    pub fn with_fallback(mut self, fallback: Value) -> Self {
        self.fallback = Some(fallback);
        self
    }

    pub fn method(&self) -> Method {
        self.method
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn body(&self) -> Option<&Value> {
        self.body.as_ref()
    }

    pub fn requires_auth(&self) -> bool {
        self.requires_auth
    }

    pub fn fallback(&self) -> Option<&Value> {
        self.fallback.as_ref()
    }

    pub fn is_degradable(&self) -> bool {
        self.fallback.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn defaults_to_authenticated_non_degradable() {
        let descriptor = RequestDescriptor::put("/users/3/role");
        assert!(descriptor.requires_auth());
        assert!(!descriptor.is_degradable());
        assert!(descriptor.body().is_none());
    }

    #[test]
    fn public_descriptor() {
        let descriptor = RequestDescriptor::post("/auth/login").public();
        assert!(!descriptor.requires_auth());
    }

    #[test]
    fn serializes_typed_body() {
        #[derive(Serialize)]
        struct RoleUpdate<'a> {
            role: &'a str,
        }

        let descriptor = RequestDescriptor::put("/users/3/role")
            .with_json(&RoleUpdate { role: "admin" })
            .unwrap();
        assert_eq!(descriptor.body(), Some(&json!({"role": "admin"})));
    }
}
