//! The closed set of failure kinds and the shared `Error` handle.
//!
//! Every failure is one of five variants. `Error` wraps the variant in an
//! `Arc`, so cloning an `Error` hands out the same instance rather than a
//! copy; identity checks in [`crate::chain`] rely on that.

use lazy_static::lazy_static;
use serde::ser::SerializeStruct;
use serde::{Deserialize, Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;
use std::iter;
use std::mem;
use std::sync::Arc;
use thiserror::Error;

lazy_static! {
    // Stand-in swapped into a handle while its chain is being torn down.
    static ref DETACHED: Arc<ErrorKind> = Arc::new(ErrorKind::Plain(PlainError::new("detached")));
}

fn or_unspecified(text: &str) -> &str {
    if text.is_empty() {
        "unspecified error"
    } else {
        text
    }
}

fn with_context(context: &str, cause: &Error) -> String {
    if context.is_empty() {
        cause.to_string()
    } else {
        format!("{context}: {cause}")
    }
}

// =============================================================================
// Variants
// =============================================================================

/// A single input field failed a check.
#[derive(Error, Debug, Clone, Serialize)]
#[error("validation error on field '{field}': {}", or_unspecified(.message))]
pub struct ValidationError {
    field: String,
    message: String,
}

impl ValidationError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn field(&self) -> &str {
        &self.field
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

/// An operation against a storage dependency failed.
#[derive(Error, Debug, Clone, Serialize)]
#[error("database error during {operation} on table {table}: {cause}")]
pub struct DatabaseError {
    operation: String,
    table: String,
    #[source]
    #[serde(skip)]
    cause: Error,
}

impl DatabaseError {
    pub fn new(operation: impl Into<String>, table: impl Into<String>, cause: Error) -> Self {
        Self {
            operation: operation.into(),
            table: table.into(),
            cause,
        }
    }

    pub fn operation(&self) -> &str {
        &self.operation
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn cause(&self) -> &Error {
        &self.cause
    }
}

/// A value carried in an [`ApiError`]'s detail map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DetailValue {
    Bool(bool),
    Integer(i64),
    Float(f64),
    Text(String),
}

impl fmt::Display for DetailValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DetailValue::Bool(b) => write!(f, "{b}"),
            DetailValue::Integer(i) => write!(f, "{i}"),
            DetailValue::Float(x) => write!(f, "{x}"),
            DetailValue::Text(s) => write!(f, "{s}"),
        }
    }
}

impl From<bool> for DetailValue {
    fn from(value: bool) -> Self {
        DetailValue::Bool(value)
    }
}

impl From<i64> for DetailValue {
    fn from(value: i64) -> Self {
        DetailValue::Integer(value)
    }
}

impl From<i32> for DetailValue {
    fn from(value: i32) -> Self {
        DetailValue::Integer(i64::from(value))
    }
}

impl From<f64> for DetailValue {
    fn from(value: f64) -> Self {
        DetailValue::Float(value)
    }
}

impl From<&str> for DetailValue {
    fn from(value: &str) -> Self {
        DetailValue::Text(value.to_string())
    }
}

impl From<String> for DetailValue {
    fn from(value: String) -> Self {
        DetailValue::Text(value)
    }
}

/// A remote service answered with a failure status.
#[derive(Error, Debug, Clone, Serialize)]
#[error("API error {code}: {}", or_unspecified(.message))]
pub struct ApiError {
    code: i32,
    message: String,
    details: BTreeMap<String, DetailValue>,
}

impl ApiError {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            details: BTreeMap::new(),
        }
    }

    /// Attach a detail entry. A repeated key replaces the earlier value.
    pub fn with_detail(mut self, key: impl Into<String>, value: impl Into<DetailValue>) -> Self {
        self.details.insert(key.into(), value.into());
        self
    }

    pub fn code(&self) -> i32 {
        self.code
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn details(&self) -> &BTreeMap<String, DetailValue> {
        &self.details
    }

    pub fn detail(&self, key: &str) -> Option<&DetailValue> {
        self.details.get(key)
    }

    /// Check if the failure is worth retrying based on the status code.
    pub fn is_retryable(&self) -> bool {
        matches!(self.code, 429 | 500 | 502 | 503 | 504)
    }
}

/// Context describing the step that was running when `cause` happened.
#[derive(Error, Debug, Clone, Serialize)]
#[error("{}", with_context(.context, .cause))]
pub struct WrappedError {
    context: String,
    #[source]
    #[serde(skip)]
    cause: Error,
}

impl WrappedError {
    pub fn new(context: impl Into<String>, cause: Error) -> Self {
        Self {
            context: context.into(),
            cause,
        }
    }

    pub fn context(&self) -> &str {
        &self.context
    }

    pub fn cause(&self) -> &Error {
        &self.cause
    }
}

/// A failure with nothing but a message.
#[derive(Error, Debug, Clone, Serialize)]
#[error("{}", or_unspecified(.message))]
pub struct PlainError {
    message: String,
}

impl PlainError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Tag plus payload for every failure kind.
///
/// Serializes as a single node: the tag and the variant's own fields,
/// without its cause.
#[derive(Error, Debug, Clone, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ErrorKind {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Database(#[from] DatabaseError),
    #[error(transparent)]
    Api(#[from] ApiError),
    #[error(transparent)]
    Wrapped(#[from] WrappedError),
    #[error(transparent)]
    Plain(#[from] PlainError),
}

impl ErrorKind {
    /// Short, stable name of the variant.
    pub fn name(&self) -> &'static str {
        match self {
            ErrorKind::Validation(_) => "validation",
            ErrorKind::Database(_) => "database",
            ErrorKind::Api(_) => "api",
            ErrorKind::Wrapped(_) => "wrapped",
            ErrorKind::Plain(_) => "plain",
        }
    }

    pub fn cause(&self) -> Option<&Error> {
        match self {
            ErrorKind::Database(e) => Some(e.cause()),
            ErrorKind::Wrapped(e) => Some(e.cause()),
            ErrorKind::Validation(_) | ErrorKind::Api(_) | ErrorKind::Plain(_) => None,
        }
    }
}

// =============================================================================
// Shared handle
// =============================================================================

/// An immutable failure value.
///
/// Clones share one allocation and therefore one identity. Two errors built
/// by separate constructor calls are never the same instance, even when
/// every field matches.
///
/// Formatting, serializing and dropping walk the chain in a loop, so the
/// wrap depth is bounded by memory rather than by the call stack.
#[derive(Clone)]
pub struct Error {
    inner: Arc<ErrorKind>,
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub fn new(kind: ErrorKind) -> Self {
        Self {
            inner: Arc::new(kind),
        }
    }

    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        ValidationError::new(field, message).into()
    }

    pub fn database(operation: impl Into<String>, table: impl Into<String>, cause: Error) -> Self {
        DatabaseError::new(operation, table, cause).into()
    }

    pub fn api(code: i32, message: impl Into<String>) -> Self {
        ApiError::new(code, message).into()
    }

    pub fn plain(message: impl Into<String>) -> Self {
        PlainError::new(message).into()
    }

    pub fn kind(&self) -> &ErrorKind {
        &self.inner
    }

    /// Human-readable message, including every cause below this node.
    pub fn message(&self) -> String {
        self.to_string()
    }

    /// The error this one directly wraps, if its variant carries a cause.
    pub fn cause(&self) -> Option<&Error> {
        self.inner.cause()
    }

    /// Every node from `self` to the root, with no depth limit.
    fn layers(&self) -> impl Iterator<Item = &Error> {
        iter::successors(Some(self), |err| err.cause())
    }

    /// True when both handles point at the same instance.
    pub fn same_instance(&self, other: &Error) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for node in self.layers() {
            match node.kind() {
                ErrorKind::Wrapped(w) if w.context.is_empty() => {}
                ErrorKind::Wrapped(w) => write!(f, "{}: ", w.context)?,
                ErrorKind::Database(d) => write!(
                    f,
                    "database error during {} on table {}: ",
                    d.operation, d.table
                )?,
                leaf => fmt::Display::fmt(leaf, f)?,
            }
        }
        Ok(())
    }
}

impl fmt::Debug for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Error")
            .field("kind", &self.kind().name())
            .field("message", &self.to_string())
            .finish()
    }
}

impl Drop for Error {
    fn drop(&mut self) {
        let mut next = Arc::into_inner(mem::replace(&mut self.inner, DETACHED.clone()));
        while let Some(kind) = next {
            next = match kind {
                ErrorKind::Wrapped(mut w) => {
                    Arc::into_inner(mem::replace(&mut w.cause.inner, DETACHED.clone()))
                }
                ErrorKind::Database(mut d) => {
                    Arc::into_inner(mem::replace(&mut d.cause.inner, DETACHED.clone()))
                }
                ErrorKind::Validation(_) | ErrorKind::Api(_) | ErrorKind::Plain(_) => None,
            };
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.cause().map(|e| e as &(dyn std::error::Error + 'static))
    }
}

struct Layers<'a>(&'a Error);

impl Serialize for Layers<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_seq(self.0.layers().map(Error::kind))
    }
}

/// `{"message": ..., "chain": [node, ...]}`, outermost node first.
impl Serialize for Error {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("Error", 2)?;
        state.serialize_field("message", &self.to_string())?;
        state.serialize_field("chain", &Layers(self))?;
        state.end()
    }
}

impl From<ErrorKind> for Error {
    fn from(kind: ErrorKind) -> Self {
        Error::new(kind)
    }
}

macro_rules! impl_from_variant {
    ($($variant:ident),* $(,)?) => {
        $(
            impl From<$variant> for Error {
                fn from(err: $variant) -> Self {
                    Error::new(ErrorKind::from(err))
                }
            }
        )*
    };
}

impl_from_variant!(ValidationError, DatabaseError, ApiError, WrappedError, PlainError);

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn test_validation_message() {
        let err = Error::validation("email", "must contain @");
        let msg = err.message();
        assert!(msg.contains("email"));
        assert!(msg.contains("must contain @"));
        assert!(err.cause().is_none());
    }

    #[test]
    fn test_database_message_includes_cause() {
        let err = Error::database("SELECT", "users", Error::plain("connection refused"));
        let msg = err.message();
        assert!(msg.contains("SELECT"));
        assert!(msg.contains("users"));
        assert!(msg.contains("connection refused"));
        assert!(err.cause().is_some());
    }

    #[test]
    fn test_api_error_details_and_retry() {
        let api = ApiError::new(503, "service unavailable")
            .with_detail("retry_after", 30)
            .with_detail("endpoint", "/v1/users")
            .with_detail("degraded", true);
        assert_eq!(api.detail("retry_after"), Some(&DetailValue::Integer(30)));
        assert_eq!(api.detail("degraded"), Some(&DetailValue::Bool(true)));
        assert!(api.detail("missing").is_none());
        assert!(api.is_retryable());
        assert!(!ApiError::new(404, "missing").is_retryable());

        let keys: Vec<&str> = api.details().keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["degraded", "endpoint", "retry_after"]);

        let err: Error = api.into();
        assert_eq!(err.message(), "API error 503: service unavailable");
    }

    #[test]
    fn test_empty_fields_still_produce_message() {
        assert_eq!(Error::plain("").message(), "unspecified error");
        assert!(!Error::api(500, "").message().is_empty());
        assert!(!Error::validation("name", "").message().is_empty());

        let wrapped: Error = WrappedError::new("", Error::plain("boom")).into();
        assert_eq!(wrapped.message(), "boom");
    }

    #[test]
    fn test_source_follows_cause() {
        let root = Error::plain("disk full");
        let err: Error = WrappedError::new("saving report", root.clone()).into();
        let source = err.source().map(|s| s.to_string());
        assert_eq!(source.as_deref(), Some("disk full"));
        assert!(err.cause().map_or(false, |c| c.same_instance(&root)));
    }

    #[test]
    fn test_clone_shares_identity() {
        let a = Error::plain("x");
        let b = a.clone();
        let c = Error::plain("x");
        assert!(a.same_instance(&b));
        assert!(!a.same_instance(&c));
    }

    #[test]
    fn test_kind_names() {
        assert_eq!(Error::plain("x").kind().name(), "plain");
        assert_eq!(Error::api(1, "x").kind().name(), "api");
        assert_eq!(Error::validation("f", "x").kind().name(), "validation");
    }

    #[test]
    fn test_serialize_tagged_chain() {
        let err: Error = WrappedError::new(
            "loading user",
            Error::database("SELECT", "users", Error::plain("not found")),
        )
        .into();
        let value: serde_json::Value = serde_json::from_str(&err.to_json().unwrap()).unwrap();
        assert_eq!(
            value["message"],
            "loading user: database error during SELECT on table users: not found"
        );
        let chain = value["chain"].as_array().unwrap();
        assert_eq!(chain.len(), 3);
        assert_eq!(chain[0]["kind"], "wrapped");
        assert_eq!(chain[0]["context"], "loading user");
        assert!(chain[0].get("cause").is_none());
        assert_eq!(chain[1]["kind"], "database");
        assert_eq!(chain[1]["table"], "users");
        assert_eq!(chain[2]["kind"], "plain");
        assert_eq!(chain[2]["message"], "not found");
    }

    #[test]
    fn test_deep_chain_formats_serializes_and_drops() {
        let mut err = Error::plain("disk full");
        for i in 0..100_000 {
            err = if i % 2 == 0 {
                wrap_layer(format!("layer {i}"), err)
            } else {
                Error::database("UPDATE", "blocks", err)
            };
        }
        let msg = err.message();
        assert!(msg.starts_with("database error during UPDATE on table blocks: layer 99998: "));
        assert!(msg.ends_with("layer 0: disk full"));
        assert!(format!("{err:?}").contains("disk full"));

        let value: serde_json::Value = serde_json::from_str(&err.to_json().unwrap()).unwrap();
        assert_eq!(value["chain"].as_array().map(Vec::len), Some(100_001));
        drop(value);

        let shared = err.cause().cloned().unwrap();
        drop(err);
        assert!(shared.message().ends_with("disk full"));
        drop(shared);
    }

    fn wrap_layer(context: String, cause: Error) -> Error {
        WrappedError::new(context, cause).into()
    }

    #[test]
    fn test_detail_value_untagged_roundtrip() {
        let parsed: BTreeMap<String, DetailValue> =
            serde_json::from_str(r#"{"a": 1, "b": 2.5, "c": "x", "d": false}"#).unwrap();
        assert_eq!(parsed["a"], DetailValue::Integer(1));
        assert_eq!(parsed["b"], DetailValue::Float(2.5));
        assert_eq!(parsed["c"], DetailValue::Text("x".to_string()));
        assert_eq!(parsed["d"], DetailValue::Bool(false));
    }

    #[test]
    fn test_error_is_send_and_sync() {
        fn assert_send<T: Send>() {}
        fn assert_sync<T: Sync>() {}
        assert_send::<Error>();
        assert_sync::<Error>();
    }
}
