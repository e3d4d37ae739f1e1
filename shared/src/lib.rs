//! Cross-cutting utilities shared by the identity, ingestion, and clinical
//! services.
//!
//! Deliberately small: the three services are independently deployable and
//! talk to each other over HTTP/JSON, so this crate holds only utilities
//! with no domain opinion — a base64url codec and the file-backed
//! append-store primitive — rather than a shared model layer.

pub mod b64url;
pub mod store;
