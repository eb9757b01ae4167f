//! Error taxonomy for payload validation and style resolution.
//!
//! Graph errors reject the whole payload; the component logs them and keeps
//! rendering the empty state. Style errors are recoverable per value and
//! never abort a frame.

use thiserror::Error;

/// Errors raised while parsing and validating a graph payload.
#[derive(Debug, Error)]
pub enum GraphError {
	/// The payload was not valid JSON or did not match the expected shape.
	#[error("invalid graph payload: {0}")]
	Parse(#[from] serde_json::Error),
	/// Two nodes share the same identity.
	#[error("duplicate node id {0:?}")]
	DuplicateIdentity(String),
	/// A link endpoint does not resolve to any node.
	#[error("link references unknown node {0:?}")]
	DanglingLink(String),
}

/// Errors raised while resolving per-node visual styles.
#[derive(Debug, Error)]
pub enum StyleError {
	/// A color field value could not be parsed as a CSS color.
	#[error("invalid color value {0:?}")]
	InvalidColorValue(String),
}
