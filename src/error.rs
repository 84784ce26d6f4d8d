use crate::vnode::Key;
use thiserror::Error;

/// Anything that aborts a reconciliation pass.
///
/// The host tree may be left partially patched when this is returned. Retrying the same pass isn't safe.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ReconcileError {
	#[error("malformed tree: {0}")]
	MalformedTree(#[from] MalformedTree),

	#[error("host tree operation failed: {0}")]
	Host(#[from] HostError),

	#[error("depth limit of {0} reached")]
	DepthLimit(usize),
}

/// A virtual tree that can't be rendered as described.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum MalformedTree {
	#[error("invalid tag name {0:?}")]
	InvalidTag(String),

	#[error("duplicate key {0:?} among siblings")]
	DuplicateKey(Key),
}

/// A failed [`HostTree`](`crate::host::HostTree`) operation.
///
/// Node handles are stored as their `Debug` representation so this type stays independent of the host.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum HostError {
	#[error("unknown host node {0}")]
	UnknownNode(String),

	#[error("{child} is not a child of {parent}")]
	NotAChild { parent: String, child: String },

	#[error("{0} is not an element")]
	NotAnElement(String),

	#[error("inserting {child} into {parent} would create a cycle")]
	HierarchyRequest { parent: String, child: String },

	#[error("DOM call threw: {0}")]
	Js(String),
}
