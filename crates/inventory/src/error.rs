use thiserror::Error;

use crate::ids::ViewerId;

/// Failures reported by a [`crate::Host`] implementation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HostError {
	/// The viewer is no longer connected to the host.
	#[error("viewer {0} is offline")]
	ViewerOffline(ViewerId),
	/// A slot index fell outside the container.
	#[error("slot {slot} is outside a container of {size} slots")]
	SlotOutOfRange { slot: usize, size: usize },
	/// Host-specific failure with message.
	#[error("{0}")]
	Other(String),
}

/// Errors returned by [`crate::PagedInventory`] operations.
///
/// Absence (missing page, missing session, unset navigation slot) is never
/// an error; those paths return `None` or a no-op outcome instead.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PagedInventoryError {
	/// An argument was rejected before any state was mutated.
	#[error("invalid argument: {0}")]
	InvalidArgument(String),
	/// The host failed to carry out a command.
	#[error("host error: {0}")]
	Host(#[from] HostError),
}

pub type Result<T, E = PagedInventoryError> = std::result::Result<T, E>;
