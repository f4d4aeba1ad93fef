use std::fmt;

use uuid::Uuid;

macro_rules! uuid_id {
	($(#[$meta:meta])* $name:ident) => {
		$(#[$meta])*
		#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
		pub struct $name(Uuid);

		impl $name {
			/// Generates a fresh random identifier.
			pub fn new() -> Self {
				Self(Uuid::new_v4())
			}

			/// Wraps an existing identifier.
			pub const fn from_uuid(uuid: Uuid) -> Self {
				Self(uuid)
			}

			/// Returns the underlying UUID.
			pub const fn as_uuid(&self) -> Uuid {
				self.0
			}
		}

		impl Default for $name {
			fn default() -> Self {
				Self::new()
			}
		}

		impl From<Uuid> for $name {
			fn from(uuid: Uuid) -> Self {
				Self(uuid)
			}
		}

		impl fmt::Display for $name {
			fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
				fmt::Display::fmt(&self.0, f)
			}
		}
	};
}

uuid_id!(
	/// Stable identity of a [`crate::Page`], unchanged when the page is renumbered.
	PageId
);

uuid_id!(
	/// Identity of one [`crate::PagedInventory`].
	InventoryId
);

uuid_id!(
	/// Identity of a viewer, as reported by the host.
	ViewerId
);
