use std::fmt;
use std::sync::Arc;

use pinv_inventory::{Viewer, ViewerId};

/// A connected (or formerly connected) player.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Player {
	id: ViewerId,
	name: Arc<str>,
}

impl Player {
	pub(crate) fn new(name: &str) -> Self {
		Self {
			id: ViewerId::new(),
			name: Arc::from(name),
		}
	}

	pub fn name(&self) -> &str {
		&self.name
	}
}

impl Viewer for Player {
	fn id(&self) -> ViewerId {
		self.id
	}
}

impl fmt::Debug for Player {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "Player({} {})", self.name, self.id)
	}
}

impl fmt::Display for Player {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.name)
	}
}
