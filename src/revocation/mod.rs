pub mod store;
pub mod sweeper;

pub use store::{RevocationEntry, RevocationStore};
pub use sweeper::{RevocationSweeper, SweeperHandle};
