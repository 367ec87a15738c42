//! Compare mode: per-cluster state, the actions that mutate it, the views the
//! renderer reads, and spawning split chats out of a cluster.

pub mod controller;
pub mod links;
pub mod spawner;
pub mod store;
pub mod view;

pub use controller::{CompareController, SelectionOutcome, SubmittedTurn};
pub use links::{ParentLink, ParentLinks};
pub use spawner::{BranchError, BranchRequest, BranchSeed, BranchSpawner, BulkSplitReport};
pub use store::{ClusterState, ClusterStore};
pub use view::{ClusterView, DisplayMode, ReplyView};
