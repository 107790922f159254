//! State module for tracking work item progress
//!
//! Every work item moves through [`ItemState`] from `Pending` to either
//! `Done` or `Failed`. The run finishes only when every item is terminal.

mod item_state;

pub use item_state::{ItemState, StateTracker};
