//! Name resolution and type checking.
//!
//! The tree is walked once to build the scope arena and register one or
//! more rules per node. Rules are then evaluated by the [`reactor`] until
//! no more progress can be made. The result is a side table of facts
//! ([`type_checker::Annotations`]) keyed by node id, used by the
//! interpreter; the tree itself is never modified.

pub mod reactor;
pub mod scope;
pub mod type_checker;
pub mod types;

#[cfg(test)]
mod tests;
