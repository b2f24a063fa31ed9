//! The sweep-line implementation.
//!
//! The main entry point is [`Sweeper`], which walks the pre-sorted side
//! sequence of a [`crate::Frames`] arena event by event, maintaining a
//! [`BracketSet`] describing which frames are active at the sweep coordinate
//! and how deeply they nest.

mod bracket;
mod bracket_set;
mod sweeper;

pub use bracket::{Bracket, BracketRole};
pub use bracket_set::BracketSet;
pub use sweeper::{SweepState, Sweeper};
