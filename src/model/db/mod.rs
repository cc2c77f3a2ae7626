//! DB-compatible (e.g. de/serialisable) types.
//!
//! The types in this module are serialised in a DB-friendly way, e.g.:
//!
//! - IDs and datetimes are serialised in MongoDB's own format.

mod choice;
pub use choice::{Choice, ChoiceCore, NewChoice};

mod poll;
pub use poll::{Poll, PollCore};

mod user;
pub use user::{ensure_superuser_exists, NewUser, Superuser, User, UserCore};
#[cfg(test)]
pub use user::{EXAMPLE_PASSWORD, SUPERUSER_PASSWORD};

mod vote;
pub use vote::{NewVote, Vote, VoteCore};
