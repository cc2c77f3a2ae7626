mod poll;
pub use poll::PollId;

mod vote;
pub use vote::VoteRejection;
