use thiserror::Error;

/// The ways a ballot can fail the eligibility checks.
///
/// Every variant is the client's fault, never a server fault; they all map to
/// a 403 response carrying [`VoteRejection::reason`] as the body.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Error)]
pub enum VoteRejection {
    #[error("the poll has been closed")]
    PollClosed,
    #[error("the poll is no longer open for voting")]
    PollNotOpen,
    #[error("the poll does not accept anonymous ballots")]
    PollNotAnonymous,
    #[error("the poll does not accept multiple choices")]
    PollNotMultiple,
    #[error("the user has already voted on this poll")]
    AlreadyVoted,
}

impl VoteRejection {
    /// The reason string reported to the client with the 403 response.
    pub fn reason(self) -> &'static str {
        match self {
            Self::AlreadyVoted => "already voted",
            _ => "not allowed",
        }
    }
}
