/// Unique poll ID, allocated sequentially.
pub type PollId = u32;
