//! Quorum policy.
//!
//! A stage advances once strictly more than two thirds of the committee have
//! voted for it. With `n = 3f + 1` members this is `2f + 1` votes, so any two
//! quorums share at least one honest member.

/// Minimum distinct-sender votes needed for a committee of `committee_size`.
pub fn quorum_threshold(committee_size: usize) -> usize {
    committee_size * 2 / 3 + 1
}

/// Whether `vote_count` votes advance a stage for a committee of `committee_size`.
///
/// An empty committee never reaches quorum.
pub fn quorum_reached(vote_count: usize, committee_size: usize) -> bool {
    committee_size > 0 && vote_count >= quorum_threshold(committee_size)
}

/// Largest number of faulty members the committee tolerates.
pub fn max_faulty(committee_size: usize) -> usize {
    committee_size.saturating_sub(1) / 3
}
