// ********* Input data structures ***********

use std::error::Error;
use std::fmt::Display;

/// An opaque voter identifier.
///
/// This is a stable handle correlating one client's actions across requests.
/// It carries no authentication semantics and the library never inspects its
/// content beyond equality.
#[derive(Eq, PartialEq, Debug, Clone, Hash, PartialOrd, Ord)]
pub struct VoterId(String);

impl VoterId {
    pub fn new(token: impl Into<String>) -> VoterId {
        VoterId(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for VoterId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A candidate entry on the board.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct Topic {
    /// Unique and stable. Assigned at creation, never reused.
    pub id: u64,
    /// Short display summary.
    pub summary: String,
    /// Free-form description.
    pub description: String,
    /// Display name of the proposer.
    pub author: String,
    /// Voter identity of the creator. Only used for edit/delete
    /// authorization by callers, never by the aggregation itself.
    pub owner: VoterId,
    /// Creation time as a unix-epoch timestamp (callers pick the
    /// resolution). Used as the deterministic tie-break and as the default
    /// order for never-ranked topics.
    pub created_at: i64,
}

/// One voter's placement of one topic.
///
/// A ballot has no identity beyond the (voter, topic_id) pair. Ranks within
/// one voter's ballot set need not be contiguous; they are only compared
/// against that voter's other ranks.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct Ballot {
    pub voter: VoterId,
    pub topic_id: u64,
    /// 1 is the most preferred. A rank of zero is structurally invalid and
    /// such ballots are dropped during aggregation.
    pub rank: u32,
}

// ******** Output data structures *********

/// The aggregate outcome for one topic.
#[derive(Debug, Clone, PartialEq)]
pub struct TopicStanding {
    pub topic: Topic,
    /// Sum of the points awarded by every voter who ranked this topic.
    pub total_score: f64,
    /// The per-method average: `total_score / vote_count` for
    /// [`ScoreMethod::BordaAverage`], `total_score` over the number of
    /// voters with a valid ballot for [`ScoreMethod::MeanNormalized`], and
    /// 0.0 when nobody ranked the topic. A zero here is a display value:
    /// ordering treats a topic with `vote_count == 0` as scoreless, not as
    /// scoring zero.
    pub average_score: f64,
    /// Number of distinct voters who ranked this topic.
    pub vote_count: u32,
}

/// Errors that prevent the aggregation from completing.
///
/// Malformed ballots are not in this list on purpose: they are skipped with
/// a warning rather than failing the whole computation.
#[derive(Eq, PartialEq, Debug, Clone)]
pub enum RankingErrors {
    /// Two topics in the input carry the same id.
    DuplicateTopic(u64),
}

impl Error for RankingErrors {}

impl Display for RankingErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RankingErrors::DuplicateTopic(id) => {
                write!(f, "duplicate topic id {} in aggregation input", id)
            }
        }
    }
}

// ********* Configuration **********

/// The scoring formula applied to every view.
///
/// The two variants satisfy the same qualitative invariants (more preferred
/// implies a higher score, unranked sorts below ranked). They are NOT
/// interchangeable per call: mixing them across views produces inconsistent
/// orderings, so callers pick one method once at the system boundary and
/// pass the same rules everywhere.
#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub enum ScoreMethod {
    /// A voter who ranked N topics awards `N + 1 - position` points to the
    /// topic at a given position, and a topic's score is the average of the
    /// points it received over the voters who ranked it.
    BordaAverage,
    /// A voter who ranked N topics awards `(N - position) / N`, a 0..1
    /// value. The average is taken over *all* voters with a valid ballot,
    /// not only those who ranked the topic, so non-rankers dilute the score.
    MeanNormalized,
}

#[derive(Eq, PartialEq, Debug, Clone)]
pub struct RankingRules {
    pub method: ScoreMethod,
}

impl RankingRules {
    pub const DEFAULT_RULES: RankingRules = RankingRules {
        method: ScoreMethod::BordaAverage,
    };
}
