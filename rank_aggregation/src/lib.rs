mod builder;
mod config;
pub mod manual;

use log::{debug, info, warn};

use std::collections::{HashMap, HashSet};

pub use crate::builder::Builder;
pub use crate::config::*;

// **** Private structures ****

// One voter's cleaned ballot set: topic ids in preference order, after
// dropping invalid entries and deduplicating.
#[derive(Eq, PartialEq, Debug, Clone)]
struct Slate {
    ordered_topics: Vec<u64>,
}

impl Slate {
    // Invariant for the scoring step: positions are dense, 1..=len, whatever
    // the raw ranks looked like.
    fn from_ballots(voter: &VoterId, ballots: &mut Vec<&Ballot>) -> Option<Slate> {
        ballots.sort_by_key(|b| b.rank);
        let mut seen: HashSet<u64> = HashSet::new();
        let mut ordered_topics: Vec<u64> = Vec::new();
        for b in ballots.iter() {
            if seen.insert(b.topic_id) {
                ordered_topics.push(b.topic_id);
            } else {
                warn!(
                    "voter {} ranked topic {} more than once, keeping the best rank",
                    voter, b.topic_id
                );
            }
        }
        if ordered_topics.is_empty() {
            None
        } else {
            Some(Slate { ordered_topics })
        }
    }
}

/// Computes the aggregate standings for the given topics and ballots.
///
/// Arguments:
/// * `topics` the full candidate set
/// * `ballots` the full ballot set, all voters mixed together
/// * `rules` the scoring rules; callers pass the same rules to every view
///
/// Ballots with a zero rank or referencing an unknown topic are skipped with
/// a warning. Voters may have ranked different, overlapping or disjoint
/// subsets of the topics; a voter with no valid ballot contributes nothing.
/// With no ballots at all, every topic comes back with `vote_count == 0`,
/// ordered by recency.
///
/// The returned standings are sorted: topics with at least one vote first,
/// by average score descending, then every remaining tie (and the whole
/// unranked partition) by creation time descending.
pub fn aggregate(
    topics: &[Topic],
    ballots: &[Ballot],
    rules: &RankingRules,
) -> Result<Vec<TopicStanding>, RankingErrors> {
    info!(
        "aggregate: {} topics, {} ballots, rules: {:?}",
        topics.len(),
        ballots.len(),
        rules
    );

    let mut known_topics: HashSet<u64> = HashSet::new();
    for t in topics.iter() {
        if !known_topics.insert(t.id) {
            return Err(RankingErrors::DuplicateTopic(t.id));
        }
    }

    // Group the valid ballots by voter.
    let mut by_voter: HashMap<&VoterId, Vec<&Ballot>> = HashMap::new();
    for b in ballots.iter() {
        if b.rank == 0 {
            warn!("skipping zero-rank ballot from voter {}", b.voter);
            continue;
        }
        if !known_topics.contains(&b.topic_id) {
            warn!(
                "skipping ballot from voter {} for unknown topic {}",
                b.voter, b.topic_id
            );
            continue;
        }
        by_voter.entry(&b.voter).or_default().push(b);
    }
    debug!("aggregate: {} voters with valid ballots", by_voter.len());

    // Per topic: (sum of awarded points, distinct ranking voters).
    let mut tallies: HashMap<u64, (f64, u32)> = HashMap::new();
    // Voters with at least one valid ballot, the MeanNormalized denominator.
    let mut voter_count: u32 = 0;
    for (voter, mut voter_ballots) in by_voter {
        let slate = match Slate::from_ballots(voter, &mut voter_ballots) {
            Some(s) => s,
            None => continue,
        };
        voter_count += 1;
        let n = slate.ordered_topics.len();
        for (idx, topic_id) in slate.ordered_topics.iter().enumerate() {
            let position = idx + 1;
            let points = match rules.method {
                ScoreMethod::BordaAverage => (n + 1 - position) as f64,
                ScoreMethod::MeanNormalized => (n - position) as f64 / n as f64,
            };
            let entry = tallies.entry(*topic_id).or_insert((0.0, 0));
            entry.0 += points;
            entry.1 += 1;
        }
        debug!("aggregate: voter {} ranked {} topics", voter, n);
    }

    let mut standings: Vec<TopicStanding> = topics
        .iter()
        .map(|t| {
            let (total_score, vote_count) = tallies.get(&t.id).copied().unwrap_or((0.0, 0));
            // BordaAverage averages over the voters who ranked the topic;
            // MeanNormalized averages over every voter with a valid ballot,
            // so non-rankers dilute the score.
            let average_score = match rules.method {
                ScoreMethod::BordaAverage if vote_count > 0 => {
                    total_score / vote_count as f64
                }
                ScoreMethod::MeanNormalized if voter_count > 0 => {
                    total_score / voter_count as f64
                }
                _ => 0.0,
            };
            TopicStanding {
                topic: t.clone(),
                total_score,
                average_score,
                vote_count,
            }
        })
        .collect();

    standings.sort_by(|a, b| {
        let a_ranked = a.vote_count > 0;
        let b_ranked = b.vote_count > 0;
        b_ranked
            .cmp(&a_ranked)
            .then(b.average_score.total_cmp(&a.average_score))
            .then(b.topic.created_at.cmp(&a.topic.created_at))
            // Ids grow with creation order, so this settles topics created
            // within the same clock tick without contradicting recency.
            .then(b.topic.id.cmp(&a.topic.id))
    });
    Ok(standings)
}

/// Reorders aggregate standings into one voter's personal view.
///
/// The voter's own ranked topics come first, in their own rank order; the
/// topics they did not rank follow, keeping the global aggregate order. This
/// is a re-sort of the standings, not a second scoring formula.
pub fn personalize(
    standings: &[TopicStanding],
    voter: &VoterId,
    ballots: &[Ballot],
) -> Vec<TopicStanding> {
    let mut own_ranks: HashMap<u64, u32> = HashMap::new();
    for b in ballots.iter() {
        if b.rank == 0 || b.voter != *voter {
            continue;
        }
        let entry = own_ranks.entry(b.topic_id).or_insert(b.rank);
        if b.rank < *entry {
            *entry = b.rank;
        }
    }
    debug!(
        "personalize: voter {} ranked {} of {} topics",
        voter,
        own_ranks.len(),
        standings.len()
    );

    let mut res = standings.to_vec();
    // Unranked topics share the sentinel key; the stable sort keeps them in
    // aggregate order.
    res.sort_by_key(|s| own_ranks.get(&s.topic.id).copied().unwrap_or(u32::MAX));
    res
}
