pub use crate::config::*;
use crate::{aggregate, personalize};

use log::warn;
use std::collections::HashSet;

/// A builder for assembling topics and rankings before aggregation.
///
/// The builder accepts each voter's ranking as an ordered list of topic ids,
/// most preferred first, and converts list positions into 1-based ranks.
/// This is the contract a reordering front end follows: on reorder, emit the
/// new id sequence and replace the voter's ranking wholesale.
///
/// ```
/// pub use rank_aggregation::{Builder, RankingRules, Topic, VoterId};
/// # use rank_aggregation::RankingErrors;
///
/// let topics = vec![Topic {
///     id: 1,
///     summary: "Crustacean update".to_string(),
///     description: "What the shells have been up to this year".to_string(),
///     author: "Anna".to_string(),
///     owner: VoterId::new("session-1"),
///     created_at: 10,
/// }];
///
/// let mut builder = Builder::new(&RankingRules::DEFAULT_RULES)?.topics(&topics)?;
/// builder.add_ranking(&VoterId::new("session-2"), &[1])?;
///
/// let standings = builder.standings()?;
/// assert_eq!(standings[0].vote_count, 1);
/// # Ok::<(), RankingErrors>(())
/// ```
pub struct Builder {
    pub(crate) _rules: RankingRules,
    pub(crate) _topics: Vec<Topic>,
    pub(crate) _ballots: Vec<Ballot>,
}

impl Builder {
    pub fn new(rules: &RankingRules) -> Result<Builder, RankingErrors> {
        Ok(Builder {
            _rules: rules.clone(),
            _topics: Vec::new(),
            _ballots: Vec::new(),
        })
    }

    /// Registers the candidate set. Topic ids must be unique.
    pub fn topics(self, topics: &[Topic]) -> Result<Builder, RankingErrors> {
        let mut seen: HashSet<u64> = HashSet::new();
        for t in topics.iter() {
            if !seen.insert(t.id) {
                return Err(RankingErrors::DuplicateTopic(t.id));
            }
        }
        Ok(Builder {
            _rules: self._rules,
            _topics: topics.to_vec(),
            _ballots: self._ballots,
        })
    }

    /// Replaces this voter's ranking with the given topic ids, most
    /// preferred first.
    ///
    /// Any previous ballots from the voter are discarded first, so calling
    /// this twice with the same list is the same as calling it once. Ids not
    /// in the registered topic set are skipped.
    pub fn add_ranking(
        &mut self,
        voter: &VoterId,
        ordered_topics: &[u64],
    ) -> Result<(), RankingErrors> {
        let known: HashSet<u64> = self._topics.iter().map(|t| t.id).collect();
        self._ballots.retain(|b| b.voter != *voter);
        let mut rank: u32 = 0;
        let mut seen: HashSet<u64> = HashSet::new();
        for topic_id in ordered_topics.iter() {
            if !known.contains(topic_id) {
                warn!(
                    "add_ranking: voter {} listed unknown topic {}, skipping",
                    voter, topic_id
                );
                continue;
            }
            if !seen.insert(*topic_id) {
                continue;
            }
            rank += 1;
            self._ballots.push(Ballot {
                voter: voter.clone(),
                topic_id: *topic_id,
                rank,
            });
        }
        Ok(())
    }

    /// Adds a single raw ballot. Mostly useful for replaying stored data.
    pub fn add_ballot(&mut self, ballot: &Ballot) -> Result<(), RankingErrors> {
        self._ballots.push(ballot.clone());
        Ok(())
    }

    /// Runs the aggregation over everything added so far.
    pub fn standings(&self) -> Result<Vec<TopicStanding>, RankingErrors> {
        aggregate(&self._topics, &self._ballots, &self._rules)
    }

    /// The personalized view for one voter, derived from the same aggregate
    /// computation.
    pub fn personal_standings(&self, voter: &VoterId) -> Result<Vec<TopicStanding>, RankingErrors> {
        let standings = self.standings()?;
        Ok(personalize(&standings, voter, &self._ballots))
    }
}
