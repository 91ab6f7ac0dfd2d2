use snafu::{ensure, OptionExt, ResultExt};

use crate::board::*;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use std::collections::HashSet;
use std::fs;
use std::path::Path;

/// A candidate topic as persisted on disk.
#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct TopicRecord {
    pub id: u64,
    pub description: String,
    pub summary: String,
    pub author: String,
    pub owner: String,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

/// One voter's placement of one topic, as persisted on disk.
#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct VoteRecord {
    pub voter: String,
    pub topic_id: u64,
    pub rank: u32,
    pub created_at: DateTime<Utc>,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct BoardState {
    pub next_topic_id: u64,
    pub topics: Vec<TopicRecord>,
    pub votes: Vec<VoteRecord>,
}

impl Default for BoardState {
    fn default() -> BoardState {
        BoardState {
            next_topic_id: 1,
            topics: Vec::new(),
            votes: Vec::new(),
        }
    }
}

/// The item and ballot store, backed by a single JSON document.
///
/// Every mutating call rewrites the document through a temp file renamed
/// over the store path, so a concurrent reader observes either the previous
/// state or the new one and never a half-replaced ballot set. Mutations
/// re-read the document first, so two processes acting for different voters
/// do not discard each other's commits; the remaining read-modify-write
/// window spans one mutation, not the process lifetime, and there is no
/// cross-process lock.
pub struct Store {
    path: std::path::PathBuf,
    state: BoardState,
}

fn load(path: &Path) -> BoardResult<BoardState> {
    if path.exists() {
        let display = path.display().to_string();
        let contents = fs::read_to_string(path).context(OpeningStoreSnafu {
            path: display.clone(),
        })?;
        serde_json::from_str(contents.as_str()).context(ParsingStoreSnafu { path: display })
    } else {
        debug!("store file {:?} not found, starting with an empty board", path);
        Ok(BoardState::default())
    }
}

impl Store {
    /// Opens the store at the given path. A missing file is an empty board.
    pub fn open(path: &Path) -> BoardResult<Store> {
        Ok(Store {
            path: path.to_path_buf(),
            state: load(path)?,
        })
    }

    // Picks up commits made by other handles since this one last touched
    // the file. Called at the start of every mutation.
    fn refresh(&mut self) -> BoardResult<()> {
        self.state = load(&self.path)?;
        Ok(())
    }

    fn commit(&self) -> BoardResult<()> {
        let display = self.path.display().to_string();
        let contents = serde_json::to_string_pretty(&self.state).context(EncodingStoreSnafu {
            path: display.clone(),
        })?;
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, contents).context(WritingStoreSnafu {
            path: tmp.display().to_string(),
        })?;
        fs::rename(&tmp, &self.path).context(WritingStoreSnafu { path: display })?;
        Ok(())
    }

    pub fn topics(&self) -> &[TopicRecord] {
        &self.state.topics
    }

    pub fn topic(&self, id: u64) -> Option<&TopicRecord> {
        self.state.topics.iter().find(|t| t.id == id)
    }

    /// Ids are monotonically assigned and never reused, even after deletes.
    pub fn add_topic(
        &mut self,
        description: &str,
        summary: &str,
        author: &str,
        owner: &str,
    ) -> BoardResult<TopicRecord> {
        self.refresh()?;
        let rec = TopicRecord {
            id: self.state.next_topic_id,
            description: description.to_string(),
            summary: summary.to_string(),
            author: author.to_string(),
            owner: owner.to_string(),
            created_at: Utc::now(),
            updated_at: None,
        };
        self.state.next_topic_id += 1;
        self.state.topics.push(rec.clone());
        self.commit()?;
        Ok(rec)
    }

    pub fn update_topic(
        &mut self,
        id: u64,
        owner: &str,
        description: &str,
        summary: &str,
        author: &str,
    ) -> BoardResult<TopicRecord> {
        self.refresh()?;
        let idx = self
            .state
            .topics
            .iter()
            .position(|t| t.id == id)
            .context(TopicNotFoundSnafu { id })?;
        ensure!(self.state.topics[idx].owner == owner, NotOwnerSnafu { id });
        {
            let t = &mut self.state.topics[idx];
            t.description = description.to_string();
            t.summary = summary.to_string();
            t.author = author.to_string();
            t.updated_at = Some(Utc::now());
        }
        self.commit()?;
        Ok(self.state.topics[idx].clone())
    }

    /// Removes a topic and, in the same commit, every vote referencing it.
    pub fn remove_topic(&mut self, id: u64, owner: &str) -> BoardResult<()> {
        self.refresh()?;
        let rec = self.topic(id).context(TopicNotFoundSnafu { id })?;
        ensure!(rec.owner == owner, NotOwnerSnafu { id });
        self.state.topics.retain(|t| t.id != id);
        self.state.votes.retain(|v| v.topic_id != id);
        self.commit()
    }

    pub fn votes(&self) -> &[VoteRecord] {
        &self.state.votes
    }

    pub fn votes_for(&self, voter: &str) -> Vec<VoteRecord> {
        let mut res: Vec<VoteRecord> = self
            .state
            .votes
            .iter()
            .filter(|v| v.voter == voter)
            .cloned()
            .collect();
        res.sort_by_key(|v| v.rank);
        res
    }

    /// Replaces the voter's whole ballot set. The swap happens in memory and
    /// lands on disk in one commit, so no reader sees the set half-replaced.
    pub fn replace_votes(&mut self, voter: &str, ranking: &[(u64, u32)]) -> BoardResult<()> {
        self.refresh()?;
        let known: HashSet<u64> = self.state.topics.iter().map(|t| t.id).collect();
        self.state.votes.retain(|v| v.voter != voter);
        let now = Utc::now();
        for (topic_id, rank) in ranking.iter() {
            if *rank == 0 {
                warn!("replace_votes: zero rank for topic {}, skipping", topic_id);
                continue;
            }
            if !known.contains(topic_id) {
                warn!("replace_votes: unknown topic {}, skipping", topic_id);
                continue;
            }
            self.state.votes.push(VoteRecord {
                voter: voter.to_string(),
                topic_id: *topic_id,
                rank: *rank,
                created_at: now,
            });
        }
        self.commit()
    }

    /// Upserts a single placement, the one-topic reposition path.
    pub fn set_vote(&mut self, voter: &str, topic_id: u64, rank: u32) -> BoardResult<()> {
        self.refresh()?;
        ensure!(
            rank >= 1,
            InvalidFieldSnafu {
                field: "position",
                message: "must be at least 1".to_string(),
            }
        );
        ensure!(
            self.topic(topic_id).is_some(),
            TopicNotFoundSnafu { id: topic_id }
        );
        match self
            .state
            .votes
            .iter_mut()
            .find(|v| v.voter == voter && v.topic_id == topic_id)
        {
            Some(v) => v.rank = rank,
            None => self.state.votes.push(VoteRecord {
                voter: voter.to_string(),
                topic_id,
                rank,
                created_at: Utc::now(),
            }),
        }
        self.commit()
    }

    pub fn clear_vote(&mut self, voter: &str, topic_id: u64) -> BoardResult<()> {
        self.refresh()?;
        self.state
            .votes
            .retain(|v| !(v.voter == voter && v.topic_id == topic_id));
        self.commit()
    }
}

// Boundary conversions between the stored records and the aggregation
// library's plain types.

pub fn to_topic(rec: &TopicRecord) -> Topic {
    Topic {
        id: rec.id,
        summary: rec.summary.clone(),
        description: rec.description.clone(),
        author: rec.author.clone(),
        owner: VoterId::new(rec.owner.clone()),
        created_at: rec.created_at.timestamp_micros(),
    }
}

pub fn to_ballot(rec: &VoteRecord) -> Ballot {
    Ballot {
        voter: VoterId::new(rec.voter.clone()),
        topic_id: rec.topic_id,
        rank: rec.rank,
    }
}
