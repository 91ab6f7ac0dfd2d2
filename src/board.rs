use log::{debug, info, warn};

use rank_aggregation::*;
use snafu::{prelude::*, Snafu};

use std::collections::HashSet;
use std::fs;
use std::path::PathBuf;

use serde_json::json;
use serde_json::Map as JSMap;
use serde_json::Value as JSValue;
use text_diff::print_diff;

use crate::args::{Args, Command};
use crate::board::store::{Store, TopicRecord};

pub mod session;
pub mod store;
pub mod text;

// The score method is chosen once, here. Every view (global standings,
// personal view, JSON summaries) goes through these rules: mixing methods
// across views produces inconsistent orderings.
const RULES: RankingRules = RankingRules::DEFAULT_RULES;

#[derive(Debug, Snafu)]
pub enum BoardError {
    #[snafu(display("Error opening store file {path}"))]
    OpeningStore {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Error parsing store file {path}"))]
    ParsingStore {
        source: serde_json::Error,
        path: String,
    },
    #[snafu(display("Error encoding store file {path}"))]
    EncodingStore {
        source: serde_json::Error,
        path: String,
    },
    #[snafu(display("Error writing store file {path}"))]
    WritingStore {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Error reading voter token file {path}"))]
    ReadingToken {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Error writing voter token file {path}"))]
    WritingToken {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Error writing summary file {path}"))]
    WritingSummary {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display(""))]
    OpeningReference { source: std::io::Error },
    #[snafu(display(""))]
    ParsingReference { source: serde_json::Error },

    #[snafu(display("No topic with id {id}"))]
    TopicNotFound { id: u64 },
    #[snafu(display("Topic {id} belongs to another voter"))]
    NotOwner { id: u64 },
    #[snafu(display("Invalid {field}: {message}"))]
    InvalidField {
        field: &'static str,
        message: String,
    },
    #[snafu(display("The ranking contains no known topic ids"))]
    EmptyRanking {},
    #[snafu(display("Aggregation failed"))]
    Aggregation { source: RankingErrors },

    #[snafu(whatever, display("{message}"))]
    Whatever {
        message: String,
        #[snafu(source(from(Box<dyn std::error::Error>, Some)))]
        source: Option<Box<dyn std::error::Error>>,
    },
}

pub type BoardResult<T> = Result<T, BoardError>;

pub fn run_command(args: &Args) -> BoardResult<()> {
    let store_path = PathBuf::from(
        args.store
            .clone()
            .unwrap_or_else(|| "talkrank.json".to_string()),
    );
    let mut store = Store::open(&store_path)?;
    let voter = VoterId::new(session::resolve_voter(args.voter.as_deref(), &store_path)?);
    debug!("run_command: acting as voter {}", voter);

    match &args.command {
        Command::Add {
            description,
            summary,
            author,
        } => cmd_add(&mut store, &voter, description, summary.as_deref(), author),
        Command::Edit {
            id,
            description,
            summary,
            author,
        } => cmd_edit(
            &mut store,
            &voter,
            *id,
            description.as_deref(),
            summary.as_deref(),
            author.as_deref(),
        ),
        Command::Remove { id } => cmd_remove(&mut store, &voter, *id),
        Command::Rank { ids } => cmd_rank(&mut store, &voter, ids),
        Command::Move { id, position } => cmd_move(&mut store, &voter, *id, *position),
        Command::Unrank { id } => cmd_unrank(&mut store, &voter, *id),
        Command::Standings { out, reference } => {
            cmd_standings(&store, out.as_deref(), reference.as_deref())
        }
        Command::Mine => cmd_mine(&store, &voter),
        Command::Topics => cmd_topics(&store, &voter),
    }
}

fn cmd_add(
    store: &mut Store,
    voter: &VoterId,
    description: &str,
    summary: Option<&str>,
    author: &str,
) -> BoardResult<()> {
    let summary = match summary {
        Some(s) => s.to_string(),
        None => text::generate_summary(description),
    };
    text::validate_topic(description, &summary, author)?;
    let rec = store.add_topic(description, &summary, author, voter.as_str())?;
    info!("created topic {} owned by {}", rec.id, voter);
    println!("Added topic {}: {}", rec.id, rec.summary);
    Ok(())
}

fn cmd_edit(
    store: &mut Store,
    voter: &VoterId,
    id: u64,
    description: Option<&str>,
    summary: Option<&str>,
    author: Option<&str>,
) -> BoardResult<()> {
    let current: TopicRecord = store
        .topic(id)
        .context(TopicNotFoundSnafu { id })?
        .clone();
    let description = description.unwrap_or(&current.description).to_string();
    let summary = summary.unwrap_or(&current.summary).to_string();
    let author = author.unwrap_or(&current.author).to_string();
    text::validate_topic(&description, &summary, &author)?;
    store.update_topic(id, voter.as_str(), &description, &summary, &author)?;
    println!("Updated topic {}", id);
    Ok(())
}

fn cmd_remove(store: &mut Store, voter: &VoterId, id: u64) -> BoardResult<()> {
    store.remove_topic(id, voter.as_str())?;
    println!("Removed topic {} and the votes cast on it", id);
    Ok(())
}

fn cmd_rank(store: &mut Store, voter: &VoterId, ids: &[u64]) -> BoardResult<()> {
    // List positions become 1-based ranks; unknown and repeated ids do not
    // consume a position.
    let mut ranking: Vec<(u64, u32)> = Vec::new();
    let mut seen: HashSet<u64> = HashSet::new();
    for id in ids.iter() {
        if store.topic(*id).is_none() {
            warn!("rank: unknown topic id {}, skipping", id);
            continue;
        }
        if !seen.insert(*id) {
            continue;
        }
        ranking.push((*id, (ranking.len() + 1) as u32));
    }
    ensure!(!ranking.is_empty(), EmptyRankingSnafu);
    store.replace_votes(voter.as_str(), &ranking)?;
    println!("Saved a ranking of {} topics", ranking.len());
    Ok(())
}

fn cmd_move(store: &mut Store, voter: &VoterId, id: u64, position: u32) -> BoardResult<()> {
    store.set_vote(voter.as_str(), id, position)?;
    println!("Moved topic {} to position {}", id, position);
    Ok(())
}

fn cmd_unrank(store: &mut Store, voter: &VoterId, id: u64) -> BoardResult<()> {
    store.clear_vote(voter.as_str(), id)?;
    println!("Withdrew your vote on topic {}", id);
    Ok(())
}

fn cmd_standings(store: &Store, out: Option<&str>, reference: Option<&str>) -> BoardResult<()> {
    let standings = compute_standings(store)?;
    print_standings(&standings);

    let summary_js = standings_to_json(&standings);
    let pretty_js_stats =
        serde_json::to_string_pretty(&summary_js).context(ParsingReferenceSnafu {})?;

    match out {
        Some("stdout") => println!("{}", pretty_js_stats),
        Some(path) => fs::write(path, &pretty_js_stats).context(WritingSummarySnafu { path })?,
        None => {}
    }

    // The reference summary, if provided for comparison.
    if let Some(reference_path) = reference {
        let reference_js = read_reference(reference_path)?;
        let pretty_js_reference =
            serde_json::to_string_pretty(&reference_js).context(ParsingReferenceSnafu {})?;
        if pretty_js_reference != pretty_js_stats {
            warn!("Found differences with the reference summary");
            print_diff(pretty_js_reference.as_str(), pretty_js_stats.as_ref(), "\n");
            whatever!("Difference detected between computed standings and reference summary");
        }
        println!("Standings match the reference summary");
    }
    Ok(())
}

fn cmd_mine(store: &Store, voter: &VoterId) -> BoardResult<()> {
    let standings = compute_standings(store)?;
    let ballots: Vec<Ballot> = store.votes().iter().map(store::to_ballot).collect();
    let personal = personalize(&standings, voter, &ballots);
    let own: HashSet<u64> = ballots
        .iter()
        .filter(|b| b.voter == *voter)
        .map(|b| b.topic_id)
        .collect();

    println!("{:>3}  {:>5}  {:>7}  {:>5}  topic", "#", "yours", "score", "votes");
    for (idx, s) in personal.iter().enumerate() {
        let yours = if own.contains(&s.topic.id) { "*" } else { "" };
        println!(
            "{:>3}  {:>5}  {:>7}  {:>5}  {} ({})",
            idx + 1,
            yours,
            format_score(s),
            s.vote_count,
            s.topic.summary,
            s.topic.author,
        );
    }
    Ok(())
}

fn cmd_topics(store: &Store, voter: &VoterId) -> BoardResult<()> {
    let mut topics: Vec<TopicRecord> = store.topics().to_vec();
    topics.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    for t in topics.iter() {
        let yours = if t.owner == voter.as_str() { " (yours)" } else { "" };
        println!(
            "{:>4}  {}  {} ({}){}",
            t.id,
            t.created_at.format("%Y-%m-%d"),
            t.summary,
            t.author,
            yours
        );
    }
    Ok(())
}

/// Runs the aggregation over the current store contents.
pub fn compute_standings(store: &Store) -> BoardResult<Vec<TopicStanding>> {
    let topics: Vec<Topic> = store.topics().iter().map(store::to_topic).collect();
    let ballots: Vec<Ballot> = store.votes().iter().map(store::to_ballot).collect();
    aggregate(&topics, &ballots, &RULES).context(AggregationSnafu {})
}

fn format_score(s: &TopicStanding) -> String {
    if s.vote_count > 0 {
        format!("{:.2}", s.average_score)
    } else {
        "-".to_string()
    }
}

fn print_standings(standings: &[TopicStanding]) {
    println!("{:>3}  {:>7}  {:>5}  topic", "#", "score", "votes");
    for (idx, s) in standings.iter().enumerate() {
        println!(
            "{:>3}  {:>7}  {:>5}  {} ({})",
            idx + 1,
            format_score(s),
            s.vote_count,
            s.topic.summary,
            s.topic.author,
        );
    }
}

fn method_label() -> &'static str {
    match RULES.method {
        ScoreMethod::BordaAverage => "bordaAverage",
        ScoreMethod::MeanNormalized => "meanNormalized",
    }
}

fn standings_to_json(standings: &[TopicStanding]) -> JSValue {
    let mut l: Vec<JSValue> = Vec::new();
    for (idx, s) in standings.iter().enumerate() {
        let mut entry: JSMap<String, JSValue> = JSMap::new();
        entry.insert("place".to_string(), json!(idx as u64 + 1));
        entry.insert("id".to_string(), json!(s.topic.id));
        entry.insert("summary".to_string(), json!(s.topic.summary));
        entry.insert("author".to_string(), json!(s.topic.author));
        entry.insert("voteCount".to_string(), json!(s.vote_count));
        // Scores are serialized as fixed-precision strings so reference
        // comparisons stay byte-stable.
        entry.insert(
            "averageScore".to_string(),
            json!(format!("{:.4}", s.average_score)),
        );
        entry.insert(
            "totalScore".to_string(),
            json!(format!("{:.4}", s.total_score)),
        );
        l.push(JSValue::Object(entry));
    }
    json!({ "method": method_label(), "standings": l })
}

fn read_reference(path: &str) -> BoardResult<JSValue> {
    let contents = fs::read_to_string(path).context(OpeningReferenceSnafu {})?;
    debug!("read reference content: {:?}", contents);
    serde_json::from_str(contents.as_str()).context(ParsingReferenceSnafu {})
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn temp_store(name: &str) -> PathBuf {
        let p = std::env::temp_dir().join(format!(
            "talkrank_board_{}_{}.json",
            std::process::id(),
            name
        ));
        let _ = fs::remove_file(&p);
        p
    }

    fn seed_three_topics(store: &mut Store) -> (u64, u64, u64) {
        let x = store
            .add_topic("a fine talk about crabs", "Crabs", "Anna", "owner-1")
            .unwrap();
        let y = store
            .add_topic("a fine talk about squids", "Squids", "Bob", "owner-1")
            .unwrap();
        let z = store
            .add_topic("a fine talk about eels", "Eels", "Cleo", "owner-2")
            .unwrap();
        (x.id, y.id, z.id)
    }

    #[test]
    fn standings_over_a_small_board() {
        let path = temp_store("standings");
        let mut store = Store::open(&path).unwrap();
        let (x, y, z) = seed_three_topics(&mut store);
        store
            .replace_votes("v-a", &[(x, 1), (y, 2), (z, 3)])
            .unwrap();
        store.replace_votes("v-b", &[(y, 1), (x, 2)]).unwrap();

        let standings = compute_standings(&store).unwrap();
        let find = |id: u64| standings.iter().find(|s| s.topic.id == id).unwrap();
        assert_eq!((find(x).total_score, find(x).vote_count), (4.0, 2));
        assert_eq!((find(y).total_score, find(y).vote_count), (4.0, 2));
        assert_eq!((find(z).total_score, find(z).vote_count), (1.0, 1));
        // x and y tie on average; y is the more recent topic.
        let order: Vec<u64> = standings.iter().map(|s| s.topic.id).collect();
        assert_eq!(order, vec![y, x, z]);
        let _ = fs::remove_file(&path);
    }

    #[test]
    fn removing_a_topic_cascades_to_its_votes() {
        let path = temp_store("cascade");
        let mut store = Store::open(&path).unwrap();
        let (x, y, _z) = seed_three_topics(&mut store);
        store.replace_votes("v-a", &[(x, 1), (y, 2)]).unwrap();

        store.remove_topic(x, "owner-1").unwrap();
        assert!(store.votes().iter().all(|v| v.topic_id != x));

        let standings = compute_standings(&store).unwrap();
        assert!(standings.iter().all(|s| s.topic.id != x));
        // y is now the voter's only ranked topic: one position, one point.
        let y_row = standings.iter().find(|s| s.topic.id == y).unwrap();
        assert_eq!((y_row.total_score, y_row.vote_count), (1.0, 1));
        let _ = fs::remove_file(&path);
    }

    #[test]
    fn only_the_owner_can_remove_a_topic() {
        let path = temp_store("owner");
        let mut store = Store::open(&path).unwrap();
        let (x, _y, _z) = seed_three_topics(&mut store);
        let res = store.remove_topic(x, "someone-else");
        assert!(matches!(res, Err(BoardError::NotOwner { id }) if id == x));
        assert!(store.topic(x).is_some());
        let _ = fs::remove_file(&path);
    }

    #[test]
    fn personal_view_puts_own_picks_first() {
        let path = temp_store("personal");
        let mut store = Store::open(&path).unwrap();
        let (x, y, z) = seed_three_topics(&mut store);
        store
            .replace_votes("v-a", &[(x, 1), (y, 2), (z, 3)])
            .unwrap();
        store.replace_votes("v-b", &[(z, 1)]).unwrap();

        let standings = compute_standings(&store).unwrap();
        let ballots: Vec<Ballot> = store.votes().iter().map(store::to_ballot).collect();
        let me = VoterId::new("v-b");
        let personal = personalize(&standings, &me, &ballots);
        assert_eq!(personal[0].topic.id, z);
        // The rest keeps the global aggregate order.
        let global_rest: Vec<u64> = standings
            .iter()
            .map(|s| s.topic.id)
            .filter(|id| *id != z)
            .collect();
        let personal_rest: Vec<u64> = personal[1..].iter().map(|s| s.topic.id).collect();
        assert_eq!(personal_rest, global_rest);
        let _ = fs::remove_file(&path);
    }

    #[test]
    fn standings_json_is_stable() {
        let path = temp_store("json");
        let mut store = Store::open(&path).unwrap();
        let (x, _y, _z) = seed_three_topics(&mut store);
        store.replace_votes("v-a", &[(x, 1)]).unwrap();

        let standings = compute_standings(&store).unwrap();
        let js = standings_to_json(&standings);
        assert_eq!(js["method"], json!("bordaAverage"));
        let rows = js["standings"].as_array().unwrap();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0]["id"], json!(x));
        assert_eq!(rows[0]["averageScore"], json!("1.0000"));
        assert_eq!(rows[0]["voteCount"], json!(1));
        let _ = fs::remove_file(&path);
    }
}
