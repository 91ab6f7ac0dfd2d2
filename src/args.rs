use clap::{Parser, Subcommand};

/// This is a topic board with ranked preference voting.
#[derive(Parser, Debug, Clone)]
#[clap(author, version, about, long_about = None)]
pub struct Args {
    /// (file path) The JSON file holding the board state. Defaults to
    /// talkrank.json in the current directory.
    #[clap(short, long, value_parser)]
    pub store: Option<String>,

    /// (token) The opaque voter token to act as. If not provided, a token is
    /// generated once and cached in a side file next to the store.
    #[clap(long, value_parser)]
    pub voter: Option<String>,

    // Other arguments
    /// If passed as an argument, will turn on verbose logging to the standard output.
    #[clap(long, takes_value = false)]
    pub verbose: bool,

    #[clap(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Propose a new topic.
    Add {
        /// Free-form description of the talk (at least 10 characters).
        #[clap(short, long, value_parser)]
        description: String,

        /// Short display summary (5 to 100 characters). Generated from the
        /// description when omitted.
        #[clap(short = 'm', long, value_parser)]
        summary: Option<String>,

        /// Display name of the proposer (at least 3 characters).
        #[clap(short, long, value_parser)]
        author: String,
    },

    /// Edit one of your own topics.
    Edit {
        /// Id of the topic to edit.
        #[clap(value_parser)]
        id: u64,

        #[clap(short, long, value_parser)]
        description: Option<String>,

        #[clap(short = 'm', long, value_parser)]
        summary: Option<String>,

        #[clap(short, long, value_parser)]
        author: Option<String>,
    },

    /// Delete one of your own topics, along with every vote cast on it.
    Remove {
        #[clap(value_parser)]
        id: u64,
    },

    /// Replace your whole ranking with the given topic ids, most preferred
    /// first. Topics left out of the list lose your vote.
    Rank {
        #[clap(required = true, value_parser)]
        ids: Vec<u64>,
    },

    /// Move a single topic to the given 1-based position in your ranking.
    Move {
        #[clap(value_parser)]
        id: u64,

        #[clap(value_parser)]
        position: u32,
    },

    /// Withdraw your vote on a single topic.
    Unrank {
        #[clap(value_parser)]
        id: u64,
    },

    /// Show the aggregate standings over all voters.
    Standings {
        /// (file path, 'stdout' or empty) If specified, the standings summary
        /// will be written in JSON format to the given location.
        #[clap(short, long, value_parser)]
        out: Option<String>,

        /// (file path) A reference file containing expected standings in JSON
        /// format. If provided, talkrank will check that the computed output
        /// matches the reference.
        #[clap(short, long, value_parser)]
        reference: Option<String>,
    },

    /// Show the standings reordered by your own ranking: your picks first,
    /// then everything else in aggregate order.
    Mine,

    /// List all proposed topics, newest first.
    Topics,
}
