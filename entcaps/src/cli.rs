use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// entcaps - compute, verify and cache XMPP entity capabilities (XEP-0390)
#[derive(Parser, Debug)]
#[command(name = "entcaps")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Print machine-readable JSON instead of text
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Hash a disco#info profile and print its node identifiers and caps element
    Hash {
        /// disco#info <query/> document. Use "-" to read from stdin
        #[arg(value_name = "PROFILE_XML")]
        profile: String,

        /// Hash algorithm, repeatable (default: ENTCAPS_ALGORITHMS or sha-256)
        #[arg(long = "algo", value_name = "ALGO")]
        algorithms: Vec<String>,
    },

    /// Recompute every hash of a caps element over a profile and compare
    Verify {
        /// disco#info <query/> document. Use "-" to read from stdin
        #[arg(value_name = "PROFILE_XML")]
        profile: String,

        /// <c xmlns="urn:xmpp:caps"/> element
        #[arg(value_name = "CAPS_XML")]
        caps: String,
    },

    /// Inspect or modify the persistent caps cache
    Cache {
        /// Cache directory (default: ENTCAPS_CACHE_DIR)
        #[arg(long, value_name = "DIR", global = true)]
        dir: Option<PathBuf>,

        #[command(subcommand)]
        action: CacheAction,
    },
}

#[derive(Subcommand, Debug)]
pub enum CacheAction {
    /// Hash a profile and store it under each of its node identifiers
    Put {
        #[arg(value_name = "PROFILE_XML")]
        profile: String,

        /// Hash algorithm, repeatable (default: ENTCAPS_ALGORITHMS or sha-256)
        #[arg(long = "algo", value_name = "ALGO")]
        algorithms: Vec<String>,
    },

    /// Print the verified profile stored for a node identifier
    Get {
        #[arg(value_name = "NODE")]
        node: String,
    },

    /// List stored node identifiers
    List,

    /// Clear the cache; stored entries are only deleted with --persistent
    Clear {
        #[arg(long)]
        persistent: bool,
    },
}
