//! CLI argument definitions using clap

use std::path::PathBuf;

use clap::{ArgAction, Parser, Subcommand, ValueHint};

/// Mind maps in the terminal: build node trees, color branches, export JSON
#[derive(Parser, Debug)]
#[command(name = "mindtree")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Verbosity: -d info, -dd debug, -ddd trace
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub debug: u8,

    /// Map directory (overrides config and MINDTREE_DATA_DIR)
    #[arg(long, global = true, value_hint = ValueHint::DirPath)]
    pub data_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create a map with a single root node
    New {
        /// Map name (also the root text)
        name: String,
    },

    /// List stored maps, most recent first
    List,

    /// Print a map as a colored tree
    Show {
        /// Map id, id prefix or name
        map: String,
        /// Also print node ids
        #[arg(long)]
        ids: bool,
    },

    /// Add a child node (last child of PARENT)
    Add {
        /// Map id, id prefix or name
        map: String,
        /// Parent node id
        parent: String,
        /// Node text
        text: String,
    },

    /// Add a sibling next to NODE (a child when NODE is the root)
    Sibling {
        /// Map id, id prefix or name
        map: String,
        /// Node id
        node: String,
        /// Node text
        text: String,
    },

    /// Delete a node and its whole subtree
    Rm {
        /// Map id, id prefix or name
        map: String,
        /// Node id
        node: String,
    },

    /// Move a node under a new parent
    Mv {
        /// Map id, id prefix or name
        map: String,
        /// Node id
        node: String,
        /// New parent node id
        parent: String,
    },

    /// Change node text, position or collapsed state
    Edit {
        /// Map id, id prefix or name
        map: String,
        /// Node id
        node: String,
        #[arg(long)]
        text: Option<String>,
        #[arg(long, allow_hyphen_values = true, requires = "y")]
        x: Option<f64>,
        #[arg(long, allow_hyphen_values = true, requires = "x")]
        y: Option<f64>,
        /// Hide the node's children
        #[arg(long, conflicts_with = "expand")]
        collapse: bool,
        /// Show the node's children
        #[arg(long)]
        expand: bool,
    },

    /// Rename a map
    Rename {
        /// Map id, id prefix or name
        map: String,
        /// New name
        name: String,
    },

    /// Copy a map under a new id
    Duplicate {
        /// Map id, id prefix or name
        map: String,
    },

    /// Delete a map
    Delete {
        /// Map id, id prefix or name
        map: String,
    },

    /// Export a map as JSON
    Export {
        /// Map id, id prefix or name
        map: String,
        /// Output file (default: stdout)
        #[arg(short, long, value_hint = ValueHint::FilePath)]
        output: Option<PathBuf>,
    },

    /// Import a JSON export as a new map
    Import {
        /// JSON file
        #[arg(value_hint = ValueHint::FilePath)]
        file: PathBuf,
        /// Name for the imported map
        #[arg(long)]
        name: Option<String>,
    },

    /// Manage settings
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },

    /// Generate shell completions
    Completion {
        /// Shell type
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Show merged config
    Show,

    /// Create global config template
    Init {
        /// Overwrite an existing file
        #[arg(short, long)]
        force: bool,
    },

    /// Show config paths
    Path,
}
