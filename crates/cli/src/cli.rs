//! Command-line surface of `pdbw`.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use pdbw_core::filter::SearchFilter;
use pdbw_core::ResourceKind;

#[derive(Parser, Debug)]
#[command(name = "pdbw")]
#[command(about = "Browse and edit the protein structure data warehouse")]
#[command(version)]
pub struct Cli {
    /// Backend base URL (overrides PDBW_API_URL)
    #[arg(long, global = true)]
    pub api_url: Option<String>,

    /// Session state file (overrides PDBW_STATE_FILE)
    #[arg(long, global = true)]
    pub state_file: Option<PathBuf>,

    /// Print JSON instead of tables
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// List one page of a resource
    List(ListArgs),
    /// Fetch one record by its key values
    Get {
        resource: ResourceKind,
        /// Key values in order (e.g. `1ABC HEM` for ligands)
        #[arg(required = true)]
        key: Vec<String>,
    },
    /// Create a record from field assignments
    Create {
        resource: ResourceKind,
        /// `field=value`, parsed by the field's type
        #[arg(long = "set", value_name = "FIELD=VALUE", value_parser = parse_assignment)]
        fields: Vec<(String, String)>,
    },
    /// Update a row shown by `list`
    Update {
        resource: ResourceKind,
        /// Row id as printed by `list`
        row_id: String,
        #[command(flatten)]
        page: PageArgs,
        #[arg(long = "set", value_name = "FIELD=VALUE", value_parser = parse_assignment, required = true)]
        fields: Vec<(String, String)>,
    },
    /// Delete a row shown by `list`
    Delete {
        resource: ResourceKind,
        row_id: String,
        #[command(flatten)]
        page: PageArgs,
        /// Confirm the deletion
        #[arg(long)]
        yes: bool,
    },
    /// Show the statistics payload of a resource
    Stats { resource: ResourceKind },
    /// Count the records of a resource
    Count { resource: ResourceKind },
    /// Search proteins, experiments and macromolecules at once
    Search {
        query: String,
        /// Open the N-th hit (1-based) and remember the search
        #[arg(long)]
        open: Option<usize>,
    },
    /// Structured search
    Find(FindArgs),
    /// Explore one structure and its related records
    Explore {
        pdb_id: String,
        /// Relationship to expand (e.g. `ligands`); all when omitted
        #[arg(long)]
        relation: Option<String>,
        /// Add a related row: `--add field=value` (repeatable)
        #[arg(long, value_name = "FIELD=VALUE", value_parser = parse_assignment, requires = "relation")]
        add: Vec<(String, String)>,
        /// Remove the related row with this id
        #[arg(long, requires = "relation", conflicts_with = "add")]
        remove: Option<String>,
    },
    /// External RCSB links for a structure
    Urls { pdb_id: String },
    /// Show or clear recent searches
    History {
        #[arg(long)]
        clear: bool,
    },
    /// Show the navigation entries for the current session
    Nav,
    Login {
        #[arg(long)]
        email: String,
        #[arg(long, env = "PDBW_PASSWORD", hide_env_values = true)]
        password: String,
    },
    Logout,
    Register {
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
        #[arg(long, env = "PDBW_PASSWORD", hide_env_values = true)]
        password: String,
        #[arg(long)]
        confirm_password: String,
    },
    ForgotPassword {
        #[arg(long)]
        email: String,
    },
    ResetPassword {
        #[arg(long)]
        token: String,
        #[arg(long, env = "PDBW_PASSWORD", hide_env_values = true)]
        password: String,
        #[arg(long)]
        confirm_password: String,
    },
    VerifyEmail {
        #[arg(long)]
        token: String,
    },
    /// Show the signed-in user
    Whoami,
    /// Show or change the colour mode
    Theme {
        #[arg(value_enum)]
        mode: Option<ThemeArg>,
    },
    /// Report changes another process made to the session file
    Sync,
}

#[derive(Args, Debug, Clone, Default, PartialEq)]
pub struct PageArgs {
    /// Zero-based page number
    #[arg(long, default_value_t = 0)]
    pub page: u32,
    #[arg(long)]
    pub page_size: Option<u32>,
    /// Server-side search text
    #[arg(long)]
    pub search: Option<String>,
}

#[derive(Args, Debug, Clone)]
pub struct ListArgs {
    pub resource: ResourceKind,
    #[command(flatten)]
    pub page: PageArgs,
    /// Sort the page by this field
    #[arg(long)]
    pub sort: Option<String>,
    #[arg(long, requires = "sort")]
    pub desc: bool,
    /// Keep rows whose field contains the text: `field=text`
    #[arg(long, value_parser = parse_assignment)]
    pub filter: Option<(String, String)>,
    /// Also render the page's plots
    #[arg(long)]
    pub plots: bool,
}

#[derive(Args, Debug, Clone, Default)]
pub struct FindArgs {
    #[arg(long)]
    pub keyword: Option<String>,
    #[arg(long)]
    pub organism: Option<String>,
    #[arg(long)]
    pub author: Option<String>,
    #[arg(long)]
    pub journal: Option<String>,
    #[arg(long)]
    pub resolution_min: Option<f64>,
    #[arg(long)]
    pub resolution_max: Option<f64>,
    #[arg(long)]
    pub chain_length_min: Option<i64>,
    #[arg(long)]
    pub chain_length_max: Option<i64>,
    #[arg(long)]
    pub year_from: Option<i32>,
    #[arg(long)]
    pub year_to: Option<i32>,
    #[arg(long)]
    pub has_ligands: Option<bool>,
    #[command(flatten)]
    pub page: PageArgs,
}

impl FindArgs {
    pub fn filter(&self) -> SearchFilter {
        SearchFilter {
            keyword: self.keyword.clone(),
            resolution_min: self.resolution_min,
            resolution_max: self.resolution_max,
            organism: self.organism.clone(),
            chain_length_min: self.chain_length_min,
            chain_length_max: self.chain_length_max,
            deposition_year_from: self.year_from,
            deposition_year_to: self.year_to,
            author: self.author.clone(),
            journal: self.journal.clone(),
            has_ligands: self.has_ligands,
        }
    }
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThemeArg {
    Light,
    Dark,
    Toggle,
}

fn parse_assignment(raw: &str) -> Result<(String, String), String> {
    match raw.split_once('=') {
        Some((field, value)) if !field.trim().is_empty() => {
            Ok((field.trim().to_string(), value.to_string()))
        }
        _ => Err(format!("expected FIELD=VALUE, got '{raw}'")),
    }
}
