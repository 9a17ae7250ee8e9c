use clap::{Parser, Subcommand};

mod errors;
mod handlers;
mod types;
mod validation;

pub use errors::{CliError, CliResult};
pub use handlers::*;
pub use types::*;

#[derive(Parser, Debug)]
#[command(version, about = "Tag-based views over scene items", long_about = None)]
pub struct Args {
    /// Log filter used when RUST_LOG is unset. Overrides `log_level` in config.
    #[clap(long, global = true)]
    pub log_level: Option<String>,

    /// Auto confirm destructive actions
    #[clap(short, long, global = true, default_value = "false")]
    pub yes: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Generate api docs in markdown format
    #[cfg(feature = "markdown-docs")]
    #[clap(hide = true)]
    MarkdownDocs {},

    /// Validate or evaluate tag queries
    Query {
        #[clap(subcommand)]
        action: QueryArgs,
    },
    /// Manage scene items
    Item {
        #[clap(subcommand)]
        action: ItemArgs,
    },
    /// Manage item tags and flag items by tag
    Tag {
        #[clap(subcommand)]
        action: TagArgs,
    },
    /// Manage views and apply flags through them
    View {
        #[clap(subcommand)]
        action: ViewArgs,
    },
}
