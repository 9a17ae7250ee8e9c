use clap::{Args as ClapArgs, Subcommand};

use crate::{
    items::Flag,
    tags::{TagMatch, TagSort},
};

#[derive(ClapArgs, Debug, Clone)]
pub struct FlagArgs {
    /// Item flag to read or write. Defaults to `default_flag` from config.
    #[clap(short, long, value_enum)]
    pub flag: Option<Flag>,
}

#[derive(Subcommand, Debug, Clone)]
pub enum QueryArgs {
    /// Check a query without evaluating it
    Validate {
        /// e.g. "tag:wood AND NOT tag:broken"
        #[clap(allow_hyphen_values = true)]
        query: String,
    },
    /// Evaluate a query against a tag list or an item's tags
    Eval {
        #[clap(allow_hyphen_values = true)]
        query: String,

        /// Comma separated tags to test against
        #[clap(short = 'g', long, conflicts_with = "item")]
        tags: Option<String>,

        /// Item whose tags to test against
        #[clap(short, long)]
        item: Option<String>,
    },
}

#[derive(Subcommand, Debug, Clone)]
pub enum ItemArgs {
    /// Add an item to the scene
    Add {
        id: String,

        /// Comma separated tags
        #[clap(short = 'g', long)]
        tags: Option<String>,
    },
    /// List items, optionally filtered by a query
    List {
        #[clap(short, long, allow_hyphen_values = true)]
        query: Option<String>,
    },
    /// Remove items from the scene
    Remove {
        #[clap(required = true)]
        ids: Vec<String>,
    },
}

#[derive(ClapArgs, Debug, Clone)]
pub struct PaletteArgs {
    /// Tags to select by (comma separated or repeated)
    #[clap(required = true)]
    pub tags: Vec<String>,

    /// Select items carrying any or all of the tags
    #[clap(short, long = "match", value_enum, default_value = "any")]
    pub mode: TagMatch,

    #[clap(flatten)]
    pub flag: FlagArgs,
}

#[derive(ClapArgs, Debug, Clone)]
pub struct SelectArgs {
    /// Tags to select by (comma separated or repeated)
    #[clap(required = true)]
    pub tags: Vec<String>,

    /// Select items carrying any or all of the tags
    #[clap(short, long = "match", value_enum, default_value = "any")]
    pub mode: TagMatch,
}

#[derive(Subcommand, Debug, Clone)]
pub enum TagArgs {
    /// Add a tag to items
    Add {
        tag: String,
        #[clap(required = true)]
        ids: Vec<String>,
    },
    /// Remove a tag from items
    Remove {
        tag: String,
        #[clap(required = true)]
        ids: Vec<String>,
    },
    /// List tags in use with their item counts
    List {
        /// Defaults to `tag_sort` from config
        #[clap(short, long, value_enum)]
        sort: Option<TagSort>,
    },
    /// Set a flag on items carrying the tags
    Show(PaletteArgs),
    /// Clear a flag on items carrying the tags
    Hide(PaletteArgs),
    /// Toggle a flag on items carrying the tags
    Toggle(PaletteArgs),
    /// Select exactly the items carrying the tags, deselecting the rest
    Select(SelectArgs),
}

#[derive(ClapArgs, Debug, Clone)]
pub struct ViewsFlagArgs {
    /// View ids or names
    #[clap(required = true)]
    pub views: Vec<String>,

    #[clap(flatten)]
    pub flag: FlagArgs,
}

#[derive(Subcommand, Debug, Clone)]
pub enum ViewArgs {
    /// Create a view
    Create {
        name: String,

        /// Tag query; omit for a membership-only view
        #[clap(short, long, allow_hyphen_values = true)]
        query: Option<String>,
    },
    /// List views with their resolved member counts
    List {},
    /// Rename a view
    Rename { view: String, name: String },
    /// Replace a view's query. An empty query makes it membership only.
    Query {
        view: String,
        #[clap(allow_hyphen_values = true)]
        query: String,
    },
    /// Delete views and strip their membership from every item
    Delete {
        #[clap(required = true)]
        views: Vec<String>,
    },
    /// Add items as explicit members
    Add {
        view: String,
        #[clap(required = true)]
        ids: Vec<String>,
    },
    /// Remove explicit membership from items
    Remove {
        view: String,
        #[clap(required = true)]
        ids: Vec<String>,
    },
    /// Remove every explicit member
    Clear { view: String },
    /// Print the resolved items of views
    Resolve {
        #[clap(required = true)]
        views: Vec<String>,
    },
    /// Print the aggregate flag state of views
    State(ViewsFlagArgs),
    /// Toggle a flag on everything the views resolve to
    Toggle(ViewsFlagArgs),
    /// Set a flag on everything the views resolve to
    Show(ViewsFlagArgs),
    /// Clear a flag on everything the views resolve to
    Hide(ViewsFlagArgs),
}
