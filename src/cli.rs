use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(name = "ado")]
#[command(
    author,
    version,
    about = "Azure DevOps CLI for work items, pull requests and builds",
    after_help = "Configuration: DEVOPS_PAT, ADO_COLLECTION_URL, ADO_PROJECT, ADO_REPO, ADO_INSECURE,\n\
                  ./ado.json, then $XDG_CONFIG_HOME/ado/config.json (or ~/.config/ado/config.json)."
)]
pub struct Cli {
    /// Log requests and config resolution to stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Interactive configuration wizard
    Init {
        /// Write ./ado.json for this directory instead of the global config
        #[arg(long)]
        local: bool,
    },

    /// Show the effective configuration and where each value comes from
    Config,

    #[command(flatten)]
    Api(ApiCommand),
}

/// Flat option tail handed to the per-command option parser.
#[derive(Args, Debug, Default)]
pub struct RawArgs {
    #[arg(trailing_var_arg = true, allow_hyphen_values = true, hide = true)]
    pub args: Vec<String>,
}

/// Commands that talk to Azure DevOps and need a resolved configuration.
#[derive(Subcommand)]
pub enum ApiCommand {
    /// Check connectivity by fetching the latest work item and pull request (default)
    Smoke,

    /// List repositories in the project
    Repos,

    /// List branches of a repository
    Branches { repo: Option<String> },

    /// Show a work item: workitem-get <id> [--raw] [--expand=all|fields|links|relations]
    WorkitemGet {
        id: String,
        #[command(flatten)]
        rest: RawArgs,
    },

    /// Recently changed work item ids: workitems-recent [top] [--tag=] [--type=] [--state=]
    WorkitemsRecent {
        #[command(flatten)]
        rest: RawArgs,
    },

    /// List comments: workitem-comments <id> [top] [--top=<n>] [--order=asc|desc]
    WorkitemComments {
        id: String,
        #[command(flatten)]
        rest: RawArgs,
    },

    /// Add a comment: workitem-comment-add <id> --text="..." [--file=path]
    WorkitemCommentAdd {
        id: String,
        #[command(flatten)]
        rest: RawArgs,
    },

    /// Edit a comment: workitem-comment-update <id> <commentId> --text="..." [--file=path]
    WorkitemCommentUpdate {
        id: String,
        comment_id: String,
        #[command(flatten)]
        rest: RawArgs,
    },

    /// List pull requests
    Prs {
        /// active, completed, abandoned or all
        status: Option<String>,
        #[arg(allow_negative_numbers = true)]
        top: Option<String>,
        repo: Option<String>,
    },

    /// Show a pull request
    PrGet { id: String, repo: Option<String> },

    /// Create a pull request: pr-create --title= --source= --target= [--description=] [--repo=] [--work-items=1,2]
    PrCreate {
        #[command(flatten)]
        rest: RawArgs,
    },

    /// Update a pull request: pr-update <id> [--title=] [--description=] [--repo=] [--work-items=1,2]
    PrUpdate {
        id: String,
        #[command(flatten)]
        rest: RawArgs,
    },

    /// Approve a pull request as its creator
    PrApprove { id: String, repo: Option<String> },

    /// Enable auto-complete, ignoring optional work item linking policies
    PrAutocomplete { id: String, repo: Option<String> },

    /// Cherry-pick a pull request: pr-cherry-pick <id> --target=<branch> [--topic=] [--repo=]
    PrCherryPick {
        #[command(flatten)]
        rest: RawArgs,
    },

    /// List recent builds
    Builds {
        #[arg(allow_negative_numbers = true)]
        top: Option<String>,
    },
}
