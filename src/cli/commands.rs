//! CLI command definitions.
//!
//! Every operation on projects and ideas is reachable from here.

use super::output::OutputFormat;
use crate::core::idea::IdeaId;
use clap::{Args, Parser, Subcommand};

/// Thinktree CLI - capture thoughts, tag them and grow them into trees.
#[derive(Parser)]
#[command(name = "thinktree")]
#[command(
    version,
    about,
    long_about = "Capture ideas, tag them with #words, link them into trees and pick a trunk."
)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Output format
    #[arg(long, short = 'f', global = true, default_value = "table")]
    pub format: OutputFormat,

    /// Verbose output (debug logging on stderr)
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Top-level commands.
#[derive(Subcommand)]
pub enum Commands {
    /// Show version information
    Version,

    /// Project management commands
    #[command(subcommand)]
    Project(ProjectCommands),

    /// Idea capture and linking commands
    #[command(subcommand)]
    Idea(IdeaCommands),

    /// List every tag used in a project
    Tags(ProjectScope),

    /// Show the project as a laid-out forest of trees
    Tree(TreeArgs),

    /// Answer the guided questions and save them as a new trunk with branches
    Guided(GuidedArgs),
}

/// Project subcommands.
#[derive(Subcommand)]
pub enum ProjectCommands {
    /// List all projects
    List,

    /// Create a new project
    Create(ProjectCreateArgs),

    /// Rename a project
    Rename(ProjectRenameArgs),

    /// Delete a project and all its ideas
    Delete(ProjectDeleteArgs),
}

#[derive(Args)]
pub struct ProjectCreateArgs {
    /// Project name
    pub name: String,
}

#[derive(Args)]
pub struct ProjectRenameArgs {
    /// Project ID or name
    pub project: String,
    /// New name
    pub name: String,
}

#[derive(Args)]
pub struct ProjectDeleteArgs {
    /// Project ID or name
    pub project: String,
}

/// Selects the project an idea command works on.
#[derive(Args, Debug, Clone, Default)]
pub struct ProjectScope {
    /// Project ID or name (defaults to the first project)
    #[arg(long, short = 'p')]
    pub project: Option<String>,
}

/// Idea subcommands.
#[derive(Subcommand)]
pub enum IdeaCommands {
    /// Capture a new idea
    Add(IdeaAddArgs),

    /// List ideas, trunk first then newest
    List(IdeaListArgs),

    /// Show one idea
    Show(IdeaRefArgs),

    /// Replace the text of an idea
    Edit(IdeaEditArgs),

    /// Mark an idea as building on another
    Link(IdeaLinkArgs),

    /// Remove the builds-on link of an idea
    Unlink(IdeaRefArgs),

    /// Toggle the trunk designation of an idea
    Trunk(IdeaRefArgs),

    /// Delete an idea; ideas built on it become roots
    Delete(IdeaRefArgs),
}

#[derive(Args)]
pub struct IdeaAddArgs {
    #[command(flatten)]
    pub scope: ProjectScope,
    /// Idea text; `#words` become tags
    pub text: String,
}

#[derive(Args)]
pub struct IdeaListArgs {
    #[command(flatten)]
    pub scope: ProjectScope,
    /// Only show ideas with this tag
    #[arg(long, short = 't')]
    pub tag: Option<String>,
}

#[derive(Args)]
pub struct IdeaRefArgs {
    #[command(flatten)]
    pub scope: ProjectScope,
    /// Idea ID
    pub id: IdeaId,
}

#[derive(Args)]
pub struct IdeaEditArgs {
    #[command(flatten)]
    pub scope: ProjectScope,
    /// Idea ID
    pub id: IdeaId,
    /// New text
    pub text: String,
}

#[derive(Args)]
pub struct IdeaLinkArgs {
    #[command(flatten)]
    pub scope: ProjectScope,
    /// ID of the idea that builds on another
    pub child: IdeaId,
    /// ID of the idea it builds on
    pub parent: IdeaId,
}

#[derive(Args)]
pub struct TreeArgs {
    #[command(flatten)]
    pub scope: ProjectScope,
    /// Only lay out ideas with this tag
    #[arg(long, short = 't')]
    pub tag: Option<String>,
}

#[derive(Args)]
pub struct GuidedArgs {
    #[command(flatten)]
    pub scope: ProjectScope,
    /// One answer per question, in order; pass "" to skip a step
    #[arg(long = "answer", short = 'a', num_args = 1, allow_hyphen_values = true)]
    pub answers: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_idea_link_with_project() {
        let cli =
            Cli::try_parse_from(["thinktree", "-f", "json", "idea", "link", "2", "1", "-p", "work"])
                .unwrap();
        assert_eq!(cli.format, OutputFormat::Json);
        let Some(Commands::Idea(IdeaCommands::Link(args))) = cli.command else {
            panic!("expected idea link");
        };
        assert_eq!(args.child, IdeaId(2));
        assert_eq!(args.parent, IdeaId(1));
        assert_eq!(args.scope.project.as_deref(), Some("work"));
    }

    #[test]
    fn guided_collects_empty_answers() {
        let cli = Cli::try_parse_from([
            "thinktree", "guided", "-a", "spark", "-a", "", "-a", "who", "-a", "", "-a", "",
            "-a", "core",
        ])
        .unwrap();
        let Some(Commands::Guided(args)) = cli.command else {
            panic!("expected guided");
        };
        assert_eq!(args.answers.len(), 6);
        assert_eq!(args.answers[1], "");
    }

    #[test]
    fn rejects_non_numeric_idea_id() {
        assert!(Cli::try_parse_from(["thinktree", "idea", "show", "abc"]).is_err());
    }
}
