//! Thinktree CLI entrypoint.

use clap::error::ErrorKind;
use clap::Parser;
use std::ffi::OsString;
use std::process;
use thinktree::cli::commands::{
    Cli, Commands, GuidedArgs, IdeaCommands, ProjectCommands, ProjectScope, TreeArgs,
};
use thinktree::cli::output::{
    create_table, output, output_error, rows_table, OutputFormat, TableRow,
};
use thinktree::core::error::ExitCode;
use thinktree::core::guided::GUIDED_QUESTIONS;
use thinktree::core::idea::Idea;
use thinktree::core::layout::ForestLayout;
use thinktree::core::project::Project;
use thinktree::core::registry::{IdeaChange, Registry};
use thinktree::core::store::Mutation;
use thinktree::core::tags::preview;
use thinktree::core::view::{RenderedView, TagFilter, ViewBody, ViewMode, ViewState};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn parse_format_from_args(args: &[OsString]) -> OutputFormat {
    let mut iter = args.iter().skip(1);
    while let Some(arg) = iter.next() {
        let s = arg.to_string_lossy();

        if s == "-f" || s == "--format" {
            if let Some(value) = iter.next() {
                return parse_format_value(&value.to_string_lossy());
            }
        }

        if let Some(value) = s.strip_prefix("--format=") {
            return parse_format_value(value);
        }
    }

    OutputFormat::Table
}

fn parse_format_value(value: &str) -> OutputFormat {
    let v = value.to_lowercase();
    if v == "json" {
        OutputFormat::Json
    } else if v == "yaml" || v == "yml" {
        OutputFormat::Yaml
    } else {
        OutputFormat::Table
    }
}

fn output_help(help: &str, format: OutputFormat) {
    match format {
        OutputFormat::Table => {
            print!("{help}");
        }
        _ => {
            if let Err(err) = output(serde_json::json!({ "help": help }), format) {
                eprintln!("Failed to render help: {err}");
            }
        }
    }
}

fn output_version(format: OutputFormat) {
    let version = env!("CARGO_PKG_VERSION");
    match format {
        OutputFormat::Table => {
            println!("thinktree {version}");
        }
        _ => {
            let data = serde_json::json!({ "name": "thinktree", "version": version });
            if let Err(err) = output(data, format) {
                eprintln!("Failed to render version: {err}");
            }
        }
    }
}

fn handle_clap_error(err: &clap::Error, format: OutputFormat) -> ExitCode {
    match err.kind() {
        ErrorKind::DisplayHelp => {
            let rendered = err.render().to_string();
            output_help(&rendered, format);
            ExitCode::Success
        }
        ErrorKind::DisplayVersion => {
            output_version(format);
            ExitCode::Success
        }
        _ => {
            eprintln!("{}", err.render());
            ExitCode::Error
        }
    }
}

/// Logs go to stderr so structured output on stdout stays parseable.
fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_env("THINKTREE_LOG").unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn main() {
    let default_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let is_broken_pipe = info
            .payload()
            .downcast_ref::<&str>()
            .is_some_and(|s| s.contains("Broken pipe"))
            || info
                .payload()
                .downcast_ref::<String>()
                .is_some_and(|s| s.contains("Broken pipe"));

        if is_broken_pipe {
            return;
        }

        default_hook(info);
    }));

    let args: Vec<OsString> = std::env::args_os().collect();
    let format = parse_format_from_args(&args);

    let result = std::panic::catch_unwind(|| Cli::try_parse_from(&args).map(run));

    match result {
        Ok(Ok(exit_code)) => process::exit(i32::from(exit_code)),
        Ok(Err(e)) => process::exit(i32::from(handle_clap_error(&e, format))),
        Err(payload) => {
            let msg = payload
                .downcast_ref::<&str>()
                .copied()
                .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
                .unwrap_or("panic");

            if msg.contains("Broken pipe") {
                process::exit(0);
            }

            std::panic::resume_unwind(payload);
        }
    }
}

fn run(cli: Cli) -> ExitCode {
    init_tracing(cli.verbose);
    let format = cli.format;

    match cli.command {
        Some(Commands::Version) => {
            output_version(format);
            ExitCode::Success
        }
        Some(Commands::Project(cmd)) => handle_project(cmd, format),
        Some(Commands::Idea(cmd)) => handle_idea(cmd, format),
        Some(Commands::Tags(scope)) => handle_tags(&scope, format),
        Some(Commands::Tree(args)) => handle_tree(&args, format),
        Some(Commands::Guided(args)) => handle_guided(&args, format),
        None => {
            println!("thinktree {}", env!("CARGO_PKG_VERSION"));
            println!("Use --help for usage information.");
            ExitCode::Success
        }
    }
}

fn get_registry(format: OutputFormat) -> Option<Registry> {
    match Registry::open() {
        Ok(r) => Some(r),
        Err(e) => {
            output_error(&e, format);
            None
        }
    }
}

fn handle_project(cmd: ProjectCommands, format: OutputFormat) -> ExitCode {
    let Some(registry) = get_registry(format) else {
        return ExitCode::Error;
    };

    let result = match cmd {
        ProjectCommands::List => registry.list_projects().map(|projects| {
            print_projects(&projects, format);
        }),
        ProjectCommands::Create(args) => registry
            .create_project(&args.name)
            .map(|project| print_project(&project, format)),
        ProjectCommands::Rename(args) => registry
            .rename_project(&args.project, &args.name)
            .map(|project| print_project(&project, format)),
        ProjectCommands::Delete(args) => registry.delete_project(&args.project).map(|project| {
            if format == OutputFormat::Table {
                println!("Deleted project {} ({})", project.id, project.name);
            } else {
                print_project(&project, format);
            }
        }),
    };

    match result {
        Ok(()) => ExitCode::Success,
        Err(e) => output_error(&e, format),
    }
}

fn handle_idea(cmd: IdeaCommands, format: OutputFormat) -> ExitCode {
    let Some(registry) = get_registry(format) else {
        return ExitCode::Error;
    };

    let result = match cmd {
        IdeaCommands::Add(args) => registry
            .add_idea(args.scope.project.as_deref(), &args.text)
            .map(|change| print_change(&change, format)),
        IdeaCommands::List(args) => registry
            .get_project(args.scope.project.as_deref())
            .and_then(|project| {
                let state = ViewState::new(project.id)
                    .with_filter(TagFilter::parse(args.tag.as_deref()))
                    .with_mode(ViewMode::List);
                registry.view(&state)
            })
            .map(|view| print_list(&view, format)),
        IdeaCommands::Show(args) => registry
            .get_idea(args.scope.project.as_deref(), args.id)
            .map(|idea| print_idea(&idea, format)),
        IdeaCommands::Edit(args) => registry
            .edit_idea(args.scope.project.as_deref(), args.id, &args.text)
            .map(|change| print_change(&change, format)),
        IdeaCommands::Link(args) => registry
            .link_ideas(args.scope.project.as_deref(), args.child, args.parent)
            .map(|change| print_change(&change, format)),
        IdeaCommands::Unlink(args) => registry
            .unlink_idea(args.scope.project.as_deref(), args.id)
            .map(|change| print_change(&change, format)),
        IdeaCommands::Trunk(args) => registry
            .toggle_trunk(args.scope.project.as_deref(), args.id)
            .map(|change| print_change(&change, format)),
        IdeaCommands::Delete(args) => registry
            .delete_idea(args.scope.project.as_deref(), args.id)
            .map(|change| print_change(&change, format)),
    };

    match result {
        Ok(()) => ExitCode::Success,
        Err(e) => output_error(&e, format),
    }
}

fn handle_tags(scope: &ProjectScope, format: OutputFormat) -> ExitCode {
    let Some(registry) = get_registry(format) else {
        return ExitCode::Error;
    };

    match registry.tags(scope.project.as_deref()) {
        Ok(tags) => {
            match format {
                OutputFormat::Table => {
                    if tags.is_empty() {
                        println!("No tags yet.");
                    }
                    for tag in &tags {
                        println!("#{tag}");
                    }
                }
                _ => {
                    if let Err(err) = output(&tags, format) {
                        eprintln!("Failed to render tags: {err}");
                    }
                }
            }
            ExitCode::Success
        }
        Err(e) => output_error(&e, format),
    }
}

fn handle_tree(args: &TreeArgs, format: OutputFormat) -> ExitCode {
    let Some(registry) = get_registry(format) else {
        return ExitCode::Error;
    };

    let result = registry
        .get_project(args.scope.project.as_deref())
        .and_then(|project| {
            let state = ViewState::new(project.id)
                .with_filter(TagFilter::parse(args.tag.as_deref()))
                .with_mode(ViewMode::Tree);
            registry.view(&state)
        });

    match result {
        Ok(view) => {
            match (&view.body, format) {
                (ViewBody::Tree { forest }, OutputFormat::Table) => {
                    print_forest(forest, &view, registry.settings().preview_chars);
                }
                _ => {
                    if let Err(err) = output(&view, format) {
                        eprintln!("Failed to render tree: {err}");
                    }
                }
            }
            ExitCode::Success
        }
        Err(e) => output_error(&e, format),
    }
}

fn handle_guided(args: &GuidedArgs, format: OutputFormat) -> ExitCode {
    let Some(registry) = get_registry(format) else {
        return ExitCode::Error;
    };

    match registry.guided(args.scope.project.as_deref(), &args.answers) {
        Ok(created) => {
            match format {
                OutputFormat::Table => {
                    for question in &GUIDED_QUESTIONS {
                        if let Some(idea) = created.iter().find(|i| i.has_tag(question.tag)) {
                            println!("{:<20} {}", question.step, idea.text);
                        }
                    }
                    if let Some(trunk) = created.iter().find(|i| i.is_trunk) {
                        println!("Trunk: {}", trunk.id);
                    }
                }
                _ => {
                    if let Err(err) = output(&created, format) {
                        eprintln!("Failed to render guided capture: {err}");
                    }
                }
            }
            ExitCode::Success
        }
        Err(e) => output_error(&e, format),
    }
}

fn print_project(project: &Project, format: OutputFormat) {
    match format {
        OutputFormat::Table => {
            println!("ID:          {}", project.id);
            println!("Name:        {}", project.name);
            println!("Created:     {}", project.created_at);
        }
        _ => {
            if let Err(err) = output(project, format) {
                eprintln!("Failed to render project: {err}");
            }
        }
    }
}

fn print_projects(projects: &[Project], format: OutputFormat) {
    match format {
        OutputFormat::Table => {
            println!("{}", rows_table(&["ID", "NAME", "CREATED"], projects));
        }
        _ => {
            if let Err(err) = output(projects, format) {
                eprintln!("Failed to render projects: {err}");
            }
        }
    }
}

fn print_idea(idea: &Idea, format: OutputFormat) {
    match format {
        OutputFormat::Table => {
            println!("ID:          {}", idea.id);
            println!("Text:        {}", idea.text);
            if !idea.tags.is_empty() {
                println!("Tags:        {}", idea.tags.join(", "));
            }
            if let Some(parent) = idea.linked_to {
                println!("Builds on:   {parent}");
            }
            if idea.is_trunk {
                println!("Trunk:       yes");
            }
            println!("Captured:    {}", idea.timestamp);
        }
        _ => {
            if let Err(err) = output(idea, format) {
                eprintln!("Failed to render idea: {err}");
            }
        }
    }
}

fn print_change(change: &IdeaChange, format: OutputFormat) {
    match format {
        OutputFormat::Table => match (&change.outcome, &change.idea) {
            (Mutation::Applied, Some(idea)) => print_idea(idea, format),
            (Mutation::Applied, None) => println!("Done."),
            (Mutation::Unchanged(reason), _) => println!("Nothing changed: {reason:?}"),
        },
        _ => {
            if let Err(err) = output(change, format) {
                eprintln!("Failed to render change: {err}");
            }
        }
    }
}

fn print_list(view: &RenderedView, format: OutputFormat) {
    match (&view.body, format) {
        (ViewBody::List { entries }, OutputFormat::Table) => {
            if let Some(message) = view.empty_message() {
                println!("{message}");
                return;
            }
            let mut table = create_table(&["ID", "TRUNK", "IDEA", "TAGS", "BUILDS ON", "BRANCHES"]);
            for entry in entries {
                let mut row = entry.idea.to_row();
                row.pop();
                row.push(entry.builds_on.clone().unwrap_or_default());
                row.push(entry.branches.to_string());
                table.add_row(row);
            }
            println!("{table}");
        }
        _ => {
            if let Err(err) = output(view, format) {
                eprintln!("Failed to render ideas: {err}");
            }
        }
    }
}

/// Prints each tree as an indented outline with node positions, then the
/// loose thoughts.
fn print_forest(forest: &ForestLayout, view: &RenderedView, preview_chars: usize) {
    if let Some(message) = view.empty_message() {
        println!("{message}");
        return;
    }

    for tree in &forest.trees {
        println!(
            "Tree {} ({} x {})",
            tree.root, tree.canvas_width, tree.canvas_height
        );
        for node in &tree.nodes {
            let marker = if node.idea.is_trunk { "*" } else { "-" };
            println!(
                "{}{marker} [{}] {}  @({}, {})",
                "  ".repeat(node.depth),
                node.idea.id,
                preview(&node.idea.text, preview_chars),
                node.x,
                node.y
            );
        }
        for id in &tree.truncated {
            println!("  (cycle cut at {id})");
        }
        println!();
    }

    if !forest.loose.is_empty() {
        println!("Loose thoughts");
        for idea in &forest.loose {
            println!("- [{}] {}", idea.id, preview(&idea.text, preview_chars));
        }
    }
}

