//! CLI commands and argument parsing.
//!
//! The command-line interface is built on [`clap`](https://docs.rs/clap).
//!
//! # Commands
//!
//! - **Projects**: `project list`, `project create`, `project rename`, `project delete`
//! - **Ideas**: `idea add`, `idea list`, `idea show`, `idea edit`, `idea link`,
//!   `idea unlink`, `idea trunk`, `idea delete`
//! - **Views**: `tags`, `tree`
//! - **Guided capture**: `guided`
//! - **Version info**: `version`
//!
//! # Output Formats
//!
//! Commands support multiple output formats via the `-f`/`--format` flag:
//!
//! - `table` - Human-readable output (default)
//! - `json` - Machine-readable JSON
//! - `yaml` - YAML
//!
//! # Example
//!
//! ```bash,no_run
//! thinktree idea add "Build a #widget"
//! thinktree idea link 1718000000001 1718000000000
//! thinktree tree -f json
//! ```
//!
//! # Modules
//!
//! - [`commands`] - Command definitions
//! - [`output`] - Output formatting and table rendering

pub mod commands;
pub mod output;
