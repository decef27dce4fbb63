use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "arche",
    about = "Arche: structured documents with archetypes and traceability",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Project directory
    #[arg(short = 'C', long, global = true, default_value = ".")]
    pub project: PathBuf,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Command {
    /// Create a new project
    Init(InitArgs),
    /// Manage documents
    #[command(subcommand)]
    Doc(DocCommand),
    /// Manage objects
    #[command(subcommand)]
    Object(ObjectCommand),
    /// Manage trace relationships
    #[command(subcommand)]
    Trace(TraceCommand),
    /// Show everything affected by a change to the given objects
    Impact(ImpactArgs),
    /// Show direct dependencies between two classes of objects
    Matrix(MatrixArgs),
    /// Instantiate an archetype or copy an object
    Clone(CloneArgs),
    /// List the archetypes of the configured library
    Archetypes,
    /// Check containment and the trace index, and list dangling traces
    Check,
}

#[derive(Args)]
pub struct InitArgs {
    /// Project name (defaults to the directory name)
    #[arg(long)]
    pub name: Option<String>,
    /// Archetype library root
    #[arg(long)]
    pub library: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum DocCommand {
    /// Add a document
    New {
        name: String,
    },
}

#[derive(Subcommand)]
pub enum ObjectCommand {
    /// Add an object under a parent
    Add {
        parent: String,
        #[arg(short, long = "class")]
        classes: Vec<String>,
        #[arg(short, long)]
        title: Option<String>,
    },
    /// Show an object
    Show { id: String },
    /// Delete an object and its children
    Rm { id: String },
}

#[derive(Subcommand)]
pub enum TraceCommand {
    /// Add `source --type--> target`
    Add {
        source: String,
        #[arg(value_name = "TYPE")]
        trace_type: String,
        target: String,
        #[arg(short, long)]
        label: Option<String>,
    },
    /// Remove `source --type--> target`
    Rm {
        source: String,
        #[arg(value_name = "TYPE")]
        trace_type: String,
        target: String,
    },
    /// List traces leaving and entering an object
    Ls { id: String },
}

#[derive(Args)]
pub struct ImpactArgs {
    #[arg(required = true)]
    pub seeds: Vec<String>,
    /// Only follow these trace types
    #[arg(short = 't', long = "type")]
    pub types: Vec<String>,
}

#[derive(Args)]
pub struct MatrixArgs {
    /// Class tags of the row objects
    #[arg(long, required = true)]
    pub rows: Vec<String>,
    /// Class tags of the column objects
    #[arg(long, required = true)]
    pub columns: Vec<String>,
    #[arg(short = 't', long = "type")]
    pub types: Vec<String>,
}

#[derive(Args)]
pub struct CloneArgs {
    /// Archetype (`profile/name` or `name`), or an object id with --local
    pub source: String,
    /// Copy an object of this project instead of an archetype
    #[arg(long)]
    pub local: bool,
    /// Place the copy under this object; a new document otherwise
    #[arg(long)]
    pub under: Option<String>,
    #[arg(long)]
    pub position: Option<usize>,
    /// Name or title of the copy
    #[arg(long)]
    pub name: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("arche").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn init_defaults() {
        let cli = parse(&["init"]);
        assert_eq!(cli.project, PathBuf::from("."));
        assert_eq!(cli.format, OutputFormat::Text);
        assert!(!cli.verbose);
        let Command::Init(args) = cli.command else {
            panic!("expected init");
        };
        assert!(args.name.is_none());
        assert!(args.library.is_none());
    }

    #[test]
    fn init_with_library_and_project() {
        let cli = parse(&["-C", "work/proj", "init", "--name", "demo", "--library", "lib"]);
        assert_eq!(cli.project, PathBuf::from("work/proj"));
        let Command::Init(args) = cli.command else {
            panic!("expected init");
        };
        assert_eq!(args.name.as_deref(), Some("demo"));
        assert_eq!(args.library, Some(PathBuf::from("lib")));
    }

    #[test]
    fn global_flags_after_the_subcommand() {
        let cli = parse(&["check", "--format", "json", "-v"]);
        assert_eq!(cli.format, OutputFormat::Json);
        assert!(cli.verbose);
        assert!(matches!(cli.command, Command::Check));
    }

    #[test]
    fn unknown_format_is_rejected() {
        assert!(Cli::try_parse_from(["arche", "--format", "yaml", "check"]).is_err());
    }

    #[test]
    fn object_add_collects_repeated_classes() {
        let cli = parse(&["object", "add", "PARENT", "-c", "requirement", "--class", "functional", "-t", "Login"]);
        let Command::Object(ObjectCommand::Add { parent, classes, title }) = cli.command else {
            panic!("expected object add");
        };
        assert_eq!(parent, "PARENT");
        assert_eq!(classes, vec!["requirement", "functional"]);
        assert_eq!(title.as_deref(), Some("Login"));
    }

    #[test]
    fn object_add_requires_a_parent() {
        assert!(Cli::try_parse_from(["arche", "object", "add"]).is_err());
    }

    #[test]
    fn trace_subcommands() {
        let cli = parse(&["trace", "add", "A", "depends-on", "B", "-l", "needs"]);
        let Command::Trace(TraceCommand::Add { source, trace_type, target, label }) = cli.command
        else {
            panic!("expected trace add");
        };
        assert_eq!((source.as_str(), trace_type.as_str(), target.as_str()), ("A", "depends-on", "B"));
        assert_eq!(label.as_deref(), Some("needs"));

        let cli = parse(&["trace", "rm", "A", "depends-on", "B"]);
        assert!(matches!(
            cli.command,
            Command::Trace(TraceCommand::Rm { ref source, ref trace_type, ref target })
                if source == "A" && trace_type == "depends-on" && target == "B"
        ));

        let cli = parse(&["trace", "ls", "A"]);
        assert!(matches!(cli.command, Command::Trace(TraceCommand::Ls { ref id }) if id == "A"));

        assert!(Cli::try_parse_from(["arche", "trace", "rm", "A", "depends-on"]).is_err());
    }

    #[test]
    fn impact_takes_seeds_and_types() {
        let cli = parse(&["impact", "A", "B", "--type", "depends-on", "-t", "verifies"]);
        let Command::Impact(args) = cli.command else {
            panic!("expected impact");
        };
        assert_eq!(args.seeds, vec!["A", "B"]);
        assert_eq!(args.types, vec!["depends-on", "verifies"]);

        assert!(Cli::try_parse_from(["arche", "impact"]).is_err());
        assert!(Cli::try_parse_from(["arche", "impact", "A", "--types", "x"]).is_err());
    }

    #[test]
    fn matrix_requires_rows_and_columns() {
        let cli = parse(&["matrix", "--rows", "requirement", "--columns", "test", "--type", "verifies"]);
        let Command::Matrix(args) = cli.command else {
            panic!("expected matrix");
        };
        assert_eq!(args.rows, vec!["requirement"]);
        assert_eq!(args.columns, vec!["test"]);
        assert_eq!(args.types, vec!["verifies"]);

        assert!(Cli::try_parse_from(["arche", "matrix", "--rows", "requirement"]).is_err());
    }

    #[test]
    fn clone_options() {
        let cli = parse(&["clone", "iso/srs"]);
        let Command::Clone(args) = cli.command else {
            panic!("expected clone");
        };
        assert_eq!(args.source, "iso/srs");
        assert!(!args.local);
        assert!(args.under.is_none() && args.position.is_none() && args.name.is_none());

        let cli = parse(&["clone", "ID", "--local", "--under", "P", "--position", "2", "--name", "Copy"]);
        let Command::Clone(args) = cli.command else {
            panic!("expected clone");
        };
        assert!(args.local);
        assert_eq!(args.under.as_deref(), Some("P"));
        assert_eq!(args.position, Some(2));
        assert_eq!(args.name.as_deref(), Some("Copy"));

        assert!(Cli::try_parse_from(["arche", "clone", "ID", "--position", "first"]).is_err());
    }

    #[test]
    fn doc_and_archetypes() {
        let cli = parse(&["doc", "new", "Requirements"]);
        assert!(matches!(cli.command, Command::Doc(DocCommand::New { ref name }) if name == "Requirements"));
        assert!(matches!(parse(&["archetypes"]).command, Command::Archetypes));
    }
}
