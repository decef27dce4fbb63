use std::path::Path;

use anyhow::Context;
use colored::Colorize;
use serde_json::json;

use arche_bridge::ObjectView;
use arche_sdk::{
    ClassTag, ObjectId, Placement, PropertyValue, TraceEdge, TraceFilter, Workspace,
    WorkspaceConfig,
};

use crate::cli::*;

pub fn run_command(cli: Cli) -> anyhow::Result<()> {
    let format = cli.format;
    let root = cli.project.as_path();
    match cli.command {
        Command::Init(args) => cmd_init(root, args),
        Command::Doc(DocCommand::New { name }) => cmd_doc_new(root, format, &name),
        Command::Object(ObjectCommand::Add {
            parent,
            classes,
            title,
        }) => cmd_object_add(root, format, &parent, &classes, title),
        Command::Object(ObjectCommand::Show { id }) => cmd_object_show(root, format, &id),
        Command::Object(ObjectCommand::Rm { id }) => cmd_object_rm(root, format, &id),
        Command::Trace(TraceCommand::Add {
            source,
            trace_type,
            target,
            label,
        }) => cmd_trace_add(root, &source, &trace_type, &target, label),
        Command::Trace(TraceCommand::Rm {
            source,
            trace_type,
            target,
        }) => cmd_trace_rm(root, &source, &trace_type, &target),
        Command::Trace(TraceCommand::Ls { id }) => cmd_trace_ls(root, format, &id),
        Command::Impact(args) => cmd_impact(root, format, args),
        Command::Matrix(args) => cmd_matrix(root, format, args),
        Command::Clone(args) => cmd_clone(root, format, args),
        Command::Archetypes => cmd_archetypes(root, format),
        Command::Check => cmd_check(root, format),
    }
}

// ---- Helpers ----

fn open(root: &Path) -> anyhow::Result<Workspace> {
    Workspace::open(root).with_context(|| format!("cannot open project at {}", root.display()))
}

fn parse_id(raw: &str) -> anyhow::Result<ObjectId> {
    raw.parse()
        .with_context(|| format!("`{raw}` is not an object id"))
}

fn parse_classes(raw: &[String]) -> anyhow::Result<Vec<ClassTag>> {
    raw.iter()
        .map(|c| ClassTag::new(c.as_str()).with_context(|| format!("bad class tag `{c}`")))
        .collect()
}

fn type_filter(types: &[String]) -> TraceFilter {
    if types.is_empty() {
        TraceFilter::Any
    } else {
        TraceFilter::from_tokens(types)
    }
}

fn print_json(value: &serde_json::Value) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn label_of(ws: &Workspace, id: &ObjectId) -> String {
    match ws.object(id) {
        Ok(obj) => obj.label(),
        Err(_) => format!("{} {}", id.short_id(), "(missing)".red()),
    }
}

fn print_edge(ws: &Workspace, edge: &TraceEdge) {
    println!(
        "  {} --{}--> {}",
        label_of(ws, &edge.source).bold(),
        edge.trace_type.as_str().cyan(),
        label_of(ws, &edge.target).bold()
    );
}

// ---- Commands ----

fn cmd_init(root: &Path, args: InitArgs) -> anyhow::Result<()> {
    let name = args.name.unwrap_or_else(|| {
        root.canonicalize()
            .ok()
            .and_then(|p| p.file_name().map(|n| n.to_string_lossy().into_owned()))
            .unwrap_or_else(|| "project".into())
    });
    let config = WorkspaceConfig {
        library_root: args.library,
        ..WorkspaceConfig::default()
    };
    let ws = Workspace::create(root, &name, config)?;
    println!(
        "{} Initialized project {} in {}",
        "✓".green().bold(),
        name.bold(),
        ws.root().display()
    );
    Ok(())
}

fn cmd_doc_new(root: &Path, format: OutputFormat, name: &str) -> anyhow::Result<()> {
    let ws = open(root)?;
    let id = ws.add_document(name)?;
    ws.flush()?;
    match format {
        OutputFormat::Json => print_json(&json!({ "id": id })),
        OutputFormat::Text => {
            println!("{} Added document {} {}", "✓".green(), name.bold(), id.to_string().dimmed());
            Ok(())
        }
    }
}

fn cmd_object_add(
    root: &Path,
    format: OutputFormat,
    parent: &str,
    classes: &[String],
    title: Option<String>,
) -> anyhow::Result<()> {
    let ws = open(root)?;
    let parent = parse_id(parent)?;
    let id = ws.add_object(&parent, parse_classes(classes)?)?;
    if let Some(title) = title {
        ws.set_property(&id, "title", PropertyValue::Text(title))?;
    }
    ws.flush()?;
    match format {
        OutputFormat::Json => print_json(&json!({ "id": id })),
        OutputFormat::Text => {
            println!("{} Added object {}", "✓".green(), id.to_string().yellow());
            Ok(())
        }
    }
}

fn cmd_object_show(root: &Path, format: OutputFormat, id: &str) -> anyhow::Result<()> {
    let ws = open(root)?;
    let obj = ws.object(&parse_id(id)?)?;
    if format == OutputFormat::Json {
        return print_json(&serde_json::to_value(ObjectView::from(&obj))?);
    }

    println!("{} {}", obj.label().bold(), obj.id.to_string().dimmed());
    println!("  Kind: {}", obj.kind.to_string().cyan());
    if let Some(parent) = obj.parent {
        println!("  Parent: {}", label_of(&ws, &parent));
    }
    if !obj.classes.is_empty() {
        let tags: Vec<&str> = obj.classes.iter().map(ClassTag::as_str).collect();
        println!("  Classes: {}", tags.join(", ").yellow());
    }
    for (name, value) in obj.properties.iter() {
        println!("  {} ({}): {}", name.bold(), value.kind_name().dimmed(), value.display_string());
    }
    if !obj.children.is_empty() {
        println!("  Children:");
        for child in &obj.children {
            println!("    {}", label_of(&ws, child));
        }
    }
    Ok(())
}

fn cmd_object_rm(root: &Path, format: OutputFormat, id: &str) -> anyhow::Result<()> {
    let ws = open(root)?;
    let removal = ws.remove_object(&parse_id(id)?)?;
    ws.flush()?;
    match format {
        OutputFormat::Json => print_json(&json!({
            "removed": removal.removed,
            "dangling": removal.dangling,
            "purged": removal.purged,
        })),
        OutputFormat::Text => {
            println!("{} Removed {} object(s)", "✓".green(), removal.removed.len());
            if !removal.dangling.is_empty() {
                println!("{} {} trace(s) now dangle:", "!".yellow().bold(), removal.dangling.len());
                for edge in &removal.dangling {
                    print_edge(&ws, edge);
                }
            }
            if !removal.purged.is_empty() {
                println!("  Purged {} inbound trace(s)", removal.purged.len());
            }
            Ok(())
        }
    }
}

fn cmd_trace_add(
    root: &Path,
    source: &str,
    trace_type: &str,
    target: &str,
    label: Option<String>,
) -> anyhow::Result<()> {
    let ws = open(root)?;
    let (source, target) = (parse_id(source)?, parse_id(target)?);
    if ws.add_trace(&source, trace_type, &target, label)? {
        ws.flush()?;
        println!("{} Added trace {}", "✓".green(), trace_type.cyan());
    } else {
        println!("Trace already present.");
    }
    Ok(())
}

fn cmd_trace_rm(root: &Path, source: &str, trace_type: &str, target: &str) -> anyhow::Result<()> {
    let ws = open(root)?;
    let (source, target) = (parse_id(source)?, parse_id(target)?);
    if ws.remove_trace(&source, trace_type, &target)? {
        ws.flush()?;
        println!("{} Removed trace {}", "✓".green(), trace_type.cyan());
    } else {
        println!("No such trace.");
    }
    Ok(())
}

fn cmd_trace_ls(root: &Path, format: OutputFormat, id: &str) -> anyhow::Result<()> {
    let ws = open(root)?;
    let id = parse_id(id)?;
    let (outgoing, incoming) = ws.read(|g| (g.traces().edges_from(&id), g.traces().edges_to(&id)))?;
    match format {
        OutputFormat::Json => print_json(&json!({ "outgoing": outgoing, "incoming": incoming })),
        OutputFormat::Text => {
            println!("{} ({} out, {} in)", label_of(&ws, &id).bold(), outgoing.len(), incoming.len());
            for edge in outgoing.iter().chain(&incoming) {
                print_edge(&ws, edge);
            }
            Ok(())
        }
    }
}

fn cmd_impact(root: &Path, format: OutputFormat, args: ImpactArgs) -> anyhow::Result<()> {
    let ws = open(root)?;
    let seeds = args
        .seeds
        .iter()
        .map(|s| parse_id(s))
        .collect::<anyhow::Result<Vec<_>>>()?;
    let report = ws.impact(&seeds, &type_filter(&args.types))?;
    if format == OutputFormat::Json {
        return print_json(&serde_json::to_value(&report)?);
    }

    if report.is_empty() {
        println!("Nothing else is affected.");
        return Ok(());
    }
    println!(
        "{} object(s) affected, cascade depth {}",
        report.len().to_string().bold(),
        report.cascade_depth
    );
    for entry in &report.affected {
        println!(
            "  {}{} via {}",
            "  ".repeat(entry.depth.saturating_sub(1)),
            label_of(&ws, &entry.id).bold(),
            entry.via.trace_type.as_str().cyan()
        );
    }
    Ok(())
}

fn cmd_matrix(root: &Path, format: OutputFormat, args: MatrixArgs) -> anyhow::Result<()> {
    let ws = open(root)?;
    let matrix = ws.matrix(
        &parse_classes(&args.rows)?,
        &parse_classes(&args.columns)?,
        &type_filter(&args.types),
    )?;
    if format == OutputFormat::Json {
        return print_json(&serde_json::to_value(&matrix)?);
    }

    let columns: Vec<String> = matrix.columns.iter().map(|c| label_of(&ws, c)).collect();
    println!("{:24} {}", "", columns.join(" | ").bold());
    for (r, row) in matrix.rows.iter().enumerate() {
        let cells: Vec<String> = columns
            .iter()
            .enumerate()
            .map(|(c, header)| {
                let mark = if matrix.get(r, c) { "x" } else { "." };
                format!("{mark:^width$}", width = header.chars().count())
            })
            .collect();
        println!("{:24} {}", label_of(&ws, row), cells.join(" | "));
    }
    let uncovered = matrix.uncovered_rows();
    if !uncovered.is_empty() {
        println!("{} {} row(s) trace to nothing", "!".yellow().bold(), uncovered.len());
    }
    Ok(())
}

fn cmd_clone(root: &Path, format: OutputFormat, args: CloneArgs) -> anyhow::Result<()> {
    let ws = open(root)?;
    let placement = match &args.under {
        Some(parent) => Placement::Under {
            parent: parse_id(parent)?,
            position: args.position,
        },
        None => Placement::Document {
            position: args.position,
        },
    };
    let outcome = if args.local {
        ws.clone_object(&parse_id(&args.source)?, placement, args.name)?
    } else {
        let id = ws.resolve_archetype(&args.source)?;
        ws.clone_archetype(&id, placement, args.name)?
    };
    ws.flush()?;

    match format {
        OutputFormat::Json => print_json(&json!({
            "roots": outcome.roots,
            "objects": outcome.remap.len(),
            "traces": outcome.traces.len(),
        })),
        OutputFormat::Text => {
            println!(
                "{} Cloned {} object(s) from {}",
                "✓".green().bold(),
                outcome.remap.len(),
                args.source.yellow()
            );
            for id in &outcome.roots {
                println!("  {} {}", label_of(&ws, id).bold(), id.to_string().dimmed());
            }
            Ok(())
        }
    }
}

fn cmd_archetypes(root: &Path, format: OutputFormat) -> anyhow::Result<()> {
    let ws = open(root)?;
    let archetypes = ws.library()?.archetypes()?;
    match format {
        OutputFormat::Json => {
            let items: Vec<serde_json::Value> = archetypes
                .iter()
                .map(|a| {
                    json!({
                        "id": a.id.to_string(),
                        "kind": a.kind,
                        "description": a.description,
                    })
                })
                .collect();
            print_json(&serde_json::Value::Array(items))
        }
        OutputFormat::Text => {
            if archetypes.is_empty() {
                println!("No archetypes.");
            }
            for a in &archetypes {
                println!("  {:32} {:8} {}", a.id.to_string().bold(), a.kind.to_string().cyan(), a.description);
            }
            Ok(())
        }
    }
}

fn cmd_check(root: &Path, format: OutputFormat) -> anyhow::Result<()> {
    let ws = open(root)?;
    let report = ws.check()?;
    match format {
        OutputFormat::Json => print_json(&json!({
            "objects": report.objects,
            "edges": report.edges,
            "dangling": report.dangling,
        })),
        OutputFormat::Text => {
            println!(
                "{} {} objects, {} traces",
                "✓".green().bold(),
                report.objects,
                report.edges
            );
            if report.is_clean() {
                println!("  No dangling traces.");
            } else {
                println!("{} {} dangling trace(s):", "!".yellow().bold(), report.dangling.len());
                for edge in &report.dangling {
                    print_edge(&ws, edge);
                }
            }
            Ok(())
        }
    }
}
