use std::path::PathBuf;

use dmforge::{
    HierarchyNode,
    domain::hierarchy::{Level, Outline, Skipped, SourceSchema, search},
    storage::load_hierarchy,
};
use serde::Serialize;
use tracing::instrument;

use super::{
    OutputFormat, print_json,
    terminal::{Colorize, terminal_width, truncate},
};

#[derive(Debug, clap::Parser)]
pub struct Command {
    /// Classification source (.json, .yaml or .yml)
    source: PathBuf,

    /// Source schema (flat, legacy, gsv, support-category); sniffed when omitted
    #[arg(long)]
    schema: Option<SourceSchema>,

    /// Only show entries whose label contains this text
    #[arg(long, short)]
    search: Option<String>,

    /// Deepest level shown (1 = groups, 2 = systems, 3 = subsystems)
    #[arg(long, default_value_t = 3, value_parser = clap::value_parser!(u8).range(1..=3))]
    depth: u8,

    /// Output format
    #[arg(long, value_name = "FORMAT", default_value = "text")]
    output: OutputFormat,
}

#[derive(Debug, Serialize)]
struct Listing<'a> {
    schema: SourceSchema,
    nodes: &'a [HierarchyNode],
    skipped: &'a [Skipped],
}

impl Command {
    #[instrument(level = "debug", skip(self))]
    pub fn run(self) -> anyhow::Result<()> {
        let loaded = load_hierarchy(&self.source, self.schema)?;
        let report = loaded.report;
        let nodes = match self.search.as_deref() {
            Some(query) => search(&report.nodes, query),
            None => report.nodes,
        };

        if self.output == OutputFormat::Json {
            return print_json(&Listing {
                schema: loaded.schema,
                nodes: &nodes,
                skipped: &report.skipped,
            });
        }

        for skipped in &report.skipped {
            eprintln!(
                "{}",
                format!("⚠️  skipped {}: {}", skipped.path, skipped.reason).warning()
            );
        }

        if nodes.is_empty() {
            println!("No entries found");
            return Ok(());
        }

        for line in render(&nodes, self.depth, terminal_width()) {
            println!("{}", line.styled());
        }
        Ok(())
    }
}

/// One line of the tree view, already cut to the terminal width.
#[derive(Debug, PartialEq, Eq)]
struct Line {
    /// Indent and label.
    head: String,
    /// Parenthesised definition, shown dimmed.
    tail: String,
}

impl Line {
    fn styled(&self) -> String {
        if self.tail.is_empty() {
            self.head.clone()
        } else {
            format!("{}{}", self.head, self.tail.dim())
        }
    }
}

/// Renders the tree down to `depth` levels, one indented line per node.
///
/// Lines are truncated to `width` before any styling is applied, so escape
/// codes never count towards the width or get cut in half.
fn render(tree: &[HierarchyNode], depth: u8, width: Option<usize>) -> Vec<Line> {
    let mut outline = Outline::new(tree);
    let mut index = 0;
    while index < outline.rows().len() {
        if outline.rows()[index].level.rank() + 1 < depth {
            outline.expand(index);
        }
        index += 1;
    }

    outline
        .rows()
        .iter()
        .filter_map(|row| {
            let node = outline.node(row)?;
            let indent = "  ".repeat(usize::from(row.level.rank()));
            let head = format!("{indent}{}", node.label());
            let tail = if node.definition().is_empty() || row.level == Level::Group {
                String::new()
            } else {
                format!(" ({})", node.definition())
            };
            Some(fit(head, tail, width))
        })
        .collect()
}

fn fit(head: String, tail: String, width: Option<usize>) -> Line {
    let Some(width) = width else {
        return Line { head, tail };
    };
    let plain = truncate(&format!("{head}{tail}"), width);
    match plain.strip_prefix(head.as_str()) {
        Some(rest) => Line {
            tail: rest.to_string(),
            head,
        },
        None => Line {
            head: plain,
            tail: String::new(),
        },
    }
}
