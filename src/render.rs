//! Side-by-side text rendering of a comparison

use std::io::{self, Write};

use zipdelta_core::{Side, Status};
use zipdelta_engine::{Comparison, ComparisonSummary, DualView, Sources, TreeNode};

const SIZE_WIDTH: usize = 14;
const DATE_WIDTH: usize = 19;
const MAX_NAME_WIDTH: usize = 48;

/// Options for text output
#[derive(Debug, Clone, Copy, Default)]
pub struct RenderOptions {
    /// Skip rows that are identical on both sides
    pub only_differences: bool,
}

/// One-character marker standing in for the status colour
pub fn marker(status: Status) -> char {
    match status {
        Status::Same => ' ',
        Status::OnlyLeft => '<',
        Status::OnlyRight => '>',
        Status::ContentDiff => '!',
        Status::DateDiff => '~',
        Status::Placeholder => '.',
        Status::DirectoryDiff => '*',
    }
}

/// Render both trees as aligned columns
///
/// Each side follows its own view: a row is drawn when its node is visible
/// in either view, and a side whose enclosing directory is closed is left
/// blank. Right cells are the nodes the index pairs with the left ones.
pub fn render_trees<W: Write>(
    out: &mut W,
    comparison: &Comparison,
    views: &DualView,
    sources: Option<&Sources>,
    options: RenderOptions,
) -> io::Result<()> {
    let left_view = views.get(Side::Left);
    let right_view = views.get(Side::Right);

    let rows: Vec<(usize, Option<&TreeNode>, Option<&TreeNode>)> = comparison
        .left
        .walk_with(|node| {
            left_view.is_expanded(node.id)
                || mirror(comparison, node).is_some_and(|r| right_view.is_expanded(r.id))
        })
        .filter_map(|(depth, left)| {
            let right = mirror(comparison, left)
                .filter(|r| right_view.is_visible(&comparison.right, r.id));
            let left = Some(left).filter(|l| left_view.is_visible(&comparison.left, l.id));
            (left.is_some() || right.is_some()).then_some((depth, left, right))
        })
        .filter(|(_, left, right)| {
            !options.only_differences
                || left.is_some_and(|l| l.status != Status::Same)
                || right.is_some_and(|r| r.status != Status::Same)
        })
        .collect();

    let name_width = rows
        .iter()
        .filter_map(|(depth, left, right)| left.or(*right).map(|node| (depth, node)))
        .map(|(depth, node)| depth * 2 + node.label.chars().count() + 3)
        .max()
        .unwrap_or(0)
        .clamp(12, MAX_NAME_WIDTH);

    let (left_title, right_title) = match sources {
        Some(s) => (s.left.display().to_string(), s.right.display().to_string()),
        None => ("left".to_string(), "right".to_string()),
    };
    let column_width = name_width + SIZE_WIDTH + DATE_WIDTH + 4;
    writeln!(out, "{:<column_width$} | {}", left_title, right_title)?;
    writeln!(out, "{:-<column_width$}-+-{:-<column_width$}", "", "")?;

    if rows.is_empty() {
        writeln!(out, "(no entries)")?;
    }

    for (depth, left, right) in rows {
        match left {
            Some(node) => {
                let open = left_view.is_expanded(node.id);
                write!(out, "{}", cell(node, depth, open, name_width))?;
            }
            None => write!(out, "{}", " ".repeat(column_width))?,
        }
        write!(out, " | ")?;
        match right {
            Some(node) => {
                let open = right_view.is_expanded(node.id);
                writeln!(out, "{}", cell(node, depth, open, name_width).trim_end())?;
            }
            None => writeln!(out)?,
        }
    }
    Ok(())
}

/// Right-tree node paired with a left-tree node
fn mirror<'a>(comparison: &'a Comparison, left: &TreeNode) -> Option<&'a TreeNode> {
    comparison
        .index
        .lookup(&left.path)
        .ok()
        .and_then(|pair| comparison.right.get(pair.right))
}

fn cell(node: &TreeNode, depth: usize, open: bool, name_width: usize) -> String {
    let column_width = name_width + SIZE_WIDTH + DATE_WIDTH + 4;
    if !node.visible {
        return " ".repeat(column_width);
    }

    let name = if node.is_directory() {
        format!("{}{} {}/", "  ".repeat(depth), if open { '▾' } else { '▸' }, node.label)
    } else {
        format!("{}  {}", "  ".repeat(depth), node.label)
    };
    let name = truncate(&name, name_width);

    format!(
        "{} {:<name_width$} {:>SIZE_WIDTH$} {:<DATE_WIDTH$}",
        marker(node.status),
        name,
        node.size,
        node.date
    )
}

fn truncate(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        return text.to_string();
    }
    let mut cut: String = text.chars().take(width.saturating_sub(1)).collect();
    cut.push('…');
    cut
}

/// Marker legend
pub fn render_legend<W: Write>(out: &mut W) -> io::Result<()> {
    writeln!(out, "Legend:")?;
    for status in Status::ALL {
        writeln!(out, "  {}  {}", marker(status), status.label())?;
    }
    Ok(())
}

pub fn render_summary<W: Write>(out: &mut W, summary: &ComparisonSummary) -> io::Result<()> {
    writeln!(out, "Summary:")?;
    writeln!(out, "  Paths:           {}", summary.total_paths)?;
    writeln!(out, "  Identical:       {}", summary.same)?;
    writeln!(out, "  Only left:       {}", summary.only_left)?;
    writeln!(out, "  Only right:      {}", summary.only_right)?;
    writeln!(out, "  Content differs: {}", summary.content_diff)?;
    writeln!(out, "  Date differs:    {}", summary.date_diff)?;
    writeln!(
        out,
        "  Directories:     {} ({} with differences)",
        summary.directories, summary.differing_directories
    )?;
    Ok(())
}
