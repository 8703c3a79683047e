//! Serializable comparison report
//!
//! The two side trees share their shape, so the report folds them into a
//! single tree whose nodes carry a cell per side.

use serde::Serialize;
use zipdelta_core::{Error, NodeId, NodeKind, Result, Status};

use crate::builder::{Comparison, ComparisonSummary};
use crate::config::EngineConfig;
use crate::session::Sources;
use crate::tree::TreeNode;

/// One side of a report row
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SideCell {
    pub status: Status,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub size: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub date: String,
}

impl From<&TreeNode> for SideCell {
    fn from(node: &TreeNode) -> Self {
        Self {
            status: node.status,
            size: node.size.clone(),
            date: node.date.clone(),
        }
    }
}

/// A path shown in both trees
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportNode {
    pub name: String,
    pub path: String,
    pub kind: NodeKind,
    pub left: SideCell,
    pub right: SideCell,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<ReportNode>,
}

impl ReportNode {
    /// Whether either side shows anything but an identical entry
    pub fn differs(&self) -> bool {
        self.left.status != Status::Same || self.right.status != Status::Same
    }
}

/// Full comparison report
#[derive(Debug, Clone, Serialize)]
pub struct Report {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub left_archive: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub right_archive: Option<String>,
    pub config: EngineConfig,
    pub summary: ComparisonSummary,
    pub tree: Vec<ReportNode>,
}

impl Report {
    /// Fold a comparison into a report, optionally keeping differing rows only
    pub fn build(
        comparison: &Comparison,
        sources: Option<&Sources>,
        config: &EngineConfig,
        only_differences: bool,
    ) -> Result<Self> {
        let tree = comparison
            .left
            .roots()
            .iter()
            .map(|id| report_node(comparison, *id, only_differences))
            .filter_map(Result::transpose)
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            left_archive: sources.map(|s| s.left.display().to_string()),
            right_archive: sources.map(|s| s.right.display().to_string()),
            config: config.clone(),
            summary: comparison.summary.clone(),
            tree,
        })
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| Error::internal(format!("report serialization failed: {}", e)))
    }
}

fn report_node(
    comparison: &Comparison,
    left_id: NodeId,
    only_differences: bool,
) -> Result<Option<ReportNode>> {
    let left = comparison.left.node(left_id)?;
    let pair = comparison.index.lookup(&left.path)?;
    let right = comparison.right.node(pair.right)?;

    let children = left
        .children()
        .iter()
        .map(|id| report_node(comparison, *id, only_differences))
        .filter_map(Result::transpose)
        .collect::<Result<Vec<_>>>()?;

    let node = ReportNode {
        name: left.label.clone(),
        path: left.path.clone(),
        kind: left.kind,
        left: SideCell::from(left),
        right: SideCell::from(right),
        children,
    };

    if only_differences && !node.differs() && node.children.is_empty() {
        return Ok(None);
    }
    Ok(Some(node))
}
