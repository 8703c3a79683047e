//! zipdelta comparison engine
//!
//! Reconciles two flat archive listings into a pair of structurally
//! identical trees:
//! - every path in either archive gets a node on both sides
//! - leaves are classified from size, checksum and timestamp
//! - directories report whether anything below them differs
//! - a cross-tree index maps each path to its two nodes so selection and
//!   expansion can be mirrored between the views
//!
//! # Example
//! ```no_run
//! use std::path::Path;
//! use zipdelta_engine::{EngineConfig, EngineSession};
//! use zipdelta_core::Side;
//!
//! let mut session = EngineSession::new(EngineConfig::default())?;
//! let comparison = session.run(Path::new("test1.zip"), Path::new("test2.zip"))?;
//! println!("{} differences", comparison.summary.differences());
//!
//! // Opening a directory on the left opens it on the right too
//! session.expand_path(Side::Left, "project/docs/");
//! # Ok::<(), zipdelta_core::Error>(())
//! ```

pub mod builder;
pub mod classify;
pub mod config;
pub mod index;
pub mod path;
pub mod report;
pub mod session;
pub mod sync;
pub mod tree;
pub mod view;

pub use builder::{Comparison, ComparisonSummary, compare};
pub use classify::{LeafClassification, classify_leaf};
pub use config::{ChecksumPolicy, EngineConfig};
pub use index::{CrossTreeIndex, NodePair, lookup_mirror};
pub use report::{Report, ReportNode, SideCell};
pub use session::{EngineSession, Sources};
pub use sync::{SyncGuard, SyncOutcome, SyncState, ViewChange, apply_change};
pub use tree::{PathSegmentTree, TreeNode, Walk, resolve_path};
pub use view::{DualView, ViewState};
