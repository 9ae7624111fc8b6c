//! `handbook tree <code>`: print the prerequisite tree below a subject.

use std::path::Path;

use anyhow::{bail, Context, Result};
use handbook_requisites::RequisiteGraph;

use crate::cli::output;
use crate::sink;

/// Run the tree command.
pub async fn run(input: &Path, root: &str) -> Result<()> {
    let records = sink::read_records(input)
        .with_context(|| format!("failed to read {}", input.display()))?;
    let graph = RequisiteGraph::from_records(&records);

    let root = root.trim().to_ascii_uppercase();
    let Some(tree) = graph.spanning_tree(&root) else {
        bail!("subject {root} does not appear in {}", input.display());
    };

    if output::is_json() {
        output::print_json(&serde_json::to_value(&tree)?);
        return Ok(());
    }

    print!("{}", tree.render());
    if !output::is_quiet() {
        eprintln!(
            "  {} subjects reachable from {root} ({} subjects, {} requisite links in graph)",
            tree.size() - 1,
            graph.node_count(),
            graph.edge_count()
        );
    }
    Ok(())
}
