//! Plain-text edge lists.
//!
//! One entry per line: `src dst [label]` adds an edge, a lone `node` adds an
//! isolated node. `#` starts a comment; blank lines are skipped.

use std::io::BufRead;

use anyhow::{bail, Context, Result};
use graph_relay_core::{Graph, Label};

pub fn read_edge_list<R: BufRead>(reader: R) -> Result<Graph<String>> {
    let mut edges = Vec::new();
    let mut isolated = Vec::new();

    for (i, line) in reader.lines().enumerate() {
        let lineno = i + 1;
        let line = line.with_context(|| format!("reading line {lineno}"))?;
        let content = match line.split_once('#') {
            Some((before, _)) => before,
            None => &line,
        };
        let tokens: Vec<&str> = content.split_whitespace().collect();
        match tokens.as_slice() {
            [] => {}
            [node] => isolated.push(node.to_string()),
            [src, dst] => edges.push((src.to_string(), dst.to_string(), Label::new(""))),
            [src, dst, label] => edges.push((src.to_string(), dst.to_string(), Label::new(*label))),
            _ => bail!(
                "line {lineno}: expected `src dst [label]` or a single node, found {} fields",
                tokens.len()
            ),
        }
    }

    Ok(Graph::from_parts(edges, isolated))
}
