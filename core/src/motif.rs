//! Structural pattern ("motif") queries.
//!
//! A query is a `;`-separated list of patterns `(a)-[e]->(b)`, each slot
//! optionally naming a node or edge variable. Every pattern is expanded
//! into a table over the edge list, and the tables are joined on shared
//! variable names. Nodes bind by identity value, edges by position in the
//! edge list, so two parallel edges with equal labels stay distinct.

use std::collections::{BTreeMap, HashMap};

use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::{GraphError, Result};
use crate::graph::{EdgeView, Graph, NodeKey};

const PATTERN_RE: &str = r"^\(\s*([A-Za-z_][A-Za-z0-9_]*)?\s*\)\s*-\s*\[\s*([A-Za-z_][A-Za-z0-9_]*)?\s*\]\s*->\s*\(\s*([A-Za-z_][A-Za-z0-9_]*)?\s*\)$";

static PATTERN: Lazy<std::result::Result<Regex, regex::Error>> =
    Lazy::new(|| Regex::new(PATTERN_RE));

/// One parsed `(src)-[edge]->(dst)` pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pattern {
    pub src: Option<String>,
    pub edge: Option<String>,
    pub dst: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SlotKind {
    Node,
    Edge,
}

/// Parse a motif query. Empty segments are skipped; a query with no
/// patterns, a malformed pattern, or a name used both as a node and as an
/// edge is an error.
pub fn parse_motif(motif: &str) -> Result<Vec<Pattern>> {
    parse_with_kinds(motif).map(|(patterns, _)| patterns)
}

fn parse_with_kinds(motif: &str) -> Result<(Vec<Pattern>, HashMap<String, SlotKind>)> {
    let re = PATTERN
        .as_ref()
        .map_err(|e| GraphError::motif(motif, e.to_string()))?;

    let mut patterns = Vec::new();
    for raw in motif.split(';') {
        let p = raw.trim();
        if p.is_empty() {
            continue;
        }
        let caps = re
            .captures(p)
            .ok_or_else(|| GraphError::motif(p, diagnose(p)))?;
        let slot = |i: usize| caps.get(i).map(|m| m.as_str().to_string());
        patterns.push(Pattern {
            src: slot(1),
            edge: slot(2),
            dst: slot(3),
        });
    }

    if patterns.is_empty() {
        return Err(GraphError::motif(motif, "no patterns"));
    }
    let kinds = slot_kinds(&patterns)?;
    Ok((patterns, kinds))
}

/// Best-effort reason for a pattern the grammar rejected.
fn diagnose(p: &str) -> &'static str {
    let count = |c: char| p.chars().filter(|&x| x == c).count();
    if count('(') != count(')') {
        "unbalanced parentheses"
    } else if count('[') != count(']') {
        "unbalanced square brackets"
    } else if !p.contains("->") {
        "missing '->'"
    } else if count('(') != 2 || count('[') != 1 {
        "expected exactly two node slots and one edge slot"
    } else {
        "expected `(src)-[edge]->(dst)` with identifier or empty slots"
    }
}

fn slot_kinds(patterns: &[Pattern]) -> Result<HashMap<String, SlotKind>> {
    let mut kinds: HashMap<String, SlotKind> = HashMap::new();
    for p in patterns {
        let slots = [
            (&p.src, SlotKind::Node),
            (&p.edge, SlotKind::Edge),
            (&p.dst, SlotKind::Node),
        ];
        for (name, kind) in slots {
            let Some(name) = name else { continue };
            match kinds.get(name) {
                Some(&existing) if existing != kind => {
                    return Err(GraphError::motif(
                        name,
                        "name used both as a node and as an edge",
                    ));
                }
                Some(_) => {}
                None => {
                    kinds.insert(name.clone(), kind);
                }
            }
        }
    }
    Ok(kinds)
}

/// Column index for a named slot, appending a new column on first use.
fn column_for(columns: &mut Vec<String>, name: &Option<String>) -> Option<usize> {
    let name = name.as_ref()?;
    match columns.iter().position(|c| c == name) {
        Some(col) => Some(col),
        None => {
            columns.push(name.clone());
            Some(columns.len() - 1)
        }
    }
}

/// Intermediate relation: named columns over node slots / edge positions.
struct Table {
    columns: Vec<String>,
    rows: Vec<Vec<usize>>,
}

impl Table {
    fn from_pattern<N: NodeKey>(graph: &Graph<N>, p: &Pattern) -> Table {
        let mut columns: Vec<String> = Vec::new();
        let src_col = column_for(&mut columns, &p.src);
        let edge_col = column_for(&mut columns, &p.edge);
        let dst_col = column_for(&mut columns, &p.dst);

        let mut rows = Vec::new();
        'edges: for (pos, e) in graph.edges.iter().enumerate() {
            let mut row: Vec<Option<usize>> = vec![None; columns.len()];
            let bindings = [(src_col, e.src), (edge_col, pos), (dst_col, e.dst)];
            for (col, value) in bindings {
                let Some(col) = col else { continue };
                let current = row[col];
                match current {
                    Some(bound) if bound != value => continue 'edges,
                    _ => row[col] = Some(value),
                }
            }
            rows.push(row.into_iter().flatten().collect());
        }

        // Nothing to bind: one empty row if any edge exists, none otherwise.
        if columns.is_empty() {
            rows.truncate(1);
        }

        Table { columns, rows }
    }

    /// Inner hash join on shared columns; a cross product when none are shared.
    fn join(self, right: Table) -> Table {
        let shared: Vec<(usize, usize)> = self
            .columns
            .iter()
            .enumerate()
            .filter_map(|(li, name)| {
                right
                    .columns
                    .iter()
                    .position(|c| c == name)
                    .map(|ri| (li, ri))
            })
            .collect();
        let extra: Vec<usize> = (0..right.columns.len())
            .filter(|ri| !shared.iter().any(|&(_, r)| r == *ri))
            .collect();

        let mut buckets: HashMap<Vec<usize>, Vec<usize>> = HashMap::new();
        for (i, row) in right.rows.iter().enumerate() {
            let key = shared.iter().map(|&(_, ri)| row[ri]).collect();
            buckets.entry(key).or_default().push(i);
        }

        let mut rows = Vec::new();
        for left in &self.rows {
            let key: Vec<usize> = shared.iter().map(|&(li, _)| left[li]).collect();
            if let Some(matches) = buckets.get(&key) {
                for &i in matches {
                    let mut row = left.clone();
                    row.extend(extra.iter().map(|&ri| right.rows[i][ri]));
                    rows.push(row);
                }
            }
        }

        let mut columns = self.columns;
        columns.extend(extra.iter().map(|&ri| right.columns[ri].clone()));
        Table { columns, rows }
    }
}

/// One consistent assignment of every named slot.
#[derive(Debug, Clone)]
pub struct MotifMatch<'g, N> {
    nodes: BTreeMap<String, &'g N>,
    edges: BTreeMap<String, EdgeView<'g, N>>,
}

impl<'g, N> MotifMatch<'g, N> {
    pub fn node(&self, name: &str) -> Option<&'g N> {
        self.nodes.get(name).copied()
    }

    pub fn edge(&self, name: &str) -> Option<EdgeView<'g, N>> {
        self.edges.get(name).copied()
    }

    pub fn nodes(&self) -> impl Iterator<Item = (&str, &'g N)> + '_ {
        self.nodes.iter().map(|(k, v)| (k.as_str(), *v))
    }

    pub fn edges(&self) -> impl Iterator<Item = (&str, EdgeView<'g, N>)> + '_ {
        self.edges.iter().map(|(k, v)| (k.as_str(), *v))
    }
}

impl<N: NodeKey> Graph<N> {
    /// Every assignment of the motif's named slots consistent with all of
    /// its patterns at once. A pattern with no named slot only requires
    /// the graph to have at least one edge.
    pub fn find(&self, motif: &str) -> Result<Vec<MotifMatch<'_, N>>> {
        let (patterns, kinds) = parse_with_kinds(motif)?;

        let mut tables = patterns.iter().map(|p| Table::from_pattern(self, p));
        let first = match tables.next() {
            Some(t) => t,
            None => return Ok(Vec::new()),
        };
        let table = tables.fold(first, Table::join);

        let matches = table
            .rows
            .iter()
            .map(|row| {
                let mut m = MotifMatch {
                    nodes: BTreeMap::new(),
                    edges: BTreeMap::new(),
                };
                for (name, &value) in table.columns.iter().zip(row) {
                    match kinds.get(name) {
                        Some(SlotKind::Edge) => {
                            m.edges.insert(name.clone(), self.edge_view(&self.edges[value]));
                        }
                        _ => {
                            m.nodes.insert(name.clone(), &self.nodes[value].id);
                        }
                    }
                }
                m
            })
            .collect();

        Ok(matches)
    }
}
