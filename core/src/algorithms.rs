//! Iterative algorithms expressed as emitter/collector pairs over
//! [`Graph::send_collect`].
//!
//! Each algorithm documents the label keys it reads and writes; see
//! [`crate::label::keys`].

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::engine::SuperstepStats;
use crate::error::{GraphError, Result};
use crate::graph::{Graph, NodeKey};
use crate::label::{keys, ComponentTag};

/// Upper bound on supersteps for the iterative algorithms unless configured.
pub const DEFAULT_MAX_SUPERSTEPS: u32 = 10_000;

/// Outcome of an iterative algorithm that reached a state where every
/// node reported `halt`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Convergence {
    pub supersteps: u32,
}

/// PageRank parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PageRankConfig {
    /// Probability of jumping to a random node instead of following an edge.
    pub reset_prob: f64,
    /// A node halts once its rank moves by less than this in one superstep.
    pub threshold: f64,
}

impl Default for PageRankConfig {
    fn default() -> Self {
        Self {
            reset_prob: 0.15,
            threshold: 0.001,
        }
    }
}

impl PageRankConfig {
    pub fn new(reset_prob: f64) -> Self {
        Self {
            reset_prob,
            ..Self::default()
        }
    }

    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.threshold = threshold;
        self
    }

    /// Written so that NaN fails both checks.
    pub fn validate(&self) -> Result<()> {
        if !(self.reset_prob >= 0.0 && self.reset_prob <= 1.0) {
            return Err(GraphError::InvalidArgument(format!(
                "reset_prob must satisfy 0 <= reset_prob <= 1, got {}",
                self.reset_prob
            )));
        }
        if !(self.threshold > 0.0) {
            return Err(GraphError::InvalidArgument(format!(
                "threshold must be positive, got {}",
                self.threshold
            )));
        }
        Ok(())
    }
}

fn check_bound(max_supersteps: u32) -> Result<()> {
    if max_supersteps == 0 {
        return Err(GraphError::InvalidArgument(
            "max_supersteps must be at least 1".to_string(),
        ));
    }
    Ok(())
}

/// Number of nodes whose `halt` flag is false.
pub(crate) fn count_active<N: NodeKey>(graph: &Graph<N>) -> Result<usize> {
    let mut active = 0;
    for n in graph.nodes_iter() {
        if !n.label.get_bool(keys::HALT)? {
            active += 1;
        }
    }
    Ok(active)
}

fn not_converged(algorithm: &'static str, supersteps: u32, active: usize) -> GraphError {
    warn!(algorithm, supersteps, active, "superstep bound reached before convergence");
    GraphError::NotConverged {
        algorithm,
        supersteps,
        active,
    }
}

// ---------------------------------------------------------------------------
// Out-degree
// ---------------------------------------------------------------------------

/// Count outgoing edges per node into `out_degree`. One superstep.
///
/// Writes: node `out_degree` (int).
pub fn out_degree<N: NodeKey>(graph: &mut Graph<N>) -> Result<SuperstepStats> {
    graph.send_collect(
        |_, _, _| Ok((vec![()], Vec::new())),
        |node, msgs| {
            node.label.set(keys::OUT_DEGREE, msgs.len() as i64);
            Ok(())
        },
    )
}

// ---------------------------------------------------------------------------
// Connected components
// ---------------------------------------------------------------------------

/// Label every node with the minimum component tag reachable over edges
/// followed in either direction (hash-min label propagation).
///
/// Reads/writes: node `cc` (component), node `halt` (bool).
///
/// Two nodes end with the same `cc` iff they are weakly connected. The tag
/// values themselves are the `(name, uid)` of the smallest member.
pub fn connected_components<N: NodeKey>(
    graph: &mut Graph<N>,
    max_supersteps: u32,
) -> Result<Convergence> {
    check_bound(max_supersteps)?;
    init_components(graph)?;

    let mut supersteps = 0;
    loop {
        propagate_min_component(graph)?;
        supersteps += 1;

        let active = count_active(graph)?;
        debug!(superstep = supersteps, active, "connected components");
        if active == 0 {
            break;
        }
        if supersteps >= max_supersteps {
            return Err(not_converged("connected_components", supersteps, active));
        }
    }

    info!(supersteps, nodes = graph.node_count(), "connected components converged");
    Ok(Convergence { supersteps })
}

pub(crate) fn init_components<N: NodeKey>(graph: &mut Graph<N>) -> Result<()> {
    graph.update_nodes(|n| {
        let tag = ComponentTag {
            name: n.label.name().to_string(),
            uid: n.uid,
        };
        n.label.set(keys::CC, tag);
        n.label.set(keys::HALT, true);
        Ok(())
    })
}

/// One round: each edge swaps its endpoints' tags; each node keeps the
/// smallest tag it has seen and halts if nothing smaller arrived.
pub(crate) fn propagate_min_component<N: NodeKey>(
    graph: &mut Graph<N>,
) -> Result<SuperstepStats> {
    graph.send_collect(
        |src, dst, _| {
            let src_cc = src.label.get_component(keys::CC)?.clone();
            let dst_cc = dst.label.get_component(keys::CC)?.clone();
            Ok((vec![dst_cc], vec![src_cc]))
        },
        |node, msgs| {
            let mut best = node.label.get_component(keys::CC)?.clone();
            let mut halt = true;
            for near in msgs {
                if near < best {
                    best = near;
                    halt = false;
                }
            }
            if !halt {
                node.label.set(keys::CC, best);
            }
            node.label.set(keys::HALT, halt);
            Ok(())
        },
    )
}

/// Group nodes by their `cc` tag. Groups and members are sorted.
pub fn components<N: NodeKey>(graph: &Graph<N>) -> Result<Vec<Vec<N>>> {
    let mut groups: BTreeMap<&ComponentTag, Vec<N>> = BTreeMap::new();
    for n in graph.nodes_iter() {
        groups
            .entry(n.label.get_component(keys::CC)?)
            .or_default()
            .push(n.id.clone());
    }

    let mut out: Vec<Vec<N>> = groups
        .into_values()
        .map(|mut members| {
            members.sort();
            members
        })
        .collect();
    out.sort();
    Ok(out)
}

// ---------------------------------------------------------------------------
// PageRank
// ---------------------------------------------------------------------------

/// PageRank with dangling-node redistribution.
///
/// Runs [`out_degree`] first. Writes node `page_rank` (float) and `halt`,
/// edge `traffic_prop` (float). Ranks start at 1.0, so at every superstep
/// they sum to the node count.
///
/// Parameters are validated before the graph is touched.
pub fn page_rank<N: NodeKey>(
    graph: &mut Graph<N>,
    config: &PageRankConfig,
    max_supersteps: u32,
) -> Result<Convergence> {
    config.validate()?;
    check_bound(max_supersteps)?;

    let dangling = init_page_rank(graph)?;
    let num_nodes = graph.node_count();
    debug!(nodes = num_nodes, dangling = dangling.len(), "page rank initialized");

    let mut supersteps = 0;
    loop {
        let active = count_active(graph)?;
        if active == 0 {
            break;
        }
        if supersteps >= max_supersteps {
            return Err(not_converged("page_rank", supersteps, active));
        }

        // Snapshot of the previous round's dangling mass, fixed for this round.
        let avg_dangle_rank = dangling_rank(graph, &dangling)? / num_nodes as f64;
        page_rank_superstep(graph, config, avg_dangle_rank)?;
        supersteps += 1;
        debug!(superstep = supersteps, active, avg_dangle_rank, "page rank");
    }

    info!(supersteps, nodes = num_nodes, "page rank converged");
    Ok(Convergence { supersteps })
}

/// Initialize ranks and traffic proportions. Returns the slots of dangling
/// nodes (out-degree zero).
pub(crate) fn init_page_rank<N: NodeKey>(graph: &mut Graph<N>) -> Result<Vec<usize>> {
    out_degree(graph)?;

    graph.update_nodes(|n| {
        n.label.set(keys::PAGE_RANK, 1.0);
        n.label.set(keys::HALT, false);
        Ok(())
    })?;

    // Every edge's source has out_degree >= 1, so this never divides by zero.
    graph.update_edges(|src, _, e| {
        let degree = src.label.get_int(keys::OUT_DEGREE)?;
        e.set(keys::TRAFFIC_PROP, 1.0 / degree as f64);
        Ok(())
    })?;

    let dangling = graph.filter_nodes(|n| Ok(n.label.get_int(keys::OUT_DEGREE)? == 0))?;
    Ok(dangling.nodes_iter().filter_map(|n| graph.slot(n.id)).collect())
}

fn dangling_rank<N: NodeKey>(graph: &Graph<N>, dangling: &[usize]) -> Result<f64> {
    dangling
        .iter()
        .map(|&slot| graph.view(slot).label.get_float(keys::PAGE_RANK))
        .sum()
}

pub(crate) fn page_rank_superstep<N: NodeKey>(
    graph: &mut Graph<N>,
    config: &PageRankConfig,
    avg_dangle_rank: f64,
) -> Result<SuperstepStats> {
    let reset_prob = config.reset_prob;
    let threshold = config.threshold;

    graph.send_collect(
        |src, _, e| {
            let share = src.label.get_float(keys::PAGE_RANK)? * e.get_float(keys::TRAFFIC_PROP)?;
            Ok((Vec::new(), vec![share]))
        },
        |node, incoming| {
            let old_rank = node.label.get_float(keys::PAGE_RANK)?;
            let received: f64 = incoming.iter().sum();
            let new_rank = (1.0 - reset_prob) * (received + avg_dangle_rank) + reset_prob;
            node.label.set(keys::PAGE_RANK, new_rank);
            node.label.set(keys::HALT, (new_rank - old_rank).abs() < threshold);
            Ok(())
        },
    )
}
