//! Superstep message passing.
//!
//! One call to [`Graph::send_collect`] is one synchronous superstep:
//!
//! 1. Emit: every edge produces `(to_src, to_dst)` message batches from a
//!    read-only view of its endpoints and its own label.
//! 2. Aggregate: batches are appended to a per-node inbox indexed by slot.
//! 3. Collect: every node, including those with an empty inbox, is handed
//!    its full inbox exactly once and may rewrite its own label.
//!
//! The emit phase holds only shared borrows of the graph and completes
//! before the collect phase takes mutable ones, so no collector output is
//! visible to any emitter of the same round.

use tracing::trace;

use crate::error::Result;
use crate::graph::{Graph, NodeKey, NodeMut, NodeView};
use crate::label::Label;

/// Messages produced by one edge: first batch to its source, second to its
/// destination.
pub type Outbox<M> = (Vec<M>, Vec<M>);

/// Work done by a single superstep.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SuperstepStats {
    pub edges: usize,
    pub messages: usize,
    pub nodes: usize,
}

impl<N: NodeKey> Graph<N> {
    /// Run one superstep with the given emitter and collector.
    ///
    /// Message order inside one node's inbox follows edge order, but
    /// algorithms must aggregate commutatively. The first error from
    /// either callback aborts the superstep; an emitter error leaves every
    /// label untouched.
    pub fn send_collect<M, Em, Co>(
        &mut self,
        mut emitter: Em,
        mut collector: Co,
    ) -> Result<SuperstepStats>
    where
        Em: FnMut(NodeView<'_, N>, NodeView<'_, N>, &Label) -> Result<Outbox<M>>,
        Co: FnMut(NodeMut<'_, N>, Vec<M>) -> Result<()>,
    {
        let inbox = self.emit(&mut emitter)?;
        let messages = inbox.iter().map(Vec::len).sum();

        for (slot, (node, msgs)) in self.nodes.iter_mut().zip(inbox).enumerate() {
            collector(
                NodeMut {
                    id: &node.id,
                    uid: slot as u64,
                    label: &mut node.label,
                },
                msgs,
            )?;
        }

        let stats = SuperstepStats {
            edges: self.edges.len(),
            messages,
            nodes: self.nodes.len(),
        };
        trace!(
            edges = stats.edges,
            messages = stats.messages,
            nodes = stats.nodes,
            "send_collect"
        );
        Ok(stats)
    }

    /// Emit phase: route every edge's messages into per-slot inboxes.
    fn emit<M, Em>(&self, emitter: &mut Em) -> Result<Vec<Vec<M>>>
    where
        Em: FnMut(NodeView<'_, N>, NodeView<'_, N>, &Label) -> Result<Outbox<M>>,
    {
        let mut inbox: Vec<Vec<M>> = std::iter::repeat_with(Vec::new)
            .take(self.nodes.len())
            .collect();

        for e in &self.edges {
            let (to_src, to_dst) = emitter(self.view(e.src), self.view(e.dst), &e.label)?;
            inbox[e.src].extend(to_src);
            inbox[e.dst].extend(to_dst);
        }

        Ok(inbox)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::GraphError;
    use crate::label::keys;

    fn make_star(center: u64, leaves: u64) -> Graph<u64> {
        let mut g = Graph::new();
        g.add_edges((1..=leaves).map(|i| (center, center + i, Label::new("HAS"))));
        g
    }

    #[test]
    fn test_messages_routed_to_both_endpoints() {
        let mut g = make_star(0, 3);
        let mut received: Vec<(u64, Vec<String>)> = Vec::new();
        g.send_collect(
            |src, dst, _| {
                Ok((
                    vec![format!("to {}", src.id)],
                    vec![format!("to {}", dst.id)],
                ))
            },
            |node, msgs| {
                received.push((*node.id, msgs));
                Ok(())
            },
        )
        .unwrap();

        received.sort();
        assert_eq!(received[0], (0, vec!["to 0".to_string(); 3]));
        for (id, msgs) in &received[1..] {
            assert_eq!(msgs, &vec![format!("to {}", id)]);
        }
    }

    #[test]
    fn test_every_node_collected_once_even_without_messages() {
        let mut g = make_star(0, 2);
        g.add_nodes(vec![50, 51]);
        let mut calls: Vec<(u64, usize)> = Vec::new();
        let stats = g
            .send_collect(
                |_, _, _| Ok((Vec::<()>::new(), vec![()])),
                |node, msgs| {
                    calls.push((*node.id, msgs.len()));
                    Ok(())
                },
            )
            .unwrap();

        calls.sort();
        assert_eq!(calls, vec![(0, 0), (1, 1), (2, 1), (50, 0), (51, 0)]);
        assert_eq!(stats, SuperstepStats { edges: 2, messages: 2, nodes: 5 });
    }

    #[test]
    fn test_parallel_edges_each_emit() {
        let mut g: Graph<u64> = Graph::new();
        g.add_edges(vec![
            (0, 1, Label::new("IMPLIES")),
            (0, 1, Label::new("SUPPORTS")),
            (0, 1, Label::new("CONTRADICTS")),
        ]);
        g.send_collect(
            |_, _, e| Ok((vec![], vec![e.name().to_string()])),
            |node, mut msgs| {
                msgs.sort();
                node.label.set("seen", msgs.join(","));
                Ok(())
            },
        )
        .unwrap();
        assert_eq!(
            g.label(&1).unwrap().get_text("seen").unwrap(),
            "CONTRADICTS,IMPLIES,SUPPORTS"
        );
        assert_eq!(g.label(&0).unwrap().get_text("seen").unwrap(), "");
    }

    #[test]
    fn test_self_loop_delivers_both_batches() {
        let mut g: Graph<u64> = Graph::new();
        g.add_edges(vec![(0, 0, Label::new("SELF"))]);
        g.send_collect(
            |_, _, _| Ok((vec![1i64], vec![10i64])),
            |node, msgs| {
                node.label.set("sum", msgs.iter().sum::<i64>());
                Ok(())
            },
        )
        .unwrap();
        assert_eq!(g.label(&0).unwrap().get_int("sum").unwrap(), 11);
    }

    #[test]
    fn test_emitters_see_pre_round_state() {
        // Chain 0→1→2. Every node copies its predecessor's value. With a
        // barrier, one round shifts values by exactly one hop.
        let mut g: Graph<u64> = Graph::new();
        g.add_edges(vec![(0, 1, Label::new("NEXT")), (1, 2, Label::new("NEXT"))]);
        g.update_nodes(|n| {
            n.label.set("v", *n.id as i64 * 100);
            Ok(())
        })
        .unwrap();

        g.send_collect(
            |src, _, _| Ok((vec![], vec![src.label.get_int("v")?])),
            |node, msgs| {
                if let Some(&v) = msgs.first() {
                    node.label.set("v", v);
                }
                Ok(())
            },
        )
        .unwrap();

        assert_eq!(g.label(&0).unwrap().get_int("v").unwrap(), 0);
        assert_eq!(g.label(&1).unwrap().get_int("v").unwrap(), 0);
        assert_eq!(g.label(&2).unwrap().get_int("v").unwrap(), 100);
    }

    #[test]
    fn test_emitter_error_leaves_labels_untouched() {
        let mut g = make_star(0, 2);
        let result = g.send_collect(
            |src, _, _| Ok((vec![src.label.get_float(keys::PAGE_RANK)?], vec![])),
            |node, _| {
                node.label.set(keys::HALT, true);
                Ok(())
            },
        );
        assert!(matches!(result, Err(GraphError::MissingAttribute { .. })));
        assert!(g.nodes_iter().all(|n| !n.label.contains(keys::HALT)));
    }

    #[test]
    fn test_empty_graph() {
        let mut g: Graph<u64> = Graph::new();
        let stats = g
            .send_collect(|_, _, _| Ok((vec![()], vec![()])), |_, _| Ok(()))
            .unwrap();
        assert_eq!(stats, SuperstepStats::default());
    }
}
