use std::fs;
use std::path::Path;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::Result;
use crate::graph::{Graph, NodeKey};
use crate::label::Label;

/// Serialized form of a graph: every node with its label, every edge triple.
#[derive(Debug, Serialize, Deserialize)]
pub struct GraphSnapshot<N> {
    pub nodes: Vec<(N, Label)>,
    pub edges: Vec<(N, N, Label)>,
}

impl<N: NodeKey> GraphSnapshot<N> {
    pub fn capture(graph: &Graph<N>) -> Self {
        Self {
            nodes: graph
                .nodes_iter()
                .map(|n| (n.id.clone(), n.label.clone()))
                .collect(),
            edges: graph
                .edges()
                .map(|e| (e.src.clone(), e.dst.clone(), e.label.clone()))
                .collect(),
        }
    }

    /// Nodes are added first so their stored labels win over the defaults
    /// that edge insertion would create.
    pub fn restore(self) -> Graph<N> {
        let mut graph = Graph::with_capacity(self.nodes.len(), self.edges.len());
        for (id, label) in self.nodes {
            graph.add_node_with_label(id, label);
        }
        graph.add_edges(self.edges);
        graph
    }
}

impl<N: NodeKey + Serialize + DeserializeOwned> Graph<N> {
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        Ok(bincode::serialize(&GraphSnapshot::capture(self))?)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let snapshot: GraphSnapshot<N> = bincode::deserialize(bytes)?;
        Ok(snapshot.restore())
    }

    /// Encode the whole graph in memory, then write it with a single call.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let data = self.to_bytes()?;
        fs::write(path, &data)?;
        info!(
            path = %path.display(),
            bytes = data.len(),
            nodes = self.node_count(),
            edges = self.edge_count(),
            "graph saved"
        );
        Ok(())
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let data = fs::read(path)?;
        let graph = Self::from_bytes(&data)?;
        info!(
            path = %path.display(),
            nodes = graph.node_count(),
            edges = graph.edge_count(),
            "graph loaded"
        );
        Ok(graph)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algorithms::{page_rank, PageRankConfig, DEFAULT_MAX_SUPERSTEPS};
    use crate::error::GraphError;
    use crate::label::keys;

    fn make_sample() -> Graph<String> {
        let e = |a: &str, b: &str, w: i64| {
            (a.to_string(), b.to_string(), Label::new("1").with("w", w))
        };
        Graph::from_parts(
            vec![
                e("A", "B", 1),
                e("A", "C", 2),
                e("B", "C", 3),
                e("C", "D", 4),
                e("D", "A", 5),
                e("D", "A", 5),
            ],
            vec!["E".to_string()],
        )
    }

    fn sorted_edges(g: &Graph<String>) -> Vec<(String, String, String)> {
        let mut edges: Vec<(String, String, String)> = g
            .edges()
            .map(|e| (e.src.clone(), e.dst.clone(), e.label.to_string()))
            .collect();
        edges.sort();
        edges
    }

    #[test]
    fn test_bytes_round_trip() {
        let g = make_sample();
        let restored = Graph::<String>::from_bytes(&g.to_bytes().unwrap()).unwrap();
        assert_eq!(restored.nodes(), g.nodes());
        assert_eq!(sorted_edges(&restored), sorted_edges(&g));
    }

    #[test]
    fn test_file_round_trip_keeps_algorithm_results() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("graph.bin");

        let mut g = make_sample();
        page_rank(&mut g, &PageRankConfig::default(), DEFAULT_MAX_SUPERSTEPS).unwrap();
        g.save(&path).unwrap();

        let restored = Graph::<String>::load(&path).unwrap();
        assert_eq!(restored.node_count(), 5);
        assert_eq!(restored.edge_count(), 6);
        for n in g.nodes_iter() {
            assert_eq!(restored.label(n.id).unwrap(), n.label);
        }
        assert_eq!(
            restored.label(&"E".to_string()).unwrap().get_int(keys::OUT_DEGREE).unwrap(),
            0
        );
        assert_eq!(sorted_edges(&restored), sorted_edges(&g));
    }

    #[test]
    fn test_isolated_and_empty() {
        let mut g: Graph<u64> = Graph::new();
        let restored = Graph::<u64>::from_bytes(&g.to_bytes().unwrap()).unwrap();
        assert_eq!(restored.node_count(), 0);

        g.add_nodes(vec![7, 8]);
        let restored = Graph::<u64>::from_bytes(&g.to_bytes().unwrap()).unwrap();
        assert_eq!(restored.nodes(), g.nodes());
        assert_eq!(restored.edge_count(), 0);
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let result = Graph::<u64>::load(dir.path().join("absent.bin"));
        assert!(matches!(result, Err(GraphError::Io(_))));
    }

    #[test]
    fn test_load_garbage() {
        let result = Graph::<u64>::from_bytes(&[0xff, 0x01]);
        assert!(matches!(result, Err(GraphError::Serialization(_))));
    }
}
