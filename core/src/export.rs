//! Graphviz DOT rendering.

use std::io;

use crate::graph::{Graph, NodeKey, NodeView};
use crate::label::Label;

type NodeRenderer<N> = Box<dyn Fn(NodeView<'_, N>) -> String>;
type EdgeRenderer<N> = Box<dyn Fn(NodeView<'_, N>, NodeView<'_, N>, &Label) -> String>;

/// How nodes and edges are printed. Without renderers, nodes print as their
/// `Display` form and edges as their label name.
pub struct DotStyle<N> {
    pub graph_name: String,
    node_renderer: Option<NodeRenderer<N>>,
    edge_renderer: Option<EdgeRenderer<N>>,
}

impl<N> Default for DotStyle<N> {
    fn default() -> Self {
        Self {
            graph_name: "G".to_string(),
            node_renderer: None,
            edge_renderer: None,
        }
    }
}

impl<N: NodeKey> DotStyle<N> {
    pub fn with_node_renderer(mut self, f: impl Fn(NodeView<'_, N>) -> String + 'static) -> Self {
        self.node_renderer = Some(Box::new(f));
        self
    }

    pub fn with_edge_renderer(
        mut self,
        f: impl Fn(NodeView<'_, N>, NodeView<'_, N>, &Label) -> String + 'static,
    ) -> Self {
        self.edge_renderer = Some(Box::new(f));
        self
    }

    fn node(&self, view: NodeView<'_, N>) -> String {
        match &self.node_renderer {
            Some(f) => f(view),
            None => view.id.to_string(),
        }
    }

    fn edge(&self, src: NodeView<'_, N>, dst: NodeView<'_, N>, label: &Label) -> String {
        match &self.edge_renderer {
            Some(f) => f(src, dst, label),
            None => label.name().to_string(),
        }
    }
}

fn quote(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            _ => out.push(c),
        }
    }
    out.push('"');
    out
}

impl<N: NodeKey> Graph<N> {
    /// Write the graph as a DOT `digraph`: one statement per edge, plus one
    /// per node that no edge touches.
    pub fn write_dot<W: io::Write>(&self, mut out: W, style: &DotStyle<N>) -> io::Result<()> {
        let mut touched = vec![false; self.nodes.len()];
        writeln!(out, "digraph {} {{", quote(&style.graph_name))?;

        for e in &self.edges {
            touched[e.src] = true;
            touched[e.dst] = true;
            let (src, dst) = (self.view(e.src), self.view(e.dst));
            writeln!(
                out,
                "    {} -> {} [label={}];",
                quote(&style.node(src)),
                quote(&style.node(dst)),
                quote(&style.edge(src, dst, &e.label))
            )?;
        }

        for (slot, _) in touched.iter().enumerate().filter(|(_, t)| !**t) {
            writeln!(out, "    {};", quote(&style.node(self.view(slot))))?;
        }

        writeln!(out, "}}")?;
        out.flush()
    }

    pub fn to_dot(&self, style: &DotStyle<N>) -> io::Result<String> {
        let mut buf = Vec::new();
        self.write_dot(&mut buf, style)?;
        String::from_utf8(buf).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algorithms::out_degree;
    use crate::label::keys;

    fn make_pair() -> Graph<String> {
        Graph::from_parts(
            vec![("A".to_string(), "B".to_string(), Label::new("KNOWS"))],
            vec!["Z".to_string()],
        )
    }

    #[test]
    fn test_default_style() {
        let dot = make_pair().to_dot(&DotStyle::default()).unwrap();
        assert_eq!(
            dot,
            "digraph \"G\" {\n    \"A\" -> \"B\" [label=\"KNOWS\"];\n    \"Z\";\n}\n"
        );
    }

    #[test]
    fn test_custom_renderers() {
        let mut g = make_pair();
        out_degree(&mut g).unwrap();
        let style = DotStyle::<String>::default()
            .with_node_renderer(|n| {
                format!("{} ({})", n.id, n.label.get_int(keys::OUT_DEGREE).unwrap_or(-1))
            })
            .with_edge_renderer(|src, dst, e| format!("{}:{}->{}", e.name(), src.id, dst.id));
        let dot = g.to_dot(&style).unwrap();
        assert!(dot.contains("\"A (1)\" -> \"B (0)\" [label=\"KNOWS:A->B\"];"));
        assert!(dot.contains("    \"Z (0)\";"));
    }

    #[test]
    fn test_escaping() {
        let g: Graph<String> = Graph::from_parts(
            vec![("say \"hi\"".to_string(), "back\\slash".to_string(), Label::new("a\nb"))],
            Vec::new(),
        );
        let dot = g.to_dot(&DotStyle::default()).unwrap();
        assert!(dot.contains(r#""say \"hi\"" -> "back\\slash" [label="a\nb"];"#));
    }

    #[test]
    fn test_write_dot_matches_to_dot() {
        let g = make_pair();
        let style = DotStyle::default();
        let mut buf = Vec::new();
        g.write_dot(&mut buf, &style).unwrap();
        assert_eq!(String::from_utf8(buf).unwrap(), g.to_dot(&style).unwrap());
    }

    struct BrokenPipe;

    impl io::Write for BrokenPipe {
        fn write(&mut self, _: &[u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::BrokenPipe, "closed"))
        }
        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_write_dot_reports_writer_errors() {
        let err = make_pair().write_dot(BrokenPipe, &DotStyle::default()).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::BrokenPipe);
    }

    #[test]
    fn test_parallel_edges_and_empty_graph() {
        let g: Graph<u64> = Graph::from_parts(
            vec![(1, 2, Label::new("X")), (1, 2, Label::new("Y"))],
            Vec::new(),
        );
        let dot = g.to_dot(&DotStyle::default()).unwrap();
        assert_eq!(dot.matches("->").count(), 2);

        let empty: Graph<u64> = Graph::new();
        assert_eq!(empty.to_dot(&DotStyle::default()).unwrap(), "digraph \"G\" {\n}\n");
    }
}
