//! graph-relay: import, analyse, query and export labeled graphs.

mod edgelist;

use std::fs::File;
use std::io::{self, BufReader, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use graph_relay_core::{
    components, connected_components, keys, out_degree, page_rank, DotStyle, EngineConfig, Graph,
};
use serde::Serialize;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "graph-relay", version, about = "Vertex-centric graph processing")]
struct Cli {
    /// Engine settings (TOML)
    #[arg(short, long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error); overrides RUST_LOG
    #[arg(long, global = true, value_name = "LEVEL")]
    log_level: Option<String>,

    /// Print results as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Upper bound on supersteps for iterative algorithms
    #[arg(long, global = true, value_name = "N")]
    max_supersteps: Option<u32>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Build a graph file from a plain-text edge list
    Import {
        edges: PathBuf,
        #[arg(short, long)]
        output: PathBuf,
    },
    /// Node and edge counts
    Stats { graph: PathBuf },
    /// Out-degree of every node
    Degree { graph: PathBuf },
    /// Weakly connected components
    Components { graph: PathBuf },
    /// PageRank of every node, highest first
    Pagerank {
        graph: PathBuf,
        #[arg(long)]
        reset_prob: Option<f64>,
        #[arg(long)]
        threshold: Option<f64>,
    },
    /// Print every binding of a motif such as "(a)-[e]->(b); (b)-[]->(c)"
    Motif { graph: PathBuf, query: String },
    /// Write the graph in Graphviz DOT format
    Dot { graph: PathBuf },
}

#[derive(Debug, Serialize)]
struct Stats {
    nodes: usize,
    edges: usize,
    memory_bytes: usize,
}

#[derive(Debug, Serialize)]
struct NodeScore<T> {
    node: String,
    value: T,
}

#[derive(Debug, Serialize)]
struct Components {
    supersteps: u32,
    components: Vec<Vec<String>>,
}

#[derive(Debug, Serialize)]
struct Ranks {
    supersteps: u32,
    ranks: Vec<NodeScore<f64>>,
}

#[derive(Debug, Serialize)]
struct MotifRow {
    nodes: Vec<(String, String)>,
    edges: Vec<(String, String)>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.log_level.as_deref())?;
    let stdout = io::stdout();
    run(&cli, &mut stdout.lock())
}

fn init_logging(level: Option<&str>) -> Result<()> {
    let filter = match level {
        Some(level) => EnvFilter::try_new(level)
            .with_context(|| format!("invalid log level `{level}`"))?,
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
    Ok(())
}

/// File settings first, then command-line overrides.
fn engine_config(cli: &Cli) -> Result<EngineConfig> {
    let mut config = match &cli.config {
        Some(path) => EngineConfig::load(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => EngineConfig::default(),
    };
    if let Some(max) = cli.max_supersteps {
        config.max_supersteps = max;
    }
    if let Command::Pagerank { reset_prob, threshold, .. } = &cli.command {
        if let Some(r) = reset_prob {
            config.page_rank.reset_prob = *r;
        }
        if let Some(t) = threshold {
            config.page_rank.threshold = *t;
        }
    }
    config.validate()?;
    Ok(config)
}

fn load_graph(path: &Path) -> Result<Graph<String>> {
    Graph::load(path).with_context(|| format!("loading graph {}", path.display()))
}

fn run<W: Write>(cli: &Cli, out: &mut W) -> Result<()> {
    let config = engine_config(cli)?;

    match &cli.command {
        Command::Import { edges, output } => {
            let file = File::open(edges).with_context(|| format!("opening {}", edges.display()))?;
            let graph = edgelist::read_edge_list(BufReader::new(file))
                .with_context(|| format!("parsing {}", edges.display()))?;
            graph.save(output)?;
            info!(input = %edges.display(), output = %output.display(), "imported");
            emit(out, cli.json, &stats(&graph), |out, s| {
                writeln!(
                    out,
                    "imported {} nodes, {} edges into {}",
                    s.nodes,
                    s.edges,
                    output.display()
                )
            })
        }
        Command::Stats { graph } => {
            let graph = load_graph(graph)?;
            emit(out, cli.json, &stats(&graph), |out, s| {
                writeln!(
                    out,
                    "nodes: {}\nedges: {}\nmemory: ~{} bytes",
                    s.nodes, s.edges, s.memory_bytes
                )
            })
        }
        Command::Degree { graph } => {
            let mut graph = load_graph(graph)?;
            out_degree(&mut graph)?;
            let mut degrees = Vec::with_capacity(graph.node_count());
            for n in graph.nodes_iter() {
                degrees.push(NodeScore {
                    node: n.id.clone(),
                    value: n.label.get_int(keys::OUT_DEGREE)?,
                });
            }
            degrees.sort_by(|a, b| a.node.cmp(&b.node));
            emit(out, cli.json, &degrees, |out, degrees| {
                degrees
                    .iter()
                    .try_for_each(|d| writeln!(out, "{}\t{}", d.node, d.value))
            })
        }
        Command::Components { graph } => {
            let mut graph = load_graph(graph)?;
            let convergence = connected_components(&mut graph, config.max_supersteps)?;
            let report = Components {
                supersteps: convergence.supersteps,
                components: components(&graph)?,
            };
            emit(out, cli.json, &report, |out, r| {
                for group in &r.components {
                    writeln!(out, "{}", group.join(" "))?;
                }
                Ok(())
            })
        }
        Command::Pagerank { graph, .. } => {
            let mut graph = load_graph(graph)?;
            let convergence = page_rank(&mut graph, &config.page_rank, config.max_supersteps)?;
            let mut ranks = Vec::with_capacity(graph.node_count());
            for n in graph.nodes_iter() {
                ranks.push(NodeScore {
                    node: n.id.clone(),
                    value: n.label.get_float(keys::PAGE_RANK)?,
                });
            }
            ranks.sort_by(|a, b| b.value.total_cmp(&a.value).then_with(|| a.node.cmp(&b.node)));
            let report = Ranks {
                supersteps: convergence.supersteps,
                ranks,
            };
            emit(out, cli.json, &report, |out, r| {
                r.ranks
                    .iter()
                    .try_for_each(|s| writeln!(out, "{}\t{:.6}", s.node, s.value))
            })
        }
        Command::Motif { graph, query } => {
            let graph = load_graph(graph)?;
            let matches = graph.find(query)?;
            let rows: Vec<MotifRow> = matches
                .iter()
                .map(|m| MotifRow {
                    nodes: m.nodes().map(|(k, v)| (k.to_string(), v.clone())).collect(),
                    edges: m
                        .edges()
                        .map(|(k, e)| {
                            let edge = format!("{} -> {} [{}]", e.src, e.dst, e.label.name());
                            (k.to_string(), edge)
                        })
                        .collect(),
                })
                .collect();
            emit(out, cli.json, &rows, |out, rows| {
                for row in rows {
                    let fields: Vec<String> = row
                        .nodes
                        .iter()
                        .chain(&row.edges)
                        .map(|(k, v)| format!("{k}={v}"))
                        .collect();
                    writeln!(out, "{}", fields.join("\t"))?;
                }
                Ok(())
            })
        }
        Command::Dot { graph } => {
            let graph = load_graph(graph)?;
            graph.write_dot(&mut *out, &DotStyle::default())?;
            Ok(())
        }
    }
}

fn stats(graph: &Graph<String>) -> Stats {
    Stats {
        nodes: graph.node_count(),
        edges: graph.edge_count(),
        memory_bytes: graph.memory_usage(),
    }
}

/// Print `value` as pretty JSON or through the plain-text formatter.
fn emit<W, T, F>(out: &mut W, json: bool, value: &T, text: F) -> Result<()>
where
    W: Write,
    T: Serialize + ?Sized,
    F: FnOnce(&mut W, &T) -> io::Result<()>,
{
    if json {
        serde_json::to_writer_pretty(&mut *out, value)?;
        writeln!(out)?;
    } else {
        text(out, value)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    const EDGES: &str = "A B\nA C\nB C\nC D\nD A\nE\n";

    fn run_args(args: &[&str]) -> String {
        let argv = std::iter::once("graph-relay").chain(args.iter().copied());
        let cli = Cli::try_parse_from(argv).unwrap();
        let mut out = Vec::new();
        run(&cli, &mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    fn make_graph_file(dir: &Path) -> String {
        let edges = dir.join("edges.txt");
        std::fs::write(&edges, EDGES).unwrap();
        let graph = dir.join("graph.bin");
        run_args(&["import", edges.to_str().unwrap(), "-o", graph.to_str().unwrap()]);
        graph.to_str().unwrap().to_string()
    }

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_import_then_stats() {
        let dir = tempfile::tempdir().unwrap();
        let graph = make_graph_file(dir.path());
        let out = run_args(&["stats", &graph, "--json"]);
        let v: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(v["nodes"], 5);
        assert_eq!(v["edges"], 5);
    }

    #[test]
    fn test_degree_and_components() {
        let dir = tempfile::tempdir().unwrap();
        let graph = make_graph_file(dir.path());
        assert_eq!(run_args(&["degree", &graph]), "A\t2\nB\t1\nC\t1\nD\t1\nE\t0\n");
        assert_eq!(run_args(&["components", &graph]), "A B C D\nE\n");
    }

    #[test]
    fn test_pagerank_json() {
        let dir = tempfile::tempdir().unwrap();
        let graph = make_graph_file(dir.path());
        let out = run_args(&["pagerank", &graph, "--json", "--threshold", "0.0001"]);
        let v: serde_json::Value = serde_json::from_str(&out).unwrap();
        let ranks = v["ranks"].as_array().unwrap();
        assert_eq!(ranks.len(), 5);
        let total: f64 = ranks.iter().map(|r| r["value"].as_f64().unwrap()).sum();
        assert!((total - 5.0).abs() < 0.05, "total {total}");
        assert_eq!(ranks[4]["node"], "E");
    }

    #[test]
    fn test_pagerank_bad_reset_prob() {
        let dir = tempfile::tempdir().unwrap();
        let graph = make_graph_file(dir.path());
        let argv = ["graph-relay", "pagerank", graph.as_str(), "--reset-prob", "2"];
        let cli = Cli::try_parse_from(argv).unwrap();
        assert!(run(&cli, &mut Vec::new()).is_err());
    }

    #[test]
    fn test_motif_rows() {
        let dir = tempfile::tempdir().unwrap();
        let graph = make_graph_file(dir.path());
        let out = run_args(&["motif", &graph, "(a)-[]->(b); (b)-[]->(a)"]);
        assert_eq!(out, "");
        let out = run_args(&["motif", &graph, "(x)-[]->(y); (y)-[]->(z); (z)-[]->(x)"]);
        assert_eq!(out.lines().count(), 3);
    }

    #[test]
    fn test_dot() {
        let dir = tempfile::tempdir().unwrap();
        let graph = make_graph_file(dir.path());
        let out = run_args(&["dot", &graph]);
        assert!(out.starts_with("digraph"));
        assert_eq!(out.matches("->").count(), 5);
        assert!(out.contains("    \"E\";"));
    }

    #[test]
    fn test_config_file_applies() {
        let dir = tempfile::tempdir().unwrap();
        let graph = make_graph_file(dir.path());
        let config = dir.path().join("engine.toml");
        std::fs::write(&config, "max_supersteps = 1\n").unwrap();
        let argv = [
            "graph-relay",
            "--config",
            config.to_str().unwrap(),
            "components",
            graph.as_str(),
        ];
        let cli = Cli::try_parse_from(argv).unwrap();
        assert!(run(&cli, &mut Vec::new()).is_err());
    }
}
