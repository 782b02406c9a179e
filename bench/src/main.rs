use clap::{Parser, ValueEnum};
use graph_relay_core::{
    connected_components, out_degree, page_rank, Graph, Label, PageRankConfig,
    DEFAULT_MAX_SUPERSTEPS,
};
use std::collections::VecDeque;
use std::time::Instant;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Mode {
    /// Run all generators and benchmark each
    All,
    /// Fractal branching tree (deep paths)
    Lsystem,
    /// Preferential attachment via edge sampling (hub-and-spoke)
    Scalefree,
    /// Watts-Strogatz ring lattice + shortcuts
    Smallworld,
    /// Erdos-Renyi uniform random edges
    Random,
    /// Two dense cliques connected by a thin bridge
    Barbell,
    /// Diffusion-limited aggregation (organic branching)
    Dla,
}

#[derive(Debug, Parser)]
#[command(name = "graph-relay-bench", about = "Time superstep algorithms on synthetic graphs")]
struct Args {
    #[arg(value_enum, default_value = "all")]
    mode: Mode,

    #[arg(default_value_t = 100_000)]
    node_count: u64,

    /// Also time the two-hop motif query (row count grows with degree squared)
    #[arg(long)]
    motif: bool,

    #[arg(long, default_value_t = DEFAULT_MAX_SUPERSTEPS)]
    max_supersteps: u32,
}

type Generator = fn(u64) -> Graph<u64>;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();

    let args = Args::parse();

    println!("graph-relay-bench");
    println!("=================");
    println!();

    let generators: Vec<(&str, Generator)> = match args.mode {
        Mode::Lsystem => vec![("L-system tree", gen_lsystem)],
        Mode::Scalefree => vec![("Scale-free (edge sampling)", gen_scale_free)],
        Mode::Smallworld => vec![("Small-world (Watts-Strogatz)", gen_small_world)],
        Mode::Random => vec![("Erdos-Renyi random", gen_random)],
        Mode::Barbell => vec![("Barbell (clique-bridge-clique)", gen_barbell)],
        Mode::Dla => vec![("DLA (organic branching)", gen_dla)],
        Mode::All => vec![
            ("L-system tree", gen_lsystem as Generator),
            ("Scale-free (edge sampling)", gen_scale_free),
            ("Small-world (Watts-Strogatz)", gen_small_world),
            ("Erdos-Renyi random", gen_random),
            ("Barbell (clique-bridge-clique)", gen_barbell),
            ("DLA (organic branching)", gen_dla),
        ],
    };

    for (name, generator) in generators {
        run_benchmark(name, generator, &args);
    }
}

fn run_benchmark(name: &str, generator: Generator, args: &Args) {
    println!("--- {} ---", name);
    println!("Target: {} nodes", args.node_count);

    let t = Instant::now();
    let mut graph = generator(args.node_count);
    println!(
        "Generated in {:.2}s: {} nodes, {} edges, ~{:.0}MB",
        t.elapsed().as_secs_f64(),
        graph.node_count(),
        graph.edge_count(),
        graph.memory_usage() as f64 / 1_048_576.0
    );
    info!(name, nodes = graph.node_count(), edges = graph.edge_count(), "generated");

    println!();
    println!("{:>20} {:>12} {:>12}", "algorithm", "supersteps", "time");
    println!("{:->20} {:->12} {:->12}", "", "", "");

    let t = Instant::now();
    match out_degree(&mut graph) {
        Ok(_) => print_row("out_degree", 1, t),
        Err(e) => error!(%e, "out_degree failed"),
    }

    let t = Instant::now();
    match connected_components(&mut graph, args.max_supersteps) {
        Ok(c) => print_row("connected_components", c.supersteps, t),
        Err(e) => error!(%e, "connected_components failed"),
    }

    let t = Instant::now();
    match page_rank(&mut graph, &PageRankConfig::default(), args.max_supersteps) {
        Ok(c) => print_row("page_rank", c.supersteps, t),
        Err(e) => error!(%e, "page_rank failed"),
    }

    if args.motif {
        let t = Instant::now();
        match graph.find("(a)-[]->(b); (b)-[]->(c)") {
            Ok(rows) => println!(
                "{:>20} {:>12} {:>10.1}ms",
                format!("motif ({} rows)", rows.len()),
                "-",
                t.elapsed().as_secs_f64() * 1000.0
            ),
            Err(e) => error!(%e, "motif query failed"),
        }
    }
    println!();
}

fn print_row(name: &str, supersteps: u32, started: Instant) {
    println!(
        "{:>20} {:>12} {:>10.1}ms",
        name,
        supersteps,
        started.elapsed().as_secs_f64() * 1000.0
    );
}

// ---------------------------------------------------------------------------
// Generators: all O(n) or O(n + edges), single-threaded, deterministic
// ---------------------------------------------------------------------------

/// Simple LCG for deterministic, fast pseudo-random numbers.
struct FastRng(u64);

impl FastRng {
    fn new(seed: u64) -> Self {
        Self(seed)
    }
    fn next(&mut self, max: u64) -> u64 {
        self.0 = self.0.wrapping_mul(6364136223846793005).wrapping_add(1);
        (self.0 >> 33) % max
    }
    fn next_f64(&mut self) -> f64 {
        self.0 = self.0.wrapping_mul(6364136223846793005).wrapping_add(1);
        (self.0 >> 11) as f64 / (1u64 << 53) as f64
    }
    fn rel(&mut self) -> Label {
        Label::new(REL_TYPES[self.next(REL_TYPES.len() as u64) as usize])
    }
}

const REL_TYPES: [&str; 5] = ["IMPLIES", "SUPPORTS", "CONTRADICTS", "RELATED_TO", "REQUIRES"];

/// L-system fractal tree: each node spawns three children. Long chains make
/// component labels travel many supersteps.
fn gen_lsystem(node_count: u64) -> Graph<u64> {
    let mut graph = Graph::with_capacity(node_count as usize, node_count as usize);
    let mut rng = FastRng::new(42);
    graph.add_nodes([0]);

    let branching = 3u64;
    let mut next_id: u64 = 1;
    let mut frontier: Vec<u64> = vec![0];

    while next_id < node_count && !frontier.is_empty() {
        let mut next_frontier = Vec::with_capacity(frontier.len() * branching as usize);
        for &parent in &frontier {
            for _ in 0..branching {
                if next_id >= node_count {
                    break;
                }
                let child = next_id;
                next_id += 1;
                graph.add_edges([(parent, child, rng.rel())]);
                next_frontier.push(child);
            }
        }
        frontier = next_frontier;
    }

    graph
}

/// Scale-free via edge-list sampling: attach to a random endpoint of a
/// random existing edge, so high-degree nodes are picked more often.
fn gen_scale_free(node_count: u64) -> Graph<u64> {
    let edges_per_node = 10u64;
    let mut graph =
        Graph::with_capacity(node_count as usize, (node_count * edges_per_node) as usize);
    let mut rng = FastRng::new(12345);
    let mut edge_endpoints: Vec<u64> =
        Vec::with_capacity((node_count * edges_per_node * 2) as usize);

    let seed = 5u64.min(node_count);
    graph.add_nodes(0..seed);
    for i in 0..seed {
        for j in (i + 1)..seed {
            graph.add_edges([(i, j, rng.rel())]);
            edge_endpoints.push(i);
            edge_endpoints.push(j);
        }
    }

    for new_node in seed..node_count {
        graph.add_nodes([new_node]);
        if edge_endpoints.is_empty() {
            continue;
        }
        for _ in 0..edges_per_node.min(new_node) {
            let target = edge_endpoints[rng.next(edge_endpoints.len() as u64) as usize];
            if target != new_node {
                graph.add_edges([(new_node, target, rng.rel())]);
                edge_endpoints.push(new_node);
                edge_endpoints.push(target);
            }
        }
    }

    graph
}

/// Small-world (Watts-Strogatz): ring lattice with forward links to the K
/// nearest neighbours, each rewired with probability p.
fn gen_small_world(node_count: u64) -> Graph<u64> {
    let k = 10u64;
    let p = 0.05f64;
    let mut graph = Graph::with_capacity(node_count as usize, (node_count * k) as usize);
    let mut rng = FastRng::new(67890);
    graph.add_nodes(0..node_count);

    for i in 0..node_count {
        for j in 1..=k {
            let neighbor = (i + j) % node_count;
            let rel = rng.rel();
            let target = if rng.next_f64() < p {
                match rng.next(node_count) {
                    rewired if rewired != i => rewired,
                    _ => neighbor,
                }
            } else {
                neighbor
            };
            graph.add_edges([(i, target, rel)]);
        }
    }

    graph
}

/// Erdos-Renyi: ~10 uniform random edges per node, no structure.
fn gen_random(node_count: u64) -> Graph<u64> {
    let target_edges = node_count * 10;
    let mut graph = Graph::with_capacity(node_count as usize, target_edges as usize);
    let mut rng = FastRng::new(54321);
    graph.add_nodes(0..node_count);

    for _ in 0..target_edges {
        let from = rng.next(node_count);
        let to = rng.next(node_count);
        if from != to {
            graph.add_edges([(from, to, rng.rel())]);
        }
    }

    graph
}

/// Barbell: two dense clusters joined by a chain of ten or eleven nodes
/// (an odd remainder goes to the chain). Component tags must cross the
/// bridge, so this is the slowest shape to converge.
fn gen_barbell(node_count: u64) -> Graph<u64> {
    let clique_size = node_count.saturating_sub(10) / 2;
    let bridge_len = node_count - 2 * clique_size;
    let mut graph =
        Graph::with_capacity(node_count as usize, (clique_size * 40 + bridge_len) as usize);
    let mut rng = FastRng::new(99999);
    if clique_size == 0 {
        graph.add_nodes(0..node_count);
        return graph;
    }

    let b_start = clique_size + bridge_len;
    graph.add_nodes(0..b_start + clique_size);

    for base in [0, b_start] {
        for i in 0..clique_size {
            for _ in 0..20u64.min(clique_size - 1) {
                let target = rng.next(clique_size);
                if target != i {
                    graph.add_edges([(base + i, base + target, rng.rel())]);
                }
            }
        }
    }

    // Bridge chain from the last node of the first cluster to the first of the second.
    graph.add_edges([(clique_size - 1, clique_size, Label::new("BRIDGES"))]);
    for id in clique_size + 1..b_start {
        graph.add_edges([(id - 1, id, Label::new("NEXT"))]);
    }
    graph.add_edges([(b_start - 1, b_start, Label::new("BRIDGES"))]);

    graph
}

/// Diffusion-limited aggregation, simplified: each new node attaches to a
/// recent "surface" node, with an occasional second long-range link.
fn gen_dla(node_count: u64) -> Graph<u64> {
    let mut graph = Graph::with_capacity(node_count as usize, (node_count * 2) as usize);
    let mut rng = FastRng::new(77777);
    graph.add_nodes([0]);

    let surface_max = 10_000usize;
    let mut surface: VecDeque<u64> = VecDeque::with_capacity(surface_max + 1);
    surface.push_back(0);

    for new_node in 1..node_count {
        let attach_to = surface[rng.next(surface.len() as u64) as usize];
        graph.add_edges([(new_node, attach_to, rng.rel())]);

        // 10% chance of a shortcut
        if rng.next(10) == 0 && new_node > 1 {
            let other = rng.next(new_node);
            if other != attach_to {
                graph.add_edges([(new_node, other, rng.rel())]);
            }
        }

        surface.push_back(new_node);
        if surface.len() > surface_max {
            surface.pop_front();
        }
    }

    graph
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generators_hit_node_count() {
        let generators = [
            gen_lsystem as Generator,
            gen_scale_free,
            gen_small_world,
            gen_random,
            gen_barbell,
            gen_dla,
        ];
        for generator in generators {
            let graph = generator(210);
            assert_eq!(graph.node_count(), 210);
            assert!(graph.edge_count() > 0);
        }
    }

    #[test]
    fn test_barbell_odd_count_keeps_every_node() {
        for n in [211, 101, 13] {
            let graph = gen_barbell(n);
            assert_eq!(graph.node_count(), n as usize);
            let bridges = graph.edges().filter(|e| e.label.name() == "BRIDGES").count();
            assert_eq!(bridges, 2);
        }
    }

    #[test]
    fn test_tree_and_barbell_are_one_component() {
        for generator in [gen_lsystem as Generator, gen_barbell] {
            let mut graph = generator(100);
            connected_components(&mut graph, DEFAULT_MAX_SUPERSTEPS).unwrap();
            assert_eq!(graph_relay_core::components(&graph).unwrap().len(), 1);
        }
    }
}
