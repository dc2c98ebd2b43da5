//! Graph Analytics Engine — centrality measures, community partitions,
//! and simple-cycle enumeration over the transaction graph.
//!
//! The numeric definitions are the standard ones: normalized degree
//! centrality, Brandes' betweenness (edge weight as distance), power-
//! iteration eigenvector centrality, modularity-based communities.
//! Algorithmic non-convergence is a recoverable condition: betweenness
//! and eigenvector jointly fall back to zero for every node, and a
//! degenerate graph puts every node in community 0.

use crate::{
    config::AnalysisConfig,
    graph::TransactionGraph,
};
use petgraph::graph::NodeIndex;
use petgraph::visit::EdgeRef;
use petgraph::Direction;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, BinaryHeap, HashMap};

/// Derived per-node metrics. Recomputed on every analysis call, never
/// mutated in place.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CentralityProfile {
    pub degree: f64,
    pub in_degree: f64,
    pub out_degree: f64,
    pub betweenness: f64,
    pub eigenvector: f64,
    pub community_id: usize,
}

/// The analytics contract. Implementations may back these with any
/// graph library or hand-rolled algorithms, as long as the numeric
/// outputs match the standard definitions.
pub trait GraphAnalytics {
    fn centralities(&self, graph: &TransactionGraph) -> BTreeMap<String, CentralityProfile>;
    fn communities(&self, graph: &TransactionGraph) -> BTreeMap<String, usize>;
    fn simple_cycles(&self, graph: &TransactionGraph) -> Vec<Vec<String>>;
}

pub struct DefaultAnalytics {
    max_iter: usize,
    tolerance: f64,
    max_cycles: usize,
}

impl DefaultAnalytics {
    pub fn new(config: &AnalysisConfig) -> Self {
        Self {
            max_iter: config.eigenvector_max_iter,
            tolerance: config.eigenvector_tolerance,
            max_cycles: config.max_cycles,
        }
    }
}

impl GraphAnalytics for DefaultAnalytics {
    fn centralities(&self, graph: &TransactionGraph) -> BTreeMap<String, CentralityProfile> {
        let g = &graph.graph;
        let n = g.node_count();
        let mut profiles: BTreeMap<String, CentralityProfile> = BTreeMap::new();
        if n == 0 {
            return profiles;
        }

        // Degree centralities, normalized by (n - 1).
        let scale = if n > 1 { 1.0 / (n as f64 - 1.0) } else { 0.0 };

        // Betweenness and eigenvector stand or fall together: if the
        // power iteration does not converge, both zero out rather than
        // failing the run.
        let eigenvector = self.eigenvector_centrality(graph);
        let betweenness = match &eigenvector {
            Some(_) => self.betweenness_centrality(graph),
            None => {
                log::debug!("eigenvector centrality did not converge, zeroing centralities");
                vec![0.0; n]
            }
        };
        let eigenvector = eigenvector.unwrap_or_else(|| vec![0.0; n]);

        let communities = self.community_partition(graph);

        for index in g.node_indices() {
            let data = &g[index];
            let in_degree = g.neighbors_directed(index, Direction::Incoming).count();
            let out_degree = g.neighbors_directed(index, Direction::Outgoing).count();
            profiles.insert(
                data.name.clone(),
                CentralityProfile {
                    degree: (in_degree + out_degree) as f64 * scale,
                    in_degree: in_degree as f64 * scale,
                    out_degree: out_degree as f64 * scale,
                    betweenness: betweenness[index.index()],
                    eigenvector: eigenvector[index.index()],
                    community_id: communities[index.index()],
                },
            );
        }

        profiles
    }

    fn communities(&self, graph: &TransactionGraph) -> BTreeMap<String, usize> {
        let partition = self.community_partition(graph);
        graph
            .graph
            .node_indices()
            .map(|index| (graph.graph[index].name.clone(), partition[index.index()]))
            .collect()
    }

    fn simple_cycles(&self, graph: &TransactionGraph) -> Vec<Vec<String>> {
        let cycles = johnson_cycles(graph, self.max_cycles);
        if cycles.len() >= self.max_cycles {
            log::warn!("simple-cycle enumeration hit the cap of {}", self.max_cycles);
        }
        cycles
            .into_iter()
            .map(|cycle| {
                cycle
                    .into_iter()
                    .map(|index| graph.graph[NodeIndex::new(index)].name.clone())
                    .collect()
            })
            .collect()
    }
}

impl DefaultAnalytics {
    /// Brandes' algorithm with Dijkstra, edge weight as distance proxy,
    /// normalized by (n-1)(n-2) for a directed graph.
    fn betweenness_centrality(&self, graph: &TransactionGraph) -> Vec<f64> {
        let g = &graph.graph;
        let n = g.node_count();
        let mut centrality = vec![0.0f64; n];
        if n < 3 {
            return centrality;
        }

        for source in g.node_indices() {
            let s = source.index();
            let mut dist = vec![f64::INFINITY; n];
            let mut sigma = vec![0.0f64; n];
            let mut preds: Vec<Vec<usize>> = vec![Vec::new(); n];
            let mut order: Vec<usize> = Vec::new();
            let mut settled = vec![false; n];

            dist[s] = 0.0;
            sigma[s] = 1.0;
            let mut heap = BinaryHeap::new();
            heap.push(MinDist { dist: 0.0, node: s });

            while let Some(MinDist { dist: d, node: v }) = heap.pop() {
                if settled[v] {
                    continue;
                }
                settled[v] = true;
                order.push(v);

                for edge in g.edges(NodeIndex::new(v)) {
                    let w = edge.target().index();
                    let next = d + edge.weight().weight;
                    if next < dist[w] - 1e-12 {
                        dist[w] = next;
                        sigma[w] = sigma[v];
                        preds[w] = vec![v];
                        heap.push(MinDist { dist: next, node: w });
                    } else if (next - dist[w]).abs() <= 1e-12 && !settled[w] {
                        sigma[w] += sigma[v];
                        if !preds[w].contains(&v) {
                            preds[w].push(v);
                        }
                    }
                }
            }

            // Dependency accumulation in reverse settle order.
            let mut delta = vec![0.0f64; n];
            for &w in order.iter().rev() {
                for &v in &preds[w] {
                    delta[v] += sigma[v] / sigma[w] * (1.0 + delta[w]);
                }
                if w != s {
                    centrality[w] += delta[w];
                }
            }
        }

        let norm = 1.0 / ((n as f64 - 1.0) * (n as f64 - 2.0));
        for value in &mut centrality {
            *value *= norm;
        }
        centrality
    }

    /// Weighted power iteration along edge direction: a node is central
    /// when its weighted in-flows come from central nodes. Returns None
    /// after max_iter without convergence.
    fn eigenvector_centrality(&self, graph: &TransactionGraph) -> Option<Vec<f64>> {
        let g = &graph.graph;
        let n = g.node_count();
        if n == 0 {
            return Some(Vec::new());
        }

        let mut x = vec![1.0 / n as f64; n];
        for _ in 0..self.max_iter {
            let xlast = x.clone();
            for edge in g.edge_references() {
                let u = edge.source().index();
                let v = edge.target().index();
                x[v] += xlast[u] * edge.weight().weight;
            }
            let norm = x.iter().map(|v| v * v).sum::<f64>().sqrt();
            let norm = if norm > 0.0 { norm } else { 1.0 };
            for value in &mut x {
                *value /= norm;
            }
            let drift: f64 = x.iter().zip(&xlast).map(|(a, b)| (a - b).abs()).sum();
            if drift < n as f64 * self.tolerance {
                return Some(x);
            }
        }
        None
    }

    /// Greedy modularity over the undirected projection: single-level
    /// local moves until no move improves modularity. Deterministic
    /// (nodes visited in index order) and total (pass count bounded).
    fn community_partition(&self, graph: &TransactionGraph) -> Vec<usize> {
        let g = &graph.graph;
        let n = g.node_count();
        if n == 0 {
            return Vec::new();
        }

        // Undirected weighted adjacency.
        let mut adjacency: Vec<HashMap<usize, f64>> = vec![HashMap::new(); n];
        let mut total_weight = 0.0f64;
        for edge in g.edge_references() {
            let u = edge.source().index();
            let v = edge.target().index();
            let w = edge.weight().weight;
            if u == v {
                continue;
            }
            *adjacency[u].entry(v).or_insert(0.0) += w;
            *adjacency[v].entry(u).or_insert(0.0) += w;
            total_weight += w;
        }
        if total_weight <= 0.0 {
            return vec![0; n]; // degenerate graph: everyone in community 0
        }

        let strength: Vec<f64> = adjacency.iter().map(|nbrs| nbrs.values().sum()).collect();
        let two_m = 2.0 * total_weight;
        let mut community: Vec<usize> = (0..n).collect();
        let mut sigma_tot: Vec<f64> = strength.clone();

        const MAX_PASSES: usize = 20;
        for _ in 0..MAX_PASSES {
            let mut moved = false;
            for node in 0..n {
                let current = community[node];
                sigma_tot[current] -= strength[node];

                // Weight from this node into each neighboring community.
                let mut links: HashMap<usize, f64> = HashMap::new();
                for (&nbr, &w) in &adjacency[node] {
                    *links.entry(community[nbr]).or_insert(0.0) += w;
                }

                let gain = |c: usize| {
                    links.get(&c).copied().unwrap_or(0.0)
                        - sigma_tot[c] * strength[node] / two_m
                };
                let mut best = current;
                let mut best_gain = gain(current);
                let mut candidates: Vec<usize> = links.keys().copied().collect();
                candidates.sort_unstable();
                for c in candidates {
                    let g = gain(c);
                    if g > best_gain + 1e-12 {
                        best = c;
                        best_gain = g;
                    }
                }

                sigma_tot[best] += strength[node];
                if best != current {
                    community[node] = best;
                    moved = true;
                }
            }
            if !moved {
                break;
            }
        }

        // Renumber communities in first-seen order.
        let mut renumber: HashMap<usize, usize> = HashMap::new();
        community
            .into_iter()
            .map(|c| {
                let next = renumber.len();
                *renumber.entry(c).or_insert(next)
            })
            .collect()
    }
}

// ── Dijkstra heap entry ──────────────────────────────────────────────────────

#[derive(PartialEq)]
struct MinDist {
    dist: f64,
    node: usize,
}

impl Eq for MinDist {}

impl Ord for MinDist {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        // Min-heap over distance on top of the std max-heap.
        other
            .dist
            .total_cmp(&self.dist)
            .then_with(|| other.node.cmp(&self.node))
    }
}

impl PartialOrd for MinDist {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

// ── Simple-cycle enumeration (Johnson) ───────────────────────────────────────

/// Enumerate simple cycles, each reported once with its smallest node
/// index first. Emission stops at `cap`.
fn johnson_cycles(graph: &TransactionGraph, cap: usize) -> Vec<Vec<usize>> {
    let g = &graph.graph;
    let n = g.node_count();
    let adjacency: Vec<BTreeSet<usize>> = (0..n)
        .map(|u| {
            g.neighbors_directed(NodeIndex::new(u), Direction::Outgoing)
                .map(|v| v.index())
                .filter(|&v| v != u)
                .collect()
        })
        .collect();

    let mut cycles = Vec::new();
    for start in 0..n {
        if cycles.len() >= cap {
            break;
        }
        // Restrict the search to nodes >= start so each cycle is found
        // exactly once, rooted at its smallest node.
        let allowed: Vec<bool> = (0..n).map(|v| v >= start).collect();
        let component = scc_containing(start, &adjacency, &allowed);
        if component.len() < 2 {
            continue;
        }

        let mut state = CycleSearch {
            adjacency: &adjacency,
            component: &component,
            blocked: vec![false; n],
            block_map: vec![BTreeSet::new(); n],
            path: Vec::new(),
            cycles: &mut cycles,
            cap,
        };
        state.circuit(start, start);
    }
    cycles
}

struct CycleSearch<'a> {
    adjacency: &'a [BTreeSet<usize>],
    component: &'a BTreeSet<usize>,
    blocked: Vec<bool>,
    block_map: Vec<BTreeSet<usize>>,
    path: Vec<usize>,
    cycles: &'a mut Vec<Vec<usize>>,
    cap: usize,
}

impl CycleSearch<'_> {
    fn circuit(&mut self, v: usize, start: usize) -> bool {
        let mut found = false;
        self.path.push(v);
        self.blocked[v] = true;

        let neighbors: Vec<usize> = self.adjacency[v]
            .iter()
            .copied()
            .filter(|w| self.component.contains(w))
            .collect();
        for w in neighbors {
            if self.cycles.len() >= self.cap {
                break;
            }
            if w == start {
                self.cycles.push(self.path.clone());
                found = true;
            } else if !self.blocked[w] && self.circuit(w, start) {
                found = true;
            }
        }

        if found {
            self.unblock(v);
        } else {
            for w in self.adjacency[v].iter().filter(|w| self.component.contains(w)) {
                self.block_map[*w].insert(v);
            }
        }
        self.path.pop();
        found
    }

    fn unblock(&mut self, v: usize) {
        self.blocked[v] = false;
        let pending: Vec<usize> = self.block_map[v].iter().copied().collect();
        self.block_map[v].clear();
        for w in pending {
            if self.blocked[w] {
                self.unblock(w);
            }
        }
    }
}

/// Strongly connected component containing `root`, restricted to the
/// allowed node set (Kosaraju: forward reach ∩ backward reach).
fn scc_containing(root: usize, adjacency: &[BTreeSet<usize>], allowed: &[bool]) -> BTreeSet<usize> {
    let forward = reach(root, allowed, |v| {
        adjacency[v].iter().copied().collect::<Vec<_>>()
    });
    let backward = reach(root, allowed, |v| {
        adjacency
            .iter()
            .enumerate()
            .filter(|(_, targets)| targets.contains(&v))
            .map(|(u, _)| u)
            .collect::<Vec<_>>()
    });
    forward.intersection(&backward).copied().collect()
}

fn reach<F>(root: usize, allowed: &[bool], neighbors: F) -> BTreeSet<usize>
where
    F: Fn(usize) -> Vec<usize>,
{
    let mut seen = BTreeSet::new();
    let mut stack = vec![root];
    while let Some(v) = stack.pop() {
        if !allowed[v] || !seen.insert(v) {
            continue;
        }
        for w in neighbors(v) {
            if allowed[w] && !seen.contains(&w) {
                stack.push(w);
            }
        }
    }
    seen
}
