use crate::filter::LinkScope;
use crate::page::Page;
use std::collections::{HashMap, VecDeque};

/// Internal-link digraph over a corpus snapshot, keyed by normalised URL
///
/// Node `i` is `pages[i]` of the slice the graph was built from. Edges come
/// from both the outgoing and the incoming link lists, are deduplicated, and
/// never include self-links or targets outside the corpus.
#[derive(Debug, Clone, Default)]
pub struct LinkGraph {
    keys: Vec<String>,
    index: HashMap<String, usize>,
    adjacency: Vec<Vec<usize>>,
}

impl LinkGraph {
    pub fn from_pages(pages: &[Page], scope: &LinkScope) -> Self {
        let keys: Vec<String> = pages.iter().map(|p| scope.key(&p.url)).collect();

        let mut index = HashMap::with_capacity(keys.len());
        for (i, key) in keys.iter().enumerate() {
            index.entry(key.clone()).or_insert(i);
        }

        let mut graph = Self {
            adjacency: vec![Vec::new(); keys.len()],
            keys,
            index,
        };

        for (i, page) in pages.iter().enumerate() {
            for link in page.outgoing_links.iter().filter(|l| l.is_internal()) {
                if let Some(to) = graph.position(&scope.key(&link.target_url)) {
                    graph.add_edge(i, to);
                }
            }
            for link in page.incoming_links.iter().filter(|l| l.is_internal()) {
                if let Some(from) = graph.position(&scope.key(&link.source_url)) {
                    graph.add_edge(from, i);
                }
            }
        }

        graph
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Node index of a normalised URL
    pub fn position(&self, key: &str) -> Option<usize> {
        self.index.get(key).copied()
    }

    pub fn key(&self, node: usize) -> &str {
        &self.keys[node]
    }

    pub fn has_edge(&self, from: usize, to: usize) -> bool {
        self.adjacency[from].contains(&to)
    }

    /// Add `from -> to`; self-edges and repeats are ignored
    pub fn add_edge(&mut self, from: usize, to: usize) -> bool {
        if from == to || self.has_edge(from, to) {
            return false;
        }
        self.adjacency[from].push(to);
        true
    }

    pub fn out_degree(&self, node: usize) -> usize {
        self.adjacency[node].len()
    }

    /// Whether `to` can be reached from `from` by following edges
    pub fn reaches(&self, from: usize, to: usize) -> bool {
        if from == to {
            return true;
        }
        let mut seen = vec![false; self.len()];
        let mut queue = VecDeque::from([from]);
        seen[from] = true;

        while let Some(node) = queue.pop_front() {
            for &next in &self.adjacency[node] {
                if next == to {
                    return true;
                }
                if !seen[next] {
                    seen[next] = true;
                    queue.push_back(next);
                }
            }
        }
        false
    }

    /// Nodes that take part in at least one cycle
    ///
    /// A node is on a cycle exactly when its strongly connected component
    /// holds more than one node (self-links never become edges). Components
    /// come from an iterative Tarjan walk, so the answer does not depend on
    /// the order pages were loaded in.
    pub fn cycle_members(&self) -> Vec<bool> {
        const UNVISITED: usize = usize::MAX;

        let n = self.len();
        let mut order = vec![UNVISITED; n];
        let mut low_link = vec![0usize; n];
        let mut on_stack = vec![false; n];
        let mut in_cycle = vec![false; n];
        let mut stack: Vec<usize> = Vec::new();
        let mut frames: Vec<(usize, usize)> = Vec::new();
        let mut counter = 0usize;

        for root in 0..n {
            if order[root] != UNVISITED {
                continue;
            }
            order[root] = counter;
            low_link[root] = counter;
            counter += 1;
            stack.push(root);
            on_stack[root] = true;
            frames.push((root, 0));

            while let Some(frame) = frames.last_mut() {
                let (node, next_child) = *frame;

                if let Some(&child) = self.adjacency[node].get(next_child) {
                    frame.1 += 1;
                    if order[child] == UNVISITED {
                        order[child] = counter;
                        low_link[child] = counter;
                        counter += 1;
                        stack.push(child);
                        on_stack[child] = true;
                        frames.push((child, 0));
                    } else if on_stack[child] {
                        low_link[node] = low_link[node].min(order[child]);
                    }
                    continue;
                }

                frames.pop();
                if let Some(&(parent, _)) = frames.last() {
                    low_link[parent] = low_link[parent].min(low_link[node]);
                }
                if low_link[node] != order[node] {
                    continue;
                }

                // node roots a component: everything above it on the stack
                let mut component = Vec::new();
                while let Some(member) = stack.pop() {
                    on_stack[member] = false;
                    component.push(member);
                    if member == node {
                        break;
                    }
                }
                if component.len() > 1 {
                    for member in component {
                        in_cycle[member] = true;
                    }
                }
            }
        }

        in_cycle
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SiteConfig;
    use crate::page::Link;

    fn scope() -> LinkScope {
        LinkScope::new(&SiteConfig::default()).unwrap()
    }

    fn corpus(edges: &[(&str, &str)], nodes: &[&str]) -> Vec<Page> {
        nodes
            .iter()
            .map(|url| {
                let mut page = Page::new(*url, "");
                for (from, to) in edges.iter().filter(|(from, _)| from == url) {
                    page.outgoing_links.push(Link::internal(from, to, to));
                }
                page
            })
            .collect()
    }

    #[test]
    fn test_triangle_is_a_cycle() {
        let pages = corpus(&[("/a", "/b"), ("/b", "/c"), ("/c", "/a")], &["/a", "/b", "/c"]);
        let graph = LinkGraph::from_pages(&pages, &scope());
        assert_eq!(graph.cycle_members(), vec![true, true, true]);
    }

    #[test]
    fn test_diamond_is_not_a_cycle() {
        let pages = corpus(
            &[("/a", "/b"), ("/a", "/c"), ("/b", "/d"), ("/c", "/d")],
            &["/a", "/b", "/c", "/d"],
        );
        let graph = LinkGraph::from_pages(&pages, &scope());
        assert!(graph.cycle_members().iter().all(|member| !member));
    }

    #[test]
    fn test_only_cycle_nodes_are_marked() {
        // a -> b <-> c, c -> d
        let pages = corpus(
            &[("/a", "/b"), ("/b", "/c"), ("/c", "/b"), ("/c", "/d")],
            &["/a", "/b", "/c", "/d"],
        );
        let graph = LinkGraph::from_pages(&pages, &scope());
        assert_eq!(graph.cycle_members(), vec![false, true, true, false]);
    }

    #[test]
    fn test_cycle_members_do_not_depend_on_page_order() {
        // a <-> b plus a -> c -> b: c closes a second loop through a finished node
        let edges = [("/a", "/b"), ("/b", "/a"), ("/a", "/c"), ("/c", "/b")];
        let orders: [[&str; 3]; 6] = [
            ["/a", "/b", "/c"],
            ["/a", "/c", "/b"],
            ["/b", "/a", "/c"],
            ["/b", "/c", "/a"],
            ["/c", "/a", "/b"],
            ["/c", "/b", "/a"],
        ];
        for nodes in orders {
            let pages = corpus(&edges, &nodes);
            let graph = LinkGraph::from_pages(&pages, &scope());
            assert_eq!(graph.cycle_members(), vec![true, true, true], "order {nodes:?}");
        }
    }

    #[test]
    fn test_tail_hanging_off_a_cycle_is_not_marked() {
        // d -> a, a <-> b, b -> e
        let pages = corpus(
            &[("/d", "/a"), ("/a", "/b"), ("/b", "/a"), ("/b", "/e")],
            &["/e", "/b", "/d", "/a"],
        );
        let graph = LinkGraph::from_pages(&pages, &scope());
        assert_eq!(graph.cycle_members(), vec![false, true, false, true]);
    }

    #[test]
    fn test_incoming_lists_contribute_edges() {
        let mut pages = corpus(&[], &["/a", "/b"]);
        pages[1].incoming_links.push(Link::internal("/a", "/b", "b"));
        let graph = LinkGraph::from_pages(&pages, &scope());
        assert!(graph.has_edge(0, 1));
        assert_eq!(graph.out_degree(0), 1);
    }

    #[test]
    fn test_self_links_and_unknown_targets_are_ignored() {
        let pages = corpus(&[("/a", "/a"), ("/a", "/missing")], &["/a"]);
        let graph = LinkGraph::from_pages(&pages, &scope());
        assert_eq!(graph.out_degree(0), 0);
        assert!(graph.cycle_members().iter().all(|member| !member));
    }

    #[test]
    fn test_reachability() {
        let pages = corpus(&[("/a", "/b"), ("/b", "/c")], &["/a", "/b", "/c"]);
        let graph = LinkGraph::from_pages(&pages, &scope());
        assert!(graph.reaches(0, 2));
        assert!(!graph.reaches(2, 0));
    }

    #[test]
    fn test_long_chain_does_not_overflow() {
        let urls: Vec<String> = (0..20_000).map(|i| format!("/p{i}")).collect();
        let mut pages: Vec<Page> = urls.iter().map(|u| Page::new(u.as_str(), "")).collect();
        for i in 0..urls.len() - 1 {
            let link = Link::internal(&urls[i], &urls[i + 1], "next");
            pages[i].outgoing_links.push(link);
        }
        let graph = LinkGraph::from_pages(&pages, &scope());
        assert!(graph.cycle_members().iter().all(|member| !member));
    }
}
