use crate::links::LinkGraphAnalyzer;
use crate::page::Page;
use std::collections::HashMap;

impl LinkGraphAnalyzer {
    /// Follow each redirect to its final destination, keyed by normalised source
    ///
    /// Entries that loop back on themselves are dropped.
    fn resolve_redirects(&self, redirects: &HashMap<String, String>) -> HashMap<String, String> {
        let by_key: HashMap<String, &String> = redirects
            .iter()
            .map(|(old, new)| (self.scope.key(old), new))
            .collect();

        let mut resolved = HashMap::with_capacity(by_key.len());
        for (old_key, first) in &by_key {
            let mut destination: &String = *first;
            let mut hops = 0;
            let mut looped = false;

            while let Some(next) = by_key.get(&self.scope.key(destination)) {
                hops += 1;
                if hops > by_key.len() || self.scope.key(next) == *old_key {
                    looped = true;
                    break;
                }
                destination = *next;
            }

            if looped || self.scope.key(destination) == *old_key {
                ::log::warn!("Ignoring redirect loop starting at {}", old_key);
                continue;
            }
            resolved.insert(old_key.clone(), destination.clone());
        }
        resolved
    }

    /// Point every link that targets a redirected URL at its final destination
    ///
    /// Returns the number of rewritten links. Applying the same map again
    /// rewrites nothing.
    pub fn update_redirected_links(
        &self,
        pages: &mut [Page],
        redirects: &HashMap<String, String>,
    ) -> usize {
        if redirects.is_empty() {
            return 0;
        }
        let resolved = self.resolve_redirects(redirects);
        let mut rewritten = 0;

        for page in pages.iter_mut() {
            let mut changed = false;
            for link in page
                .outgoing_links
                .iter_mut()
                .chain(page.incoming_links.iter_mut())
            {
                if let Some(destination) = resolved.get(&self.scope.key(&link.target_url)) {
                    if link.target_url != *destination {
                        link.target_url = destination.clone();
                        rewritten += 1;
                        changed = true;
                    }
                }
            }
            if changed {
                page.touch();
            }
        }

        ::log::info!("Rewrote {} redirected links", rewritten);
        rewritten
    }
}

#[cfg(test)]
mod tests {
    use crate::links::tests::analyzer;
    use crate::page::{Link, Page};
    use std::collections::HashMap;

    fn corpus() -> Vec<Page> {
        let mut pages = vec![Page::new("/a", ""), Page::new("/b", ""), Page::new("/c", "")];
        pages[0].outgoing_links.push(Link::internal("/a", "/old-b", "b"));
        pages[0].outgoing_links.push(Link::internal("/a", "/c", "c"));
        pages[2].outgoing_links.push(Link::internal("/c", "/older", "b"));
        pages
    }

    fn redirects(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(a, b)| (a.to_string(), b.to_string()))
            .collect()
    }

    #[test]
    fn test_rewrites_only_redirected_targets() {
        let a = analyzer();
        let mut pages = corpus();
        let map = redirects(&[("/old-b", "/b")]);

        assert_eq!(a.update_redirected_links(&mut pages, &map), 1);
        assert_eq!(pages[0].outgoing_links[0].target_url, "/b");
        assert_eq!(pages[0].outgoing_links[1].target_url, "/c");
        assert_eq!(pages[2].outgoing_links[0].target_url, "/older");
    }

    #[test]
    fn test_second_application_changes_nothing() {
        let a = analyzer();
        let mut pages = corpus();
        let map = redirects(&[("/old-b", "/b"), ("/older", "/old-b")]);

        assert_eq!(a.update_redirected_links(&mut pages, &map), 2);
        let after_first: Vec<String> = pages
            .iter()
            .flat_map(|p| p.outgoing_links.iter().map(|l| l.target_url.clone()))
            .collect();

        assert_eq!(a.update_redirected_links(&mut pages, &map), 0);
        let after_second: Vec<String> = pages
            .iter()
            .flat_map(|p| p.outgoing_links.iter().map(|l| l.target_url.clone()))
            .collect();
        assert_eq!(after_first, after_second);
    }

    #[test]
    fn test_chains_resolve_to_final_destination() {
        let a = analyzer();
        let mut pages = corpus();
        let map = redirects(&[("/older", "/old-b"), ("/old-b", "/b")]);
        a.update_redirected_links(&mut pages, &map);
        assert_eq!(pages[2].outgoing_links[0].target_url, "/b");
    }

    #[test]
    fn test_redirect_loops_are_ignored() {
        let a = analyzer();
        let mut pages = corpus();
        let map = redirects(&[("/old-b", "/older"), ("/older", "/old-b")]);
        assert_eq!(a.update_redirected_links(&mut pages, &map), 0);
        assert_eq!(pages[0].outgoing_links[0].target_url, "/old-b");
    }
}
