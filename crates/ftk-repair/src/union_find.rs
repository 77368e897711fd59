//! Disjoint sets over integer ids.

use std::collections::BTreeMap;

/// Union-find with path compression. Ids are added lazily on first use.
#[derive(Debug, Clone, Default)]
pub struct UnionFind {
    parent: BTreeMap<i32, i32>,
}

impl UnionFind {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_ids(ids: impl IntoIterator<Item = i32>) -> Self {
        let mut uf = Self::new();
        for id in ids {
            uf.add(id);
        }
        uf
    }

    pub fn add(&mut self, id: i32) {
        self.parent.entry(id).or_insert(id);
    }

    pub fn find(&mut self, id: i32) -> i32 {
        self.add(id);
        let mut root = id;
        while let Some(&p) = self.parent.get(&root) {
            if p == root {
                break;
            }
            root = p;
        }
        // compress
        let mut cur = id;
        while cur != root {
            let next = self.parent.insert(cur, root).unwrap_or(root);
            cur = next;
        }
        root
    }

    pub fn union(&mut self, a: i32, b: i32) {
        let (ra, rb) = (self.find(a), self.find(b));
        if ra != rb {
            // smaller root wins so cluster roots are stable
            let (lo, hi) = if ra < rb { (ra, rb) } else { (rb, ra) };
            self.parent.insert(hi, lo);
        }
    }

    pub fn connected(&mut self, a: i32, b: i32) -> bool {
        self.find(a) == self.find(b)
    }

    /// All sets, each sorted ascending, ordered by smallest member.
    pub fn clusters(&mut self) -> Vec<Vec<i32>> {
        let ids: Vec<i32> = self.parent.keys().copied().collect();
        let mut groups: BTreeMap<i32, Vec<i32>> = BTreeMap::new();
        for id in ids {
            let root = self.find(id);
            groups.entry(root).or_default().push(id);
        }
        let mut out: Vec<Vec<i32>> = groups.into_values().collect();
        out.sort_by_key(|g| g.first().copied());
        out
    }

    /// Clusters with at least `min_size` members.
    pub fn clusters_of_size(&mut self, min_size: usize) -> Vec<Vec<i32>> {
        self.clusters()
            .into_iter()
            .filter(|g| g.len() >= min_size)
            .collect()
    }
}
