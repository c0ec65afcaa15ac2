// src/encode/spiht/lists.rs

//! Work lists of the significance coder.

use super::tree::{Coord, SpatialTree};

/// An entry of the insignificant-set list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SetEntry {
    /// All descendants of the coordinate (`D` set).
    Descendants(Coord),
    /// All descendants except the direct children (`L` set).
    Grandchildren(Coord),
}

/// Insignificant pixels, insignificant sets and significant pixels.
///
/// Lists are only ever appended to or filtered, so coding order is insertion
/// order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WorkLists {
    pub lip: Vec<Coord>,
    pub lis: Vec<SetEntry>,
    pub lsp: Vec<Coord>,
}

impl WorkLists {
    /// Every root-band coefficient in `lip`; those with descendants also in `lis`.
    pub fn seeded(tree: &SpatialTree) -> Self {
        let lip: Vec<Coord> = tree.root_band().collect();
        let lis = lip
            .iter()
            .copied()
            .filter(|&c| tree.has_descendants(c))
            .map(SetEntry::Descendants)
            .collect();
        WorkLists {
            lip,
            lis,
            lsp: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seeding_order() {
        let tree = SpatialTree::new(16, 8, 2);
        let lists = WorkLists::seeded(&tree);
        assert_eq!(lists.lip, vec![(0, 0), (1, 0), (2, 0), (3, 0), (0, 1), (1, 1), (2, 1), (3, 1)]);
        assert_eq!(lists.lis.len(), 8);
        assert_eq!(lists.lis[5], SetEntry::Descendants((1, 1)));
        assert!(lists.lsp.is_empty());
    }

    #[test]
    fn test_seeding_without_stages() {
        let tree = SpatialTree::new(4, 4, 0);
        let lists = WorkLists::seeded(&tree);
        assert_eq!(lists.lip.len(), 16);
        assert!(lists.lis.is_empty());
    }
}
