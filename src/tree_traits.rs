use termtree::Tree;
use tracing::instrument;

use crate::domain::{Division, DivisionForest};

/// Label of the synthetic node holding all roots.
pub const FOREST_LABEL: &str = "divisions";

pub trait TreeNodeConvert {
    fn to_tree_string(&self) -> Tree<String>;
}

// All roots hang below one synthetic node so that the forest prints as one tree
impl TreeNodeConvert for DivisionForest {
    #[instrument(level = "debug", skip(self))]
    fn to_tree_string(&self) -> Tree<String> {
        fn build_tree(forest: &DivisionForest, division: &Division) -> Tree<String> {
            let leaves: Vec<_> = forest
                .children(division.id)
                .unwrap_or_default()
                .iter()
                .map(|child| build_tree(forest, child))
                .collect();
            Tree::new(format!("{} [{}]", division.name, division.id)).with_leaves(leaves)
        }

        let leaves: Vec<_> = self
            .roots()
            .iter()
            .map(|root| build_tree(self, root))
            .collect();
        Tree::new(FOREST_LABEL.to_string()).with_leaves(leaves)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_tree_string_lists_children_by_name() {
        let mut forest = DivisionForest::new();
        let china = forest.insert("China", None).unwrap().id;
        forest.insert("Zhejiang", Some(china)).unwrap();
        forest.insert("Beijing", Some(china)).unwrap();

        let rendered = forest.to_tree_string().to_string();
        let beijing = rendered.find("Beijing").unwrap();
        let zhejiang = rendered.find("Zhejiang").unwrap();
        assert!(rendered.starts_with(FOREST_LABEL));
        assert!(beijing < zhejiang);
    }
}
