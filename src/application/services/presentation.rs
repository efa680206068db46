//! Hierarchy presentation
//!
//! Turns the division forest into UI payloads: indented labels for flat
//! dropdowns, nested JSON trees with customers as leaves, and select options
//! carrying the parent hint used for client-side cascading.

use std::collections::HashMap;
use std::sync::Arc;

use serde::Serialize;
use termtree::Tree;

use crate::application::ApplicationResult;
use crate::domain::{Customer, CustomerId, Division, DivisionForest, DivisionId, DomainResult};
use crate::infrastructure::traits::CustomerRepository;
use crate::infrastructure::Store;
use crate::tree_traits::TreeNodeConvert;

/// Repeated once per level in front of an indented label.
pub const DEPTH_MARKER: &str = "—";

/// `"—" * depth + " " + name`, e.g. `—— Hangzhou` for a city under a province.
pub fn indented_label(division: &Division) -> String {
    format!(
        "{} {}",
        DEPTH_MARKER.repeat(division.depth() as usize),
        division.name
    )
}

/// Parent id of `id`, `0` for roots.
///
/// Rendering code calls this for every option; a stale id yields `0` as well
/// instead of an error.
pub fn option_parent_hint(forest: &DivisionForest, id: DivisionId) -> u64 {
    forest
        .get(id)
        .ok()
        .and_then(|d| d.parent_id)
        .map_or(0, |p| p.0)
}

/// Customer shown as a leaf under its division.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerLeaf {
    pub id: String,
    pub name: String,
    pub is_customer: bool,
    pub customer_id: CustomerId,
}

impl From<&Customer> for CustomerLeaf {
    fn from(c: &Customer) -> Self {
        Self {
            id: format!("customer_{}", c.id),
            name: c.name.clone(),
            is_customer: true,
            customer_id: c.id,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum TreeEntry {
    Customer(CustomerLeaf),
    Division(DivisionTree),
}

/// One division with its customers and sub-divisions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DivisionTree {
    pub id: DivisionId,
    pub name: String,
    /// Attached customers first, then child divisions
    pub children: Vec<TreeEntry>,
}

/// Nested tree of the whole forest, or of the subtree rooted at `root`.
pub fn nested_tree(
    forest: &DivisionForest,
    customers: &dyn CustomerRepository,
    root: Option<DivisionId>,
) -> DomainResult<Vec<DivisionTree>> {
    let tops = match root {
        Some(id) => vec![forest.get(id)?],
        None => forest.roots(),
    };
    let grouped = customers.group_by_division();
    tops.iter()
        .map(|division| build_subtree(forest, &grouped, division))
        .collect()
}

fn build_subtree(
    forest: &DivisionForest,
    customers: &HashMap<DivisionId, Vec<Customer>>,
    division: &Division,
) -> DomainResult<DivisionTree> {
    let mut children: Vec<TreeEntry> = customers
        .get(&division.id)
        .into_iter()
        .flatten()
        .map(|c| TreeEntry::Customer(CustomerLeaf::from(c)))
        .collect();
    for child in forest.children(division.id)? {
        children.push(TreeEntry::Division(build_subtree(
            forest, customers, &child,
        )?));
    }
    Ok(DivisionTree {
        id: division.id,
        name: division.name.clone(),
        children,
    })
}

/// Entry of a division dropdown.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectOption {
    pub value: DivisionId,
    pub label: String,
    pub data_parent: u64,
}

impl SelectOption {
    /// `<option value="3" data-parent="1">— Zhejiang</option>`
    pub fn to_html(&self) -> String {
        format!(
            r#"<option value="{}" data-parent="{}">{}</option>"#,
            self.value,
            self.data_parent,
            escape_html(&self.label)
        )
    }
}

fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            _ => out.push(ch),
        }
    }
    out
}

/// Options for every division in display order (tree by tree, pre-order).
pub fn select_options(forest: &DivisionForest) -> Vec<SelectOption> {
    forest
        .iter()
        .map(|d| SelectOption {
            value: d.id,
            label: indented_label(&d),
            data_parent: option_parent_hint(forest, d.id),
        })
        .collect()
}

/// Store-backed access to the presentation functions.
pub struct PresentationService {
    store: Arc<Store>,
}

impl PresentationService {
    pub fn new(store: Arc<Store>) -> Self {
        Self { store }
    }

    pub fn nested_tree(&self, root: Option<DivisionId>) -> ApplicationResult<Vec<DivisionTree>> {
        Ok(self
            .store
            .read(|s| nested_tree(&s.divisions, &s.customers, root))??)
    }

    pub fn select_options(&self) -> ApplicationResult<Vec<SelectOption>> {
        self.store.read(|s| select_options(&s.divisions))
    }

    pub fn option_parent_hint(&self, id: DivisionId) -> u64 {
        self.store
            .read(|s| option_parent_hint(&s.divisions, id))
            .unwrap_or(0)
    }

    pub fn render_tree(&self) -> ApplicationResult<Tree<String>> {
        self.store.read(|s| s.divisions.to_tree_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::CustomerTable;

    #[test]
    fn test_escape_html() {
        assert_eq!(
            escape_html(r#"<a href="x">&'"#),
            "&lt;a href=&quot;x&quot;&gt;&amp;&#x27;"
        );
    }

    #[test]
    fn test_nested_tree_places_each_customer_under_its_own_division() {
        let mut forest = DivisionForest::new();
        let china = forest.insert("China", None).unwrap().id;
        let zhejiang = forest.insert("Zhejiang", Some(china)).unwrap().id;
        let japan = forest.insert("Japan", None).unwrap().id;
        let mut customers = CustomerTable::new();
        customers.insert("Zeta", Some(zhejiang), None).unwrap();
        customers.insert("Acme", Some(zhejiang), None).unwrap();
        customers.insert("Sony", Some(japan), None).unwrap();
        customers.insert("Nomad", None, None).unwrap();

        let tree = nested_tree(&forest, &customers, None).unwrap();

        let leaves = |entries: &[TreeEntry]| -> Vec<String> {
            entries
                .iter()
                .filter_map(|e| match e {
                    TreeEntry::Customer(c) => Some(c.name.clone()),
                    TreeEntry::Division(_) => None,
                })
                .collect()
        };
        assert_eq!(tree[0].name, "China");
        assert!(leaves(&tree[0].children).is_empty());
        let TreeEntry::Division(zj) = &tree[0].children[0] else {
            panic!("expected Zhejiang under China");
        };
        assert_eq!(leaves(&zj.children), vec!["Acme", "Zeta"]);
        assert_eq!(tree[1].name, "Japan");
        assert_eq!(leaves(&tree[1].children), vec!["Sony"]);
    }

    #[test]
    fn test_select_options_use_parent_hint() {
        let mut forest = DivisionForest::new();
        let china = forest.insert("China", None).unwrap().id;
        forest.insert("Zhejiang", Some(china)).unwrap();

        for option in select_options(&forest) {
            assert_eq!(option.data_parent, option_parent_hint(&forest, option.value));
        }
    }
}
