//! Integration tests for the division forest: structure queries, mutations
//! and the nested-set bookkeeping behind them.

use std::collections::{BTreeSet, HashMap};

use rstest::rstest;

use compass_admin::domain::{Division, DivisionForest, DivisionId, DomainError};

/// China → {Zhejiang → {Hangzhou, Ningbo}, Beijing}, Japan → Tokyo
fn sample_forest() -> (DivisionForest, HashMap<&'static str, DivisionId>) {
    let mut forest = DivisionForest::new();
    let mut ids = HashMap::new();
    for (name, parent) in [
        ("China", None),
        ("Zhejiang", Some("China")),
        ("Hangzhou", Some("Zhejiang")),
        ("Ningbo", Some("Zhejiang")),
        ("Beijing", Some("China")),
        ("Japan", None),
        ("Tokyo", Some("Japan")),
    ] {
        let parent = parent.map(|p| ids[p]);
        let division = forest.insert(name, parent).expect("insert");
        ids.insert(name, division.id);
    }
    (forest, ids)
}

fn names(divisions: &[Division]) -> Vec<String> {
    divisions.iter().map(|d| d.name.clone()).collect()
}

/// Ancestors of `id` found by following parent pointers.
fn ancestors_by_walk(forest: &DivisionForest, id: DivisionId) -> BTreeSet<DivisionId> {
    let mut out = BTreeSet::new();
    let mut current = forest.get(id).unwrap().parent_id;
    while let Some(p) = current {
        out.insert(p);
        current = forest.get(p).unwrap().parent_id;
    }
    out
}

/// Checks depth, bounds and tree membership of every division against the
/// parent pointers.
fn assert_nested_set_consistent(forest: &DivisionForest) {
    let all: Vec<Division> = forest.iter().collect();
    assert_eq!(all.len(), forest.len());

    for root in forest.roots() {
        let members: Vec<&Division> = all
            .iter()
            .filter(|d| d.bounds().tree == root.id)
            .collect();
        let size = members.len() as u32;
        assert_eq!(root.depth(), 0);
        assert_eq!(root.bounds().lft, 1, "root {} lft", root.name);
        assert_eq!(root.bounds().rgt, 2 * size, "root {} rgt", root.name);

        let mut counters: Vec<u32> = members
            .iter()
            .flat_map(|d| [d.bounds().lft, d.bounds().rgt])
            .collect();
        counters.sort_unstable();
        assert_eq!(counters, (1..=2 * size).collect::<Vec<_>>());
    }

    for division in &all {
        let b = division.bounds();
        assert!(b.lft < b.rgt);
        assert_eq!(b.descendant_count() as usize, forest.descendants(division.id).unwrap().len());
        if let Some(parent_id) = division.parent_id {
            let parent = forest.get(parent_id).unwrap();
            assert_eq!(division.depth(), parent.depth() + 1);
            assert!(parent.bounds().strictly_contains(&b));
        } else {
            assert_eq!(b.tree, division.id);
        }
    }
}

#[test]
fn given_province_chain_when_getting_path_then_returns_root_to_node() {
    let (forest, ids) = sample_forest();

    let path = forest.path(ids["Hangzhou"]).unwrap();

    assert_eq!(names(&path), vec!["China", "Zhejiang", "Hangzhou"]);
    assert_eq!(
        forest.display_path(ids["Hangzhou"]).unwrap(),
        "China/Zhejiang/Hangzhou"
    );
}

#[test]
fn given_inserts_in_any_order_when_getting_children_then_sorted_by_name() {
    let mut forest = DivisionForest::new();
    let root = forest.insert("Root", None).unwrap().id;
    for name in ["Gamma", "Alpha", "Delta", "Beta"] {
        forest.insert(name, Some(root)).unwrap();
    }

    let children = forest.children(root).unwrap();

    assert_eq!(names(&children), vec!["Alpha", "Beta", "Delta", "Gamma"]);
}

#[test]
fn given_random_insert_sequence_when_inserting_then_depth_is_parent_plus_one() {
    let mut forest = DivisionForest::new();
    let mut ids: Vec<DivisionId> = Vec::new();
    // Deterministic pseudo-random parent choice
    let mut seed: u64 = 7;
    for i in 0..60 {
        seed = seed.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
        let parent = if ids.is_empty() || seed % 5 == 0 {
            None
        } else {
            Some(ids[(seed >> 33) as usize % ids.len()])
        };
        ids.push(forest.insert(&format!("node-{i:02}"), parent).unwrap().id);
    }

    for id in &ids {
        let division = forest.get(*id).unwrap();
        match division.parent_id {
            None => assert_eq!(division.depth(), 0),
            Some(p) => assert_eq!(division.depth(), forest.get(p).unwrap().depth() + 1),
        }
    }
    assert_nested_set_consistent(&forest);
}

#[test]
fn given_all_pairs_when_checking_descendant_then_matches_parent_walk() {
    let (forest, _) = sample_forest();
    let all: Vec<Division> = forest.iter().collect();

    for a in &all {
        for b in &all {
            let expected = ancestors_by_walk(&forest, b.id).contains(&a.id);
            assert_eq!(
                forest.is_descendant_of(b.id, a.id).unwrap(),
                expected,
                "is {} below {}",
                b.name,
                a.name
            );
        }
    }
}

#[rstest]
#[case("China", "China")]
#[case("China", "Zhejiang")]
#[case("China", "Hangzhou")]
#[case("Zhejiang", "Ningbo")]
fn given_target_inside_subtree_when_moving_then_cycle_detected(
    #[case] node: &str,
    #[case] target: &str,
) {
    let (mut forest, ids) = sample_forest();
    let before: Vec<Division> = forest.iter().collect();

    let result = forest.move_to(ids[node], Some(ids[target]));

    assert!(matches!(result, Err(DomainError::CycleDetected { .. })));
    assert_eq!(forest.iter().collect::<Vec<_>>(), before);
}

#[test]
fn given_subtree_when_moving_to_other_tree_then_depths_shift_by_same_delta() {
    let (mut forest, ids) = sample_forest();
    let before: HashMap<DivisionId, u32> = forest
        .descendants(ids["Zhejiang"])
        .unwrap()
        .iter()
        .map(|d| (d.id, d.depth()))
        .collect();

    let moved = forest.move_to(ids["Zhejiang"], Some(ids["Tokyo"])).unwrap();

    let tokyo = forest.get(ids["Tokyo"]).unwrap();
    assert_eq!(moved.depth(), tokyo.depth() + 1);
    assert_eq!(moved.depth(), 2);
    for (id, old_depth) in before {
        assert_eq!(forest.get(id).unwrap().depth(), old_depth + 1);
    }
    assert_eq!(
        forest.display_path(ids["Hangzhou"]).unwrap(),
        "Japan/Tokyo/Zhejiang/Hangzhou"
    );
    assert!(forest.is_descendant_of(ids["Ningbo"], ids["Japan"]).unwrap());
    assert!(!forest.is_descendant_of(ids["Ningbo"], ids["China"]).unwrap());
    assert_nested_set_consistent(&forest);
}

#[test]
fn given_nested_division_when_moving_to_root_then_becomes_tree_of_its_own() {
    let (mut forest, ids) = sample_forest();

    let moved = forest.move_to(ids["Zhejiang"], None).unwrap();

    assert!(moved.is_root());
    assert_eq!(moved.depth(), 0);
    assert_eq!(forest.get(ids["Hangzhou"]).unwrap().depth(), 1);
    assert_eq!(names(&forest.roots()), vec!["China", "Japan", "Zhejiang"]);
    assert_nested_set_consistent(&forest);
}

#[test]
fn given_existing_name_elsewhere_when_renaming_then_duplicate_name() {
    let (mut forest, ids) = sample_forest();

    let result = forest.rename(ids["Tokyo"], "Hangzhou");

    assert_eq!(
        result.unwrap_err(),
        DomainError::DuplicateName("Hangzhou".to_string())
    );
    assert_eq!(forest.get(ids["Tokyo"]).unwrap().name, "Tokyo");
}

#[test]
fn given_rename_when_new_name_sorts_first_then_sibling_order_follows() {
    let (mut forest, ids) = sample_forest();

    forest.rename(ids["Zhejiang"], "Anhui").unwrap();

    assert_eq!(
        names(&forest.children(ids["China"]).unwrap()),
        vec!["Anhui", "Beijing"]
    );
    assert_eq!(forest.find_by_name("Anhui").unwrap().id, ids["Zhejiang"]);
    assert!(forest.find_by_name("Zhejiang").is_none());
    assert_nested_set_consistent(&forest);
}

#[test]
fn given_subtree_when_removing_then_node_and_descendants_gone() {
    let (mut forest, ids) = sample_forest();

    let removed = forest.remove(ids["Zhejiang"]).unwrap();

    assert_eq!(names(&removed), vec!["Zhejiang", "Hangzhou", "Ningbo"]);
    for name in ["Zhejiang", "Hangzhou", "Ningbo"] {
        assert!(forest.get(ids[name]).unwrap_err().is_not_found());
    }
    assert_eq!(forest.len(), 4);
    // Freed names can be reused
    forest.insert("Hangzhou", Some(ids["China"])).unwrap();
    assert_nested_set_consistent(&forest);
}

#[rstest]
#[case("")]
#[case("   ")]
fn given_blank_name_when_inserting_then_invalid_name(#[case] name: &str) {
    let mut forest = DivisionForest::new();

    let result = forest.insert(name, None);

    assert!(matches!(result, Err(DomainError::InvalidName { .. })));
    assert!(forest.is_empty());
}

#[test]
fn given_unknown_parent_when_inserting_then_not_found() {
    let mut forest = DivisionForest::new();

    let result = forest.insert("Orphan", Some(DivisionId(42)));

    assert!(result.unwrap_err().is_not_found());
}

#[test]
fn given_mixed_mutation_sequence_when_applied_then_nested_sets_stay_consistent() {
    let (mut forest, ids) = sample_forest();

    let xihu = forest.insert("Xihu", Some(ids["Hangzhou"])).unwrap().id;
    assert_nested_set_consistent(&forest);
    forest.move_to(ids["Hangzhou"], Some(ids["Beijing"])).unwrap();
    assert_nested_set_consistent(&forest);
    forest.rename(ids["Beijing"], "Zz-Beijing").unwrap();
    assert_nested_set_consistent(&forest);
    forest.move_to(ids["Japan"], Some(ids["Ningbo"])).unwrap();
    assert_nested_set_consistent(&forest);
    forest.remove(ids["Zhejiang"]).unwrap();
    assert_nested_set_consistent(&forest);

    assert_eq!(forest.len(), 4);
    assert_eq!(
        forest.display_path(xihu).unwrap(),
        "China/Zz-Beijing/Hangzhou/Xihu"
    );
    assert!(forest.get(ids["Tokyo"]).unwrap_err().is_not_found());
}

#[test]
fn given_records_when_rebuilding_forest_then_structure_is_identical() {
    let (forest, _) = sample_forest();

    let rebuilt = DivisionForest::from_records(forest.records()).unwrap();

    assert_eq!(
        rebuilt.iter().collect::<Vec<_>>(),
        forest.iter().collect::<Vec<_>>()
    );
}
