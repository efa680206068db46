//! Tests for the hierarchy presentation: labels, parent hints, nested JSON
//! and dropdown options.

use std::sync::Arc;

use rstest::rstest;
use serde_json::json;

use compass_admin::application::services::{
    indented_label, option_parent_hint, CustomerService, DivisionService, PresentationService,
};
use compass_admin::domain::{DivisionForest, DivisionId};
use compass_admin::infrastructure::Store;
use compass_admin::util::testing;

struct Fixture {
    divisions: DivisionService,
    customers: CustomerService,
    presentation: PresentationService,
}

fn fixture() -> Fixture {
    testing::init_test_setup();
    let store = Arc::new(Store::in_memory());
    Fixture {
        divisions: DivisionService::new(Arc::clone(&store)),
        customers: CustomerService::new(Arc::clone(&store)),
        presentation: PresentationService::new(store),
    }
}

#[rstest]
#[case(0, " China")]
#[case(1, "— Zhejiang")]
#[case(2, "—— Hangzhou")]
fn given_division_at_depth_when_labelling_then_prefixed_with_markers(
    #[case] depth: usize,
    #[case] expected: &str,
) {
    let mut forest = DivisionForest::new();
    let china = forest.insert("China", None).unwrap();
    let zhejiang = forest.insert("Zhejiang", Some(china.id)).unwrap();
    let hangzhou = forest.insert("Hangzhou", Some(zhejiang.id)).unwrap();
    let division = [china, zhejiang, hangzhou][depth].clone();

    let label = indented_label(&division);

    assert_eq!(label, expected);
    assert_eq!(label.chars().filter(|c| *c == '—').count(), depth);
}

#[test]
fn given_root_or_missing_node_when_getting_parent_hint_then_zero() {
    let mut forest = DivisionForest::new();
    let china = forest.insert("China", None).unwrap().id;
    let zhejiang = forest.insert("Zhejiang", Some(china)).unwrap().id;

    assert_eq!(option_parent_hint(&forest, china), 0);
    assert_eq!(option_parent_hint(&forest, zhejiang), china.0);
    assert_eq!(option_parent_hint(&forest, DivisionId(404)), 0);
}

#[test]
fn given_division_with_customers_and_child_when_nesting_then_customers_come_first() {
    // Arrange
    let fx = fixture();
    let region = fx.divisions.insert("Region", None).unwrap().id;
    let district = fx.divisions.insert("District1", Some(region)).unwrap().id;
    let globex = fx.customers.create("Globex", Some(region), None).unwrap();
    let acme = fx.customers.create("Acme", Some(region), None).unwrap();

    // Act
    let tree = fx.presentation.nested_tree(None).unwrap();

    // Assert
    let value = serde_json::to_value(&tree).unwrap();
    assert_eq!(
        value,
        json!([{
            "id": region.0,
            "name": "Region",
            "children": [
                {"id": format!("customer_{}", acme.id), "name": "Acme", "isCustomer": true, "customerId": acme.id.0},
                {"id": format!("customer_{}", globex.id), "name": "Globex", "isCustomer": true, "customerId": globex.id.0},
                {"id": district.0, "name": "District1", "children": []},
            ]
        }])
    );
}

#[test]
fn given_root_filter_when_nesting_then_only_that_subtree() {
    let fx = fixture();
    let china = fx.divisions.insert("China", None).unwrap().id;
    let zhejiang = fx.divisions.insert("Zhejiang", Some(china)).unwrap().id;
    fx.divisions.insert("Japan", None).unwrap();

    let tree = fx.presentation.nested_tree(Some(zhejiang)).unwrap();

    assert_eq!(tree.len(), 1);
    assert_eq!(tree[0].name, "Zhejiang");
    assert!(tree[0].children.is_empty());
    let missing = fx.presentation.nested_tree(Some(DivisionId(404))).unwrap_err();
    assert!(missing.as_domain().unwrap().is_not_found());
}

#[test]
fn given_forest_when_listing_options_then_display_order_with_hints() {
    let fx = fixture();
    let japan = fx.divisions.insert("Japan", None).unwrap().id;
    let china = fx.divisions.insert("China", None).unwrap().id;
    let zhejiang = fx.divisions.insert("Zhejiang", Some(china)).unwrap().id;
    fx.divisions.insert("Beijing", Some(china)).unwrap();

    let options = fx.presentation.select_options().unwrap();

    let labels: Vec<&str> = options.iter().map(|o| o.label.as_str()).collect();
    assert_eq!(labels, vec![" China", "— Beijing", "— Zhejiang", " Japan"]);
    assert_eq!(options[0].data_parent, 0);
    assert_eq!(options[2].value, zhejiang);
    assert_eq!(options[2].data_parent, china.0);
    assert_eq!(options[3].value, japan);
    assert_eq!(fx.presentation.option_parent_hint(zhejiang), china.0);
}

#[test]
fn given_option_when_rendering_html_then_escaped_with_data_parent() {
    let fx = fixture();
    let china = fx.divisions.insert("China", None).unwrap().id;
    let child = fx.divisions.insert("<Zhejiang & Co>", Some(china)).unwrap().id;

    let options = fx.presentation.select_options().unwrap();

    assert_eq!(
        options[1].to_html(),
        format!(
            r#"<option value="{}" data-parent="{}">— &lt;Zhejiang &amp; Co&gt;</option>"#,
            child, china
        )
    );
}

#[test]
fn given_forest_when_rendering_tree_then_one_line_per_division() {
    let fx = fixture();
    let china = fx.divisions.insert("China", None).unwrap().id;
    fx.divisions.insert("Zhejiang", Some(china)).unwrap();

    let rendered = fx.presentation.render_tree().unwrap().to_string();

    assert_eq!(rendered.lines().count(), 3);
    assert!(rendered.contains(&format!("China [{china}]")));
}
