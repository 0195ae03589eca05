//! Properties of ordering, registration and diffing.

use proptest::prelude::*;
use shopsync_core::EntityStore;
use shopsync_engine::{order_by_size, render_text, AttributeOrdering, DiffEngine, SizeKey};
use shopsync_testkit::prelude::*;

fn ordering_engine() -> DiffEngine {
    DiffEngine::new().with_ordering(
        AttributeOrdering::new()
            .with_colors(COLOR_ATTRIBUTE, COLOR_NAMES.iter().copied())
            .with_sizing(SIZE_ATTRIBUTE),
    )
}

proptest! {
    #[test]
    fn size_order_is_independent_of_input_order(
        (labels, shuffled) in prop::collection::vec(size_label_strategy(), 0..12)
            .prop_flat_map(|labels| (Just(labels.clone()), Just(labels).prop_shuffle()))
    ) {
        let a = order_by_size(labels, |s| s.as_str());
        let b = order_by_size(shuffled, |s| s.as_str());
        prop_assert_eq!(a, b);
    }

    #[test]
    fn size_order_is_sorted_by_key(labels in prop::collection::vec(size_label_strategy(), 0..12)) {
        let ordered = order_by_size(labels, |s| s.as_str());
        let keys: Vec<SizeKey> = ordered.iter().map(|s| SizeKey::parse(s)).collect();
        prop_assert!(keys.windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn canonical_labels_are_recognized(label in size_label_strategy()) {
        prop_assume!(!label.starts_with('Q'));
        prop_assert!(SizeKey::parse(&label).is_recognized());
    }

    #[test]
    fn loading_twice_registers_nothing_new(catalog in catalog_strategy(6)) {
        let store = EntityStore::new("src");
        for fixture in &catalog {
            fixture.insert(&store).unwrap();
        }
        let expected = expected_elements(&catalog);
        prop_assert_eq!(store.total_count(), expected);
        for fixture in &catalog {
            fixture.insert(&store).unwrap();
        }
        prop_assert_eq!(store.total_count(), expected);
    }

    #[test]
    fn catalog_against_itself_has_no_changes(catalog in catalog_strategy(6)) {
        let source = store_with("src", &catalog).unwrap();
        let reversed: Vec<ProductFixture> = catalog.iter().rev().cloned().collect();
        let dest = store_with("dest", &reversed).unwrap();
        let tree = ordering_engine().diff(&source, &dest).unwrap();
        prop_assert!(!tree.has_changes());
        prop_assert_eq!(tree.summary().total(), expected_elements(&catalog));
    }

    #[test]
    fn option_order_does_not_change_the_rendered_diff(
        (sizes, shuffled_sizes) in size_set_strategy()
            .prop_flat_map(|s| (Just(s.clone()), Just(s).prop_shuffle())),
        (colors, shuffled_colors) in color_set_strategy()
            .prop_flat_map(|c| (Just(c.clone()), Just(c).prop_shuffle())),
    ) {
        let empty = EntityStore::new("dest");
        let a = store_with("a", &[product_fixture("P1", 1000, &sizes, &colors)]).unwrap();
        let b = store_with("b", &[product_fixture("P1", 1000, &shuffled_sizes, &shuffled_colors)])
            .unwrap();
        let engine = ordering_engine();
        let left = render_text(&engine.diff(&a, &empty).unwrap());
        let right = render_text(&engine.diff(&b, &empty).unwrap());
        prop_assert_eq!(left, right);
    }
}

fn expected_elements(catalog: &[ProductFixture]) -> usize {
    catalog.iter().map(ProductFixture::entity_count).sum()
}
