//! Property-based test generators using proptest.
//!
//! Size labels come from canonical spellings only, so two labels with equal
//! sort keys are always the same string.

use crate::fixtures::ProductFixture;
use proptest::prelude::*;

/// Attribute name used for size options.
pub const SIZE_ATTRIBUTE: &str = "Maat";

/// Attribute name used for colour options.
pub const COLOR_ATTRIBUTE: &str = "Kleur";

/// Size labels, one of each recognised form.
pub const SIZE_LABELS: &[&str] = &[
    "36", "38", "40-42", "W30", "W32", "C41", "XS", "S", "M", "L", "XL", "2XL", "3XL", "ONESIZE",
    "98C80", "Petite",
];

const LETTER_LABELS: &[&str] = &["2XS", "XS", "S", "M", "L", "XL", "XXL", "2XL", "3XL", "ONE"];

/// Colour names in reference order.
pub const COLOR_NAMES: &[&str] = &["zwart", "wit", "navy", "rood", "grijs", "khaki"];

/// Strategy for product numbers.
pub fn product_number_strategy() -> impl Strategy<Value = String> {
    prop::string::string_regex("[A-Z]{1,3}-[0-9]{1,4}").expect("Invalid regex")
}

/// Strategy for size labels in every recognised form plus unknown labels.
pub fn size_label_strategy() -> impl Strategy<Value = String> {
    prop_oneof![
        (1u32..200).prop_map(|n| n.to_string()),
        (1u32..60, 1u32..60).prop_map(|(a, b)| format!("{a}-{b}")),
        (20u32..50).prop_map(|n| format!("W{n}")),
        (35u32..50).prop_map(|n| format!("C{n}")),
        prop::sample::select(LETTER_LABELS).prop_map(String::from),
        (60u32..120, 60u32..120).prop_map(|(l, c)| format!("{l}C{c}")),
        prop::string::string_regex("Q[a-z]{1,4}").expect("Invalid regex"),
    ]
}

/// Strategy for a set of distinct sizes in random order.
pub fn size_set_strategy() -> impl Strategy<Value = Vec<&'static str>> {
    prop::sample::subsequence(SIZE_LABELS, 0..=5).prop_shuffle()
}

/// Strategy for a set of distinct colours in random order.
pub fn color_set_strategy() -> impl Strategy<Value = Vec<&'static str>> {
    prop::sample::subsequence(COLOR_NAMES, 0..=3).prop_shuffle()
}

/// Builds a fixture with sizes first, colours second.
pub fn product_fixture(
    productnumber: impl Into<String>,
    price_cents: u32,
    sizes: &[&str],
    colors: &[&str],
) -> ProductFixture {
    let fixture = ProductFixture::new(productnumber)
        .with_price(f64::from(price_cents) / 100.0)
        .with_category("Werkkleding");
    let fixture = sizes
        .iter()
        .fold(fixture, |f, size| f.with_option(SIZE_ATTRIBUTE, *size, 0.0));
    colors
        .iter()
        .fold(fixture, |f, color| f.with_option(COLOR_ATTRIBUTE, *color, 0.0))
}

/// Strategy for a catalog of up to `max_products` products with distinct
/// numbers.
pub fn catalog_strategy(max_products: usize) -> impl Strategy<Value = Vec<ProductFixture>> {
    prop::collection::btree_map(
        product_number_strategy(),
        (0u32..50_000, size_set_strategy(), color_set_strategy()),
        0..=max_products,
    )
    .prop_map(|products| {
        products
            .into_iter()
            .map(|(number, (cents, sizes, colors))| product_fixture(number, cents, &sizes, &colors))
            .collect()
    })
}
