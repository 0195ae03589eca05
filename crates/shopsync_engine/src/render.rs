//! Text and JSON renderings of a diff.
//!
//! Only elements that change something, or have a descendant that does, are
//! rendered. Unchanged elements with changed children are shown with a `*`
//! marker so the path to the change stays visible.

use crate::diff::{DiffAction, DiffElement, DiffTree};
use serde_json::{Map, Value as Json};
use shopsync_core::Attributes;

/// Printed instead of an empty listing.
pub const NO_CHANGES: &str = "No changes to be made";

const MAX_VALUE_CHARS: usize = 200;

fn truncate(value: &str) -> String {
    match value.char_indices().nth(MAX_VALUE_CHARS) {
        Some((cut, _)) => format!("{}...", &value[..cut]),
        None => value.to_string(),
    }
}

fn attribute_lines(out: &mut Vec<String>, indent: &str, sign: char, attributes: Option<&Attributes>) {
    for (name, value) in attributes.into_iter().flatten() {
        out.push(format!("{indent}    {sign} {name}: {}", truncate(&value.to_string())));
    }
}

fn render_tree(tree: &DiffTree, depth: usize, out: &mut Vec<String>) {
    let indent = "  ".repeat(depth);
    for (kind, elements) in tree.iter() {
        let changed: Vec<&DiffElement> = elements.iter().filter(|e| e.has_changes()).collect();
        if changed.is_empty() {
            continue;
        }
        out.push(format!("{indent}* {kind}"));
        for element in changed {
            let action = element.action();
            out.push(format!("{indent}  {} {}", action.symbol(), element.key()));
            match action {
                DiffAction::Create => attribute_lines(out, &indent, '+', element.source.as_ref()),
                DiffAction::Delete => attribute_lines(out, &indent, '-', element.dest.as_ref()),
                DiffAction::Update => {
                    attribute_lines(out, &indent, '+', element.source.as_ref());
                    attribute_lines(out, &indent, '-', element.dest.as_ref());
                }
                DiffAction::None => {}
            }
            for (_, child) in element.slots() {
                render_tree(child, depth + 2, out);
            }
        }
    }
}

/// Renders the diff as indented lines.
///
/// Markers: `+` create, `-` delete, `!` update, `*` unchanged. Attribute
/// values longer than 200 characters are cut off with `...`. A diff without
/// changes renders as [`NO_CHANGES`].
pub fn render_text(tree: &DiffTree) -> String {
    let mut lines = Vec::new();
    render_tree(tree, 0, &mut lines);
    if lines.is_empty() {
        return NO_CHANGES.to_string();
    }
    lines.join("\n")
}

fn attributes_json(attributes: &Attributes) -> Json {
    Json::Object(
        attributes
            .iter()
            .map(|(k, v)| (k.clone(), v.to_json()))
            .collect(),
    )
}

fn tree_json(tree: &DiffTree) -> Map<String, Json> {
    let mut out = Map::new();
    for (kind, elements) in tree.iter() {
        let mut by_key = Map::new();
        for element in elements.iter().filter(|e| e.has_changes()) {
            let mut node = Map::new();
            if let Some(plus) = &element.source {
                node.insert("+".to_string(), attributes_json(plus));
            }
            if let Some(minus) = &element.dest {
                node.insert("-".to_string(), attributes_json(minus));
            }
            for (_, child) in element.slots() {
                node.extend(tree_json(child));
            }
            by_key.insert(element.key(), Json::Object(node));
        }
        if !by_key.is_empty() {
            out.insert(kind.to_string(), Json::Object(by_key));
        }
    }
    out
}

/// Converts the diff to `{kind: {key: {"+": .., "-": .., child_kind: ..}}}`.
pub fn to_json(tree: &DiffTree) -> Json {
    Json::Object(tree_json(tree))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diff::DiffEngine;
    use serde_json::json;
    use shopsync_core::{AttributeAssignment, EntityStore, Product};

    fn store(name: &str, price: f64, sizes: &[&str]) -> EntityStore {
        let store = EntityStore::new(name);
        let (p, _) = store
            .get_or_instantiate_record(&Product::new("P1", "Jacket", "Doos").with_price(price))
            .unwrap();
        for size in sizes {
            let (c, _) = store
                .get_or_instantiate_record(&AttributeAssignment::new("P1", "Maat", *size, 0.0))
                .unwrap();
            store.attach(&p, &c).unwrap();
        }
        store
    }

    #[test]
    fn no_changes_message() {
        let tree = DiffEngine::new()
            .diff(&store("a", 1.0, &["M"]), &store("b", 1.0, &["M"]))
            .unwrap();
        assert_eq!(render_text(&tree), NO_CHANGES);
        assert_eq!(to_json(&tree), json!({}));
    }

    #[test]
    fn update_and_nested_create() {
        let tree = DiffEngine::new()
            .diff(&store("a", 2.0, &["M", "L"]), &store("b", 1.0, &["M"]))
            .unwrap();
        let text = render_text(&tree);
        let expected = [
            "* product",
            "  ! P1",
            "    + price: 2",
            "    - price: 1",
            "    * attribute_value_to_product",
            "      + P1__Maat__L",
            "        + price: 0",
        ]
        .join("\n");
        assert_eq!(text, expected);
        assert!(!text.contains("P1__Maat__M"));
    }

    #[test]
    fn unchanged_parent_is_marked() {
        let tree = DiffEngine::new()
            .diff(&store("a", 1.0, &[]), &store("b", 1.0, &["XL"]))
            .unwrap();
        let lines: Vec<String> = render_text(&tree).lines().map(String::from).collect();
        assert_eq!(lines[1], "  * P1");
        assert_eq!(lines[3], "      - P1__Maat__XL");
    }

    #[test]
    fn json_shape() {
        let tree = DiffEngine::new()
            .diff(&store("a", 2.0, &["L"]), &store("b", 1.0, &[]))
            .unwrap();
        assert_eq!(
            to_json(&tree),
            json!({
                "product": {
                    "P1": {
                        "+": {"price": 2.0},
                        "-": {"price": 1.0},
                        "attribute_value_to_product": {
                            "P1__Maat__L": {"+": {"price": 0.0}}
                        }
                    }
                }
            })
        );
    }

    #[test]
    fn long_values_are_truncated() {
        let long = "x".repeat(250);
        let cut = truncate(&long);
        assert_eq!(cut.len(), 203);
        assert!(cut.ends_with("..."));
        assert_eq!(truncate("short"), "short");
    }
}
