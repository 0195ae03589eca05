//! # shopsync adapters
//!
//! Concrete sources and destinations for the shopsync engine.
//!
//! This crate provides:
//! - `CcvAdapter`, the CCV Shop destination: loader plus per-kind hooks
//! - `CatalogAdapter`, a source reading variant rows from a JSON file
//! - The settings sections both adapters read
//!
//! ## Key Invariants
//!
//! - Names of brands, packages, attributes and option values are compared
//!   normalized (trimmed, lowercase); category names are kept as they are
//! - Reference data and the product list either load completely or the load
//!   fails; a failed per-product job only leaves that product's children
//!   partial, and the gap shows up in the diff

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod catalog;
mod ccv;
mod error;
mod settings;

pub use catalog::{price_differential, with_base_prices, CatalogAdapter, CatalogRow, DEFAULT_PACKAGE};
pub use ccv::{remote_id, CcvAdapter};
pub use error::{AdapterError, AdapterResult};
pub use settings::{CatalogSettings, CcvSettings, MappingSettings, ValueMapping};

/// File type used when a link has no extension.
pub const DEFAULT_FILE_TYPE: &str = "png";

/// Returns the lowercase file extension of an image link.
///
/// Query strings and fragments are ignored.
pub fn file_type(link: &str) -> String {
    let path = link.split(['?', '#']).next().unwrap_or(link);
    let name = path.rsplit('/').next().unwrap_or(path);
    match name.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() && !ext.is_empty() => ext.to_ascii_lowercase(),
        _ => DEFAULT_FILE_TYPE.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_type_from_links() {
        assert_eq!(file_type("https://cdn.example.com/a/front.JPG"), "jpg");
        assert_eq!(file_type("https://cdn.example.com/a/front.webp?w=200#x"), "webp");
        assert_eq!(file_type("https://cdn.example.com/a/front"), "png");
        assert_eq!(file_type("https://cdn.example.com/a.b/.hidden"), "png");
        assert_eq!(file_type(""), "png");
    }
}
