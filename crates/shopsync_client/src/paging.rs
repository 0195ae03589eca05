//! Pagination over list endpoints.
//!
//! List endpoints take `start` (offset) and `size` (page size) query
//! parameters and answer with `{"items": [...], "next": <url or null>}`.

use crate::client::ShopClient;
use crate::error::{ClientError, ClientResult};
use crate::transport::HttpTransport;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

/// How many pages to fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageLimit {
    /// Follow `next` until the listing ends.
    All,
    /// Fetch at most this many pages. Must be positive.
    Pages(u32),
}

impl Default for PageLimit {
    fn default() -> Self {
        PageLimit::Pages(1)
    }
}

/// Aggregated result of a paged listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PagedResult {
    /// Status code of the last page.
    pub status_code: u16,
    /// Items of all pages, in order.
    pub items: Vec<Value>,
    /// Number of pages fetched.
    pub total_pages: u32,
    /// Number of items.
    pub total_items: usize,
}

impl PagedResult {
    /// Consumes the result, returning the items.
    pub fn into_items(self) -> Vec<Value> {
        self.items
    }
}

impl<T: HttpTransport> ShopClient<T> {
    /// Fetches a paged listing and concatenates its items.
    ///
    /// Stops when the page limit is reached, when a page has an empty `next`,
    /// or, in [`PageLimit::All`] mode, when a page adds no items.
    pub async fn get_paged(
        &self,
        uri: &str,
        per_page: u32,
        limit: PageLimit,
        params: &[(&str, String)],
    ) -> ClientResult<PagedResult> {
        if limit == PageLimit::Pages(0) {
            return Err(ClientError::InvalidArgument(
                "page count must be positive".into(),
            ));
        }
        let per_page = self.config().clamp_page_size(per_page);
        let mut start = 0u64;
        let mut items = Vec::new();
        let mut pages = 0u32;
        let mut status_code = 0u16;

        loop {
            if let PageLimit::Pages(max) = limit {
                if pages >= max {
                    break;
                }
            }
            let mut query: Vec<(&str, String)> = params.to_vec();
            query.push(("start", start.to_string()));
            query.push(("size", per_page.to_string()));

            let response = self.get(uri, &query).await?;
            status_code = response.status_code;
            let data = response
                .data
                .ok_or_else(|| ClientError::UnexpectedResponse(format!("empty page from {uri}")))?;
            let page = data
                .get("items")
                .and_then(Value::as_array)
                .ok_or_else(|| {
                    ClientError::UnexpectedResponse(format!("missing 'items' in page from {uri}"))
                })?;
            let added = page.len();
            items.extend(page.iter().cloned());
            pages += 1;
            debug!(uri, page = pages, items = added, "fetched page");

            let has_next = match data.get("next") {
                None | Some(Value::Null) => false,
                Some(Value::String(s)) => !s.is_empty(),
                Some(Value::Bool(b)) => *b,
                Some(_) => true,
            };
            if !has_next || (limit == PageLimit::All && added == 0) {
                break;
            }
            start += u64::from(per_page);
        }

        Ok(PagedResult {
            status_code,
            total_items: items.len(),
            total_pages: pages,
            items,
        })
    }
}
