//! Paging parameters and result pages for query operations.
//!
//! This module provides the skip/take paging model used by persistence
//! components: [`PagingParams`] describes the requested window and
//! [`DataPage`] carries one page of results with an optional total count.

use serde::{Deserialize, Serialize};

/// A requested page window.
///
/// `skip` left unset means no skip at all; `take` left unset means "as much
/// as the component allows". The total count is only computed when `total`
/// is set, since it costs an extra query.
///
/// # Example
///
/// ```ignore
/// use docbase::page::PagingParams;
///
/// let paging = PagingParams::new(10, 5, true);
/// assert_eq!(paging.skip, Some(10));
/// assert_eq!(paging.take_clamped(100), 5);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PagingParams {
    /// Number of items to skip, or `None` for no skip.
    pub skip: Option<u64>,
    /// Number of items to return, or `None` for the component maximum.
    pub take: Option<u64>,
    /// Whether to compute the total number of matching items.
    pub total: bool,
}

impl PagingParams {
    /// Creates paging parameters with explicit skip and take.
    pub fn new(skip: u64, take: u64, total: bool) -> Self {
        Self {
            skip: Some(skip),
            take: Some(take),
            total,
        }
    }

    /// Returns the effective take, clamped to `1..=max_page_size`.
    ///
    /// An unset take resolves to `max_page_size`.
    pub fn take_clamped(&self, max_page_size: u64) -> u64 {
        self.take
            .unwrap_or(max_page_size)
            .clamp(1, max_page_size.max(1))
    }
}

/// One page of results.
///
/// `total` is present only when the paging parameters asked for it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DataPage<T> {
    /// The items of this page.
    pub data: Vec<T>,
    /// Total number of matching items, when requested.
    pub total: Option<u64>,
}

impl<T> DataPage<T> {
    /// Creates a page from the given items and optional total.
    pub fn new(data: Vec<T>, total: Option<u64>) -> Self {
        Self { data, total }
    }

    /// Returns the number of items in this page.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Returns `true` when this page carries no items.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}
