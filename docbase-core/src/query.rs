//! The query shape handed to storage backends.
//!
//! Filters, sort orders, and projections are opaque BSON documents in the
//! store's native notation. The layer passes them through unmodified; only
//! skip and limit are computed here, from paging parameters.

use bson::Document;

/// A complete query: an opaque filter plus optional sort, projection,
/// skip, and limit.
///
/// # Example
///
/// ```ignore
/// use bson::doc;
/// use docbase::query::Query;
///
/// let query = Query::new(doc! { "key": "key 1" })
///     .sort(doc! { "key": 1 })
///     .limit(10);
/// ```
#[derive(Debug, Clone, Default)]
pub struct Query {
    /// Match condition in store notation. An empty document matches all.
    pub filter: Document,
    /// Sort order, e.g. `{ "key": 1 }`.
    pub sort: Option<Document>,
    /// Field projection, e.g. `{ "content": 1 }`.
    pub projection: Option<Document>,
    /// Number of documents to skip.
    pub skip: Option<u64>,
    /// Maximum number of documents to return.
    pub limit: Option<u64>,
}

impl Query {
    /// Creates a query with the given filter and nothing else.
    pub fn new(filter: Document) -> Self {
        Self {
            filter,
            ..Default::default()
        }
    }

    /// Sets the sort order.
    pub fn sort(mut self, sort: Document) -> Self {
        self.sort = Some(sort);
        self
    }

    /// Sets the field projection.
    pub fn projection(mut self, projection: Document) -> Self {
        self.projection = Some(projection);
        self
    }

    /// Sets the number of documents to skip.
    pub fn skip(mut self, skip: u64) -> Self {
        self.skip = Some(skip);
        self
    }

    /// Sets the maximum number of documents to return.
    pub fn limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Merges optional sort and projection documents into this query.
    pub fn shaped(mut self, sort: Option<Document>, projection: Option<Document>) -> Self {
        self.sort = sort;
        self.projection = projection;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bson::doc;

    #[test]
    fn builder_style_composition() {
        let query = Query::new(doc! { "key": "key 1" })
            .sort(doc! { "key": 1 })
            .skip(4)
            .limit(2);

        assert_eq!(query.filter, doc! { "key": "key 1" });
        assert_eq!(query.sort, Some(doc! { "key": 1 }));
        assert_eq!(query.projection, None);
        assert_eq!(query.skip, Some(4));
        assert_eq!(query.limit, Some(2));
    }

    #[test]
    fn default_query_matches_all() {
        let query = Query::default();
        assert!(query.filter.is_empty());
        assert_eq!(query.limit, None);
    }
}
