//! Listing through the search index
//!
//! Hits are mapped back through `Entity::from_index_object`. Projections
//! that no longer parse, such as ones written by an older schema, are
//! skipped and logged rather than failing the page.

use std::sync::Arc;
use std::time::Instant;

use serde::{Deserialize, Serialize};
use tutorsync_core::errors::{Result, SyncError, Verb};
use tutorsync_core::query::{execute, ListQuery, SearchRequest, SearchResponse};
use tutorsync_core::{log_op_end, log_op_error, log_op_start};
use tutorsync_core::{Entity, RecordStore, SearchIndex};
use tutorsync_core_types::RequestContext;

/// Page sizing and fallback behaviour
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ListingOptions {
    pub default_hits_per_page: usize,
    pub max_hits_per_page: usize,
    /// Scan the record store when the index cannot be reached
    pub fallback_to_store: bool,
}

impl Default for ListingOptions {
    fn default() -> Self {
        Self {
            default_hits_per_page: 20,
            max_hits_per_page: 1000,
            fallback_to_store: true,
        }
    }
}

/// One page of list results
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ListPage<E> {
    /// Total matches across all pages
    pub hits: usize,
    pub results: Vec<E>,
    /// Hits on this page dropped because they no longer parse
    pub skipped: usize,
    /// True when the page came from a store scan instead of the index
    pub from_store: bool,
}

pub struct ListService<E: Entity> {
    store: Arc<dyn RecordStore<E>>,
    index: Arc<dyn SearchIndex>,
    options: ListingOptions,
}

impl<E: Entity> Clone for ListService<E> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            index: self.index.clone(),
            options: self.options,
        }
    }
}

impl<E: Entity> ListService<E> {
    pub fn new(store: Arc<dyn RecordStore<E>>, index: Arc<dyn SearchIndex>) -> Self {
        Self {
            store,
            index,
            options: ListingOptions::default(),
        }
    }

    pub fn with_options(mut self, options: ListingOptions) -> Self {
        self.options = options;
        self
    }

    /// List the entities matching `query`
    ///
    /// # Errors
    ///
    /// `Search` if the index fails and no fallback applies, `Store` if the
    /// fallback scan fails.
    pub fn list<Q>(&self, ctx: &RequestContext, query: &Q) -> Result<ListPage<E>>
    where
        Q: ListQuery<Entity = E>,
    {
        let span = tracing::info_span!(
            "list",
            request_id = ctx.request_id.as_str(),
            origin = ctx.origin_or_empty(),
            entity_kind = E::KIND.as_str(),
        );
        let _guard = span.enter();

        log_op_start!("list");
        let start = Instant::now();

        let result = self.list_impl(query);
        let duration_ms = start.elapsed().as_millis() as u64;
        match &result {
            Ok(page) => {
                log_op_end!(
                    "list",
                    duration_ms = duration_ms,
                    hits = page.hits as u64,
                    skipped = page.skipped as u64,
                    from_store = page.from_store,
                );
            }
            Err(err) => {
                log_op_error!("list", err, duration_ms = duration_ms);
            }
        }
        result
    }

    fn list_impl<Q>(&self, query: &Q) -> Result<ListPage<E>>
    where
        Q: ListQuery<Entity = E>,
    {
        let request = self.resolve(query);
        let index = E::KIND.index();

        let (response, from_store) = match self.index.search(index, &request) {
            Ok(response) => (response, false),
            Err(err) if err.is_transport() && self.options.fallback_to_store => {
                tracing::warn!(
                    index = index.as_str(),
                    error = %err,
                    "search index unavailable, listing from the record store"
                );
                (self.scan_store(&request)?, true)
            }
            Err(source) => {
                return Err(SyncError::Search {
                    verb: Verb::List,
                    kind: E::KIND,
                    source,
                })
            }
        };

        let mut results = Vec::with_capacity(response.hits.len());
        let mut skipped = 0;
        for hit in &response.hits {
            match E::from_index_object(hit) {
                Ok(entity) => results.push(entity),
                Err(err) => {
                    skipped += 1;
                    tracing::warn!(
                        index = index.as_str(),
                        object_id = hit.object_id().unwrap_or(""),
                        error = %err,
                        "skipping index hit that no longer parses"
                    );
                }
            }
        }

        Ok(ListPage {
            hits: response.nb_hits,
            results,
            skipped,
            from_store,
        })
    }

    fn resolve<Q: ListQuery>(&self, query: &Q) -> SearchRequest {
        let mut request = query.to_request();
        let max = self.options.max_hits_per_page.max(1);
        request.hits_per_page = query
            .pagination()
            .hits_per_page
            .unwrap_or(self.options.default_hits_per_page)
            .clamp(1, max);
        request
    }

    fn scan_store(&self, request: &SearchRequest) -> Result<SearchResponse> {
        let entities = self.store.list().map_err(|source| SyncError::Store {
            verb: Verb::List,
            kind: E::KIND,
            entity: E::KIND.table().to_string(),
            source,
        })?;
        let objects: Vec<_> = entities.iter().map(Entity::to_index_object).collect();
        Ok(execute(&objects, request))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tutorsync_core::query::{OrgsQuery, Pagination};
    use tutorsync_core::{MemoryIndex, MemoryStore, Org};

    fn service(options: ListingOptions) -> ListService<Org> {
        let store: Arc<dyn RecordStore<Org>> = Arc::new(MemoryStore::<Org>::new());
        ListService::new(store, Arc::new(MemoryIndex::immediate())).with_options(options)
    }

    #[test]
    fn test_hits_per_page_defaults_and_clamps() {
        let service = service(ListingOptions {
            default_hits_per_page: 7,
            max_hits_per_page: 50,
            fallback_to_store: false,
        });

        let defaulted = service.resolve(&OrgsQuery::default());
        assert_eq!(defaulted.hits_per_page, 7);

        let clamped = service.resolve(&OrgsQuery {
            pagination: Pagination {
                page: 0,
                hits_per_page: Some(10_000),
            },
            ..OrgsQuery::default()
        });
        assert_eq!(clamped.hits_per_page, 50);

        let zero = service.resolve(&OrgsQuery {
            pagination: Pagination {
                page: 0,
                hits_per_page: Some(0),
            },
            ..OrgsQuery::default()
        });
        assert_eq!(zero.hits_per_page, 1);
    }

    #[test]
    fn test_empty_index_lists_nothing() {
        let page = service(ListingOptions::default())
            .list(&RequestContext::new(), &OrgsQuery::default())
            .unwrap();
        assert_eq!(page.hits, 0);
        assert!(page.results.is_empty());
        assert!(!page.from_store);
    }
}
