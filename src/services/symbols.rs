//! Save-and-suggest service.

use super::{SymbolGateway, TaxonomySuggester};
use crate::models::{SaveRequest, SaveResponse, TaxonomySuggestions};
use crate::storage::{SqliteSymbolStore, SymbolStore};
use crate::{Error, Result};
use std::sync::Arc;
use tracing::instrument;

/// Saves entries, attaches taxonomy suggestions, and reads bodies back.
///
/// Suggestions are computed only when the request lacks a category or a
/// subcategory. They are computed after the write, so the entry being saved
/// takes part in its own suggestion when it already carried a partial
/// taxonomy.
#[derive(Clone)]
pub struct SymbolService {
    store: Arc<dyn SymbolStore>,
    suggester: TaxonomySuggester,
}

impl SymbolService {
    /// Creates a service over `store` with default suggestion settings.
    #[must_use]
    pub fn new(store: Arc<dyn SymbolStore>) -> Self {
        Self {
            store,
            suggester: TaxonomySuggester::default(),
        }
    }

    /// Creates a service over a fresh in-memory store.
    ///
    /// # Errors
    ///
    /// Returns an error if the in-memory database cannot be initialized.
    pub fn in_memory() -> Result<Self> {
        Ok(Self::new(Arc::new(SqliteSymbolStore::in_memory()?)))
    }

    /// Replaces the suggester.
    #[must_use]
    pub fn with_suggester(mut self, suggester: TaxonomySuggester) -> Self {
        self.suggester = suggester;
        self
    }

    /// Returns the underlying store.
    #[must_use]
    pub fn store(&self) -> &dyn SymbolStore {
        self.store.as_ref()
    }

    /// Saves `request`, then suggests a taxonomy if needed.
    ///
    /// Validation happens once, inside [`SymbolStore::save`].
    ///
    /// A failed suggestion scan is logged and reported as no suggestion; the
    /// save itself has already committed at that point.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] if the request is invalid, or an
    /// error if the write fails.
    #[instrument(skip(self, request), fields(symbol = %request.symbol))]
    pub fn save(&self, request: &SaveRequest) -> Result<SaveResponse> {
        let outcome = self.store.save(request)?;

        let suggestions = if request.needs_suggestion() {
            self.suggest(request)
        } else {
            None
        };

        tracing::info!(
            status = outcome.status.as_str(),
            suggested = suggestions.is_some(),
            "Saved text entry"
        );

        Ok(SaveResponse {
            outcome,
            suggestions,
        })
    }

    fn suggest(&self, request: &SaveRequest) -> Option<TaxonomySuggestions> {
        match self
            .suggester
            .suggest(self.store.as_ref(), &request.symbol, &request.text)
        {
            Ok(suggestions) => suggestions,
            Err(e) => {
                tracing::warn!(error = %e, "Taxonomy suggestion failed, continuing without");
                None
            },
        }
    }

    /// Returns the body stored under a symbol or alias, if any.
    ///
    /// # Errors
    ///
    /// Returns an error if the lookup fails.
    pub fn lookup(&self, symbol_or_alias: &str) -> Result<Option<String>> {
        self.store.get_body(symbol_or_alias)
    }

    /// Returns the body stored under a symbol or alias.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if the name does not resolve.
    #[instrument(skip(self))]
    pub fn read(&self, symbol_or_alias: &str) -> Result<String> {
        self.lookup(symbol_or_alias)?
            .ok_or_else(|| Error::NotFound(symbol_or_alias.to_string()))
    }
}

impl SymbolGateway for SymbolService {
    fn save(&self, request: &SaveRequest) -> Result<SaveResponse> {
        Self::save(self, request)
    }

    fn read(&self, symbol_or_alias: &str) -> Result<String> {
        Self::read(self, symbol_or_alias)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SaveStatus;

    #[test]
    fn test_save_without_neighbors_has_no_suggestions() {
        let service = SymbolService::in_memory().unwrap();
        let response = service
            .save(&SaveRequest::new("TST.ONE", "hybrid intelligence"))
            .unwrap();

        assert_eq!(response.outcome.status, SaveStatus::Created);
        assert!(response.suggestions.is_none());
    }

    #[test]
    fn test_save_with_full_taxonomy_skips_suggestions() {
        let service = SymbolService::in_memory().unwrap();
        let request = SaveRequest::new("TST.NEIGHBOR", "hybrid intelligence symbolic memory")
            .with_category("ai")
            .with_subcategory("architecture.hybrid");
        service.save(&request).unwrap();

        let response = service.save(&request).unwrap();
        assert_eq!(response.outcome.status, SaveStatus::Updated);
        assert!(response.suggestions.is_none());
    }

    #[test]
    fn test_save_attaches_suggestions() {
        let service = SymbolService::in_memory().unwrap();
        service
            .save(
                &SaveRequest::new("TST.NEIGHBOR", "hybrid intelligence symbolic memory")
                    .with_category("ai")
                    .with_subcategory("architecture.hybrid"),
            )
            .unwrap();

        let response = service
            .save(&SaveRequest::new(
                "TST.TWO",
                "hybrid intelligence and symbolic memory",
            ))
            .unwrap();
        let suggestions = response.suggestions.unwrap();
        assert_eq!(suggestions.top_category().unwrap().category, "ai");
        assert_eq!(
            suggestions.top_pair().unwrap().subcategory,
            "architecture.hybrid"
        );
    }

    #[test]
    fn test_read_resolves_alias_and_reports_not_found() {
        let service = SymbolService::in_memory().unwrap();
        service
            .save(&SaveRequest::new("TST.ONE", "body").with_alias("one"))
            .unwrap();

        assert_eq!(service.read("one").unwrap(), "body");
        assert!(matches!(service.read("nope"), Err(Error::NotFound(name)) if name == "nope"));
        assert!(service.lookup("nope").unwrap().is_none());
    }

    #[test]
    fn test_invalid_request_is_rejected_before_write() {
        let service = SymbolService::in_memory().unwrap();
        let err = service.save(&SaveRequest::new("TST.ONE", "")).unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));

        let err = service
            .save(&SaveRequest::new("TST.ONE", "body").with_alias("x/y"))
            .unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));

        assert_eq!(service.store().count().unwrap(), 0);
    }

    #[test]
    fn test_blank_subcategory_still_gets_suggestions() {
        let service = SymbolService::in_memory().unwrap();
        service
            .save(
                &SaveRequest::new("TST.NEIGHBOR", "hybrid intelligence symbolic memory")
                    .with_category("ai")
                    .with_subcategory("architecture.hybrid"),
            )
            .unwrap();

        let response = service
            .save(
                &SaveRequest::new("TST.TWO", "hybrid intelligence and symbolic memory")
                    .with_category("ai")
                    .with_subcategory("  "),
            )
            .unwrap();

        assert!(response.suggestions.is_some());
        let stored = service.store().taxonomy("TST.TWO").unwrap().unwrap();
        assert_eq!(stored.subcategory, None);
    }

    #[test]
    fn test_whitespace_body_round_trips() {
        let service = SymbolService::in_memory().unwrap();
        service.save(&SaveRequest::new("WS", "   ")).unwrap();
        assert_eq!(service.read("WS").unwrap(), "   ");
    }
}
