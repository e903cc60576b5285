//! Accept / edit / reject / undo workflow for taxonomy suggestions.
//!
//! After a save returns suggestions, [`ApplyWorkflow::begin`] picks the top
//! selection and yields a [`PendingDecision`]. The caller supplies a
//! [`Decision`], and [`ApplyWorkflow::resolve`] performs the follow-up write:
//!
//! ```text
//! AwaitingDecision ──Accept──▶ Accepted   (save + journal append)
//!                  ──Edit────▶ Edited     (save + journal append)
//!                  ──Reject──▶ Rejected   (no write)
//!                  ──Undo────▶ Undone     (compensating save, journal untouched)
//!                              NothingToUndo (empty journal)
//! ```
//!
//! Undo is a forward write that restores the taxonomy captured in the latest
//! journal record. It neither removes nor appends a record, so a second undo
//! repeats the same reversal.

use super::SymbolGateway;
use crate::models::{
    ApplyOutcome, ApplyRecord, Decision, SaveRequest, SaveResponse, Selection, Taxonomy,
    TaxonomySuggestions,
};
use crate::storage::ApplyJournal;
use crate::{Result, current_timestamp_iso};
use tracing::instrument;

/// Combined score at or above which the default decision is to accept.
pub const ACCEPT_THRESHOLD: f64 = 0.65;

/// Chooses the single (category, subcategory) selection to present.
///
/// Takes the top category, then the best pair under that category. When no
/// pair matches, the overall best pair wins and its category replaces the
/// top category. The combined score is the lower of the two scores when both
/// sides are selected.
#[must_use]
pub fn pick_top(suggestions: &TaxonomySuggestions) -> Selection {
    let mut category = suggestions.top_category().map(|c| c.category.clone());
    let mut category_score = suggestions.top_category().map(|c| c.score);
    let mut subcategory = None;
    let mut pair_score = None;

    if let Some(first) = suggestions.top_pair() {
        let matching = category
            .as_deref()
            .and_then(|top| suggestions.pairs.iter().find(|pair| pair.category == top));

        if let Some(pair) = matching {
            subcategory = Some(pair.subcategory.clone());
            pair_score = Some(pair.score);
        } else {
            subcategory = Some(first.subcategory.clone());
            pair_score = Some(first.score);
            if !first.category.is_empty() {
                category = Some(first.category.clone());
                category_score = category_score.or(Some(first.score));
            }
        }
    }

    let score = match (&category, &subcategory) {
        (Some(_), Some(_)) => category_score
            .unwrap_or(0.0)
            .min(pair_score.unwrap_or(0.0)),
        _ => category_score.or(pair_score).unwrap_or(0.0),
    };

    Selection {
        category,
        subcategory,
        score,
    }
}

/// A selection waiting for the caller's decision.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingDecision {
    request: SaveRequest,
    previous: Taxonomy,
    selection: Selection,
}

impl PendingDecision {
    /// Builds a pending decision from a save and its response.
    ///
    /// Returns `None` when the request already carried both category and
    /// subcategory, when the response has no suggestions, or when nothing
    /// could be selected.
    #[must_use]
    pub fn from_response(request: &SaveRequest, response: &SaveResponse) -> Option<Self> {
        let request = request.clone().validate().ok()?;
        if !request.needs_suggestion() {
            return None;
        }

        let selection = pick_top(response.suggestions.as_ref()?);
        if selection.is_empty() {
            return None;
        }

        Some(Self {
            request,
            previous: response.outcome.prev.clone(),
            selection,
        })
    }

    /// The selection on offer.
    #[must_use]
    pub const fn selection(&self) -> &Selection {
        &self.selection
    }

    /// Taxonomy the entry had before the save that produced the suggestions.
    #[must_use]
    pub const fn previous(&self) -> &Taxonomy {
        &self.previous
    }

    /// The save request the suggestions were produced for.
    #[must_use]
    pub const fn request(&self) -> &SaveRequest {
        &self.request
    }

    /// Returns true if the combined score reaches [`ACCEPT_THRESHOLD`].
    #[must_use]
    pub fn recommends_accept(&self) -> bool {
        self.selection.score >= ACCEPT_THRESHOLD
    }

    /// The decision taken when the caller gives no answer.
    #[must_use]
    pub fn default_decision(&self) -> Decision {
        if self.recommends_accept() {
            Decision::Accept
        } else {
            Decision::Reject
        }
    }
}

/// Drives follow-up writes for taxonomy suggestions.
pub struct ApplyWorkflow<G, J> {
    gateway: G,
    journal: J,
}

impl<G: SymbolGateway, J: ApplyJournal> ApplyWorkflow<G, J> {
    /// Creates a workflow writing through `gateway` and recording to `journal`.
    pub const fn new(gateway: G, journal: J) -> Self {
        Self { gateway, journal }
    }

    /// Returns the journal.
    pub const fn journal(&self) -> &J {
        &self.journal
    }

    /// Returns the gateway.
    pub const fn gateway(&self) -> &G {
        &self.gateway
    }

    /// Builds a pending decision from a save and its response.
    ///
    /// See [`PendingDecision::from_response`].
    #[must_use]
    pub fn begin(&self, request: &SaveRequest, response: &SaveResponse) -> Option<PendingDecision> {
        PendingDecision::from_response(request, response)
    }

    /// Saves `request` and, if suggestions came back, opens a decision.
    ///
    /// # Errors
    ///
    /// Returns an error if the save fails.
    pub fn submit(&self, request: &SaveRequest) -> Result<(SaveResponse, Option<PendingDecision>)> {
        let response = self.gateway.save(request)?;
        let pending = self.begin(request, &response);
        Ok((response, pending))
    }

    /// Applies `decision` to `pending`.
    ///
    /// For [`Decision::Edit`], a `None` or blank replacement keeps the
    /// suggested value. [`Decision::Undo`] reverts the latest journal record
    /// using the pending request's aliases.
    ///
    /// # Errors
    ///
    /// Returns an error if a follow-up save, a read, or the journal append
    /// fails.
    #[instrument(skip(self, pending), fields(symbol = %pending.request.symbol))]
    pub fn resolve(&self, pending: &PendingDecision, decision: Decision) -> Result<ApplyOutcome> {
        match decision {
            Decision::Accept => {
                let (record, response) = self.apply(pending, pending.selection.taxonomy())?;
                Ok(ApplyOutcome::Accepted { record, response })
            },
            Decision::Edit {
                category,
                subcategory,
            } => {
                let taxonomy = Taxonomy::new(
                    non_blank(category).or_else(|| pending.selection.category.clone()),
                    non_blank(subcategory).or_else(|| pending.selection.subcategory.clone()),
                );
                let (record, response) = self.apply(pending, taxonomy)?;
                Ok(ApplyOutcome::Edited { record, response })
            },
            Decision::Reject => {
                tracing::info!("Suggestion rejected");
                Ok(ApplyOutcome::Rejected)
            },
            Decision::Undo => self.undo(&pending.request.aliases),
        }
    }

    /// Reverts the latest journal record.
    ///
    /// Writes the record's previous taxonomy back onto its symbol, keeping
    /// the currently stored body. `aliases` are passed through to the save.
    ///
    /// # Errors
    ///
    /// Returns an error if the journal cannot be read, the symbol no longer
    /// resolves, or the compensating save fails.
    #[instrument(skip(self, aliases))]
    pub fn undo(&self, aliases: &[String]) -> Result<ApplyOutcome> {
        let Some(record) = self.journal.latest()? else {
            tracing::info!("Nothing to undo");
            return Ok(ApplyOutcome::NothingToUndo);
        };

        let body = self.gateway.read(&record.symbol)?;
        let mut request = SaveRequest::new(record.symbol.as_str(), body).with_taxonomy(record.previous());
        request.aliases = aliases.to_vec();

        let response = self.gateway.save(&request)?;
        tracing::info!(symbol = %record.symbol, "Reverted taxonomy change");

        Ok(ApplyOutcome::Undone { record, response })
    }

    fn apply(
        &self,
        pending: &PendingDecision,
        taxonomy: Taxonomy,
    ) -> Result<(ApplyRecord, SaveResponse)> {
        let request = pending.request.clone().with_taxonomy(taxonomy.clone());
        let response = self.gateway.save(&request)?;

        let record = ApplyRecord {
            symbol: request.symbol,
            previous_category: pending.previous.category.clone(),
            previous_subcategory: pending.previous.subcategory.clone(),
            new_category: taxonomy.category,
            new_subcategory: taxonomy.subcategory,
            score: pending.selection.score,
            recorded_at: current_timestamp_iso(),
        };
        self.journal.append(&record)?;
        tracing::info!(score = record.score, "Applied taxonomy change");

        Ok((record, response))
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
