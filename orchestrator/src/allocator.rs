//! Keyword allocation with exclusive claims
//!
//! Picks the highest-priority pending keyword a site may use and claims it in
//! the store. A lost claim race moves on to the next candidate instead of
//! failing the run.

use shared::{site_debug, site_warn, Keyword, KeywordId, KeywordStatus, SiteId};

use crate::error::{OrchestratorError, OrchestratorResult};
use crate::traits::Store;

/// Allocates keywords from the pool for one site at a time
pub struct KeywordAllocator<'a, S: Store + ?Sized> {
    store: &'a S,
}

impl<'a, S: Store + ?Sized> KeywordAllocator<'a, S> {
    pub fn new(store: &'a S) -> Self {
        Self { store }
    }

    /// Claim the next keyword for `site_id` among `candidates`
    ///
    /// Candidates are filtered to pending keywords usable by the site, then
    /// ordered by priority (highest first) keeping candidate order on ties.
    ///
    /// # Returns
    /// - `Ok(Some(keyword))` with `status == Generating` once claimed
    /// - `Ok(None)` when nothing is left to claim
    /// - `Err(Allocation)` when the store is unavailable
    pub async fn allocate_next(&self, site_id: &SiteId, candidates: &[KeywordId]) -> OrchestratorResult<Option<Keyword>> {
        if candidates.is_empty() {
            return Ok(None);
        }

        let keywords = self
            .store
            .get_keywords(candidates)
            .await
            .map_err(|e| allocation_error(site_id, e))?;

        for mut keyword in rank_candidates(site_id, keywords) {
            match self.store.claim_keyword(&keyword.id).await {
                Ok(true) => {
                    site_debug!(site_id, keyword = %keyword.text, priority = keyword.priority, "🔒 Claimed keyword");
                    keyword.status = KeywordStatus::Generating;
                    return Ok(Some(keyword));
                }
                Ok(false) => {
                    site_debug!(site_id, keyword = %keyword.text, "Keyword already claimed, trying next candidate");
                }
                Err(e) => {
                    site_warn!(site_id, keyword = %keyword.text, error = %e, "⚠️ Keyword claim failed");
                    return Err(allocation_error(site_id, e));
                }
            }
        }

        Ok(None)
    }
}

/// Pending keywords usable by the site, best first
///
/// `sort_by` is stable, so equal priorities keep their candidate order.
pub fn rank_candidates(site_id: &SiteId, keywords: Vec<Keyword>) -> Vec<Keyword> {
    let mut pending: Vec<Keyword> = keywords
        .into_iter()
        .filter(|k| k.status.is_claimable() && k.is_usable_by(site_id))
        .collect();
    pending.sort_by(|a, b| b.priority.cmp(&a.priority));
    pending
}

fn allocation_error(site_id: &SiteId, source: OrchestratorError) -> OrchestratorError {
    match source {
        err @ OrchestratorError::Allocation { .. } => err,
        other => OrchestratorError::Allocation {
            site_id: *site_id,
            message: other.to_string(),
        },
    }
}
