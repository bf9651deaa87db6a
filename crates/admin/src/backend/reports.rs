//! Dashboard summary.
//!
//! The backend has no dedicated report endpoint; counts come from the
//! `count` field of single-item list pages, fetched concurrently.

use lendix_core::CreditStatus;
use serde::Serialize;
use tracing::instrument;

use super::{ApiError, Authorized, CreditQuery, PageQuery, paths};

/// Headline numbers for the dashboard.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ReportSummary {
    pub clients: u64,
    pub credits: u64,
    pub pending_credits: u64,
    pub active_credits: u64,
    pub overdue_credits: u64,
}

/// Only the envelope's count is decoded.
#[derive(serde::Deserialize)]
struct CountOnly {
    count: u64,
}

impl Authorized<'_> {
    async fn count<Q: Serialize + Sync>(&self, path: &str, query: &Q) -> Result<u64, ApiError> {
        let page: CountOnly = self.get_with(path, query).await?;
        Ok(page.count)
    }

    async fn count_credits(&self, status: Option<CreditStatus>) -> Result<u64, ApiError> {
        let query = CreditQuery {
            page: PageQuery::count_only(),
            estado: status,
            client: None,
        };
        self.count(paths::CREDITS, &query).await
    }

    /// Assemble the dashboard summary.
    ///
    /// # Errors
    ///
    /// Returns the first failing count's error.
    #[instrument(skip(self))]
    pub async fn report_summary(&self) -> Result<ReportSummary, ApiError> {
        let all_clients = PageQuery::count_only();
        let (clients, credits, pending_credits, active_credits, overdue_credits) = tokio::try_join!(
            self.count(paths::CLIENTS, &all_clients),
            self.count_credits(None),
            self.count_credits(Some(CreditStatus::Pending)),
            self.count_credits(Some(CreditStatus::Active)),
            self.count_credits(Some(CreditStatus::Overdue)),
        )?;

        Ok(ReportSummary {
            clients,
            credits,
            pending_credits,
            active_credits,
            overdue_credits,
        })
    }
}
