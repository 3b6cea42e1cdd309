//! Policy pipeline service
//!
//! normalize -> evaluate -> assemble, with an optional elaboration pass over
//! the selected recommendations.

use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;
use shared::{
    assemble, evaluate, normalize, normalize_forecast, ChartRef, ChartSlot, ForecastSeries,
    RecommendationSet, ReportDocument,
};

use crate::error::AppResult;
use crate::external::{PolicyLlmClient, PolicyNarrative};
use crate::services::catalog_store::CatalogStore;

/// Number of forecast days quoted in the outlook
pub const OUTLOOK_DAYS: usize = 3;

/// Everything produced for one payload
#[derive(Debug, Clone, Serialize)]
pub struct PolicyReport {
    pub set: RecommendationSet,
    pub forecast: ForecastSeries,
    pub document: ReportDocument,
}

#[derive(Clone)]
pub struct PolicyService {
    catalog: Arc<CatalogStore>,
    llm: Option<PolicyLlmClient>,
}

impl PolicyService {
    pub fn new(catalog: Arc<CatalogStore>, llm: Option<PolicyLlmClient>) -> Self {
        Self { catalog, llm }
    }

    pub fn catalog(&self) -> &CatalogStore {
        &self.catalog
    }

    /// Normalize a payload and evaluate it against the active catalog
    pub fn recommend(&self, payload: &Value) -> AppResult<RecommendationSet> {
        let snapshot = normalize(payload)?;
        let missing = snapshot.missing_fields();
        if !missing.is_empty() {
            tracing::debug!(location = %snapshot.location, ?missing, "Snapshot has missing readings");
        }

        let catalog = self.catalog.current();
        let set = evaluate(&snapshot, &catalog)?;
        for rec in set.iter() {
            tracing::debug!(rule = %rec.rule_id, priority = rec.priority, "Rule triggered");
        }
        tracing::info!(
            location = %set.snapshot.location,
            recommendations = set.len(),
            rules = catalog.len(),
            "Policy evaluation complete"
        );
        Ok(set)
    }

    /// Run the full pipeline and assemble the report document
    pub fn build_report(&self, payload: &Value, charts: &[ChartRef]) -> AppResult<PolicyReport> {
        let set = self.recommend(payload)?;
        let forecast = normalize_forecast(payload);
        let document = assemble(&set, charts);

        for slot in document.chart_slots() {
            if let ChartSlot::Unavailable { title, reason } = slot {
                tracing::warn!(chart = %title, %reason, "Chart left out of report");
            }
        }

        Ok(PolicyReport {
            set,
            forecast,
            document,
        })
    }

    /// Elaborate on a report. Yields nothing when elaboration is not
    /// configured or no prompt was given.
    pub async fn elaborate(
        &self,
        prompt: Option<&str>,
        report: &PolicyReport,
    ) -> AppResult<Option<PolicyNarrative>> {
        let (Some(client), Some(prompt)) = (&self.llm, prompt) else {
            tracing::debug!("Elaboration skipped");
            return Ok(None);
        };

        tracing::info!(model = client.model(), "Requesting policy elaboration");
        let outlook = report.forecast.outlook_lines(OUTLOOK_DAYS);
        let narrative = client.elaborate(prompt, &report.set, &outlook).await?;
        Ok(Some(narrative))
    }
}
