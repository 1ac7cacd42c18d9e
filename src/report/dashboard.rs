//! Dashboard assembly.
//!
//! Normalizes whichever sheets are present and runs every query. A missing
//! sheet takes out only the views that depend on it.

use crate::analysis::{
    heat_map, kpis, pipeline_by_stage, pipeline_value_by_stage, recent_activity, top_deals,
    PipelineContext,
};
use crate::error::WorkbookError;
use crate::models::{
    ActivityViews, Dashboard, DashboardMetadata, PartnerFilter, PartnerType, PipelineViews,
};
use crate::pipeline::{normalize_activities, normalize_prospects, read_data_dictionary};
use crate::workbook::{
    Workbook, CONTACT_DETAIL_SHEET, DATA_DICTIONARY_SHEET, PUBLIC_INVESTMENT_SHEET,
    SPONSORSHIP_SHEET,
};
use chrono::{NaiveDate, Utc};
use tracing::{info, warn};

/// What to show and how.
#[derive(Debug, Clone)]
pub struct DashboardOptions {
    pub partner_filter: PartnerFilter,
    /// Owners to narrow prospects to; empty for everyone.
    pub owners: Vec<String>,
    /// Reference date for week bucketing.
    pub today: NaiveDate,
    pub top_deals: usize,
    pub recent_activity: usize,
    pub include_data_dictionary: bool,
}

fn unavailable(views: &str, err: &WorkbookError) -> String {
    warn!("{} unavailable: {}", views, err);
    format!("{}: {}", views, err)
}

/// Build every dashboard view from an opened workbook.
pub fn build_dashboard(workbook: &Workbook, options: &DashboardOptions) -> Dashboard {
    let mut unavailable_views = Vec::new();
    let mut warnings = Vec::new();

    let prospects = match (
        workbook.sheet(SPONSORSHIP_SHEET),
        workbook.sheet(PUBLIC_INVESTMENT_SHEET),
    ) {
        (Ok(sponsorships), Ok(public)) => {
            let normalized = normalize_prospects(sponsorships, public);
            warnings.extend(normalized.issues.iter().map(|i| i.to_string()));
            Some(normalized.records)
        }
        (Err(e), _) | (_, Err(e)) => {
            unavailable_views.push(unavailable("Pipeline views", &e));
            None
        }
    };

    let activities = match workbook.sheet(CONTACT_DETAIL_SHEET) {
        Ok(sheet) => {
            let normalized = normalize_activities(sheet);
            warnings.extend(normalized.issues.iter().map(|i| i.to_string()));
            Some(normalized.records)
        }
        Err(e) => {
            unavailable_views.push(unavailable("Activity views", &e));
            None
        }
    };

    let data_dictionary = if options.include_data_dictionary {
        match workbook.sheet(DATA_DICTIONARY_SHEET) {
            Ok(sheet) => Some(read_data_dictionary(sheet)),
            Err(e) => {
                unavailable_views.push(unavailable("Data dictionary", &e));
                None
            }
        }
    } else {
        None
    };

    let has_prospects = prospects.is_some();
    let has_activities = activities.is_some();
    let ctx = PipelineContext::new(
        prospects.unwrap_or_default(),
        activities.unwrap_or_default(),
    );

    let pipeline = has_prospects.then(|| {
        let owned = ctx.restrict_to_owners(&options.owners);
        if !options.owners.is_empty() {
            info!(
                "Owner filter kept {} of {} prospects",
                owned.prospects.len(),
                ctx.prospects.len()
            );
        }
        // A leaderboard for a filtered-out partner type stays empty
        let leaders = |partner_type: PartnerType| {
            if options.partner_filter.matches(partner_type) {
                top_deals(&owned, partner_type, options.top_deals)
            } else {
                Vec::new()
            }
        };
        PipelineViews {
            kpis: kpis(&owned, options.partner_filter),
            top_sponsorship: leaders(PartnerType::Sponsorship),
            top_public_investment: leaders(PartnerType::PublicInvestment),
            board: pipeline_by_stage(&owned, options.partner_filter),
            totals: pipeline_value_by_stage(&owned, options.partner_filter),
        }
    });

    // Partner resolution joins against every prospect, not just the owner-filtered ones
    let activity = has_activities.then(|| ActivityViews {
        heat_map: heat_map(&ctx, options.today),
        recent: recent_activity(&ctx, options.recent_activity),
    });

    Dashboard {
        metadata: DashboardMetadata {
            workbook: workbook.path().display().to_string(),
            generated_at: Utc::now(),
            reference_date: options.today,
            partner_filter: options.partner_filter,
            owners: options.owners.clone(),
            prospect_count: ctx.prospects.len(),
            activity_count: ctx.activities.len(),
        },
        pipeline,
        activity,
        data_dictionary,
        unavailable: unavailable_views,
        warnings,
    }
}
