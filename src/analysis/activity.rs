//! Contact-activity aggregation: partner resolution, recency buckets,
//! the heat map, and the recent-activity feed.

use super::aggregator::PipelineContext;
use crate::models::{
    Activity, HeatMap, HeatMapRow, PartnerResolution, PartnerType, Prospect, RecentActivity,
    WeekBucket,
};
use chrono::{Datelike, Duration, NaiveDate};
use std::collections::HashMap;

/// Resolves an activity's partner type: first by joining its account name
/// to a prospect, then from the free-text partner column.
#[derive(Debug, Clone, Default)]
pub struct PartnerResolver {
    by_account: HashMap<String, PartnerType>,
}

fn account_key(name: &str) -> String {
    name.trim().to_lowercase()
}

impl PartnerResolver {
    /// Index prospects by account name. The first prospect with a given name wins.
    pub fn new(prospects: &[Prospect]) -> Self {
        let mut by_account = HashMap::new();
        for prospect in prospects {
            let key = account_key(&prospect.account);
            if !key.is_empty() {
                by_account.entry(key).or_insert(prospect.partner_type);
            }
        }
        Self { by_account }
    }

    pub fn resolve(&self, activity: &Activity) -> PartnerResolution {
        self.by_account
            .get(&account_key(&activity.account))
            .copied()
            .or_else(|| PartnerType::from_free_text(&activity.partner_text))
            .map(PartnerResolution::Resolved)
            .unwrap_or(PartnerResolution::Unknown)
    }
}

/// Monday of the calendar week containing `day`.
pub fn week_start(day: NaiveDate) -> NaiveDate {
    day - Duration::days(i64::from(day.weekday().num_days_from_monday()))
}

/// Place a contact date into a calendar-week bucket relative to `today`.
///
/// Buckets have inclusive lower bounds at Monday boundaries. Dates before
/// the start of two weeks ago, or after the current week, yield `None`.
pub fn week_bucket(date: NaiveDate, today: NaiveDate) -> Option<WeekBucket> {
    let this_week = week_start(today);
    let next_week = this_week + Duration::days(7);
    let last_week = this_week - Duration::days(7);
    let two_weeks_ago = this_week - Duration::days(14);

    if date >= next_week {
        None
    } else if date >= this_week {
        Some(WeekBucket::ThisWeek)
    } else if date >= last_week {
        Some(WeekBucket::LastWeek)
    } else if date >= two_weeks_ago {
        Some(WeekBucket::TwoWeeksAgo)
    } else {
        None
    }
}

/// Activity counts by resolved partner type and week bucket.
///
/// Rows without a contact date, or outside the three-week window, are not counted.
pub fn heat_map(ctx: &PipelineContext, today: NaiveDate) -> HeatMap {
    let resolver = PartnerResolver::new(&ctx.prospects);
    let mut rows: Vec<HeatMapRow> = PartnerResolution::ALL
        .iter()
        .map(|&partner| HeatMapRow {
            partner,
            counts: [0; 3],
        })
        .collect();

    for activity in &ctx.activities {
        let Some(bucket) = activity.contact_date.and_then(|d| week_bucket(d, today)) else {
            continue;
        };
        let partner = resolver.resolve(activity);
        if let Some(row) = rows.iter_mut().find(|r| r.partner == partner) {
            row.counts[bucket.index()] += 1;
        }
    }

    HeatMap { rows }
}

/// The `n` most recent dated activities, newest first.
///
/// Activities on the same date keep their sheet order.
pub fn recent_activity(ctx: &PipelineContext, n: usize) -> Vec<RecentActivity> {
    let resolver = PartnerResolver::new(&ctx.prospects);

    let mut dated: Vec<(NaiveDate, &Activity)> = ctx
        .activities
        .iter()
        .filter_map(|a| a.contact_date.map(|d| (d, a)))
        .collect();
    // Stable sort keeps sheet order within a date
    dated.sort_by(|a, b| b.0.cmp(&a.0));

    dated
        .into_iter()
        .take(n)
        .map(|(contact_date, a)| RecentActivity {
            account: a.account.clone(),
            partner: resolver.resolve(a),
            contact_date,
            follow_up_date: a.follow_up_date,
            contact_type: a.contact_type.clone(),
            contact_owner: a.contact_owner.clone(),
            contact_name: a.contact_name.clone(),
            outcome: a.outcome.clone(),
            next_step: a.next_step.clone(),
        })
        .collect()
}
