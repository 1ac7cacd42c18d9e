//! Data models for the pipeline dashboard.
//!
//! This module contains the normalized records read from the workbook,
//! the derived classifications, and the query results handed to the
//! report generator.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;

/// Which prospect sheet a record came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum PartnerType {
    /// Corporate partnerships (the `Sponsorships` sheet)
    Sponsorship,
    /// Public funding (the `Public Investment` sheet)
    #[serde(rename = "Public Investment")]
    PublicInvestment,
}

impl fmt::Display for PartnerType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PartnerType::Sponsorship => write!(f, "Sponsorship"),
            PartnerType::PublicInvestment => write!(f, "Public Investment"),
        }
    }
}

impl PartnerType {
    /// Both partner types in display order.
    pub const ALL: [PartnerType; 2] = [PartnerType::Sponsorship, PartnerType::PublicInvestment];

    /// Interpret a free-text partner label such as "Sponsor" or "public funds".
    pub fn from_free_text(text: &str) -> Option<Self> {
        let s = text.trim().to_lowercase();
        if s.starts_with("sponsor") {
            Some(PartnerType::Sponsorship)
        } else if s.starts_with("public") {
            Some(PartnerType::PublicInvestment)
        } else {
            None
        }
    }
}

/// Partner-type filter accepted by every pipeline query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PartnerFilter {
    #[default]
    All,
    Sponsorship,
    #[serde(rename = "Public Investment")]
    PublicInvestment,
}

impl PartnerFilter {
    /// Whether a record of the given partner type passes this filter.
    pub fn matches(&self, partner_type: PartnerType) -> bool {
        match self {
            PartnerFilter::All => true,
            PartnerFilter::Sponsorship => partner_type == PartnerType::Sponsorship,
            PartnerFilter::PublicInvestment => partner_type == PartnerType::PublicInvestment,
        }
    }
}

impl From<PartnerType> for PartnerFilter {
    fn from(partner_type: PartnerType) -> Self {
        match partner_type {
            PartnerType::Sponsorship => PartnerFilter::Sponsorship,
            PartnerType::PublicInvestment => PartnerFilter::PublicInvestment,
        }
    }
}

impl fmt::Display for PartnerFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PartnerFilter::All => write!(f, "All"),
            PartnerFilter::Sponsorship => write!(f, "Sponsorship"),
            PartnerFilter::PublicInvestment => write!(f, "Public Investment"),
        }
    }
}

/// Derived pipeline stage. Exactly one per prospect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StageBucket {
    Lead,
    #[serde(rename = "Under 50%")]
    Under50,
    #[serde(rename = "50-75%")]
    From50To75,
    #[serde(rename = "Over 75%")]
    Over75,
    Contracted,
    Dead,
}

impl fmt::Display for StageBucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

impl StageBucket {
    /// Stages shown on the pipeline board, in funnel order. `Dead` is never rolled up.
    pub const ACTIVE: [StageBucket; 5] = [
        StageBucket::Lead,
        StageBucket::Under50,
        StageBucket::From50To75,
        StageBucket::Over75,
        StageBucket::Contracted,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            StageBucket::Lead => "Lead",
            StageBucket::Under50 => "Under 50%",
            StageBucket::From50To75 => "50-75%",
            StageBucket::Over75 => "Over 75%",
            StageBucket::Contracted => "Contracted",
            StageBucket::Dead => "Dead",
        }
    }
}

/// Recency bucket for the activity heat map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WeekBucket {
    #[serde(rename = "This Week")]
    ThisWeek,
    #[serde(rename = "Last Week")]
    LastWeek,
    #[serde(rename = "Two Weeks Ago")]
    TwoWeeksAgo,
}

impl WeekBucket {
    /// Heat-map columns, most recent first.
    pub const ALL: [WeekBucket; 3] = [
        WeekBucket::ThisWeek,
        WeekBucket::LastWeek,
        WeekBucket::TwoWeeksAgo,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            WeekBucket::ThisWeek => "This Week",
            WeekBucket::LastWeek => "Last Week",
            WeekBucket::TwoWeeksAgo => "Two Weeks Ago",
        }
    }

    /// Column index in [`HeatMapRow::counts`].
    pub fn index(&self) -> usize {
        match self {
            WeekBucket::ThisWeek => 0,
            WeekBucket::LastWeek => 1,
            WeekBucket::TwoWeeksAgo => 2,
        }
    }
}

/// Outcome of resolving an activity's partner type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PartnerResolution {
    Resolved(PartnerType),
    Unknown,
}

impl PartnerResolution {
    /// Heat-map rows in display order.
    pub const ALL: [PartnerResolution; 3] = [
        PartnerResolution::Resolved(PartnerType::Sponsorship),
        PartnerResolution::Resolved(PartnerType::PublicInvestment),
        PartnerResolution::Unknown,
    ];
}

impl fmt::Display for PartnerResolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PartnerResolution::Resolved(partner_type) => write!(f, "{}", partner_type),
            PartnerResolution::Unknown => write!(f, "Unknown"),
        }
    }
}

impl Serialize for PartnerResolution {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Boolean stage-flag columns as read from a prospect row.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StageFlags {
    pub lead: bool,
    pub prospect: bool,
    pub under_50: bool,
    pub from_50_to_75: bool,
    pub over_75: bool,
    pub contracted: bool,
    pub dead: bool,
}

/// A normalized prospect from either prospect sheet.
///
/// Numeric fields are `None` when the cell held something unparseable;
/// blank cells read as zero.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Prospect {
    /// 1-indexed source row within its sheet.
    pub row: usize,
    pub prospect_id: String,
    pub account: String,
    pub owner: String,
    pub partner_type: PartnerType,
    pub projected_revenue: Option<f64>,
    pub contracted_revenue: Option<f64>,
    /// Probability on the 0-100 scale.
    pub probability: Option<f64>,
    pub expected_value: Option<f64>,
    pub term_years: Option<f64>,
    pub flags: StageFlags,
}

impl Prospect {
    /// A blank prospect of the given partner type, for building records field by field.
    pub fn empty(partner_type: PartnerType) -> Self {
        Self {
            row: 0,
            prospect_id: String::new(),
            account: String::new(),
            owner: String::new(),
            partner_type,
            projected_revenue: Some(0.0),
            contracted_revenue: Some(0.0),
            probability: None,
            expected_value: Some(0.0),
            term_years: None,
            flags: StageFlags::default(),
        }
    }

    /// The derived stage bucket.
    pub fn stage(&self) -> StageBucket {
        crate::pipeline::stage_of(self)
    }
}

/// A normalized row of the `Contact Detail` sheet.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Activity {
    /// 1-indexed source row.
    pub row: usize,
    /// Prospect account name, joined to prospects by name.
    pub account: String,
    /// Free-text partner label from the sheet, used when the join fails.
    pub partner_text: String,
    pub contact_date: Option<NaiveDate>,
    pub follow_up_date: Option<NaiveDate>,
    pub contact_type: String,
    pub contact_owner: String,
    pub contact_name: String,
    pub outcome: String,
    pub next_step: String,
}

impl Activity {
    /// A blank activity, for building records field by field.
    pub fn empty() -> Self {
        Self {
            row: 0,
            account: String::new(),
            partner_text: String::new(),
            contact_date: None,
            follow_up_date: None,
            contact_type: String::new(),
            contact_owner: String::new(),
            contact_name: String::new(),
            outcome: String::new(),
            next_step: String::new(),
        }
    }
}

/// One deal on the pipeline board.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StageDeal {
    pub account: String,
    pub owner: String,
    pub projected_revenue: Option<f64>,
    pub contracted_revenue: Option<f64>,
    pub expected_value: Option<f64>,
}

/// All deals in one stage, highest expected value first.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StageGroup {
    pub stage: StageBucket,
    pub deals: Vec<StageDeal>,
}

/// A row of the top-deals leaderboard.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TopDeal {
    pub account: String,
    pub owner: String,
    pub stage: StageBucket,
    pub expected_value: f64,
    pub projected_revenue: Option<f64>,
    pub probability: Option<f64>,
}

/// Expected value and deal count for one partner type within a stage.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PartnerStageTotal {
    pub partner_type: PartnerType,
    pub expected_total: f64,
    pub deal_count: usize,
}

/// Roll-up of one stage for the totals table and bar chart.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StageTotal {
    pub stage: StageBucket,
    pub expected_total: f64,
    pub projected_total: f64,
    pub contracted_total: f64,
    pub deal_count: usize,
    pub by_partner: Vec<PartnerStageTotal>,
}

/// Snapshot KPIs.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Kpis {
    pub total_expected_value: f64,
    pub total_projected_revenue: f64,
    pub total_contracted_revenue: f64,
    pub active_prospects: usize,
}

/// One partner-type row of the heat map.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HeatMapRow {
    pub partner: PartnerResolution,
    /// Counts indexed by [`WeekBucket::index`].
    pub counts: [usize; 3],
}

/// Activity counts by partner type and recency.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HeatMap {
    pub rows: Vec<HeatMapRow>,
}

impl HeatMap {
    /// Number of activities counted across all cells.
    pub fn total(&self) -> usize {
        self.rows.iter().flat_map(|r| r.counts.iter()).sum()
    }

    pub fn count(&self, partner: PartnerResolution, bucket: WeekBucket) -> usize {
        self.rows
            .iter()
            .find(|r| r.partner == partner)
            .map(|r| r.counts[bucket.index()])
            .unwrap_or(0)
    }
}

/// A row of the recent-activity feed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecentActivity {
    pub account: String,
    pub partner: PartnerResolution,
    pub contact_date: NaiveDate,
    pub follow_up_date: Option<NaiveDate>,
    pub contact_type: String,
    pub contact_owner: String,
    pub contact_name: String,
    pub outcome: String,
    pub next_step: String,
}

/// The `Data_Dictionary` sheet passed through as text.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DataDictionary {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

/// Views built from the prospect sheets.
#[derive(Debug, Clone, Serialize)]
pub struct PipelineViews {
    pub kpis: Kpis,
    pub top_sponsorship: Vec<TopDeal>,
    pub top_public_investment: Vec<TopDeal>,
    pub board: Vec<StageGroup>,
    pub totals: Vec<StageTotal>,
}

/// Views built from the contact log.
#[derive(Debug, Clone, Serialize)]
pub struct ActivityViews {
    pub heat_map: HeatMap,
    pub recent: Vec<RecentActivity>,
}

/// Metadata about one dashboard render.
#[derive(Debug, Clone, Serialize)]
pub struct DashboardMetadata {
    pub workbook: String,
    pub generated_at: DateTime<Utc>,
    /// "Today" used for week bucketing.
    pub reference_date: NaiveDate,
    pub partner_filter: PartnerFilter,
    /// Owners the prospects were narrowed to, empty when unfiltered.
    pub owners: Vec<String>,
    pub prospect_count: usize,
    pub activity_count: usize,
}

/// Everything the dashboard renders, plus what could not be rendered.
#[derive(Debug, Clone, Serialize)]
pub struct Dashboard {
    pub metadata: DashboardMetadata,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pipeline: Option<PipelineViews>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub activity: Option<ActivityViews>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_dictionary: Option<DataDictionary>,
    /// Views that could not be built, with the reason.
    pub unavailable: Vec<String>,
    /// Data-quality warnings raised while loading.
    pub warnings: Vec<String>,
}

impl Dashboard {
    /// Whether anything was degraded during this render.
    pub fn is_degraded(&self) -> bool {
        !self.unavailable.is_empty() || !self.warnings.is_empty()
    }
}
