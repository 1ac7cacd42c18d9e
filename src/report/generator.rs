//! Markdown and JSON dashboard rendering.
//!
//! This module turns a [`Dashboard`] into the document handed to
//! stakeholders: KPI cards, leaderboards, the stage board, totals,
//! the heat map, and the recent-activity feed.

use crate::models::{
    ActivityViews, Dashboard, DashboardMetadata, DataDictionary, HeatMap, Kpis, PartnerFilter,
    PipelineViews, RecentActivity, StageGroup, StageTotal, TopDeal, WeekBucket,
};
use anyhow::Result;
use num_format::{Locale, ToFormattedString};

/// Generate the complete Markdown dashboard.
pub fn generate_markdown_report(dashboard: &Dashboard) -> String {
    let mut output = String::new();

    // Title
    output.push_str("# Partnership Revenue Pipeline\n\n");

    output.push_str(&generate_metadata_section(&dashboard.metadata));
    output.push_str(&generate_table_of_contents(dashboard));

    if let Some(ref pipeline) = dashboard.pipeline {
        output.push_str(&generate_pipeline_sections(
            pipeline,
            dashboard.metadata.partner_filter,
        ));
    }

    if let Some(ref activity) = dashboard.activity {
        output.push_str(&generate_activity_sections(activity));
    }

    if let Some(ref dictionary) = dashboard.data_dictionary {
        output.push_str(&generate_data_dictionary_section(dictionary));
    }

    output.push_str(&generate_problems_section(
        &dashboard.unavailable,
        &dashboard.warnings,
    ));

    output.push_str(&generate_footer());

    output
}

/// Generate a JSON dashboard.
pub fn generate_json_report(dashboard: &Dashboard) -> Result<String> {
    serde_json::to_string_pretty(dashboard).map_err(Into::into)
}

/// Whole-dollar amount with thousands separators, e.g. `$1,234,568`.
pub fn format_currency(value: f64) -> String {
    let rounded = value.round();
    let grouped = (rounded.abs() as u64).to_formatted_string(&Locale::en);

    if rounded < 0.0 {
        format!("-${}", grouped)
    } else {
        format!("${}", grouped)
    }
}

fn currency_or_blank(value: Option<f64>) -> String {
    value.map(format_currency).unwrap_or_else(|| "n/a".to_string())
}

fn percent_or_blank(value: Option<f64>) -> String {
    value
        .map(|p| format!("{:.0}%", p))
        .unwrap_or_else(|| "n/a".to_string())
}

/// Escape text for use inside a Markdown table cell.
fn cell(text: &str) -> String {
    text.replace('|', "\\|").replace('\n', " ")
}

fn anchor(title: &str) -> String {
    title
        .to_lowercase()
        .chars()
        .filter(|c| c.is_alphanumeric() || *c == ' ' || *c == '-')
        .collect::<String>()
        .replace(' ', "-")
}

/// Generate the metadata section.
fn generate_metadata_section(metadata: &DashboardMetadata) -> String {
    let mut section = String::new();

    section.push_str("## Metadata\n\n");
    section.push_str(&format!("- **Workbook:** `{}`\n", metadata.workbook));
    section.push_str(&format!(
        "- **Generated:** {}\n",
        metadata.generated_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    section.push_str(&format!(
        "- **Activity Week Of:** {}\n",
        metadata.reference_date.format("%Y-%m-%d")
    ));
    section.push_str(&format!(
        "- **Partner Type:** {}\n",
        metadata.partner_filter
    ));
    if !metadata.owners.is_empty() {
        section.push_str(&format!("- **Owners:** {}\n", metadata.owners.join(", ")));
    }
    section.push_str(&format!("- **Prospects:** {}\n", metadata.prospect_count));
    section.push_str(&format!(
        "- **Logged Activities:** {}\n",
        metadata.activity_count
    ));
    section.push('\n');

    section
}

/// Generate the table of contents.
fn generate_table_of_contents(dashboard: &Dashboard) -> String {
    let mut titles = vec!["Metadata"];

    if dashboard.pipeline.is_some() {
        titles.extend([
            "Snapshot",
            "Top Deals by Expected Value",
            "Pipeline by Stage",
            "Total Pipeline Value by Stage",
        ]);
    }
    if dashboard.activity.is_some() {
        titles.extend(["Activity Heat Map", "Recent Activity"]);
    }
    if dashboard.data_dictionary.is_some() {
        titles.push("Data Dictionary");
    }
    if !dashboard.unavailable.is_empty() {
        titles.push("Unavailable Views");
    }
    if !dashboard.warnings.is_empty() {
        titles.push("Data Quality Warnings");
    }

    let mut toc = String::new();
    toc.push_str("## Table of Contents\n\n");
    for title in titles {
        toc.push_str(&format!("- [{}](#{})\n", title, anchor(title)));
    }
    toc.push('\n');

    toc
}

fn generate_pipeline_sections(pipeline: &PipelineViews, filter: PartnerFilter) -> String {
    let mut section = String::new();

    section.push_str(&generate_snapshot_section(&pipeline.kpis, filter));
    section.push_str(&generate_top_deals_section(
        &pipeline.top_sponsorship,
        &pipeline.top_public_investment,
    ));
    section.push_str(&generate_board_section(&pipeline.board));
    section.push_str(&generate_totals_section(&pipeline.totals));

    section
}

/// Generate the KPI snapshot.
fn generate_snapshot_section(kpis: &Kpis, filter: PartnerFilter) -> String {
    let mut section = String::new();

    section.push_str("## Snapshot\n\n");
    if filter != PartnerFilter::All {
        section.push_str(&format!("*{} only*\n\n", filter));
    }
    section.push_str(
        "| Total Expected Value | Projected Annual | Contracted Annual | Active Prospects |\n",
    );
    section.push_str("|:---:|:---:|:---:|:---:|\n");
    section.push_str(&format!(
        "| {} | {} | {} | {} |\n\n",
        format_currency(kpis.total_expected_value),
        format_currency(kpis.total_projected_revenue),
        format_currency(kpis.total_contracted_revenue),
        kpis.active_prospects
    ));

    section
}

/// Generate the two top-deals leaderboards.
fn generate_top_deals_section(sponsorship: &[TopDeal], public: &[TopDeal]) -> String {
    let mut section = String::new();

    section.push_str("## Top Deals by Expected Value\n\n");
    for (title, empty, deals) in [
        ("Top Sponsorship Deals", "No Sponsorship deals yet.", sponsorship),
        (
            "Top Public Investment Deals",
            "No Public Investment deals yet.",
            public,
        ),
    ] {
        section.push_str(&format!("### {}\n\n", title));

        if deals.is_empty() {
            section.push_str(&format!("*{}*\n\n", empty));
            continue;
        }

        section.push_str("| Account | Owner | Stage | Expected Value | Projected Annual | Probability |\n");
        section.push_str("|:---|:---|:---|---:|---:|---:|\n");
        for deal in deals {
            section.push_str(&format!(
                "| {} | {} | {} | {} | {} | {} |\n",
                cell(&deal.account),
                cell(&deal.owner),
                deal.stage,
                format_currency(deal.expected_value),
                currency_or_blank(deal.projected_revenue),
                percent_or_blank(deal.probability)
            ));
        }
        section.push('\n');
    }

    section
}

/// Generate the stage board.
fn generate_board_section(board: &[StageGroup]) -> String {
    let mut section = String::new();

    section.push_str("## Pipeline by Stage\n\n");

    if board.iter().all(|g| g.deals.is_empty()) {
        section.push_str("*No active prospects in the pipeline.*\n\n");
        return section;
    }

    for group in board {
        section.push_str(&format!(
            "### {} ({} deals)\n\n",
            group.stage,
            group.deals.len()
        ));

        if group.deals.is_empty() {
            section.push_str("*No deals at this stage.*\n\n");
            continue;
        }

        section.push_str("| Account | Owner | Projected Annual | Contracted Annual | Expected Value |\n");
        section.push_str("|:---|:---|---:|---:|---:|\n");
        for deal in &group.deals {
            section.push_str(&format!(
                "| {} | {} | {} | {} | {} |\n",
                cell(&deal.account),
                cell(&deal.owner),
                currency_or_blank(deal.projected_revenue),
                currency_or_blank(deal.contracted_revenue),
                currency_or_blank(deal.expected_value)
            ));
        }
        section.push('\n');
    }

    section
}

/// Generate the per-stage totals with the partner-type split.
fn generate_totals_section(totals: &[StageTotal]) -> String {
    let mut section = String::new();

    section.push_str("## Total Pipeline Value by Stage\n\n");
    section.push_str("| Stage | Expected Total | Projected Total | Contracted Total | Deals |\n");
    section.push_str("|:---|---:|---:|---:|:---:|\n");
    for total in totals {
        section.push_str(&format!(
            "| {} | {} | {} | {} | {} |\n",
            total.stage,
            format_currency(total.expected_total),
            format_currency(total.projected_total),
            format_currency(total.contracted_total),
            total.deal_count
        ));
    }
    section.push('\n');

    section.push_str("### By Partner Type\n\n");
    section.push_str("| Stage | Type | Expected Total | Deals |\n");
    section.push_str("|:---|:---|---:|:---:|\n");
    for total in totals {
        for split in &total.by_partner {
            section.push_str(&format!(
                "| {} | {} | {} | {} |\n",
                total.stage,
                split.partner_type,
                format_currency(split.expected_total),
                split.deal_count
            ));
        }
    }
    section.push('\n');

    section
}

fn generate_activity_sections(activity: &ActivityViews) -> String {
    let mut section = String::new();
    section.push_str(&generate_heat_map_section(&activity.heat_map));
    section.push_str(&generate_recent_activity_section(&activity.recent));
    section
}

/// Generate the activity heat map table.
fn generate_heat_map_section(heat_map: &HeatMap) -> String {
    let mut section = String::new();

    section.push_str("## Activity Heat Map\n\n");
    section.push_str("| Partner Type |");
    for bucket in WeekBucket::ALL {
        section.push_str(&format!(" {} |", bucket.label()));
    }
    section.push_str(" Total |\n");
    section.push_str("|:---|:---:|:---:|:---:|:---:|\n");

    for row in &heat_map.rows {
        let counts: Vec<usize> = WeekBucket::ALL
            .iter()
            .map(|&bucket| heat_map.count(row.partner, bucket))
            .collect();
        section.push_str(&format!(
            "| {} | {} | {} | {} | {} |\n",
            row.partner,
            counts[0],
            counts[1],
            counts[2],
            counts.iter().sum::<usize>()
        ));
    }

    let column_totals: Vec<usize> = WeekBucket::ALL
        .iter()
        .map(|b| heat_map.rows.iter().map(|r| r.counts[b.index()]).sum())
        .collect();
    section.push_str(&format!(
        "| **Total** | **{}** | **{}** | **{}** | **{}** |\n\n",
        column_totals[0],
        column_totals[1],
        column_totals[2],
        heat_map.total()
    ));

    section
}

/// Generate the recent-activity feed.
fn generate_recent_activity_section(recent: &[RecentActivity]) -> String {
    let mut section = String::new();

    section.push_str("## Recent Activity\n\n");

    if recent.is_empty() {
        section.push_str("*No contact activity logged yet.*\n\n");
        return section;
    }

    section.push_str(
        "| Date | Account | Partner Type | Contact Type | Owner | Contact | Outcome | Next Step | Follow-up |\n",
    );
    section.push_str("|:---|:---|:---|:---|:---|:---|:---|:---|:---|\n");
    for row in recent {
        let follow_up = row
            .follow_up_date
            .map(|d| d.format("%Y-%m-%d").to_string())
            .unwrap_or_default();
        section.push_str(&format!(
            "| {} | {} | {} | {} | {} | {} | {} | {} | {} |\n",
            row.contact_date.format("%Y-%m-%d"),
            cell(&row.account),
            row.partner,
            cell(&row.contact_type),
            cell(&row.contact_owner),
            cell(&row.contact_name),
            cell(&row.outcome),
            cell(&row.next_step),
            follow_up
        ));
    }
    section.push('\n');

    section
}

/// Generate the data dictionary section.
fn generate_data_dictionary_section(dictionary: &DataDictionary) -> String {
    let mut section = String::new();

    section.push_str("## Data Dictionary\n\n");

    if dictionary.headers.is_empty() {
        section.push_str("*The Data_Dictionary sheet is empty.*\n\n");
        return section;
    }

    let width = dictionary.headers.len();
    let headers: Vec<String> = dictionary.headers.iter().map(|h| cell(h)).collect();
    section.push_str(&format!("| {} |\n", headers.join(" | ")));
    section.push_str(&format!("|{}\n", ":---|".repeat(width)));

    for row in &dictionary.rows {
        let cells: Vec<String> = (0..width)
            .map(|i| row.get(i).map(|c| cell(c)).unwrap_or_default())
            .collect();
        section.push_str(&format!("| {} |\n", cells.join(" | ")));
    }
    section.push('\n');

    section
}

/// Generate the unavailable-views and warnings sections.
fn generate_problems_section(unavailable: &[String], warnings: &[String]) -> String {
    let mut section = String::new();

    if !unavailable.is_empty() {
        section.push_str("## Unavailable Views\n\n");
        for item in unavailable {
            section.push_str(&format!("- ⛔ {}\n", item));
        }
        section.push('\n');
    }

    if !warnings.is_empty() {
        section.push_str("## Data Quality Warnings\n\n");
        for warning in warnings {
            section.push_str(&format!("- ⚠️ {}\n", warning));
        }
        section.push('\n');
    }

    section
}

/// Generate the report footer.
fn generate_footer() -> String {
    let mut footer = String::new();

    footer.push_str("---\n\n");
    footer.push_str(&format!(
        "*Dashboard generated by pipedash v{}*\n",
        env!("CARGO_PKG_VERSION")
    ));

    footer
}
