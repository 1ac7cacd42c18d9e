//! Sheet normalization.
//!
//! Turns the raw prospect and contact sheets into [`Prospect`] and
//! [`Activity`] records. Absent columns and unreadable cells never abort a
//! load: they degrade the affected field and are reported as [`DataIssue`]s.

use super::stage::{decide, normalize_probability};
use crate::error::DataIssue;
use crate::models::{Activity, DataDictionary, PartnerType, Prospect, StageFlags};
use crate::workbook::{RawRow, RawSheet};
use chrono::NaiveDate;
use tracing::{debug, warn};

pub const COL_PROSPECT_ID: &str = "Prospect ID";
pub const COL_ACCOUNT: &str = "Prospect (Account Name)";
pub const COL_OWNER: &str = "Owner";
pub const COL_PROJECTED: &str = "Projected Annual Revenue ($)";
pub const COL_CONTRACTED_REVENUE: &str = "Contracted Annual Revenue ($)";
pub const COL_PROBABILITY: &str = "Probability (%)";
pub const COL_EXPECTED_VALUE: &str = "Expected Value ($)";
pub const COL_TERM: &str = "Term (years)";
pub const COL_LEAD: &str = "Lead";
pub const COL_PROSPECT: &str = "Prospect";
pub const COL_UNDER_50: &str = "Under 50%";
pub const COL_50_TO_75: &str = "50-75%";
pub const COL_OVER_75: &str = "Over 75%";
pub const COL_CONTRACTED: &str = "Contracted";
pub const COL_DEAD: &str = "Dead";

pub const COL_PARTNER_TEXT: &str = "Prospect (Sponsorship/Public)";
pub const COL_CONTACT_DATE: &str = "Contact Date";
pub const COL_FOLLOW_UP_DATE: &str = "Follow-up Date";
pub const COL_CONTACT_TYPE: &str = "Contact Type (email/phone/zoom/in-person)";
pub const COL_CONTACT_OWNER: &str = "Contact Owner";
pub const COL_CONTACT_NAME: &str = "Contact Name";
pub const COL_OUTCOME: &str = "Outcome (left VM/spoke/meeting set/sent deck/etc.)";
pub const COL_NEXT_STEP: &str = "Next Step";

/// Records produced from a sheet along with the problems found in it.
#[derive(Debug, Clone, PartialEq)]
pub struct Normalized<T> {
    pub records: Vec<T>,
    pub issues: Vec<DataIssue>,
}

impl<T> Default for Normalized<T> {
    fn default() -> Self {
        Self {
            records: Vec::new(),
            issues: Vec::new(),
        }
    }
}

impl<T> Normalized<T> {
    fn report(&mut self, issue: DataIssue) {
        warn!("{}", issue);
        self.issues.push(issue);
    }

    /// Resolve a column, reporting it when absent.
    fn column(&mut self, sheet: &RawSheet, header: &str, required: bool) -> Option<usize> {
        let index = sheet.column(header);
        if index.is_none() {
            let sheet = sheet.name.clone();
            let column = header.to_string();
            self.report(if required {
                DataIssue::MissingRequiredColumn { sheet, column }
            } else {
                DataIssue::MissingColumn { sheet, column }
            });
        }
        index
    }

    /// Numeric cell where blank means zero. `None` when unparseable.
    fn amount(
        &mut self,
        sheet: &RawSheet,
        row: &RawRow,
        col: Option<usize>,
        header: &str,
    ) -> Option<f64> {
        match sheet.cell(row, col).number() {
            Ok(value) => Some(value.unwrap_or(0.0)),
            Err(raw) => {
                self.unparseable(sheet, row, header, raw);
                None
            }
        }
    }

    /// Numeric cell where blank means "not given".
    fn optional_number(
        &mut self,
        sheet: &RawSheet,
        row: &RawRow,
        col: Option<usize>,
        header: &str,
    ) -> Option<f64> {
        match sheet.cell(row, col).number() {
            Ok(value) => value,
            Err(raw) => {
                self.unparseable(sheet, row, header, raw);
                None
            }
        }
    }

    fn date(
        &mut self,
        sheet: &RawSheet,
        row: &RawRow,
        col: Option<usize>,
        header: &str,
    ) -> Option<NaiveDate> {
        match sheet.cell(row, col).date() {
            Ok(value) => value,
            Err(raw) => {
                self.unparseable(sheet, row, header, raw);
                None
            }
        }
    }

    fn unparseable(&mut self, sheet: &RawSheet, row: &RawRow, header: &str, value: String) {
        self.report(DataIssue::UnparseableValue {
            sheet: sheet.name.clone(),
            row: row.number,
            column: header.to_string(),
            value,
        });
    }
}

struct ProspectColumns {
    id: Option<usize>,
    account: Option<usize>,
    owner: Option<usize>,
    projected: Option<usize>,
    contracted_revenue: Option<usize>,
    probability: Option<usize>,
    expected_value: Option<usize>,
    term: Option<usize>,
    lead: Option<usize>,
    prospect: Option<usize>,
    under_50: Option<usize>,
    from_50_to_75: Option<usize>,
    over_75: Option<usize>,
    contracted: Option<usize>,
    dead: Option<usize>,
}

/// Union both prospect sheets into one record set, tagged by source sheet.
pub fn normalize_prospects(sponsorships: &RawSheet, public: &RawSheet) -> Normalized<Prospect> {
    let mut out = Normalized::default();
    normalize_prospect_sheet(sponsorships, PartnerType::Sponsorship, &mut out);
    normalize_prospect_sheet(public, PartnerType::PublicInvestment, &mut out);
    out
}

fn normalize_prospect_sheet(
    sheet: &RawSheet,
    partner_type: PartnerType,
    out: &mut Normalized<Prospect>,
) {
    let cols = ProspectColumns {
        id: out.column(sheet, COL_PROSPECT_ID, false),
        account: out.column(sheet, COL_ACCOUNT, true),
        owner: out.column(sheet, COL_OWNER, false),
        projected: out.column(sheet, COL_PROJECTED, false),
        contracted_revenue: out.column(sheet, COL_CONTRACTED_REVENUE, false),
        probability: out.column(sheet, COL_PROBABILITY, false),
        expected_value: out.column(sheet, COL_EXPECTED_VALUE, true),
        term: out.column(sheet, COL_TERM, false),
        lead: out.column(sheet, COL_LEAD, false),
        prospect: out.column(sheet, COL_PROSPECT, false),
        under_50: out.column(sheet, COL_UNDER_50, false),
        from_50_to_75: out.column(sheet, COL_50_TO_75, false),
        over_75: out.column(sheet, COL_OVER_75, false),
        contracted: out.column(sheet, COL_CONTRACTED, false),
        dead: out.column(sheet, COL_DEAD, false),
    };

    let before = out.records.len();

    for row in &sheet.rows {
        let prospect_id = sheet.cell(row, cols.id).text();
        let account = sheet.cell(row, cols.account).text();
        if prospect_id.is_empty() && account.is_empty() {
            debug!("{} row {}: no ID or account name, skipping", sheet.name, row.number);
            continue;
        }

        let flag = |col: Option<usize>| sheet.cell(row, col).is_flag();
        let flags = StageFlags {
            lead: flag(cols.lead),
            prospect: flag(cols.prospect),
            under_50: flag(cols.under_50),
            from_50_to_75: flag(cols.from_50_to_75),
            over_75: flag(cols.over_75),
            contracted: flag(cols.contracted),
            dead: flag(cols.dead),
        };

        // Blank or unreadable probabilities count as zero. Only a sheet without
        // the column leaves it unset and defers to the stage flags.
        let probability = cols.probability.map(|_| {
            normalize_probability(
                out.amount(sheet, row, cols.probability, COL_PROBABILITY)
                    .unwrap_or(0.0),
            )
        });

        let prospect = Prospect {
            row: row.number,
            prospect_id,
            account,
            owner: sheet.cell(row, cols.owner).text(),
            partner_type,
            projected_revenue: out.amount(sheet, row, cols.projected, COL_PROJECTED),
            contracted_revenue: out.amount(
                sheet,
                row,
                cols.contracted_revenue,
                COL_CONTRACTED_REVENUE,
            ),
            probability,
            expected_value: out.amount(sheet, row, cols.expected_value, COL_EXPECTED_VALUE),
            term_years: out.optional_number(sheet, row, cols.term, COL_TERM),
            flags,
        };

        let (stage, rule) = decide(&prospect);
        debug!("{} '{}': {} ({})", sheet.name, prospect.account, stage, rule);

        out.records.push(prospect);
    }

    debug!(
        "Normalized {} {} prospects",
        out.records.len() - before,
        partner_type
    );
}

/// Normalize the contact log.
pub fn normalize_activities(sheet: &RawSheet) -> Normalized<Activity> {
    let mut out = Normalized::default();

    let account_col = out.column(sheet, COL_ACCOUNT, true);
    let partner_col = out.column(sheet, COL_PARTNER_TEXT, false);
    let date_col = out.column(sheet, COL_CONTACT_DATE, true);
    let follow_up_col = out.column(sheet, COL_FOLLOW_UP_DATE, false);
    let type_col = out.column(sheet, COL_CONTACT_TYPE, false);
    let owner_col = out.column(sheet, COL_CONTACT_OWNER, false);
    let name_col = out.column(sheet, COL_CONTACT_NAME, false);
    let outcome_col = out.column(sheet, COL_OUTCOME, false);
    let next_step_col = out.column(sheet, COL_NEXT_STEP, false);

    for row in &sheet.rows {
        let account = sheet.cell(row, account_col).text();
        if account.is_empty() && sheet.cell(row, date_col).is_blank() {
            debug!("{} row {}: no account or date, skipping", sheet.name, row.number);
            continue;
        }

        let activity = Activity {
            row: row.number,
            account,
            partner_text: sheet.cell(row, partner_col).text(),
            contact_date: out.date(sheet, row, date_col, COL_CONTACT_DATE),
            follow_up_date: out.date(sheet, row, follow_up_col, COL_FOLLOW_UP_DATE),
            contact_type: sheet.cell(row, type_col).text(),
            contact_owner: sheet.cell(row, owner_col).text(),
            contact_name: sheet.cell(row, name_col).text(),
            outcome: sheet.cell(row, outcome_col).text(),
            next_step: sheet.cell(row, next_step_col).text(),
        };
        out.records.push(activity);
    }

    debug!("Normalized {} activities", out.records.len());
    out
}

/// Pass the data dictionary through as text.
pub fn read_data_dictionary(sheet: &RawSheet) -> DataDictionary {
    DataDictionary {
        headers: sheet.headers.clone(),
        rows: sheet
            .rows
            .iter()
            .map(|row| row.cells.iter().map(|c| c.text()).collect())
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::StageBucket;
    use crate::workbook::Cell;

    fn text(s: &str) -> Cell {
        Cell::Text(s.to_string())
    }

    fn num(n: f64) -> Cell {
        Cell::Number(n)
    }

    const PROSPECT_HEADERS: &[&str] = &[
        COL_PROSPECT_ID,
        COL_ACCOUNT,
        COL_OWNER,
        COL_PROJECTED,
        COL_CONTRACTED_REVENUE,
        COL_PROBABILITY,
        COL_EXPECTED_VALUE,
        COL_TERM,
        COL_LEAD,
        COL_PROSPECT,
        COL_UNDER_50,
        COL_50_TO_75,
        COL_OVER_75,
        COL_CONTRACTED,
        COL_DEAD,
    ];

    fn prospect_row(id: &str, account: &str, probability: Cell, expected: Cell) -> Vec<Cell> {
        let mut row = vec![
            text(id),
            text(account),
            text("Dana"),
            num(100_000.0),
            Cell::Empty,
            probability,
            expected,
            num(2.0),
        ];
        row.extend(std::iter::repeat(Cell::Empty).take(7));
        row
    }

    #[test]
    fn test_union_tags_partner_type() {
        let spons = RawSheet::new(
            "Sponsorships",
            PROSPECT_HEADERS,
            vec![prospect_row("S-1", "Acme", num(0.6), num(60_000.0))],
        );
        let public = RawSheet::new(
            "Public Investment",
            PROSPECT_HEADERS,
            vec![
                prospect_row("P-1", "City Arts Fund", num(25.0), num(25_000.0)),
                prospect_row("P-2", "County Grant", num(0.9), num(90_000.0)),
            ],
        );

        let result = normalize_prospects(&spons, &public);
        assert!(result.issues.is_empty());
        assert_eq!(result.records.len(), 3);

        assert_eq!(result.records[0].partner_type, PartnerType::Sponsorship);
        assert_eq!(result.records[0].probability, Some(60.0));
        assert_eq!(result.records[0].stage(), StageBucket::From50To75);
        assert_eq!(result.records[0].contracted_revenue, Some(0.0));
        assert_eq!(result.records[0].term_years, Some(2.0));

        assert_eq!(result.records[1].partner_type, PartnerType::PublicInvestment);
        assert_eq!(result.records[1].stage(), StageBucket::Under50);
        assert_eq!(result.records[2].stage(), StageBucket::Over75);
    }

    #[test]
    fn test_missing_columns_degrade_with_warnings() {
        let spons = RawSheet::new(
            "Sponsorships",
            &[COL_PROSPECT_ID, COL_ACCOUNT, COL_DEAD],
            vec![vec![text("S-1"), text("Acme"), text("x")]],
        );
        let public = RawSheet::new(
            "Public Investment",
            &[COL_PROSPECT_ID, COL_EXPECTED_VALUE],
            vec![vec![text("P-1"), num(5.0)]],
        );

        let result = normalize_prospects(&spons, &public);

        assert!(result.issues.contains(&DataIssue::MissingRequiredColumn {
            sheet: "Sponsorships".to_string(),
            column: COL_EXPECTED_VALUE.to_string(),
        }));
        assert!(result.issues.contains(&DataIssue::MissingRequiredColumn {
            sheet: "Public Investment".to_string(),
            column: COL_ACCOUNT.to_string(),
        }));
        assert!(result.issues.contains(&DataIssue::MissingColumn {
            sheet: "Sponsorships".to_string(),
            column: COL_OWNER.to_string(),
        }));

        assert_eq!(result.records.len(), 2);
        let acme = &result.records[0];
        assert_eq!(acme.expected_value, Some(0.0));
        assert_eq!(acme.owner, "");
        assert_eq!(acme.stage(), StageBucket::Dead);

        let unnamed = &result.records[1];
        assert_eq!(unnamed.account, "");
        assert_eq!(unnamed.expected_value, Some(5.0));
    }

    #[test]
    fn test_blank_rows_dropped_and_bad_numbers_reported() {
        let spons = RawSheet::new(
            "Sponsorships",
            PROSPECT_HEADERS,
            vec![
                prospect_row("", "", num(0.5), num(1.0)),
                prospect_row("S-2", "Initech", text("maybe"), text("lots")),
            ],
        );
        let public = RawSheet::new("Public Investment", PROSPECT_HEADERS, Vec::new());

        let result = normalize_prospects(&spons, &public);
        assert_eq!(result.records.len(), 1);

        let initech = &result.records[0];
        assert_eq!(initech.row, 3);
        assert_eq!(initech.probability, Some(0.0));
        assert_eq!(initech.expected_value, None);
        assert_eq!(initech.stage(), StageBucket::Lead);

        assert_eq!(
            result
                .issues
                .iter()
                .filter(|i| matches!(i, DataIssue::UnparseableValue { row: 3, .. }))
                .count(),
            2
        );
    }

    #[test]
    fn test_blank_or_unreadable_probability_is_lead_despite_flags() {
        let over_75 = PROSPECT_HEADERS
            .iter()
            .position(|h| *h == COL_OVER_75)
            .unwrap();
        let mut blank = prospect_row("S-1", "Blank Prob", Cell::Empty, num(10.0));
        blank[over_75] = text("x");
        let mut junk = prospect_row("S-2", "Junk Prob", text("TBD"), num(10.0));
        junk[over_75] = text("x");

        let spons = RawSheet::new("Sponsorships", PROSPECT_HEADERS, vec![blank, junk]);
        let public = RawSheet::new("Public Investment", PROSPECT_HEADERS, Vec::new());

        let result = normalize_prospects(&spons, &public);
        assert_eq!(result.records.len(), 2);
        for prospect in &result.records {
            assert_eq!(prospect.probability, Some(0.0));
            assert_eq!(prospect.stage(), StageBucket::Lead);
        }

        // Only the unreadable cell is reported
        assert_eq!(
            result.issues,
            vec![DataIssue::UnparseableValue {
                sheet: "Sponsorships".to_string(),
                row: 3,
                column: COL_PROBABILITY.to_string(),
                value: "TBD".to_string(),
            }]
        );
    }

    #[test]
    fn test_missing_probability_column_defers_to_flags() {
        let headers = [COL_PROSPECT_ID, COL_ACCOUNT, COL_EXPECTED_VALUE, COL_OVER_75];
        let spons = RawSheet::new(
            "Sponsorships",
            &headers,
            vec![vec![text("S-1"), text("Acme"), num(10.0), text("x")]],
        );
        let public = RawSheet::new("Public Investment", &headers, Vec::new());

        let result = normalize_prospects(&spons, &public);
        assert_eq!(result.records[0].probability, None);
        assert_eq!(result.records[0].stage(), StageBucket::Over75);
    }

    #[test]
    fn test_activities() {
        let sheet = RawSheet::new(
            "Contact Detail",
            &[
                COL_ACCOUNT,
                COL_PARTNER_TEXT,
                COL_CONTACT_DATE,
                COL_FOLLOW_UP_DATE,
                COL_CONTACT_TYPE,
                COL_CONTACT_OWNER,
                COL_CONTACT_NAME,
                COL_OUTCOME,
                COL_NEXT_STEP,
            ],
            vec![
                vec![
                    text("Acme"),
                    text("Sponsor"),
                    text("2025-03-10"),
                    Cell::Empty,
                    text("email"),
                    text("Dana"),
                    text("Pat"),
                    text("sent deck"),
                    text("Follow up"),
                ],
                vec![Cell::Empty, text("Public"), Cell::Empty],
                vec![text("Globex"), Cell::Empty, text("whenever")],
            ],
        );

        let result = normalize_activities(&sheet);
        assert_eq!(result.records.len(), 2);

        let first = &result.records[0];
        assert_eq!(first.contact_date, NaiveDate::from_ymd_opt(2025, 3, 10));
        assert_eq!(first.partner_text, "Sponsor");
        assert_eq!(first.outcome, "sent deck");

        let second = &result.records[1];
        assert_eq!(second.account, "Globex");
        assert_eq!(second.row, 4);
        assert_eq!(second.contact_date, None);
        assert_eq!(
            result.issues,
            vec![DataIssue::UnparseableValue {
                sheet: "Contact Detail".to_string(),
                row: 4,
                column: COL_CONTACT_DATE.to_string(),
                value: "whenever".to_string(),
            }]
        );
    }

    #[test]
    fn test_read_data_dictionary() {
        let sheet = RawSheet::new(
            "Data_Dictionary",
            &["Field", "Definition"],
            vec![vec![text("Expected Value ($)"), text("Projected x Probability")]],
        );
        let dict = read_data_dictionary(&sheet);
        assert_eq!(dict.headers, vec!["Field", "Definition"]);
        assert_eq!(dict.rows[0][1], "Projected x Probability");
    }
}
