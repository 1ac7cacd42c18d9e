//! Pipeline aggregation.
//!
//! Every query is a pure function of an immutable [`PipelineContext`], so
//! the same loaded workbook can back any number of views and tests can build
//! a context by hand without touching a file.

use crate::models::{
    Activity, Kpis, PartnerFilter, PartnerStageTotal, PartnerType, Prospect, StageBucket,
    StageDeal, StageGroup, StageTotal, TopDeal,
};
use std::cmp::Ordering;

/// The normalized workbook contents that all queries read from.
#[derive(Debug, Clone, Default)]
pub struct PipelineContext {
    pub prospects: Vec<Prospect>,
    pub activities: Vec<Activity>,
}

impl PipelineContext {
    pub fn new(prospects: Vec<Prospect>, activities: Vec<Activity>) -> Self {
        Self {
            prospects,
            activities,
        }
    }

    /// A copy holding only prospects owned by one of `owners`.
    ///
    /// Owner names compare case-insensitively. An empty list keeps everything.
    /// Activities are carried over untouched.
    pub fn restrict_to_owners(&self, owners: &[String]) -> Self {
        if owners.is_empty() {
            return self.clone();
        }
        let wanted: Vec<String> = owners.iter().map(|o| o.trim().to_lowercase()).collect();
        Self {
            prospects: self
                .prospects
                .iter()
                .filter(|p| wanted.contains(&p.owner.trim().to_lowercase()))
                .cloned()
                .collect(),
            activities: self.activities.clone(),
        }
    }

    /// Prospects passing the partner filter, paired with their stage.
    fn staged(
        &self,
        filter: PartnerFilter,
    ) -> impl Iterator<Item = (&Prospect, StageBucket)> + '_ {
        self.prospects
            .iter()
            .filter(move |p| filter.matches(p.partner_type))
            .map(|p| (p, p.stage()))
    }
}

/// Highest value first with unparseable values last, then account name ascending.
fn by_value_then_account(
    a_value: Option<f64>,
    a_account: &str,
    b_value: Option<f64>,
    b_account: &str,
) -> Ordering {
    let by_value = match (a_value, b_value) {
        (Some(a), Some(b)) => b.total_cmp(&a),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    };
    by_value.then_with(|| a_account.cmp(b_account))
}

/// Deals grouped by stage, one group per active stage in funnel order.
pub fn pipeline_by_stage(ctx: &PipelineContext, filter: PartnerFilter) -> Vec<StageGroup> {
    StageBucket::ACTIVE
        .iter()
        .map(|&stage| {
            let mut deals: Vec<StageDeal> = ctx
                .staged(filter)
                .filter(|(_, s)| *s == stage)
                .map(|(p, _)| StageDeal {
                    account: p.account.clone(),
                    owner: p.owner.clone(),
                    projected_revenue: p.projected_revenue,
                    contracted_revenue: p.contracted_revenue,
                    expected_value: p.expected_value,
                })
                .collect();

            deals.sort_by(|a, b| {
                by_value_then_account(a.expected_value, &a.account, b.expected_value, &b.account)
            });

            StageGroup { stage, deals }
        })
        .collect()
}

/// The `n` most valuable deals of one partner type.
///
/// Deals whose expected value could not be read are left out.
pub fn top_deals(ctx: &PipelineContext, partner_type: PartnerType, n: usize) -> Vec<TopDeal> {
    let mut deals: Vec<TopDeal> = ctx
        .staged(partner_type.into())
        .filter_map(|(p, stage)| {
            p.expected_value.map(|expected_value| TopDeal {
                account: p.account.clone(),
                owner: p.owner.clone(),
                stage,
                expected_value,
                projected_revenue: p.projected_revenue,
                probability: p.probability,
            })
        })
        .collect();

    deals.sort_by(|a, b| {
        by_value_then_account(
            Some(a.expected_value),
            &a.account,
            Some(b.expected_value),
            &b.account,
        )
    });
    deals.truncate(n);
    deals
}

/// Value and deal count per active stage, split by partner type.
pub fn pipeline_value_by_stage(ctx: &PipelineContext, filter: PartnerFilter) -> Vec<StageTotal> {
    StageBucket::ACTIVE
        .iter()
        .map(|&stage| {
            let in_stage: Vec<&Prospect> = ctx
                .staged(filter)
                .filter(|(_, s)| *s == stage)
                .map(|(p, _)| p)
                .collect();

            let by_partner = PartnerType::ALL
                .iter()
                .filter(|pt| filter.matches(**pt))
                .map(|&partner_type| {
                    let deals: Vec<&&Prospect> = in_stage
                        .iter()
                        .filter(|p| p.partner_type == partner_type)
                        .collect();
                    PartnerStageTotal {
                        partner_type,
                        expected_total: deals.iter().filter_map(|p| p.expected_value).sum(),
                        deal_count: deals.len(),
                    }
                })
                .collect();

            StageTotal {
                stage,
                expected_total: in_stage.iter().filter_map(|p| p.expected_value).sum(),
                projected_total: in_stage.iter().filter_map(|p| p.projected_revenue).sum(),
                contracted_total: in_stage.iter().filter_map(|p| p.contracted_revenue).sum(),
                deal_count: in_stage.len(),
                by_partner,
            }
        })
        .collect()
}

/// Snapshot KPIs for the filtered prospect set.
pub fn kpis(ctx: &PipelineContext, filter: PartnerFilter) -> Kpis {
    ctx.staged(filter).fold(Kpis::default(), |mut acc, (p, stage)| {
        acc.total_expected_value += p.expected_value.unwrap_or(0.0);
        acc.total_projected_revenue += p.projected_revenue.unwrap_or(0.0);
        acc.total_contracted_revenue += p.contracted_revenue.unwrap_or(0.0);
        if stage != StageBucket::Dead {
            acc.active_prospects += 1;
        }
        acc
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn prospect(
        account: &str,
        partner_type: PartnerType,
        probability: f64,
        expected_value: f64,
    ) -> Prospect {
        Prospect {
            account: account.to_string(),
            owner: "Dana".to_string(),
            projected_revenue: Some(expected_value * 2.0),
            probability: Some(probability),
            expected_value: Some(expected_value),
            ..Prospect::empty(partner_type)
        }
    }

    fn dead(account: &str, partner_type: PartnerType, expected_value: f64) -> Prospect {
        let mut p = prospect(account, partner_type, 60.0, expected_value);
        p.flags.dead = true;
        p
    }

    fn sample_context() -> PipelineContext {
        use PartnerType::*;
        let mut contracted = prospect("Umbrella", Sponsorship, 90.0, 500.0);
        contracted.contracted_revenue = Some(1_000.0);

        PipelineContext::new(
            vec![
                prospect("Acme", Sponsorship, 60.0, 300.0),
                prospect("Globex", Sponsorship, 55.0, 300.0),
                prospect("Initech", Sponsorship, 20.0, 100.0),
                prospect("Hooli", Sponsorship, 0.0, 0.0),
                contracted,
                dead("Zombie Co", Sponsorship, 10_000.0),
                prospect("City Fund", PublicInvestment, 80.0, 800.0),
                prospect("State Grant", PublicInvestment, 65.0, 200.0),
                dead("Old Levy", PublicInvestment, 50.0),
            ],
            Vec::new(),
        )
    }

    fn group<'a>(groups: &'a [StageGroup], stage: StageBucket) -> &'a StageGroup {
        groups.iter().find(|g| g.stage == stage).unwrap()
    }

    #[test]
    fn test_pipeline_by_stage_orders_and_excludes_dead() {
        let ctx = sample_context();
        let groups = pipeline_by_stage(&ctx, PartnerFilter::All);

        let stages: Vec<_> = groups.iter().map(|g| g.stage).collect();
        assert_eq!(stages, StageBucket::ACTIVE.to_vec());

        let mid = group(&groups, StageBucket::From50To75);
        let accounts: Vec<_> = mid.deals.iter().map(|d| d.account.as_str()).collect();
        assert_eq!(accounts, vec!["Acme", "Globex", "State Grant"]);

        let all_accounts: Vec<_> = groups
            .iter()
            .flat_map(|g| g.deals.iter().map(|d| d.account.as_str()))
            .collect();
        assert!(!all_accounts.contains(&"Zombie Co"));
        assert!(!all_accounts.contains(&"Old Levy"));
        assert_eq!(all_accounts.len(), 7);
    }

    #[test]
    fn test_pipeline_by_stage_filter_and_unvalued_last() {
        let mut ctx = sample_context();
        let mut unvalued = prospect("Aardvark", PartnerType::Sponsorship, 20.0, 0.0);
        unvalued.expected_value = None;
        ctx.prospects.push(unvalued);

        let groups = pipeline_by_stage(&ctx, PartnerFilter::Sponsorship);
        let under = group(&groups, StageBucket::Under50);
        let accounts: Vec<_> = under.deals.iter().map(|d| d.account.as_str()).collect();
        assert_eq!(accounts, vec!["Initech", "Aardvark"]);

        let over = group(&groups, StageBucket::Over75);
        assert!(over.deals.is_empty());
    }

    #[test]
    fn test_top_deals_tie_break_and_limit() {
        let ctx = sample_context();
        let top = top_deals(&ctx, PartnerType::Sponsorship, 3);

        assert_eq!(top.len(), 3);
        assert_eq!(top[0].account, "Zombie Co");
        assert_eq!(top[0].stage, StageBucket::Dead);
        assert_eq!(top[1].account, "Umbrella");
        // Acme and Globex tie on 300; name decides
        assert_eq!(top[2].account, "Acme");
        assert!(top.windows(2).all(|w| w[0].expected_value >= w[1].expected_value));
    }

    #[test]
    fn test_top_deals_fewer_than_n() {
        let ctx = sample_context();
        let top = top_deals(&ctx, PartnerType::PublicInvestment, 10);
        let accounts: Vec<_> = top.iter().map(|d| d.account.as_str()).collect();
        assert_eq!(accounts, vec!["City Fund", "State Grant", "Old Levy"]);

        assert!(top_deals(&PipelineContext::default(), PartnerType::Sponsorship, 3).is_empty());
    }

    #[test]
    fn test_top_deals_skips_unparseable_value() {
        let mut ctx = sample_context();
        ctx.prospects.iter_mut().for_each(|p| {
            if p.account == "City Fund" {
                p.expected_value = None;
            }
        });
        let top = top_deals(&ctx, PartnerType::PublicInvestment, 3);
        assert!(top.iter().all(|d| d.account != "City Fund"));
    }

    #[test]
    fn test_pipeline_value_by_stage_partner_split_sums() {
        let ctx = sample_context();
        let totals = pipeline_value_by_stage(&ctx, PartnerFilter::All);
        assert_eq!(totals.len(), 5);

        for total in &totals {
            let split: usize = total.by_partner.iter().map(|p| p.deal_count).sum();
            assert_eq!(split, total.deal_count);

            let spons = pipeline_value_by_stage(&ctx, PartnerFilter::Sponsorship);
            let public = pipeline_value_by_stage(&ctx, PartnerFilter::PublicInvestment);
            let s = spons.iter().find(|t| t.stage == total.stage).unwrap();
            let p = public.iter().find(|t| t.stage == total.stage).unwrap();
            assert_eq!(total.deal_count, s.deal_count + p.deal_count);
        }

        let mid = totals
            .iter()
            .find(|t| t.stage == StageBucket::From50To75)
            .unwrap();
        assert_eq!(mid.deal_count, 3);
        assert_eq!(mid.expected_total, 800.0);
        assert_eq!(mid.by_partner[0].partner_type, PartnerType::Sponsorship);
        assert_eq!(mid.by_partner[0].expected_total, 600.0);
        assert_eq!(mid.by_partner[1].expected_total, 200.0);

        let all_count: usize = totals.iter().map(|t| t.deal_count).sum();
        assert_eq!(all_count, 7);
    }

    #[test]
    fn test_pipeline_value_by_stage_filtered_split() {
        let ctx = sample_context();
        let totals = pipeline_value_by_stage(&ctx, PartnerFilter::PublicInvestment);
        for total in &totals {
            assert_eq!(total.by_partner.len(), 1);
            assert_eq!(total.by_partner[0].partner_type, PartnerType::PublicInvestment);
        }
        let contracted = totals
            .iter()
            .find(|t| t.stage == StageBucket::Contracted)
            .unwrap();
        assert_eq!(contracted.deal_count, 0);
        assert_eq!(contracted.expected_total, 0.0);
    }

    #[test]
    fn test_kpis() {
        let ctx = sample_context();

        let all = kpis(&ctx, PartnerFilter::All);
        assert_eq!(all.active_prospects, 7);
        assert_eq!(all.total_contracted_revenue, 1_000.0);
        assert_eq!(
            all.total_expected_value,
            300.0 + 300.0 + 100.0 + 0.0 + 500.0 + 10_000.0 + 800.0 + 200.0 + 50.0
        );

        let public = kpis(&ctx, PartnerFilter::PublicInvestment);
        assert_eq!(public.active_prospects, 2);
        assert_eq!(public.total_projected_revenue, 2.0 * (800.0 + 200.0 + 50.0));
    }

    #[test]
    fn test_restrict_to_owners() {
        let mut ctx = sample_context();
        ctx.prospects[0].owner = "Riley".to_string();

        let narrowed = ctx.restrict_to_owners(&["  riley ".to_string()]);
        assert_eq!(narrowed.prospects.len(), 1);
        assert_eq!(narrowed.prospects[0].account, "Acme");

        let untouched = ctx.restrict_to_owners(&[]);
        assert_eq!(untouched.prospects.len(), ctx.prospects.len());
    }
}
