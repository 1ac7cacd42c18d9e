//! Stage bucket classification.
//!
//! Source rows carry a mix of stage flags, a probability, and revenue
//! figures, and which of them is trustworthy varies row to row. The stage
//! is decided by an ordered rule table: the first rule that returns a
//! bucket wins, and a prospect no rule claims is a `Lead`.

use crate::models::{Prospect, StageBucket};

/// A single row of the classification table.
pub struct StageRule {
    /// Short name used in debug output.
    pub name: &'static str,
    pub apply: fn(&Prospect) -> Option<StageBucket>,
}

/// Classification rules in precedence order.
pub const STAGE_RULES: &[StageRule] = &[
    StageRule {
        name: "dead flag",
        apply: dead_flag,
    },
    StageRule {
        name: "contracted flag or revenue",
        apply: contracted,
    },
    StageRule {
        name: "probability",
        apply: by_probability,
    },
    StageRule {
        name: "stage flags",
        apply: by_stage_flags,
    },
];

/// Name used when no rule matched.
pub const DEFAULT_RULE: &str = "default";

/// Derive the stage bucket of a prospect. Never fails.
pub fn stage_of(prospect: &Prospect) -> StageBucket {
    decide(prospect).0
}

/// Derive the stage bucket together with the name of the deciding rule.
pub fn decide(prospect: &Prospect) -> (StageBucket, &'static str) {
    STAGE_RULES
        .iter()
        .find_map(|rule| (rule.apply)(prospect).map(|stage| (stage, rule.name)))
        .unwrap_or((StageBucket::Lead, DEFAULT_RULE))
}

/// Bring a probability onto the 0-100 scale. Values up to 1 are fractions.
pub fn normalize_probability(raw: f64) -> f64 {
    if raw <= 1.0 {
        raw * 100.0
    } else {
        raw
    }
}

fn dead_flag(prospect: &Prospect) -> Option<StageBucket> {
    prospect.flags.dead.then_some(StageBucket::Dead)
}

fn contracted(prospect: &Prospect) -> Option<StageBucket> {
    let has_revenue = prospect.contracted_revenue.is_some_and(|r| r > 0.0);
    (prospect.flags.contracted || has_revenue).then_some(StageBucket::Contracted)
}

fn by_probability(prospect: &Prospect) -> Option<StageBucket> {
    let p = prospect.probability?;
    let stage = if p <= 0.0 {
        StageBucket::Lead
    } else if p < 50.0 {
        StageBucket::Under50
    } else if p < 75.0 {
        StageBucket::From50To75
    } else {
        StageBucket::Over75
    };
    Some(stage)
}

fn by_stage_flags(prospect: &Prospect) -> Option<StageBucket> {
    let flags = &prospect.flags;
    [
        (flags.lead, StageBucket::Lead),
        // "Prospect" rolls up with leads
        (flags.prospect, StageBucket::Lead),
        (flags.under_50, StageBucket::Under50),
        (flags.from_50_to_75, StageBucket::From50To75),
        (flags.over_75, StageBucket::Over75),
        (flags.contracted, StageBucket::Contracted),
    ]
    .into_iter()
    .find_map(|(set, stage)| set.then_some(stage))
}
