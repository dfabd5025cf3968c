//! Sustainability scoring.
//!
//! Additive adjustments on a base of 50, clamped to `0..=100`:
//!
//! | Factor | Adjustment |
//! |--------|-----------|
//! | abundant / moderate / vulnerable / endangered | +30 / +15 / -10 / -30 |
//! | hand-picked / tool-assisted / mechanical | +20 / +10 / -5 |
//! | region mentions a traditional growing region | +10 |

use herbtrace_types::{HarvestMethod, ScoreGrade, Species, SustainabilityStatus};

/// Score before any adjustment.
pub const BASE_SCORE: i32 = 50;

/// Highest possible score.
pub const MAX_SCORE: u8 = 100;

/// Regions recognised for the regional bonus, matched as substrings of the
/// free-text region field.
pub const TRADITIONAL_REGIONS: [&str; 2] = ["Kerala", "Karnataka"];

/// Bonus for collecting in a traditional region.
pub const REGIONAL_BONUS: i32 = 10;

/// Adjustment for the species' conservation status.
pub const fn status_adjustment(status: SustainabilityStatus) -> i32 {
    match status {
        SustainabilityStatus::Abundant => 30,
        SustainabilityStatus::Moderate => 15,
        SustainabilityStatus::Vulnerable => -10,
        SustainabilityStatus::Endangered => -30,
    }
}

/// Adjustment for the harvest technique.
pub const fn harvest_adjustment(method: HarvestMethod) -> i32 {
    match method {
        HarvestMethod::HandPicked => 20,
        HarvestMethod::ToolAssisted => 10,
        HarvestMethod::Mechanical => -5,
    }
}

/// Regional bonus for a free-text region.
pub fn region_bonus(region: &str) -> i32 {
    if TRADITIONAL_REGIONS.iter().any(|r| region.contains(r)) {
        REGIONAL_BONUS
    } else {
        0
    }
}

/// Compute the 0-100 sustainability score for a batch.
pub fn compute_sustainability_score(
    species: &Species,
    harvest_method: HarvestMethod,
    region: &str,
) -> u8 {
    let raw = BASE_SCORE
        .saturating_add(status_adjustment(species.sustainability_status))
        .saturating_add(harvest_adjustment(harvest_method))
        .saturating_add(region_bonus(region));
    let clamped = raw.clamp(0, i32::from(MAX_SCORE));
    u8::try_from(clamped).unwrap_or(MAX_SCORE)
}

/// Score together with its consumer-facing grade.
pub fn graded_score(species: &Species, harvest_method: HarvestMethod, region: &str) -> (u8, ScoreGrade) {
    let score = compute_sustainability_score(species, harvest_method, region);
    (score, ScoreGrade::from_score(score))
}
