//! Confidence computation module
//!
//! Implements the deterministic formula that turns a claim's evidence counts
//! into a verification flag and a 0-100 confidence score. Every claim's
//! confidence can be recomputed from `(supporting, conflicting, type)` alone.

use crate::claim::ClaimType;

/// Penalty applied to fact and statistic claims (they must be exact)
pub const FACTUAL_PENALTY: f64 = 15.0;

/// Bonus applied to opinion and interpretation claims (looser standard)
pub const INTERPRETIVE_BONUS: f64 = 10.0;

/// Minimum number of independent supporting sources for verification
pub const MIN_SUPPORTING_SOURCES: usize = 2;

/// Confidence tiers keyed by supporting source count, highest first
const SUPPORT_TIERS: [(usize, f64); 4] = [(5, 100.0), (3, 85.0), (2, 70.0), (1, 50.0)];

/// Base confidence from the number of supporting sources
///
/// `≥5 → 100`, `≥3 → 85`, `≥2 → 70`, `≥1 → 50`, otherwise `0`.
pub fn base_confidence(supporting: usize) -> f64 {
    SUPPORT_TIERS
        .iter()
        .find(|(min, _)| supporting >= *min)
        .map(|(_, score)| *score)
        .unwrap_or(0.0)
}

/// Compute a claim's confidence (0-100)
///
/// Any conflicting source forces zero. Otherwise the tiered base is
/// adjusted by claim type and clamped to `[0, 100]`. A claim with no
/// support stays at zero regardless of type.
///
/// # Examples
///
/// ```
/// use veritas_domain::ClaimType;
/// use veritas_domain::confidence::compute_confidence;
///
/// assert_eq!(compute_confidence(3, 0, ClaimType::Statistic), 70.0);
/// assert_eq!(compute_confidence(3, 1, ClaimType::Statistic), 0.0);
/// ```
pub fn compute_confidence(supporting: usize, conflicting: usize, claim_type: ClaimType) -> f64 {
    if conflicting > 0 {
        return 0.0;
    }

    let base = base_confidence(supporting);
    if base == 0.0 {
        return 0.0;
    }

    let adjusted = match claim_type {
        ClaimType::Fact | ClaimType::Statistic => base - FACTUAL_PENALTY,
        ClaimType::Opinion | ClaimType::Interpretation => base + INTERPRETIVE_BONUS,
        ClaimType::Quote => base,
    };

    adjusted.clamp(0.0, 100.0)
}

/// Whether evidence counts qualify a claim as verified
pub fn is_verified(supporting: usize, conflicting: usize) -> bool {
    supporting >= MIN_SUPPORTING_SOURCES && conflicting == 0
}

/// Fraction of judging sources that support the claim
pub fn agreement(supporting: usize, conflicting: usize) -> f64 {
    let total = supporting + conflicting;
    if total == 0 {
        0.0
    } else {
        supporting as f64 / total as f64
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    fn claim_type() -> impl Strategy<Value = ClaimType> {
        prop_oneof![
            Just(ClaimType::Fact),
            Just(ClaimType::Statistic),
            Just(ClaimType::Quote),
            Just(ClaimType::Opinion),
            Just(ClaimType::Interpretation),
        ]
    }

    proptest! {
        /// Property: confidence is always within [0, 100]
        #[test]
        fn test_confidence_range(s in 0usize..20, c in 0usize..5, t in claim_type()) {
            let confidence = compute_confidence(s, c, t);
            prop_assert!((0.0..=100.0).contains(&confidence));
        }

        /// Property: verified implies two supporters and no conflicts
        #[test]
        fn test_verified_invariant(s in 0usize..20, c in 0usize..5) {
            if is_verified(s, c) {
                prop_assert!(s >= 2);
                prop_assert_eq!(c, 0);
            }
        }

        /// Property: more support never lowers confidence
        #[test]
        fn test_support_monotonic(s in 0usize..20, t in claim_type()) {
            prop_assert!(compute_confidence(s + 1, 0, t) >= compute_confidence(s, 0, t));
        }

        /// Property: recomputation is deterministic
        #[test]
        fn test_deterministic(s in 0usize..20, c in 0usize..5, t in claim_type()) {
            prop_assert_eq!(compute_confidence(s, c, t), compute_confidence(s, c, t));
        }
    }
}
