//! Compatibility Matcher Module
//!
//! Decides whether a cached search can answer a requested one and scores how
//! specific the cached search is.
//!
//! Exact fields are hard constraints: a cached `instagram` search never answers
//! a `tiktok` request. Range fields are soft: a cached search over a wider
//! numeric range contains every result of a narrower request.

use serde::Serialize;

use crate::cache::{FieldKind, FilterField, FilterSet};

/// Score returned for field-for-field identical filter sets.
pub const IDENTICAL_SCORE: u32 = u32::MAX;

const EXACT_EQUAL: u32 = 10;
const EXACT_CANDIDATE_ONLY: u32 = 5;
const RANGE_BOTH_SET: u32 = 3;
const RANGE_REQUESTED_ONLY: u32 = 2;
const RANGE_CANDIDATE_ONLY: u32 = 1;

// == Match Result ==
/// Outcome of evaluating one candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MatchResult {
    pub is_compatible: bool,
    pub score: u32,
}

impl MatchResult {
    const INCOMPATIBLE: MatchResult = MatchResult {
        is_compatible: false,
        score: 0,
    };

    fn compatible(score: u32) -> Self {
        Self {
            is_compatible: true,
            score,
        }
    }
}

// == Evaluate ==
/// Evaluates a cached `candidate` filter set against a `requested` one.
///
/// Exact fields are checked first and any mismatch short-circuits with
/// `{ is_compatible: false, score: 0 }`. Range fields then require the cached
/// bound to be equal or looser than the requested one.
///
/// A requested field left unset while the candidate sets it is still treated
/// as compatible (+5 exact, +1 range), even though the candidate may hold a
/// narrower result set than an unconstrained request would produce.
pub fn evaluate(requested: &FilterSet, candidate: &FilterSet) -> MatchResult {
    if requested == candidate {
        return MatchResult::compatible(IDENTICAL_SCORE);
    }

    let mut score = 0u32;

    for field in FilterField::of_kind(FieldKind::Exact) {
        match (requested.get(field), candidate.get(field)) {
            (Some(want), Some(have)) if want == have => score += EXACT_EQUAL,
            (Some(_), Some(_)) | (Some(_), None) => return MatchResult::INCOMPATIBLE,
            (None, Some(_)) => score += EXACT_CANDIDATE_ONLY,
            (None, None) => {}
        }
    }

    for kind in [FieldKind::RangeMin, FieldKind::RangeMax] {
        for field in FilterField::of_kind(kind) {
            let want = requested.get(field).map(|v| v.as_number());
            let have = candidate.get(field).map(|v| v.as_number());

            match (want, have) {
                (Some(Some(want)), Some(Some(have))) => {
                    if !covers(kind, want, have) {
                        return MatchResult::INCOMPATIBLE;
                    }
                    score += RANGE_BOTH_SET;
                }
                (Some(Some(_)), None) => score += RANGE_REQUESTED_ONLY,
                (None, Some(Some(_))) => score += RANGE_CANDIDATE_ONLY,
                (None, None) => {}
                // Text in a range field cannot be compared
                _ => return MatchResult::INCOMPATIBLE,
            }
        }
    }

    MatchResult::compatible(score)
}

/// Whether a cached bound is equal to or looser than the requested bound.
fn covers(kind: FieldKind, requested: f64, cached: f64) -> bool {
    match kind {
        FieldKind::RangeMin => cached <= requested,
        FieldKind::RangeMax => cached >= requested,
        FieldKind::Exact => false,
    }
}
