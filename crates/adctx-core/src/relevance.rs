use crate::record::CandidateResult;

pub const DEFAULT_RELEVANCE_THRESHOLD: f32 = 0.7;

/// Drops candidates scoring below `threshold`. The boundary itself is kept.
pub fn retain_relevant(candidates: Vec<CandidateResult>, threshold: f32) -> Vec<CandidateResult> {
    candidates
        .into_iter()
        .filter(|c| c.score >= threshold)
        .collect()
}
