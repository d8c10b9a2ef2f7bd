//! Consensus Analyzer module.
//!
//! Pure scoring of how closely a set of provider responses agree. The
//! composite score blends three signals:
//!
//! - keyword overlap of domain terms shared by at least two responses
//! - structural similarity, a per-category Jaccard over extracted terms
//! - lexical similarity, a Jaccard over longer words
//!
//! Responses are sorted by backend id first, so the verdict never depends on
//! the order in which providers answered.

pub mod similarity;
pub mod terms;

use crate::config::ConsensusConfig;
use crate::gateway::ProviderResult;
use crate::provider::strip_confidence;
use serde::{Deserialize, Serialize};
use similarity::{jaccard, lexical_tokens, pairwise_mean};
use std::collections::{BTreeMap, BTreeSet};
use terms::{Category, TermSet};

const KEYWORD_WEIGHT: f64 = 0.4;
const STRUCTURAL_WEIGHT: f64 = 0.3;
const LEXICAL_WEIGHT: f64 = 0.3;

/// Keyword score used when no response mentions any domain term, so terse
/// but correct answers are not penalized.
pub const NEUTRAL_KEYWORD_SCORE: f64 = 0.5;

/// How the final answer of a run was chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Resolution {
    /// Primaries agreed; the first response (by backend id) is the answer.
    Consensus,
    /// Tiebreaker answered after disagreement or a primary shortfall.
    Tiebreaker,
    /// Primaries disagreed and the tiebreaker failed; highest-confidence primary used.
    Fallback,
    /// Primary shortfall and the tiebreaker failed; a lone primary answer used.
    Unverified,
}

impl Resolution {
    pub fn as_str(&self) -> &'static str {
        match self {
            Resolution::Consensus => "consensus",
            Resolution::Tiebreaker => "tiebreaker",
            Resolution::Fallback => "fallback",
            Resolution::Unverified => "unverified",
        }
    }
}

impl std::fmt::Display for Resolution {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Agreement verdict over a set of primary responses.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConsensusVerdict {
    /// Composite agreement score in [0, 1]
    pub score: f64,
    pub keyword_score: f64,
    pub structural_score: f64,
    pub lexical_score: f64,
    pub agreed: bool,
    /// Candidate answer; empty until resolved when not agreed
    pub final_answer: String,
    pub confidence: f64,
    /// Terms present in at least two responses
    pub shared_terms: Vec<String>,
    pub resolution: Resolution,
    pub response_count: usize,
}

impl ConsensusVerdict {
    /// Verdict for a lone primary answer that nothing could corroborate.
    pub fn unverified(answer: impl Into<String>, confidence: f64) -> Self {
        Self {
            score: 0.0,
            keyword_score: 0.0,
            structural_score: 0.0,
            lexical_score: 0.0,
            agreed: false,
            final_answer: answer.into(),
            confidence,
            shared_terms: Vec::new(),
            resolution: Resolution::Unverified,
            response_count: 1,
        }
    }

    /// Substitute the tiebreaker's answer and confidence. Sub-scores are kept
    /// as computed from the primaries.
    pub fn resolved_by_tiebreaker(mut self, answer: impl Into<String>, confidence: f64) -> Self {
        self.final_answer = answer.into();
        self.confidence = confidence;
        self.resolution = Resolution::Tiebreaker;
        self
    }

    /// Substitute the best primary answer after a failed tiebreaker.
    pub fn fallback(mut self, answer: impl Into<String>, confidence: f64) -> Self {
        self.final_answer = answer.into();
        self.confidence = confidence;
        self.resolution = Resolution::Fallback;
        self
    }

    /// Agreement signal the safety gate should weigh.
    ///
    /// A tiebreaker answer is trusted as the backend of last resort, so it
    /// counts as full agreement; its confidence still decides the outcome.
    pub fn decisive_score(&self) -> f64 {
        match self.resolution {
            Resolution::Tiebreaker => 1.0,
            _ => self.score,
        }
    }
}

/// Scores agreement between primary responses.
///
/// # Examples
///
/// ```
/// use verdict::config::ConsensusConfig;
/// use verdict::consensus::ConsensusAnalyzer;
/// use verdict::gateway::ProviderResult;
///
/// let analyzer = ConsensusAnalyzer::new(&ConsensusConfig::default());
/// let text = "Misfire on cylinder 1: replace the spark plug.";
/// let verdict = analyzer.analyze(&[
///     ProviderResult::success("a", text, 100, None),
///     ProviderResult::success("b", text, 120, None),
/// ]);
///
/// assert!(verdict.agreed);
/// assert_eq!(verdict.final_answer, text);
/// ```
#[derive(Debug, Clone)]
pub struct ConsensusAnalyzer {
    agreement_threshold: f64,
    default_confidence: f64,
}

/// One successful response prepared for scoring.
struct Scored<'a> {
    text: &'a str,
    confidence: Option<f64>,
    terms: TermSet,
    tokens: BTreeSet<String>,
}

impl ConsensusAnalyzer {
    pub fn new(config: &ConsensusConfig) -> Self {
        Self {
            agreement_threshold: config.agreement_threshold,
            default_confidence: config.default_confidence,
        }
    }

    pub fn default_confidence(&self) -> f64 {
        self.default_confidence
    }

    /// Analyze the successful results among `responses`; failures are ignored.
    ///
    /// Fewer than two successes can never agree: the structural and lexical
    /// signals need a pair, so both score 0.
    pub fn analyze(&self, responses: &[ProviderResult]) -> ConsensusVerdict {
        let mut ordered: Vec<&ProviderResult> =
            responses.iter().filter(|r| r.is_success()).collect();
        ordered.sort_by(|a, b| {
            a.backend_id
                .cmp(&b.backend_id)
                .then_with(|| a.text().cmp(&b.text()))
                .then_with(|| {
                    let ca = a.confidence().unwrap_or(f64::NAN);
                    let cb = b.confidence().unwrap_or(f64::NAN);
                    ca.total_cmp(&cb)
                })
        });

        let scored: Vec<Scored<'_>> = ordered
            .iter()
            .filter_map(|r| {
                let text = r.text()?;
                let body = strip_confidence(text);
                Some(Scored {
                    text,
                    confidence: r.confidence(),
                    terms: TermSet::extract(&body),
                    tokens: lexical_tokens(&body),
                })
            })
            .collect();

        let (keyword_score, shared_terms) = keyword_overlap(&scored);
        let structural_score =
            pairwise_mean(&scored, |a, b| structural_similarity(&a.terms, &b.terms)).unwrap_or(0.0);
        let lexical_score =
            pairwise_mean(&scored, |a, b| jaccard(&a.tokens, &b.tokens)).unwrap_or(0.0);

        let score = (KEYWORD_WEIGHT * keyword_score
            + STRUCTURAL_WEIGHT * structural_score
            + LEXICAL_WEIGHT * lexical_score)
            .clamp(0.0, 1.0);
        let agreed = scored.len() >= 2 && score >= self.agreement_threshold;

        let confidence = if scored.is_empty() {
            0.0
        } else {
            scored
                .iter()
                .map(|s| s.confidence.unwrap_or(self.default_confidence))
                .sum::<f64>()
                / scored.len() as f64
        };

        let final_answer = match (agreed, scored.first()) {
            (true, Some(first)) => first.text.to_string(),
            _ => String::new(),
        };

        tracing::debug!(
            responses = scored.len(),
            score,
            keyword_score,
            structural_score,
            lexical_score,
            agreed,
            "Consensus analyzed"
        );

        ConsensusVerdict {
            score,
            keyword_score,
            structural_score,
            lexical_score,
            agreed,
            final_answer,
            confidence,
            shared_terms,
            resolution: Resolution::Consensus,
            response_count: scored.len(),
        }
    }
}

/// Keyword score and the list of shared terms.
fn keyword_overlap(scored: &[Scored<'_>]) -> (f64, Vec<String>) {
    let mut appearances: BTreeMap<(Category, &str), usize> = BTreeMap::new();
    for s in scored {
        for term in s.terms.iter() {
            *appearances.entry(term).or_default() += 1;
        }
    }

    if appearances.is_empty() {
        return (NEUTRAL_KEYWORD_SCORE, Vec::new());
    }

    let n = scored.len() as f64;
    let mut shared = BTreeSet::new();
    let mut fraction_sum = 0.0;
    for ((_, term), count) in &appearances {
        if *count >= 2 {
            fraction_sum += *count as f64 / n;
            shared.insert(term.to_string());
        }
    }

    let score = (fraction_sum / appearances.len() as f64).clamp(0.0, 1.0);
    (score, shared.into_iter().collect())
}

/// Mean per-category Jaccard over categories present in at least one side.
fn structural_similarity(a: &TermSet, b: &TermSet) -> f64 {
    let scores: Vec<f64> = Category::ALL
        .iter()
        .filter(|c| !(a.category(**c).is_empty() && b.category(**c).is_empty()))
        .map(|c| jaccard(a.category(*c), b.category(*c)))
        .collect();

    if scores.is_empty() {
        1.0
    } else {
        scores.iter().sum::<f64>() / scores.len() as f64
    }
}
