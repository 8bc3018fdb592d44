//! Keyword-heuristic fallback answerer.
//!
//! Scans retrieved text for currency amounts and rejection language. This
//! path keeps the pipeline serviceable when the remote reasoning call is
//! unavailable; it does not attempt real claim adjudication.

use async_trait::async_trait;
use regex::Regex;

use crate::document::{ClauseRef, Decision, QueryResult};
use crate::error::ReasoningError;
use crate::index::ScoredChunk;

use super::Answerer;

/// Phrases that flip the decision to rejected
const REJECTION_KEYWORDS: &[&str] = &["excluded", "not covered", "rejected", "denied", "invalid"];

/// Amounts outside this range are treated as noise (dates, clause numbers)
const MIN_AMOUNT: f64 = 100.0;
const MAX_AMOUNT: f64 = 10_000_000.0;

/// Maximum clauses cited and snippet length per clause
const MAX_CITED_CLAUSES: usize = 3;
const SNIPPET_CHARS: usize = 200;

pub struct RuleBasedAnswerer {
    amount_re: Regex,
}

impl RuleBasedAnswerer {
    pub fn new() -> Self {
        // Currency prefix optional so bare figures near coverage language
        // still count; the range filter handles false positives.
        let amount_re = Regex::new(r"(?i)(?:rs\.?\s*|₹\s*|inr\s*)?([\d,]+(?:\.\d{2})?)")
            .expect("amount regex is valid");
        Self { amount_re }
    }

    /// Produce a decision from keyword heuristics over the retrieved text.
    pub fn respond(&self, _query: &str, context: &[ScoredChunk]) -> QueryResult {
        if context.is_empty() {
            return QueryResult::no_match();
        }

        let amount = self.max_amount(context);
        let rejected = context.iter().any(|hit| {
            let lower = hit.chunk.text.to_lowercase();
            REJECTION_KEYWORDS.iter().any(|kw| lower.contains(kw))
        });

        let decision = if rejected {
            Decision::Rejected
        } else {
            Decision::Approved
        };

        let clause_mapping: Vec<ClauseRef> = context
            .iter()
            .take(MAX_CITED_CLAUSES)
            .map(|hit| ClauseRef::from_chunk(&hit.chunk, SNIPPET_CHARS))
            .collect();

        let mut justification = format!(
            "Decision based on analysis of {} relevant clauses from the policy document. ",
            context.len()
        );
        match (decision, amount) {
            (Decision::Approved, Some(amount)) => {
                justification.push_str(&format!("Claim approved for amount ₹{:.2}.", amount));
            }
            (Decision::Rejected, _) => {
                justification
                    .push_str("Claim rejected based on policy exclusions or limitations.");
            }
            _ => {
                justification
                    .push_str("Policy terms analyzed but no specific amount determined.");
            }
        }

        QueryResult {
            decision,
            amount: if decision == Decision::Approved {
                amount
            } else {
                None
            },
            justification,
            clause_mapping,
        }
    }

    /// Largest plausible currency amount mentioned in the retrieved text.
    fn max_amount(&self, context: &[ScoredChunk]) -> Option<f64> {
        context
            .iter()
            .flat_map(|hit| self.amount_re.captures_iter(&hit.chunk.text))
            .filter_map(|caps| caps.get(1))
            .filter_map(|m| m.as_str().replace(',', "").parse::<f64>().ok())
            .filter(|amount| (MIN_AMOUNT..=MAX_AMOUNT).contains(amount))
            .fold(None, |best: Option<f64>, amount| {
                Some(best.map_or(amount, |b| b.max(amount)))
            })
    }
}

impl Default for RuleBasedAnswerer {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Answerer for RuleBasedAnswerer {
    async fn answer(
        &self,
        query: &str,
        context: &[ScoredChunk],
    ) -> Result<QueryResult, ReasoningError> {
        Ok(self.respond(query, context))
    }
}
