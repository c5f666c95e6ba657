pub mod knowledge;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;

use crate::errors::KnowledgeBaseError;
use crate::models::Category;

pub use knowledge::{KeywordRule, KnowledgeBase, ResponseBank};

/// Substrings in the visitor's own words that make the contact nudge redundant.
const NUDGE_SUPPRESSORS: [&str; 3] = ["whatsapp", "email", "contact"];

/// Source of the random draws used for reply variety and typing delay.
pub trait Randomness: Send {
    /// Index in `0..len`. `len` is never zero.
    fn pick_index(&mut self, len: usize) -> usize;

    /// Value in `[0, 1)`.
    fn fraction(&mut self) -> f64;
}

pub struct SeededRandomness {
    rng: StdRng,
}

impl SeededRandomness {
    pub fn from_seed(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn from_os() -> Self {
        Self {
            rng: StdRng::from_os_rng(),
        }
    }
}

impl Randomness for SeededRandomness {
    fn pick_index(&mut self, len: usize) -> usize {
        self.rng.random_range(0..len)
    }

    fn fraction(&mut self) -> f64 {
        self.rng.random::<f64>()
    }
}

/// Always takes the first candidate and the shortest delay.
#[derive(Debug, Clone, Copy, Default)]
pub struct FirstPick;

impl Randomness for FirstPick {
    fn pick_index(&mut self, _len: usize) -> usize {
        0
    }

    fn fraction(&mut self) -> f64 {
        0.0
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Selection {
    pub category: Category,
    #[serde(rename = "reply")]
    pub text: String,
}

/// Maps free text to one canned reply using first-match keyword rules.
#[derive(Debug, Clone)]
pub struct ResponseSelector {
    kb: KnowledgeBase,
}

impl ResponseSelector {
    pub fn new(kb: KnowledgeBase) -> Result<Self, KnowledgeBaseError> {
        kb.validate()?;
        Ok(Self { kb })
    }

    pub fn knowledge_base(&self) -> &KnowledgeBase {
        &self.kb
    }

    pub fn nudge(&self) -> &str {
        &self.kb.nudge
    }

    pub fn resolve_category(&self, input: &str) -> Category {
        let normalized = input.to_lowercase();
        self.kb
            .rules
            .iter()
            .find(|rule| rule.matches(&normalized))
            .map(|rule| rule.category)
            .unwrap_or(Category::Default)
    }

    pub fn candidates(&self, category: Category) -> &[String] {
        // validate() guarantees every rule category, including default, has replies
        self.kb
            .responses
            .get(category)
            .filter(|r| !r.is_empty())
            .or_else(|| self.kb.responses.get(Category::Default))
            .unwrap_or_default()
    }

    pub fn select_response(&self, input: &str, rng: &mut dyn Randomness) -> Selection {
        let category = self.resolve_category(input);
        let candidates = self.candidates(category);
        let text = match candidates.len() {
            0 => String::new(),
            len => candidates[rng.pick_index(len).min(len - 1)].clone(),
        };

        tracing::debug!(category = category.as_str(), "selected canned reply");

        Selection { category, text }
    }
}

/// Whether a contact nudge should follow the reply to `input`.
///
/// Looks only at the visitor's words, not at the category the reply resolved
/// to, so "how do I reach you" still gets nudged.
pub fn should_nudge(input: &str) -> bool {
    let normalized = input.to_lowercase();
    !NUDGE_SUPPRESSORS.iter().any(|s| normalized.contains(s))
}
