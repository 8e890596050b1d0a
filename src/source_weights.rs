//! # Source Trust
//!
//! Configurable mapping from publication names (e.g. "Reuters", "BBC News")
//! to trust weights in `[0.0, 1.0]`, used as the source prior when scoring.
//!
//! - Loaded from the `[sources]` section of the app config.
//! - Case-insensitive lookup with normalization of punctuation, dashes, etc.
//! - Aliases map alternative spellings to canonical names.
//! - Fallback order: aliases → exact match → default.
//! - `default_seed()` carries a small table of wire services and outlets.

use serde::Deserialize;
use std::collections::HashMap;

/// Source trust table, injected into the scorer.
#[derive(Debug, Clone, Deserialize)]
pub struct SourceTrust {
    /// Weight for sources the table does not know.
    #[serde(default = "default_default_weight")]
    pub default_weight: f64,
    /// Explicit weights for canonical source names.
    #[serde(default)]
    pub weights: HashMap<String, f64>,
    /// Aliases mapping non-canonical names → canonical names.
    #[serde(default)]
    pub aliases: HashMap<String, String>,
}

fn default_default_weight() -> f64 {
    0.55
}

impl Default for SourceTrust {
    fn default() -> Self {
        Self::default_seed()
    }
}

impl SourceTrust {
    /// Build a table from explicit pairs; keys are normalized on the way in.
    pub fn from_pairs<'a, I>(default_weight: f64, pairs: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, f64)>,
    {
        Self {
            default_weight,
            weights: pairs
                .into_iter()
                .map(|(k, v)| (normalize(k), v))
                .collect(),
            aliases: HashMap::new(),
        }
        .normalized()
    }

    /// Normalize table keys so config authors can write "The Associated Press".
    pub fn normalized(self) -> Self {
        Self {
            default_weight: self.default_weight,
            weights: self
                .weights
                .into_iter()
                .map(|(k, v)| (normalize(&k), v))
                .collect(),
            aliases: self
                .aliases
                .into_iter()
                .map(|(a, c)| (normalize(&a), normalize(&c)))
                .collect(),
        }
    }

    /// Trust weight for a source name.
    pub fn weight_for(&self, source: &str) -> f64 {
        let s = normalize(source);

        // 1) Alias resolution.
        if let Some(canon) = self.aliases.get(&s) {
            if let Some(&w) = self.weights.get(canon) {
                return clamp01(w);
            }
        }

        // 2) Exact weight match.
        if let Some(&w) = self.weights.get(&s) {
            return clamp01(w);
        }

        // 3) Default.
        clamp01(self.default_weight)
    }

    /// Built-in seed: wire services near the top, reputable outlets just below.
    pub fn default_seed() -> Self {
        let mut weights = HashMap::new();
        let mut aliases = HashMap::new();

        for (k, v) in [
            ("reuters", 0.95),
            ("associated press", 0.93),
            ("afp", 0.90),
            ("bloomberg", 0.90),
            ("bbc news", 0.88),
            ("npr", 0.86),
            ("new york times", 0.85),
            ("the guardian", 0.85),
            ("wall street journal", 0.85),
            ("financial times", 0.85),
            ("washington post", 0.84),
            ("al jazeera", 0.82),
            ("cnn", 0.80),
        ] {
            weights.insert(k.to_string(), v);
        }

        for (a, c) in [
            ("ap", "associated press"),
            ("ap news", "associated press"),
            ("apnews com", "associated press"),
            ("the associated press", "associated press"),
            ("agence france presse", "afp"),
            ("reuters com", "reuters"),
            ("bbc", "bbc news"),
            ("bbc co uk", "bbc news"),
            ("nytimes", "new york times"),
            ("nyt", "new york times"),
            ("the new york times", "new york times"),
            ("guardian", "the guardian"),
            ("wsj", "wall street journal"),
            ("the wall street journal", "wall street journal"),
            ("ft", "financial times"),
            ("the washington post", "washington post"),
            ("aljazeera", "al jazeera"),
            ("cnn lite", "cnn"),
            ("npr text", "npr"),
        ] {
            aliases.insert(a.to_string(), c.to_string());
        }

        Self {
            default_weight: default_default_weight(),
            weights,
            aliases,
        }
    }
}

/// Lowercase, replace punctuation/dashes with spaces, collapse spaces.
fn normalize(s: &str) -> String {
    let mut out = s.trim().to_lowercase();

    for ch in ['—', '–', '-', '_', '/', '\\'] {
        out = out.replace(ch, " ");
    }

    out = out.replace(['\n', '\r', '\t', '.', ',', '‚', '’', '\''], " ");

    out.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn clamp01(x: f64) -> f64 {
    x.clamp(0.0, 1.0)
}
