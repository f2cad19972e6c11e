//! Classify-then-select helpers shared by the responder and the generators.
//!
//! [`KeywordRouter`] maps free text onto a key by ordered substring matching.
//! [`TemplateBank`] holds the candidate strings for each key and picks one
//! uniformly at random.

use rand::Rng;
use rand::seq::IndexedRandom;
use std::collections::HashMap;
use std::hash::Hash;

/// Ordered keyword classification with a fallback.
///
/// Rules are tested in insertion order; the first rule with any keyword
/// contained in the lowercased input wins.
#[derive(Debug, Clone)]
pub struct KeywordRouter<K> {
    rules: Vec<(K, Vec<String>)>,
    fallback: K,
}

impl<K: Clone> KeywordRouter<K> {
    pub fn new(fallback: K) -> Self {
        Self {
            rules: Vec::new(),
            fallback,
        }
    }

    /// Append a rule. Keywords are stored lowercased.
    pub fn rule<I, S>(mut self, key: K, keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let keywords = keywords
            .into_iter()
            .map(|k| k.as_ref().to_lowercase())
            .filter(|k| !k.is_empty())
            .collect();
        self.rules.push((key, keywords));
        self
    }

    /// First matching key, if any rule matches.
    pub fn find(&self, text: &str) -> Option<K> {
        let haystack = text.to_lowercase();
        self.rules
            .iter()
            .find(|(_, keywords)| keywords.iter().any(|k| haystack.contains(k.as_str())))
            .map(|(key, _)| key.clone())
    }

    /// Matching key, or the fallback when nothing matches.
    pub fn classify(&self, text: &str) -> K {
        self.find(text).unwrap_or_else(|| self.fallback.clone())
    }
}

/// Candidate strings per key, with a default for unknown or empty keys.
#[derive(Debug, Clone)]
pub struct TemplateBank<K> {
    templates: HashMap<K, Vec<String>>,
    default: String,
}

impl<K: Eq + Hash> TemplateBank<K> {
    pub fn new(default: impl Into<String>) -> Self {
        Self {
            templates: HashMap::new(),
            default: default.into(),
        }
    }

    /// Register the candidates for a key, replacing any previous set.
    pub fn with<I, S>(mut self, key: K, templates: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.templates
            .insert(key, templates.into_iter().map(Into::into).collect());
        self
    }

    /// Candidates for a key, empty when the key is unknown.
    pub fn candidates(&self, key: &K) -> &[String] {
        self.templates.get(key).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Uniformly random candidate for a key, or the default.
    pub fn select<R: Rng + ?Sized>(&self, key: &K, rng: &mut R) -> &str {
        self.candidates(key)
            .choose(rng)
            .map(String::as_str)
            .unwrap_or(&self.default)
    }
}

/// Fill `{name}` placeholders in a template.
pub fn render(template: &str, vars: &[(&str, &str)]) -> String {
    vars.iter().fold(template.to_string(), |acc, (name, value)| {
        acc.replace(&format!("{{{name}}}"), value)
    })
}
