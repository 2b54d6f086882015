//! Deterministic, human-friendly anchor slugs.
//!
//! ASCII slugification (`slug` crate) is combined with Chinese transliteration
//! (`pinyin` crate) so headings like “基线对齐” become `ji-xian-dui-qi`.

use std::collections::{HashMap, HashSet};

use pinyin::{Pinyin, ToPinyin};
use slug::slugify;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SlugError {
    #[error("slug source text is empty")]
    EmptyInput,
    #[error("failed to derive slug from `{input}`")]
    Unrepresentable { input: String },
}

/// Derive a base slug from the provided human-readable text.
pub fn derive_slug(input: &str) -> Result<String, SlugError> {
    if input.trim().is_empty() {
        return Err(SlugError::EmptyInput);
    }

    let candidate = slugify(transliterate_to_ascii(input));
    if candidate.is_empty() {
        return Err(SlugError::Unrepresentable {
            input: input.to_string(),
        });
    }

    Ok(candidate)
}

/// Hands out unique anchors within a single document.
///
/// Duplicates receive monotonic suffixes in document order (`section`,
/// `section-2`, `section-3`). A suffixed candidate that collides with an id
/// already issued keeps counting, so no two anchors are ever equal.
#[derive(Default, Debug)]
pub struct AnchorSlugger {
    issued: HashSet<String>,
    next_suffix: HashMap<String, usize>,
}

impl AnchorSlugger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn anchor_for(&mut self, heading: &str) -> Result<String, SlugError> {
        let base = derive_slug(heading)?;
        let suffix = self.next_suffix.entry(base.clone()).or_insert(2);

        let mut candidate = base.clone();
        while self.issued.contains(&candidate) {
            candidate = format!("{base}-{suffix}");
            *suffix += 1;
        }

        self.issued.insert(candidate.clone());
        Ok(candidate)
    }
}

fn transliterate_to_ascii(input: &str) -> String {
    let mut output = String::with_capacity(input.len());

    for ch in input.chars() {
        if ch.is_ascii() {
            output.push(ch);
            continue;
        }

        match ch.to_pinyin() {
            Some(py) => append_pinyin(&mut output, py),
            None if ch.is_whitespace() => output.push(' '),
            // slugify decides what to drop
            None => output.push(ch),
        }
    }

    output
}

fn append_pinyin(buffer: &mut String, pinyin: Pinyin) {
    if !buffer.is_empty() && !buffer.ends_with(' ') {
        buffer.push(' ');
    }
    buffer.push_str(pinyin.plain());
}
