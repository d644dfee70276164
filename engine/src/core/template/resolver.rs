//! Template Resolver
//!
//! Expands `{token}` templates against a context of named values and turns
//! `#` runs into zero-padded shot numbers.
//!
//! Resolution is pure. The only state, the shot counter, is a plain value
//! passed in and handed back, so two runs never share numbering.

use std::collections::BTreeMap;
use std::sync::OnceLock;

use regex::Regex;

use crate::core::{CoreError, CoreResult};

/// Named values available to a template
pub type TokenContext = BTreeMap<String, String>;

fn token_re() -> &'static Regex {
    static TOKEN_RE: OnceLock<Regex> = OnceLock::new();
    TOKEN_RE.get_or_init(|| Regex::new(r"\{([^{}]+)\}").expect("token regex should compile"))
}

fn hash_run_re() -> &'static Regex {
    static HASH_RUN_RE: OnceLock<Regex> = OnceLock::new();
    HASH_RUN_RE.get_or_init(|| Regex::new(r"#+").expect("hash run regex should compile"))
}

// =============================================================================
// Token Resolution
// =============================================================================

/// Replaces every `{name}` in `template` with `context[name]`.
///
/// Text outside braces is copied verbatim. A token missing from the context
/// fails the whole call with [`CoreError::UnknownToken`].
pub fn resolve(template: &str, context: &TokenContext) -> CoreResult<String> {
    let mut out = String::with_capacity(template.len());
    let mut last = 0;

    for caps in token_re().captures_iter(template) {
        let (Some(whole), Some(name)) = (caps.get(0), caps.get(1)) else {
            continue;
        };
        let value = context
            .get(name.as_str())
            .ok_or_else(|| CoreError::UnknownToken {
                token: name.as_str().to_string(),
                template: template.to_string(),
            })?;

        out.push_str(&template[last..whole.start()]);
        out.push_str(value);
        last = whole.end();
    }

    out.push_str(&template[last..]);
    Ok(out)
}

/// Lists the tokens a template references, in order of appearance
pub fn tokens(template: &str) -> Vec<String> {
    token_re()
        .captures_iter(template)
        .filter_map(|caps| caps.get(1).map(|m| m.as_str().to_string()))
        .collect()
}

// =============================================================================
// Shot Numbering
// =============================================================================

/// Monotonic shot number generator for one selection pass.
///
/// Starts at `countFrom` and moves by `countSteps` per processed clip.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ShotCounter {
    value: i64,
    step: i64,
}

impl ShotCounter {
    pub fn new(count_from: i64, count_steps: i64) -> Self {
        Self {
            value: count_from,
            step: count_steps,
        }
    }

    /// The number the next shot receives
    pub fn value(&self) -> i64 {
        self.value
    }

    pub fn step(&self) -> i64 {
        self.step
    }

    /// Counter for the following clip
    #[must_use]
    pub fn advanced(self) -> Self {
        Self {
            value: self.value + self.step,
            step: self.step,
        }
    }
}

/// Replaces each run of `#` with `number` zero-padded to the run's length
pub fn pad_hashes(text: &str, number: i64) -> String {
    hash_run_re()
        .replace_all(text, |caps: &regex::Captures<'_>| {
            let width = caps[0].len();
            format!("{:0width$}", number, width = width)
        })
        .into_owned()
}

/// Resolves a shot pattern such as `sh###` or `{_clip_}_###`.
///
/// Returns the name and the counter for the next clip.
pub fn resolve_shot(
    pattern: &str,
    context: &TokenContext,
    counter: ShotCounter,
) -> CoreResult<(String, ShotCounter)> {
    let numbered = pad_hashes(pattern, counter.value());
    let name = resolve(&numbered, context)?;
    Ok((name, counter.advanced()))
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx(pairs: &[(&str, &str)]) -> TokenContext {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_resolve_simple() {
        let context = ctx(&[("folder", "shots"), ("sequence", "sq01")]);
        assert_eq!(
            resolve("{folder}/{sequence}", &context).unwrap(),
            "shots/sq01"
        );
    }

    #[test]
    fn test_resolve_keeps_plain_text() {
        let context = ctx(&[("shot", "sh010")]);
        assert_eq!(
            resolve("prefix_{shot}-suffix.v001", &context).unwrap(),
            "prefix_sh010-suffix.v001"
        );
        assert_eq!(resolve("no tokens", &TokenContext::new()).unwrap(), "no tokens");
    }

    #[test]
    fn test_resolve_unknown_token() {
        let context = ctx(&[("folder", "shots")]);
        let err = resolve("{folder}/{episode}", &context).unwrap_err();
        match err {
            CoreError::UnknownToken { token, template } => {
                assert_eq!(token, "episode");
                assert_eq!(template, "{folder}/{episode}");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_resolve_is_deterministic() {
        let context = ctx(&[("a", "1"), ("b", "2")]);
        let first = resolve("{a}{b}{a}", &context).unwrap();
        let second = resolve("{a}{b}{a}", &context).unwrap();
        assert_eq!(first, "121");
        assert_eq!(first, second);
    }

    #[test]
    fn test_tokens() {
        assert_eq!(
            tokens("{folder}/{_sequence_}/x"),
            vec!["folder".to_string(), "_sequence_".to_string()]
        );
    }

    #[test]
    fn test_pad_hashes() {
        assert_eq!(pad_hashes("sh###", 10), "sh010");
        assert_eq!(pad_hashes("sh#", 120), "sh120");
        assert_eq!(pad_hashes("a##_b####", 7), "a07_b0007");
        assert_eq!(pad_hashes("plain", 7), "plain");
    }

    #[test]
    fn test_resolve_shot_numbering() {
        let counter = ShotCounter::new(10, 10);

        let (first, counter) = resolve_shot("sh###", &TokenContext::new(), counter).unwrap();
        assert_eq!(first, "sh010");

        let (second, counter) = resolve_shot("sh###", &TokenContext::new(), counter).unwrap();
        assert_eq!(second, "sh020");
        assert_eq!(counter.value(), 30);
    }

    #[test]
    fn test_resolve_shot_same_inputs_same_outputs() {
        let counter = ShotCounter::new(5, 5);
        let context = ctx(&[("_clip_", "plate")]);

        let a = resolve_shot("{_clip_}_####", &context, counter).unwrap();
        let b = resolve_shot("{_clip_}_####", &context, counter).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.0, "plate_0005");
        assert_eq!(a.1.value(), 10);
    }

    #[test]
    fn test_resolve_shot_unknown_token_keeps_counter_untouched() {
        let counter = ShotCounter::new(10, 10);
        assert!(resolve_shot("{nope}###", &TokenContext::new(), counter).is_err());
        assert_eq!(counter.value(), 10);
    }
}
