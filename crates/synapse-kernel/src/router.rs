//! Ordered rule engine.
//!
//! Service rule sets are declared as `static` data ([`RuleSetSpec`]) and
//! compiled once into a [`RuleTable`].  Resolution walks families in the
//! order they were given and rules in declaration order:
//!
//! | Step | Input | Technique |
//! |------|-------|-----------|
//! | 1 | normalized text | vocabulary gate via [`aho_corasick`] |
//! | 2 | normalized text | rule trigger via compiled [`regex`] |
//! | 3 | original text | parameter extractors (captures, clauses, flags) |
//!
//! The first rule whose trigger matches **and** whose mandatory parameters
//! all extract wins.  A rule that triggers but cannot extract a mandatory
//! parameter is skipped, never an error.
//!
//! Keyword sources ([`Source::Flag`], [`Source::Choice`]) only see the text
//! left over after earlier extractors in the same rule took their values, so
//! `closed` inside `owner/closed-beta` is not a state filter.  A keyword
//! that is part of a slug-like token or follows a negation (`not done`) does
//! not count either.

use aho_corasick::{AhoCorasick, AhoCorasickBuilder, MatchKind};
use regex::{Regex, RegexBuilder};

use crate::command::{ParamValue, Params};
use crate::error::{KernelError, Result};
use crate::service::ServiceId;

// ---------------------------------------------------------------------------
// Declarative specs
// ---------------------------------------------------------------------------

/// How a captured string is turned into a [`ParamValue`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    /// Trimmed text, original casing.
    Text,
    /// Parsed as `i64`; a non-numeric capture is an extraction failure.
    Integer,
    /// Uppercased text (issue keys).
    Upper,
    /// Like `Text`, but a lone function word (`for`, `that`, ...) is an
    /// extraction failure.  Used for resource names captured after a noun.
    Name,
}

/// One way of extracting a parameter value.
#[derive(Debug)]
pub enum Source {
    /// Regex patterns run case-insensitively on the original text.  The first
    /// participating capture group of the first matching pattern is the value.
    Capture {
        patterns: &'static [&'static str],
        kind: ValueKind,
    },
    /// Unquoted fallback: the text following the first marker pattern, cut
    /// at the earliest stop word.
    Clause {
        markers: &'static [&'static str],
        stops: &'static [&'static str],
    },
    /// `true` when any keyword appears as a standalone, non-negated word.
    /// Absent otherwise, so the operation default applies.
    Flag { keywords: &'static [&'static str] },
    /// The value paired with the first keyword that appears as a standalone,
    /// non-negated word, else `otherwise`.
    Choice {
        options: &'static [(&'static str, &'static str)],
        otherwise: Option<&'static str>,
    },
    /// A constant text value.
    Fixed(&'static str),
}

/// A named parameter and the sources tried, in order, to extract it.
#[derive(Debug)]
pub struct ExtractorSpec {
    pub param: &'static str,
    pub sources: &'static [Source],
    pub mandatory: bool,
}

/// One rule: trigger predicate, target operation, extractors.
#[derive(Debug)]
pub struct RuleSpec {
    pub name: &'static str,
    pub operation: &'static str,
    /// Regex evaluated against the normalized (trimmed, lowercased) text.
    pub trigger: &'static str,
    pub extractors: &'static [ExtractorSpec],
}

/// All rules of one service, plus the keywords that gate the family.
#[derive(Debug)]
pub struct RuleSetSpec {
    pub service: ServiceId,
    /// The family is only consulted when one of these appears in the
    /// normalized text.  Empty means always consulted.
    pub vocabulary: &'static [&'static str],
    pub rules: &'static [RuleSpec],
}

// ---------------------------------------------------------------------------
// Compiled table
// ---------------------------------------------------------------------------

/// A successful resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleMatch {
    pub service: ServiceId,
    pub operation: &'static str,
    pub rule: &'static str,
    pub params: Params,
}

enum CompiledSource {
    Capture(Vec<Regex>, ValueKind),
    Clause {
        markers: Vec<Regex>,
        stops: &'static [&'static str],
    },
    Flag(Vec<Regex>),
    Choice(Vec<(Regex, &'static str)>, Option<&'static str>),
    Fixed(&'static str),
}

struct Extractor {
    param: &'static str,
    sources: Vec<CompiledSource>,
    mandatory: bool,
}

struct Rule {
    name: &'static str,
    operation: &'static str,
    trigger: Regex,
    extractors: Vec<Extractor>,
}

struct RuleFamily {
    service: ServiceId,
    gate: Option<AhoCorasick>,
    rules: Vec<Rule>,
}

/// Compiled, immutable rule table.  Cheap to share behind an `Arc`.
pub struct RuleTable {
    families: Vec<RuleFamily>,
}

impl RuleTable {
    /// Compile rule sets.  Families are evaluated in the order given.
    pub fn compile(sets: &[&'static RuleSetSpec]) -> Result<Self> {
        let families = sets
            .iter()
            .map(|set| compile_family(set))
            .collect::<Result<Vec<_>>>()?;
        let rule_count: usize = families.iter().map(|f| f.rules.len()).sum();
        tracing::debug!(families = families.len(), rules = rule_count, "rule table compiled");
        Ok(Self { families })
    }

    /// Resolve `text` to the first complete rule match.
    pub fn resolve(&self, text: &str) -> Option<RuleMatch> {
        let original = text.trim();
        if original.is_empty() {
            return None;
        }
        let normalized = original.to_lowercase();

        for family in &self.families {
            if let Some(gate) = &family.gate
                && !gate.is_match(&normalized)
            {
                continue;
            }
            for rule in &family.rules {
                if !rule.trigger.is_match(&normalized) {
                    continue;
                }
                match rule.extract(original, &normalized) {
                    Some(params) => {
                        tracing::debug!(
                            service = %family.service,
                            rule = rule.name,
                            operation = rule.operation,
                            "rule matched"
                        );
                        return Some(RuleMatch {
                            service: family.service,
                            operation: rule.operation,
                            rule: rule.name,
                            params,
                        });
                    }
                    None => {
                        tracing::debug!(
                            rule = rule.name,
                            "rule triggered but extraction incomplete"
                        );
                    }
                }
            }
        }
        None
    }

    /// Every `(service, operation)` pair some rule can produce.
    pub fn operations(&self) -> impl Iterator<Item = (ServiceId, &'static str)> + '_ {
        self.families
            .iter()
            .flat_map(|f| f.rules.iter().map(move |r| (f.service, r.operation)))
    }

    /// Services in evaluation order.
    pub fn services(&self) -> impl Iterator<Item = ServiceId> + '_ {
        self.families.iter().map(|f| f.service)
    }

    pub fn rule_count(&self) -> usize {
        self.families.iter().map(|f| f.rules.len()).sum()
    }
}

impl Rule {
    fn extract(&self, original: &str, normalized: &str) -> Option<Params> {
        let mut params = Params::new();
        let mut remaining = normalized.to_owned();
        for extractor in &self.extractors {
            let found = extractor.sources.iter().find_map(|source| {
                source
                    .extract(original, &remaining)
                    .map(|value| (source, value))
            });
            match found {
                Some((source, value)) => {
                    if source.reads_text()
                        && let ParamValue::Text(text) = &value
                    {
                        remaining = blank_out(&remaining, &text.to_lowercase());
                    }
                    params.insert(extractor.param, value);
                }
                None if extractor.mandatory => return None,
                None => {}
            }
        }
        Some(params)
    }
}

impl CompiledSource {
    /// Whether the value is lifted out of the request text.
    fn reads_text(&self) -> bool {
        matches!(self, Self::Capture(..) | Self::Clause { .. })
    }

    fn extract(&self, original: &str, normalized: &str) -> Option<ParamValue> {
        match self {
            Self::Capture(patterns, kind) => patterns.iter().find_map(|re| {
                let caps = re.captures(original)?;
                let raw = caps.iter().skip(1).flatten().next()?.as_str().trim();
                if raw.is_empty() {
                    return None;
                }
                match kind {
                    ValueKind::Text => Some(ParamValue::Text(raw.to_owned())),
                    ValueKind::Upper => Some(ParamValue::Text(raw.to_uppercase())),
                    ValueKind::Name => (!is_filler(raw)).then(|| ParamValue::Text(raw.to_owned())),
                    ValueKind::Integer => raw.parse::<i64>().ok().map(ParamValue::Integer),
                }
            }),
            Self::Clause { markers, stops } => markers
                .iter()
                .find_map(|re| clause_after(re, original, stops))
                .map(ParamValue::Text),
            Self::Flag(keywords) => keywords
                .iter()
                .any(|re| affirmed(re, normalized))
                .then_some(ParamValue::Flag(true)),
            Self::Choice(options, otherwise) => options
                .iter()
                .find(|(re, _)| affirmed(re, normalized))
                .map(|(_, value)| *value)
                .or(*otherwise)
                .map(ParamValue::from),
            Self::Fixed(value) => Some(ParamValue::from(*value)),
        }
    }
}

/// `text` with every standalone occurrence of `value` replaced by spaces.
fn blank_out(text: &str, value: &str) -> String {
    if value.is_empty() {
        return text.to_owned();
    }
    let mut out = String::with_capacity(text.len());
    let mut last = 0;
    for (start, _) in text.match_indices(value) {
        let end = start + value.len();
        let before = text[..start].chars().next_back();
        let after = text[end..].chars().next();
        if before.is_some_and(char::is_alphanumeric) || after.is_some_and(char::is_alphanumeric) {
            continue;
        }
        out.push_str(&text[last..start]);
        out.extend(std::iter::repeat_n(' ', value.chars().count()));
        last = end;
    }
    out.push_str(&text[last..]);
    out
}

/// Function words that never name a resource.
const FILLER_WORDS: &[&str] = &[
    "a", "an", "the", "my", "our", "your", "this", "that", "it", "for", "to", "in", "on", "of",
    "with", "from", "which", "and", "called", "named",
];

fn is_filler(word: &str) -> bool {
    FILLER_WORDS.iter().any(|filler| word.eq_ignore_ascii_case(filler))
}

/// Words that cancel a keyword when they appear just before it.
const NEGATIONS: &[&str] = &[
    "not", "no", "non", "never", "without", "except", "excluding", "isn't", "aren't", "isnt",
    "arent",
];

/// Whether `keyword` matches somewhere in `text` without a negation in the
/// two preceding words.
fn affirmed(keyword: &Regex, text: &str) -> bool {
    keyword.find_iter(text).any(|m| {
        !text[..m.start()]
            .split_whitespace()
            .rev()
            .take(2)
            .map(|word| word.trim_matches(|c: char| !c.is_alphanumeric() && c != '\''))
            .any(|word| NEGATIONS.contains(&word))
    })
}

/// Text following `marker`, cut at the earliest stop word (matched
/// case-insensitively), with surrounding whitespace and punctuation removed.
fn clause_after(marker: &Regex, original: &str, stops: &[&str]) -> Option<String> {
    let m = marker.find(original)?;
    let rest = &original[m.end()..];
    // ASCII lowercasing keeps byte offsets aligned with `rest`.
    let lowered = rest.to_ascii_lowercase();
    let end = stops
        .iter()
        .filter_map(|stop| lowered.find(stop))
        .min()
        .unwrap_or(rest.len());
    let value = rest[..end]
        .trim()
        .trim_matches(|c: char| matches!(c, '"' | '\'' | '.' | '?' | '!' | ','))
        .trim();
    (!value.is_empty()).then(|| value.to_owned())
}

// ---------------------------------------------------------------------------
// Compilation
// ---------------------------------------------------------------------------

fn compile_family(set: &RuleSetSpec) -> Result<RuleFamily> {
    let gate = if set.vocabulary.is_empty() {
        None
    } else {
        let automaton = AhoCorasickBuilder::new()
            .match_kind(MatchKind::LeftmostFirst)
            .build(set.vocabulary)
            .map_err(|e| KernelError::RouterBuildError {
                reason: format!("{} vocabulary: {e}", set.service),
            })?;
        Some(automaton)
    };

    let rules = set
        .rules
        .iter()
        .map(|spec| {
            Ok(Rule {
                name: spec.name,
                operation: spec.operation,
                trigger: compile_regex(spec.name, spec.trigger)?,
                extractors: spec
                    .extractors
                    .iter()
                    .map(|e| compile_extractor(spec.name, e))
                    .collect::<Result<Vec<_>>>()?,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(RuleFamily {
        service: set.service,
        gate,
        rules,
    })
}

fn compile_extractor(rule: &str, spec: &ExtractorSpec) -> Result<Extractor> {
    let sources = spec
        .sources
        .iter()
        .map(|source| {
            Ok(match source {
                Source::Capture { patterns, kind } => CompiledSource::Capture(
                    patterns
                        .iter()
                        .map(|p| compile_regex(rule, p))
                        .collect::<Result<_>>()?,
                    *kind,
                ),
                Source::Clause { markers, stops } => CompiledSource::Clause {
                    markers: markers
                        .iter()
                        .map(|p| compile_regex(rule, p))
                        .collect::<Result<_>>()?,
                    stops: *stops,
                },
                Source::Flag { keywords } => CompiledSource::Flag(
                    keywords
                        .iter()
                        .map(|k| compile_keyword(rule, k))
                        .collect::<Result<_>>()?,
                ),
                Source::Choice { options, otherwise } => CompiledSource::Choice(
                    options
                        .iter()
                        .map(|(k, v)| Ok((compile_keyword(rule, k)?, *v)))
                        .collect::<Result<_>>()?,
                    *otherwise,
                ),
                Source::Fixed(value) => CompiledSource::Fixed(*value),
            })
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(Extractor {
        param: spec.param,
        sources,
        mandatory: spec.mandatory,
    })
}

fn compile_regex(rule: &str, pattern: &str) -> Result<Regex> {
    RegexBuilder::new(pattern)
        .case_insensitive(true)
        .build()
        .map_err(|e| KernelError::InvalidPattern {
            rule: rule.to_owned(),
            pattern: pattern.to_owned(),
            reason: e.to_string(),
        })
}

/// A keyword that stands alone: not glued to `/`, `-` or a dotted name, as in
/// `owner/closed-beta` or `all.js`.
fn compile_keyword(rule: &str, keyword: &str) -> Result<Regex> {
    compile_regex(
        rule,
        &format!(
            r"(?:^|[^\w./-]){}(?:$|[^\w./-]|\.(?:$|\W))",
            regex::escape(keyword)
        ),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    const QUOTED: &str = r#""([^"]+)"|'([^']+)'"#;

    static TOY: RuleSetSpec = RuleSetSpec {
        service: ServiceId::GitHub,
        vocabulary: &["repo", "issue"],
        rules: &[
            RuleSpec {
                name: "close_issue",
                operation: "close_issue",
                trigger: r"close.*issue",
                extractors: &[ExtractorSpec {
                    param: "issue_number",
                    sources: &[Source::Capture {
                        patterns: &[r"issue\s+#?(\S+)"],
                        kind: ValueKind::Integer,
                    }],
                    mandatory: true,
                }],
            },
            RuleSpec {
                name: "issue_fallback",
                operation: "list_issues",
                trigger: r"issue",
                extractors: &[
                    ExtractorSpec {
                        param: "repo",
                        sources: &[Source::Capture {
                            patterns: &[r"\brepo\s+(\S+)"],
                            kind: ValueKind::Text,
                        }],
                        mandatory: false,
                    },
                    ExtractorSpec {
                        param: "state",
                        sources: &[Source::Choice {
                            options: &[("closed", "closed")],
                            otherwise: Some("open"),
                        }],
                        mandatory: true,
                    },
                ],
            },
            RuleSpec {
                name: "create_repo",
                operation: "create_repo",
                trigger: r"create.*repo",
                extractors: &[
                    ExtractorSpec {
                        param: "description",
                        sources: &[
                            Source::Capture {
                                patterns: &[QUOTED],
                                kind: ValueKind::Text,
                            },
                            Source::Clause {
                                markers: &[r"\bdescribed as\b"],
                                stops: &[" and make", " private"],
                            },
                        ],
                        mandatory: false,
                    },
                    ExtractorSpec {
                        param: "private",
                        sources: &[Source::Flag {
                            keywords: &["private"],
                        }],
                        mandatory: false,
                    },
                    ExtractorSpec {
                        param: "origin",
                        sources: &[Source::Fixed("chat")],
                        mandatory: true,
                    },
                ],
            },
        ],
    };

    static GATED: RuleSetSpec = RuleSetSpec {
        service: ServiceId::Slack,
        vocabulary: &["slack"],
        rules: &[RuleSpec {
            name: "anything",
            operation: "status",
            trigger: r".",
            extractors: &[],
        }],
    };

    static BROKEN: RuleSetSpec = RuleSetSpec {
        service: ServiceId::Jira,
        vocabulary: &[],
        rules: &[RuleSpec {
            name: "bad",
            operation: "status",
            trigger: r"(unclosed",
            extractors: &[],
        }],
    };

    fn table() -> RuleTable {
        RuleTable::compile(&[&GATED, &TOY]).unwrap()
    }

    #[test]
    fn integer_extraction() {
        let m = table().resolve("close issue #12").unwrap();
        assert_eq!(m.operation, "close_issue");
        assert_eq!(m.params.get_int("issue_number"), Some(12));
    }

    #[test]
    fn non_numeric_integer_falls_through_to_next_rule() {
        let m = table().resolve("close issue abc").unwrap();
        assert_eq!(m.rule, "issue_fallback");
        assert_eq!(m.params.get_str("state"), Some("open"));
    }

    #[test]
    fn choice_picks_keyword() {
        let m = table().resolve("show closed issues").unwrap();
        assert_eq!(m.params.get_str("state"), Some("closed"));
    }

    #[test]
    fn choice_ignores_keyword_inside_extracted_value() {
        let m = table().resolve("list issues in repo owner/closed-beta").unwrap();
        assert_eq!(m.params.get_str("repo"), Some("owner/closed-beta"));
        assert_eq!(m.params.get_str("state"), Some("open"));
    }

    #[test]
    fn choice_ignores_keyword_glued_to_a_slug() {
        let m = table().resolve("list issues for closed-beta").unwrap();
        assert_eq!(m.params.get_str("state"), Some("open"));
        let m = table().resolve("list issues for acme/closed").unwrap();
        assert_eq!(m.params.get_str("state"), Some("open"));
        let m = table().resolve("list issues that are closed.").unwrap();
        assert_eq!(m.params.get_str("state"), Some("closed"));
    }

    #[test]
    fn negated_keywords_do_not_count() {
        let m = table().resolve("list issues that are not closed").unwrap();
        assert_eq!(m.params.get_str("state"), Some("open"));
        let m = table().resolve("list issues, never closed ones").unwrap();
        assert_eq!(m.params.get_str("state"), Some("open"));
        let m = table().resolve("create repo, not private").unwrap();
        assert_eq!(m.params.get_bool("private"), None);
    }

    #[test]
    fn quoted_description_does_not_set_flag() {
        let m = table().resolve("create repo 'my private notes'").unwrap();
        assert_eq!(m.params.get_str("description"), Some("my private notes"));
        assert_eq!(m.params.get_bool("private"), None);
    }

    #[test]
    fn filler_words_are_not_names() {
        assert!(is_filler("for"));
        assert!(is_filler("That"));
        assert!(!is_filler("forge"));
        assert!(!is_filler("my-app"));
    }

    #[test]
    fn blank_out_only_replaces_standalone_tokens() {
        assert_eq!(blank_out("list ops in ops-web", "ops"), "list     in    -web");
        assert_eq!(blank_out("topsoil ops", "ops"), "topsoil    ");
        assert_eq!(blank_out("anything", ""), "anything");
    }

    #[test]
    fn quoted_capture_preserves_case() {
        let m = table()
            .resolve("Create a repo 'Hello World' private")
            .unwrap();
        assert_eq!(m.params.get_str("description"), Some("Hello World"));
        assert_eq!(m.params.get_bool("private"), Some(true));
        assert_eq!(m.params.get_str("origin"), Some("chat"));
    }

    #[test]
    fn clause_stops_at_keyword_boundary() {
        let m = table()
            .resolve("create repo described as My Tool and make it private")
            .unwrap();
        assert_eq!(m.params.get_str("description"), Some("My Tool"));
        assert_eq!(m.params.get_bool("private"), Some(true));
    }

    #[test]
    fn optional_extractor_absent() {
        let m = table().resolve("create repo").unwrap();
        assert!(!m.params.contains("description"));
        assert!(!m.params.contains("private"));
    }

    #[test]
    fn flag_matches_whole_words_only() {
        let m = table().resolve("create repo privateer").unwrap();
        assert_eq!(m.params.get_bool("private"), None);
    }

    #[test]
    fn vocabulary_gate_skips_family() {
        let m = table().resolve("list issues").unwrap();
        assert_eq!(m.service, ServiceId::GitHub);
        let m = table().resolve("slack issues").unwrap();
        assert_eq!(m.service, ServiceId::Slack);
    }

    #[test]
    fn empty_and_unknown_text_resolve_to_none() {
        assert!(table().resolve("   ").is_none());
        assert!(table().resolve("make coffee").is_none());
    }

    #[test]
    fn invalid_pattern_is_reported() {
        let err = RuleTable::compile(&[&BROKEN]).err().unwrap();
        assert!(matches!(err, KernelError::InvalidPattern { ref rule, .. } if rule == "bad"));
    }

    #[test]
    fn operations_lists_every_rule() {
        let ops: Vec<_> = table().operations().collect();
        assert_eq!(ops.len(), 4);
        assert!(ops.contains(&(ServiceId::GitHub, "create_repo")));
        assert_eq!(
            table().services().collect::<Vec<_>>(),
            vec![ServiceId::Slack, ServiceId::GitHub]
        );
    }
}
