//! Ordered extraction rule tables.
//!
//! Each rule pairs one or more patterns with a category, a capture group,
//! an excerpt length and a collection mode. Rules run in table order, so the
//! order of the records produced is stable.

use std::sync::LazyLock;

use regex::Regex;

use crate::types::Category;

/// Longest error excerpt kept.
pub const ERROR_EXCERPT: usize = 120;
/// Longest test summary excerpt kept.
pub const TEST_EXCERPT: usize = 100;
/// Longest version-control excerpt kept.
pub const GIT_EXCERPT: usize = 80;
/// Longest fact excerpt kept.
pub const FACT_EXCERPT: usize = 120;
/// Most error records produced from one output.
pub const MAX_ERRORS: usize = 5;

/// Marker an agent prints when it believes the task is complete.
pub const COMPLETION_MARKER: &str = "<promise>";

/// How matches of a rule become records.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Collect {
    /// Every distinct capture, sorted and joined into a single record.
    /// Captures starting with `exclude_prefix` are ignored.
    Aggregate { exclude_prefix: &'static str },
    /// One record per distinct capture, in first-seen order, at most `cap`.
    EachUnique { cap: usize },
    /// One record from the first pattern that matches anywhere.
    FirstMatch,
    /// One record when the literal marker occurs.
    Marker(&'static str),
    /// One record per match.
    EachMatch,
}

/// An episodic extraction rule.
#[derive(Debug)]
pub struct EpisodicRule {
    pub name: &'static str,
    pub category: Category,
    pub patterns: Vec<Regex>,
    /// Capture group used as the excerpt (0 for the whole match).
    pub group: usize,
    /// Excerpt length in characters.
    pub max_chars: usize,
    pub collect: Collect,
    /// Builds the record content from the iteration and the excerpt.
    pub render: fn(u64, &str) -> String,
}

/// A semantic fact rule. The first capture group is the fact.
#[derive(Debug)]
pub struct FactRule {
    pub name: &'static str,
    pub category: Category,
    pub pattern: Regex,
}

fn regex(pattern: &str) -> Regex {
    Regex::new(pattern).expect("Invalid regex")
}

/// Rules applied to raw iteration output.
pub static EPISODIC_RULES: LazyLock<Vec<EpisodicRule>> = LazyLock::new(|| {
    vec![
        EpisodicRule {
            name: "file_changes",
            category: Category::FileChanges,
            patterns: vec![
                regex(
                    r#"(?i)(?:created?|modified?|edited?|updated?|changed?|wrote|writing)\s+(?:file\s+)?[`'"]?([^\s`'"]+\.\w{1,10})[`'"]?"#,
                ),
                regex(r"(?i)(?:in|to|from)\s+\[?([^\s\]]+\.\w{1,10})\]?"),
            ],
            group: 1,
            max_chars: usize::MAX,
            collect: Collect::Aggregate { exclude_prefix: "http" },
            render: |iteration, files| {
                format!("Files touched in iteration {}: {}", iteration, files)
            },
        },
        EpisodicRule {
            name: "errors",
            category: Category::Errors,
            // Case-sensitive on purpose: only the listed spellings count
            patterns: vec![regex(
                r"(?:error|Error|ERROR|failed|Failed|FAIL|exception|Exception|traceback|Traceback)[\s:]+(.{20,120})",
            )],
            group: 1,
            max_chars: ERROR_EXCERPT,
            collect: Collect::EachUnique { cap: MAX_ERRORS },
            render: |iteration, error| format!("Error in iteration {}: {}", iteration, error),
        },
        EpisodicRule {
            name: "test_results",
            category: Category::TestResults,
            patterns: vec![
                regex(r"(?i)(\d+)\s+(?:tests?\s+)?passed"),
                regex(r"(?i)(\d+)\s+(?:tests?\s+)?failed"),
                regex(r"(?i)\b(?:PASSED|FAILED|OK)\b"),
                regex(r"(?i)pytest.*?(\d+ passed.*)"),
            ],
            group: 0,
            max_chars: TEST_EXCERPT,
            collect: Collect::FirstMatch,
            render: |iteration, summary| {
                format!("Test results iteration {}: {}", iteration, summary)
            },
        },
        EpisodicRule {
            name: "completion",
            category: Category::Progress,
            patterns: Vec::new(),
            group: 0,
            max_chars: 0,
            collect: Collect::Marker(COMPLETION_MARKER),
            render: |iteration, _| {
                format!("Completion promise detected in iteration {}", iteration)
            },
        },
        EpisodicRule {
            name: "git",
            category: Category::FileChanges,
            patterns: vec![regex(r"(?i)git\s+(commit|add|push|checkout|merge|rebase)\b.*")],
            group: 0,
            max_chars: GIT_EXCERPT,
            collect: Collect::EachMatch,
            render: |iteration, command| format!("Git operation iter {}: {}", iteration, command),
        },
    ]
});

/// Rules applied when mining long-lived facts.
pub static FACT_RULES: LazyLock<Vec<FactRule>> = LazyLock::new(|| {
    vec![
        FactRule {
            name: "dependency",
            category: Category::Dependencies,
            pattern: regex(
                r"(?i)(?:project|repo|codebase)\s+(?:uses?|requires?|depends? on)\s+(.{10,80})",
            ),
        },
        FactRule {
            name: "location",
            category: Category::TaskContext,
            pattern: regex(
                r#"(?i)(?:main|entry|config)\s+(?:file|module|script)\s+(?:is|at)\s+[`'"]?([^\s`'"]+)"#,
            ),
        },
        FactRule {
            name: "resolution",
            category: Category::Patterns,
            pattern: regex(r"(?i)(?:to\s+(?:fix|solve|resolve|handle))\s+(.{15,100})"),
        },
        FactRule {
            name: "decision",
            category: Category::Decisions,
            pattern: regex(r"(?i)(?:decided?|chose?|choosing|selected?)\s+(?:to\s+)?(.{10,100})"),
        },
    ]
});

/// Trim and cut to at most `max` characters.
pub fn excerpt(text: &str, max: usize) -> &str {
    let text = text.trim();
    match text.char_indices().nth(max) {
        Some((idx, _)) => text[..idx].trim_end(),
        None => text,
    }
}
