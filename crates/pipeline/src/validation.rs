//! Article set validation.
//!
//! [`ArticleValidator`] runs seven checks over a full article set and collects
//! every violation before reporting. Nothing short-circuits: an operator fixing
//! the newsletter document sees all problems at once.
//!
//! | # | Check | Violation |
//! |---|-------|-----------|
//! | 1 | Non-empty, exact expected count | [`Violation::CountMismatch`] |
//! | 2 | Every article has a number and a title | [`Violation::MissingField`] |
//! | 3 | Every article but the allowed-incomplete one has a URL | [`Violation::MissingUrl`] |
//! | 4 | Every present URL matches the URL rule | [`Violation::MalformedUrl`] |
//! | 5 | Article numbers are unique | [`Violation::DuplicateNumber`] |
//! | 6 | Present URLs are unique | [`Violation::DuplicateUrl`] |
//! | 7 | Numbers are exactly `1..=expected_count` | [`Violation::NumberingGap`] |
//!
//! Violations are reported grouped by check, in the order above.
//!
//! Whether a failure aborts the run depends on where the articles came from;
//! see [`ArticleOrigin`].

use std::collections::{BTreeMap, BTreeSet};

use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{Article, ArticleNumber};

// ---------------------------------------------------------------------------
// Rules
// ---------------------------------------------------------------------------

/// Configurable parameters of the validator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationRules {
    /// Exact number of articles the document must contain.
    pub expected_count: usize,
    /// The one article allowed to have no URL.
    pub incomplete_article: Option<ArticleNumber>,
    /// Required URL prefix.
    pub url_scheme: String,
    /// Path fragment every URL must contain.
    pub url_path_segment: String,
    /// Tag in the required `-<tag>-<alphanumeric>/` suffix.
    pub url_tag: String,
    /// Articles with fewer words than this produce a warning.
    pub short_content_words: usize,
}

impl Default for ValidationRules {
    fn default() -> Self {
        Self {
            expected_count: 5,
            incomplete_article: Some(ArticleNumber::new(5)),
            url_scheme: "https://".to_string(),
            url_path_segment: "linkedin.com/pulse/".to_string(),
            url_tag: "lim".to_string(),
            short_content_words: 50,
        }
    }
}

// ---------------------------------------------------------------------------
// Violations
// ---------------------------------------------------------------------------

/// Discriminant of a [`Violation`], for matching without destructuring.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViolationKind {
    CountMismatch,
    MissingField,
    MissingUrl,
    MalformedUrl,
    DuplicateNumber,
    DuplicateUrl,
    NumberingGap,
}

/// A field that every article must carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequiredField {
    Number,
    Title,
}

/// Why a present URL failed the URL rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UrlDefect {
    InsecureScheme,
    MissingPathSegment,
    MissingSuffix,
}

impl std::fmt::Display for UrlDefect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let text = match self {
            Self::InsecureScheme => "does not use the required scheme",
            Self::MissingPathSegment => "does not contain the required path segment",
            Self::MissingSuffix => "does not end with the required author suffix",
        };
        f.write_str(text)
    }
}

/// One failed check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Violation {
    CountMismatch {
        expected: usize,
        found: usize,
    },
    MissingField {
        /// Zero-based position in the input, for articles without a usable number.
        position: usize,
        article: Option<ArticleNumber>,
        field: RequiredField,
    },
    MissingUrl {
        article: ArticleNumber,
    },
    MalformedUrl {
        article: ArticleNumber,
        url: String,
        defect: UrlDefect,
    },
    DuplicateNumber {
        article: ArticleNumber,
        occurrences: usize,
    },
    DuplicateUrl {
        url: String,
        articles: Vec<ArticleNumber>,
    },
    /// The rotation walks `1..=expected_count`, so every number in that range
    /// must be present and nothing outside it.
    NumberingGap {
        missing: Vec<ArticleNumber>,
        unexpected: Vec<ArticleNumber>,
    },
}

impl Violation {
    /// Returns the discriminant of this violation.
    pub fn kind(&self) -> ViolationKind {
        match self {
            Self::CountMismatch { .. } => ViolationKind::CountMismatch,
            Self::MissingField { .. } => ViolationKind::MissingField,
            Self::MissingUrl { .. } => ViolationKind::MissingUrl,
            Self::MalformedUrl { .. } => ViolationKind::MalformedUrl,
            Self::DuplicateNumber { .. } => ViolationKind::DuplicateNumber,
            Self::DuplicateUrl { .. } => ViolationKind::DuplicateUrl,
            Self::NumberingGap { .. } => ViolationKind::NumberingGap,
        }
    }

    /// The single article this violation is about, if any.
    pub fn article(&self) -> Option<ArticleNumber> {
        match self {
            Self::MissingField { article, .. } => *article,
            Self::MissingUrl { article }
            | Self::MalformedUrl { article, .. }
            | Self::DuplicateNumber { article, .. } => Some(*article),
            Self::CountMismatch { .. } | Self::DuplicateUrl { .. } | Self::NumberingGap { .. } => {
                None
            }
        }
    }
}

impl std::fmt::Display for Violation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::CountMismatch { expected, found } => {
                write!(f, "expected {expected} articles, found {found}")
            }
            Self::MissingField {
                position,
                article: Some(n),
                field,
            } => write!(f, "article #{n} (position {position}) is missing its {field:?} field"),
            Self::MissingField {
                position,
                article: None,
                field,
            } => write!(f, "article at position {position} is missing its {field:?} field"),
            Self::MissingUrl { article } => write!(f, "article #{article} has no URL"),
            Self::MalformedUrl {
                article,
                url,
                defect,
            } => write!(f, "article #{article} URL {url} {defect}"),
            Self::DuplicateNumber {
                article,
                occurrences,
            } => write!(f, "article number {article} appears {occurrences} times"),
            Self::DuplicateUrl { url, articles } => {
                let list: Vec<String> = articles.iter().map(|n| format!("#{n}")).collect();
                write!(f, "URL {url} is shared by articles {}", list.join(", "))
            }
            Self::NumberingGap {
                missing,
                unexpected,
            } => {
                let list = |numbers: &[ArticleNumber]| {
                    numbers
                        .iter()
                        .map(|n| format!("#{n}"))
                        .collect::<Vec<_>>()
                        .join(", ")
                };
                write!(f, "article numbering is not contiguous from 1")?;
                if !missing.is_empty() {
                    write!(f, "; missing {}", list(missing))?;
                }
                if !unexpected.is_empty() {
                    write!(f, "; unexpected {}", list(unexpected))?;
                }
                Ok(())
            }
        }
    }
}

/// Aggregate failure carrying every violation found in one pass.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("article validation failed: {}", summarize(.violations))]
pub struct ValidationError {
    pub violations: Vec<Violation>,
}

impl ValidationError {
    /// Returns `true` if any collected violation has the given kind.
    pub fn has_kind(&self, kind: ViolationKind) -> bool {
        self.violations.iter().any(|v| v.kind() == kind)
    }

    /// Distinct kinds present, in check order.
    pub fn kinds(&self) -> Vec<ViolationKind> {
        let mut kinds: Vec<ViolationKind> = Vec::new();
        for v in &self.violations {
            if !kinds.contains(&v.kind()) {
                kinds.push(v.kind());
            }
        }
        kinds
    }
}

fn summarize(violations: &[Violation]) -> String {
    violations
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

// ---------------------------------------------------------------------------
// Reports
// ---------------------------------------------------------------------------

/// Count-based summary of a validation pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationReport {
    pub total_articles: usize,
    /// Articles with no per-article violation (checks 2–4).
    pub valid_articles: usize,
    pub warnings: Vec<String>,
}

/// Full result of a validation pass: the report plus every violation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationAudit {
    pub report: ValidationReport,
    pub violations: Vec<Violation>,
}

impl ValidationAudit {
    /// Converts the audit into the pass/fail contract of [`ArticleValidator::validate`].
    pub fn into_result(self) -> Result<ValidationReport, ValidationError> {
        if self.violations.is_empty() {
            Ok(self.report)
        } else {
            Err(ValidationError {
                violations: self.violations,
            })
        }
    }
}

/// Where an article set came from, which decides how a failure is treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArticleOrigin {
    /// Just ingested from the document source. Failure aborts the run.
    Fresh,
    /// Reused from the persisted cache. Failure is logged and the run continues.
    Cached,
}

// ---------------------------------------------------------------------------
// Validator
// ---------------------------------------------------------------------------

/// Read-only inspector for article sets.
#[derive(Debug, Clone, Default)]
pub struct ArticleValidator {
    rules: ValidationRules,
}

impl ArticleValidator {
    pub fn new(rules: ValidationRules) -> Self {
        Self { rules }
    }

    pub fn rules(&self) -> &ValidationRules {
        &self.rules
    }

    /// Validates `articles`, failing with every violation found.
    pub fn validate(&self, articles: &[Article]) -> Result<ValidationReport, ValidationError> {
        self.audit(articles).into_result()
    }

    /// Runs all checks and returns the report together with the violations.
    pub fn audit(&self, articles: &[Article]) -> ValidationAudit {
        let mut violations = Vec::new();
        let mut warnings = Vec::new();

        // 1. count
        if articles.len() != self.rules.expected_count {
            violations.push(Violation::CountMismatch {
                expected: self.rules.expected_count,
                found: articles.len(),
            });
        }

        // 2–4. per-article checks, collected per check
        let mut missing_fields = Vec::new();
        let mut missing_urls = Vec::new();
        let mut malformed_urls = Vec::new();
        let mut flagged: BTreeSet<usize> = BTreeSet::new();
        for (position, article) in articles.iter().enumerate() {
            let found = [
                self.check_fields(position, article, &mut missing_fields),
                self.check_url_presence(article, &mut missing_urls, &mut warnings),
                self.check_url_shape(article, &mut malformed_urls),
            ];
            if found.contains(&true) {
                flagged.insert(position);
            }
            if article.word_count < self.rules.short_content_words {
                warnings.push(format!(
                    "article #{} has very short content ({} words)",
                    article.number, article.word_count
                ));
            }
        }
        let valid_articles = articles.len() - flagged.len();
        violations.extend(missing_fields);
        violations.extend(missing_urls);
        violations.extend(malformed_urls);

        // 5. duplicate numbers
        let mut by_number: BTreeMap<ArticleNumber, usize> = BTreeMap::new();
        for article in articles.iter().filter(|a| a.number.get() != 0) {
            *by_number.entry(article.number).or_default() += 1;
        }
        for (&article, &occurrences) in &by_number {
            if occurrences > 1 {
                violations.push(Violation::DuplicateNumber {
                    article,
                    occurrences,
                });
            }
        }

        // 6. duplicate URLs
        let mut by_url: BTreeMap<&str, Vec<ArticleNumber>> = BTreeMap::new();
        for article in articles.iter().filter(|a| a.has_url()) {
            by_url.entry(article.url.trim()).or_default().push(article.number);
        }
        for (url, numbers) in by_url {
            if numbers.len() > 1 {
                violations.push(Violation::DuplicateUrl {
                    url: url.to_string(),
                    articles: numbers,
                });
            }
        }

        // 7. numbering; an empty set is already a count mismatch
        if !by_number.is_empty() {
            let expected = 1..=u32::try_from(self.rules.expected_count).unwrap_or(u32::MAX);
            let missing: Vec<ArticleNumber> = expected
                .clone()
                .map(ArticleNumber::new)
                .filter(|n| !by_number.contains_key(n))
                .collect();
            let unexpected: Vec<ArticleNumber> = by_number
                .keys()
                .copied()
                .filter(|n| !expected.contains(&n.get()))
                .collect();
            if !missing.is_empty() || !unexpected.is_empty() {
                violations.push(Violation::NumberingGap {
                    missing,
                    unexpected,
                });
            }
        }

        ValidationAudit {
            report: ValidationReport {
                total_articles: articles.len(),
                valid_articles,
                warnings,
            },
            violations,
        }
    }

    fn check_fields(
        &self,
        position: usize,
        article: &Article,
        violations: &mut Vec<Violation>,
    ) -> bool {
        let before = violations.len();
        let number = (article.number.get() != 0).then_some(article.number);
        if number.is_none() {
            violations.push(Violation::MissingField {
                position,
                article: None,
                field: RequiredField::Number,
            });
        }
        if !article.has_title() {
            violations.push(Violation::MissingField {
                position,
                article: number,
                field: RequiredField::Title,
            });
        }
        violations.len() > before
    }

    fn check_url_presence(
        &self,
        article: &Article,
        violations: &mut Vec<Violation>,
        warnings: &mut Vec<String>,
    ) -> bool {
        if article.has_url() {
            return false;
        }
        let incomplete_allowed =
            article.number.get() != 0 && Some(article.number) == self.rules.incomplete_article;
        if incomplete_allowed {
            warnings.push(format!(
                "article #{} has no URL (allowed for the incomplete article)",
                article.number
            ));
            return false;
        }
        violations.push(Violation::MissingUrl {
            article: article.number,
        });
        true
    }

    fn check_url_shape(&self, article: &Article, violations: &mut Vec<Violation>) -> bool {
        if !article.has_url() {
            return false;
        }
        match self.check_url(article.url.trim()) {
            Ok(()) => false,
            Err(defect) => {
                violations.push(Violation::MalformedUrl {
                    article: article.number,
                    url: article.url.clone(),
                    defect,
                });
                true
            }
        }
    }

    /// Checks one URL against the scheme, path and `-<tag>-<alphanumeric>/` suffix rule.
    pub fn check_url(&self, url: &str) -> Result<(), UrlDefect> {
        if !url.starts_with(&self.rules.url_scheme) {
            return Err(UrlDefect::InsecureScheme);
        }
        if !url.contains(&self.rules.url_path_segment) {
            return Err(UrlDefect::MissingPathSegment);
        }
        if !has_author_suffix(url, &self.rules.url_tag) {
            return Err(UrlDefect::MissingSuffix);
        }
        Ok(())
    }
}

/// `true` if `url` ends with `-<tag>-` followed by one or more ASCII
/// alphanumerics and a trailing `/`.
fn has_author_suffix(url: &str, tag: &str) -> bool {
    Regex::new(&format!(r"-{}-[A-Za-z0-9]+/$", regex::escape(tag)))
        .is_ok_and(|suffix| suffix.is_match(url))
}
