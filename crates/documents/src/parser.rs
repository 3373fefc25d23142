//! Newsletter document layout.
//!
//! A document is a sequence of sections, each shaped like:
//!
//! ```text
//! Article #3
//!
//! Article #3 Title: Why Data Products Fail
//!
//! Article #3 URL: https://www.linkedin.com/pulse/...
//!
//! Body text, any number of paragraphs.
//! ```
//!
//! Text before the first header is ignored. The body is everything after the
//! URL line up to the next header; runs of blank lines collapse to one.

use std::sync::LazyLock;

use pipeline::{Article, ArticleNumber};
use regex::Regex;
use tracing::debug;

static HEADER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^\s*Article\s*#(\d+)\s*$").expect("valid header pattern")
});

static FIELD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^\s*Article\s*#(\d+)\s+(Title|URL):\s*(.*)$").expect("valid field pattern")
});

#[derive(Default)]
struct Section<'a> {
    number: u32,
    title: String,
    url: String,
    body: Vec<&'a str>,
    in_body: bool,
}

impl Section<'_> {
    fn into_article(self) -> Article {
        Article::new(
            ArticleNumber::new(self.number),
            self.title,
            self.url,
            collapse_blank_runs(&self.body),
        )
    }
}

/// Splits a newsletter document into its articles, in document order.
pub fn parse_document(text: &str) -> Vec<Article> {
    let text = text.trim_start_matches('\u{feff}');
    let mut articles = Vec::new();
    let mut current: Option<Section<'_>> = None;

    for line in text.lines() {
        if let Some(number) = HEADER
            .captures(line)
            .and_then(|c| c[1].parse::<u32>().ok())
        {
            if let Some(section) = current.take() {
                articles.push(section.into_article());
            }
            current = Some(Section {
                number,
                ..Section::default()
            });
            continue;
        }

        let Some(section) = current.as_mut() else {
            continue;
        };

        if section.in_body {
            section.body.push(line);
            continue;
        }

        if let Some(caps) = FIELD.captures(line) {
            if caps[1].parse::<u32>().ok() != Some(section.number) {
                continue;
            }
            let value = caps[3].trim().to_string();
            if caps[2].eq_ignore_ascii_case("title") {
                section.title = value;
            } else {
                section.url = value;
                section.in_body = true;
            }
        }
    }

    if let Some(section) = current {
        articles.push(section.into_article());
    }

    debug!(articles = articles.len(), "Document parsed");
    articles
}

fn collapse_blank_runs(lines: &[&str]) -> String {
    let mut out: Vec<&str> = Vec::with_capacity(lines.len());
    for line in lines {
        let blank = line.trim().is_empty();
        if blank && out.last().is_some_and(|l| l.is_empty()) {
            continue;
        }
        out.push(if blank { "" } else { line.trim_end() });
    }
    out.join("\n").trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    const DOC: &str = "\
CoreAI Newsletter, Issue 12

Article #1

Article #1 Title: Why Data Products Fail

Article #1 URL: https://www.linkedin.com/pulse/why-data-products-fail-jane-doe-lim-ab12/

Most data products fail for organisational reasons.



Ownership is the first of them.

Article #2

Article #2 Title:   Measuring AI Value

Article #2 URL: https://www.linkedin.com/pulse/measuring-ai-value-jane-doe-lim-cd34/

Value shows up in decisions, not dashboards.
";

    #[test]
    fn test_parses_sections_in_document_order() {
        let articles = parse_document(DOC);

        assert_eq!(articles.len(), 2);
        assert_eq!(articles[0].number, ArticleNumber::new(1));
        assert_eq!(articles[0].title, "Why Data Products Fail");
        assert_eq!(
            articles[0].url,
            "https://www.linkedin.com/pulse/why-data-products-fail-jane-doe-lim-ab12/"
        );
        assert_eq!(articles[1].number, ArticleNumber::new(2));
        assert_eq!(articles[1].title, "Measuring AI Value");
    }

    #[test]
    fn test_body_collapses_blank_runs_and_stops_at_next_header() {
        let articles = parse_document(DOC);

        assert_eq!(
            articles[0].content,
            "Most data products fail for organisational reasons.\n\nOwnership is the first of them."
        );
        assert_eq!(articles[0].word_count, 13);
        assert_eq!(
            articles[1].content,
            "Value shows up in decisions, not dashboards."
        );
    }

    #[test]
    fn test_headers_match_regardless_of_case() {
        let doc = "\
ARTICLE #1
Article #1 Title: One
Article #1 URL: https://www.linkedin.com/pulse/one-jane-doe-lim-a1/
First body.
article #2
ARTICLE #2 TITLE: Two
article #2 url: https://www.linkedin.com/pulse/two-jane-doe-lim-b2/
Second body.
";

        let articles = parse_document(doc);

        assert_eq!(articles.len(), 2);
        assert_eq!(articles[0].content, "First body.");
        assert_eq!(articles[1].number, ArticleNumber::new(2));
        assert_eq!(articles[1].title, "Two");
        assert_eq!(articles[1].content, "Second body.");
    }

    #[test]
    fn test_missing_url_line_leaves_url_and_body_empty() {
        let doc = "Article #5\n\nArticle #5 Title: Closing Thoughts\n\nSome trailing text.\n";

        let articles = parse_document(doc);

        assert_eq!(articles.len(), 1);
        assert_eq!(articles[0].title, "Closing Thoughts");
        assert!(!articles[0].has_url());
        assert!(articles[0].content.is_empty());
        assert_eq!(articles[0].word_count, 0);
    }

    #[test]
    fn test_blank_url_value_is_treated_as_missing() {
        let doc = "Article #5\nArticle #5 Title: Closing\nArticle #5 URL:\n\nBody here.\n";

        let articles = parse_document(doc);

        assert!(!articles[0].has_url());
        assert_eq!(articles[0].content, "Body here.");
    }

    #[test]
    fn test_field_lines_for_another_number_are_ignored() {
        let doc = "Article #3\nArticle #4 Title: Wrong\nArticle #3 Title: Right\n";

        let articles = parse_document(doc);

        assert_eq!(articles[0].title, "Right");
    }

    #[test]
    fn test_field_labels_are_case_insensitive() {
        let doc = "Article #1\narticle #1 title: Lower\nARTICLE #1 url: https://example.com/x\n\nBody\n";

        let articles = parse_document(doc);

        assert_eq!(articles[0].title, "Lower");
        assert_eq!(articles[0].url, "https://example.com/x");
        assert_eq!(articles[0].content, "Body");
    }

    #[test]
    fn test_preamble_and_crlf_and_bom_are_handled() {
        let doc = "\u{feff}Intro line\r\nArticle #1\r\nArticle #1 Title: T\r\nArticle #1 URL: https://a.example/b\r\n\r\nText\r\n";

        let articles = parse_document(doc);

        assert_eq!(articles.len(), 1);
        assert_eq!(articles[0].title, "T");
        assert_eq!(articles[0].content, "Text");
    }

    #[test]
    fn test_document_without_headers_yields_nothing() {
        assert!(parse_document("Just some notes.\nNo articles here.").is_empty());
    }

    #[test]
    fn test_duplicate_numbers_are_kept_for_the_validator() {
        let doc = "Article #2\nArticle #2 Title: A\nArticle #2\nArticle #2 Title: B\n";

        let articles = parse_document(doc);

        assert_eq!(articles.len(), 2);
        assert!(articles.iter().all(|a| a.number == ArticleNumber::new(2)));
    }
}
