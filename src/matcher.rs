//! Literal keyword matchers.
//!
//! Each keyword compiles into an escaped regular expression honoring the
//! query's case flag. Matching is always literal substring matching;
//! `whole_word` in the output is a label derived afterwards, never a
//! matching mode.

use regex::{Regex, RegexBuilder};

use crate::models::MatchKind;

/// One located span of a keyword within a line.
#[derive(Debug, Clone)]
pub struct MatchSpan {
    /// Byte offsets into the line.
    pub start: usize,
    pub end: usize,
    /// The matched text as it appears in the line.
    pub text: String,
}

pub struct KeywordMatcher {
    keyword: String,
    regex: Regex,
}

impl KeywordMatcher {
    pub fn compile(keyword: &str, case_sensitive: bool) -> Self {
        let regex = RegexBuilder::new(&regex::escape(keyword))
            .case_insensitive(!case_sensitive)
            .build()
            .expect("escaped keyword is a valid literal pattern");
        Self {
            keyword: keyword.to_string(),
            regex,
        }
    }

    pub fn keyword(&self) -> &str {
        &self.keyword
    }

    /// Every occurrence of the keyword in `line`, left to right.
    pub fn find_spans(&self, line: &str) -> Vec<MatchSpan> {
        self.regex
            .find_iter(line)
            .map(|m| MatchSpan {
                start: m.start(),
                end: m.end(),
                text: m.as_str().to_string(),
            })
            .collect()
    }

    pub fn occurrences(&self, line: &str) -> usize {
        self.regex.find_iter(line).count()
    }

    /// Label a span: `whole_word` when the matched text equals the
    /// keyword verbatim, `partial` when it differs (only casing can
    /// differ for a literal matcher).
    pub fn kind_of(&self, matched: &str) -> MatchKind {
        if matched == self.keyword {
            MatchKind::WholeWord
        } else {
            MatchKind::Partial
        }
    }
}

/// Compile the whole keyword set in query order.
pub fn compile_all(keywords: &[String], case_sensitive: bool) -> Vec<KeywordMatcher> {
    keywords
        .iter()
        .map(|kw| KeywordMatcher::compile(kw, case_sensitive))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finds_every_occurrence() {
        let m = KeywordMatcher::compile("config", false);
        let spans = m.find_spans("config before config after config");
        assert_eq!(spans.len(), 3);
        assert_eq!(spans[0].start, 0);
        assert_eq!(spans[0].text, "config");
    }

    #[test]
    fn case_insensitive_by_default() {
        let m = KeywordMatcher::compile("deploy", false);
        assert_eq!(m.occurrences("Deploy DEPLOY deploy"), 3);
    }

    #[test]
    fn case_sensitive_when_requested() {
        let m = KeywordMatcher::compile("Deploy", true);
        assert_eq!(m.occurrences("Deploy deploy DEPLOY"), 1);
    }

    #[test]
    fn regex_metacharacters_are_literal() {
        let m = KeywordMatcher::compile("a.b*", false);
        assert_eq!(m.occurrences("a.b* axbb"), 1);
    }

    #[test]
    fn whole_word_label_requires_verbatim_equality() {
        let m = KeywordMatcher::compile("deploy", false);
        assert_eq!(m.kind_of("deploy"), MatchKind::WholeWord);
        assert_eq!(m.kind_of("Deploy"), MatchKind::Partial);
    }

    #[test]
    fn span_text_preserves_original_casing() {
        let m = KeywordMatcher::compile("deploy", false);
        let spans = m.find_spans("Deploy now");
        assert_eq!(spans[0].text, "Deploy");
    }

    #[test]
    fn unicode_keywords_match() {
        let m = KeywordMatcher::compile("部署", false);
        let spans = m.find_spans("先部署再验证，部署两次");
        assert_eq!(spans.len(), 2);
    }
}
