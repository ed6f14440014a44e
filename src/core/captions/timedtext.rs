//! Timed-Text Caption Document Parser
//!
//! Parses the XML timed-text documents the streaming host serves for its
//! caption tracks into a normalized, time-ordered [`CueList`].
//!
//! The contract is best-effort: this function never fails. A structurally
//! invalid document yields an empty list; a malformed paragraph is skipped
//! without affecting its siblings. Logging is the only side effect.

use std::sync::OnceLock;

use regex::Regex;
use tracing::{debug, warn};

use super::models::{Cue, CueList};
use super::xml::{self, Element, Node};
use crate::core::TimeMs;

/// Default tick rate when the document does not declare one (ticks/second)
pub const DEFAULT_TICK_RATE: u64 = 10_000_000;

/// Parses a timed-text document into a cue list plus detected language.
///
/// Timestamps are `begin`/`end` attributes in ticks (`"52500000t"`),
/// converted to milliseconds using the document's declared tick rate.
pub fn parse_timed_text(document: &str) -> CueList {
    let root = match xml::parse(document) {
        Ok(root) => root,
        Err(error) => {
            warn!(%error, "Caption document is not valid markup, returning no cues");
            return CueList::empty();
        }
    };

    let language = root.attr("lang").map(normalize_language);
    let tick_rate = root
        .attr("tickRate")
        .and_then(|v| v.trim().parse::<u64>().ok())
        .filter(|rate| *rate > 0)
        .unwrap_or(DEFAULT_TICK_RATE);

    let mut paragraphs = Vec::new();
    collect_paragraphs(&root, &mut paragraphs);

    let mut cues = Vec::new();
    let mut skipped = 0usize;
    for paragraph in paragraphs {
        let timing = paragraph
            .attr("begin")
            .and_then(parse_ticks)
            .zip(paragraph.attr("end").and_then(parse_ticks));
        let Some((begin_ticks, end_ticks)) = timing else {
            skipped += 1;
            continue;
        };

        let start_ms = ticks_to_ms(begin_ticks, tick_rate);
        let end_ms = ticks_to_ms(end_ticks, tick_rate);
        if end_ms <= start_ms {
            skipped += 1;
            continue;
        }

        let text = normalize_text(&extract_text(paragraph));
        if text.is_empty() {
            skipped += 1;
            continue;
        }

        cues.push(Cue::new(start_ms, end_ms, &text));
    }

    if skipped > 0 {
        debug!(skipped, "Skipped caption paragraphs with missing timing or empty text");
    }

    CueList::new(language, cues)
}

/// Normalizes a document language tag.
///
/// The host platform labels US-English documents with a bare "en" while its
/// track list reports "en-US"; everything else passes through verbatim.
pub fn normalize_language(tag: &str) -> String {
    if tag == "en" {
        "en-US".to_string()
    } else {
        tag.to_string()
    }
}

// =============================================================================
// Timing
// =============================================================================

/// Parses a tick-denominated timestamp attribute ("52500000t")
fn parse_ticks(value: &str) -> Option<u64> {
    value.trim().strip_suffix('t')?.parse::<u64>().ok()
}

/// Converts ticks to milliseconds with rational rounding (half away from zero)
fn ticks_to_ms(ticks: u64, tick_rate: u64) -> TimeMs {
    ((ticks as u128 * 1000 + tick_rate as u128 / 2) / tick_rate as u128) as TimeMs
}

// =============================================================================
// Paragraphs & Text
// =============================================================================

/// Collects every paragraph-level element in document order
fn collect_paragraphs<'a>(element: &'a Element, out: &mut Vec<&'a Element>) {
    if element.local_name() == "p" {
        out.push(element);
        return;
    }
    for child in &element.children {
        if let Node::Element(child_element) = child {
            collect_paragraphs(child_element, out);
        }
    }
}

/// Extracts caption text by a depth-first walk: text nodes contribute their
/// content, explicit line breaks contribute "\n", styling wrappers only
/// their descendants.
fn extract_text(element: &Element) -> String {
    let mut text = String::new();
    for child in &element.children {
        match child {
            Node::Text(run) => text.push_str(run),
            Node::Element(child_element) if child_element.local_name() == "br" => {
                text.push('\n');
            }
            Node::Element(child_element) => text.push_str(&extract_text(child_element)),
        }
    }
    text
}

fn normalize_text(raw: &str) -> String {
    static HORIZONTAL_WS: OnceLock<Regex> = OnceLock::new();
    static AROUND_NEWLINE: OnceLock<Regex> = OnceLock::new();
    static NEWLINE_RUNS: OnceLock<Regex> = OnceLock::new();

    let horizontal_ws = HORIZONTAL_WS.get_or_init(|| Regex::new(r"[ \t]+").unwrap());
    let around_newline = AROUND_NEWLINE.get_or_init(|| Regex::new(r"[ \t]*\n[ \t]*").unwrap());
    let newline_runs = NEWLINE_RUNS.get_or_init(|| Regex::new(r"\n{3,}").unwrap());

    let text = raw.replace('\r', "");
    let text = horizontal_ws.replace_all(&text, " ");
    let text = around_newline.replace_all(&text, "\n");
    let text = newline_runs.replace_all(&text, "\n\n");
    text.trim().to_string()
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    const TWO_CUE_DOC: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<tt xml:lang="en" ttp:tickRate="10000000">
  <body>
    <div>
      <p begin="0t" end="30000000t">Hello</p>
      <p begin="30000000t" end="60000000t">World</p>
    </div>
  </body>
</tt>"#;

    #[test]
    fn test_parse_two_cue_document() {
        let list = parse_timed_text(TWO_CUE_DOC);

        assert_eq!(list.language, Some("en-US".to_string()));
        assert_eq!(
            list.cues,
            vec![Cue::new(0, 3000, "Hello"), Cue::new(3000, 6000, "World")]
        );
    }

    #[test]
    fn test_tick_conversion_is_rationally_rounded() {
        // 52_500_000 ticks at 10M ticks/sec is exactly 5250ms, not 5249.999.
        assert_eq!(ticks_to_ms(52_500_000, 10_000_000), 5250);
        assert_eq!(ticks_to_ms(1, 10_000_000), 0);
        assert_eq!(ticks_to_ms(5_000, 10_000_000), 1);
    }

    #[test]
    fn test_custom_tick_rate() {
        let doc = r#"<tt ttp:tickRate="1000"><body><p begin="1500t" end="3000t">x</p></body></tt>"#;
        let list = parse_timed_text(doc);
        assert_eq!(list.cues, vec![Cue::new(1500, 3000, "x")]);
    }

    #[test]
    fn test_bare_en_normalized_to_en_us() {
        assert_eq!(normalize_language("en"), "en-US");
        assert_eq!(normalize_language("en-GB"), "en-GB");
        assert_eq!(normalize_language("de"), "de");
    }

    #[test]
    fn test_missing_language_is_none() {
        let doc = r#"<tt><body><p begin="0t" end="10000000t">x</p></body></tt>"#;
        assert_eq!(parse_timed_text(doc).language, None);
    }

    #[test]
    fn test_line_break_element_becomes_newline() {
        let doc = r#"<tt><body><p begin="0t" end="10000000t">first line<br/>second line</p></body></tt>"#;
        let list = parse_timed_text(doc);
        assert_eq!(list.cues[0].text, "first line\nsecond line");
    }

    #[test]
    fn test_styling_wrappers_contribute_descendants_only() {
        let doc = r#"<tt><body><p begin="0t" end="10000000t"><span style="i">Hello</span> there</p></body></tt>"#;
        let list = parse_timed_text(doc);
        assert_eq!(list.cues[0].text, "Hello there");
    }

    #[test]
    fn test_whitespace_normalization() {
        let doc = "<tt><body><p begin=\"0t\" end=\"10000000t\">  a \t b \r\n  c  <br/><br/><br/>d  </p></body></tt>";
        let list = parse_timed_text(doc);
        assert_eq!(list.cues[0].text, "a b\nc\n\nd");
    }

    #[test]
    fn test_malformed_paragraph_skipped_not_fatal() {
        let doc = r#"<tt><body>
            <p begin="oops" end="10000000t">bad begin</p>
            <p begin="0t">missing end</p>
            <p begin="0t" end="10000000t">good</p>
        </body></tt>"#;
        let list = parse_timed_text(doc);
        assert_eq!(list.len(), 1);
        assert_eq!(list.cues[0].text, "good");
    }

    #[test]
    fn test_inverted_timing_skipped() {
        let doc = r#"<tt><body><p begin="20000000t" end="10000000t">x</p></body></tt>"#;
        assert!(parse_timed_text(doc).is_empty());
    }

    #[test]
    fn test_empty_text_discarded() {
        let doc = r#"<tt><body><p begin="0t" end="10000000t">   </p></body></tt>"#;
        assert!(parse_timed_text(doc).is_empty());
    }

    #[test]
    fn test_invalid_document_yields_empty_list() {
        let list = parse_timed_text("this is not markup");
        assert!(list.is_empty());
        assert_eq!(list.language, None);
    }

    #[test]
    fn test_cues_sorted_by_start_time() {
        let doc = r#"<tt><body>
            <p begin="50000000t" end="60000000t">later</p>
            <p begin="0t" end="10000000t">earlier</p>
        </body></tt>"#;
        let list = parse_timed_text(doc);
        assert_eq!(list.cues[0].text, "earlier");
        assert_eq!(list.cues[1].text, "later");
        assert!(list.cues.windows(2).all(|w| w[0].start_ms <= w[1].start_ms));
    }

    #[test]
    fn test_no_cue_has_inverted_range() {
        let list = parse_timed_text(TWO_CUE_DOC);
        assert!(list.cues.iter().all(|c| c.end_ms > c.start_ms));
    }
}
