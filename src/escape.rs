//! Escaping of user text before it is matched against, or spliced into, raw part markup.

use quick_xml::escape::{escape, partial_escape};
use thiserror::Error;

/// Markup emitted for a CRLF line break inside run text.
pub const LINE_BREAK: &str = "<w:br/>";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EscapeError {
    #[error("Character {ch:?} at byte {offset} is not allowed in XML")]
    InvalidChar { ch: char, offset: usize },
}

/// Escape text for use as run character data.
///
/// `&`, `<` and `>` become entities, `"\r\n"` becomes a `<w:br/>` break and lone control
/// whitespace becomes a numeric character reference.
pub fn escape_text(text: &str) -> Result<String, EscapeError> {
    check_chars(text)?;
    let lines: Vec<String> = text
        .split("\r\n")
        .map(|line| control_refs(&partial_escape(line)))
        .collect();
    Ok(lines.join(LINE_BREAK))
}

/// Escape text for use inside a double- or single-quoted attribute value.
pub fn escape_attribute(value: &str) -> Result<String, EscapeError> {
    check_chars(value)?;
    Ok(control_refs(&escape(value)))
}

fn check_chars(text: &str) -> Result<(), EscapeError> {
    match text.char_indices().find(|&(_, ch)| !is_xml_char(ch)) {
        Some((offset, ch)) => Err(EscapeError::InvalidChar { ch, offset }),
        None => Ok(()),
    }
}

/// XML 1.0 `Char` production.
fn is_xml_char(ch: char) -> bool {
    matches!(
        ch,
        '\t' | '\n' | '\r'
            | '\u{20}'..='\u{D7FF}'
            | '\u{E000}'..='\u{FFFD}'
            | '\u{10000}'..='\u{10FFFF}'
    )
}

fn control_refs(text: &str) -> String {
    text.replace('\t', "&#x9;")
        .replace('\n', "&#xA;")
        .replace('\r', "&#xD;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_text_entities() {
        assert_eq!(escape_text("Tom & Jerry <3").unwrap(), "Tom &amp; Jerry &lt;3");
        assert_eq!(escape_text(r#"say "hi""#).unwrap(), r#"say "hi""#);
        assert_eq!(escape_text("it's").unwrap(), "it's");
    }

    #[test]
    fn test_line_breaks() {
        assert_eq!(escape_text("one\r\ntwo").unwrap(), "one<w:br/>two");
        assert_eq!(escape_text("a\tb\nc").unwrap(), "a&#x9;b&#xA;c");
    }

    #[test]
    fn test_attribute_quotes() {
        assert_eq!(
            escape_attribute(r#"https://x.test/?a=1&b="2""#).unwrap(),
            "https://x.test/?a=1&amp;b=&quot;2&quot;"
        );
        assert_eq!(escape_attribute("it's").unwrap(), "it&apos;s");
    }

    #[test]
    fn test_rejects_control_characters() {
        let err = escape_text("ok\u{1}").unwrap_err();
        assert_eq!(err, EscapeError::InvalidChar { ch: '\u{1}', offset: 2 });
        assert!(err.to_string().contains("not allowed"));
    }

    #[test]
    fn test_plain_text_unchanged() {
        assert_eq!(escape_text("Übergröße 🚀").unwrap(), "Übergröße 🚀");
    }
}
