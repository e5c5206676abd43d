//! Text-run extraction from raw WordprocessingML markup.
//!
//! A fragment is one `<w:t>` span. Scanning is deliberately dumb: no XML parsing, no
//! entity decoding, just the delimiter rule applied left to right. Every scan of the same
//! markup yields the same fragments with the same 1-based indices.

use std::ops::Range;
use std::sync::LazyLock;

use regex::{CaptureMatches, Regex};
use serde::Serialize;

/// Closing delimiter of a text run.
pub const RUN_CLOSE: &str = "</w:t>";

/// Opening tag emitted for rewritten runs whose text starts or ends with whitespace.
pub const RUN_OPEN_PRESERVE: &str = r#"<w:t xml:space="preserve">"#;

/// `<w:t>` or `<w:t attr="…">`, but not `<w:t/>`, `<w:tab/>` or `<w:tbl>`.
static TEXT_RUN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)(<w:t(?:\s[^>]*[^/>])?\s*>)(.*?)</w:t>").expect("text run pattern is valid")
});

/// One text-bearing span of the markup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Fragment<'a> {
    /// 1-based position among all text runs of the markup.
    pub index: usize,
    /// Character data between the delimiters, entities left encoded.
    pub text: &'a str,
    /// The opening tag as written, attributes included.
    #[serde(skip)]
    pub open_tag: &'a str,
    /// Byte range of the whole span, delimiters included.
    #[serde(skip)]
    pub span: Range<usize>,
}

/// Lazy iterator over the fragments of a markup string.
pub struct Fragments<'a> {
    captures: CaptureMatches<'static, 'a>,
    last_index: usize,
}

impl<'a> Iterator for Fragments<'a> {
    type Item = Fragment<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let caps = self.captures.next()?;
        let (whole, open_tag, text) = (caps.get(0)?, caps.get(1)?, caps.get(2)?);
        self.last_index += 1;
        Some(Fragment {
            index: self.last_index,
            text: text.as_str(),
            open_tag: open_tag.as_str(),
            span: whole.range(),
        })
    }
}

/// Scan `markup` for text runs. Restartable: call again to get a fresh pass.
pub fn scan(markup: &str) -> Fragments<'_> {
    Fragments {
        captures: TEXT_RUN.captures_iter(markup),
        last_index: 0,
    }
}

/// Texts of all fragments, in order.
pub fn texts(markup: &str) -> Vec<&str> {
    scan(markup).map(|fragment| fragment.text).collect()
}
