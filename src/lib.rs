//! Run-aware text replacement for DOCX packages.
//!
//! Load a package with [`DocxPackage`], start a [`DocxHandler`] session with
//! [`DocxPackage::editable`], edit, then write the session back out. The fragment engine
//! itself lives in `docx-replace-core` and is re-exported here.

pub mod docx_handler;
pub mod escape;
pub mod package;

pub use docx_handler::DocxHandler;
pub use docx_replace_core::{
    apply, find_next, plan, replace_fragments, scan, texts, Fragment, MatchEntry, MatchRecord,
    OccurrencePolicy, Rewrite,
};
pub use escape::{escape_attribute, escape_text, EscapeError};
pub use package::{media_slot, DocxPackage, Part, PartRole};
