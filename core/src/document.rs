use crate::DocId;
use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::path::PathBuf;
use time::macros::format_description;
use time::{Date, Month};

lazy_static! {
    static ref DOCNO_RE: Regex = Regex::new(r"[A-Za-z]{2}[0-9]{6}-[0-9]{4}").expect("valid regex");
    static ref DOCNO_EXACT_RE: Regex = Regex::new(r"^[A-Za-z]{2}[0-9]{6}-[0-9]{4}$").expect("valid regex");
    static ref TAG_RE: Regex = Regex::new(r"<[^>]+>").expect("valid regex");
    static ref ZONES_RE: Regex = Regex::new(
        r"(?s)<TEXT>(.+?)</TEXT>|<HEADLINE>(.+?)</HEADLINE>|<GRAPHIC>(.+?)</GRAPHIC>"
    )
    .expect("valid regex");
    static ref BODY_RE: Regex = Regex::new(r"(?s)<TEXT>(.*?)</TEXT>").expect("valid regex");
}

/// One record of the archive. Immutable once the parser emits it.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub docno: String,
    pub internal_id: DocId,
    /// Display form, e.g. `January 01, 1989`.
    pub date: String,
    /// Empty when the record has no headline region.
    pub headline: String,
    /// The full record, markers included.
    pub raw: String,
}

impl Document {
    pub fn meta(&self) -> DocMeta {
        DocMeta {
            docno: self.docno.clone(),
            internal_id: self.internal_id,
            date: self.date.clone(),
            headline: self.headline.clone(),
        }
    }

    /// Markup-free text of the zones that get indexed: body, headline and graphic captions.
    pub fn indexable_zones(&self) -> Vec<String> {
        indexable_zones(&self.raw)
    }
}

/// Stored alongside each raw document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocMeta {
    pub docno: String,
    #[serde(rename = "internal id")]
    pub internal_id: DocId,
    pub date: String,
    pub headline: String,
}

impl DocMeta {
    pub fn headline(&self) -> Option<&str> {
        let h = self.headline.trim();
        if h.is_empty() { None } else { Some(h) }
    }
}

/// First docno-shaped substring of `line`.
pub fn find_docno(line: &str) -> Option<&str> {
    DOCNO_RE.find(line).map(|m| m.as_str())
}

pub fn is_docno(s: &str) -> bool {
    DOCNO_EXACT_RE.is_match(s)
}

/// Publication date encoded as `mmddyy` after the two-letter prefix.
/// Two-digit years always land in the 1900s.
pub fn docno_date(docno: &str) -> Option<Date> {
    if !is_docno(docno) {
        return None;
    }
    let field = |range: std::ops::Range<usize>| docno[range].parse::<u8>().ok();
    let month = Month::try_from(field(2..4)?).ok()?;
    let day = field(4..6)?;
    let year = 1900 + i32::from(field(6..8)?);
    Date::from_calendar_date(year, month, day).ok()
}

pub fn display_date(date: Date) -> String {
    date.format(format_description!("[month repr:long] [day], [year]"))
        .unwrap_or_else(|_| "".into())
}

/// `yy/mm/dd` directory a document lives under in the document store.
pub fn date_dir(docno: &str) -> Option<PathBuf> {
    if !is_docno(docno) {
        return None;
    }
    Some(PathBuf::from(&docno[6..8]).join(&docno[2..4]).join(&docno[4..6]))
}

pub fn strip_markup(text: &str) -> Cow<'_, str> {
    TAG_RE.replace_all(text, "")
}

pub fn indexable_zones(raw: &str) -> Vec<String> {
    let mut zones = Vec::new();
    for caps in ZONES_RE.captures_iter(raw) {
        for group in caps.iter().skip(1).flatten() {
            zones.push(strip_markup(group.as_str().trim()).into_owned());
        }
    }
    zones
}

/// Content of the first `<TEXT>` region, trimmed; empty if the record has none.
pub fn body_text(raw: &str) -> &str {
    BODY_RE
        .captures(raw)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().trim())
        .unwrap_or("")
}
