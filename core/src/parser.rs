//! Splits a stream of concatenated `<DOC>` records into [`Document`]s.
//!
//! The parser is line oriented. Markers are recognised anywhere on a line, the
//! way the archive lays them out (one marker per line, content in between).

use crate::document::{display_date, docno_date, find_docno, strip_markup, Document};
use crate::error::{Error, Result};
use crate::DocId;
use flate2::read::MultiGzDecoder;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

const DOC_OPEN: &str = "<DOC>";
const DOC_CLOSE: &str = "</DOC>";
const DOCNO_OPEN: &str = "<DOCNO>";
const HEADLINE_OPEN: &str = "<HEADLINE>";
const HEADLINE_CLOSE: &str = "</HEADLINE>";
const P_OPEN: &str = "<P>";
const P_CLOSE: &str = "</P>";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    OutsideDoc,
    Accumulating,
    AccumulatingHeadline,
}

pub struct CorpusParser<R> {
    reader: R,
    state: State,
    line_no: usize,
    next_id: DocId,
    raw: String,
    headline: String,
    docno: Option<(String, String)>,
    done: bool,
}

/// Open an archive for parsing. `.gz` files are decompressed on the fly
/// (concatenated gzip members are accepted); anything else is read as plain text.
pub fn open_corpus(path: &Path) -> Result<CorpusParser<Box<dyn BufRead>>> {
    if !path.exists() {
        return Err(Error::MissingArtifact { path: path.to_path_buf() });
    }
    let file = File::open(path)?;
    let reader: Box<dyn BufRead> = if path.extension().and_then(|s| s.to_str()) == Some("gz") {
        Box::new(BufReader::new(MultiGzDecoder::new(file)))
    } else {
        Box::new(BufReader::new(file))
    };
    Ok(CorpusParser::new(reader))
}

impl<R: BufRead> CorpusParser<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            state: State::OutsideDoc,
            line_no: 0,
            next_id: 0,
            raw: String::new(),
            headline: String::new(),
            docno: None,
            done: false,
        }
    }

    fn next_document(&mut self) -> Result<Option<Document>> {
        let mut line = String::new();
        loop {
            line.clear();
            if self.reader.read_line(&mut line)? == 0 {
                if self.state != State::OutsideDoc {
                    return Err(Error::UnterminatedDocument);
                }
                return Ok(None);
            }
            self.line_no += 1;

            if self.state == State::OutsideDoc {
                if !line.contains(DOC_OPEN) {
                    continue;
                }
                self.state = State::Accumulating;
                self.raw.clear();
                self.headline.clear();
                self.docno = None;
            }
            self.raw.push_str(&line);

            if line.contains(HEADLINE_OPEN) {
                self.state = State::AccumulatingHeadline;
            }
            if self.state == State::AccumulatingHeadline && !line.contains(P_OPEN) && !line.contains(P_CLOSE) {
                self.headline.push_str(line.trim());
                self.headline.push(' ');
            }
            if line.contains(HEADLINE_CLOSE) {
                self.state = State::Accumulating;
            }
            if line.contains(DOCNO_OPEN) {
                self.docno = Some(self.read_docno(&line)?);
            }
            if line.contains(DOC_CLOSE) {
                return self.emit().map(Some);
            }
        }
    }

    fn read_docno(&self, line: &str) -> Result<(String, String)> {
        let malformed = || Error::MalformedDocno { line: self.line_no, text: line.trim().to_string() };
        let docno = find_docno(line).ok_or_else(malformed)?;
        let date = docno_date(docno).ok_or_else(malformed)?;
        Ok((docno.to_string(), display_date(date)))
    }

    fn emit(&mut self) -> Result<Document> {
        let (docno, date) = self.docno.take().ok_or(Error::MissingDocno { line: self.line_no })?;
        let internal_id = self.next_id;
        self.next_id += 1;
        self.state = State::OutsideDoc;
        Ok(Document {
            docno,
            internal_id,
            date,
            headline: strip_markup(&self.headline).trim().to_string(),
            raw: std::mem::take(&mut self.raw),
        })
    }
}

impl<R: BufRead> Iterator for CorpusParser<R> {
    type Item = Result<Document>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.next_document() {
            Ok(Some(doc)) => Some(Ok(doc)),
            Ok(None) => {
                self.done = true;
                None
            }
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn parse(text: &str) -> Vec<Result<Document>> {
        CorpusParser::new(Cursor::new(text.to_string())).collect()
    }

    const TWO_DOCS: &str = "<DOC>
<DOCNO> LA010189-0001 </DOCNO>
<DOCID> 1 </DOCID>
<HEADLINE>
<P>
RUSSIANS <I>SEE</I> HOPE
</P>
<P>
FOR THAW
</P>
</HEADLINE>
<TEXT>
<P>
The talks resumed.
</P>
</TEXT>
</DOC>
<DOC>
<DOCNO> LA010289-0002 </DOCNO>
<TEXT>
<P>
No headline in this one.
</P>
</TEXT>
</DOC>
";

    #[test]
    fn parses_records_in_order() {
        let docs: Vec<Document> = parse(TWO_DOCS).into_iter().map(|d| d.unwrap()).collect();
        assert_eq!(docs.len(), 2);
        assert_eq!(docs[0].docno, "LA010189-0001");
        assert_eq!(docs[0].internal_id, 0);
        assert_eq!(docs[0].date, "January 01, 1989");
        assert_eq!(docs[0].headline, "RUSSIANS SEE HOPE FOR THAW");
        assert!(docs[0].raw.starts_with("<DOC>\n"));
        assert!(docs[0].raw.ends_with("</DOC>\n"));
        assert_eq!(docs[1].docno, "LA010289-0002");
        assert_eq!(docs[1].internal_id, 1);
        assert_eq!(docs[1].date, "January 02, 1989");
        assert_eq!(docs[1].headline, "");
        assert!(!docs[1].raw.contains("LA010189-0001"));
    }

    #[test]
    fn malformed_docno_is_fatal() {
        let text = TWO_DOCS.replace("LA010289-0002", "LA0102-0002");
        let results = parse(&text);
        assert_eq!(results.len(), 2);
        assert!(results[0].is_ok());
        assert!(matches!(results[1], Err(Error::MalformedDocno { line: 19, .. })));
    }

    #[test]
    fn missing_docno_is_fatal() {
        let results = parse("<DOC>\n<TEXT>\nx\n</TEXT>\n</DOC>\n");
        assert_eq!(results.len(), 1);
        assert!(matches!(results[0], Err(Error::MissingDocno { line: 5 })));
    }

    #[test]
    fn truncated_stream_is_fatal() {
        let results = parse("<DOC>\n<DOCNO> LA010189-0001 </DOCNO>\n<TEXT>\n");
        assert!(matches!(results.last(), Some(Err(Error::UnterminatedDocument))));
    }

    #[test]
    fn empty_stream() {
        assert!(parse("").is_empty());
    }
}
