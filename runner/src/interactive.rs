//! Terminal query loop: top ten with summaries, then drill into a result.

use anyhow::Result;
use newsdex_core::summary::{summarize_document, DEFAULT_TOP_N};
use newsdex_core::{Bm25Params, SearchIndex};
use std::io::{BufRead, Write};
use std::time::Instant;

const PAGE: usize = 10;
const FALLBACK_HEADLINE_CHARS: usize = 50;

struct Hit {
    docno: String,
    headline: String,
    date: String,
    summary: String,
    raw: String,
}

/// Stored headline, or the start of the summary when the record has none.
fn display_headline(headline: Option<&str>, summary: &str) -> String {
    match headline {
        Some(h) => h.to_string(),
        None => format!("{}...", summary.chars().take(FALLBACK_HEADLINE_CHARS).collect::<String>()),
    }
}

fn retrieve(index: &SearchIndex, query: &str, params: Bm25Params) -> Result<Vec<Hit>> {
    let store = index.store();
    let mut hits = Vec::new();
    for scored in index.top(query, params, PAGE) {
        let (raw, meta) = store.get(&scored.docno)?;
        let summary = summarize_document(query, &raw, DEFAULT_TOP_N);
        hits.push(Hit {
            headline: display_headline(meta.headline(), &summary),
            docno: scored.docno,
            date: meta.date,
            summary,
            raw,
        });
    }
    Ok(hits)
}

fn read_trimmed<R: BufRead>(input: &mut R) -> Result<Option<String>> {
    let mut line = String::new();
    if input.read_line(&mut line)? == 0 {
        return Ok(None);
    }
    Ok(Some(line.trim().to_string()))
}

/// Runs until `Q` or end of input.
pub fn session<R: BufRead, W: Write>(index: &SearchIndex, params: Bm25Params, mut input: R, mut out: W) -> Result<()> {
    loop {
        write!(out, "Enter a query: ")?;
        out.flush()?;
        let Some(query) = read_trimmed(&mut input)? else { return Ok(()) };
        if query.is_empty() {
            continue;
        }

        let start = Instant::now();
        let hits = retrieve(index, &query, params)?;
        let took = start.elapsed();

        writeln!(out)?;
        for (i, hit) in hits.iter().enumerate() {
            writeln!(out, "{}. {} ({})", i + 1, hit.headline, hit.date)?;
            writeln!(out, "{} ({})", hit.summary, hit.docno)?;
            writeln!(out)?;
        }
        if hits.is_empty() {
            writeln!(out, "No documents matched.")?;
        }
        writeln!(out, "Retrieval took {:.3} seconds.", took.as_secs_f64())?;

        loop {
            write!(out, "Enter a rank to view a document, N for a new query, or Q to quit: ")?;
            out.flush()?;
            let Some(choice) = read_trimmed(&mut input)? else { return Ok(()) };
            match choice.as_str() {
                "Q" | "q" => return Ok(()),
                "N" | "n" => break,
                other => match other.parse::<usize>() {
                    Ok(rank) if (1..=hits.len()).contains(&rank) => {
                        writeln!(out, "{}", hits[rank - 1].raw)?;
                    }
                    _ => writeln!(out, "Please enter a rank between 1 and {}, N or Q.", hits.len())?,
                },
            }
        }
    }
}
