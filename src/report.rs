use serde::Serialize;
use serde_json::ser::{Formatter, PrettyFormatter};
use std::fmt;
use std::io;

use crate::search::SearchResponse;

pub const STAR_DIVIDER: &str = "****************************************************************************************************";
pub const DASH_DIVIDER: &str = "----------------------------------------------------------------------------------------------------";
pub const NO_RESULTS: &str = "No results found.";

/// One fetched page, ranked by its position in the search results.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedPage {
    pub rank: usize,
    pub url: String,
    pub text: String,
}

/// The assembled answer for one query.
#[derive(Debug, Clone)]
pub struct Report {
    query: String,
    search: SearchResponse,
    max_results: usize,
    pages: Vec<ExtractedPage>,
}

impl Report {
    /// `pages` must already be in selection order; ranks are assigned from it.
    pub fn new<I>(query: &str, search: SearchResponse, max_results: usize, pages: I) -> Self
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let pages = pages
            .into_iter()
            .enumerate()
            .map(|(idx, (url, text))| ExtractedPage {
                rank: idx + 1,
                url,
                text,
            })
            .collect();
        Self {
            query: query.to_string(),
            search,
            max_results,
            pages,
        }
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn search(&self) -> &SearchResponse {
        &self.search
    }

    pub fn pages(&self) -> &[ExtractedPage] {
        &self.pages
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{STAR_DIVIDER}")?;
        writeln!(f, "SEARCH RESULTS PAGE FOR QUERY: \"{}\"", self.query)?;
        writeln!(f, "{STAR_DIVIDER}")?;
        writeln!(f, "{}", pretty_json(self.search.payload()))?;
        writeln!(f)?;
        writeln!(f, "{STAR_DIVIDER}")?;
        writeln!(
            f,
            "FETCHED CONTENT FOR TOP {} SEARCH RESULTS",
            self.max_results
        )?;
        writeln!(f, "{STAR_DIVIDER}")?;
        for page in &self.pages {
            writeln!(f, "{DASH_DIVIDER}")?;
            writeln!(f, "{}. {}", page.rank, page.url)?;
            writeln!(f, "{DASH_DIVIDER}")?;
            writeln!(f, "{}", page.text.trim())?;
        }
        Ok(())
    }
}

/// What a request produces: either nothing worth fetching, or a report.
#[derive(Debug, Clone)]
pub enum Outcome {
    NoResults,
    Report(Report),
}

impl Outcome {
    pub fn into_text(self) -> String {
        match self {
            Outcome::NoResults => NO_RESULTS.to_string(),
            Outcome::Report(report) => report.to_string(),
        }
    }
}

/// Two-space indented JSON with everything outside printable ASCII escaped
/// as `\uXXXX`.
pub fn pretty_json<T: Serialize + ?Sized>(value: &T) -> String {
    let mut buf = Vec::new();
    let mut ser = serde_json::Serializer::with_formatter(&mut buf, AsciiPrettyFormatter::new());
    if let Err(e) = value.serialize(&mut ser) {
        tracing::warn!(error = %e, "failed to render search payload");
        return "{}".to_string();
    }
    String::from_utf8_lossy(&buf).into_owned()
}

struct AsciiPrettyFormatter<'a> {
    inner: PrettyFormatter<'a>,
}

impl AsciiPrettyFormatter<'_> {
    fn new() -> Self {
        Self {
            inner: PrettyFormatter::with_indent(b"  "),
        }
    }
}

impl Formatter for AsciiPrettyFormatter<'_> {
    fn begin_array<W: ?Sized + io::Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.inner.begin_array(writer)
    }

    fn end_array<W: ?Sized + io::Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.inner.end_array(writer)
    }

    fn begin_array_value<W: ?Sized + io::Write>(
        &mut self,
        writer: &mut W,
        first: bool,
    ) -> io::Result<()> {
        self.inner.begin_array_value(writer, first)
    }

    fn end_array_value<W: ?Sized + io::Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.inner.end_array_value(writer)
    }

    fn begin_object<W: ?Sized + io::Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.inner.begin_object(writer)
    }

    fn end_object<W: ?Sized + io::Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.inner.end_object(writer)
    }

    fn begin_object_key<W: ?Sized + io::Write>(
        &mut self,
        writer: &mut W,
        first: bool,
    ) -> io::Result<()> {
        self.inner.begin_object_key(writer, first)
    }

    fn begin_object_value<W: ?Sized + io::Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.inner.begin_object_value(writer)
    }

    fn end_object_value<W: ?Sized + io::Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.inner.end_object_value(writer)
    }

    fn write_string_fragment<W: ?Sized + io::Write>(
        &mut self,
        writer: &mut W,
        fragment: &str,
    ) -> io::Result<()> {
        for c in fragment.chars() {
            if (' '..='~').contains(&c) {
                writer.write_all(&[c as u8])?;
            } else {
                let mut units = [0u16; 2];
                for unit in c.encode_utf16(&mut units) {
                    write!(writer, "\\u{:04x}", unit)?;
                }
            }
        }
        Ok(())
    }
}
