//! Largest-banks table extractor
//!
//! Reads the first `<tbody>` of an HTML page and turns every row with at
//! least three `<td>` cells into a [`BankRow`].

use super::{BankRow, ColumnLabels};
use crate::error::EtlError;
use crate::etl::Extractor;
use eyre::Result;
use html5ever::tendril::StrTendril;
use html5ever::tokenizer::states::RawKind;
use html5ever::tokenizer::{
    BufferQueue, TagKind, Token, TokenSink, TokenSinkResult, Tokenizer, TokenizerOpts,
};
use std::path::PathBuf;
use url::Url;

/// Where the HTML page comes from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HtmlSource {
    /// Fetched with an HTTP GET
    Remote(Url),
    /// Read from disk, for saved snapshots of the page
    Local(PathBuf),
}

impl HtmlSource {
    /// Interpret a location string
    ///
    /// `http`/`https` URLs are fetched, `file://` URLs and anything that
    /// does not parse as a URL are treated as local paths.
    pub fn parse(location: &str) -> Result<Self> {
        match Url::parse(location) {
            Ok(url) if matches!(url.scheme(), "http" | "https") => Ok(Self::Remote(url)),
            Ok(url) if url.scheme() == "file" => url.to_file_path().map(Self::Local).map_err(|_| {
                EtlError::extraction(format!("invalid file URL: {}", location)).into()
            }),
            Ok(url) => Err(EtlError::extraction(format!(
                "unsupported source scheme '{}' in {}",
                url.scheme(),
                location
            ))
            .into()),
            Err(_) => Ok(Self::Local(PathBuf::from(location))),
        }
    }
}

impl std::fmt::Display for HtmlSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Remote(url) => write!(f, "{}", url),
            Self::Local(path) => write!(f, "{}", path.display()),
        }
    }
}

/// Extractor for the largest-banks table
///
/// # Example
/// ```no_run
/// use bankcap::banks::{BankTableExtractor, ColumnLabels, HtmlSource};
/// use bankcap::etl::Extractor;
///
/// # async fn example() -> eyre::Result<()> {
/// let source = HtmlSource::parse("https://en.wikipedia.org/wiki/List_of_largest_banks")?;
/// let extractor = BankTableExtractor::new(source, ColumnLabels::default());
/// let rows = extractor.extract().await?;
/// # Ok(())
/// # }
/// ```
pub struct BankTableExtractor {
    source: HtmlSource,
    labels: ColumnLabels,
}

impl BankTableExtractor {
    pub fn new(source: HtmlSource, labels: ColumnLabels) -> Self {
        Self { source, labels }
    }

    pub fn source(&self) -> &HtmlSource {
        &self.source
    }

    pub fn labels(&self) -> &ColumnLabels {
        &self.labels
    }

    /// Fetch the raw page
    async fn fetch_html(&self) -> Result<String> {
        match &self.source {
            HtmlSource::Remote(url) => {
                log::debug!("Fetching {}", url);
                let response = reqwest::get(url.as_str()).await.map_err(|e| {
                    EtlError::extraction(format!("failed to fetch {}: {}", url, e))
                })?;

                if !response.status().is_success() {
                    let status = response.status();
                    return Err(
                        EtlError::extraction(format!("{} returned {}", url, status)).into()
                    );
                }

                let body = response.text().await.map_err(|e| {
                    EtlError::extraction(format!("failed to read body of {}: {}", url, e))
                })?;
                Ok(body)
            }
            HtmlSource::Local(path) => {
                log::debug!("Reading {}", path.display());
                std::fs::read_to_string(path).map_err(|e| {
                    EtlError::extraction(format!("failed to read {}: {}", path.display(), e))
                        .into()
                })
            }
        }
    }
}

impl Extractor for BankTableExtractor {
    type Item = BankRow;

    async fn extract(&self) -> Result<Vec<Self::Item>> {
        let html = self.fetch_html().await?;
        let rows = parse_bank_table(&html)?;
        log::info!(
            "Extracted {} rows ({}, {}) from {}",
            rows.len(),
            self.labels.name,
            self.labels.market_cap,
            self.source
        );
        Ok(rows)
    }
}

/// Parse bank rows out of the first table body in `html`
///
/// Only a `<tbody>` written in the page counts: the markup is tokenized
/// rather than built into a tree, so tables without an explicit body are
/// skipped instead of receiving an implied one.
///
/// # Errors
/// Fails with [`EtlError::Extraction`] when the page has no `<tbody>` or
/// when no row in it has the three cells needed for a name and a value.
pub fn parse_bank_table(html: &str) -> Result<Vec<BankRow>> {
    let mut input = BufferQueue::default();
    input.push_back(StrTendril::from_slice(html));

    let mut tokenizer = Tokenizer::new(TableBodySink::default(), TokenizerOpts::default());
    let _ = tokenizer.feed(&mut input);
    tokenizer.end();

    let mut sink = tokenizer.sink;
    sink.close_cell();
    if sink.depth.is_none() {
        return Err(EtlError::extraction("no table body found in page").into());
    }

    let rows: Vec<BankRow> = sink.rows.into_iter().filter_map(row_from_cells).collect();

    if rows.is_empty() {
        return Err(EtlError::extraction(
            "first table body has no rows with at least 3 cells",
        )
        .into());
    }

    Ok(rows)
}

fn row_from_cells(cells: Vec<Cell>) -> Option<BankRow> {
    if cells.len() < 3 {
        log::debug!("Skipping row with {} cells", cells.len());
        return None;
    }

    let name = cells[1].text.trim().to_string();
    let market_cap = cells[2]
        .first_fragment
        .as_deref()
        .unwrap_or_default()
        .replace('\n', "");

    Some(BankRow { name, market_cap })
}

/// Text collected from one `<td>`
#[derive(Debug, Default)]
struct Cell {
    /// All text inside the cell, nested elements included
    text: String,
    /// The first uninterrupted run of text, up to the next tag or comment
    first_fragment: Option<String>,
    in_fragment: bool,
}

impl Cell {
    fn push_text(&mut self, chars: &str) {
        self.text.push_str(chars);
        match &mut self.first_fragment {
            None => {
                self.first_fragment = Some(chars.to_string());
                self.in_fragment = true;
            }
            Some(fragment) if self.in_fragment => fragment.push_str(chars),
            Some(_) => {}
        }
    }
}

/// Collects the rows of the first explicit `<tbody>` from a token stream
#[derive(Debug, Default)]
struct TableBodySink {
    /// `<tbody>` nesting depth once the first one has opened
    depth: Option<usize>,
    /// Tables opened inside the body that are still open
    inner_tables: usize,
    done: bool,
    row_open: bool,
    rows: Vec<Vec<Cell>>,
    cell: Option<Cell>,
}

impl TableBodySink {
    fn close_cell(&mut self) {
        if let Some(cell) = self.cell.take()
            && let Some(row) = self.rows.last_mut()
        {
            row.push(cell);
        }
    }

    fn finish(&mut self) {
        self.close_cell();
        self.row_open = false;
        self.done = true;
    }

    fn start_tag(&mut self, name: &str) {
        match name {
            "tbody" => self.depth = Some(self.depth.map_or(1, |d| d + 1)),
            "table" => self.inner_tables += 1,
            "tr" => {
                self.close_cell();
                self.rows.push(Vec::new());
                self.row_open = true;
            }
            "td" => {
                self.close_cell();
                if self.row_open {
                    self.cell = Some(Cell::default());
                }
            }
            "th" => self.close_cell(),
            _ => self.break_fragment(),
        }
    }

    fn end_tag(&mut self, name: &str) {
        match name {
            "tbody" => match self.depth {
                Some(1) => self.finish(),
                Some(d) => self.depth = Some(d - 1),
                None => {}
            },
            "table" if self.inner_tables == 0 => self.finish(),
            "table" => self.inner_tables -= 1,
            "td" => self.close_cell(),
            "tr" => {
                self.close_cell();
                self.row_open = false;
            }
            _ => self.break_fragment(),
        }
    }

    fn break_fragment(&mut self) {
        if let Some(cell) = &mut self.cell {
            cell.in_fragment = false;
        }
    }
}

impl TokenSink for TableBodySink {
    type Handle = ();

    fn process_token(&mut self, token: Token, _line_number: u64) -> TokenSinkResult<()> {
        match token {
            Token::TagToken(tag) => {
                let name: &str = &tag.name;
                match (self.done, self.depth, tag.kind) {
                    (true, _, _) => {}
                    (false, None, TagKind::StartTag) => {
                        if name == "tbody" && !tag.self_closing {
                            self.depth = Some(1);
                        }
                    }
                    (false, None, TagKind::EndTag) => {}
                    (false, Some(_), TagKind::StartTag) => self.start_tag(name),
                    (false, Some(_), TagKind::EndTag) => self.end_tag(name),
                }

                // Markup inside scripts and styles is text, not tags
                if tag.kind == TagKind::StartTag && !tag.self_closing {
                    match name {
                        "script" => return TokenSinkResult::RawData(RawKind::ScriptData),
                        "style" | "xmp" | "iframe" | "noembed" | "noframes" => {
                            return TokenSinkResult::RawData(RawKind::Rawtext);
                        }
                        "title" | "textarea" => return TokenSinkResult::RawData(RawKind::Rcdata),
                        _ => {}
                    }
                }
            }
            Token::CharacterTokens(chars) => {
                if let Some(cell) = &mut self.cell {
                    cell.push_text(&chars);
                }
            }
            Token::CommentToken(_) => self.break_fragment(),
            _ => {}
        }
        TokenSinkResult::Continue
    }
}
