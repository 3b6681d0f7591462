use super::{FeedError, PaperRecord};
use chrono::NaiveDate;
use quick_xml::events::Event;
use quick_xml::name::{Namespace, ResolveResult};
use quick_xml::reader::NsReader;

const ATOM_NS: &[u8] = b"http://www.w3.org/2005/Atom";
pub const USER_AGENT: &str = "arxiv-abstracts/0.1";

pub struct ArxivClient {
    client: reqwest::Client,
    feed_url: String,
}

impl ArxivClient {
    pub fn new(feed_url: impl Into<String>) -> reqwest::Result<Self> {
        Ok(Self {
            client: reqwest::Client::builder().user_agent(USER_AGENT).build()?,
            feed_url: feed_url.into(),
        })
    }

    /// The underlying HTTP client, shared with the abstract-page fetcher.
    pub fn http(&self) -> reqwest::Client {
        self.client.clone()
    }

    /// Fetch the most recently submitted papers in `category`, newest first.
    /// Any transport, status, or parse failure fails the whole fetch.
    pub async fn fetch_recent(
        &self,
        category: &str,
        max_results: u32,
    ) -> Result<Vec<PaperRecord>, FeedError> {
        let query = [
            ("search_query", format!("cat:{}", category)),
            ("start", "0".to_string()),
            ("max_results", max_results.to_string()),
            ("sortBy", "submittedDate".to_string()),
            ("sortOrder", "descending".to_string()),
        ];
        let body = self
            .client
            .get(&self.feed_url)
            .query(&query)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;
        let papers = parse_atom_feed(&body)?;
        tracing::info!("Fetched {} records for category {}", papers.len(), category);
        Ok(papers)
    }
}

#[derive(Clone, Copy, PartialEq)]
enum Field {
    None,
    Id,
    Title,
    Published,
    AuthorName,
}

/// Collapse every whitespace run (newlines included) to one space and trim.
pub fn normalize_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn calendar_date(published: &str) -> Result<String, FeedError> {
    let date = published
        .trim()
        .get(..10)
        .ok_or_else(|| FeedError::Malformed(format!("short published date {:?}", published)))?;
    NaiveDate::parse_from_str(date, "%Y-%m-%d")
        .map_err(|e| FeedError::Malformed(format!("bad published date {:?}: {}", date, e)))?;
    Ok(date.to_string())
}

fn is_atom(ns: &ResolveResult) -> bool {
    matches!(ns, ResolveResult::Bound(Namespace(uri)) if *uri == ATOM_NS)
}

fn parse_atom_feed(xml: &str) -> Result<Vec<PaperRecord>, FeedError> {
    let mut reader = NsReader::from_str(xml);
    let mut papers = Vec::new();
    let mut saw_feed = false;
    let mut in_feed = false;
    let mut in_entry = false;
    let mut in_author = false;
    let mut field = Field::None;
    let mut id = String::new();
    let mut title = String::new();
    let mut published = String::new();
    let mut author_name = String::new();
    let mut authors: Vec<String> = Vec::new();
    let mut buf = Vec::new();

    loop {
        match reader.read_resolved_event_into(&mut buf) {
            Ok((ns, Event::Start(e))) if is_atom(&ns) => {
                match e.local_name().as_ref() {
                    b"feed" => {
                        saw_feed = true;
                        in_feed = true;
                    }
                    b"entry" if in_feed => {
                        in_entry = true;
                        id.clear();
                        title.clear();
                        published.clear();
                        authors.clear();
                    }
                    b"author" if in_entry => {
                        in_author = true;
                        author_name.clear();
                    }
                    b"id" if in_entry && !in_author => field = Field::Id,
                    b"title" if in_entry && !in_author => field = Field::Title,
                    b"published" if in_entry && !in_author => field = Field::Published,
                    b"name" if in_author => field = Field::AuthorName,
                    _ => {}
                }
            }
            Ok((_, Event::Text(e))) if field != Field::None => {
                let text = e
                    .unescape()
                    .map_err(|e| FeedError::Malformed(format!("bad text content: {}", e)))?;
                push_field(field, &text, &mut id, &mut title, &mut published, &mut author_name);
            }
            Ok((_, Event::CData(e))) if field != Field::None => {
                let text = String::from_utf8_lossy(&e).into_owned();
                push_field(field, &text, &mut id, &mut title, &mut published, &mut author_name);
            }
            Ok((ns, Event::End(e))) if is_atom(&ns) => {
                match e.local_name().as_ref() {
                    b"entry" if in_entry => {
                        in_entry = false;
                        papers.push(finish_entry(&id, &title, &published, &authors)?);
                    }
                    b"author" if in_author => {
                        in_author = false;
                        authors.push(normalize_whitespace(&author_name));
                    }
                    b"feed" => in_feed = false,
                    _ => {}
                }
                field = Field::None;
            }
            Ok((_, Event::Eof)) => break,
            Err(e) => return Err(FeedError::Malformed(format!("XML parse error: {}", e))),
            _ => {}
        }
        buf.clear();
    }

    if !saw_feed {
        return Err(FeedError::Malformed("no Atom feed element".to_string()));
    }
    if in_feed {
        return Err(FeedError::Malformed("feed ended before </feed>".to_string()));
    }
    Ok(papers)
}

fn push_field(
    field: Field,
    text: &str,
    id: &mut String,
    title: &mut String,
    published: &mut String,
    author_name: &mut String,
) {
    match field {
        Field::Id => id.push_str(text),
        Field::Title => title.push_str(text),
        Field::Published => published.push_str(text),
        Field::AuthorName => author_name.push_str(text),
        Field::None => {}
    }
}

fn finish_entry(
    id: &str,
    title: &str,
    published: &str,
    authors: &[String],
) -> Result<PaperRecord, FeedError> {
    let url = id.trim();
    if url.is_empty() {
        return Err(FeedError::Malformed("entry without id".to_string()));
    }
    let title = normalize_whitespace(title);
    if title.is_empty() {
        return Err(FeedError::Malformed(format!("entry {} without title", url)));
    }
    Ok(PaperRecord {
        url: url.to_string(),
        title,
        authors: authors.to_vec(),
        date: calendar_date(published)?,
        abstract_text: None,
    })
}
