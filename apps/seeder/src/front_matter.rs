//! Front-matter parsing for seed documents.
//!
//! A seed document opens with a `---` fenced block of `key: value` metadata
//! (`title`, `date`, `excerpt`, `category`) followed by a markdown body.

use anyhow::{Context, bail};
use chrono::{DateTime, Utc};

/// A parsed seed document; `body` is still markdown source.
#[derive(Debug, Clone, PartialEq)]
pub struct SeedDocument {
    pub title: String,
    pub date: Option<DateTime<Utc>>,
    pub excerpt: Option<String>,
    pub category: Option<String>,
    pub body: String,
}

/// Split a document into its metadata block and body. Unknown metadata keys
/// are ignored so seed archives from older exports still load.
pub fn parse(input: &str) -> anyhow::Result<SeedDocument> {
    let rest = input
        .strip_prefix("---")
        .context("missing front matter opening fence")?;
    let (header, body) = rest
        .split_once("\n---")
        .context("missing front matter closing fence")?;

    let mut title = None;
    let mut date = None;
    let mut excerpt = None;
    let mut category = None;

    for line in header.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let Some((key, value)) = line.split_once(':') else {
            bail!("malformed front matter line: {line}");
        };
        let value = value.trim().trim_matches('"').to_string();
        match key.trim() {
            "title" => title = Some(value),
            "date" => date = Some(parse_date(&value)?),
            "excerpt" => excerpt = Some(value),
            "category" => category = Some(value),
            _ => {}
        }
    }

    Ok(SeedDocument {
        title: title.context("front matter is missing a title")?,
        date,
        excerpt,
        category,
        body: body.trim_start_matches('\n').to_string(),
    })
}

/// Accept either a full RFC 3339 timestamp or a bare `YYYY-MM-DD` date,
/// which is read as midnight UTC.
fn parse_date(raw: &str) -> anyhow::Result<DateTime<Utc>> {
    if let Ok(ts) = raw.parse::<DateTime<Utc>>() {
        return Ok(ts);
    }
    let date = raw
        .parse::<chrono::NaiveDate>()
        .with_context(|| format!("unparseable date: {raw}"))?;
    Ok(date
        .and_hms_opt(0, 0, 0)
        .context("invalid midnight timestamp")?
        .and_utc())
}

/// Render the markdown body to the HTML stored as the post's rich-text body.
pub fn render_markdown(markdown: &str) -> String {
    let parser = pulldown_cmark::Parser::new(markdown);
    let mut html = String::new();
    pulldown_cmark::html::push_html(&mut html, parser);
    html
}
