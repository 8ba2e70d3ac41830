//! feed.rs
//!
//! Penang Monthly statistics feed: parse the RSS document and keep the
//! items whose categories name the month they cover.

use crate::errors::MetricsError;
use crate::fetcher::Fetcher;
use crate::metrics::ARTICLES_SKIPPED;
use chrono::NaiveDate;
use feed_rs::model::{Entry, Feed};
use feed_rs::parser;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

const MONTHS: [&str; 12] = [
    "January", "February", "March", "April", "May", "June", "July", "August", "September",
    "October", "November", "December",
];

/// One article listed on the dashboard.
///
/// Fields are declared in key order so the YAML output stays sorted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArticleRecord {
    pub author: String,
    /// First day of the covered month, `YYYY-MM-01`
    pub date: String,
    pub image: String,
    pub path: String,
    pub title: String,
}

/// Parse a category such as `"October 2024"` into the first of that month.
/// Only categories carrying a full English month name are considered.
pub fn month_from_category(category: &str) -> Option<NaiveDate> {
    if !MONTHS.iter().any(|m| category.contains(m)) {
        return None;
    }
    NaiveDate::parse_from_str(&format!("1 {category}"), "%d %B %Y").ok()
}

/// The item's `dc:creator`, if any.
///
/// feed-rs folds RSS `<author>` contacts into `authors` as well, as a person
/// named after the element with the address in `email`; only Dublin Core
/// creators carry the byline itself.
pub fn dc_creator(entry: &Entry) -> Option<&str> {
    entry
        .authors
        .iter()
        .find(|p| p.email.is_none() && p.name != "author")
        .map(|p| p.name.as_str())
}

/// Convert a feed entry into an article. Returns `None` when no category
/// yields a month; the first category that does wins.
pub fn article_from_entry(entry: &Entry) -> Option<ArticleRecord> {
    let date = entry
        .categories
        .iter()
        .find_map(|c| month_from_category(&c.term))?;

    let image = entry
        .media
        .iter()
        .flat_map(|m| m.content.iter())
        .find_map(|c| c.url.as_ref())
        .map(|u| u.to_string())
        .unwrap_or_default();

    Some(ArticleRecord {
        author: dc_creator(entry).unwrap_or_default().to_string(),
        date: date.format("%Y-%m-01").to_string(),
        image,
        path: entry.links.first().map(|l| l.href.clone()).unwrap_or_default(),
        title: entry.title.as_ref().map(|t| t.content.clone()).unwrap_or_default(),
    })
}

/// All articles of a parsed feed, in feed order.
pub fn articles_from_feed(feed: &Feed) -> Vec<ArticleRecord> {
    feed.entries
        .iter()
        .filter_map(|entry| {
            let article = article_from_entry(entry);
            if article.is_none() {
                ARTICLES_SKIPPED.inc();
                debug!(entry_id = %entry.id, "No month category, dropping feed item");
            }
            article
        })
        .collect()
}

/// Parse raw RSS bytes into articles.
pub fn parse_articles(source: &str, body: &[u8]) -> Result<Vec<ArticleRecord>, MetricsError> {
    let feed = parser::parse(body).map_err(|e| MetricsError::Parse(source.to_string(), e))?;
    Ok(articles_from_feed(&feed))
}

/// Fetch & parse the feed at `url`.
pub async fn fetch_articles(fetcher: &Fetcher, url: &str) -> Result<Vec<ArticleRecord>, MetricsError> {
    let body = fetcher.fetch_bytes(url).await?;
    let articles = parse_articles(url, &body)?;
    info!(url, count = articles.len(), "Parsed feed articles");
    Ok(articles)
}

#[cfg(test)]
mod tests {
    use super::*;

    const RSS: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0" xmlns:dc="http://purl.org/dc/elements/1.1/" xmlns:media="http://search.yahoo.com/mrss/">
  <channel>
    <title>Statistics - Penang Monthly</title>
    <link>https://www.penangmonthly.com/</link>
    <description>Statistics</description>
    <item>
      <title>Penang in Numbers</title>
      <link>https://www.penangmonthly.com/penang-in-numbers/</link>
      <guid isPermaLink="false">a1</guid>
      <category>Statistics</category>
      <category>October 2024</category>
      <category>November 2024</category>
      <dc:creator>Jane Doe</dc:creator>
      <media:content url="https://www.penangmonthly.com/content/images/cover.jpg" medium="image"/>
    </item>
    <item>
      <title>No Month Here</title>
      <link>https://www.penangmonthly.com/no-month/</link>
      <guid isPermaLink="false">a2</guid>
      <category>Statistics</category>
      <category>Economy</category>
    </item>
    <item>
      <title>Contact Only</title>
      <link>https://www.penangmonthly.com/contact-only/</link>
      <guid isPermaLink="false">a4</guid>
      <category>June 2024</category>
      <author>someone@x.com (Someone)</author>
    </item>
    <item>
      <title>Both Bylines</title>
      <link>https://www.penangmonthly.com/both-bylines/</link>
      <guid isPermaLink="false">a5</guid>
      <category>July 2024</category>
      <author>editor@x.com (Editor)</author>
      <dc:creator>Lim Wei Ling</dc:creator>
    </item>
    <item>
      <title>Bare Item</title>
      <link>https://www.penangmonthly.com/bare/</link>
      <guid isPermaLink="false">a3</guid>
      <category>March 2023</category>
    </item>
  </channel>
</rss>"#;

    #[test]
    fn month_categories_parse_to_first_of_month() {
        assert_eq!(
            month_from_category("October 2024"),
            NaiveDate::from_ymd_opt(2024, 10, 1)
        );
        assert_eq!(month_from_category("May 1999"), NaiveDate::from_ymd_opt(1999, 5, 1));
    }

    #[test]
    fn non_month_categories_are_rejected() {
        assert_eq!(month_from_category("Statistics"), None);
        assert_eq!(month_from_category("Oct 2024"), None);
        assert_eq!(month_from_category("October Special"), None);
    }

    #[test]
    fn feed_items_without_month_are_dropped() {
        let articles = parse_articles("test", RSS.as_bytes()).unwrap();

        let titles: Vec<_> = articles.iter().map(|a| a.title.as_str()).collect();
        assert_eq!(titles, ["Penang in Numbers", "Contact Only", "Both Bylines", "Bare Item"]);
    }

    #[test]
    fn first_month_category_wins_and_fields_are_mapped() {
        let articles = parse_articles("test", RSS.as_bytes()).unwrap();
        let first = &articles[0];

        assert_eq!(first.date, "2024-10-01");
        assert_eq!(first.path, "https://www.penangmonthly.com/penang-in-numbers/");
        assert_eq!(first.author, "Jane Doe");
        assert_eq!(first.image, "https://www.penangmonthly.com/content/images/cover.jpg");
    }

    #[test]
    fn missing_author_and_image_default_to_empty() {
        let articles = parse_articles("test", RSS.as_bytes()).unwrap();
        let bare = &articles[3];

        assert_eq!(bare.date, "2023-03-01");
        assert_eq!(bare.author, "");
        assert_eq!(bare.image, "");
    }

    #[test]
    fn rss_author_element_is_not_a_byline() {
        let articles = parse_articles("test", RSS.as_bytes()).unwrap();

        assert_eq!(articles[1].title, "Contact Only");
        assert_eq!(articles[1].author, "");
        assert_eq!(articles[2].author, "Lim Wei Ling");
    }

    #[test]
    fn malformed_feed_is_a_parse_error() {
        let err = parse_articles("test", b"<html>nope").unwrap_err();
        assert!(matches!(err, MetricsError::Parse(..)));
    }
}
