//! Page-number fetcher
//!
//! Requests `?page=1`, `?page=2`, ... one at a time and yields each
//! non-empty page until the endpoint answers with an empty one.

use super::types::{EndOfDataPolicy, PageBody, PageCursor};
use crate::error::{Error, Result};
use crate::http::{HttpClient, RequestConfig};
use crate::types::Page;
use futures::stream::{self, Stream};
use std::collections::HashMap;
use std::pin::Pin;
use tracing::debug;

/// Lazy, ordered sequence of pages
pub type PageStream = Pin<Box<dyn Stream<Item = Result<Page>> + Send>>;

/// Fetches numbered pages from a single endpoint
#[derive(Debug, Clone)]
pub struct PageFetcher {
    client: HttpClient,
    base_url: String,
    page_param: String,
    start_page: u32,
    query: HashMap<String, String>,
    policy: EndOfDataPolicy,
}

impl PageFetcher {
    /// Create a fetcher using `page` as the query parameter, starting at 1
    pub fn new(client: HttpClient, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
            page_param: "page".to_string(),
            start_page: 1,
            query: HashMap::new(),
            policy: EndOfDataPolicy::default(),
        }
    }

    /// Set the page number query parameter
    #[must_use]
    pub fn with_page_param(mut self, param: impl Into<String>) -> Self {
        self.page_param = param.into();
        self
    }

    /// Set the first page number
    #[must_use]
    pub fn with_start_page(mut self, start_page: u32) -> Self {
        self.start_page = start_page;
        self
    }

    /// Add a static query parameter sent with every page request
    #[must_use]
    pub fn with_query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.insert(key.into(), value.into());
        self
    }

    /// Set the end-of-data policy
    #[must_use]
    pub fn with_policy(mut self, policy: EndOfDataPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Endpoint being paginated
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Fetch a single page
    ///
    /// Returns `Ok(None)` when the body is the end-of-data signal.
    pub async fn fetch_page(&self, number: u32) -> Result<Option<Page>> {
        let mut request = RequestConfig::new().query(&self.page_param, number.to_string());
        for (key, value) in &self.query {
            request = request.query(key, value);
        }

        let response = self.client.get_with_config(&self.base_url, request).await?;
        let bytes = response.bytes().await?;
        let body = serde_json::from_slice(&bytes)
            .map_err(|e| Error::page_parse(number, format!("invalid JSON: {e}")))?;

        match self
            .policy
            .classify(body)
            .map_err(|message| Error::page_parse(number, message))?
        {
            PageBody::Records(records) => {
                debug!(page = number, records = records.len(), "Fetched page");
                Ok(Some(Page::new(number, records)))
            }
            PageBody::EndOfData => {
                debug!(page = number, "End of data");
                Ok(None)
            }
        }
    }

    /// Start a fresh sequence of pages
    ///
    /// Nothing is requested until the stream is polled. Each poll issues at
    /// most one request; the stream ends at the first empty page or after
    /// the first error. Dropping the stream stops all further requests.
    pub fn pages(&self) -> PageStream {
        self.clone().into_pages()
    }

    /// Consume this fetcher into a sequence of pages
    pub fn into_pages(self) -> PageStream {
        let cursor = PageCursor::new(self.start_page);

        Box::pin(stream::try_unfold(
            (self, cursor),
            |(fetcher, mut cursor)| async move {
                let Some(number) = cursor.next_page() else {
                    return Err(Error::page_parse(
                        u32::MAX,
                        "page number overflow: no page follows u32::MAX",
                    ));
                };
                match fetcher.fetch_page(number).await? {
                    Some(page) => {
                        cursor.advance();
                        Ok(Some((page, (fetcher, cursor))))
                    }
                    None => {
                        debug!(
                            url = %fetcher.base_url,
                            pages = cursor.pages_yielded(),
                            "Pagination complete"
                        );
                        Ok(None)
                    }
                }
            },
        ))
    }
}

/// Fetch `base_url?page=1`, `?page=2`, ... until an empty page
pub fn fetch_pages(client: &HttpClient, base_url: &str) -> PageStream {
    PageFetcher::new(client.clone(), base_url).into_pages()
}
