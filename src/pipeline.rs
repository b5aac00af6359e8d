use futures::future::join_all;
use tracing::{Instrument, info, info_span, warn};

use crate::config::Config;
use crate::error::{OrEmpty, Result};
use crate::fetcher::PageFetcher;
use crate::markup::MarkupConverter;
use crate::report::{Outcome, Report};
use crate::search::SearchClient;
use crate::tokens::Truncator;

/// Search, fetch the top pages, and assemble the report for one query.
///
/// Holds no per-request state: each call to [`Pipeline::run`] builds its own
/// HTTP client, which is dropped when the call returns or is cancelled.
pub struct Pipeline {
    config: Config,
    converter: MarkupConverter,
    truncator: Truncator,
}

impl Pipeline {
    pub fn new(config: Config, truncator: Truncator) -> Self {
        Self {
            config,
            converter: MarkupConverter,
            truncator,
        }
    }

    /// The report text for `query`, as returned to callers.
    pub async fn search_and_extract(&self, query: &str) -> String {
        self.run(query).await.into_text()
    }

    pub async fn run(&self, query: &str) -> Outcome {
        let span = info_span!("search_and_extract", query);
        async {
            let http = match reqwest::Client::builder().build() {
                Ok(http) => http,
                Err(e) => {
                    warn!(error = %e, "could not build http client");
                    return Outcome::NoResults;
                }
            };
            let search = SearchClient::new(&self.config, http.clone());
            let fetcher = PageFetcher::new(&self.config, http);

            let response = search.search(query).await;
            let urls = response.links(self.config.max_results);
            if urls.is_empty() {
                info!("no usable search results");
                return Outcome::NoResults;
            }
            info!(selected = urls.len(), "fetching pages");

            // join_all keeps one slot per url, in input order
            let pages = join_all(urls.iter().map(|url| fetcher.fetch(url))).await;

            let texts = pages.iter().map(|html| self.extract(html));
            let report = Report::new(
                query,
                response,
                self.config.max_results,
                urls.iter().cloned().zip(texts),
            );
            info!(pages = report.pages().len(), "report assembled");
            Outcome::Report(report)
        }
        .instrument(span)
        .await
    }

    /// Plain, token-bounded text for one page, empty if either step fails.
    pub fn extract(&self, html: &str) -> String {
        self.try_extract(html).or_empty()
    }

    fn try_extract(&self, html: &str) -> Result<String> {
        let text = self.converter.convert(html)?;
        self.truncator.truncate(&text)
    }
}
