use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use anyhow::Result;
use indicatif::{ProgressBar, ProgressStyle};
use reqwest::Client;
use tokio::sync::{mpsc, Semaphore};
use tokio::task::JoinSet;
use tracing::{debug, warn};

use crate::parser::chain::parse_chain_page;
use crate::parser::expirations::{chain_url, extract_expirations};
use crate::sink::Sink;

pub const BASE_URL: &str = "https://finance.yahoo.com";
pub const DEFAULT_CONCURRENCY: usize = 50;

/// Desktop-browser agent; the quote site serves plain HTML tables to it.
const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/78.0.3904.108 Safari/537.36";

/// Crawl totals returned after both queues drain.
pub struct CrawlStats {
    pub symbols: usize,
    pub chain_pages: usize,
    pub errors: usize,
    pub records: usize,
}

pub struct Crawler {
    client: Client,
    base_url: String,
    concurrency: usize,
}

impl Crawler {
    pub fn new(concurrency: usize, user_agent: Option<&str>) -> Result<Self> {
        let client = Client::builder()
            .user_agent(user_agent.unwrap_or(USER_AGENT))
            .pool_max_idle_per_host(concurrency)
            .build()?;
        Ok(Self {
            client,
            base_url: BASE_URL.to_string(),
            concurrency,
        })
    }

    #[cfg(test)]
    fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.to_string();
        self
    }

    pub fn landing_url(&self, symbol: &str) -> String {
        format!("{}/quote/{}/options", self.base_url, symbol.trim())
    }

    /// Crawl every symbol's expirations and chain pages, streaming each
    /// parsed batch into the sink.
    ///
    /// Two queues run concurrently: discovery workers fetch each symbol's
    /// landing page and push one chain URL per expiration into a channel;
    /// chain workers pop the channel and fetch/parse as permits free up,
    /// while discovery is still producing. The channel's senders live in
    /// the discovery workers, so it closes exactly when the last one
    /// finishes; the chain loop then drains its in-flight workers.
    /// Returns once both queues are fully drained. A failed fetch is
    /// logged and abandoned without affecting its siblings.
    pub async fn run(&self, symbols: &[String], sink: Arc<dyn Sink>) -> Result<CrawlStats> {
        let records = Arc::new(AtomicUsize::new(0));
        let errors = Arc::new(AtomicUsize::new(0));

        // Chain-queue progress; length grows as discovery enqueues work
        let pb = ProgressBar::new(0);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("[{elapsed_precise}] {bar:40} {pos}/{len} ({per_sec}, eta {eta})")?
                .progress_chars("=> "),
        );

        let (chain_tx, mut chain_rx) = mpsc::unbounded_channel::<String>();

        let discover_sem = Arc::new(Semaphore::new(self.concurrency));
        let mut discovery = JoinSet::new();
        let mut seeded = 0usize;
        for symbol in active_symbols(symbols) {
            seeded += 1;
            let url = self.landing_url(symbol);
            let client = self.client.clone();
            let sem = Arc::clone(&discover_sem);
            let tx = chain_tx.clone();
            let errors = Arc::clone(&errors);
            let pb = pb.clone();

            discovery.spawn(async move {
                let _permit = sem.acquire().await.unwrap();
                match fetch(&client, &url).await {
                    Ok(body) => {
                        let expirations = extract_expirations(&body);
                        debug!("{} expirations at {}", expirations.len(), url);
                        pb.inc_length(expirations.len() as u64);
                        for exp in &expirations {
                            let _ = tx.send(chain_url(&url, exp));
                        }
                    }
                    Err(e) => {
                        errors.fetch_add(1, Ordering::Relaxed);
                        warn!("Request for {} failed: {}", url, e);
                    }
                }
            });
        }
        // Discovery workers now hold the only senders
        drop(chain_tx);

        let chain_sem = Arc::new(Semaphore::new(self.concurrency));
        let client = self.client.clone();
        let chain_records = Arc::clone(&records);
        let chain_errors = Arc::clone(&errors);
        let chain_pb = pb.clone();

        let chain_loop = tokio::spawn(async move {
            let mut workers = JoinSet::new();
            let mut pages = 0usize;
            while let Some(url) = chain_rx.recv().await {
                pages += 1;
                let permit = Arc::clone(&chain_sem).acquire_owned().await.unwrap();
                let client = client.clone();
                let sink = Arc::clone(&sink);
                let records = Arc::clone(&chain_records);
                let errors = Arc::clone(&chain_errors);
                let pb = chain_pb.clone();

                workers.spawn(async move {
                    let _permit = permit;
                    match fetch(&client, &url).await {
                        Ok(body) => {
                            parse_chain_page(&body, &url, sink.as_ref(), &records);
                        }
                        Err(e) => {
                            errors.fetch_add(1, Ordering::Relaxed);
                            warn!("Request for {} failed: {}", url, e);
                        }
                    }
                    pb.inc(1);
                });
            }
            while workers.join_next().await.is_some() {}
            pages
        });

        while discovery.join_next().await.is_some() {}
        let chain_pages = chain_loop.await?;
        pb.finish_and_clear();

        Ok(CrawlStats {
            symbols: seeded,
            chain_pages,
            errors: errors.load(Ordering::Relaxed),
            records: records.load(Ordering::Relaxed),
        })
    }
}

/// Symbols worth crawling: blank and whitespace-only entries skipped.
pub fn active_symbols(symbols: &[String]) -> impl Iterator<Item = &String> {
    symbols.iter().filter(|s| !s.trim().is_empty())
}

async fn fetch(client: &Client, url: &str) -> Result<String> {
    debug!("Visiting {}", url);
    let resp = client.get(url).send().await?.error_for_status()?;
    Ok(resp.text().await?)
}

// ── Tests ──

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_symbols_are_skipped() {
        let symbols = vec![
            "^VIX".to_string(),
            "^SPX".to_string(),
            "".to_string(),
            "   ".to_string(),
        ];
        let active: Vec<&String> = active_symbols(&symbols).collect();
        assert_eq!(active, vec!["^VIX", "^SPX"]);
    }

    #[test]
    fn landing_url_format() {
        let crawler = Crawler::new(1, None).unwrap().with_base_url("http://test");
        assert_eq!(crawler.landing_url("^VIX"), "http://test/quote/^VIX/options");
        assert_eq!(crawler.landing_url(" AAPL \n"), "http://test/quote/AAPL/options");
    }

    #[test]
    fn discovered_chain_urls_per_symbol() {
        let crawler = Crawler::new(1, None).unwrap().with_base_url("http://test");
        let landing = crawler.landing_url("^SPX");
        let html = std::fs::read_to_string("tests/fixtures/landing.html").unwrap();
        let urls: Vec<String> = extract_expirations(&html)
            .iter()
            .map(|exp| chain_url(&landing, exp))
            .collect();
        assert_eq!(
            urls,
            vec![
                "http://test/quote/^SPX/options?date=1576195200",
                "http://test/quote/^SPX/options?date=1578614400",
            ]
        );
    }
}
