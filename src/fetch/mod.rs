//! Polite downloader for owner detail pages.
//!
//! Fetches the listing page, follows every link matching the detail-page
//! pattern and stores each page as `<slug>.html` next to a
//! `fetch_manifest.json`. A slug already taken by another URL gets a short
//! URL hash appended. Requests are sequential with a fixed delay between
//! them; 429 and 5xx responses are retried with exponential backoff.

pub mod manifest;

pub use manifest::{content_hash, Manifest, ManifestEntry, MANIFEST_FILE};

use once_cell::sync::Lazy;
use reqwest::{Client, StatusCode};
use scraper::{Html, Selector};
use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::time::Duration;
use url::Url;

use crate::config::FetchConfig;
use crate::error::{OwnergraphError, Result};
use crate::model::normalize_id;

static ANCHOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("a[href]").expect("Invalid CSS selector"));

/// Outcome of [`PageFetcher::fetch_all`].
#[derive(Debug, Default)]
pub struct FetchReport {
    pub discovered: usize,
    pub written: usize,
    /// Already on disk and not re-requested.
    pub skipped: usize,
    /// Re-requested with `force` but identical to the stored copy.
    pub unchanged: usize,
    pub failed: Vec<(String, OwnergraphError)>,
}

enum Attempt {
    Retryable(OwnergraphError),
    Fatal(OwnergraphError),
}

/// Ceiling for a single retry delay.
const MAX_BACKOFF: Duration = Duration::from_secs(60);

fn next_backoff(delay: Duration) -> Duration {
    delay.saturating_mul(2).min(MAX_BACKOFF)
}

fn is_retryable(status: StatusCode) -> bool {
    status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
}

/// HTTP client for owner pages.
pub struct PageFetcher {
    client: Client,
    delay: Duration,
    max_retries: usize,
    backoff: Duration,
}

impl PageFetcher {
    pub fn new(config: &FetchConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| OwnergraphError::Fetch(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            delay: Duration::from_millis(config.delay_ms),
            max_retries: config.max_retries,
            backoff: Duration::from_millis(config.backoff_ms),
        })
    }

    async fn fetch_once(&self, url: &Url) -> std::result::Result<String, Attempt> {
        let response = match self.client.get(url.clone()).send().await {
            Ok(response) => response,
            Err(e) => {
                let error = OwnergraphError::Fetch(format!("Network error for {}: {}", url, e));
                return Err(if e.is_timeout() || e.is_connect() {
                    Attempt::Retryable(error)
                } else {
                    Attempt::Fatal(error)
                });
            }
        };

        let status = response.status();
        if !status.is_success() {
            let error = OwnergraphError::Fetch(format!("HTTP {} for {}", status, url));
            return Err(if is_retryable(status) {
                Attempt::Retryable(error)
            } else {
                Attempt::Fatal(error)
            });
        }

        response
            .text()
            .await
            .map_err(|e| Attempt::Fatal(OwnergraphError::Fetch(format!("Failed to read body of {}: {}", url, e))))
    }

    /// GET `url`, retrying 429/5xx and connection failures with exponential backoff.
    pub async fn fetch_page(&self, url: &Url) -> Result<String> {
        let start = std::time::Instant::now();
        let mut attempt = 0;
        let mut delay = self.backoff;

        loop {
            match self.fetch_once(url).await {
                Ok(body) => {
                    log::debug!("GET {} took {:?} (attempt {})", url, start.elapsed(), attempt + 1);
                    return Ok(body);
                }
                Err(Attempt::Retryable(e)) if attempt < self.max_retries => {
                    log::warn!("Retry {}/{} after error: {}", attempt + 1, self.max_retries, e);
                    tokio::time::sleep(delay).await;
                    delay = next_backoff(delay);
                    attempt += 1;
                }
                Err(Attempt::Retryable(e)) | Err(Attempt::Fatal(e)) => return Err(e),
            }
        }
    }

    /// Download every detail page linked from `listing_url` into `out_dir`.
    ///
    /// Pages already recorded in the manifest and present on disk are skipped
    /// unless `force` is set. Individual page failures are reported, not fatal;
    /// a failing listing page is.
    pub async fn fetch_all(
        &self,
        listing_url: &Url,
        link_pattern: &str,
        out_dir: &Path,
        force: bool,
    ) -> Result<FetchReport> {
        std::fs::create_dir_all(out_dir)?;
        let mut manifest = Manifest::load(out_dir)?;

        let listing = self.fetch_page(listing_url).await?;
        let links = discover_detail_links(&listing, listing_url, link_pattern);
        log::info!("Found {} detail pages on {}", links.len(), listing_url);

        let mut report = FetchReport {
            discovered: links.len(),
            ..FetchReport::default()
        };

        let mut names = FileNames::from_manifest(&manifest);
        let mut requested = 0usize;
        for (idx, url) in links.iter().enumerate() {
            let known = manifest.get(url.as_str()).cloned();
            let file = names.claim(url, known.as_ref().map(|k| k.file.as_str()));
            let path = out_dir.join(&file);

            if !force && known.is_some() && path.exists() {
                log::debug!("[{}/{}] Skipping {} (already fetched)", idx + 1, links.len(), url);
                report.skipped += 1;
                continue;
            }

            if requested > 0 {
                tokio::time::sleep(self.delay).await;
            }
            requested += 1;

            log::info!("[{}/{}] Fetching {}", idx + 1, links.len(), url);
            let body = match self.fetch_page(url).await {
                Ok(body) => body,
                Err(e) => {
                    log::error!("✗ {}: {}", url, e);
                    report.failed.push((url.to_string(), e));
                    continue;
                }
            };

            let sha256 = content_hash(body.as_bytes());
            let same = known
                .as_ref()
                .map(|k| k.sha256 == sha256 && k.file == file)
                .unwrap_or(false);
            if same && path.exists() {
                report.unchanged += 1;
            } else {
                if let Err(e) = std::fs::write(&path, &body) {
                    log::error!("✗ {}: {}", path.display(), e);
                    report.failed.push((url.to_string(), OwnergraphError::Io(e)));
                    continue;
                }
                report.written += 1;
            }

            manifest.upsert(ManifestEntry {
                url: url.to_string(),
                file,
                sha256,
                fetched_at: chrono::Utc::now(),
            });
        }

        manifest.save(out_dir)?;
        Ok(report)
    }
}

/// Absolute detail-page links in document order, fragment stripped, deduped.
///
/// `pattern` is matched against the resolved path, so relative hrefs count.
pub fn discover_detail_links(html: &str, base: &Url, pattern: &str) -> Vec<Url> {
    let document = Html::parse_document(html);
    let mut seen = HashSet::new();
    let mut links = Vec::new();

    for anchor in document.select(&ANCHOR) {
        let Some(href) = anchor.value().attr("href") else {
            continue;
        };
        let Ok(mut url) = base.join(href) else {
            log::debug!("Ignoring unresolvable link: {}", href);
            continue;
        };
        if !url.path().contains(pattern) {
            continue;
        }
        url.set_fragment(None);
        if seen.insert(url.to_string()) {
            links.push(url);
        }
    }

    links
}

/// `<normalized last path segment>.html`; `index.html` when the path has none.
pub fn page_file_name(url: &Url) -> String {
    let slug = url
        .path_segments()
        .and_then(|segments| segments.filter(|s| !s.is_empty()).last())
        .map(normalize_id)
        .unwrap_or_else(|| "index".to_string());
    format!("{}.html", slug)
}

/// File names handed out to page URLs, seeded from the manifest so a URL
/// keeps its file across runs and no two URLs share one.
struct FileNames {
    owners: HashMap<String, String>,
}

impl FileNames {
    fn from_manifest(manifest: &Manifest) -> Self {
        let owners = manifest
            .pages
            .iter()
            .map(|entry| (entry.file.clone(), entry.url.clone()))
            .collect();
        Self { owners }
    }

    fn is_free_for(&self, file: &str, url: &Url) -> bool {
        self.owners
            .get(file)
            .map(|owner| owner == url.as_str())
            .unwrap_or(true)
    }

    /// `recorded` is the file the manifest already lists for `url`, if any.
    fn claim(&mut self, url: &Url, recorded: Option<&str>) -> String {
        let file = match recorded {
            Some(file) if self.is_free_for(file, url) => file.to_string(),
            _ => {
                let file = page_file_name(url);
                if self.is_free_for(&file, url) {
                    file
                } else {
                    let stem = file.trim_end_matches(".html");
                    let suffix = &content_hash(url.as_str().as_bytes())[..8];
                    log::warn!("{} clashes with an earlier page; using {}_{}.html", file, stem, suffix);
                    format!("{}_{}.html", stem, suffix)
                }
            }
        };
        self.owners.insert(file.clone(), url.to_string());
        file
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// Serve the scripted responses in order, one connection each.
    async fn serve(responses: Vec<(u16, String)>) -> Url {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            for (status, body) in responses {
                let (mut socket, _) = listener.accept().await.unwrap();
                let mut buf = vec![0u8; 8192];
                let _ = socket.read(&mut buf).await;
                let reply = format!(
                    "HTTP/1.1 {} Scripted\r\nContent-Type: text/html\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                    status,
                    body.len(),
                    body
                );
                socket.write_all(reply.as_bytes()).await.unwrap();
                let _ = socket.shutdown().await;
            }
        });
        Url::parse(&format!("http://{}/en/owners/", addr)).unwrap()
    }

    fn fast_config() -> FetchConfig {
        FetchConfig {
            delay_ms: 1,
            backoff_ms: 1,
            max_retries: 2,
            ..FetchConfig::default()
        }
    }

    #[test]
    fn test_discover_detail_links() {
        let base = Url::parse("https://example.org/en/owners/individual-owners/").unwrap();
        let html = r##"
<a href="/en/owners/individual-owners/detail/jane-doe/">Jane</a>
<a href="detail/john-roe/#bio">John</a>
<a href="/en/owners/individual-owners/detail/jane-doe/#top">Jane again</a>
<a href="/en/media/">Media</a>
<a>No href</a>
"##;
        let links = discover_detail_links(html, &base, "/detail/");
        let links: Vec<_> = links.iter().map(Url::as_str).collect();
        assert_eq!(
            links,
            vec![
                "https://example.org/en/owners/individual-owners/detail/jane-doe/",
                "https://example.org/en/owners/individual-owners/detail/john-roe/",
            ]
        );
    }

    #[test]
    fn test_page_file_name() {
        let url = Url::parse("https://example.org/en/owners/detail/jane-doe/").unwrap();
        assert_eq!(page_file_name(&url), "jane_doe.html");
        let url = Url::parse("https://example.org/").unwrap();
        assert_eq!(page_file_name(&url), "index.html");
    }

    #[test]
    fn test_file_names_never_shared() {
        let jane = Url::parse("https://x.org/detail/jane-doe/").unwrap();
        let other = Url::parse("https://x.org/other/Jane_Doe").unwrap();
        assert_eq!(page_file_name(&jane), page_file_name(&other));

        let mut names = FileNames::from_manifest(&Manifest::default());
        let first = names.claim(&jane, None);
        let second = names.claim(&other, None);
        assert_eq!(first, "jane_doe.html");
        assert_ne!(first, second);
        assert!(second.starts_with("jane_doe_") && second.ends_with(".html"));
        assert_eq!(names.claim(&jane, None), first);
    }

    #[test]
    fn test_file_names_keep_manifest_entries() {
        let jane = Url::parse("https://x.org/detail/jane-doe/").unwrap();
        let other = Url::parse("https://x.org/other/Jane_Doe").unwrap();
        let mut manifest = Manifest::default();
        manifest.upsert(ManifestEntry {
            url: other.to_string(),
            file: "jane_doe.html".to_string(),
            sha256: String::new(),
            fetched_at: chrono::Utc::now(),
        });

        let mut names = FileNames::from_manifest(&manifest);
        assert_ne!(names.claim(&jane, None), "jane_doe.html");
        assert_eq!(names.claim(&other, Some("jane_doe.html")), "jane_doe.html");
    }

    #[test]
    fn test_symbol_only_slugs_do_not_collide() {
        let a = Url::parse("https://x.org/detail/---/").unwrap();
        let b = Url::parse("https://x.org/detail/___/").unwrap();
        let mut names = FileNames::from_manifest(&Manifest::default());
        assert_eq!(names.claim(&a, None), "unknown.html");
        assert_ne!(names.claim(&b, None), "unknown.html");
    }

    #[test]
    fn test_backoff_saturates() {
        assert_eq!(next_backoff(Duration::from_millis(500)), Duration::from_secs(1));
        assert_eq!(next_backoff(Duration::from_secs(45)), MAX_BACKOFF);
        assert_eq!(next_backoff(Duration::MAX), MAX_BACKOFF);

        let mut delay = Duration::from_millis(1000);
        for _ in 0..200 {
            delay = next_backoff(delay);
        }
        assert_eq!(delay, MAX_BACKOFF);
    }

    #[test]
    fn test_retryable_statuses() {
        assert!(is_retryable(StatusCode::TOO_MANY_REQUESTS));
        assert!(is_retryable(StatusCode::BAD_GATEWAY));
        assert!(!is_retryable(StatusCode::NOT_FOUND));
    }

    #[tokio::test]
    async fn test_fetch_page_retries_server_errors() {
        let url = serve(vec![
            (503, String::new()),
            (200, "<html>ok</html>".to_string()),
        ])
        .await;
        let fetcher = PageFetcher::new(&fast_config()).unwrap();
        assert_eq!(fetcher.fetch_page(&url).await.unwrap(), "<html>ok</html>");
    }

    #[tokio::test]
    async fn test_fetch_page_does_not_retry_not_found() {
        let url = serve(vec![(404, String::new())]).await;
        let fetcher = PageFetcher::new(&fast_config()).unwrap();
        let err = fetcher.fetch_page(&url).await.unwrap_err();
        assert!(err.to_string().contains("404"));
    }

    #[tokio::test]
    async fn test_fetch_all_keeps_colliding_pages_apart() {
        let listing = r#"<a href="a/detail/jane-doe/">Jane</a><a href="b/detail/Jane_Doe">Jane too</a>"#;
        let url = serve(vec![
            (200, listing.to_string()),
            (200, "first".to_string()),
            (200, "second".to_string()),
        ])
        .await;

        let temp_dir = TempDir::new().unwrap();
        let fetcher = PageFetcher::new(&fast_config()).unwrap();
        let report = fetcher.fetch_all(&url, "/detail/", temp_dir.path(), false).await.unwrap();
        assert_eq!(report.written, 2);
        assert!(report.failed.is_empty());

        let manifest = Manifest::load(temp_dir.path()).unwrap();
        assert_eq!(manifest.pages.len(), 2);
        assert_ne!(manifest.pages[0].file, manifest.pages[1].file);
        let bodies: Vec<String> = manifest
            .pages
            .iter()
            .map(|e| std::fs::read_to_string(temp_dir.path().join(&e.file)).unwrap())
            .collect();
        assert_eq!(bodies, vec!["first".to_string(), "second".to_string()]);
    }

    #[tokio::test]
    async fn test_fetch_all_writes_pages_and_manifest() {
        let listing = r#"<a href="detail/jane-doe/">Jane</a><a href="detail/john-roe/">John</a>"#;
        let url = serve(vec![
            (200, listing.to_string()),
            (200, "<h1 class=\"hl1\">Jane Doe</h1>".to_string()),
            (500, String::new()),
            (500, String::new()),
            (500, String::new()),
        ])
        .await;

        let temp_dir = TempDir::new().unwrap();
        let fetcher = PageFetcher::new(&fast_config()).unwrap();
        let report = fetcher.fetch_all(&url, "detail/", temp_dir.path(), false).await.unwrap();

        assert_eq!(report.discovered, 2);
        assert_eq!(report.written, 1);
        assert_eq!(report.failed.len(), 1);
        assert!(temp_dir.path().join("jane_doe.html").exists());

        let manifest = Manifest::load(temp_dir.path()).unwrap();
        assert_eq!(manifest.pages.len(), 1);
        assert_eq!(manifest.pages[0].file, "jane_doe.html");
        assert_eq!(
            manifest.pages[0].sha256,
            content_hash("<h1 class=\"hl1\">Jane Doe</h1>".as_bytes())
        );
    }
}
