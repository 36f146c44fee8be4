//! In-memory site graph standing in for a browser in tests

use crate::config::FetchOptions;
use crate::crawlers::crawler::{FetchedPage, PageSource};
use crate::error::{FetchError, FetchFailure};
use crate::filter;
use std::cell::RefCell;
use std::collections::HashMap;
use url::Url;

enum Route {
    Page { body: String, links: Vec<String> },
    Redirect(String),
    Timeout,
}

#[derive(Default)]
pub(crate) struct FakeSite {
    routes: HashMap<String, Route>,
    fetched: RefCell<Vec<(String, FetchOptions)>>,
}

impl FakeSite {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// A page whose body text is derived from its URL
    pub(crate) fn page(self, url: &str, links: &[&str]) -> Self {
        let body = format!("Content of {url}");
        self.page_with_body(url, &body, links)
    }

    pub(crate) fn page_with_body(mut self, url: &str, body: &str, links: &[&str]) -> Self {
        self.routes.insert(
            key(url),
            Route::Page {
                body: body.to_string(),
                links: links.iter().map(|l| l.to_string()).collect(),
            },
        );
        self
    }

    pub(crate) fn redirect(mut self, from: &str, to: &str) -> Self {
        self.routes.insert(key(from), Route::Redirect(key(to)));
        self
    }

    pub(crate) fn timeout(mut self, url: &str) -> Self {
        self.routes.insert(key(url), Route::Timeout);
        self
    }

    pub(crate) fn fetch_count(&self) -> usize {
        self.fetched.borrow().len()
    }

    pub(crate) fn was_fetched(&self, url: &str) -> bool {
        let url = key(url);
        self.fetched.borrow().iter().any(|(u, _)| *u == url)
    }

    pub(crate) fn fetch_count_of(&self, url: &str) -> usize {
        let url = key(url);
        self.fetched.borrow().iter().filter(|(u, _)| *u == url).count()
    }

    pub(crate) fn fetches(&self) -> Vec<(String, FetchOptions)> {
        self.fetched.borrow().clone()
    }

    fn render(body: &str, links: &[String]) -> String {
        let anchors = links
            .iter()
            .map(|l| format!("<a href=\"{l}\">link</a>"))
            .collect::<Vec<_>>()
            .join("\n");
        format!(
            "<html><head><script>var x = 1;</script></head><body><nav>Menu</nav><p>{body}</p>{anchors}<footer>Footer</footer></body></html>"
        )
    }
}

fn key(url: &str) -> String {
    Url::parse(url).map(String::from).unwrap_or_else(|_| url.to_string())
}

impl PageSource for FakeSite {
    async fn fetch(&self, url: &str, options: FetchOptions) -> Result<FetchedPage, FetchError> {
        let target = filter::validate_url(url).map_err(|e| FetchError::new(url, e))?;
        self.fetched
            .borrow_mut()
            .push((target.to_string(), options));

        let mut current = target.to_string();
        for _ in 0..5 {
            match self.routes.get(&current) {
                Some(Route::Page { body, links }) => {
                    return Ok(FetchedPage {
                        final_url: Url::parse(&current).expect("routes are valid URLs"),
                        html: Self::render(body, links),
                    });
                }
                Some(Route::Redirect(to)) => current = to.clone(),
                Some(Route::Timeout) => {
                    let ms = options.timeout.as_millis() as u64;
                    return Err(FetchError::new(url, FetchFailure::Timeout(ms)));
                }
                None => break,
            }
        }

        Err(FetchError::new(
            url,
            FetchFailure::Transport("net::ERR_NAME_NOT_RESOLVED".to_string()),
        ))
    }
}
