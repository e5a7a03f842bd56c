//! Topic content loading.
//!
//! Each topic has a text document at `{root}/{topic}.md`: an optional `---`
//! delimited `key: value` header, then `## Title` blocks separated by lone
//! `---` lines. Parsing is total; fetching never fails from the caller's point
//! of view and degrades to empty content. Concurrent loads of one topic share
//! a single request.

use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::rc::Rc;

use futures::future::{FutureExt, LocalBoxFuture, Shared};
use log::{debug, warn};
use thiserror::Error;
use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_futures::JsFuture;
use web_sys::Response;

use super::types::{Achievement, TopicContent};

const SEPARATOR: &str = "---";
const HEADING: &str = "## ";
const TAG_PREFIXES: &[&str] = &["**标签**:", "**标签**："];

/// Why a document could not be fetched. Never leaves this module.
#[derive(Debug, Error)]
pub enum LoadError {
	/// Not running in a browser.
	#[error("no browser window available")]
	NoWindow,
	/// The fetch itself rejected.
	#[error("request for {url} failed: {message}")]
	Request {
		/// Requested document.
		url: String,
		/// Browser error text.
		message: String,
	},
	/// Non-2xx response.
	#[error("request for {url} returned status {status}")]
	Status {
		/// Requested document.
		url: String,
		/// HTTP status code.
		status: u16,
	},
	/// The response body could not be read as a string.
	#[error("body of {url} is not text")]
	Body {
		/// Requested document.
		url: String,
	},
}

fn js_message(value: &JsValue) -> String {
	value.as_string().unwrap_or_else(|| format!("{value:?}"))
}

/// Parses a full document into metadata and achievements.
pub fn parse_document(text: &str) -> TopicContent {
	let lines: Vec<&str> = text.lines().map(str::trim).collect();
	let (metadata, body_start) = parse_frontmatter(&lines);
	TopicContent {
		metadata,
		achievements: parse_achievements(&lines[body_start..]),
	}
}

/// Returns the metadata and the index of the first line after the header.
/// The header only counts when the first non-blank line is `---`.
fn parse_frontmatter(lines: &[&str]) -> (HashMap<String, String>, usize) {
	let mut metadata = HashMap::new();
	let Some(open) = lines.iter().position(|l| !l.is_empty()) else {
		return (metadata, lines.len());
	};
	if lines[open] != SEPARATOR {
		return (metadata, 0);
	}

	for (i, line) in lines.iter().enumerate().skip(open + 1) {
		if *line == SEPARATOR {
			return (metadata, i + 1);
		}
		if let Some((key, value)) = line.split_once(':') {
			let key = key.trim();
			if !key.is_empty() {
				metadata.insert(key.to_string(), value.trim().to_string());
			}
		}
	}

	// Unterminated header: everything was metadata.
	(metadata, lines.len())
}

/// Extracts `path` from `![alt](path)`.
fn image_path(line: &str) -> Option<&str> {
	let rest = line.strip_prefix("![")?;
	let (_, after_alt) = rest.split_once("](")?;
	let (path, _) = after_alt.split_once(')')?;
	Some(path)
}

fn parse_achievements(lines: &[&str]) -> Vec<Achievement> {
	let mut achievements = Vec::new();
	let mut current: Option<Achievement> = None;

	for &line in lines {
		if line == SEPARATOR {
			achievements.extend(current.take());
			continue;
		}

		if let Some(title) = line.strip_prefix(HEADING) {
			achievements.extend(current.take());
			current = Some(Achievement {
				title: title.trim().to_string(),
				..Achievement::default()
			});
			continue;
		}

		let Some(achievement) = current.as_mut() else {
			continue;
		};

		if let Some(tag) = TAG_PREFIXES.iter().find_map(|p| line.strip_prefix(p)) {
			achievement.tag = tag.trim().to_string();
		} else if line.starts_with("![") {
			if let Some(path) = image_path(line) {
				achievement.image = Some(path.to_string());
			}
		} else if !line.is_empty() && !line.starts_with('#') {
			if !achievement.description.is_empty() {
				achievement.description.push(' ');
			}
			achievement.description.push_str(line);
		}
	}

	achievements.extend(current);
	achievements
}

type Fetcher = Rc<dyn Fn(String) -> LocalBoxFuture<'static, Result<String, LoadError>>>;
type PendingLoad = Shared<LocalBoxFuture<'static, TopicContent>>;

/// Fetches and caches topic documents relative to a content root.
pub struct ContentLoader {
	root: String,
	fetch: Fetcher,
	cache: RefCell<HashMap<String, TopicContent>>,
	in_flight: RefCell<HashMap<String, PendingLoad>>,
}

impl fmt::Debug for ContentLoader {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("ContentLoader")
			.field("root", &self.root)
			.field("cached", &self.cache.borrow().len())
			.field("in_flight", &self.in_flight.borrow().len())
			.finish_non_exhaustive()
	}
}

impl ContentLoader {
	/// Loader that fetches over HTTP with `window.fetch`.
	pub fn new(root: impl Into<String>) -> Self {
		Self::with_fetcher(root, |url: String| async move { fetch_text(&url).await })
	}

	/// Loader with a custom transport, called with the document URL.
	pub fn with_fetcher<F, Fut>(root: impl Into<String>, fetch: F) -> Self
	where
		F: Fn(String) -> Fut + 'static,
		Fut: Future<Output = Result<String, LoadError>> + 'static,
	{
		Self {
			root: root.into().trim_end_matches('/').to_string(),
			fetch: Rc::new(move |url| fetch(url).boxed_local()),
			cache: RefCell::default(),
			in_flight: RefCell::default(),
		}
	}

	/// Document URL of a topic.
	pub fn url_for(&self, topic_id: &str) -> String {
		if self.root.is_empty() {
			format!("{topic_id}.md")
		} else {
			format!("{}/{topic_id}.md", self.root)
		}
	}

	/// Previously loaded non-empty content.
	pub fn cached(&self, topic_id: &str) -> Option<TopicContent> {
		self.cache.borrow().get(topic_id).cloned()
	}

	/// Loads one topic. Failures are logged and yield empty content; only
	/// non-empty content is cached, so a failed topic is retried next time.
	pub async fn load(&self, topic_id: &str) -> TopicContent {
		if let Some(content) = self.cached(topic_id) {
			return content;
		}

		let joined = self.in_flight.borrow().get(topic_id).cloned();
		let pending = match joined {
			Some(pending) => {
				debug!("hobby-graph: joining in-flight request for {topic_id}");
				pending
			}
			None => {
				let pending = fetch_document(self.fetch.clone(), self.url_for(topic_id), topic_id.to_string())
					.boxed_local()
					.shared();
				self.in_flight
					.borrow_mut()
					.insert(topic_id.to_string(), pending.clone());
				pending
			}
		};

		let content = pending.clone().await;
		{
			let mut in_flight = self.in_flight.borrow_mut();
			if in_flight.get(topic_id).is_some_and(|p| p.ptr_eq(&pending)) {
				in_flight.remove(topic_id);
			}
		}
		if !content.achievements.is_empty() {
			self.cache
				.borrow_mut()
				.entry(topic_id.to_string())
				.or_insert_with(|| content.clone());
		}
		content
	}

	/// Loads every topic one after another.
	pub async fn preload_all(&self, topic_ids: &[String]) -> HashMap<String, TopicContent> {
		let mut contents = HashMap::with_capacity(topic_ids.len());
		for id in topic_ids {
			let content = self.load(id).await;
			contents.insert(id.clone(), content);
		}
		contents
	}
}

async fn fetch_document(fetch: Fetcher, url: String, topic_id: String) -> TopicContent {
	match fetch(url.clone()).await {
		Ok(text) => {
			let content = parse_document(&text);
			debug!(
				"hobby-graph: parsed {} achievements from {url}",
				content.achievements.len()
			);
			content
		}
		Err(e) => {
			warn!("hobby-graph: content for {topic_id} unavailable: {e}");
			TopicContent::default()
		}
	}
}

async fn fetch_text(url: &str) -> Result<String, LoadError> {
	let window = web_sys::window().ok_or(LoadError::NoWindow)?;
	let request_failed = |e: JsValue| LoadError::Request {
		url: url.to_string(),
		message: js_message(&e),
	};

	let response: Response = JsFuture::from(window.fetch_with_str(url))
		.await
		.map_err(request_failed)?
		.dyn_into()
		.map_err(request_failed)?;

	if !response.ok() {
		return Err(LoadError::Status {
			url: url.to_string(),
			status: response.status(),
		});
	}

	let text = JsFuture::from(response.text().map_err(request_failed)?)
		.await
		.map_err(request_failed)?;
	text.as_string().ok_or_else(|| LoadError::Body {
		url: url.to_string(),
	})
}

#[cfg(test)]
mod tests {
	use std::cell::Cell;
	use std::pin::Pin;
	use std::task::{Context, Poll};

	use futures::executor::block_on;

	use super::*;

	/// Returns `Pending` once so a second load can start meanwhile.
	struct YieldOnce(bool);

	impl Future for YieldOnce {
		type Output = ();

		fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<()> {
			if self.0 {
				return Poll::Ready(());
			}
			self.0 = true;
			cx.waker().wake_by_ref();
			Poll::Pending
		}
	}

	fn counting_loader(body: Option<&'static str>) -> (ContentLoader, Rc<Cell<usize>>) {
		let fetches = Rc::new(Cell::new(0));
		let counter = fetches.clone();
		let loader = ContentLoader::with_fetcher("content", move |url: String| {
			counter.set(counter.get() + 1);
			async move {
				YieldOnce(false).await;
				body.map(str::to_string).ok_or(LoadError::Status { url, status: 404 })
			}
		});
		(loader, fetches)
	}

	#[test]
	fn parses_header_and_single_block() {
		let doc = "---\ntitle: X\n---\n## A\n**标签**: T\ndesc line\n";
		let content = parse_document(doc);
		assert_eq!(content.metadata.get("title").map(String::as_str), Some("X"));
		assert_eq!(
			content.achievements,
			vec![Achievement {
				title: "A".into(),
				description: "desc line".into(),
				tag: "T".into(),
				image: None,
			}]
		);
	}

	#[test]
	fn separator_after_header_splits_blocks() {
		let doc = "---\ntitle: X\n---\n## A\nfirst\n---\n## B\nsecond\n";
		let content = parse_document(doc);
		let titles: Vec<_> = content.achievements.iter().map(|a| a.title.as_str()).collect();
		assert_eq!(titles, vec!["A", "B"]);
		assert_eq!(content.achievements[0].description, "first");
		assert_eq!(content.achievements[1].description, "second");
	}

	#[test]
	fn image_line_sets_image_without_touching_description() {
		let doc = "## A\nbefore\n![x](img/a.png)\nafter\n";
		let content = parse_document(doc);
		let a = &content.achievements[0];
		assert_eq!(a.image.as_deref(), Some("img/a.png"));
		assert_eq!(a.description, "before after");
	}

	#[test]
	fn malformed_image_line_is_dropped() {
		let content = parse_document("## A\n![broken\ntext\n");
		assert_eq!(content.achievements[0].image, None);
		assert_eq!(content.achievements[0].description, "text");
	}

	#[test]
	fn document_without_header_keeps_first_block() {
		let content = parse_document("## A\none\n---\n## B\ntwo\n");
		assert!(content.metadata.is_empty());
		assert_eq!(content.achievements.len(), 2);
		assert_eq!(content.achievements[0].description, "one");
	}

	#[test]
	fn metadata_values_may_contain_colons_and_keyless_lines_are_ignored() {
		let content = parse_document("---\nurl: https://example.com\nnot metadata\n: empty key\n---\n");
		assert_eq!(
			content.metadata.get("url").map(String::as_str),
			Some("https://example.com")
		);
		assert_eq!(content.metadata.len(), 1);
		assert!(content.achievements.is_empty());
	}

	#[test]
	fn lines_outside_blocks_and_subheadings_are_ignored() {
		let doc = "intro text\n## A\n### detail heading\nbody\n---\nstray line\n## B\n";
		let content = parse_document(doc);
		assert_eq!(content.achievements.len(), 2);
		assert_eq!(content.achievements[0].description, "body");
		assert_eq!(content.achievements[1].description, "");
	}

	#[test]
	fn full_width_colon_tag_and_multiline_description() {
		let doc = "## A\n**标签**：进阶\n  line one  \n\nline two\n";
		let a = &parse_document(doc).achievements[0];
		assert_eq!(a.tag, "进阶");
		assert_eq!(a.description, "line one line two");
	}

	#[test]
	fn empty_document_yields_nothing() {
		assert_eq!(parse_document(""), TopicContent::default());
		assert_eq!(parse_document("\n\n---\n"), TopicContent::default());
	}

	#[test]
	fn concurrent_loads_of_one_topic_share_a_fetch() {
		let (loader, fetches) = counting_loader(Some("## A\nbody\n"));
		let (preload, click) = block_on(async { futures::join!(loader.load("video"), loader.load("video")) });
		assert_eq!(fetches.get(), 1);
		assert_eq!(preload, click);
		assert_eq!(click.achievements[0].title, "A");
		assert_eq!(loader.cached("video"), Some(click));

		block_on(loader.load("video"));
		assert_eq!(fetches.get(), 1);
		assert!(loader.in_flight.borrow().is_empty());
	}

	#[test]
	fn failed_load_is_not_cached_and_retries() {
		let (loader, fetches) = counting_loader(None);
		assert_eq!(block_on(loader.load("video")), TopicContent::default());
		assert!(loader.cached("video").is_none());
		block_on(loader.load("video"));
		assert_eq!(fetches.get(), 2);
	}

	#[test]
	fn url_for_joins_root() {
		assert_eq!(ContentLoader::new("content/").url_for("video"), "content/video.md");
		assert_eq!(ContentLoader::new("").url_for("video"), "video.md");
	}
}
