//! Cursor-paginated collection draining.
//!
//! A listing endpoint answers each request with a page of identifiers and a `next_cursor`.
//! A cursor of `0` is terminal; any other value is echoed back verbatim as the `cursor` query
//! parameter of the next request. The first request carries no cursor at all.
//!
//! [`Collector::drain`] walks those pages strictly one at a time and concatenates their
//! identifiers in arrival order. When a page cannot be fetched the identifiers gathered so far
//! are handed back inside [`DrainError`] rather than discarded.

// std
use std::{num::NonZeroUsize, time::Duration};
// self
use crate::{
	_prelude::*,
	error::TransportError,
	http::{ApiHttpClient, ApiRequest},
	obs::{self, ApiOperation, OperationOutcome, OperationSpan},
};

/// Cursor value the API uses to signal that no further pages exist.
pub const TERMINAL_CURSOR: i64 = 0;
/// Query parameter carrying the continuation cursor.
pub const CURSOR_PARAM: &str = "cursor";

/// One decoded listing response.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page {
	/// Identifiers in this page, in server order.
	#[serde(default)]
	pub ids: Vec<i64>,
	/// Continuation token; [`TERMINAL_CURSOR`] ends the drain.
	#[serde(default)]
	pub next_cursor: i64,
}

/// Collector-side pagination state.
///
/// `Done` is internal bookkeeping and never collides with a value received from the API.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Cursor {
	/// No request issued yet; the cursor parameter is omitted.
	Initial,
	/// Continuation token to echo on the next request.
	Next(i64),
	/// A terminal cursor was received.
	Done,
}
impl Cursor {
	/// Interprets a `next_cursor` value received from the API.
	pub fn after(next_cursor: i64) -> Self {
		if next_cursor == TERMINAL_CURSOR { Cursor::Done } else { Cursor::Next(next_cursor) }
	}

	/// Builds the URL for the request this cursor calls for, or `None` once done.
	///
	/// Query parameters already present on `endpoint` are kept.
	pub fn request_url(self, endpoint: &Url) -> Option<Url> {
		match self {
			Cursor::Initial => Some(endpoint.clone()),
			Cursor::Next(value) => {
				let mut url = endpoint.clone();

				url.query_pairs_mut().append_pair(CURSOR_PARAM, &value.to_string());

				Some(url)
			},
			Cursor::Done => None,
		}
	}
}

/// How undecodable page bodies are treated.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum DecodePolicy {
	/// Abort the drain with [`Error::Decode`], keeping the partial sequence.
	#[default]
	Strict,
	/// Treat the body as an empty terminal page and stop without an error.
	Lenient,
}

/// Failure raised by [`Collector::drain`], carrying every identifier gathered before it.
#[derive(Debug, ThisError)]
#[error("Drain stopped after collecting {} identifiers.", .partial.len())]
pub struct DrainError {
	/// Identifiers from the pages that were fetched successfully, in order.
	pub partial: Vec<i64>,
	/// What stopped the drain.
	#[source]
	pub source: Error,
}
impl DrainError {
	/// Pairs the partial sequence with the error that ended the drain.
	pub fn new(partial: Vec<i64>, source: impl Into<Error>) -> Self {
		Self { partial, source: source.into() }
	}

	/// Discards the partial sequence and returns the underlying error.
	pub fn into_source(self) -> Error {
		self.source
	}
}

/// Drains cursor-paginated listing endpoints over a shared transport.
///
/// The collector keeps no state between calls, so repeated drains over unchanged data yield
/// identical sequences.
pub struct Collector<C>
where
	C: ?Sized + ApiHttpClient,
{
	http_client: Arc<C>,
	decode_policy: DecodePolicy,
	request_timeout: Option<Duration>,
	max_pages: Option<NonZeroUsize>,
}
impl<C> Collector<C>
where
	C: ?Sized + ApiHttpClient,
{
	/// Creates a collector with strict decoding, no deadline, and no page guard.
	pub fn new(http_client: Arc<C>) -> Self {
		Self {
			http_client,
			decode_policy: DecodePolicy::default(),
			request_timeout: None,
			max_pages: None,
		}
	}

	/// Sets how undecodable bodies are handled.
	pub fn with_decode_policy(mut self, policy: DecodePolicy) -> Self {
		self.decode_policy = policy;

		self
	}

	/// Bounds every page request; an elapsed deadline counts as a transport failure.
	pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
		self.request_timeout = Some(timeout);

		self
	}

	/// Stops with [`Error::PageLimit`] once `max_pages` pages were fetched without a terminal
	/// cursor. The guard is off unless this is called.
	pub fn with_max_pages(mut self, max_pages: NonZeroUsize) -> Self {
		self.max_pages = Some(max_pages);

		self
	}

	/// Returns the configured decode policy.
	pub fn decode_policy(&self) -> DecodePolicy {
		self.decode_policy
	}

	/// Fetches every page behind `endpoint` and concatenates their identifiers in page order.
	pub async fn drain(&self, endpoint: &Url) -> Result<Vec<i64>, DrainError> {
		let span = OperationSpan::new(ApiOperation::ListBlocks, "drain");

		obs::record_operation_outcome(ApiOperation::ListBlocks, OperationOutcome::Attempt);

		let result = span.instrument(self.drain_pages(endpoint)).await;

		obs::record_operation_outcome(ApiOperation::ListBlocks, OperationOutcome::of(&result));

		result
	}

	async fn drain_pages(&self, endpoint: &Url) -> Result<Vec<i64>, DrainError> {
		let mut ids = Vec::new();
		let mut cursor = Cursor::Initial;
		let mut pages = 0_usize;

		while let Some(url) = cursor.request_url(endpoint) {
			if self.max_pages.is_some_and(|max| pages >= max.get()) {
				return Err(DrainError::new(ids, Error::PageLimit { pages }));
			}

			let page = match self.fetch_page(url).await {
				Ok(page) => page,
				Err(e) => return Err(DrainError::new(ids, e)),
			};

			pages += 1;

			#[cfg(feature = "tracing")]
			tracing::debug!(page = pages, count = page.ids.len(), next_cursor = page.next_cursor);

			cursor = Cursor::after(page.next_cursor);
			ids.extend(page.ids);
		}

		Ok(ids)
	}

	async fn fetch_page(&self, url: Url) -> Result<Page> {
		let request = ApiRequest::get(url).accept_json();
		let response = match self.request_timeout {
			Some(deadline) => tokio::time::timeout(deadline, self.http_client.execute(request))
				.await
				.map_err(|_| TransportError::Timeout { millis: deadline.as_millis() })??,
			None => self.http_client.execute(request).await?,
		};
		let response = response.error_for_status()?;

		match (response.json::<Page>(), self.decode_policy) {
			(Ok(page), _) => Ok(page),
			(Err(e), DecodePolicy::Strict) => Err(e.into()),
			(Err(_e), DecodePolicy::Lenient) => {
				#[cfg(feature = "tracing")]
				tracing::warn!(error = %_e, "Treating undecodable page as an empty terminal page.");

				Ok(Page::default())
			},
		}
	}
}
impl<C> Clone for Collector<C>
where
	C: ?Sized + ApiHttpClient,
{
	fn clone(&self) -> Self {
		Self {
			http_client: Arc::clone(&self.http_client),
			decode_policy: self.decode_policy,
			request_timeout: self.request_timeout,
			max_pages: self.max_pages,
		}
	}
}
impl<C> Debug for Collector<C>
where
	C: ?Sized + ApiHttpClient,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("Collector")
			.field("decode_policy", &self.decode_policy)
			.field("request_timeout", &self.request_timeout)
			.field("max_pages", &self.max_pages)
			.finish()
	}
}

#[cfg(test)]
mod tests {
	// std
	use std::collections::VecDeque;
	// crates.io
	use parking_lot::Mutex;
	// self
	use super::*;
	use crate::http::{ApiResponse, HttpFuture};

	enum Step {
		Respond(u16, String),
		Fail,
		Stall,
	}

	#[derive(Default)]
	struct ScriptedTransport {
		steps: Mutex<VecDeque<Step>>,
		seen: Mutex<Vec<ApiRequest>>,
	}
	impl ScriptedTransport {
		fn pages(pages: impl IntoIterator<Item = (Vec<i64>, i64)>) -> Self {
			let steps = pages
				.into_iter()
				.map(|(ids, next)| {
					Step::Respond(
						200,
						serde_json::json!({ "ids": ids, "next_cursor": next }).to_string(),
					)
				})
				.collect();

			Self { steps: Mutex::new(steps), seen: Default::default() }
		}

		fn then(self, step: Step) -> Self {
			self.steps.lock().push_back(step);

			self
		}

		fn urls(&self) -> Vec<String> {
			self.seen.lock().iter().map(|request| request.url.to_string()).collect()
		}
	}
	impl ApiHttpClient for ScriptedTransport {
		fn execute(&self, request: ApiRequest) -> HttpFuture<'_> {
			self.seen.lock().push(request);

			let step = self.steps.lock().pop_front();

			Box::pin(async move {
				match step {
					Some(Step::Respond(status, body)) => Ok(ApiResponse::new(status, body)),
					Some(Step::Stall) => {
						tokio::time::sleep(Duration::from_secs(60)).await;

						Ok(ApiResponse::new(200, "{}"))
					},
					Some(Step::Fail) | None => {
						let reset = std::io::Error::new(
							std::io::ErrorKind::ConnectionReset,
							"connection reset",
						);

						Err(Error::Transport(TransportError::network(reset)))
					},
				}
			})
		}
	}

	const ENDPOINT: &str = "https://api.example.com/1.1/blocks/ids.json";

	fn endpoint() -> Url {
		Url::parse(ENDPOINT).expect("Endpoint fixture should parse.")
	}

	#[tokio::test]
	async fn drain_concatenates_pages_and_echoes_cursors() {
		let transport =
			Arc::new(ScriptedTransport::pages(vec![(vec![10, 20, 30], 5), (vec![40], 0)]));
		let collector = Collector::new(transport.clone());
		let ids = collector.drain(&endpoint()).await.expect("Two-page drain should succeed.");

		assert_eq!(ids, vec![10, 20, 30, 40]);
		assert_eq!(transport.urls(), vec![ENDPOINT.to_owned(), format!("{ENDPOINT}?cursor=5")]);
		assert!(
			transport
				.seen
				.lock()
				.iter()
				.all(|request| request.header("Accept") == Some("application/json"))
		);
	}

	#[tokio::test]
	async fn drain_walks_many_pages_in_order() {
		let pages = (1..=5_i64)
			.map(|i| (vec![i * 100, i * 100 + 1], if i == 5 { 0 } else { i + 1 }))
			.collect::<Vec<_>>();
		let transport = Arc::new(ScriptedTransport::pages(pages.clone()));
		let ids = Collector::new(transport.clone())
			.drain(&endpoint())
			.await
			.expect("Five-page drain should succeed.");
		let expected = pages.iter().flat_map(|(ids, _)| ids.clone()).collect::<Vec<_>>();
		let urls = transport.urls();

		assert_eq!(ids, expected);
		assert_eq!(urls.len(), 5);
		assert!(!urls[0].contains("cursor="));

		for (i, url) in urls.iter().enumerate().skip(1) {
			assert!(url.ends_with(&format!("cursor={}", i + 1)), "Unexpected URL {url}.");
		}
	}

	#[tokio::test]
	async fn empty_terminal_page_yields_empty_sequence() {
		let transport = Arc::new(ScriptedTransport::pages(vec![(vec![], 0)]));
		let ids = Collector::new(transport.clone())
			.drain(&endpoint())
			.await
			.expect("Empty block list should not be an error.");

		assert!(ids.is_empty());
		assert_eq!(transport.urls().len(), 1);
	}

	#[tokio::test]
	async fn transport_failure_keeps_partial_sequence() {
		let transport = Arc::new(
			ScriptedTransport::pages(vec![(vec![1, 2], 7), (vec![3], 8)]).then(Step::Fail),
		);
		let err = Collector::new(transport.clone())
			.drain(&endpoint())
			.await
			.expect_err("Third page failure should abort the drain.");

		assert_eq!(err.partial, vec![1, 2, 3]);
		assert!(matches!(err.source, Error::Transport(TransportError::Network { .. })));
		assert_eq!(transport.urls().len(), 3);
	}

	#[tokio::test]
	async fn first_page_failure_returns_nothing() {
		let transport = Arc::new(ScriptedTransport::default().then(Step::Fail));
		let err = Collector::new(transport)
			.drain(&endpoint())
			.await
			.expect_err("First page failure should abort the drain.");

		assert!(err.partial.is_empty());
	}

	#[tokio::test]
	async fn non_success_status_aborts_like_transport_failure() {
		let transport = Arc::new(
			ScriptedTransport::pages(vec![(vec![9], 3)])
				.then(Step::Respond(429, "{\"errors\":[{\"code\":88}]}".into())),
		);
		let err = Collector::new(transport)
			.drain(&endpoint())
			.await
			.expect_err("Rate-limited page should abort the drain.");

		assert_eq!(err.partial, vec![9]);
		assert!(matches!(err.source, Error::Transport(TransportError::Status { status: 429, .. })));
	}

	#[tokio::test]
	async fn strict_policy_reports_undecodable_body() {
		let transport = Arc::new(
			ScriptedTransport::pages(vec![(vec![1], 2)]).then(Step::Respond(200, "<html>".into())),
		);
		let err = Collector::new(transport)
			.drain(&endpoint())
			.await
			.expect_err("Strict decoding should surface malformed bodies.");

		assert_eq!(err.partial, vec![1]);
		assert!(matches!(err.source, Error::Decode(_)));
	}

	#[tokio::test]
	async fn lenient_policy_treats_undecodable_body_as_terminal() {
		let transport = Arc::new(
			ScriptedTransport::pages(vec![(vec![1], 2)])
				.then(Step::Respond(200, "<html>".into()))
				.then(Step::Fail),
		);
		let collector =
			Collector::new(transport.clone()).with_decode_policy(DecodePolicy::Lenient);
		let ids = collector.drain(&endpoint()).await.expect("Lenient decoding should not fail.");

		assert_eq!(collector.decode_policy(), DecodePolicy::Lenient);
		assert_eq!(ids, vec![1]);
		assert_eq!(transport.urls().len(), 2);
	}

	#[tokio::test]
	async fn missing_fields_default_to_empty_terminal_page() {
		let transport =
			Arc::new(ScriptedTransport::default().then(Step::Respond(200, "{}".into())));
		let ids = Collector::new(transport)
			.drain(&endpoint())
			.await
			.expect("An empty object is a valid terminal page.");

		assert!(ids.is_empty());
	}

	#[tokio::test]
	async fn negative_cursor_from_api_is_echoed_verbatim() {
		let transport = Arc::new(ScriptedTransport::pages(vec![(vec![1], -1), (vec![2], 0)]));
		let ids = Collector::new(transport.clone())
			.drain(&endpoint())
			.await
			.expect("Negative cursors are opaque tokens, not terminal markers.");

		assert_eq!(ids, vec![1, 2]);
		assert!(transport.urls()[1].ends_with("cursor=-1"));
	}

	#[tokio::test]
	async fn page_limit_stops_endless_pagination() {
		let transport =
			Arc::new(ScriptedTransport::pages(vec![(vec![1], 1), (vec![2], 2), (vec![3], 3)]));
		let err = Collector::new(transport.clone())
			.with_max_pages(NonZeroUsize::MIN.saturating_add(1))
			.drain(&endpoint())
			.await
			.expect_err("Page guard should stop the drain.");

		assert_eq!(err.partial, vec![1, 2]);
		assert!(matches!(err.source, Error::PageLimit { pages: 2 }));
		assert_eq!(transport.urls().len(), 2);
	}

	#[tokio::test]
	async fn single_page_guard_still_fetches_the_first_page() {
		let transport = Arc::new(ScriptedTransport::pages(vec![(vec![1], 0)]));
		let ids = Collector::new(transport.clone())
			.with_max_pages(NonZeroUsize::MIN)
			.drain(&endpoint())
			.await
			.expect("A one-page list fits a one-page guard.");

		assert_eq!(ids, vec![1]);
		assert_eq!(transport.urls().len(), 1);
	}

	#[tokio::test(start_paused = true)]
	async fn request_timeout_counts_as_transport_failure() {
		let transport =
			Arc::new(ScriptedTransport::pages(vec![(vec![5, 6], 11)]).then(Step::Stall));
		let err = Collector::new(transport)
			.with_request_timeout(Duration::from_millis(250))
			.drain(&endpoint())
			.await
			.expect_err("Stalled page should time out.");

		assert_eq!(err.partial, vec![5, 6]);
		assert!(matches!(
			err.into_source(),
			Error::Transport(TransportError::Timeout { millis: 250 })
		));
	}

	#[tokio::test]
	async fn redrain_over_unchanged_data_is_identical() {
		let script = vec![(vec![3, 1], 4), (vec![4, 1, 5], 0)];
		let first = Arc::new(ScriptedTransport::pages(script.clone()));
		let second = Arc::new(ScriptedTransport::pages(script));
		let collector = Collector::new(first.clone());
		let a = collector.drain(&endpoint()).await.expect("First drain should succeed.");
		let b = Collector::new(second.clone())
			.drain(&endpoint())
			.await
			.expect("Second drain should succeed.");

		assert_eq!(a, b);
		assert_eq!(first.urls(), second.urls());
	}

	#[test]
	fn cursor_request_url_preserves_existing_query() {
		let base = Url::parse("https://api.example.com/1.1/blocks/ids.json?stringify_ids=false")
			.expect("Endpoint fixture should parse.");

		assert_eq!(Cursor::Initial.request_url(&base), Some(base.clone()));
		assert_eq!(
			Cursor::after(42).request_url(&base).map(|url| url.to_string()),
			Some(format!("{base}&cursor=42")),
		);
		assert_eq!(Cursor::after(TERMINAL_CURSOR), Cursor::Done);
		assert_eq!(Cursor::Done.request_url(&base), None);
	}
}
