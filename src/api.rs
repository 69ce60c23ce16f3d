//! Block-list API surface: endpoint layout, user records, and the one-shot calls around a drain.

// self
use crate::{
	_prelude::*,
	error::ConfigError,
	http::{ApiHttpClient, ApiRequest},
	obs::{self, ApiOperation, OperationOutcome, OperationSpan},
	pagination::{Collector, DrainError},
};

/// Default REST base for the v1.1 API family.
pub const DEFAULT_API_BASE: &str = "https://api.twitter.com/1.1/";

const VERIFY_CREDENTIALS_PATH: &str = "account/verify_credentials.json";
const BLOCKED_IDS_PATH: &str = "blocks/ids.json";
const DESTROY_BLOCK_PATH: &str = "blocks/destroy.json";
const USERS_LOOKUP_PATH: &str = "users/lookup.json";

/// Display metadata for an account.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
	/// Numeric account identifier.
	pub id: i64,
	/// Display name.
	pub name: String,
	/// Handle without the leading `@`.
	pub screen_name: String,
}
impl Display for User {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		write!(f, "{} (@{}, {})", self.name, self.screen_name, self.id)
	}
}

/// Resolved endpoint URLs for a single API base.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ApiEndpoints {
	/// Base every endpoint is joined onto; always ends with `/`.
	pub base: Url,
	/// Identity verification.
	pub verify_credentials: Url,
	/// Paginated block list.
	pub blocked_ids: Url,
	/// Block removal.
	pub destroy_block: Url,
	/// User lookup by identifier.
	pub users_lookup: Url,
}
impl ApiEndpoints {
	/// Validates `base` and resolves every endpoint against it.
	///
	/// A missing trailing slash is added so relative joins keep the version segment.
	pub fn new(mut base: Url) -> Result<Self, ConfigError> {
		if !matches!(base.scheme(), "http" | "https") {
			return Err(ConfigError::InvalidApiBase {
				url: base.to_string(),
				reason: "scheme must be http or https",
			});
		}
		if base.cannot_be_a_base() {
			return Err(ConfigError::InvalidApiBase {
				url: base.to_string(),
				reason: "URL cannot be used as a base",
			});
		}
		if base.query().is_some() || base.fragment().is_some() {
			return Err(ConfigError::InvalidApiBase {
				url: base.to_string(),
				reason: "query strings and fragments are not allowed",
			});
		}
		if !base.path().ends_with('/') {
			let path = format!("{}/", base.path());

			base.set_path(&path);
		}

		let join = |path: &'static str| {
			base.join(path).map_err(|source| ConfigError::InvalidEndpoint { path, source })
		};

		Ok(Self {
			verify_credentials: join(VERIFY_CREDENTIALS_PATH)?,
			blocked_ids: join(BLOCKED_IDS_PATH)?,
			destroy_block: join(DESTROY_BLOCK_PATH)?,
			users_lookup: join(USERS_LOOKUP_PATH)?,
			base,
		})
	}
}

/// Client for the block-list API, pairing a transport with resolved endpoints.
pub struct BlocksClient<C>
where
	C: ?Sized + ApiHttpClient,
{
	/// Transport shared by every call, including the collector's page requests.
	pub http_client: Arc<C>,
	/// Endpoint layout in use.
	pub endpoints: ApiEndpoints,
	collector: Collector<C>,
}
impl<C> BlocksClient<C>
where
	C: ?Sized + ApiHttpClient,
{
	/// Creates a client with a default [`Collector`] over the same transport.
	pub fn new(http_client: Arc<C>, endpoints: ApiEndpoints) -> Self {
		let collector = Collector::new(Arc::clone(&http_client));

		Self { http_client, endpoints, collector }
	}

	/// Replaces the collector, e.g. to set a decode policy or request deadline.
	pub fn with_collector(mut self, collector: Collector<C>) -> Self {
		self.collector = collector;

		self
	}

	/// Returns the collector used for paginated listings.
	pub fn collector(&self) -> &Collector<C> {
		&self.collector
	}

	/// Resolves the signed-in account.
	pub async fn verify_credentials(&self) -> Result<User> {
		let mut url = self.endpoints.verify_credentials.clone();

		url.query_pairs_mut()
			.append_pair("skip_status", "true")
			.append_pair("include_email", "true");

		self.observe(ApiOperation::VerifyCredentials, self.get_json(url)).await
	}

	/// Drains the full block list.
	pub async fn blocked_ids(&self) -> Result<Vec<i64>, DrainError> {
		self.collector.drain(&self.endpoints.blocked_ids).await
	}

	/// Looks up display metadata for `id`.
	pub async fn lookup_user(&self, id: i64) -> Result<User> {
		let url = with_user_id(&self.endpoints.users_lookup, id);

		self.observe(ApiOperation::LookupUser, async {
			let users = self.get_json::<Vec<User>>(url).await?;

			users.into_iter().find(|user| user.id == id).ok_or(Error::UserNotFound { id })
		})
		.await
	}

	/// Lifts the block on `id`. Only the status code is checked; the body is ignored.
	pub async fn destroy_block(&self, id: i64) -> Result<()> {
		let url = with_user_id(&self.endpoints.destroy_block, id);

		self.observe(ApiOperation::DestroyBlock, async {
			self.http_client.execute(ApiRequest::get(url).accept_json()).await?.error_for_status()?;

			Ok::<_, Error>(())
		})
		.await
	}

	async fn get_json<T>(&self, url: Url) -> Result<T>
	where
		T: DeserializeOwned,
	{
		let response = self.http_client.execute(ApiRequest::get(url).accept_json()).await?;

		Ok(response.error_for_status()?.json()?)
	}

	async fn observe<T, Fut>(&self, operation: ApiOperation, fut: Fut) -> Result<T>
	where
		Fut: Future<Output = Result<T>>,
	{
		let span = OperationSpan::new(operation, "request");

		obs::record_operation_outcome(operation, OperationOutcome::Attempt);

		let result = span.instrument(fut).await;

		obs::record_operation_outcome(operation, OperationOutcome::of(&result));

		result
	}
}
impl<C> Debug for BlocksClient<C>
where
	C: ?Sized + ApiHttpClient,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("BlocksClient")
			.field("endpoints", &self.endpoints)
			.field("collector", &self.collector)
			.finish()
	}
}

fn with_user_id(endpoint: &Url, id: i64) -> Url {
	let mut url = endpoint.clone();

	url.query_pairs_mut().append_pair("user_id", &id.to_string());

	url
}
