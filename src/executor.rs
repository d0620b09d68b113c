//! Authorized resource calls with a single 401-driven retry.
//!
//! [`AuthorizedRequestExecutor::execute_authorized`] resolves the registration, obtains a token
//! (cache first, acquirer on a miss), attaches `Authorization: Bearer`, and sends the request.
//! When the resource server answers 401 the cached token is evicted, a fresh one is acquired, and
//! the request is sent exactly once more. Other error statuses are surfaced unchanged and never
//! touch the cache.
//!
//! Acquisition is single-flight per registration id: concurrent callers that miss the cache wait
//! on one async mutex and reuse the token the first caller stored.

pub mod hooks;
pub mod policy;

pub use hooks::*;
pub use policy::*;

// crates.io
use oauth2::http::{HeaderValue, StatusCode, header::AUTHORIZATION};
use serde::de::DeserializeOwned;
// self
use crate::{
	_prelude::*,
	acquire::TokenAcquirer,
	auth::{AccessToken, RegistrationId},
	clock::{Clock, SystemClock},
	error::{ConfigError, DownstreamRequestError},
	http::{DownstreamClient, ResourceRequest, ResourceResponse},
	obs::{self, CallSpan, Operation, Outcome},
	registration::{ClientRegistration, ClientRegistrations},
	store::TokenStore,
};

type AcquireGuards = Arc<Mutex<HashMap<RegistrationId, Arc<AsyncMutex<()>>>>>;

/// Executes resource requests on behalf of configured client registrations.
#[derive(Clone)]
pub struct AuthorizedRequestExecutor {
	registrations: Arc<ClientRegistrations>,
	store: Arc<dyn TokenStore>,
	acquirer: Arc<dyn TokenAcquirer>,
	downstream: Arc<dyn DownstreamClient>,
	hooks: Arc<dyn AuthorizationHooks>,
	clock: Arc<dyn Clock>,
	policy: TokenPolicy,
	acquire_guards: AcquireGuards,
}
impl AuthorizedRequestExecutor {
	/// Creates an executor with no-op hooks, the system clock and the default [`TokenPolicy`].
	pub fn new(
		registrations: impl Into<Arc<ClientRegistrations>>,
		store: Arc<dyn TokenStore>,
		acquirer: Arc<dyn TokenAcquirer>,
		downstream: Arc<dyn DownstreamClient>,
	) -> Self {
		Self {
			registrations: registrations.into(),
			store,
			acquirer,
			downstream,
			hooks: Arc::new(NoopHooks),
			clock: Arc::new(SystemClock),
			policy: TokenPolicy::default(),
			acquire_guards: Default::default(),
		}
	}

	/// Replaces the authorization hooks.
	pub fn with_hooks(mut self, hooks: Arc<dyn AuthorizationHooks>) -> Self {
		self.hooks = hooks;

		self
	}

	/// Replaces the clock used for expiry checks.
	pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
		self.clock = clock;

		self
	}

	/// Replaces the token policy.
	pub fn with_policy(mut self, policy: TokenPolicy) -> Self {
		self.policy = policy;

		self
	}

	/// Token store shared with the executor.
	pub fn store(&self) -> &Arc<dyn TokenStore> {
		&self.store
	}

	/// Registrations the executor can authorize for.
	pub fn registrations(&self) -> &ClientRegistrations {
		&self.registrations
	}

	/// Sends `request` with a bearer token for `registration`, retrying once after a 401.
	///
	/// Any status of 400 or above on the final attempt becomes a [`DownstreamRequestError`].
	pub async fn execute_authorized(
		&self,
		registration: &RegistrationId,
		request: ResourceRequest,
	) -> Result<ResourceResponse> {
		let span = CallSpan::new(registration, "execute_authorized");

		obs::record_outcome(Operation::Execute, Outcome::Attempt);

		let result = span.in_span(self.execute_inner(registration, request)).await;

		match &result {
			Ok(_) => obs::record_outcome(Operation::Execute, Outcome::Success),
			Err(_) => obs::record_outcome(Operation::Execute, Outcome::Failure),
		}

		result
	}

	/// Same as [`execute_authorized`](Self::execute_authorized), then decodes the JSON body.
	pub async fn execute_json<T>(
		&self,
		registration: &RegistrationId,
		request: ResourceRequest,
	) -> Result<T>
	where
		T: DeserializeOwned,
	{
		let method = request.method.clone();
		let url = request.url.clone();
		let response = self.execute_authorized(registration, request).await?;
		let mut deserializer = serde_json::Deserializer::from_slice(&response.body);

		serde_path_to_error::deserialize(&mut deserializer).map_err(|err| {
			DownstreamRequestError::decode(
				method,
				url,
				response.status.as_u16(),
				response.body_text(),
				err,
			)
			.into()
		})
	}

	async fn execute_inner(
		&self,
		id: &RegistrationId,
		request: ResourceRequest,
	) -> Result<ResourceResponse> {
		let registration = self
			.registrations
			.get(id)
			.ok_or_else(|| ConfigError::UnknownRegistration { registration: id.to_string() })?;
		let token = self.current_token(registration).await?;
		let response = self.send(registration, &request, &token).await?;

		if response.status != StatusCode::UNAUTHORIZED {
			return finish(request, response);
		}

		tracing::info!(
			registration = %id,
			method = %request.method,
			url = %request.url,
			"Resource server rejected the access token; evicting and retrying once."
		);
		obs::record_outcome(Operation::Execute, Outcome::Retry);
		self.hooks.on_authorization_failure(
			id,
			AuthorizationFailure::ResourceServer { status: StatusCode::UNAUTHORIZED.as_u16() },
		);
		// Unconditional: the retry's acquisition must never observe the rejected token.
		self.store.remove(id).await?;

		let token = self.replacement_token(registration, &token).await?;
		let response = self.send(registration, &request, &token).await?;

		finish(request, response)
	}

	async fn current_token(&self, registration: &ClientRegistration) -> Result<AccessToken> {
		if let Some(token) = self.usable_cached(&registration.id).await? {
			return Ok(token);
		}

		let guard = self.acquire_guard(&registration.id);
		let _singleflight = guard.lock().await;

		if let Some(token) = self.usable_cached(&registration.id).await? {
			tracing::debug!(
				registration = %registration.id,
				"Reusing token stored by a concurrent call."
			);

			return Ok(token);
		}

		self.acquire_and_store(registration).await
	}

	async fn replacement_token(
		&self,
		registration: &ClientRegistration,
		rejected: &AccessToken,
	) -> Result<AccessToken> {
		let guard = self.acquire_guard(&registration.id);
		let _singleflight = guard.lock().await;

		if let Some(token) = self
			.usable_cached(&registration.id)
			.await?
			.filter(|token| token.access_token != rejected.access_token)
		{
			return Ok(token);
		}

		self.acquire_and_store(registration).await
	}

	async fn usable_cached(&self, id: &RegistrationId) -> Result<Option<AccessToken>> {
		let now = self.clock.now();

		Ok(self.store.get(id).await?.filter(|token| self.policy.is_usable(token, now)))
	}

	async fn acquire_and_store(&self, registration: &ClientRegistration) -> Result<AccessToken> {
		match self.acquirer.acquire(registration).await {
			Ok(token) => {
				self.store.put(&registration.id, token.clone()).await?;
				self.hooks.on_authorization_success(&registration.id, &token);

				Ok(token)
			},
			Err(failure) => {
				self.hooks.on_authorization_failure(
					&registration.id,
					AuthorizationFailure::TokenEndpoint(&failure),
				);

				Err(failure.into())
			},
		}
	}

	async fn send(
		&self,
		registration: &ClientRegistration,
		request: &ResourceRequest,
		token: &AccessToken,
	) -> Result<ResourceResponse> {
		let mut authorization =
			HeaderValue::from_str(&format!("Bearer {}", token.access_token.expose()))
				.map_err(|source| ConfigError::InvalidHeader { name: "authorization", source })?;

		authorization.set_sensitive(true);

		let mut request = request.clone();

		request.headers.insert(AUTHORIZATION, authorization);

		let method = request.method.clone();
		let url = request.url.clone();

		tracing::debug!(
			registration = %registration.id,
			method = %method,
			url = %url,
			"Sending authorized request."
		);

		let response = self
			.downstream
			.send(request)
			.await
			.map_err(|err| DownstreamRequestError::network(method, url, err))?;

		tracing::debug!(
			registration = %registration.id,
			status = response.status.as_u16(),
			"Resource server responded."
		);

		Ok(response)
	}

	fn acquire_guard(&self, id: &RegistrationId) -> Arc<AsyncMutex<()>> {
		let mut guards = self.acquire_guards.lock();

		guards.entry(id.clone()).or_insert_with(|| Arc::new(AsyncMutex::new(()))).clone()
	}
}
impl Debug for AuthorizedRequestExecutor {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("AuthorizedRequestExecutor")
			.field("registrations", &self.registrations.len())
			.field("policy", &self.policy)
			.finish_non_exhaustive()
	}
}

fn finish(request: ResourceRequest, response: ResourceResponse) -> Result<ResourceResponse> {
	if response.status.is_client_error() || response.status.is_server_error() {
		let body = response.body_text();

		return Err(DownstreamRequestError::from_status(
			request.method,
			request.url,
			response.status.as_u16(),
			body,
		)
		.into());
	}

	Ok(response)
}

#[cfg(test)]
mod tests {
	// std
	use std::{
		collections::VecDeque,
		sync::atomic::{AtomicUsize, Ordering},
	};
	// crates.io
	use time::macros;
	// self
	use super::*;
	use crate::{
		acquire::AcquireFuture,
		auth::ClientId,
		clock::FixedClock,
		error::{AuthFailure, AuthFailureKind, TransportError},
		http::DownstreamFuture,
		store::MemoryStore,
	};

	const NOW: OffsetDateTime = macros::datetime!(2025-01-01 00:00 UTC);

	fn id() -> RegistrationId {
		RegistrationId::new("my-client").expect("Registration id fixture should be valid.")
	}

	fn token(value: &str, lifetime: Duration) -> AccessToken {
		AccessToken::builder()
			.access_token(value)
			.issued_at(NOW)
			.expires_in(lifetime)
			.build()
			.expect("Token fixture should build.")
	}

	fn url() -> Url {
		Url::parse("https://resource.example.com/words").expect("Resource URL fixture should parse.")
	}

	fn ok(body: &str) -> ResourceResponse {
		ResourceResponse::new(StatusCode::OK, body)
	}

	fn status(code: StatusCode) -> ResourceResponse {
		ResourceResponse::new(code, "")
	}

	struct FakeAcquirer {
		store: Arc<MemoryStore>,
		script: Mutex<VecDeque<Result<AccessToken, AuthFailureKind>>>,
		calls: AtomicUsize,
		store_empty_on_acquire: Mutex<Vec<bool>>,
	}
	impl FakeAcquirer {
		fn new(
			store: Arc<MemoryStore>,
			script: impl IntoIterator<Item = Result<AccessToken, AuthFailureKind>>,
		) -> Self {
			Self {
				store,
				script: Mutex::new(script.into_iter().collect()),
				calls: AtomicUsize::new(0),
				store_empty_on_acquire: Mutex::new(Vec::new()),
			}
		}

		fn calls(&self) -> usize {
			self.calls.load(Ordering::SeqCst)
		}
	}
	impl TokenAcquirer for FakeAcquirer {
		fn acquire<'a>(&'a self, registration: &'a ClientRegistration) -> AcquireFuture<'a> {
			Box::pin(async move {
				self.calls.fetch_add(1, Ordering::SeqCst);

				let cached = self
					.store
					.get(&registration.id)
					.await
					.expect("Memory store reads should not fail.");

				self.store_empty_on_acquire.lock().push(cached.is_none());

				tokio::task::yield_now().await;

				let next = self.script.lock().pop_front();

				match next {
					Some(Ok(token)) => Ok(token),
					Some(Err(kind)) =>
						Err(AuthFailure::new(kind, "scripted failure").with_status(Some(400))),
					None => Err(AuthFailure::new(AuthFailureKind::Unexpected, "script exhausted")),
				}
			})
		}
	}

	#[derive(Default)]
	struct FakeDownstream {
		script: Mutex<VecDeque<Option<ResourceResponse>>>,
		authorizations: Mutex<Vec<String>>,
	}
	impl FakeDownstream {
		fn new(script: impl IntoIterator<Item = Option<ResourceResponse>>) -> Self {
			Self { script: Mutex::new(script.into_iter().collect()), ..Default::default() }
		}

		fn authorizations(&self) -> Vec<String> {
			self.authorizations.lock().clone()
		}
	}
	impl DownstreamClient for FakeDownstream {
		fn send(&self, request: ResourceRequest) -> DownstreamFuture<'_> {
			Box::pin(async move {
				let authorization = request
					.headers
					.get(AUTHORIZATION)
					.and_then(|value| value.to_str().ok())
					.unwrap_or_default()
					.to_owned();

				self.authorizations.lock().push(authorization);

				let next = self.script.lock().pop_front().flatten();

				next.ok_or_else(|| {
					TransportError::Io(std::io::Error::new(
						std::io::ErrorKind::ConnectionRefused,
						"refused",
					))
				})
			})
		}
	}

	#[derive(Default)]
	struct CountingHooks {
		successes: AtomicUsize,
		token_failures: AtomicUsize,
		resource_failures: AtomicUsize,
	}
	impl AuthorizationHooks for CountingHooks {
		fn on_authorization_success(&self, _: &RegistrationId, _: &AccessToken) {
			self.successes.fetch_add(1, Ordering::SeqCst);
		}

		fn on_authorization_failure(&self, _: &RegistrationId, failure: AuthorizationFailure<'_>) {
			match failure {
				AuthorizationFailure::TokenEndpoint(_) =>
					self.token_failures.fetch_add(1, Ordering::SeqCst),
				AuthorizationFailure::ResourceServer { .. } =>
					self.resource_failures.fetch_add(1, Ordering::SeqCst),
			};
		}
	}

	struct Harness {
		store: Arc<MemoryStore>,
		acquirer: Arc<FakeAcquirer>,
		downstream: Arc<FakeDownstream>,
		hooks: Arc<CountingHooks>,
		executor: AuthorizedRequestExecutor,
	}

	fn harness(
		tokens: impl IntoIterator<Item = Result<AccessToken, AuthFailureKind>>,
		responses: impl IntoIterator<Item = Option<ResourceResponse>>,
	) -> Harness {
		let registration = ClientRegistration::builder(id())
			.token_endpoint(
				Url::parse("https://auth.example.com/token")
					.expect("Token URL fixture should parse."),
			)
			.client_id(ClientId::new("my-client-id").expect("Client id fixture should be valid."))
			.client_secret("s3cret")
			.build()
			.expect("Registration fixture should build.");
		let registrations = ClientRegistrations::new([registration])
			.expect("Registration repository fixture should build.");
		let store = Arc::new(MemoryStore::new());
		let acquirer = Arc::new(FakeAcquirer::new(store.clone(), tokens));
		let downstream = Arc::new(FakeDownstream::new(responses));
		let hooks = Arc::new(CountingHooks::default());
		let executor = AuthorizedRequestExecutor::new(
			registrations,
			store.clone(),
			acquirer.clone(),
			downstream.clone(),
		)
		.with_hooks(hooks.clone())
		.with_clock(Arc::new(FixedClock(NOW)));

		Harness { store, acquirer, downstream, hooks, executor }
	}

	async fn seed(store: &MemoryStore, token: AccessToken) {
		store.put(&id(), token).await.expect("Seeding the memory store should succeed.");
	}

	async fn cached(store: &MemoryStore) -> Option<String> {
		store
			.get(&id())
			.await
			.expect("Memory store reads should not fail.")
			.map(|token| token.access_token.expose().to_owned())
	}

	#[tokio::test]
	async fn cached_token_success_skips_acquisition() {
		let h = harness([], [Some(ok("[\"a\",\"b\"]"))]);

		seed(&h.store, token("tok1", Duration::hours(1))).await;

		let words: Vec<String> = h
			.executor
			.execute_json(&id(), ResourceRequest::get(url()))
			.await
			.expect("Cached token call should succeed.");

		assert_eq!(words, ["a", "b"]);
		assert_eq!(h.acquirer.calls(), 0);
		assert_eq!(h.downstream.authorizations(), ["Bearer tok1"]);
	}

	#[tokio::test]
	async fn first_call_acquires_and_caches() {
		let h = harness([Ok(token("tok1", Duration::hours(1)))], [Some(ok("[]")), Some(ok("[]"))]);

		for _ in 0..2 {
			h.executor
				.execute_authorized(&id(), ResourceRequest::get(url()))
				.await
				.expect("Authorized call should succeed.");
		}

		assert_eq!(h.acquirer.calls(), 1);
		assert_eq!(h.hooks.successes.load(Ordering::SeqCst), 1);
		assert_eq!(cached(&h.store).await.as_deref(), Some("tok1"));
	}

	#[tokio::test]
	async fn unauthorized_evicts_then_retries_once_with_new_token() {
		let h = harness(
			[Ok(token("tok2", Duration::hours(1)))],
			[Some(status(StatusCode::UNAUTHORIZED)), Some(ok("[\"a\",\"b\"]"))],
		);

		seed(&h.store, token("tok1", Duration::hours(1))).await;

		let words: Vec<String> = h
			.executor
			.execute_json(&id(), ResourceRequest::get(url()))
			.await
			.expect("Retry after 401 should succeed.");

		assert_eq!(words, ["a", "b"]);
		assert_eq!(h.acquirer.calls(), 1);
		assert_eq!(*h.acquirer.store_empty_on_acquire.lock(), [true]);
		assert_eq!(h.downstream.authorizations(), ["Bearer tok1", "Bearer tok2"]);
		assert_eq!(cached(&h.store).await.as_deref(), Some("tok2"));
		assert_eq!(h.hooks.resource_failures.load(Ordering::SeqCst), 1);
	}

	#[tokio::test]
	async fn second_unauthorized_is_surfaced_without_further_retries() {
		let h = harness(
			[Ok(token("tok1", Duration::hours(1))), Ok(token("tok2", Duration::hours(1)))],
			[Some(status(StatusCode::UNAUTHORIZED)), Some(status(StatusCode::UNAUTHORIZED))],
		);
		let err = h
			.executor
			.execute_authorized(&id(), ResourceRequest::get(url()))
			.await
			.expect_err("Two 401s must fail the call.");

		assert!(matches!(&err, Error::Downstream(failure) if failure.is_unauthorized()));
		assert_eq!(h.acquirer.calls(), 2);
		assert_eq!(h.downstream.authorizations().len(), 2);
		assert_eq!(*h.acquirer.store_empty_on_acquire.lock(), [true, true]);
	}

	#[tokio::test]
	async fn server_errors_leave_the_cache_untouched() {
		let h = harness([], [Some(status(StatusCode::INTERNAL_SERVER_ERROR))]);

		seed(&h.store, token("tok1", Duration::hours(1))).await;

		let err = h
			.executor
			.execute_authorized(&id(), ResourceRequest::get(url()))
			.await
			.expect_err("A 500 must fail the call.");

		assert_eq!(err.http_status(), Some(500));
		assert_eq!(h.acquirer.calls(), 0);
		assert_eq!(h.downstream.authorizations().len(), 1);
		assert_eq!(cached(&h.store).await.as_deref(), Some("tok1"));
	}

	#[tokio::test]
	async fn acquisition_failure_sends_no_request() {
		let h = harness([Err(AuthFailureKind::InvalidClient)], []);
		let err = h
			.executor
			.execute_authorized(&id(), ResourceRequest::get(url()))
			.await
			.expect_err("Acquisition failures must be surfaced.");

		assert!(
			matches!(&err, Error::Auth(failure) if failure.kind == AuthFailureKind::InvalidClient)
		);
		assert!(h.downstream.authorizations().is_empty());
		assert_eq!(h.hooks.token_failures.load(Ordering::SeqCst), 1);
		assert_eq!(cached(&h.store).await, None);
	}

	#[tokio::test]
	async fn network_failures_carry_no_status() {
		let h = harness([], [None]);

		seed(&h.store, token("tok1", Duration::hours(1))).await;

		let err = h
			.executor
			.execute_authorized(&id(), ResourceRequest::get(url()))
			.await
			.expect_err("Network failures must be surfaced.");

		assert!(matches!(&err, Error::Downstream(failure) if failure.status.is_none()));
		assert_eq!(cached(&h.store).await.as_deref(), Some("tok1"));
	}

	#[tokio::test]
	async fn undecodable_body_reports_status_and_body() {
		let h = harness([], [Some(ok("{\"words\":1}"))]);

		seed(&h.store, token("tok1", Duration::hours(1))).await;

		let err = h
			.executor
			.execute_json::<Vec<String>>(&id(), ResourceRequest::get(url()))
			.await
			.expect_err("Non-array bodies must fail to decode.");
		let Error::Downstream(failure) = err else { panic!("Expected a downstream error.") };

		assert_eq!(failure.status, Some(200));
		assert_eq!(failure.body.as_deref(), Some("{\"words\":1}"));
	}

	#[tokio::test]
	async fn unknown_registration_is_a_config_error() {
		let h = harness([], []);
		let other = RegistrationId::new("other").expect("Registration id fixture should be valid.");
		let err = h
			.executor
			.execute_authorized(&other, ResourceRequest::get(url()))
			.await
			.expect_err("Unknown registrations must be rejected.");

		assert!(matches!(err, Error::Config(ConfigError::UnknownRegistration { .. })));
	}

	#[tokio::test]
	async fn expired_cached_token_is_replaced_unless_policy_is_lazy() {
		let h = harness([Ok(token("tok2", Duration::hours(1)))], [Some(ok("[]"))]);

		seed(&h.store, token("tok1", Duration::seconds(30))).await;
		h.executor
			.execute_authorized(&id(), ResourceRequest::get(url()))
			.await
			.expect("Expiring token should be replaced.");

		assert_eq!(h.downstream.authorizations(), ["Bearer tok2"]);

		let lazy = harness([], [Some(ok("[]"))]);
		let executor = lazy.executor.clone().with_policy(TokenPolicy::lazy());

		seed(&lazy.store, token("tok1", Duration::ZERO)).await;
		executor
			.execute_authorized(&id(), ResourceRequest::get(url()))
			.await
			.expect("Lazy policy should reuse the cached token.");

		assert_eq!(lazy.acquirer.calls(), 0);
		assert_eq!(lazy.downstream.authorizations(), ["Bearer tok1"]);
	}

	#[tokio::test]
	async fn concurrent_misses_share_one_acquisition() {
		let h = harness([Ok(token("tok1", Duration::hours(1)))], [Some(ok("[]")), Some(ok("[]"))]);
		let id = id();
		let (first, second) = tokio::join!(
			h.executor.execute_authorized(&id, ResourceRequest::get(url())),
			h.executor.execute_authorized(&id, ResourceRequest::get(url())),
		);

		first.expect("First concurrent call should succeed.");
		second.expect("Second concurrent call should succeed.");

		assert_eq!(h.acquirer.calls(), 1);
		assert_eq!(h.downstream.authorizations(), ["Bearer tok1", "Bearer tok1"]);
	}
}
