#![cfg(feature = "reqwest")]

// crates.io
use httpmock::prelude::*;
// self
use graph_sdk::{_preludet::*, error::ApiErrorKind};

const APP_TOKEN: &str = "app-token-138071234567890";

async fn mock_app_token(server: &MockServer) -> httpmock::Mock<'_> {
	server
		.mock_async(|when, then| {
			when.method(GET)
				.path("/oauth/access_token")
				.query_param("grant_type", "client_credentials")
				.query_param("client_id", TEST_APP_ID)
				.query_param("client_secret", TEST_APP_SECRET);
			then.status(200)
				.header("content-type", "application/json")
				.body(format!("{{\"access_token\":\"{APP_TOKEN}\"}}"));
		})
		.await
}

fn params<const N: usize>(entries: [(&str, &str); N]) -> BTreeMap<String, String> {
	entries.into_iter().map(|(k, v)| (k.to_owned(), v.to_owned())).collect()
}

#[tokio::test]
async fn get_builds_versioned_urls_and_injects_the_app_token() {
	let server = MockServer::start_async().await;
	let (dispatcher, _cache) = build_test_dispatcher(test_config(&server.base_url()));
	let token_mock = mock_app_token(&server).await;
	let graph_mock = server
		.mock_async(|when, then| {
			when.method(GET)
				.path("/v18.0/me/posts")
				.query_param("access_token", APP_TOKEN)
				.query_param("limit", "25");
			then.status(200)
				.header("content-type", "application/json")
				.body("{\"data\":[{\"id\":\"1\"},{\"id\":\"2\"}]}");
		})
		.await;
	let value = dispatcher
		.get("/me/posts", params([("limit", "25")]))
		.await
		.expect("GET dispatch should succeed.");

	assert_eq!(value.get("data").and_then(Value::as_array).map(Vec::len), Some(2));

	token_mock.assert_async().await;
	graph_mock.assert_async().await;
}

#[tokio::test]
async fn identical_gets_are_served_from_cache() {
	let server = MockServer::start_async().await;
	let (dispatcher, cache) = build_test_dispatcher(test_config(&server.base_url()));
	let _token_mock = mock_app_token(&server).await;
	let graph_mock = server
		.mock_async(|when, then| {
			when.method(GET).path("/v18.0/me");
			then.status(200)
				.header("content-type", "application/json")
				.body("{\"id\":\"42\",\"name\":\"Pat\"}");
		})
		.await;
	let first =
		dispatcher.get("me", BTreeMap::new()).await.expect("Initial GET should succeed.");
	let second =
		dispatcher.get("me", BTreeMap::new()).await.expect("Repeated GET should succeed.");

	assert_eq!(first, second);
	// One entry for the app token, one for the GET response.
	assert_eq!(cache.len(), 2);

	graph_mock.assert_calls_async(1).await;
}

#[tokio::test]
async fn caller_supplied_tokens_suppress_injection() {
	let server = MockServer::start_async().await;
	let (dispatcher, _cache) = build_test_dispatcher(test_config(&server.base_url()));
	let token_mock = mock_app_token(&server).await;
	let graph_mock = server
		.mock_async(|when, then| {
			when.method(GET).path("/v18.0/me").query_param("access_token", "user-token");
			then.status(200)
				.header("content-type", "application/json")
				.body("{\"id\":\"42\"}");
		})
		.await;

	dispatcher
		.get("me", params([("access_token", "user-token")]))
		.await
		.expect("GET with a caller-supplied token should succeed.");

	token_mock.assert_calls_async(0).await;
	graph_mock.assert_async().await;
}

#[tokio::test]
async fn disabled_caching_hits_upstream_every_time() {
	let server = MockServer::start_async().await;
	let mut config = test_config(&server.base_url());

	config.cache.enabled = false;

	let (dispatcher, _cache) = build_test_dispatcher(config);
	let token_mock = mock_app_token(&server).await;
	let graph_mock = server
		.mock_async(|when, then| {
			when.method(GET).path("/v18.0/me");
			then.status(200)
				.header("content-type", "application/json")
				.body("{\"id\":\"42\"}");
		})
		.await;

	dispatcher.get("me", BTreeMap::new()).await.expect("First uncached GET should succeed.");
	dispatcher.get("me", BTreeMap::new()).await.expect("Second uncached GET should succeed.");

	graph_mock.assert_calls_async(2).await;
	// Response caching is off, but the app token itself stays cached.
	token_mock.assert_calls_async(1).await;
}

#[tokio::test]
async fn post_requests_skip_the_cache_and_send_form_bodies() {
	let server = MockServer::start_async().await;
	let (dispatcher, _cache) = build_test_dispatcher(test_config(&server.base_url()));
	let _token_mock = mock_app_token(&server).await;
	let graph_mock = server
		.mock_async(|when, then| {
			when.method(POST)
				.path("/v18.0/me/feed")
				.body_includes("message=ship+it");
			then.status(200)
				.header("content-type", "application/json")
				.body("{\"id\":\"42_1\"}");
		})
		.await;

	dispatcher
		.post("me/feed", params([("message", "ship it")]))
		.await
		.expect("First POST should succeed.");
	dispatcher
		.post("me/feed", params([("message", "ship it")]))
		.await
		.expect("Second POST should succeed.");

	graph_mock.assert_calls_async(2).await;
}

#[tokio::test]
async fn error_bodies_fail_the_call_even_with_a_success_status() {
	let server = MockServer::start_async().await;
	let (dispatcher, _cache) = build_test_dispatcher(test_config(&server.base_url()));
	let _token_mock = mock_app_token(&server).await;
	let _graph_mock = server
		.mock_async(|when, then| {
			when.method(GET).path("/v18.0/me");
			then.status(200).header("content-type", "application/json").body(
				"{\"error\":{\"message\":\"Invalid OAuth access token.\",\"type\":\"OAuthException\",\"code\":190}}",
			);
		})
		.await;
	let err = dispatcher
		.get("me", BTreeMap::new())
		.await
		.expect_err("An error body should fail the call.");
	let Error::Api(api) = err else { panic!("Error bodies should surface as Error::Api.") };

	assert_eq!(api.code, 190);
	assert_eq!(api.kind(), ApiErrorKind::InvalidToken);
	assert!(api.is_invalid_token());
	assert_eq!(api.context.get("endpoint").and_then(Value::as_str), Some("me"));
	assert_eq!(api.context.get("status").and_then(Value::as_u64), Some(200));
}

#[tokio::test]
async fn rate_limit_codes_classify_for_backoff() {
	let server = MockServer::start_async().await;
	let (dispatcher, _cache) = build_test_dispatcher(test_config(&server.base_url()));
	let _token_mock = mock_app_token(&server).await;
	let _graph_mock = server
		.mock_async(|when, then| {
			when.method(GET).path("/v18.0/me/posts");
			then.status(403).header("content-type", "application/json").body(
				"{\"error\":{\"message\":\"Application request limit reached.\",\"code\":4}}",
			);
		})
		.await;
	let err = dispatcher
		.get("me/posts", BTreeMap::new())
		.await
		.expect_err("A throttled call should fail.");
	let Error::Api(api) = err else { panic!("Error bodies should surface as Error::Api.") };

	assert!(api.is_rate_limited());
}

#[tokio::test]
async fn failed_calls_are_never_cached() {
	let server = MockServer::start_async().await;
	let (dispatcher, _cache) = build_test_dispatcher(test_config(&server.base_url()));
	let _token_mock = mock_app_token(&server).await;
	let graph_mock = server
		.mock_async(|when, then| {
			when.method(GET).path("/v18.0/me");
			then.status(500).header("content-type", "application/json").body("{\"ok\":false}");
		})
		.await;
	let first = dispatcher
		.get("me", BTreeMap::new())
		.await
		.expect_err("A 500 response should fail the call.");

	dispatcher
		.get("me", BTreeMap::new())
		.await
		.expect_err("The failure must not be served from cache.");

	let Error::Api(api) = first else { panic!("Status failures should surface as Error::Api.") };

	assert_eq!(api.code, 0);
	assert_eq!(api.context.get("status").and_then(Value::as_u64), Some(500));
	assert!(
		api.context
			.get("body_preview")
			.and_then(Value::as_str)
			.is_some_and(|preview| preview.contains("ok")),
	);

	graph_mock.assert_calls_async(2).await;
}

#[tokio::test]
async fn non_json_bodies_surface_as_api_errors() {
	let server = MockServer::start_async().await;
	let (dispatcher, _cache) = build_test_dispatcher(test_config(&server.base_url()));
	let _token_mock = mock_app_token(&server).await;
	let _graph_mock = server
		.mock_async(|when, then| {
			when.method(GET).path("/v18.0/me");
			then.status(200).header("content-type", "text/html").body("<html>Whoops</html>");
		})
		.await;
	let err = dispatcher
		.get("me", BTreeMap::new())
		.await
		.expect_err("A non-JSON body should fail the call.");
	let Error::Api(api) = err else { panic!("Decode failures should surface as Error::Api.") };

	assert_eq!(api.code, 0);
	assert!(api.message.contains("not valid JSON"));
}

#[tokio::test]
async fn delete_requests_pass_query_params() {
	let server = MockServer::start_async().await;
	let (dispatcher, _cache) = build_test_dispatcher(test_config(&server.base_url()));
	let _token_mock = mock_app_token(&server).await;
	let graph_mock = server
		.mock_async(|when, then| {
			when.method(DELETE)
				.path("/v18.0/42_1")
				.query_param("access_token", APP_TOKEN);
			then.status(200)
				.header("content-type", "application/json")
				.body("{\"success\":true}");
		})
		.await;
	let value = dispatcher
		.delete("42_1", BTreeMap::new())
		.await
		.expect("DELETE dispatch should succeed.");

	assert_eq!(value.get("success"), Some(&Value::Bool(true)));

	graph_mock.assert_async().await;
}
