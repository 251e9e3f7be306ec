use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use axum::body::Body;
use axum::extract::State;
use axum::http::{header, HeaderMap, Method, Request, StatusCode, Uri};
use axum::routing::get;
use axum::Router;
use http_body_util::BodyExt;
use reqwest::Url;
use serde_json::{json, Value};
use tokio::net::TcpListener;
use tower::ServiceExt;

use crate::catalog::{LOAD_FAILED_MESSAGE, DEFAULT_DESCRIPTION};
use crate::proxy::{router, ProxyState, METHOD_NOT_ALLOWED_MESSAGE, PRODUCTS_ROUTE};
use crate::source::{CredentialSource, RecordSource};
use crate::storefront::loader::{LoadError, ProductLoader};
use crate::storefront::search::SortKey;
use crate::storefront::{Command, Presentation, Storefront};

#[derive(Clone, Default)]
struct Seen {
    authorization: Arc<Mutex<Option<String>>>,
    uri: Arc<Mutex<Option<String>>>,
}

#[derive(Clone)]
struct Upstream {
    status: StatusCode,
    body: String,
    seen: Seen,
}

async fn upstream_handler(
    State(upstream): State<Upstream>,
    headers: HeaderMap,
    uri: Uri,
) -> (StatusCode, [(header::HeaderName, &'static str); 1], String) {
    *upstream.seen.authorization.lock().unwrap() = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    *upstream.seen.uri.lock().unwrap() = Some(uri.to_string());
    (
        upstream.status,
        [(header::CONTENT_TYPE, "application/json")],
        upstream.body.clone(),
    )
}

async fn spawn(app: Router) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

async fn spawn_upstream(status: StatusCode, body: impl Into<String>) -> (SocketAddr, Seen) {
    let seen = Seen::default();
    let app = Router::new()
        .route("/v0/:base/:table", get(upstream_handler))
        .with_state(Upstream {
            status,
            body: body.into(),
            seen: seen.clone(),
        });
    (spawn(app).await, seen)
}

fn client() -> reqwest::Client {
    reqwest::Client::builder().no_proxy().build().unwrap()
}

fn fixed_credentials() -> CredentialSource {
    CredentialSource::Fixed {
        token: Some("patTEST".to_string()),
        base_id: Some("appTEST".to_string()),
    }
}

fn proxy_state(upstream: SocketAddr, credentials: CredentialSource) -> ProxyState {
    ProxyState {
        source: RecordSource::new(
            client(),
            Url::parse(&format!("http://{upstream}/v0/")).unwrap(),
            "Produits",
        ),
        credentials,
    }
}

async fn call(state: ProxyState, method: Method) -> (StatusCode, HeaderMap, Vec<u8>) {
    let response = router(state)
        .oneshot(
            Request::builder()
                .method(method)
                .uri(PRODUCTS_ROUTE)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let body = response.into_body().collect().await.unwrap().to_bytes();
    (status, headers, body.to_vec())
}

fn assert_cors(headers: &HeaderMap) {
    assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");
    assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_METHODS], "GET");
    assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_HEADERS], "Content-Type");
}

fn unreachable_upstream() -> SocketAddr {
    "127.0.0.1:9".parse().unwrap()
}

const TWO_RECORDS: &str = r#"{"records":[
    {"id":"recB","createdTime":"2024-01-01T00:00:00.000Z","fields":{"Nom":"Beanie","Prix":10,"Actif":true,"Ordre":1}},
    {"id":"recA","createdTime":"2024-01-01T00:00:00.000Z","fields":{"Nom":"Shawl","Description":"Laine","Prix":20,"Actif":true,"Ordre":2,
        "Image":[{"id":"att1","url":"https://cdn.example/shawl.jpg","filename":"shawl.jpg"}]}}
]}"#;

#[tokio::test]
async fn preflight_returns_empty_200_with_cors() {
    let (status, headers, body) =
        call(proxy_state(unreachable_upstream(), fixed_credentials()), Method::OPTIONS).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.is_empty());
    assert_cors(&headers);
}

#[tokio::test]
async fn other_methods_are_rejected_with_405() {
    for method in [Method::POST, Method::PUT, Method::DELETE, Method::PATCH] {
        let (status, headers, body) =
            call(proxy_state(unreachable_upstream(), fixed_credentials()), method.clone()).await;
        assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED, "{method}");
        assert_cors(&headers);
        let value: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(value, json!({ "error": METHOD_NOT_ALLOWED_MESSAGE }));
    }

    let (status, _, _) =
        call(proxy_state(unreachable_upstream(), fixed_credentials()), Method::HEAD).await;
    assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
}

#[tokio::test]
async fn missing_credentials_yield_generic_500() {
    let credentials = CredentialSource::Fixed {
        token: None,
        base_id: Some("appTEST".to_string()),
    };
    let (status, headers, body) =
        call(proxy_state(unreachable_upstream(), credentials), Method::GET).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_cors(&headers);
    let value: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(value["success"], json!(false));
    assert_eq!(value["error"], json!(LOAD_FAILED_MESSAGE));
    assert!(value["timestamp"].is_string());
}

#[tokio::test]
async fn upstream_rejection_does_not_leak_detail() {
    let (addr, _) = spawn_upstream(
        StatusCode::FORBIDDEN,
        r#"{"error":{"type":"INVALID_PERMISSIONS","message":"secret detail"}}"#,
    )
    .await;
    let (status, _, body) = call(proxy_state(addr, fixed_credentials()), Method::GET).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    let text = String::from_utf8(body).unwrap();
    assert!(!text.contains("INVALID_PERMISSIONS"));
    assert!(!text.contains("secret detail"));
    let value: Value = serde_json::from_str(&text).unwrap();
    assert_eq!(value["error"], json!(LOAD_FAILED_MESSAGE));
}

#[tokio::test]
async fn undecodable_upstream_body_is_a_failure() {
    let (addr, _) = spawn_upstream(StatusCode::OK, "<html>maintenance</html>").await;
    let (status, _, body) = call(proxy_state(addr, fixed_credentials()), Method::GET).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    let value: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(value["success"], json!(false));
}

#[tokio::test]
async fn records_are_reshaped_in_upstream_order() {
    let (addr, seen) = spawn_upstream(StatusCode::OK, TWO_RECORDS).await;
    let (status, headers, body) = call(proxy_state(addr, fixed_credentials()), Method::GET).await;

    assert_eq!(status, StatusCode::OK);
    assert_cors(&headers);
    let value: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(value["success"], json!(true));
    assert!(value.get("error").is_none());

    let products = value["products"].as_array().unwrap();
    assert_eq!(products.len(), 2);
    assert_eq!(products[0]["id"], json!("recB"));
    assert_eq!(products[0]["description"], json!(DEFAULT_DESCRIPTION));
    assert_eq!(products[0]["image"], Value::Null);
    assert_eq!(products[1]["name"], json!("Shawl"));
    assert_eq!(products[1]["price"], json!(20.0));
    assert_eq!(products[1]["image"]["url"], json!("https://cdn.example/shawl.jpg"));
    assert_eq!(products[1]["image"]["filename"], json!("shawl.jpg"));
    assert_eq!(products[1]["active"], json!(true));

    assert_eq!(
        seen.authorization.lock().unwrap().as_deref(),
        Some("Bearer patTEST")
    );
    let uri = seen.uri.lock().unwrap().clone().unwrap();
    let url = Url::parse(&format!("http://upstream{uri}")).unwrap();
    assert_eq!(url.path(), "/v0/appTEST/Produits");
    let query: Vec<(String, String)> = url
        .query_pairs()
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();
    assert!(query.contains(&("filterByFormula".to_string(), "{Actif}=1".to_string())));
    assert!(query.contains(&("sort[0][field]".to_string(), "Ordre".to_string())));
    assert!(query.contains(&("sort[0][direction]".to_string(), "asc".to_string())));
}

#[tokio::test]
async fn paginated_result_serves_only_the_first_page() {
    let (addr, _) = spawn_upstream(
        StatusCode::OK,
        r#"{"records":[
            {"id":"recB","fields":{"Nom":"Beanie","Prix":10,"Actif":true}},
            {"id":"recA","fields":{"Nom":"Shawl","Prix":20,"Actif":true}}
        ],"offset":"itrNEXT/recC"}"#,
    )
    .await;
    let (status, _, body) = call(proxy_state(addr, fixed_credentials()), Method::GET).await;

    assert_eq!(status, StatusCode::OK);
    let value: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(value["success"], json!(true));
    assert!(value.get("offset").is_none());
    let ids: Vec<&str> = value["products"]
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["id"].as_str().unwrap())
        .collect();
    assert_eq!(ids, vec!["recB", "recA"]);
}

#[tokio::test]
async fn empty_record_list_is_a_success() {
    let (addr, _) = spawn_upstream(StatusCode::OK, r#"{"records":[]}"#).await;
    let (status, _, body) = call(proxy_state(addr, fixed_credentials()), Method::GET).await;
    assert_eq!(status, StatusCode::OK);
    let value: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(value["products"], json!([]));
}

async fn served_proxy(upstream: SocketAddr) -> ProductLoader {
    let proxy = spawn(router(proxy_state(upstream, fixed_credentials()))).await;
    ProductLoader::new(
        client(),
        Url::parse(&format!("http://{proxy}{PRODUCTS_ROUTE}")).unwrap(),
    )
}

#[tokio::test]
async fn storefront_loads_searches_and_sorts_through_the_proxy() {
    let (upstream, _) = spawn_upstream(StatusCode::OK, TWO_RECORDS).await;
    let loader = served_proxy(upstream).await;

    let mut storefront = Storefront::new();
    storefront.load(&loader).await;
    assert_eq!(storefront.presentation(), Presentation::Ready);

    let ids = |s: &Storefront| -> Vec<String> {
        s.working_view().iter().map(|p| p.id.clone()).collect()
    };
    assert_eq!(ids(&storefront), vec!["recB", "recA"]);

    storefront.dispatch(Command::Sort(SortKey::PriceDesc));
    assert_eq!(ids(&storefront), vec!["recA", "recB"]);

    storefront.dispatch(Command::Search("LAINE".to_string()));
    assert_eq!(ids(&storefront), vec!["recA"]);
    assert_eq!(
        storefront.results_summary().as_deref(),
        Some("1 produit(s) trouvé(s)")
    );
}

#[tokio::test]
async fn storefront_shows_error_state_when_proxy_fails() {
    let (upstream, _) = spawn_upstream(StatusCode::INTERNAL_SERVER_ERROR, "{}").await;
    let loader = served_proxy(upstream).await;

    let mut storefront = Storefront::new();
    let nodes = storefront.load(&loader).await;
    assert_eq!(storefront.presentation(), Presentation::Failed);
    assert!(matches!(
        nodes.as_slice(),
        [crate::storefront::render::RenderNode::Error { .. }]
    ));
    assert!(storefront.products().is_empty());
}

#[tokio::test]
async fn storefront_shows_error_state_when_proxy_is_unreachable() {
    let loader = ProductLoader::new(
        client(),
        Url::parse(&format!("http://{}{PRODUCTS_ROUTE}", unreachable_upstream())).unwrap(),
    );

    assert!(matches!(loader.fetch().await, Err(LoadError::Transport { .. })));

    let mut storefront = Storefront::new();
    let nodes = storefront.load(&loader).await;
    assert_eq!(storefront.presentation(), Presentation::Failed);
    assert!(matches!(
        nodes.as_slice(),
        [crate::storefront::render::RenderNode::Error { .. }]
    ));
}
