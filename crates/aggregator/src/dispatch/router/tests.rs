//! Tests for route table construction, resolution and request handling.

use std::sync::Arc;

use http::header::CONTENT_TYPE;
use http::{Method, StatusCode};
use rstest::{fixture, rstest};
use serde_json::{Value, json};
use tokio_util::sync::CancellationToken;

use aggregator_types::ObjectList;

use crate::dispatch::{ApiRequest, ApiResponse, RequestContext, empty_body, text_response};
use crate::resource::{
    CustomHandlerSet, CustomVerb, HookError, RawEndpoints, ResourceBinding, ResourceDescriptor,
    StructuredBinding,
};
use crate::store::{KindError, MockKindResolver, StoreError};
use crate::testing::{ScriptedStore, StoreOperation};
use crate::tests::support::{
    get, group_version, kinds, next_json_frame, read_json, read_text, request, router_with, widget,
    widget_binding, widget_descriptor, widgets,
};

use super::{Resolution, Router, RouterBuilder, RouterError};

fn gadgets_descriptor() -> ResourceDescriptor {
    ResourceDescriptor::new("gadgets", "Gadget").structured(StructuredBinding::new(
        group_version().with_resource("gadgets"),
        group_version().with_resource("gadgetlists"),
    ))
}

fn reports_descriptor() -> ResourceDescriptor {
    let handlers = CustomHandlerSet::new()
        .on(
            CustomVerb::Get,
            |namespace: &str, name: &str, _request: ApiRequest| -> ApiResponse {
                text_response(StatusCode::OK, format!("report {namespace}/{name}"))
            },
        )
        .on(
            CustomVerb::Delete,
            |_namespace: &str, _name: &str, _request: ApiRequest| -> ApiResponse {
                let mut response = ApiResponse::new(empty_body());
                *response.status_mut() = StatusCode::NO_CONTENT;
                response
            },
        );
    ResourceDescriptor::new("reports", "Report").custom(handlers)
}

fn stats_descriptor() -> ResourceDescriptor {
    ResourceDescriptor::new("stats", "Stat").binding(ResourceBinding::RawEndpoints(
        RawEndpoints::new()
            .with("", |_request: ApiRequest| -> ApiResponse {
                text_response(StatusCode::OK, "stats")
            })
            .with("/summary", |_request: ApiRequest| -> ApiResponse {
                text_response(StatusCode::OK, "summary")
            }),
    ))
}

#[fixture]
fn store() -> ScriptedStore {
    let store = ScriptedStore::new();
    store.insert(&widgets(), widget("default", "a", "web"));
    store.insert(&widgets(), widget("default", "b", "db"));
    store.set_list_resource_version("20");
    store
}

fn router_over(store: &ScriptedStore) -> Router {
    router_with(
        store,
        [
            widget_descriptor(),
            gadgets_descriptor(),
            reports_descriptor(),
            stats_descriptor(),
        ],
    )
}

#[fixture]
fn router(store: ScriptedStore) -> Router {
    router_over(&store)
}

fn resource(index: usize, namespace: &str, name: &str) -> Resolution {
    Resolution::Resource {
        index,
        namespace: namespace.to_owned(),
        name: name.to_owned(),
    }
}

#[rstest]
#[case("/healthz", Resolution::Probe("ok"))]
#[case("/readyz", Resolution::Probe("ready"))]
#[case("/apis", Resolution::GroupDiscovery)]
#[case("/apis/", Resolution::GroupDiscovery)]
#[case("/apis/example.com/v1", Resolution::ResourceDiscovery)]
#[case("/apis/example.com/v1/", Resolution::ResourceDiscovery)]
#[case("/apis/example.com/v2", Resolution::NotFound)]
#[case("/apis/example.com/v1/widgets", resource(0, "", ""))]
#[case("/apis/example.com/v1/namespaces/default/widgets", resource(0, "default", ""))]
#[case("/apis/example.com/v1/namespaces/default/widgets/a", resource(0, "default", "a"))]
#[case("/apis/example.com/v1/namespaces/default/widgets/a%20b", resource(0, "default", "a b"))]
#[case("/apis/example.com/v1/widgets/a", Resolution::NotFound)]
#[case("/apis/example.com/v1/gadgets", resource(1, "", ""))]
#[case("/apis/example.com/v1/gadgets/g1", resource(1, "", "g1"))]
#[case("/apis/example.com/v1/namespaces/default/gadgets", Resolution::NotFound)]
#[case("/apis/example.com/v1/reports/r1", resource(2, "", "r1"))]
#[case("/apis/example.com/v1/stats", Resolution::Raw(0))]
#[case("/apis/example.com/v1/stats/summary", Resolution::Raw(1))]
#[case("/apis/example.com/v1/stats/other", Resolution::NotFound)]
#[case("/apis/example.com/v1/namespaces/default/widgets/a/status", Resolution::NotFound)]
#[case("/apis/example.com/v1/namespaces//widgets", Resolution::NotFound)]
#[case("/apis/example.com/v1/unknown", Resolution::NotFound)]
#[case("/api/v1/pods", Resolution::NotFound)]
fn resolves_paths(router: Router, #[case] path: &str, #[case] expected: Resolution) {
    assert_eq!(router.resolve(path), expected);
}

#[test]
fn namespace_routes_need_a_namespaced_resource() {
    let namespaces = ResourceDescriptor::new("namespaces", "Namespace").structured(
        StructuredBinding::new(
            group_version().with_resource("namespaces"),
            group_version().with_resource("namespacelists"),
        ),
    );
    let router = router_with(&ScriptedStore::new(), [namespaces]);

    assert_eq!(router.prefix(), "/apis/example.com/v1");
    assert_eq!(
        router.resolve("/apis/example.com/v1/namespaces/default"),
        resource(0, "", "default")
    );
}

fn build(descriptors: Vec<ResourceDescriptor>) -> Result<Router, RouterError> {
    RouterBuilder::new(group_version())
        .resources(descriptors)
        .build(Arc::new(ScriptedStore::new()), Arc::new(kinds()))
}

#[test]
fn rejects_duplicate_names() {
    let error = build(vec![widget_descriptor(), widget_descriptor()])
        .err()
        .expect("duplicate names must fail");
    assert!(matches!(error, RouterError::DuplicateResource { ref name } if name == "widgets"));
}

#[test]
fn rejects_conflicting_bindings() {
    let descriptor = widget_descriptor().custom(CustomHandlerSet::new());
    let error = build(vec![descriptor])
        .err()
        .expect("two serving bindings must fail");
    assert_eq!(
        error.to_string(),
        "resource widgets declares more than one structured or custom binding"
    );
}

#[test]
fn rejects_clashing_raw_endpoints() {
    let first = ResourceDescriptor::new("stats", "Stat")
        .raw_endpoint("/summary", |_request: ApiRequest| -> ApiResponse {
            text_response(StatusCode::OK, "a")
        })
        .raw_endpoint("/summary", |_request: ApiRequest| -> ApiResponse {
            text_response(StatusCode::OK, "b")
        });
    let error = build(vec![first]).err().expect("clashing paths must fail");
    assert!(matches!(
        error,
        RouterError::DuplicateEndpoint { ref path } if path == "/apis/example.com/v1/stats/summary"
    ));
}

#[test]
fn rejects_unrooted_raw_suffixes() {
    let descriptor = ResourceDescriptor::new("stats", "Stat")
        .raw_endpoint("summary", |_request: ApiRequest| -> ApiResponse {
            text_response(StatusCode::OK, "a")
        });
    let error = build(vec![descriptor]).err().expect("suffix must be rooted");
    assert!(matches!(error, RouterError::InvalidEndpoint { .. }), "{error}");
}

#[rstest]
#[tokio::test]
async fn probes_answer_plain_text(router: Router) {
    let response = router.handle(get("/healthz"), RequestContext::default()).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[CONTENT_TYPE], "text/plain; charset=utf-8");
    assert_eq!(read_text(response).await, "ok");
}

#[rstest]
#[tokio::test]
async fn resource_discovery_describes_every_resource(router: Router) {
    let response = router
        .handle(get("/apis/example.com/v1"), RequestContext::default())
        .await;
    let document = read_json(response).await;
    assert_eq!(document["kind"], "APIResourceList");
    assert_eq!(document["groupVersion"], "example.com/v1");
    assert_eq!(document["resources"][0]["name"], "widgets");
    assert_eq!(document["resources"][0]["namespaced"], true);
    assert_eq!(document["resources"][0]["shortNames"], json!(["wd"]));
    assert_eq!(
        document["resources"][0]["verbs"],
        json!(["get", "list", "watch"])
    );
}

#[rstest]
#[tokio::test]
async fn lists_with_kind_metadata(router: Router) {
    let response = router
        .handle(
            get("/apis/example.com/v1/namespaces/default/widgets?limit=1"),
            RequestContext::default(),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let document = read_json(response).await;
    assert_eq!(document["kind"], "WidgetList");
    assert_eq!(document["apiVersion"], "example.com/v1");
    assert_eq!(document["items"][0]["kind"], "Widget");
    assert_eq!(document["metadata"]["continue"], "1");
    assert_eq!(document["metadata"]["resourceVersion"], "20");
}

#[tokio::test]
async fn get_unwraps_the_first_transformed_item() {
    let store = ScriptedStore::new();
    let binding = widget_binding().with_list_transform(
        |_context: &RequestContext,
         _namespace: &str,
         name: &str,
         list: ObjectList|
         -> Result<Value, HookError> {
            Ok(json!({"items": [{"name": name, "count": list.len()}]}))
        },
    );
    let descriptor = ResourceDescriptor::new("widgets", "Widget")
        .namespaced(true)
        .structured(binding);
    store.insert(&widgets(), widget("default", "a", "web"));
    let router = router_with(&store, [descriptor]);

    let response = router
        .handle(
            get("/apis/example.com/v1/namespaces/default/widgets/a"),
            RequestContext::default(),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(read_json(response).await, json!({"name": "a", "count": 1}));
}

#[tokio::test]
async fn list_transform_output_is_returned_verbatim() {
    let store = ScriptedStore::new();
    let binding = widget_binding().with_list_transform(
        |_context: &RequestContext,
         namespace: &str,
         _name: &str,
         list: ObjectList|
         -> Result<Value, HookError> {
            Ok(json!({"namespace": namespace, "total": list.len(), "kind": list.kind}))
        },
    );
    let router = router_with(
        &store,
        [ResourceDescriptor::new("widgets", "Widget")
            .namespaced(true)
            .structured(binding)],
    );

    let response = router
        .handle(
            get("/apis/example.com/v1/namespaces/default/widgets"),
            RequestContext::default(),
        )
        .await;
    assert_eq!(
        read_json(response).await,
        json!({"namespace": "default", "total": 0, "kind": "WidgetList"})
    );
}

#[tokio::test]
async fn identity_transforms_keep_the_stamped_kinds() {
    let store = ScriptedStore::new();
    store.insert(&widgets(), widget("default", "a", "web"));
    let binding = widget_binding().with_list_transform(
        |_context: &RequestContext,
         _namespace: &str,
         _name: &str,
         list: ObjectList|
         -> Result<Value, HookError> {
            serde_json::to_value(&list).map_err(|error| HookError::new(error.to_string()))
        },
    );
    let hooked = router_with(
        &store,
        [ResourceDescriptor::new("widgets", "Widget")
            .namespaced(true)
            .structured(binding)],
    );
    let plain = router_with(&store, [widget_descriptor()]);
    let path = "/apis/example.com/v1/namespaces/default/widgets";

    let expected = read_json(plain.handle(get(path), RequestContext::default()).await).await;
    let document = read_json(hooked.handle(get(path), RequestContext::default()).await).await;
    assert_eq!(document, expected);
    assert_eq!(document["kind"], "WidgetList");
    assert_eq!(document["apiVersion"], "example.com/v1");
    assert_eq!(document["items"][0]["kind"], "Widget");
    assert_eq!(document["items"][0]["apiVersion"], "example.com/v1");
}

#[tokio::test]
async fn list_transforms_see_the_request_token() {
    let store = ScriptedStore::new();
    let binding = widget_binding().with_list_transform(
        |context: &RequestContext,
         _namespace: &str,
         _name: &str,
         _list: ObjectList|
         -> Result<Value, HookError> {
            if context.cancellation().is_cancelled() {
                return Err(HookError::new("client went away"));
            }
            Ok(json!({"streaming": context.supports_streaming()}))
        },
    );
    let router = router_with(
        &store,
        [ResourceDescriptor::new("widgets", "Widget")
            .namespaced(true)
            .structured(binding)],
    );
    let path = "/apis/example.com/v1/namespaces/default/widgets";

    let live = RequestContext::new(CancellationToken::new(), false);
    let response = router.handle(get(path), live).await;
    assert_eq!(read_json(response).await, json!({"streaming": false}));

    let cancel = CancellationToken::new();
    cancel.cancel();
    let response = router
        .handle(get(path), RequestContext::new(cancel, true))
        .await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        read_text(response).await,
        "failed to transform widgets: client went away
"
    );
}

#[tokio::test]
async fn transform_failures_answer_500() {
    let binding = widget_binding().with_list_transform(
        |_context: &RequestContext,
         _namespace: &str,
         _name: &str,
         _list: ObjectList|
         -> Result<Value, HookError> {
            Err(HookError::new("no summary"))
        },
    );
    let router = router_with(
        &ScriptedStore::new(),
        [ResourceDescriptor::new("widgets", "Widget").structured(binding)],
    );

    let response = router
        .handle(get("/apis/example.com/v1/widgets"), RequestContext::default())
        .await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        read_text(response).await,
        "failed to transform widgets: no summary\n"
    );
}

#[rstest]
#[tokio::test]
async fn store_failures_carry_the_action(store: ScriptedStore) {
    let router = router_over(&store);
    store.fail(StoreOperation::List, StoreError::other("backend down"));
    let response = router
        .handle(get("/apis/example.com/v1/widgets"), RequestContext::default())
        .await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(read_text(response).await, "failed to list widgets: backend down\n");
}

#[rstest]
#[tokio::test]
async fn expired_lists_answer_gone(store: ScriptedStore) {
    let router = router_over(&store);
    store.fail(
        StoreOperation::List,
        StoreError::gone("too old resource version: 3 (20)"),
    );
    let response = router
        .handle(
            get("/apis/example.com/v1/namespaces/default/widgets?resourceVersion=3"),
            RequestContext::default(),
        )
        .await;
    assert_eq!(response.status(), StatusCode::GONE);
    assert_eq!(
        read_text(response).await,
        "too old resource version: 3 (20)\n"
    );
}

#[rstest]
#[tokio::test]
async fn expired_gets_answer_gone(store: ScriptedStore) {
    let router = router_over(&store);
    store.fail(StoreOperation::Get, StoreError::gone("object history compacted"));
    let response = router
        .handle(
            get("/apis/example.com/v1/namespaces/default/widgets/a"),
            RequestContext::default(),
        )
        .await;
    assert_eq!(response.status(), StatusCode::GONE);
    assert_eq!(read_text(response).await, "object history compacted\n");
}

#[rstest]
#[tokio::test]
async fn item_watches_select_the_path_name(store: ScriptedStore) {
    let router = router_over(&store);
    let script = store.script_watch();
    script.added(widget("default", "bar", "web"));

    let response = router
        .handle(
            get("/apis/example.com/v1/namespaces/default/widgets/bar?watch=true&fieldSelector=spec.x%3Dy"),
            RequestContext::default(),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let query = store.last_watch_query().expect("a watch was opened");
    assert_eq!(query.list.field_selector.to_string(), "metadata.name=bar");

    let mut body = response.into_body();
    let frame = next_json_frame(&mut body).await.expect("added frame");
    assert_eq!(frame["type"], "ADDED");
    assert_eq!(frame["object"]["kind"], "Widget");
    assert_eq!(frame["object"]["metadata"]["name"], "bar");
}

#[tokio::test]
async fn unresolvable_kinds_answer_500() {
    let mut kinds = MockKindResolver::new();
    kinds.expect_kind_for().returning(|resource| {
        Err(KindError {
            resource: resource.to_string(),
        })
    });
    let router = RouterBuilder::new(group_version())
        .resource(widget_descriptor())
        .build(Arc::new(ScriptedStore::new()), Arc::new(kinds))
        .expect("router should build");

    let response = router
        .handle(get("/apis/example.com/v1/widgets"), RequestContext::default())
        .await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        read_text(response).await,
        "failed to find kind: no kind registered for resource widgets.v1.example.com\n"
    );
}

#[rstest]
#[case(Method::POST)]
#[case(Method::PUT)]
#[case(Method::DELETE)]
#[tokio::test]
async fn structured_resources_only_serve_get(router: Router, #[case] method: Method) {
    let response = router
        .handle(
            request(method, "/apis/example.com/v1/namespaces/default/widgets/a"),
            RequestContext::default(),
        )
        .await;
    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(read_text(response).await, "only GET\n");
}

#[rstest]
#[tokio::test]
async fn custom_and_raw_handlers_receive_the_request(router: Router) {
    let response = router
        .handle(
            get("/apis/example.com/v1/reports/r1"),
            RequestContext::default(),
        )
        .await;
    assert_eq!(read_text(response).await, "report /r1");

    let response = router
        .handle(
            request(Method::DELETE, "/apis/example.com/v1/reports/r1"),
            RequestContext::default(),
        )
        .await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    assert!(read_text(response).await.is_empty());

    let response = router
        .handle(get("/apis/example.com/v1/stats"), RequestContext::default())
        .await;
    assert_eq!(read_text(response).await, "stats");

    let response = router
        .handle(
            get("/apis/example.com/v1/reports"),
            RequestContext::default(),
        )
        .await;
    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(read_text(response).await, "list is not supported for reports\n");
}

#[rstest]
#[tokio::test]
async fn unknown_routes_answer_plain_not_found(router: Router) {
    let response = router
        .handle(get("/apis/example.com/v1/unknown"), RequestContext::default())
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(response.headers()["x-content-type-options"], "nosniff");
    assert_eq!(read_text(response).await, "404 page not found\n");
}
