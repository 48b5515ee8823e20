use std::sync::Arc;
use waypoint_core::*;

fn ok(builder: RouteBuilder, action: &str) -> RouteSpec {
    builder.to(action, |_, _| Ok(HttpResponse::ok()))
}

/// Declares `/bar` and `/foo` twice
struct Duplicates;

impl Controller for Duplicates {
    fn routes(&self) -> Vec<RouteSpec> {
        vec![
            ok(RouteBuilder::get("/bar"), "bar"),
            ok(RouteBuilder::get("/foo"), "foo"),
            ok(RouteBuilder::get("/foo"), "foo_again"),
        ]
    }
}

struct ById;

impl Controller for ById {
    fn routes(&self) -> Vec<RouteSpec> {
        vec![ok(RouteBuilder::get("/items/{id}"), "by_id")]
    }
}

struct ByName;

impl Controller for ByName {
    fn routes(&self) -> Vec<RouteSpec> {
        vec![ok(RouteBuilder::get("/items/{name}"), "by_name")]
    }
}

struct ByKey;

impl Controller for ByKey {
    fn routes(&self) -> Vec<RouteSpec> {
        vec![ok(RouteBuilder::get("/items/{key}"), "by_key")]
    }
}

#[test]
fn test_duplicates_in_one_controller_are_localized() {
    let router = Router::new();
    router.bind_controller(Arc::new(Duplicates));

    assert_eq!(router.get_route_for(HttpMethod::GET, "/bar").action_name(), Some("bar"));
    let foo = router.get_route_for(HttpMethod::GET, "/foo");
    assert!(foo.is_unbound());
    assert_eq!(foo.unbound_status(), 404);

    let unbound: Vec<String> = router
        .routes()
        .iter()
        .filter(|entry| !router.is_bound(entry))
        .map(|entry| entry.action_name().to_string())
        .collect();
    assert_eq!(unbound, vec!["foo", "foo_again"]);
}

#[test]
fn test_conflicts_across_controllers() {
    let router = Router::new();
    router.bind_controller(Arc::new(ById));
    assert!(!router.get_route_for(HttpMethod::GET, "/items/1").is_unbound());

    router.bind_controller(Arc::new(ByName));
    let route = router.get_route_for(HttpMethod::GET, "/items/1");
    assert!(route.is_unbound());
    assert_eq!(route.unbound_status(), 404);
}

#[test]
fn test_same_and_cross_controller_conflicts_behave_alike() {
    let single = Router::new();
    single.bind(
        ControllerId::new(1),
        "both",
        vec![
            ok(RouteBuilder::get("/items/{id}"), "by_id"),
            ok(RouteBuilder::get("/items/{name}"), "by_name"),
        ],
    );

    let split = Router::new();
    split.bind(ControllerId::new(1), "first", vec![ok(RouteBuilder::get("/items/{id}"), "by_id")]);
    split.bind(ControllerId::new(2), "second", vec![ok(RouteBuilder::get("/items/{name}"), "by_name")]);

    for router in [&single, &split] {
        let route = router.get_route_for(HttpMethod::GET, "/items/1");
        assert!(route.is_unbound());
        assert!(router.routes().iter().all(|entry| !router.is_bound(entry)));
    }
}

#[test]
fn test_conflict_group_is_transitive() {
    let router = Router::new();
    router.bind_controller(Arc::new(ById));
    router.bind_controller(Arc::new(ByName));
    router.bind_controller(Arc::new(ByKey));

    assert_eq!(router.routes().len(), 3);
    assert!(router.routes().iter().all(|entry| !router.is_bound(entry)));
}

#[test]
fn test_unbinding_restores_survivors() {
    let router = Router::new();
    let by_id: Arc<dyn Controller> = Arc::new(ById);
    let by_name: Arc<dyn Controller> = Arc::new(ByName);
    router.bind_controller(by_id.clone());
    router.bind_controller(by_name.clone());
    assert!(router.get_route_for(HttpMethod::GET, "/items/1").is_unbound());

    router.unbind_controller(&by_name);
    let route = router.get_route_for(HttpMethod::GET, "/items/1");
    assert_eq!(route.action_name(), Some("by_id"));
    assert_eq!(
        router.get_reverse_route_for_controller(&by_id, "by_id", &[("id", "1")]),
        Some("/items/1".to_string())
    );
}

#[test]
fn test_unbinding_one_of_three_keeps_the_rest_conflicting() {
    let router = Router::new();
    let by_key: Arc<dyn Controller> = Arc::new(ByKey);
    router.bind_controller(Arc::new(ById));
    router.bind_controller(Arc::new(ByName));
    router.bind_controller(by_key.clone());

    router.unbind_controller(&by_key);
    assert!(router.get_route_for(HttpMethod::GET, "/items/1").is_unbound());
}

#[test]
fn test_conflicted_routes_have_no_reverse_route() {
    let router = Router::new();
    router.bind_controller(Arc::new(Duplicates));
    assert_eq!(router.get_reverse_route_for("Duplicates", "foo", &[]), None);
    assert_eq!(
        router.get_reverse_route_for("Duplicates", "bar", &[]),
        Some("/bar".to_string())
    );
}

#[test]
fn test_different_methods_do_not_conflict() {
    let router = Router::new();
    router.bind(
        ControllerId::new(1),
        "crud",
        vec![
            ok(RouteBuilder::get("/items/{id}"), "show"),
            ok(RouteBuilder::put("/items/{id}"), "update"),
            ok(RouteBuilder::delete("/items/{id}"), "destroy"),
        ],
    );
    assert!(router.routes().iter().all(|entry| router.is_bound(entry)));
    assert_eq!(router.get_route_for(HttpMethod::PUT, "/items/3").action_name(), Some("update"));
}

#[test]
fn test_distinct_media_types_do_not_conflict() {
    let router = Router::new();
    router.bind(
        ControllerId::new(1),
        "media",
        vec![
            ok(RouteBuilder::get("/doc").producing(["application/json"]), "json"),
            ok(RouteBuilder::get("/doc").producing(["application/xml"]), "xml"),
            ok(RouteBuilder::post("/doc").accepting(["text/plain"]), "text"),
            ok(RouteBuilder::post("/doc").accepting(["text/*"]), "any_text"),
        ],
    );

    let bound: Vec<bool> = router
        .routes()
        .iter()
        .map(|entry| router.is_bound(entry))
        .collect();
    // text/* overlaps text/plain
    assert_eq!(bound, vec![true, true, false, false]);
}

#[test]
fn test_clear_then_rebind() {
    let router = Router::new();
    router.bind_controller(Arc::new(ById));
    router.bind_controller(Arc::new(ByName));
    router.clear();
    router.bind_controller(Arc::new(ById));
    assert_eq!(
        router.get_route_for(HttpMethod::GET, "/items/5").action_name(),
        Some("by_id")
    );
}

#[test]
fn test_constraint_equal_to_plain_placeholder_conflicts() {
    let router = Router::new();
    router.bind(
        ControllerId::new(1),
        "plain",
        vec![ok(RouteBuilder::get("/a/{x}"), "x")],
    );
    router.bind(
        ControllerId::new(2),
        "spelled",
        vec![ok(RouteBuilder::get("/a/{y<[^/]+>}"), "y")],
    );

    assert!(router.get_route_for(HttpMethod::GET, "/a/1").is_unbound());

    router.unbind(ControllerId::new(1));
    assert_eq!(
        router.get_route_for(HttpMethod::GET, "/a/1").action_name(),
        Some("y")
    );
}
