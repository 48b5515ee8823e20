use std::sync::Arc;
use waypoint_core::*;

struct Foo;

impl Controller for Foo {
    fn routes(&self) -> Vec<RouteSpec> {
        vec![
            RouteBuilder::get("/foo/{id}").to("foo", |_, _| Ok(HttpResponse::ok())),
            RouteBuilder::get("/urlcoding/{p1}/{p2}")
                .parameters([
                    ActionParameter::path("p1", ParamType::Scalar(ScalarType::String)),
                    ActionParameter::path("p2", ParamType::Scalar(ScalarType::String)),
                    ActionParameter::query("q", ParamType::Scalar(ScalarType::String)),
                ])
                .to("coding", |_, args| {
                    let body: Vec<&str> = args.iter().map(|v| v.as_str().unwrap_or("")).collect();
                    Ok(HttpResponse::ok().with_body(body.join("|")))
                }),
        ]
    }
}

struct Named;

impl Controller for Named {
    fn prefix(&self) -> &str {
        "/named"
    }

    fn name(&self) -> &'static str {
        "accounts"
    }

    fn routes(&self) -> Vec<RouteSpec> {
        vec![RouteBuilder::get("/{user}").to("show", |_, _| Ok(HttpResponse::ok()))]
    }
}

fn router() -> Router {
    let router = Router::new();
    router.bind_controller(Arc::new(Foo));
    router.bind_controller(Arc::new(Named));
    router
}

#[test]
fn test_round_trip() {
    let router = router();
    assert_eq!(
        router.get_reverse_route_for("Foo", "foo", &[("id", "w")]),
        Some("/foo/w".to_string())
    );
    assert_eq!(
        router.get_reverse_route_for("Foo", "foo", &[("id", "w"), ("q", "v")]),
        Some("/foo/w?q=v".to_string())
    );
    assert_eq!(
        router.get_reverse_route_for("Foo", "foo", &[]),
        Some("/foo/{id}".to_string())
    );
}

#[test]
fn test_controller_name_forms() {
    let router = router();
    let full = std::any::type_name::<Foo>();
    assert_eq!(
        router.get_reverse_route_for(full, "foo", &[("id", "1")]),
        Some("/foo/1".to_string())
    );
    assert_eq!(
        router.get_reverse_route_for("accounts", "show", &[("user", "ada")]),
        Some("/named/ada".to_string())
    );
    assert_eq!(router.get_reverse_route_for("Named", "show", &[]), None);
    assert_eq!(router.get_reverse_route_for("Foo", "missing", &[]), None);
    assert_eq!(router.get_reverse_route_for("Bar", "foo", &[]), None);
}

#[test]
fn test_reverse_by_controller_instance() {
    let router = Router::new();
    let first: Arc<dyn Controller> = Arc::new(Foo);
    let second: Arc<dyn Controller> = Arc::new(Named);
    router.bind_controller(first.clone());

    assert_eq!(
        router.get_reverse_route_for_controller(&first, "foo", &[("id", "7")]),
        Some("/foo/7".to_string())
    );
    assert_eq!(
        router.get_reverse_route_for_controller(&second, "show", &[]),
        None
    );
}

#[test]
fn test_encoding_table() {
    let router = router();
    let rows = [
        ("+", "+", "%2B"),
        (" ", "%20", "+"),
        ("&", "&", "%26"),
        ("=", "=", "%3D"),
        ("/", "%2F", "%2F"),
        ("~", "~", "~"),
        ("Ab9", "Ab9", "Ab9"),
    ];

    for (decoded, in_path, in_query) in rows {
        let url = router
            .get_reverse_route_for(
                "Foo",
                "coding",
                &[("p1", decoded), ("p2", decoded), ("q", decoded)],
            )
            .unwrap();
        assert_eq!(
            url,
            format!("/urlcoding/{0}/{0}?q={1}", in_path, in_query),
            "row {:?}",
            decoded
        );
    }
}

#[test]
fn test_reverse_url_routes_back_to_its_values() {
    let router = router();
    for decoded in ["+", " ", "&", "=", "/", "~", "a b&c=d/e"] {
        let url = router
            .get_reverse_route_for(
                "Foo",
                "coding",
                &[("p1", decoded), ("p2", "x"), ("q", decoded)],
            )
            .unwrap();

        let request = Request::new(HttpMethod::GET, &url);
        let route = router.get_route_for_request(HttpMethod::GET, &request.path, &request);
        assert_eq!(route.action_name(), Some("coding"), "{}", url);

        let response = route.invoke(&mut Context::new(request)).unwrap();
        assert_eq!(
            response.body_str(),
            Some(format!("{0}|x|{0}", decoded).as_str()),
            "{}",
            url
        );
    }
}
