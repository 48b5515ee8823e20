use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use waypoint_core::*;

fn engine() -> DefaultConverterEngine {
    DefaultConverterEngine::new()
}

fn get(uri: &str) -> Context {
    Context::new(Request::new(HttpMethod::GET, uri))
}

#[derive(Debug, Default, PartialEq)]
struct Point {
    x: i64,
    y: i64,
}

#[test]
fn test_annotated_constructor_wins_over_default_constructor() {
    static DEFAULT_CALLS: AtomicUsize = AtomicUsize::new(0);

    let descriptor = BeanDescriptor::builder::<Point>()
        .default_constructor(|| {
            DEFAULT_CALLS.fetch_add(1, Ordering::SeqCst);
            Point::default()
        })
        .constructor(
            vec![
                ActionParameter::query("x", ParamType::Primitive(ScalarType::Long)),
                ActionParameter::query("y", ParamType::Primitive(ScalarType::Long)),
            ],
            |args| {
                Ok(Point {
                    x: args[0].as_i64().unwrap_or_default(),
                    y: args[1].as_i64().unwrap_or_default(),
                })
            },
        )
        .build();

    let ctx = get("/?x=3&y=4");
    let value = Bindings::create(&ActionParameter::bean(descriptor), &ctx, &engine()).unwrap();
    assert_eq!(value.bean::<Point>(), Some(&Point { x: 3, y: 4 }));
    assert_eq!(DEFAULT_CALLS.load(Ordering::SeqCst), 0);
}

#[derive(Debug, Default)]
struct Address {
    city: Option<String>,
    zip: Option<String>,
}

#[derive(Debug, Default)]
struct Customer {
    name: Option<String>,
    age: i64,
    tags: Vec<String>,
    address: Option<Address>,
}

fn customer_descriptor() -> Arc<BeanDescriptor> {
    let address = BeanDescriptor::builder::<Address>()
        .default_constructor(Address::default)
        .setter(
            ActionParameter::query("city", ParamType::Scalar(ScalarType::String)),
            |address, value| address.city = value.as_str().map(str::to_string),
        )
        .setter(
            ActionParameter::http("X-Zip", ParamType::Scalar(ScalarType::String)),
            |address, value| address.zip = value.as_str().map(str::to_string),
        )
        .build();

    BeanDescriptor::builder::<Customer>()
        .default_constructor(Customer::default)
        .setter(
            ActionParameter::query("name", ParamType::Scalar(ScalarType::String)),
            |customer, value| customer.name = value.as_str().map(str::to_string),
        )
        .setter(
            ActionParameter::query("age", ParamType::Primitive(ScalarType::Int)),
            |customer, value| customer.age = value.as_i64().unwrap_or_default(),
        )
        .setter(
            ActionParameter::query("tag", ParamType::List(ScalarType::String)),
            |customer, value| {
                customer.tags = value
                    .as_list()
                    .unwrap_or_default()
                    .iter()
                    .filter_map(|tag| tag.as_str().map(str::to_string))
                    .collect();
            },
        )
        .setter(ActionParameter::bean(address), |customer, value| {
            customer.address = value.into_bean::<Address>();
        })
        .build()
}

#[test]
fn test_setters_and_nested_beans() {
    let ctx = Context::new(
        Request::new(
            HttpMethod::GET,
            "/?name=Ada&age=36&tag=math&tag=engines&city=London",
        )
        .with_header("X-Zip", "W1"),
    );

    let value =
        Bindings::create(&ActionParameter::bean(customer_descriptor()), &ctx, &engine()).unwrap();
    let customer = value.bean::<Customer>().unwrap();
    assert_eq!(customer.name.as_deref(), Some("Ada"));
    assert_eq!(customer.age, 36);
    assert_eq!(customer.tags, vec!["math", "engines"]);
    let address = customer.address.as_ref().unwrap();
    assert_eq!(address.city.as_deref(), Some("London"));
    assert_eq!(address.zip.as_deref(), Some("W1"));
}

#[test]
fn test_null_values_skip_setters() {
    let descriptor = BeanDescriptor::builder::<Customer>()
        .default_constructor(|| Customer {
            name: Some("preset".to_string()),
            ..Customer::default()
        })
        .setter(
            ActionParameter::query("name", ParamType::Scalar(ScalarType::String)),
            |customer, value| customer.name = value.as_str().map(str::to_string),
        )
        .build();

    let ctx = get("/");
    let value = Bindings::create(&ActionParameter::bean(descriptor), &ctx, &engine()).unwrap();
    assert_eq!(
        value.bean::<Customer>().unwrap().name.as_deref(),
        Some("preset")
    );
}

#[test]
fn test_descriptor_without_constructor_fails() {
    let descriptor = BeanDescriptor::builder::<Point>().build();
    let ctx = get("/");
    let result = Bindings::create(&ActionParameter::bean(descriptor), &ctx, &engine());
    assert!(matches!(result, Err(Error::Binding(_))));
}

#[test]
fn test_constructor_errors_propagate() {
    let descriptor = BeanDescriptor::builder::<Point>()
        .constructor(
            vec![ActionParameter::query("x", ParamType::Scalar(ScalarType::Long))],
            |args| match args[0].as_i64() {
                Some(x) => Ok(Point { x, y: 0 }),
                None => Err(Error::Validation("x is required".to_string())),
            },
        )
        .build();

    let ctx = get("/");
    let result = Bindings::create(&ActionParameter::bean(descriptor.clone()), &ctx, &engine());
    assert!(matches!(result, Err(Error::Validation(_))));

    let ctx = get("/?x=nope");
    let result = Bindings::create(&ActionParameter::bean(descriptor), &ctx, &engine());
    assert!(matches!(result, Err(Error::Conversion(_))));
}

#[test]
fn test_bean_in_route_action() {
    let router = Router::new();
    router.bind(
        ControllerId::new(1),
        "customers",
        vec![
            RouteBuilder::post("/customers")
                .parameter(ActionParameter::bean(customer_descriptor()))
                .to("create", |_, args| {
                    let customer = args[0]
                        .bean::<Customer>()
                        .ok_or_else(|| Error::Internal("no customer".to_string()))?;
                    Ok(HttpResponse::created().with_body(customer.name.clone().unwrap_or_default()))
                }),
        ],
    );

    let request = Request::new(HttpMethod::POST, "/customers?name=Grace");
    let route = router.get_route_for_request(HttpMethod::POST, "/customers", &request);
    let response = route.invoke(&mut Context::new(request)).unwrap();
    assert_eq!(response.status, 201);
    assert_eq!(response.body_str(), Some("Grace"));
}
