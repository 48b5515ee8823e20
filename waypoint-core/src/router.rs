//! The route table.
//!
//! Controllers are bound and unbound as a whole. Every mutation rebuilds the
//! table under a single writer lock and recomputes conflicts from scratch;
//! readers work on an immutable snapshot and never block writers for longer
//! than an `Arc` clone.
//!
//! ```
//! use std::sync::Arc;
//! use waypoint_core::{Controller, HttpMethod, HttpResponse, RouteBuilder, RouteSpec, Router};
//!
//! struct Items;
//!
//! impl Controller for Items {
//!     fn prefix(&self) -> &str {
//!         "/items"
//!     }
//!
//!     fn routes(&self) -> Vec<RouteSpec> {
//!         vec![RouteBuilder::get("/{id}").to("show", |_, _| Ok(HttpResponse::ok()))]
//!     }
//! }
//!
//! let router = Router::new();
//! router.bind_controller(Arc::new(Items));
//!
//! let route = router.get_route_for(HttpMethod::GET, "/items/42");
//! assert!(!route.is_unbound());
//! assert_eq!(route.path_parameters_encoded()["id"], "42");
//! assert!(router.get_route_for(HttpMethod::GET, "/items").is_unbound());
//! ```

use crate::config::RouterConfig;
use crate::controller::{Controller, ControllerId};
use crate::converter::{ConverterEngine, DefaultConverterEngine};
use crate::http::{HttpMethod, Request};
use crate::negotiation::ContentNegotiator;
use crate::reverse::compute_url;
use crate::route::{Route, RouteEntry, RouteSpec, Services};
use crate::validation::Validator;
use parking_lot::{Mutex, RwLock};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info, trace, warn};

#[derive(Debug, Clone)]
struct RouteSlot {
    entry: Arc<RouteEntry>,
    bound: bool,
}

/// Registry of routes with conflict detection, lookup and reverse routing.
pub struct Router {
    slots: RwLock<Arc<Vec<RouteSlot>>>,
    writer: Mutex<()>,
    validator: RwLock<Option<Arc<dyn Validator>>>,
    engine: RwLock<Option<Arc<dyn ConverterEngine>>>,
    services: RwLock<Arc<Services>>,
    config: RouterConfig,
}

impl Router {
    pub fn new() -> Self {
        Self::with_config(RouterConfig::default())
    }

    pub fn with_config(config: RouterConfig) -> Self {
        let services = Services {
            engine: Arc::new(DefaultConverterEngine::new()),
            validator: None,
            config: config.clone(),
        };
        Self {
            slots: RwLock::new(Arc::new(Vec::new())),
            writer: Mutex::new(()),
            validator: RwLock::new(None),
            engine: RwLock::new(None),
            services: RwLock::new(Arc::new(services)),
            config,
        }
    }

    pub fn config(&self) -> &RouterConfig {
        &self.config
    }

    /// Bind every route a controller declares. Returns the number of routes
    /// added; routes that fail to compile are skipped with a warning.
    pub fn bind_controller(&self, controller: Arc<dyn Controller>) -> usize {
        let id = ControllerId::of(&controller);
        let name = controller.name();
        let prefix = controller.prefix().to_string();
        let specs = controller.routes();
        self.bind_specs(id, name, &prefix, Some(controller), specs)
    }

    /// Bind routes under an explicit controller identity.
    pub fn bind(&self, id: ControllerId, name: &str, specs: Vec<RouteSpec>) -> usize {
        self.bind_specs(id, name, "", None, specs)
    }

    fn bind_specs(
        &self,
        id: ControllerId,
        name: &str,
        prefix: &str,
        controller: Option<Arc<dyn Controller>>,
        specs: Vec<RouteSpec>,
    ) -> usize {
        let declared = specs.len();
        let compiled: Vec<Arc<RouteEntry>> = specs
            .into_iter()
            .filter_map(|spec| {
                let method = spec.method();
                let uri = spec.uri().to_string();
                match RouteEntry::compile(spec, id, name, prefix, controller.clone()) {
                    Ok(entry) => Some(Arc::new(entry)),
                    Err(e) => {
                        warn!(
                            controller = name,
                            method = %method,
                            uri = %uri,
                            error = %e,
                            "skipping route"
                        );
                        None
                    }
                }
            })
            .collect();

        let added = compiled.len();
        self.update(|current| {
            current
                .iter()
                .map(|slot| slot.entry.clone())
                .chain(compiled)
                .collect()
        });

        info!(
            controller = name,
            routes = added,
            skipped = declared - added,
            "controller bound"
        );
        added
    }

    /// Remove every route of a controller. Returns the number removed.
    pub fn unbind_controller(&self, controller: &Arc<dyn Controller>) -> usize {
        self.unbind(ControllerId::of(controller))
    }

    pub fn unbind(&self, id: ControllerId) -> usize {
        let mut removed = 0;
        self.update(|current| {
            current
                .iter()
                .filter(|slot| {
                    let owned = slot.entry.controller_id() == id;
                    if owned {
                        removed += 1;
                    }
                    !owned
                })
                .map(|slot| slot.entry.clone())
                .collect()
        });
        info!(controller_id = id.value(), routes = removed, "controller unbound");
        removed
    }

    /// Remove every route.
    pub fn clear(&self) {
        self.update(|_| Vec::new());
        info!("route table cleared");
    }

    fn update<F>(&self, rebuild: F)
    where
        F: FnOnce(&[RouteSlot]) -> Vec<Arc<RouteEntry>>,
    {
        let _guard = self.writer.lock();
        let current = self.snapshot();
        let entries = rebuild(&current);
        let slots = resolve_conflicts(entries, &current);
        *self.slots.write() = Arc::new(slots);
    }

    fn snapshot(&self) -> Arc<Vec<RouteSlot>> {
        self.slots.read().clone()
    }

    fn services(&self) -> Arc<Services> {
        self.services.read().clone()
    }

    /// Find the route for a method and path, without media type negotiation.
    pub fn get_route_for(&self, method: HttpMethod, path: &str) -> Route {
        self.lookup(method, path, None)
    }

    /// Find the route for a request, negotiating on `Accept` and `Content-Type`.
    pub fn get_route_for_request(&self, method: HttpMethod, path: &str, request: &Request) -> Route {
        self.lookup(method, path, Some(request))
    }

    /// Like [`Router::get_route_for_request`] with a method name. Unknown
    /// methods yield an unbound 404 route.
    pub fn get_route_for_str(&self, method: &str, path: &str, request: Option<&Request>) -> Route {
        match HttpMethod::from_str(method) {
            Some(method) => self.lookup(method, path, request),
            None => {
                trace!(method, path, "unknown method");
                Route::unbound(HttpMethod::default(), path, 404)
            }
        }
    }

    fn lookup(&self, method: HttpMethod, path: &str, request: Option<&Request>) -> Route {
        let snapshot = self.snapshot();

        let mut candidates: Vec<(&RouteSlot, HashMap<String, String>)> = snapshot
            .iter()
            .filter(|slot| slot.entry.method() == method)
            .filter_map(|slot| slot.entry.pattern().captures(path).map(|params| (slot, params)))
            .collect();

        if candidates.is_empty() {
            trace!(method = %method, path, "no route matches");
            return Route::unbound(method, path, 404);
        }

        if self.config.prefer_exact_match {
            candidates.sort_by_key(|(slot, _)| slot.entry.url() != path);
        }

        let mut usable: Vec<(&RouteSlot, HashMap<String, String>)> =
            candidates.into_iter().filter(|(slot, _)| slot.bound).collect();

        if usable.is_empty() {
            debug!(method = %method, path, "only conflicting routes match");
            return Route::unbound(method, path, 404);
        }

        let index = match request {
            None => 0,
            Some(request) => {
                let entries: Vec<&Arc<RouteEntry>> =
                    usable.iter().map(|(slot, _)| &slot.entry).collect();
                match ContentNegotiator::select(&entries, request) {
                    Ok(selected) => usable
                        .iter()
                        .position(|(slot, _)| Arc::ptr_eq(&slot.entry, selected))
                        .unwrap_or(0),
                    Err(failure) => {
                        debug!(
                            method = %method,
                            path,
                            status = failure.status(),
                            "negotiation failed: {}",
                            failure
                        );
                        return Route::unbound(method, path, failure.status());
                    }
                }
            }
        };

        let (slot, params) = usable.swap_remove(index);
        trace!(
            method = %method,
            path,
            action = slot.entry.action_name(),
            "route matched"
        );
        Route::bound(method, path, slot.entry.clone(), params, self.services())
    }

    /// URL of a controller action. `controller` is the controller's name,
    /// either fully qualified or its last path segment. Returns `None` when
    /// no bound route matches.
    pub fn get_reverse_route_for(
        &self,
        controller: &str,
        action: &str,
        pairs: &[(&str, &str)],
    ) -> Option<String> {
        self.reverse(pairs, |entry| {
            entry.action_name() == action && controller_name_matches(entry.controller_name(), controller)
        })
    }

    pub fn get_reverse_route_for_controller(
        &self,
        controller: &Arc<dyn Controller>,
        action: &str,
        pairs: &[(&str, &str)],
    ) -> Option<String> {
        let id = ControllerId::of(controller);
        self.reverse(pairs, |entry| {
            entry.action_name() == action && entry.controller_id() == id
        })
    }

    fn reverse<P>(&self, pairs: &[(&str, &str)], matches: P) -> Option<String>
    where
        P: Fn(&RouteEntry) -> bool,
    {
        let snapshot = self.snapshot();
        let slot = snapshot
            .iter()
            .find(|slot| slot.bound && matches(&slot.entry))?;
        Some(compute_url(slot.entry.pattern(), pairs))
    }

    /// Every entry in registration order, conflicting ones included.
    pub fn routes(&self) -> Vec<Arc<RouteEntry>> {
        self.snapshot()
            .iter()
            .map(|slot| slot.entry.clone())
            .collect()
    }

    /// Whether an entry is in the table and free of conflicts
    pub fn is_bound(&self, entry: &RouteEntry) -> bool {
        self.snapshot()
            .iter()
            .any(|slot| slot.bound && std::ptr::eq(Arc::as_ptr(&slot.entry), entry))
    }

    pub fn set_validator(&self, validator: Option<Arc<dyn Validator>>) {
        let _guard = self.writer.lock();
        *self.validator.write() = validator;
        self.refresh_services();
    }

    pub fn validator(&self) -> Option<Arc<dyn Validator>> {
        self.validator.read().clone()
    }

    /// Replace the converter engine. `None` restores the default engine.
    pub fn set_converter_engine(&self, engine: Option<Arc<dyn ConverterEngine>>) {
        let _guard = self.writer.lock();
        *self.engine.write() = engine;
        self.refresh_services();
    }

    pub fn converter_engine(&self) -> Option<Arc<dyn ConverterEngine>> {
        self.engine.read().clone()
    }

    /// Rebuild the services handed to new routes. Callers hold `writer`.
    fn refresh_services(&self) {
        let engine: Arc<dyn ConverterEngine> = match self.converter_engine() {
            Some(engine) => engine,
            None => Arc::new(DefaultConverterEngine::new()),
        };
        let services = Services {
            engine,
            validator: self.validator(),
            config: self.config.clone(),
        };
        *self.services.write() = Arc::new(services);
    }
}

impl Default for Router {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Router {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let snapshot = self.snapshot();
        f.debug_struct("Router")
            .field("routes", &snapshot.len())
            .field(
                "conflicting",
                &snapshot.iter().filter(|slot| !slot.bound).count(),
            )
            .field("config", &self.config)
            .finish()
    }
}

fn controller_name_matches(name: &str, wanted: &str) -> bool {
    name == wanted || name.rsplit("::").next() == Some(wanted)
}

/// Mark every entry that conflicts with another entry as unbound, logging
/// state changes relative to the previous table.
fn resolve_conflicts(entries: Vec<Arc<RouteEntry>>, previous: &[RouteSlot]) -> Vec<RouteSlot> {
    let bound = conflict_free(&entries);

    let was_bound: HashMap<*const RouteEntry, bool> = previous
        .iter()
        .map(|slot| (Arc::as_ptr(&slot.entry), slot.bound))
        .collect();

    for (entry, &now_bound) in entries.iter().zip(&bound) {
        match (was_bound.get(&Arc::as_ptr(entry)).copied(), now_bound) {
            (Some(true) | None, false) => warn!(
                method = %entry.method(),
                uri = entry.url(),
                controller = entry.controller_name(),
                action = entry.action_name(),
                "conflicting route unbound"
            ),
            (Some(false), true) => info!(
                method = %entry.method(),
                uri = entry.url(),
                action = entry.action_name(),
                "route conflict cleared"
            ),
            _ => {}
        }
    }

    entries
        .into_iter()
        .zip(bound)
        .map(|(entry, bound)| RouteSlot { entry, bound })
        .collect()
}

/// `false` for each entry conflicting with at least one other entry.
fn conflict_free(entries: &[Arc<RouteEntry>]) -> Vec<bool> {
    let mut groups: HashMap<(HttpMethod, &str), Vec<usize>> = HashMap::new();
    for (index, entry) in entries.iter().enumerate() {
        groups
            .entry((entry.method(), entry.signature()))
            .or_default()
            .push(index);
    }

    let mut bound = vec![true; entries.len()];
    for members in groups.values().filter(|members| members.len() > 1) {
        for (i, &a) in members.iter().enumerate() {
            for &b in &members[i + 1..] {
                if entries[a].conflicts_with(&entries[b]) {
                    bound[a] = false;
                    bound[b] = false;
                }
            }
        }
    }
    bound
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::HttpResponse;
    use crate::route::RouteBuilder;

    fn ok(builder: RouteBuilder, action: &str) -> RouteSpec {
        builder.to(action, |_, _| Ok(HttpResponse::ok()))
    }

    #[test]
    fn test_bind_and_lookup() {
        let router = Router::new();
        let added = router.bind(
            ControllerId::new(1),
            "demo",
            vec![ok(RouteBuilder::get("/foo"), "foo"), ok(RouteBuilder::get("/bar/{id}"), "bar")],
        );
        assert_eq!(added, 2);
        assert_eq!(router.get_route_for(HttpMethod::GET, "/foo").action_name(), Some("foo"));
        let bar = router.get_route_for(HttpMethod::GET, "/bar/7");
        assert_eq!(bar.action_name(), Some("bar"));
        assert_eq!(bar.path_parameters_encoded()["id"], "7");
        assert_eq!(router.get_route_for(HttpMethod::POST, "/foo").unbound_status(), 404);
    }

    #[test]
    fn test_invalid_route_is_skipped() {
        let router = Router::new();
        let added = router.bind(
            ControllerId::new(1),
            "demo",
            vec![ok(RouteBuilder::get("/{id"), "broken"), ok(RouteBuilder::get("/ok"), "ok")],
        );
        assert_eq!(added, 1);
        assert_eq!(router.routes().len(), 1);
    }

    #[test]
    fn test_exact_match_preferred() {
        let router = Router::new();
        router.bind(
            ControllerId::new(1),
            "demo",
            vec![ok(RouteBuilder::get("/{name}"), "param"), ok(RouteBuilder::get("/about"), "about")],
        );
        let route = router.get_route_for(HttpMethod::GET, "/about");
        assert_eq!(route.action_name(), Some("about"));

        let ordered = Router::with_config(RouterConfig {
            prefer_exact_match: false,
            ..RouterConfig::default()
        });
        ordered.bind(
            ControllerId::new(1),
            "demo",
            vec![ok(RouteBuilder::get("/{name}"), "param"), ok(RouteBuilder::get("/about"), "about")],
        );
        let route = ordered.get_route_for(HttpMethod::GET, "/about");
        assert_eq!(route.action_name(), Some("param"));
    }

    #[test]
    fn test_sub_route_does_not_conflict_with_literal() {
        let router = Router::new();
        router.bind(
            ControllerId::new(1),
            "demo",
            vec![ok(RouteBuilder::get("/foo/*"), "sub"), ok(RouteBuilder::get("/foo/bar"), "bar")],
        );
        assert!(router.routes().iter().all(|entry| router.is_bound(entry)));
        assert_eq!(router.get_route_for(HttpMethod::GET, "/foo/bar").action_name(), Some("bar"));
        assert_eq!(router.get_route_for(HttpMethod::GET, "/foo/baz/qux").action_name(), Some("sub"));
    }

    #[test]
    fn test_unknown_method_name() {
        let router = Router::new();
        router.bind(ControllerId::new(1), "demo", vec![ok(RouteBuilder::get("/"), "index")]);
        let route = router.get_route_for_str("BREW", "/", None);
        assert!(route.is_unbound());
        assert_eq!(route.unbound_status(), 404);
        assert!(!router.get_route_for_str("get", "/", None).is_unbound());
    }

    #[test]
    fn test_clear() {
        let router = Router::new();
        router.bind(ControllerId::new(1), "demo", vec![ok(RouteBuilder::get("/"), "index")]);
        router.clear();
        assert!(router.routes().is_empty());
        assert!(router.get_route_for(HttpMethod::GET, "/").is_unbound());
    }

    #[test]
    fn test_controller_name_matching() {
        assert!(controller_name_matches("app::controllers::Users", "Users"));
        assert!(controller_name_matches("app::controllers::Users", "app::controllers::Users"));
        assert!(!controller_name_matches("app::controllers::Users", "controllers"));
    }

    #[test]
    fn test_engine_and_validator_are_replaceable() {
        let router = Router::new();
        assert!(router.converter_engine().is_none());
        assert!(router.validator().is_none());
        router.set_converter_engine(Some(Arc::new(DefaultConverterEngine::new())));
        router.set_validator(Some(Arc::new(crate::validation::RequiredValidator)));
        assert!(router.converter_engine().is_some());
        assert!(router.validator().is_some());
        router.set_validator(None);
        assert!(router.validator().is_none());
    }
}
