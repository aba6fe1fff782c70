//! Isomorphic state bridge.
//!
//! Page code reads `error`, `errors`, `payload`, `global`, `data` and `api`
//! through [`IsomorphicBridge`] without knowing where it runs:
//!
//! - [`ServerBridge`] rebuilds the state from the request context on every
//!   access. Nothing is cached, so requests never see each other's state.
//! - [`ClientBridge`] owns a lazily created singleton for the life of the page.
//!   On first use it takes `data`, `payload` and recorded `errors` out of the
//!   page bootstrap; later accesses never read those globals again.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::api::{ApiFactory, ApiHandle, ApiManifest};
use crate::hydration::Bootstrap;
use crate::payload::{payload_path, PayloadMode};

/// Operation name under which data loader failures are recorded.
pub const GET_DATA: &str = "getData";

/// Operation name under which payload fetch failures are recorded.
pub const GET_PAYLOAD: &str = "getPayload";

/// A failure surfaced to page code instead of being raised.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateError {
    pub name: String,
    pub message: String,
}

impl StateError {
    pub fn new(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            message: message.into(),
        }
    }

    /// Record any displayable error under an operation name.
    pub fn from_error(name: impl Into<String>, error: &dyn fmt::Display) -> Self {
        Self::new(name, error.to_string())
    }
}

impl fmt::Display for StateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.name, self.message)
    }
}

/// State readable from page code on either side.
#[derive(Debug, Clone, Default)]
pub struct IsomorphicState {
    /// Last surfaced failure.
    pub error: Option<StateError>,
    /// Failures by operation name.
    pub errors: BTreeMap<String, StateError>,
    pub payload: Option<Value>,
    pub global: Option<Value>,
    pub data: Option<Value>,
    pub api: Option<Arc<dyn ApiHandle>>,
}

/// Where the server bridge copies its fields from.
pub trait StateSource {
    fn error(&self) -> Option<&StateError>;
    fn errors(&self) -> &BTreeMap<String, StateError>;
    fn payload(&self) -> Option<&Value>;
    fn global(&self) -> Option<&Value>;
    fn data(&self) -> Option<&Value>;
    fn api(&self) -> Option<Arc<dyn ApiHandle>>;
}

impl IsomorphicState {
    /// Fresh copy of a request's state.
    pub fn from_source<S: StateSource + ?Sized>(source: &S) -> Self {
        Self {
            error: source.error().cloned(),
            errors: source.errors().clone(),
            payload: source.payload().cloned(),
            global: source.global().cloned(),
            data: source.data().cloned(),
            api: source.api(),
        }
    }
}

/// One state contract for server and client code.
pub trait IsomorphicBridge {
    /// The state as seen from the current side.
    fn use_isomorphic(&mut self) -> &mut IsomorphicState;

    /// `true` until the client finishes its first render pass.
    fn is_first_render(&self) -> bool {
        false
    }

    /// Record a failed operation and surface it as the current error.
    ///
    /// On the server the record lasts until the next access; request-wide
    /// failures belong in the route context.
    fn record_error(&mut self, operation: impl Into<String>, error: StateError)
    where
        Self: Sized,
    {
        let state = self.use_isomorphic();
        state.errors.insert(operation.into(), error.clone());
        state.error = Some(error);
    }

    /// The page data, or `None` with `error` set when the data loader failed.
    ///
    /// A route without data also yields `None`, with `error` untouched.
    fn use_data(&mut self) -> Option<Value> {
        let state = self.use_isomorphic();
        if let Some(error) = state.errors.get(GET_DATA).cloned() {
            state.error = Some(error);
            return None;
        }
        state.data.clone()
    }

    /// The page payload.
    ///
    /// `None` has two meanings, told apart by `error`:
    /// - `error` is the `getPayload` failure: fetching the payload failed;
    /// - otherwise no payload has been loaded yet.
    ///
    /// Callers that must distinguish the two check
    /// `use_isomorphic().errors.contains_key(GET_PAYLOAD)`.
    fn use_payload(&mut self) -> Option<Value> {
        let state = self.use_isomorphic();
        if let Some(error) = state.errors.get(GET_PAYLOAD).cloned() {
            state.error = Some(error);
            return None;
        }
        state.payload.clone()
    }
}

/// Server side: state derived from the request context on each access.
pub struct ServerBridge<'a, S: StateSource + ?Sized> {
    source: &'a S,
    current: IsomorphicState,
}

impl<'a, S: StateSource + ?Sized> ServerBridge<'a, S> {
    pub fn new(source: &'a S) -> Self {
        Self {
            source,
            current: IsomorphicState::default(),
        }
    }
}

impl<S: StateSource + ?Sized> IsomorphicBridge for ServerBridge<'_, S> {
    fn use_isomorphic(&mut self) -> &mut IsomorphicState {
        self.current = IsomorphicState::from_source(self.source);
        &mut self.current
    }
}

/// Values the server inlined into the page.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PageGlobals {
    pub route: Option<Value>,
    pub routes: Option<Value>,
    pub data: Option<Value>,
    pub payload: Option<Value>,
    pub global: Option<Value>,
    pub errors: BTreeMap<String, StateError>,
    /// Payloads are pre-generated `index.json` files.
    pub static_payload: bool,
    /// Current document path.
    pub location: String,
    pub api: ApiManifest,
}

impl PageGlobals {
    /// Seed globals from a page's bootstrap script.
    ///
    /// `data`, `payload`, `global`, `errors`, `staticPayload` and `api` are
    /// read from the route context view; missing or `null` entries stay unset.
    pub fn from_bootstrap(bootstrap: Bootstrap, location: impl Into<String>) -> Self {
        let Bootstrap { route, routes } = bootstrap;

        let take = |key: &str| route.get(key).filter(|v| !v.is_null()).cloned();
        let errors = route
            .get("errors")
            .and_then(|v| serde_json::from_value(v.clone()).ok())
            .unwrap_or_default();
        let api = route
            .get("api")
            .and_then(|v| serde_json::from_value(v.clone()).ok())
            .unwrap_or_default();
        let static_payload = route
            .get("staticPayload")
            .and_then(Value::as_bool)
            .unwrap_or(false);

        Self {
            data: take("data"),
            payload: take("payload"),
            global: take("global"),
            errors,
            static_payload,
            api,
            location: location.into(),
            route: Some(route),
            routes: Some(routes),
        }
    }
}

/// Client side: the page-lifetime singleton, owned by the app root.
pub struct ClientBridge {
    globals: PageGlobals,
    singleton: Option<IsomorphicState>,
    api_factory: Option<Arc<dyn ApiFactory>>,
    first_render: bool,
}

impl ClientBridge {
    pub fn new(globals: PageGlobals) -> Self {
        Self {
            globals,
            singleton: None,
            api_factory: None,
            first_render: true,
        }
    }

    pub fn with_api_factory(mut self, factory: Arc<dyn ApiFactory>) -> Self {
        self.api_factory = Some(factory);
        self
    }

    /// Remaining page globals (bootstrap values disappear once consumed).
    pub fn globals(&self) -> &PageGlobals {
        &self.globals
    }

    /// Mark the first client render pass as finished. Idempotent.
    pub fn hydration_done(&mut self) {
        if self.first_render {
            self.first_render = false;
        }
    }

    /// Store a payload fetched after the first render.
    pub fn set_payload(&mut self, payload: Value) {
        let state = self.use_isomorphic();
        state.errors.remove(GET_PAYLOAD);
        state.payload = Some(payload);
    }

    /// Payload URL for `route_path` as seen from the current document.
    pub fn payload_path(&self, route_path: &str) -> String {
        payload_path(
            PayloadMode::from_flag(self.globals.static_payload),
            &self.globals.location,
            route_path,
        )
    }
}

impl IsomorphicBridge for ClientBridge {
    fn use_isomorphic(&mut self) -> &mut IsomorphicState {
        let globals = &mut self.globals;
        let state = self.singleton.get_or_insert_with(|| IsomorphicState {
            errors: std::mem::take(&mut globals.errors),
            ..Default::default()
        });

        state.global = globals.global.clone();
        state.api = self
            .api_factory
            .as_ref()
            .map(|factory| factory.create(&globals.api, ""));

        if state.data.is_none() {
            state.data = globals.data.take();
        }
        if state.payload.is_none() {
            state.payload = globals.payload.take();
        }

        state
    }

    fn is_first_render(&self) -> bool {
        self.first_render
    }
}
