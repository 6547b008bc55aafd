use std::any::Any;
use std::fmt;
use std::sync::Arc;

/// Opaque host value identifying what a screen renders and its arguments.
///
/// The tree never looks inside a destination beyond its route template; scope
/// membership, pane roles, and container declarations are all data-driven
/// lookups keyed by the route. Hosts downcast through `as_any` to recover
/// their concrete type.
pub trait Destination: fmt::Debug + Send + Sync {
    /// Route template, e.g. `"products/{id}"`.
    fn route(&self) -> &str;

    fn as_any(&self) -> &dyn Any;
}

pub type DestinationRef = Arc<dyn Destination>;

/// Minimal destination carrying only a route. Enough for hosts that encode
/// arguments in the route string, and for tests.
#[derive(Clone, PartialEq, Eq)]
pub struct RouteDestination {
    route: String,
}

impl RouteDestination {
    pub fn new(route: impl Into<String>) -> Self {
        Self {
            route: route.into(),
        }
    }

    pub fn shared(route: impl Into<String>) -> DestinationRef {
        Arc::new(Self::new(route))
    }
}

impl Destination for RouteDestination {
    fn route(&self) -> &str {
        &self.route
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl fmt::Debug for RouteDestination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.route)
    }
}
