//! Route classifier: derives `{resource, action}` pairs from route records
//!
//! The classifier is a pure function over `(uri, method, symbolic_name)`.
//! Routes outside the API prefix, auth/utility routes, and HEAD/OPTIONS
//! registrations are skipped and never become permissions.

use serde::{Deserialize, Serialize};

/// URI infixes that mark auth/utility routes, never turned into permissions
const RESERVED_INFIXES: [&str; 5] = ["login", "logout", "register", "password", "email/verify"];

/// The action a route performs on its resource
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    Index,
    Show,
    Store,
    Update,
    Destroy,
    Search,
    Batch,
    Unknown,
}

impl Action {
    /// Parse a symbolic-name suffix; only the known vocabulary matches
    pub fn from_token(token: &str) -> Option<Action> {
        match token {
            "index" => Some(Action::Index),
            "show" => Some(Action::Show),
            "store" => Some(Action::Store),
            "update" => Some(Action::Update),
            "destroy" => Some(Action::Destroy),
            "search" => Some(Action::Search),
            "batch" => Some(Action::Batch),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Action::Index => "index",
            Action::Show => "show",
            Action::Store => "store",
            Action::Update => "update",
            Action::Destroy => "destroy",
            Action::Search => "search",
            Action::Batch => "batch",
            Action::Unknown => "unknown",
        }
    }

    /// Verb phrase used when building display names
    pub fn verb_phrase(&self) -> &'static str {
        match self {
            Action::Index => "View All",
            Action::Show => "View",
            Action::Store => "Create",
            Action::Update => "Update",
            Action::Destroy => "Delete",
            Action::Search => "Search",
            Action::Batch => "Batch Operations",
            Action::Unknown => "Unknown",
        }
    }

    /// Fixed ordering used when presenting a resource group
    pub fn priority(&self) -> usize {
        match self {
            Action::Index => 0,
            Action::Show => 1,
            Action::Store => 2,
            Action::Update => 3,
            Action::Destroy => 4,
            Action::Search => 5,
            Action::Batch => 6,
            Action::Unknown => 7,
        }
    }

    /// Ordering for action tokens stored as text; unrecognized tokens sort last
    pub fn priority_of(token: &str) -> usize {
        Action::from_token(token).map_or(7, |action| action.priority())
    }
}

/// Classifier settings; the API prefix is configurable per deployment
#[derive(Debug, Clone)]
pub struct ClassifierConfig {
    /// Leading URI segment that marks API routes (without slashes)
    pub api_prefix: String,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            api_prefix: "api".to_string(),
        }
    }
}

/// A route the classifier accepted, with its derived resource and action
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassifiedRoute {
    pub resource: String,
    pub action: Action,
    pub uri: String,
    pub method: String,
    pub symbolic_name: Option<String>,
}

/// Classify one route record into `{resource, action}`, or skip it
///
/// Rules, in priority order:
/// 1. HEAD and OPTIONS are always skipped.
/// 2. The URI must start with the API prefix.
/// 3. Reserved auth/utility infixes skip the route.
/// 4. A known `.`-delimited symbolic-name suffix wins over shape rules.
/// 5. Otherwise the action is derived from the method and URI shape.
pub fn classify(
    uri: &str,
    method: &str,
    symbolic_name: Option<&str>,
    config: &ClassifierConfig,
) -> Option<ClassifiedRoute> {
    let method = method.to_ascii_uppercase();
    if method == "HEAD" || method == "OPTIONS" {
        return None;
    }

    let uri = uri.trim_matches('/');
    let prefix = config.api_prefix.trim_matches('/');

    let remainder = if uri == prefix {
        ""
    } else {
        uri.strip_prefix(prefix)
            .and_then(|rest| rest.strip_prefix('/'))?
    };

    if RESERVED_INFIXES.iter().any(|infix| uri.contains(infix)) {
        return None;
    }

    let resource = remainder.split('/').next().filter(|s| !s.is_empty())?;

    let action = symbolic_name
        .and_then(|name| name.rsplit_once('.'))
        .and_then(|(_, suffix)| Action::from_token(suffix))
        .unwrap_or_else(|| action_from_shape(&method, remainder));

    Some(ClassifiedRoute {
        resource: resource.to_string(),
        action,
        uri: uri.to_string(),
        method,
        symbolic_name: symbolic_name.map(str::to_string),
    })
}

/// Derive the action from the HTTP method and the URI shape
fn action_from_shape(method: &str, uri: &str) -> Action {
    let has_param = uri.contains('{');

    match method {
        "GET" => {
            if uri.contains("search") {
                Action::Search
            } else if has_param {
                Action::Show
            } else {
                Action::Index
            }
        }
        "POST" => {
            if uri.contains("search") {
                Action::Search
            } else if uri.contains("batch") {
                Action::Batch
            } else {
                Action::Store
            }
        }
        "PUT" | "PATCH" => {
            if uri.contains("batch") {
                Action::Batch
            } else {
                Action::Update
            }
        }
        "DELETE" => {
            if uri.contains("batch") {
                Action::Batch
            } else {
                Action::Destroy
            }
        }
        _ => Action::Unknown,
    }
}
