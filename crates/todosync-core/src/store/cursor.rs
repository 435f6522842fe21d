// ── Sync cursors ──
//
// One opaque token per resource type. A request scoped to a subset of
// types may only move the tokens of that subset.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use strum::IntoEnumIterator;
use todosync_api::WILDCARD_SYNC_TOKEN;

use crate::model::ResourceType;

/// Resource-type scope of one sync request.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SyncScope {
    /// Every resource type (`resource_types=["all"]`).
    #[default]
    All,
    /// Only the listed types.
    Only(Vec<ResourceType>),
}

impl SyncScope {
    pub fn only(types: impl IntoIterator<Item = ResourceType>) -> Self {
        Self::Only(types.into_iter().collect())
    }

    pub fn contains(&self, resource: ResourceType) -> bool {
        match self {
            Self::All => true,
            Self::Only(types) => types.contains(&resource),
        }
    }

    /// Every type covered by this scope.
    pub fn types(&self) -> Vec<ResourceType> {
        match self {
            Self::All => ResourceType::iter().collect(),
            Self::Only(types) => types.clone(),
        }
    }

    /// Value of the `resource_types` request field.
    pub fn to_param(&self) -> Vec<String> {
        match self {
            Self::All => vec!["all".into()],
            Self::Only(types) => types.iter().map(|t| t.name().to_owned()).collect(),
        }
    }
}

/// Per-resource-type sync tokens.
///
/// A type that has never been synced reads as the wildcard `*`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SyncCursors {
    tokens: BTreeMap<ResourceType, String>,
}

impl SyncCursors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, resource: ResourceType) -> &str {
        self.tokens
            .get(&resource)
            .map_or(WILDCARD_SYNC_TOKEN, String::as_str)
    }

    /// Token to send for `scope`.
    ///
    /// When every in-scope type shares one token that token is sent;
    /// otherwise the scope is re-fetched from the wildcard.
    pub fn token_for(&self, scope: &SyncScope) -> String {
        let mut tokens = scope.types().into_iter().map(|t| self.get(t));
        let Some(first) = tokens.next() else {
            return WILDCARD_SYNC_TOKEN.to_owned();
        };
        if tokens.all(|t| t == first) {
            first.to_owned()
        } else {
            WILDCARD_SYNC_TOKEN.to_owned()
        }
    }

    /// Store `token` for every type in `scope` and nothing else.
    pub fn advance(&mut self, scope: &SyncScope, token: &str) {
        for resource in scope.types() {
            self.tokens.insert(resource, token.to_owned());
        }
    }

    /// The token shared by all types, if they agree.
    pub fn global(&self) -> Option<&str> {
        let mut tokens = ResourceType::iter().map(|t| self.get(t));
        let first = tokens.next()?;
        tokens.all(|t| t == first).then_some(first)
    }

    pub fn reset(&mut self) {
        self.tokens.clear();
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn fresh_cursors_are_wildcard() {
        let c = SyncCursors::new();
        assert_eq!(c.token_for(&SyncScope::All), "*");
        assert_eq!(c.global(), Some("*"));
    }

    #[test]
    fn partial_scope_leaves_other_types_alone() {
        let mut c = SyncCursors::new();
        c.advance(&SyncScope::All, "t1");
        c.advance(&SyncScope::only([ResourceType::Labels]), "t2");

        assert_eq!(c.get(ResourceType::Labels), "t2");
        assert_eq!(c.get(ResourceType::Items), "t1");
        assert_eq!(c.global(), None);
    }

    #[test]
    fn mixed_tokens_fall_back_to_wildcard() {
        let mut c = SyncCursors::new();
        c.advance(&SyncScope::All, "t1");
        c.advance(&SyncScope::only([ResourceType::Labels]), "t2");

        assert_eq!(c.token_for(&SyncScope::only([ResourceType::Labels])), "t2");
        assert_eq!(c.token_for(&SyncScope::only([ResourceType::Items])), "t1");
        assert_eq!(c.token_for(&SyncScope::All), "*");
    }

    #[test]
    fn scope_param_encoding() {
        assert_eq!(SyncScope::All.to_param(), vec!["all"]);
        assert_eq!(
            SyncScope::only([ResourceType::Items, ResourceType::ProjectNotes]).to_param(),
            vec!["items", "project_notes"]
        );
    }

    #[test]
    fn cursors_round_trip_through_json() {
        let mut c = SyncCursors::new();
        c.advance(&SyncScope::only([ResourceType::Items]), "abc");
        let json = serde_json::to_string(&c).unwrap();
        assert!(json.contains("\"items\":\"abc\""));
        let back: SyncCursors = serde_json::from_str(&json).unwrap();
        assert_eq!(back, c);
    }
}
