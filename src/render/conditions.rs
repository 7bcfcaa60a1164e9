//! Three-layer condition resolution
//!
//! The conditions a provider is invoked with come from three layers merged
//! left-wins:
//!
//! 1. **important** — page URL variables over the definition's locked
//!    `conditions`. Authors and routing always win.
//! 2. **user** — request-supplied values, sanitized against an allow-list
//!    before they participate.
//! 3. **default** — the definition's `default_conditions` over the base
//!    `{page: 0, limit: ...}` pair, where the limit is `1` for single-record
//!    views and otherwise comes from the site meta
//!    `"<flat module id>.limits.<type>"` when one is set.
//!
//! [`ConditionResolver::filter_conditions`] derives the display-only "with"
//! set from an effective mapping: everything the important layer forced or
//! the defaults already implied is dropped, leaving only what the request
//! actually narrowed.

use serde_json::{json, Value};
use tracing::debug;

use crate::modules::flat_id;
use crate::options::{Conditions, Renders};
use crate::registry::ViewDefinition;

use super::context::{Page, SiteRegistry};

/// Condition key for the zero-based page.
pub const CONDITION_PAGE: &str = "page";
/// Condition key for the fetch limit.
pub const CONDITION_LIMIT: &str = "limit";

/// Resolves the condition layers for one view definition.
#[derive(Clone, Copy)]
pub struct ConditionResolver<'a> {
    definition: &'a ViewDefinition,
    site: &'a dyn SiteRegistry,
}

impl<'a> ConditionResolver<'a> {
    /// Create a resolver for a definition.
    #[must_use]
    pub fn new(definition: &'a ViewDefinition, site: &'a dyn SiteRegistry) -> Self {
        Self { definition, site }
    }

    /// The default layer: definition `default_conditions` over the base
    /// `page`/`limit` pair.
    #[must_use]
    pub fn defaults(&self) -> Conditions {
        let mut defaults = Conditions::new();
        defaults.insert(CONDITION_PAGE.to_string(), json!(0));

        if self.definition.renders == Renders::One {
            defaults.insert(CONDITION_LIMIT.to_string(), json!(1));
        } else {
            let key = format!(
                "{}.limits.{}",
                flat_id(&self.definition.module),
                self.definition.type_
            );
            if let Some(limit) = self.site.meta(&key) {
                defaults.insert(CONDITION_LIMIT.to_string(), limit);
            }
        }

        for (key, value) in &self.definition.default_conditions {
            defaults.insert(key.clone(), value.clone());
        }

        defaults
    }

    /// The important layer: page URL variables over the definition's locked
    /// conditions.
    #[must_use]
    pub fn important(&self, page: &dyn Page) -> Conditions {
        let mut important = self.definition.conditions.clone();
        for (key, value) in page.url_variables() {
            important.insert(key, value);
        }
        important
    }

    /// Sanitize request-supplied conditions against the definition's
    /// allow-list: the keys of `default_conditions` plus `page` and
    /// `limit`. Dropped keys are logged.
    #[must_use]
    pub fn sanitize_user(&self, user: &Conditions) -> Conditions {
        let mut sanitized = Conditions::new();
        for (key, value) in user {
            let allowed = key == CONDITION_PAGE
                || key == CONDITION_LIMIT
                || self.definition.default_conditions.contains_key(key);
            if allowed {
                sanitized.insert(key.clone(), value.clone());
            } else {
                debug!(
                    "Dropping unrecognized condition '{key}' for view '{}'",
                    self.definition.id
                );
            }
        }
        sanitized
    }

    /// The effective conditions: important over sanitized user over
    /// defaults.
    #[must_use]
    pub fn effective(&self, page: &dyn Page, user: &Conditions) -> Conditions {
        let mut effective = self.defaults();
        for (key, value) in self.sanitize_user(user) {
            effective.insert(key, value);
        }
        for (key, value) in self.important(page) {
            effective.insert(key, value);
        }
        effective
    }

    /// The display-only "with" set: `conditions` minus the important keys,
    /// minus entries equal to their default.
    #[must_use]
    pub fn filter_conditions(&self, conditions: &Conditions, page: &dyn Page) -> Conditions {
        let important = self.important(page);
        let defaults = self.defaults();

        conditions
            .iter()
            .filter(|&(key, value)| {
                !important.contains_key(key) && defaults.get(key) != Some(value)
            })
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect()
    }
}

/// Read the limit of an effective condition set as an unsigned count.
#[must_use]
pub fn limit_of(conditions: &Conditions) -> Option<u64> {
    conditions.get(CONDITION_LIMIT).and_then(Value::as_u64)
}

/// Read the zero-based page of an effective condition set.
#[must_use]
pub fn page_of(conditions: &Conditions) -> u64 {
    conditions.get(CONDITION_PAGE).and_then(Value::as_u64).unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::context::{MemorySiteRegistry, StaticPage};
    use serde_json::Map;

    fn definition(raw: Value) -> ViewDefinition {
        let raw: Map<String, Value> = raw.as_object().cloned().unwrap();
        let id = format!(
            "{}/{}",
            raw["module"].as_str().unwrap(),
            raw["type"].as_str().unwrap()
        );
        ViewDefinition::from_raw(&id, &raw).unwrap()
    }

    fn list_definition() -> ViewDefinition {
        definition(json!({
            "module": "articles",
            "type": "list",
            "title": "Articles",
            "renders": "many",
            "conditions": {"published": true},
            "default_conditions": {"order": "date", "limit": 5}
        }))
    }

    #[test]
    fn test_defaults_layer_base_then_definition() {
        let view = list_definition();
        let site = MemorySiteRegistry::new();
        let resolver = ConditionResolver::new(&view, &site);

        let defaults = resolver.defaults();
        assert_eq!(defaults.get("page"), Some(&json!(0)));
        // default_conditions wins over the absent site limit.
        assert_eq!(defaults.get("limit"), Some(&json!(5)));
        assert_eq!(defaults.get("order"), Some(&json!("date")));
    }

    #[test]
    fn test_one_view_defaults_limit_to_one() {
        let view = definition(json!({
            "module": "articles",
            "type": "view",
            "title": "Article",
            "renders": "one"
        }));
        let mut site = MemorySiteRegistry::new();
        site.set_meta("articles.limits.view", json!(20));
        let resolver = ConditionResolver::new(&view, &site);

        assert_eq!(resolver.defaults().get("limit"), Some(&json!(1)));
    }

    #[test]
    fn test_site_limit_override_for_many_views() {
        let view = definition(json!({
            "module": "contents.articles",
            "type": "list",
            "title": "Articles",
            "renders": "many"
        }));
        let mut site = MemorySiteRegistry::new();
        site.set_meta("contents_articles.limits.list", json!(10));
        let resolver = ConditionResolver::new(&view, &site);

        assert_eq!(resolver.defaults().get("limit"), Some(&json!(10)));
    }

    #[test]
    fn test_url_variables_win_over_locked_conditions() {
        let view = list_definition();
        let site = MemorySiteRegistry::new();
        let resolver = ConditionResolver::new(&view, &site);

        let mut url_variables = Conditions::new();
        url_variables.insert("published".to_string(), json!(false));
        url_variables.insert("category".to_string(), json!("news"));
        let page = StaticPage {
            url_variables,
            template: None,
        };

        let important = resolver.important(&page);
        assert_eq!(important.get("published"), Some(&json!(false)));
        assert_eq!(important.get("category"), Some(&json!("news")));
    }

    #[test]
    fn test_user_conditions_are_sanitized() {
        let view = list_definition();
        let site = MemorySiteRegistry::new();
        let resolver = ConditionResolver::new(&view, &site);

        let mut user = Conditions::new();
        user.insert("page".to_string(), json!(2));
        user.insert("order".to_string(), json!("title"));
        user.insert("published".to_string(), json!(false));
        user.insert("drop-table".to_string(), json!("now"));

        let sanitized = resolver.sanitize_user(&user);
        assert_eq!(sanitized.get("page"), Some(&json!(2)));
        assert_eq!(sanitized.get("order"), Some(&json!("title")));
        // Not in default_conditions and not page/limit.
        assert!(!sanitized.contains_key("published"));
        assert!(!sanitized.contains_key("drop-table"));
    }

    #[test]
    fn test_effective_precedence_important_user_default() {
        let view = list_definition();
        let site = MemorySiteRegistry::new();
        let resolver = ConditionResolver::new(&view, &site);

        let mut url_variables = Conditions::new();
        url_variables.insert("page".to_string(), json!(1));
        let page = StaticPage {
            url_variables,
            template: None,
        };

        let mut user = Conditions::new();
        user.insert("page".to_string(), json!(7));
        user.insert("limit".to_string(), json!(5));

        let effective = resolver.effective(&page, &user);
        // URL variable beats the user-supplied page.
        assert_eq!(effective.get("page"), Some(&json!(1)));
        assert_eq!(effective.get("limit"), Some(&json!(5)));
        assert_eq!(effective.get("published"), Some(&json!(true)));
        assert_eq!(effective.get("order"), Some(&json!("date")));
    }

    #[test]
    fn test_filter_conditions_drops_important_and_defaults() {
        let view = list_definition();
        let site = MemorySiteRegistry::new();
        let resolver = ConditionResolver::new(&view, &site);
        let page = StaticPage::default();

        let mut user = Conditions::new();
        user.insert("order".to_string(), json!("title"));
        let effective = resolver.effective(&page, &user);

        let with = resolver.filter_conditions(&effective, &page);
        // The locked condition and the unchanged defaults are not "with".
        assert!(!with.contains_key("published"));
        assert!(!with.contains_key("limit"));
        assert!(!with.contains_key("page"));
        assert_eq!(with.get("order"), Some(&json!("title")));
    }

    #[test]
    fn test_limit_and_page_accessors() {
        let mut conditions = Conditions::new();
        assert_eq!(limit_of(&conditions), None);
        assert_eq!(page_of(&conditions), 0);

        conditions.insert("limit".to_string(), json!(10));
        conditions.insert("page".to_string(), json!(3));
        assert_eq!(limit_of(&conditions), Some(10));
        assert_eq!(page_of(&conditions), 3);
    }
}
