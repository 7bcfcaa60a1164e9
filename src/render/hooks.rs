//! Render pipeline extension points
//!
//! Hosts customize a render by installing hooks. Every hook is
//! value-in/value-out: it receives the current value, returns the value to
//! continue with, and never mutates shared state through the pipeline. An
//! uninstalled hook is the identity.

use serde_json::Value;

use crate::options::Conditions;
use crate::registry::ViewDefinition;

use super::element::Element;

type ConditionsHook = Box<dyn Fn(Conditions, &ViewDefinition) -> Conditions + Send + Sync>;
type RecordsHook = Box<dyn Fn(Vec<Value>, &ViewDefinition) -> Vec<Value> + Send + Sync>;
type ElementHook = Box<dyn Fn(Element, &ViewDefinition) -> Element + Send + Sync>;
type HtmlHook = Box<dyn Fn(String, &ViewDefinition) -> String + Send + Sync>;

/// The hook set a render runs with. [`ViewHooks::default`] installs nothing.
#[derive(Default)]
pub struct ViewHooks {
    alter_conditions: Option<ConditionsHook>,
    before_alter_records: Option<RecordsHook>,
    alter_records: Option<RecordsHook>,
    after_alter_records: Option<RecordsHook>,
    alter_element: Option<ElementHook>,
    rescue: Option<HtmlHook>,
    render_completed: Option<HtmlHook>,
}

impl ViewHooks {
    /// Create an empty hook set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Install the condition-mutation hook, applied to the effective
    /// conditions before the provider is resolved.
    #[must_use]
    pub fn on_alter_conditions<F>(mut self, hook: F) -> Self
    where
        F: Fn(Conditions, &ViewDefinition) -> Conditions + Send + Sync + 'static,
    {
        self.alter_conditions = Some(Box::new(hook));
        self
    }

    /// Install the hook applied to fetched records before alteration.
    #[must_use]
    pub fn on_before_alter_records<F>(mut self, hook: F) -> Self
    where
        F: Fn(Vec<Value>, &ViewDefinition) -> Vec<Value> + Send + Sync + 'static,
    {
        self.before_alter_records = Some(Box::new(hook));
        self
    }

    /// Install the record alteration hook.
    #[must_use]
    pub fn on_alter_records<F>(mut self, hook: F) -> Self
    where
        F: Fn(Vec<Value>, &ViewDefinition) -> Vec<Value> + Send + Sync + 'static,
    {
        self.alter_records = Some(Box::new(hook));
        self
    }

    /// Install the hook applied to fetched records after alteration.
    #[must_use]
    pub fn on_after_alter_records<F>(mut self, hook: F) -> Self
    where
        F: Fn(Vec<Value>, &ViewDefinition) -> Vec<Value> + Send + Sync + 'static,
    {
        self.after_alter_records = Some(Box::new(hook));
        self
    }

    /// Install the hook applied to the container element before it renders.
    #[must_use]
    pub fn on_alter_element<F>(mut self, hook: F) -> Self
    where
        F: Fn(Element, &ViewDefinition) -> Element + Send + Sync + 'static,
    {
        self.alter_element = Some(Box::new(hook));
        self
    }

    /// Install the hook that may replace the empty-result placeholder.
    #[must_use]
    pub fn on_rescue<F>(mut self, hook: F) -> Self
    where
        F: Fn(String, &ViewDefinition) -> String + Send + Sync + 'static,
    {
        self.rescue = Some(Box::new(hook));
        self
    }

    /// Install the hook that receives the final HTML and may substitute it.
    #[must_use]
    pub fn on_render_completed<F>(mut self, hook: F) -> Self
    where
        F: Fn(String, &ViewDefinition) -> String + Send + Sync + 'static,
    {
        self.render_completed = Some(Box::new(hook));
        self
    }

    /// Run the condition-mutation hook.
    #[must_use]
    pub fn apply_alter_conditions(
        &self,
        conditions: Conditions,
        view: &ViewDefinition,
    ) -> Conditions {
        match &self.alter_conditions {
            Some(hook) => hook(conditions, view),
            None => conditions,
        }
    }

    /// Run the three record hooks in sequence: before, alter, after.
    #[must_use]
    pub fn apply_record_hooks(&self, records: Vec<Value>, view: &ViewDefinition) -> Vec<Value> {
        let mut records = records;
        for hook in [&self.before_alter_records, &self.alter_records, &self.after_alter_records] {
            if let Some(hook) = hook {
                records = hook(records, view);
            }
        }
        records
    }

    /// Run the element alteration hook.
    #[must_use]
    pub fn apply_alter_element(&self, element: Element, view: &ViewDefinition) -> Element {
        match &self.alter_element {
            Some(hook) => hook(element, view),
            None => element,
        }
    }

    /// Run the rescue hook over an empty-result placeholder.
    #[must_use]
    pub fn apply_rescue(&self, placeholder: String, view: &ViewDefinition) -> String {
        match &self.rescue {
            Some(hook) => hook(placeholder, view),
            None => placeholder,
        }
    }

    /// Run the render-completed hook over the final HTML.
    #[must_use]
    pub fn apply_render_completed(&self, html: String, view: &ViewDefinition) -> String {
        match &self.render_completed {
            Some(hook) => hook(html, view),
            None => html,
        }
    }
}

impl std::fmt::Debug for ViewHooks {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ViewHooks")
            .field("alter_conditions", &self.alter_conditions.is_some())
            .field("before_alter_records", &self.before_alter_records.is_some())
            .field("alter_records", &self.alter_records.is_some())
            .field("after_alter_records", &self.after_alter_records.is_some())
            .field("alter_element", &self.alter_element.is_some())
            .field("rescue", &self.rescue.is_some())
            .field("render_completed", &self.render_completed.is_some())
            .finish()
    }
}
