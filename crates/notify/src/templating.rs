//! Minijinja rendering of the alarm message templates.
//!
//! The templates are fixed; alarm rules carry free-text reminders but those
//! are never rendered. Values that the UI should emphasise go through the
//! `label` filter, which wraps them in `<label>` markup. The markup is
//! removed with [`strip_labels`] before a message leaves the system.

use serde::Serialize;

use crate::traits::NotifyError;

const LABEL_OPEN: &str = "<label>";
const LABEL_CLOSE: &str = "</label>";

const BEFOREHAND_TEMPLATE: &str = "Data quality work order {{ name | label }} \
({{ code | label }}) has {{ days | label }} days remaining before its deadline.";

const DEADLINE_PASSED_TEMPLATE: &str = "Data quality work order {{ name | label }} \
({{ code | label }}) has passed its deadline\
{% if overdue_days > 0 %} and is {{ overdue_days | label }} days overdue{% endif %}.";

/// Which fixed template to render.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageKind {
    Beforehand,
    DeadlinePassed,
}

impl MessageKind {
    fn template(&self) -> &'static str {
        match self {
            MessageKind::Beforehand => BEFOREHAND_TEMPLATE,
            MessageKind::DeadlinePassed => DEADLINE_PASSED_TEMPLATE,
        }
    }
}

/// Work-order data exposed to the templates.
#[derive(Debug, Clone, Serialize)]
pub struct RenderContext {
    pub name: String,
    pub code: String,
    /// Days until the deadline, rounded up; zero or negative once passed.
    pub days: i64,
}

#[derive(Serialize)]
struct TemplateValues<'a> {
    name: &'a str,
    code: &'a str,
    days: i64,
    overdue_days: i64,
}

/// Renders alarm messages using minijinja.
///
/// A fresh [`minijinja::Environment`] is created per render call.
#[derive(Debug, Default)]
pub struct MessageRenderer {
    _private: (),
}

impl MessageRenderer {
    pub fn new() -> Self {
        Self { _private: () }
    }

    fn build_env() -> minijinja::Environment<'static> {
        let mut env = minijinja::Environment::new();
        env.add_filter("label", label_filter);
        env
    }

    /// Render the message for `kind`, with label markup.
    ///
    /// # Errors
    ///
    /// Returns [`NotifyError::Template`] if rendering fails.
    pub fn render(&self, kind: MessageKind, ctx: &RenderContext) -> Result<String, NotifyError> {
        let env = Self::build_env();
        let values = TemplateValues {
            name: &ctx.name,
            code: &ctx.code,
            days: ctx.days,
            overdue_days: (-ctx.days).max(0),
        };
        env.render_str(kind.template(), values)
            .map_err(|e| NotifyError::Template(e.to_string()))
    }
}

/// Filter: wrap a value in label markup.
fn label_filter(value: minijinja::Value) -> String {
    format!("{LABEL_OPEN}{value}{LABEL_CLOSE}")
}

/// Remove label markup, leaving the plain text sent to external channels.
pub fn strip_labels(message: &str) -> String {
    message.replace(LABEL_OPEN, "").replace(LABEL_CLOSE, "")
}
