//! Template rendering for server-side views and outgoing mail.
//!
//! Templates are embedded at compile time and registered under their path
//! relative to `templates/`. Names ending in `.html` are auto-escaped.

use minijinja::{Environment, Value};
use std::sync::OnceLock;
use thiserror::Error;

static TEMPLATE_ENV: OnceLock<Environment<'static>> = OnceLock::new();

const TEMPLATES: &[(&str, &str)] = &[
    (
        "service_advisor/dashboard.html",
        include_str!("../../../templates/service_advisor/dashboard.html"),
    ),
    (
        "service_advisor/login.html",
        include_str!("../../../templates/service_advisor/login.html"),
    ),
    (
        "email/bill_ready.txt",
        include_str!("../../../templates/email/bill_ready.txt"),
    ),
];

#[derive(Debug, Error)]
pub enum TemplateError {
    #[error("Template '{0}' not found")]
    NotFound(String),

    #[error("Failed to render template: {0}")]
    RenderError(String),
}

fn init_environment() -> Environment<'static> {
    let mut env = Environment::new();

    for (name, source) in TEMPLATES {
        if let Err(e) = env.add_template(name, source) {
            tracing::warn!("Failed to load template {}: {}", name, e);
        }
    }

    env
}

fn get_environment() -> &'static Environment<'static> {
    TEMPLATE_ENV.get_or_init(init_environment)
}

/// Render a registered template.
///
/// # Example
/// ```ignore
/// let html = render_template("service_advisor/login.html", minijinja::context! { error => None::<String> })?;
/// ```
pub fn render_template(template_name: &str, ctx: Value) -> Result<String, TemplateError> {
    let template = get_environment()
        .get_template(template_name)
        .map_err(|_| TemplateError::NotFound(template_name.to_string()))?;

    template
        .render(ctx)
        .map_err(|e| TemplateError::RenderError(e.to_string()))
}
