//! Rendering of the Python source stubs that accompany script reports.
//!
//! The embedded report script is opaque text: it is inserted as-is, never parsed or escaped.

use color_eyre::Result;
use color_eyre::eyre::WrapErr;
use handlebars::Handlebars;
use serde::Serialize;

const SCRIPT_STUB: &str = r#"# {{copyright}}
# License: {{license}}

import frappe

def execute(filters=None):
    """
    {{name}}
    """
    {{script}}

    # Ensure we return the right format
    return columns, data
"#;

const PLACEHOLDER_STUB: &str = r#"# {{copyright}}
# License: {{license}}

import frappe

def execute(filters=None):
    """
    {{name}}

    TODO: Add your report logic here
    This is a placeholder - copy your script from the JSON file's report_script field
    """
    columns = []
    data = []

    return columns, data
"#;

#[derive(Serialize)]
struct StubContext<'a> {
    name: &'a str,
    copyright: &'a str,
    license: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    script: Option<&'a str>,
}

/// Header values shared by every stub of a run.
#[derive(Debug, Clone)]
pub(crate) struct StubHeader {
    pub(crate) copyright: String,
    pub(crate) license: String,
}

pub(crate) struct StubRenderer {
    hb: Handlebars<'static>,
    header: StubHeader,
}

impl StubRenderer {
    pub(crate) fn new(header: StubHeader) -> Result<Self> {
        let mut hb: Handlebars<'static> = Handlebars::new();
        hb.set_strict_mode(true);
        hb.register_escape_fn(handlebars::no_escape);
        hb.register_template_string("script", SCRIPT_STUB)
            .wrap_err("Failed to register script stub template")?;
        hb.register_template_string("placeholder", PLACEHOLDER_STUB)
            .wrap_err("Failed to register placeholder stub template")?;

        Ok(Self { hb, header })
    }

    /// Renders the stub for the report `name`.
    ///
    /// With a `script`, its text becomes the body of `execute`; otherwise the stub returns empty
    /// `columns` and `data`.
    pub(crate) fn render(&self, name: &str, script: Option<&str>) -> Result<String> {
        let context = StubContext {
            name,
            copyright: &self.header.copyright,
            license: &self.header.license,
            script,
        };
        let template = if script.is_some() {
            "script"
        } else {
            "placeholder"
        };

        self.hb
            .render(template, &context)
            .wrap_err_with(|| format!("Failed to render stub for {}", name))
    }
}

// -------------------------------------------------------------------------------------------------
// Tests
// -------------------------------------------------------------------------------------------------
