//! Tera rendering engine for the results page.
//!
//! The page template is embedded in the binary. A user template directory may
//! replace it with its own `results.html.tera`; other files there are ignored.

use std::io::ErrorKind;
use std::path::Path;

use tera::Tera;

use crate::context::PageContext;
use crate::error::RenderError;

/// Name of the results page template, embedded and in a user directory.
pub const RESULTS_TEMPLATE: &str = "results.html.tera";

const DEFAULT_PAGE: &str = include_str!("templates/results.html.tera");

/// `Ok(None)` when `dir` has no page override.
fn load_page_override(dir: &Path) -> Result<Option<String>, RenderError> {
    let path = dir.join(RESULTS_TEMPLATE);
    match std::fs::read_to_string(&path) {
        Ok(contents) => Ok(Some(contents)),
        Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
        Err(source) => Err(RenderError::Io { path, source }),
    }
}

fn build_tera(user_template_dir: Option<&Path>) -> Result<Tera, RenderError> {
    let page = match user_template_dir {
        Some(dir) => load_page_override(dir)?,
        None => None,
    };

    let mut tera = Tera::default();
    // The template name keeps its `.tera` suffix, which the default list misses.
    tera.autoescape_on(vec![".html.tera"]);
    tera.set_escape_fn(escape_html);
    tera.add_raw_template(RESULTS_TEMPLATE, page.as_deref().unwrap_or(DEFAULT_PAGE))?;
    Ok(tera)
}

/// Like tera's built-in escaper but leaves `/` alone so repository paths read
/// naturally in the page source.
fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            _ => out.push(c),
        }
    }
    out
}

// ---------------------------------------------------------------------------
// PageRenderer
// ---------------------------------------------------------------------------

/// Renders [`PageContext`]s into HTML.
///
/// Build once and share; rendering takes `&self`.
pub struct PageRenderer {
    tera: Tera,
}

impl std::fmt::Debug for PageRenderer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PageRenderer")
            .field("templates", &self.tera.get_template_names().collect::<Vec<_>>())
            .finish()
    }
}

impl PageRenderer {
    /// Load the embedded page, or the override in `user_template_dir` when
    /// that directory holds one.
    pub fn new(user_template_dir: Option<&Path>) -> Result<Self, RenderError> {
        Ok(PageRenderer { tera: build_tera(user_template_dir)? })
    }

    /// Render the results page. Every interpolated value is HTML-escaped.
    pub fn render(&self, ctx: &PageContext) -> Result<String, RenderError> {
        let tera_ctx = ctx.to_tera_context()?;
        Ok(self.tera.render(RESULTS_TEMPLATE, &tera_ctx)?)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
