//! # scorecard-renderer
//!
//! Tera-based renderer that turns the results of a scorecard run into an
//! HTML page.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use scorecard_core::{CheckReport, CheckResult};
//! use scorecard_renderer::{PageContext, PageRenderer};
//!
//! fn page() -> Result<String, scorecard_renderer::RenderError> {
//!     let renderer = PageRenderer::new(None)?;
//!     let mut ctx = PageContext::new("github.com/ossf/scorecard");
//!     ctx.record(&CheckResult::from_report("Security-Policy", CheckReport::pass(), 12));
//!     renderer.render(&ctx)
//! }
//! ```

pub mod context;
pub mod engine;
pub mod error;

pub use context::{PageContext, ResultRow, SummaryCtx};
pub use engine::{PageRenderer, RESULTS_TEMPLATE};
pub use error::RenderError;
