use crate::config::MadangConfig;
use crate::db::Db;
use serde::Serialize;
use std::sync::Arc;

pub type MadangState = Arc<MSInner>;

/// Stuff for the stuff gods!!! Built once in main (or per-test), then handed
/// to every route as shared state.
pub struct MSInner {
    pub db: Db,
    pub config: MadangConfig,
    pub templates: minijinja::Environment<'static>,
}

impl MSInner {
    /// Render a named template with the provided context.
    pub fn render_view<S: Serialize>(&self, name: &str, ctx: S) -> Result<String, minijinja::Error> {
        self.templates.get_template(name)?.render(ctx)
    }
}
