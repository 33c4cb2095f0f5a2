//! Render engine
//!
//! An [`Engine`] owns the template registry and the cache store. Renders
//! borrow it immutably, so one engine can serve concurrent renders once its
//! templates are registered.

use std::path::Path;

use crate::cache::CacheStore;
use crate::config::{EngineConfig, Options, DEFAULT_MAX_DEPTH};
use crate::diagnostics::Diagnostic;
use crate::renderer::{self, Settings};
use crate::template::{TemplateError, TemplateRegistry};
use crate::value::Props;
use crate::RenderError;

#[derive(Debug)]
pub struct Engine {
    auto_escape: bool,
    max_depth: usize,
    global_props: Props,
    templates: TemplateRegistry,
    cache: CacheStore,
}

impl Default for Engine {
    fn default() -> Self {
        Self {
            auto_escape: true,
            max_depth: DEFAULT_MAX_DEPTH,
            global_props: Props::new(),
            templates: TemplateRegistry::new(),
            cache: CacheStore::new(),
        }
    }
}

impl Engine {
    /// Create an engine with default options and no templates
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an engine and apply `options`
    pub fn with_options(options: Options) -> Result<Self, TemplateError> {
        let mut engine = Self::new();
        engine.set_options(options)?;
        Ok(engine)
    }

    /// Create an engine from a loaded engine file
    pub fn from_config(config: EngineConfig) -> Result<Self, RenderError> {
        let options = config.into_options()?;
        Ok(Self::with_options(options)?)
    }

    /// Apply options; unset fields keep their current value
    ///
    /// Template names are all checked before any is registered, so an
    /// invalid name leaves the registry untouched.
    pub fn set_options(&mut self, options: Options) -> Result<(), TemplateError> {
        if let Some((name, _)) = options
            .templates
            .iter()
            .find(|(name, _)| !TemplateRegistry::is_valid_name(name))
        {
            return Err(TemplateError::InvalidName { name: name.clone() });
        }

        if let Some(auto_escape) = options.auto_escape {
            self.auto_escape = auto_escape;
        }
        if let Some(max_depth) = options.max_depth {
            self.max_depth = max_depth;
        }
        if let Some(global_props) = options.global_props {
            self.global_props = global_props;
        }
        for (name, markup) in &options.templates {
            self.templates.register(name, markup)?;
        }
        Ok(())
    }

    /// Register a template under a custom element name
    pub fn set_template(&mut self, name: &str, markup: &str) -> Result<(), TemplateError> {
        self.templates.register(name, markup)
    }

    pub fn has_template(&self, name: &str) -> bool {
        self.templates.contains(name)
    }

    /// Register every `*.html` file in `dir`, named by file stem
    pub fn load_templates_dir(&mut self, dir: &Path) -> Result<usize, TemplateError> {
        self.templates.load_dir(dir)
    }

    pub fn templates(&self) -> &TemplateRegistry {
        &self.templates
    }

    pub fn auto_escape(&self) -> bool {
        self.auto_escape
    }

    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    pub fn global_props(&self) -> &Props {
        &self.global_props
    }

    /// Stored HTML of a cache span
    pub fn cached(&self, name: &str) -> Option<String> {
        self.cache.get(name)
    }

    pub fn clear_cache(&self) {
        self.cache.clear();
    }

    /// Render markup to HTML
    pub fn render(&self, markup: &str, props: &Props) -> Result<String, RenderError> {
        self.render_with_diagnostics(markup, props)
            .map(|(html, _)| html)
    }

    /// Render markup and return the diagnostics collected on the way
    pub fn render_with_diagnostics(
        &self,
        markup: &str,
        props: &Props,
    ) -> Result<(String, Vec<Diagnostic>), RenderError> {
        let settings = Settings {
            templates: &self.templates,
            cache: &self.cache,
            auto_escape: self.auto_escape,
            max_depth: self.max_depth,
        };
        let output = renderer::render(markup, props, &self.global_props, settings)?;
        tracing::debug!(
            bytes = output.html.len(),
            diagnostics = output.diagnostics.len(),
            "rendered"
        );
        Ok((output.html, output.diagnostics))
    }

    /// Apply `options`, then render
    pub fn render_with_options(
        &mut self,
        markup: &str,
        props: &Props,
        options: Options,
    ) -> Result<String, RenderError> {
        self.set_options(options)?;
        self.render(markup, props)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Value;

    #[test]
    fn test_set_options_is_all_or_nothing() {
        let mut engine = Engine::new();
        let options = Options::new()
            .with_auto_escape(false)
            .with_template("my-card", "<div/>")
            .with_template("card", "<div/>");
        let result = engine.set_options(options);
        assert!(matches!(result, Err(TemplateError::InvalidName { ref name }) if name == "card"));
        assert!(!engine.has_template("my-card"));
        assert!(engine.auto_escape());
    }

    #[test]
    fn test_render_with_options_updates_engine() {
        let mut engine = Engine::new();
        let mut globals = Props::new();
        globals.insert("site".into(), Value::from("<Example>"));
        let options = Options::new()
            .with_auto_escape(false)
            .with_global_props(globals);
        let html = engine
            .render_with_options("{{ site }}", &Props::new(), options)
            .expect("Should render");
        assert_eq!(html, "<Example>");
        assert!(!engine.auto_escape());
    }

    #[test]
    fn test_engine_is_shareable() {
        fn assert_sync<T: Send + Sync>() {}
        assert_sync::<Engine>();
    }
}
