use tera::Tera;

/// Tera-backed template engine for building structured prompts.
pub struct PromptEngine {
    tera: Tera,
}

impl PromptEngine {
    /// Create with inline templates (no filesystem).
    pub fn new() -> anyhow::Result<Self> {
        let tera = Tera::default();
        Ok(Self { tera })
    }

    /// Register a template from a string.
    pub fn add_template(&mut self, name: &str, content: &str) -> anyhow::Result<()> {
        self.tera.add_raw_template(name, content)?;
        Ok(())
    }

    /// Render a named template with the given context.
    pub fn render(&self, template_name: &str, context: &tera::Context) -> anyhow::Result<String> {
        let rendered = self.tera.render(template_name, context)?;
        Ok(rendered)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tera::Context;

    #[test]
    fn add_template_and_render() {
        let mut engine = PromptEngine::new().unwrap();
        engine
            .add_template("greeting", "Hello, {{ name }}!")
            .unwrap();

        let mut ctx = Context::new();
        ctx.insert("name", "World");
        assert_eq!(engine.render("greeting", &ctx).unwrap(), "Hello, World!");
    }

    #[test]
    fn render_unknown_template_fails() {
        let engine = PromptEngine::new().unwrap();
        assert!(engine.render("nonexistent", &Context::new()).is_err());
    }

    #[test]
    fn add_template_replaces_existing() {
        let mut engine = PromptEngine::new().unwrap();
        engine.add_template("t", "version 1").unwrap();
        engine.add_template("t", "version 2").unwrap();
        assert_eq!(engine.render("t", &Context::new()).unwrap(), "version 2");
    }
}
