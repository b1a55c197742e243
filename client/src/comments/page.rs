use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use crate::config::ClientConfig;
use crate::error::{ClientError, Result};

/// The parts of a document the comment client reads and writes.
pub trait Page: Send + Sync {
    /// Replace the contents of the element matching `selector`.
    fn set_inner_html(&self, selector: &str, html: &str) -> Result<()>;

    /// Current value of the `field` element inside the form matching `form`.
    fn field_value(&self, form: &str, field: &str) -> Result<String>;
}

/// In-memory page keyed by selector.
///
/// Containers and form fields must be declared before use, mirroring a
/// document where querying an absent element fails.
#[derive(Debug, Default)]
pub struct MemoryPage {
    containers: Mutex<HashMap<String, String>>,
    fields: Mutex<HashMap<(String, String), String>>,
}

impl MemoryPage {
    pub fn new() -> Self {
        Self::default()
    }

    /// A page with the form field and container the client is configured for.
    pub fn for_config(config: &ClientConfig) -> Self {
        Self::new()
            .with_container(&config.container_selector)
            .with_field(&config.form_selector, &config.input_selector, "")
    }

    pub fn with_container(self, selector: impl Into<String>) -> Self {
        self.containers().insert(selector.into(), String::new());
        self
    }

    pub fn with_field(
        self,
        form: impl Into<String>,
        field: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        self.fields()
            .insert((form.into(), field.into()), value.into());
        self
    }

    /// Type `value` into an existing form field.
    pub fn set_field(&self, form: &str, field: &str, value: impl Into<String>) -> Result<()> {
        let mut fields = self.fields();
        let slot = fields
            .get_mut(&(form.to_string(), field.to_string()))
            .ok_or_else(|| ClientError::MissingElement(format!("{} {}", form, field)))?;
        *slot = value.into();
        Ok(())
    }

    pub fn inner_html(&self, selector: &str) -> Option<String> {
        self.containers().get(selector).cloned()
    }

    fn containers(&self) -> MutexGuard<'_, HashMap<String, String>> {
        self.containers.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn fields(&self) -> MutexGuard<'_, HashMap<(String, String), String>> {
        self.fields.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl Page for MemoryPage {
    fn set_inner_html(&self, selector: &str, html: &str) -> Result<()> {
        let mut containers = self.containers();
        let slot = containers
            .get_mut(selector)
            .ok_or_else(|| ClientError::MissingElement(selector.to_string()))?;
        *slot = html.to_string();
        Ok(())
    }

    fn field_value(&self, form: &str, field: &str) -> Result<String> {
        self.fields()
            .get(&(form.to_string(), field.to_string()))
            .cloned()
            .ok_or_else(|| ClientError::MissingElement(format!("{} {}", form, field)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_elements() {
        let page = MemoryPage::new();
        assert!(matches!(
            page.set_inner_html("#comments", "x"),
            Err(ClientError::MissingElement(s)) if s == "#comments"
        ));
        assert!(matches!(
            page.field_value("#new-comment", "textarea"),
            Err(ClientError::MissingElement(s)) if s == "#new-comment textarea"
        ));
        assert!(page.set_field("#new-comment", "textarea", "x").is_err());
    }

    #[test]
    fn test_for_config_layout() {
        let page = MemoryPage::for_config(&ClientConfig::default());
        assert_eq!(page.inner_html("#comments").as_deref(), Some(""));
        page.set_field("#new-comment", "textarea", "typed").unwrap();
        assert_eq!(page.field_value("#new-comment", "textarea").unwrap(), "typed");

        page.set_inner_html("#comments", "<li>a</li>").unwrap();
        assert_eq!(page.inner_html("#comments").as_deref(), Some("<li>a</li>"));
    }
}
