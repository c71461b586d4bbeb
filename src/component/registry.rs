// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 pipedef contributors

//! Component registry
//!
//! Indexes declared components by name so that definition files can refer
//! to them from tasks.

use std::collections::BTreeMap;
use std::sync::Arc;

use super::{Component, ComponentConfig, DEFAULT_BASE_IMAGE};
use crate::errors::{PipedefError, PipedefResult};

/// Registry of declared components
#[derive(Debug, Clone)]
pub struct ComponentRegistry {
    components: BTreeMap<String, Arc<Component>>,
    default_base_image: String,
}

impl ComponentRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self {
            components: BTreeMap::new(),
            default_base_image: DEFAULT_BASE_IMAGE.to_string(),
        }
    }

    /// Use a different image for components that do not name one
    pub fn with_default_base_image(mut self, image: impl Into<String>) -> Self {
        self.default_base_image = image.into();
        self
    }

    /// Image given to components that do not name one
    pub fn default_base_image(&self) -> &str {
        &self.default_base_image
    }

    /// Declare a component and index it
    pub fn register(&mut self, mut config: ComponentConfig) -> PipedefResult<Arc<Component>> {
        if self.components.contains_key(&config.name) {
            return Err(PipedefError::DuplicateComponent {
                component: config.name,
            });
        }

        if config.base_image.is_none() {
            config.base_image = Some(self.default_base_image.clone());
        }

        let component = Component::declare(config)?;
        self.components
            .insert(component.name().to_string(), Arc::clone(&component));
        Ok(component)
    }

    /// Get a component by name
    pub fn get(&self, name: &str) -> PipedefResult<Arc<Component>> {
        self.components
            .get(name)
            .cloned()
            .ok_or_else(|| PipedefError::UnknownComponent {
                component: name.to_string(),
            })
    }

    /// Registered component names, sorted
    pub fn names(&self) -> Vec<&str> {
        self.components.keys().map(String::as_str).collect()
    }

    pub fn len(&self) -> usize {
        self.components.len()
    }

    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }
}

impl Default for ComponentRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ParamType;

    #[test]
    fn test_register_and_get() {
        let mut registry = ComponentRegistry::new();
        registry
            .register(ComponentConfig::new("say_hello").input("name", ParamType::String))
            .unwrap();

        assert_eq!(registry.len(), 1);
        assert_eq!(registry.get("say_hello").unwrap().name(), "say_hello");
        assert!(matches!(
            registry.get("missing"),
            Err(PipedefError::UnknownComponent { .. })
        ));
    }

    #[test]
    fn test_duplicate_registration() {
        let mut registry = ComponentRegistry::new();
        registry.register(ComponentConfig::new("a")).unwrap();
        let result = registry.register(ComponentConfig::new("a"));
        assert!(matches!(result, Err(PipedefError::DuplicateComponent { .. })));
    }

    #[test]
    fn test_default_base_image_applies() {
        let mut registry = ComponentRegistry::new().with_default_base_image("python:3.11-slim");
        let plain = registry.register(ComponentConfig::new("plain")).unwrap();
        let pinned = registry
            .register(ComponentConfig::new("pinned").base_image("python:3.8-slim"))
            .unwrap();

        assert_eq!(plain.environment().base_image, "python:3.11-slim");
        assert_eq!(pinned.environment().base_image, "python:3.8-slim");
    }
}
