//! Plugin registry.

use core::fmt;

use crate::builtin::{AnyImageConverter, AnyImageImporter};
use crate::traits::{ImageConverter, ImageImporter, Plugin};

/// Plugins of one kind, looked up by name.
///
/// An empty manager is valid; comparisons that need a missing plugin fail
/// with a message instead of panicking.
///
/// ```
/// use zencompare::{ImageImporter, PluginManager};
///
/// let empty = PluginManager::<dyn ImageImporter>::new();
/// assert!(empty.load("AnyImageImporter").is_none());
///
/// let defaults = PluginManager::<dyn ImageImporter>::with_defaults();
/// assert!(defaults.load("AnyImageImporter").is_some());
/// ```
pub struct PluginManager<T: ?Sized> {
    plugins: Vec<Box<T>>,
}

impl<T: ?Sized + Plugin> PluginManager<T> {
    /// Manager without any plugins.
    pub fn new() -> Self {
        Self {
            plugins: Vec::new(),
        }
    }

    /// Add a plugin, replacing any plugin of the same name.
    pub fn register(&mut self, plugin: Box<T>) -> &mut Self {
        self.plugins.retain(|existing| existing.name() != plugin.name());
        self.plugins.push(plugin);
        self
    }

    /// Builder form of [`register`](Self::register).
    pub fn with(mut self, plugin: Box<T>) -> Self {
        self.register(plugin);
        self
    }

    /// Plugin with the given name.
    pub fn load(&self, name: &str) -> Option<&T> {
        self.plugins
            .iter()
            .find(|plugin| plugin.name() == name)
            .map(|plugin| &**plugin)
    }

    /// Names of all registered plugins.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.plugins.iter().map(|plugin| plugin.name())
    }
}

impl<T: ?Sized + Plugin> Default for PluginManager<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl PluginManager<dyn ImageImporter> {
    /// Manager with the built-in [`AnyImageImporter`].
    pub fn with_defaults() -> Self {
        Self::new().with(Box::new(AnyImageImporter))
    }
}

impl PluginManager<dyn ImageConverter> {
    /// Manager with the built-in [`AnyImageConverter`].
    pub fn with_defaults() -> Self {
        Self::new().with(Box::new(AnyImageConverter))
    }
}

impl<T: ?Sized + Plugin> fmt::Debug for PluginManager<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.names()).finish()
    }
}
