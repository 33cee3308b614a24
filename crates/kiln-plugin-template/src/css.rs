use parking_lot::RwLock;
use rustc_hash::FxHashMap;

/// Suffix appended to a template path to name its virtual stylesheet.
pub const CSS_SUFFIX: &str = ".generated.css";

/// Stylesheets extracted during compilation, keyed by virtual module id.
///
/// Owned by one plugin instance; rebuilds overwrite entries for recompiled
/// templates.
#[derive(Debug, Default)]
pub struct CssStore {
    modules: RwLock<FxHashMap<String, String>>,
}

impl CssStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Virtual module id for the stylesheet of `template_id`.
    pub fn id_for(template_id: &str) -> String {
        format!("{}{CSS_SUFFIX}", template_id.replace('\\', "/"))
    }

    pub fn is_css_id(id: &str) -> bool {
        id.ends_with(CSS_SUFFIX)
    }

    /// Record the CSS for a template and return its virtual id.
    pub fn insert(&self, template_id: &str, css: impl Into<String>) -> String {
        let id = Self::id_for(template_id);
        self.modules.write().insert(id.clone(), css.into());
        id
    }

    /// Drop the CSS of a template that no longer produces any.
    pub fn remove(&self, template_id: &str) {
        self.modules.write().remove(&Self::id_for(template_id));
    }

    pub fn get(&self, id: &str) -> Option<String> {
        self.modules.read().get(id).cloned()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.modules.read().contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.modules.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
