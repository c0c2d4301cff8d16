//! Navigation between the module list and the builder

/// How the builder is opened
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuilderMode {
    /// New module, no id until the first save
    Create,
    Edit(String),
    /// Read-only inspection
    View(String),
}

impl BuilderMode {
    pub fn module_id(&self) -> Option<&str> {
        match self {
            BuilderMode::Create => None,
            BuilderMode::Edit(id) | BuilderMode::View(id) => Some(id),
        }
    }

    pub fn is_read_only(&self) -> bool {
        matches!(self, BuilderMode::View(_))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Route {
    #[default]
    List,
    Builder(BuilderMode),
}
