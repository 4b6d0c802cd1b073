use std::ops::Deref;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

/// Settings the distance tool reads while it runs
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Environment {
    /// Base directory for relative input and output paths
    pub workspace: Option<PathBuf>,
    /// Raster restricting which cells receive a distance
    pub mask: Option<PathBuf>,
    pub cell_size: Option<f64>,
    pub overwrite_output: bool,
}

/// Overrides applied for the lifetime of a [`ScopedEnvironment`]
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EnvironmentSettings {
    pub workspace: Option<PathBuf>,
    pub mask: Option<PathBuf>,
    pub cell_size: Option<f64>,
    pub overwrite_output: Option<bool>,
}

impl Environment {
    /// Apply `settings` until the returned guard is dropped, then restore
    /// whatever was set before.
    pub fn scoped(&mut self, settings: EnvironmentSettings) -> ScopedEnvironment<'_> {
        let saved = self.clone();

        if let Some(workspace) = settings.workspace {
            self.workspace = Some(workspace);
        }
        if let Some(mask) = settings.mask {
            self.mask = Some(mask);
        }
        if let Some(cell_size) = settings.cell_size {
            self.cell_size = Some(cell_size);
        }
        if let Some(overwrite) = settings.overwrite_output {
            self.overwrite_output = overwrite;
        }
        debug!(environment = ?self, "entered scoped environment");

        ScopedEnvironment {
            environment: self,
            saved: Some(saved),
        }
    }

    /// Resolve a path against the workspace
    pub fn resolve(&self, path: &Path) -> PathBuf {
        match &self.workspace {
            Some(workspace) if path.is_relative() => workspace.join(path),
            _ => path.to_path_buf(),
        }
    }
}

/// Environment with temporary overrides; restores the previous state on drop
pub struct ScopedEnvironment<'a> {
    environment: &'a mut Environment,
    saved: Option<Environment>,
}

impl Deref for ScopedEnvironment<'_> {
    type Target = Environment;

    fn deref(&self) -> &Environment {
        &*self.environment
    }
}

impl Drop for ScopedEnvironment<'_> {
    fn drop(&mut self) {
        if let Some(saved) = self.saved.take() {
            *self.environment = saved;
            debug!("restored environment");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scope_restores_previous_state() {
        let mut env = Environment {
            workspace: Some(PathBuf::from("/data")),
            cell_size: Some(30.0),
            ..Default::default()
        };
        let before = env.clone();

        {
            let scoped = env.scoped(EnvironmentSettings {
                mask: Some(PathBuf::from("mask.asc")),
                cell_size: Some(5.0),
                overwrite_output: Some(true),
                ..Default::default()
            });
            assert_eq!(scoped.cell_size, Some(5.0));
            assert_eq!(scoped.mask.as_deref(), Some(Path::new("mask.asc")));
            assert!(scoped.overwrite_output);
            assert_eq!(scoped.workspace.as_deref(), Some(Path::new("/data")));
        }

        assert_eq!(env, before);
    }

    #[test]
    fn test_scope_restores_on_early_return() {
        fn fails(env: &mut Environment) -> Result<(), String> {
            let _scoped = env.scoped(EnvironmentSettings {
                cell_size: Some(1.0),
                ..Default::default()
            });
            Err("engine failed".to_string())
        }

        let mut env = Environment::default();
        assert!(fails(&mut env).is_err());
        assert_eq!(env, Environment::default());
    }

    #[test]
    fn test_resolve_against_workspace() {
        let env = Environment {
            workspace: Some(PathBuf::from("/data")),
            ..Default::default()
        };
        assert_eq!(env.resolve(Path::new("roads.geojson")), PathBuf::from("/data/roads.geojson"));
        assert_eq!(env.resolve(Path::new("/tmp/out.asc")), PathBuf::from("/tmp/out.asc"));
        assert_eq!(Environment::default().resolve(Path::new("a.asc")), PathBuf::from("a.asc"));
    }
}
