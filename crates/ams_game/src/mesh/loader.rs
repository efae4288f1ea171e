use super::{AmsMeshLoader, Mesh, MeshError};
use std::collections::HashMap;
use std::path::Path;

/// A reader for one mesh file format
pub trait MeshLoader {
    /// Extension handled by the loader, without the dot
    fn filetype(&self) -> &str;

    /// Read the file into a mesh
    fn load(&self, path: &Path) -> Result<Mesh, MeshError>;
}

/// Extension-keyed catalog of mesh loaders
///
/// Keys are compared as written: `"OBJ"` and `"obj"` are different entries.
/// Entries are never removed.
#[derive(Default)]
pub struct MeshLoaderRegistry {
    loaders: HashMap<String, Box<dyn MeshLoader>>,
}

impl MeshLoaderRegistry {
    /// Empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a default-constructed loader
    ///
    /// Returns false and leaves the registry untouched if its extension is
    /// already taken.
    pub fn register<T: MeshLoader + Default + 'static>(&mut self) -> bool {
        self.register_boxed(Box::new(T::default()))
    }

    /// Register an already constructed loader
    pub fn register_boxed(&mut self, loader: Box<dyn MeshLoader>) -> bool {
        let key = loader.filetype().to_owned();
        if self.loaders.contains_key(&key) {
            log::debug!("Mesh loader for '{key}' already registered");
            return false;
        }
        log::debug!("Registered mesh loader for '{key}'");
        self.loaders.insert(key, loader);
        true
    }

    /// Whether a loader handles this extension
    pub fn contains(&self, filetype: &str) -> bool {
        self.loaders.contains_key(filetype)
    }

    /// Loader for an extension
    pub fn get(&self, filetype: &str) -> Option<&dyn MeshLoader> {
        self.loaders.get(filetype).map(Box::as_ref)
    }

    /// Registered extensions, sorted
    pub fn supported_file_types(&self) -> Vec<&str> {
        let mut types: Vec<&str> = self.loaders.keys().map(String::as_str).collect();
        types.sort_unstable();
        types
    }

    /// Number of registered loaders
    pub fn len(&self) -> usize {
        self.loaders.len()
    }

    /// Whether no loader is registered
    pub fn is_empty(&self) -> bool {
        self.loaders.is_empty()
    }

    /// Load a file with the loader registered for its extension
    ///
    /// The `.ams` loader is registered on first use.
    pub fn load(&mut self, path: &Path) -> Result<Mesh, MeshError> {
        let ext = file_extension(path);

        if ext == AmsMeshLoader::FILETYPE && !self.contains(ext) {
            self.register::<AmsMeshLoader>();
        }

        match self.loaders.get(ext) {
            Some(loader) => loader.load(path),
            None => {
                log::error!("No mesh loader for '{ext}' ({})", path.display());
                Err(MeshError::NoLoader(ext.to_owned()))
            }
        }
    }
}

/// Text after the last dot of the file name, empty when there is none
///
/// Unlike [`Path::extension`], a dot file such as `.ams` yields `"ams"`.
fn file_extension(path: &Path) -> &str {
    path.file_name()
        .and_then(|name| name.to_str())
        .and_then(|name| name.rsplit_once('.'))
        .map_or("", |(_, ext)| ext)
}

impl std::fmt::Debug for MeshLoaderRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MeshLoaderRegistry")
            .field("filetypes", &self.supported_file_types())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct UpperObj;

    impl MeshLoader for UpperObj {
        fn filetype(&self) -> &str {
            "OBJ"
        }

        fn load(&self, _path: &Path) -> Result<Mesh, MeshError> {
            Ok(Mesh::new(vec![[1.0, 2.0, 3.0]], Vec::new()))
        }
    }

    #[test]
    fn test_register_is_idempotent() {
        let mut registry = MeshLoaderRegistry::new();
        assert!(registry.is_empty());
        assert!(registry.register::<UpperObj>());
        assert!(!registry.register::<UpperObj>());
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.supported_file_types(), vec!["OBJ"]);
    }

    #[test]
    fn test_keys_are_case_sensitive() {
        let mut registry = MeshLoaderRegistry::new();
        registry.register::<UpperObj>();

        assert!(registry.load(Path::new("model.OBJ")).is_ok());
        let err = registry.load(Path::new("model.obj")).unwrap_err();
        assert!(matches!(err, MeshError::NoLoader(ext) if ext == "obj"));
    }

    #[test]
    fn test_missing_extension_has_no_loader() {
        let mut registry = MeshLoaderRegistry::new();
        let err = registry.load(Path::new("model")).unwrap_err();
        assert!(matches!(err, MeshError::NoLoader(ext) if ext.is_empty()));
    }

    #[test]
    fn test_extension_is_text_after_last_dot() {
        assert_eq!(file_extension(Path::new("dir/model.tar.OBJ")), "OBJ");
        assert_eq!(file_extension(Path::new("dir/.OBJ")), "OBJ");
        assert_eq!(file_extension(Path::new("model.")), "");
        assert_eq!(file_extension(Path::new("model")), "");

        let mut registry = MeshLoaderRegistry::new();
        registry.register::<UpperObj>();
        assert!(registry.load(Path::new("dir/.OBJ")).is_ok());
    }

    #[test]
    fn test_ams_loader_is_bootstrapped() {
        let mut registry = MeshLoaderRegistry::new();
        // the file does not exist; only the registration matters here
        let err = registry.load(Path::new("/nonexistent/mesh.ams")).unwrap_err();
        assert!(matches!(err, MeshError::Io { .. }));
        assert!(registry.contains("ams"));
        assert!(!registry.register::<AmsMeshLoader>());
    }
}
