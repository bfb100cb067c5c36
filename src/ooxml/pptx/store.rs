//! Stored templates, addressed by id.
//!
//! A template source is immutable once loaded: generation calls share the
//! bytes and each builds its own package from them.

use crate::ooxml::error::{OoxmlError, Result};
use crate::ooxml::pptx::author::AuthoredTemplate;
use crate::ooxml::pptx::manifest::LayoutManifest;
use crate::ooxml::pptx::resolver::LayoutStrategy;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;

const TEMPLATE_EXT: &str = "pptx";
const MANIFEST_SUFFIX: &str = ".manifest.yaml";

/// Template bytes plus the manifest stored with them, if any.
#[derive(Debug, Clone)]
pub struct TemplateSource {
    pub id: Option<String>,
    pub bytes: Arc<[u8]>,
    pub manifest: Option<LayoutManifest>,
}

impl TemplateSource {
    /// Raw bytes with no manifest; layouts will be discovered.
    pub fn from_bytes(bytes: impl Into<Arc<[u8]>>) -> Self {
        Self {
            id: None,
            bytes: bytes.into(),
            manifest: None,
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_manifest(mut self, manifest: LayoutManifest) -> Self {
        self.manifest = Some(manifest);
        self
    }

    /// A stored manifest is trusted; otherwise layouts are discovered.
    pub fn strategy(&self) -> LayoutStrategy {
        match &self.manifest {
            Some(manifest) => LayoutStrategy::Manifest(manifest.clone()),
            None => LayoutStrategy::Heuristic,
        }
    }

    /// Label for log messages.
    pub fn label(&self) -> &str {
        self.id.as_deref().unwrap_or("<bytes>")
    }
}

impl TryFrom<&AuthoredTemplate> for TemplateSource {
    type Error = OoxmlError;

    fn try_from(authored: &AuthoredTemplate) -> Result<Self> {
        Ok(Self::from_bytes(authored.to_bytes()?).with_manifest(authored.manifest.clone()))
    }
}

/// Lookup of templates by id.
pub trait TemplateStore: Send + Sync {
    /// Load the template `id`.
    ///
    /// # Errors
    /// [`OoxmlError::TemplateNotFound`] when there is no such template.
    fn load(&self, id: &str) -> Result<TemplateSource>;

    /// Ids of all stored templates, sorted.
    fn ids(&self) -> Result<Vec<String>>;
}

/// Templates kept as `<root>/<id>.pptx` with an optional
/// `<root>/<id>.manifest.yaml`.
///
/// Loaded templates are cached until they are saved again.
#[derive(Debug)]
pub struct DirTemplateStore {
    root: PathBuf,
    cache: RwLock<HashMap<String, TemplateSource>>,
}

impl DirTemplateStore {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
            cache: RwLock::new(HashMap::new()),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Store template bytes under `id`, replacing any previous version.
    ///
    /// A stale manifest is removed when `manifest` is `None`.
    pub fn save_bytes(&self, id: &str, bytes: &[u8], manifest: Option<&LayoutManifest>) -> Result<()> {
        validate_id(id)?;
        std::fs::create_dir_all(&self.root)?;
        std::fs::write(self.template_path(id), bytes)?;

        let manifest_path = self.manifest_path(id);
        match manifest {
            Some(manifest) => std::fs::write(&manifest_path, manifest.to_yaml()?)?,
            None => match std::fs::remove_file(&manifest_path) {
                Err(e) if e.kind() != ErrorKind::NotFound => return Err(e.into()),
                _ => {},
            },
        }

        self.cache.write().remove(id);
        log::debug!("stored template '{}' in {}", id, self.root.display());
        Ok(())
    }

    /// Store an authored template with its manifest.
    pub fn save(&self, id: &str, template: &AuthoredTemplate) -> Result<()> {
        self.save_bytes(id, &template.to_bytes()?, Some(&template.manifest))
    }

    fn template_path(&self, id: &str) -> PathBuf {
        self.root.join(format!("{}.{}", id, TEMPLATE_EXT))
    }

    fn manifest_path(&self, id: &str) -> PathBuf {
        self.root.join(format!("{}{}", id, MANIFEST_SUFFIX))
    }

    fn read_source(&self, id: &str) -> Result<TemplateSource> {
        let bytes = match std::fs::read(self.template_path(id)) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(OoxmlError::TemplateNotFound(id.to_string()));
            },
            Err(e) => return Err(e.into()),
        };

        let manifest = match std::fs::read_to_string(self.manifest_path(id)) {
            Ok(yaml) => Some(LayoutManifest::from_yaml(&yaml)?),
            Err(e) if e.kind() == ErrorKind::NotFound => None,
            Err(e) => return Err(e.into()),
        };

        let mut source = TemplateSource::from_bytes(bytes).with_id(id);
        source.manifest = manifest;
        Ok(source)
    }
}

impl TemplateStore for DirTemplateStore {
    fn load(&self, id: &str) -> Result<TemplateSource> {
        validate_id(id)?;
        if let Some(source) = self.cache.read().get(id) {
            return Ok(source.clone());
        }

        let source = self.read_source(id)?;
        log::debug!(
            "loaded template '{}' ({} bytes, {})",
            id,
            source.bytes.len(),
            if source.manifest.is_some() { "manifest" } else { "no manifest" }
        );
        self.cache.write().insert(id.to_string(), source.clone());
        Ok(source)
    }

    fn ids(&self) -> Result<Vec<String>> {
        let entries = match std::fs::read_dir(&self.root) {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut ids = Vec::new();
        for entry in entries {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some(TEMPLATE_EXT) {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                if validate_id(stem).is_ok() {
                    ids.push(stem.to_string());
                }
            }
        }
        ids.sort();
        Ok(ids)
    }
}

/// Ids are file stems: ASCII letters, digits, `-`, `_` and inner dots.
fn validate_id(id: &str) -> Result<()> {
    let valid = !id.is_empty()
        && !id.starts_with('.')
        && !id.ends_with('.')
        && !id.contains("..")
        && id
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || matches!(b, b'-' | b'_' | b'.'));
    if valid {
        Ok(())
    } else {
        Err(OoxmlError::TemplateNotFound(format!("invalid template id '{}'", id)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ooxml::pptx::manifest::LayoutManifestEntry;

    #[test]
    fn test_validate_id() {
        for ok in ["brand", "brand-2024", "q3_review", "v1.2"] {
            assert!(validate_id(ok).is_ok(), "{}", ok);
        }
        for bad in ["", "../etc/passwd", "a/b", ".hidden", "x..y", "trailing."] {
            assert!(validate_id(bad).is_err(), "{}", bad);
        }
    }

    #[test]
    fn test_missing_template() {
        let dir = tempfile::tempdir().unwrap();
        let store = DirTemplateStore::new(dir.path());
        assert!(matches!(store.load("nope"), Err(OoxmlError::TemplateNotFound(_))));
        assert!(store.ids().unwrap().is_empty());
    }

    #[test]
    fn test_save_and_load_with_manifest() {
        let dir = tempfile::tempdir().unwrap();
        let store = DirTemplateStore::new(dir.path().join("templates"));
        let manifest = LayoutManifest::new(vec![LayoutManifestEntry::new("content", 1)]);

        store.save_bytes("brand", b"not really a zip", Some(&manifest)).unwrap();
        let source = store.load("brand").unwrap();
        assert_eq!(&*source.bytes, b"not really a zip");
        assert_eq!(source.manifest.as_ref(), Some(&manifest));
        assert!(!source.strategy().is_heuristic());
        assert_eq!(source.label(), "brand");
        assert_eq!(store.ids().unwrap(), vec!["brand"]);

        // Saving again invalidates the cache and drops the stale manifest.
        store.save_bytes("brand", b"v2", None).unwrap();
        let source = store.load("brand").unwrap();
        assert_eq!(&*source.bytes, b"v2");
        assert!(source.strategy().is_heuristic());
    }

    #[test]
    fn test_invalid_manifest_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("t.pptx"), b"x").unwrap();
        std::fs::write(dir.path().join("t.manifest.yaml"), "layouts: 3\n").unwrap();
        let store = DirTemplateStore::new(dir.path());
        assert!(matches!(store.load("t"), Err(OoxmlError::Manifest(_))));
    }
}
