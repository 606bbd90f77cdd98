//! Template environment and per-call render sessions
//!
//! A [`TemplateEnvironment`] is built once per generator: it validates the
//! template root and holds a Tera instance with the helper filters registered
//! but no templates. Each generation call opens a [`RenderSession`], which
//! clones that instance, fixes the ambient generation timestamp, and loads one
//! template file per structural variant the first time it is needed.
//!
//! Variant templates may `include`, `import` or `extend` any other template
//! under the root that carries the template suffix, by its `/`-separated path
//! relative to the root (`{% include "common/header.j2" %}`). Those shared
//! templates are registered once per session, right before the first variant
//! template. Hidden files and directories are skipped.

pub mod filters;

use std::collections::HashSet;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use tera::{Context, Tera};
use tracing::{debug, info};
use walkdir::{DirEntry, WalkDir};

use crate::error::{GenerationError, Result};
use crate::types::{ParsedType, TypeVariant};

/// Suffix appended to the variant name to form a template file name
pub const DEFAULT_TEMPLATE_SUFFIX: &str = ".j2";

/// Name the type being rendered is bound to in the template context
pub const TYPE_CONTEXT_KEY: &str = "T";

/// Name the ambient generation timestamp is bound to in the template context
pub const TIMESTAMP_CONTEXT_KEY: &str = "now_utc";

/// Template root plus a Tera instance carrying the helper filters
#[derive(Debug, Clone)]
pub struct TemplateEnvironment {
    root: PathBuf,
    suffix: String,
    tera: Tera,
}

impl TemplateEnvironment {
    /// Create an environment rooted at `root`.
    ///
    /// # Errors
    /// Returns a configuration error if `root` is empty, does not exist, or is
    /// not a directory. Symlinks are followed.
    pub fn new(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        if root.as_os_str().is_empty() {
            return Err(GenerationError::config("Templates directory was not provided"));
        }

        match fs::metadata(&root) {
            Ok(metadata) if metadata.is_dir() => {}
            Ok(_) => {
                return Err(GenerationError::config(format!(
                    "Templates path {} is not a directory",
                    root.display()
                )));
            }
            Err(e) => {
                return Err(GenerationError::config(format!(
                    "Templates directory {} does not exist: {e}",
                    root.display()
                )));
            }
        }

        info!(path = %root.display(), "Loading templates");

        let mut tera = Tera::default();
        // Generated sources are not markup
        tera.autoescape_on(vec![]);
        tera.register_filter("yamlfy", filters::yamlfy);
        tera.register_filter("required", filters::required);
        tera.register_filter("macrofy", filters::macrofy);

        Ok(Self {
            root,
            suffix: DEFAULT_TEMPLATE_SUFFIX.to_string(),
            tera,
        })
    }

    /// Use a different template file suffix, e.g. `.tera`
    pub fn with_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.suffix = suffix.into();
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn suffix(&self) -> &str {
        &self.suffix
    }

    /// Template identifier for a variant, e.g. `StructureType.j2`
    pub fn template_name(&self, variant: TypeVariant) -> String {
        format!("{}{}", variant.type_name(), self.suffix)
    }

    pub fn template_path(&self, variant: TypeVariant) -> PathBuf {
        self.root.join(self.template_name(variant))
    }

    /// Whether a template file exists for `variant`, following symlinks
    pub fn has_template(&self, variant: TypeVariant) -> bool {
        self.template_path(variant).is_file()
    }

    /// Templates under the root other than the variant templates, paired with
    /// the name they are registered under. Symlinks are followed.
    pub fn shared_templates(&self) -> io::Result<Vec<(PathBuf, String)>> {
        let variant_templates: Vec<String> = TypeVariant::ALL
            .iter()
            .map(|variant| self.template_name(*variant))
            .collect();

        let mut shared = Vec::new();
        let walker = WalkDir::new(&self.root)
            .follow_links(true)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|entry| !is_hidden(entry));
        for entry in walker {
            let entry = entry?;
            if !entry.file_type().is_file() {
                continue;
            }
            let Some(name) = relative_name(&self.root, entry.path()) else {
                continue;
            };
            if name.ends_with(&self.suffix) && !variant_templates.contains(&name) {
                shared.push((entry.into_path(), name));
            }
        }
        Ok(shared)
    }

    /// Start a render session whose templates all see `generated_at`
    pub fn session(&self, generated_at: DateTime<Utc>) -> RenderSession<'_> {
        RenderSession {
            env: self,
            tera: self.tera.clone(),
            generated_at,
            shared_loaded: false,
            loaded: HashSet::new(),
        }
    }
}

fn is_hidden(entry: &DirEntry) -> bool {
    entry.depth() > 0
        && entry
            .file_name()
            .to_str()
            .is_some_and(|name| name.starts_with('.'))
}

/// `root/common/header.j2` → `common/header.j2`
fn relative_name(root: &Path, path: &Path) -> Option<String> {
    let parts = path
        .strip_prefix(root)
        .ok()?
        .components()
        .map(|component| component.as_os_str().to_str())
        .collect::<Option<Vec<_>>>()?;
    Some(parts.join("/"))
}

/// Rendering state for a single generation call
#[derive(Debug)]
pub struct RenderSession<'env> {
    env: &'env TemplateEnvironment,
    tera: Tera,
    generated_at: DateTime<Utc>,
    shared_loaded: bool,
    loaded: HashSet<TypeVariant>,
}

impl RenderSession<'_> {
    pub fn generated_at(&self) -> DateTime<Utc> {
        self.generated_at
    }

    /// Render the template for `ty`'s variant with `ty` bound to `T`
    pub fn render(&mut self, ty: &ParsedType) -> Result<String> {
        let variant = ty.variant();
        let template = self.env.template_name(variant);
        self.load(ty, variant, &template)?;

        let mut context = Context::new();
        context.insert(TYPE_CONTEXT_KEY, ty);
        context.insert(TIMESTAMP_CONTEXT_KEY, &self.generated_at);

        self.tera
            .render(&template, &context)
            .map_err(|e| GenerationError::render(&ty.key(), &template, &e))
    }

    fn load(&mut self, ty: &ParsedType, variant: TypeVariant, template: &str) -> Result<()> {
        if self.loaded.contains(&variant) {
            return Ok(());
        }

        let path = self.env.template_path(variant);
        if !path.is_file() {
            return Err(GenerationError::TemplateNotFound {
                type_key: ty.key(),
                template: template.to_string(),
                root: self.env.root.clone(),
            });
        }

        if !self.shared_loaded {
            self.load_shared(ty, template)?;
        }

        debug!(template, path = %path.display(), "Loading template");
        self.tera
            .add_template_file(&path, Some(template))
            .map_err(|e| GenerationError::render(&ty.key(), template, &e))?;
        self.loaded.insert(variant);
        Ok(())
    }

    fn load_shared(&mut self, ty: &ParsedType, template: &str) -> Result<()> {
        let shared = self
            .env
            .shared_templates()
            .map_err(|e| GenerationError::TemplateRender {
                type_key: ty.key(),
                template: template.to_string(),
                message: format!(
                    "Failed to scan templates under {}: {e}",
                    self.env.root.display()
                ),
            })?;

        debug!(count = shared.len(), "Loading shared templates");
        let files: Vec<(&Path, Option<&str>)> = shared
            .iter()
            .map(|(path, name)| (path.as_path(), Some(name.as_str())))
            .collect();
        self.tera
            .add_template_files(files)
            .map_err(|e| GenerationError::render(&ty.key(), template, &e))?;
        self.shared_loaded = true;
        Ok(())
    }
}
