//! Tera-backed generator: one template per structural variant

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use crate::error::{GenerationError, Result};
use crate::generator::{FailurePolicy, GenerationPlan, GenerationReport, Generator};
use crate::output::{RenderedFile, write_file};
use crate::output_map::TypeOutputMap;
use crate::templates::TemplateEnvironment;
use crate::types::{ParsedType, TypeKey};

/// Renders each type with the template named after its variant
/// (`StructureType.j2`, `UnionType.j2`, `ServiceType.j2`).
///
/// Output paths are used exactly as given in the map; relative ones are
/// relative to the process working directory, not to the output root.
///
/// Every generation call runs in two phases. All types are rendered first;
/// only then are files written. With the default
/// [`FailurePolicy::AllOrNothing`] a missing or broken template therefore
/// leaves the output tree untouched.
///
/// # Examples
/// ```no_run
/// use dsdlgen::{Generator, TemplateGenerator, TypeOutputMap};
///
/// # fn example(types: TypeOutputMap) -> dsdlgen::Result<()> {
/// let generator = TemplateGenerator::new("build/generated", types, "templates")?;
/// generator.generate_all(true)?; // validate templates only
/// generator.generate_all(false)?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct TemplateGenerator {
    plan: GenerationPlan,
    env: TemplateEnvironment,
    policy: FailurePolicy,
}

impl TemplateGenerator {
    /// Create a generator for `types`, loading templates from `templates_dir`.
    ///
    /// # Errors
    /// Returns a configuration error if the template directory is missing or
    /// the generator inputs are invalid (see [`GenerationPlan::new`]).
    pub fn new(
        output_basedir: impl Into<PathBuf>,
        types: TypeOutputMap,
        templates_dir: impl Into<PathBuf>,
    ) -> Result<Self> {
        let plan = GenerationPlan::new(output_basedir, types)?;
        let env = TemplateEnvironment::new(templates_dir)?;
        Ok(Self::with_environment(plan, env))
    }

    /// Create a generator from an already configured environment
    pub fn with_environment(plan: GenerationPlan, env: TemplateEnvironment) -> Self {
        Self {
            plan,
            env,
            policy: FailurePolicy::default(),
        }
    }

    pub fn with_failure_policy(mut self, policy: FailurePolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_template_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.env = self.env.with_suffix(suffix);
        self
    }

    pub fn environment(&self) -> &TemplateEnvironment {
        &self.env
    }

    pub fn failure_policy(&self) -> FailurePolicy {
        self.policy
    }

    /// Run one generation call stamped with the current time
    pub fn generate(&self, is_dryrun: bool) -> Result<GenerationReport> {
        self.generate_at(is_dryrun, Utc::now())
    }

    /// Run one generation call; every template sees `generated_at` as `now_utc`
    pub fn generate_at(
        &self,
        is_dryrun: bool,
        generated_at: DateTime<Utc>,
    ) -> Result<GenerationReport> {
        let attempted = self.plan.types().len();
        info!(
            types = attempted,
            dry_run = is_dryrun,
            policy = %self.policy,
            templates = %self.env.root().display(),
            "Generating types"
        );

        let mut failures = Vec::new();
        let rendered = self.render_all(generated_at, &mut failures)?;

        let mut report = GenerationReport {
            generated_at,
            dry_run: is_dryrun,
            rendered: rendered.iter().map(|(_, f)| f.path.clone()).collect(),
            written: Vec::new(),
        };

        if is_dryrun {
            debug!(rendered = report.rendered.len(), "Dry run, nothing written");
        } else {
            report.written = self.write_all(&rendered, &mut failures)?;
        }

        if !failures.is_empty() {
            return Err(GenerationError::Incomplete {
                attempted,
                failures,
            });
        }

        info!(
            rendered = report.rendered.len(),
            written = report.written.len(),
            "Generation complete"
        );
        Ok(report)
    }

    fn render_all(
        &self,
        generated_at: DateTime<Utc>,
        failures: &mut Vec<GenerationError>,
    ) -> Result<Vec<(TypeKey, RenderedFile)>> {
        let mut session = self.env.session(generated_at);
        let mut rendered = Vec::with_capacity(self.plan.types().len());

        for (ty, path) in self.type_output_pairs() {
            match session.render(ty) {
                Ok(content) => {
                    debug!(type_name = %ty.key(), path = %path.display(), "Rendered");
                    let path = path.to_path_buf();
                    rendered.push((ty.key(), RenderedFile { path, content }));
                }
                Err(e) => self.handle_failure(ty, e, failures)?,
            }
        }
        Ok(rendered)
    }

    fn write_all(
        &self,
        rendered: &[(TypeKey, RenderedFile)],
        failures: &mut Vec<GenerationError>,
    ) -> Result<Vec<PathBuf>> {
        let mut written = Vec::with_capacity(rendered.len());
        for (key, file) in rendered {
            match write_file(&file.path, &file.content) {
                Ok(()) => {
                    debug!(type_name = %key, path = %file.path.display(), "Wrote");
                    written.push(file.path.clone());
                }
                Err(source) => {
                    let err = GenerationError::FileSystem {
                        type_key: key.clone(),
                        path: file.path.clone(),
                        source,
                    };
                    match self.policy {
                        FailurePolicy::AllOrNothing => return Err(err),
                        FailurePolicy::BestEffort => {
                            warn!(error = %err, "Failed to write generated file");
                            failures.push(err);
                        }
                    }
                }
            }
        }
        Ok(written)
    }

    fn handle_failure(
        &self,
        ty: &ParsedType,
        err: GenerationError,
        failures: &mut Vec<GenerationError>,
    ) -> Result<()> {
        match self.policy {
            FailurePolicy::AllOrNothing => Err(err),
            FailurePolicy::BestEffort => {
                warn!(type_name = %ty.key(), error = %err, "Failed to render type");
                failures.push(err);
                Ok(())
            }
        }
    }
}

impl Generator for TemplateGenerator {
    fn plan(&self) -> &GenerationPlan {
        &self.plan
    }

    fn generate_all(&self, is_dryrun: bool) -> Result<i32> {
        self.generate(is_dryrun).map(|report| report.status())
    }
}
