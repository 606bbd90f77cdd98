//! Generator contract shared by every code generation backend
//!
//! A backend is handed an output root and a [`TypeOutputMap`] and turns every
//! entry of the map into a file at exactly the path the map gives for it. [`GenerationPlan`] holds and validates those
//! inputs so each backend only has to implement
//! [`Generator::generate_all`].

use std::fmt;
use std::path::{Component, Path, PathBuf};
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{GenerationError, Result};
use crate::output_map::TypeOutputMap;
use crate::types::ParsedType;

/// Status returned by a successful [`Generator::generate_all`]
pub const STATUS_SUCCESS: i32 = 0;

/// What to do when one type fails during a generation call
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
    /// Stop at the first failure. Nothing is written unless every type rendered.
    #[default]
    AllOrNothing,
    /// Attempt every type, write the ones that rendered, then report all failures.
    BestEffort,
}

impl FailurePolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AllOrNothing => "all_or_nothing",
            Self::BestEffort => "best_effort",
        }
    }
}

impl fmt::Display for FailurePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FailurePolicy {
    type Err = GenerationError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "all_or_nothing" => Ok(Self::AllOrNothing),
            "best_effort" => Ok(Self::BestEffort),
            other => Err(GenerationError::config(format!(
                "Unknown failure policy '{other}'"
            ))),
        }
    }
}

/// Output root and type→path mapping a generator works from
#[derive(Debug, Clone)]
pub struct GenerationPlan {
    output_basedir: PathBuf,
    types: TypeOutputMap,
}

impl GenerationPlan {
    /// Validate and bundle generator inputs.
    ///
    /// An empty map is valid and produces no files.
    ///
    /// # Errors
    /// Returns a configuration error if the output root is empty or two types
    /// would be written to the same file.
    pub fn new(output_basedir: impl Into<PathBuf>, types: TypeOutputMap) -> Result<Self> {
        let output_basedir = output_basedir.into();
        if output_basedir.as_os_str().is_empty() {
            return Err(GenerationError::config("Output directory was not provided"));
        }

        let plan = Self {
            output_basedir,
            types,
        };
        if let Some((first, second, path)) = plan.types.find_output_collision(normalize) {
            return Err(GenerationError::config(format!(
                "{first} and {second} are both mapped to {}",
                path.display()
            )));
        }
        Ok(plan)
    }

    pub fn output_basedir(&self) -> &Path {
        &self.output_basedir
    }

    pub fn types(&self) -> &TypeOutputMap {
        &self.types
    }

}

/// Lexically drop `.` and fold `..` so equivalent spellings compare equal
fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !out.pop() {
                    out.push(component);
                }
            }
            other => out.push(other),
        }
    }
    out
}

/// Something that turns a type→path mapping into files
pub trait Generator {
    fn plan(&self) -> &GenerationPlan;

    fn output_basedir(&self) -> &Path {
        self.plan().output_basedir()
    }

    /// The parsed types to generate, in no particular order
    fn input_types(&self) -> Box<dyn Iterator<Item = &ParsedType> + '_> {
        Box::new(self.plan().types().types())
    }

    /// Each type paired with the path of the file it produces, as given
    fn type_output_pairs(&self) -> Box<dyn Iterator<Item = (&ParsedType, &Path)> + '_> {
        Box::new(self.plan().types().pairs())
    }

    /// Generate a file for every type, or only render them when `is_dryrun`.
    ///
    /// Returns [`STATUS_SUCCESS`] when every type was generated.
    fn generate_all(&self, is_dryrun: bool) -> Result<i32>;
}

/// Outcome of a successful generation call
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationReport {
    pub generated_at: DateTime<Utc>,
    pub dry_run: bool,
    /// Every output that was rendered, whether or not it was written
    pub rendered: Vec<PathBuf>,
    pub written: Vec<PathBuf>,
}

impl GenerationReport {
    pub fn status(&self) -> i32 {
        STATUS_SUCCESS
    }
}
