//! Type manifest: the hand-off format between the DSDL front end and dsdlgen
//!
//! A manifest lists every parsed type together with the file it should
//! produce:
//!
//! ```yaml
//! types:
//!   - output: uavcan/node/Heartbeat_1_0.hpp
//!     type:
//!       kind: structure
//!       full_name: uavcan.node.Heartbeat
//!       version: { major: 1, minor: 0 }
//!       fixed_port_id: 7509
//!       fields:
//!         - { name: uptime, data_type: saturated uint32 }
//! ```
//!
//! Relative `output` entries are relative to the output root the manifest is
//! generated into, see [`TypeManifest::into_output_map_under`].

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::debug;

use crate::error::{GenerationError, Result};
use crate::output_map::TypeOutputMap;
use crate::types::ParsedType;

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ManifestEntry {
    pub output: PathBuf,
    #[serde(rename = "type")]
    pub ty: ParsedType,
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct TypeManifest {
    #[serde(default)]
    pub types: Vec<ManifestEntry>,
}

impl TypeManifest {
    /// Load a manifest, choosing the format from the file extension
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_lowercase);

        let manifest = match extension.as_deref() {
            Some("json") => Self::from_json(&content)?,
            #[cfg(feature = "yaml")]
            Some("yaml" | "yml") => Self::from_yaml(&content)?,
            _ => {
                return Err(GenerationError::manifest(format!(
                    "Unsupported manifest format: {}",
                    path.display()
                )));
            }
        };
        debug!(path = %path.display(), types = manifest.types.len(), "Loaded type manifest");
        Ok(manifest)
    }

    pub fn from_json(content: &str) -> Result<Self> {
        Ok(serde_json::from_str(content)?)
    }

    #[cfg(feature = "yaml")]
    pub fn from_yaml(content: &str) -> Result<Self> {
        serde_yaml::from_str(content).map_err(|e| GenerationError::Yaml(e.to_string()))
    }

    /// Build the type→path mapping with every output kept exactly as listed;
    /// a type listed twice is an error
    pub fn into_output_map(self) -> Result<TypeOutputMap> {
        self.collect_outputs(|output| output)
    }

    /// Like [`into_output_map`](Self::into_output_map), but relative outputs
    /// are placed under `root`. Absolute outputs are kept.
    pub fn into_output_map_under(self, root: &Path) -> Result<TypeOutputMap> {
        self.collect_outputs(|output| {
            if output.is_absolute() {
                output
            } else {
                root.join(output)
            }
        })
    }

    fn collect_outputs(self, place: impl Fn(PathBuf) -> PathBuf) -> Result<TypeOutputMap> {
        let mut map = TypeOutputMap::new();
        for entry in self.types {
            let key = entry.ty.key();
            if map.contains(&key) {
                return Err(GenerationError::manifest(format!(
                    "{key} is listed more than once"
                )));
            }
            map.insert(entry.ty, place(entry.output));
        }
        Ok(map)
    }
}
