//! Data model for parsed compound types handed over by the DSDL front end
//!
//! The front end owns parsing and validation. This module only models what the
//! generator needs: the structural variant of each type (for template
//! selection) and a serializable view of it (for the template context).

use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize, Serializer};
use serde_json::Value as JsonValue;

/// Major/minor version of a compound type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Version {
    pub major: u8,
    pub minor: u8,
}

impl Version {
    pub fn new(major: u8, minor: u8) -> Self {
        Self { major, minor }
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

/// Identity of a compound type: its full name plus version
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeKey {
    full_name: String,
    version: Version,
}

impl TypeKey {
    pub fn new(full_name: impl Into<String>, version: Version) -> Self {
        Self {
            full_name: full_name.into(),
            version,
        }
    }

    pub fn full_name(&self) -> &str {
        &self.full_name
    }

    pub fn version(&self) -> Version {
        self.version
    }
}

impl fmt::Display for TypeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.full_name, self.version)
    }
}

/// Closed set of structural variants, one template per variant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TypeVariant {
    Structure,
    Union,
    Service,
}

impl TypeVariant {
    pub const ALL: [TypeVariant; 3] = [Self::Structure, Self::Union, Self::Service];

    /// Variant name used as the template file stem
    pub fn type_name(self) -> &'static str {
        match self {
            Self::Structure => "StructureType",
            Self::Union => "UnionType",
            Self::Service => "ServiceType",
        }
    }

    /// Lowercase tag used in manifests and in the render context
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Structure => "structure",
            Self::Union => "union",
            Self::Service => "service",
        }
    }
}

impl fmt::Display for TypeVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.type_name())
    }
}

/// Attributes shared by every compound type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TypeMeta {
    /// Dot-separated name including namespaces, e.g. `uavcan.node.Heartbeat`
    pub full_name: String,
    pub version: Version,
    #[serde(default)]
    pub deprecated: bool,
    #[serde(default)]
    pub fixed_port_id: Option<u32>,
    #[serde(default)]
    pub source_file_path: Option<PathBuf>,
    #[serde(default)]
    pub doc: Option<String>,
}

impl TypeMeta {
    pub fn new(full_name: impl Into<String>, version: Version) -> Self {
        Self {
            full_name: full_name.into(),
            version,
            deprecated: false,
            fixed_port_id: None,
            source_file_path: None,
            doc: None,
        }
    }

    pub fn key(&self) -> TypeKey {
        TypeKey::new(self.full_name.clone(), self.version)
    }

    pub fn short_name(&self) -> &str {
        self.full_name
            .rsplit_once('.')
            .map_or(self.full_name.as_str(), |(_, name)| name)
    }

    pub fn full_namespace(&self) -> &str {
        self.full_name
            .rsplit_once('.')
            .map_or("", |(namespace, _)| namespace)
    }

    pub fn name_components(&self) -> Vec<&str> {
        self.full_name.split('.').collect()
    }
}

/// A field of a structure or a variant of a union
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Field {
    /// Empty for padding fields
    #[serde(default)]
    pub name: String,
    pub data_type: String,
    #[serde(default)]
    pub doc: Option<String>,
}

impl Field {
    pub fn new(name: impl Into<String>, data_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            data_type: data_type.into(),
            doc: None,
        }
    }

    pub fn is_padding(&self) -> bool {
        self.name.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Constant {
    pub name: String,
    pub data_type: String,
    pub value: JsonValue,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StructureType {
    #[serde(flatten)]
    pub meta: TypeMeta,
    #[serde(default)]
    pub fields: Vec<Field>,
    #[serde(default)]
    pub constants: Vec<Constant>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnionType {
    #[serde(flatten)]
    pub meta: TypeMeta,
    #[serde(default)]
    pub fields: Vec<Field>,
    #[serde(default)]
    pub constants: Vec<Constant>,
}

/// Request/response pair; each half is itself a structure or a union
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ServiceType {
    #[serde(flatten)]
    pub meta: TypeMeta,
    pub request: Box<ParsedType>,
    pub response: Box<ParsedType>,
}

/// One compound type as produced by the front end
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ParsedType {
    Structure(StructureType),
    Union(UnionType),
    Service(ServiceType),
}

impl ParsedType {
    pub fn variant(&self) -> TypeVariant {
        match self {
            Self::Structure(_) => TypeVariant::Structure,
            Self::Union(_) => TypeVariant::Union,
            Self::Service(_) => TypeVariant::Service,
        }
    }

    pub fn meta(&self) -> &TypeMeta {
        match self {
            Self::Structure(t) => &t.meta,
            Self::Union(t) => &t.meta,
            Self::Service(t) => &t.meta,
        }
    }

    pub fn key(&self) -> TypeKey {
        self.meta().key()
    }

    pub fn full_name(&self) -> &str {
        &self.meta().full_name
    }

    /// Fields of a structure or union; services have none of their own
    pub fn fields(&self) -> &[Field] {
        match self {
            Self::Structure(t) => &t.fields,
            Self::Union(t) => &t.fields,
            Self::Service(_) => &[],
        }
    }

    pub fn constants(&self) -> &[Constant] {
        match self {
            Self::Structure(t) => &t.constants,
            Self::Union(t) => &t.constants,
            Self::Service(_) => &[],
        }
    }
}

impl From<StructureType> for ParsedType {
    fn from(value: StructureType) -> Self {
        Self::Structure(value)
    }
}

impl From<UnionType> for ParsedType {
    fn from(value: UnionType) -> Self {
        Self::Union(value)
    }
}

impl From<ServiceType> for ParsedType {
    fn from(value: ServiceType) -> Self {
        Self::Service(value)
    }
}

/// What templates see under `T`: the raw attributes plus derived names.
#[derive(Serialize)]
struct TypeView<'a> {
    kind: &'static str,
    variant: &'static str,
    #[serde(flatten)]
    meta: &'a TypeMeta,
    short_name: &'a str,
    full_namespace: &'a str,
    name_components: Vec<&'a str>,
    has_fixed_port_id: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    fields: Option<&'a [Field]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    constants: Option<&'a [Constant]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    number_of_variants: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    request: Option<&'a ParsedType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response: Option<&'a ParsedType>,
}

impl Serialize for ParsedType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let meta = self.meta();
        let variant = self.variant();
        let mut view = TypeView {
            kind: variant.as_str(),
            variant: variant.type_name(),
            meta,
            short_name: meta.short_name(),
            full_namespace: meta.full_namespace(),
            name_components: meta.name_components(),
            has_fixed_port_id: meta.fixed_port_id.is_some(),
            fields: None,
            constants: None,
            number_of_variants: None,
            request: None,
            response: None,
        };
        match self {
            Self::Structure(t) => {
                view.fields = Some(t.fields.as_slice());
                view.constants = Some(t.constants.as_slice());
            }
            Self::Union(t) => {
                view.fields = Some(t.fields.as_slice());
                view.constants = Some(t.constants.as_slice());
                view.number_of_variants = Some(t.fields.len());
            }
            Self::Service(t) => {
                view.request = Some(t.request.as_ref());
                view.response = Some(t.response.as_ref());
            }
        }
        view.serialize(serializer)
    }
}
