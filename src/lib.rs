//! dsdlgen Library
//!
//! Final stage of a DSDL code generator: takes compound types that a front end
//! has already parsed, picks the template for each type's structural variant
//! (structure, union or service), renders it with Tera, and writes the result
//! to the path assigned to that type.
#![deny(unsafe_code)]

pub mod config;
pub mod error;
pub mod generator;
pub mod manifest;
pub mod output;
pub mod output_map;
pub mod template_generator;
pub mod templates;
pub mod types;

pub use crate::{
    config::Config,
    error::{GenerationError, Result},
    generator::{FailurePolicy, GenerationPlan, GenerationReport, Generator},
    manifest::TypeManifest,
    output_map::TypeOutputMap,
    template_generator::TemplateGenerator,
    templates::TemplateEnvironment,
    types::{ParsedType, TypeKey, TypeVariant},
};
