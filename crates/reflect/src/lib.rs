//! Shader layout reflection
//!
//! This crate reflects the `layout(...)` interface qualifiers of a shader
//! unit's stage sources into a validated, fully ordered binding-layout model:
//! descriptor sets with cross-stage merged bindings, push constants, vertex
//! inputs and globally ordered framebuffer attachments. The resolved
//! [`ShaderUnit`](unit::ShaderUnit) is what a downstream code emitter turns
//! into wrapper-object construction data for a graphics API.
//!
//! Only qualifier declarations are interpreted; shader code proper passes
//! through untouched and is compiled to bytecode by an external compiler
//! behind the [`StageCompiler`](provider::StageCompiler) interface, cached by
//! source modification time.

pub mod config;
mod error;
pub mod layout;
pub mod provider;
pub mod qualifiers;
pub mod unit;

pub use config::ReflectConfig;
pub use error::ReflectError;

use provider::{StageCompiler, StageSourceProvider, stage_kind_for_path};
use std::collections::BTreeMap;
use std::path::PathBuf;
use unit::{ShaderUnit, SubpassSources};

/// Reflects a shader unit from already-loaded subpass stage sources
///
/// Classifies the unit's topology, aggregates each subpass's layout and
/// resolves the global attachment order. Any fatal condition aborts this one
/// unit; independent units are unaffected.
pub fn reflect_unit(subpasses: &[SubpassSources], config: &ReflectConfig) -> Result<ShaderUnit, ReflectError> {
    ShaderUnit::from_sources(subpasses, config)
}

/// Reflects a shader unit from its stage source files
///
/// Stage files sharing a name prefix (the file name up to the first `.`) form
/// one subpass; subpasses are processed in sorted prefix order so the result
/// does not depend on the order the paths are listed in. Each stage's
/// bytecode is loaded through the provider, recompiling only when the cached
/// artifact is stale.
pub fn reflect_unit_from_files<C: StageCompiler>(stage_paths: &[PathBuf], provider: &StageSourceProvider<C>, config: &ReflectConfig) -> Result<ShaderUnit, ReflectError> {
    let mut grouped: BTreeMap<String, Vec<&PathBuf>> = BTreeMap::new();
    for path in stage_paths {
        let file_name = path.file_name().and_then(|name| name.to_str()).unwrap_or_default();
        let prefix = file_name.split('.').next().unwrap_or(file_name);
        grouped.entry(prefix.to_string()).or_default().push(path);
    }

    let mut subpasses = Vec::with_capacity(grouped.len());
    for (name, mut paths) in grouped {
        paths.sort();
        let mut stages = Vec::with_capacity(paths.len());
        for path in paths {
            let kind = stage_kind_for_path(path, config)?;
            stages.push(provider.load_stage(path, kind)?);
        }
        subpasses.push(SubpassSources { name, stages });
    }

    reflect_unit(&subpasses, config)
}
