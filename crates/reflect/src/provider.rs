//! Stage source loading and bytecode caching
//!
//! For each stage source file, the provider returns its source text together
//! with the compiled bytecode, invoking the external compiler only when the
//! bytecode artifact is missing or older than the source. Non-empty compiler
//! diagnostics are fatal for the stage; shader compilation errors are
//! deterministic given the same source, so there is no retry.

use crate::config::ReflectConfig;
use crate::error::ReflectError;
use crate::layout::StageKind;
use crate::unit::StageArtifacts;
use log::{debug, info};
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::SystemTime;

/// Result of one external compiler invocation
#[derive(Debug, Clone)]
pub struct CompilerOutput {
    /// Compiled bytecode; empty when diagnostics were produced
    pub bytecode: Vec<u8>,
    /// Diagnostic text; non-empty means the compilation failed
    pub diagnostics: String,
}

/// External shader-to-bytecode compiler interface
///
/// Implementations compile `source` and write the bytecode artifact to
/// `output` so later runs can reuse it without recompiling.
pub trait StageCompiler {
    fn compile(&self, source: &Path, output: &Path) -> std::io::Result<CompilerOutput>;
}

/// Compiler invoking an external executable (`glslc` by default)
///
/// The executable is expected to take the source path and `-o <output>` and
/// report errors on stderr.
#[derive(Debug, Clone)]
pub struct GlslcCompiler {
    program: String,
}

impl GlslcCompiler {
    pub fn new(program: impl Into<String>) -> Self {
        Self { program: program.into() }
    }

    /// Builds the compiler from the configured executable name
    pub fn from_config(config: &ReflectConfig) -> Self {
        Self::new(config.compiler_program.clone())
    }
}

impl StageCompiler for GlslcCompiler {
    fn compile(&self, source: &Path, output: &Path) -> std::io::Result<CompilerOutput> {
        let result = Command::new(&self.program).arg(source).arg("-o").arg(output).output()?;
        let diagnostics = String::from_utf8_lossy(&result.stderr).into_owned();
        if !diagnostics.trim().is_empty() {
            return Ok(CompilerOutput { bytecode: Vec::new(), diagnostics });
        }
        let bytecode = fs::read(output)?;
        Ok(CompilerOutput { bytecode, diagnostics })
    }
}

/// Loads per-stage source text and bytecode, recompiling only when stale
#[derive(Debug)]
pub struct StageSourceProvider<C> {
    compiler: C,
    bytecode_extension: String,
}

impl<C: StageCompiler> StageSourceProvider<C> {
    pub fn new(compiler: C, config: &ReflectConfig) -> Self {
        Self {
            compiler,
            bytecode_extension: config.bytecode_extension.clone(),
        }
    }

    /// Returns the source text and bytecode of one stage source file
    ///
    /// The bytecode artifact lives next to the source, with the artifact
    /// extension appended (`draw.vert` -> `draw.vert.spv`). It is regenerated
    /// when absent or older than the source and reused otherwise.
    pub fn load_stage(&self, source_path: &Path, kind: StageKind) -> Result<StageArtifacts, ReflectError> {
        let artifact_path = self.artifact_path(source_path);
        let source = fs::read_to_string(source_path)?;

        let bytecode = if is_stale(source_path, &artifact_path)? {
            let output = self.compiler.compile(source_path, &artifact_path)?;
            if !output.diagnostics.trim().is_empty() {
                return Err(ReflectError::Compile {
                    path: source_path.to_path_buf(),
                    diagnostics: output.diagnostics,
                });
            }
            info!("compiled {}", artifact_path.display());
            output.bytecode
        } else {
            debug!("reusing cached bytecode {}", artifact_path.display());
            fs::read(&artifact_path)?
        };

        Ok(StageArtifacts { kind, source, bytecode })
    }

    /// Path of the bytecode artifact for a stage source
    pub fn artifact_path(&self, source_path: &Path) -> PathBuf {
        let mut name = OsString::from(source_path.as_os_str());
        name.push(".");
        name.push(&self.bytecode_extension);
        PathBuf::from(name)
    }
}

/// Returns true when the artifact is absent or older than its source
fn is_stale(source: &Path, artifact: &Path) -> Result<bool, ReflectError> {
    let Ok(artifact_meta) = fs::metadata(artifact) else {
        return Ok(true);
    };
    let source_mtime = fs::metadata(source)?.modified()?;
    let artifact_mtime = artifact_meta.modified().unwrap_or(SystemTime::UNIX_EPOCH);
    Ok(artifact_mtime < source_mtime)
}

/// Maps a stage source path to its stage kind via the extension table
pub fn stage_kind_for_path(path: &Path, config: &ReflectConfig) -> Result<StageKind, ReflectError> {
    let extension = path.extension().and_then(|extension| extension.to_str()).unwrap_or_default();
    config
        .stage_extensions
        .get(extension)
        .copied()
        .ok_or_else(|| ReflectError::UnknownStageExtension { extension: extension.to_string() })
}
