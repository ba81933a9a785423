//! Error types for shader unit reflection

use crate::layout::StageKind;
use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while reflecting a shader unit
///
/// Any of these aborts reflection of the one shader unit it occurred in;
/// other units are unaffected.
#[derive(Debug, Error)]
pub enum ReflectError {
    /// The external shader compiler produced diagnostics for a stage source
    #[error("compilation of {path} failed:\n{diagnostics}")]
    Compile {
        /// Path of the stage source that failed to compile
        path: PathBuf,
        /// Compiler diagnostic text, verbatim
        diagnostics: String,
    },

    /// A subpass-input declaration appeared outside the fragment stage
    #[error("subpass input '{name}' declared in the {stage} stage; subpass inputs are only valid in the fragment stage")]
    SubpassInputOutsideFragment { name: String, stage: StageKind },

    /// A subpass-input declaration carries no input_attachment_index qualifier
    #[error("subpass input '{name}' is missing an input_attachment_index qualifier")]
    MissingInputAttachmentIndex { name: String },

    /// An attachment is consumed as a subpass input but never produced as an output
    #[error("'{name}' is referenced as a subpass input attachment but never declared as an output attachment")]
    AttachmentIntegrity { name: String },

    /// The same (set, binding) identity was declared with conflicting attributes
    #[error("descriptor (set={set}, binding={binding}) declared with conflicting {what}: {first} vs {second}")]
    BindingConflict {
        set: u32,
        binding: u32,
        what: &'static str,
        first: String,
        second: String,
    },

    /// The unit's stage files form no valid compute or graphics topology
    #[error("invalid shader unit topology: {detail}")]
    InvalidTopology { detail: String },

    /// A layout declaration did not match the supported qualifier grammar
    ///
    /// Only raised under [`UnrecognizedPolicy::Strict`](crate::config::UnrecognizedPolicy);
    /// the tolerant policy skips the declaration with a warning instead.
    #[error("unrecognized layout declaration: {declaration}")]
    UnrecognizedDeclaration { declaration: String },

    /// A push constant declared a type with no known byte size
    #[error("cannot infer byte size of push constant '{name}': unknown type '{type_name}'")]
    UnknownTypeSize { name: String, type_name: String },

    /// An output attachment declared a type with no known pixel format
    #[error("cannot infer pixel format of attachment '{name}' from type '{type_name}'")]
    UnsupportedAttachmentFormat { name: String, type_name: String },

    /// A vertex input declared a type with no known attribute format
    #[error("cannot infer attribute format of vertex input '{name}' from type '{type_name}'")]
    UnknownAttributeFormat { name: String, type_name: String },

    /// A vertex input carries no location qualifier
    #[error("vertex input '{name}' is missing a location qualifier")]
    MissingVertexLocation { name: String },

    /// A stage file extension maps to no known shader stage
    #[error("unrecognized stage file extension '{extension}'")]
    UnknownStageExtension { extension: String },

    /// Filesystem or process error while loading sources or bytecode
    #[error(transparent)]
    Io(#[from] std::io::Error),
}
