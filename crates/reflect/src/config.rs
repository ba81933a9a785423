//! Reflection engine configuration
//!
//! Everything the legacy generator kept as process-wide constants (compiler
//! executable name, stage extension table, descriptor-type lookup table) is
//! passed explicitly here, so callers can extend the tables or tighten the
//! failure policies without touching the engine.

use crate::layout::{AttributeFormat, DescriptorType, StageKind};
use std::collections::HashMap;

/// Handling of declarations that do not match the qualifier grammar
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UnrecognizedPolicy {
    /// Skip the declaration with a warning (legacy behavior)
    #[default]
    Tolerant,
    /// Fail reflection of the unit with an `UnrecognizedDeclaration` error
    Strict,
}

/// Handling of duplicate (set, binding) identities with conflicting attributes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConflictPolicy {
    /// Fail reflection of the unit with a `BindingConflict` error
    #[default]
    Fail,
    /// Keep the first-seen type and count silently (legacy behavior)
    FirstWins,
}

/// Configuration of the reflection engine
#[derive(Debug, Clone)]
pub struct ReflectConfig {
    /// Maps uniform-storage type names to descriptor types; types not listed
    /// here resolve to a uniform buffer
    pub descriptor_types: HashMap<String, DescriptorType>,
    /// Type name marking a descriptor as a subpass input (`subpassInput`)
    pub subpass_input_type: String,
    /// Byte sizes of types usable as push constants
    pub type_sizes: HashMap<String, u32>,
    /// Element formats of types usable as vertex input attributes
    pub attribute_formats: HashMap<String, AttributeFormat>,
    /// Maps stage source file extensions to stage kinds
    pub stage_extensions: HashMap<String, StageKind>,
    /// Executable invoked to compile a stage source to bytecode
    pub compiler_program: String,
    /// Extension appended to a stage source path to name its bytecode artifact
    pub bytecode_extension: String,
    pub unrecognized: UnrecognizedPolicy,
    pub binding_conflicts: ConflictPolicy,
}

impl Default for ReflectConfig {
    fn default() -> Self {
        let descriptor_types = HashMap::from([
            ("sampler".to_string(), DescriptorType::Sampler),
            ("sampler2D".to_string(), DescriptorType::CombinedImageSampler),
            ("subpassInput".to_string(), DescriptorType::InputAttachment),
            ("image2D".to_string(), DescriptorType::StorageImage),
        ]);

        let attribute_formats = HashMap::from([
            ("float".to_string(), AttributeFormat::Float),
            ("vec2".to_string(), AttributeFormat::Vec2),
            ("vec3".to_string(), AttributeFormat::Vec3),
            ("vec4".to_string(), AttributeFormat::Vec4),
            ("int".to_string(), AttributeFormat::Int),
            ("ivec2".to_string(), AttributeFormat::IVec2),
            ("ivec3".to_string(), AttributeFormat::IVec3),
            ("ivec4".to_string(), AttributeFormat::IVec4),
            ("uint".to_string(), AttributeFormat::UInt),
            ("uvec2".to_string(), AttributeFormat::UVec2),
            ("uvec3".to_string(), AttributeFormat::UVec3),
            ("uvec4".to_string(), AttributeFormat::UVec4),
            ("double".to_string(), AttributeFormat::Double),
            ("dvec2".to_string(), AttributeFormat::DVec2),
            ("dvec3".to_string(), AttributeFormat::DVec3),
            ("dvec4".to_string(), AttributeFormat::DVec4),
        ]);

        // Scalar, vector and square matrix types, tightly packed
        let mut type_sizes: HashMap<String, u32> = attribute_formats.iter().map(|(name, format)| (name.clone(), format.byte_size())).collect();
        type_sizes.insert("bool".to_string(), 4);
        type_sizes.insert("mat2".to_string(), 16);
        type_sizes.insert("mat3".to_string(), 36);
        type_sizes.insert("mat4".to_string(), 64);

        let stage_extensions = HashMap::from([
            ("vert".to_string(), StageKind::Vertex),
            ("frag".to_string(), StageKind::Fragment),
            ("comp".to_string(), StageKind::Compute),
        ]);

        Self {
            descriptor_types,
            subpass_input_type: "subpassInput".to_string(),
            type_sizes,
            attribute_formats,
            stage_extensions,
            compiler_program: "glslc".to_string(),
            bytecode_extension: "spv".to_string(),
            unrecognized: UnrecognizedPolicy::default(),
            binding_conflicts: ConflictPolicy::default(),
        }
    }
}
