//! Core binding-layout model types
//!
//! These structures form the resolved model handed to a code emitter: shader
//! stages and stage masks, descriptor bindings grouped into sets, push
//! constants, vertex inputs, and framebuffer attachments.

use serde::Serialize;
use std::fmt;
use std::ops::{BitOr, BitOrAssign};

/// A shader pipeline stage
///
/// The ordering (vertex, fragment, compute) is the canonical stage processing
/// order used when merging declarations across the stages of a subpass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StageKind {
    Vertex,
    Fragment,
    Compute,
}

impl StageKind {
    /// Returns the stage-flag bit of this stage
    pub fn flag(self) -> StageMask {
        match self {
            StageKind::Vertex => StageMask::VERTEX,
            StageKind::Fragment => StageMask::FRAGMENT,
            StageKind::Compute => StageMask::COMPUTE,
        }
    }
}

impl fmt::Display for StageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StageKind::Vertex => write!(f, "vertex"),
            StageKind::Fragment => write!(f, "fragment"),
            StageKind::Compute => write!(f, "compute"),
        }
    }
}

/// Union of shader stages referencing a binding
///
/// The bit values match the Vulkan `VK_SHADER_STAGE_*_BIT` constants so the
/// mask can be passed through to generated code unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash, Serialize)]
pub struct StageMask(u32);

impl StageMask {
    pub const NONE: Self = Self(0);
    pub const VERTEX: Self = Self(0x1);
    pub const FRAGMENT: Self = Self(0x10);
    pub const COMPUTE: Self = Self(0x20);

    /// Returns true if every stage in `other` is present in this mask
    pub fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    /// Returns the raw stage-flag bits
    pub fn bits(self) -> u32 {
        self.0
    }
}

impl BitOr for StageMask {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl BitOrAssign for StageMask {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

impl fmt::Display for StageMask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (bit, name) in [(Self::VERTEX, "vertex"), (Self::FRAGMENT, "fragment"), (Self::COMPUTE, "compute")] {
            if self.contains(bit) {
                if !first {
                    write!(f, " | ")?;
                }
                write!(f, "{name}")?;
                first = false;
            }
        }
        if first {
            write!(f, "none")?;
        }
        Ok(())
    }
}

/// Type of a GPU-visible resource slot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DescriptorType {
    Sampler,
    CombinedImageSampler,
    InputAttachment,
    StorageImage,
    UniformBuffer,
    StorageBuffer,
}

impl fmt::Display for DescriptorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sampler => write!(f, "sampler"),
            Self::CombinedImageSampler => write!(f, "combined-image-sampler"),
            Self::InputAttachment => write!(f, "input-attachment"),
            Self::StorageImage => write!(f, "storage-image"),
            Self::UniformBuffer => write!(f, "uniform-buffer"),
            Self::StorageBuffer => write!(f, "storage-buffer"),
        }
    }
}

/// Pixel format of a framebuffer attachment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PixelFormat {
    Gray,
    Rgb,
    Rgba,
}

/// Element format of a vertex input attribute
///
/// Mirrors the 32/64-bit scalar and vector formats a vertex buffer element
/// can hold; each maps 1:1 to a graphics-API vertex format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AttributeFormat {
    Float,
    Vec2,
    Vec3,
    Vec4,
    Int,
    IVec2,
    IVec3,
    IVec4,
    UInt,
    UVec2,
    UVec3,
    UVec4,
    Double,
    DVec2,
    DVec3,
    DVec4,
}

impl AttributeFormat {
    /// Byte size of one element of this format
    pub fn byte_size(self) -> u32 {
        match self {
            Self::Float | Self::Int | Self::UInt => 4,
            Self::Vec2 | Self::IVec2 | Self::UVec2 | Self::Double => 8,
            Self::Vec3 | Self::IVec3 | Self::UVec3 => 12,
            Self::Vec4 | Self::IVec4 | Self::UVec4 | Self::DVec2 => 16,
            Self::DVec3 => 24,
            Self::DVec4 => 32,
        }
    }
}

/// A named GPU-visible resource slot identified by (set, binding)
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DescriptorBinding {
    /// Declared identifier (or type name when the declaration is anonymous)
    pub name: String,
    /// Descriptor set index
    pub set: u32,
    /// Binding index within the set
    pub binding: u32,
    /// Resolved descriptor type
    pub descriptor_type: DescriptorType,
    /// Array element count (1 for scalars)
    pub count: u32,
    /// Union of all stages declaring this (set, binding) identity
    pub stages: StageMask,
}

/// All bindings of one descriptor set, ordered by binding index
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DescriptorSet {
    pub set: u32,
    pub bindings: Vec<DescriptorBinding>,
}

/// A stage-tagged inline data block passed without an allocated resource
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PushConstant {
    pub name: String,
    /// Stage declaring this range
    pub stage: StageKind,
    /// Byte offset within the shared push-constant block
    pub offset: u32,
    /// Byte size inferred from the declared type
    pub size: u32,
}

/// Input rate of a vertex buffer binding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum VertexInputRate {
    PerVertex,
    PerInstance,
}

/// A vertex buffer bound to the pipeline, grouping several attributes
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VertexBufferBinding {
    /// Buffer name, the part of the attribute identifiers before the first `_`
    pub name: String,
    /// Vertex-buffer binding index
    pub binding: u32,
    pub input_rate: VertexInputRate,
}

/// One vertex input attribute of the vertex stage
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VertexInputAttribute {
    /// Full declared identifier
    pub name: String,
    pub location: u32,
    /// Vertex-buffer binding this attribute is read from
    pub binding: u32,
    pub format: AttributeFormat,
    /// Byte offset within the buffer element
    pub offset: u32,
}

/// Reference to an attachment consumed as a subpass input
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InputAttachmentRef {
    pub name: String,
    /// Declared global attachment index
    pub index: u32,
}

/// An attachment produced by the fragment stage of a subpass
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OutputAttachment {
    pub name: String,
    /// Declared type, retained for pixel format inference
    pub type_name: String,
}

/// A framebuffer attachment with its globally resolved position
///
/// The position of an attachment in the resolved list is its global order
/// index; subpass inputs sit at exactly their declared index.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Attachment {
    pub name: String,
    pub format: PixelFormat,
    /// Whether any subpass consumes this attachment as an input
    pub is_subpass_input: bool,
    /// Declared input index, when consumed as a subpass input
    pub input_index: Option<u32>,
}

/// The resolved layout of one graphics subpass
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SubpassLayout {
    /// Descriptor sets ordered by set index, bindings ordered by binding index
    pub descriptor_sets: Vec<DescriptorSet>,
    /// Vertex buffers ordered by binding index
    pub vertex_buffers: Vec<VertexBufferBinding>,
    /// Vertex attributes in declaration order
    pub vertex_inputs: Vec<VertexInputAttribute>,
    /// Attachments consumed as subpass inputs, in declaration order
    pub input_attachments: Vec<InputAttachmentRef>,
    /// Attachments produced by the fragment stage, in declaration order
    pub output_attachments: Vec<OutputAttachment>,
    /// Push constant ranges in stage then declaration order
    pub push_constants: Vec<PushConstant>,
}
