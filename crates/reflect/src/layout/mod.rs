//! Binding-layout model, aggregation and attachment ordering

mod aggregate;
mod attachments;
mod types;

pub use aggregate::aggregate_subpass;
pub use attachments::resolve_attachments;
pub use types::{
    Attachment, AttributeFormat, DescriptorBinding, DescriptorSet, DescriptorType, InputAttachmentRef, OutputAttachment, PixelFormat, PushConstant, StageKind,
    StageMask, SubpassLayout, VertexBufferBinding, VertexInputAttribute, VertexInputRate,
};
