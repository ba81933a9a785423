//! Global attachment ordering
//!
//! Computes the single deterministic ordering of every framebuffer attachment
//! referenced anywhere in a graphics shader unit. Attachments consumed as
//! subpass inputs carry an explicit global index that must be honored exactly;
//! attachments that are only ever produced are ordered by first appearance
//! (earliest subpass, then earliest declaration within it).

use super::types::{Attachment, PixelFormat, SubpassLayout};
use crate::error::ReflectError;
use std::collections::HashMap;

/// Resolves the global attachment order across all subpasses of a unit
///
/// Every name in the resolved list must have an output declaration somewhere
/// in the unit; a name referenced only as a subpass input raises
/// [`ReflectError::AttachmentIntegrity`] naming that attachment.
pub fn resolve_attachments(subpasses: &[SubpassLayout]) -> Result<Vec<Attachment>, ReflectError> {
    // Declared global index per subpass-input name; a name consumed by
    // several subpasses keeps the last declared index
    let mut input_indices: HashMap<String, u32> = HashMap::new();
    for subpass in subpasses {
        for input in &subpass.input_attachments {
            input_indices.insert(input.name.clone(), input.index);
        }
    }

    // First output declaration per name: appearance position and type
    let mut first_output: HashMap<&str, ((usize, usize), &str)> = HashMap::new();
    for (subpass_index, subpass) in subpasses.iter().enumerate() {
        for (output_index, output) in subpass.output_attachments.iter().enumerate() {
            first_output.entry(output.name.as_str()).or_insert(((subpass_index, output_index), output.type_name.as_str()));
        }
    }

    // Appearance-ordered names of attachments never consumed as inputs
    let mut appearance: Vec<(&str, (usize, usize))> = first_output
        .iter()
        .filter(|(name, _)| !input_indices.contains_key(**name))
        .map(|(name, (position, _))| (*name, *position))
        .collect();
    appearance.sort_by_key(|(_, position)| *position);
    let mut ordered: Vec<String> = appearance.into_iter().map(|(name, _)| name.to_string()).collect();

    // Insert each subpass input at its declared index, ascending, shifting
    // later entries right
    let mut by_index: Vec<(&String, u32)> = input_indices.iter().map(|(name, index)| (name, *index)).collect();
    by_index.sort_by(|a, b| a.1.cmp(&b.1).then_with(|| a.0.cmp(b.0)));
    for (name, index) in by_index {
        let at = (index as usize).min(ordered.len());
        ordered.insert(at, name.clone());
    }

    ordered
        .into_iter()
        .map(|name| {
            let (_, type_name) = first_output.get(name.as_str()).ok_or_else(|| ReflectError::AttachmentIntegrity { name: name.clone() })?;
            let format = pixel_format(&name, type_name)?;
            let input_index = input_indices.get(&name).copied();
            Ok(Attachment {
                name,
                format,
                is_subpass_input: input_index.is_some(),
                input_index,
            })
        })
        .collect()
}

/// Derives an attachment's pixel format from its output declaration's type
///
/// The trailing digit of the type name selects the format (`vec4` carries 4
/// channels and so on); a type without a trailing digit defaults to RGBA.
fn pixel_format(name: &str, type_name: &str) -> Result<PixelFormat, ReflectError> {
    match type_name.chars().last() {
        Some('1') => Ok(PixelFormat::Gray),
        Some('3') => Ok(PixelFormat::Rgb),
        Some('4') => Ok(PixelFormat::Rgba),
        Some(c) if c.is_ascii_digit() => Err(ReflectError::UnsupportedAttachmentFormat {
            name: name.to_string(),
            type_name: type_name.to_string(),
        }),
        _ => Ok(PixelFormat::Rgba),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::{InputAttachmentRef, OutputAttachment};

    fn subpass(inputs: &[(&str, u32)], outputs: &[(&str, &str)]) -> SubpassLayout {
        SubpassLayout {
            descriptor_sets: Vec::new(),
            vertex_buffers: Vec::new(),
            vertex_inputs: Vec::new(),
            input_attachments: inputs
                .iter()
                .map(|(name, index)| InputAttachmentRef {
                    name: name.to_string(),
                    index: *index,
                })
                .collect(),
            output_attachments: outputs
                .iter()
                .map(|(name, type_name)| OutputAttachment {
                    name: name.to_string(),
                    type_name: type_name.to_string(),
                })
                .collect(),
            push_constants: Vec::new(),
        }
    }

    fn names(attachments: &[Attachment]) -> Vec<&str> {
        attachments.iter().map(|a| a.name.as_str()).collect()
    }

    #[test]
    fn test_outputs_keep_appearance_order() {
        let subpasses = [subpass(&[], &[("a", "vec4"), ("b", "vec4"), ("c", "vec4")])];
        let attachments = resolve_attachments(&subpasses).unwrap();
        assert_eq!(names(&attachments), ["a", "b", "c"]);
    }

    #[test]
    fn test_subpass_input_forces_declared_index() {
        let subpasses = [
            subpass(&[], &[("a", "vec4"), ("b", "vec4"), ("c", "vec4")]),
            subpass(&[("b", 0)], &[("final", "vec4")]),
        ];
        let attachments = resolve_attachments(&subpasses).unwrap();
        assert_eq!(names(&attachments), ["b", "a", "c", "final"]);
        assert!(attachments[0].is_subpass_input);
        assert_eq!(attachments[0].input_index, Some(0));
        assert!(!attachments[1].is_subpass_input);
    }

    #[test]
    fn test_multiple_inputs_inserted_ascending() {
        let subpasses = [
            subpass(&[], &[("albedo", "vec4"), ("normal", "vec3"), ("depth", "vec1")]),
            subpass(&[("albedo", 0), ("normal", 1)], &[("lit", "vec4")]),
        ];
        let attachments = resolve_attachments(&subpasses).unwrap();
        assert_eq!(names(&attachments), ["albedo", "normal", "depth", "lit"]);
    }

    #[test]
    fn test_input_index_beyond_tail() {
        let subpasses = [subpass(&[], &[("a", "vec4")]), subpass(&[("a", 5)], &[("b", "vec4")])];
        let attachments = resolve_attachments(&subpasses).unwrap();
        // Clamped to the end of the list, matching insertion semantics
        assert_eq!(names(&attachments), ["b", "a"]);
    }

    #[test]
    fn test_missing_output_is_integrity_error() {
        let subpasses = [subpass(&[("ghost", 0)], &[("a", "vec4")])];
        let err = resolve_attachments(&subpasses).unwrap_err();
        match err {
            ReflectError::AttachmentIntegrity { name } => assert_eq!(name, "ghost"),
            other => panic!("expected AttachmentIntegrity, got {other:?}"),
        }
    }

    #[test]
    fn test_format_inference() {
        let subpasses = [subpass(&[], &[("gray", "vec1"), ("rgb", "vec3"), ("rgba", "vec4"), ("plain", "customType")])];
        let attachments = resolve_attachments(&subpasses).unwrap();
        assert_eq!(attachments[0].format, PixelFormat::Gray);
        assert_eq!(attachments[1].format, PixelFormat::Rgb);
        assert_eq!(attachments[2].format, PixelFormat::Rgba);
        assert_eq!(attachments[3].format, PixelFormat::Rgba);
    }

    #[test]
    fn test_two_channel_format_is_fatal() {
        let subpasses = [subpass(&[], &[("uv", "vec2")])];
        let err = resolve_attachments(&subpasses).unwrap_err();
        assert!(matches!(err, ReflectError::UnsupportedAttachmentFormat { .. }));
    }

    #[test]
    fn test_format_derived_from_output_declaration_only() {
        // The consuming subpass references the attachment as an input; format
        // still comes from the producing declaration
        let subpasses = [subpass(&[], &[("normal", "vec3")]), subpass(&[("normal", 0)], &[("lit", "vec4")])];
        let attachments = resolve_attachments(&subpasses).unwrap();
        assert_eq!(attachments[0].name, "normal");
        assert_eq!(attachments[0].format, PixelFormat::Rgb);
    }
}
