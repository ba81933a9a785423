//! Per-subpass layout aggregation
//!
//! Classifies the qualifier records of every stage of one subpass into
//! descriptor bindings, push constants, vertex inputs and fragment
//! input/output attachments, and merges duplicate descriptor declarations
//! across stages into one binding with a combined stage mask.

use super::types::{
    DescriptorBinding, DescriptorSet, DescriptorType, InputAttachmentRef, OutputAttachment, PushConstant, StageKind, SubpassLayout, VertexBufferBinding,
    VertexInputAttribute, VertexInputRate,
};
use crate::config::{ConflictPolicy, ReflectConfig};
use crate::error::ReflectError;
use crate::qualifiers::{Qualifier, QualifierKind, StorageClass, parse_qualifiers};
use log::{debug, warn};
use std::collections::BTreeMap;
use std::collections::btree_map::Entry;

/// Aggregates the stage sources of one subpass into its resolved layout
///
/// Stages are processed in canonical stage order (vertex, fragment, compute)
/// so the merged result is independent of the order the caller lists them in.
pub fn aggregate_subpass(stages: &[(StageKind, &str)], config: &ReflectConfig) -> Result<SubpassLayout, ReflectError> {
    let mut ordered: Vec<(StageKind, &str)> = stages.to_vec();
    ordered.sort_by_key(|(kind, _)| *kind);

    let mut descriptors: BTreeMap<(u32, u32), DescriptorBinding> = BTreeMap::new();
    let mut vertex_inputs = Vec::new();
    let mut input_attachments = Vec::new();
    let mut output_attachments = Vec::new();
    let mut push_constants = Vec::new();

    for (stage, source) in ordered {
        for qualifier in parse_qualifiers(source, config.unrecognized)? {
            if qualifier.kind == QualifierKind::PushConstant {
                push_constants.push(classify_push_constant(&qualifier, stage, config)?);
            } else if let Some(binding) = qualifier.binding {
                if matches!(qualifier.storage, StorageClass::Uniform | StorageClass::Buffer) {
                    let descriptor = classify_descriptor(&qualifier, binding, stage, config);
                    merge_descriptor(&mut descriptors, descriptor, config.binding_conflicts)?;

                    if qualifier.storage == StorageClass::Uniform && qualifier.type_name == config.subpass_input_type {
                        if stage != StageKind::Fragment {
                            return Err(ReflectError::SubpassInputOutsideFragment { name: qualifier.name.clone(), stage });
                        }
                        let index = qualifier
                            .input_attachment_index
                            .ok_or_else(|| ReflectError::MissingInputAttachmentIndex { name: qualifier.name.clone() })?;
                        input_attachments.push(InputAttachmentRef { name: qualifier.name.clone(), index });
                    }
                }
            }

            if stage == StageKind::Fragment && qualifier.storage == StorageClass::Out {
                output_attachments.push(OutputAttachment {
                    name: qualifier.name.clone(),
                    type_name: qualifier.type_name.clone(),
                });
            }

            if stage == StageKind::Vertex && qualifier.storage == StorageClass::In {
                vertex_inputs.push(classify_vertex_input(&qualifier, config)?);
            }
        }
    }

    let vertex_buffers = group_vertex_buffers(&vertex_inputs);
    let descriptor_sets = group_descriptor_sets(descriptors);
    debug!(
        "aggregated subpass layout: {} descriptor sets, {} vertex inputs, {} outputs, {} push constants",
        descriptor_sets.len(),
        vertex_inputs.len(),
        output_attachments.len(),
        push_constants.len()
    );

    Ok(SubpassLayout {
        descriptor_sets,
        vertex_buffers,
        vertex_inputs,
        input_attachments,
        output_attachments,
        push_constants,
    })
}

fn classify_push_constant(qualifier: &Qualifier, stage: StageKind, config: &ReflectConfig) -> Result<PushConstant, ReflectError> {
    let size = *config.type_sizes.get(&qualifier.type_name).ok_or_else(|| ReflectError::UnknownTypeSize {
        name: qualifier.name.clone(),
        type_name: qualifier.type_name.clone(),
    })?;
    Ok(PushConstant {
        name: qualifier.name.clone(),
        stage,
        offset: qualifier.offset,
        size,
    })
}

fn classify_descriptor(qualifier: &Qualifier, binding: u32, stage: StageKind, config: &ReflectConfig) -> DescriptorBinding {
    // Buffer storage is always a storage buffer, irrespective of the declared
    // type; uniform storage resolves through the descriptor-type table
    let descriptor_type = match qualifier.storage {
        StorageClass::Buffer => DescriptorType::StorageBuffer,
        _ => config.descriptor_types.get(&qualifier.type_name).copied().unwrap_or(DescriptorType::UniformBuffer),
    };
    DescriptorBinding {
        name: qualifier.name.clone(),
        set: qualifier.set,
        binding,
        descriptor_type,
        count: qualifier.count,
        stages: stage.flag(),
    }
}

fn classify_vertex_input(qualifier: &Qualifier, config: &ReflectConfig) -> Result<VertexInputAttribute, ReflectError> {
    let location = qualifier.location.ok_or_else(|| ReflectError::MissingVertexLocation { name: qualifier.name.clone() })?;
    let format = *config.attribute_formats.get(&qualifier.type_name).ok_or_else(|| ReflectError::UnknownAttributeFormat {
        name: qualifier.name.clone(),
        type_name: qualifier.type_name.clone(),
    })?;
    Ok(VertexInputAttribute {
        name: qualifier.name.clone(),
        location,
        binding: qualifier.binding.unwrap_or(0),
        format,
        offset: qualifier.offset,
    })
}

/// Merges a descriptor declaration into the (set, binding) keyed map
///
/// The stage mask of an existing identity is always unioned; conflicting type
/// or count either fails fast or keeps the first-seen values, per policy.
fn merge_descriptor(descriptors: &mut BTreeMap<(u32, u32), DescriptorBinding>, descriptor: DescriptorBinding, policy: ConflictPolicy) -> Result<(), ReflectError> {
    match descriptors.entry((descriptor.set, descriptor.binding)) {
        Entry::Vacant(entry) => {
            entry.insert(descriptor);
        }
        Entry::Occupied(mut entry) => {
            let existing = entry.get_mut();
            if existing.descriptor_type != descriptor.descriptor_type {
                conflict(existing, &descriptor, "type", existing.descriptor_type.to_string(), descriptor.descriptor_type.to_string(), policy)?;
            }
            if existing.count != descriptor.count {
                conflict(existing, &descriptor, "count", existing.count.to_string(), descriptor.count.to_string(), policy)?;
            }
            if existing.name != descriptor.name {
                debug!(
                    "descriptor (set={}, binding={}) named '{}' and '{}'; keeping '{}'",
                    existing.set, existing.binding, existing.name, descriptor.name, existing.name
                );
            }
            existing.stages |= descriptor.stages;
        }
    }
    Ok(())
}

fn conflict(existing: &DescriptorBinding, incoming: &DescriptorBinding, what: &'static str, first: String, second: String, policy: ConflictPolicy) -> Result<(), ReflectError> {
    match policy {
        ConflictPolicy::Fail => Err(ReflectError::BindingConflict {
            set: existing.set,
            binding: existing.binding,
            what,
            first,
            second,
        }),
        ConflictPolicy::FirstWins => {
            warn!(
                "descriptor (set={}, binding={}) declared with conflicting {what} ({first} vs {second}); keeping '{}'",
                incoming.set, incoming.binding, first
            );
            Ok(())
        }
    }
}

/// Derives the ordered vertex-buffer bindings from the vertex inputs
///
/// The buffer an attribute belongs to is named by its identifier's prefix
/// before the first `_`; the buffer named `vertex` advances per vertex, any
/// other per instance.
fn group_vertex_buffers(vertex_inputs: &[VertexInputAttribute]) -> Vec<VertexBufferBinding> {
    let mut buffers: BTreeMap<u32, String> = BTreeMap::new();
    for input in vertex_inputs {
        let buffer_name = input.name.split('_').next().unwrap_or(&input.name);
        buffers.insert(input.binding, buffer_name.to_string());
    }
    buffers
        .into_iter()
        .map(|(binding, name)| {
            let input_rate = if name == "vertex" { VertexInputRate::PerVertex } else { VertexInputRate::PerInstance };
            VertexBufferBinding { name, binding, input_rate }
        })
        .collect()
}

/// Groups the merged descriptor map into sets ordered by set index
///
/// The map is keyed (set, binding), so iteration yields each set's bindings
/// already sorted by binding index.
fn group_descriptor_sets(descriptors: BTreeMap<(u32, u32), DescriptorBinding>) -> Vec<DescriptorSet> {
    let mut sets: Vec<DescriptorSet> = Vec::new();
    for ((set, _), binding) in descriptors {
        match sets.last_mut() {
            Some(last) if last.set == set => last.bindings.push(binding),
            _ => sets.push(DescriptorSet { set, bindings: vec![binding] }),
        }
    }
    sets
}
