//! Shader unit topology classification and assembly
//!
//! A shader unit is either a single compute stage (descriptor sets, push
//! constants and one bytecode blob) or a graphics pipeline (one or more
//! subpasses with vertex inputs, attachments and per-stage bytecode). The two
//! variants are mutually exclusive; mixing a compute stage with vertex or
//! fragment stages is fatal.

use crate::config::ReflectConfig;
use crate::error::ReflectError;
use crate::layout::{Attachment, DescriptorSet, PushConstant, StageKind, SubpassLayout, aggregate_subpass, resolve_attachments};
use log::debug;
use serde::Serialize;

/// Source text and compiled bytecode of one shader stage
#[derive(Debug, Clone)]
pub struct StageArtifacts {
    pub kind: StageKind,
    pub source: String,
    pub bytecode: Vec<u8>,
}

/// The stage artifacts of one subpass, in stage-file order
#[derive(Debug, Clone)]
pub struct SubpassSources {
    /// Subpass name, the shared stage-file name prefix
    pub name: String,
    pub stages: Vec<StageArtifacts>,
}

/// Compiled bytecode of one stage of a subpass
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StageBytecode {
    pub stage: StageKind,
    pub bytecode: Vec<u8>,
}

/// One resolved graphics subpass: its layout plus per-stage bytecode
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SubpassUnit {
    pub name: String,
    pub layout: SubpassLayout,
    /// Stage bytecode in canonical stage order
    pub stages: Vec<StageBytecode>,
}

/// A resolved graphics shader unit
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GraphicsUnit {
    /// Globally ordered framebuffer attachments
    pub attachments: Vec<Attachment>,
    pub subpasses: Vec<SubpassUnit>,
}

/// A resolved compute shader unit
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComputeUnit {
    pub descriptor_sets: Vec<DescriptorSet>,
    pub push_constants: Vec<PushConstant>,
    pub bytecode: Vec<u8>,
}

/// A fully resolved shader unit, ready for a code emitter
///
/// Constructed once per shader unit, entirely from parsed stage text plus
/// compiled bytecode, and immutable thereafter.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ShaderUnit {
    Graphics(GraphicsUnit),
    Compute(ComputeUnit),
}

impl ShaderUnit {
    /// Classifies and assembles a shader unit from its subpass stage sources
    ///
    /// A unit is compute if and only if it consists of exactly one stage file
    /// of compute kind; any compute stage in another combination is an
    /// invalid topology. Everything else is a graphics unit.
    pub fn from_sources(subpasses: &[SubpassSources], config: &ReflectConfig) -> Result<Self, ReflectError> {
        if subpasses.iter().all(|subpass| subpass.stages.is_empty()) {
            return Err(ReflectError::InvalidTopology {
                detail: "shader unit has no stage files".to_string(),
            });
        }

        let is_single_compute = subpasses.len() == 1 && subpasses[0].stages.len() == 1 && subpasses[0].stages[0].kind == StageKind::Compute;
        if !is_single_compute {
            if let Some(subpass) = subpasses.iter().find(|subpass| subpass.stages.iter().any(|stage| stage.kind == StageKind::Compute)) {
                return Err(ReflectError::InvalidTopology {
                    detail: format!("subpass '{}' mixes a compute stage with other stage files", subpass.name),
                });
            }
        }

        if is_single_compute {
            let stage = &subpasses[0].stages[0];
            let layout = aggregate_subpass(&[(stage.kind, stage.source.as_str())], config)?;
            debug!("classified shader unit '{}' as compute", subpasses[0].name);
            Ok(ShaderUnit::Compute(ComputeUnit {
                descriptor_sets: layout.descriptor_sets,
                push_constants: layout.push_constants,
                bytecode: stage.bytecode.clone(),
            }))
        } else {
            let mut layouts = Vec::with_capacity(subpasses.len());
            for subpass in subpasses {
                let stages: Vec<(StageKind, &str)> = subpass.stages.iter().map(|stage| (stage.kind, stage.source.as_str())).collect();
                layouts.push(aggregate_subpass(&stages, config)?);
            }
            let attachments = resolve_attachments(&layouts)?;
            debug!("classified shader unit as graphics with {} subpasses and {} attachments", subpasses.len(), attachments.len());

            let subpasses = subpasses
                .iter()
                .zip(layouts)
                .map(|(subpass, layout)| {
                    let mut stages: Vec<StageBytecode> = subpass
                        .stages
                        .iter()
                        .map(|stage| StageBytecode {
                            stage: stage.kind,
                            bytecode: stage.bytecode.clone(),
                        })
                        .collect();
                    stages.sort_by_key(|stage| stage.stage);
                    SubpassUnit {
                        name: subpass.name.clone(),
                        layout,
                        stages,
                    }
                })
                .collect();

            Ok(ShaderUnit::Graphics(GraphicsUnit { attachments, subpasses }))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn artifacts(kind: StageKind, source: &str) -> StageArtifacts {
        StageArtifacts {
            kind,
            source: source.to_string(),
            bytecode: vec![0x03, 0x02, 0x23, 0x07],
        }
    }

    #[test]
    fn test_single_compute_stage_is_compute_unit() {
        let subpasses = [SubpassSources {
            name: "blur".to_string(),
            stages: vec![artifacts(StageKind::Compute, "layout(binding=0) uniform writeonly image2D target;\n")],
        }];
        let unit = ShaderUnit::from_sources(&subpasses, &ReflectConfig::default()).unwrap();
        match unit {
            ShaderUnit::Compute(compute) => {
                assert_eq!(compute.descriptor_sets.len(), 1);
                assert_eq!(compute.bytecode, vec![0x03, 0x02, 0x23, 0x07]);
            }
            ShaderUnit::Graphics(_) => panic!("expected compute unit"),
        }
    }

    #[test]
    fn test_vertex_fragment_pair_is_single_subpass_graphics() {
        let subpasses = [SubpassSources {
            name: "draw".to_string(),
            stages: vec![
                artifacts(StageKind::Vertex, "layout(location=0) in vec3 vertex_position;\n"),
                artifacts(StageKind::Fragment, "layout(location=0) out vec4 color;\n"),
            ],
        }];
        let unit = ShaderUnit::from_sources(&subpasses, &ReflectConfig::default()).unwrap();
        match unit {
            ShaderUnit::Graphics(graphics) => {
                assert_eq!(graphics.subpasses.len(), 1);
                assert_eq!(graphics.attachments.len(), 1);
                assert_eq!(graphics.attachments[0].name, "color");
            }
            ShaderUnit::Compute(_) => panic!("expected graphics unit"),
        }
    }

    #[test]
    fn test_mixed_compute_and_graphics_is_fatal() {
        let subpasses = [SubpassSources {
            name: "draw".to_string(),
            stages: vec![artifacts(StageKind::Vertex, ""), artifacts(StageKind::Compute, "")],
        }];
        let err = ShaderUnit::from_sources(&subpasses, &ReflectConfig::default()).unwrap_err();
        assert!(matches!(err, ReflectError::InvalidTopology { .. }));
    }

    #[test]
    fn test_empty_unit_is_fatal() {
        let err = ShaderUnit::from_sources(&[], &ReflectConfig::default()).unwrap_err();
        assert!(matches!(err, ReflectError::InvalidTopology { .. }));
    }

    #[test]
    fn test_multi_subpass_attachment_flow() {
        let gbuffer_frag = concat!(
            "layout(location=0) out vec4 albedo;\n",
            "layout(location=1) out vec3 normal;\n",
        );
        let lighting_frag = concat!(
            "layout(input_attachment_index=0, binding=0) uniform subpassInput albedo;\n",
            "layout(input_attachment_index=1, binding=1) uniform subpassInput normal;\n",
            "layout(location=0) out vec4 lit;\n",
        );
        let subpasses = [
            SubpassSources {
                name: "gbuffer".to_string(),
                stages: vec![artifacts(StageKind::Fragment, gbuffer_frag)],
            },
            SubpassSources {
                name: "lighting".to_string(),
                stages: vec![artifacts(StageKind::Fragment, lighting_frag)],
            },
        ];
        let unit = ShaderUnit::from_sources(&subpasses, &ReflectConfig::default()).unwrap();
        let ShaderUnit::Graphics(graphics) = unit else { panic!("expected graphics unit") };
        let names: Vec<_> = graphics.attachments.iter().map(|a| a.name.as_str()).collect();
        assert_eq!(names, ["albedo", "normal", "lit"]);
        assert_eq!(graphics.subpasses[1].layout.input_attachments.len(), 2);
        assert_eq!(graphics.subpasses[1].layout.output_attachments.len(), 1);
    }
}
