//! Layout qualifier parsing
//!
//! Scans shader stage source text for `layout(...)` interface declarations and
//! extracts each into a typed [`Qualifier`] record. Only the qualifier grammar
//! is interpreted; shader code proper is never parsed.
//!
//! Recognized grammar, informally:
//!
//! ```text
//! layout(<terms>) <storage> [readonly|writeonly] <type> [{ ... }] [<name>][[<count>]];
//! ```
//!
//! where `<terms>` is a comma-separated, order-independent mixture of
//! `push_constant`, `input_attachment_index=N`, `set=N`, `binding=N`,
//! `offset=N`, `location=N`, `std140` and `std430`. A brace-delimited struct
//! body after the type is permitted and its contents are not inspected.

use crate::config::UnrecognizedPolicy;
use crate::error::ReflectError;
use log::warn;
use regex::Regex;

/// Storage class of a layout declaration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageClass {
    In,
    Out,
    Uniform,
    Buffer,
}

/// Memory access modifier of a layout declaration
///
/// Recorded for completeness; it does not influence the resolved layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MemoryAccess {
    #[default]
    None,
    ReadOnly,
    WriteOnly,
}

/// Classification of a layout declaration by its qualifier terms
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QualifierKind {
    /// Carries the `push_constant` term
    PushConstant,
    /// Carries an `input_attachment_index=N` term
    InputAttachment,
    /// Carries a `binding=N` term
    Binding,
    /// None of the above (e.g. plain `in`/`out` variables)
    Plain,
}

/// One parsed `layout(...)` declaration
#[derive(Debug, Clone, PartialEq)]
pub struct Qualifier {
    pub kind: QualifierKind,
    /// Descriptor set index, 0 when unspecified
    pub set: u32,
    pub binding: Option<u32>,
    /// Byte offset, 0 when unspecified
    pub offset: u32,
    pub location: Option<u32>,
    pub input_attachment_index: Option<u32>,
    pub storage: StorageClass,
    pub access: MemoryAccess,
    /// Declared type name (struct bodies are not inspected)
    pub type_name: String,
    /// Declared identifier, falling back to the type name when anonymous
    pub name: String,
    /// Array element count, 1 for scalars and empty brackets
    pub count: u32,
}

/// Qualifier terms collected from inside the parentheses
#[derive(Debug, Default)]
struct Terms {
    push_constant: bool,
    set: Option<u32>,
    binding: Option<u32>,
    offset: Option<u32>,
    location: Option<u32>,
    input_attachment_index: Option<u32>,
}

impl Terms {
    /// Parses the comma-separated term list, returning None on any term
    /// outside the supported grammar
    fn parse(raw: &str) -> Option<Self> {
        let mut terms = Self::default();
        for term in raw.split(',') {
            let term = term.trim();
            if term.is_empty() {
                continue;
            }
            if term == "push_constant" {
                terms.push_constant = true;
            } else if term == "std140" || term == "std430" {
                // recognized syntactically, semantically ignored
            } else if let Some((key, value)) = term.split_once('=') {
                let value = value.trim().parse::<u32>().ok()?;
                match key.trim() {
                    "set" => terms.set = Some(value),
                    "binding" => terms.binding = Some(value),
                    "offset" => terms.offset = Some(value),
                    "location" => terms.location = Some(value),
                    "input_attachment_index" => terms.input_attachment_index = Some(value),
                    _ => return None,
                }
            } else {
                return None;
            }
        }
        Some(terms)
    }

    fn kind(&self) -> QualifierKind {
        if self.push_constant {
            QualifierKind::PushConstant
        } else if self.input_attachment_index.is_some() {
            QualifierKind::InputAttachment
        } else if self.binding.is_some() {
            QualifierKind::Binding
        } else {
            QualifierKind::Plain
        }
    }
}

/// Extracts every layout declaration of a stage source, in textual order
///
/// Declarations that do not match the supported grammar are skipped with a
/// warning under [`UnrecognizedPolicy::Tolerant`] and abort parsing with
/// [`ReflectError::UnrecognizedDeclaration`] under
/// [`UnrecognizedPolicy::Strict`].
pub fn parse_qualifiers(source: &str, policy: UnrecognizedPolicy) -> Result<Vec<Qualifier>, ReflectError> {
    let declaration_re = Regex::new(concat!(
        r"layout\s*\(\s*(?<terms>[^)]*)\)\s*",
        r"(?<storage>in|out|uniform|buffer)\s+",
        r"(?:(?<access>readonly|writeonly)\s+)?",
        r"(?<type>\w+)\s*",
        r"(?:\{[^}]*\}\s*)?",
        r"(?<name>\w+)?\s*",
        r"(?:\[\s*(?<count>\d*)\s*\])?\s*;",
    ))
    .unwrap();

    let mut qualifiers = Vec::new();
    let mut matched_starts = Vec::new();

    for caps in declaration_re.captures_iter(source) {
        let whole = caps.get(0).unwrap();
        matched_starts.push(whole.start());

        let Some(terms) = Terms::parse(&caps["terms"]) else {
            handle_unrecognized(whole.as_str(), policy)?;
            continue;
        };

        let storage = match &caps["storage"] {
            "in" => StorageClass::In,
            "out" => StorageClass::Out,
            "uniform" => StorageClass::Uniform,
            _ => StorageClass::Buffer,
        };
        let access = match caps.name("access").map(|m| m.as_str()) {
            Some("readonly") => MemoryAccess::ReadOnly,
            Some("writeonly") => MemoryAccess::WriteOnly,
            _ => MemoryAccess::None,
        };
        let type_name = caps["type"].to_string();
        let name = caps.name("name").map_or_else(|| type_name.clone(), |m| m.as_str().to_string());
        let count = caps.name("count").and_then(|m| m.as_str().parse::<u32>().ok()).unwrap_or(1);

        qualifiers.push(Qualifier {
            kind: terms.kind(),
            set: terms.set.unwrap_or(0),
            binding: terms.binding,
            offset: terms.offset.unwrap_or(0),
            location: terms.location,
            input_attachment_index: terms.input_attachment_index,
            storage,
            access,
            type_name,
            name,
            count,
        });
    }

    // Layout declarations the grammar could not shape at all
    let candidate_re = Regex::new(r"layout\s*\(").unwrap();
    for candidate in candidate_re.find_iter(source) {
        if !matched_starts.contains(&candidate.start()) {
            let rest = &source[candidate.start()..];
            let snippet = match rest.find(';') {
                Some(end) => &rest[..=end],
                None => rest,
            };
            handle_unrecognized(snippet, policy)?;
        }
    }

    Ok(qualifiers)
}

fn handle_unrecognized(declaration: &str, policy: UnrecognizedPolicy) -> Result<(), ReflectError> {
    let declaration = declaration.split_whitespace().collect::<Vec<_>>().join(" ");
    match policy {
        UnrecognizedPolicy::Tolerant => {
            warn!("skipping unrecognized layout declaration: {declaration}");
            Ok(())
        }
        UnrecognizedPolicy::Strict => Err(ReflectError::UnrecognizedDeclaration { declaration }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_one(source: &str) -> Qualifier {
        let qualifiers = parse_qualifiers(source, UnrecognizedPolicy::Strict).unwrap();
        assert_eq!(qualifiers.len(), 1, "expected exactly one declaration in {source:?}");
        qualifiers.into_iter().next().unwrap()
    }

    #[test]
    fn test_binding_with_defaults() {
        let q = parse_one("layout(binding=2) uniform sampler2D albedo;");
        assert_eq!(q.kind, QualifierKind::Binding);
        assert_eq!(q.set, 0);
        assert_eq!(q.binding, Some(2));
        assert_eq!(q.offset, 0);
        assert_eq!(q.count, 1);
        assert_eq!(q.storage, StorageClass::Uniform);
        assert_eq!(q.type_name, "sampler2D");
        assert_eq!(q.name, "albedo");
    }

    #[test]
    fn test_explicit_set_and_array() {
        let q = parse_one("layout(set=1, binding=3) uniform sampler2D shadow_maps[4];");
        assert_eq!(q.set, 1);
        assert_eq!(q.binding, Some(3));
        assert_eq!(q.count, 4);
    }

    #[test]
    fn test_empty_array_brackets_default_to_one() {
        let q = parse_one("layout(binding=0) buffer Particles { vec4 p; } particles[];");
        assert_eq!(q.count, 1);
        assert_eq!(q.storage, StorageClass::Buffer);
        assert_eq!(q.name, "particles");
    }

    #[test]
    fn test_push_constant() {
        let q = parse_one("layout(push_constant, offset=16) uniform mat3 mesh_rotation;");
        assert_eq!(q.kind, QualifierKind::PushConstant);
        assert_eq!(q.offset, 16);
        assert_eq!(q.type_name, "mat3");
    }

    #[test]
    fn test_input_attachment_index() {
        let q = parse_one("layout(input_attachment_index=1, binding=0) uniform subpassInput albedo;");
        assert_eq!(q.kind, QualifierKind::InputAttachment);
        assert_eq!(q.input_attachment_index, Some(1));
        assert_eq!(q.binding, Some(0));
    }

    #[test]
    fn test_terms_are_order_independent() {
        let a = parse_one("layout(set=2, binding=1) uniform sampler s;");
        let b = parse_one("layout(binding=1, set=2) uniform sampler s;");
        assert_eq!(a, b);
    }

    #[test]
    fn test_std_layout_terms_are_ignored() {
        let q = parse_one("layout(std140, binding=0) uniform Camera { mat4 view; } camera;");
        assert_eq!(q.kind, QualifierKind::Binding);
        assert_eq!(q.name, "camera");
        assert_eq!(q.type_name, "Camera");
    }

    #[test]
    fn test_struct_body_spanning_lines() {
        let source = "layout(binding=0) uniform Camera {\n    mat4 view;\n    mat4 projection;\n} camera;\n";
        let q = parse_one(source);
        assert_eq!(q.name, "camera");
    }

    #[test]
    fn test_access_modifier_recorded() {
        let q = parse_one("layout(binding=1) buffer readonly Data { uint values[]; } data;");
        assert_eq!(q.access, MemoryAccess::ReadOnly);
        let q = parse_one("layout(binding=2) uniform writeonly image2D target;");
        assert_eq!(q.access, MemoryAccess::WriteOnly);
    }

    #[test]
    fn test_anonymous_declaration_falls_back_to_type_name() {
        let q = parse_one("layout(binding=0) uniform sampler2D;");
        assert_eq!(q.name, "sampler2D");
    }

    #[test]
    fn test_plain_location_qualifier() {
        let q = parse_one("layout(location=2) in vec3 vertex_normal;");
        assert_eq!(q.kind, QualifierKind::Plain);
        assert_eq!(q.location, Some(2));
        assert_eq!(q.storage, StorageClass::In);
    }

    #[test]
    fn test_textual_order_preserved() {
        let source = "layout(location=0) out vec4 color;\nlayout(location=1) out vec4 normal;\n";
        let qualifiers = parse_qualifiers(source, UnrecognizedPolicy::Strict).unwrap();
        let names: Vec<_> = qualifiers.iter().map(|q| q.name.as_str()).collect();
        assert_eq!(names, ["color", "normal"]);
    }

    #[test]
    fn test_non_layout_code_is_not_reported() {
        let source = "#version 450\nvoid main() {\n    gl_Position = vec4(0.0);\n}\n";
        let qualifiers = parse_qualifiers(source, UnrecognizedPolicy::Strict).unwrap();
        assert!(qualifiers.is_empty());
    }

    #[test]
    fn test_unknown_term_tolerant_skips() {
        let source = "layout(constant_id=3) uniform float scale;\nlayout(binding=0) uniform sampler2D tex;\n";
        let qualifiers = parse_qualifiers(source, UnrecognizedPolicy::Tolerant).unwrap();
        assert_eq!(qualifiers.len(), 1);
        assert_eq!(qualifiers[0].name, "tex");
    }

    #[test]
    fn test_unknown_term_strict_fails() {
        let source = "layout(constant_id=3) uniform float scale;";
        let err = parse_qualifiers(source, UnrecognizedPolicy::Strict).unwrap_err();
        assert!(matches!(err, ReflectError::UnrecognizedDeclaration { .. }));
    }

    #[test]
    fn test_malformed_declaration_strict_fails() {
        // `flat` is not a supported storage class
        let source = "layout(location=0) flat in uint id;";
        let err = parse_qualifiers(source, UnrecognizedPolicy::Strict).unwrap_err();
        assert!(matches!(err, ReflectError::UnrecognizedDeclaration { .. }));
    }

    #[test]
    fn test_malformed_declaration_tolerant_skipped() {
        let source = "layout(location=0) flat in uint id;\nlayout(location=1) in vec3 vertex_position;\n";
        let qualifiers = parse_qualifiers(source, UnrecognizedPolicy::Tolerant).unwrap();
        assert_eq!(qualifiers.len(), 1);
        assert_eq!(qualifiers[0].name, "vertex_position");
    }
}
