use crate::debugger::error::Error;
use crate::debugger::variable::{ValueKind, VariableNode};
use itertools::Itertools;
use std::fmt::{Display, Formatter};

/// Bounds of a signed int slider, half of i32 range keeps slider usable.
pub const INT_SLIDER_RANGE: (i64, i64) = (i32::MIN as i64 / 2, i32::MAX as i64 / 2);

/// Characters accepted for opaque (decimal) input.
const DECIMAL_CHARS: &str = "0123456789.+-*/eE";

/// Widget a presentation layer should use for editing a node.
#[derive(Clone, Debug, PartialEq)]
pub enum EditorHint {
    /// Not editable itself, expand members instead.
    Tree,
    Checkbox,
    Slider { min: i64, max: i64 },
    Choice(Vec<String>),
    DecimalText,
}

impl EditorHint {
    pub fn for_node(node: &VariableNode) -> Self {
        match node.kind {
            ValueKind::Aggregate => EditorHint::Tree,
            ValueKind::Boolean => EditorHint::Checkbox,
            ValueKind::UnsignedByte => EditorHint::Slider {
                min: u8::MIN as i64,
                max: u8::MAX as i64,
            },
            ValueKind::SignedInt => EditorHint::Slider {
                min: INT_SLIDER_RANGE.0,
                max: INT_SLIDER_RANGE.1,
            },
            ValueKind::Enumeration => EditorHint::Choice(node.enum_members.clone()),
            ValueKind::Opaque => EditorHint::DecimalText,
        }
    }
}

impl Display for EditorHint {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            EditorHint::Tree => f.write_str("edit members instead"),
            EditorHint::Checkbox => f.write_str("true | false"),
            EditorHint::Slider { min, max } => f.write_fmt(format_args!("{min}..={max}")),
            EditorHint::Choice(members) if members.is_empty() => f.write_str("enumerator name"),
            EditorHint::Choice(members) => {
                f.write_fmt(format_args!("{}", members.iter().join(" | ")))
            }
            EditorHint::DecimalText => f.write_str("decimal number"),
        }
    }
}

/// Check operator input against node kind and return normalized value text.
pub fn validate(node: &VariableNode, text: &str) -> Result<String, Error> {
    let text = text.trim();
    let invalid = |reason: &'static str| Error::InvalidEditValue {
        kind: node.kind.into(),
        value: text.to_string(),
        reason,
    };

    match node.kind {
        ValueKind::Aggregate => Err(invalid("aggregates are edited through their members")),
        ValueKind::Boolean => {
            let lowercase = text.to_ascii_lowercase();
            match lowercase.as_str() {
                "true" | "false" => Ok(lowercase),
                _ => Err(invalid("expect `true` or `false`")),
            }
        }
        ValueKind::UnsignedByte => text
            .parse::<u8>()
            .map(|v| v.to_string())
            .map_err(|_| invalid("expect an integer in range 0..=255")),
        ValueKind::SignedInt => text
            .parse::<i32>()
            .map(|v| v.to_string())
            .map_err(|_| invalid("expect a 32-bit signed integer")),
        ValueKind::Enumeration => {
            let qualifier = format!("{}::", node.type_name);
            let member = text.strip_prefix(qualifier.as_str()).unwrap_or(text);
            if member.is_empty() {
                return Err(invalid("empty enumerator"));
            }
            if !node.enum_members.is_empty() && !node.enum_members.iter().any(|m| m == member) {
                return Err(invalid("unknown enumerator"));
            }
            Ok(member.to_string())
        }
        ValueKind::Opaque => {
            if text.is_empty() {
                return Err(invalid("empty value"));
            }
            if !text.chars().all(|c| DECIMAL_CHARS.contains(c)) {
                return Err(invalid("only decimal input is accepted"));
            }
            Ok(text.to_string())
        }
    }
}
