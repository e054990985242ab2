//! Built-in example schemas: the canonical tool-call / tool-result envelope
//! exchanged between an LLM provider adapter and a tool runtime.
use crate::error::SchemaError;
use crate::ir::{EnumSchema, RecordSchema, SchemaSet, TypeExpr};

pub const RISK_LEVEL: &str = "RiskLevel";
pub const ERROR_CLASS: &str = "NormalizedErrorClass";
pub const POLICY: &str = "ToolExecutionPolicy";
pub const TOOL_CALL: &str = "CanonicalToolCall";
pub const TOOL_RESULT: &str = "CanonicalToolResult";

/// Checked schema set holding both envelopes and their enums.
pub fn tool_envelope_schemas() -> Result<SchemaSet, SchemaError> {
    let object = || TypeExpr::dict_of(TypeExpr::string(), TypeExpr::Any);

    SchemaSet::new()
        .with_enum(EnumSchema::new(RISK_LEVEL, ["low", "medium", "high", "critical"]))?
        .with_enum(EnumSchema::new(
            ERROR_CLASS,
            ["validation", "permission", "runtime", "timeout", "provider"],
        ))?
        .with_record(
            RecordSchema::new(POLICY)
                .field("risk_level", TypeExpr::enum_ref(RISK_LEVEL))
                .field("requires_confirmation", TypeExpr::bool())
                .field("timeout_ms", TypeExpr::int()),
        )?
        .with_record(
            RecordSchema::new(TOOL_CALL)
                .field("provider", TypeExpr::string())
                .field("call_id", TypeExpr::string())
                .field("tool_name", TypeExpr::string())
                .field("arguments", object())
                .field("raw_request", object())
                .field("raw_response", object())
                .field("received_at", TypeExpr::string())
                .field("trace_id", TypeExpr::string())
                .field("session_id", TypeExpr::string())
                .field("policy", TypeExpr::record(POLICY)),
        )?
        .with_record(
            RecordSchema::new(TOOL_RESULT)
                .field("provider", TypeExpr::string())
                .field("call_id", TypeExpr::string())
                .field("tool_name", TypeExpr::string())
                .field("ok", TypeExpr::bool())
                .field(
                    "result",
                    TypeExpr::union([
                        object(),
                        TypeExpr::list_of(TypeExpr::Any),
                        TypeExpr::string(),
                        TypeExpr::int(),
                        TypeExpr::float(),
                        TypeExpr::bool(),
                        TypeExpr::Null,
                    ]),
                )
                .field("error_class", TypeExpr::optional(TypeExpr::enum_ref(ERROR_CLASS)))
                .field("error_message", TypeExpr::optional(TypeExpr::string()))
                .field("trace_id", TypeExpr::string())
                .field("session_id", TypeExpr::string()),
        )?
        .checked()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn envelope_schemas_check() {
        let schemas = tool_envelope_schemas().unwrap();
        assert_eq!(schemas.records().count(), 3);
        assert_eq!(schemas.record(TOOL_CALL).unwrap().fields.len(), 10);
        assert!(schemas.record(TOOL_RESULT).unwrap().fields.iter().all(|f| f.is_required()));
        assert!(!schemas.enumeration(RISK_LEVEL).unwrap().contains("LOW"));
    }
}
