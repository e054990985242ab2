//! Contract tests for the built-in tool-call / tool-result envelopes.
use json_strict::envelope::{self, TOOL_CALL, TOOL_RESULT};
use json_strict::{EnumValue, ErrorKind, Record, StructuringError, Structurer, Value};
use serde_json::{Value as Json, json};

fn structurer() -> Structurer {
    Structurer::new(envelope::tool_envelope_schemas().unwrap())
}

fn tool_call() -> Json {
    json!({
        "provider": "openai",
        "call_id": "call-1",
        "tool_name": "get_weather",
        "arguments": { "location": "Boston" },
        "raw_request": {},
        "raw_response": {},
        "received_at": "2026-02-16T00:00:00Z",
        "trace_id": "trace-1",
        "session_id": "session-1",
        "policy": {
            "risk_level": "low",
            "requires_confirmation": false,
            "timeout_ms": 120000
        }
    })
}

fn tool_result() -> Json {
    json!({
        "provider": "openai",
        "call_id": "call-1",
        "tool_name": "get_weather",
        "ok": false,
        "result": null,
        "error_class": "validation",
        "error_message": "missing required arg",
        "trace_id": "trace-1",
        "session_id": "session-1"
    })
}

fn parse_call(payload: Json) -> Result<Record, StructuringError> {
    structurer().parse(TOOL_CALL, payload)
}

#[test]
fn valid_tool_call_parses() {
    let call = parse_call(tool_call()).unwrap();
    assert_eq!(call.get("call_id").and_then(Value::as_str), Some("call-1"));
    let policy = call.get("policy").and_then(Value::as_record).unwrap();
    assert_eq!(
        policy.get("risk_level").and_then(Value::as_enum),
        Some(&EnumValue::new(envelope::RISK_LEVEL, "low"))
    );
    assert_eq!(policy.get("timeout_ms").and_then(Value::as_i64), Some(120_000));
    assert_eq!(
        call.get("arguments").and_then(Value::as_map).map(<[_]>::to_vec),
        Some(vec![(Value::from("location"), Value::Json(json!("Boston")))])
    );
}

#[test]
fn missing_call_id_is_reported_by_name() {
    let mut payload = tool_call();
    payload.as_object_mut().unwrap().remove("call_id");
    let err = parse_call(payload).unwrap_err();
    assert_eq!(err.kind(), &ErrorKind::MissingRequiredField("call_id".into()));
    assert!(err.path().is_root());
}

#[test]
fn missing_policy_field_is_located_inside_policy() {
    let mut payload = tool_call();
    payload["policy"].as_object_mut().unwrap().remove("timeout_ms");
    let err = parse_call(payload).unwrap_err();
    assert_eq!(err.kind(), &ErrorKind::MissingRequiredField("timeout_ms".into()));
    assert_eq!(err.path().to_string(), "policy");
}

#[test]
fn uppercase_risk_level_is_rejected() {
    let mut payload = tool_call();
    payload["policy"]["risk_level"] = json!("LOW");
    let err = parse_call(payload).unwrap_err();
    assert_eq!(err.path().to_string(), "policy.risk_level");
    assert!(matches!(
        err.kind(),
        ErrorKind::InvalidEnumValue { enum_name, permitted, .. }
            if enum_name == envelope::RISK_LEVEL && permitted.len() == 4
    ));
}

#[test]
fn unknown_fields_are_tolerated_everywhere() {
    let mut payload = tool_call();
    payload["future_field"] = json!("ignored");
    payload["policy"]["future_policy_field"] = json!(1);
    assert_eq!(parse_call(payload).unwrap(), parse_call(tool_call()).unwrap());
}

#[test]
fn every_error_class_parses() {
    let s = structurer();
    for tag in ["validation", "permission", "runtime", "timeout", "provider"] {
        let mut payload = tool_result();
        payload["error_class"] = json!(tag);
        let result = s.parse(TOOL_RESULT, payload).unwrap();
        assert_eq!(
            result.get("error_class"),
            Some(&Value::Enum(EnumValue::new(envelope::ERROR_CLASS, tag)))
        );
    }
}

#[test]
fn unknown_error_class_fails_the_optional() {
    let mut payload = tool_result();
    payload["error_class"] = json!("unknown");
    let err = structurer().parse(TOOL_RESULT, payload).unwrap_err();
    assert_eq!(err.path().to_string(), "error_class");
    let ErrorKind::UnionMismatch { attempted, rejected, .. } = err.kind() else {
        panic!("unexpected error: {err}");
    };
    assert_eq!(attempted, &["NormalizedErrorClass", "None"]);
    assert!(matches!(
        rejected[0].kind(),
        ErrorKind::InvalidEnumValue { permitted, .. } if permitted.len() == 5 && permitted[0] == "validation"
    ));
}

#[test]
fn optional_fields_accept_null_but_must_be_present() {
    let s = structurer();
    let mut payload = tool_result();
    payload["error_class"] = Json::Null;
    payload["error_message"] = Json::Null;
    let result = s.parse(TOOL_RESULT, payload).unwrap();
    assert!(result.get("error_class").is_some_and(Value::is_null));

    let mut absent = tool_result();
    absent.as_object_mut().unwrap().remove("error_message");
    assert_eq!(
        s.parse(TOOL_RESULT, absent).unwrap_err().into_kind(),
        ErrorKind::MissingRequiredField("error_message".into())
    );
}

#[test]
fn result_union_takes_the_first_fitting_alternative() {
    let s = structurer();
    let cases = [
        (json!({ "temp": 21 }), Value::Map(vec![(Value::from("temp"), Value::Json(json!(21)))])),
        (json!([1, "a"]), Value::Seq(vec![Value::Json(json!(1)), Value::Json(json!("a"))])),
        (json!("sunny"), Value::from("sunny")),
        (json!(21), Value::Int(21)),
        (json!(21.5), Value::from(21.5)),
        (json!(true), Value::Bool(true)),
        (Json::Null, Value::Null),
    ];
    for (input, expected) in cases {
        let mut payload = tool_result();
        payload["result"] = input;
        assert_eq!(s.parse(TOOL_RESULT, payload).unwrap().get("result"), Some(&expected));
    }
}

#[test]
fn dump_is_stable_and_reparses_to_the_same_record() {
    let s = structurer();
    let call = parse_call(tool_call()).unwrap();
    let text = s.dump(&call).unwrap();
    assert!(text.starts_with("{\n  \"provider\": \"openai\",\n  \"call_id\": \"call-1\","));
    assert!(text.contains("\n  \"policy\": {\n    \"risk_level\": \"low\","));
    assert_eq!(s.parse(TOOL_CALL, &text).unwrap(), call);
    assert_eq!(s.dump(&s.parse(TOOL_CALL, &text).unwrap()).unwrap(), text);
}
