//! Small helper predicates over [`serde_json::Value`], mirroring the cJSON
//! wrapper functions named in `note.h` (`JIsPresent`, `JGetString`,
//! `JContainsString`, `JIsNullString`, `JIsExactString`, `JGetInt`).
//!
//! The external DOM library contract (spec §6.1) only asks for these as
//! predicates/getters on a tree; `serde_json::Value` already is that tree,
//! so this module is deliberately thin — it exists so orchestrator code
//! reads the same way the original's did, not to add behavior.

use serde_json::Value;

/// `JIsPresent`: `true` if `field` exists in `obj` at all (any type,
/// including JSON `null`).
pub fn j_is_present(obj: &Value, field: &str) -> bool {
    obj.get(field).is_some()
}

/// `JGetString`: the string value of `field`, or `""` if absent or not a
/// string (cJSON's `JGetString` never fails, it returns an empty string).
pub fn j_get_string<'a>(obj: &'a Value, field: &str) -> &'a str {
    obj.get(field).and_then(Value::as_str).unwrap_or("")
}

/// `JGetInt`: the integer value of `field`, or `0` if absent or not a
/// number.
pub fn j_get_int(obj: &Value, field: &str) -> i64 {
    obj.get(field).and_then(Value::as_i64).unwrap_or(0)
}

/// `JGetBool`: the boolean value of `field`, or `false` if absent or not a
/// bool.
pub fn j_get_bool(obj: &Value, field: &str) -> bool {
    obj.get(field).and_then(Value::as_bool).unwrap_or(false)
}

/// `JIsNullString`: `true` if `field` is absent, is JSON `null`, or is the
/// empty string.
pub fn j_is_null_string(obj: &Value, field: &str) -> bool {
    match obj.get(field) {
        None => true,
        Some(Value::Null) => true,
        Some(Value::String(s)) => s.is_empty(),
        Some(_) => false,
    }
}

/// `JIsExactString`: `true` if `field` is a string equal to `teststr`.
pub fn j_is_exact_string(obj: &Value, field: &str, teststr: &str) -> bool {
    obj.get(field).and_then(Value::as_str) == Some(teststr)
}

/// `JContainsString`: `true` if `field` is a string containing `substr` as
/// a substring.
pub fn j_contains_string(obj: &Value, field: &str, substr: &str) -> bool {
    obj.get(field)
        .and_then(Value::as_str)
        .is_some_and(|s| s.contains(substr))
}
