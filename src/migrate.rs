use serde_json::Value;

/// Version written by the current build. Bump together with a new entry in
/// `upgrade`.
pub const SCHEMA_VERSION: u32 = 2;

/// Blobs written before versioning carry no `schemaVersion` key and count as
/// version 1.
pub fn detect_version(value: &Value) -> u32 {
    value
        .get("schemaVersion")
        .and_then(Value::as_u64)
        .map(|v| v as u32)
        .unwrap_or(1)
}

/// Applies the ordered upgrade steps to a raw state value and stamps the
/// current schema version. Running it again on its own output is a no-op.
/// Blobs from a newer build pass through with their version tag intact.
pub fn upgrade(mut value: Value) -> Value {
    let mut version = detect_version(&value);
    if version > SCHEMA_VERSION {
        return value;
    }
    while version < SCHEMA_VERSION {
        value = match version {
            1 => upgrade_v1_to_v2(value),
            _ => break,
        };
        version += 1;
    }
    if let Some(obj) = value.as_object_mut() {
        obj.insert("schemaVersion".to_string(), Value::from(SCHEMA_VERSION));
    }
    value
}

/// v1 → v2: every task's `time` becomes a string (non-string or missing
/// values reset to "") and the obsolete `due` field is removed.
fn upgrade_v1_to_v2(mut value: Value) -> Value {
    let Some(lists) = value.get_mut("lists").and_then(Value::as_array_mut) else {
        return value;
    };
    for list in lists {
        let Some(tasks) = list.get_mut("tasks").and_then(Value::as_array_mut) else {
            continue;
        };
        for task in tasks {
            let Some(obj) = task.as_object_mut() else {
                continue;
            };
            match obj.get("time") {
                Some(Value::String(_)) => {}
                _ => {
                    obj.insert("time".to_string(), Value::String(String::new()));
                }
            }
            obj.remove("due");
        }
    }
    value
}
