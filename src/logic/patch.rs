//! JSON Patch (RFC 6902) over `serde_json::Value`.
//!
//! Operations run against a working copy of the document; the caller only
//! sees the result if every operation succeeded.

use serde_json::Value;

use crate::error::{CatalogError, CatalogResult};
use crate::model::{EntityKind, PatchOp, PatchOperation};

/// Top-level document fields a patch may not change.
const IMMUTABLE_FIELDS: [&str; 3] = ["id", "name", "fullyQualifiedName"];

fn fail(message: impl Into<String>) -> CatalogError {
    CatalogError::PatchFailed(message.into())
}

/// Split a JSON pointer into unescaped reference tokens.
pub fn parse_pointer(pointer: &str) -> CatalogResult<Vec<String>> {
    if pointer.is_empty() {
        return Ok(Vec::new());
    }
    let Some(rest) = pointer.strip_prefix('/') else {
        return Err(fail(format!("pointer '{}' must start with '/'", pointer)));
    };
    Ok(rest
        .split('/')
        .map(|token| token.replace("~1", "/").replace("~0", "~"))
        .collect())
}

fn array_index(token: &str, len: usize, allow_end: bool) -> CatalogResult<usize> {
    if allow_end && token == "-" {
        return Ok(len);
    }
    if token.is_empty() || (token.len() > 1 && token.starts_with('0')) {
        return Err(fail(format!("invalid array index '{}'", token)));
    }
    let index: usize = token
        .parse()
        .map_err(|_| fail(format!("invalid array index '{}'", token)))?;
    let bound = if allow_end { len } else { len.saturating_sub(1) };
    if len == 0 && !allow_end || index > bound {
        return Err(fail(format!("array index {} out of bounds", index)));
    }
    Ok(index)
}

fn get<'a>(doc: &'a Value, tokens: &[String]) -> CatalogResult<&'a Value> {
    tokens.iter().try_fold(doc, |current, token| match current {
        Value::Object(map) => map
            .get(token)
            .ok_or_else(|| fail(format!("path segment '{}' does not exist", token))),
        Value::Array(items) => {
            let index = array_index(token, items.len(), false)?;
            Ok(&items[index])
        }
        _ => Err(fail(format!("cannot descend into scalar at '{}'", token))),
    })
}

fn get_mut<'a>(doc: &'a mut Value, tokens: &[String]) -> CatalogResult<&'a mut Value> {
    tokens.iter().try_fold(doc, |current, token| match current {
        Value::Object(map) => map
            .get_mut(token)
            .ok_or_else(|| fail(format!("path segment '{}' does not exist", token))),
        Value::Array(items) => {
            let index = array_index(token, items.len(), false)?;
            Ok(&mut items[index])
        }
        _ => Err(fail(format!("cannot descend into scalar at '{}'", token))),
    })
}

fn add(doc: &mut Value, tokens: &[String], value: Value) -> CatalogResult<()> {
    let Some((last, parent_tokens)) = tokens.split_last() else {
        *doc = value;
        return Ok(());
    };
    match get_mut(doc, parent_tokens)? {
        Value::Object(map) => {
            map.insert(last.clone(), value);
            Ok(())
        }
        Value::Array(items) => {
            let index = array_index(last, items.len(), true)?;
            items.insert(index, value);
            Ok(())
        }
        _ => Err(fail("parent of target is not a container")),
    }
}

fn remove(doc: &mut Value, tokens: &[String]) -> CatalogResult<Value> {
    let Some((last, parent_tokens)) = tokens.split_last() else {
        return Err(fail("cannot remove the whole document"));
    };
    match get_mut(doc, parent_tokens)? {
        Value::Object(map) => map
            .remove(last)
            .ok_or_else(|| fail(format!("path segment '{}' does not exist", last))),
        Value::Array(items) => {
            let index = array_index(last, items.len(), false)?;
            Ok(items.remove(index))
        }
        _ => Err(fail("parent of target is not a container")),
    }
}

fn required_value(op: &PatchOperation) -> CatalogResult<Value> {
    op.value
        .clone()
        .ok_or_else(|| fail(format!("'{:?}' operation at '{}' needs a value", op.op, op.path)))
}

fn required_from(op: &PatchOperation) -> CatalogResult<Vec<String>> {
    let from = op
        .from
        .as_deref()
        .ok_or_else(|| fail(format!("'{:?}' operation at '{}' needs 'from'", op.op, op.path)))?;
    parse_pointer(from)
}

fn apply_one(doc: &mut Value, op: &PatchOperation) -> CatalogResult<()> {
    let path = parse_pointer(&op.path)?;
    match op.op {
        PatchOp::Add => add(doc, &path, required_value(op)?),
        PatchOp::Remove => remove(doc, &path).map(|_| ()),
        PatchOp::Replace => {
            let value = required_value(op)?;
            *get_mut(doc, &path)? = value;
            Ok(())
        }
        PatchOp::Test => {
            let expected = required_value(op)?;
            if *get(doc, &path)? == expected {
                Ok(())
            } else {
                Err(fail(format!("test failed at '{}'", op.path)))
            }
        }
        PatchOp::Move => {
            let from = required_from(op)?;
            get(doc, &from)?;
            if from == path {
                return Ok(());
            }
            if path.starts_with(&from) {
                return Err(fail("cannot move a value into one of its children"));
            }
            let value = remove(doc, &from)?;
            add(doc, &path, value)
        }
        PatchOp::Copy => {
            let from = required_from(op)?;
            let value = get(doc, &from)?.clone();
            add(doc, &path, value)
        }
    }
}

/// Apply `ops` in order to a copy of `document`.
pub fn apply_patch(document: &Value, ops: &[PatchOperation]) -> CatalogResult<Value> {
    let mut working = document.clone();
    for op in ops {
        apply_one(&mut working, op)?;
    }
    Ok(working)
}

/// Patch a typed entity: apply the operations to its JSON form, refuse
/// identity changes, decode back and normalize.
pub fn patch_entity<E: EntityKind>(entity: &E, ops: &[PatchOperation]) -> CatalogResult<E> {
    let original = serde_json::to_value(entity).map_err(|e| fail(e.to_string()))?;
    let patched = apply_patch(&original, ops)?;

    for field in IMMUTABLE_FIELDS {
        if original.get(field) != patched.get(field) {
            return Err(fail(format!("'{}' cannot be changed", field)));
        }
    }

    let mut updated: E = serde_json::from_value(patched).map_err(|e| fail(e.to_string()))?;
    updated.normalize().map_err(|e| match e {
        CatalogError::PatchFailed(_) => e,
        other => fail(other.to_string()),
    })?;
    Ok(updated)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn ops(value: Value) -> Vec<PatchOperation> {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_pointer_escapes() {
        assert_eq!(parse_pointer("").unwrap(), Vec::<String>::new());
        assert_eq!(parse_pointer("/a~1b/c~0d").unwrap(), vec!["a/b", "c~d"]);
        assert!(parse_pointer("a/b").is_err());
    }

    #[test]
    fn test_add_remove_replace() {
        let doc = json!({"tags": ["a"], "owner": {"name": "x"}});
        let patched = apply_patch(
            &doc,
            &ops(json!([
                {"op": "add", "path": "/tags/-", "value": "b"},
                {"op": "add", "path": "/tags/0", "value": "z"},
                {"op": "replace", "path": "/owner/name", "value": "y"},
                {"op": "remove", "path": "/tags/1"},
                {"op": "add", "path": "/description", "value": "orders table"}
            ])),
        )
        .unwrap();

        assert_eq!(
            patched,
            json!({"tags": ["z", "b"], "owner": {"name": "y"}, "description": "orders table"})
        );
        // Original untouched
        assert_eq!(doc["tags"], json!(["a"]));
    }

    #[test]
    fn test_move_and_copy() {
        let doc = json!({"a": {"b": 1}, "c": []});
        let patched = apply_patch(
            &doc,
            &ops(json!([
                {"op": "copy", "from": "/a/b", "path": "/c/-"},
                {"op": "move", "from": "/a", "path": "/d"}
            ])),
        )
        .unwrap();
        assert_eq!(patched, json!({"c": [1], "d": {"b": 1}}));

        let err = apply_patch(&doc, &ops(json!([{"op": "move", "from": "/a", "path": "/a/b/c"}])));
        assert!(matches!(err, Err(CatalogError::PatchFailed(_))));
    }

    #[test]
    fn test_failure_is_atomic() {
        let doc = json!({"status": "Pending"});
        let result = apply_patch(
            &doc,
            &ops(json!([
                {"op": "replace", "path": "/status", "value": "Running"},
                {"op": "test", "path": "/status", "value": "Successful"}
            ])),
        );
        assert!(matches!(result, Err(CatalogError::PatchFailed(_))));
        assert_eq!(doc, json!({"status": "Pending"}));
    }

    #[test]
    fn test_missing_targets_fail() {
        let doc = json!({"items": [1, 2]});
        for bad in [
            json!([{"op": "remove", "path": "/missing"}]),
            json!([{"op": "replace", "path": "/items/2", "value": 3}]),
            json!([{"op": "add", "path": "/items/5", "value": 3}]),
            json!([{"op": "add", "path": "/items/01", "value": 3}]),
            json!([{"op": "replace", "path": "/items"}]),
            json!([{"op": "copy", "path": "/x"}]),
            json!([{"op": "move", "from": "/ghost", "path": "/ghost"}]),
        ] {
            assert!(
                matches!(apply_patch(&doc, &ops(bad.clone())), Err(CatalogError::PatchFailed(_))),
                "{} should fail",
                bad
            );
        }
    }
}
