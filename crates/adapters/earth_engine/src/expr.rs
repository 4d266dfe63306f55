//! Earth Engine expression graphs.
//!
//! The REST API evaluates an `Expression`: a table of value nodes plus the
//! key of the result node. Nodes are JSON objects with exactly one member:
//!
//! | Node | Shape |
//! |------|-------|
//! | constant | `{"constantValue": <json>}` |
//! | call | `{"functionInvocationValue": {"functionName", "arguments"}}` |
//! | argument | `{"argumentReference": <name>}` |
//! | lambda | `{"functionDefinitionValue": {"argumentNames", "body": <key>}}` |
//! | reference | `{"valueReference": <key>}` |
//! | array | `{"arrayValue": {"values": [..]}}` |
//! | dictionary | `{"dictionaryValue": {"values": {..}}}` |
//!
//! Lambda bodies must live in the table, so [`Expression::function`] hoists
//! them.

use serde_json::{Map, Value, json};

/// Key of the result node.
const RESULT_KEY: &str = "0";

#[must_use]
pub fn constant(value: impl Into<Value>) -> Value {
    json!({ "constantValue": value.into() })
}

/// Invoke `name` with named arguments.
#[must_use]
pub fn call<'a>(name: &str, arguments: impl IntoIterator<Item = (&'a str, Value)>) -> Value {
    let arguments: Map<String, Value> = arguments
        .into_iter()
        .map(|(key, value)| (key.to_string(), value))
        .collect();
    json!({
        "functionInvocationValue": {
            "functionName": name,
            "arguments": arguments,
        }
    })
}

/// Invoke `name` without arguments.
#[must_use]
pub fn nullary(name: &str) -> Value {
    call(name, Vec::<(&str, Value)>::new())
}

/// Reference a lambda parameter from inside its body.
#[must_use]
pub fn argument(name: &str) -> Value {
    json!({ "argumentReference": name })
}

#[must_use]
pub fn array(values: Vec<Value>) -> Value {
    json!({ "arrayValue": { "values": values } })
}

#[must_use]
pub fn dictionary<'a>(entries: impl IntoIterator<Item = (&'a str, Value)>) -> Value {
    let values: Map<String, Value> = entries
        .into_iter()
        .map(|(key, value)| (key.to_string(), value))
        .collect();
    json!({ "dictionaryValue": { "values": values } })
}

/// Value table under construction.
#[derive(Debug, Default)]
pub struct Expression {
    values: Map<String, Value>,
}

impl Expression {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A one-parameter lambda; `body` refers to the parameter with
    /// [`argument`].
    pub fn function(&mut self, parameter: &str, body: Value) -> Value {
        let key = self.hoist(body);
        json!({
            "functionDefinitionValue": {
                "argumentNames": [parameter],
                "body": key,
            }
        })
    }

    fn hoist(&mut self, node: Value) -> String {
        let key = (self.values.len() + 1).to_string();
        self.values.insert(key.clone(), node);
        key
    }

    /// The `value:compute` request body evaluating `result`.
    #[must_use]
    pub fn into_request(mut self, result: Value) -> Value {
        self.values.insert(RESULT_KEY.to_string(), result);
        json!({
            "expression": {
                "result": RESULT_KEY,
                "values": self.values,
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_wrap_constant_result() {
        let request = Expression::new().into_request(constant(1));
        assert_eq!(
            request,
            json!({"expression": {"result": "0", "values": {"0": {"constantValue": 1}}}})
        );
    }

    #[test]
    fn should_encode_named_arguments() {
        let node = call("Collection.size", [("collection", constant("x"))]);
        assert_eq!(
            node["functionInvocationValue"]["functionName"],
            "Collection.size"
        );
        assert_eq!(
            node["functionInvocationValue"]["arguments"]["collection"],
            json!({"constantValue": "x"})
        );
    }

    #[test]
    fn should_hoist_lambda_bodies_into_table() {
        let mut expr = Expression::new();
        let first = expr.function("image", argument("image"));
        let second = expr.function("image", constant(2));
        let request = expr.into_request(array(vec![first.clone(), second.clone()]));

        assert_eq!(first["functionDefinitionValue"]["body"], "1");
        assert_eq!(second["functionDefinitionValue"]["body"], "2");
        let values = &request["expression"]["values"];
        assert_eq!(values["1"], json!({"argumentReference": "image"}));
        assert_eq!(values["2"], json!({"constantValue": 2}));
        assert!(values["0"]["arrayValue"].is_object());
    }

    #[test]
    fn should_encode_dictionary_entries() {
        let node = dictionary([("date", constant("2023-01-01"))]);
        assert_eq!(
            node,
            json!({"dictionaryValue": {"values": {"date": {"constantValue": "2023-01-01"}}}})
        );
    }
}
