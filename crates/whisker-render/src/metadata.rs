//! Model metadata: how templates see into model values.
//!
//! Every member access, truthiness test and value-to-text conversion the
//! renderer performs goes through a [`MetadataProvider`]. The default one
//! applies plain JSON semantics; hosts can substitute their own (for example
//! to expose computed members) through the service builder.

use std::borrow::Cow;

use serde_json::Value;

/// Resolves members, truthiness and display text of model values.
pub trait MetadataProvider: Send + Sync {
    /// Look up `name` on `value`. `None` means the member does not exist.
    fn member<'v>(&self, value: &'v Value, name: &str) -> Option<Cow<'v, Value>>;

    /// Whether `value` selects the main section of `if`/`with`.
    fn is_truthy(&self, value: &Value) -> bool;

    /// Append the text form of `value` to `out`.
    fn write_display(&self, value: &Value, out: &mut String);

    /// The text form of `value`.
    fn display(&self, value: &Value) -> String {
        let mut out = String::new();
        self.write_display(value, &mut out);
        out
    }
}

/// JSON semantics, with `length` on arrays and strings.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultMetadataProvider;

impl MetadataProvider for DefaultMetadataProvider {
    fn member<'v>(&self, value: &'v Value, name: &str) -> Option<Cow<'v, Value>> {
        match value {
            Value::Object(map) => map.get(name).map(Cow::Borrowed),
            Value::Array(items) if name == "length" => Some(Cow::Owned(Value::from(items.len()))),
            Value::Array(items) => {
                let index: usize = name.parse().ok()?;
                items.get(index).map(Cow::Borrowed)
            }
            Value::String(text) if name == "length" => {
                Some(Cow::Owned(Value::from(text.chars().count())))
            }
            _ => None,
        }
    }

    fn is_truthy(&self, value: &Value) -> bool {
        match value {
            Value::Null => false,
            Value::Bool(flag) => *flag,
            Value::Number(number) => number.as_f64().is_some_and(|n| n != 0.0 && !n.is_nan()),
            Value::String(text) => !text.is_empty(),
            Value::Array(items) => !items.is_empty(),
            Value::Object(_) => true,
        }
    }

    fn write_display(&self, value: &Value, out: &mut String) {
        match value {
            Value::Null => {}
            Value::String(text) => out.push_str(text),
            Value::Bool(_) | Value::Number(_) | Value::Object(_) => out.push_str(&value.to_string()),
            Value::Array(items) => {
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        out.push(',');
                    }
                    self.write_display(item, out);
                }
            }
        }
    }
}
