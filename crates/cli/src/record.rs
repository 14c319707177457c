use argbind::{Bind, BindError, BoundValue, FieldSlot, ParserSpec};
use indexmap::IndexMap;
use serde_json::Value;

/// A record whose shape comes from a runtime descriptor.
///
/// Values are kept per slot; [`JsonRecord::into_json`] lays them out in
/// declaration order and omits fields that were never bound.
#[derive(Debug, Default)]
pub struct JsonRecord {
    values: Vec<Option<Value>>,
}

impl JsonRecord {
    pub fn new(spec: &ParserSpec) -> Self {
        Self {
            values: vec![None; spec.slots().len()],
        }
    }

    pub fn into_json(self, spec: &ParserSpec) -> IndexMap<String, Value> {
        spec.slots()
            .iter()
            .zip(self.values)
            .filter_map(|(slot, value)| Some((slot.name().to_string(), value?)))
            .collect()
    }
}

impl Bind for JsonRecord {
    fn bind(&mut self, slot: &FieldSlot, value: BoundValue<'_>) -> Result<(), BindError> {
        let json = match value {
            BoundValue::Flag => Value::Bool(true),
            BoundValue::Text(text) => Value::String(text.to_string()),
            BoundValue::Constant { name, .. } => Value::String(name.to_lowercase()),
        };
        let entry = self
            .values
            .get_mut(slot.id())
            .ok_or_else(|| BindError::unknown_field(slot))?;

        if slot.kind().is_collection() {
            match entry.get_or_insert_with(|| Value::Array(Vec::new())) {
                Value::Array(items) => items.push(json),
                _ => return Err(BindError::unknown_field(slot)),
            }
        } else {
            *entry = Some(json);
        }
        Ok(())
    }
}
