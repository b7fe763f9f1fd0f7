//! Deep merge of config layers.

use serde_json::Value;

/// Overlay `layer` onto `base`. Objects merge key by key; any other value
/// replaces what was there.
pub(super) fn merge_json_values(base: &mut Value, layer: &Value) {
    let (Value::Object(base_map), Value::Object(layer_map)) = (&mut *base, layer) else {
        *base = layer.clone();
        return;
    };
    for (key, value) in layer_map {
        match base_map.get_mut(key) {
            Some(slot) => merge_json_values(slot, value),
            None => {
                base_map.insert(key.clone(), value.clone());
            }
        }
    }
}

/// Overlay `layer` onto `base` while leaving every leaf that `locked` sets
/// untouched.
///
/// `locked` is the requirements layer narrowed to the current path. A locked
/// object lets its unlocked children through; a locked scalar or array pins
/// the whole subtree.
pub(super) fn merge_json_with_constraints(base: &mut Value, layer: &Value, locked: Option<&Value>) {
    match locked {
        None => merge_json_values(base, layer),
        Some(Value::Object(locked_map)) => {
            let Value::Object(layer_map) = layer else {
                return;
            };
            if !base.is_object() {
                *base = Value::Object(serde_json::Map::new());
            }
            let Value::Object(base_map) = base else {
                return;
            };
            for (key, value) in layer_map {
                let slot = base_map.entry(key.clone()).or_insert(Value::Null);
                match locked_map.get(key) {
                    None => merge_json_values(slot, value),
                    Some(nested @ Value::Object(_)) => {
                        merge_json_with_constraints(slot, value, Some(nested));
                    }
                    Some(_) => {}
                }
            }
            base_map.retain(|_, value| !value.is_null());
        }
        Some(_) => {}
    }
}

#[cfg(test)]
mod tests {
    use super::{merge_json_values, merge_json_with_constraints};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn nested_objects_merge_and_scalars_replace() {
        let mut base = json!({"storage": {"root": "/a", "directories": {"hotel": "h"}}});
        merge_json_values(
            &mut base,
            &json!({"storage": {"directories": {"flight": "f"}}, "search": {"default_max_results": 5}}),
        );
        assert_eq!(
            base,
            json!({
                "storage": {"root": "/a", "directories": {"hotel": "h", "flight": "f"}},
                "search": {"default_max_results": 5}
            })
        );
    }

    #[test]
    fn locked_leaves_survive_and_siblings_merge() {
        let locked = json!({"storage": {"root": "/srv/waypoint"}});
        let mut base = locked.clone();
        merge_json_with_constraints(
            &mut base,
            &json!({"storage": {"root": "/tmp", "directories": {"event": "ev"}}}),
            Some(&locked),
        );
        assert_eq!(
            base,
            json!({"storage": {"root": "/srv/waypoint", "directories": {"event": "ev"}}})
        );
    }
}
