use serde_json::Value;

use crate::foundation::error::{ScanError, ScanResult};

/// User-tunable scanner parameters.
///
/// Values produced by [`normalize_settings`] are always finite and inside the documented ranges.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    /// Base survival probability of a sample, `[0.05, 1]`.
    pub density: f64,
    /// How strongly edges lower the density cutoff and boost intensity, `[0, 10]`.
    pub edge_focus: f64,
    /// Vertical lift applied to bright samples, in source pixels, `[0, 2200]`.
    pub depth: f64,
    /// Half-height of the visible band around the wave phase, `[40, 260]`.
    pub thickness: f64,
    /// Sweep speed multiplier, `[0.8, 8]`.
    pub speed: f64,
    /// Opacity of the black scrim over the source in composite mode, `[0, 0.95]`.
    pub bg_darken: f64,
    /// Sample grid spacing in source pixels, `[4, 16]`.
    pub block_size: f64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            density: 0.25,
            edge_focus: 5.0,
            depth: 1200.0,
            thickness: 100.0,
            speed: 3.0,
            bg_darken: 0.15,
            block_size: 6.0,
        }
    }
}

struct FieldSpec {
    key: &'static str,
    min: f64,
    max: f64,
    get: fn(&Settings) -> f64,
    set: fn(&mut Settings, f64),
}

const FIELDS: [FieldSpec; 7] = [
    FieldSpec {
        key: "density",
        min: 0.05,
        max: 1.0,
        get: |s| s.density,
        set: |s, v| s.density = v,
    },
    FieldSpec {
        key: "edgeFocus",
        min: 0.0,
        max: 10.0,
        get: |s| s.edge_focus,
        set: |s, v| s.edge_focus = v,
    },
    FieldSpec {
        key: "depth",
        min: 0.0,
        max: 2200.0,
        get: |s| s.depth,
        set: |s, v| s.depth = v,
    },
    FieldSpec {
        key: "thickness",
        min: 40.0,
        max: 260.0,
        get: |s| s.thickness,
        set: |s, v| s.thickness = v,
    },
    FieldSpec {
        key: "speed",
        min: 0.8,
        max: 8.0,
        get: |s| s.speed,
        set: |s, v| s.speed = v,
    },
    FieldSpec {
        key: "bgDarken",
        min: 0.0,
        max: 0.95,
        get: |s| s.bg_darken,
        set: |s, v| s.bg_darken = v,
    },
    FieldSpec {
        key: "blockSize",
        min: 4.0,
        max: 16.0,
        get: |s| s.block_size,
        set: |s, v| s.block_size = v,
    },
];

impl Settings {
    /// JSON keys accepted by [`normalize_settings`] and [`Settings::with_field`].
    pub fn field_names() -> impl Iterator<Item = &'static str> {
        FIELDS.iter().map(|f| f.key)
    }

    /// Inclusive `(min, max)` range for a field key, if the key is known.
    pub fn field_range(key: &str) -> Option<(f64, f64)> {
        FIELDS
            .iter()
            .find(|f| f.key == key)
            .map(|f| (f.min, f.max))
    }

    /// Return a copy with one field replaced by an untrusted textual value.
    ///
    /// The result goes through the same coercion and clamping as [`normalize_settings`]; only an
    /// unknown key is an error.
    pub fn with_field(&self, key: &str, raw: &str) -> ScanResult<Self> {
        let field = FIELDS
            .iter()
            .find(|f| f.key == key)
            .ok_or_else(|| ScanError::validation(format!("unknown setting '{key}'")))?;
        let mut out = *self;
        let value = coerce_str(raw).unwrap_or_else(|| (field.get)(self));
        (field.set)(&mut out, value.clamp(field.min, field.max));
        Ok(out)
    }
}

/// Coerce an untrusted settings record into a valid [`Settings`].
///
/// Missing, `null`, non-numeric and non-finite fields fall back to the defaults; everything is
/// then clamped into range. Anything that is not a JSON object yields the defaults.
pub fn normalize_settings(raw: Option<&Value>) -> Settings {
    let defaults = Settings::default();
    let mut out = defaults;
    let obj = raw.and_then(Value::as_object);

    for field in &FIELDS {
        let value = obj
            .and_then(|o| o.get(field.key))
            .and_then(coerce_value)
            .unwrap_or_else(|| (field.get)(&defaults));
        (field.set)(&mut out, value.clamp(field.min, field.max));
    }
    out
}

fn coerce_value(v: &Value) -> Option<f64> {
    match v {
        Value::Number(n) => n.as_f64().filter(|x| x.is_finite()),
        Value::String(s) => coerce_str(s),
        _ => None,
    }
}

fn coerce_str(s: &str) -> Option<f64> {
    s.trim().parse::<f64>().ok().filter(|x| x.is_finite())
}

#[cfg(test)]
#[path = "../../tests/unit/settings/normalize.rs"]
mod tests;
