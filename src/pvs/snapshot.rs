//! Typed access to the flat variable dump returned by the PVS.

use crate::error::{PvsError, Result};
use serde_json::Value;
use std::collections::{BTreeSet, HashMap};

/// Prefix under which the PVS publishes per-device variables.
pub const DEVICES_ROOT: &str = "/sys/devices/";

/// A point-in-time dump of the PVS variable namespace.
///
/// Keys are variable paths such as `/sys/devices/meter/0/sn`; values are kept
/// as the strings the device reported. A snapshot is built once per cycle and
/// never mutated afterwards.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Snapshot {
    vars: HashMap<String, String>,
}

impl Snapshot {
    /// Build a snapshot from the `fmt=obj` JSON body.
    ///
    /// Strings, numbers and booleans are kept; nulls, arrays and nested objects
    /// are not scalar variables and are skipped.
    pub fn from_json(value: Value) -> Result<Self> {
        let Value::Object(map) = value else {
            return Err(PvsError::fetch_error("snapshot body is not a JSON object"));
        };

        let vars = map
            .into_iter()
            .filter_map(|(key, value)| scalar_to_string(value).map(|v| (key, v)))
            .collect();

        Ok(Self { vars })
    }

    /// Look up a single variable.
    pub fn get(&self, path: &str) -> Option<&str> {
        self.vars.get(path).map(String::as_str)
    }

    /// Look up a variable, treating a missing one as the empty string.
    pub fn get_or_empty(&self, path: &str) -> &str {
        self.get(path).unwrap_or("")
    }

    /// Whether the variable exists and equals `expected` exactly.
    pub fn is(&self, path: &str, expected: &str) -> bool {
        self.get(path) == Some(expected)
    }

    pub fn len(&self) -> usize {
        self.vars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }

    /// Discover every meter and inverter in one pass over the keys.
    ///
    /// Devices missing a serial number or model name are left out. The result
    /// is ordered by kind (meters first) and then by index.
    pub fn devices(&self) -> Vec<DeviceDescriptor> {
        let mut instances = BTreeSet::new();

        for key in self.vars.keys() {
            let Some(rest) = key.strip_prefix(DEVICES_ROOT) else {
                continue;
            };
            let Some((class, rest)) = rest.split_once('/') else {
                continue;
            };
            let Some(kind) = DeviceKind::from_segment(class) else {
                continue;
            };
            if let Some((index, _)) = rest.split_once('/') {
                if !index.is_empty() {
                    instances.insert((kind, index.to_string()));
                }
            }
        }

        instances
            .into_iter()
            .filter_map(|(kind, index)| {
                let serial = self.get_or_empty(&kind.var_path(&index, "sn"));
                let model = self.get_or_empty(&kind.var_path(&index, "prodMdlNm"));
                if serial.is_empty() || model.is_empty() {
                    return None;
                }
                Some(DeviceDescriptor {
                    kind,
                    serial: serial.to_string(),
                    model: model.to_string(),
                    index,
                })
            })
            .collect()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Snapshot {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            vars: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

fn scalar_to_string(value: Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

/// The two classes of device the PVS reports on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum DeviceKind {
    Meter,
    Inverter,
}

impl DeviceKind {
    /// Path segment under `/sys/devices/`.
    pub fn segment(self) -> &'static str {
        match self {
            DeviceKind::Meter => "meter",
            DeviceKind::Inverter => "inverter",
        }
    }

    /// Value of the `device_type` tag.
    pub fn device_type(self) -> &'static str {
        match self {
            DeviceKind::Meter => "Power Meter",
            DeviceKind::Inverter => "Inverter",
        }
    }

    fn from_segment(segment: &str) -> Option<Self> {
        match segment {
            "meter" => Some(DeviceKind::Meter),
            "inverter" => Some(DeviceKind::Inverter),
            _ => None,
        }
    }

    /// Full variable path for one leaf of one device instance.
    pub fn var_path(self, index: &str, leaf: &str) -> String {
        format!("{}{}/{}/{}", DEVICES_ROOT, self.segment(), index, leaf)
    }
}

/// Which side of the service panel a meter measures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MeterMode {
    Production,
    Consumption,
    Unknown,
}

impl MeterMode {
    /// Derive the mode from the trailing letter of the model name.
    pub fn from_model(model: &str) -> Self {
        match model.chars().last().map(|c| c.to_ascii_lowercase()) {
            Some('p') => MeterMode::Production,
            Some('c') => MeterMode::Consumption,
            _ => MeterMode::Unknown,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            MeterMode::Production => "production",
            MeterMode::Consumption => "consumption",
            MeterMode::Unknown => "unknown",
        }
    }
}

/// One physical meter or inverter found in a snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceDescriptor {
    pub kind: DeviceKind,
    /// Index segment from the variable path (not necessarily numeric)
    pub index: String,
    pub serial: String,
    pub model: String,
}

impl DeviceDescriptor {
    /// Read one variable belonging to this device.
    pub fn var<'a>(&self, snapshot: &'a Snapshot, leaf: &str) -> Option<&'a str> {
        snapshot.get(&self.kind.var_path(&self.index, leaf))
    }

    /// Meter mode derived from the model name. Only meaningful for meters.
    pub fn meter_mode(&self) -> MeterMode {
        MeterMode::from_model(&self.model)
    }
}
