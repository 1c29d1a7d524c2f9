//! Human-readable descriptions of what a sensor array measures.

/// Name, symbol and units of a measured quantity, used for labels and
/// sensor tags.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SensorDescriptor {
    /// Quantity name, e.g. `"Temperature"`.
    pub name: String,
    /// Short symbol, e.g. `"T"`.
    pub symbol: String,
    /// Units, e.g. `"°C"`.
    pub units: String,
    /// Prefix for sensor tags, e.g. `"TC"`.
    pub tag: String,
    /// Component suffixes, one per field component. `None` for
    /// single-component quantities.
    pub components: Option<Vec<String>>,
}

impl Default for SensorDescriptor {
    fn default() -> Self {
        Self {
            name: "Measured Value".to_string(),
            symbol: "m".to_string(),
            units: "-".to_string(),
            tag: "S".to_string(),
            components: None,
        }
    }
}

impl SensorDescriptor {
    /// Thermocouples.
    pub fn temperature() -> Self {
        Self {
            name: "Temperature".to_string(),
            symbol: "T".to_string(),
            units: "°C".to_string(),
            tag: "TC".to_string(),
            components: None,
        }
    }

    /// Displacement sensors with `x`, `y`, `z` components.
    pub fn displacement() -> Self {
        Self {
            name: "Displacement".to_string(),
            symbol: "u".to_string(),
            units: "m".to_string(),
            tag: "DS".to_string(),
            components: Some(vec!["x".into(), "y".into(), "z".into()]),
        }
    }

    /// In-plane strain gauges with `xx`, `yy`, `xy` components.
    pub fn strain() -> Self {
        Self {
            name: "Strain".to_string(),
            symbol: "e".to_string(),
            units: "mm/mm".to_string(),
            tag: "SG".to_string(),
            components: Some(vec!["xx".into(), "yy".into(), "xy".into()]),
        }
    }

    /// Axis label such as `"Displacement u_x [m]"`.
    ///
    /// The component suffix is omitted when `comp` is `None` or out of
    /// range.
    pub fn create_label(&self, comp: Option<usize>) -> String {
        let suffix = comp.and_then(|c| self.components.as_ref()?.get(c));
        match suffix {
            Some(s) => format!("{} {}_{} [{}]", self.name, self.symbol, s, self.units),
            None => format!("{} {} [{}]", self.name, self.symbol, self.units),
        }
    }

    /// Tags `tag0`, `tag1`, ... zero-padded to the width of `n_sensors`.
    pub fn create_sensor_tags(&self, n_sensors: usize) -> Vec<String> {
        let width = n_sensors.to_string().len();
        (0..n_sensors)
            .map(|i| format!("{}{:0width$}", self.tag, i))
            .collect()
    }
}
