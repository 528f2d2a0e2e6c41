//! Built-in circuits rendered for the electronics articles
//!
//! Net 2 is the supply/input rail and net 4 is ground in every circuit.

use std::path::{Path, PathBuf};

use tracing::warn;

use super::database::{load_netlist, Cell, Netlist, NetlistBuilder};
use crate::core::{BatchReport, GenerateError, Result};

/// A named netlist ready to render
#[derive(Debug, Clone, PartialEq)]
pub struct Circuit {
    pub name: String,
    pub description: String,
    pub netlist: Netlist,
}

impl Circuit {
    pub fn new(name: impl Into<String>, description: impl Into<String>, netlist: Netlist) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            netlist,
        }
    }

    /// A circuit read from a netlist JSON file, named after the file stem
    pub fn from_file(path: &Path) -> Result<Self> {
        let name = path
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .ok_or_else(|| {
                GenerateError::netlist_error(format!("{} has no file name", path.display()))
            })?;
        let netlist = load_netlist(path)?;
        Ok(Self::new(name, format!("From {}", path.display()), netlist))
    }
}

/// Load every netlist file, recording the ones that cannot be read
///
/// The report only holds failures; the loaded circuits still have to be
/// rendered.
pub fn load_circuit_files(paths: &[PathBuf]) -> (Vec<Circuit>, BatchReport) {
    let mut circuits = Vec::with_capacity(paths.len());
    let mut report = BatchReport::new();
    for path in paths {
        match Circuit::from_file(path) {
            Ok(circuit) => circuits.push(circuit),
            Err(err) => {
                warn!(path = %path.display(), error = %err, "Skipping netlist file");
                report.record_failure(path.display().to_string(), err);
            }
        }
    }
    (circuits, report)
}

fn passive(cell_type: &str, from: u32, to: u32, value: &str) -> Cell {
    Cell::two_terminal(cell_type, ("A", from), ("B", to)).with_attribute("value", value)
}

fn rc_lowpass() -> Circuit {
    let netlist = NetlistBuilder::new("rc_lowpass")
        .input("Vin", [2])
        .output("Vout", [3])
        .input("GND", [4])
        .cell("R1", passive("r_v", 2, 5, "1kΩ"))
        .cell("C1", passive("c_v", 5, 4, "100nF"))
        .build();
    Circuit::new("rc_lowpass", "Simple RC low-pass filter", netlist)
}

fn voltage_divider() -> Circuit {
    let netlist = NetlistBuilder::new("voltage_divider")
        .input("Vin", [2])
        .output("Vout", [3])
        .input("GND", [4])
        .cell("R1", passive("r_v", 2, 5, "10kΩ"))
        .cell("R2", passive("r_v", 5, 4, "10kΩ"))
        .build();
    Circuit::new("voltage_divider", "Two-resistor voltage divider", netlist)
}

fn led_circuit() -> Circuit {
    let led = Cell::two_terminal("d_v", ("A", 5), ("C", 4)).with_attribute("type", "LED");
    let netlist = NetlistBuilder::new("led_circuit")
        .input("Vcc", [2])
        .input("GND", [4])
        .cell("R1", passive("r_v", 2, 5, "220Ω"))
        .cell("LED1", led)
        .build();
    Circuit::new(
        "led_circuit",
        "LED with current limiting resistor",
        netlist,
    )
}

fn rlc_series() -> Circuit {
    let netlist = NetlistBuilder::new("rlc_series")
        .input("Vin", [2])
        .input("GND", [4])
        .cell("R1", passive("r_v", 2, 5, "100Ω"))
        .cell("L1", passive("l_v", 5, 6, "10mH"))
        .cell("C1", passive("c_v", 6, 4, "100µF"))
        .build();
    Circuit::new("rlc_series", "RLC series circuit", netlist)
}

/// All built-in circuits, in render order
pub fn builtin_circuits() -> Vec<Circuit> {
    vec![rc_lowpass(), voltage_divider(), led_circuit(), rlc_series()]
}

/// Look up a built-in circuit by name
pub fn find_circuit(name: &str) -> Result<Circuit> {
    builtin_circuits()
        .into_iter()
        .find(|c| c.name == name)
        .ok_or_else(|| GenerateError::UnknownCircuit {
            name: name.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_builtin_names() {
        let names: Vec<_> = builtin_circuits().into_iter().map(|c| c.name).collect();
        assert_eq!(
            names,
            vec!["rc_lowpass", "voltage_divider", "led_circuit", "rlc_series"]
        );
    }

    #[test]
    fn test_builtins_are_valid() {
        for circuit in builtin_circuits() {
            circuit.netlist.validate().unwrap();
            assert!(circuit.netlist.modules.contains_key(&circuit.name));
        }
    }

    #[test]
    fn test_rlc_series_wiring() {
        let circuit = find_circuit("rlc_series").unwrap();
        let module = &circuit.netlist.modules["rlc_series"];
        assert_eq!(module.cells.len(), 3);
        assert_eq!(module.nets(), BTreeSet::from([2, 4, 5, 6]));
        assert_eq!(module.cells["L1"].attributes["value"], "10mH");
    }

    #[test]
    fn test_led_uses_cathode_pin() {
        let circuit = find_circuit("led_circuit").unwrap();
        let led = &circuit.netlist.modules["led_circuit"].cells["LED1"];
        assert_eq!(led.cell_type, "d_v");
        assert!(led.connections.contains_key("C"));
        assert!(!led.attributes.contains_key("value"));
    }

    #[test]
    fn test_unknown_circuit() {
        let err = find_circuit("flux_capacitor").unwrap_err();
        assert!(matches!(err, GenerateError::UnknownCircuit { .. }));
    }

    #[test]
    fn test_circuit_from_file_uses_stem() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("buffer.json");
        fs::write(&path, r#"{"modules":{"buffer":{}}}"#).unwrap();

        let circuit = Circuit::from_file(&path).unwrap();
        assert_eq!(circuit.name, "buffer");
        assert_eq!(circuit.netlist.module_count(), 1);
    }

    #[test]
    fn test_bad_file_does_not_stop_loading() {
        let dir = tempdir().unwrap();
        let good = dir.path().join("good.json");
        let bad = dir.path().join("bad.json");
        let missing = dir.path().join("missing.json");
        fs::write(&good, r#"{"modules":{"good":{}}}"#).unwrap();
        fs::write(&bad, "{ not json").unwrap();

        let (circuits, report) = load_circuit_files(&[bad.clone(), good, missing]);
        assert_eq!(circuits.len(), 1);
        assert_eq!(circuits[0].name, "good");
        assert_eq!(report.failed(), 2);
        assert_eq!(report.generated(), 0);
        assert_eq!(report.failures()[0].name, bad.display().to_string());
    }
}
