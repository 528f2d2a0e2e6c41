//! Netlist data model
//!
//! Mirrors the Yosys-style JSON netlistsvg consumes: modules with ports and
//! cells, wired together through numeric bit identifiers. Maps are sorted so
//! the written JSON is reproducible. Keys the model does not name (`netnames`,
//! `parameters`, module `attributes`, `creator`, ...) are kept in `extra` and
//! written back unchanged.

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::core::{GenerateError, Result};

/// Signal direction of a module port or cell pin
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PortDirection {
    Input,
    Output,
}

/// A wire: either a numbered net or a constant driver such as `"0"` or `"x"`
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Bit {
    Net(u32),
    Constant(String),
}

impl From<u32> for Bit {
    fn from(net: u32) -> Self {
        Bit::Net(net)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Port {
    pub direction: PortDirection,
    pub bits: Vec<Bit>,
}

/// A component instance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cell {
    /// Skin symbol, e.g. `r_v` for a vertical resistor
    #[serde(rename = "type")]
    pub cell_type: String,
    #[serde(default)]
    pub port_directions: BTreeMap<String, PortDirection>,
    #[serde(default)]
    pub connections: BTreeMap<String, Vec<Bit>>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub attributes: BTreeMap<String, Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Cell {
    pub fn new(cell_type: impl Into<String>) -> Self {
        Self {
            cell_type: cell_type.into(),
            port_directions: BTreeMap::new(),
            connections: BTreeMap::new(),
            attributes: BTreeMap::new(),
            extra: Map::new(),
        }
    }

    /// Two-pin component: current flows from `input` to `output`
    pub fn two_terminal(
        cell_type: impl Into<String>,
        input: (&str, u32),
        output: (&str, u32),
    ) -> Self {
        Self::new(cell_type)
            .with_pin(input.0, PortDirection::Input, [input.1])
            .with_pin(output.0, PortDirection::Output, [output.1])
    }

    pub fn with_pin<I, B>(mut self, pin: &str, direction: PortDirection, bits: I) -> Self
    where
        I: IntoIterator<Item = B>,
        B: Into<Bit>,
    {
        self.port_directions.insert(pin.to_string(), direction);
        self.connections
            .insert(pin.to_string(), bits.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_attribute(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.attributes.insert(key.to_string(), value.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Module {
    #[serde(default)]
    pub ports: BTreeMap<String, Port>,
    #[serde(default)]
    pub cells: BTreeMap<String, Cell>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Module {
    /// Every numbered net referenced by a port or a cell
    pub fn nets(&self) -> BTreeSet<u32> {
        let port_bits = self.ports.values().flat_map(|p| p.bits.iter());
        let cell_bits = self
            .cells
            .values()
            .flat_map(|c| c.connections.values().flatten());
        port_bits
            .chain(cell_bits)
            .filter_map(|bit| match bit {
                Bit::Net(n) => Some(*n),
                Bit::Constant(_) => None,
            })
            .collect()
    }
}

/// A complete netlist document
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Netlist {
    pub modules: BTreeMap<String, Module>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Netlist {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn module_count(&self) -> usize {
        self.modules.len()
    }

    pub fn cell_count(&self) -> usize {
        self.modules.values().map(|m| m.cells.len()).sum()
    }

    /// Check the shape netlistsvg relies on
    ///
    /// At least one module, and every cell connection has a declared pin
    /// direction.
    pub fn validate(&self) -> Result<()> {
        if self.modules.is_empty() {
            return Err(GenerateError::netlist_error("netlist has no modules"));
        }
        for (module_name, module) in &self.modules {
            for (cell_name, cell) in &module.cells {
                if let Some(pin) = cell
                    .connections
                    .keys()
                    .find(|pin| !cell.port_directions.contains_key(*pin))
                {
                    return Err(GenerateError::netlist_error(format!(
                        "{}.{}: connection '{}' has no port direction",
                        module_name, cell_name, pin
                    )));
                }
            }
        }
        Ok(())
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let netlist: Netlist = serde_json::from_str(json)?;
        netlist.validate()?;
        Ok(netlist)
    }
}

/// Read and validate a netlist JSON file
pub fn load_netlist(path: impl AsRef<Path>) -> Result<Netlist> {
    let path = path.as_ref();
    let json = fs::read_to_string(path)?;
    Netlist::from_json(&json).map_err(|err| match err {
        GenerateError::Netlist { message } => {
            GenerateError::netlist_error(format!("{}: {}", path.display(), message))
        }
        other => other,
    })
}

/// Fluent construction of a single-module netlist
pub struct NetlistBuilder {
    name: String,
    module: Module,
}

impl NetlistBuilder {
    pub fn new(module_name: impl Into<String>) -> Self {
        Self {
            name: module_name.into(),
            module: Module::default(),
        }
    }

    pub fn input(self, port: &str, bits: impl IntoIterator<Item = u32>) -> Self {
        self.port(port, PortDirection::Input, bits)
    }

    pub fn output(self, port: &str, bits: impl IntoIterator<Item = u32>) -> Self {
        self.port(port, PortDirection::Output, bits)
    }

    fn port(
        mut self,
        port: &str,
        direction: PortDirection,
        bits: impl IntoIterator<Item = u32>,
    ) -> Self {
        self.module.ports.insert(
            port.to_string(),
            Port {
                direction,
                bits: bits.into_iter().map(Bit::Net).collect(),
            },
        );
        self
    }

    pub fn cell(mut self, name: &str, cell: Cell) -> Self {
        self.module.cells.insert(name.to_string(), cell);
        self
    }

    pub fn build(self) -> Netlist {
        let mut netlist = Netlist::new();
        netlist.modules.insert(self.name, self.module);
        netlist
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn divider() -> Netlist {
        NetlistBuilder::new("divider")
            .input("Vin", [2])
            .output("Vout", [3])
            .cell(
                "R1",
                Cell::two_terminal("r_v", ("A", 2), ("B", 5)).with_attribute("value", "10kΩ"),
            )
            .build()
    }

    #[test]
    fn test_builder_counts() {
        let netlist = divider();
        assert_eq!(netlist.module_count(), 1);
        assert_eq!(netlist.cell_count(), 1);
        assert_eq!(
            netlist.modules["divider"].nets(),
            BTreeSet::from([2, 3, 5])
        );
    }

    #[test]
    fn test_json_shape() {
        let value = serde_json::to_value(divider()).unwrap();
        let cell = &value["modules"]["divider"]["cells"]["R1"];
        assert_eq!(cell["type"], "r_v");
        assert_eq!(cell["port_directions"]["A"], "input");
        assert_eq!(cell["connections"]["B"], serde_json::json!([5]));
        assert_eq!(cell["attributes"]["value"], "10kΩ");
        assert_eq!(
            value["modules"]["divider"]["ports"]["Vout"]["direction"],
            "output"
        );
    }

    #[test]
    fn test_constant_bits_parse() {
        let json = r#"{"modules":{"m":{"ports":{"tie":{"direction":"input","bits":["0", 7]}}}}}"#;
        let netlist = Netlist::from_json(json).unwrap();
        let bits = &netlist.modules["m"].ports["tie"].bits;
        assert_eq!(bits, &vec![Bit::Constant("0".to_string()), Bit::Net(7)]);
        assert_eq!(netlist.modules["m"].nets(), BTreeSet::from([7]));
    }

    #[test]
    fn test_yosys_output_keeps_unmodelled_keys() {
        let json = r#"{
            "creator": "Yosys 0.38",
            "modules": {
                "counter": {
                    "attributes": {"top": "00000000000000000000000000000001"},
                    "ports": {"clk": {"direction": "input", "bits": [2]}},
                    "cells": {
                        "$add$1": {
                            "hide_name": 1,
                            "type": "$add",
                            "parameters": {"A_WIDTH": 8},
                            "port_directions": {"A": "input", "Y": "output"},
                            "connections": {"A": [2], "Y": [3]}
                        }
                    },
                    "netnames": {"clk": {"hide_name": 0, "bits": [2]}}
                }
            }
        }"#;
        let original: Value = serde_json::from_str(json).unwrap();
        let netlist = Netlist::from_json(json).unwrap();
        assert_eq!(netlist.extra["creator"], "Yosys 0.38");
        assert!(netlist.modules["counter"].extra.contains_key("netnames"));

        let written: Value = serde_json::from_str(&netlist.to_json_pretty().unwrap()).unwrap();
        assert_eq!(written, original);
    }

    #[test]
    fn test_validate_rejects_undeclared_pin() {
        let mut cell = Cell::new("r_v");
        cell.connections.insert("A".to_string(), vec![Bit::Net(1)]);
        let netlist = NetlistBuilder::new("m").cell("R1", cell).build();
        let err = netlist.validate().unwrap_err();
        assert!(err.to_string().contains("m.R1"));
    }

    #[test]
    fn test_validate_rejects_empty() {
        assert!(Netlist::new().validate().is_err());
    }
}
