//! In-memory stand-in for the BDL API.
#![allow(dead_code)]

use bdl_rs::models::{Observation, UnitData, VariableMeta};
use bdl_rs::{DataSource, Error, Result};
use std::cell::RefCell;
use std::collections::HashMap;

#[derive(Default)]
pub struct FakeSource {
    variables: HashMap<String, String>,
    units: HashMap<String, String>,
    calls: RefCell<Vec<String>>,
    unit_requests: RefCell<Vec<(String, Vec<String>, Vec<i32>)>>,
}

impl FakeSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a `variables/{id}` payload; the id is read from the JSON.
    pub fn with_variable(mut self, json: &str) -> Self {
        let meta: VariableMeta = serde_json::from_str(json).unwrap();
        self.variables.insert(meta.id, json.to_string());
        self
    }

    /// Register a `data/by-unit/{id}` payload under the given unit id.
    pub fn with_unit(mut self, unit_id: &str, json: &str) -> Self {
        self.units.insert(unit_id.to_string(), json.to_string());
        self
    }

    pub fn variable_calls(&self) -> Vec<String> {
        self.calls.borrow().clone()
    }

    pub fn unit_requests(&self) -> Vec<(String, Vec<String>, Vec<i32>)> {
        self.unit_requests.borrow().clone()
    }
}

fn not_found(what: &str) -> Error {
    Error::Parse(format!("no fake payload for {what}"))
}

impl DataSource for FakeSource {
    fn variable_meta(&self, variable_id: &str) -> Result<VariableMeta> {
        self.calls.borrow_mut().push(variable_id.to_string());
        let json = self
            .variables
            .get(variable_id)
            .ok_or_else(|| not_found(variable_id))?;
        Ok(serde_json::from_str(json).unwrap())
    }

    fn unit_observations(
        &self,
        unit_id: &str,
        variable_ids: &[String],
        years: &[i32],
    ) -> Result<Vec<Observation>> {
        self.unit_requests.borrow_mut().push((
            unit_id.to_string(),
            variable_ids.to_vec(),
            years.to_vec(),
        ));
        let json = self.units.get(unit_id).ok_or_else(|| not_found(unit_id))?;
        let data: UnitData = serde_json::from_str(json).unwrap();
        Ok(data.into_observations())
    }
}
