use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::{json, Map, Value};

pub const TEMPLATE_FORMAT_VERSION: &str = "2010-09-09";

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Resource {
    pub logical_id: String,
    pub resource_type: String,
    pub properties: Value,
    pub depends_on: Vec<String>,
}

impl Resource {
    pub fn new(logical_id: &str, resource_type: &str, properties: Value) -> Self {
        Self {
            logical_id: logical_id.to_string(),
            resource_type: resource_type.to_string(),
            properties,
            depends_on: Vec::new(),
        }
    }

    pub fn depends_on(mut self, logical_id: &str) -> Self {
        self.depends_on.push(logical_id.to_string());
        self
    }

    fn to_template_entry(&self) -> Value {
        let mut entry = Map::new();
        entry.insert("Type".to_string(), json!(self.resource_type));
        entry.insert("Properties".to_string(), self.properties.clone());
        if !self.depends_on.is_empty() {
            entry.insert("DependsOn".to_string(), json!(self.depends_on));
        }
        Value::Object(entry)
    }
}

/// Ordered set of logical resources plus stack outputs.
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct StackManifest {
    pub description: String,
    pub resources: Vec<Resource>,
    pub outputs: BTreeMap<String, Value>,
}

impl StackManifest {
    pub fn resource(&self, logical_id: &str) -> Option<&Resource> {
        self.resources
            .iter()
            .find(|resource| resource.logical_id == logical_id)
    }

    pub fn resources_of_type<'a>(
        &'a self,
        resource_type: &'a str,
    ) -> impl Iterator<Item = &'a Resource> + 'a {
        self.resources
            .iter()
            .filter(move |resource| resource.resource_type == resource_type)
    }

    pub fn to_template(&self) -> Value {
        let resources: Map<String, Value> = self
            .resources
            .iter()
            .map(|resource| (resource.logical_id.clone(), resource.to_template_entry()))
            .collect();
        let outputs: Map<String, Value> = self
            .outputs
            .iter()
            .map(|(name, value)| (name.clone(), json!({ "Value": value })))
            .collect();

        json!({
            "AWSTemplateFormatVersion": TEMPLATE_FORMAT_VERSION,
            "Description": self.description,
            "Resources": resources,
            "Outputs": outputs,
        })
    }
}

pub fn reference(logical_id: &str) -> Value {
    json!({ "Ref": logical_id })
}

pub fn attribute(logical_id: &str, name: &str) -> Value {
    json!({ "Fn::GetAtt": [logical_id, name] })
}
