// Copyright 2025 Muvon Un Limited
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Processing-plan descriptors
//!
//! A plan tells the storage side which file to scan, which rows to keep and
//! which columns to return, and how to compress the resulting stream. It is a
//! JSON DAG carried inside a small XML envelope and is opaque to the decoder.

use crate::error::Result;
use crate::stream::CodecKind;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Filter operand: a column of the scanned file or a literal value
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Operand {
    ColumnReference(String),
    Literal(String),
}

impl Operand {
    pub fn column(name: impl Into<String>) -> Self {
        Operand::ColumnReference(name.into())
    }

    pub fn literal(value: impl Into<String>) -> Self {
        Operand::Literal(value.into())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "Expression")]
pub enum Filter {
    IsNotNull {
        #[serde(rename = "Arg")]
        arg: Operand,
    },
    Equal {
        #[serde(rename = "Left")]
        left: Operand,
        #[serde(rename = "Right")]
        right: Operand,
    },
    NotEqual {
        #[serde(rename = "Left")]
        left: Operand,
        #[serde(rename = "Right")]
        right: Operand,
    },
    LessThan {
        #[serde(rename = "Left")]
        left: Operand,
        #[serde(rename = "Right")]
        right: Operand,
    },
    LessThanOrEqual {
        #[serde(rename = "Left")]
        left: Operand,
        #[serde(rename = "Right")]
        right: Operand,
    },
    GreaterThan {
        #[serde(rename = "Left")]
        left: Operand,
        #[serde(rename = "Right")]
        right: Operand,
    },
    GreaterThanOrEqual {
        #[serde(rename = "Left")]
        left: Operand,
        #[serde(rename = "Right")]
        right: Operand,
    },
}

impl Filter {
    pub fn is_not_null(column: impl Into<String>) -> Self {
        Filter::IsNotNull {
            arg: Operand::column(column),
        }
    }

    /// Parse a comparison operator as written in a query (`=`, `<=`, ...)
    pub fn compare(op: &str, left: Operand, right: Operand) -> Option<Self> {
        let filter = match op {
            "=" | "==" => Filter::Equal { left, right },
            "!=" | "<>" => Filter::NotEqual { left, right },
            "<" => Filter::LessThan { left, right },
            "<=" => Filter::LessThanOrEqual { left, right },
            ">" => Filter::GreaterThan { left, right },
            ">=" => Filter::GreaterThanOrEqual { left, right },
            _ => return None,
        };
        Some(filter)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "Type")]
pub enum Node {
    #[serde(rename = "_INPUT")]
    Input {
        #[serde(rename = "Name")]
        name: String,
        #[serde(rename = "File")]
        file: String,
    },
    #[serde(rename = "_FILTER")]
    Filter {
        #[serde(rename = "Name")]
        name: String,
        #[serde(rename = "FilterArray")]
        filters: Vec<Filter>,
    },
    #[serde(rename = "_PROJECTION")]
    Projection {
        #[serde(rename = "Name")]
        name: String,
        #[serde(rename = "ProjectionArray")]
        columns: Vec<String>,
    },
    #[serde(rename = "_OUTPUT")]
    Output {
        #[serde(rename = "Name")]
        name: String,
        #[serde(rename = "CompressionType")]
        compression: String,
        #[serde(rename = "CompressionLevel")]
        level: String,
    },
}

/// Linear pipeline of nodes, executed in array order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dag {
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "NodeArray")]
    pub nodes: Vec<Node>,
}

impl Dag {
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Codec the output node asks for, if it names one we can decode
    pub fn output_codec(&self) -> Option<CodecKind> {
        self.nodes.iter().find_map(|node| match node {
            Node::Output { compression, .. } => compression.parse().ok(),
            _ => None,
        })
    }
}

pub struct PlanBuilder {
    file: String,
    filters: Vec<Filter>,
    projection: Vec<String>,
    codec: CodecKind,
    level: u32,
    row_group_index: u32,
    last_access_time: Option<DateTime<Utc>>,
}

impl PlanBuilder {
    pub fn new(file: impl Into<String>) -> Self {
        Self {
            file: file.into(),
            filters: Vec::new(),
            projection: Vec::new(),
            codec: CodecKind::None,
            level: 1,
            row_group_index: 0,
            last_access_time: None,
        }
    }

    pub fn filter(mut self, filter: Filter) -> Self {
        self.filters.push(filter);
        self
    }

    pub fn project<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.projection.extend(columns.into_iter().map(Into::into));
        self
    }

    pub fn output(mut self, codec: CodecKind, level: u32) -> Self {
        self.codec = codec;
        self.level = level;
        self
    }

    pub fn row_group(mut self, index: u32) -> Self {
        self.row_group_index = index;
        self
    }

    pub fn last_access_time(mut self, at: DateTime<Utc>) -> Self {
        self.last_access_time = Some(at);
        self
    }

    /// Assemble the plan. Empty filter and projection lists produce no node.
    pub fn build(self) -> ProcessingPlan {
        let mut nodes = vec![Node::Input {
            name: "InputNode".to_string(),
            file: self.file,
        }];
        if !self.filters.is_empty() {
            nodes.push(Node::Filter {
                name: "FilterNode".to_string(),
                filters: self.filters,
            });
        }
        if !self.projection.is_empty() {
            nodes.push(Node::Projection {
                name: "ProjectionNode".to_string(),
                columns: self.projection,
            });
        }
        nodes.push(Node::Output {
            name: "OutputNode".to_string(),
            compression: self.codec.wire_name().to_string(),
            level: self.level.to_string(),
        });

        ProcessingPlan {
            dag: Dag {
                name: "DAG Projection".to_string(),
                nodes,
            },
            row_group_index: self.row_group_index,
            last_access_time: self.last_access_time.unwrap_or_else(Utc::now),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessingPlan {
    pub dag: Dag,
    pub row_group_index: u32,
    pub last_access_time: DateTime<Utc>,
}

impl ProcessingPlan {
    /// Render the `Processor` envelope sent when opening a stream
    pub fn to_xml(&self) -> Result<String> {
        let dag = self.dag.to_json()?;
        Ok(format!(
            "<Processor><Name>Lambda</Name><Configuration><DAG>{}</DAG>\
             <RowGroupIndex>{}</RowGroupIndex><LastAccessTime>{}</LastAccessTime>\
             </Configuration></Processor>",
            escape_xml(&dag),
            self.row_group_index,
            self.last_access_time.timestamp_millis()
        ))
    }
}

fn escape_xml(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

#[cfg(test)]
#[path = "plan_test.rs"]
mod plan_test;
