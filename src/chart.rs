//! Chart specification builder.
//!
//! Turns a normalized query result plus a small set of column choices
//! into a declarative bar or pie chart description, without the caller
//! writing any plotting code. The spec also carries generated Plotly
//! code as a string, for transparency; nothing here executes it.

use crate::db::{QueryResult, Value};
use crate::error::{CharterError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

/// Supported chart kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChartKind {
    Bar,
    Pie,
}

impl ChartKind {
    /// Returns the kind as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Bar => "bar",
            Self::Pie => "pie",
        }
    }
}

impl fmt::Display for ChartKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ChartKind {
    type Err = CharterError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "bar" => Ok(Self::Bar),
            "pie" => Ok(Self::Pie),
            other => Err(CharterError::chart(format!(
                "unsupported chart kind '{other}'; supported kinds are 'bar' and 'pie'"
            ))),
        }
    }
}

/// A request to derive a chart from a query result.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartRequest {
    /// Chart kind.
    pub kind: ChartKind,

    /// Column supplying the category labels.
    pub label_column: String,

    /// Columns supplying numeric values, one series each.
    pub value_columns: Vec<String>,

    /// Custom title; a default is derived when absent.
    #[serde(default)]
    pub title: Option<String>,
}

/// One aggregated (label, value) pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartPoint {
    pub label: String,
    pub value: f64,
}

/// One series of points, named after its value column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartSeries {
    pub name: String,
    pub points: Vec<ChartPoint>,
}

/// A declarative, backend-agnostic chart description. Derived from a
/// query result, never persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartSpec {
    /// Chart kind.
    pub kind: ChartKind,

    /// Chart title.
    pub title: String,

    /// One series per requested value column.
    pub series: Vec<ChartSeries>,

    /// Generated Plotly code that would render this chart.
    /// Informational only.
    pub render_code: String,
}

/// Builds a chart specification from a query result.
///
/// Duplicate label values are aggregated by summing each value column;
/// label groups keep the order in which they first appear in the input
/// rows. Value cells that do not parse as numbers after whitespace
/// trimming count as 0, so one bad cell does not abort the chart.
pub fn build_chart(result: &QueryResult, request: &ChartRequest) -> Result<ChartSpec> {
    let label_index = column_index(result, &request.label_column)?;

    if request.value_columns.is_empty() {
        return Err(CharterError::chart(
            "at least one value column is required",
        ));
    }
    let value_indexes: Vec<usize> = request
        .value_columns
        .iter()
        .map(|name| column_index(result, name))
        .collect::<Result<_>>()?;

    if request.kind == ChartKind::Pie && request.value_columns.len() > 1 {
        return Err(CharterError::chart(format!(
            "pie charts accept a single value series, got {}",
            request.value_columns.len()
        )));
    }

    // Sum per label, per series, keeping first-seen label order.
    let mut labels: Vec<String> = Vec::new();
    let mut positions: HashMap<String, usize> = HashMap::new();
    let mut sums: Vec<Vec<f64>> = vec![Vec::new(); value_indexes.len()];

    for row in &result.rows {
        let label = row
            .get(label_index)
            .map(Value::to_display_string)
            .unwrap_or_else(|| "NULL".to_string());

        let position = *positions.entry(label.clone()).or_insert_with(|| {
            labels.push(label.clone());
            for series_sums in &mut sums {
                series_sums.push(0.0);
            }
            labels.len() - 1
        });

        for (series, &value_index) in value_indexes.iter().enumerate() {
            let cell = row.get(value_index).unwrap_or(&Value::Null);
            sums[series][position] += coerce_numeric(cell);
        }
    }

    let series: Vec<ChartSeries> = request
        .value_columns
        .iter()
        .zip(sums)
        .map(|(name, series_sums)| ChartSeries {
            name: name.clone(),
            points: labels
                .iter()
                .zip(series_sums)
                .map(|(label, value)| ChartPoint {
                    label: label.clone(),
                    value,
                })
                .collect(),
        })
        .collect();

    let title = request
        .title
        .clone()
        .unwrap_or_else(|| default_title(request));
    let render_code = render_code(request, &title);

    Ok(ChartSpec {
        kind: request.kind,
        title,
        series,
        render_code,
    })
}

fn column_index(result: &QueryResult, name: &str) -> Result<usize> {
    result.column_index(name).ok_or_else(|| {
        CharterError::column_not_found(format!(
            "column '{name}' not found in query result; available columns: {}",
            result.columns.join(", ")
        ))
    })
}

/// Lenient numeric coercion for aggregation. Booleans count as 1/0,
/// anything else non-numeric as 0.
fn coerce_numeric(value: &Value) -> f64 {
    match value {
        Value::Null => 0.0,
        Value::Bool(b) => {
            if *b {
                1.0
            } else {
                0.0
            }
        }
        Value::Int(i) => *i as f64,
        Value::Float(f) => *f,
        Value::String(s) => s.trim().parse::<f64>().unwrap_or(0.0),
    }
}

fn default_title(request: &ChartRequest) -> String {
    let values = request.value_columns.join(", ");
    match request.kind {
        ChartKind::Bar => format!("Bar Chart: {} vs {}", request.label_column, values),
        ChartKind::Pie => format!("Pie Chart: {} by {}", values, request.label_column),
    }
}

/// Generates Plotly Express code that would recreate the chart.
fn render_code(request: &ChartRequest, title: &str) -> String {
    let mut code = vec![
        "import pandas as pd".to_string(),
        "import plotly.express as px".to_string(),
        String::new(),
        "# df holds the query result".to_string(),
    ];

    match request.kind {
        ChartKind::Bar => {
            let y = if request.value_columns.len() == 1 {
                format!("'{}'", request.value_columns[0])
            } else {
                format!(
                    "[{}]",
                    request
                        .value_columns
                        .iter()
                        .map(|c| format!("'{c}'"))
                        .collect::<Vec<_>>()
                        .join(", ")
                )
            };
            code.push(format!(
                "grouped = df.groupby('{}', sort=False, as_index=False).sum()",
                request.label_column
            ));
            code.push(format!(
                "fig = px.bar(grouped, x='{}', y={}, title='{}')",
                request.label_column, y, title
            ));
        }
        ChartKind::Pie => {
            code.push(format!(
                "grouped = df.groupby('{}', sort=False, as_index=False)['{}'].sum()",
                request.label_column, request.value_columns[0]
            ));
            code.push(format!(
                "fig = px.pie(grouped, names='{}', values='{}', title='{}')",
                request.label_column, request.value_columns[0], title
            ));
        }
    }

    code.push(String::new());
    code.push("fig.show()".to_string());
    code.join("\n")
}
