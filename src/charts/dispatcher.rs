use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, error};

use crate::error::{Result, ServiceError};
use crate::xlsx::Cell;

use super::interface::ChartRenderer;
use super::table::{normalize, Table};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChartKind {
    Bar,
    Line,
    Scatter,
    Pie,
    Histogram,
}

impl FromStr for ChartKind {
    type Err = ServiceError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "bar" => Ok(ChartKind::Bar),
            "line" => Ok(ChartKind::Line),
            "scatter" => Ok(ChartKind::Scatter),
            "pie" => Ok(ChartKind::Pie),
            "histogram" => Ok(ChartKind::Histogram),
            other => Err(ServiceError::UnsupportedChartKind(other.to_string())),
        }
    }
}

impl fmt::Display for ChartKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ChartKind::Bar => "bar",
            ChartKind::Line => "line",
            ChartKind::Scatter => "scatter",
            ChartKind::Pie => "pie",
            ChartKind::Histogram => "histogram",
        };
        f.write_str(name)
    }
}

/// Paired x/y columns for bar, line and scatter charts.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct XySeries {
    pub x_label: String,
    pub y_label: String,
    pub x: Vec<Cell>,
    pub y: Vec<Cell>,
}

/// What the renderer receives: the requested columns projected out of the
/// table, shaped for one chart kind.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ChartSpec {
    Bar(XySeries),
    Line(XySeries),
    Scatter(XySeries),
    /// Slices labelled by the x column, sized by the y column.
    Pie {
        label: String,
        labels: Vec<String>,
        values: Vec<f64>,
    },
    /// Only the y column is binned.
    Histogram {
        label: String,
        values: Vec<f64>,
        bins: usize,
    },
}

impl ChartSpec {
    pub fn kind(&self) -> ChartKind {
        match self {
            ChartSpec::Bar(_) => ChartKind::Bar,
            ChartSpec::Line(_) => ChartKind::Line,
            ChartSpec::Scatter(_) => ChartKind::Scatter,
            ChartSpec::Pie { .. } => ChartKind::Pie,
            ChartSpec::Histogram { .. } => ChartKind::Histogram,
        }
    }
}

/// Validate a chart request against `table` and project the columns it needs.
///
/// Every missing column is reported at once, before the kind is looked at.
pub fn plan(table: &Table, chart_kind: &str, x_column: &str, y_column: &str, bins: usize) -> Result<ChartSpec> {
    let (x, y) = (normalize(x_column), normalize(y_column));

    let mut missing = Vec::new();
    for name in [&x, &y] {
        if table.column_index(name).is_none() && !missing.contains(name) {
            missing.push(name.clone());
        }
    }
    let (x_index, y_index) = match (table.column_index(&x), table.column_index(&y)) {
        (Some(x_index), Some(y_index)) => (x_index, y_index),
        _ => return Err(ServiceError::UnknownColumn(missing)),
    };

    let kind: ChartKind = chart_kind.parse()?;
    let series = || XySeries {
        x_label: x.clone(),
        y_label: y.clone(),
        x: table.column(x_index).cloned().collect(),
        y: table.column(y_index).cloned().collect(),
    };

    let spec = match kind {
        ChartKind::Bar => ChartSpec::Bar(series()),
        ChartKind::Line => ChartSpec::Line(series()),
        ChartKind::Scatter => ChartSpec::Scatter(series()),
        ChartKind::Pie => {
            let (labels, values) = table
                .column(x_index)
                .zip(table.column(y_index))
                .filter_map(|(label, value)| numeric(value).map(|v| (label.to_string(), v)))
                .unzip();
            ChartSpec::Pie {
                label: y.clone(),
                labels,
                values,
            }
        }
        ChartKind::Histogram => ChartSpec::Histogram {
            label: y.clone(),
            values: table.column(y_index).filter_map(numeric).collect(),
            bins,
        },
    };
    Ok(spec)
}

/// Numeric view of a cell; blanks and non-numbers are dropped from pie and
/// histogram data.
fn numeric(cell: &Cell) -> Option<f64> {
    match cell {
        Cell::Number(n) => Some(*n),
        Cell::Text(s) => s.trim().parse().ok(),
        Cell::Bool(_) | Cell::Empty => None,
    }
}

/// Validates chart requests and hands them to the renderer.
pub struct ChartDispatcher {
    renderer: Arc<dyn ChartRenderer>,
    histogram_bins: usize,
}

impl ChartDispatcher {
    pub fn new(renderer: Arc<dyn ChartRenderer>, histogram_bins: usize) -> Self {
        Self {
            renderer,
            histogram_bins,
        }
    }

    pub async fn dispatch(&self, table: &Table, chart_kind: &str, x_column: &str, y_column: &str) -> Result<Vec<u8>> {
        let spec = plan(table, chart_kind, x_column, y_column, self.histogram_bins)?;
        debug!("Rendering {} chart of {} x {}", spec.kind(), x_column, y_column);

        self.renderer.render(&spec).await.map_err(|e| {
            error!("Chart rendering failed: {:#}", e);
            ServiceError::RenderFailed(format!("{:#}", e))
        })
    }
}
