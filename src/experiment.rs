//! The experiment layer: a named dataflow bound to measurement sources and
//! data-series sinks.
//!
//! An [`Experiment`] owns one graph plus the local-registry entries that are
//! only meaningful to it: pseudo-sources for elapsed time and sample count,
//! and one sink node type per [`DataSeries`]. The interval timer that drives
//! measurement stays with the caller: call [`Experiment::tick`] once per
//! scheduler tick, and a tick arriving while the previous cycle is still in
//! flight is skipped by the graph's own re-entrancy guard.

use crate::codec::{FileStructure, LoadReport, WebStructure};
use crate::error::{StructureError, WorkerError};
use crate::graph::{CycleOutcome, Dataflow};
use crate::registry::{NodeRegistry, SlotLabel, Worker};
use crate::value::Value;
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Instant;
use tracing::debug;

/// One measured sample: a point forwarded by a series sink node.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DataPoint {
    pub x: f64,
    pub y: f64,
}

type SeriesListener = Box<dyn Fn(DataPoint) + Send + Sync>;

/// A collector of `(x, y)` pairs produced by a sink node, with listeners
/// notified on every new point (the socket layer subscribes here to stream
/// live charts).
pub struct DataSeries {
    title: String,
    x_label: String,
    y_label: String,
    points: Mutex<Vec<DataPoint>>,
    listeners: Mutex<Vec<SeriesListener>>,
}

fn recover<T>(lock: &Mutex<T>) -> MutexGuard<'_, T> {
    match lock.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

impl DataSeries {
    fn new(title: &str, x_label: &str, y_label: &str) -> DataSeries {
        DataSeries {
            title: title.to_string(),
            x_label: x_label.to_string(),
            y_label: y_label.to_string(),
            points: Mutex::new(Vec::new()),
            listeners: Mutex::new(Vec::new()),
        }
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn axis_labels(&self) -> (&str, &str) {
        (&self.x_label, &self.y_label)
    }

    pub fn push(&self, point: DataPoint) {
        recover(&self.points).push(point);
        for listener in recover(&self.listeners).iter() {
            listener(point);
        }
    }

    /// A snapshot of every collected point.
    pub fn points(&self) -> Vec<DataPoint> {
        recover(&self.points).clone()
    }

    /// A snapshot of the most recent `count` points.
    pub fn last_points(&self, count: usize) -> Vec<DataPoint> {
        let points = recover(&self.points);
        let start = points.len().saturating_sub(count);
        points[start..].to_vec()
    }

    pub fn add_listener(&self, listener: impl Fn(DataPoint) + Send + Sync + 'static) {
        recover(&self.listeners).push(Box::new(listener));
    }
}

/// A sensor attached to an experiment, by device and sensor identifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SensorRef {
    pub device: String,
    pub sensor: String,
}

/// Summary of an experiment for the editor/monitoring surface.
#[derive(Debug, Clone, Serialize)]
pub struct ExperimentInfo {
    pub name: String,
    pub dataflow: WebStructure,
    pub sensors: Vec<SensorRef>,
    pub series: Vec<SeriesInfo>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SeriesInfo {
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    pub point_count: usize,
}

/// A named experiment: one dataflow, its sensors, and its data series.
pub struct Experiment {
    name: String,
    sensors: Vec<SensorRef>,
    dataflow: Dataflow,
    series: Vec<Arc<DataSeries>>,
    samples: Arc<AtomicU64>,
}

impl Experiment {
    /// Creates an experiment over a fresh graph chained to the given shared
    /// catalog, and registers the measurement pseudo-sources (`Elapsed
    /// Time`, `Sample Count`) into the graph's local registry.
    pub fn new(name: &str, catalog: Arc<NodeRegistry>) -> Experiment {
        let mut dataflow = Dataflow::with_base_catalog(catalog);
        let started = Instant::now();
        dataflow.registry_mut().register(
            "Elapsed Time",
            "Measurement",
            vec![],
            vec![SlotLabel::new("seconds")],
            Worker::from_sync(move |_, _| {
                Ok(vec![Some(Value::Number(started.elapsed().as_secs_f64()))])
            }),
            [],
        );
        let samples = Arc::new(AtomicU64::new(0));
        let sample_counter = Arc::clone(&samples);
        dataflow.registry_mut().register(
            "Sample Count",
            "Measurement",
            vec![],
            vec![SlotLabel::new("samples")],
            Worker::from_sync(move |_, _| {
                Ok(vec![Some(Value::Number(
                    sample_counter.load(Ordering::Relaxed) as f64,
                ))])
            }),
            [],
        );
        Experiment {
            name: name.to_string(),
            sensors: Vec::new(),
            dataflow,
            series: Vec::new(),
            samples,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn dataflow(&self) -> &Dataflow {
        &self.dataflow
    }

    pub fn dataflow_mut(&mut self) -> &mut Dataflow {
        &mut self.dataflow
    }

    pub fn sensors(&self) -> &[SensorRef] {
        &self.sensors
    }

    pub fn series(&self) -> &[Arc<DataSeries>] {
        &self.series
    }

    /// The number of completed activation cycles so far; also what the
    /// `Sample Count` source emits.
    pub fn sample_count(&self) -> u64 {
        self.samples.load(Ordering::Relaxed)
    }

    pub fn add_sensor(&mut self, device: &str, sensor: &str) {
        self.sensors.push(SensorRef {
            device: device.to_string(),
            sensor: sensor.to_string(),
        });
    }

    /// Creates a data series and admits its sink node (inputs `x`, `y`, no
    /// outputs) into the graph. The sink's node type is registered into the
    /// experiment's local registry under the `Experiment` category, so it
    /// serializes and reloads like any other node. Returns `None` when a
    /// series with the same (normalized) title already exists.
    pub fn add_series(
        &mut self,
        title: &str,
        x_label: &str,
        y_label: &str,
    ) -> Option<Arc<DataSeries>> {
        let series = Arc::new(DataSeries::new(title, x_label, y_label));
        let sink = Arc::clone(&series);
        let path = self.dataflow.registry_mut().register(
            title,
            "Experiment",
            vec![SlotLabel::new("x"), SlotLabel::new("y")],
            vec![],
            Worker::from_sync(move |inputs, _| {
                // A non-numeric pair is not a measurement; skip it quietly.
                let (Some(x), Some(y)) = (inputs[0].as_number(), inputs[1].as_number()) else {
                    return Ok(vec![]);
                };
                sink.push(DataPoint { x, y });
                Ok(vec![])
            }),
            [],
        )?;
        let node = self.dataflow.create_node(&path, 0.0, 0.0, &Default::default())?;
        self.dataflow.add_node(node);
        self.series.push(Arc::clone(&series));
        Some(series)
    }

    /// Applies a persisted structure to the experiment's graph behind the
    /// structural gate: a structure that fails [`check`] is refused before
    /// any mutation, and the semantic load stays best-effort.
    ///
    /// [`check`]: crate::codec::check_file_structure
    pub fn set_dataflow_structure(
        &mut self,
        value: &serde_json::Value,
    ) -> Result<LoadReport, StructureError> {
        let structure = FileStructure::from_value(value)?;
        let report = self.dataflow.load_file_structure(&structure);
        debug!(
            experiment = %self.name,
            nodes = report.nodes_loaded,
            dropped = report.nodes_dropped + report.connections_dropped,
            "dataflow structure applied"
        );
        Ok(report)
    }

    /// Runs one measurement cycle. Completed cycles advance the sample
    /// counter; skipped ticks (previous cycle still in flight) do not.
    pub async fn tick(&mut self) -> Result<CycleOutcome, WorkerError> {
        let outcome = self.dataflow.activate().await?;
        if outcome == CycleOutcome::Completed {
            self.samples.fetch_add(1, Ordering::Relaxed);
        }
        Ok(outcome)
    }

    pub fn web_info(&self) -> ExperimentInfo {
        ExperimentInfo {
            name: self.name.clone(),
            dataflow: self.dataflow.web_structure(),
            sensors: self.sensors.clone(),
            series: self
                .series
                .iter()
                .map(|series| SeriesInfo {
                    title: series.title.clone(),
                    x_label: series.x_label.clone(),
                    y_label: series.y_label.clone(),
                    point_count: recover(&series.points).len(),
                })
                .collect(),
        }
    }
}
