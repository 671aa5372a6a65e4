//! Tests for the sensor/actuator registry bridging over a mock gateway.
mod common;
use futures::FutureExt;
use futures::future::BoxFuture;
use lamina::prelude::*;
use std::result::Result;
use std::sync::{Arc, Mutex};

/// A gateway backed by in-memory values: sensors read from a shared float,
/// actuator writes are recorded.
struct MockGateway {
    sensor_value: Mutex<f64>,
    actuator_log: Mutex<Vec<(String, String, Value)>>,
}

impl MockGateway {
    fn new(sensor_value: f64) -> MockGateway {
        MockGateway {
            sensor_value: Mutex::new(sensor_value),
            actuator_log: Mutex::new(Vec::new()),
        }
    }
}

impl DeviceGateway for MockGateway {
    fn get_sensor_value(
        &self,
        _device_id: &str,
        sensor_id: &str,
    ) -> BoxFuture<'static, Result<Value, WorkerError>> {
        let value = *self.sensor_value.lock().expect("sensor lock");
        let known = sensor_id == "t0";
        async move {
            if known {
                Ok(Value::Number(value))
            } else {
                Err(WorkerError::Device {
                    target: "t?".to_string(),
                    message: "unknown sensor".to_string(),
                })
            }
        }
        .boxed()
    }

    fn set_actuator_value(
        &self,
        device_id: &str,
        actuator_id: &str,
        value: Value,
    ) -> BoxFuture<'static, Result<(), WorkerError>> {
        self.actuator_log.lock().expect("actuator lock").push((
            device_id.to_string(),
            actuator_id.to_string(),
            value,
        ));
        async { Ok(()) }.boxed()
    }
}

#[test]
fn test_sensor_node_registers_under_sensors_category() {
    let gateway = Arc::new(MockGateway::new(21.5));
    let mut registry = NodeRegistry::new();
    let path = register_sensor_node(&mut registry, gateway, "dev-1", "Heater Rig", "t0", "Thermocouple")
        .expect("registration succeeds");
    assert_eq!(path.as_str(), "sensors/thermocouple-heater-rig");

    let spec = registry.lookup(&path).expect("spec resolves");
    assert_eq!(spec.input_count(), 0);
    assert_eq!(spec.output_count(), 1);
    assert_eq!(spec.title, "Thermocouple (Heater Rig)");
}

#[tokio::test]
async fn test_sensor_value_flows_through_the_graph() {
    let gateway = Arc::new(MockGateway::new(21.5));
    let mut registry = builtin_registry();
    let path = register_sensor_node(&mut registry, gateway, "dev-1", "Heater Rig", "t0", "Thermocouple")
        .expect("registration succeeds");

    let mut graph = Dataflow::new(registry);
    let sensor = graph.add_node(
        graph
            .create_node(&path, 0.0, 0.0, &PropertyValues::default())
            .expect("registered"),
    );
    let record = common::capture_output(&mut graph, sensor, 0, "Sensor Capture");

    graph.activate().await.expect("cycle completes");
    assert_eq!(common::captured(&record), vec![Value::Number(21.5)]);
}

#[tokio::test]
async fn test_actuator_node_forwards_values() {
    let gateway = Arc::new(MockGateway::new(0.0));
    let mut registry = builtin_registry();
    let path = register_actuator_node(
        &mut registry,
        Arc::clone(&gateway) as Arc<dyn DeviceGateway>,
        "dev-1",
        "Heater Rig",
        "h0",
        "Heater",
    )
    .expect("registration succeeds");
    assert_eq!(path.as_str(), "actuators/heater-heater-rig");

    let mut graph = Dataflow::new(registry);
    let constant = common::add_constant(&mut graph, 0.75);
    let actuator = graph.add_node(
        graph
            .create_node(&path, 0.0, 0.0, &PropertyValues::default())
            .expect("registered"),
    );
    assert!(graph.connect(constant, 0, actuator, 0, false));

    graph.activate().await.expect("cycle completes");
    let log = gateway.actuator_log.lock().expect("actuator lock");
    assert_eq!(log.len(), 1);
    assert_eq!(log[0].0, "dev-1");
    assert_eq!(log[0].1, "h0");
    assert_eq!(log[0].2, Value::Number(0.75));
}

#[tokio::test]
async fn test_failing_sensor_read_surfaces_as_worker_error() {
    let gateway = Arc::new(MockGateway::new(0.0));
    let mut registry = builtin_registry();
    let path = register_sensor_node(&mut registry, gateway, "dev-1", "Heater Rig", "t9", "Ghost")
        .expect("registration succeeds");

    let mut graph = Dataflow::new(registry);
    graph.add_node(
        graph
            .create_node(&path, 0.0, 0.0, &PropertyValues::default())
            .expect("registered"),
    );

    let error = graph.activate().await.expect_err("device failure surfaces");
    assert!(error.to_string().contains("unknown sensor"));
}
