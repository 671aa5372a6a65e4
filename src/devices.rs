//! Bridging between the device layer and the type registry.
//!
//! The driver stack itself (pin allocation, wire protocols) lives outside
//! this crate; what the engine needs from it is the async read/write surface
//! below. Each attached sensor or actuator becomes one registered node type
//! whose worker closes over the gateway handle, so a graph pulls hardware
//! values the same way it pulls constants.

use crate::error::WorkerError;
use crate::registry::{NodePath, NodeRegistry, SlotLabel, Worker};
use crate::value::Value;
use futures::FutureExt;
use futures::future::BoxFuture;
use std::sync::Arc;

/// The async surface of the device/driver layer.
pub trait DeviceGateway: Send + Sync {
    /// Reads the current value of one sensor.
    fn get_sensor_value(
        &self,
        device_id: &str,
        sensor_id: &str,
    ) -> BoxFuture<'static, Result<Value, WorkerError>>;

    /// Drives one actuator to the given value.
    fn set_actuator_value(
        &self,
        device_id: &str,
        actuator_id: &str,
        value: Value,
    ) -> BoxFuture<'static, Result<(), WorkerError>>;
}

/// Registers a zero-input source node type that reads a sensor through the
/// gateway on every activation. The title follows the original scheme,
/// `"<sensor> (<device>)"`, under the `Sensors` category.
pub fn register_sensor_node(
    registry: &mut NodeRegistry,
    gateway: Arc<dyn DeviceGateway>,
    device_id: &str,
    device_name: &str,
    sensor_id: &str,
    sensor_name: &str,
) -> Option<NodePath> {
    let device_id = device_id.to_string();
    let sensor_id = sensor_id.to_string();
    let worker = Worker::from_async(move |_, _| {
        let gateway = gateway.clone();
        let device_id = device_id.clone();
        let sensor_id = sensor_id.clone();
        async move {
            let value = gateway.get_sensor_value(&device_id, &sensor_id).await?;
            Ok(vec![Some(value)])
        }
        .boxed()
    });
    registry.register(
        &format!("{} ({})", sensor_name, device_name),
        "Sensors",
        vec![],
        vec![SlotLabel::new("value")],
        worker,
        [],
    )
}

/// Registers a zero-output sink node type that forwards its input to an
/// actuator through the gateway, under the `Actuators` category.
pub fn register_actuator_node(
    registry: &mut NodeRegistry,
    gateway: Arc<dyn DeviceGateway>,
    device_id: &str,
    device_name: &str,
    actuator_id: &str,
    actuator_name: &str,
) -> Option<NodePath> {
    let device_id = device_id.to_string();
    let actuator_id = actuator_id.to_string();
    let worker = Worker::from_async(move |inputs, _| {
        let gateway = gateway.clone();
        let device_id = device_id.clone();
        let actuator_id = actuator_id.clone();
        async move {
            gateway
                .set_actuator_value(&device_id, &actuator_id, inputs[0].clone())
                .await?;
            Ok(vec![])
        }
        .boxed()
    });
    registry.register(
        &format!("{} ({})", actuator_name, device_name),
        "Actuators",
        vec![SlotLabel::new("value")],
        vec![],
        worker,
        [],
    )
}
