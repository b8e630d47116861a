//! BLE transport
//!
//! Scans for a peripheral advertising the Frame service (falling back to a
//! name-prefix match), connects, and resolves the TX/RX characteristics.
//! All writes go out without response; replies arrive as notifications on
//! the RX characteristic.

use std::pin::Pin;
use std::time::Duration;

use btleplug::api::{
    Central, Characteristic, Manager as _, Peripheral as _, ScanFilter, ValueNotification,
    WriteType,
};
use btleplug::platform::{Adapter, Manager, Peripheral};
use futures::Stream;
use tokio::time::timeout;
use tracing::{debug, info};

use crate::config::StreamConfig;
use crate::error::{DeviceError, Result};
use crate::protocol::constants::{FRAME_RX_CHAR_UUID, FRAME_SERVICE_UUID, FRAME_TX_CHAR_UUID};

/// Notification stream from the RX characteristic
pub type Notifications = Pin<Box<dyn Stream<Item = ValueNotification> + Send>>;

/// A connected Frame peripheral
pub struct BleTransport {
    peripheral: Peripheral,
    tx_char: Characteristic,
}

impl BleTransport {
    /// Scan for, connect to, and subscribe to a Frame device.
    ///
    /// Returns the transport and the raw notification stream.
    pub async fn connect(config: &StreamConfig) -> Result<(Self, Notifications)> {
        let manager = Manager::new().await?;
        let adapter = manager
            .adapters()
            .await?
            .into_iter()
            .next()
            .ok_or(DeviceError::NoAdapter)?;

        adapter
            .start_scan(ScanFilter {
                services: vec![FRAME_SERVICE_UUID],
            })
            .await?;

        let found = timeout(
            config.scan_timeout,
            find_device(&adapter, &config.device_name),
        )
        .await
        .map_err(|_| DeviceError::NotFound(config.device_name.clone()))?;
        // Stop scanning before connecting; some stacks refuse otherwise
        let _ = adapter.stop_scan().await;
        let peripheral = found?;

        timeout(config.connect_timeout, peripheral.connect())
            .await
            .map_err(|_| DeviceError::ConnectTimeout)??;
        peripheral.discover_services().await?;

        let chars = peripheral.characteristics();
        let tx_char = chars
            .iter()
            .find(|c| c.uuid == FRAME_TX_CHAR_UUID)
            .cloned()
            .ok_or(DeviceError::CharacteristicMissing("TX"))?;
        let rx_char = chars
            .iter()
            .find(|c| c.uuid == FRAME_RX_CHAR_UUID)
            .cloned()
            .ok_or(DeviceError::CharacteristicMissing("RX"))?;

        peripheral.subscribe(&rx_char).await?;
        let notifications = peripheral.notifications().await?;

        info!("Connected to Frame device");
        Ok((Self { peripheral, tx_char }, notifications))
    }

    /// Write one packet to the TX characteristic
    pub async fn write(&self, data: &[u8]) -> Result<()> {
        self.peripheral
            .write(&self.tx_char, data, WriteType::WithoutResponse)
            .await?;
        Ok(())
    }

    /// Whether the peripheral is still connected
    pub async fn is_connected(&self) -> bool {
        self.peripheral.is_connected().await.unwrap_or(false)
    }

    /// Disconnect from the peripheral
    pub async fn disconnect(&self) -> Result<()> {
        self.peripheral.disconnect().await?;
        Ok(())
    }
}

/// Poll discovered peripherals until one matches the Frame service or the
/// configured name prefix.
async fn find_device(adapter: &Adapter, name_prefix: &str) -> Result<Peripheral> {
    loop {
        for peripheral in adapter.peripherals().await? {
            let Some(props) = peripheral.properties().await? else {
                continue;
            };

            let by_service = props.services.contains(&FRAME_SERVICE_UUID);
            let by_name = props
                .local_name
                .as_deref()
                .is_some_and(|n| n.starts_with(name_prefix));

            if by_service || by_name {
                debug!(
                    name = props.local_name.as_deref().unwrap_or("<unnamed>"),
                    by_service, "Found device"
                );
                return Ok(peripheral);
            }
        }
        tokio::time::sleep(Duration::from_millis(250)).await;
    }
}
