//! Humidity GATT Service
//!
//! One primary service with a single read/notify characteristic and a
//! user description descriptor, registered through the SoftDevice service
//! builder.

use defmt::{debug, info, warn, Debug2Format, Format};
use nrf_softdevice::ble::gatt_server::builder::ServiceBuilder;
use nrf_softdevice::ble::gatt_server::characteristic::{Attribute, Metadata, Properties};
use nrf_softdevice::ble::gatt_server::{self, RegisterError, WriteOp};
use nrf_softdevice::ble::{Connection, SecurityMode, Uuid};
use nrf_softdevice::Softdevice;

use crate::config::{PeripheralConfig, USER_DESCRIPTION_UUID};
use crate::sensor::reporter::humidity_payload;

/// Write permission of the value and description attributes. Only the
/// firmware updates them.
pub const CENTRAL_WRITE_SECURITY: SecurityMode = SecurityMode::NoAccess;

/// Events raised by central writes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Format)]
pub enum HumidityEvent {
    /// Client Characteristic Configuration written
    CccdWrite { notifications: bool },
}

/// Attribute handles of the humidity characteristic
#[derive(Debug, Clone, Copy, Format)]
pub struct HumidityService {
    pub value_handle: u16,
    pub cccd_handle: u16,
}

impl HumidityService {
    /// Register the service with an initial value of zero
    pub fn register(sd: &mut Softdevice, config: &PeripheralConfig) -> Result<Self, RegisterError> {
        let mut sb = ServiceBuilder::new(sd, Uuid::new_16(config.service_uuid))?;

        let attr = Attribute::new(humidity_payload(0)).write_security(CENTRAL_WRITE_SECURITY);
        let metadata = Metadata::new(Properties::new().read().notify());
        let mut cb = sb.add_characteristic(Uuid::new_16(config.characteristic_uuid), attr, metadata)?;
        let _ = cb.add_descriptor(
            Uuid::new_16(USER_DESCRIPTION_UUID),
            Attribute::new(config.description.as_bytes()).write_security(CENTRAL_WRITE_SECURITY),
        )?;
        let handles = cb.build();

        let service_handle = sb.build();
        info!(
            "Humidity service registered: service={}, value={}, cccd={}",
            service_handle.handle(),
            handles.value_handle,
            handles.cccd_handle
        );

        Ok(Self {
            value_handle: handles.value_handle,
            cccd_handle: handles.cccd_handle,
        })
    }
}

/// GATT server exposing the humidity service
pub struct HumidityServer {
    pub humidity: HumidityService,
}

impl HumidityServer {
    pub fn new(sd: &mut Softdevice, config: &PeripheralConfig) -> Result<Self, RegisterError> {
        Ok(Self {
            humidity: HumidityService::register(sd, config)?,
        })
    }

    /// Store a new value and notify the central.
    ///
    /// The notify fails while the central has not subscribed; that is not
    /// an error for this service.
    pub fn publish(&self, sd: &Softdevice, conn: &Connection, encoded: u32) {
        let payload = humidity_payload(encoded);

        if let Err(e) = gatt_server::set_value(sd, self.humidity.value_handle, &payload) {
            warn!("Failed to set humidity value: {:?}", Debug2Format(&e));
        }

        if let Err(e) = gatt_server::notify_value(conn, self.humidity.value_handle, &payload) {
            debug!("Humidity notify skipped: {:?}", Debug2Format(&e));
        }
    }
}

impl gatt_server::Server for HumidityServer {
    type Event = HumidityEvent;

    fn on_write(
        &self,
        _conn: &Connection,
        handle: u16,
        _op: WriteOp,
        _offset: usize,
        data: &[u8],
    ) -> Option<Self::Event> {
        if handle != self.humidity.cccd_handle {
            return None;
        }

        data.first().map(|flags| HumidityEvent::CccdWrite {
            notifications: flags & 0x01 != 0,
        })
    }
}
