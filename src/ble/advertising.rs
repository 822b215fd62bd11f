//! Connectable advertising with the device name and the 16-bit service UUID

use defmt::{debug, info};
use nrf_softdevice::ble::advertisement_builder::{
    Flag, LegacyAdvertisementBuilder, LegacyAdvertisementPayload, ServiceList, ServiceUuid16,
};
use nrf_softdevice::ble::peripheral::{self, AdvertiseError, ConnectableAdvertisement};
use nrf_softdevice::ble::Connection;
use nrf_softdevice::Softdevice;

use crate::config::PeripheralConfig;

/// Longest name that fits next to the flags and one 16-bit service UUID
pub const MAX_NAME_LEN: usize = 22;

/// Longest prefix of `name` that fits [`MAX_NAME_LEN`] bytes without
/// splitting a character
pub fn advertised_name(name: &str) -> &str {
    if name.len() <= MAX_NAME_LEN {
        return name;
    }

    let end = name
        .char_indices()
        .map(|(i, _)| i)
        .take_while(|&i| i <= MAX_NAME_LEN)
        .last()
        .unwrap_or(0);
    &name[..end]
}

pub struct Advertiser {
    adv_data: LegacyAdvertisementPayload,
    scan_data: LegacyAdvertisementPayload,
    sd: &'static Softdevice,
}

impl Advertiser {
    pub fn new(sd: &'static Softdevice, config: &PeripheralConfig) -> Self {
        let name = advertised_name(config.device_name);
        if name.len() < config.device_name.len() {
            info!("Advertised name truncated to {}", name);
        }

        let adv_data = LegacyAdvertisementBuilder::new()
            .flags(&[Flag::GeneralDiscovery, Flag::LE_Only])
            .services_16(ServiceList::Complete, &[ServiceUuid16::from_u16(config.service_uuid)])
            .full_name(name)
            .build();

        let scan_data = LegacyAdvertisementBuilder::new().build();

        Self { adv_data, scan_data, sd }
    }

    /// Advertise until a central connects
    pub async fn advertise(&self) -> Result<Connection, AdvertiseError> {
        let config = peripheral::Config::default();
        let adv = ConnectableAdvertisement::ScannableUndirected {
            adv_data: &self.adv_data,
            scan_data: &self.scan_data,
        };

        debug!("Advertising...");
        peripheral::advertise_connectable(self.sd, adv, &config).await
    }
}
