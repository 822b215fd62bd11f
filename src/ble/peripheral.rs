//! Humidity Peripheral Task
//!
//! Brings up the sensor, then cycles between advertising and serving one
//! central. While a central is connected the sensor is polled on a fixed
//! period and the characteristic is notified when the reading moved past
//! the threshold.
//!
//! Initialization failures halt this task only; the audio path keeps
//! running.

use defmt::{error, info, warn, Debug2Format, Format};
use embassy_futures::select::{select, Either};
use embassy_nrf::gpio::Output;
use embassy_time::{Delay, Duration, Ticker, Timer};
use embedded_hal_async::delay::DelayNs;
use embedded_hal_async::i2c::I2c;
use nrf_softdevice::ble::{gatt_server, Connection};
use nrf_softdevice::Softdevice;

use super::advertising::Advertiser;
use super::link::{Indicator, Link};
use super::services::{HumidityEvent, HumidityServer};
use crate::board::SensorResources;
use crate::config::PeripheralConfig;
use crate::sensor::hts221::Hts221;
use crate::sensor::reporter::HumidityPoller;
use crate::sensor::HumiditySensor;
use crate::status::{HaltReason, SubsystemStatus};

/// Fatal peripheral initialization failures
#[derive(Debug, Clone, Copy, PartialEq, Eq, Format)]
pub enum InitError {
    /// Sensor absent, wrong identity or bad calibration
    Sensor,
    /// GATT service could not be registered
    Radio,
}

impl InitError {
    pub fn halt_reason(self) -> HaltReason {
        match self {
            InitError::Sensor => HaltReason::Sensor,
            InitError::Radio => HaltReason::Radio,
        }
    }
}

#[embassy_executor::task]
pub async fn peripheral_task(
    sd: &'static Softdevice,
    server: Result<&'static HumidityServer, InitError>,
    sensor: SensorResources,
    led: Output<'static>,
    status: &'static SubsystemStatus,
    config: PeripheralConfig,
) {
    let mut link = Link::new(led, status);

    let server = match server {
        Ok(server) => server,
        Err(e) => {
            error!("Peripheral init failed: {:?}", e);
            link.halt(e.halt_reason());
            return;
        }
    };

    let (bus, _rail) = sensor.configure().await;
    let Some(hts221) = start_sensor(bus, Delay, &mut link).await else {
        return;
    };

    let mut poller = HumidityPoller::new(hts221, config.threshold);
    let advertiser = Advertiser::new(sd, &config);

    if let Err(e) = link.ready() {
        warn!("Unexpected link state at startup: {:?}", e);
    }
    info!("Peripheral ready, advertising as '{}'", config.device_name);

    serve(sd, server, &advertiser, &mut poller, &mut link, &config).await
}

/// Bring up the humidity sensor, halting the link for good if it fails
pub async fn start_sensor<I2C, D, I>(bus: I2C, delay: D, link: &mut Link<'_, I>) -> Option<Hts221<I2C, D>>
where
    I2C: I2c,
    D: DelayNs,
    I: Indicator,
{
    match Hts221::new(bus, delay).await {
        Ok(sensor) => {
            info!("HTS221 ready");
            Some(sensor)
        }
        Err(e) => {
            error!("HTS221 init failed: {:?}", Debug2Format(&e));
            link.halt(InitError::Sensor.halt_reason());
            None
        }
    }
}

/// Advertise, serve one connection, repeat
async fn serve<S: HumiditySensor, I: Indicator>(
    sd: &Softdevice,
    server: &HumidityServer,
    advertiser: &Advertiser,
    poller: &mut HumidityPoller<S>,
    link: &mut Link<'_, I>,
    config: &PeripheralConfig,
) -> ! {
    loop {
        let conn = match advertiser.advertise().await {
            Ok(conn) => conn,
            Err(e) => {
                error!("Advertising failed: {:?}", Debug2Format(&e));
                Timer::after(config.advertise_retry).await;
                continue;
            }
        };

        if let Err(e) = link.connected() {
            warn!("Connect in unexpected state: {:?}", e);
        }

        let gatt = gatt_server::run(&conn, server, |event| match event {
            HumidityEvent::CccdWrite { notifications } => {
                info!("Humidity notifications {}", if notifications { "enabled" } else { "disabled" });
            }
        });
        let poll = poll_connected(sd, &conn, server, poller, config.poll_interval);

        match select(gatt, poll).await {
            Either::First(reason) => info!("Central disconnected: {:?}", Debug2Format(&reason)),
            Either::Second(never) => match never {},
        }

        if let Err(e) = link.disconnected() {
            warn!("Disconnect in unexpected state: {:?}", e);
        }
    }
}

/// Poll the sensor on a fixed period and push changed values to `conn`
async fn poll_connected<S: HumiditySensor>(
    sd: &Softdevice,
    conn: &Connection,
    server: &HumidityServer,
    poller: &mut HumidityPoller<S>,
    interval: Duration,
) -> ! {
    let mut ticker = Ticker::every(interval);
    loop {
        ticker.next().await;
        if let Some(encoded) = poller.tick().await {
            server.publish(sd, conn, encoded);
        }
    }
}
