#![no_std]
#![no_main]

use defmt::*;
use defmt_rtt as _;
use embassy_executor::Spawner;
use embassy_time::Timer;
use nrf_softdevice::Softdevice;
use panic_probe as _;
use static_cell::StaticCell;

use nano_sense_firmware::audio::capture::capture_task;
use nano_sense_firmware::audio::mailbox::AudioMailbox;
use nano_sense_firmware::audio::stream::CaptureLoop;
use nano_sense_firmware::ble::peripheral::{peripheral_task, InitError};
use nano_sense_firmware::ble::services::HumidityServer;
use nano_sense_firmware::ble::{enable_softdevice, softdevice_task};
use nano_sense_firmware::board::{self, Board};
use nano_sense_firmware::config::{AudioConfig, PeripheralConfig, HEARTBEAT_INTERVAL};
use nano_sense_firmware::status::SystemStatus;

static MAILBOX: AudioMailbox = AudioMailbox::new();
static STATUS: SystemStatus = SystemStatus::new();
static SERVER: StaticCell<HumidityServer> = StaticCell::new();

#[embassy_executor::main]
async fn main(spawner: Spawner) {
    info!("Starting Nano 33 BLE Sense firmware");

    let board = Board::init();
    let audio = AudioConfig::default();
    let peripheral = PeripheralConfig::default();

    let sd = enable_softdevice(peripheral.device_name);
    let server = match HumidityServer::new(sd, &peripheral) {
        Ok(server) => Ok(&*SERVER.init(server)),
        Err(e) => {
            error!("Failed to register humidity service: {:?}", Debug2Format(&e));
            Err(InitError::Radio)
        }
    };
    let sd: &'static Softdevice = sd;

    unwrap!(spawner.spawn(softdevice_task(sd)));
    unwrap!(spawner.spawn(peripheral_task(
        sd,
        server,
        board.sensor,
        board::led(board.led),
        &STATUS.peripheral,
        peripheral,
    )));
    unwrap!(spawner.spawn(heartbeat_task(&STATUS, &MAILBOX)));

    let capture_spawner = board::start_capture_executor();
    unwrap!(capture_spawner.spawn(capture_task(board.mic, audio, &MAILBOX, &STATUS.capture)));

    info!("System initialized, streaming audio");

    let mut stream = CaptureLoop::new(&MAILBOX, board.serial.configure(), audio.yield_quantum);
    stream.run().await
}

#[embassy_executor::task]
async fn heartbeat_task(status: &'static SystemStatus, mailbox: &'static AudioMailbox) {
    loop {
        Timer::after(HEARTBEAT_INTERVAL).await;
        info!(
            "Heartbeat - capture: {:?}, peripheral: {:?}, overruns: {}",
            status.capture.get(),
            status.peripheral.get(),
            mailbox.overruns()
        );
    }
}
