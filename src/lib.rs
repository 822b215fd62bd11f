#![no_std]

//! Nano 33 BLE Sense Firmware Library
//!
//! Two independent paths share the chip:
//!
//! - `audio`: PDM capture into a single-slot mailbox, drained as raw PCM
//!   frames onto the serial link
//! - `ble` + `sensor`: a BLE peripheral exposing relative humidity from the
//!   on-board HTS221 through a notify characteristic
//!
//! `board` owns the pin map and interrupt priorities, `config` the
//! compile-time parameters and `status` the per-subsystem lifecycle cells.

pub mod audio;
pub mod ble;
pub mod board;
pub mod config;
pub mod sensor;
pub mod status;
