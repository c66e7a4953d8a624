//! # RC Transmitter Library
//!
//! Turn four analog sticks and a small keypad into a steady stream of RC
//! channel frames.
//!
//! This library provides the control core of a handheld transmitter: stick
//! calibration and the channel pipeline, trim and dual rate editing, keypad
//! debouncing, the rotary mode selector, frame encoding and the send
//! schedule. Hardware sits behind small collaborator traits so the core runs
//! the same against evdev devices, UDP / serial radios or test mocks.

pub mod channels;
pub mod config;
pub mod display;
pub mod error;
pub mod input;
pub mod link;
pub mod menu;
pub mod telemetry;
pub mod transmitter;
