//! Driver subsystem API for the nucleus kernel.
//!
//! This crate defines the contract between the kernel's driver registry and
//! the concrete drivers it probes:
//!
//! - [`DriverDescriptor`] — a detection-order-sorted probe entry.
//! - [`Console`] / [`Tty`] — the capability traits a probed driver may
//!   implement to be recognised by the post-init hook.
//! - [`Color`], [`Rgba`] — the color types the console capability set is
//!   expressed in terms of.
//! - [`Font`] / [`Logo`] — asset records and best-fit selection.
//! - [`DriverError`] — the error kinds surfaced by the probe pipeline.

#![cfg_attr(not(test), no_std)]

extern crate alloc;

pub mod color;
pub mod console;
pub mod descriptor;
pub mod error;
pub mod font;
pub mod tty;

pub use color::{AnsiColor, Color, Rgba};
pub use console::{Console, DimensionUnit, ScrollDirection};
pub use descriptor::{Driver, DriverDescriptor, DriverKind, DriverOrder};
pub use error::DriverError;
pub use font::{best_fit, Font, Logo};
pub use tty::{Tty, TtyState};
