//! USB HID gadget channel (`/dev/hidg0`).
//!
//! On a Linux board with a USB device controller, the configfs HID function
//! exposes a character device; every 8-byte write becomes one input report
//! on the host the board is plugged into.
//!
//! # Simulation mode
//!
//! If the device node does not exist when the channel is opened, the channel
//! runs in simulation mode: reports are built and timed exactly as usual but
//! the write is a no-op.  This lets the whole pipeline run on a development
//! machine.
//!
//! The device handle is opened lazily on the first write and dropped after a
//! failed write, so a gadget that comes back (cable replugged, gadget
//! reconfigured) is picked up by the next report.

pub mod mock;

use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use parking_lot::Mutex;
use tracing::{debug, trace, warn};

use vision_hid_core::KeyReport;

use crate::application::inject_keys::{ChannelError, InjectionChannel};

/// Default gadget device node.
pub const DEFAULT_DEVICE_PATH: &str = "/dev/hidg0";

pub struct HidGadgetChannel {
    path: PathBuf,
    simulation: bool,
    device: Mutex<Option<File>>,
}

impl HidGadgetChannel {
    /// Prepares a channel for `path`, entering simulation mode if it is missing.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let simulation = !path.exists();
        if simulation {
            warn!(
                path = %path.display(),
                "HID device not found; running in simulation mode"
            );
        } else {
            debug!(path = %path.display(), "using HID gadget device");
        }
        Self {
            path,
            simulation,
            device: Mutex::new(None),
        }
    }

    /// A channel that never touches the filesystem.
    pub fn simulated() -> Self {
        Self {
            path: PathBuf::from(DEFAULT_DEVICE_PATH),
            simulation: true,
            device: Mutex::new(None),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn write_to_device(&self, bytes: &[u8]) -> io::Result<()> {
        let mut device = self.device.lock();
        if device.is_none() {
            *device = Some(OpenOptions::new().write(true).open(&self.path)?);
        }
        if let Some(file) = device.as_mut() {
            if let Err(e) = file.write_all(bytes).and_then(|()| file.flush()) {
                *device = None;
                return Err(e);
            }
        }
        Ok(())
    }
}

impl InjectionChannel for HidGadgetChannel {
    fn write_report(&self, report: &KeyReport) -> Result<(), ChannelError> {
        if self.simulation {
            trace!(report = ?report.as_bytes(), "[SIM] HID report");
            return Ok(());
        }
        self.write_to_device(report.as_bytes())
            .map_err(|source| ChannelError::Io {
                path: self.path.clone(),
                source,
            })
    }

    fn is_simulated(&self) -> bool {
        self.simulation
    }
}
