//! libusb context and device handle ownership.
//!
//! Dropping a [`DeviceSession`] hands the interface back to the kernel and closes the handle,
//! the context is torn down once the [`UsbSession`] and every handle opened from it are gone.

use std::time::Duration;

use log::{debug, info, warn};
use rusb::{Context, Device, DeviceHandle, UsbContext};

use crate::command::ControlTransport;
use crate::controller::BacklightController;
use crate::error::{LocateError, SessionError};
use crate::locator;

/// Result of trying to take the interface away from the kernel.
#[derive(Debug, PartialEq)]
pub(crate) enum DetachOutcome {
    /// A kernel driver was bound and has been detached.
    Detached,
    /// Nothing was bound to the interface.
    NoKernelDriver,
    /// The platform has no notion of kernel drivers.
    Unsupported,
    Failed(rusb::Error),
}

/// Classify the result of detaching the kernel driver.
///
/// Detaching is best-effort, a keyboard without a bound driver is the common case.
pub(crate) fn classify_detach(result: rusb::Result<()>) -> DetachOutcome {
    match result {
        Ok(()) => DetachOutcome::Detached,
        Err(rusb::Error::NotFound) => DetachOutcome::NoKernelDriver,
        Err(rusb::Error::NotSupported) => DetachOutcome::Unsupported,
        Err(err) => DetachOutcome::Failed(err),
    }
}

/// Result of selecting the active configuration.
#[derive(Debug, PartialEq)]
pub(crate) enum ConfigOutcome {
    Applied,
    /// Another interface is claimed, the configuration is usually already correct.
    Busy,
    Failed(rusb::Error),
}

/// Classify the result of setting the active configuration.
pub(crate) fn classify_configuration(result: rusb::Result<()>) -> ConfigOutcome {
    match result {
        Ok(()) => ConfigOutcome::Applied,
        Err(rusb::Error::Busy) => ConfigOutcome::Busy,
        Err(err) => ConfigOutcome::Failed(err),
    }
}

/// Process-wide libusb context.
pub(crate) struct UsbSession {
    context: Context,
}

impl UsbSession {
    pub fn open() -> Result<Self, SessionError> {
        let context = Context::new().map_err(SessionError::Init)?;
        Ok(Self { context })
    }

    /// Locate the controller's keyboard on the bus.
    pub fn find_device(
        &self,
        controller: &dyn BacklightController,
    ) -> Result<Device<Context>, LocateError> {
        let devices = self.context.devices().map_err(LocateError::List)?;
        locator::find_device(devices.iter(), controller.vendor_id(), controller.product_id())
    }

    /// Open the keyboard for exclusive access.
    pub fn open_device(
        &self,
        device: &Device<Context>,
        controller: &dyn BacklightController,
    ) -> Result<DeviceSession, SessionError> {
        let handle = device.open().map_err(SessionError::Open)?;
        info!(
            "Opened keyboard at Bus {:03} Device {:03}",
            device.bus_number(),
            device.address()
        );

        Ok(DeviceSession::new(handle, controller))
    }
}

/// Open keyboard handle.
pub(crate) struct DeviceSession {
    handle: DeviceHandle<Context>,
    interface: u8,
    detached: bool,
}

impl DeviceSession {
    fn new(handle: DeviceHandle<Context>, controller: &dyn BacklightController) -> Self {
        let interface = controller.interface();

        let detached = match classify_detach(handle.detach_kernel_driver(interface)) {
            DetachOutcome::Detached => {
                debug!("Detached kernel driver from interface {}", interface);
                true
            },
            DetachOutcome::NoKernelDriver => {
                debug!("No kernel driver bound to interface {}", interface);
                false
            },
            DetachOutcome::Unsupported => {
                debug!("Kernel driver detaching is not supported on this platform");
                false
            },
            DetachOutcome::Failed(err) => {
                warn!("Could not detach interface {}: {err}", interface);
                false
            },
        };

        let configuration = controller.configuration();
        match classify_configuration(handle.set_active_configuration(configuration)) {
            ConfigOutcome::Applied => debug!("Active configuration set to {}", configuration),
            ConfigOutcome::Busy => {
                warn!("Could not set configuration {}: device is busy", configuration)
            },
            ConfigOutcome::Failed(err) => {
                warn!("Could not set configuration {}: {err}", configuration)
            },
        }

        Self { handle, interface, detached }
    }
}

impl ControlTransport for DeviceSession {
    fn write_control(
        &self,
        request_type: u8,
        request: u8,
        value: u16,
        index: u16,
        data: &[u8],
        timeout: Duration,
    ) -> rusb::Result<usize> {
        self.handle.write_control(request_type, request, value, index, data, timeout)
    }
}

impl Drop for DeviceSession {
    fn drop(&mut self) {
        // Give the interface back if we took it.
        if self.detached {
            if let Err(err) = self.handle.attach_kernel_driver(self.interface) {
                warn!("Could not reattach kernel driver to interface {}: {err}", self.interface);
            }
        }

        debug!("Closing keyboard handle");
    }
}
