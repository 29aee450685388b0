//! USB device discovery.

use log::{debug, warn};
use rusb::{Device, UsbContext};

use crate::error::LocateError;

/// Enumerated USB device.
pub(crate) trait DeviceEntry {
    /// Vendor and product ID from the device descriptor.
    fn ids(&self) -> rusb::Result<(u16, u16)>;

    /// Bus location used in diagnostics.
    fn location(&self) -> String;
}

impl<T: UsbContext> DeviceEntry for Device<T> {
    fn ids(&self) -> rusb::Result<(u16, u16)> {
        let descriptor = self.device_descriptor()?;
        Ok((descriptor.vendor_id(), descriptor.product_id()))
    }

    fn location(&self) -> String {
        format!("Bus {:03} Device {:03}", self.bus_number(), self.address())
    }
}

/// Find the first device matching the vendor and product ID.
///
/// Devices with unreadable descriptors are skipped.
pub(crate) fn find_device<E, I>(
    devices: I,
    vendor_id: u16,
    product_id: u16,
) -> Result<E, LocateError>
where
    E: DeviceEntry,
    I: IntoIterator<Item = E>,
{
    for device in devices {
        match device.ids() {
            Ok(ids) if ids == (vendor_id, product_id) => {
                debug!("Found {:04x}:{:04x} at {}", vendor_id, product_id, device.location());
                return Ok(device);
            },
            Ok(_) => (),
            Err(err) => warn!("Skipping {}: failed to get device descriptor: {err}", device.location()),
        }
    }

    Err(LocateError::NotFound { vendor_id, product_id })
}
