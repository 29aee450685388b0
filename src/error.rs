//! Error types.

use thiserror::Error;

/// Failure to acquire the keyboard.
#[derive(Error, Debug)]
pub enum SessionError {
    #[error("unable to initialize libusb: {0}")]
    Init(#[source] rusb::Error),

    #[error(transparent)]
    Locate(#[from] LocateError),

    #[error("no access to device: {0} (root permissions required)")]
    Open(#[source] rusb::Error),
}

/// Failure to find the keyboard on the bus.
#[derive(Error, Debug)]
pub enum LocateError {
    #[error("keyboard {vendor_id:04x}:{product_id:04x} not found")]
    NotFound { vendor_id: u16, product_id: u16 },

    #[error("unable to list USB devices: {0}")]
    List(#[source] rusb::Error),
}

/// Failure of a single color command.
#[derive(Error, Debug, PartialEq)]
pub enum TransferError {
    #[error("wrote {written} of {expected} bytes")]
    ShortWrite { written: usize, expected: usize },

    #[error("USB error: {0}")]
    Usb(#[from] rusb::Error),
}
