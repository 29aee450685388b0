//! Backlight controller abstraction.

use std::time::Duration;

use bytes::Bytes;

/// USB backlight controller.
pub(crate) trait BacklightController {
    /// USB vendor ID.
    fn vendor_id(&self) -> u16;

    /// USB product ID.
    fn product_id(&self) -> u16;

    /// Interface which might be bound to a kernel driver.
    fn interface(&self) -> u8;

    /// Active configuration value.
    fn configuration(&self) -> u8;

    /// `bmRequestType` of the color control transfer.
    fn request_type(&self) -> u8;

    /// `bRequest` of the color control transfer.
    fn request(&self) -> u8;

    /// `wValue` of the color control transfer.
    fn value(&self) -> u16;

    /// `wIndex` of the color control transfer.
    fn index(&self) -> u16;

    /// Upper bound for a single control transfer.
    fn timeout(&self) -> Duration;

    /// Command template with a zeroed color byte.
    fn command_template(&self) -> Bytes;

    /// Position of the color byte inside the command template.
    fn color_offset(&self) -> usize;
}
