//! Logitech G110 backlight control.

use std::time::Duration;

use bytes::{BufMut, Bytes, BytesMut};
use rusb::{Direction, Recipient, RequestType};

use crate::controller::BacklightController;

/// Offset of the color byte inside the command.
pub const COLOR_OFFSET: usize = 1;

/// Length of every color command.
pub const COMMAND_LEN: usize = 5;

pub struct LogitechG110;

impl BacklightController for LogitechG110 {
    fn vendor_id(&self) -> u16 {
        0x046d
    }

    fn product_id(&self) -> u16 {
        0xc22b
    }

    fn interface(&self) -> u8 {
        0
    }

    fn configuration(&self) -> u8 {
        1
    }

    fn request_type(&self) -> u8 {
        // Sniffed traffic shows 0x22 (endpoint recipient), but the keyboard only accepts 0x21.
        rusb::request_type(Direction::Out, RequestType::Class, Recipient::Interface)
    }

    fn request(&self) -> u8 {
        // HID SET_REPORT.
        0x09
    }

    fn value(&self) -> u16 {
        // Feature report with ID 7.
        0x0307
    }

    fn index(&self) -> u16 {
        0x0000
    }

    fn timeout(&self) -> Duration {
        Duration::from_millis(5000)
    }

    fn command_template(&self) -> Bytes {
        let mut buf = BytesMut::with_capacity(COMMAND_LEN);

        // Report ID.
        buf.put_u8(0x07);

        // Color.
        buf.put_u8(0x00);

        // Padding.
        buf.put_slice(&[0; 2]);

        // Brightness.
        buf.put_u8(0xff);

        buf.freeze()
    }

    fn color_offset(&self) -> usize {
        COLOR_OFFSET
    }
}
