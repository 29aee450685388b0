//! Color command encoding and transfer.

use std::time::Duration;

use bytes::BytesMut;
use log::{debug, error};

use crate::controller::BacklightController;
use crate::error::TransferError;

/// Sink for host-to-device control transfers.
pub(crate) trait ControlTransport {
    /// Write `data` in the data stage, returning the number of bytes transferred.
    fn write_control(
        &self,
        request_type: u8,
        request: u8,
        value: u16,
        index: u16,
        data: &[u8],
        timeout: Duration,
    ) -> rusb::Result<usize>;
}

impl<T: ControlTransport + ?Sized> ControlTransport for &T {
    fn write_control(
        &self,
        request_type: u8,
        request: u8,
        value: u16,
        index: u16,
        data: &[u8],
        timeout: Duration,
    ) -> rusb::Result<usize> {
        (**self).write_control(request_type, request, value, index, data, timeout)
    }
}

/// Color command, mutated in place between transfers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct CommandBuffer {
    bytes: BytesMut,
    color_offset: usize,
}

impl CommandBuffer {
    pub fn new(controller: &dyn BacklightController) -> Self {
        let template = controller.command_template();
        let color_offset = controller.color_offset();
        debug_assert!(color_offset < template.len());
        Self { bytes: BytesMut::from(&template[..]), color_offset }
    }

    pub fn set_color(&mut self, color: u8) {
        self.bytes[self.color_offset] = color;
    }

    pub fn color(&self) -> u8 {
        self.bytes[self.color_offset]
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }
}

/// Send the current color command to the keyboard.
///
/// Anything other than a complete write is an error, though callers should treat it as
/// transient since some host controllers drop these transfers every now and then.
pub(crate) fn send_color(
    transport: &dyn ControlTransport,
    controller: &dyn BacklightController,
    buffer: &CommandBuffer,
) -> Result<usize, TransferError> {
    let data = buffer.as_bytes();
    let result = transport.write_control(
        controller.request_type(),
        controller.request(),
        controller.value(),
        controller.index(),
        data,
        controller.timeout(),
    );

    let outcome = match result {
        Ok(written) if written == data.len() => Ok(written),
        Ok(written) => Err(TransferError::ShortWrite { written, expected: data.len() }),
        Err(err) => Err(TransferError::from(err)),
    };

    match &outcome {
        Ok(_) => debug!("Color set to {}", buffer.color()),
        Err(err) => error!(
            "Setting color {} failed: {err}. This happens sporadically on some machines.",
            buffer.color()
        ),
    }

    outcome
}

#[cfg(test)]
pub(crate) mod tests {
    use std::cell::RefCell;
    use std::collections::VecDeque;

    use bytes::Bytes;

    use super::*;
    use crate::logitech_g110::{LogitechG110, COLOR_OFFSET};

    /// Single recorded control transfer.
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub struct Transfer {
        pub request_type: u8,
        pub request: u8,
        pub value: u16,
        pub index: u16,
        pub data: Vec<u8>,
        pub timeout: Duration,
    }

    /// Transport recording every transfer, replying with queued results.
    ///
    /// Once the queue is empty, every transfer is a complete write.
    #[derive(Default)]
    pub struct FakeTransport {
        pub transfers: RefCell<Vec<Transfer>>,
        pub replies: RefCell<VecDeque<rusb::Result<usize>>>,
    }

    impl FakeTransport {
        pub fn with_replies(replies: Vec<rusb::Result<usize>>) -> Self {
            Self { replies: RefCell::new(replies.into()), ..Default::default() }
        }

        pub fn colors(&self) -> Vec<u8> {
            self.transfers.borrow().iter().map(|transfer| transfer.data[COLOR_OFFSET]).collect()
        }
    }

    impl ControlTransport for FakeTransport {
        fn write_control(
            &self,
            request_type: u8,
            request: u8,
            value: u16,
            index: u16,
            data: &[u8],
            timeout: Duration,
        ) -> rusb::Result<usize> {
            self.transfers.borrow_mut().push(Transfer {
                request_type,
                request,
                value,
                index,
                data: data.to_vec(),
                timeout,
            });
            self.replies.borrow_mut().pop_front().unwrap_or(Ok(data.len()))
        }
    }

    #[test]
    fn buffer_layout_for_every_color() {
        let mut buffer = CommandBuffer::new(&LogitechG110);
        for color in 0..=u8::MAX {
            buffer.set_color(color);
            assert_eq!(buffer.as_bytes(), &[0x07, color, 0x00, 0x00, 0xff]);
        }
    }

    #[test]
    fn sends_complete_command() {
        let transport = FakeTransport::default();
        let mut buffer = CommandBuffer::new(&LogitechG110);
        buffer.set_color(100);

        assert_eq!(send_color(&transport, &LogitechG110, &buffer), Ok(5));

        let transfers = transport.transfers.borrow();
        assert_eq!(transfers.len(), 1);
        assert_eq!(transfers[0], Transfer {
            request_type: 0x21,
            request: 0x09,
            value: 0x0307,
            index: 0x0000,
            data: vec![0x07, 100, 0x00, 0x00, 0xff],
            timeout: Duration::from_millis(5000),
        });
    }

    #[test]
    fn same_color_twice_is_identical() {
        let transport = FakeTransport::default();
        let mut buffer = CommandBuffer::new(&LogitechG110);
        buffer.set_color(42);

        send_color(&transport, &LogitechG110, &buffer).unwrap();
        send_color(&transport, &LogitechG110, &buffer).unwrap();

        let transfers = transport.transfers.borrow();
        assert_eq!(transfers[0], transfers[1]);
    }

    #[test]
    fn short_write_is_error() {
        let transport = FakeTransport::with_replies(vec![Ok(3)]);
        let buffer = CommandBuffer::new(&LogitechG110);

        assert_eq!(
            send_color(&transport, &LogitechG110, &buffer),
            Err(TransferError::ShortWrite { written: 3, expected: 5 })
        );
    }

    #[test]
    fn usb_error_is_error() {
        let transport = FakeTransport::with_replies(vec![Err(rusb::Error::Pipe)]);
        let buffer = CommandBuffer::new(&LogitechG110);

        assert_eq!(
            send_color(&transport, &LogitechG110, &buffer),
            Err(TransferError::Usb(rusb::Error::Pipe))
        );
    }

    /// Controller with the color byte in a different position.
    struct TrailingColor;

    impl BacklightController for TrailingColor {
        fn vendor_id(&self) -> u16 {
            0x1234
        }

        fn product_id(&self) -> u16 {
            0x5678
        }

        fn interface(&self) -> u8 {
            1
        }

        fn configuration(&self) -> u8 {
            1
        }

        fn request_type(&self) -> u8 {
            0x21
        }

        fn request(&self) -> u8 {
            0x09
        }

        fn value(&self) -> u16 {
            0x0301
        }

        fn index(&self) -> u16 {
            0x0001
        }

        fn timeout(&self) -> Duration {
            Duration::from_millis(100)
        }

        fn command_template(&self) -> Bytes {
            Bytes::from_static(&[0x01, 0xaa, 0x00])
        }

        fn color_offset(&self) -> usize {
            2
        }
    }

    #[test]
    fn color_offset_comes_from_controller() {
        let mut buffer = CommandBuffer::new(&TrailingColor);
        buffer.set_color(0x42);

        assert_eq!(buffer.as_bytes(), &[0x01, 0xaa, 0x42]);
        assert_eq!(buffer.color(), 0x42);

        let transport = FakeTransport::default();
        assert_eq!(send_color(&transport, &TrailingColor, &buffer), Ok(3));

        let transfers = transport.transfers.borrow();
        assert_eq!(transfers[0].value, 0x0301);
        assert_eq!(transfers[0].index, 0x0001);
        assert_eq!(transfers[0].data, vec![0x01, 0xaa, 0x42]);
    }
}
