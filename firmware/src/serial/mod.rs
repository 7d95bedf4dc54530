//! Byte and line queues between the UART task and the control loop.
//!
//! The control loop never awaits the UART: it drains received bytes with
//! `try_receive` and hands finished status lines over with `try_send`. The
//! UART task owns both ends of the wire.

#![allow(dead_code)]

use boiler_core::serial::status::MAX_STATUS_LINE;
use embassy_sync::channel::{Channel, Receiver, Sender};
use heapless::Vec;
use portable_atomic::{AtomicU32, Ordering};

#[cfg(not(target_os = "none"))]
use embassy_sync::blocking_mutex::raw::NoopRawMutex;
#[cfg(target_os = "none")]
use embassy_sync::blocking_mutex::raw::ThreadModeRawMutex;

#[cfg(target_os = "none")]
type SerialMutex = ThreadModeRawMutex;
#[cfg(not(target_os = "none"))]
type SerialMutex = NoopRawMutex;

/// Received bytes buffered between two control-loop ticks.
pub const RX_QUEUE_DEPTH: usize = 64;

/// Status lines waiting for the UART.
pub const TX_QUEUE_DEPTH: usize = 16;

/// Baud rate of the host link.
pub const SERIAL_BAUD: u32 = 9_600;

/// One newline-terminated status line.
pub type TxLine = Vec<u8, MAX_STATUS_LINE>;

pub type RxChannel = Channel<SerialMutex, u8, RX_QUEUE_DEPTH>;
pub type RxSender<'a> = Sender<'a, SerialMutex, u8, RX_QUEUE_DEPTH>;
pub type TxChannel = Channel<SerialMutex, TxLine, TX_QUEUE_DEPTH>;
pub type TxReceiver<'a> = Receiver<'a, SerialMutex, TxLine, TX_QUEUE_DEPTH>;

/// Shared state for the serial link.
pub struct SerialLink {
    rx: RxChannel,
    tx: TxChannel,
    rx_overruns: AtomicU32,
    tx_overruns: AtomicU32,
}

impl SerialLink {
    pub const fn new() -> Self {
        Self {
            rx: Channel::new(),
            tx: Channel::new(),
            rx_overruns: AtomicU32::new(0),
            tx_overruns: AtomicU32::new(0),
        }
    }

    /// Stores a byte read from the UART; counts it as an overrun when full.
    pub fn push_received(&self, byte: u8) -> bool {
        if self.rx.try_send(byte).is_ok() {
            true
        } else {
            self.rx_overruns.fetch_add(1, Ordering::Relaxed);
            false
        }
    }

    /// Next received byte, if any.
    pub fn try_next_byte(&self) -> Option<u8> {
        self.rx.try_receive().ok()
    }

    /// Queues a rendered status line for transmission.
    pub fn queue_line(&self, line: &[u8]) -> bool {
        let Ok(frame) = TxLine::from_slice(line) else {
            self.tx_overruns.fetch_add(1, Ordering::Relaxed);
            return false;
        };

        if self.tx.try_send(frame).is_ok() {
            true
        } else {
            self.tx_overruns.fetch_add(1, Ordering::Relaxed);
            false
        }
    }

    /// Status lines that can still be queued before `queue_line` drops.
    pub fn tx_free(&self) -> usize {
        self.tx.free_capacity()
    }

    pub fn rx_sender(&self) -> RxSender<'_> {
        self.rx.sender()
    }

    pub fn tx_receiver(&self) -> TxReceiver<'_> {
        self.tx.receiver()
    }

    /// Returns and clears the number of received bytes dropped.
    pub fn take_rx_overruns(&self) -> u32 {
        self.rx_overruns.swap(0, Ordering::Relaxed)
    }

    /// Returns and clears the number of status lines dropped.
    pub fn take_tx_overruns(&self) -> u32 {
        self.tx_overruns.swap(0, Ordering::Relaxed)
    }
}

impl Default for SerialLink {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn received_bytes_drain_in_order() {
        let link = SerialLink::new();
        for byte in b"init\n" {
            assert!(link.push_received(*byte));
        }

        let mut drained = Vec::<u8, 8>::new();
        while let Some(byte) = link.try_next_byte() {
            drained.push(byte).expect("room");
        }
        assert_eq!(drained.as_slice(), b"init\n");
    }

    #[test]
    fn rx_overrun_is_counted_and_cleared() {
        let link = SerialLink::new();
        for _ in 0..RX_QUEUE_DEPTH {
            assert!(link.push_received(b'x'));
        }
        assert!(!link.push_received(b'y'));
        assert!(!link.push_received(b'z'));
        assert_eq!(link.take_rx_overruns(), 2);
        assert_eq!(link.take_rx_overruns(), 0);
    }

    #[test]
    fn status_lines_reach_the_uart_side() {
        let link = SerialLink::new();
        assert!(link.queue_line(b"led 7 on\n"));

        let receiver = link.tx_receiver();
        let line = receiver.try_receive().expect("line queued");
        assert_eq!(line.as_slice(), b"led 7 on\n");
    }

    #[test]
    fn tx_free_tracks_queued_lines() {
        let link = SerialLink::new();
        assert_eq!(link.tx_free(), TX_QUEUE_DEPTH);
        assert!(link.queue_line(b"led 6 on\n"));
        assert!(link.queue_line(b"timer 30\n"));
        assert_eq!(link.tx_free(), TX_QUEUE_DEPTH - 2);

        let receiver = link.tx_receiver();
        receiver.try_receive().expect("line queued");
        assert_eq!(link.tx_free(), TX_QUEUE_DEPTH - 1);
    }

    #[test]
    fn tx_overflow_drops_whole_lines() {
        let link = SerialLink::new();
        for _ in 0..TX_QUEUE_DEPTH {
            assert!(link.queue_line(b"timer 30\n"));
        }
        assert!(!link.queue_line(b"timer 30\n"));
        assert!(!link.queue_line(&[b'x'; MAX_STATUS_LINE + 1]));
        assert_eq!(link.take_tx_overruns(), 2);
    }
}
