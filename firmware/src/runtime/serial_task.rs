use embassy_futures::join::join;
use embassy_stm32 as hal;
use embassy_stm32::Peri;
use embassy_stm32::usart::{BufferedUart, Config as UartConfig, DataBits, Parity, StopBits};
use embassy_time::{Duration, Timer};
use embedded_io_async::{Read, Write};
use static_cell::StaticCell;

use crate::serial::{RX_QUEUE_DEPTH, SERIAL_BAUD, SerialLink};
use crate::trace;

const UART_BUFFER_SIZE: usize = RX_QUEUE_DEPTH;
const UART_ERROR_BACKOFF_MS: u64 = 5;

static UART_TX_BUFFER: StaticCell<[u8; UART_BUFFER_SIZE]> = StaticCell::new();
static UART_RX_BUFFER: StaticCell<[u8; UART_BUFFER_SIZE]> = StaticCell::new();

embassy_stm32::bind_interrupts!(struct UartIrqs {
    USART3_4_5_6_LPUART1 => embassy_stm32::usart::BufferedInterruptHandler<hal::peripherals::USART5>;
});

#[embassy_executor::task]
pub async fn run(
    link: &'static SerialLink,
    usart: Peri<'static, hal::peripherals::USART5>,
    tx_pin: Peri<'static, hal::peripherals::PB0>,
    rx_pin: Peri<'static, hal::peripherals::PB1>,
) -> ! {
    let mut config = UartConfig::default();
    config.baudrate = SERIAL_BAUD;
    config.data_bits = DataBits::DataBits8;
    config.stop_bits = StopBits::STOP1;
    config.parity = Parity::ParityNone;

    let uart = BufferedUart::new(
        usart,
        rx_pin,
        tx_pin,
        UART_TX_BUFFER.init([0; UART_BUFFER_SIZE]),
        UART_RX_BUFFER.init([0; UART_BUFFER_SIZE]),
        UartIrqs,
        config,
    )
    .expect("failed to initialize host UART");

    let (mut uart_tx, mut uart_rx) = uart.split();
    let outgoing = link.tx_receiver();

    let host_to_loop = async move {
        let mut ingress = [0u8; 16];
        loop {
            match uart_rx.read(&mut ingress).await {
                Ok(count) => {
                    for byte in &ingress[..count] {
                        link.push_received(*byte);
                    }
                }
                Err(_) => {
                    trace::uart_error("read");
                    Timer::after(Duration::from_millis(UART_ERROR_BACKOFF_MS)).await;
                }
            }
        }
    };

    let loop_to_host = async move {
        loop {
            let line = outgoing.receive().await;
            if uart_tx.write_all(&line).await.is_err() {
                trace::uart_error("write");
                Timer::after(Duration::from_millis(UART_ERROR_BACKOFF_MS)).await;
                continue;
            }
            if uart_tx.flush().await.is_err() {
                trace::uart_error("flush");
            }
        }
    };

    join(host_to_loop, loop_to_host).await;
    loop {
        core::future::pending::<()>().await;
    }
}
