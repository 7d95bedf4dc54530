use cortex_m::interrupt;
use cortex_m::register::primask;
use critical_section::{self, RawRestoreState};
use defmt_rtt as _;
use embassy_executor::Spawner;
use embassy_stm32 as hal;
use embassy_stm32::gpio::{Input, Level, Output, Pull, Speed};

use crate::hw::{BoardPlatform, ChannelIo};
use crate::serial::SerialLink;

mod control_task;
mod serial_task;

critical_section::set_impl!(InterruptCriticalSection);

struct InterruptCriticalSection;

unsafe impl critical_section::Impl for InterruptCriticalSection {
    unsafe fn acquire() -> RawRestoreState {
        let primask = primask::read();
        interrupt::disable();
        primask.is_active()
    }

    unsafe fn release(restore_state: RawRestoreState) {
        if restore_state {
            unsafe {
                interrupt::enable();
            }
        }
    }
}

pub(super) static SERIAL_LINK: SerialLink = SerialLink::new();

#[embassy_executor::main]
pub async fn main(spawner: Spawner) {
    let config = hal::Config::default();
    let hal::Peripherals {
        PA0,
        PA1,
        PA4,
        PA5,
        PA6,
        PA7,
        PA8,
        PA9,
        PA10,
        PB3,
        PB4,
        PB5,
        PB0,
        PB1,
        USART5,
        ..
    } = hal::init(config);

    // Channel order: master, a, b, c.
    let platform = BoardPlatform::new(
        [
            ChannelIo {
                button: Input::new(PA0, Pull::Up),
                control: Output::new(PA6, Level::Low, Speed::Low),
                operation: Output::new(PA10, Level::Low, Speed::Low),
            },
            ChannelIo {
                button: Input::new(PA1, Pull::Up),
                control: Output::new(PA7, Level::Low, Speed::Low),
                operation: Output::new(PB3, Level::Low, Speed::Low),
            },
            ChannelIo {
                button: Input::new(PA4, Pull::Up),
                control: Output::new(PA8, Level::Low, Speed::Low),
                operation: Output::new(PB4, Level::Low, Speed::Low),
            },
            ChannelIo {
                button: Input::new(PA5, Pull::Up),
                control: Output::new(PA9, Level::Low, Speed::Low),
                operation: Output::new(PB5, Level::Low, Speed::Low),
            },
        ],
        &SERIAL_LINK,
    );

    spawner
        .spawn(serial_task::run(&SERIAL_LINK, USART5, PB0, PB1))
        .expect("failed to spawn serial task");

    spawner
        .spawn(control_task::run(platform))
        .expect("failed to spawn control task");

    core::future::pending::<()>().await;
}
