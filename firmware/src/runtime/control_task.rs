use boiler_core::config::{Config, PinMap};
use boiler_core::controller::Controller;
use boiler_core::time::Millis;
use embassy_time::{Duration, Instant, Ticker};

use crate::hw::BoardPlatform;
use crate::trace;

/// Super-loop period.
const TICK_PERIOD_MS: u64 = 1;

#[embassy_executor::task]
pub async fn run(mut platform: BoardPlatform<'static>) -> ! {
    let link = platform.link();
    let mut controller = Controller::new(Config::new(), PinMap::DEFAULT);
    controller.boot(&mut platform);
    defmt::info!(
        "control: outputs released, operation {} min",
        controller.config().operation_minutes()
    );

    let mut ticker = Ticker::every(Duration::from_millis(TICK_PERIOD_MS));
    loop {
        ticker.next().await;

        let now = Millis::from_u64(Instant::now().as_millis());
        let report = controller.tick(now, &mut platform);
        if !report.is_quiet() {
            trace::tick_report(&report, controller.scheduler());
        }

        trace::overruns(
            link.take_rx_overruns(),
            link.take_tx_overruns(),
            report.dropped_status,
        );
    }
}
