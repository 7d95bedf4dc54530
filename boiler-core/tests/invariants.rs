use boiler_core::channel::{ALL_CHANNELS, ChannelId};
use boiler_core::config::{Config, DEBOUNCE_MS, LONG_PRESS_MS};
use boiler_core::input::{ButtonInput, PinLevel, PressEvent};
use boiler_core::platform::Level;
use boiler_core::scheduler::{EMPTY_SLOT, Phase, QUEUE_CAPACITY, Scheduler};
use boiler_core::serial::status::NoopStatusSink;
use boiler_core::time::Millis;
use proptest::prelude::*;

#[derive(Clone, Copy, Debug)]
enum Step {
    Short(ChannelId),
    Long(ChannelId),
    Wait(u32),
}

fn channel() -> impl Strategy<Value = ChannelId> {
    (0usize..4).prop_map(|index| ChannelId::from_index(index).expect("index in range"))
}

fn step() -> impl Strategy<Value = Step> {
    prop_oneof![
        3 => channel().prop_map(Step::Short),
        1 => channel().prop_map(Step::Long),
        2 => (0u32..2_000_000).prop_map(Step::Wait),
    ]
}

fn assert_queue_shape(scheduler: &Scheduler) {
    let slots = scheduler.queue().slots();
    let len = scheduler.queue().len();
    assert!(len <= QUEUE_CAPACITY);
    for (index, slot) in slots.iter().enumerate() {
        if index < len {
            assert!((0..4).contains(slot), "slot {index} holds {slot}");
            assert!(
                !slots[..index].contains(slot),
                "duplicate id {slot} in {slots:?}"
            );
        } else {
            assert_eq!(*slot, EMPTY_SLOT);
        }
    }
}

fn assert_processing_matches_queue(scheduler: &Scheduler) {
    assert_eq!(
        scheduler.is_processing(),
        !scheduler.queue().is_empty(),
        "phase {:?} with queue {}",
        scheduler.phase(),
        scheduler.queue()
    );
}

fn assert_only_front_runs(scheduler: &Scheduler) {
    for channel in ALL_CHANNELS {
        if scheduler.outputs().operation(channel) == Level::On {
            assert_eq!(scheduler.queue().front(), Some(channel));
            assert_eq!(scheduler.current(), channel);
            assert!(matches!(scheduler.phase(), Phase::Running { .. }));
        }
    }
}

proptest! {
    #[test]
    fn scheduler_invariants_hold_for_random_streams(
        steps in proptest::collection::vec(step(), 1..64)
    ) {
        let config = Config::new();
        let mut scheduler = Scheduler::new();
        let mut sink = NoopStatusSink;
        let mut now = 0u32;

        for step in steps {
            match step {
                Step::Short(channel) => {
                    let before = *scheduler.queue();
                    let was_queued = before.contains(channel);
                    scheduler.handle(PressEvent::Short(channel), &mut sink);
                    if was_queued {
                        prop_assert_eq!(*scheduler.queue(), before);
                    }
                }
                Step::Long(channel) => {
                    scheduler.handle(PressEvent::Long(channel), &mut sink);
                    prop_assert!(!scheduler.queue().contains(channel));
                    prop_assert_eq!(scheduler.outputs().operation(channel), Level::Off);
                }
                Step::Wait(ms) => now = now.wrapping_add(ms),
            }

            scheduler.advance(Millis::new(now), &config, &mut sink);

            if let Step::Short(ChannelId::Master) = step {
                prop_assert_eq!(scheduler.queue().front(), Some(ChannelId::Master));
                for channel in ALL_CHANNELS.into_iter().filter(|c| !c.is_master()) {
                    prop_assert_eq!(scheduler.outputs().operation(channel), Level::Off);
                }
            }

            assert_queue_shape(&scheduler);
            assert_processing_matches_queue(&scheduler);
            assert_only_front_runs(&scheduler);
        }
    }

    #[test]
    fn sustained_press_is_classified_by_duration(
        start in any::<u32>(),
        duration in 0u32..8_000,
    ) {
        prop_assume!(duration != DEBOUNCE_MS && duration != LONG_PRESS_MS);

        let mut button = ButtonInput::new(ChannelId::B);
        let begin = Millis::new(start);
        let mut events = Vec::new();
        // Held through `begin + duration`, released one sample later.
        for offset in 0..=duration {
            events.extend(button.sample(PinLevel::Pressed, begin + offset));
        }
        events.extend(button.sample(PinLevel::Released, begin + (duration + 1)));

        if duration < DEBOUNCE_MS {
            prop_assert!(events.is_empty());
        } else if duration < LONG_PRESS_MS {
            prop_assert_eq!(events, vec![PressEvent::Short(ChannelId::B)]);
        } else {
            prop_assert_eq!(events, vec![PressEvent::Long(ChannelId::B)]);
        }
    }
}
