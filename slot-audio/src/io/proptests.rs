use core::time::Duration;

use proptest::prelude::*;

use crate::config::{CaptureConfig, SessionConfig};
use crate::sim::SimPlatform;
use crate::Session;

#[derive(Debug, Clone, Copy)]
enum Event {
    Capture,
    Render,
}

fn event_strategy() -> impl Strategy<Value = Event> {
    prop_oneof![Just(Event::Capture), Just(Event::Render)]
}

fn geometry_strategy() -> impl Strategy<Value = (usize, usize)> {
    let block_frames = prop_oneof![Just(16usize), Just(64usize), Just(100usize), Just(256usize)];
    (block_frames, 0usize..3000)
}

fn duplex_config(block_frames: usize, latency: usize) -> SessionConfig {
    SessionConfig::default()
        .with_sample_rate(48_000)
        .with_block_frames(block_frames)
        .with_capture(CaptureConfig::default())
        .with_latency_frames(latency)
        .with_drain_delay(Duration::ZERO)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// Random capture/render interleavings in duplex mode never let the read
    /// side overtake the write side, and the ring never reports a count
    /// outside `[0, slot_count)`.
    #[test]
    fn duplex_read_never_overtakes_write(
        (block_frames, latency) in geometry_strategy(),
        events in proptest::collection::vec(event_strategy(), 1..300),
    ) {
        let passthrough = |_: &mut [i16], _: usize, _: u32| true;
        let session = Session::new(duplex_config(block_frames, latency), SimPlatform::new(), passthrough)
            .unwrap();
        let platform = session.platform();
        let slots = session.geometry().slot_count;
        let block = vec![1i16; block_frames * 2];
        let mut out = vec![0i16; block_frames * 2];

        let mut written = 0u64;
        for event in events {
            match event {
                Event::Capture => {
                    // Hardware lapping the reader is out of scope here.
                    if session.ring().buffered() + 1 < slots {
                        platform.capture_block(&block);
                        written += 1;
                    }
                }
                Event::Render => {
                    platform.render_block(&mut out);
                }
            }

            let read = session.stats().deliveries;
            prop_assert!(read <= written);
            prop_assert!(session.ring().buffered() < slots);
            prop_assert_eq!((written - read) as usize, session.ring().buffered());
        }
    }

    /// The render handler submits exactly one block per request and only
    /// advances `read_index` when that block is a ring slot.
    #[test]
    fn each_render_submits_one_block(
        (block_frames, latency) in geometry_strategy(),
        events in proptest::collection::vec(event_strategy(), 1..200),
    ) {
        let passthrough = |_: &mut [i16], _: usize, _: u32| true;
        let session = Session::new(duplex_config(block_frames, latency), SimPlatform::new(), passthrough)
            .unwrap();
        let platform = session.platform();
        let slots = session.geometry().slot_count;
        let block = vec![1i16; block_frames * 2];
        let mut out = vec![0i16; block_frames * 2];

        for event in events {
            match event {
                Event::Capture if session.ring().buffered() + 1 < slots => {
                    platform.capture_block(&block);
                }
                Event::Capture => {}
                Event::Render => {
                    let read_before = session.ring().read_index();
                    let submitted_before = platform.render_history().len();
                    platform.render_block(&mut out);

                    let history = platform.render_history();
                    prop_assert_eq!(history.len(), submitted_before + 1);
                    match history[history.len() - 1] {
                        Some(slot) => {
                            prop_assert_eq!(slot, read_before);
                            prop_assert_eq!(session.ring().read_index(), (read_before + 1) % slots);
                        }
                        None => prop_assert_eq!(session.ring().read_index(), read_before),
                    }
                }
            }
        }
    }

    /// Playback-only sessions with an always-producing callback stop
    /// submitting silence once the ring has cycled once.
    #[test]
    fn playback_only_settles(
        (block_frames, latency) in geometry_strategy(),
        extra in 1usize..100,
    ) {
        let tone = |buf: &mut [i16], _: usize, _: u32| {
            buf.fill(300);
            true
        };
        let config = SessionConfig::default()
            .with_block_frames(block_frames)
            .with_latency_frames(latency)
            .with_drain_delay(Duration::ZERO);
        let session = Session::new(config, SimPlatform::new(), tone).unwrap();
        let slots = session.geometry().slot_count;
        let mut out = vec![0i16; block_frames * 2];

        for _ in 0..slots {
            session.platform().render_block(&mut out);
        }
        let settled = session.platform().render_history().len();
        for _ in 0..extra {
            session.platform().render_block(&mut out);
        }
        let history = session.platform().render_history();
        prop_assert!(history[settled..].iter().all(Option::is_some));
    }
}
