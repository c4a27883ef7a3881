//! Property tests for the codec bound and the single-session guarantee.

mod common;

use std::sync::Arc;

use common::*;
use proptest::prelude::*;
use proxbeacon_core::{
    AdvertiseController, AdvertisementReport, BeaconError, BeaconEvent, EventSink, Identifier,
    PayloadCodec, RadioErrorCode, SessionEpoch,
};

fn codec() -> PayloadCodec {
    PayloadCodec::new(TEST_TAG, 31)
}

proptest! {
    /// Anything that fits the budget round-trips unchanged through
    /// encode and a service-data report.
    #[test]
    fn codec_round_trips_within_budget(bytes in proptest::collection::vec(any::<u8>(), 1..=15)) {
        let codec = codec();
        let identifier = Identifier::from_bytes(&bytes);
        let payload = codec.encode(&identifier).unwrap();
        prop_assert!(payload.encoded_len() <= 31);

        let report = AdvertisementReport::new(-50)
            .with_service_data(payload.tag(), payload.service_data().to_vec());
        prop_assert_eq!(codec.decode(&report), Some(identifier));
    }

    /// Anything over the budget is rejected, never truncated.
    #[test]
    fn codec_rejects_over_budget(bytes in proptest::collection::vec(any::<u8>(), 16..=40)) {
        let codec = codec();
        let identifier = Identifier::from_bytes(&bytes);
        prop_assert_eq!(
            codec.encode(&identifier),
            Err(BeaconError::PayloadTooLarge { size: 16 + bytes.len(), max: 31 })
        );
    }
}

// ----------------------------------------------------------------------------
// Single-session property
// ----------------------------------------------------------------------------

#[derive(Debug, Clone, Copy)]
enum Op {
    Start,
    Stop,
    Refresh,
    CompleteOk,
    CompleteErr,
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        Just(Op::Start),
        Just(Op::Stop),
        Just(Op::Refresh),
        Just(Op::CompleteOk),
        Just(Op::CompleteErr),
    ]
}

proptest! {
    /// For every call sequence, at most one radio session is pending or
    /// active at any time: sessions started on the radio minus sessions
    /// torn down (stop call or failed start) never exceeds one.
    #[test]
    fn at_most_one_radio_session(ops in proptest::collection::vec(op_strategy(), 0..60)) {
        let radio = MockAdvertiser::online();
        let sink: Arc<dyn EventSink> = Arc::new(|_event: BeaconEvent| {});
        let mut controller = AdvertiseController::new(
            radio.clone(),
            FixedSource::named(b"prop-id"),
            codec(),
            sink,
        );

        let mut outstanding: Option<SessionEpoch> = None;
        let mut failed_completions = 0usize;
        let mut seen_starts = 0usize;

        for op in ops {
            match op {
                Op::Start => { let _ = controller.start(); }
                Op::Stop => controller.stop(),
                Op::Refresh => { let _ = controller.refresh(); }
                Op::CompleteOk => {
                    if let Some(session) = outstanding.take() {
                        controller.on_start_result(session, Ok(()));
                    }
                }
                Op::CompleteErr => {
                    if let Some(session) = outstanding.take() {
                        controller.on_start_result(session, Err(RadioErrorCode::new(1)));
                        failed_completions += 1;
                    }
                }
            }

            // A new radio start may have been issued by this op (including
            // a deferred restart applied inside a completion).
            let starts = radio.start_count();
            if starts > seen_starts {
                prop_assert_eq!(starts, seen_starts + 1);
                seen_starts = starts;
                outstanding = radio.last_session();
            }

            let torn_down = radio.stop_count() + failed_completions;
            let active = starts - torn_down;
            prop_assert!(active <= 1, "{} radio sessions alive", active);
        }
    }
}
