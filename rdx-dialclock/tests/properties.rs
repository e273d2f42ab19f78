use dialclock::prelude::*;
use dialclock::rotation::rotate;
use proptest::prelude::*;

fn sample(hour: u32, minute: u32, second: u32, nanosecond: u32) -> TimeSample {
    TimeSample {
        hour: Some(hour),
        minute: Some(minute),
        second: Some(second),
        nanosecond: Some(nanosecond),
        ..Default::default()
    }
}

fn any_hand() -> impl Strategy<Value = HandSpec> {
    let base = prop_oneof![
        Just(ClockBase::TwelveHour),
        Just(ClockBase::TwentyFourHour),
        Just(ClockBase::Decimal),
    ];
    let dial = prop_oneof![Just(DialBase::Standard), Just(DialBase::Decimal)];
    prop_oneof![
        base.prop_map(HandSpec::Hour),
        dial.clone().prop_map(HandSpec::Minute),
        (dial, any::<bool>()).prop_map(|(base, precise)| HandSpec::Second { base, precise }),
        Just(HandSpec::Period),
        Just(HandSpec::TickTock),
        Just(HandSpec::TickTockPendulum),
    ]
}

fn any_unit() -> impl Strategy<Value = RotationUnit> {
    prop_oneof![Just(RotationUnit::Degrees), Just(RotationUnit::Radians)]
}

proptest! {
    #[test]
    fn every_hand_stays_within_its_range(
        hour in 0u32..24,
        minute in 0u32..60,
        second in 0u32..60,
        nanosecond in 0u32..1_000_000_000,
        hand in any_hand(),
        unit in any_unit(),
    ) {
        let value = rotate(&sample(hour, minute, second, nanosecond), hand, unit)
            .expect("a complete sample resolves every hand");
        if hand.is_indicator() {
            prop_assert!((0.0..=1.0).contains(&value), "{hand} = {value}");
        } else {
            prop_assert!(value >= 0.0 && value < unit.full_circle(), "{hand} = {value}");
        }
    }

    #[test]
    fn hour_hand_only_moves_forward_within_an_hour(
        hour in 0u32..24,
        start in 0u32..3599,
        step in 1u32..600,
    ) {
        let end = (start + step).min(3599);
        let at = |offset: u32| {
            rotate(
                &sample(hour, offset / 60, offset % 60, 0),
                HandSpec::Hour(ClockBase::TwelveHour),
                RotationUnit::Degrees,
            )
            .unwrap()
        };
        let (before, after) = (at(start), at(end));
        prop_assert!(after >= before, "{before} -> {after}");
        // One hour of a 12-hour dial is 30 degrees.
        prop_assert!(after - before <= 30.0 * f64::from(end - start) / 3600.0 + 1e-9);
    }

    #[test]
    fn hour_hand_is_continuous_across_the_hour_carry(hour in 0u32..23) {
        let hand = HandSpec::Hour(ClockBase::TwentyFourHour);
        let before = rotate(&sample(hour, 59, 59, 999_999_999), hand, RotationUnit::Degrees)
            .unwrap();
        let after = rotate(&sample(hour + 1, 0, 0, 0), hand, RotationUnit::Degrees).unwrap();
        prop_assert!((after - before).abs() < 1e-6, "{before} -> {after}");
    }

    #[test]
    fn radians_are_degrees_rescaled(
        hour in 0u32..24,
        minute in 0u32..60,
        second in 0u32..60,
    ) {
        let moment = sample(hour, minute, second, 0);
        for hand in [
            HandSpec::Hour(ClockBase::TwentyFourHour),
            HandSpec::Minute(DialBase::Standard),
        ] {
            let degrees = rotate(&moment, hand, RotationUnit::Degrees).unwrap();
            let radians = rotate(&moment, hand, RotationUnit::Radians).unwrap();
            prop_assert!((degrees.to_radians() - radians).abs() < 1e-9);
        }
    }

    #[test]
    fn interval_resolution_never_rejects_a_valid_interval(seconds in 1e-4f64..10.0) {
        let level = PrecisionPolicy::default().precision_from_interval(seconds);
        prop_assert!((level.interval() - seconds).abs() <= 1e-6);
        prop_assert!(level.duration().is_ok());
    }
}
