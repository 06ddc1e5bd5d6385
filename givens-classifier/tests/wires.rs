use givens_classifier::wires::{Wire, WireSchedule};

#[test]
fn test_schedule_length_matches_closed_form() {
    for dim in 1..=12 {
        for size in 0..=dim {
            let schedule = WireSchedule::new(dim, size);
            assert_eq!(
                schedule.len(),
                size * (2 * dim - size - 1) / 2,
                "dim={} size={}",
                dim,
                size
            );
            assert_eq!(schedule.len(), WireSchedule::expected_len(dim, size));
        }
    }
}

#[test]
fn test_wires_are_adjacent_and_in_bounds() {
    for dim in 1..=10 {
        for size in 0..=dim {
            for wire in &WireSchedule::new(dim, size) {
                assert_eq!(wire.low + 1, wire.high);
                assert!(wire.high < dim);
            }
        }
    }
}

#[test]
fn test_schedule_order() {
    let pairs: Vec<(usize, usize)> = WireSchedule::new(4, 2)
        .iter()
        .map(|w| (w.low, w.high))
        .collect();
    assert_eq!(pairs, vec![(0, 1), (1, 2), (0, 1), (2, 3), (1, 2)]);
}

#[test]
fn test_degenerate_schedules_are_empty() {
    assert!(WireSchedule::new(1, 1).is_empty());
    assert!(WireSchedule::new(6, 0).is_empty());
    assert_eq!(WireSchedule::expected_len(0, 0), 0);
}

#[test]
fn test_full_width_schedule_touches_every_pair() {
    let schedule = WireSchedule::new(5, 5);
    for low in 0..4 {
        assert!(schedule.contains(&Wire { low, high: low + 1 }));
    }
}

#[test]
fn test_wire_display() {
    assert_eq!(Wire { low: 2, high: 3 }.to_string(), "(2, 3)");
}
