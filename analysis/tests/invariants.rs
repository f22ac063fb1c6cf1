//! Property tests for the normalizer, win-probability model and classifier.

use analysis::{
    cp_loss, normalize, win_probability, AccuracyAggregator, Classifier, MoveClassification,
    MoveRecord, NormalizedEvaluation,
};
use chess::{PieceColor, PositionEvaluation, MATE_SCORE};
use proptest::prelude::*;

fn side() -> impl Strategy<Value = PieceColor> {
    prop_oneof![Just(PieceColor::White), Just(PieceColor::Black)]
}

fn evaluation() -> impl Strategy<Value = PositionEvaluation> {
    prop_oneof![
        (-MATE_SCORE..=MATE_SCORE).prop_map(|cp| PositionEvaluation::centipawns("e2e4", cp)),
        (-60i32..=60)
            .prop_filter("mate distance is never zero", |m| *m != 0)
            .prop_map(|m| PositionEvaluation::mate("e2e4", m)),
    ]
}

fn record(side: PieceColor, ply_index: u32, checkmate: bool, sacrifice: bool) -> MoveRecord {
    MoveRecord {
        ply_index,
        side_to_move: side,
        move_notation: "Qxf7".to_string(),
        uci: "d5f7".to_string(),
        is_capture: true,
        moving_piece_value: if sacrifice { 9 } else { 1 },
        captured_piece_value: Some(1),
        delivers_checkmate: checkmate,
        moved_piece_hanging: false,
        fen_before: String::new(),
        fen_after: String::new(),
    }
}

mod perspective {
    use super::*;

    proptest! {
        #[test]
        fn white_keeps_sign_black_flips(v in -MATE_SCORE..=MATE_SCORE) {
            let raw = PositionEvaluation::centipawns("e2e4", v);
            prop_assert_eq!(normalize(&raw, PieceColor::White).advantage_to_mover_cp, v);
            prop_assert_eq!(normalize(&raw, PieceColor::Black).advantage_to_mover_cp, -v);
        }

        #[test]
        fn sooner_mate_ranks_higher(a in 1i32..=99, b in 1i32..=99) {
            prop_assume!(a < b);
            let sooner = normalize(&PositionEvaluation::mate("e2e4", a), PieceColor::White);
            let later = normalize(&PositionEvaluation::mate("e2e4", b), PieceColor::White);
            prop_assert!(sooner.advantage_to_mover_cp > later.advantage_to_mover_cp);
            prop_assert!(sooner.advantage_to_mover_cp < MATE_SCORE);
        }
    }
}

mod win_probability_model {
    use super::*;

    proptest! {
        #[test]
        fn strictly_monotonic(a in -4_000i32..4_000, b in -4_000i32..4_000) {
            prop_assume!(a < b);
            prop_assert!(win_probability(a) < win_probability(b));
        }

        #[test]
        fn bounded(cp in any::<i32>()) {
            let p = win_probability(cp);
            prop_assert!((0.0..=1.0).contains(&p));
        }
    }
}

mod classifier {
    use super::*;

    proptest! {
        #[test]
        fn loss_is_never_negative(
            before in evaluation(),
            after in evaluation(),
            mover in side(),
        ) {
            let b = normalize(&before, mover);
            let a = normalize(&after, mover);
            let loss = cp_loss(&b, &a);
            if a.advantage_to_mover_cp >= b.advantage_to_mover_cp {
                prop_assert_eq!(loss, 0);
            }
            let (result, _, _) = Classifier::default()
                .classify_move(&record(mover, 40, false, false), &before, &after);
            prop_assert!(result.win_loss_pct >= 0.0 && result.win_loss_pct <= 100.0);
            prop_assert_eq!(result.cp_loss, loss);
        }

        #[test]
        fn checkmate_is_always_best(
            before in evaluation(),
            after in evaluation(),
            mover in side(),
            ply in 0u32..200,
            sacrifice in any::<bool>(),
        ) {
            let rec = record(mover, ply, true, sacrifice);
            let (result, _, _) = Classifier::default().classify_move(&rec, &before, &after);
            prop_assert_eq!(result.label, MoveClassification::Best);
        }

        #[test]
        fn garbage_time_only_best_or_excellent(
            before in 701i32..=MATE_SCORE,
            losing in any::<bool>(),
            after in -MATE_SCORE..=MATE_SCORE,
            ply in 0u32..200,
            sacrifice in any::<bool>(),
        ) {
            let before = if losing { -before } else { before };
            let rec = record(PieceColor::White, ply, false, sacrifice);
            let result = Classifier::default().classify(
                &rec,
                Some("d5f7"),
                NormalizedEvaluation { advantage_to_mover_cp: before, mate_in: None },
                NormalizedEvaluation { advantage_to_mover_cp: after, mate_in: None },
                ply < 30,
            );
            prop_assert!(matches!(
                result.label,
                MoveClassification::Best | MoveClassification::Excellent
            ));
        }

        #[test]
        fn classification_is_deterministic(
            before in evaluation(),
            after in evaluation(),
            mover in side(),
            ply in 0u32..200,
        ) {
            let rec = record(mover, ply, false, true);
            let classifier = Classifier::default();
            let first = classifier.classify_move(&rec, &before, &after);
            let second = classifier.classify_move(&rec, &before, &after);
            prop_assert_eq!(first, second);
        }
    }
}

mod aggregation {
    use super::*;

    proptest! {
        #[test]
        fn zero_loss_games_score_100(moves in 1usize..80) {
            let classifier = Classifier::default();
            let mut agg = AccuracyAggregator::new();
            let eval = PositionEvaluation::centipawns("d5f7", 20);
            for ply in 0..moves {
                let mover = if ply % 2 == 0 {
                    PieceColor::White
                } else {
                    PieceColor::Black
                };
                // Unchanged score: nobody loses anything.
                let rec = record(mover, ply as u32, false, false);
                let (result, _, _) = classifier.classify_move(&rec, &eval, &eval);
                agg.fold(mover, &result);
            }
            let (white, _) = agg.finalize(120.0);
            prop_assert_eq!(white.accuracy_pct, 100.0);
        }

        #[test]
        fn accuracy_within_bounds(losses in proptest::collection::vec(0u32..5_000, 1..60)) {
            let total: u64 = losses.iter().map(|&l| u64::from(l)).sum();
            let acc = analysis::accuracy_pct(total, losses.len() as u32, 120.0);
            prop_assert!((0.0..=100.0).contains(&acc));
        }
    }
}
