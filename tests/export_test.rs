//! Integration tests for match export
//!
//! Exercises the public API end to end: a recorded round from
//! `tests/fixtures/input` plus small hand-built matches for each scenario.

use qbj_exporter::export::ReferenceKind;
use qbj_exporter::model::{
    BonusAnswer, BonusProtest, Buzz, CorrectBonusPart, Cycle, MatchSnapshot, Player, PlayerLeave,
    Substitution, ThrownOutQuestion,
};
use qbj_exporter::pipeline::load_snapshot;
use qbj_exporter::qbj::{Match, MatchPlayer, MatchTeam, QuestionType};
use qbj_exporter::{export_match, to_qbj, ExportError, ExportOptions, ExportWarning};
use std::path::Path;

fn load_round() -> MatchSnapshot {
    load_snapshot(Path::new("tests/fixtures/input/round3.json")).expect("Failed to load fixture")
}

fn export(snapshot: &MatchSnapshot) -> Match {
    export_match(snapshot, &ExportOptions::default())
        .expect("export failed")
        .document
}

fn team<'a>(document: &'a Match, name: &str) -> &'a MatchTeam {
    document
        .match_teams
        .iter()
        .find(|t| t.team.name == name)
        .unwrap_or_else(|| panic!("team {name} missing"))
}

fn player<'a>(document: &'a Match, team_name: &str, name: &str) -> &'a MatchPlayer {
    team(document, team_name)
        .match_players
        .iter()
        .find(|p| p.player.name == name)
        .unwrap_or_else(|| panic!("player {name} missing"))
}

/// Two teams of two starters each
fn two_team_match(cycles: Vec<Cycle>) -> MatchSnapshot {
    MatchSnapshot {
        team_names: vec!["Alpha".to_string(), "Beta".to_string()],
        players: vec![
            Player::new("Ann", "Alpha", true),
            Player::new("Abe", "Alpha", true),
            Player::new("Amy", "Alpha", false),
            Player::new("Bea", "Beta", true),
            Player::new("Bob", "Beta", true),
        ],
        cycles,
    }
}

fn buzz(name: &str, team: &str, position: u32, points: i32) -> Buzz {
    Buzz {
        player: Player::new(name, team, false),
        position,
        points,
    }
}

#[test]
fn test_export_is_deterministic() {
    let snapshot = load_round();
    let first = to_qbj(&snapshot).unwrap();
    let second = to_qbj(&snapshot).unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_round_fixture() {
    let document = export(&load_round());

    assert_eq!(document.tossups_read, 4);
    assert_eq!(document.match_questions.len(), 4);

    let numbers: Vec<usize> = document.match_questions.iter().map(|q| q.question_number).collect();
    assert_eq!(numbers, vec![1, 2, 3, 4]);

    assert_eq!(team(&document, "Hillview").bonus_points, 50);
    assert_eq!(team(&document, "Riverside").bonus_points, 10);

    assert_eq!(player(&document, "Hillview", "Ada").tossups_heard, 4);
    assert_eq!(player(&document, "Hillview", "Ben").tossups_heard, 2);
    assert_eq!(player(&document, "Hillview", "Cy").tossups_heard, 2);
    assert_eq!(player(&document, "Riverside", "Dot").tossups_heard, 4);

    let notes = document.notes.as_deref().unwrap();
    let lines: Vec<&str> = notes.lines().collect();
    assert_eq!(
        lines,
        vec![
            "Tossup thrown out on question 2",
            "Tossup protest on question 2. Team \"Hillview\" protested because of this reason: \"Answer line was too narrow\".",
            "Bonus thrown out on question 3",
            "Bonus protest on question 4. Team \"Riverside\" protested part 2 because of this reason: \"Pronunciation\".",
        ]
    );
}

#[test]
fn test_lineup_history_is_strictly_increasing() {
    let document = export(&load_round());

    for match_team in &document.match_teams {
        let firsts: Vec<usize> = match_team.lineups.iter().map(|l| l.first_question).collect();
        assert_eq!(firsts[0], 1, "{} history must start at 1", match_team.team.name);
        assert!(
            firsts.windows(2).all(|w| w[0] < w[1]),
            "{} history not increasing: {:?}",
            match_team.team.name,
            firsts
        );
    }

    let hillview = team(&document, "Hillview");
    assert_eq!(hillview.lineups.len(), 2);
    let names: Vec<&str> = hillview.lineups[1].players.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(names, vec!["Ada", "Cy"]);
}

#[test]
fn test_tossup_numbering_counts_throw_outs() {
    let snapshot = load_round();
    let document = export(&snapshot);

    let mut thrown_out = 0;
    for (index, (cycle, question)) in snapshot.cycles.iter().zip(&document.match_questions).enumerate() {
        thrown_out += cycle.thrown_out_tossups.len();
        assert_eq!(
            question.tossup_question.question_number as usize,
            1 + index + thrown_out,
            "question {}",
            index + 1
        );
        assert_eq!(question.tossup_question.question_type, QuestionType::Tossup);
    }

    let replacement = document.match_questions[1].replacement_tossup_question.unwrap();
    assert_eq!(replacement.question_number, 3);
}

#[test]
fn test_tossups_heard_bounded_by_cycles() {
    let document = export(&load_round());
    for match_team in &document.match_teams {
        for match_player in &match_team.match_players {
            assert!(match_player.tossups_heard as usize <= document.tossups_read);
        }
    }
}

#[test]
fn test_bonus_points_match_controlled_points() {
    let document = export(&load_round());

    for match_team in &document.match_teams {
        let controlled: i32 = document
            .match_questions
            .iter()
            .filter(|q| {
                q.buzzes
                    .iter()
                    .any(|b| b.result.value > 0 && b.team.name == match_team.team.name)
            })
            .filter_map(|q| q.bonus.as_ref())
            .flat_map(|b| b.parts.iter().map(|p| p.controlled_points))
            .sum();
        assert_eq!(controlled, match_team.bonus_points, "{}", match_team.team.name);
    }
}

#[test]
fn test_answer_counts_match_buzzes() {
    let snapshot = load_round();
    let document = export(&snapshot);

    for match_team in &document.match_teams {
        for match_player in &match_team.match_players {
            let counted: u32 = match_player.answer_counts.iter().map(|c| c.number).sum();
            let buzzed = snapshot
                .cycles
                .iter()
                .filter(|cycle| {
                    cycle
                        .wrong_buzzes
                        .iter()
                        .chain(cycle.correct_buzz.iter())
                        .any(|b| b.player.name == match_player.player.name)
                })
                .count() as u32;
            assert_eq!(counted, buzzed, "{}", match_player.player.name);
        }
    }
}

#[test]
fn test_correct_buzz_with_full_bonus() {
    let snapshot = two_team_match(vec![Cycle {
        correct_buzz: Some(buzz("Ann", "Alpha", 44, 3)),
        bonus_answer: Some(BonusAnswer {
            receiving_team_name: "Alpha".to_string(),
            bonus_index: 0,
            correct_parts: vec![
                CorrectBonusPart { index: 0, points: 3 },
                CorrectBonusPart { index: 1, points: 3 },
                CorrectBonusPart { index: 2, points: 4 },
            ],
        }),
        ..Default::default()
    }]);
    let document = export(&snapshot);

    assert_eq!(document.match_questions.len(), 1);
    let bonus = document.match_questions[0].bonus.as_ref().unwrap();
    assert_eq!(bonus.total_points(), 10);
    let question = bonus.question.unwrap();
    assert_eq!(question.question_number, 1);
    assert_eq!(question.parts, 3);
    assert_eq!(question.question_type, QuestionType::Bonus);

    assert_eq!(team(&document, "Alpha").bonus_points, 10);
    assert_eq!(team(&document, "Beta").bonus_points, 0);

    let ann = player(&document, "Alpha", "Ann");
    assert_eq!(ann.answer_counts.len(), 1);
    assert_eq!(ann.answer_counts[0].answer.value, 3);
    assert_eq!(ann.answer_counts[0].number, 1);
}

#[test]
fn test_substitution_starts_new_lineup() {
    let sub = Cycle {
        subs: vec![Substitution {
            in_player: Player::new("Amy", "Alpha", false),
            out_player: Player::new("Abe", "Alpha", true),
        }],
        ..Default::default()
    };
    let cycles = vec![Cycle::default(), Cycle::default(), Cycle::default(), sub, Cycle::default()];
    let document = export(&two_team_match(cycles));

    let alpha = team(&document, "Alpha");
    assert_eq!(alpha.lineups.len(), 2);
    assert_eq!(alpha.lineups[1].first_question, 4);

    // Amy heard questions 4 and 5 only, Abe 1 through 3
    assert_eq!(player(&document, "Alpha", "Amy").tossups_heard, 2);
    assert_eq!(player(&document, "Alpha", "Abe").tossups_heard, 3);
    assert_eq!(player(&document, "Alpha", "Ann").tossups_heard, 5);
}

#[test]
fn test_thrown_out_tossup_shifts_numbering() {
    let plain = vec![
        Cycle {
            correct_buzz: Some(buzz("Bea", "Beta", 10, 10)),
            ..Default::default()
        },
        Cycle::default(),
    ];
    let mut thrown = plain.clone();
    thrown[0].thrown_out_tossups = vec![ThrownOutQuestion { question_index: 0 }];

    let without = export(&two_team_match(plain));
    let with = export(&two_team_match(thrown));

    let notes = with.notes.as_deref().unwrap();
    assert!(notes.contains("Tossup thrown out on question 1"));
    assert!(without.notes.is_none());

    // the next cycle's tossup lands one higher, two higher than its own slot
    assert_eq!(
        with.match_questions[1].tossup_question.question_number,
        without.match_questions[1].tossup_question.question_number + 1
    );
    assert_eq!(with.match_questions[1].tossup_question.question_number, 3);
    assert_eq!(with.match_questions[0].buzzes.len(), 1);
}

#[test]
fn test_bonus_protest_part_is_one_based() {
    let document = export(&two_team_match(vec![Cycle {
        bonus_protests: vec![BonusProtest {
            question_index: 0,
            team_name: "Beta".to_string(),
            part_index: 1,
            reason: "Answer was acceptable".to_string(),
        }],
        ..Default::default()
    }]));

    let notes = document.notes.unwrap();
    assert!(notes.contains("protested part 2 because"), "{notes}");
}

#[test]
fn test_strict_mode_rejects_unknown_team() {
    let snapshot = two_team_match(vec![Cycle {
        correct_buzz: Some(buzz("Gus", "Gamma", 10, 10)),
        ..Default::default()
    }]);

    let lenient = export_match(&snapshot, &ExportOptions::default()).unwrap();
    assert_eq!(lenient.warnings.len(), 1);
    assert!(lenient.document.match_questions[0].buzzes.is_empty());

    let strict = export_match(&snapshot, &ExportOptions::default().strict());
    assert!(matches!(strict, Err(ExportError::MalformedReferences(_))));
}

#[test]
fn test_output_field_names() {
    let json = to_qbj(&load_round()).unwrap();
    for key in [
        "\"tossups_read\"",
        "\"match_teams\"",
        "\"match_questions\"",
        "\"bonus_points\"",
        "\"match_players\"",
        "\"tossups_heard\"",
        "\"answer_counts\"",
        "\"first_question\"",
        "\"question_number\"",
        "\"buzz_position\"",
        "\"word_index\"",
        "\"controlled_points\"",
        "\"notes\"",
    ] {
        assert!(json.contains(key), "missing {key}");
    }
}

#[test]
fn test_irregular_references_in_lenient_export() {
    let bonus = |team: &str| BonusAnswer {
        receiving_team_name: team.to_string(),
        bonus_index: 0,
        correct_parts: vec![
            CorrectBonusPart { index: 0, points: 10 },
            CorrectBonusPart { index: 3, points: 10 },
        ],
    };
    let snapshot = two_team_match(vec![
        Cycle {
            player_leaves: vec![PlayerLeave { out_player: Player::new("Abe", "Alpha", true) }],
            correct_buzz: Some(buzz("Ghost", "Alpha", 12, 10)),
            ..Default::default()
        },
        Cycle {
            correct_buzz: Some(buzz("Ann", "Alpha", 30, 10)),
            bonus_answer: Some(bonus("Beta")),
            ..Default::default()
        },
        Cycle {
            bonus_answer: Some(bonus("Alpha")),
            ..Default::default()
        },
    ]);
    let export = export_match(&snapshot, &ExportOptions::default().with_bonus_parts(4)).unwrap();
    let document = &export.document;

    assert_eq!(
        export.warnings,
        vec![
            ExportWarning::UnknownPlayer {
                question: 1,
                team: "Alpha".to_string(),
                player: "Ghost".to_string(),
                kind: ReferenceKind::Buzz,
            },
            ExportWarning::BonusWithoutCorrectBuzz { question: 3 },
        ]
    );

    // leave in the first cycle replaces the starting lineup
    let alpha = team(document, "Alpha");
    assert_eq!(alpha.lineups.len(), 1);
    assert_eq!(alpha.lineups[0].first_question, 1);
    assert_eq!(alpha.lineups[0].players.len(), 1);
    assert_eq!(player(document, "Alpha", "Abe").tossups_heard, 0);

    // unknown player's buzz stays on the question, uncounted
    let buzzes = &document.match_questions[0].buzzes;
    assert_eq!(buzzes.len(), 1);
    assert_eq!(buzzes[0].player.name, "Ghost");
    assert!(alpha.match_players.iter().all(|p| p.player.name != "Ghost"));

    let scored = document.match_questions[1].bonus.as_ref().unwrap();
    assert_eq!(scored.parts.len(), 4);
    assert_eq!(scored.total_points(), 20);
    assert_eq!(team(document, "Beta").bonus_points, 20);

    assert!(document.match_questions[2].bonus.is_none());
    assert_eq!(alpha.bonus_points, 0);
}
