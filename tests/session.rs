use pokeguess::catalog::{CreatureRecord, NameCatalog};
use pokeguess::state::{Delta, GameState, GuessOutcome, Phase, ProviderCommand, apply_delta};

fn record(id: u32, name: &str) -> CreatureRecord {
    CreatureRecord {
        id,
        name: name.to_string(),
        image_url: Some(format!("https://img.example/{id}.png")),
    }
}

fn fetch_generation(cmds: &[ProviderCommand]) -> u64 {
    cmds.iter()
        .find_map(|cmd| match cmd {
            ProviderCommand::FetchCreature { generation, .. } => Some(*generation),
            _ => None,
        })
        .expect("a creature fetch should be requested")
}

fn deliver(state: &mut GameState, cmds: &[ProviderCommand], name: &str) {
    let generation = fetch_generation(cmds);
    apply_delta(
        state,
        Delta::CreatureLoaded {
            generation,
            record: record(25, name),
        },
    );
}

fn playing(name: &str) -> GameState {
    let mut state = GameState::new(173, 173, Some(7));
    let cmds = state.start();
    deliver(&mut state, &cmds, name);
    assert_eq!(*state.phase(), Phase::Playing);
    state
}

#[test]
fn start_requests_creature_and_catalog() {
    let mut state = GameState::new(173, 151, Some(1));
    assert!(state.is_loading());
    let cmds = state.start();
    assert_eq!(cmds.len(), 2);
    assert!(matches!(
        cmds[0],
        ProviderCommand::FetchCreature { generation: 1, id } if (1..=173).contains(&id)
    ));
    assert_eq!(cmds[1], ProviderCommand::FetchNameCatalog { limit: 151 });
    assert!(state.current().is_none());
    assert_eq!(state.score(), 0);
}

#[test]
fn correct_guess_scores_without_ending_game() {
    let mut state = playing("Pikachu");
    state.set_guess_text("pikachu");

    assert_eq!(state.submit_guess(), Some(GuessOutcome::Correct));
    assert_eq!(state.score(), 1);
    assert!(!state.is_game_over());
    assert_eq!(*state.phase(), Phase::Correct);
    assert!(state.feedback().contains("Pikachu"));
    assert!(state.guess_text().is_empty());
    assert!(state.suggestions().is_empty());
}

#[test]
fn wrong_guess_ends_game_and_keeps_score() {
    let mut state = playing("Pikachu");
    state.set_guess_text("raichu");

    assert_eq!(state.submit_guess(), Some(GuessOutcome::Incorrect));
    assert!(state.is_game_over());
    assert_eq!(state.score(), 0);
    assert!(state.feedback().contains("Pikachu"));
    assert!(state.guess_text().is_empty());

    // No further guesses until restart.
    state.set_guess_text("pikachu");
    assert_eq!(state.guess_text(), "");
    assert_eq!(state.submit_guess(), None);
    assert_eq!(state.score(), 0);
}

#[test]
fn empty_guess_is_compared_like_any_other() {
    let mut state = playing("Pikachu");
    assert_eq!(state.submit_guess(), Some(GuessOutcome::Incorrect));
    assert!(state.is_game_over());
}

#[test]
fn guess_while_loading_is_ignored() {
    let mut state = GameState::new(173, 173, Some(3));
    state.start();
    state.set_guess_text("pikachu");
    assert_eq!(state.submit_guess(), None);
    assert!(state.is_loading());
}

#[test]
fn advance_keeps_score_and_clears_round() {
    let mut state = playing("bulbasaur");
    state.set_guess_text("Bulbasaur");
    state.submit_guess();
    assert_eq!(state.score(), 1);

    let cmds = state.advance_round();
    assert!(state.is_loading());
    assert!(state.feedback().is_empty());
    assert!(state.current().is_none());
    assert_eq!(state.score(), 1);
    // Catalog was already requested; advancing does not ask again.
    assert_eq!(cmds.len(), 1);

    deliver(&mut state, &cmds, "ivysaur");
    state.set_guess_text("ivysaur");
    state.submit_guess();
    assert_eq!(state.score(), 2);
    assert_eq!(state.best_score(), 2);
}

#[test]
fn restart_after_loss_resets_score() {
    let mut state = playing("bulbasaur");
    state.set_guess_text("bulbasaur");
    state.submit_guess();
    state.advance_round();
    let cmds = state.advance_round();
    assert!(cmds.is_empty(), "advance is only valid after a correct guess");

    let mut state = playing("bulbasaur");
    state.set_guess_text("bulbasaur");
    state.submit_guess();
    let cmds = state.advance_round();
    deliver(&mut state, &cmds, "charmander");
    state.set_guess_text("squirtle");
    state.submit_guess();
    assert!(state.is_game_over());
    assert_eq!(state.score(), 1);

    let cmds = state.restart();
    assert_eq!(cmds.len(), 1);
    assert_eq!(state.score(), 0);
    assert_eq!(state.best_score(), 1);
    assert!(!state.is_game_over());
    assert!(state.feedback().is_empty());
    assert!(state.is_loading());
}

#[test]
fn restart_is_only_valid_after_game_over() {
    let mut state = playing("bulbasaur");
    assert!(state.restart().is_empty());
    assert_eq!(*state.phase(), Phase::Playing);
}

#[test]
fn failed_load_can_be_retried() {
    let mut state = GameState::new(173, 173, Some(9));
    let cmds = state.start();
    let generation = fetch_generation(&cmds);
    apply_delta(
        &mut state,
        Delta::CreatureFailed {
            generation,
            error: "#12: http 503".to_string(),
        },
    );
    assert!(matches!(state.phase(), Phase::LoadFailed { error } if error.contains("503")));

    let retry = state.retry();
    assert!(state.is_loading());
    assert!(fetch_generation(&retry) > generation);
    deliver(&mut state, &retry, "butterfree");
    assert_eq!(*state.phase(), Phase::Playing);
}

#[test]
fn stale_responses_are_discarded() {
    let mut state = GameState::new(173, 173, Some(9));
    let first = state.start();
    apply_delta(
        &mut state,
        Delta::CreatureFailed {
            generation: fetch_generation(&first),
            error: "timeout".to_string(),
        },
    );
    let second = state.retry();

    // The first request resolves late; it must not replace the newer round.
    deliver(&mut state, &first, "stale");
    assert!(state.is_loading());
    assert!(state.current().is_none());

    deliver(&mut state, &second, "fresh");
    assert_eq!(state.current().map(|r| r.name.as_str()), Some("fresh"));

    // A late failure for an old generation does not knock the round over either.
    apply_delta(
        &mut state,
        Delta::CreatureFailed {
            generation: fetch_generation(&first),
            error: "late".to_string(),
        },
    );
    assert_eq!(*state.phase(), Phase::Playing);
}

#[test]
fn typing_filters_suggestions_from_catalog() {
    let mut state = playing("charizard");
    state.set_guess_text("char");
    assert!(state.suggestions().is_empty(), "no catalog yet");

    apply_delta(
        &mut state,
        Delta::NameCatalogLoaded(NameCatalog::new(["bulbasaur", "charmander", "charizard"])),
    );
    assert_eq!(state.suggestions(), ["charmander", "charizard"]);

    state.set_guess_text("");
    assert_eq!(state.suggestions().len(), 3);

    state.set_guess_text("CHARI");
    assert_eq!(state.suggestions(), ["charizard"]);
}

#[test]
fn suggestion_cursor_and_accept() {
    let mut state = playing("charizard");
    apply_delta(
        &mut state,
        Delta::NameCatalogLoaded(NameCatalog::new(["bulbasaur", "charmander", "charizard"])),
    );
    state.set_guess_text("ch");
    assert_eq!(state.suggestion_cursor(), None);

    state.select_next_suggestion();
    state.select_next_suggestion();
    state.select_next_suggestion();
    assert_eq!(state.suggestion_cursor(), Some(1));
    state.select_prev_suggestion();
    assert_eq!(state.suggestion_cursor(), Some(0));
    state.select_next_suggestion();

    assert!(state.accept_suggestion());
    assert_eq!(state.guess_text(), "charizard");
    assert_eq!(state.submit_guess(), Some(GuessOutcome::Correct));
}

#[test]
fn accept_without_cursor_takes_first_and_pick_checks_bounds() {
    let mut state = playing("bulbasaur");
    apply_delta(
        &mut state,
        Delta::NameCatalogLoaded(NameCatalog::new(["bulbasaur", "charmander"])),
    );
    state.set_guess_text("b");
    assert!(state.accept_suggestion());
    assert_eq!(state.guess_text(), "bulbasaur");
    assert!(!state.pick_suggestion(4));
    assert_eq!(state.guess_text(), "bulbasaur");
}

#[test]
fn catalog_failure_is_requested_again_on_next_round() {
    let mut state = GameState::new(173, 173, Some(2));
    let cmds = state.start();
    assert_eq!(cmds.len(), 2);
    apply_delta(&mut state, Delta::NameCatalogFailed("offline".to_string()));
    assert!(state.logs().iter().any(|l| l.contains("offline")));

    deliver(&mut state, &cmds, "weedle");
    state.set_guess_text("weedle");
    state.submit_guess();
    let next = state.advance_round();
    assert!(next.contains(&ProviderCommand::FetchNameCatalog { limit: 173 }));
}

#[test]
fn catalog_is_kept_across_restart() {
    let mut state = playing("weedle");
    apply_delta(&mut state, Delta::NameCatalogLoaded(NameCatalog::new(["weedle"])));
    state.set_guess_text("kakuna");
    state.submit_guess();
    let cmds = state.restart();
    assert_eq!(cmds.len(), 1);
    assert!(state.catalog().is_some());
}
