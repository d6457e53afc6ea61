use std::collections::HashSet;

use radio_bot::radio::playlist::{Pick, PlaylistStore};
use radio_bot::radio::vote::VoteFlag;
use radio_bot::radio::{RadioState, Step};
use rand::rngs::StdRng;
use rand::SeedableRng;

fn store_with(content: &str) -> (PlaylistStore, tempfile::TempDir) {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("lista_canciones.txt");
    std::fs::write(&path, content).unwrap();
    (PlaylistStore::load(path), dir)
}

fn file_lines(store: &PlaylistStore) -> Vec<String> {
    std::fs::read_to_string(store.path())
        .unwrap()
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(String::from)
        .collect()
}

#[test]
fn test_admin_edits_survive_restart() {
    // :addsong, :delete, then the bot restarts and reloads the file
    let (mut store, dir) = store_with("Artist A - Song 1\nArtist B - Song 2\n");

    store.add("Artist C - Song 3").unwrap();
    assert_eq!(store.remove("artist b").unwrap(), 1);
    assert_eq!(file_lines(&store), store.entries());

    let reloaded = PlaylistStore::load(dir.path().join("lista_canciones.txt"));
    assert_eq!(
        reloaded.entries(),
        ["Artist A - Song 1", "Artist C - Song 3"]
    );
}

#[test]
fn test_delete_by_substring_scenario() {
    let (mut store, _dir) = store_with("Queen - Bohemian Rhapsody\nqueen - Somebody\nABBA - SOS\n");

    assert_eq!(store.remove("QUEEN").unwrap(), 2);
    assert_eq!(store.entries(), ["ABBA - SOS"]);
    assert_eq!(store.remove("Beatles").unwrap(), 0);
    assert_eq!(file_lines(&store), ["ABBA - SOS"]);
}

#[test]
fn test_accepted_play_jumps_the_rotation() {
    // two accepted :play requests play in front of random picks, newest first
    let (mut store, _dir) = store_with("Song A\nSong B\n");
    let mut rng = StdRng::seed_from_u64(3);

    store.push_front("request 1".into());
    store.push_front("request 2".into());
    assert_eq!(
        store.pending().collect::<Vec<_>>(),
        ["request 2", "request 1"]
    );

    assert_eq!(
        store.next_for_playback(&mut rng),
        Some(Pick::Pending("request 2".into()))
    );
    assert_eq!(
        store.next_for_playback(&mut rng),
        Some(Pick::Pending("request 1".into()))
    );
    assert!(matches!(
        store.next_for_playback(&mut rng),
        Some(Pick::Random(_))
    ));
    assert_eq!(store.pending().count(), 0);
    // requests never land in the permanent list
    assert_eq!(store.entries(), ["Song A", "Song B"]);
}

#[test]
fn test_random_rotation_never_repeats_back_to_back() {
    let (mut store, _dir) = store_with("Song A\nSong B\nSong C\n");
    let mut rng = StdRng::seed_from_u64(42);
    let mut seen = HashSet::new();

    let mut previous = String::new();
    for _ in 0..200 {
        let pick = store.next_for_playback(&mut rng).unwrap().into_reference();
        assert_ne!(pick, previous);
        assert_eq!(store.last_played(), Some(pick.as_str()));
        seen.insert(pick.clone());
        previous = pick;
    }
    assert_eq!(seen.len(), 3);
}

#[test]
fn test_radio_state_interleaves_bulletins() {
    let (store, _dir) = store_with("Song A\nSong B\n");
    let mut state = RadioState::new(store, VoteFlag::default());
    let mut rng = StdRng::seed_from_u64(5);

    for _ in 0..7 {
        assert!(matches!(state.next_step(&mut rng), Step::Resolve(_)));
        state.record_resolution();
    }
    assert_eq!(state.next_step(&mut rng), Step::StageBulletin);
    state.stage_announcement("Das Wetter.".into());
    assert_eq!(
        state.next_step(&mut rng),
        Step::Announce("Das Wetter.".into())
    );
    assert!(matches!(state.next_step(&mut rng), Step::Resolve(_)));
}
