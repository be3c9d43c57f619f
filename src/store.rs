//! State store: typed mutation actions over [`TournamentState`] and selective
//! persistence of the sub-trees each action touches.

use crate::logic::{self, ImportReport, NewPlayer, PlayerUpdate, RoundDigest};
use crate::models::{
    FixturePairing, MatchId, Player, PlayerId, GameMatch, RoundSummary, TournamentError,
    TournamentSettings, TournamentState, TournamentStatus,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::{Path, PathBuf};

/// Independently persisted part of the state.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Section {
    Players,
    Matches,
    /// Round counter, status, settings, byes, champion.
    Progress,
    Summaries,
    Fixtures,
}

impl Section {
    pub const ALL: [Section; 5] = [
        Section::Players,
        Section::Matches,
        Section::Progress,
        Section::Summaries,
        Section::Fixtures,
    ];

    pub fn file_name(self) -> &'static str {
        match self {
            Section::Players => "players.json",
            Section::Matches => "matches.json",
            Section::Progress => "progress.json",
            Section::Summaries => "summaries.json",
            Section::Fixtures => "fixtures.json",
        }
    }
}

#[derive(Debug)]
pub enum StoreError {
    /// The action was rejected; nothing changed.
    Tournament(TournamentError),
    Io(std::io::Error),
    Json(serde_json::Error),
}

impl std::fmt::Display for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreError::Tournament(e) => write!(f, "{}", e),
            StoreError::Io(e) => write!(f, "Storage I/O error: {}", e),
            StoreError::Json(e) => write!(f, "Storage format error: {}", e),
        }
    }
}

impl std::error::Error for StoreError {}

impl From<TournamentError> for StoreError {
    fn from(e: TournamentError) -> Self {
        StoreError::Tournament(e)
    }
}

impl From<std::io::Error> for StoreError {
    fn from(e: std::io::Error) -> Self {
        StoreError::Io(e)
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(e: serde_json::Error) -> Self {
        StoreError::Json(e)
    }
}

#[derive(Serialize, Deserialize)]
struct ProgressSnapshot {
    #[serde(default)]
    current_round: u32,
    #[serde(default)]
    status: TournamentStatus,
    #[serde(default)]
    settings: TournamentSettings,
    #[serde(default)]
    byes: BTreeMap<u32, Vec<PlayerId>>,
    #[serde(default)]
    champion: Option<PlayerId>,
    #[serde(default)]
    saved_at: Option<DateTime<Utc>>,
}

#[derive(Default, Serialize, Deserialize)]
struct FixtureCaches {
    #[serde(default)]
    generated: BTreeMap<String, Vec<FixturePairing>>,
    #[serde(default)]
    published: BTreeMap<String, Vec<FixturePairing>>,
}

/// JSON text of one section of the state.
pub fn section_to_json(state: &TournamentState, section: Section) -> Result<String, serde_json::Error> {
    match section {
        Section::Players => serde_json::to_string_pretty(&state.players),
        Section::Matches => serde_json::to_string_pretty(&state.matches),
        Section::Progress => serde_json::to_string_pretty(&ProgressSnapshot {
            current_round: state.current_round,
            status: state.status,
            settings: state.settings.clone(),
            byes: state.byes.clone(),
            champion: state.champion,
            saved_at: Some(Utc::now()),
        }),
        Section::Summaries => serde_json::to_string_pretty(&state.round_summaries),
        Section::Fixtures => serde_json::to_string_pretty(&FixtureCaches {
            generated: state.generated_fixtures.clone(),
            published: state.published_fixtures.clone(),
        }),
    }
}

/// Load one section from JSON into `state`. Missing fields take their defaults.
pub fn section_from_json(
    state: &mut TournamentState,
    section: Section,
    json: &str,
) -> Result<(), serde_json::Error> {
    match section {
        Section::Players => state.players = serde_json::from_str::<Vec<Player>>(json)?,
        Section::Matches => state.matches = serde_json::from_str::<Vec<GameMatch>>(json)?,
        Section::Progress => {
            let p: ProgressSnapshot = serde_json::from_str(json)?;
            state.current_round = p.current_round;
            state.status = p.status;
            state.settings = p.settings;
            state.byes = p.byes;
            state.champion = p.champion;
        }
        Section::Summaries => {
            state.round_summaries = serde_json::from_str::<BTreeMap<u32, RoundSummary>>(json)?
        }
        Section::Fixtures => {
            let f: FixtureCaches = serde_json::from_str(json)?;
            state.generated_fixtures = f.generated;
            state.published_fixtures = f.published;
        }
    }
    Ok(())
}

/// Where the state lives between runs.
pub trait StateStorage {
    /// Rehydrate the full state; absent sections are left at their defaults.
    fn load(&self) -> Result<TournamentState, StoreError>;

    /// Persist only the listed sections.
    fn save(&mut self, state: &TournamentState, sections: &[Section]) -> Result<(), StoreError>;
}

/// One JSON file per section inside a directory.
#[derive(Clone, Debug)]
pub struct JsonDirStorage {
    dir: PathBuf,
}

impl JsonDirStorage {
    /// Use `dir`, creating it if needed.
    pub fn open(dir: impl AsRef<Path>) -> Result<Self, StoreError> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }
}

impl StateStorage for JsonDirStorage {
    fn load(&self) -> Result<TournamentState, StoreError> {
        let mut state = TournamentState::default();
        for section in Section::ALL {
            let path = self.dir.join(section.file_name());
            if !path.is_file() {
                continue;
            }
            let json = fs::read_to_string(&path)?;
            section_from_json(&mut state, section, &json)?;
        }
        Ok(state)
    }

    /// Every section goes to a temp file first; the real files are only replaced
    /// once all of them were written, so a failed save leaves the old set intact.
    fn save(&mut self, state: &TournamentState, sections: &[Section]) -> Result<(), StoreError> {
        let mut staged: Vec<(PathBuf, PathBuf)> = Vec::with_capacity(sections.len());
        for &section in sections {
            let path = self.dir.join(section.file_name());
            let tmp = path.with_extension("json.tmp");
            let written = section_to_json(state, section)
                .map_err(StoreError::from)
                .and_then(|json| fs::write(&tmp, json).map_err(StoreError::from));
            if let Err(e) = written {
                for (tmp, _) in &staged {
                    let _ = fs::remove_file(tmp);
                }
                return Err(e);
            }
            staged.push((tmp, path));
        }
        for (tmp, path) in &staged {
            fs::rename(tmp, path)?;
        }
        Ok(())
    }
}

/// Keeps section JSON in memory; counts writes per section.
#[derive(Clone, Debug, Default)]
pub struct MemoryStorage {
    sections: HashMap<Section, String>,
    writes: HashMap<Section, usize>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// How many times `section` has been written.
    pub fn writes(&self, section: Section) -> usize {
        self.writes.get(&section).copied().unwrap_or(0)
    }
}

impl StateStorage for MemoryStorage {
    fn load(&self) -> Result<TournamentState, StoreError> {
        let mut state = TournamentState::default();
        for (section, json) in &self.sections {
            section_from_json(&mut state, *section, json)?;
        }
        Ok(state)
    }

    fn save(&mut self, state: &TournamentState, sections: &[Section]) -> Result<(), StoreError> {
        for &section in sections {
            self.sections.insert(section, section_to_json(state, section)?);
            *self.writes.entry(section).or_insert(0) += 1;
        }
        Ok(())
    }
}

/// Typed mutations of the state.
#[derive(Clone, Debug, PartialEq)]
pub enum Action {
    AddPlayer(NewPlayer),
    UpdatePlayer { id: PlayerId, update: PlayerUpdate },
    DeletePlayer(PlayerId),
    ImportPlayers(Vec<NewPlayer>),
    UpdateSettings(TournamentSettings),
    StartTournament,
    ResetTournament { revert_results: bool },
    RecordScore { match_id: MatchId, score_1: u32, score_2: u32 },
    ClearScore(MatchId),
    AddMatch { player_1: PlayerId, player_2: PlayerId },
    CompleteRound,
    RecordSummary { round: u32, text: String },
    GenerateFixtures(String),
    GenerateAllFixtures,
    PublishFixtures(String),
    PublishCustomFixtures(Vec<FixturePairing>),
    ClearFixtures(String),
}

impl Action {
    /// Sections this action may change.
    pub fn sections(&self) -> &'static [Section] {
        use Section::*;
        match self {
            Action::AddPlayer(_) | Action::UpdatePlayer { .. } | Action::ImportPlayers(_) => &[Players],
            Action::DeletePlayer(_) => &[Players, Matches, Progress, Fixtures],
            Action::UpdateSettings(_) => &[Progress],
            Action::StartTournament => &[Matches, Progress, Summaries, Fixtures],
            Action::ResetTournament { .. } => &[Players, Matches, Progress, Summaries],
            Action::RecordScore { .. } | Action::ClearScore(_) => &[Players, Matches],
            Action::AddMatch { .. } => &[Matches],
            Action::CompleteRound => &[Matches, Progress],
            Action::RecordSummary { .. } => &[Summaries],
            Action::GenerateFixtures(_)
            | Action::GenerateAllFixtures
            | Action::PublishFixtures(_)
            | Action::PublishCustomFixtures(_)
            | Action::ClearFixtures(_) => &[Fixtures],
        }
    }
}

/// What an action produced.
#[derive(Clone, Debug, PartialEq)]
pub enum ActionOutcome {
    Done,
    PlayerAdded(PlayerId),
    MatchAdded(MatchId),
    /// Number of matches removed along with a player.
    PlayerDeleted(usize),
    Imported(ImportReport),
    /// Number of pairings generated or published.
    Fixtures(usize),
    RoundCompleted(RoundDigest),
}

fn apply(state: &mut TournamentState, action: Action) -> Result<ActionOutcome, TournamentError> {
    Ok(match action {
        Action::AddPlayer(new) => ActionOutcome::PlayerAdded(logic::add_player(state, new)?),
        Action::UpdatePlayer { id, update } => {
            logic::update_player(state, id, update)?;
            ActionOutcome::Done
        }
        Action::DeletePlayer(id) => ActionOutcome::PlayerDeleted(logic::delete_player(state, id)?),
        Action::ImportPlayers(players) => ActionOutcome::Imported(logic::add_players_bulk(state, players)),
        Action::UpdateSettings(settings) => {
            logic::update_settings(state, settings)?;
            ActionOutcome::Done
        }
        Action::StartTournament => {
            logic::start_tournament(state)?;
            ActionOutcome::Done
        }
        Action::ResetTournament { revert_results } => {
            logic::reset_tournament(state, revert_results);
            ActionOutcome::Done
        }
        Action::RecordScore {
            match_id,
            score_1,
            score_2,
        } => {
            logic::record_score(state, match_id, score_1, score_2)?;
            ActionOutcome::Done
        }
        Action::ClearScore(match_id) => {
            logic::clear_score(state, match_id)?;
            ActionOutcome::Done
        }
        Action::AddMatch { player_1, player_2 } => {
            ActionOutcome::MatchAdded(logic::add_match(state, player_1, player_2)?)
        }
        Action::CompleteRound => ActionOutcome::RoundCompleted(logic::complete_round(state)?),
        Action::RecordSummary { round, text } => {
            logic::record_round_summary(state, round, text);
            ActionOutcome::Done
        }
        Action::GenerateFixtures(category) => {
            ActionOutcome::Fixtures(logic::generate_category_fixtures(state, &category)?)
        }
        Action::GenerateAllFixtures => ActionOutcome::Fixtures(
            logic::generate_all_category_fixtures(state)
                .iter()
                .map(|(_, count)| count)
                .sum(),
        ),
        Action::PublishFixtures(category) => {
            ActionOutcome::Fixtures(logic::publish_fixtures(state, &category)?)
        }
        Action::PublishCustomFixtures(pairings) => {
            ActionOutcome::Fixtures(logic::publish_custom_fixtures(state, pairings)?)
        }
        Action::ClearFixtures(category) => {
            logic::clear_fixtures(state, &category)?;
            ActionOutcome::Done
        }
    })
}

/// The aggregate plus its storage.
pub struct Store<S: StateStorage> {
    state: TournamentState,
    storage: S,
}

impl<S: StateStorage> Store<S> {
    /// Rehydrate from `storage`.
    pub fn open(storage: S) -> Result<Self, StoreError> {
        let state = storage.load()?;
        log::info!(
            "Loaded {} player(s), {} match(es), round {}",
            state.players.len(),
            state.matches.len(),
            state.current_round
        );
        Ok(Self { state, storage })
    }

    pub fn state(&self) -> &TournamentState {
        &self.state
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// Apply an action. On error the state is unchanged; on success the touched
    /// sections are persisted before the new state is kept.
    pub fn dispatch(&mut self, action: Action) -> Result<ActionOutcome, StoreError> {
        let sections = action.sections();
        let mut next = self.state.clone();
        let outcome = apply(&mut next, action)?;
        self.storage.save(&next, sections)?;
        self.state = next;
        Ok(outcome)
    }
}
