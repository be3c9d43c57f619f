//! Single binary web server: league state via REST, optional front-end from /static.
//! Run with: cargo run --bin web
//! Listens on 0.0.0.0:8080 by default. Override with env: HOST, PORT, DATA_DIR.
//! Round summaries need SUMMARY_API_KEY (see `config`).

use actix_files::Files;
use actix_web::{
    delete, get, post, put,
    web::{Data, Json, Path},
    App, HttpResponse, HttpServer, Responder,
};
use racquet_league_web::{
    csv_io,
    logic::{self, group_standings, points_table, rating_leaderboard},
    summary::summarize_or_placeholder,
    Action, ActionOutcome, AppConfig, FixturePairing, HttpSummarizer, JsonDirStorage, MatchId,
    NewPlayer, PlayerId, PlayerUpdate, Store, StoreError, SummaryError, TournamentError,
    TournamentSettings,
};
use serde::{Deserialize, Serialize};
use std::sync::RwLock;

/// Shared league store, persisted under DATA_DIR.
type AppState = Data<RwLock<Store<JsonDirStorage>>>;
type Summarizer = Data<HttpSummarizer>;

#[derive(Serialize)]
struct HealthResponse {
    ok: bool,
    service: &'static str,
    summaries_configured: bool,
}

#[derive(Deserialize)]
struct ScoreBody {
    score_1: u32,
    score_2: u32,
}

#[derive(Deserialize)]
struct AddMatchBody {
    player_1: PlayerId,
    player_2: PlayerId,
}

#[derive(Deserialize)]
struct ResetBody {
    #[serde(default)]
    revert_results: bool,
}

#[derive(Deserialize)]
struct CategoryBody {
    #[serde(default)]
    category: Option<String>,
}

/// Path segment: player id (e.g. /api/players/{player_id})
#[derive(Deserialize)]
struct PlayerPath {
    player_id: PlayerId,
}

/// Path segment: match id (e.g. /api/matches/{match_id}/score)
#[derive(Deserialize)]
struct MatchPath {
    match_id: MatchId,
}

#[derive(Deserialize)]
struct RoundPath {
    round: u32,
}

#[derive(Serialize)]
struct RoundCompletedResponse {
    digest: logic::RoundDigest,
    summary: String,
}

fn error_json(message: impl std::fmt::Display) -> serde_json::Value {
    serde_json::json!({ "error": message.to_string() })
}

fn store_error_response(e: &StoreError) -> HttpResponse {
    match e {
        StoreError::Tournament(TournamentError::PlayerNotFound(_))
        | StoreError::Tournament(TournamentError::MatchNotFound(_)) => {
            HttpResponse::NotFound().json(error_json(e))
        }
        StoreError::Tournament(_) => HttpResponse::BadRequest().json(error_json(e)),
        StoreError::Io(_) | StoreError::Json(_) => {
            log::error!("{}", e);
            HttpResponse::InternalServerError().json(error_json(e))
        }
    }
}

/// Run one action under the write lock; answer with the resulting state.
fn dispatch(state: &AppState, action: Action) -> HttpResponse {
    let mut g = match state.write() {
        Ok(guard) => guard,
        Err(_) => return HttpResponse::InternalServerError().body("lock error"),
    };
    match g.dispatch(action) {
        Ok(ActionOutcome::Imported(report)) => HttpResponse::Ok().json(report),
        Ok(_) => HttpResponse::Ok().json(g.state()),
        Err(e) => store_error_response(&e),
    }
}

#[get("/api/health")]
async fn api_health(summarizer: Summarizer) -> impl Responder {
    HttpResponse::Ok().json(HealthResponse {
        ok: true,
        service: "racquet-league-web",
        summaries_configured: summarizer.is_configured(),
    })
}

/// Avoid 404 in browser tab: favicon not required for app logic.
#[get("/favicon.ico")]
async fn favicon() -> HttpResponse {
    HttpResponse::NoContent().finish()
}

/// Whole league state.
#[get("/api/state")]
async fn api_get_state(state: AppState) -> HttpResponse {
    match state.read() {
        Ok(g) => HttpResponse::Ok().json(g.state()),
        Err(_) => HttpResponse::InternalServerError().body("lock error"),
    }
}

#[post("/api/players")]
async fn api_add_player(state: AppState, body: Json<NewPlayer>) -> HttpResponse {
    dispatch(&state, Action::AddPlayer(body.into_inner()))
}

#[put("/api/players/{player_id}")]
async fn api_update_player(state: AppState, path: Path<PlayerPath>, body: Json<PlayerUpdate>) -> HttpResponse {
    dispatch(
        &state,
        Action::UpdatePlayer {
            id: path.player_id,
            update: body.into_inner(),
        },
    )
}

/// Delete a player together with their matches and cached fixtures.
#[delete("/api/players/{player_id}")]
async fn api_delete_player(state: AppState, path: Path<PlayerPath>) -> HttpResponse {
    dispatch(&state, Action::DeletePlayer(path.player_id))
}

/// Bulk import from a roster CSV (request body). Bad rows are reported, not fatal.
#[post("/api/players/import")]
async fn api_import_players(state: AppState, body: String) -> HttpResponse {
    let (players, mut report) = match csv_io::parse_roster(body.as_bytes()) {
        Ok(parsed) => parsed,
        Err(e) => return HttpResponse::BadRequest().json(error_json(e)),
    };
    let mut g = match state.write() {
        Ok(guard) => guard,
        Err(_) => return HttpResponse::InternalServerError().body("lock error"),
    };
    match g.dispatch(Action::ImportPlayers(players)) {
        Ok(ActionOutcome::Imported(added)) => {
            report.added = added.added;
            report.warnings.extend(added.warnings);
            HttpResponse::Ok().json(report)
        }
        Ok(_) => HttpResponse::Ok().json(report),
        Err(e) => store_error_response(&e),
    }
}

#[get("/api/players/leaderboard")]
async fn api_leaderboard(state: AppState) -> HttpResponse {
    let g = match state.read() {
        Ok(guard) => guard,
        Err(_) => return HttpResponse::InternalServerError().body("lock error"),
    };
    HttpResponse::Ok().json(rating_leaderboard(g.state()))
}

/// Replace settings (before start only).
#[put("/api/settings")]
async fn api_update_settings(state: AppState, body: Json<TournamentSettings>) -> HttpResponse {
    dispatch(&state, Action::UpdateSettings(body.into_inner()))
}

/// Start the tournament (round 0 -> round 1).
#[post("/api/tournament/start")]
async fn api_start_tournament(state: AppState) -> HttpResponse {
    dispatch(&state, Action::StartTournament)
}

/// Back to "not started", optionally undoing rating changes.
#[post("/api/tournament/reset")]
async fn api_reset_tournament(state: AppState, body: Option<Json<ResetBody>>) -> HttpResponse {
    let revert_results = body.map(|b| b.revert_results).unwrap_or(false);
    dispatch(&state, Action::ResetTournament { revert_results })
}

#[post("/api/matches")]
async fn api_add_match(state: AppState, body: Json<AddMatchBody>) -> HttpResponse {
    dispatch(
        &state,
        Action::AddMatch {
            player_1: body.player_1,
            player_2: body.player_2,
        },
    )
}

/// Enter or correct a score (current round only).
#[put("/api/matches/{match_id}/score")]
async fn api_record_score(state: AppState, path: Path<MatchPath>, body: Json<ScoreBody>) -> HttpResponse {
    dispatch(
        &state,
        Action::RecordScore {
            match_id: path.match_id,
            score_1: body.score_1,
            score_2: body.score_2,
        },
    )
}

#[delete("/api/matches/{match_id}/score")]
async fn api_clear_score(state: AppState, path: Path<MatchPath>) -> HttpResponse {
    dispatch(&state, Action::ClearScore(path.match_id))
}

/// Complete the current round, then fetch and store its summary.
/// The lock is not held while the summary service is called.
#[post("/api/rounds/complete")]
async fn api_complete_round(state: AppState, summarizer: Summarizer) -> HttpResponse {
    let digest = {
        let mut g = match state.write() {
            Ok(guard) => guard,
            Err(_) => return HttpResponse::InternalServerError().body("lock error"),
        };
        match g.dispatch(Action::CompleteRound) {
            Ok(ActionOutcome::RoundCompleted(digest)) => digest,
            Ok(_) => return HttpResponse::InternalServerError().body("unexpected outcome"),
            Err(e) => return store_error_response(&e),
        }
    };

    let summary = summarize_or_placeholder(summarizer.get_ref(), &digest).await;

    let mut g = match state.write() {
        Ok(guard) => guard,
        Err(_) => return HttpResponse::InternalServerError().body("lock error"),
    };
    if let Err(e) = g.dispatch(Action::RecordSummary {
        round: digest.round,
        text: summary.clone(),
    }) {
        log::error!("Could not store summary for round {}: {}", digest.round, e);
    }
    HttpResponse::Ok().json(RoundCompletedResponse { digest, summary })
}

/// Regenerate the summary of a finished round. Refused up front without a credential.
#[post("/api/rounds/{round}/summary")]
async fn api_regenerate_summary(
    state: AppState,
    summarizer: Summarizer,
    path: Path<RoundPath>,
) -> HttpResponse {
    if !summarizer.is_configured() {
        return HttpResponse::BadRequest().json(error_json(SummaryError::MissingCredential));
    }
    let digest = {
        let g = match state.read() {
            Ok(guard) => guard,
            Err(_) => return HttpResponse::InternalServerError().body("lock error"),
        };
        match logic::round_digest(g.state(), path.round) {
            Some(d) => d,
            None => {
                return HttpResponse::BadRequest()
                    .json(error_json(format!("Round {} is not finished", path.round)))
            }
        }
    };
    let summary = summarize_or_placeholder(summarizer.get_ref(), &digest).await;
    dispatch(
        &state,
        Action::RecordSummary {
            round: digest.round,
            text: summary,
        },
    )
}

/// Points table of round 1 overall and per group.
#[get("/api/standings")]
async fn api_standings(state: AppState) -> HttpResponse {
    let g = match state.read() {
        Ok(guard) => guard,
        Err(_) => return HttpResponse::InternalServerError().body("lock error"),
    };
    let s = g.state();
    HttpResponse::Ok().json(serde_json::json!({
        "overall": points_table(s, s.matches_in_round(1)),
        "groups": group_standings(s, 1),
    }))
}

/// Generate round-robin fixtures for one category, or all when none is given.
#[post("/api/fixtures/generate")]
async fn api_generate_fixtures(state: AppState, body: Json<CategoryBody>) -> HttpResponse {
    let action = match body.into_inner().category {
        Some(category) => Action::GenerateFixtures(category),
        None => Action::GenerateAllFixtures,
    };
    dispatch(&state, action)
}

#[post("/api/fixtures/publish")]
async fn api_publish_fixtures(state: AppState, body: Json<CategoryBody>) -> HttpResponse {
    dispatch(
        &state,
        Action::PublishFixtures(body.into_inner().category.unwrap_or_default()),
    )
}

#[post("/api/fixtures/clear")]
async fn api_clear_fixtures(state: AppState, body: Json<CategoryBody>) -> HttpResponse {
    dispatch(
        &state,
        Action::ClearFixtures(body.into_inner().category.unwrap_or_default()),
    )
}

/// Import a custom fixture CSV as the published schedule. Unknown players are skipped.
#[post("/api/fixtures/import")]
async fn api_import_fixtures(state: AppState, body: String) -> HttpResponse {
    let mut g = match state.write() {
        Ok(guard) => guard,
        Err(_) => return HttpResponse::InternalServerError().body("lock error"),
    };
    let (pairings, report): (Vec<FixturePairing>, _) =
        match csv_io::parse_fixtures(g.state(), body.as_bytes()) {
            Ok(parsed) => parsed,
            Err(e) => return HttpResponse::BadRequest().json(error_json(e)),
        };
    match g.dispatch(Action::PublishCustomFixtures(pairings)) {
        Ok(_) => HttpResponse::Ok().json(report),
        Err(e) => store_error_response(&e),
    }
}

/// Current matches as CSV in the import shape.
#[get("/api/fixtures/export")]
async fn api_export_fixtures(state: AppState) -> HttpResponse {
    let g = match state.read() {
        Ok(guard) => guard,
        Err(_) => return HttpResponse::InternalServerError().body("lock error"),
    };
    let mut out = Vec::new();
    if let Err(e) = csv_io::export_matches(g.state(), &g.state().matches, &mut out) {
        return HttpResponse::InternalServerError().json(error_json(e));
    }
    HttpResponse::Ok()
        .content_type("text/csv; charset=utf-8")
        .insert_header(("Content-Disposition", "attachment; filename=\"fixtures.csv\""))
        .body(out)
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let config = AppConfig::from_env();
    let storage = JsonDirStorage::open(&config.data_dir).map_err(std::io::Error::other)?;
    let store = Store::open(storage).map_err(std::io::Error::other)?;
    let summarizer = HttpSummarizer::new(config.summary.clone()).map_err(std::io::Error::other)?;
    if !summarizer.is_configured() {
        log::warn!("SUMMARY_API_KEY not set; round summaries will use the placeholder text");
    }

    let bind = (config.host.clone(), config.port);
    log::info!(
        "Starting server at http://{}:{} (data in {})",
        bind.0,
        bind.1,
        config.data_dir.display()
    );

    let state = Data::new(RwLock::new(store));
    let summarizer = Data::new(summarizer);

    HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .app_data(summarizer.clone())
            .service(api_health)
            .service(favicon)
            .service(api_get_state)
            .service(api_leaderboard)
            .service(api_import_players)
            .service(api_add_player)
            .service(api_update_player)
            .service(api_delete_player)
            .service(api_update_settings)
            .service(api_start_tournament)
            .service(api_reset_tournament)
            .service(api_add_match)
            .service(api_record_score)
            .service(api_clear_score)
            .service(api_complete_round)
            .service(api_regenerate_summary)
            .service(api_standings)
            .service(api_generate_fixtures)
            .service(api_publish_fixtures)
            .service(api_clear_fixtures)
            .service(api_import_fixtures)
            .service(api_export_fixtures)
            .service(Files::new("/", "static").index_file("index.html"))
    })
    .bind(bind)?
    .run()
    .await
}
