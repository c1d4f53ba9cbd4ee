use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::{PgPool, Row};
use tracing::{debug, instrument, warn};
use uuid::Uuid;

use super::{
    rows::{assemble_nights, AttendanceRow, GamePlayerRow, GameRow, NightRow, StatRow},
    StatStore, StoreError,
};
use crate::night::models::{Game, Night, Side, Teams};
use crate::roster::models::{Player, PlayerId};
use crate::stats::StatLine;

/// PostgreSQL implementation of the stat store.
/// Schema lives in `migrations/`; cascades are declared on the foreign keys.
pub struct PostgresStatStore {
    pool: PgPool,
}

impl PostgresStatStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn connect(database_url: &str) -> Result<Self, StoreError> {
        let pool = PgPool::connect(database_url).await?;
        Ok(Self::new(pool))
    }
}

fn logged(context: &'static str) -> impl Fn(sqlx::Error) -> StoreError {
    move |e| {
        warn!(error = %e, context, "Database call failed");
        StoreError::from(e)
    }
}

fn expect_one(rows_affected: u64, what: String) -> Result<(), StoreError> {
    if rows_affected == 0 {
        Err(StoreError::NotFound(what))
    } else {
        Ok(())
    }
}

#[async_trait]
impl StatStore for PostgresStatStore {
    #[instrument(skip(self))]
    async fn list_players(&self) -> Result<Vec<Player>, StoreError> {
        let rows = sqlx::query("SELECT id, name FROM players ORDER BY created_at, id")
            .fetch_all(&self.pool)
            .await
            .map_err(logged("list players"))?;

        let players: Vec<Player> = rows
            .into_iter()
            .map(|row| Player::new(row.get::<String, _>("id"), row.get::<String, _>("name")))
            .collect();
        debug!(count = players.len(), "Players fetched from database");
        Ok(players)
    }

    #[instrument(skip(self))]
    async fn create_player(&self, name: &str) -> Result<Player, StoreError> {
        let player = Player::new(Uuid::new_v4().to_string(), name);
        sqlx::query("INSERT INTO players (id, name) VALUES ($1, $2)")
            .bind(&player.id)
            .bind(&player.name)
            .execute(&self.pool)
            .await
            .map_err(logged("create player"))?;

        debug!(player_id = %player.id, "Player created in database");
        Ok(player)
    }

    #[instrument(skip(self))]
    async fn delete_player(&self, player_id: &str) -> Result<(), StoreError> {
        let result = sqlx::query("DELETE FROM players WHERE id = $1")
            .bind(player_id)
            .execute(&self.pool)
            .await
            .map_err(logged("delete player"))?;
        expect_one(result.rows_affected(), format!("player {}", player_id))
    }

    #[instrument(skip(self))]
    async fn list_nights(&self) -> Result<Vec<Night>, StoreError> {
        // One snapshot so concurrent writes can't leave rows pointing at missing parents
        let mut tx = self.pool.begin().await.map_err(logged("begin list nights"))?;
        sqlx::query("SET TRANSACTION ISOLATION LEVEL REPEATABLE READ READ ONLY")
            .execute(&mut *tx)
            .await
            .map_err(logged("set snapshot"))?;

        let nights: Vec<NightRow> =
            sqlx::query_as("SELECT id, date, youtube_url FROM nights ORDER BY date DESC")
                .fetch_all(&mut *tx)
                .await
                .map_err(logged("list nights"))?;
        let attendance: Vec<AttendanceRow> =
            sqlx::query_as("SELECT night_id, player_id FROM night_players")
                .fetch_all(&mut *tx)
                .await
                .map_err(logged("list attendance"))?;
        let games: Vec<GameRow> =
            sqlx::query_as("SELECT id, night_id, number, winner FROM games ORDER BY number")
                .fetch_all(&mut *tx)
                .await
                .map_err(logged("list games"))?;
        let game_players: Vec<GamePlayerRow> =
            sqlx::query_as("SELECT game_id, player_id, team FROM game_players")
                .fetch_all(&mut *tx)
                .await
                .map_err(logged("list game players"))?;
        let stats: Vec<StatRow> = sqlx::query_as(
            "SELECT game_id, player_id, pts2, pts3, fgm, fga, reb, ast, stl, to_ FROM player_stats",
        )
        .fetch_all(&mut *tx)
        .await
        .map_err(logged("list player stats"))?;

        tx.commit().await.map_err(logged("commit list nights"))?;

        debug!(
            nights = nights.len(),
            games = games.len(),
            "Night rows fetched from database"
        );
        Ok(assemble_nights(
            nights,
            &attendance,
            &games,
            &game_players,
            &stats,
        ))
    }

    #[instrument(skip(self, players))]
    async fn create_night(
        &self,
        date: NaiveDate,
        youtube_url: Option<&str>,
        players: &[PlayerId],
    ) -> Result<Night, StoreError> {
        let id = Uuid::new_v4().to_string();
        let mut tx = self.pool.begin().await.map_err(logged("begin night"))?;

        sqlx::query("INSERT INTO nights (id, date, youtube_url) VALUES ($1, $2, $3)")
            .bind(&id)
            .bind(date)
            .bind(youtube_url)
            .execute(&mut *tx)
            .await
            .map_err(logged("create night"))?;
        for player_id in players {
            sqlx::query("INSERT INTO night_players (night_id, player_id) VALUES ($1, $2)")
                .bind(&id)
                .bind(player_id)
                .execute(&mut *tx)
                .await
                .map_err(logged("add night player"))?;
        }
        tx.commit().await.map_err(logged("commit night"))?;

        debug!(night_id = %id, attendees = players.len(), "Night created in database");
        Ok(Night::new(
            id,
            date,
            youtube_url.map(str::to_string),
            players.to_vec(),
        ))
    }

    #[instrument(skip(self))]
    async fn delete_night(&self, night_id: &str) -> Result<(), StoreError> {
        let result = sqlx::query("DELETE FROM nights WHERE id = $1")
            .bind(night_id)
            .execute(&self.pool)
            .await
            .map_err(logged("delete night"))?;
        expect_one(result.rows_affected(), format!("night {}", night_id))
    }

    #[instrument(skip(self, teams, players))]
    async fn create_game(
        &self,
        night_id: &str,
        number: u32,
        teams: &Teams,
        players: &[PlayerId],
    ) -> Result<Game, StoreError> {
        let id = Uuid::new_v4().to_string();
        let mut tx = self.pool.begin().await.map_err(logged("begin game"))?;

        sqlx::query("INSERT INTO games (id, night_id, number, winner) VALUES ($1, $2, $3, NULL)")
            .bind(&id)
            .bind(night_id)
            .bind(number as i32)
            .execute(&mut *tx)
            .await
            .map_err(logged("create game"))?;
        for player_id in players {
            let team = teams.side_of(player_id).map(|side| side.to_string());
            sqlx::query("INSERT INTO game_players (game_id, player_id, team) VALUES ($1, $2, $3)")
                .bind(&id)
                .bind(player_id)
                .bind(team)
                .execute(&mut *tx)
                .await
                .map_err(logged("add game player"))?;
            sqlx::query("INSERT INTO player_stats (game_id, player_id) VALUES ($1, $2)")
                .bind(&id)
                .bind(player_id)
                .execute(&mut *tx)
                .await
                .map_err(logged("init player stats"))?;
        }
        tx.commit().await.map_err(logged("commit game"))?;

        debug!(game_id = %id, night_id = %night_id, number, "Game created in database");
        Ok(Game::new(id, number, teams.clone(), players))
    }

    #[instrument(skip(self))]
    async fn delete_game(&self, game_id: &str) -> Result<(), StoreError> {
        let result = sqlx::query("DELETE FROM games WHERE id = $1")
            .bind(game_id)
            .execute(&self.pool)
            .await
            .map_err(logged("delete game"))?;
        expect_one(result.rows_affected(), format!("game {}", game_id))
    }

    #[instrument(skip(self))]
    async fn update_game_number(&self, game_id: &str, number: u32) -> Result<(), StoreError> {
        let result = sqlx::query("UPDATE games SET number = $2 WHERE id = $1")
            .bind(game_id)
            .bind(number as i32)
            .execute(&self.pool)
            .await
            .map_err(logged("renumber game"))?;
        expect_one(result.rows_affected(), format!("game {}", game_id))
    }

    #[instrument(skip(self))]
    async fn set_winner(&self, game_id: &str, winner: Option<Side>) -> Result<(), StoreError> {
        let result = sqlx::query("UPDATE games SET winner = $2 WHERE id = $1")
            .bind(game_id)
            .bind(winner.map(|side| side.to_string()))
            .execute(&self.pool)
            .await
            .map_err(logged("set winner"))?;
        expect_one(result.rows_affected(), format!("game {}", game_id))
    }

    #[instrument(skip(self, line))]
    async fn upsert_stat_line(
        &self,
        game_id: &str,
        player_id: &str,
        line: &StatLine,
    ) -> Result<(), StoreError> {
        let row = StatRow::new(game_id, player_id, line);
        sqlx::query(
            "INSERT INTO player_stats (game_id, player_id, pts2, pts3, fgm, fga, reb, ast, stl, to_) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10) \
             ON CONFLICT (game_id, player_id) DO UPDATE SET \
             pts2 = EXCLUDED.pts2, pts3 = EXCLUDED.pts3, fgm = EXCLUDED.fgm, fga = EXCLUDED.fga, \
             reb = EXCLUDED.reb, ast = EXCLUDED.ast, stl = EXCLUDED.stl, to_ = EXCLUDED.to_",
        )
        .bind(&row.game_id)
        .bind(&row.player_id)
        .bind(row.pts2)
        .bind(row.pts3)
        .bind(row.fgm)
        .bind(row.fga)
        .bind(row.reb)
        .bind(row.ast)
        .bind(row.stl)
        .bind(row.to_)
        .execute(&self.pool)
        .await
        .map_err(logged("upsert player stats"))?;
        Ok(())
    }
}
