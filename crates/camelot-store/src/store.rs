//! The transactional repository (§4.2). One method per use case; each
//! either commits everything it touches or leaves the database unchanged.

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use chrono::{DateTime, Utc};
use serde_json::{json, Value};
use sqlx::error::DatabaseError;
use sqlx::postgres::PgPoolOptions;
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use crate::codes::generate_room_code;
use crate::error::StoreError;
use crate::models::{ChatMessage, Game, GamePlayer, Room, RoomPlayer, Snapshot, User};

const MAX_CODE_ATTEMPTS: u32 = 10;

#[derive(Clone)]
pub struct Store {
    pool: PgPool,
}

impl Store {
    pub async fn connect(database_url: &str) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(25)
            .connect(database_url)
            .await?;
        Ok(Self { pool })
    }

    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn run_migrations(&self) -> Result<(), StoreError> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// `password_hash` is produced by the caller (the entry layer owns the
    /// hashing algorithm choice); the Store only ever stores and compares it.
    /// Lets the unique index (`users_email_idx`) be the source of truth for
    /// a taken email rather than a SELECT-then-INSERT check, which a
    /// concurrent registration for the same address could race past.
    pub async fn create_user(
        &self,
        email: &str,
        password_hash: &str,
        display_name: &str,
    ) -> Result<User, StoreError> {
        let email = email.to_lowercase();

        let id = Uuid::new_v4();
        sqlx::query(
            "INSERT INTO users (id, email, password_hash, display_name) VALUES ($1, $2, $3, $4)",
        )
        .bind(id)
        .bind(&email)
        .bind(password_hash)
        .bind(display_name)
        .execute(&self.pool)
        .await
        .map_err(|err| map_unique_violation(err, "users_email_idx", StoreError::EmailExists))?;

        self.fetch_user(id).await
    }

    pub async fn verify_user_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<Option<User>, StoreError> {
        let email = email.to_lowercase();
        let user: Option<User> = sqlx::query_as(
            "SELECT id, email, password_hash, display_name, created_at, updated_at
             FROM users WHERE lower(email) = $1",
        )
        .bind(&email)
        .fetch_optional(&self.pool)
        .await?;

        let Some(user) = user else { return Ok(None) };
        let Ok(hash) = PasswordHash::new(&user.password_hash) else {
            return Ok(None);
        };
        match Argon2::default().verify_password(password.as_bytes(), &hash) {
            Ok(()) => Ok(Some(user)),
            Err(_) => Ok(None),
        }
    }

    /// Looks up a user by id, e.g. to resolve a verified user-token's claim
    /// back to a full record for `GET /users/me`.
    pub async fn get_user(&self, id: Uuid) -> Result<User, StoreError> {
        self.fetch_user(id).await
    }

    async fn fetch_user(&self, id: Uuid) -> Result<User, StoreError> {
        sqlx::query_as(
            "SELECT id, email, password_hash, display_name, created_at, updated_at
             FROM users WHERE id = $1",
        )
        .bind(id)
        .fetch_one(&self.pool)
        .await
        .map_err(Into::into)
    }

    pub async fn create_room(
        &self,
        host_user_id: Option<Uuid>,
        host_display_name: &str,
        password: Option<&str>,
        settings: Value,
    ) -> Result<(Room, RoomPlayer, Game), StoreError> {
        let password_hash = password
            .map(|p| {
                let salt = SaltString::generate(&mut OsRng);
                Argon2::default()
                    .hash_password(p.as_bytes(), &salt)
                    .map(|h| h.to_string())
            })
            .transpose()
            .map_err(|_| StoreError::InvalidPassword)?;

        let mut tx = self.pool.begin().await?;
        let code = self.unique_room_code(&mut tx).await?;

        let room_id = Uuid::new_v4();
        sqlx::query(
            "INSERT INTO rooms (id, code, password_hash, settings) VALUES ($1, $2, $3, $4)",
        )
        .bind(room_id)
        .bind(&code)
        .bind(&password_hash)
        .bind(&settings)
        .execute(&mut *tx)
        .await?;

        let host = insert_room_player(&mut tx, room_id, host_display_name, true, host_user_id)
            .await?;

        let game_id = Uuid::new_v4();
        sqlx::query(
            "INSERT INTO games (id, room_id, status, config) VALUES ($1, $2, 'waiting', $3)",
        )
        .bind(game_id)
        .bind(room_id)
        .bind(json!({}))
        .execute(&mut *tx)
        .await?;
        insert_game_player(&mut tx, game_id, host.id).await?;
        insert_snapshot(&mut tx, game_id, 1, lobby_state(&[host.id])).await?;

        let room: Room = sqlx::query_as(
            "SELECT id, code, password_hash, settings, created_at FROM rooms WHERE id = $1",
        )
        .bind(room_id)
        .fetch_one(&mut *tx)
        .await?;
        let game: Game = sqlx::query_as(
            "SELECT id, room_id, status, config, created_at, ended_at FROM games WHERE id = $1",
        )
        .bind(game_id)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok((room, host, game))
    }

    async fn unique_room_code(
        &self,
        tx: &mut Transaction<'_, Postgres>,
    ) -> Result<String, StoreError> {
        for _ in 0..MAX_CODE_ATTEMPTS {
            let code = generate_room_code();
            let taken: Option<(Uuid,)> = sqlx::query_as("SELECT id FROM rooms WHERE code = $1")
                .bind(&code)
                .fetch_optional(&mut **tx)
                .await?;
            if taken.is_none() {
                return Ok(code);
            }
        }
        Err(StoreError::Internal(sqlx::Error::Protocol(
            "room code space exhausted".into(),
        )))
    }

    pub async fn join_room(
        &self,
        code: &str,
        joining_user_id: Option<Uuid>,
        display_name: &str,
        password: Option<&str>,
    ) -> Result<(Room, RoomPlayer, Option<Game>, Option<GamePlayer>), StoreError> {
        let mut tx = self.pool.begin().await?;
        let room: Room = sqlx::query_as(
            "SELECT id, code, password_hash, settings, created_at FROM rooms WHERE code = $1",
        )
        .bind(code)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(StoreError::RoomNotFound)?;

        match (&room.password_hash, password) {
            (Some(hash), Some(candidate)) => {
                let parsed = PasswordHash::new(hash).map_err(|_| StoreError::InvalidPassword)?;
                Argon2::default()
                    .verify_password(candidate.as_bytes(), &parsed)
                    .map_err(|_| StoreError::InvalidPassword)?;
            }
            (Some(_), None) => return Err(StoreError::PasswordRequired),
            (None, _) => {}
        }

        let player = insert_room_player(&mut tx, room.id, display_name, false, joining_user_id)
            .await?;

        let latest_game: Option<Game> = sqlx::query_as(
            "SELECT id, room_id, status, config, created_at, ended_at
             FROM games WHERE room_id = $1 ORDER BY created_at DESC LIMIT 1",
        )
        .bind(room.id)
        .fetch_optional(&mut *tx)
        .await?;

        let game_player = match &latest_game {
            Some(game) => Some(insert_game_player(&mut tx, game.id, player.id).await?),
            None => None,
        };

        tx.commit().await?;
        Ok((room, player, latest_game, game_player))
    }

    pub async fn get_room_by_code(&self, code: &str) -> Result<Room, StoreError> {
        sqlx::query_as(
            "SELECT id, code, password_hash, settings, created_at FROM rooms WHERE code = $1",
        )
        .bind(code)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(StoreError::RoomNotFound)
    }

    pub async fn get_room_player_in_room(
        &self,
        code: &str,
        room_player_id: Uuid,
    ) -> Result<RoomPlayer, StoreError> {
        let room = self.get_room_by_code(code).await?;
        sqlx::query_as(
            "SELECT id, room_id, display_name, is_host, user_id, created_at
             FROM room_players WHERE room_id = $1 AND id = $2",
        )
        .bind(room.id)
        .bind(room_player_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(StoreError::NotInRoom)
    }

    pub async fn get_room_player_by_user_in_room(
        &self,
        code: &str,
        user_id: Uuid,
    ) -> Result<RoomPlayer, StoreError> {
        let room = self.get_room_by_code(code).await?;
        sqlx::query_as(
            "SELECT id, room_id, display_name, is_host, user_id, created_at
             FROM room_players WHERE room_id = $1 AND user_id = $2",
        )
        .bind(room.id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(StoreError::UserNotInRoom)
    }

    pub async fn create_game(
        &self,
        room_id: Uuid,
        config: Value,
    ) -> Result<(Game, Vec<GamePlayer>, Snapshot), StoreError> {
        let mut tx = self.pool.begin().await?;
        let players: Vec<RoomPlayer> = sqlx::query_as(
            "SELECT id, room_id, display_name, is_host, user_id, created_at
             FROM room_players WHERE room_id = $1 ORDER BY created_at ASC",
        )
        .bind(room_id)
        .fetch_all(&mut *tx)
        .await?;
        if players.is_empty() {
            return Err(StoreError::RoomHasNoPlayers);
        }

        let game_id = Uuid::new_v4();
        sqlx::query(
            "INSERT INTO games (id, room_id, status, config) VALUES ($1, $2, 'waiting', $3)",
        )
        .bind(game_id)
        .bind(room_id)
        .bind(&config)
        .execute(&mut *tx)
        .await?;

        let mut game_players = Vec::with_capacity(players.len());
        for player in &players {
            game_players.push(insert_game_player(&mut tx, game_id, player.id).await?);
        }

        let ids: Vec<Uuid> = players.iter().map(|p| p.id).collect();
        let snapshot = insert_snapshot(&mut tx, game_id, 1, lobby_state(&ids)).await?;

        let game: Game = sqlx::query_as(
            "SELECT id, room_id, status, config, created_at, ended_at FROM games WHERE id = $1",
        )
        .bind(game_id)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok((game, game_players, snapshot))
    }

    pub async fn get_latest_game(&self, room_id: Uuid) -> Result<Option<Game>, StoreError> {
        sqlx::query_as(
            "SELECT id, room_id, status, config, created_at, ended_at
             FROM games WHERE room_id = $1 ORDER BY created_at DESC LIMIT 1",
        )
        .bind(room_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(Into::into)
    }

    pub async fn get_latest_snapshot(&self, game_id: Uuid) -> Result<Option<Value>, StoreError> {
        let row: Option<(Value,)> = sqlx::query_as(
            "SELECT state FROM game_state_snapshots
             WHERE game_id = $1 ORDER BY version DESC LIMIT 1",
        )
        .bind(game_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(|(state,)| state))
    }

    /// Inserts the event, inserts the next snapshot, and — when `finished_at`
    /// is given — marks the game finished, all in one transaction (§3: "Move
    /// applied ⇒ insert Event + insert Snapshot(v+1) + (on terminal) update
    /// Game.status+ended-at, one atomic unit").
    pub async fn append_event_and_snapshot(
        &self,
        game_id: Uuid,
        actor_id: Option<Uuid>,
        move_type: &str,
        payload: Value,
        next_state: Value,
        finished_at: Option<DateTime<Utc>>,
    ) -> Result<i64, StoreError> {
        let mut tx = self.pool.begin().await?;
        sqlx::query(
            "INSERT INTO game_events (id, game_id, room_player_id, type, payload)
             VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(Uuid::new_v4())
        .bind(game_id)
        .bind(actor_id)
        .bind(move_type)
        .bind(&payload)
        .execute(&mut *tx)
        .await?;

        let current_version: Option<(i64,)> = sqlx::query_as(
            "SELECT version FROM game_state_snapshots
             WHERE game_id = $1 ORDER BY version DESC LIMIT 1",
        )
        .bind(game_id)
        .fetch_optional(&mut *tx)
        .await?;
        let next_version = current_version.map(|(v,)| v + 1).unwrap_or(1);

        insert_snapshot(&mut tx, game_id, next_version, next_state).await?;

        if let Some(ended_at) = finished_at {
            sqlx::query("UPDATE games SET status = 'finished', ended_at = $2 WHERE id = $1")
                .bind(game_id)
                .bind(ended_at)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;
        Ok(next_version)
    }

    pub async fn get_game_player_ids_in_join_order(
        &self,
        game_id: Uuid,
    ) -> Result<Vec<Uuid>, StoreError> {
        let rows: Vec<(Uuid,)> = sqlx::query_as(
            "SELECT room_player_id FROM game_players WHERE game_id = $1 ORDER BY joined_at ASC",
        )
        .bind(game_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(|(id,)| id).collect())
    }

    pub async fn append_chat_message(
        &self,
        room_id: Uuid,
        game_id: Option<Uuid>,
        room_player_id: Uuid,
        body: &str,
    ) -> Result<ChatMessage, StoreError> {
        let id = Uuid::new_v4();
        sqlx::query(
            "INSERT INTO chat_messages (id, room_id, game_id, room_player_id, body)
             VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(id)
        .bind(room_id)
        .bind(game_id)
        .bind(room_player_id)
        .bind(body)
        .execute(&self.pool)
        .await?;

        sqlx::query_as(
            "SELECT id, room_id, game_id, room_player_id, body, created_at
             FROM chat_messages WHERE id = $1",
        )
        .bind(id)
        .fetch_one(&self.pool)
        .await
        .map_err(Into::into)
    }
}

/// Lets the unique index (`room_players_room_display_name_idx`) be the
/// source of truth for a taken display name rather than a SELECT-then-INSERT
/// check, which two concurrent joins with the same name could race past.
async fn insert_room_player(
    tx: &mut Transaction<'_, Postgres>,
    room_id: Uuid,
    display_name: &str,
    is_host: bool,
    user_id: Option<Uuid>,
) -> Result<RoomPlayer, StoreError> {
    let id = Uuid::new_v4();
    sqlx::query(
        "INSERT INTO room_players (id, room_id, display_name, is_host, user_id)
         VALUES ($1, $2, $3, $4, $5)",
    )
    .bind(id)
    .bind(room_id)
    .bind(display_name)
    .bind(is_host)
    .bind(user_id)
    .execute(&mut **tx)
    .await
    .map_err(|err| {
        map_unique_violation(err, "room_players_room_display_name_idx", StoreError::NameTaken)
    })?;

    sqlx::query_as(
        "SELECT id, room_id, display_name, is_host, user_id, created_at
         FROM room_players WHERE id = $1",
    )
    .bind(id)
    .fetch_one(&mut **tx)
    .await
    .map_err(Into::into)
}

async fn insert_game_player(
    tx: &mut Transaction<'_, Postgres>,
    game_id: Uuid,
    room_player_id: Uuid,
) -> Result<GamePlayer, StoreError> {
    let id = Uuid::new_v4();
    sqlx::query(
        "INSERT INTO game_players (id, game_id, room_player_id) VALUES ($1, $2, $3)",
    )
    .bind(id)
    .bind(game_id)
    .bind(room_player_id)
    .execute(&mut **tx)
    .await?;

    sqlx::query_as(
        "SELECT id, game_id, room_player_id, role, joined_at, left_at
         FROM game_players WHERE id = $1",
    )
    .bind(id)
    .fetch_one(&mut **tx)
    .await
    .map_err(Into::into)
}

async fn insert_snapshot(
    tx: &mut Transaction<'_, Postgres>,
    game_id: Uuid,
    version: i64,
    state: Value,
) -> Result<Snapshot, StoreError> {
    let id = Uuid::new_v4();
    sqlx::query(
        "INSERT INTO game_state_snapshots (id, game_id, version, state) VALUES ($1, $2, $3, $4)",
    )
    .bind(id)
    .bind(game_id)
    .bind(version)
    .bind(&state)
    .execute(&mut **tx)
    .await?;

    sqlx::query_as(
        "SELECT id, game_id, version, state, created_at
         FROM game_state_snapshots WHERE id = $1",
    )
    .bind(id)
    .fetch_one(&mut **tx)
    .await
    .map_err(Into::into)
}

/// Maps a Postgres unique-violation (SQLSTATE `23505`) on the named
/// constraint to `domain_err`; any other error passes through unchanged.
fn map_unique_violation(err: sqlx::Error, constraint: &str, domain_err: StoreError) -> StoreError {
    if let sqlx::Error::Database(db_err) = &err {
        if db_err.code().as_deref() == Some("23505") && db_err.constraint() == Some(constraint) {
            return domain_err;
        }
    }
    StoreError::Internal(err)
}

/// Placeholder lobby state written at v1; the Engine overwrites it with its
/// own representation on the first real move. The Store stays ignorant of
/// the Engine's state shape, so this carries only the membership list.
fn lobby_state(room_player_ids: &[Uuid]) -> Value {
    json!({
        "phase": "lobby",
        "player_ids": room_player_ids,
    })
}
