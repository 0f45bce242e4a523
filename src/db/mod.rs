//! Database layer.
//!
//! Every access the services make is an explicit method on [`Store`].
//! Two implementations exist: [`MemoryDb`] (in-process, default) and
//! [`FirestoreDb`].

pub mod firestore;
pub mod memory;

pub use firestore::FirestoreDb;
pub use memory::MemoryDb;

use crate::error::AppError;
use crate::models::{
    AthleteInfo, BoundingBox, Challenge, CollectibleItem, Position, Run, Subscription, User,
    UserRole,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// Collection names as constants.
pub mod collections {
    pub const USERS: &str = "users";
    pub const RUNS: &str = "runs";
    pub const POSITIONS: &str = "positions";
    pub const COLLECTIBLE_ITEMS: &str = "collectible_items";
    /// Keyed by `{athlete_id}_{challenge}`
    pub const CHALLENGES: &str = "challenges";
    /// Keyed by `{coach_id}_{athlete_id}`
    pub const SUBSCRIPTIONS: &str = "subscriptions";
    /// Keyed by user ID
    pub const ATHLETE_INFO: &str = "athlete_info";
}

/// Persistence operations used by the services.
///
/// Inserts that must be unique return `Ok(false)` when the record already
/// exists instead of failing, so a losing concurrent writer is a no-op.
#[async_trait]
pub trait Store: Send + Sync {
    // ─── Users ───────────────────────────────────────────────────

    async fn insert_user(&self, user: &User) -> Result<(), AppError>;

    async fn get_user(&self, user_id: &str) -> Result<Option<User>, AppError>;

    /// All users, optionally restricted to one role, ordered by join date.
    async fn list_users(&self, role: Option<UserRole>) -> Result<Vec<User>, AppError>;

    // ─── Runs ────────────────────────────────────────────────────

    async fn insert_run(&self, run: &Run) -> Result<(), AppError>;

    async fn get_run(&self, run_id: &str) -> Result<Option<Run>, AppError>;

    /// Overwrite a stored run.
    async fn update_run(&self, run: &Run) -> Result<(), AppError>;

    /// Runs ordered by creation time, optionally for a single athlete.
    async fn list_runs(&self, athlete_id: Option<&str>) -> Result<Vec<Run>, AppError>;

    // ─── Positions ───────────────────────────────────────────────

    async fn insert_position(&self, position: &Position) -> Result<(), AppError>;

    /// The latest position of a run captured at or before `at`.
    async fn preceding_position(
        &self,
        run_id: &str,
        at: DateTime<Utc>,
    ) -> Result<Option<Position>, AppError>;

    /// All positions of a run ordered by capture time.
    async fn positions_for_run(&self, run_id: &str) -> Result<Vec<Position>, AppError>;

    /// Positions ordered by capture time, optionally for a single run.
    async fn list_positions(&self, run_id: Option<&str>) -> Result<Vec<Position>, AppError>;

    // ─── Collectible Items ───────────────────────────────────────

    /// Store a new item. Returns `false` if its `uid` is already taken.
    async fn insert_collectible(&self, item: &CollectibleItem) -> Result<bool, AppError>;

    async fn list_collectibles(&self) -> Result<Vec<CollectibleItem>, AppError>;

    /// Items whose coordinates fall inside `bbox`.
    async fn collectibles_in_box(
        &self,
        bbox: &BoundingBox,
    ) -> Result<Vec<CollectibleItem>, AppError>;

    /// Add an athlete to an item's collected-by set.
    ///
    /// Returns `true` if the athlete was newly added.
    async fn add_collector(&self, uid: &str, athlete_id: &str) -> Result<bool, AppError>;

    // ─── Challenges ──────────────────────────────────────────────

    /// Grant a challenge. Returns `false` if the athlete already holds it.
    async fn insert_challenge(&self, challenge: &Challenge) -> Result<bool, AppError>;

    /// Challenges, optionally for a single athlete.
    async fn list_challenges(&self, athlete_id: Option<&str>)
        -> Result<Vec<Challenge>, AppError>;

    // ─── Coaching ────────────────────────────────────────────────

    /// Store a subscription. Returns `false` if the pair already exists.
    async fn insert_subscription(&self, subscription: &Subscription) -> Result<bool, AppError>;

    async fn get_subscription(
        &self,
        coach_id: &str,
        athlete_id: &str,
    ) -> Result<Option<Subscription>, AppError>;

    async fn update_subscription(&self, subscription: &Subscription) -> Result<(), AppError>;

    async fn subscriptions_for_coach(&self, coach_id: &str)
        -> Result<Vec<Subscription>, AppError>;

    async fn get_athlete_info(&self, user_id: &str) -> Result<Option<AthleteInfo>, AppError>;

    async fn upsert_athlete_info(&self, info: &AthleteInfo) -> Result<(), AppError>;
}
