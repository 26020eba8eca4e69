//! Idempotent reward settlement
//!
//! Confirms a participant's follow, advances task/order progress, and
//! credits the reward — all inside one Postgres transaction. Row locks on
//! the task and participant rows serialize concurrent settlement attempts,
//! so two claimants settling the same task cannot lose an increment and the
//! same claimant can never be credited twice.

use std::fmt;

use sqlx::{FromRow, PgPool};

/// Why a settlement was refused. Precondition variants abort the
/// transaction with no partial writes; callers must not retry them.
#[derive(Debug)]
pub enum SettlementError {
    TaskNotFound,
    TaskNotActive,
    NoParticipation,
    Database(sqlx::Error),
}

impl fmt::Display for SettlementError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TaskNotFound => write!(f, "task not found"),
            Self::TaskNotActive => write!(f, "task is no longer active"),
            Self::NoParticipation => write!(f, "claimant has no participation record"),
            Self::Database(e) => write!(f, "database error: {}", e),
        }
    }
}

impl std::error::Error for SettlementError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Database(e) => Some(e),
            _ => None,
        }
    }
}

impl From<sqlx::Error> for SettlementError {
    fn from(e: sqlx::Error) -> Self {
        Self::Database(e)
    }
}

/// Outcome of a settlement attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settlement {
    /// Claimant's balance after the attempt. Unchanged when the attempt was
    /// a no-op replay of an already-confirmed follow.
    pub new_coins: i64,
    pub already_settled: bool,
    pub task_completed: bool,
}

#[derive(Debug, FromRow)]
struct TaskRow {
    active: bool,
    need: i32,
    done_count: i32,
    order_id: Option<String>,
}

#[derive(Debug, FromRow)]
struct ParticipantRow {
    followed: bool,
}

/// What the transaction should write, decided from the locked reads.
#[derive(Debug, PartialEq, Eq)]
enum Plan {
    AlreadySettled,
    Apply {
        new_done_count: i32,
        completes_task: bool,
    },
}

/// Pure verification step of the read-verify-write protocol.
fn plan(task: &TaskRow, participant: Option<&ParticipantRow>) -> Result<Plan, SettlementError> {
    if !task.active {
        return Err(SettlementError::TaskNotActive);
    }
    let participant = participant.ok_or(SettlementError::NoParticipation)?;
    if participant.followed {
        return Ok(Plan::AlreadySettled);
    }
    let new_done_count = task.done_count + 1;
    Ok(Plan::Apply {
        new_done_count,
        completes_task: new_done_count >= task.need,
    })
}

/// Settle a confirmed follow for `claimant` on `task_id`, crediting
/// `reward` coins exactly once.
///
/// The whole read-verify-write sequence runs in one transaction. `SELECT
/// ... FOR UPDATE` takes row locks on the task and participant rows, so
/// settlement attempts racing from other request handlers (or other
/// processes) serialize on the store, not on anything in-process.
pub async fn settle_follow(
    pool: &PgPool,
    task_id: &str,
    claimant: &str,
    reward: i64,
) -> Result<Settlement, SettlementError> {
    let mut tx = pool.begin().await?;

    let task: Option<TaskRow> = sqlx::query_as(
        "SELECT active, need, done_count, order_id FROM follow_tasks WHERE id = $1 FOR UPDATE",
    )
    .bind(task_id)
    .fetch_optional(&mut *tx)
    .await?;
    let task = task.ok_or(SettlementError::TaskNotFound)?;

    let participant: Option<ParticipantRow> = sqlx::query_as(
        r#"
        SELECT followed FROM task_participants
        WHERE task_id = $1 AND username = $2
        FOR UPDATE
        "#,
    )
    .bind(task_id)
    .bind(claimant)
    .fetch_optional(&mut *tx)
    .await?;

    match plan(&task, participant.as_ref())? {
        Plan::AlreadySettled => {
            // Idempotent replay: report the current balance, write nothing.
            let coins: Option<(i64,)> =
                sqlx::query_as("SELECT coins FROM user_accounts WHERE username = $1")
                    .bind(claimant)
                    .fetch_optional(&mut *tx)
                    .await?;
            tx.commit().await?;

            Ok(Settlement {
                new_coins: coins.map(|c| c.0).unwrap_or(0),
                already_settled: true,
                task_completed: false,
            })
        }
        Plan::Apply {
            new_done_count,
            completes_task,
        } => {
            sqlx::query(
                r#"
                UPDATE task_participants
                SET followed = TRUE, confirmed_at = now()
                WHERE task_id = $1 AND username = $2
                "#,
            )
            .bind(task_id)
            .bind(claimant)
            .execute(&mut *tx)
            .await?;

            sqlx::query("UPDATE follow_tasks SET done_count = $2, active = $3 WHERE id = $1")
                .bind(task_id)
                .bind(new_done_count)
                .bind(!completes_task)
                .execute(&mut *tx)
                .await?;

            // Mirror progress onto the linked order; flip it terminal in the
            // same transaction as the closing increment.
            if let Some(order_id) = &task.order_id {
                sqlx::query(
                    r#"
                    UPDATE orders
                    SET done_count = $2,
                        status = CASE WHEN $3 THEN 'done' ELSE status END
                    WHERE id = $1
                    "#,
                )
                .bind(order_id)
                .bind(new_done_count)
                .bind(completes_task)
                .execute(&mut *tx)
                .await?;
            }

            let (new_coins,): (i64,) = sqlx::query_as(
                r#"
                INSERT INTO user_accounts (username, coins, created_at)
                VALUES ($1, $2, now())
                ON CONFLICT (username)
                DO UPDATE SET coins = user_accounts.coins + EXCLUDED.coins
                RETURNING coins
                "#,
            )
            .bind(claimant)
            .bind(reward)
            .fetch_one(&mut *tx)
            .await?;

            tx.commit().await?;

            if completes_task {
                tracing::info!(task_id, done_count = new_done_count, "Follow task completed");
            }

            Ok(Settlement {
                new_coins,
                already_settled: false,
                task_completed: completes_task,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn task(active: bool, need: i32, done_count: i32) -> TaskRow {
        TaskRow {
            active,
            need,
            done_count,
            order_id: None,
        }
    }

    #[test]
    fn test_plan_rejects_inactive_task() {
        let result = plan(&task(false, 5, 5), Some(&ParticipantRow { followed: false }));
        assert!(matches!(result, Err(SettlementError::TaskNotActive)));
    }

    #[test]
    fn test_plan_requires_participation_record() {
        let result = plan(&task(true, 5, 0), None);
        assert!(matches!(result, Err(SettlementError::NoParticipation)));
    }

    #[test]
    fn test_plan_replay_is_a_noop() {
        let result = plan(&task(true, 5, 3), Some(&ParticipantRow { followed: true }));
        assert_eq!(result.unwrap(), Plan::AlreadySettled);
    }

    #[test]
    fn test_plan_increments_without_completing() {
        let result = plan(&task(true, 5, 0), Some(&ParticipantRow { followed: false }));
        assert_eq!(
            result.unwrap(),
            Plan::Apply {
                new_done_count: 1,
                completes_task: false,
            }
        );
    }

    #[test]
    fn test_plan_completes_task_when_need_reached() {
        let result = plan(&task(true, 5, 4), Some(&ParticipantRow { followed: false }));
        assert_eq!(
            result.unwrap(),
            Plan::Apply {
                new_done_count: 5,
                completes_task: true,
            }
        );
    }

    #[test]
    fn test_plan_single_follow_task_completes_immediately() {
        let result = plan(&task(true, 1, 0), Some(&ParticipantRow { followed: false }));
        assert_eq!(
            result.unwrap(),
            Plan::Apply {
                new_done_count: 1,
                completes_task: true,
            }
        );
    }
}
