use crate::entities::{essays, prelude::*};
use crate::models::essay::{Essay, EssayKind, EssayQuery, EssaySort, NewEssay, SortOrder};
use anyhow::{Context, Result};
use chrono::SecondsFormat;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, Order, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Set,
};

/// SQLite rejects OFFSET without LIMIT.
const NO_LIMIT: u64 = 9_223_372_036_854_775_807;

pub struct EssayRepository {
    conn: DatabaseConnection,
}

impl From<essays::Model> for Essay {
    fn from(model: essays::Model) -> Self {
        Self {
            id: model.id,
            user_id: model.user_id,
            topic: model.topic,
            content: model.content,
            essay_type: model.essay_type,
            score: model.score,
            feedback: model.feedback,
            submitted_at: model.submitted_at,
        }
    }
}

impl EssayRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn create(&self, essay: NewEssay) -> Result<Essay> {
        // Drafts never carry a score
        let score = match essay.kind {
            EssayKind::Draft => 0,
            EssayKind::Submission => essay.score.clamp(0, 100),
        };

        let active = essays::ActiveModel {
            user_id: Set(essay.user_id),
            topic: Set(essay.topic),
            content: Set(essay.content),
            essay_type: Set(essay.kind.as_str().to_string()),
            score: Set(score),
            feedback: Set(essay.feedback),
            submitted_at: Set(chrono::Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)),
            ..Default::default()
        };

        let model = active
            .insert(&self.conn)
            .await
            .context("Failed to insert essay")?;

        Ok(Essay::from(model))
    }

    /// Returns the essay only when it belongs to `user_id`.
    pub async fn get(&self, user_id: i32, id: i32) -> Result<Option<Essay>> {
        let essay = Essays::find_by_id(id)
            .filter(essays::Column::UserId.eq(user_id))
            .one(&self.conn)
            .await
            .context("Failed to query essay")?;

        Ok(essay.map(Essay::from))
    }

    pub async fn list(&self, user_id: i32, query: &EssayQuery) -> Result<Vec<Essay>> {
        let mut select = Essays::find().filter(essays::Column::UserId.eq(user_id));

        if let Some(kind) = query.kind {
            select = select.filter(essays::Column::EssayType.eq(kind.as_str()));
        }

        let column = match query.sort {
            EssaySort::SubmittedAt => essays::Column::SubmittedAt,
            EssaySort::Score => essays::Column::Score,
            EssaySort::Topic => essays::Column::Topic,
            EssaySort::Type => essays::Column::EssayType,
            EssaySort::Id => essays::Column::Id,
        };
        let order = match query.order {
            SortOrder::Asc => Order::Asc,
            SortOrder::Desc => Order::Desc,
        };

        select = select.order_by(column, order.clone());
        if query.sort != EssaySort::Id {
            // Rows saved within the same millisecond keep insertion order
            select = select.order_by(essays::Column::Id, order);
        }

        if query.skip > 0 {
            select = select
                .offset(query.skip)
                .limit(query.take.unwrap_or(NO_LIMIT));
        } else if let Some(take) = query.take {
            select = select.limit(take);
        }

        let rows = select
            .all(&self.conn)
            .await
            .context("Failed to list essays")?;

        Ok(rows.into_iter().map(Essay::from).collect())
    }

    pub async fn recent_drafts(&self, user_id: i32, limit: u64) -> Result<Vec<Essay>> {
        let query = EssayQuery {
            kind: Some(EssayKind::Draft),
            take: Some(limit),
            ..EssayQuery::default()
        };
        self.list(user_id, &query).await
    }

    pub async fn count(&self, user_id: i32, kind: Option<EssayKind>) -> Result<u64> {
        let mut select = Essays::find().filter(essays::Column::UserId.eq(user_id));
        if let Some(kind) = kind {
            select = select.filter(essays::Column::EssayType.eq(kind.as_str()));
        }

        select
            .count(&self.conn)
            .await
            .context("Failed to count essays")
    }

    /// Deletes every essay owned by `user_id` and reports how many went.
    pub async fn clear_for_user(&self, user_id: i32) -> Result<u64> {
        let result = Essays::delete_many()
            .filter(essays::Column::UserId.eq(user_id))
            .exec(&self.conn)
            .await
            .context("Failed to clear essay history")?;

        Ok(result.rows_affected)
    }
}
