use crate::entities::{
    BannerStatus, InteractionAction, TargetList, banner_entity as banners,
    banner_interaction_entity as interactions, user_entity as users,
};
use crate::error::{AppError, AppResult};
use crate::models::banner::validate_window;
use crate::models::{BannerAnalytics, BannerCreate, BannerResponse, BannerUpdate};
use crate::rules::banner::{initial_status, lifecycle_transition};
use crate::rules::{DateWindow, Viewer, select_visible_banners};
use chrono::{DateTime, Utc};
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, IntoActiveModel, QueryFilter,
    QueryOrder, Set, TransactionTrait,
};
use uuid::Uuid;

#[derive(Clone)]
pub struct BannerService {
    pool: DatabaseConnection,
}

impl BannerService {
    pub fn new(pool: DatabaseConnection) -> Self {
        Self { pool }
    }

    pub async fn create(
        &self,
        actor_id: &str,
        request: BannerCreate,
        now: DateTime<Utc>,
    ) -> AppResult<BannerResponse> {
        request.validate()?;

        let window = DateWindow::new(request.start_date, request.end_date);
        let status = initial_status(request.status, &window, now);

        let banner = banners::ActiveModel {
            id: Set(Uuid::new_v4().to_string()),
            title: Set(request.title.trim().to_string()),
            message: Set(request.message),
            banner_type: Set(request.banner_type),
            status: Set(status),
            target_users: Set(TargetList::from_values(request.target_users)),
            target_tiers: Set(TargetList::from_values(request.target_tiers)),
            start_date: Set(request.start_date),
            end_date: Set(request.end_date),
            is_dismissible: Set(request.is_dismissible),
            priority: Set(request.priority),
            action_text: Set(request.action_text),
            action_url: Set(request.action_url),
            views: Set(0),
            clicks: Set(0),
            dismissals: Set(0),
            created_by: Set(actor_id.to_string()),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&self.pool)
        .await?;

        log::info!("Banner {} created by {} with status {:?}", banner.id, actor_id, status);
        Ok(banner.into())
    }

    /// All banners, highest priority first then newest first.
    pub async fn list(&self, status: Option<BannerStatus>) -> AppResult<Vec<BannerResponse>> {
        let mut query = banners::Entity::find();
        if let Some(status) = status {
            query = query.filter(banners::Column::Status.eq(status));
        }
        let list = query
            .order_by_desc(banners::Column::Priority)
            .order_by_desc(banners::Column::CreatedAt)
            .all(&self.pool)
            .await?;
        Ok(list.into_iter().map(Into::into).collect())
    }

    pub async fn get(&self, banner_id: &str) -> AppResult<BannerResponse> {
        Ok(self.find(banner_id).await?.into())
    }

    pub async fn update(
        &self,
        banner_id: &str,
        request: BannerUpdate,
        now: DateTime<Utc>,
    ) -> AppResult<BannerResponse> {
        request.validate()?;
        let existing = self.find(banner_id).await?;

        let start_date = request.start_date.unwrap_or(existing.start_date);
        let end_date = request.end_date.unwrap_or(existing.end_date);
        validate_window(&DateWindow::new(start_date, end_date))?;

        let mut model = existing.into_active_model();
        if let Some(title) = request.title {
            model.title = Set(title.trim().to_string());
        }
        if let Some(message) = request.message {
            model.message = Set(message);
        }
        if let Some(banner_type) = request.banner_type {
            model.banner_type = Set(banner_type);
        }
        if let Some(status) = request.status {
            model.status = Set(status);
        }
        if let Some(target_users) = request.target_users {
            model.target_users = Set(TargetList::from_values(target_users));
        }
        if let Some(target_tiers) = request.target_tiers {
            model.target_tiers = Set(TargetList::from_values(target_tiers));
        }
        if let Some(is_dismissible) = request.is_dismissible {
            model.is_dismissible = Set(is_dismissible);
        }
        if let Some(priority) = request.priority {
            model.priority = Set(priority);
        }
        if let Some(action_text) = request.action_text {
            model.action_text = Set(action_text);
        }
        if let Some(action_url) = request.action_url {
            model.action_url = Set(action_url);
        }
        model.start_date = Set(start_date);
        model.end_date = Set(end_date);
        model.updated_at = Set(now);

        let updated = model.update(&self.pool).await?;
        Ok(updated.into())
    }

    pub async fn delete(&self, banner_id: &str) -> AppResult<()> {
        let res = banners::Entity::delete_by_id(banner_id.to_string())
            .exec(&self.pool)
            .await?;
        if res.rows_affected == 0 {
            return Err(AppError::NotFound("Banner not found".to_string()));
        }
        log::info!("Banner {} deleted", banner_id);
        Ok(())
    }

    /// Banners the user should see right now, highest priority first.
    pub async fn active_for_user(
        &self,
        user: &users::Model,
        now: DateTime<Utc>,
    ) -> AppResult<Vec<BannerResponse>> {
        let candidates = banners::Entity::find()
            .filter(banners::Column::Status.eq(BannerStatus::Active))
            .order_by_asc(banners::Column::CreatedAt)
            .all(&self.pool)
            .await?;

        let viewer = Viewer {
            email: &user.email,
            tier: &user.subscription_tier,
        };
        Ok(select_visible_banners(candidates, &viewer, now)
            .into_iter()
            .map(Into::into)
            .collect())
    }

    /// Bumps the counter for `action` and logs the interaction.
    ///
    /// Returns `false` without writing anything when the banner does not exist.
    pub async fn track(
        &self,
        banner_id: &str,
        user_id: &str,
        action: InteractionAction,
        now: DateTime<Utc>,
    ) -> AppResult<bool> {
        let counter = match action {
            InteractionAction::View => banners::Column::Views,
            InteractionAction::Click => banners::Column::Clicks,
            InteractionAction::Dismiss => banners::Column::Dismissals,
        };

        let txn = self.pool.begin().await?;

        let res = banners::Entity::update_many()
            .col_expr(counter, Expr::col(counter).add(1))
            .filter(banners::Column::Id.eq(banner_id))
            .exec(&txn)
            .await?;

        if res.rows_affected == 0 {
            txn.rollback().await?;
            log::debug!("Ignoring {:?} on unknown banner {}", action, banner_id);
            return Ok(false);
        }

        interactions::ActiveModel {
            id: Set(Uuid::new_v4().to_string()),
            banner_id: Set(banner_id.to_string()),
            user_id: Set(user_id.to_string()),
            action: Set(action),
            created_at: Set(now),
        }
        .insert(&txn)
        .await?;

        txn.commit().await?;
        Ok(true)
    }

    pub async fn analytics(&self, banner_id: &str) -> AppResult<BannerAnalytics> {
        Ok(self.find(banner_id).await?.into())
    }

    /// Moves scheduled and active banners along their date window.
    /// Returns how many banners changed status.
    pub async fn sweep_statuses(&self, now: DateTime<Utc>) -> AppResult<u64> {
        let candidates = banners::Entity::find()
            .filter(
                banners::Column::Status.is_in([BannerStatus::Scheduled, BannerStatus::Active]),
            )
            .all(&self.pool)
            .await?;

        let mut changed = 0;
        for banner in candidates {
            let Some(next) = lifecycle_transition(banner.status, &banner.window(), now) else {
                continue;
            };
            // Skip rows an admin touched since we read them
            let res = banners::Entity::update_many()
                .col_expr(banners::Column::Status, Expr::value(next))
                .col_expr(banners::Column::UpdatedAt, Expr::value(now))
                .filter(banners::Column::Id.eq(banner.id.as_str()))
                .filter(banners::Column::Status.eq(banner.status))
                .exec(&self.pool)
                .await?;
            if res.rows_affected > 0 {
                log::info!("Banner {} moved {:?} -> {:?}", banner.id, banner.status, next);
                changed += res.rows_affected;
            }
        }
        Ok(changed)
    }

    async fn find(&self, banner_id: &str) -> AppResult<banners::Model> {
        banners::Entity::find_by_id(banner_id.to_string())
            .one(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound("Banner not found".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::test_pool;
    use crate::entities::{BannerType, UserRole};
    use chrono::{Duration, TimeZone};
    use sea_orm::PaginatorTrait;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 15, 12, 0, 0).unwrap()
    }

    fn create_request(title: &str, priority: i32) -> BannerCreate {
        BannerCreate {
            title: title.to_string(),
            message: "Journey maps are live".to_string(),
            banner_type: BannerType::Info,
            status: None,
            target_users: vec![],
            target_tiers: vec![],
            start_date: None,
            end_date: None,
            is_dismissible: true,
            priority,
            action_text: None,
            action_url: None,
        }
    }

    fn user(email: &str, tier: &str) -> users::Model {
        users::Model {
            id: Uuid::new_v4().to_string(),
            email: email.to_string(),
            password_hash: "x".to_string(),
            full_name: "Test".to_string(),
            role: UserRole::User,
            subscription_tier: tier.to_string(),
            is_active: true,
            created_at: now(),
            updated_at: now(),
        }
    }

    #[tokio::test]
    async fn test_create_derives_status_from_window() {
        let svc = BannerService::new(test_pool().await);

        let open = svc.create("admin", create_request("open", 0), now()).await.unwrap();
        assert_eq!(open.status, BannerStatus::Active);

        let mut future = create_request("future", 0);
        future.start_date = Some(now() + Duration::days(1));
        let future = svc.create("admin", future, now()).await.unwrap();
        assert_eq!(future.status, BannerStatus::Scheduled);

        let mut past = create_request("past", 0);
        past.end_date = Some(now() - Duration::days(1));
        let past = svc.create("admin", past, now()).await.unwrap();
        assert_eq!(past.status, BannerStatus::Expired);

        let mut draft = create_request("draft", 0);
        draft.status = Some(BannerStatus::Draft);
        let draft = svc.create("admin", draft, now()).await.unwrap();
        assert_eq!(draft.status, BannerStatus::Draft);
    }

    #[tokio::test]
    async fn test_targets_are_normalized() {
        let svc = BannerService::new(test_pool().await);
        let mut req = create_request("targeted", 0);
        req.target_users = vec!["Pat@Example.com".to_string(), "pat@example.com".to_string()];
        req.target_tiers = vec![" Growth ".to_string()];
        let banner = svc.create("admin", req, now()).await.unwrap();
        assert_eq!(banner.target_users, vec!["pat@example.com"]);
        assert_eq!(banner.target_tiers, vec!["growth"]);
    }

    #[tokio::test]
    async fn test_active_for_user_filters_and_orders() {
        let svc = BannerService::new(test_pool().await);

        let low = svc.create("admin", create_request("low", 1), now()).await.unwrap();
        let high = svc.create("admin", create_request("high", 9), now()).await.unwrap();

        let mut enterprise_only = create_request("enterprise", 10);
        enterprise_only.target_tiers = vec!["enterprise".to_string()];
        svc.create("admin", enterprise_only, now()).await.unwrap();

        let mut paused = create_request("paused", 10);
        paused.status = Some(BannerStatus::Paused);
        svc.create("admin", paused, now()).await.unwrap();

        let visible = svc
            .active_for_user(&user("pat@example.com", "growth"), now())
            .await
            .unwrap();
        let ids: Vec<_> = visible.iter().map(|b| b.banner_id.as_str()).collect();
        assert_eq!(ids, vec![high.banner_id.as_str(), low.banner_id.as_str()]);
    }

    #[tokio::test]
    async fn test_window_bounds_are_inclusive() {
        let svc = BannerService::new(test_pool().await);
        let mut req = create_request("edge", 0);
        req.start_date = Some(now());
        req.end_date = Some(now());
        svc.create("admin", req, now()).await.unwrap();

        let visible = svc
            .active_for_user(&user("pat@example.com", "free"), now())
            .await
            .unwrap();
        assert_eq!(visible.len(), 1);
    }

    #[tokio::test]
    async fn test_update_and_delete() {
        let svc = BannerService::new(test_pool().await);
        let banner = svc.create("admin", create_request("t", 0), now()).await.unwrap();

        let updated = svc
            .update(
                &banner.banner_id,
                BannerUpdate {
                    title: Some("Renamed".to_string()),
                    priority: Some(5),
                    action_url: Some(Some("https://example.com".to_string())),
                    ..Default::default()
                },
                now(),
            )
            .await
            .unwrap();
        assert_eq!(updated.title, "Renamed");
        assert_eq!(updated.priority, 5);
        assert_eq!(updated.action_url.as_deref(), Some("https://example.com"));
        assert_eq!(updated.message, banner.message);

        let reversed = svc
            .update(
                &banner.banner_id,
                BannerUpdate {
                    start_date: Some(Some(now())),
                    end_date: Some(Some(now() - Duration::hours(1))),
                    ..Default::default()
                },
                now(),
            )
            .await;
        assert!(matches!(reversed, Err(AppError::ValidationError(_))));

        svc.delete(&banner.banner_id).await.unwrap();
        assert!(matches!(svc.get(&banner.banner_id).await, Err(AppError::NotFound(_))));
        assert!(matches!(svc.delete(&banner.banner_id).await, Err(AppError::NotFound(_))));
        assert!(matches!(
            svc.update("missing", BannerUpdate::default(), now()).await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_track_increments_one_counter() {
        let pool = test_pool().await;
        let svc = BannerService::new(pool.clone());
        let banner = svc.create("admin", create_request("t", 0), now()).await.unwrap();

        assert!(svc.track(&banner.banner_id, "u1", InteractionAction::View, now()).await.unwrap());
        assert!(svc.track(&banner.banner_id, "u1", InteractionAction::View, now()).await.unwrap());
        assert!(svc.track(&banner.banner_id, "u1", InteractionAction::Click, now()).await.unwrap());

        let stats = svc.analytics(&banner.banner_id).await.unwrap();
        assert_eq!((stats.views, stats.clicks, stats.dismissals), (2, 1, 0));
        assert_eq!(stats.click_through_rate, 50.0);

        let logged = interactions::Entity::find().count(&pool).await.unwrap();
        assert_eq!(logged, 3);
    }

    #[tokio::test]
    async fn test_track_unknown_banner_is_noop() {
        let pool = test_pool().await;
        let svc = BannerService::new(pool.clone());

        let tracked = svc
            .track("does-not-exist", "u1", InteractionAction::Dismiss, now())
            .await
            .unwrap();
        assert!(!tracked);
        assert_eq!(interactions::Entity::find().count(&pool).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_sweep_moves_statuses() {
        let svc = BannerService::new(test_pool().await);

        let mut starting = create_request("starting", 0);
        starting.start_date = Some(now() + Duration::hours(1));
        let starting = svc.create("admin", starting, now()).await.unwrap();

        let mut ending = create_request("ending", 0);
        ending.end_date = Some(now() + Duration::hours(1));
        let ending = svc.create("admin", ending, now()).await.unwrap();

        assert_eq!(svc.sweep_statuses(now()).await.unwrap(), 0);

        let later = now() + Duration::minutes(90);
        assert_eq!(svc.sweep_statuses(later).await.unwrap(), 2);
        assert_eq!(svc.get(&starting.banner_id).await.unwrap().status, BannerStatus::Active);
        assert_eq!(svc.get(&ending.banner_id).await.unwrap().status, BannerStatus::Expired);

        assert_eq!(svc.sweep_statuses(later).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_list_filters_by_status() {
        let svc = BannerService::new(test_pool().await);
        svc.create("admin", create_request("a", 0), now()).await.unwrap();
        let mut draft = create_request("b", 3);
        draft.status = Some(BannerStatus::Draft);
        svc.create("admin", draft, now()).await.unwrap();

        assert_eq!(svc.list(None).await.unwrap().len(), 2);
        let drafts = svc.list(Some(BannerStatus::Draft)).await.unwrap();
        assert_eq!(drafts.len(), 1);
        assert_eq!(drafts[0].title, "b");
    }
}
