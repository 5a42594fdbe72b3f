use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, PoisonError};

use crate::database::Storage;
use crate::entities::{FeeStatus, fee_entity as fee, plan_entity as plan};
use crate::error::{AppError, AppResult};
use crate::models::*;
use crate::services::SubscriptionService;
use crate::utils::{BillingPeriod, append_note};
use chrono::{DateTime, NaiveDate, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, IntoActiveModel, QueryFilter, QueryOrder, Set,
};
use tokio::sync::OwnedMutexGuard;

/// One lock per billing period so concurrent sweeps for the same month run
/// one after the other and the second one sees the first one's fees.
#[derive(Default)]
struct SweepLocks {
    periods: Mutex<HashMap<BillingPeriod, Arc<tokio::sync::Mutex<()>>>>,
}

impl SweepLocks {
    async fn acquire(&self, period: BillingPeriod) -> SweepGuard<'_> {
        let lock = {
            let mut periods = self.periods.lock().unwrap_or_else(PoisonError::into_inner);
            periods.entry(period).or_default().clone()
        };
        SweepGuard {
            locks: self,
            period,
            guard: Some(lock.lock_owned().await),
        }
    }

    #[cfg(test)]
    fn tracked(&self) -> usize {
        self.periods
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

/// Releases the period lock and forgets the period once nobody else holds
/// or waits on it.
struct SweepGuard<'a> {
    locks: &'a SweepLocks,
    period: BillingPeriod,
    guard: Option<OwnedMutexGuard<()>>,
}

impl Drop for SweepGuard<'_> {
    fn drop(&mut self) {
        drop(self.guard.take());
        let mut periods = self
            .locks
            .periods
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if periods
            .get(&self.period)
            .is_some_and(|lock| Arc::strong_count(lock) == 1)
        {
            periods.remove(&self.period);
        }
    }
}

/// Fee generation, lifecycle transitions and monthly totals.
#[derive(Clone)]
pub struct BillingService {
    storage: Storage,
    subscription_service: SubscriptionService,
    sweeps: Arc<SweepLocks>,
}

impl BillingService {
    pub fn new(storage: Storage) -> Self {
        let subscription_service = SubscriptionService::new(storage.clone());
        Self {
            storage,
            subscription_service,
            sweeps: Arc::new(SweepLocks::default()),
        }
    }

    fn today() -> NaiveDate {
        Utc::now().date_naive()
    }

    /// Turns subscription links into pending fees for `period`.
    ///
    /// Links are walked in insertion order and the first link seen for an
    /// account wins; accounts that already hold a non-cancelled fee due in the
    /// period are skipped, so repeating a sweep creates nothing new.
    pub async fn generate(
        &self,
        period: BillingPeriod,
        account_id: Option<i32>,
    ) -> AppResult<GenerateFeesResponse> {
        let _sweep = self.sweeps.acquire(period).await;

        let links = self.subscription_service.list_links(account_id).await?;
        if links.is_empty() {
            return Ok(GenerateFeesResponse { created: 0 });
        }

        let plan_ids: Vec<i32> = links
            .iter()
            .map(|l| l.plan_id)
            .collect::<HashSet<_>>()
            .into_iter()
            .collect();
        let plans: HashMap<i32, plan::Model> = self
            .storage
            .run("plans.by_ids", |db| {
                plan::Entity::find()
                    .filter(plan::Column::Id.is_in(plan_ids.clone()))
                    .all(db)
            })
            .await?
            .into_iter()
            .map(|p| (p.id, p))
            .collect();

        let (start, end) = (period.first_day(), period.last_day());
        let mut billed: HashSet<i32> = self
            .storage
            .run("fees.billed_accounts", |db| {
                fee::Entity::find()
                    .filter(fee::Column::DueDate.between(start, end))
                    .filter(fee::Column::Status.ne(FeeStatus::Cancelled))
                    .filter(fee::Column::AccountId.is_not_null())
                    .all(db)
            })
            .await?
            .into_iter()
            .filter_map(|f| f.account_id)
            .collect();

        let mut created = 0u64;
        for link in links {
            let Some(plan) = plans.get(&link.plan_id).filter(|p| p.active) else {
                log::debug!(
                    "Skipping link {}: plan {} missing or inactive",
                    link.id,
                    link.plan_id
                );
                continue;
            };
            if billed.contains(&link.account_id) {
                continue;
            }

            let now = Utc::now();
            let am = fee::ActiveModel {
                account_id: Set(Some(link.account_id)),
                amount: Set(plan.price),
                due_date: Set(period.due_date(plan.due_day)),
                status: Set(FeeStatus::Pending),
                paid_at: Set(None),
                note: Set(None),
                created_at: Set(Some(now)),
                updated_at: Set(Some(now)),
                ..Default::default()
            };
            self.storage
                .run("fees.insert", |db| am.clone().insert(db))
                .await?;

            billed.insert(link.account_id);
            created += 1;
        }

        log::info!("Fee generation for {period}: {created} created");
        Ok(GenerateFeesResponse { created })
    }

    pub async fn list_fees(&self, query: &FeeQuery) -> AppResult<Vec<FeeResponse>> {
        let period = query.period()?;
        let fees = self
            .storage
            .run("fees.list", |db| {
                let mut select = fee::Entity::find();
                if let Some(status) = query.status {
                    select = select.filter(fee::Column::Status.eq(status));
                }
                if let Some(account_id) = query.account_id {
                    select = select.filter(fee::Column::AccountId.eq(account_id));
                }
                if let Some(period) = period {
                    select = select.filter(
                        fee::Column::DueDate.between(period.first_day(), period.last_day()),
                    );
                }
                select
                    .order_by_asc(fee::Column::DueDate)
                    .order_by_asc(fee::Column::Id)
                    .all(db)
            })
            .await?;
        Ok(fees.into_iter().map(FeeResponse::from).collect())
    }

    pub async fn get_fee(&self, fee_id: i32) -> AppResult<FeeResponse> {
        self.find_fee(fee_id).await.map(FeeResponse::from)
    }

    /// Direct administrative creation, outside the generation sweep.
    pub async fn create_fee(&self, req: CreateFeeRequest) -> AppResult<FeeResponse> {
        let now = Utc::now();
        let status = req.status.unwrap_or(FeeStatus::Pending);
        let paid_at = (status == FeeStatus::Paid).then_some(now);
        let am = fee::ActiveModel {
            account_id: Set(req.account_id),
            amount: Set(req.amount),
            due_date: Set(req.due_date),
            status: Set(status),
            paid_at: Set(paid_at),
            note: Set(req.note.filter(|n| !n.is_empty())),
            created_at: Set(Some(now)),
            updated_at: Set(Some(now)),
            ..Default::default()
        };
        let created = self
            .storage
            .run("fees.insert", |db| am.clone().insert(db))
            .await?;
        Ok(FeeResponse::from(created))
    }

    pub async fn update_status(
        &self,
        fee_id: i32,
        status: FeeStatus,
        note: Option<String>,
    ) -> AppResult<FeeResponse> {
        let current = self.find_fee(fee_id).await?;
        Self::check_transition(current.status, status)?;

        let paid_at = match (status, current.paid_at) {
            (FeeStatus::Paid, None) => Some(Utc::now()),
            (_, paid_at) => paid_at,
        };
        let note = match note.as_deref().filter(|n| !n.is_empty()) {
            Some(entry) => Some(append_note(current.note.as_deref(), entry)),
            None => current.note.clone(),
        };

        let mut am = current.into_active_model();
        am.status = Set(status);
        am.paid_at = Set(paid_at);
        am.note = Set(note);
        self.save(am).await.map(FeeResponse::from)
    }

    pub async fn mark_paid(
        &self,
        fee_id: i32,
        paid_at: Option<DateTime<Utc>>,
    ) -> AppResult<FeeResponse> {
        let current = self.find_fee(fee_id).await?;
        Self::check_transition(current.status, FeeStatus::Paid)?;

        let mut am = current.into_active_model();
        am.status = Set(FeeStatus::Paid);
        am.paid_at = Set(Some(paid_at.unwrap_or_else(Utc::now)));
        self.save(am).await.map(FeeResponse::from)
    }

    pub async fn cancel(&self, fee_id: i32, note: Option<String>) -> AppResult<FeeResponse> {
        self.update_status(fee_id, FeeStatus::Cancelled, note).await
    }

    /// Sets or clears the owning account; status and amount are untouched.
    pub async fn reassign_account(
        &self,
        fee_id: i32,
        account_id: Option<i32>,
    ) -> AppResult<FeeResponse> {
        let current = self.find_fee(fee_id).await?;
        let mut am = current.into_active_model();
        am.account_id = Set(account_id);
        self.save(am).await.map(FeeResponse::from)
    }

    /// Cancelled fees count toward neither figure. Sums saturate instead of
    /// overflowing.
    pub async fn totals(&self, period: BillingPeriod) -> AppResult<FeeTotalsResponse> {
        let (start, end) = (period.first_day(), period.last_day());
        let fees = self
            .storage
            .run("fees.in_period", |db| {
                fee::Entity::find()
                    .filter(fee::Column::DueDate.between(start, end))
                    .all(db)
            })
            .await?;

        let mut totals = FeeTotalsResponse {
            received: 0,
            pending_total: 0,
        };
        for f in fees {
            match f.status {
                FeeStatus::Paid => totals.received = totals.received.saturating_add(f.amount),
                s if s.is_outstanding() => {
                    totals.pending_total = totals.pending_total.saturating_add(f.amount)
                }
                _ => {}
            }
        }
        Ok(totals)
    }

    /// Moves every pending fee whose due date is before today to overdue.
    ///
    /// Scans all pending fees; fine at membership volumes, revisit with a
    /// targeted `due_date < today` query if the table grows large.
    pub async fn auto_update_overdue(&self) -> AppResult<OverdueSweepResponse> {
        let today = Self::today();
        let pending = self
            .storage
            .run("fees.pending", |db| {
                fee::Entity::find()
                    .filter(fee::Column::Status.eq(FeeStatus::Pending))
                    .all(db)
            })
            .await?;

        let mut updated = 0u64;
        for f in pending {
            if f.due_date >= today {
                continue;
            }
            let mut am = f.into_active_model();
            am.status = Set(FeeStatus::Overdue);
            self.save(am).await?;
            updated += 1;
        }

        if updated > 0 {
            log::info!("Overdue sweep: {updated} fees marked overdue");
        }
        Ok(OverdueSweepResponse { updated })
    }

    /// Marks a late pending fee overdue. The notification entry is appended to
    /// the note log whether or not the fee was actually late.
    pub async fn notify_late(&self, fee_id: i32) -> AppResult<FeeResponse> {
        let current = self.find_fee(fee_id).await?;
        let today = Self::today();
        let late = current.status == FeeStatus::Pending && current.due_date < today;
        let note = append_note(
            current.note.as_deref(),
            &format!("notified-late on {}", today.format("%Y-%m-%d")),
        );

        let mut am = current.into_active_model();
        if late {
            am.status = Set(FeeStatus::Overdue);
        }
        am.note = Set(Some(note));
        self.save(am).await.map(FeeResponse::from)
    }

    /// Appends a reminder entry regardless of the fee's status.
    pub async fn send_reminder(&self, fee_id: i32) -> AppResult<FeeResponse> {
        let current = self.find_fee(fee_id).await?;
        let note = append_note(
            current.note.as_deref(),
            &format!("reminder sent on {}", Self::today().format("%Y-%m-%d")),
        );

        let mut am = current.into_active_model();
        am.note = Set(Some(note));
        self.save(am).await.map(FeeResponse::from)
    }

    fn check_transition(from: FeeStatus, to: FeeStatus) -> AppResult<()> {
        if from.can_transition_to(to) {
            Ok(())
        } else {
            Err(AppError::InvalidTransition { from, to })
        }
    }

    async fn find_fee(&self, fee_id: i32) -> AppResult<fee::Model> {
        self.storage
            .run("fees.find", |db| fee::Entity::find_by_id(fee_id).one(db))
            .await?
            .ok_or_else(|| AppError::NotFound("Fee not found".into()))
    }

    async fn save(&self, mut am: fee::ActiveModel) -> AppResult<fee::Model> {
        am.updated_at = Set(Some(Utc::now()));
        self.storage
            .run("fees.update", |db| am.clone().update(db))
            .await
    }
}
