//! Integration tests for the permit service over the in-memory SurrealDB
//! stores.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicI64, AtomicUsize, Ordering};
use std::time::Duration;

use chrono::{DateTime, NaiveDate, NaiveTime, TimeZone, Utc};
use exitpass_core::annotator::MotiveAnnotator;
use exitpass_core::clock::Clock;
use exitpass_core::error::{ErrorKind, ExitPassError, ExitPassResult};
use exitpass_core::models::actor::{Actor, Role};
use exitpass_core::models::permit::{
    CreatePermit, ExitKind, MotiveAnalysis, PermitAction, PermitDetails, PermitRequest,
    PermitStatus, ReturnExpectation,
};
use exitpass_core::repository::PermitRepository;
use exitpass_core::views::PermitSearch;
use exitpass_db::repository::{SurrealPermitEventRepository, SurrealPermitRepository};
use exitpass_workflow::{DisabledAnnotator, PermitCommand, PermitService, WorkflowConfig};
use surrealdb::Surreal;
use surrealdb::engine::local::{Db, Mem};
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

/// Clock that advances one minute on every reading, starting at
/// 2024-05-20 08:00 UTC.
struct StepClock {
    minutes: AtomicI64,
}

impl StepClock {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            minutes: AtomicI64::new(0),
        })
    }
}

impl Clock for StepClock {
    fn now(&self) -> DateTime<Utc> {
        let offset = self.minutes.fetch_add(1, Ordering::SeqCst);
        Utc.with_ymd_and_hms(2024, 5, 20, 8, 0, 0).unwrap() + chrono::Duration::minutes(offset)
    }
}

struct FixedAnnotator {
    calls: Arc<AtomicUsize>,
}

impl MotiveAnnotator for FixedAnnotator {
    async fn classify(&self, motive: &str) -> ExitPassResult<MotiveAnalysis> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(MotiveAnalysis {
            category: "Médico".into(),
            summary: format!("Resumen: {motive}"),
            is_reasonable: true,
        })
    }
}

struct SlowAnnotator;

impl MotiveAnnotator for SlowAnnotator {
    async fn classify(&self, _motive: &str) -> ExitPassResult<MotiveAnalysis> {
        tokio::time::sleep(Duration::from_secs(3600)).await;
        Err(ExitPassError::Internal("unreachable".into()))
    }
}

/// Annotator that blocks until the test releases the gate.
struct GatedAnnotator {
    gate: Arc<tokio::sync::Semaphore>,
}

impl MotiveAnnotator for GatedAnnotator {
    async fn classify(&self, _motive: &str) -> ExitPassResult<MotiveAnalysis> {
        let _permit = self
            .gate
            .acquire()
            .await
            .map_err(|e| ExitPassError::Internal(e.to_string()))?;
        Ok(MotiveAnalysis {
            category: "Trámite".into(),
            summary: "Liberado".into(),
            is_reasonable: true,
        })
    }
}

/// Store that lets another writer commit first on the next `put`.
struct InterferingStore<F> {
    inner: SurrealPermitRepository<Db>,
    interfere: F,
    armed: Arc<AtomicBool>,
}

impl<F> PermitRepository for InterferingStore<F>
where
    F: Fn(&mut PermitRequest) + Send + Sync,
{
    async fn create(&self, input: CreatePermit) -> ExitPassResult<PermitRequest> {
        self.inner.create(input).await
    }

    async fn get_by_id(&self, id: Uuid) -> ExitPassResult<PermitRequest> {
        self.inner.get_by_id(id).await
    }

    async fn list(&self) -> ExitPassResult<Vec<PermitRequest>> {
        self.inner.list().await
    }

    async fn put(&self, record: &PermitRequest) -> ExitPassResult<PermitRequest> {
        if self.armed.swap(false, Ordering::SeqCst) {
            let mut other = self.inner.get_by_id(record.id).await?;
            (self.interfere)(&mut other);
            self.inner.put(&other).await?;
        }
        self.inner.put(record).await
    }
}

async fn setup_db() -> Surreal<Db> {
    let db = Surreal::new::<Mem>(()).await.unwrap();
    db.use_ns("test").use_db("test").await.unwrap();
    exitpass_db::run_migrations(&db).await.unwrap();
    db
}

type Service<A> =
    PermitService<SurrealPermitRepository<Db>, SurrealPermitEventRepository<Db>, A>;

fn no_annotation() -> WorkflowConfig {
    WorkflowConfig {
        annotate_motives: false,
        ..Default::default()
    }
}

async fn service_with<A: MotiveAnnotator + 'static>(
    annotator: A,
    config: WorkflowConfig,
) -> Service<A> {
    let db = setup_db().await;
    PermitService::new(
        SurrealPermitRepository::new(db.clone()),
        SurrealPermitEventRepository::new(db),
        annotator,
        config,
    )
    .with_clock(StepClock::new())
}

async fn service() -> Service<DisabledAnnotator> {
    service_with(DisabledAnnotator, no_annotation()).await
}

fn juan() -> Actor {
    Actor::new("Juan", Role::Employee, Some("Producción"))
}

fn marta() -> Actor {
    Actor::new("Marta", Role::Manager, Some("Producción"))
}

fn hr() -> Actor {
    Actor::new("Admin RRHH", Role::HumanResources, Some("RRHH"))
}

fn guard() -> Actor {
    Actor::new("Pedro Vigilante", Role::Security, Some("Portería"))
}

fn details(date: &str, kind: ExitKind, ret: ReturnExpectation) -> PermitDetails {
    PermitDetails {
        date: date.parse().unwrap(),
        time: NaiveTime::from_hms_opt(14, 30, 0).unwrap(),
        exit_kind: kind,
        return_expectation: ret,
        motive: "Turno médico oftalmología en clínica céntrica.".into(),
        will_present_proof: true,
    }
}

fn planned() -> PermitDetails {
    details("2024-05-20", ExitKind::Planned, ReturnExpectation::WillReturn)
}

fn kind_of<T: std::fmt::Debug>(result: ExitPassResult<T>) -> ErrorKind {
    result.unwrap_err().kind()
}

// ---------------------------------------------------------------------------
// Creation
// ---------------------------------------------------------------------------

#[tokio::test]
async fn create_starts_pending_manager_with_no_stamps() {
    let svc = service().await;
    let employee = juan();

    let permit = svc.create_request(&employee, planned()).await.unwrap();
    assert_eq!(permit.status, PermitStatus::PendingManager);
    assert_eq!(permit.employee_id, employee.id);
    assert_eq!(permit.employee_name, "Juan");
    assert_eq!(permit.sector, "Producción");
    assert!(permit.boss_approval_date.is_none());
    assert!(permit.hr_approval_date.is_none());
    assert!(permit.security_exit_date.is_none());
    assert!(permit.security_return_date.is_none());
}

#[tokio::test]
async fn unplanned_exit_dated_before_today_is_rejected() {
    let svc = service().await;
    let employee = juan();

    let past = details("2024-05-19", ExitKind::Unplanned, ReturnExpectation::WillReturn);
    assert_eq!(
        kind_of(svc.create_request(&employee, past).await),
        ErrorKind::Validation
    );
    assert!(svc.dashboard(&employee).await.unwrap().is_empty());

    let today = details("2024-05-20", ExitKind::Unplanned, ReturnExpectation::WillReturn);
    let permit = svc.create_request(&employee, today).await.unwrap();
    assert_eq!(permit.status, PermitStatus::PendingManager);

    // Planned exits may be recorded after the fact.
    let backdated = details("2024-05-01", ExitKind::Planned, ReturnExpectation::WillReturn);
    svc.create_request(&employee, backdated).await.unwrap();
}

#[tokio::test]
async fn only_employees_create_and_unassigned_sector_is_placeholder() {
    let svc = service().await;
    assert_eq!(
        kind_of(svc.create_request(&marta(), planned()).await),
        ErrorKind::Unauthorized
    );

    let loner = Actor::new("Sin Sector", Role::Employee, None);
    let permit = svc.create_request(&loner, planned()).await.unwrap();
    assert_eq!(permit.sector, "N/A");

    let mut blank = planned();
    blank.motive = "   ".into();
    assert_eq!(
        kind_of(svc.create_request(&juan(), blank).await),
        ErrorKind::Validation
    );
}

// ---------------------------------------------------------------------------
// Transitions
// ---------------------------------------------------------------------------

#[tokio::test]
async fn manager_approval_scenario() {
    let svc = service().await;
    let permit = svc.create_request(&juan(), planned()).await.unwrap();
    assert_eq!(
        permit.date,
        NaiveDate::from_ymd_opt(2024, 5, 20).unwrap()
    );

    let approved = svc.approve(&marta(), permit.id).await.unwrap();
    assert_eq!(approved.status, PermitStatus::PendingHR);
    assert!(approved.boss_approval_date.is_some());
    assert!(approved.hr_approval_date.is_none());
}

#[tokio::test]
async fn full_sequence_stamps_each_date_once_in_order() {
    let svc = service().await;
    let id = svc.create_request(&juan(), planned()).await.unwrap().id;

    svc.approve(&marta(), id).await.unwrap();
    svc.approve(&hr(), id).await.unwrap();
    svc.record_exit(&guard(), id).await.unwrap();
    let done = svc.record_return(&guard(), id).await.unwrap();

    assert_eq!(done.status, PermitStatus::Returned);
    let boss = done.boss_approval_date.unwrap();
    let hr_date = done.hr_approval_date.unwrap();
    let exit = done.security_exit_date.unwrap();
    let ret = done.security_return_date.unwrap();
    assert!(boss < hr_date && hr_date < exit && exit < ret);

    for action in [
        svc.approve(&hr(), id).await,
        svc.record_exit(&guard(), id).await,
        svc.record_return(&guard(), id).await,
    ] {
        assert_eq!(kind_of(action), ErrorKind::InvalidTransition);
    }
    let unchanged = svc.get(&hr(), id).await.unwrap();
    assert_eq!(unchanged.security_return_date, Some(ret));
    assert_eq!(unchanged.version, done.version);
}

#[tokio::test]
async fn manager_of_other_sector_cannot_act() {
    let svc = service().await;
    let id = svc.create_request(&juan(), planned()).await.unwrap().id;
    let luis = Actor::new("Luis", Role::Manager, Some("Mantenimiento"));

    assert_eq!(kind_of(svc.approve(&luis, id).await), ErrorKind::Unauthorized);
    assert_eq!(kind_of(svc.reject(&luis, id).await), ErrorKind::Unauthorized);
    assert_eq!(kind_of(svc.approve(&hr(), id).await), ErrorKind::Unauthorized);

    let stored = svc.get(&marta(), id).await.unwrap();
    assert_eq!(stored.status, PermitStatus::PendingManager);
    assert_eq!(stored.version, 1);
}

#[tokio::test]
async fn will_not_return_is_terminal_after_exit() {
    let svc = service().await;
    let one_way = details("2024-05-20", ExitKind::Planned, ReturnExpectation::WillNotReturn);
    let id = svc.create_request(&juan(), one_way).await.unwrap().id;

    svc.approve(&marta(), id).await.unwrap();
    svc.approve(&hr(), id).await.unwrap();
    let exited = svc.record_exit(&guard(), id).await.unwrap();
    assert_eq!(exited.status, PermitStatus::Exited);

    assert_eq!(
        kind_of(svc.record_return(&guard(), id).await),
        ErrorKind::InvalidTransition
    );
    assert!(svc.available_actions(&guard(), id).await.unwrap().is_empty());
}

#[tokio::test]
async fn rejections_are_terminal() {
    let svc = service().await;

    let first = svc.create_request(&juan(), planned()).await.unwrap().id;
    let rejected = svc.reject(&marta(), first).await.unwrap();
    assert_eq!(rejected.status, PermitStatus::RejectedByManager);
    assert!(rejected.boss_approval_date.is_none());

    let second = svc.create_request(&juan(), planned()).await.unwrap().id;
    svc.approve(&marta(), second).await.unwrap();
    let rejected = svc.reject(&hr(), second).await.unwrap();
    assert_eq!(rejected.status, PermitStatus::RejectedByHR);
    assert!(rejected.hr_approval_date.is_none());

    for id in [first, second] {
        assert_eq!(kind_of(svc.approve(&marta(), id).await), ErrorKind::InvalidTransition);
        assert_eq!(kind_of(svc.approve(&hr(), id).await), ErrorKind::InvalidTransition);
        assert_eq!(kind_of(svc.reject(&hr(), id).await), ErrorKind::InvalidTransition);
        assert_eq!(
            kind_of(svc.record_exit(&guard(), id).await),
            ErrorKind::InvalidTransition
        );
    }
}

#[tokio::test]
async fn unknown_permit_is_not_found() {
    let svc = service().await;
    let missing = Uuid::new_v4();
    assert_eq!(kind_of(svc.approve(&marta(), missing).await), ErrorKind::NotFound);
    assert_eq!(
        kind_of(svc.attach_proof(&juan(), missing, "blob://x".into(), None).await),
        ErrorKind::NotFound
    );
    assert_eq!(kind_of(svc.history(&hr(), missing).await), ErrorKind::NotFound);
}

// ---------------------------------------------------------------------------
// Proof
// ---------------------------------------------------------------------------

#[tokio::test]
async fn attach_proof_overwrites_and_keeps_status() {
    let svc = service().await;
    let employee = juan();
    let id = svc.create_request(&employee, planned()).await.unwrap().id;

    svc.attach_proof(&employee, id, "blob://certificados/1".into(), None)
        .await
        .unwrap();
    let second = svc
        .attach_proof(
            &employee,
            id,
            "blob://certificados/2".into(),
            Some("application/pdf".into()),
        )
        .await
        .unwrap();

    assert_eq!(second.status, PermitStatus::PendingManager);
    let proof = second.proof_artifact.unwrap();
    assert_eq!(proof.reference, "blob://certificados/2");
    assert_eq!(proof.content_type.as_deref(), Some("application/pdf"));

    assert_eq!(
        kind_of(svc.attach_proof(&marta(), id, "blob://x".into(), None).await),
        ErrorKind::Unauthorized
    );
    assert_eq!(
        kind_of(svc.attach_proof(&employee, id, " ".into(), None).await),
        ErrorKind::Validation
    );
}

#[tokio::test]
async fn proof_prompt_appears_after_exit() {
    let svc = service().await;
    let employee = juan();
    let id = svc.create_request(&employee, planned()).await.unwrap().id;
    assert!(svc.available_actions(&employee, id).await.unwrap().is_empty());
    assert_eq!(
        svc.available_actions(&marta(), id).await.unwrap(),
        vec![PermitAction::Approve, PermitAction::Reject]
    );

    svc.approve(&marta(), id).await.unwrap();
    svc.approve(&hr(), id).await.unwrap();
    svc.record_exit(&guard(), id).await.unwrap();
    assert_eq!(
        svc.available_actions(&employee, id).await.unwrap(),
        vec![PermitAction::AttachProof]
    );

    svc.attach_proof(&employee, id, "blob://certificados/1".into(), None)
        .await
        .unwrap();
    assert!(svc.available_actions(&employee, id).await.unwrap().is_empty());
}

// ---------------------------------------------------------------------------
// Concurrency
// ---------------------------------------------------------------------------

#[tokio::test]
async fn racing_manager_actions_commit_exactly_one() {
    let svc = service().await;
    let id = svc.create_request(&juan(), planned()).await.unwrap().id;
    let manager = marta();

    let (approve, reject) = tokio::join!(svc.approve(&manager, id), svc.reject(&manager, id));

    let stored = svc.get(&manager, id).await.unwrap();
    match (approve, reject) {
        (Ok(won), Err(lost)) => {
            assert_eq!(won.status, PermitStatus::PendingHR);
            assert!(matches!(
                lost.kind(),
                ErrorKind::InvalidTransition | ErrorKind::Unauthorized
            ));
            assert_eq!(stored.status, PermitStatus::PendingHR);
        }
        (Err(lost), Ok(won)) => {
            assert_eq!(won.status, PermitStatus::RejectedByManager);
            assert_eq!(lost.kind(), ErrorKind::InvalidTransition);
            assert_eq!(stored.status, PermitStatus::RejectedByManager);
        }
        other => panic!("exactly one action must commit, got {other:?}"),
    }
    assert_eq!(stored.version, 2);
}

#[tokio::test]
async fn transition_against_moved_status_is_invalid() {
    let db = setup_db().await;
    let armed = Arc::new(AtomicBool::new(false));
    let store = InterferingStore {
        inner: SurrealPermitRepository::new(db.clone()),
        interfere: |p: &mut PermitRequest| p.status = PermitStatus::RejectedByManager,
        armed: Arc::clone(&armed),
    };
    let svc = PermitService::new(
        store,
        SurrealPermitEventRepository::new(db.clone()),
        DisabledAnnotator,
        no_annotation(),
    )
    .with_clock(StepClock::new());

    let id = svc.create_request(&juan(), planned()).await.unwrap().id;
    let reader = SurrealPermitRepository::new(db);

    armed.store(true, Ordering::SeqCst);
    let err = svc.approve(&marta(), id).await.unwrap_err();
    assert!(matches!(
        err,
        ExitPassError::InvalidTransition {
            action: PermitAction::Approve,
            status: PermitStatus::RejectedByManager,
        }
    ));

    let stored = reader.get_by_id(id).await.unwrap();
    assert_eq!(stored.status, PermitStatus::RejectedByManager);
    assert!(stored.boss_approval_date.is_none());
}

#[tokio::test]
async fn transition_retries_after_concurrent_annotation_write() {
    let db = setup_db().await;
    let armed = Arc::new(AtomicBool::new(false));
    let store = InterferingStore {
        inner: SurrealPermitRepository::new(db.clone()),
        interfere: |p: &mut PermitRequest| {
            p.motive_analysis = Some(MotiveAnalysis {
                category: "Médico".into(),
                summary: "Consulta".into(),
                is_reasonable: true,
            })
        },
        armed: Arc::clone(&armed),
    };
    let svc = PermitService::new(
        store,
        SurrealPermitEventRepository::new(db.clone()),
        DisabledAnnotator,
        no_annotation(),
    )
    .with_clock(StepClock::new());

    let id = svc.create_request(&juan(), planned()).await.unwrap().id;
    let reader = SurrealPermitRepository::new(db);

    armed.store(true, Ordering::SeqCst);
    let approved = svc.approve(&marta(), id).await.unwrap();
    assert_eq!(approved.status, PermitStatus::PendingHR);
    assert_eq!(approved.version, 3);
    assert_eq!(approved.motive_analysis.unwrap().category, "Médico");

    let stored = reader.get_by_id(id).await.unwrap();
    assert_eq!(stored.version, 3);
    assert!(stored.boss_approval_date.is_some());
}

// ---------------------------------------------------------------------------
// Annotation
// ---------------------------------------------------------------------------

#[tokio::test]
async fn annotation_is_merged_without_touching_status() {
    let calls = Arc::new(AtomicUsize::new(0));
    let svc = service_with(
        FixedAnnotator {
            calls: Arc::clone(&calls),
        },
        WorkflowConfig::default(),
    )
    .await;

    let created = svc.create_request(&juan(), planned()).await.unwrap();
    assert!(created.motive_analysis.is_none());
    svc.approve(&marta(), created.id).await.unwrap();

    svc.wait_for_annotations().await;
    let stored = svc.get(&hr(), created.id).await.unwrap();
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(stored.status, PermitStatus::PendingHR);
    assert!(stored.boss_approval_date.is_some());
    let analysis = stored.motive_analysis.unwrap();
    assert_eq!(analysis.category, "Médico");
    assert!(analysis.is_reasonable);
}

#[tokio::test]
async fn annotator_failure_is_swallowed() {
    let svc = service_with(DisabledAnnotator, WorkflowConfig::default()).await;
    let created = svc.create_request(&juan(), planned()).await.unwrap();

    svc.wait_for_annotations().await;
    let stored = svc.get(&hr(), created.id).await.unwrap();
    assert_eq!(stored.status, PermitStatus::PendingManager);
    assert!(stored.motive_analysis.is_none());
}

#[tokio::test]
async fn annotator_timeout_is_swallowed() {
    let config = WorkflowConfig {
        annotation_timeout_secs: 0,
        ..Default::default()
    };
    let svc = service_with(SlowAnnotator, config).await;
    let created = svc.create_request(&juan(), planned()).await.unwrap();

    svc.wait_for_annotations().await;
    let stored = svc.get(&hr(), created.id).await.unwrap();
    assert!(stored.motive_analysis.is_none());
    assert_eq!(stored.version, 1);
}

#[tokio::test]
async fn waiting_for_annotations_does_not_block_creation() {
    let gate = Arc::new(tokio::sync::Semaphore::new(0));
    let config = WorkflowConfig {
        annotation_timeout_secs: 60,
        ..Default::default()
    };
    let svc = Arc::new(
        service_with(
            GatedAnnotator {
                gate: Arc::clone(&gate),
            },
            config,
        )
        .await,
    );
    let first = svc.create_request(&juan(), planned()).await.unwrap();

    let waiter = tokio::spawn({
        let svc = Arc::clone(&svc);
        async move { svc.wait_for_annotations().await }
    });
    tokio::task::yield_now().await;

    let second = tokio::time::timeout(
        Duration::from_secs(5),
        svc.create_request(&juan(), planned()),
    )
    .await
    .expect("creation stalled behind the annotation waiter")
    .unwrap();
    assert_ne!(first.id, second.id);

    gate.add_permits(2);
    waiter.await.unwrap();
    svc.wait_for_annotations().await;

    for id in [first.id, second.id] {
        let stored = svc.get(&hr(), id).await.unwrap();
        assert_eq!(stored.motive_analysis.unwrap().category, "Trámite");
    }
}

#[tokio::test]
async fn annotation_can_be_switched_off() {
    let calls = Arc::new(AtomicUsize::new(0));
    let svc = service_with(
        FixedAnnotator {
            calls: Arc::clone(&calls),
        },
        no_annotation(),
    )
    .await;

    svc.create_request(&juan(), planned()).await.unwrap();
    svc.wait_for_annotations().await;
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

// ---------------------------------------------------------------------------
// Views, search and history
// ---------------------------------------------------------------------------

#[tokio::test]
async fn dashboards_follow_role_views() {
    let svc = service().await;
    let employee = juan();
    let carlos = Actor::new("Carlos", Role::Employee, Some("Mantenimiento"));

    let pending = svc.create_request(&employee, planned()).await.unwrap().id;
    let approved = svc.create_request(&employee, planned()).await.unwrap().id;
    svc.create_request(&carlos, planned()).await.unwrap();
    svc.approve(&marta(), approved).await.unwrap();
    svc.approve(&hr(), approved).await.unwrap();

    assert_eq!(svc.dashboard(&employee).await.unwrap().len(), 2);
    assert_eq!(svc.dashboard(&carlos).await.unwrap().len(), 1);

    let manager_queue = svc.dashboard(&marta()).await.unwrap();
    assert_eq!(manager_queue.len(), 1);
    assert_eq!(manager_queue[0].id, pending);

    let hr_queue = svc.dashboard(&hr()).await.unwrap();
    assert_eq!(hr_queue.len(), 1);
    assert_eq!(hr_queue[0].id, approved);

    let gate = svc.dashboard(&guard()).await.unwrap();
    assert_eq!(gate.len(), 1);
    assert_eq!(gate[0].status, PermitStatus::Approved);

    let admin = Actor::new("Root", Role::Admin, None);
    assert_eq!(svc.dashboard(&admin).await.unwrap().len(), 3);
}

#[tokio::test]
async fn search_is_restricted_and_filters_history() {
    let svc = service().await;
    let employee = juan();
    let id = svc.create_request(&employee, planned()).await.unwrap().id;
    svc.create_request(
        &employee,
        details("2024-06-01", ExitKind::Planned, ReturnExpectation::WillReturn),
    )
    .await
    .unwrap();
    svc.reject(&marta(), id).await.unwrap();

    assert_eq!(
        kind_of(svc.search(&employee, &PermitSearch::default()).await),
        ErrorKind::Unauthorized
    );

    let all = svc.search(&guard(), &PermitSearch::default()).await.unwrap();
    assert_eq!(all.len(), 2);

    let may = PermitSearch {
        date_from: Some("2024-05-01".parse().unwrap()),
        date_to: Some("2024-05-20".parse().unwrap()),
        ..Default::default()
    };
    let found = svc.search(&hr(), &may).await.unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].status, PermitStatus::RejectedByManager);

    let by_id = PermitSearch {
        employee_id: Some(employee.id.to_string()[..8].to_string()),
        status: Some(PermitStatus::PendingManager),
        ..Default::default()
    };
    let found = svc.search(&guard(), &by_id).await.unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].date.to_string(), "2024-06-01");
}

#[tokio::test]
async fn available_actions_require_view_access() {
    let svc = service().await;
    let employee = juan();
    let id = svc.create_request(&employee, planned()).await.unwrap().id;

    let colleague = Actor::new("Carlos", Role::Employee, Some("Producción"));
    assert_eq!(
        kind_of(svc.available_actions(&colleague, id).await),
        ErrorKind::Unauthorized
    );

    assert!(svc.available_actions(&employee, id).await.unwrap().is_empty());
    assert_eq!(
        svc.available_actions(&marta(), id).await.unwrap(),
        vec![PermitAction::Approve, PermitAction::Reject]
    );
}

#[tokio::test]
async fn history_attributes_every_committed_action() {
    let svc = service().await;
    let employee = juan();
    let manager = marta();
    let id = svc.create_request(&employee, planned()).await.unwrap().id;
    svc.approve(&manager, id).await.unwrap();
    svc.reject(&hr(), id).await.unwrap();
    // Failed attempts leave no trace.
    let _ = svc.record_exit(&guard(), id).await;

    let history = svc.history(&employee, id).await.unwrap();
    let actions: Vec<PermitAction> = history.iter().map(|e| e.action).collect();
    assert_eq!(
        actions,
        vec![PermitAction::Create, PermitAction::Approve, PermitAction::Reject]
    );
    assert_eq!(history[0].from_status, None);
    assert_eq!(history[1].actor_id, manager.id);
    assert_eq!(history[1].from_status, Some(PermitStatus::PendingManager));
    assert_eq!(history[2].actor_role, Role::HumanResources);
    assert_eq!(history[2].to_status, PermitStatus::RejectedByHR);
    assert!(history.windows(2).all(|w| w[0].occurred_at < w[1].occurred_at));

    let colleague = Actor::new("Carlos", Role::Employee, Some("Producción"));
    assert_eq!(
        kind_of(svc.history(&colleague, id).await),
        ErrorKind::Unauthorized
    );
}

// ---------------------------------------------------------------------------
// Command model
// ---------------------------------------------------------------------------

#[tokio::test]
async fn commands_drive_the_same_operations() {
    let svc = service().await;
    let employee = juan();

    let created = svc
        .execute(PermitCommand::Create {
            actor: employee.clone(),
            details: planned(),
        })
        .await
        .unwrap();
    let approved = svc
        .execute(PermitCommand::Approve {
            actor: marta(),
            permit_id: created.id,
        })
        .await
        .unwrap();
    assert_eq!(approved.status, PermitStatus::PendingHR);

    let err = svc
        .execute(PermitCommand::RecordExit {
            actor: guard(),
            permit_id: created.id,
        })
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidTransition);

    let proof = svc
        .execute(PermitCommand::AttachProof {
            actor: employee,
            permit_id: created.id,
            reference: "blob://certificados/9".into(),
            content_type: None,
        })
        .await
        .unwrap();
    assert!(proof.proof_artifact.is_some());
}
