use backend::domain::a001_consumer::{repository, service};
use backend::shared::data::db;
use backend::system::agents::service as agent_service;
use backend::system::initialization;
use contracts::domain::a001_consumer::aggregate::{
    BillFileDto, RegisterConsumerDto, WorkListItemDto,
};
use contracts::domain::common::WorkflowError;
use contracts::enums::{ConsumerStatus, DashboardTab, PaymentType, Role, WorkPriority};
use contracts::system::agents::CreateAgentDto;
use contracts::system::auth::Session;
use rust_decimal::Decimal;

fn register_dto(consumer_number: &str, name: &str) -> RegisterConsumerDto {
    RegisterConsumerDto {
        consumer_number: consumer_number.to_string(),
        name: name.to_string(),
        email: "consumer@example.com".to_string(),
        phone: "9876543210".to_string(),
        address: "Nagpur, MH".to_string(),
        bill_files: vec![BillFileDto {
            file_name: "bill_mar.pdf".to_string(),
            month: "March".to_string(),
            year: 2026,
            download_url: "/api/files/download/bill_mar.pdf".to_string(),
        }],
        bill_details_excel: Some("/api/files/download/bills.xlsx".to_string()),
        assigned_to: None,
    }
}

/// Full pipeline scenario against a throwaway sqlite file.
///
/// Single test function: the crate keeps one global connection, so all
/// storage assertions share one runtime.
#[tokio::test]
async fn full_pipeline_flow() {
    let db_path = std::env::temp_dir().join(format!(
        "workflow_test_{}.db",
        uuid::Uuid::new_v4().simple()
    ));
    db::initialize_database(db_path.to_str())
        .await
        .expect("database init");

    let admin = Session::new("agent-admin", "Asha Admin", Role::Admin);
    let evaluator = Session::new("agent-eval", "Ravi Evaluator", Role::Evaluator);
    let proposal_maker = Session::new("agent-prop", "Meera Proposals", Role::ProposalMaker);
    let sales = Session::new("agent-sales", "Kiran Sales", Role::Sales);

    // --- Registration ---
    let consumer = service::register(&evaluator, register_dto("100123456789", "First Consumer"))
        .await
        .expect("registration");
    let consumer_id = consumer.to_string_id();

    assert_eq!(consumer.status, ConsumerStatus::EvaluationPending);
    assert_eq!(consumer.metadata.version, 0);
    assert_eq!(consumer.bill_files.len(), 1);
    assert_eq!(consumer.notes.len(), 1);
    assert_eq!(consumer.notes[0].action.as_deref(), Some("Registration"));
    assert_eq!(consumer.registered_by, "agent-eval");

    let detail = service::get(&consumer_id).await.expect("detail");
    assert_eq!(detail.audit_trail.len(), 1);
    assert_eq!(detail.audit_trail[0].action, "Consumer Registered");

    // Duplicate consumer number is rejected
    let err = service::register(&evaluator, register_dto("100123456789", "Duplicate"))
        .await
        .unwrap_err();
    assert!(matches!(err, WorkflowError::Validation(_)));

    // --- Status legality ---
    let err = service::apply_action(&admin, &consumer_id, "send_proposal", None)
        .await
        .unwrap_err();
    assert!(matches!(err, WorkflowError::IllegalTransition { .. }));

    let err = service::apply_action(&admin, &consumer_id, "definitely_not_an_action", None)
        .await
        .unwrap_err();
    assert!(matches!(err, WorkflowError::Validation(_)));

    // --- Evaluation stage ---
    let actions = service::available_actions(&evaluator, &consumer_id)
        .await
        .expect("actions");
    let codes: Vec<&str> = actions.iter().map(|a| a.code()).collect();
    assert!(codes.contains(&"complete_evaluation"));
    assert!(!codes.contains(&"send_proposal"));

    let consumer = service::attach_evaluation(
        &evaluator,
        &consumer_id,
        "/api/files/download/evaluation.xlsx",
    )
    .await
    .expect("attach evaluation");
    assert_eq!(consumer.status, ConsumerStatus::EvaluationDone);
    assert_eq!(
        consumer.evaluation_sheet.as_deref(),
        Some("/api/files/download/evaluation.xlsx")
    );
    assert_eq!(consumer.evaluation_uploaded_by.as_deref(), Some("agent-eval"));
    assert_eq!(consumer.metadata.version, 1);

    let consumer = service::apply_action(&evaluator, &consumer_id, "send_proposal", None)
        .await
        .expect("send proposal");
    assert_eq!(consumer.status, ConsumerStatus::ProposalPending);
    let last_note = consumer.notes.last().unwrap();
    assert_eq!(last_note.text, "Sent for Proposal");
    assert_eq!(last_note.action.as_deref(), Some("Sent for Proposal"));

    // --- Role gating ---
    let err = service::apply_action(&sales, &consumer_id, "complete_proposal", None)
        .await
        .unwrap_err();
    assert!(matches!(err, WorkflowError::ActionNotAvailable { .. }));

    // --- Proposal stage ---
    let consumer = service::attach_proposal(
        &proposal_maker,
        &consumer_id,
        "/api/files/download/proposal.xlsx",
    )
    .await
    .expect("attach proposal");
    assert_eq!(consumer.status, ConsumerStatus::ProposalDone);
    assert_eq!(
        consumer.proposal_sheet.as_deref(),
        Some("/api/files/download/proposal.xlsx")
    );

    // --- Payment enablement (degenerate transition) ---
    let version_before = consumer.metadata.version;
    let consumer = service::enable_payment(
        &proposal_maker,
        &consumer_id,
        Decimal::from(12000),
        PaymentType::Installment,
        Some(3),
    )
    .await
    .expect("enable payment");
    assert_eq!(consumer.status, ConsumerStatus::ProposalDone);
    assert_eq!(consumer.metadata.version, version_before + 1);
    let payment = consumer.payment.clone().expect("payment attached");
    assert_eq!(payment.service_fee, Decimal::from(12000));
    assert!(!payment.is_paid());
    assert_eq!(
        payment
            .installment_plan
            .as_ref()
            .unwrap()
            .amount_per_installment,
        Decimal::from(4000)
    );
    let last_note = consumer.notes.last().unwrap();
    assert_eq!(last_note.action.as_deref(), Some("Payment Enabled"));

    // Paid is only reachable out of the sales-reply family
    let err = service::mark_paid(&sales, &consumer_id, "TXN-1", "2026-08-01", None)
        .await
        .unwrap_err();
    assert!(matches!(err, WorkflowError::IllegalTransition { .. }));

    // --- Sales stage ---
    let consumer = service::apply_action(
        &proposal_maker,
        &consumer_id,
        "forward_proposal",
        Some("Forwarding with the revised quote"),
    )
    .await
    .expect("forward proposal");
    assert_eq!(consumer.status, ConsumerStatus::ForwardProposal);
    // Actor-supplied text rides the transition note, the label stays
    let last_note = consumer.notes.last().unwrap();
    assert_eq!(last_note.text, "Forwarding with the revised quote");
    assert_eq!(last_note.action.as_deref(), Some("Forwarded Proposal to Sales"));

    // The consumer's reply arrives out of band; store it directly
    let patch = repository::ParentPatch {
        status: Some(ConsumerStatus::SalesReply),
        ..Default::default()
    };
    repository::apply_transition(&consumer_id, consumer.metadata.version, &patch, None, None)
        .await
        .expect("store sales reply");

    let consumer = service::mark_paid(
        &sales,
        &consumer_id,
        "TXN-42",
        "2026-08-20",
        Some("/api/files/download/receipt.pdf".to_string()),
    )
    .await
    .expect("mark paid");
    assert_eq!(consumer.status, ConsumerStatus::Paid);
    let payment = consumer.payment.clone().unwrap();
    assert!(payment.is_paid());
    assert_eq!(payment.transaction_id.as_deref(), Some("TXN-42"));
    assert_eq!(payment.paid_by.as_deref(), Some("agent-sales"));
    assert_eq!(
        payment.receipt_url.as_deref(),
        Some("/api/files/download/receipt.pdf")
    );
    let last_note = consumer.notes.last().unwrap();
    assert_eq!(last_note.text, "Payment received - Transaction ID: TXN-42");

    // --- Journal: free comments don't bump the version ---
    let version_before = consumer.metadata.version;
    let notes_before = consumer.notes.len();
    let consumer = service::add_comment(&sales, &consumer_id, "Customer confirmed by phone")
        .await
        .expect("comment");
    assert_eq!(consumer.notes.len(), notes_before + 1);
    assert_eq!(consumer.metadata.version, version_before);
    assert!(consumer.notes.last().unwrap().action.is_none());

    let err = service::add_comment(&sales, &consumer_id, "   ").await.unwrap_err();
    assert!(matches!(err, WorkflowError::Validation(_)));

    // --- Work list replacement ---
    let consumer = service::save_work_list(
        &admin,
        &consumer_id,
        vec![
            WorkListItemDto {
                id: None,
                description: "Verify meter readings".to_string(),
                category: "evaluation".to_string(),
                priority: WorkPriority::High,
                completed: true,
            },
            WorkListItemDto {
                id: None,
                description: "Collect signed contract".to_string(),
                category: "sales".to_string(),
                priority: WorkPriority::Medium,
                completed: false,
            },
        ],
    )
    .await
    .expect("work list");
    assert_eq!(consumer.work_list.len(), 2);
    assert!(consumer.work_list[0].completed_at.is_some());
    assert!(consumer.work_list[1].completed_at.is_none());

    // --- Inactive toggle on a second consumer ---
    let second = service::register(&admin, register_dto("100999999999", "Second Consumer"))
        .await
        .expect("second registration");
    let second_id = second.to_string_id();

    let second = service::apply_action(&admin, &second_id, "mark_inactive", None)
        .await
        .expect("mark inactive");
    assert_eq!(second.status, ConsumerStatus::Inactive);
    assert_eq!(
        second.notes.last().unwrap().text,
        "Marked as Inactive"
    );

    let second = service::apply_action(&admin, &second_id, "mark_inactive", None)
        .await
        .expect("toggle back");
    assert_eq!(second.status, ConsumerStatus::EvaluationPending);
    assert_eq!(second.notes.last().unwrap().text, "Marked as Active");

    let second = service::apply_action(&admin, &second_id, "next_month", None)
        .await
        .expect("next month");
    assert_eq!(second.status, ConsumerStatus::NextMonthProspect);

    // --- Optimistic locking ---
    let stale_patch = repository::ParentPatch {
        status: Some(ConsumerStatus::Inactive),
        ..Default::default()
    };
    let err = repository::apply_transition(&second_id, 0, &stale_patch, None, None)
        .await
        .unwrap_err();
    assert_eq!(err, WorkflowError::ConcurrentModification);

    let err = repository::apply_transition("no-such-id", 0, &stale_patch, None, None)
        .await
        .unwrap_err();
    assert!(matches!(err, WorkflowError::NotFound(_)));

    // --- Dashboard queries ---
    let sort = repository::ConsumerSort::default();
    let all = service::list(None, None, sort).await.expect("list all");
    assert_eq!(all.len(), 2);
    // Sorted by last_updated, newest first
    assert!(all[0].last_updated() >= all[1].last_updated());

    let by_name = service::list(None, None, repository::ConsumerSort::Name)
        .await
        .expect("list by name");
    assert_eq!(by_name[0].name, "First Consumer");
    assert_eq!(by_name[1].name, "Second Consumer");

    let paid = service::list(Some(DashboardTab::Paid), None, sort)
        .await
        .expect("paid tab");
    assert_eq!(paid.len(), 1);
    assert_eq!(paid[0].status, ConsumerStatus::Paid);

    let active = service::list(Some(DashboardTab::Active), None, sort)
        .await
        .expect("active tab");
    assert!(active.is_empty());

    let found = service::list(None, Some("100999"), sort)
        .await
        .expect("search");
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].consumer_number, "100999999999");

    // LIKE metacharacters in the search term match literally, not as wildcards
    let wild = service::list(None, Some("%"), sort)
        .await
        .expect("percent search");
    assert!(wild.is_empty());
    let wild = service::list(None, Some("_"), sort)
        .await
        .expect("underscore search");
    assert!(wild.is_empty());

    let csv_text = service::export_csv(None, None, sort)
        .await
        .expect("csv export");
    let lines: Vec<&str> = csv_text.lines().collect();
    assert_eq!(lines.len(), 3);
    assert!(lines[0].starts_with("Consumer Number"));
    assert!(csv_text.contains("100123456789"));

    // --- Concurrent orchestrator writers: exactly one wins ---
    let third = service::register(&admin, register_dto("100555555555", "Third Consumer"))
        .await
        .expect("third registration");
    let third_id = third.to_string_id();
    service::attach_evaluation(&evaluator, &third_id, "/api/files/download/eval3.xlsx")
        .await
        .expect("third evaluation");

    let (first_try, second_try) = tokio::join!(
        service::apply_action(&evaluator, &third_id, "send_proposal", None),
        service::apply_action(&evaluator, &third_id, "send_proposal", None),
    );
    assert_eq!(
        first_try.is_ok() as usize + second_try.is_ok() as usize,
        1,
        "exactly one of two identical transitions may commit"
    );
    let loser = if first_try.is_err() {
        first_try.unwrap_err()
    } else {
        second_try.unwrap_err()
    };
    // The loser either hit the version guard or re-read the already-moved status
    assert!(matches!(
        loser,
        WorkflowError::ConcurrentModification | WorkflowError::IllegalTransition { .. }
    ));

    let third = service::get(&third_id).await.expect("third detail").consumer;
    assert_eq!(third.status, ConsumerStatus::ProposalPending);
    let transition_notes = third
        .notes
        .iter()
        .filter(|n| n.action.as_deref() == Some("Sent for Proposal"))
        .count();
    assert_eq!(transition_notes, 1);

    // --- Agents and credentials ---
    initialization::ensure_admin_agent_exists()
        .await
        .expect("admin bootstrap");

    let agent_id = agent_service::create(
        CreateAgentDto {
            name: "Kiran Sales".to_string(),
            email: "kiran@example.com".to_string(),
            password: "s3cret-pass".to_string(),
            phone: Some("9000000000".to_string()),
            role: Role::Sales,
        },
        Some("agent-admin".to_string()),
    )
    .await
    .expect("create agent");

    let verified = agent_service::verify_credentials("kiran@example.com", "s3cret-pass")
        .await
        .expect("verify");
    assert_eq!(verified.as_ref().map(|a| a.id.as_str()), Some(agent_id.as_str()));
    assert_eq!(verified.unwrap().role, Role::Sales);

    let wrong = agent_service::verify_credentials("kiran@example.com", "wrong-pass")
        .await
        .expect("verify wrong");
    assert!(wrong.is_none());

    let _ = std::fs::remove_file(&db_path);
}
