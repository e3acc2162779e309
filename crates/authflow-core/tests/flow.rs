use std::sync::Arc;
use std::time::Duration;

use authflow_core::config::FlowConfig;
use authflow_core::flow::{
    AuthFlowController, Dispatched, FlowError, FlowState, Intent, IntentKind, Resolution,
};
use authflow_core::provider::{AuthError, MockIdentityProvider, ProviderCall};
use authflow_core::session::MemorySessionStore;

fn instant_controller() -> (Arc<MockIdentityProvider>, AuthFlowController) {
    let provider = Arc::new(MockIdentityProvider::new(Duration::ZERO));
    let controller = AuthFlowController::new(provider.clone(), MemorySessionStore::new());
    (provider, controller)
}

fn sample_intent(kind: IntentKind) -> Intent {
    match kind {
        IntentKind::SubmitCredentials => Intent::credentials("test@user.com", "password123"),
        IntentKind::SubmitCode => Intent::code("123456"),
        IntentKind::ResendCode => Intent::ResendCode,
        IntentKind::SubmitRegistration => Intent::registration("new@user.com", "password123"),
        IntentKind::SubmitResetRequest => Intent::reset_request("test@user.com"),
        IntentKind::NavigateRegister => Intent::NavigateRegister,
        IntentKind::NavigateReset => Intent::NavigateReset,
        IntentKind::NavigateLogin => Intent::NavigateLogin,
        IntentKind::SignOut => Intent::SignOut,
    }
}

async fn drive_to(controller: &mut AuthFlowController, target: FlowState) {
    match target {
        FlowState::LoggedOut => {}
        FlowState::Registering => {
            controller.perform(Intent::NavigateRegister).await.unwrap();
        }
        FlowState::ResettingPassword => {
            controller.perform(Intent::NavigateReset).await.unwrap();
        }
        FlowState::AwaitingSecondFactor => {
            controller
                .perform(sample_intent(IntentKind::SubmitCredentials))
                .await
                .unwrap();
        }
        FlowState::Authenticated => {
            controller
                .perform(sample_intent(IntentKind::SubmitCredentials))
                .await
                .unwrap();
            controller
                .perform(sample_intent(IntentKind::SubmitCode))
                .await
                .unwrap();
        }
    }
    assert_eq!(controller.state(), target);
}

#[tokio::test]
async fn intents_outside_the_table_change_nothing() {
    for state in FlowState::all() {
        for kind in IntentKind::all() {
            if state.transition(kind).is_some() {
                continue;
            }
            let (_, mut controller) = instant_controller();
            drive_to(&mut controller, state).await;
            let before = controller.snapshot();

            let err = controller.dispatch(sample_intent(kind)).unwrap_err();
            assert_eq!(err, FlowError::InvalidTransition { state, intent: kind });
            assert_eq!(controller.snapshot(), before, "{state} / {kind}");
        }
    }
}

#[tokio::test]
async fn second_submission_while_pending_is_busy() {
    for state in [
        FlowState::LoggedOut,
        FlowState::AwaitingSecondFactor,
        FlowState::Registering,
        FlowState::ResettingPassword,
    ] {
        let (_, mut controller) = instant_controller();
        drive_to(&mut controller, state).await;
        let submitting: Vec<_> = state
            .available_intents()
            .into_iter()
            .filter(|kind| kind.is_submitting())
            .collect();

        let first = match controller.dispatch(sample_intent(submitting[0])).unwrap() {
            Dispatched::Pending(operation) => operation,
            Dispatched::Applied(_) => panic!("{} should be asynchronous", submitting[0]),
        };
        let before = controller.snapshot();
        for kind in &submitting {
            assert_eq!(
                controller.dispatch(sample_intent(*kind)).unwrap_err(),
                FlowError::Busy
            );
        }
        assert_eq!(controller.snapshot(), before);
        controller.settle(first).await.unwrap();
        assert!(!controller.is_pending());
    }
}

#[tokio::test]
async fn successful_submissions_leave_exactly_one_message() {
    let (_, mut controller) = instant_controller();
    let script = [
        Intent::NavigateRegister,
        sample_intent(IntentKind::SubmitRegistration),
        Intent::NavigateReset,
        sample_intent(IntentKind::SubmitResetRequest),
        sample_intent(IntentKind::SubmitCredentials),
        Intent::ResendCode,
        sample_intent(IntentKind::SubmitCode),
        Intent::SignOut,
    ];
    for intent in script {
        let kind = intent.kind();
        controller.perform(intent).await.unwrap();
        if kind.is_submitting() || kind == IntentKind::SignOut {
            assert!(controller.status_message().is_some(), "{kind}");
            assert!(controller.error_message().is_none(), "{kind}");
        }
    }
    assert_eq!(controller.state(), FlowState::LoggedOut);
}

#[tokio::test]
async fn sign_out_always_clears_session() {
    let (provider, mut controller) = instant_controller();
    drive_to(&mut controller, FlowState::AwaitingSecondFactor).await;
    provider.fail_next(ProviderCall::VerifySecondFactor, AuthError::InvalidCode);
    let _ = controller.perform(Intent::code("000000")).await;
    assert_eq!(controller.error_message(), Some("invalid verification code"));

    controller.perform(Intent::code("123456")).await.unwrap();
    assert!(controller.session().is_some());
    controller.perform(Intent::SignOut).await.unwrap();
    assert_eq!(controller.state(), FlowState::LoggedOut);
    assert!(controller.session().is_none());
    assert_eq!(controller.status_message(), Some("Signed out"));
}

#[tokio::test(start_paused = true)]
async fn pending_lasts_for_configured_latency() {
    let config = FlowConfig::default();
    let provider = Arc::new(MockIdentityProvider::from_config(&config));
    let mut controller = AuthFlowController::new(provider, MemorySessionStore::new())
        .with_code_length(config.code_length);
    controller.perform(Intent::NavigateReset).await.unwrap();

    let started = tokio::time::Instant::now();
    let operation = match controller.dispatch(Intent::reset_request("a@b.c")).unwrap() {
        Dispatched::Pending(operation) => operation,
        Dispatched::Applied(state) => panic!("unexpected synchronous transition to {state}"),
    };
    assert!(controller.is_pending());
    assert_eq!(controller.state(), FlowState::ResettingPassword);

    let resolution = controller.settle(operation).await.unwrap();
    assert!(started.elapsed() >= config.latency());
    assert_eq!(resolution, Resolution::Applied(FlowState::LoggedOut));
    assert_eq!(controller.status_message(), Some("Reset link sent"));
}

#[tokio::test(start_paused = true)]
async fn late_registration_result_does_not_pull_user_back() {
    let provider = Arc::new(MockIdentityProvider::new(Duration::from_millis(1500)));
    let mut controller = AuthFlowController::new(provider, MemorySessionStore::new());
    controller.perform(Intent::NavigateRegister).await.unwrap();

    let operation = match controller
        .dispatch(Intent::registration("new@user.com", "pw"))
        .unwrap()
    {
        Dispatched::Pending(operation) => operation,
        Dispatched::Applied(state) => panic!("unexpected synchronous transition to {state}"),
    };
    controller.dispatch(Intent::NavigateLogin).unwrap();
    controller.dispatch(Intent::NavigateReset).unwrap();
    assert!(!operation.is_finished());
    assert_eq!(
        controller.dispatch(Intent::reset_request("a@b.c")).unwrap_err(),
        FlowError::Busy
    );

    assert_eq!(controller.settle(operation).await.unwrap(), Resolution::Stale);
    assert_eq!(controller.state(), FlowState::ResettingPassword);
    assert_eq!(controller.status_message(), None);

    controller
        .perform(Intent::reset_request("a@b.c"))
        .await
        .unwrap();
    assert_eq!(controller.state(), FlowState::LoggedOut);
}

#[tokio::test(start_paused = true)]
async fn cancelled_perform_still_applies_its_result() {
    let provider = Arc::new(MockIdentityProvider::new(Duration::from_millis(50)));
    let mut controller = AuthFlowController::new(provider, MemorySessionStore::new());

    let waited = tokio::time::timeout(
        Duration::from_millis(5),
        controller.perform(sample_intent(IntentKind::SubmitCredentials)),
    )
    .await;
    assert!(waited.is_err());
    assert!(controller.is_pending());

    tokio::time::sleep(Duration::from_millis(100)).await;
    let resolution = controller.poll().unwrap().unwrap();
    assert_eq!(resolution, Resolution::Applied(FlowState::AwaitingSecondFactor));
    assert!(!controller.is_pending());

    controller
        .perform(sample_intent(IntentKind::SubmitCode))
        .await
        .unwrap();
    assert_eq!(controller.state(), FlowState::Authenticated);
}

#[tokio::test(start_paused = true)]
async fn dropped_operation_does_not_block_the_next_submission() {
    let provider = Arc::new(MockIdentityProvider::new(Duration::from_millis(50)));
    let mut controller = AuthFlowController::new(provider, MemorySessionStore::new());
    let dispatched = controller
        .dispatch(sample_intent(IntentKind::SubmitCredentials))
        .unwrap();
    drop(dispatched);
    tokio::time::sleep(Duration::from_millis(100)).await;

    let operation = match controller
        .dispatch(sample_intent(IntentKind::SubmitCode))
        .unwrap()
    {
        Dispatched::Pending(operation) => operation,
        Dispatched::Applied(state) => panic!("unexpected synchronous transition to {state}"),
    };
    assert_eq!(controller.state(), FlowState::AwaitingSecondFactor);
    assert_eq!(
        controller.settle(operation).await.unwrap(),
        Resolution::Applied(FlowState::Authenticated)
    );
    assert!(controller.session().is_some());
}
