//! End-to-end event handling against the scripted platform.
#[cfg(test)]
mod e2e {
    use crate::config::{Settings, WorkflowConfig};
    use crate::event::CommentEventPayload;
    use crate::fake::{deployment, run, FakePlatform};
    use crate::handler::{process_payload, EventReport, WorkflowOutcome, WorkflowResult};
    use crate::types::{EnvironmentId, RunId, RunStatus};

    const SHA: &str = "0123456789abcdef0123456789abcdef01234567";

    fn body(mark: &str) -> String {
        format!(
            "# Workflow triggers <!-- workflow-triggers-42 -->\n\n## Required\n\
             - [{mark}] `build-preview` on CI at this [workflow](url).\n\n\
             _This comment is generated against commit {SHA}, updated at:_"
        )
    }

    fn payload(login: &str, previous: &str, current: &str) -> CommentEventPayload {
        serde_json::from_value(serde_json::json!({
            "action": "edited",
            "issue": {
                "number": 42,
                "pull_request": { "url": "https://api.github.com/repos/acme/web/pulls/42" }
            },
            "comment": { "id": 99, "body": current, "user": { "login": login } },
            "changes": { "body": { "from": previous } }
        }))
        .unwrap()
    }

    fn settings() -> Settings {
        Settings::new(
            "bot",
            WorkflowConfig::from_json(r#"{"build-preview":"Preview"}"#).unwrap(),
        )
    }

    #[tokio::test]
    async fn toggled_checkbox_approves_waiting_run() {
        let platform = FakePlatform::new()
            .with_workflow("build-preview")
            .with_environment("Preview", 7)
            .with_environment("Production", 8)
            .with_run_page(vec![run(10, "lint", RunStatus::Completed)])
            .with_run_page(vec![run(11, "build-preview", RunStatus::Waiting)])
            .with_deployments(11, vec![vec![deployment(7)]]);

        let report = process_payload(&platform, &settings(), payload("bot", &body(" "), &body("x")))
            .await
            .unwrap();

        let approvals = platform.approvals();
        assert_eq!(approvals.len(), 1);
        assert_eq!(approvals[0].run_id, RunId(11));
        assert_eq!(approvals[0].environment_ids, vec![EnvironmentId(7)]);
        assert_eq!(approvals[0].comment, "Approved via checkbox toggle in PR #42.");
        assert!(platform.dispatches().is_empty());
        assert!(platform
            .calls()
            .contains(&format!("list_runs_for_commit:{SHA}:2")));

        let EventReport::Handled { pr_number, workflows } = report else {
            panic!("expected handled report")
        };
        assert_eq!(pr_number, 42);
        assert!(matches!(
            &workflows[0].result,
            WorkflowResult::Ok { outcome: WorkflowOutcome::Approved { .. } }
        ));
    }

    #[tokio::test]
    async fn edit_by_someone_else_is_skipped_before_validation() {
        let platform = FakePlatform::new();
        let report = process_payload(&platform, &settings(), payload("alice", &body(" "), &body("x")))
            .await
            .unwrap();

        assert!(matches!(report, EventReport::Skipped { .. }));
        assert!(platform.calls().is_empty());
    }

    #[tokio::test]
    async fn undeclared_workflow_aborts_before_side_effects() {
        let platform = FakePlatform::new()
            .with_environment("Preview", 7)
            .with_run_page(vec![run(11, "build-preview", RunStatus::Waiting)])
            .with_deployments(11, vec![vec![deployment(7)]]);

        let err = process_payload(&platform, &settings(), payload("bot", &body(" "), &body("x")))
            .await
            .unwrap_err();

        assert!(err.is_validation());
        assert!(platform.approvals().is_empty());
        assert_eq!(platform.count("list_runs_for_commit"), 0);
    }

    #[tokio::test]
    async fn mapped_to_unknown_environment_never_dispatches() {
        let platform = FakePlatform::new()
            .with_workflow("build-preview")
            .with_environment("Production", 8);

        let report = process_payload(&platform, &settings(), payload("bot", &body(" "), &body("x")))
            .await
            .unwrap();

        assert_eq!(report.failures().len(), 1);
        assert!(platform.dispatches().is_empty());
        assert!(platform.approvals().is_empty());
    }
}
