use flock_foundation::{BatchAgent, DeclarativeAgent};
use flock_kernel::agent::{
    Agent, AgentError, AgentInputs, AgentSpec, Evaluator, HandOff, HandOffCallable, Tool,
};
use flock_kernel::config::{FlockConfig, RetrySettings};
use flock_kernel::context::{FLOCK_RESULT, FlockContext};
use flock_kernel::resolver::TypeHint;
use flock_runtime::workflow::{ActivityError, LocalActivityRunner};
use flock_runtime::{ChainError, ChainErrorKind, Flock, FlockError};
use flock_testing::{MockActivityRunner, MockEvaluator, MockTool, ScriptedPrompter};
use serde_json::{Value, json};
use std::sync::Arc;

fn local_config() -> FlockConfig {
    FlockConfig {
        local_debug: true,
        ..Default::default()
    }
}

fn inputs(pairs: &[(&str, Value)]) -> AgentInputs {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.clone()))
        .collect()
}

fn declarative(spec: AgentSpec, evaluator: &MockEvaluator) -> DeclarativeAgent {
    let evaluator: Arc<dyn Evaluator> = Arc::new(evaluator.clone());
    DeclarativeAgent::new(spec, evaluator)
}

#[tokio::test]
async fn test_bloggy_single_agent() {
    let evaluator = MockEvaluator::new();
    evaluator.add_response(
        "bloggy",
        json!({
            "funny_blog_title": "Nine Lives, Zero Regrets",
            "blog_headers": "Why cats nap, Why cats judge",
        }),
    );

    let mut flock = Flock::new(local_config());
    flock
        .add_agent(declarative(
            AgentSpec::new("bloggy")
                .with_input("blog_idea")
                .with_output("funny_blog_title, blog_headers"),
            &evaluator,
        ))
        .await;

    let result = flock
        .run(
            "bloggy",
            inputs(&[("blog_idea", json!("A blog about cats"))]),
            None,
            None,
        )
        .await
        .unwrap();

    let requests = evaluator.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(
        requests[0].inputs,
        inputs(&[("blog_idea", json!("A blog about cats"))])
    );
    assert_eq!(requests[0].model, "openai/gpt-4o");

    assert_eq!(result["funny_blog_title"], json!("Nine Lives, Zero Regrets"));
    assert_eq!(result["blog_headers"], json!("Why cats nap, Why cats judge"));
    assert_eq!(result["blog_idea"], json!("A blog about cats"));

    let history = flock.context().history();
    assert_eq!(history.len(), 1);
    assert!(history[0].hand_off.is_none());
    assert_eq!(
        flock.context().get_variable("bloggy.funny_blog_title"),
        Some(&json!("Nine Lives, Zero Regrets"))
    );
}

#[tokio::test]
async fn test_hand_off_chain_between_two_agents() {
    let evaluator = MockEvaluator::new();
    evaluator.add_response("researcher", json!({"summary": "cats sleep 16h a day"}));
    evaluator.add_response("writer", json!({"article": "Cats: professional nappers"}));

    let mut flock = Flock::new(local_config());
    flock
        .add_agent(declarative(
            AgentSpec::new("researcher")
                .with_input("topic")
                .with_output("summary")
                .with_hand_off("writer"),
            &evaluator,
        ))
        .await;
    flock
        .add_agent(declarative(
            AgentSpec::new("writer")
                .with_input("researcher.summary")
                .with_output("article"),
            &evaluator,
        ))
        .await;

    let result = flock
        .run("researcher", inputs(&[("topic", json!("cats"))]), None, None)
        .await
        .unwrap();
    assert_eq!(result["article"], json!("Cats: professional nappers"));

    let writer_request = &evaluator.requests_for("writer")[0];
    assert_eq!(
        writer_request.inputs["researcher.summary"],
        json!("cats sleep 16h a day")
    );

    let history = flock.context().history();
    assert_eq!(history.len(), 2);
    assert_eq!(history[0].agent, "researcher");
    assert_eq!(history[1].agent, "writer");
    assert_eq!(history[1].called_from.as_deref(), Some("researcher"));
}

#[tokio::test]
async fn test_agent_without_hand_off_runs_once() {
    let evaluator = MockEvaluator::new();
    let mut flock = Flock::new(local_config());
    flock
        .add_agent(declarative(
            AgentSpec::new("solo").with_input("x").with_output("y: int"),
            &evaluator,
        ))
        .await;

    let result = flock
        .run("solo", inputs(&[("x", json!(1))]), None, None)
        .await
        .unwrap();

    assert_eq!(evaluator.call_count(), 1);
    assert_eq!(result, inputs(&[("x", json!(1)), ("y", json!(0))]));
}

#[tokio::test]
async fn test_input_signature_tokenizer() {
    let evaluator = MockEvaluator::new();
    let mut flock = Flock::new(local_config());
    flock
        .add_agent(declarative(
            AgentSpec::new("outliner")
                .with_input("topic,section_heading,section_subheadings: list[str]")
                .with_output("outline"),
            &evaluator,
        ))
        .await;

    flock
        .run(
            "outliner",
            inputs(&[
                ("topic", json!("cats")),
                ("section_heading", json!("Sleep")),
                ("section_subheadings", json!(["Where", "When"])),
            ]),
            None,
            None,
        )
        .await
        .unwrap();

    let request = &evaluator.requests()[0];
    let names: Vec<&str> = request.input_fields.iter().map(|f| f.name.as_str()).collect();
    assert_eq!(names, vec!["topic", "section_heading", "section_subheadings"]);
    assert_eq!(
        request.input_fields[2].type_hint,
        TypeHint::List(Box::new(TypeHint::Str))
    );
}

#[tokio::test]
async fn test_agent_name_input_resolves_first_record() {
    let evaluator = MockEvaluator::new();
    evaluator.add_response("drafter", json!({"title": "Draft"}));
    evaluator.add_response("editor", json!({"b_note": "tighten it"}));
    evaluator.add_response("publisher", json!({"done": true}));

    // The first run of `drafter` hands off to `editor`, the second to `publisher`.
    let route = HandOffCallable::new("drafter_route", |ctx: &FlockContext, _| {
        let next = if ctx.get_agent_history("drafter").is_empty() {
            "editor"
        } else {
            "publisher"
        };
        Ok(Some(HandOff::to(next)))
    });

    let mut flock = Flock::new(local_config());
    flock
        .add_agent(declarative(
            AgentSpec::new("drafter")
                .with_input("b_note")
                .with_output("title")
                .with_hand_off(route),
            &evaluator,
        ))
        .await;
    flock
        .add_agent(declarative(
            AgentSpec::new("editor")
                .with_input("drafter.title")
                .with_output("b_note")
                .with_hand_off("drafter"),
            &evaluator,
        ))
        .await;
    flock
        .add_agent(declarative(
            AgentSpec::new("publisher").with_input("drafter").with_output("done"),
            &evaluator,
        ))
        .await;

    flock
        .run("drafter", inputs(&[("b_note", Value::Null)]), None, None)
        .await
        .unwrap();

    let drafts = evaluator.requests_for("drafter");
    assert_eq!(drafts.len(), 2);
    assert_eq!(drafts[1].inputs["b_note"], json!("tighten it"));

    let publisher = &evaluator.requests_for("publisher")[0];
    assert_eq!(publisher.inputs["drafter"]["b_note"], Value::Null);
    assert_eq!(publisher.inputs["drafter"]["title"], json!("Draft"));
}

#[tokio::test]
async fn test_missing_inputs_are_prompted() {
    let evaluator = MockEvaluator::new();
    let prompter = Arc::new(ScriptedPrompter::new().with_answer("blog_idea", "Dogs"));
    let mut flock = Flock::new(local_config()).with_prompter(prompter.clone());
    flock
        .add_agent(declarative(
            AgentSpec::new("bloggy")
                .with_input("flock.blog_idea")
                .with_output("funny_blog_title"),
            &evaluator,
        ))
        .await;

    flock
        .run("bloggy", AgentInputs::new(), None, None)
        .await
        .unwrap();

    assert_eq!(
        prompter.asked(),
        vec![("bloggy".to_string(), "blog_idea".to_string())]
    );
    assert_eq!(evaluator.requests()[0].inputs["flock.blog_idea"], json!("Dogs"));
}

#[tokio::test]
async fn test_boundary_reports_missing_next_agent() {
    let evaluator = MockEvaluator::new();
    let mut flock = Flock::new(FlockConfig::default());
    flock
        .add_agent(declarative(
            AgentSpec::new("a").with_output("x").with_hand_off("ghost"),
            &evaluator,
        ))
        .await;

    let err = flock
        .run("a", AgentInputs::new(), None, None)
        .await
        .unwrap_err();

    let chain = err.as_chain_error().unwrap();
    assert_eq!(chain.kind(), ChainErrorKind::Lookup);
    assert_eq!(chain.to_string(), "Next agent 'ghost' not found.");

    let result = flock.context().get_variable(FLOCK_RESULT).unwrap();
    assert_eq!(result["success"], json!(false));
    assert_eq!(result["result"], json!("Failed: Next agent 'ghost' not found."));
}

#[tokio::test]
async fn test_boundary_raises_execution_failure() {
    let evaluator = MockEvaluator::new();
    evaluator.fail_agent("a", AgentError::ExecutionFailed("model refused".into()));
    let mut flock = Flock::new(FlockConfig::default());
    flock
        .add_agent(declarative(AgentSpec::new("a").with_output("x"), &evaluator))
        .await;

    let err = flock
        .run("a", AgentInputs::new(), None, None)
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        FlockError::Activity(ActivityError::Chain(ChainError::Execution { .. }))
    ));
    assert!(!err.as_chain_error().unwrap().is_reported());
}

#[tokio::test]
async fn test_boundary_keeps_error_field_in_agent_output() {
    let evaluator = MockEvaluator::new();
    evaluator.add_response("finder", json!({"error": "none found"}));
    let mut flock = Flock::new(FlockConfig::default());
    flock
        .add_agent(declarative(
            AgentSpec::new("finder").with_input("query").with_output("error: str"),
            &evaluator,
        ))
        .await;

    let out = flock
        .run("finder", inputs(&[("query", json!("unicorns"))]), None, None)
        .await
        .unwrap();

    assert_eq!(out["error"], json!("none found"));
    let result = flock.context().get_variable(FLOCK_RESULT).unwrap();
    assert_eq!(result["success"], json!(true));
}

#[tokio::test(start_paused = true)]
async fn test_workflow_retries_then_succeeds() {
    let evaluator = MockEvaluator::new();
    evaluator.add_response("a", json!({"x": "ok"}));

    let mut config = FlockConfig::default();
    config.workflow.retry = RetrySettings {
        max_attempts: 3,
        initial_interval_ms: 100,
        max_interval_ms: 1_000,
        jitter: true,
    };

    let mut flock = Flock::new(config);
    let delegate = Arc::new(LocalActivityRunner::new(flock.registry().clone()));
    let runner = Arc::new(
        MockActivityRunner::new()
            .then(Err(ActivityError::Unavailable("worker restarting".into())))
            .with_delegate(delegate),
    );
    flock = flock.with_activity_runner(runner.clone());
    flock
        .add_agent(declarative(AgentSpec::new("a").with_output("x"), &evaluator))
        .await;

    let out = flock
        .run("a", AgentInputs::new(), None, Some("a_beef".to_string()))
        .await
        .unwrap();

    assert_eq!(out["x"], json!("ok"));
    assert_eq!(runner.call_count(), 2);
    assert_eq!(runner.payloads()[0]["workflow_id"], json!("a_beef"));
    assert_eq!(
        flock.context().get_variable(FLOCK_RESULT),
        Some(&json!({"result": {"x": "ok"}, "success": true}))
    );
}

#[tokio::test]
async fn test_step_budget_stops_cycle() {
    let evaluator = MockEvaluator::new();
    let mut config = local_config();
    config.chain.max_steps = Some(4);

    let mut flock = Flock::new(config);
    flock
        .add_agent(declarative(
            AgentSpec::new("ping").with_output("x").with_hand_off("pong"),
            &evaluator,
        ))
        .await;
    flock
        .add_agent(declarative(
            AgentSpec::new("pong").with_output("y").with_hand_off("ping"),
            &evaluator,
        ))
        .await;

    let err = flock
        .run("ping", AgentInputs::new(), None, None)
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        FlockError::Chain(ChainError::StepBudgetExceeded { max_steps: 4 })
    ));
    assert_eq!(evaluator.call_count(), 4);
}

#[tokio::test]
async fn test_definitions_roundtrip_through_registry() {
    let evaluator = MockEvaluator::new();
    let route = HandOffCallable::new("route_to_writer", |_, _| Ok(Some(HandOff::to("writer"))));
    let search = Arc::new(MockTool::new("web_search", "Searches the web", json!({"type": "object"})));

    let mut flock = Flock::new(local_config());
    flock
        .add_agent(declarative(
            AgentSpec::new("researcher")
                .with_input("topic")
                .with_output("summary")
                .with_tool(search)
                .with_hand_off(route),
            &evaluator,
        ))
        .await;

    let definition = flock.context().get_agent_definition("researcher").unwrap();
    assert_eq!(definition.agent_type, DeclarativeAgent::TYPE_NAME);

    let table = flock.registry().callables().await;
    let restored = DeclarativeAgent::from_dict(
        &definition.agent_data,
        &table,
        Arc::new(evaluator.clone()),
    )
    .unwrap();

    assert_eq!(restored.to_dict(), definition.agent_data);
    assert_eq!(restored.spec().tools[0].name(), "web_search");

    let copy = flock.context().deepcopy().unwrap();
    assert_eq!(&copy, flock.context());
}

#[tokio::test]
async fn test_batch_agent_in_chain() {
    let evaluator = MockEvaluator::new();
    evaluator.add_response("tagger", json!({"tag": "pet"}));

    let mut flock = Flock::new(local_config());
    let inner = declarative(
        AgentSpec::new("tagger").with_input("animals: list[str]").with_output("tag"),
        &evaluator,
    );
    flock.add_agent(BatchAgent::new(inner, "animals", 2)).await;

    let out = flock
        .run(
            "tagger",
            inputs(&[("animals", json!(["cat", "dog", "hamster"]))]),
            None,
            None,
        )
        .await
        .unwrap();

    assert_eq!(evaluator.call_count(), 2);
    assert_eq!(out["tag"], json!(["pet", "pet"]));
    assert_eq!(out["batch_results"].as_array().unwrap().len(), 2);

    let chunks: Vec<Value> = evaluator
        .requests()
        .iter()
        .map(|r| r.inputs["animals"].clone())
        .collect();
    assert!(chunks.contains(&json!(["cat", "dog"])));
    assert!(chunks.contains(&json!(["hamster"])));
}

#[tokio::test]
async fn test_mock_tool() {
    let mock_tool = MockTool::new("calculator", "Adds two numbers", json!({"type": "object"}));

    assert_eq!(mock_tool.call_count().await, 0);

    let _ = mock_tool.call(json!({"a": 1, "b": 2})).await;

    assert_eq!(mock_tool.call_count().await, 1);
    assert_eq!(mock_tool.history().await, vec![json!({"a": 1, "b": 2})]);

    flock_testing::assert_tool_called!(mock_tool, 1);
}
