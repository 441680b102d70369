//! Chain combinator tests, driven directly on a fiber.

use async_trait::async_trait;
use layer0::test_utils::RecordingBotToUser;
use layer0::*;
use serde::{Deserialize, Serialize};
use serde_json::json;
use spindle_chain::*;
use spindle_fiber::{Fiber, PollContext};
use tokio_util::sync::CancellationToken;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Harness
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Calls a target dialog and records its outcome as text.
#[derive(Debug, Serialize, Deserialize)]
struct Recorder {
    target: DialogSnapshot,
    results: Vec<String>,
    errors: Vec<String>,
}

#[async_trait]
impl Dialog for Recorder {
    fn kind(&self) -> &str {
        "recorder"
    }

    async fn start(&mut self, ctx: &mut DialogContext<'_>) -> Result<(), DialogError> {
        let target = ctx.registry().restore(&self.target)?;
        ctx.call(target, "result");
        Ok(())
    }

    async fn resume(
        &mut self,
        ctx: &mut DialogContext<'_>,
        stage: &str,
        result: Result<Item, DialogError>,
    ) -> Result<(), DialogError> {
        if stage == "result" {
            match result {
                Ok(item) => self.results.push(item.to_text()),
                Err(e) => self.errors.push(e.to_string()),
            }
        }
        ctx.wait(WaitKind::Message, "idle");
        Ok(())
    }
}

fn number(item: &Item) -> i64 {
    item.as_value().and_then(|v| v.as_i64()).unwrap_or(0)
}

fn registry() -> DialogRegistry {
    let mut registry = DialogRegistry::new();
    spindle_chain::register(&mut registry);
    registry.register::<Recorder>("recorder");
    registry.register_selector("double", |item| Ok(json!(number(&item) * 2).into()));
    registry.register_selector("negate", |item| Ok(json!(-number(&item)).into()));
    registry.register_selector("explode", |_| Err(DialogError::application("bad")));
    registry.register_predicate("positive", |item| number(item) > 0);
    registry.register_predicate("negative", |item| number(item) < 0);
    registry.register_recovery("zero", |_| Some(json!(0).into()));
    registry.register_recovery("decline", |_| None);
    registry
}

struct Harness {
    registry: DialogRegistry,
    bot: RecordingBotToUser,
    token: CancellationToken,
    fiber: Fiber,
}

impl Harness {
    fn new() -> Self {
        Self {
            registry: registry(),
            bot: RecordingBotToUser::new(),
            token: CancellationToken::new(),
            fiber: Fiber::new(),
        }
    }

    async fn poll(&mut self) -> Result<Need, DialogError> {
        let cx = PollContext::new(&self.registry, &self.bot, &self.token);
        self.fiber.poll(&cx).await
    }

    async fn record(chain: Chain) -> Self {
        let mut h = Self::new();
        let recorder = Recorder {
            target: DialogSnapshot::of(&chain).unwrap(),
            results: vec![],
            errors: vec![],
        };
        h.fiber.call(Box::new(recorder), None);
        h.poll().await.unwrap();
        h
    }

    async fn send(&mut self, text: &str) {
        self.fiber.post(Message::new(text).into()).unwrap();
        self.poll().await.unwrap();
    }

    fn recorded(&self) -> (Vec<String>, Vec<String>) {
        let state = &self.fiber.snapshot().unwrap().frames[0].dialog.state;
        let list = |key: &str| -> Vec<String> {
            serde_json::from_value(state[key].clone()).unwrap()
        };
        (list("results"), list("errors"))
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Map / filter / switch
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[tokio::test]
async fn select_maps_result() {
    let h = Harness::record(ret(json!(21)).select("double").unwrap()).await;
    assert_eq!(h.recorded(), (vec!["42".into()], vec![]));
}

#[tokio::test]
async fn where_passes_matching_values() {
    let h = Harness::record(ret(json!(5)).filter("positive").unwrap()).await;
    assert_eq!(h.recorded().0, vec!["5"]);
}

#[tokio::test]
async fn where_cancels_non_matching_values() {
    let h = Harness::record(ret(json!(-5)).filter("positive").unwrap()).await;
    assert_eq!(
        h.recorded(),
        (vec![], vec!["where clause rejected the value".into()])
    );
}

#[tokio::test]
async fn switch_takes_first_matching_case() {
    let cases = vec![
        SwitchCase::new("positive", "double"),
        SwitchCase::new("negative", "negate"),
    ];
    let h = Harness::record(ret(json!(-3)).switch(cases.clone()).unwrap()).await;
    assert_eq!(h.recorded().0, vec!["3"]);

    let h = Harness::record(ret(json!(0)).switch(cases).unwrap()).await;
    assert_eq!(h.recorded().0, vec!["null"]);
}

#[tokio::test]
async fn unknown_selector_fails_the_chain() {
    let h = Harness::record(ret(json!(1)).select("missing").unwrap()).await;
    assert_eq!(h.recorded().1, vec!["unknown function: missing"]);
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Faults
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[tokio::test]
async fn catch_recovers_fault_into_value() {
    let failing = ret(json!(1)).select("explode").unwrap();
    let h = Harness::record(failing.catch("zero").unwrap()).await;
    assert_eq!(h.recorded(), (vec!["0".into()], vec![]));
}

#[tokio::test]
async fn catch_rethrows_declined_fault() {
    let failing = ret(json!(1)).select("explode").unwrap();
    let h = Harness::record(failing.catch("decline").unwrap()).await;
    assert_eq!(h.recorded(), (vec![], vec!["bad".into()]));
}

#[tokio::test]
async fn default_if_exception_yields_null() {
    let failing = ret(json!(1)).select("explode").unwrap();
    let h = Harness::record(failing.default_if_exception().unwrap()).await;
    assert_eq!(h.recorded(), (vec!["null".into()], vec![]));
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Waiting, posting, looping
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[tokio::test]
async fn post_to_user_sends_and_passes_through() {
    let h = Harness::record(ret(json!("hi")).post_to_user().unwrap()).await;
    assert_eq!(h.bot.texts(), vec!["hi"]);
    assert_eq!(h.recorded().0, vec!["hi"]);
}

#[tokio::test]
async fn void_discards_result_and_waits_for_kind() {
    let mut h = Harness::record(ret(json!(1)).void(WaitKind::Message).unwrap()).await;
    assert_eq!(h.recorded().0, Vec::<String>::new());
    assert_eq!(h.fiber.frame_infos()[0].wait, WaitKind::Message);

    h.send("next").await;
    assert_eq!(h.recorded().0, vec!["next"]);
}

#[tokio::test]
async fn loop_repeats_from_the_same_state() {
    let mut h = Harness::new();
    let root = wait_to_bot(WaitKind::Message)
        .post_to_user()
        .unwrap()
        .looping()
        .unwrap();
    h.fiber.call(Box::new(root), None);
    h.poll().await.unwrap();
    assert_eq!(h.fiber.len(), 3);

    h.send("a").await;
    h.send("b").await;

    assert_eq!(h.bot.texts(), vec!["a", "b"]);
    assert_eq!(h.fiber.len(), 3);
    assert_eq!(h.fiber.need(), Need::Wait);
}

#[tokio::test]
async fn post_event_completes_when_event_is_consumed() {
    let mut h = Harness::record(post_event(Event::new("tick"))).await;
    let posted = h.fiber.take_posted();
    assert_eq!(posted.len(), 1);

    let p = &posted[0];
    assert!(h.fiber.satisfy(p.frame, p.serial, p.event.clone().into()));
    h.poll().await.unwrap();
    assert_eq!(h.recorded().0, vec!["tick"]);
}

#[tokio::test]
async fn flatten_calls_the_produced_dialog() {
    let inner = DialogSnapshot::of(&ret(json!(7))).unwrap();
    let producer = ret(serde_json::to_value(inner).unwrap());
    let h = Harness::record(producer.flatten().unwrap()).await;
    assert_eq!(h.recorded().0, vec!["7"]);
}

#[tokio::test]
async fn with_scorable_declares_capability() {
    let mut h = Harness::new();
    let root = wait_to_bot(WaitKind::Message).with_scorable("help").unwrap();
    h.fiber.call(Box::new(root), None);
    h.poll().await.unwrap();

    let frames = h.fiber.frame_infos();
    assert_eq!(frames.len(), 2);
    assert!(frames[0].capabilities.scorables.is_empty());
    assert_eq!(frames[1].capabilities.scorables, vec!["help"]);
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Persistence
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[test]
fn chain_serde_shape() {
    let chain = ret(json!(1)).select("double").unwrap();
    let v = serde_json::to_value(&chain).unwrap();
    assert_eq!(v["op"], "select");
    assert_eq!(v["selector"], "double");
    assert_eq!(v["antecedent"]["kind"], "chain");
    let back: Chain = serde_json::from_value(v).unwrap();
    assert_eq!(back, chain);
}

#[tokio::test]
async fn loop_survives_restore_between_messages() {
    let mut h = Harness::new();
    let root = wait_to_bot(WaitKind::Message)
        .post_to_user()
        .unwrap()
        .looping()
        .unwrap();
    h.fiber.call(Box::new(root), None);
    h.poll().await.unwrap();
    h.send("before").await;

    let saved = serde_json::to_value(h.fiber.snapshot().unwrap()).unwrap();
    h.fiber = Fiber::restore(serde_json::from_value(saved).unwrap(), &h.registry).unwrap();
    h.send("after").await;

    assert_eq!(h.bot.texts(), vec!["before", "after"]);
}
