//! The [`Chain`] dialog: every combinator as one serializable enum.

use async_trait::async_trait;
use layer0::{
    Capabilities, Dialog, DialogContext, DialogError, DialogSnapshot, Event, Item, WaitKind,
};
use serde::{Deserialize, Serialize};

/// Stage at which a combinator receives its antecedent's result.
pub const ANTECEDENT: &str = "antecedent";
/// Stage at which a combinator receives an awaited item.
pub const ITEM: &str = "item";
/// Stage at which a flattened inner dialog's result arrives.
pub const INNER: &str = "inner";

/// One arm of a [`Chain::Switch`]: when `predicate` holds, map with `selector`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SwitchCase {
    /// Registered predicate name.
    pub predicate: String,
    /// Registered selector name.
    pub selector: String,
}

impl SwitchCase {
    /// Create a case.
    pub fn new(predicate: impl Into<String>, selector: impl Into<String>) -> Self {
        Self {
            predicate: predicate.into(),
            selector: selector.into(),
        }
    }
}

/// Dialog combinators built only from the stack primitives.
///
/// Antecedents are held as snapshots and restored through the registry
/// each time they are called, so every iteration of a loop starts from
/// the same state. Functions are registry names.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Chain {
    /// Complete immediately with a value.
    Return {
        /// The value.
        value: Item,
    },
    /// Map the antecedent's result.
    Select {
        /// Dialog whose result is mapped.
        antecedent: DialogSnapshot,
        /// Registered selector name.
        selector: String,
    },
    /// Pass the antecedent's result through if the predicate holds,
    /// otherwise fail with [`DialogError::WhereCanceled`].
    Where {
        /// Dialog whose result is tested.
        antecedent: DialogSnapshot,
        /// Registered predicate name.
        predicate: String,
    },
    /// Run the antecedent again every time it completes. Never completes.
    Loop {
        /// Dialog to repeat.
        antecedent: DialogSnapshot,
    },
    /// Run the antecedent for its effects, discard its result, then wait
    /// for an item of `kind` and complete with it.
    Void {
        /// Dialog run for effects.
        antecedent: DialogSnapshot,
        /// Kind of item to wait for afterwards.
        kind: WaitKind,
    },
    /// Turn the antecedent's fault into a value through a registered
    /// recovery. Faults the recovery declines are re-raised.
    Catch {
        /// Dialog whose faults are caught.
        antecedent: DialogSnapshot,
        /// Registered recovery name.
        recovery: String,
    },
    /// Replace any fault of the antecedent with a null value.
    DefaultIfException {
        /// Dialog whose faults are swallowed.
        antecedent: DialogSnapshot,
    },
    /// Send the antecedent's result to the user, then complete with it.
    PostToUser {
        /// Dialog whose result is sent.
        antecedent: DialogSnapshot,
    },
    /// Wait for one item of `kind` and complete with it.
    WaitToBot {
        /// Kind of item to wait for.
        kind: WaitKind,
    },
    /// Post an event through the router and complete with it once consumed.
    PostEvent {
        /// The event.
        event: Event,
    },
    /// Map the antecedent's result with the first case whose predicate
    /// holds. Completes with null when none does.
    Switch {
        /// Dialog whose result is matched.
        antecedent: DialogSnapshot,
        /// Cases, tried in order.
        cases: Vec<SwitchCase>,
    },
    /// The antecedent completes with a dialog snapshot; call that dialog
    /// and complete with its result.
    Flatten {
        /// Dialog producing a dialog.
        antecedent: DialogSnapshot,
    },
    /// Offer a registered scorable to the router while the antecedent runs.
    WithScorable {
        /// Dialog to run.
        antecedent: DialogSnapshot,
        /// Registered scorable name.
        scorable: String,
    },
}

impl Chain {
    /// Registry kind of every chain.
    pub const KIND: &'static str = "chain";

    /// Short operator name for logs.
    pub fn op(&self) -> &'static str {
        match self {
            Chain::Return { .. } => "return",
            Chain::Select { .. } => "select",
            Chain::Where { .. } => "where",
            Chain::Loop { .. } => "loop",
            Chain::Void { .. } => "void",
            Chain::Catch { .. } => "catch",
            Chain::DefaultIfException { .. } => "default_if_exception",
            Chain::PostToUser { .. } => "post_to_user",
            Chain::WaitToBot { .. } => "wait_to_bot",
            Chain::PostEvent { .. } => "post_event",
            Chain::Switch { .. } => "switch",
            Chain::Flatten { .. } => "flatten",
            Chain::WithScorable { .. } => "with_scorable",
        }
    }

    fn antecedent(&self) -> Option<&DialogSnapshot> {
        match self {
            Chain::Select { antecedent, .. }
            | Chain::Where { antecedent, .. }
            | Chain::Loop { antecedent }
            | Chain::Void { antecedent, .. }
            | Chain::Catch { antecedent, .. }
            | Chain::DefaultIfException { antecedent }
            | Chain::PostToUser { antecedent }
            | Chain::Switch { antecedent, .. }
            | Chain::Flatten { antecedent }
            | Chain::WithScorable { antecedent, .. } => Some(antecedent),
            Chain::Return { .. } | Chain::WaitToBot { .. } | Chain::PostEvent { .. } => None,
        }
    }

    fn unknown_stage(&self, stage: &str) -> DialogError {
        DialogError::UnknownStage {
            dialog: format!("{}.{}", Self::KIND, self.op()),
            stage: stage.to_owned(),
        }
    }
}

fn call_antecedent(
    ctx: &mut DialogContext<'_>,
    antecedent: &DialogSnapshot,
) -> Result<(), DialogError> {
    let dialog = ctx.registry().restore(antecedent)?;
    ctx.call(dialog, ANTECEDENT);
    Ok(())
}

#[async_trait]
impl Dialog for Chain {
    fn kind(&self) -> &str {
        Self::KIND
    }

    async fn start(&mut self, ctx: &mut DialogContext<'_>) -> Result<(), DialogError> {
        match &*self {
            Chain::Return { value } => ctx.done(value.clone()),
            Chain::WaitToBot { kind } => ctx.wait(*kind, ITEM),
            Chain::PostEvent { event } => ctx.post_event(event.clone(), ITEM),
            _ => {
                if let Some(antecedent) = self.antecedent() {
                    call_antecedent(ctx, antecedent)?;
                }
            }
        }
        Ok(())
    }

    async fn resume(
        &mut self,
        ctx: &mut DialogContext<'_>,
        stage: &str,
        result: Result<Item, DialogError>,
    ) -> Result<(), DialogError> {
        match (&*self, stage) {
            (Chain::Select { selector, .. }, ANTECEDENT) => {
                let select = ctx.registry().selector(selector)?;
                ctx.done(select(result?)?);
            }
            (Chain::Where { predicate, .. }, ANTECEDENT) => {
                let item = result?;
                if !ctx.registry().predicate(predicate)?(&item) {
                    return Err(DialogError::WhereCanceled);
                }
                ctx.done(item);
            }
            (Chain::Loop { antecedent }, ANTECEDENT) => {
                result?;
                tracing::trace!("spindle.chain.loop");
                call_antecedent(ctx, antecedent)?;
            }
            (Chain::Void { kind, .. }, ANTECEDENT) => {
                result?;
                ctx.wait(*kind, ITEM);
            }
            (Chain::Catch { recovery, .. }, ANTECEDENT) => match result {
                Ok(item) => ctx.done(item),
                Err(error) => match ctx.registry().recovery(recovery)?(&error) {
                    Some(item) => {
                        tracing::debug!(
                            recovery = %recovery,
                            error = %error,
                            "spindle.chain.catch"
                        );
                        ctx.done(item);
                    }
                    None => return Err(error),
                },
            },
            (Chain::DefaultIfException { .. }, ANTECEDENT) => match result {
                Ok(item) => ctx.done(item),
                Err(error) => {
                    tracing::debug!(error = %error, "spindle.chain.default_if_exception");
                    ctx.done(serde_json::Value::Null);
                }
            },
            (Chain::PostToUser { .. }, ANTECEDENT) => {
                let item = result?;
                ctx.post_to_user(item.to_text()).await?;
                ctx.done(item);
            }
            (Chain::Switch { cases, .. }, ANTECEDENT) => {
                let item = result?;
                let mut selected = None;
                for case in cases {
                    if ctx.registry().predicate(&case.predicate)?(&item) {
                        selected = Some(ctx.registry().selector(&case.selector)?);
                        break;
                    }
                }
                match selected {
                    Some(select) => ctx.done(select(item)?),
                    None => ctx.done(serde_json::Value::Null),
                }
            }
            (Chain::Flatten { .. }, ANTECEDENT) => {
                let item = result?;
                let value = item.as_value().cloned().ok_or(DialogError::InvalidType {
                    expected: WaitKind::Value,
                    actual: item.kind(),
                })?;
                let snapshot: DialogSnapshot = serde_json::from_value(value)?;
                let inner = ctx.registry().restore(&snapshot)?;
                ctx.call(inner, INNER);
            }
            (Chain::Flatten { .. }, INNER)
            | (Chain::WithScorable { .. }, ANTECEDENT)
            | (Chain::Void { .. }, ITEM)
            | (Chain::WaitToBot { .. }, ITEM)
            | (Chain::PostEvent { .. }, ITEM) => ctx.done(result?),
            (_, stage) => return Err(self.unknown_stage(stage)),
        }
        Ok(())
    }

    fn capabilities(&self) -> Capabilities {
        match self {
            Chain::WithScorable { scorable, .. } => {
                Capabilities::none().with_scorable(scorable.clone())
            }
            _ => Capabilities::none(),
        }
    }
}
