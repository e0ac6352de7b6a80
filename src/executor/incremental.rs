//! Incremental delivery: deferred-fragment and streamed-list payload
//! records, and the subsequent-payload sequence the caller iterates.

use std::{
    mem,
    pin::Pin,
    sync::Arc,
    task::{Context, Poll},
};

use arcstr::ArcStr;
use futures::{
    channel::oneshot,
    future::{BoxFuture, Shared},
    lock::Mutex as AsyncMutex,
    FutureExt as _, Stream, StreamExt as _,
};
use indexmap::IndexMap;
use tracing::{debug, trace};

use crate::{
    ast::Type,
    executor::{
        collector::FieldNodes,
        completer::{complete_value, handle_item_error},
        execute_fields, located_error, push_error, ErrorLog, ExecutionContext,
        ExecutionPatchResult, ExecutionResult, FieldPath, FieldRef, PathSegment, ResponsePayload,
    },
    resolve::ResolvedStream,
    schema::meta::ObjectMeta,
    value::{DefaultScalarValue, ScalarValue, Value},
};

/// Completes when the payload record it belongs to has settled its data.
///
/// Chaining a record's work after its parent's gate is what keeps a child
/// patch from ever being yielded before its parent.
pub(crate) type PayloadGate = Shared<oneshot::Receiver<()>>;

/// What a settled payload record carries.
pub(crate) enum PayloadData<S> {
    /// The data of one patch (possibly `null` from error handling).
    Data(Value<S>),

    /// The marker record of an exhausted source iterator; dropped by the
    /// yielder without emitting a patch.
    Done,
}

/// One future incremental payload, pending in the execution's registry.
pub(crate) struct PendingPayload<'a, S> {
    pub label: Option<ArcStr>,
    pub path: Vec<PathSegment>,
    pub errors: Arc<ErrorLog<S>>,
    pub data: BoxFuture<'a, PayloadData<S>>,
}

/// Handle of the payload record the execution is currently producing work
/// under: its error log (the active log beneath a deferred or streamed
/// boundary) and its completion gate.
pub(crate) struct PayloadContext<S> {
    pub errors: Arc<ErrorLog<S>>,
    pub gate: PayloadGate,
}

impl<S> Clone for PayloadContext<S> {
    fn clone(&self) -> Self {
        Self {
            errors: Arc::clone(&self.errors),
            gate: self.gate.clone(),
        }
    }
}

/// Registers a deferred fragment: its field set executes under a fresh
/// record (so errors attach to the record's log), sequenced after the
/// parent record's gate.
pub(crate) fn defer_fields<'a, S: ScalarValue>(
    ctx: &Arc<ExecutionContext<'a, S>>,
    object_type: &'a ObjectMeta<S>,
    source: Value<S>,
    label: Option<ArcStr>,
    fields: IndexMap<ArcStr, FieldNodes<'a, S>>,
    path: Arc<FieldPath>,
    parent: Option<&PayloadContext<S>>,
) {
    let errors = Arc::new(ErrorLog::default());
    let (tx, rx) = oneshot::channel();
    let gate = rx.shared();
    let parent_gate = parent.map(|p| p.gate.clone());
    let segments = path.to_segments();
    let record = PayloadContext {
        errors: Arc::clone(&errors),
        gate,
    };
    let ctx2 = Arc::clone(ctx);
    debug!(path = ?segments, "deferred fragment registered");

    let data = async move {
        if let Some(gate) = parent_gate {
            let _ = gate.await;
        }
        let value = match execute_fields(
            &ctx2,
            object_type,
            &source,
            &path,
            &fields,
            &record.errors,
            Some(&record),
        )
        .await
        {
            Ok(value) => value,
            Err(error) => {
                push_error(&record.errors, error);
                Value::Null
            }
        };
        let _ = tx.send(());
        PayloadData::Data(value)
    }
    .boxed();

    ctx.push_payload(PendingPayload {
        label,
        path: segments,
        errors,
        data,
    });
}

/// Registers one streamed item of a synchronous iterable source.
///
/// Records are chained: this record's work is sequenced after the previous
/// record's gate (or, for the first one, the enclosing payload's), which
/// keeps streamed patches in index order.
#[allow(clippy::too_many_arguments)]
pub(crate) fn stream_sync_item<'a, S: ScalarValue>(
    ctx: &Arc<ExecutionContext<'a, S>>,
    field: FieldRef<'a, S>,
    item_type: &'a Type,
    item: crate::resolve::ResolvedValue<S>,
    index: usize,
    list_path: Arc<FieldPath>,
    label: Option<ArcStr>,
    previous: Option<PayloadGate>,
    parent: Option<&PayloadContext<S>>,
) -> PayloadGate {
    let errors = Arc::new(ErrorLog::default());
    let (tx, rx) = oneshot::channel();
    let gate = rx.shared();
    let gate_dep = previous.or_else(|| parent.map(|p| p.gate.clone()));
    let item_path = Arc::new(FieldPath::Index(index, list_path));
    let segments = item_path.to_segments();
    let record = PayloadContext {
        errors: Arc::clone(&errors),
        gate: gate.clone(),
    };
    let ctx2 = Arc::clone(ctx);
    debug!(path = ?segments, "streamed list item registered");

    let data = async move {
        if let Some(gate) = gate_dep {
            let _ = gate.await;
        }
        let completed = complete_value(
            &ctx2,
            &field,
            item_type,
            &item_path,
            item,
            &record.errors,
            Some(&record),
        )
        .await;
        let value = match handle_item_error(completed, item_type, &record.errors) {
            Ok(value) => value,
            Err(error) => {
                // A non-null item bubbled out; the record is the outermost
                // boundary a streamed continuation can bubble into, so its
                // patch delivers `null`.
                push_error(&record.errors, error);
                Value::Null
            }
        };
        let _ = tx.send(());
        PayloadData::Data(value)
    }
    .boxed();

    ctx.push_payload(PendingPayload {
        label,
        path: segments,
        errors,
        data,
    });
    gate
}

type StreamState<S> = Arc<AsyncMutex<Option<ResolvedStream<S>>>>;

/// Hands the remainder of an asynchronous iterable source over to the
/// incremental registry.
///
/// A single driver pulls items one at a time: each record pulls one item,
/// registers its successor *before* settling (so registry emptiness keeps
/// meaning "no further payload can be produced"), and an exhausted
/// iterator resolves a marker record the yielder drops silently.
#[allow(clippy::too_many_arguments)]
pub(crate) fn stream_from_iterator<'a, S: ScalarValue>(
    ctx: &Arc<ExecutionContext<'a, S>>,
    field: FieldRef<'a, S>,
    item_type: &'a Type,
    stream: ResolvedStream<S>,
    index: usize,
    list_path: Arc<FieldPath>,
    label: Option<ArcStr>,
    parent: Option<&PayloadContext<S>>,
) {
    let state = Arc::new(AsyncMutex::new(Some(stream)));
    schedule_stream_item(
        ctx,
        field,
        item_type,
        state,
        index,
        list_path,
        label,
        parent.map(|p| p.gate.clone()),
    );
}

#[allow(clippy::too_many_arguments)]
fn schedule_stream_item<'a, S: ScalarValue>(
    ctx: &Arc<ExecutionContext<'a, S>>,
    field: FieldRef<'a, S>,
    item_type: &'a Type,
    state: StreamState<S>,
    index: usize,
    list_path: Arc<FieldPath>,
    label: Option<ArcStr>,
    gate_dep: Option<PayloadGate>,
) {
    let errors = Arc::new(ErrorLog::default());
    let (tx, rx) = oneshot::channel();
    let gate = rx.shared();
    let item_path = Arc::new(FieldPath::Index(index, Arc::clone(&list_path)));
    let segments = item_path.to_segments();
    let record = PayloadContext {
        errors: Arc::clone(&errors),
        gate: gate.clone(),
    };
    let record_label = label.clone();
    let ctx2 = Arc::clone(ctx);

    let data = async move {
        if let Some(gate) = gate_dep {
            let _ = gate.await;
        }
        let next = {
            let mut guard = state.lock().await;
            match guard.as_mut() {
                Some(stream) => stream.next().await,
                None => None,
            }
        };
        match next {
            None => {
                state.lock().await.take();
                let _ = tx.send(());
                PayloadData::Done
            }
            Some(Err(error)) => {
                state.lock().await.take();
                let located = located_error(error, &field.nodes, &item_path);
                let value = match handle_item_error(Err(located), item_type, &record.errors) {
                    Ok(value) => value,
                    Err(error) => {
                        // A non-null item bubbled out; the record is the
                        // outermost boundary a streamed continuation can
                        // bubble into, so its patch delivers `null`.
                        push_error(&record.errors, error);
                        Value::Null
                    }
                };
                let _ = tx.send(());
                PayloadData::Data(value)
            }
            Some(Ok(item)) => {
                schedule_stream_item(
                    &ctx2,
                    field.clone(),
                    item_type,
                    Arc::clone(&state),
                    index + 1,
                    list_path,
                    label,
                    Some(record.gate.clone()),
                );
                let completed = complete_value(
                    &ctx2,
                    &field,
                    item_type,
                    &item_path,
                    item,
                    &record.errors,
                    Some(&record),
                )
                .await;
                let value = match handle_item_error(completed, item_type, &record.errors) {
                    Ok(value) => value,
                    Err(error) => {
                        push_error(&record.errors, error);
                        Value::Null
                    }
                };
                let _ = tx.send(());
                PayloadData::Data(value)
            }
        }
    }
    .boxed();

    ctx.push_payload(PendingPayload {
        label: record_label,
        path: segments,
        errors,
        data,
    });
}

/// The lazy sequence of responses of an incremental execution.
///
/// The first element is the initial result (with `hasNext: true`); each
/// following element is the first pending payload record to settle,
/// terminated either by a last patch carrying `hasNext: false` or by the
/// standalone `{"hasNext": false}` payload.
///
/// Dropping (or explicitly [`cancel`]ling) the sequence cancels all pending
/// records, dropping each record's source iterator exactly once.
///
/// [`cancel`]: SubsequentPayloads::cancel
pub struct SubsequentPayloads<'a, S = DefaultScalarValue> {
    ctx: Arc<ExecutionContext<'a, S>>,
    initial: Option<ExecutionResult<S>>,
    pending: Vec<PendingPayload<'a, S>>,
    done: bool,
}

impl<'a, S> SubsequentPayloads<'a, S> {
    pub(crate) fn new(ctx: Arc<ExecutionContext<'a, S>>, initial: ExecutionResult<S>) -> Self {
        Self {
            ctx,
            initial: Some(initial),
            pending: Vec::new(),
            done: false,
        }
    }

    fn drain_registered(&mut self) {
        self.pending.append(&mut self.ctx.take_pending());
    }

    /// Cancels all pending payload records.
    ///
    /// Every record (and with it any source iterator a `@stream` was
    /// driving) is dropped; the sequence terminates without yielding
    /// further payloads.
    pub fn cancel(&mut self) {
        self.drain_registered();
        self.pending.clear();
        self.done = true;
    }
}

impl<'a, S: Unpin> Stream for SubsequentPayloads<'a, S> {
    type Item = ResponsePayload<S>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        if this.done {
            return Poll::Ready(None);
        }
        if let Some(initial) = this.initial.take() {
            return Poll::Ready(Some(ResponsePayload::Initial(initial)));
        }

        loop {
            this.drain_registered();
            if this.pending.is_empty() {
                // Emptiness was reached without a data patch carrying the
                // terminal flag, so it is delivered standalone.
                this.done = true;
                return Poll::Ready(Some(ResponsePayload::Patch(ExecutionPatchResult::terminal())));
            }

            let mut settled = None;
            for (i, record) in this.pending.iter_mut().enumerate() {
                if let Poll::Ready(data) = record.data.poll_unpin(cx) {
                    settled = Some((i, data));
                    break;
                }
            }

            match settled {
                None => return Poll::Pending,
                Some((i, PayloadData::Done)) => {
                    // Exhausted-iterator marker: no patch is emitted.
                    this.pending.remove(i);
                }
                Some((i, PayloadData::Data(value))) => {
                    let record = this.pending.remove(i);
                    this.drain_registered();
                    let has_next = !this.pending.is_empty();
                    if !has_next {
                        this.done = true;
                    }
                    let errors = mem::take(&mut *record.errors.write().unwrap());
                    trace!(path = ?record.path, has_next, "incremental payload yielded");
                    return Poll::Ready(Some(ResponsePayload::Patch(ExecutionPatchResult {
                        errors: (!errors.is_empty()).then_some(errors),
                        data: Some(value),
                        path: Some(record.path),
                        label: record.label,
                        has_next,
                        extensions: None,
                    })));
                }
            }
        }
    }
}

impl<'a, S> Drop for SubsequentPayloads<'a, S> {
    fn drop(&mut self) {
        let _ = self.ctx.take_pending();
        self.pending.clear();
    }
}
