//! Popup lifecycle: one suggestion session at a time.
//!
//! ```text
//! closed ── on_start ──▶ open(loading) ── response ──▶ open(ready|empty|error)
//!   ▲                        │                                 │
//!   └──── on_exit / Escape / Enter / range exit ◀──────────────┘
//! ```
//!
//! All session state (query, list model, dispatcher, render target) lives in
//! a [`Session`] owned by [`PopupController`]. Closing a session drops all of
//! it at once; nothing carries over into the next one.

use tokio::sync::mpsc::{
  self,
  UnboundedReceiver,
  UnboundedSender,
};

use crate::{
  config::{
    MentionConfig,
    TriggerConfig,
  },
  dispatch::{
    DispatchOptions,
    QueryDispatcher,
    QueryResponse,
    SessionId,
  },
  document::{
    EditEvent,
    MentionInserter,
  },
  host::{
    MentionHost,
    PopupRenderer,
    PopupView,
  },
  item::SuggestionItem,
  list::{
    SuggestionListModel,
    SuggestionStatus,
  },
  placement::{
    PlacementConfig,
    PopupPlacement,
    Rect,
    place,
  },
  select::{
    Key,
    KeyAction,
    SelectionController,
  },
  trigger::{
    SuggestionQuery,
    TriggerDetector,
    TriggerTransition,
  },
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PopupState {
  Closed,
  Open(SuggestionStatus),
}

/// State of the one open suggestion session.
#[derive(Debug)]
pub struct Session<T> {
  id:         SessionId,
  trigger:    usize,
  query:      SuggestionQuery,
  model:      SuggestionListModel,
  dispatcher: QueryDispatcher,
  placement:  PopupPlacement,
  target:     T,
}

impl<T> Session<T> {
  pub fn id(&self) -> SessionId {
    self.id
  }

  pub fn query(&self) -> &SuggestionQuery {
    &self.query
  }

  pub fn model(&self) -> &SuggestionListModel {
    &self.model
  }

  pub fn placement(&self) -> PopupPlacement {
    self.placement
  }

  pub fn target(&self) -> &T {
    &self.target
  }
}

pub struct PopupController<R: PopupRenderer> {
  triggers:     Vec<TriggerConfig>,
  placement:    PlacementConfig,
  dispatch:     DispatchOptions,
  max_visible:  usize,
  detector:     TriggerDetector,
  selection:    SelectionController,
  inserter:     MentionInserter,
  renderer:     R,
  session:      Option<Session<R::Target>>,
  next_session: u64,
  responses_tx: UnboundedSender<QueryResponse>,
  responses_rx: UnboundedReceiver<QueryResponse>,
}

impl<R: PopupRenderer> PopupController<R> {
  pub fn new(config: &MentionConfig, triggers: Vec<TriggerConfig>, renderer: R) -> Self {
    let (responses_tx, responses_rx) = mpsc::unbounded_channel();
    let detector = TriggerDetector::new(triggers.iter().map(|trigger| trigger.trigger));
    Self {
      triggers,
      placement: config.placement(),
      dispatch: DispatchOptions::from(config),
      max_visible: config.max_visible_items,
      detector,
      selection: SelectionController,
      inserter: MentionInserter,
      renderer,
      session: None,
      next_session: 1,
      responses_tx,
      responses_rx,
    }
  }

  pub fn state(&self) -> PopupState {
    match &self.session {
      Some(session) => PopupState::Open(session.model.status()),
      None => PopupState::Closed,
    }
  }

  pub fn session(&self) -> Option<&Session<R::Target>> {
    self.session.as_ref()
  }

  pub fn renderer(&self) -> &R {
    &self.renderer
  }

  pub fn renderer_mut(&mut self) -> &mut R {
    &mut self.renderer
  }

  /// Run trigger detection for an edit the host just applied and drive the
  /// lifecycle hooks accordingly.
  pub fn handle_edit(&mut self, host: &impl MentionHost, event: &EditEvent) {
    let Some(transition) = self.detector.observe(host.text(), host.cursor(), event) else {
      return;
    };
    match transition {
      TriggerTransition::Start(query) => self.open(host, query),
      TriggerTransition::Restart(query) => {
        self.close();
        self.open(host, query);
      },
      TriggerTransition::Update(query) => self.on_update(host, query),
      TriggerTransition::Exit => self.close(),
    }
  }

  /// Open a session for `query`. An open session is torn down first.
  pub fn on_start(&mut self, host: &impl MentionHost, query: SuggestionQuery) {
    self.close();
    self.open(host, query);
  }

  /// The anchor may have moved and the query may have changed.
  pub fn on_update(&mut self, host: &impl MentionHost, query: SuggestionQuery) {
    let same_trigger = self
      .session
      .as_ref()
      .is_some_and(|session| session.query.trigger == query.trigger);
    if !same_trigger {
      self.on_start(host, query);
      return;
    }
    let Some(session) = self.session.as_mut() else {
      return;
    };

    let sequence = if session.dispatcher.last_query() == Some(query.text.as_str()) {
      session.query.sequence
    } else {
      session.model.set_loading();
      session.dispatcher.dispatch(&query.text)
    };
    session.query = SuggestionQuery { sequence, ..query };
    self.refresh(host);
  }

  /// Returns whether the key was consumed by the popup.
  pub fn on_key_down(&mut self, host: &mut impl MentionHost, key: Key) -> bool {
    let Some(session) = self.session.as_mut() else {
      return false;
    };
    let action = self.selection.handle_key(&mut session.model, key);
    let handled = action.handled();
    match action {
      KeyAction::Moved => self.refresh(host),
      KeyAction::Commit(item) => {
        if let Some(item) = item {
          self.commit(host, &item);
        }
        self.on_exit();
      },
      KeyAction::Cancel => self.on_exit(),
      KeyAction::Ignored => {},
    }
    handled
  }

  /// Close the session, whatever state it is in.
  pub fn on_exit(&mut self) {
    self.close();
    self.detector.reset();
  }

  /// Apply a provider response if it answers the open session's latest
  /// query. Returns whether it was applied.
  pub fn apply_response(&mut self, host: &impl MentionHost, response: QueryResponse) -> bool {
    let Some(session) = self.session.as_mut() else {
      tracing::trace!(session = %response.session, "dropping response, no open session");
      return false;
    };
    if !session.dispatcher.accepts(&response) {
      tracing::trace!(
        session = %response.session,
        sequence = response.sequence,
        latest = session.dispatcher.latest(),
        "dropping stale response"
      );
      return false;
    }
    match response.outcome {
      Ok(items) => session.model.set_items(items),
      Err(err) => session.model.set_error(err.to_string()),
    }
    self.refresh(host);
    true
  }

  /// Wait for the next provider response. Responses still have to go through
  /// [`PopupController::apply_response`].
  pub async fn next_response(&mut self) -> Option<QueryResponse> {
    self.responses_rx.recv().await
  }

  /// Apply every response that already arrived. Returns how many were
  /// applied.
  pub fn drain_responses(&mut self, host: &impl MentionHost) -> usize {
    let mut applied = 0;
    while let Ok(response) = self.responses_rx.try_recv() {
      if self.apply_response(host, response) {
        applied += 1;
      }
    }
    applied
  }

  fn open(&mut self, host: &impl MentionHost, query: SuggestionQuery) {
    let Some(trigger) = self
      .triggers
      .iter()
      .position(|config| config.trigger == query.trigger)
    else {
      tracing::warn!(trigger = %query.trigger, "no configuration for trigger");
      self.detector.reset();
      return;
    };
    let kind = self.triggers[trigger].kind;
    let provider = self.triggers[trigger].provider.clone();

    let id = SessionId::new(self.next_session);
    self.next_session += 1;

    let mut dispatcher = QueryDispatcher::spawn(
      id,
      provider,
      self.dispatch,
      self.responses_tx.clone(),
    );
    let mut model = SuggestionListModel::new(self.max_visible);
    model.set_loading();
    let sequence = dispatcher.dispatch(&query.text);
    let query = SuggestionQuery { sequence, ..query };

    let placement = self.compute_placement(host, &query, &model);
    let target = self.renderer.mount(&PopupView {
      kind,
      query: &query,
      model: &model,
      placement,
    });
    tracing::debug!(%id, kind = %kind, query = %query.text, "opened suggestion session");

    self.session = Some(Session {
      id,
      trigger,
      query,
      model,
      dispatcher,
      placement,
      target,
    });
  }

  fn close(&mut self) {
    let Some(session) = self.session.take() else {
      return;
    };
    let Session {
      id,
      mut dispatcher,
      target,
      ..
    } = session;
    dispatcher.cancel();
    drop(dispatcher);
    self.renderer.unmount(target);
    tracing::debug!(%id, "closed suggestion session");
  }

  fn commit(&self, host: &mut impl MentionHost, item: &SuggestionItem) {
    let Some(session) = self.session.as_ref() else {
      return;
    };
    let trigger = &self.triggers[session.trigger];
    if let Err(err) = self.inserter.commit(host, &session.query, trigger, item) {
      tracing::warn!(%err, "failed to insert mention");
    }
  }

  fn refresh(&mut self, host: &impl MentionHost) {
    let Some(mut session) = self.session.take() else {
      return;
    };
    session.placement = self.compute_placement(host, &session.query, &session.model);
    self.renderer.update(&mut session.target, &PopupView {
      kind:      self.triggers[session.trigger].kind,
      query:     &session.query,
      model:     &session.model,
      placement: session.placement,
    });
    self.session = Some(session);
  }

  fn compute_placement(
    &mut self,
    host: &impl MentionHost,
    query: &SuggestionQuery,
    model: &SuggestionListModel,
  ) -> PopupPlacement {
    let anchor = host.anchor_rect(query.range_start).unwrap_or_else(|| {
      tracing::debug!(pos = query.range_start, "anchor not laid out, using origin");
      Rect::default()
    });
    let size = self.renderer.measure(model);
    place(anchor, size, host.viewport(), self.placement)
  }
}
