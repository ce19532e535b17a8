//! Debounced, sequence stamped provider requests.
//!
//! The UI side ([`QueryDispatcher`]) stamps every query with the next sequence
//! number and hands it to a background [`AsyncHook`]. The hook waits for the
//! debounce window to pass, calls the provider with the most recent query and
//! reports back through a channel as a [`QueryResponse`]. Responses are only
//! applied when [`QueryDispatcher::accepts`] them, which is the sole guard
//! against out-of-order results.

use std::{
  fmt,
  time::Duration,
};

use encore_event::{
  AsyncHook,
  TaskController,
  cancelable_future,
  send_event,
};
use tokio::{
  sync::mpsc::UnboundedSender,
  time::Instant,
};

use crate::{
  config::MentionConfig,
  item::SuggestionItem,
  provider::{
    DynProvider,
    ProviderError,
  },
};

/// Identifies one suggestion session. Allocated monotonically by the
/// controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SessionId(u64);

impl SessionId {
  pub const fn new(id: u64) -> Self {
    Self(id)
  }

  pub const fn get(self) -> u64 {
    self.0
  }
}

impl fmt::Display for SessionId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "session#{}", self.0)
  }
}

/// Result of one provider call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryResponse {
  pub session:  SessionId,
  pub sequence: u64,
  pub query:    String,
  pub outcome:  Result<Vec<SuggestionItem>, ProviderError>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DispatchOptions {
  pub debounce:         Duration,
  pub provider_timeout: Option<Duration>,
  pub cancel_in_flight: bool,
}

impl Default for DispatchOptions {
  fn default() -> Self {
    Self::from(&MentionConfig::default())
  }
}

impl From<&MentionConfig> for DispatchOptions {
  fn from(config: &MentionConfig) -> Self {
    Self {
      debounce:         config.debounce,
      provider_timeout: config.provider_timeout,
      cancel_in_flight: config.cancel_in_flight,
    }
  }
}

#[derive(Debug)]
enum QueryEvent {
  Query { text: String, sequence: u64 },
  Cancel,
}

/// UI side handle for one session's queries.
///
/// Dropping the dispatcher closes the hook channel: a query still waiting for
/// its debounce window is discarded and, with `cancel_in_flight`, a running
/// provider call is canceled.
#[derive(Debug)]
pub struct QueryDispatcher {
  session:  SessionId,
  sequence: u64,
  last:     Option<String>,
  tx:       UnboundedSender<QueryEvent>,
}

impl QueryDispatcher {
  pub fn spawn(
    session: SessionId,
    provider: DynProvider,
    options: DispatchOptions,
    responses: UnboundedSender<QueryResponse>,
  ) -> Self {
    let hook = QueryHook {
      session,
      provider,
      options,
      responses,
      pending: None,
      tasks: TaskController::new(),
    };
    Self {
      session,
      sequence: 0,
      last: None,
      tx: hook.spawn(),
    }
  }

  pub fn session(&self) -> SessionId {
    self.session
  }

  /// Sequence of the most recent dispatch, 0 before the first one.
  pub fn latest(&self) -> u64 {
    self.sequence
  }

  pub fn last_query(&self) -> Option<&str> {
    self.last.as_deref()
  }

  /// Queue `query` for the provider and return its sequence. The debounce
  /// window restarts on every call.
  pub fn dispatch(&mut self, query: &str) -> u64 {
    self.sequence += 1;
    self.last = Some(query.to_owned());
    tracing::trace!(session = %self.session, sequence = self.sequence, query, "dispatch query");
    send_event(&self.tx, QueryEvent::Query {
      text:     query.to_owned(),
      sequence: self.sequence,
    });
    self.sequence
  }

  /// Whether `response` answers this session's latest dispatch.
  pub fn accepts(&self, response: &QueryResponse) -> bool {
    response.session == self.session && response.sequence == self.sequence
  }

  /// Drop the pending query and cancel a running provider call.
  pub fn cancel(&mut self) {
    send_event(&self.tx, QueryEvent::Cancel);
  }
}

struct QueryHook {
  session:   SessionId,
  provider:  DynProvider,
  options:   DispatchOptions,
  responses: UnboundedSender<QueryResponse>,
  pending:   Option<(String, u64)>,
  tasks:     TaskController,
}

impl AsyncHook for QueryHook {
  type Event = QueryEvent;

  fn handle_event(&mut self, event: QueryEvent, _deadline: Option<Instant>) -> Option<Instant> {
    match event {
      QueryEvent::Query { text, sequence } => {
        self.pending = Some((text, sequence));
        Some(Instant::now() + self.options.debounce)
      },
      QueryEvent::Cancel => {
        self.pending = None;
        self.tasks.cancel();
        None
      },
    }
  }

  fn finish_debounce(&mut self) {
    let Some((query, sequence)) = self.pending.take() else {
      return;
    };

    let session = self.session;
    let provider = self.provider.clone();
    let responses = self.responses.clone();
    let timeout = self.options.provider_timeout;
    let request = async move {
      let lookup = provider.suggest(&query);
      let outcome = match timeout {
        Some(limit) => {
          tokio::time::timeout(limit, lookup)
            .await
            .unwrap_or(Err(ProviderError::TimedOut))
        },
        None => lookup.await,
      };
      if let Err(err) = &outcome {
        tracing::warn!(%session, sequence, %err, "suggestion provider failed");
      }
      // the controller may already be gone
      let _ = responses.send(QueryResponse {
        session,
        sequence,
        query,
        outcome,
      });
    };

    if self.options.cancel_in_flight {
      let handle = self.tasks.restart();
      tokio::spawn(cancelable_future(request, handle));
    } else {
      tokio::spawn(request);
    }
  }
}

#[cfg(test)]
mod tests {
  use std::sync::{
    Arc,
    atomic::{
      AtomicUsize,
      Ordering,
    },
  };

  use tokio::sync::mpsc;

  use super::*;
  use crate::provider::provider_fn;

  fn echo(calls: Arc<AtomicUsize>) -> DynProvider {
    provider_fn(move |query| {
      calls.fetch_add(1, Ordering::SeqCst);
      async move { Ok(vec![SuggestionItem::new(query.clone(), query)]) }
    })
  }

  #[tokio::test(start_paused = true)]
  async fn debounce_sends_only_latest_query() {
    let calls = Arc::new(AtomicUsize::new(0));
    let (tx, mut rx) = mpsc::unbounded_channel();
    let mut dispatcher = QueryDispatcher::spawn(
      SessionId::new(1),
      echo(calls.clone()),
      DispatchOptions::default(),
      tx,
    );

    dispatcher.dispatch("");
    dispatcher.dispatch("j");
    assert_eq!(dispatcher.dispatch("jo"), 3);

    let response = rx.recv().await.unwrap();
    assert_eq!(response.query, "jo");
    assert_eq!(response.sequence, 3);
    assert!(dispatcher.accepts(&response));
    assert_eq!(calls.load(Ordering::SeqCst), 1);
  }

  #[tokio::test(start_paused = true)]
  async fn empty_query_still_dispatches() {
    let calls = Arc::new(AtomicUsize::new(0));
    let (tx, mut rx) = mpsc::unbounded_channel();
    let mut dispatcher = QueryDispatcher::spawn(
      SessionId::new(1),
      echo(calls),
      DispatchOptions::default(),
      tx,
    );
    dispatcher.dispatch("");
    let response = rx.recv().await.unwrap();
    assert_eq!(response.query, "");
    assert!(dispatcher.accepts(&response));
  }

  #[tokio::test(start_paused = true)]
  async fn waits_for_debounce_window() {
    let calls = Arc::new(AtomicUsize::new(0));
    let (tx, _rx) = mpsc::unbounded_channel();
    let mut dispatcher = QueryDispatcher::spawn(
      SessionId::new(1),
      echo(calls.clone()),
      DispatchOptions::default(),
      tx,
    );
    dispatcher.dispatch("a");
    tokio::time::sleep(Duration::from_millis(299)).await;
    assert_eq!(calls.load(Ordering::SeqCst), 0);
    tokio::time::sleep(Duration::from_millis(2)).await;
    assert_eq!(calls.load(Ordering::SeqCst), 1);
  }

  #[tokio::test(start_paused = true)]
  async fn timeout_turns_into_error() {
    let (tx, mut rx) = mpsc::unbounded_channel();
    let slow = provider_fn(|_query| {
      async {
        tokio::time::sleep(Duration::from_secs(30)).await;
        Ok(Vec::new())
      }
    });
    let options = DispatchOptions {
      provider_timeout: Some(Duration::from_secs(1)),
      ..DispatchOptions::default()
    };
    let mut dispatcher = QueryDispatcher::spawn(SessionId::new(4), slow, options, tx);
    dispatcher.dispatch("x");
    let response = rx.recv().await.unwrap();
    assert_eq!(response.outcome, Err(ProviderError::TimedOut));
  }

  #[tokio::test(start_paused = true)]
  async fn dropping_dispatcher_discards_pending_query() {
    let calls = Arc::new(AtomicUsize::new(0));
    let (tx, mut rx) = mpsc::unbounded_channel();
    let mut dispatcher = QueryDispatcher::spawn(
      SessionId::new(1),
      echo(calls.clone()),
      DispatchOptions::default(),
      tx,
    );
    dispatcher.dispatch("jo");
    drop(dispatcher);

    // the hook owned the only response sender, so the channel either closes or
    // stays silent
    let outcome = tokio::time::timeout(Duration::from_secs(2), rx.recv()).await;
    assert!(!matches!(outcome, Ok(Some(_))));
    assert_eq!(calls.load(Ordering::SeqCst), 0);
  }

  #[test]
  fn accepts_only_latest_sequence_of_own_session() {
    let (tx, _rx) = mpsc::unbounded_channel();
    let provider = echo(Arc::new(AtomicUsize::new(0)));
    let mut dispatcher =
      QueryDispatcher::spawn(SessionId::new(2), provider, DispatchOptions::default(), tx);
    dispatcher.dispatch("a");
    dispatcher.dispatch("ab");

    let response = |session, sequence| {
      QueryResponse {
        session: SessionId::new(session),
        sequence,
        query: String::new(),
        outcome: Ok(Vec::new()),
      }
    };
    assert!(dispatcher.accepts(&response(2, 2)));
    assert!(!dispatcher.accepts(&response(2, 1)));
    assert!(!dispatcher.accepts(&response(1, 2)));
  }
}
