use std::collections::VecDeque;
use std::sync::Arc;

use tracing::debug;

use crate::models::UpdateTodoRequest;
use crate::ui::client::TodoApi;
use crate::ui::state::{Action, Effect, Mutation, MutationError, ViewState};

/// Owns the view state and performs the network effects it asks for.
pub struct TodoApp {
    state: ViewState,
    api: Arc<dyn TodoApi>,
}

impl TodoApp {
    pub fn new(api: Arc<dyn TodoApi>) -> Self {
        Self {
            state: ViewState::default(),
            api,
        }
    }

    pub fn state(&self) -> &ViewState {
        &self.state
    }

    /// Applies `action` and every follow-up action produced by network
    /// effects, in order. Timer effects are handed back to the caller.
    pub async fn dispatch(&mut self, action: Action) -> Vec<Effect> {
        let mut queue = VecDeque::from([action]);
        let mut deferred = Vec::new();

        while let Some(action) = queue.pop_front() {
            let (next, effects) = std::mem::take(&mut self.state).reduce(action);
            self.state = next;

            for effect in effects {
                match effect {
                    Effect::FetchList { seq, params } => {
                        debug!(seq, "fetching todo list");
                        let result = self.api.list(&params).await.map_err(|e| e.to_string());
                        queue.push_back(Action::ListLoaded { seq, result });
                    }
                    Effect::Mutate { mutation, origin } => {
                        let message = mutation.success_message().to_string();
                        let follow_up = match self.mutate(mutation).await {
                            Ok(()) => Action::MutationSucceeded { origin, message },
                            Err(error) => Action::MutationFailed { origin, error },
                        };
                        queue.push_back(follow_up);
                    }
                    timer @ Effect::ScheduleDismiss { .. } => deferred.push(timer),
                }
            }
        }

        deferred
    }

    async fn mutate(&self, mutation: Mutation) -> Result<(), MutationError> {
        debug!(?mutation, "running mutation");
        let result = match mutation {
            Mutation::Create(req) => self.api.create(&req).await.map(|_| ()),
            Mutation::Update { id, changes } => self.api.update(id, &changes).await.map(|_| ()),
            Mutation::UpdateStatus { id, status } => {
                let changes = UpdateTodoRequest {
                    status: Some(Some(status.as_str().into())),
                    ..Default::default()
                };
                self.api.update(id, &changes).await.map(|_| ())
            }
            Mutation::Delete { id } => self.api.delete(id).await,
        };
        result.map_err(MutationError::from)
    }
}
