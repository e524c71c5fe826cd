//! View state of the todo screen and its transition function.
//!
//! `ViewState::reduce` is pure: it returns the next state together with the
//! effects the host has to carry out. Network results come back in as
//! actions, so the whole screen can be replayed from a list of actions.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::db::query::ListParams;
use crate::models::{
    CreateTodoRequest, PageMeta, Todo, TodoPriority, TodoStatus, UpdateTodoRequest,
};
use crate::ui::client::{ClientError, TodoPage};
use crate::validation::{ValidationErrors, validate_create, validate_update};

pub const DEFAULT_SORT: &str = "createdAt:desc";
pub const NOTIFICATION_TTL: Duration = Duration::from_secs(3);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Filters {
    pub search: String,
    pub statuses: Vec<TodoStatus>,
    pub priorities: Vec<TodoPriority>,
    pub sort: String,
    pub page: u32,
}

impl Default for Filters {
    fn default() -> Self {
        Self {
            search: String::new(),
            statuses: Vec::new(),
            priorities: Vec::new(),
            sort: DEFAULT_SORT.to_string(),
            page: 1,
        }
    }
}

impl Filters {
    pub fn to_params(&self) -> ListParams {
        let join = |values: Vec<&str>| Some(values.join(",")).filter(|s| !s.is_empty());

        ListParams {
            status: join(self.statuses.iter().map(|s| s.as_str()).collect()),
            priority: join(self.priorities.iter().map(|p| p.as_str()).collect()),
            search: Some(self.search.trim().to_string()).filter(|s| !s.is_empty()),
            sort: Some(self.sort.clone()),
            page: Some(self.page.to_string()),
            per_page: None,
        }
    }
}

fn toggle<T: PartialEq>(values: &mut Vec<T>, value: T) {
    if let Some(pos) = values.iter().position(|v| *v == value) {
        values.remove(pos);
    } else {
        values.push(value);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ListPhase {
    Idle,
    Loading,
    Populated,
    Empty,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListView {
    pub phase: ListPhase,
    pub items: Vec<Todo>,
    pub meta: Option<PageMeta>,
}

impl Default for ListView {
    fn default() -> Self {
        Self {
            phase: ListPhase::Idle,
            items: Vec::new(),
            meta: None,
        }
    }
}

impl ListView {
    fn settled_phase(&self) -> ListPhase {
        if self.items.is_empty() {
            ListPhase::Empty
        } else {
            ListPhase::Populated
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FormTarget {
    New,
    Existing(i64),
}

/// Form contents exactly as typed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TodoDraft {
    pub title: String,
    pub description: String,
    pub status: String,
    pub priority: String,
    pub due_date: String,
}

impl Default for TodoDraft {
    fn default() -> Self {
        Self {
            title: String::new(),
            description: String::new(),
            status: TodoStatus::Todo.as_str().to_string(),
            priority: TodoPriority::Medium.as_str().to_string(),
            due_date: String::new(),
        }
    }
}

impl From<&Todo> for TodoDraft {
    fn from(todo: &Todo) -> Self {
        Self {
            title: todo.title.clone(),
            description: todo.description.clone().unwrap_or_default(),
            status: todo.status.as_str().to_string(),
            priority: todo.priority.as_str().to_string(),
            due_date: todo
                .due_date
                .map(|d| d.format("%Y-%m-%d").to_string())
                .unwrap_or_default(),
        }
    }
}

impl TodoDraft {
    pub fn to_create_request(&self) -> CreateTodoRequest {
        CreateTodoRequest {
            title: Some(self.title.as_str().into()),
            description: Some(self.description.as_str().into()),
            status: Some(self.status.as_str().into()),
            priority: Some(self.priority.as_str().into()),
            due_date: Some(self.due_date.as_str().into()),
        }
    }

    /// An edit form sends every field; blank optional fields clear the value.
    pub fn to_update_request(&self) -> UpdateTodoRequest {
        UpdateTodoRequest {
            title: Some(Some(self.title.as_str().into())),
            description: Some(Some(self.description.as_str().into())),
            status: Some(Some(self.status.as_str().into())),
            priority: Some(Some(self.priority.as_str().into())),
            due_date: Some(Some(self.due_date.as_str().into())),
        }
    }

    fn set(&mut self, field: FormField, value: String) {
        match field {
            FormField::Title => self.title = value,
            FormField::Description => self.description = value,
            FormField::Status => self.status = value,
            FormField::Priority => self.priority = value,
            FormField::DueDate => self.due_date = value,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FormField {
    Title,
    Description,
    Status,
    Priority,
    DueDate,
}

impl FormField {
    /// Key used for this field in validation reports.
    pub fn wire_name(&self) -> &'static str {
        match self {
            FormField::Title => "title",
            FormField::Description => "description",
            FormField::Status => "status",
            FormField::Priority => "priority",
            FormField::DueDate => "dueDate",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormState {
    pub target: FormTarget,
    pub draft: TodoDraft,
    pub errors: ValidationErrors,
    pub submitting: bool,
}

impl FormState {
    fn open(target: FormTarget, draft: TodoDraft) -> Self {
        Self {
            target,
            draft,
            errors: ValidationErrors::new(),
            submitting: false,
        }
    }

    /// Runs the server's own rules over the draft.
    fn prepare(&self) -> Result<Mutation, ValidationErrors> {
        match self.target {
            FormTarget::New => {
                let req = self.draft.to_create_request();
                validate_create(req.clone())?;
                Ok(Mutation::Create(req))
            }
            FormTarget::Existing(id) => {
                let changes = self.draft.to_update_request();
                validate_update(changes.clone())?;
                Ok(Mutation::Update { id, changes })
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NotificationKind {
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub id: u64,
    pub kind: NotificationKind,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Mutation {
    Create(CreateTodoRequest),
    Update { id: i64, changes: UpdateTodoRequest },
    /// Quick status change from a card.
    UpdateStatus { id: i64, status: TodoStatus },
    Delete { id: i64 },
}

impl Mutation {
    pub fn success_message(&self) -> &'static str {
        match self {
            Mutation::Create(_) => "Todo created successfully",
            Mutation::Update { .. } => "Todo updated successfully",
            Mutation::UpdateStatus { .. } => "Status updated successfully",
            Mutation::Delete { .. } => "Todo deleted successfully",
        }
    }
}

/// Where a mutation was started from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Origin {
    Form,
    Card,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MutationError {
    pub message: String,
    pub errors: Option<ValidationErrors>,
}

impl From<ClientError> for MutationError {
    fn from(err: ClientError) -> Self {
        match err {
            ClientError::Api { message, errors, .. } => Self { message, errors },
            other => Self {
                message: other.to_string(),
                errors: None,
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    Load,
    SetSearch(String),
    ToggleStatus(TodoStatus),
    TogglePriority(TodoPriority),
    SetSort(String),
    SetPage(u32),
    ClearFilters,
    ListLoaded {
        seq: u64,
        result: Result<TodoPage, String>,
    },
    OpenCreate,
    OpenEdit(Todo),
    EditField(FormField, String),
    CancelForm,
    Submit,
    ChangeStatus { id: i64, status: TodoStatus },
    /// Asks for confirmation; nothing is sent until `ConfirmDelete`.
    RequestDelete(i64),
    ConfirmDelete,
    CancelDelete,
    MutationSucceeded { origin: Origin, message: String },
    MutationFailed { origin: Origin, error: MutationError },
    Dismiss(u64),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    FetchList { seq: u64, params: ListParams },
    Mutate { mutation: Mutation, origin: Origin },
    ScheduleDismiss { id: u64, after: Duration },
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ViewState {
    pub filters: Filters,
    pub list: ListView,
    pub form: Option<FormState>,
    pub notification: Option<Notification>,
    /// Todo awaiting delete confirmation.
    pub pending_delete: Option<i64>,
    /// Token of the most recent list request; older responses are dropped.
    pub list_seq: u64,
    next_notification_id: u64,
}

impl ViewState {
    pub fn reduce(mut self, action: Action) -> (Self, Vec<Effect>) {
        let effects = match action {
            Action::Load => vec![self.fetch()],
            Action::SetSearch(search) => {
                self.filters.search = search;
                self.filters.page = 1;
                vec![self.fetch()]
            }
            Action::ToggleStatus(status) => {
                toggle(&mut self.filters.statuses, status);
                self.filters.page = 1;
                vec![self.fetch()]
            }
            Action::TogglePriority(priority) => {
                toggle(&mut self.filters.priorities, priority);
                self.filters.page = 1;
                vec![self.fetch()]
            }
            Action::SetSort(sort) => {
                self.filters.sort = sort;
                self.filters.page = 1;
                vec![self.fetch()]
            }
            Action::SetPage(page) => {
                self.filters.page = page.max(1);
                vec![self.fetch()]
            }
            Action::ClearFilters => {
                self.filters = Filters::default();
                vec![self.fetch()]
            }
            Action::ListLoaded { seq, result } => {
                if seq != self.list_seq {
                    return (self, Vec::new());
                }
                match result {
                    // the page ran past the end, e.g. after deleting its last record
                    Ok(page)
                        if page.meta.current_page > page.meta.last_page
                            && self.filters.page > page.meta.last_page =>
                    {
                        self.filters.page = page.meta.last_page;
                        vec![self.fetch()]
                    }
                    Ok(page) => {
                        self.list.items = page.items;
                        self.list.meta = Some(page.meta);
                        self.list.phase = self.list.settled_phase();
                        Vec::new()
                    }
                    Err(message) => {
                        self.list.phase = self.list.settled_phase();
                        vec![self.notify(NotificationKind::Error, message)]
                    }
                }
            }
            Action::OpenCreate => {
                self.form = Some(FormState::open(FormTarget::New, TodoDraft::default()));
                Vec::new()
            }
            Action::OpenEdit(todo) => {
                self.form = Some(FormState::open(
                    FormTarget::Existing(todo.id),
                    TodoDraft::from(&todo),
                ));
                Vec::new()
            }
            Action::EditField(field, value) => {
                if let Some(form) = self.form.as_mut() {
                    form.draft.set(field, value);
                    form.errors.remove(field.wire_name());
                }
                Vec::new()
            }
            Action::CancelForm => {
                self.form = None;
                Vec::new()
            }
            Action::Submit => self.submit(),
            Action::ChangeStatus { id, status } => vec![Effect::Mutate {
                mutation: Mutation::UpdateStatus { id, status },
                origin: Origin::Card,
            }],
            Action::RequestDelete(id) => {
                self.pending_delete = Some(id);
                Vec::new()
            }
            Action::ConfirmDelete => match self.pending_delete.take() {
                Some(id) => vec![Effect::Mutate {
                    mutation: Mutation::Delete { id },
                    origin: Origin::Card,
                }],
                None => Vec::new(),
            },
            Action::CancelDelete => {
                self.pending_delete = None;
                Vec::new()
            }
            Action::MutationSucceeded { origin, message } => {
                if origin == Origin::Form {
                    self.form = None;
                }
                let dismiss = self.notify(NotificationKind::Success, message);
                vec![dismiss, self.fetch()]
            }
            Action::MutationFailed { origin, error } => {
                if origin == Origin::Form {
                    if let Some(form) = self.form.as_mut() {
                        form.submitting = false;
                        if let Some(errors) = error.errors {
                            form.errors = errors;
                        }
                    }
                }
                vec![self.notify(NotificationKind::Error, error.message)]
            }
            Action::Dismiss(id) => {
                if self.notification.as_ref().is_some_and(|n| n.id == id) {
                    self.notification = None;
                }
                Vec::new()
            }
        };

        (self, effects)
    }

    fn submit(&mut self) -> Vec<Effect> {
        let Some(form) = self.form.as_mut() else {
            return Vec::new();
        };
        if form.submitting {
            return Vec::new();
        }

        match form.prepare() {
            Ok(mutation) => {
                form.errors = ValidationErrors::new();
                form.submitting = true;
                vec![Effect::Mutate {
                    mutation,
                    origin: Origin::Form,
                }]
            }
            Err(errors) => {
                form.errors = errors;
                Vec::new()
            }
        }
    }

    fn fetch(&mut self) -> Effect {
        self.list_seq += 1;
        self.list.phase = ListPhase::Loading;
        Effect::FetchList {
            seq: self.list_seq,
            params: self.filters.to_params(),
        }
    }

    fn notify(&mut self, kind: NotificationKind, message: String) -> Effect {
        self.next_notification_id += 1;
        let id = self.next_notification_id;
        self.notification = Some(Notification { id, kind, message });
        Effect::ScheduleDismiss {
            id,
            after: NOTIFICATION_TTL,
        }
    }
}
