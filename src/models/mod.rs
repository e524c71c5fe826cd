pub mod response;
pub mod todo;

pub use response::{ApiResponse, PageMeta};
pub use todo::{
    CreateTodoRequest, FieldValue, NewTodo, Todo, TodoChanges, TodoPriority, TodoStatus, UpdateTodoRequest,
};
